//! The inline progress widget that replaces a timestamp token.
//!
//! Construction is two-phase: the day progress is computed first, and the
//! widget only records the outcome. A token that fails to parse produces an
//! errored widget instead of an error, so one bad token never stops a scan.
//!
//! Two widgets are equal when their source tokens are equal, regardless of
//! where they sit in the document. Hosts use that to keep the rendered
//! element of a token whose text did not change.

use std::{
  borrow::Cow,
  fmt::Write,
};

use dayprog_core::timestamp::{
  FormatError,
  compute_progress,
};

use crate::{
  Tendril,
  config::ProgressConfig,
};

/// Everything a host needs to paint a widget.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetContent {
  /// Full precision, in `[0, 100)`.
  pub percentage:        f64,
  /// Two-decimal label, e.g. `"50.00%"`.
  pub label:             String,
  /// `YYYY-MM-DD HH:mm:ss`, used for the tooltip.
  pub display_timestamp: String,
}

impl WidgetContent {
  pub fn compute(token: &str) -> Result<Self, FormatError> {
    let progress = compute_progress(token)?;
    Ok(Self {
      percentage:        progress.percentage(),
      label:             progress.label(),
      display_timestamp: progress.display_timestamp(),
    })
  }
}

#[derive(Debug, Clone)]
pub struct ProgressWidget {
  token:   Tendril,
  content: Option<WidgetContent>,
}

impl ProgressWidget {
  pub fn new(token: &str) -> Self {
    let content = match WidgetContent::compute(token) {
      Ok(content) => Some(content),
      Err(err) => {
        log::error!("progress widget for {token:?} failed: {err}");
        None
      },
    };
    Self {
      token: token.into(),
      content,
    }
  }

  /// The source token text, brackets included.
  pub fn token(&self) -> &str {
    &self.token
  }

  pub fn content(&self) -> Option<&WidgetContent> {
    self.content.as_ref()
  }

  /// Set when the token did not parse; such widgets are never painted.
  pub fn errored(&self) -> bool {
    self.content.is_none()
  }

  pub fn markup(&self, config: &ProgressConfig) -> WidgetMarkup {
    let Some(content) = &self.content else {
      return WidgetMarkup::default();
    };

    WidgetMarkup {
      tooltip: Some(content.display_timestamp.clone()),
      bar:     Some(ProgressSpan {
        class:      config.class_name.clone(),
        text:       content.label.clone(),
        attributes: vec![
          ("data-time-string", content.display_timestamp.clone()),
          ("data-progress", content.label.clone()),
        ],
        style:      format!("{}: {}", config.css_property, content.label),
      }),
    }
  }
}

impl PartialEq for ProgressWidget {
  fn eq(&self, other: &Self) -> bool {
    self.token == other.token
  }
}

impl Eq for ProgressWidget {}

/// The inner span showing the percentage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSpan {
  pub class:      String,
  pub text:       String,
  pub attributes: Vec<(&'static str, String)>,
  pub style:      String,
}

/// An outer span carrying the tooltip, wrapping the progress span. Errored
/// widgets produce an empty outer span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetMarkup {
  pub tooltip: Option<String>,
  pub bar:     Option<ProgressSpan>,
}

impl WidgetMarkup {
  pub fn to_html(&self) -> String {
    let mut html = String::from("<span");
    if let Some(tooltip) = &self.tooltip {
      let _ = write!(html, " aria-label=\"{}\"", escape_html(tooltip));
    }
    html.push('>');

    if let Some(bar) = &self.bar {
      let _ = write!(html, "<span class=\"{}\"", escape_html(&bar.class));
      for (name, value) in &bar.attributes {
        let _ = write!(html, " {name}=\"{}\"", escape_html(value));
      }
      let _ = write!(
        html,
        " style=\"{}\">{}</span>",
        escape_html(&bar.style),
        escape_html(&bar.text)
      );
    }

    html.push_str("</span>");
    html
  }
}

pub fn escape_html(text: &str) -> Cow<'_, str> {
  if !text.contains(['&', '<', '>', '"', '\'']) {
    return Cow::Borrowed(text);
  }

  let mut escaped = String::with_capacity(text.len() + 8);
  for ch in text.chars() {
    match ch {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&#39;"),
      _ => escaped.push(ch),
    }
  }
  Cow::Owned(escaped)
}
