//! Paints the visible part of a view with its decorations applied.

use crossterm::style::Stylize;
use dayprog_lib::{
  config::ProgressConfig,
  decoration::{
    Decoration,
    DecorationSet,
  },
  view::EditorView,
  widget::{
    WidgetContent,
    escape_html,
  },
};

const BAR_WIDTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
  /// Colored bar and label.
  Styled,
  /// The same without escape codes.
  Plain,
  /// Widget markup, with the surrounding text escaped.
  Html,
}

pub fn render(
  view: &EditorView,
  decorations: &DecorationSet,
  config: &ProgressConfig,
  output: Output,
) -> String {
  let visible = view.visible_range();
  let text = view.text();
  let mut out = String::new();
  let mut pos = visible.start;

  for deco in decorations.between(visible.start, visible.end) {
    if deco.from < pos || deco.to > visible.end {
      continue;
    }
    push_text(&mut out, &text.slice(pos..deco.from).to_string(), output);
    push_widget(&mut out, deco, config, output);
    pos = deco.to;
  }
  push_text(&mut out, &text.slice(pos..visible.end).to_string(), output);
  out
}

fn push_text(out: &mut String, text: &str, output: Output) {
  match output {
    Output::Html => out.push_str(&escape_html(text)),
    Output::Styled | Output::Plain => out.push_str(text),
  }
}

fn push_widget(out: &mut String, deco: &Decoration, config: &ProgressConfig, output: Output) {
  let Some(content) = deco.widget.content() else {
    push_text(out, deco.widget.token(), output);
    return;
  };

  match output {
    Output::Html => out.push_str(&deco.widget.markup(config).to_html()),
    Output::Plain => out.push_str(&format!("[{} {}]", bar(content, BAR_WIDTH), content.label)),
    Output::Styled => {
      out.push_str(&format!(
        "[{} {}]",
        bar(content, BAR_WIDTH).green(),
        content.label.clone().bold()
      ));
    },
  }
}

/// Filled and empty cells in proportion to the day elapsed.
pub fn bar(content: &WidgetContent, width: usize) -> String {
  let filled = ((content.percentage / 100.0) * width as f64).floor() as usize;
  let filled = filled.min(width);
  format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}
