//! Finds timestamp tokens and keeps a decoration set in step with a view.
//!
//! [`MatchDecorator`] only scans what is on screen. On a document edit it
//! maps the existing decorations through the changes and re-scans the whole
//! lines the edit touched; everything else is left alone. Scrolling, or an
//! edit spanning more than `max_incremental_span` chars of the viewport,
//! falls back to a full scan of the visible range.

use std::{
  borrow::Cow,
  ops::Range as CharRange,
};

use dayprog_core::timestamp::TOKEN_DIGITS;
use once_cell::sync::Lazy;
use regex::Regex;
use ropey::{
  Rope,
  RopeSlice,
};

use crate::{
  Tendril,
  config::DEFAULT_MAX_INCREMENTAL_SPAN,
  decoration::{
    Decoration,
    DecorationSet,
    DecorationUpdate,
  },
  transaction::TransactionError,
  view::{
    EditorView,
    ViewUpdate,
  },
};

static TOKEN_REGEX: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"\[?[0-9]+\]?").expect("token regex should compile"));

/// A timestamp token found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
  pub from: usize,
  pub to:   usize,
  /// The matched text, brackets included.
  pub text: Tendril,
}

/// All tokens fully inside `from..to`, in document order.
///
/// A token is a run of exactly 14 digits, optionally preceded by `[` and
/// followed by `]`. Longer or shorter runs are not tokens, and a run never
/// yields a token from a part of itself.
pub fn scan(text: &Rope, from: usize, to: usize) -> Vec<TokenMatch> {
  let to = to.min(text.len_chars());
  if from >= to {
    return Vec::new();
  }

  let slice: Cow<str> = text.slice(from..to).into();
  let mut matches = Vec::new();
  let (mut byte, mut pos) = (0, from);

  for found in TOKEN_REGEX.find_iter(&slice) {
    let token = found.as_str();
    let digits = token.trim_start_matches('[').trim_end_matches(']');
    if digits.len() != TOKEN_DIGITS {
      continue;
    }

    pos += slice[byte..found.start()].chars().count();
    // Tokens are ASCII, so bytes and chars agree inside them.
    let start = pos;
    pos += token.len();
    byte = found.end();

    matches.push(TokenMatch {
      from: start,
      to:   pos,
      text: token.into(),
    });
  }
  matches
}

/// Char index of the end of `line`, before its line ending.
pub fn line_end_char_index(text: RopeSlice, line: usize) -> usize {
  let end = if line + 1 >= text.len_lines() {
    text.len_chars()
  } else {
    text.line_to_char(line + 1)
  };

  let content = text.line(line);
  let len = content.len_chars();
  let ending = match (
    len.checked_sub(2).map(|i| content.char(i)),
    len.checked_sub(1).map(|i| content.char(i)),
  ) {
    (Some('\r'), Some('\n')) => 2,
    (_, Some('\n')) => 1,
    _ => 0,
  };
  end - ending
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchDecorator {
  max_incremental_span: usize,
}

impl Default for MatchDecorator {
  fn default() -> Self {
    Self::new(DEFAULT_MAX_INCREMENTAL_SPAN)
  }
}

impl MatchDecorator {
  pub fn new(max_incremental_span: usize) -> Self {
    Self {
      max_incremental_span,
    }
  }

  /// Build the decorations for every token in the visible range.
  pub fn create_deco<F>(&self, view: &EditorView, mut decorate: F) -> DecorationSet
  where
    F: FnMut(&EditorView, &TokenMatch) -> Option<Decoration>,
  {
    let CharRange { start, end } = view.visible_range();
    scan(view.text(), start, end)
      .iter()
      .filter_map(|token| decorate(view, token))
      .collect()
  }

  /// Bring `deco`, built for the previous state of `view`, up to date.
  pub fn update_deco<F>(
    &self,
    update: &ViewUpdate,
    view: &EditorView,
    deco: DecorationSet,
    mut decorate: F,
  ) -> Result<DecorationSet, TransactionError>
  where
    F: FnMut(&EditorView, &TokenMatch) -> Option<Decoration>,
  {
    let mut touched: Option<(usize, usize)> = None;
    if update.doc_changed() {
      let visible = view.visible_range();
      for span in update.changes().spans() {
        // Inclusive, so a deletion at either edge of the viewport counts.
        if span.new_to >= visible.start && span.new_from <= visible.end {
          touched = Some(match touched {
            Some((from, to)) => (from.min(span.new_from), to.max(span.new_to)),
            None => (span.new_from, span.new_to),
          });
        }
      }
    }

    let oversized = touched.is_some_and(|(from, to)| to - from > self.max_incremental_span);
    if update.viewport_moved() || oversized {
      log::trace!("rescanning the whole viewport");
      return Ok(self.create_deco(view, decorate));
    }

    let deco = deco.map(update.changes())?;
    match touched {
      Some((from, to)) => Ok(self.update_range(view, deco, from, to, &mut decorate)),
      None => Ok(deco),
    }
  }

  /// Re-scan the whole lines covering `update_from..update_to`, replacing
  /// the decorations that lie inside them.
  fn update_range<F>(
    &self,
    view: &EditorView,
    deco: DecorationSet,
    update_from: usize,
    update_to: usize,
    decorate: &mut F,
  ) -> DecorationSet
  where
    F: FnMut(&EditorView, &TokenMatch) -> Option<Decoration>,
  {
    let visible = view.visible_range();
    let from = visible.start.max(update_from);
    let to = visible.end.min(update_to);
    if to < from {
      return deco;
    }

    let text = view.text().slice(..);
    let from_line = text.char_to_line(from);
    let to_line = text.char_to_line(to);
    let start = visible.start.max(text.line_to_char(from_line));
    let end = visible.end.min(line_end_char_index(text, to_line));

    let add = scan(view.text(), start, end)
      .iter()
      .filter_map(|token| decorate(view, token))
      .collect();
    log::trace!("rescanned {start}..{end}");

    deco.update(DecorationUpdate {
      filter_from: start,
      filter_to: end,
      filter: true,
      add,
    })
  }
}
