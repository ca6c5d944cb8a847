//! Per-view state deciding which timestamp tokens show a progress widget.
//!
//! A token is decorated when it is scanned, unless the selection touches it
//! or the view is not in live preview; those stay editable text. The set is
//! then kept up to date incrementally by the [`MatchDecorator`], and a second
//! filter at paint time hides widgets the selection has since moved onto.

use std::rc::Rc;

use crate::{
  config::ProgressConfig,
  decoration::{
    Decoration,
    DecorationSet,
  },
  matcher::{
    MatchDecorator,
    TokenMatch,
  },
  selection::Range,
  view::{
    EditorView,
    ViewUpdate,
  },
  widget::ProgressWidget,
};

/// State a host keeps for one editor view.
///
/// The host calls [`ViewPlugin::on_view_created`] once, then
/// [`ViewPlugin::on_view_updated`] once per update cycle before painting, and
/// [`ViewPlugin::on_destroy`] when the view goes away.
pub trait ViewPlugin {
  fn on_view_created(&mut self, view: &EditorView);

  fn on_view_updated(&mut self, update: &ViewUpdate, view: &EditorView);

  fn on_destroy(&mut self) {}

  /// Decorations to paint for the current state of `view`.
  fn decorations_for_render(&self, view: &EditorView) -> DecorationSet;
}

#[derive(Debug, Clone)]
pub struct ProgressTracker {
  matcher:     MatchDecorator,
  decorations: DecorationSet,
}

impl Default for ProgressTracker {
  fn default() -> Self {
    Self::new(&ProgressConfig::default())
  }
}

impl ProgressTracker {
  pub fn new(config: &ProgressConfig) -> Self {
    Self {
      matcher:     MatchDecorator::new(config.max_incremental_span),
      decorations: DecorationSet::none(),
    }
  }

  /// Every decoration currently tracked, before the paint-time filter.
  pub fn decorations(&self) -> &DecorationSet {
    &self.decorations
  }

  fn rebuild(&mut self, view: &EditorView) {
    self.decorations = self.matcher.create_deco(view, decorate);
    log::debug!("scanned viewport: {} decorations", self.decorations.len());
  }
}

impl ViewPlugin for ProgressTracker {
  fn on_view_created(&mut self, view: &EditorView) {
    self.rebuild(view);
  }

  fn on_view_updated(&mut self, update: &ViewUpdate, view: &EditorView) {
    if self.decorations.is_empty() || update.mode_changed() {
      self.rebuild(view);
      return;
    }

    let current = std::mem::take(&mut self.decorations);
    match self.matcher.update_deco(update, view, current, decorate) {
      Ok(decorations) => self.decorations = decorations,
      Err(err) => {
        log::warn!("could not map decorations through the edit, rescanning: {err}");
        self.rebuild(view);
      },
    }
  }

  fn on_destroy(&mut self) {
    self.decorations.clear();
  }

  fn decorations_for_render(&self, view: &EditorView) -> DecorationSet {
    self.decorations.filter(|deco| {
      if deco.widget.errored() {
        log::debug!("skipping errored widget for {:?}", deco.widget.token());
        return false;
      }
      deco.is_collapsed()
        || !view
          .selection()
          .iter()
          .any(|range| selection_touches(range, deco.from, deco.to))
    })
  }
}

fn decorate(view: &EditorView, token: &TokenMatch) -> Option<Decoration> {
  should_render(view, token.from, token.to).then(|| {
    Decoration::replace(
      token.from,
      token.to,
      Rc::new(ProgressWidget::new(&token.text)),
    )
  })
}

/// Whether `from..to` may be replaced by a widget right now.
pub fn should_render(view: &EditorView, from: usize, to: usize) -> bool {
  view.is_live_preview()
    && !view
      .selection()
      .iter()
      .any(|range| selection_touches(range, from, to))
}

/// Directional overlap between a selection range and `from..to`.
///
/// A range starting at or before `from` touches when it reaches `from`; a
/// range starting after `from` touches when it starts at or before `to`.
/// Both ends are inclusive, so a cursor right next to a token counts.
pub fn selection_touches(range: &Range, from: usize, to: usize) -> bool {
  if range.from() <= from {
    range.to() >= from
  } else {
    range.from() <= to
  }
}

#[cfg(test)]
mod test {
  use ropey::Rope;

  use super::*;
  use crate::{
    selection::Selection,
    transaction::Transaction,
    view::RenderMode,
  };

  const TEXT: &str = "start 20240101120000 middle [20240101060000] end";

  fn tracked(text: &str) -> (EditorView, ProgressTracker) {
    let mut view = EditorView::new(Rope::from(text));
    view.set_selection(Selection::point(text.chars().count())).unwrap();
    view.take_update().unwrap();

    let mut tracker = ProgressTracker::default();
    tracker.on_view_created(&view);
    (view, tracker)
  }

  fn tokens(set: &DecorationSet) -> Vec<String> {
    set.iter().map(|deco| deco.widget.token().to_string()).collect()
  }

  quickcheck::quickcheck! {
    fn touching_is_symmetric_for_points(pos: usize, from: usize, len: u8) -> bool {
      let to = from.saturating_add(len as usize);
      let touches = selection_touches(&Range::point(pos), from, to);
      touches == (from <= pos && pos <= to)
    }

    fn ranges_past_the_token_never_touch(from: usize, len: u8, gap: u8, width: u8) -> bool {
      let from = from / 2;
      let to = from + len as usize;
      let start = to + 1 + gap as usize;
      !selection_touches(&Range::new(start, start + width as usize), from, to)
    }
  }

  #[test]
  fn touching_is_directional() {
    // Selection covering the token from before.
    assert!(selection_touches(&Range::new(0, 6), 6, 20));
    assert!(!selection_touches(&Range::new(0, 5), 6, 20));
    // Selection starting inside or at the end.
    assert!(selection_touches(&Range::new(20, 25), 6, 20));
    assert!(!selection_touches(&Range::new(21, 25), 6, 20));
    // Backward selections behave like forward ones.
    assert!(selection_touches(&Range::new(8, 2), 6, 20));
  }

  #[test]
  fn decorates_untouched_tokens() {
    let (view, tracker) = tracked(TEXT);
    assert_eq!(tokens(tracker.decorations()), vec![
      "20240101120000",
      "[20240101060000]"
    ]);
    assert_eq!(tracker.decorations_for_render(&view).len(), 2);
  }

  #[test]
  fn cursor_on_a_token_leaves_it_as_text() {
    let mut view = EditorView::new(Rope::from(TEXT));
    view.set_selection(Selection::point(10)).unwrap();
    view.take_update().unwrap();

    let mut tracker = ProgressTracker::default();
    tracker.on_view_created(&view);
    assert_eq!(tokens(tracker.decorations()), vec!["[20240101060000]"]);
  }

  #[test]
  fn render_filter_follows_the_selection() {
    let (mut view, mut tracker) = tracked(TEXT);

    view.set_selection(Selection::point(6)).unwrap();
    let update = view.take_update().unwrap();
    tracker.on_view_updated(&update, &view);

    assert_eq!(tracker.decorations().len(), 2);
    assert_eq!(tokens(&tracker.decorations_for_render(&view)), vec![
      "[20240101060000]"
    ]);
  }

  #[test]
  fn errored_widgets_are_not_painted() {
    let (view, tracker) = tracked("bad 20241399000000 good 20240101000000.");
    assert_eq!(tracker.decorations().len(), 2);
    assert_eq!(tokens(&tracker.decorations_for_render(&view)), vec![
      "20240101000000"
    ]);
  }

  #[test]
  fn source_mode_renders_nothing() {
    let (mut view, mut tracker) = tracked(TEXT);
    view.set_mode(RenderMode::Source);
    let update = view.take_update().unwrap();
    tracker.on_view_updated(&update, &view);
    assert!(tracker.decorations().is_empty());
    assert!(!should_render(&view, 6, 20));

    view.set_mode(RenderMode::LivePreview);
    let update = view.take_update().unwrap();
    tracker.on_view_updated(&update, &view);
    assert_eq!(tracker.decorations().len(), 2);
  }

  #[test]
  fn empty_sets_are_rebuilt() {
    let (mut view, mut tracker) = tracked("nothing here");
    assert!(tracker.decorations().is_empty());

    // Edit far from the cursor at the end.
    let tx = Transaction::change(view.text(), vec![(0, 0, Some("20240101000000 ".into()))]).unwrap();
    view.dispatch(&tx).unwrap();
    let update = view.take_update().unwrap();
    tracker.on_view_updated(&update, &view);
    assert_eq!(tokens(tracker.decorations()), vec!["20240101000000"]);
  }

  #[test]
  fn destroy_clears() {
    let (view, mut tracker) = tracked(TEXT);
    tracker.on_destroy();
    assert!(tracker.decorations().is_empty());
    assert!(tracker.decorations_for_render(&view).is_empty());
  }
}
