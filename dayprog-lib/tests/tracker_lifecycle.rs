use std::rc::Rc;

use dayprog_lib::{
  decoration::DecorationSet,
  plugin::{
    DailyProgressPlugin,
    ExtensionRegistry,
  },
  selection::{
    Range,
    Selection,
  },
  tracker::{
    ProgressTracker,
    ViewPlugin,
    should_render,
  },
  transaction::Transaction,
  view::{
    EditorView,
    RenderMode,
    Viewport,
  },
  widget::ProgressWidget,
};
use ropey::Rope;

/// A view and its tracker, driven through update cycles the way a host
/// would.
struct Harness {
  view:    EditorView,
  tracker: ProgressTracker,
}

impl Harness {
  fn new(text: &str, viewport: Viewport) -> Self {
    let mut view = EditorView::with_viewport(Rope::from(text), viewport);
    // Park the cursor past the last char so it touches nothing.
    let end = view.text().len_chars();
    view
      .set_selection(Selection::point(end))
      .expect("cursor in bounds");
    view.take_update().expect("initial update");

    let mut tracker = ProgressTracker::default();
    tracker.on_view_created(&view);
    Self { view, tracker }
  }

  fn edit(&mut self, from: usize, to: usize, text: &str) {
    let tx = Transaction::change(self.view.text(), vec![(from, to, Some(text.into()))])
      .expect("valid change");
    self.view.dispatch(&tx).expect("dispatch");
    self.cycle();
  }

  fn select(&mut self, selection: Selection) {
    self.view.set_selection(selection).expect("selection in bounds");
    self.cycle();
  }

  fn cycle(&mut self) {
    let update = self.view.take_update().expect("update");
    self.tracker.on_view_updated(&update, &self.view);
  }

  fn decorations(&self) -> &DecorationSet {
    self.tracker.decorations()
  }

  fn rendered(&self) -> Vec<(usize, usize, String)> {
    self
      .tracker
      .decorations_for_render(&self.view)
      .iter()
      .map(|deco| (deco.from, deco.to, deco.widget.token().to_string()))
      .collect()
  }

  fn widgets(&self) -> Vec<Rc<ProgressWidget>> {
    self
      .decorations()
      .iter()
      .map(|deco| deco.widget.clone())
      .collect()
  }
}

fn journal(lines: usize) -> String {
  (0..lines)
    .map(|i| format!("- task {i:02} started [202401011{:1}0000]\n", i % 10))
    .collect()
}

#[test]
fn test_noop_update_is_idempotent() {
  let mut harness = Harness::new(&journal(5), Viewport::default());
  let before = harness.decorations().clone();
  let widgets = harness.widgets();

  harness.cycle();
  harness.cycle();

  assert_eq!(harness.decorations(), &before);
  for (now, then) in harness.widgets().iter().zip(&widgets) {
    assert!(Rc::ptr_eq(now, then), "no-op updates must keep widgets");
  }
}

#[test]
fn test_far_edits_keep_widget_identity() {
  let mut harness = Harness::new(&journal(5), Viewport::default());
  let widgets = harness.widgets();
  assert_eq!(widgets.len(), 5);

  // Rewrite the text of line 3 only; its token and every other line stay.
  let line = harness.view.text().line_to_char(3);
  harness.edit(line + 2, line + 6, "chore");

  let now = harness.widgets();
  assert_eq!(now.len(), 5);
  for i in [0, 1, 2, 4] {
    assert!(Rc::ptr_eq(&now[i], &widgets[i]), "widget {i} was rebuilt");
  }
  assert!(!Rc::ptr_eq(&now[3], &widgets[3]), "edited line is rescanned");
  assert_eq!(now[3], widgets[3], "rescanned widget is still equal");
}

#[test]
fn test_edits_above_shift_decorations() {
  let mut harness = Harness::new(&journal(3), Viewport::default());
  let before: Vec<_> = harness.decorations().iter().map(|deco| deco.from).collect();

  harness.edit(0, 0, "# log\n");

  let after: Vec<_> = harness.decorations().iter().map(|deco| deco.from).collect();
  assert_eq!(after, before.iter().map(|from| from + 6).collect::<Vec<_>>());
  let text = harness.view.text().clone();
  for deco in harness.decorations() {
    assert_eq!(
      text.slice(deco.from..deco.to).to_string(),
      deco.widget.token(),
      "decoration drifted off its token"
    );
  }
}

#[test]
fn test_edits_below_the_viewport_change_nothing_visible() {
  let mut harness = Harness::new(&journal(20), Viewport::new(0, 4));
  let widgets = harness.widgets();
  assert_eq!(widgets.len(), 4);

  let line = harness.view.text().line_to_char(15);
  harness.edit(line, line, "- new [20240101235959]\n");

  let now = harness.widgets();
  assert_eq!(now.len(), 4);
  assert!(now.iter().zip(&widgets).all(|(a, b)| Rc::ptr_eq(a, b)));
}

#[test]
fn test_scrolling_scans_the_new_viewport() {
  let mut harness = Harness::new(&journal(20), Viewport::new(0, 4));
  harness.view.scroll_to(10);
  harness.cycle();

  let tokens: Vec<_> = harness
    .decorations()
    .iter()
    .map(|deco| deco.widget.token().to_string())
    .collect();
  assert_eq!(tokens, vec![
    "[20240101100000]",
    "[20240101110000]",
    "[20240101120000]",
    "[20240101130000]",
  ]);
}

#[test]
fn test_invalid_token_is_never_rendered() {
  let harness = Harness::new("broken 99999999999999 fine 20240101120000\n", Viewport::default());

  assert_eq!(harness.decorations().len(), 2);
  assert!(harness.decorations().iter().next().unwrap().widget.errored());
  assert_eq!(harness.rendered(), vec![(27, 41, "20240101120000".to_string())]);
}

#[test]
fn test_selection_overlap_hides_widgets() {
  let mut harness = Harness::new("a 20240101120000 b 20240101180000 c\n", Viewport::default());
  assert_eq!(harness.rendered().len(), 2);

  // Cursor touching the end of the first token.
  harness.select(Selection::point(16));
  assert_eq!(harness.rendered(), vec![(19, 33, "20240101180000".to_string())]);
  assert!(!should_render(&harness.view, 2, 16));
  assert!(should_render(&harness.view, 19, 33));

  // A selection spanning both tokens.
  harness.select(Selection::single(0, 35));
  assert!(harness.rendered().is_empty());

  // Selecting plain text between them shows both again.
  harness.select(Selection::single(17, 18));
  assert_eq!(harness.rendered().len(), 2);
}

#[test]
fn test_live_preview_off_renders_nothing() {
  let mut harness = Harness::new(&journal(3), Viewport::default());
  harness.view.set_mode(RenderMode::Source);
  harness.cycle();

  assert!(harness.rendered().is_empty());
  for deco in harness.decorations() {
    assert!(!should_render(&harness.view, deco.from, deco.to));
  }
  assert!(!should_render(&harness.view, 0, 0));

  harness.view.set_mode(RenderMode::LivePreview);
  harness.cycle();
  assert_eq!(harness.rendered().len(), 3);
}

#[test]
fn test_finished_token_renders_once_the_line_is_left() {
  let mut harness = Harness::new("", Viewport::default());
  for (i, ch) in "20240101120000".chars().enumerate() {
    harness.edit(i, i, &ch.to_string());
  }
  // The cursor sits right after the token, which stays editable text.
  assert!(harness.rendered().is_empty());

  harness.edit(14, 14, "\n");
  assert_eq!(harness.view.selection().ranges(), &[Range::point(15)]);
  assert_eq!(harness.rendered(), vec![(0, 14, "20240101120000".to_string())]);
}

#[test]
fn test_destroy_and_fresh_views() {
  let mut registry = ExtensionRegistry::new();
  registry.load(&mut DailyProgressPlugin::default());

  let view = EditorView::new(Rope::from(format!("\n{}", journal(2))));
  let mut plugins = registry.create_view_plugins();
  for plugin in &mut plugins {
    plugin.on_view_created(&view);
  }
  assert_eq!(plugins[0].decorations_for_render(&view).len(), 2);

  for plugin in &mut plugins {
    plugin.on_destroy();
  }
  assert!(plugins[0].decorations_for_render(&view).is_empty());
}

fn positions(set: &DecorationSet) -> Vec<(usize, usize, String)> {
  set
    .iter()
    .map(|deco| (deco.from, deco.to, deco.widget.token().to_string()))
    .collect()
}

fn fresh_scan(view: &EditorView) -> Vec<(usize, usize, String)> {
  let mut tracker = ProgressTracker::default();
  tracker.on_view_created(view);
  positions(tracker.decorations())
}

#[test]
fn test_deletion_at_the_top_of_the_viewport_finds_new_tokens() {
  let mut harness = Harness::new("120240101120000\n20240101130000\n", Viewport::default());
  assert_eq!(positions(harness.decorations()), vec![(
    16,
    30,
    "20240101130000".to_string()
  )]);

  harness.edit(0, 1, "");
  assert_eq!(positions(harness.decorations()), vec![
    (0, 14, "20240101120000".to_string()),
    (15, 29, "20240101130000".to_string()),
  ]);
  assert_eq!(positions(harness.decorations()), fresh_scan(&harness.view));
}

#[test]
fn test_deletion_at_the_top_of_a_scrolled_viewport_finds_new_tokens() {
  let text = "a\nb\n120240101120000\n20240101130000\n";
  let mut harness = Harness::new(text, Viewport::new(2, 5));
  assert_eq!(positions(harness.decorations()), vec![(
    20,
    34,
    "20240101130000".to_string()
  )]);

  harness.edit(4, 5, "");
  assert_eq!(positions(harness.decorations()), vec![
    (4, 18, "20240101120000".to_string()),
    (19, 33, "20240101130000".to_string()),
  ]);
  assert_eq!(positions(harness.decorations()), fresh_scan(&harness.view));
}
