//! Editor view state as seen by view plugins.
//!
//! An [`EditorView`] owns one document, its selection, a line-based
//! [`Viewport`] and the [`RenderMode`]. The host mutates the view through
//! [`EditorView::dispatch`], [`EditorView::set_selection`],
//! [`EditorView::scroll_to`] and [`EditorView::set_mode`]; each of these only
//! records what changed. Once per update cycle the host drains the record with
//! [`EditorView::take_update`] and hands the resulting [`ViewUpdate`] to its
//! plugins before painting.
//!
//! ```ignore
//! let mut view = EditorView::new(Rope::from("standup 20240101093000"));
//! let tx = Transaction::change(view.text(), vec![(0, 0, Some("> ".into()))])?;
//! view.dispatch(&tx)?;
//!
//! let update = view.take_update()?;
//! assert!(update.doc_changed());
//! assert!(!update.viewport_moved());
//! ```

use std::ops::Range as CharRange;

use ropey::Rope;
use thiserror::Error;

use crate::{
  selection::{
    Selection,
    SelectionError,
  },
  transaction::{
    Assoc,
    ChangeSet,
    Transaction,
    TransactionError,
  },
};

pub type Result<T> = std::result::Result<T, ViewError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ViewError {
  #[error("selection position {pos} is out of bounds for document length {len}")]
  SelectionOutOfBounds { pos: usize, len: usize },
  #[error(transparent)]
  Transaction(#[from] TransactionError),
  #[error(transparent)]
  Selection(#[from] SelectionError),
}

/// How the host presents the document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
  /// Markup is replaced by rendered equivalents.
  #[default]
  LivePreview,
  /// Raw text, nothing replaced.
  Source,
}

/// The block of lines currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
  pub top:    usize,
  pub height: usize,
}

impl Viewport {
  pub const fn new(top: usize, height: usize) -> Self {
    Self { top, height }
  }
}

impl Default for Viewport {
  fn default() -> Self {
    Self::new(0, 50)
  }
}

/// What changed in a view since the previous update cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewUpdate {
  changes:        ChangeSet,
  viewport_moved: bool,
  selection_set:  bool,
  mode_changed:   bool,
}

impl ViewUpdate {
  /// An update that reports nothing for a document of `len` chars.
  pub fn none(len: usize) -> Self {
    let mut changes = ChangeSet::with_capacity(1);
    changes.retain(len);
    Self {
      changes,
      viewport_moved: false,
      selection_set: false,
      mode_changed: false,
    }
  }

  /// Every edit of the cycle, composed.
  pub fn changes(&self) -> &ChangeSet {
    &self.changes
  }

  pub fn doc_changed(&self) -> bool {
    !self.changes.is_empty()
  }

  /// The visible range changed in a way not explained by mapping it through
  /// the edits.
  pub fn viewport_moved(&self) -> bool {
    self.viewport_moved
  }

  pub fn selection_set(&self) -> bool {
    self.selection_set
  }

  pub fn mode_changed(&self) -> bool {
    self.mode_changed
  }

  pub fn is_empty(&self) -> bool {
    !self.doc_changed() && !self.viewport_moved && !self.selection_set && !self.mode_changed
  }
}

#[derive(Debug, Clone)]
struct Pending {
  changes:        ChangeSet,
  visible_before: CharRange<usize>,
  viewport_moved: bool,
  selection_set:  bool,
  mode_changed:   bool,
}

impl Pending {
  fn new(text: &Rope, visible: CharRange<usize>) -> Self {
    Self {
      changes:        ChangeSet::new(text.slice(..)),
      visible_before: visible,
      viewport_moved: false,
      selection_set:  false,
      mode_changed:   false,
    }
  }
}

#[derive(Debug, Clone)]
pub struct EditorView {
  text:      Rope,
  selection: Selection,
  viewport:  Viewport,
  mode:      RenderMode,
  pending:   Pending,
}

impl EditorView {
  pub fn new(text: Rope) -> Self {
    Self::with_viewport(text, Viewport::default())
  }

  pub fn with_viewport(text: Rope, viewport: Viewport) -> Self {
    let visible = visible_range(&text, viewport);
    let pending = Pending::new(&text, visible);
    Self {
      text,
      selection: Selection::point(0),
      viewport,
      mode: RenderMode::default(),
      pending,
    }
  }

  pub fn text(&self) -> &Rope {
    &self.text
  }

  pub fn selection(&self) -> &Selection {
    &self.selection
  }

  pub fn viewport(&self) -> Viewport {
    self.viewport
  }

  pub fn mode(&self) -> RenderMode {
    self.mode
  }

  pub fn is_live_preview(&self) -> bool {
    self.mode == RenderMode::LivePreview
  }

  /// Char range covered by the viewport's lines.
  pub fn visible_range(&self) -> CharRange<usize> {
    visible_range(&self.text, self.viewport)
  }

  /// Apply an edit. The selection follows the edit unless the transaction
  /// carries its own.
  pub fn dispatch(&mut self, transaction: &Transaction) -> Result<()> {
    let changes = transaction.changes();
    let composed = self.pending.changes.clone().compose(changes.clone())?;

    let mut text = self.text.clone();
    transaction.apply(&mut text)?;
    let selection = match transaction.selection() {
      Some(selection) => {
        self.pending.selection_set = true;
        selection.clone()
      },
      None => self.selection.clone().map(changes)?,
    };
    ensure_in_bounds(&selection, text.len_chars())?;

    self.text = text;
    self.selection = selection;
    self.pending.changes = composed;
    Ok(())
  }

  pub fn set_selection(&mut self, selection: Selection) -> Result<()> {
    ensure_in_bounds(&selection, self.text.len_chars())?;
    if selection != self.selection {
      self.selection = selection;
      self.pending.selection_set = true;
    }
    Ok(())
  }

  pub fn scroll_to(&mut self, top: usize) {
    self.set_viewport(Viewport::new(top, self.viewport.height));
  }

  pub fn resize(&mut self, height: usize) {
    self.set_viewport(Viewport::new(self.viewport.top, height));
  }

  pub fn set_viewport(&mut self, viewport: Viewport) {
    if viewport != self.viewport {
      self.viewport = viewport;
      self.pending.viewport_moved = true;
    }
  }

  pub fn set_mode(&mut self, mode: RenderMode) {
    if mode != self.mode {
      self.mode = mode;
      self.pending.mode_changed = true;
    }
  }

  /// Drain everything recorded since the previous call.
  pub fn take_update(&mut self) -> Result<ViewUpdate> {
    let visible = self.visible_range();
    let fresh = Pending::new(&self.text, visible.clone());
    let pending = std::mem::replace(&mut self.pending, fresh);

    let mut viewport_moved = pending.viewport_moved;
    if !viewport_moved && !pending.changes.is_empty() {
      let CharRange { mut start, mut end } = pending.visible_before;
      // A viewport reaching the end of the document grows with appended text.
      let end_assoc = if end == pending.changes.len() {
        Assoc::After
      } else {
        Assoc::Before
      };
      pending
        .changes
        .update_positions([(&mut start, Assoc::Before), (&mut end, end_assoc)].into_iter())?;
      viewport_moved = (start..end) != visible;
    }

    let mut changes = pending.changes;
    if changes.changes().is_empty() {
      changes = ViewUpdate::none(self.text.len_chars()).changes;
    }

    Ok(ViewUpdate {
      changes,
      viewport_moved,
      selection_set: pending.selection_set,
      mode_changed: pending.mode_changed,
    })
  }
}

fn visible_range(text: &Rope, viewport: Viewport) -> CharRange<usize> {
  let lines = text.len_lines();
  let top = viewport.top.min(lines.saturating_sub(1));
  let bottom = top.saturating_add(viewport.height);

  let from = text.line_to_char(top);
  let to = if bottom >= lines {
    text.len_chars()
  } else {
    text.line_to_char(bottom)
  };
  from..to
}

fn ensure_in_bounds(selection: &Selection, len: usize) -> Result<()> {
  match selection.iter().map(|range| range.to()).find(|&pos| pos > len) {
    Some(pos) => Err(ViewError::SelectionOutOfBounds { pos, len }),
    None => Ok(()),
  }
}
