//! Edits to a view's document.
//!
//! A [`ChangeSet`] walks the old document from its start with three kinds of
//! [`Operation`]: keep `n` chars, drop `n` chars, or splice in new text. The
//! builder keeps the sequence canonical: neighbouring operations of the same
//! kind are fused, and an insertion always comes before a deletion at the same
//! spot, so "insert then delete" reads as a replacement.
//!
//! A [`Transaction`] is a change set plus an optional selection to put in
//! place afterwards. Plugins see the composed change set of an update cycle
//! and use it to move their own positions ([`ChangeSet::update_positions`])
//! and to find what was edited ([`ChangeSet::spans`]).
//!
//! ```ignore
//! use dayprog_lib::transaction::{Assoc, Transaction};
//! use ropey::Rope;
//!
//! let mut doc = Rope::from("at 20240101120000");
//! let tx = Transaction::change(&doc, vec![(0, 0, Some("meet ".into()))]).unwrap();
//! tx.apply(&mut doc).unwrap();
//!
//! assert_eq!(tx.changes().map_pos(3, Assoc::After).unwrap(), 8);
//! ```

use std::{
  iter::Peekable,
  slice,
};

use ropey::{
  Rope,
  RopeSlice,
};
use thiserror::Error;

use crate::{
  Tendril,
  selection::{
    Range,
    Selection,
  },
};

pub type Result<T> = std::result::Result<T, TransactionError>;

/// Replace `from..to` with the text, or delete it when there is none.
pub type Change = (usize, usize, Option<Tendril>);

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransactionError {
  #[error("changeset expects a document of {expected} chars, got {actual}")]
  LengthMismatch { expected: usize, actual: usize },
  #[error("cannot compose: first changeset produces {left_len_after} chars, second expects {right_len}")]
  ComposeLengthMismatch {
    left_len_after: usize,
    right_len:      usize,
  },
  #[error("invalid change range: start {from} is after end {to}")]
  InvalidRange { from: usize, to: usize },
  #[error("change range {from}..{to} is out of bounds for document length {len}")]
  RangeOutOfBounds {
    from: usize,
    to:   usize,
    len:  usize,
  },
  #[error("change range {from}..{to} starts before the previous change ends at {prev_end}")]
  OverlappingRange {
    prev_end: usize,
    from:     usize,
    to:       usize,
  },
  #[error("positions {positions:?} are out of bounds for changeset length {len}")]
  PositionsOutOfBounds {
    positions: Vec<usize>,
    len:       usize,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
  Retain(usize),
  Delete(usize),
  Insert(Tendril),
}

impl Operation {
  pub fn len_chars(&self) -> usize {
    match self {
      Operation::Retain(n) | Operation::Delete(n) => *n,
      Operation::Insert(text) => text.chars().count(),
    }
  }

  /// What is left after the first `n` chars are consumed, if anything.
  fn skip(self, n: usize) -> Option<Self> {
    match self {
      Operation::Retain(len) => (len > n).then(|| Operation::Retain(len - n)),
      Operation::Delete(len) => (len > n).then(|| Operation::Delete(len - n)),
      Operation::Insert(text) => {
        let cut = byte_offset(&text, n);
        (cut < text.len()).then(|| Operation::Insert(text[cut..].into()))
      },
    }
  }
}

/// Which side of an insertion a position sticks to when the insertion lands
/// exactly on it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Assoc {
  /// Stay in front of the inserted text.
  Before,
  /// Move past the inserted text.
  After,
}

impl Assoc {
  fn insert_offset(self, inserted: usize) -> usize {
    match self {
      Assoc::Before => 0,
      Assoc::After => inserted,
    }
  }
}

/// One edited region, in both the old and the new document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSpan {
  pub old_from: usize,
  pub old_to:   usize,
  pub new_from: usize,
  pub new_to:   usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
  changes:   Vec<Operation>,
  /// Length of the document this applies to.
  len:       usize,
  len_after: usize,
}

impl ChangeSet {
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      changes:   Vec::with_capacity(capacity),
      len:       0,
      len_after: 0,
    }
  }

  /// An identity change set for `doc`.
  #[must_use]
  pub fn new(doc: RopeSlice) -> Self {
    let len = doc.len_chars();
    Self {
      changes: Vec::new(),
      len,
      len_after: len,
    }
  }

  pub fn changes(&self) -> &[Operation] {
    &self.changes
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn len_after(&self) -> usize {
    self.len_after
  }

  /// True when applying this would leave the document untouched.
  pub fn is_empty(&self) -> bool {
    match self.changes.as_slice() {
      [] => true,
      [Operation::Retain(n)] => *n == self.len,
      _ => false,
    }
  }

  pub fn retain(&mut self, n: usize) {
    if n == 0 {
      return;
    }
    self.len += n;
    self.len_after += n;
    match self.changes.last_mut() {
      Some(Operation::Retain(count)) => *count += n,
      _ => self.changes.push(Operation::Retain(n)),
    }
  }

  pub fn delete(&mut self, n: usize) {
    if n == 0 {
      return;
    }
    self.len += n;
    match self.changes.last_mut() {
      Some(Operation::Delete(count)) => *count += n,
      _ => self.changes.push(Operation::Delete(n)),
    }
  }

  pub fn insert(&mut self, text: Tendril) {
    if text.is_empty() {
      return;
    }
    self.len_after += text.chars().count();

    match self.changes.as_mut_slice() {
      // Extend the pending insertion, even when a deletion already follows it.
      [.., Operation::Insert(prev)] | [.., Operation::Insert(prev), Operation::Delete(_)] => {
        prev.push_str(&text);
      },
      // Keep insertions ahead of deletions.
      [.., last @ Operation::Delete(_)] => {
        let deleted = std::mem::replace(last, Operation::Insert(text));
        self.changes.push(deleted);
      },
      _ => self.changes.push(Operation::Insert(text)),
    }
  }

  /// The single change set doing `self` and then `other`.
  pub fn compose(self, other: Self) -> Result<Self> {
    if self.len_after != other.len {
      return Err(TransactionError::ComposeLengthMismatch {
        left_len_after: self.len_after,
        right_len:      other.len,
      });
    }
    if self.changes.is_empty() {
      return Ok(other);
    }
    if other.changes.is_empty() {
      return Ok(self);
    }

    let mut out = Self::with_capacity(self.changes.len() + other.changes.len());
    let mut first = self.changes.into_iter();
    let mut second = other.changes.into_iter();
    let mut a = first.next();
    let mut b = second.next();

    loop {
      match (a.take(), b.take()) {
        (None, None) => break,
        // Deleted by the first set, never seen by the second.
        (Some(Operation::Delete(n)), pending) => {
          out.delete(n);
          a = first.next();
          b = pending;
        },
        // Inserted by the second set, nothing from the first involved.
        (pending, Some(Operation::Insert(text))) => {
          out.insert(text);
          a = pending;
          b = second.next();
        },
        // Both now walk the same stretch of the intermediate document.
        (Some(left), Some(right)) => {
          let step = left.len_chars().min(right.len_chars());
          match (&left, &right) {
            (Operation::Retain(_), Operation::Retain(_)) => out.retain(step),
            (Operation::Retain(_), Operation::Delete(_)) => out.delete(step),
            (Operation::Insert(text), Operation::Retain(_)) => {
              out.insert(text[..byte_offset(text, step)].into())
            },
            // Inserted then deleted again.
            (Operation::Insert(_), Operation::Delete(_)) => {},
            // Deletes on the left and inserts on the right were taken above.
            (left, right) => unreachable!("compose: {left:?} against {right:?}"),
          }
          a = left.skip(step).or_else(|| first.next());
          b = right.skip(step).or_else(|| second.next());
        },
        // Both sides cover `self.len_after` chars, checked against
        // `ComposeLengthMismatch` on entry, so they run out together.
        (left, right) => unreachable!("compose ran past the end: {left:?} against {right:?}"),
      }
    }

    debug_assert_eq!(out.len, self.len);
    Ok(out)
  }

  pub fn apply(&self, text: &mut Rope) -> Result<()> {
    if text.len_chars() != self.len {
      return Err(TransactionError::LengthMismatch {
        expected: self.len,
        actual:   text.len_chars(),
      });
    }

    let mut pos = 0;
    for op in &self.changes {
      match op {
        Operation::Retain(n) => pos += n,
        Operation::Delete(n) => text.remove(pos..pos + n),
        Operation::Insert(s) => {
          text.insert(pos, s);
          pos += s.chars().count();
        },
      }
    }
    Ok(())
  }

  /// Move every position to where it ends up after the change.
  ///
  /// Sorted input is mapped in one pass over the operations. A position
  /// smaller than its predecessor restarts the walk from the beginning.
  /// Positions past the end of the old document are reported together.
  pub fn update_positions<'a>(
    &self,
    positions: impl Iterator<Item = (&'a mut usize, Assoc)>,
  ) -> Result<()> {
    let mut walker = PositionWalker::new(&self.changes);
    let mut out_of_bounds = Vec::new();

    for (pos, assoc) in positions {
      if *pos < walker.old_pos {
        walker = PositionWalker::new(&self.changes);
      }
      match walker.map(*pos, assoc) {
        Some(mapped) => *pos = mapped,
        None => out_of_bounds.push(*pos),
      }
    }

    if out_of_bounds.is_empty() {
      Ok(())
    } else {
      Err(TransactionError::PositionsOutOfBounds {
        positions: out_of_bounds,
        len:       self.len,
      })
    }
  }

  pub fn map_pos(&self, mut pos: usize, assoc: Assoc) -> Result<usize> {
    self.update_positions(std::iter::once((&mut pos, assoc)))?;
    Ok(pos)
  }

  /// The edited regions, with their bounds before and after the change.
  pub fn spans(&self) -> SpanIterator<'_> {
    SpanIterator {
      ops:     self.changes.iter().peekable(),
      old_pos: 0,
      new_pos: 0,
    }
  }
}

/// Byte index of the `n`th char, or the string length past the end.
fn byte_offset(s: &str, n: usize) -> usize {
  s.char_indices().nth(n).map_or(s.len(), |(pos, _)| pos)
}

/// Cursor over the operations of a change set, tracking where the current
/// operation starts in the old and the new document.
struct PositionWalker<'a> {
  ops:     &'a [Operation],
  index:   usize,
  old_pos: usize,
  new_pos: usize,
}

impl<'a> PositionWalker<'a> {
  fn new(ops: &'a [Operation]) -> Self {
    Self {
      ops,
      index: 0,
      old_pos: 0,
      new_pos: 0,
    }
  }

  /// Map `pos`, which must not be behind `old_pos`. The walker stops at the
  /// operation holding `pos` so equal or later positions can reuse it.
  fn map(&mut self, pos: usize, assoc: Assoc) -> Option<usize> {
    while let Some(op) = self.ops.get(self.index) {
      match op {
        Operation::Retain(n) => {
          if pos < self.old_pos + n {
            return Some(self.new_pos + (pos - self.old_pos));
          }
          self.old_pos += n;
          self.new_pos += n;
          self.index += 1;
        },
        Operation::Delete(n) => {
          if pos < self.old_pos + n {
            return Some(self.new_pos);
          }
          self.old_pos += n;
          self.index += 1;
        },
        Operation::Insert(text) => {
          let inserted = text.chars().count();
          let replaced = match self.ops.get(self.index + 1) {
            Some(Operation::Delete(n)) => *n,
            _ => 0,
          };
          if pos == self.old_pos && replaced > 0 {
            return Some(self.new_pos);
          }
          if pos == self.old_pos || pos < self.old_pos + replaced {
            return Some(self.new_pos + assoc.insert_offset(inserted));
          }
          self.old_pos += replaced;
          self.new_pos += inserted;
          self.index += if replaced > 0 { 2 } else { 1 };
        },
      }
    }
    (pos == self.old_pos).then_some(self.new_pos)
  }
}

pub struct SpanIterator<'a> {
  ops:     Peekable<slice::Iter<'a, Operation>>,
  old_pos: usize,
  new_pos: usize,
}

impl Iterator for SpanIterator<'_> {
  type Item = ChangeSpan;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      let (deleted, inserted) = match self.ops.next()? {
        Operation::Retain(n) => {
          self.old_pos += n;
          self.new_pos += n;
          continue;
        },
        Operation::Delete(n) => (*n, 0),
        Operation::Insert(text) => {
          let deleted = match self.ops.next_if(|op| matches!(op, Operation::Delete(_))) {
            Some(Operation::Delete(n)) => *n,
            _ => 0,
          };
          (deleted, text.chars().count())
        },
      };

      let span = ChangeSpan {
        old_from: self.old_pos,
        old_to:   self.old_pos + deleted,
        new_from: self.new_pos,
        new_to:   self.new_pos + inserted,
      };
      self.old_pos += deleted;
      self.new_pos += inserted;
      return Some(span);
    }
  }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transaction {
  changes:   ChangeSet,
  selection: Option<Selection>,
}

impl From<ChangeSet> for Transaction {
  fn from(changes: ChangeSet) -> Self {
    Self {
      changes,
      selection: None,
    }
  }
}

impl Transaction {
  pub fn changes(&self) -> &ChangeSet {
    &self.changes
  }

  /// The selection to install once applied, if the transaction sets one.
  pub fn selection(&self) -> Option<&Selection> {
    self.selection.as_ref()
  }

  pub fn with_selection(mut self, selection: Selection) -> Self {
    self.selection = Some(selection);
    self
  }

  pub fn apply(&self, doc: &mut Rope) -> Result<()> {
    self.changes.apply(doc)
  }

  /// Build a transaction from changes given in document order. Changes may
  /// touch but not overlap.
  pub fn change<I>(doc: &Rope, changes: I) -> Result<Self>
  where
    I: IntoIterator<Item = Change>,
  {
    let len = doc.len_chars();
    let changes = changes.into_iter();
    let mut changeset = ChangeSet::with_capacity(2 * changes.size_hint().0 + 1);

    let mut last = 0;
    for (from, to, text) in changes {
      if from > to {
        return Err(TransactionError::InvalidRange { from, to });
      }
      if to > len {
        return Err(TransactionError::RangeOutOfBounds { from, to, len });
      }
      if from < last {
        return Err(TransactionError::OverlappingRange {
          prev_end: last,
          from,
          to,
        });
      }

      changeset.retain(from - last);
      if let Some(text) = text {
        changeset.insert(text);
      }
      changeset.delete(to - from);
      last = to;
    }
    changeset.retain(len - last);

    Ok(changeset.into())
  }

  /// One change per selection range, in selection order.
  pub fn change_by_selection<F>(doc: &Rope, selection: &Selection, f: F) -> Result<Self>
  where
    F: FnMut(&Range) -> Change,
  {
    Self::change(doc, selection.iter().map(f))
  }
}
