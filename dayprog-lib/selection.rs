//! Cursors and selections of a view.
//!
//! A [`Range`] runs from `anchor` to `head`; the head is where the cursor is
//! drawn. `anchor == head` is a plain cursor.
//!
//! ```text
//! anchor=2, head=7: "he[llo w]orld"
//! anchor=7, head=2: "he]llo w[orld"
//! anchor=5, head=5: "hello|world"
//! ```
//!
//! A [`Selection`] holds at least one range. Its ranges are ordered by start
//! and never overlap.

use smallvec::{
  SmallVec,
  smallvec,
};
use thiserror::Error;

use crate::transaction::{
  Assoc,
  ChangeSet,
  TransactionError,
};

pub type Result<T> = std::result::Result<T, SelectionError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
  #[error("selection must contain at least one range")]
  EmptySelection,
  #[error(transparent)]
  Transaction(#[from] TransactionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
  pub anchor: usize,
  pub head:   usize,
}

impl Range {
  pub fn new(anchor: usize, head: usize) -> Self {
    Self { anchor, head }
  }

  #[inline]
  pub fn point(pos: usize) -> Self {
    Self::new(pos, pos)
  }

  #[inline]
  #[must_use]
  pub fn from(&self) -> usize {
    self.anchor.min(self.head)
  }

  #[inline]
  #[must_use]
  pub fn to(&self) -> usize {
    self.anchor.max(self.head)
  }

  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.anchor == self.head
  }

  #[inline]
  fn is_backward(&self) -> bool {
    self.head < self.anchor
  }

  /// Rebuild a range over `from..to` facing the same way as `self`.
  fn with_bounds(&self, from: usize, to: usize) -> Self {
    if self.is_backward() {
      Self::new(to, from)
    } else {
      Self::new(from, to)
    }
  }

  /// Follow `changes`. The start sticks to text inserted at it and the end
  /// stays before text inserted at it, so a selection never grows over an
  /// insertion at its edges. A cursor moves past text typed at it.
  pub fn map(self, changes: &ChangeSet) -> Result<Self> {
    if changes.is_empty() {
      return Ok(self);
    }

    let (mut from, mut to) = (self.from(), self.to());
    let to_assoc = if self.is_empty() {
      Assoc::After
    } else {
      Assoc::Before
    };
    changes.update_positions([(&mut from, Assoc::After), (&mut to, to_assoc)].into_iter())?;
    Ok(self.with_bounds(from, to.max(from)))
  }
}

impl From<(usize, usize)> for Range {
  fn from((anchor, head): (usize, usize)) -> Self {
    Self::new(anchor, head)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
  ranges: SmallVec<[Range; 1]>,
}

impl Selection {
  /// Order `ranges` by start and merge the ones that overlap.
  pub fn new(ranges: SmallVec<[Range; 1]>) -> Result<Self> {
    if ranges.is_empty() {
      return Err(SelectionError::EmptySelection);
    }
    Ok(Self { ranges }.normalized())
  }

  pub fn point(pos: usize) -> Self {
    Range::point(pos).into()
  }

  #[must_use]
  pub fn single(anchor: usize, head: usize) -> Self {
    Range::new(anchor, head).into()
  }

  pub fn ranges(&self) -> &[Range] {
    &self.ranges
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Range> {
    self.ranges.iter()
  }

  pub fn push(mut self, range: Range) -> Self {
    self.ranges.push(range);
    self.normalized()
  }

  pub fn map(self, changes: &ChangeSet) -> Result<Self> {
    if changes.is_empty() {
      return Ok(self);
    }
    let ranges = self
      .ranges
      .into_iter()
      .map(|range| range.map(changes))
      .collect::<Result<SmallVec<_>>>()?;
    Ok(Self { ranges }.normalized())
  }

  fn normalized(mut self) -> Self {
    if self.ranges.len() < 2 {
      return self;
    }
    self.ranges.sort_by_key(Range::from);

    let mut merged: SmallVec<[Range; 1]> = SmallVec::with_capacity(self.ranges.len());
    for range in self.ranges {
      match merged.last_mut() {
        Some(last) if collides(last, &range) => {
          let (from, to) = (last.from(), last.to().max(range.to()));
          *last = if last.is_backward() && range.is_backward() {
            Range::new(to, from)
          } else {
            Range::new(from, to)
          };
        },
        _ => merged.push(range),
      }
    }
    self.ranges = merged;
    self
  }
}

/// `next` starts at or after `prev`. Ranges sharing a start collide, and so do
/// ranges whose interiors intersect. Touching ends do not.
fn collides(prev: &Range, next: &Range) -> bool {
  prev.from() == next.from() || next.from() < prev.to()
}

impl<'a> IntoIterator for &'a Selection {
  type IntoIter = std::slice::Iter<'a, Range>;
  type Item = &'a Range;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl From<Range> for Selection {
  fn from(range: Range) -> Self {
    Self {
      ranges: smallvec![range],
    }
  }
}
