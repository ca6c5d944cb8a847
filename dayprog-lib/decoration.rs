//! Replace decorations and the sorted set that holds them.
//!
//! A [`Decoration`] hides the chars `from..to` and shows its widget in their
//! place. A [`DecorationSet`] keeps decorations sorted by `from` (then `to`),
//! follows document edits through [`DecorationSet::map`], and is patched in
//! place by [`DecorationSet::update`].
//!
//! Widgets are reference counted. Mapping and patching move the `Rc`, never
//! the widget, so a decoration on text an edit did not touch keeps the exact
//! widget instance it had before.

use std::{
  ops::Range as CharRange,
  rc::Rc,
};

use crate::{
  transaction::{
    Assoc,
    ChangeSet,
    TransactionError,
  },
  widget::ProgressWidget,
};

#[derive(Debug, Clone)]
pub struct Decoration {
  pub from:   usize,
  pub to:     usize,
  pub widget: Rc<ProgressWidget>,
}

impl Decoration {
  pub fn replace(from: usize, to: usize, widget: Rc<ProgressWidget>) -> Self {
    debug_assert!(from <= to, "decoration bounds are reversed");
    Self { from, to, widget }
  }

  pub fn range(&self) -> CharRange<usize> {
    self.from..self.to
  }

  /// Collapsed decorations cover no text.
  pub fn is_collapsed(&self) -> bool {
    self.from == self.to
  }

  fn sort_key(&self) -> (usize, usize) {
    (self.from, self.to)
  }
}

/// Same bounds and an equal widget.
impl PartialEq for Decoration {
  fn eq(&self, other: &Self) -> bool {
    self.from == other.from && self.to == other.to && self.widget == other.widget
  }
}

impl Eq for Decoration {}

/// A patch applied by [`DecorationSet::update`].
///
/// When `filter` is set, existing decorations touching
/// `filter_from..=filter_to` are dropped first. `add` is inserted afterwards
/// and does not need to be sorted.
#[derive(Debug, Default)]
pub struct DecorationUpdate {
  pub filter_from: usize,
  pub filter_to:   usize,
  pub filter:      bool,
  pub add:         Vec<Decoration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationSet {
  decorations: Vec<Decoration>,
}

impl DecorationSet {
  pub fn none() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.decorations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.decorations.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Decoration> {
    self.decorations.iter()
  }

  pub fn clear(&mut self) {
    self.decorations.clear();
  }

  /// Decorations that touch `from..=to`.
  pub fn between(&self, from: usize, to: usize) -> impl Iterator<Item = &Decoration> {
    let end = self.decorations.partition_point(|deco| deco.from <= to);
    self.decorations[..end]
      .iter()
      .filter(move |deco| deco.to >= from)
  }

  /// Follow a set of document changes.
  ///
  /// The start of a decoration moves past text inserted at it and the end
  /// stays before text inserted at it, so typing next to a token never grows
  /// the decoration. Decorations whose text was deleted entirely are
  /// dropped.
  pub fn map(mut self, changes: &ChangeSet) -> Result<Self, TransactionError> {
    if changes.is_empty() || self.decorations.is_empty() {
      return Ok(self);
    }

    let positions = self.decorations.iter_mut().flat_map(|deco| {
      [
        (&mut deco.from, Assoc::After),
        (&mut deco.to, Assoc::Before),
      ]
    });
    changes.update_positions(positions)?;

    self.decorations.retain(|deco| deco.from < deco.to);
    self.decorations.sort_by_key(Decoration::sort_key);
    Ok(self)
  }

  pub fn update(mut self, update: DecorationUpdate) -> Self {
    let DecorationUpdate {
      filter_from,
      filter_to,
      filter,
      mut add,
    } = update;

    if filter {
      self
        .decorations
        .retain(|deco| deco.to < filter_from || deco.from > filter_to);
    }

    if !add.is_empty() {
      add.sort_by_key(Decoration::sort_key);
      self.decorations = merge_sorted(std::mem::take(&mut self.decorations), add);
    }
    self
  }

  /// Keep the decorations `keep` accepts.
  pub fn filter<F>(&self, mut keep: F) -> Self
  where
    F: FnMut(&Decoration) -> bool,
  {
    Self {
      decorations: self
        .decorations
        .iter()
        .filter(|deco| keep(deco))
        .cloned()
        .collect(),
    }
  }
}

impl<'a> IntoIterator for &'a DecorationSet {
  type IntoIter = std::slice::Iter<'a, Decoration>;
  type Item = &'a Decoration;

  fn into_iter(self) -> Self::IntoIter {
    self.decorations.iter()
  }
}

impl FromIterator<Decoration> for DecorationSet {
  fn from_iter<I: IntoIterator<Item = Decoration>>(iter: I) -> Self {
    let mut decorations: Vec<Decoration> = iter.into_iter().collect();
    decorations.sort_by_key(Decoration::sort_key);
    Self { decorations }
  }
}

fn merge_sorted(left: Vec<Decoration>, right: Vec<Decoration>) -> Vec<Decoration> {
  let mut merged = Vec::with_capacity(left.len() + right.len());
  let mut left = left.into_iter().peekable();
  let mut right = right.into_iter().peekable();

  loop {
    let take_left = match (left.peek(), right.peek()) {
      (Some(l), Some(r)) => l.sort_key() <= r.sort_key(),
      (Some(_), None) => true,
      (None, Some(_)) => false,
      (None, None) => break,
    };
    let next = if take_left { left.next() } else { right.next() };
    merged.extend(next);
  }
  merged
}

#[cfg(test)]
mod test {
  use ropey::Rope;

  use super::*;
  use crate::transaction::Transaction;

  fn deco(from: usize, to: usize, token: &str) -> Decoration {
    Decoration::replace(from, to, Rc::new(ProgressWidget::new(token)))
  }

  fn bounds(set: &DecorationSet) -> Vec<(usize, usize)> {
    set.iter().map(|deco| (deco.from, deco.to)).collect()
  }

  #[test]
  fn collects_sorted() {
    let set: DecorationSet = [
      deco(20, 34, "20240101000000"),
      deco(0, 14, "20240101000000"),
    ]
    .into_iter()
    .collect();
    assert_eq!(bounds(&set), vec![(0, 14), (20, 34)]);
  }

  #[test]
  fn map_shifts_and_keeps_widgets() {
    let doc = Rope::from(format!("{} and {}", "20240101000000", "20240101120000"));
    let set: DecorationSet = [
      deco(0, 14, "20240101000000"),
      deco(19, 33, "20240101120000"),
    ]
    .into_iter()
    .collect();
    let before: Vec<_> = set.iter().map(|deco| deco.widget.clone()).collect();

    let tx = Transaction::change(&doc, vec![(15, 18, Some("or".into()))]).unwrap();
    let mapped = set.map(tx.changes()).unwrap();

    assert_eq!(bounds(&mapped), vec![(0, 14), (18, 32)]);
    for (deco, widget) in mapped.iter().zip(&before) {
      assert!(Rc::ptr_eq(&deco.widget, widget));
    }
  }

  #[test]
  fn insertions_at_the_edges_stay_outside() {
    let doc = Rope::from("x20240101000000x");
    let set: DecorationSet = [deco(1, 15, "20240101000000")].into_iter().collect();

    let tx = Transaction::change(&doc, vec![(1, 1, Some("a".into())), (15, 15, Some("b".into()))])
      .unwrap();
    let mapped = set.map(tx.changes()).unwrap();
    assert_eq!(bounds(&mapped), vec![(2, 16)]);
  }

  #[test]
  fn deleted_decorations_are_dropped() {
    let doc = Rope::from("a 20240101000000 b");
    let set: DecorationSet = [deco(2, 16, "20240101000000")].into_iter().collect();

    let tx = Transaction::change(&doc, vec![(1, 17, None)]).unwrap();
    assert!(set.map(tx.changes()).unwrap().is_empty());
  }

  #[test]
  fn update_filters_then_adds() {
    let set: DecorationSet = [
      deco(0, 14, "20240101000000"),
      deco(20, 34, "20240101000000"),
      deco(40, 54, "20240101000000"),
    ]
    .into_iter()
    .collect();

    let updated = set.update(DecorationUpdate {
      filter_from: 18,
      filter_to:   36,
      filter:      true,
      add:         vec![deco(22, 36, "20240101120000")],
    });
    assert_eq!(bounds(&updated), vec![(0, 14), (22, 36), (40, 54)]);
    assert_eq!(updated.iter().nth(1).unwrap().widget.token(), "20240101120000");
  }

  #[test]
  fn update_filter_is_inclusive() {
    let set: DecorationSet = [deco(0, 14, "20240101000000")].into_iter().collect();
    let updated = set.clone().update(DecorationUpdate {
      filter_from: 14,
      filter_to: 20,
      filter: true,
      ..Default::default()
    });
    assert!(updated.is_empty());

    let updated = set.update(DecorationUpdate {
      filter_from: 15,
      filter_to: 20,
      filter: true,
      ..Default::default()
    });
    assert_eq!(updated.len(), 1);
  }

  #[test]
  fn between_is_inclusive() {
    let set: DecorationSet = [
      deco(0, 14, "20240101000000"),
      deco(20, 34, "20240101000000"),
    ]
    .into_iter()
    .collect();
    assert_eq!(set.between(14, 20).count(), 2);
    assert_eq!(set.between(15, 19).count(), 0);
    assert_eq!(set.between(35, 40).count(), 0);
  }
}
