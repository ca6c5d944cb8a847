//! Named editor commands.
//!
//! Commands are plain function pointers over an [`EditorView`], registered
//! under a stable id and shown to users by name.

use std::collections::HashMap;

use chrono::{
  Local,
  NaiveDateTime,
};
use dayprog_core::timestamp::format_timestamp;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
  Tendril,
  selection::{
    Range,
    Selection,
    SelectionError,
  },
  transaction::{
    Assoc,
    Transaction,
    TransactionError,
  },
  view::{
    EditorView,
    ViewError,
  },
};

pub type CommandFn = fn(&mut EditorView) -> CommandResult;

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CommandError {
  #[error("unknown command: {0}")]
  Unknown(String),
  #[error(transparent)]
  View(#[from] ViewError),
  #[error(transparent)]
  Transaction(#[from] TransactionError),
  #[error(transparent)]
  Selection(#[from] SelectionError),
}

#[derive(Debug, Clone, Copy)]
pub struct Command {
  /// Stable identifier, used for lookups and key bindings.
  pub id:   &'static str,
  /// Human readable name for palettes and menus.
  pub name: &'static str,
  pub fun:  CommandFn,
}

impl Command {
  pub const fn new(id: &'static str, name: &'static str, fun: CommandFn) -> Self {
    Self { id, name, fun }
  }

  pub fn execute(&self, view: &mut EditorView) -> CommandResult {
    (self.fun)(view)
  }
}

pub const INSERT_TIMESTAMP: Command =
  Command::new("insert-time-stamp", "Insert time stamp", insert_timestamp);

#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
  commands: HashMap<&'static str, Command>,
}

impl CommandRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register `command`, returning the command it replaced.
  pub fn register(&mut self, command: Command) -> Option<Command> {
    let replaced = self.commands.insert(command.id, command);
    if replaced.is_some() {
      log::warn!("command {:?} registered twice", command.id);
    }
    replaced
  }

  pub fn get(&self, id: &str) -> Option<&Command> {
    self.commands.get(id)
  }

  pub fn remove(&mut self, id: &str) -> Option<Command> {
    self.commands.remove(id)
  }

  pub fn len(&self) -> usize {
    self.commands.len()
  }

  pub fn is_empty(&self) -> bool {
    self.commands.is_empty()
  }

  pub fn execute(&self, id: &str, view: &mut EditorView) -> CommandResult {
    let command = self
      .get(id)
      .ok_or_else(|| CommandError::Unknown(id.to_string()))?;
    log::debug!("running {}", command.id);
    command.execute(view)
  }

  /// Registered commands, ordered by id.
  pub fn iter(&self) -> impl Iterator<Item = &Command> {
    let mut commands: Vec<_> = self.commands.values().collect();
    commands.sort_by_key(|command| command.id);
    commands.into_iter()
  }
}

fn insert_timestamp(view: &mut EditorView) -> CommandResult {
  insert_timestamp_at(view, &Local::now().naive_local())
}

/// Replace every selection range with the token for `moment` and leave a
/// cursor after each inserted token.
pub fn insert_timestamp_at(view: &mut EditorView, moment: &NaiveDateTime) -> CommandResult {
  let stamp: Tendril = format_timestamp(moment).into();
  let transaction = Transaction::change_by_selection(view.text(), view.selection(), |range| {
    (range.from(), range.to(), Some(stamp.clone()))
  })?;

  let mut cursors: SmallVec<[usize; 1]> = view.selection().iter().map(Range::to).collect();
  transaction
    .changes()
    .update_positions(cursors.iter_mut().map(|pos| (pos, Assoc::After)))?;
  let selection = Selection::new(cursors.into_iter().map(Range::point).collect())?;

  view.dispatch(&transaction.with_selection(selection))?;
  Ok(())
}
