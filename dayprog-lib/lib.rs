use smartstring::{LazyCompact, SmartString};

pub mod command;
pub mod config;
pub mod decoration;
pub mod matcher;
pub mod plugin;
pub mod selection;
pub mod tracker;
pub mod transaction;
pub mod view;
pub mod widget;

pub type Tendril = SmartString<LazyCompact>;
