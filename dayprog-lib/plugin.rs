//! Plugin lifecycle.
//!
//! A [`Plugin`] contributes view plugins and commands to a [`PluginHost`]
//! when it is loaded. View plugins are registered as factories because the
//! host creates one instance per editor view.

use crate::{
  command::{
    Command,
    CommandRegistry,
    INSERT_TIMESTAMP,
  },
  config::ProgressConfig,
  tracker::{
    ProgressTracker,
    ViewPlugin,
  },
};

pub type ViewPluginFactory = Box<dyn Fn() -> Box<dyn ViewPlugin>>;

/// Registration surface a host application exposes to plugins.
pub trait PluginHost {
  fn register_view_plugin(&mut self, factory: ViewPluginFactory);

  fn add_command(&mut self, command: Command);
}

pub trait Plugin {
  fn on_load(&mut self, host: &mut dyn PluginHost);

  fn on_unload(&mut self) {}
}

/// Inline day-progress widgets plus the "Insert time stamp" command.
#[derive(Debug, Clone, Default)]
pub struct DailyProgressPlugin {
  config: ProgressConfig,
}

impl DailyProgressPlugin {
  pub fn new(config: ProgressConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &ProgressConfig {
    &self.config
  }
}

impl Plugin for DailyProgressPlugin {
  fn on_load(&mut self, host: &mut dyn PluginHost) {
    let config = self.config.clone();
    host.register_view_plugin(Box::new(move || Box::new(ProgressTracker::new(&config))));
    host.add_command(INSERT_TIMESTAMP);
  }
}

/// A [`PluginHost`] that records what plugins registered.
#[derive(Default)]
pub struct ExtensionRegistry {
  view_plugins: Vec<ViewPluginFactory>,
  commands:     CommandRegistry,
}

impl ExtensionRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn load(&mut self, plugin: &mut dyn Plugin) {
    plugin.on_load(self);
  }

  /// One fresh instance of every registered view plugin, for a new view.
  pub fn create_view_plugins(&self) -> Vec<Box<dyn ViewPlugin>> {
    self.view_plugins.iter().map(|factory| factory()).collect()
  }

  pub fn view_plugin_count(&self) -> usize {
    self.view_plugins.len()
  }

  pub fn commands(&self) -> &CommandRegistry {
    &self.commands
  }
}

impl PluginHost for ExtensionRegistry {
  fn register_view_plugin(&mut self, factory: ViewPluginFactory) {
    self.view_plugins.push(factory);
  }

  fn add_command(&mut self, command: Command) {
    self.commands.register(command);
  }
}
