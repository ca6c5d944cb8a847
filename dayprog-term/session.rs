//! A single editor view with its plugins attached, driven the way an
//! interactive host would drive it: mutate the view, run an update cycle,
//! paint.

use dayprog_lib::{
  config::ProgressConfig,
  decoration::DecorationSet,
  plugin::{
    DailyProgressPlugin,
    ExtensionRegistry,
  },
  tracker::ViewPlugin,
  view::EditorView,
};
use eyre::Result;

pub struct Session {
  view:     EditorView,
  registry: ExtensionRegistry,
  plugins:  Vec<Box<dyn ViewPlugin>>,
}

impl Session {
  /// Load the plugins and attach them to `view`.
  pub fn open(mut view: EditorView, config: &ProgressConfig) -> Result<Self> {
    let mut registry = ExtensionRegistry::new();
    registry.load(&mut DailyProgressPlugin::new(config.clone()));

    // Whatever was set up before the plugins exist is part of the initial
    // state, not an update.
    view.take_update()?;

    let mut plugins = registry.create_view_plugins();
    for plugin in &mut plugins {
      plugin.on_view_created(&view);
    }
    log::debug!("opened view with {} plugins", plugins.len());

    Ok(Self {
      view,
      registry,
      plugins,
    })
  }

  pub fn view(&self) -> &EditorView {
    &self.view
  }

  pub fn view_mut(&mut self) -> &mut EditorView {
    &mut self.view
  }

  /// Hand everything that changed since the last cycle to the plugins.
  pub fn cycle(&mut self) -> Result<()> {
    let update = self.view.take_update()?;
    if update.is_empty() {
      return Ok(());
    }
    for plugin in &mut self.plugins {
      plugin.on_view_updated(&update, &self.view);
    }
    Ok(())
  }

  pub fn run_command(&mut self, id: &str) -> Result<()> {
    self.registry.commands().execute(id, &mut self.view)?;
    self.cycle()
  }

  pub fn decorations(&self) -> DecorationSet {
    let mut decorations = Vec::new();
    for plugin in &self.plugins {
      decorations.extend(plugin.decorations_for_render(&self.view).iter().cloned());
    }
    decorations.into_iter().collect()
  }
}

impl Drop for Session {
  fn drop(&mut self) {
    for plugin in &mut self.plugins {
      plugin.on_destroy();
    }
  }
}
