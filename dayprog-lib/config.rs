use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

pub const DEFAULT_CLASS_NAME: &str = "inline-progress-bar";
pub const DEFAULT_CSS_PROPERTY: &str = "--daily-progress";
pub const DEFAULT_MAX_INCREMENTAL_SPAN: usize = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to parse progress config: {0}")]
  Parse(#[from] toml::de::Error),
}

/// Presentation and update tuning for the progress widgets.
///
/// ```toml
/// class-name = "inline-progress-bar"
/// css-property = "--daily-progress"
/// max-incremental-span = 1000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProgressConfig {
  /// Class of the span holding the percentage label.
  pub class_name:           String,
  /// Custom property carrying the percentage for progress-bar styling.
  pub css_property:         String,
  /// Edited spans inside the viewport longer than this many chars trigger a
  /// full rescan instead of an incremental patch.
  pub max_incremental_span: usize,
}

impl Default for ProgressConfig {
  fn default() -> Self {
    Self {
      class_name:           DEFAULT_CLASS_NAME.to_string(),
      css_property:         DEFAULT_CSS_PROPERTY.to_string(),
      max_incremental_span: DEFAULT_MAX_INCREMENTAL_SPAN,
    }
  }
}

impl ProgressConfig {
  pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(source)?)
  }
}
