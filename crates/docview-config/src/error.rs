use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or validating a viewer configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// The configuration file could not be read.
  #[error("failed to read config file {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The configuration is not valid JSON for [`ViewerConfig`](crate::ViewerConfig).
  #[error("failed to parse config: {0}")]
  Parse(#[from] serde_json::Error),

  /// A field holds a value the engine cannot use.
  #[error("invalid config field '{field}': {message}")]
  Invalid { field: &'static str, message: String },
}

impl ConfigError {
  pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
    Self::Invalid {
      field,
      message: message.into(),
    }
  }
}
