use std::path::Path;
use std::time::Duration;

use docview_dom::css;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings for a document viewer instance.
///
/// Every field has a default, so a partial JSON object (or `{}`) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
  /// Run the leave/enter crossfade. When false, durations collapse to zero.
  pub animations_enabled: bool,

  /// Inline transition duration for each phase, in milliseconds.
  pub transition_ms: u64,

  /// Interval of the timed frame clock, in milliseconds.
  pub frame_interval_ms: u64,

  /// Title used when a document has no usable heading, and as the title prefix otherwise.
  pub default_title: String,

  /// Separator between `default_title` and the heading text.
  pub title_separator: String,

  /// Markup inserted right after the first heading of documents that get a ToC.
  pub toc_placeholder: String,

  /// Pattern matched against the heading's class attribute to opt out of a ToC.
  pub no_toc_pattern: String,

  /// Transition duration imposed by global styles (CSS time, e.g. `0.5s`).
  pub stylesheet_transition: Option<String>,

  /// Capacity of the document channel feeding the viewer.
  pub channel_buffer: usize,
}

impl Default for ViewerConfig {
  fn default() -> Self {
    Self {
      animations_enabled: true,
      transition_ms: 333,
      frame_interval_ms: 16,
      default_title: "Docs".to_string(),
      title_separator: " - ".to_string(),
      toc_placeholder: r#"<doc-toc class="embedded"></doc-toc>"#.to_string(),
      no_toc_pattern: "(?i)no-?toc".to_string(),
      stylesheet_transition: None,
      channel_buffer: 100,
    }
  }
}

impl ViewerConfig {
  /// Parse and validate a JSON configuration.
  pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
    let config: ViewerConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
  }

  /// Read, parse and validate a JSON configuration file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json_str(&content)
  }

  /// Check the fields the engine relies on.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.channel_buffer == 0 {
      return Err(ConfigError::invalid(
        "channel_buffer",
        "must be greater than zero",
      ));
    }

    if self.frame_interval_ms == 0 {
      return Err(ConfigError::invalid(
        "frame_interval_ms",
        "must be greater than zero",
      ));
    }

    self.no_toc_regex()?;

    if let Some(value) = &self.stylesheet_transition {
      if css::parse_duration_list(value).is_none() {
        return Err(ConfigError::invalid(
          "stylesheet_transition",
          format!("'{}' is not a CSS time value", value),
        ));
      }
    }

    Ok(())
  }

  /// Compiled no-toc marker pattern.
  pub fn no_toc_regex(&self) -> Result<Regex, ConfigError> {
    Regex::new(&self.no_toc_pattern)
      .map_err(|e| ConfigError::invalid("no_toc_pattern", e.to_string()))
  }

  pub fn transition(&self) -> Duration {
    Duration::from_millis(self.transition_ms)
  }

  pub fn frame_interval(&self) -> Duration {
    Duration::from_millis(self.frame_interval_ms)
  }

  /// Window title for a document heading, or the default title when there is none.
  pub fn title_for(&self, heading: Option<&str>) -> String {
    match heading.map(str::trim).filter(|text| !text.is_empty()) {
      Some(text) => format!("{}{}{}", self.default_title, self.title_separator, text),
      None => self.default_title.clone(),
    }
  }
}
