use thiserror::Error;

/// Errors that can occur while embedding widgets into a container.
#[derive(Debug, Error)]
pub enum WidgetError {
  /// A factory failed to create a widget for a placeholder tag.
  #[error("failed to instantiate widget '{selector}': {message}")]
  Instantiation { selector: String, message: String },
}

impl WidgetError {
  pub fn instantiation(selector: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Instantiation {
      selector: selector.into(),
      message: message.into(),
    }
  }
}
