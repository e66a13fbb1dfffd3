//! Viewer error types.

use docview_config::ConfigError;
use docview_host::WidgetError;

/// Errors that can occur inside the viewer.
///
/// Render failures never reach the code pushing documents; they are reported
/// to the [`ErrorLog`](docview_host::ErrorLog) and the run ends inert.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
  /// The widget host failed to instantiate the document's widgets.
  #[error("failed to embed widgets for document '{doc_id}': {source}")]
  Embed {
    doc_id: String,
    #[source]
    source: WidgetError,
  },

  /// The frame clock stopped delivering frames.
  #[error("frame clock stopped: {message}")]
  FrameClock { message: String },

  /// The viewer no longer accepts documents.
  #[error("viewer is shut down")]
  ShutDown,

  /// The viewer configuration is invalid.
  #[error("invalid viewer configuration: {0}")]
  Config(#[from] ConfigError),

  /// The viewer task ended abnormally.
  #[error("viewer task failed: {message}")]
  Task { message: String },
}

impl ViewerError {
  pub fn frame_clock(message: impl Into<String>) -> Self {
    Self::FrameClock {
      message: message.into(),
    }
  }
}
