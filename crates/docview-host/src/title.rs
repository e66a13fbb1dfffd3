use std::sync::{Mutex, PoisonError};

/// Receives the window title for the displayed document.
pub trait TitleSink: Send + Sync {
  fn set_title(&self, title: &str);
}

/// Keeps every title it was given. The last one is the current title.
#[derive(Debug, Default)]
pub struct RecordingTitleSink {
  titles: Mutex<Vec<String>>,
}

impl RecordingTitleSink {
  pub fn new() -> Self {
    Self::default()
  }

  /// The most recently set title.
  pub fn title(&self) -> Option<String> {
    self.history().pop()
  }

  pub fn history(&self) -> Vec<String> {
    self
      .titles
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }
}

impl TitleSink for RecordingTitleSink {
  fn set_title(&self, title: &str) {
    self
      .titles
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(title.to_string());
  }
}
