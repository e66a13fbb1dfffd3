use docview_dom::query::TagOccurrence;
use tracing::debug;

use crate::error::WidgetError;

/// A live widget instantiated inside rendered markup.
///
/// `destroy` consumes the handle, so a handle can be destroyed at most once.
pub trait WidgetHandle: Send {
  /// The placeholder tag this widget was created for.
  fn selector(&self) -> &str;

  /// Run change detection. Called once per host check cycle.
  fn detect_changes(&mut self);

  /// Tear the widget down and release its resources.
  fn destroy(self: Box<Self>);
}

/// Creates widgets for one placeholder tag.
pub trait WidgetFactory: Send + Sync {
  fn create(&self, occurrence: &TagOccurrence) -> Result<Box<dyn WidgetHandle>, WidgetError>;
}

/// A widget that only traces its lifecycle. Useful for headless rendering.
#[derive(Debug)]
pub struct LoggingWidget {
  selector: String,
  offset: usize,
  checks: u64,
}

impl WidgetHandle for LoggingWidget {
  fn selector(&self) -> &str {
    &self.selector
  }

  fn detect_changes(&mut self) {
    self.checks += 1;
  }

  fn destroy(self: Box<Self>) {
    debug!(
      selector = %self.selector,
      offset = self.offset,
      checks = self.checks,
      "widget destroyed"
    );
  }
}

/// Factory for [`LoggingWidget`]s.
#[derive(Debug, Clone, Default)]
pub struct LoggingWidgetFactory;

impl WidgetFactory for LoggingWidgetFactory {
  fn create(&self, occurrence: &TagOccurrence) -> Result<Box<dyn WidgetHandle>, WidgetError> {
    debug!(selector = %occurrence.tag, offset = occurrence.offset, "widget created");
    Ok(Box::new(LoggingWidget {
      selector: occurrence.tag.clone(),
      offset: occurrence.offset,
      checks: 0,
    }))
  }
}
