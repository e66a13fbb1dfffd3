//! Widget lifecycle management.
//!
//! The manager owns the widget handles of exactly one container at a time.
//! Handles are destroyed when superseded, on teardown, or when the manager is
//! dropped. `WidgetHandle::destroy` consumes the handle, so no handle can be
//! destroyed twice.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use docview_dom::ContainerId;
use docview_host::WidgetHandle;
use tracing::debug;

/// Lifecycle manager shared between the viewer task and its handle.
pub type SharedLifecycle = Arc<Mutex<WidgetLifecycle>>;

pub(crate) fn lock(lifecycle: &SharedLifecycle) -> MutexGuard<'_, WidgetLifecycle> {
  lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tracks the live widget handles of the container that owns them.
#[derive(Default)]
pub struct WidgetLifecycle {
  owner: Option<ContainerId>,
  handles: Vec<Box<dyn WidgetHandle>>,
}

impl WidgetLifecycle {
  pub fn new() -> Self {
    Self::default()
  }

  /// Take ownership of a container's handles. Any handles still held are destroyed first.
  pub fn adopt(&mut self, owner: ContainerId, handles: Vec<Box<dyn WidgetHandle>>) {
    self.destroy_all();
    debug!(container = %owner, widgets = handles.len(), "widgets adopted");
    self.owner = Some(owner);
    self.handles = handles;
  }

  /// Run change detection on every live handle. Returns the number checked.
  pub fn tick(&mut self) -> usize {
    for handle in &mut self.handles {
      handle.detect_changes();
    }
    self.handles.len()
  }

  /// Destroy every live handle. Returns the number destroyed; zero on repeat calls.
  pub fn destroy_all(&mut self) -> usize {
    let count = self.handles.len();
    for handle in self.handles.drain(..) {
      handle.destroy();
    }
    if count > 0 {
      debug!(widgets = count, "widgets destroyed");
    }
    self.owner = None;
    count
  }

  /// The container whose widgets are live.
  pub fn owner(&self) -> Option<ContainerId> {
    self.owner
  }

  pub fn len(&self) -> usize {
    self.handles.len()
  }

  pub fn is_empty(&self) -> bool {
    self.handles.is_empty()
  }

  pub fn selectors(&self) -> Vec<String> {
    self
      .handles
      .iter()
      .map(|handle| handle.selector().to_string())
      .collect()
  }
}

impl Drop for WidgetLifecycle {
  fn drop(&mut self) {
    self.destroy_all();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[derive(Default)]
  struct Counters {
    checks: AtomicUsize,
    destroyed: AtomicUsize,
  }

  struct TestWidget(Arc<Counters>);

  impl WidgetHandle for TestWidget {
    fn selector(&self) -> &str {
      "test-widget"
    }

    fn detect_changes(&mut self) {
      self.0.checks.fetch_add(1, Ordering::SeqCst);
    }

    fn destroy(self: Box<Self>) {
      self.0.destroyed.fetch_add(1, Ordering::SeqCst);
    }
  }

  fn widgets(counters: &Arc<Counters>, n: usize) -> Vec<Box<dyn WidgetHandle>> {
    (0..n)
      .map(|_| Box::new(TestWidget(counters.clone())) as Box<dyn WidgetHandle>)
      .collect()
  }

  #[test]
  fn test_tick_checks_every_handle() {
    let counters = Arc::new(Counters::default());
    let mut lifecycle = WidgetLifecycle::new();
    lifecycle.adopt(ContainerId(1), widgets(&counters, 3));

    assert_eq!(lifecycle.tick(), 3);
    assert_eq!(lifecycle.tick(), 3);
    assert_eq!(counters.checks.load(Ordering::SeqCst), 6);
  }

  #[test]
  fn test_destroy_all_is_idempotent() {
    let counters = Arc::new(Counters::default());
    let mut lifecycle = WidgetLifecycle::new();
    lifecycle.adopt(ContainerId(1), widgets(&counters, 2));

    assert_eq!(lifecycle.destroy_all(), 2);
    assert_eq!(lifecycle.destroy_all(), 0);
    assert_eq!(counters.destroyed.load(Ordering::SeqCst), 2);
    assert!(lifecycle.is_empty());
    assert_eq!(lifecycle.owner(), None);
  }

  #[test]
  fn test_adopt_destroys_superseded_handles() {
    let counters = Arc::new(Counters::default());
    let mut lifecycle = WidgetLifecycle::new();
    lifecycle.adopt(ContainerId(1), widgets(&counters, 2));
    lifecycle.adopt(ContainerId(2), widgets(&counters, 1));

    assert_eq!(counters.destroyed.load(Ordering::SeqCst), 2);
    assert_eq!(lifecycle.owner(), Some(ContainerId(2)));
    assert_eq!(lifecycle.selectors(), vec!["test-widget".to_string()]);
  }

  #[test]
  fn test_drop_destroys_remaining_handles() {
    let counters = Arc::new(Counters::default());
    {
      let mut lifecycle = WidgetLifecycle::new();
      lifecycle.adopt(ContainerId(1), widgets(&counters, 4));
    }
    assert_eq!(counters.destroyed.load(Ordering::SeqCst), 4);
  }
}
