use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use docview_dom::ViewContainer;
use docview_dom::query::TagMatcher;
use tracing::{debug, warn};

use crate::error::WidgetError;
use crate::widget::{WidgetFactory, WidgetHandle};

/// Instantiates widgets for the placeholder tags found in a container.
///
/// Called once per render; implementations must be re-invocable for every
/// document but need not be idempotent across calls on the same markup.
#[async_trait]
pub trait WidgetHost: Send + Sync {
  async fn embed(
    &self,
    container: &mut ViewContainer,
  ) -> Result<Vec<Box<dyn WidgetHandle>>, WidgetError>;
}

/// A [`WidgetHost`] backed by a tag name to factory registry.
///
/// Tags without a registered factory are left as inert markup. If any factory
/// fails, the widgets already created for this container are destroyed before
/// the error is returned.
#[derive(Default, Clone)]
pub struct TagWidgetHost {
  factories: BTreeMap<String, Arc<dyn WidgetFactory>>,
  matcher: TagMatcher,
}

impl TagWidgetHost {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a factory for a custom element tag (case-insensitive).
  pub fn register(mut self, tag: impl Into<String>, factory: Arc<dyn WidgetFactory>) -> Self {
    self.factories.insert(tag.into().to_ascii_lowercase(), factory);
    self.matcher = TagMatcher::new(self.factories.keys());
    self
  }
}

#[async_trait]
impl WidgetHost for TagWidgetHost {
  async fn embed(
    &self,
    container: &mut ViewContainer,
  ) -> Result<Vec<Box<dyn WidgetHandle>>, WidgetError> {
    let occurrences = self.matcher.find(container.inner_html());
    let mut handles = PartialSet::with_capacity(occurrences.len());

    for occurrence in &occurrences {
      // Instantiation is async from the engine's point of view.
      tokio::task::yield_now().await;

      let Some(factory) = self.factories.get(&occurrence.tag) else {
        continue;
      };

      match factory.create(occurrence) {
        Ok(handle) => handles.0.push(handle),
        Err(e) => {
          warn!(
            container = %container.id(),
            selector = %occurrence.tag,
            error = %e,
            created = handles.0.len(),
            "widget instantiation failed, destroying partial set"
          );
          return Err(e);
        }
      }
    }

    let handles = handles.into_inner();
    debug!(container = %container.id(), widgets = handles.len(), "widgets embedded");
    Ok(handles)
  }
}

/// Widgets created so far by one embed call.
///
/// Destroyed on drop, so a failed or abandoned embed releases what it made.
struct PartialSet(Vec<Box<dyn WidgetHandle>>);

impl PartialSet {
  fn with_capacity(capacity: usize) -> Self {
    Self(Vec::with_capacity(capacity))
  }

  fn into_inner(mut self) -> Vec<Box<dyn WidgetHandle>> {
    std::mem::take(&mut self.0)
  }
}

impl Drop for PartialSet {
  fn drop(&mut self) {
    for handle in self.0.drain(..) {
      handle.destroy();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use docview_dom::HostElement;
  use docview_dom::query::TagOccurrence;
  use std::sync::atomic::{AtomicUsize, Ordering};

  struct CountingWidget {
    selector: String,
    destroyed: Arc<AtomicUsize>,
  }

  impl WidgetHandle for CountingWidget {
    fn selector(&self) -> &str {
      &self.selector
    }

    fn detect_changes(&mut self) {}

    fn destroy(self: Box<Self>) {
      self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
  }

  struct CountingFactory {
    created: AtomicUsize,
    destroyed: Arc<AtomicUsize>,
    fail_on: Option<usize>,
  }

  impl CountingFactory {
    fn new(fail_on: Option<usize>) -> Self {
      Self {
        created: AtomicUsize::new(0),
        destroyed: Arc::new(AtomicUsize::new(0)),
        fail_on,
      }
    }
  }

  impl WidgetFactory for CountingFactory {
    fn create(&self, occurrence: &TagOccurrence) -> Result<Box<dyn WidgetHandle>, WidgetError> {
      let index = self.created.fetch_add(1, Ordering::SeqCst);
      if self.fail_on == Some(index) {
        return Err(WidgetError::instantiation(&occurrence.tag, "boom"));
      }
      Ok(Box::new(CountingWidget {
        selector: occurrence.tag.clone(),
        destroyed: self.destroyed.clone(),
      }))
    }
  }

  fn container_with(markup: &str) -> ViewContainer {
    let mut host = HostElement::new();
    let mut container = host.create_container();
    container.set_inner_html(markup);
    container
  }

  #[tokio::test]
  async fn test_embed_registered_tags() {
    let factory = Arc::new(CountingFactory::new(None));
    let host = TagWidgetHost::new().register("code-example", factory.clone());
    let mut container =
      container_with("<code-example></code-example><p>x</p><CODE-EXAMPLE></CODE-EXAMPLE><live-example></live-example>");

    let handles = host.embed(&mut container).await.unwrap();

    assert_eq!(handles.len(), 2);
    assert!(handles.iter().all(|h| h.selector() == "code-example"));
  }

  #[tokio::test]
  async fn test_later_registrations_are_matched() {
    let first = Arc::new(CountingFactory::new(None));
    let second = Arc::new(CountingFactory::new(None));
    let host = TagWidgetHost::new()
      .register("Code-Example", first.clone())
      .register("live-example", second.clone());
    let mut container = container_with("<live-example></live-example><code-example></code-example>");

    let handles = host.embed(&mut container).await.unwrap();

    let selectors: Vec<_> = handles.iter().map(|h| h.selector().to_string()).collect();
    assert_eq!(selectors, vec!["live-example", "code-example"]);
    assert_eq!(first.created.load(Ordering::SeqCst), 1);
    assert_eq!(second.created.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_embed_without_registrations_is_empty() {
    let host = TagWidgetHost::new();
    let mut container = container_with("<code-example></code-example>");

    let handles = host.embed(&mut container).await.unwrap();
    assert!(handles.is_empty());
  }

  #[tokio::test]
  async fn test_failure_destroys_partial_set() {
    let factory = Arc::new(CountingFactory::new(Some(2)));
    let host = TagWidgetHost::new().register("w-x", factory.clone());
    let mut container = container_with("<w-x></w-x><w-x></w-x><w-x></w-x>");

    let err = host.embed(&mut container).await.err().unwrap();

    assert!(matches!(err, WidgetError::Instantiation { .. }));
    assert_eq!(factory.destroyed.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_abandoned_embed_destroys_created_widgets() {
    use std::task::Poll;

    let factory = Arc::new(CountingFactory::new(None));
    let host = TagWidgetHost::new().register("w-x", factory.clone());
    let mut container = container_with("<w-x></w-x><w-x></w-x><w-x></w-x>");

    let mut embed = host.embed(&mut container);
    for _ in 0..2 {
      let poll = std::future::poll_fn(|cx| Poll::Ready(embed.as_mut().poll(cx))).await;
      assert!(poll.is_pending());
    }
    drop(embed);

    assert_eq!(factory.created.load(Ordering::SeqCst), 1);
    assert_eq!(factory.destroyed.load(Ordering::SeqCst), 1);
  }
}
