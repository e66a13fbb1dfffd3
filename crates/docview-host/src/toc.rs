use std::sync::{Mutex, PoisonError};

use docview_dom::ViewContainer;
use docview_dom::query;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Builds the table of contents for a rendered, attached container.
pub trait TocBuilder: Send + Sync {
  /// Forget the previous document's ToC.
  fn reset(&self);

  /// Build the ToC from the container's headings.
  fn build(&self, container: &ViewContainer, doc_id: &str);
}

/// One entry of the outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocItem {
  pub level: u8,
  pub title: String,
  pub href: String,
}

/// Outlines `<h2>` and `<h3>` headings. Headings without an `id` get no anchor.
#[derive(Debug, Default)]
pub struct OutlineTocBuilder {
  items: Mutex<Vec<TocItem>>,
}

impl OutlineTocBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn items(&self) -> Vec<TocItem> {
    self
      .items
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }
}

impl TocBuilder for OutlineTocBuilder {
  fn reset(&self) {
    self
      .items
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clear();
  }

  fn build(&self, container: &ViewContainer, doc_id: &str) {
    let items: Vec<TocItem> = query::headings(container.inner_html())
      .into_iter()
      .filter_map(|heading| {
        let level = heading.heading_level().filter(|l| (2..=3).contains(l))?;
        let href = match heading.id() {
          Some(id) => format!("{}#{}", doc_id, id),
          None => doc_id.to_string(),
        };
        Some(TocItem {
          level,
          title: heading.text(),
          href,
        })
      })
      .collect();

    debug!(doc_id = %doc_id, items = items.len(), "toc built");
    *self.items.lock().unwrap_or_else(PoisonError::into_inner) = items;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use docview_dom::HostElement;

  #[test]
  fn test_outline_build_and_reset() {
    let mut host = HostElement::new();
    let mut container = host.create_container();
    container.set_inner_html(
      r#"<h1>Guide</h1><h2 id="setup">Setup</h2><h3>Install <code>cli</code></h3><h4 id="deep">Deep</h4>"#,
    );

    let toc = OutlineTocBuilder::new();
    toc.build(&container, "guide/setup");

    assert_eq!(
      toc.items(),
      vec![
        TocItem {
          level: 2,
          title: "Setup".to_string(),
          href: "guide/setup#setup".to_string(),
        },
        TocItem {
          level: 3,
          title: "Install cli".to_string(),
          href: "guide/setup".to_string(),
        },
      ]
    );

    toc.reset();
    assert!(toc.items().is_empty());
  }
}
