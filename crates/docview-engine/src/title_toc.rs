//! Title and table-of-contents preparation.
//!
//! Preparation runs on the detached container (it may insert the ToC
//! placeholder); application runs once the container is attached, because the
//! ToC builder reads the live headings.

use docview_config::ViewerConfig;
use docview_dom::ViewContainer;
use docview_dom::query;
use docview_host::{TitleSink, TocBuilder};
use regex::Regex;
use tracing::debug;

use crate::error::ViewerError;

/// What was decided for a document at preparation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleTocPlan {
  doc_id: String,
  has_heading: bool,
  has_toc: bool,
}

impl TitleTocPlan {
  pub fn has_heading(&self) -> bool {
    self.has_heading
  }

  pub fn has_toc(&self) -> bool {
    self.has_toc
  }
}

/// Derives title and ToC work from rendered markup.
#[derive(Debug, Clone)]
pub struct TitleTocPreparer {
  no_toc: Regex,
  placeholder: String,
  config: ViewerConfig,
}

impl TitleTocPreparer {
  pub fn new(config: &ViewerConfig) -> Result<Self, ViewerError> {
    Ok(Self {
      no_toc: config.no_toc_regex()?,
      placeholder: config.toc_placeholder.clone(),
      config: config.clone(),
    })
  }

  /// Inspect the first `<h1>` and insert the ToC placeholder right after it when a ToC is wanted.
  pub fn prepare(&self, container: &mut ViewContainer, doc_id: &str) -> TitleTocPlan {
    let heading = query::first_heading(container.inner_html());
    let has_toc = heading
      .as_ref()
      .is_some_and(|h| !self.no_toc.is_match(&h.class_name().unwrap_or_default()));

    if let Some(heading) = heading.as_ref().filter(|_| has_toc) {
      container.insert_html(heading.end, &self.placeholder);
    }

    debug!(doc_id = %doc_id, has_heading = heading.is_some(), has_toc, "title and toc prepared");

    TitleTocPlan {
      doc_id: doc_id.to_string(),
      has_heading: heading.is_some(),
      has_toc,
    }
  }

  /// Reset the ToC, build it if planned, and set the title. Returns the title set.
  pub fn apply(
    &self,
    plan: &TitleTocPlan,
    container: &ViewContainer,
    toc: &dyn TocBuilder,
    title_sink: &dyn TitleSink,
  ) -> String {
    toc.reset();

    let heading = query::first_heading(container.inner_html()).map(|h| h.text());
    if heading.is_some() && plan.has_toc {
      toc.build(container, &plan.doc_id);
    }

    let title = self.config.title_for(heading.as_deref());
    title_sink.set_title(&title);
    title
  }
}
