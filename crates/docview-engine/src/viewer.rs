//! The render pipeline.
//!
//! [`DocViewer`] owns the host element, the recycled container pair, the
//! widget lifecycle and every collaborator. One call to [`DocViewer::render`]
//! is one run:
//!
//! 1. write the document markup into the next container
//! 2. prepare title/ToC (may insert the ToC placeholder)
//! 3. embed widgets (await)
//! 4. emit `DocReady`
//! 5. destroy the previous run's widgets
//! 6. adopt the new widgets for the next container
//! 7. swap views, applying title/ToC once the next view is attached (await)
//! 8. emit `DocRendered`
//!
//! A run is cancelled by dropping its future; stages that have not executed
//! never will. Failures are logged and recovered from, never propagated.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use docview_config::ViewerConfig;
use docview_dom::{ContainerId, HostElement};
use docview_host::{
  ErrorLog, OutlineTocBuilder, RecordingTitleSink, TagWidgetHost, TitleSink, TocBuilder,
  TracingErrorLog, WidgetHost,
};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::animator::{TransitionAnimator, TransitionPhase, ViewPair};
use crate::error::ViewerError;
use crate::events::{EventGate, NoopNotifier, RunEvents, ViewerEvent, ViewerNotifier};
use crate::frame::{FrameClock, IntervalFrameClock};
use crate::lifecycle::{self, SharedLifecycle, WidgetLifecycle};
use crate::title_toc::TitleTocPreparer;

/// A document to display. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
  /// Opaque key used for logging and ToC scoping.
  pub id: String,
  /// Raw, trusted markup.
  pub contents: String,
}

impl Document {
  pub fn new(id: impl Into<String>, contents: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      contents: contents.into(),
    }
  }
}

/// What the host element shows before the first document arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InitialView {
  /// An empty view.
  #[default]
  Empty,
  /// Markup rendered ahead of time (e.g. by a prerenderer), shown as-is.
  Prerendered(String),
}

/// Everything the viewer talks to.
#[derive(Clone)]
pub struct Collaborators {
  pub widgets: Arc<dyn WidgetHost>,
  pub toc: Arc<dyn TocBuilder>,
  pub title: Arc<dyn TitleSink>,
  pub errors: Arc<dyn ErrorLog>,
  pub frames: Arc<dyn FrameClock>,
  pub notifier: Arc<dyn ViewerNotifier>,
}

impl Collaborators {
  /// In-memory collaborators with timed frames at the configured interval.
  pub fn headless(config: &ViewerConfig) -> Self {
    Self {
      widgets: Arc::new(TagWidgetHost::new()),
      toc: Arc::new(OutlineTocBuilder::new()),
      title: Arc::new(RecordingTitleSink::new()),
      errors: Arc::new(TracingErrorLog),
      frames: Arc::new(IntervalFrameClock::new(config.frame_interval())),
      notifier: Arc::new(NoopNotifier),
    }
  }

  pub fn with_widgets(mut self, widgets: Arc<dyn WidgetHost>) -> Self {
    self.widgets = widgets;
    self
  }

  pub fn with_toc(mut self, toc: Arc<dyn TocBuilder>) -> Self {
    self.toc = toc;
    self
  }

  pub fn with_title(mut self, title: Arc<dyn TitleSink>) -> Self {
    self.title = title;
    self
  }

  pub fn with_errors(mut self, errors: Arc<dyn ErrorLog>) -> Self {
    self.errors = errors;
    self
  }

  pub fn with_frames(mut self, frames: Arc<dyn FrameClock>) -> Self {
    self.frames = frames;
    self
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn ViewerNotifier>) -> Self {
    self.notifier = notifier;
    self
  }
}

/// How a settled run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
  Rendered,
  Failed,
  /// The viewer was torn down; nothing visible changed.
  ShutDown,
}

/// State of the viewer after the most recent settled run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
  /// Generation of the run that settled.
  pub generation: u64,
  /// Document id of the run that settled.
  pub settled_doc: Option<String>,
  pub outcome: Option<RunOutcome>,
  /// Document id of the view that is visible.
  pub displayed_doc: Option<String>,
  /// Number of containers attached to the host element.
  pub attached: usize,
  /// Markup of the visible view.
  pub markup: String,
  /// Whether the detached container holds no markup.
  pub next_is_empty: bool,
  /// Live widget handles.
  pub widgets: usize,
  /// Selectors of the live widgets, in document order.
  pub selectors: Vec<String>,
  pub title: Option<String>,
}

/// The document viewer: render pipeline, animator and widget lifecycle.
pub struct DocViewer {
  pub(crate) config: ViewerConfig,
  host: HostElement,
  views: ViewPair,
  animator: TransitionAnimator,
  preparer: TitleTocPreparer,
  pub(crate) lifecycle: SharedLifecycle,
  widgets: Arc<dyn WidgetHost>,
  toc: Arc<dyn TocBuilder>,
  title: Arc<dyn TitleSink>,
  errors: Arc<dyn ErrorLog>,
  gate: EventGate,
  pub(crate) shutdown: CancellationToken,
  pub(crate) snapshot: watch::Sender<ViewSnapshot>,
  /// Document last inserted into each container.
  inserted: BTreeMap<ContainerId, String>,
  last_title: Option<String>,
}

impl DocViewer {
  /// Create a viewer. The initial view is attached immediately.
  pub fn new(
    config: ViewerConfig,
    collaborators: Collaborators,
    initial: InitialView,
  ) -> Result<Self, ViewerError> {
    config.validate()?;

    let mut host = HostElement::new();
    let mut current = host.create_container();
    let next = host.create_container();
    if let InitialView::Prerendered(markup) = initial {
      current.set_inner_html(markup);
    }
    host.append(&current);

    let shutdown = CancellationToken::new();
    let preparer = TitleTocPreparer::new(&config)?;
    let animator = TransitionAnimator::new(&config, collaborators.frames);
    let (snapshot, _) = watch::channel(ViewSnapshot {
      attached: host.attached_count(),
      markup: current.inner_html().to_string(),
      next_is_empty: true,
      ..Default::default()
    });

    Ok(Self {
      config,
      host,
      views: ViewPair { current, next },
      animator,
      preparer,
      lifecycle: Arc::new(Mutex::new(WidgetLifecycle::new())),
      widgets: collaborators.widgets,
      toc: collaborators.toc,
      title: collaborators.title,
      errors: collaborators.errors,
      gate: EventGate::new(collaborators.notifier, shutdown.clone()),
      shutdown,
      snapshot,
      inserted: BTreeMap::new(),
      last_title: None,
    })
  }

  /// Render one document end to end. Never fails; failures are logged and recovered.
  #[instrument(
    name = "doc_render",
    skip(self, doc),
    fields(
      doc_id = %doc.id,
      run_id = %uuid::Uuid::new_v4(),
    )
  )]
  pub async fn render(&mut self, doc: Document) -> RunOutcome {
    if self.shutdown.is_cancelled() {
      debug!("viewer torn down, document ignored");
      return RunOutcome::ShutDown;
    }

    let run = self.gate.begin_run();
    info!(generation = run.generation(), "render_started");

    let outcome = match self.run_stages(&doc, &run).await {
      Ok(()) => {
        info!(generation = run.generation(), "render_completed");
        RunOutcome::Rendered
      }
      Err(ViewerError::ShutDown) => {
        self.views.next.clear();
        info!(generation = run.generation(), "render abandoned at teardown");
        return RunOutcome::ShutDown;
      }
      Err(e) => {
        self.recover(&doc, &e);
        RunOutcome::Failed
      }
    };

    self.publish(&run, &doc, outcome);
    outcome
  }

  async fn run_stages(&mut self, doc: &Document, run: &RunEvents) -> Result<(), ViewerError> {
    self.settle_interrupted_swap();

    // Trusted markup, written as-is.
    self.views.next.set_inner_html(doc.contents.as_str());
    let plan = self.preparer.prepare(&mut self.views.next, &doc.id);

    let embedded = self.widgets.embed(&mut self.views.next).await;
    if self.shutdown.is_cancelled() {
      for handle in embedded.into_iter().flatten() {
        handle.destroy();
      }
      return Err(ViewerError::ShutDown);
    }
    let handles = embedded.map_err(|source| ViewerError::Embed {
      doc_id: doc.id.clone(),
      source,
    })?;
    run.emit(ViewerEvent::DocReady);

    {
      let mut lifecycle = lifecycle::lock(&self.lifecycle);
      lifecycle.destroy_all();
      lifecycle.adopt(self.views.next.id(), handles);
    }

    let Self {
      animator,
      host,
      views,
      preparer,
      toc,
      title,
      inserted,
      last_title,
      ..
    } = self;
    animator
      .swap(host, views, run, |container| {
        inserted.insert(container.id(), doc.id.clone());
        *last_title = Some(preparer.apply(&plan, container, &**toc, &**title));
      })
      .await?;

    run.emit(ViewerEvent::DocRendered);
    Ok(())
  }

  /// Make the attached container the "current" one after a swap was cut short.
  fn settle_interrupted_swap(&mut self) {
    if self.host.contains(&self.views.next) {
      debug!(
        phase = ?self.animator.phase(),
        "previous swap interrupted, promoting attached view"
      );
      self.host.remove(&self.views.current);
      self.views.swap_roles();
    }

    if !self.host.contains(&self.views.current) {
      self.host.append(&self.views.current);
    }

    self.views.current.reset_style();
    self.views.next.reset_style();
    self.animator.reset();
  }

  /// Drop the partially built view and make sure the previous view stays visible.
  fn recover(&mut self, doc: &Document, error: &ViewerError) {
    self.views.next.clear();
    self.views.next.reset_style();

    if self.host.remove(&self.views.next) {
      warn!(doc_id = %doc.id, "detached partially rendered view");
    }
    if !self.host.contains(&self.views.current) {
      warn!(doc_id = %doc.id, "restoring previous view");
      self.host.append(&self.views.current);
    }
    self.views.current.reset_style();
    self.animator.reset();

    {
      let mut lifecycle = lifecycle::lock(&self.lifecycle);
      if lifecycle.owner() == Some(self.views.next.id()) {
        lifecycle.destroy_all();
      }
    }

    self.errors.error(
      &doc.id,
      &format!("[DocViewer]: Error preparing document '{}'.", doc.id),
      error,
    );
  }

  fn publish(&self, run: &RunEvents, doc: &Document, outcome: RunOutcome) {
    let (widgets, selectors) = {
      let lifecycle = lifecycle::lock(&self.lifecycle);
      (lifecycle.len(), lifecycle.selectors())
    };
    self.snapshot.send_replace(ViewSnapshot {
      generation: run.generation(),
      settled_doc: Some(doc.id.clone()),
      outcome: Some(outcome),
      displayed_doc: self.displayed_doc().map(str::to_string),
      attached: self.host.attached_count(),
      markup: self.visible_markup().to_string(),
      next_is_empty: self.views.next.is_empty(),
      widgets,
      selectors,
      title: self.last_title.clone(),
    });
  }

  /// Id of the document shown by the attached view. `None` for the initial view.
  pub fn displayed_doc(&self) -> Option<&str> {
    [&self.views.current, &self.views.next]
      .into_iter()
      .find(|view| self.host.contains(view))
      .and_then(|view| self.inserted.get(&view.id()))
      .map(String::as_str)
  }

  /// Markup of the view attached to the host element.
  pub fn visible_markup(&self) -> &str {
    if self.host.contains(&self.views.current) {
      self.views.current.inner_html()
    } else if self.host.contains(&self.views.next) {
      self.views.next.inner_html()
    } else {
      ""
    }
  }

  pub fn attached_count(&self) -> usize {
    self.host.attached_count()
  }

  pub fn phase(&self) -> TransitionPhase {
    self.animator.phase()
  }

  pub fn config(&self) -> &ViewerConfig {
    &self.config
  }

  /// Run change detection on the live widgets.
  pub fn tick(&self) -> usize {
    lifecycle::lock(&self.lifecycle).tick()
  }

  /// Subscribe to settled-run snapshots.
  pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
    self.snapshot.subscribe()
  }

  /// Terminal teardown: stop emitting events and destroy every live widget.
  pub fn teardown(&mut self) {
    self.shutdown.cancel();
    let destroyed = lifecycle::lock(&self.lifecycle).destroy_all();
    info!(widgets_destroyed = destroyed, "doc viewer torn down");
  }
}
