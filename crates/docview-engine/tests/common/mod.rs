//! In-memory collaborators shared by the engine integration tests.

#![allow(dead_code)]

use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use docview_config::ViewerConfig;
use docview_dom::ViewContainer;
use docview_dom::query::TagMatcher;
use docview_engine::{
  ChannelNotifier, Collaborators, DocViewer, DocViewerHandle, FrameClock, ImmediateFrameClock,
  InitialView, ViewerError, ViewerEvent,
};
use docview_host::{
  ErrorLog, RecordingTitleSink, TocBuilder, WidgetError, WidgetHandle, WidgetHost,
};
use futures::future::BoxFuture;
use tokio::sync::{Semaphore, mpsc};

pub const LIVE_WIDGET: &str = "live-widget";
pub const FAIL_WIDGET: &str = "fail-widget";

/// Counters shared between a host and the widgets it created.
#[derive(Debug, Default)]
pub struct WidgetCounters {
  pub created: AtomicUsize,
  pub destroyed: AtomicUsize,
  pub checks: AtomicUsize,
  pub embeds: AtomicUsize,
}

impl WidgetCounters {
  pub fn created(&self) -> usize {
    self.created.load(Ordering::SeqCst)
  }

  pub fn destroyed(&self) -> usize {
    self.destroyed.load(Ordering::SeqCst)
  }

  pub fn checks(&self) -> usize {
    self.checks.load(Ordering::SeqCst)
  }

  pub fn embeds(&self) -> usize {
    self.embeds.load(Ordering::SeqCst)
  }

  pub fn live(&self) -> usize {
    self.created() - self.destroyed()
  }
}

struct RecordingWidget {
  counters: Arc<WidgetCounters>,
}

impl WidgetHandle for RecordingWidget {
  fn selector(&self) -> &str {
    LIVE_WIDGET
  }

  fn detect_changes(&mut self) {
    self.counters.checks.fetch_add(1, Ordering::SeqCst);
  }

  fn destroy(self: Box<Self>) {
    self.counters.destroyed.fetch_add(1, Ordering::SeqCst);
  }
}

/// Creates one widget per `<live-widget>` and fails on `<fail-widget>`.
///
/// With a gate, every embed waits for a permit before creating anything.
pub struct RecordingWidgetHost {
  pub counters: Arc<WidgetCounters>,
  gate: Option<Arc<Semaphore>>,
  matcher: TagMatcher,
}

impl Default for RecordingWidgetHost {
  fn default() -> Self {
    Self {
      counters: Arc::default(),
      gate: None,
      matcher: TagMatcher::new([LIVE_WIDGET, FAIL_WIDGET]),
    }
  }
}

impl RecordingWidgetHost {
  pub fn gated() -> (Self, Arc<Semaphore>) {
    let gate = Arc::new(Semaphore::new(0));
    let host = Self {
      gate: Some(gate.clone()),
      ..Self::default()
    };
    (host, gate)
  }
}

#[async_trait]
impl WidgetHost for RecordingWidgetHost {
  async fn embed(
    &self,
    container: &mut ViewContainer,
  ) -> Result<Vec<Box<dyn WidgetHandle>>, WidgetError> {
    self.counters.embeds.fetch_add(1, Ordering::SeqCst);
    if let Some(gate) = &self.gate {
      gate
        .acquire()
        .await
        .map_err(|e| WidgetError::instantiation(LIVE_WIDGET, e.to_string()))?
        .forget();
    }

    let mut handles: Vec<Box<dyn WidgetHandle>> = Vec::new();
    for occurrence in self.matcher.find(container.inner_html()) {
      if occurrence.tag == FAIL_WIDGET {
        for handle in handles {
          handle.destroy();
        }
        return Err(WidgetError::instantiation(FAIL_WIDGET, "refused to start"));
      }
      self.counters.created.fetch_add(1, Ordering::SeqCst);
      handles.push(Box::new(RecordingWidget {
        counters: self.counters.clone(),
      }));
    }
    Ok(handles)
  }
}

/// Keeps every reported failure.
#[derive(Debug, Default)]
pub struct RecordingErrorLog {
  entries: Mutex<Vec<(String, String)>>,
}

impl RecordingErrorLog {
  pub fn entries(&self) -> Vec<(String, String)> {
    self.entries.lock().unwrap().clone()
  }
}

impl ErrorLog for RecordingErrorLog {
  fn error(&self, doc_id: &str, message: &str, _cause: &(dyn Error + 'static)) {
    self
      .entries
      .lock()
      .unwrap()
      .push((doc_id.to_string(), message.to_string()));
  }
}

/// Counts ToC resets and records the documents a ToC was built for.
#[derive(Debug, Default)]
pub struct RecordingToc {
  pub resets: AtomicUsize,
  builds: Mutex<Vec<String>>,
}

impl RecordingToc {
  pub fn builds(&self) -> Vec<String> {
    self.builds.lock().unwrap().clone()
  }

  pub fn resets(&self) -> usize {
    self.resets.load(Ordering::SeqCst)
  }
}

impl TocBuilder for RecordingToc {
  fn reset(&self) {
    self.resets.fetch_add(1, Ordering::SeqCst);
  }

  fn build(&self, _container: &ViewContainer, doc_id: &str) {
    self.builds.lock().unwrap().push(doc_id.to_string());
  }
}

/// Frames that resolve immediately, except the `fail_on`-th one (1-based).
#[derive(Debug)]
pub struct FailingFrameClock {
  calls: AtomicUsize,
  fail_on: usize,
}

impl FailingFrameClock {
  pub fn new(fail_on: usize) -> Self {
    Self {
      calls: AtomicUsize::new(0),
      fail_on,
    }
  }
}

impl FrameClock for FailingFrameClock {
  fn next_frame(&self) -> BoxFuture<'_, Result<(), ViewerError>> {
    let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
    Box::pin(async move {
      tokio::task::yield_now().await;
      if call == self.fail_on {
        return Err(ViewerError::frame_clock("renderer lost"));
      }
      Ok(())
    })
  }
}

/// A spawned viewer plus every fake it talks to.
pub struct Harness {
  pub handle: DocViewerHandle,
  pub events: mpsc::UnboundedReceiver<ViewerEvent>,
  pub widgets: Arc<WidgetCounters>,
  pub toc: Arc<RecordingToc>,
  pub title: Arc<RecordingTitleSink>,
  pub errors: Arc<RecordingErrorLog>,
}

pub struct HarnessBuilder {
  config: ViewerConfig,
  widgets: RecordingWidgetHost,
  frames: Arc<dyn FrameClock>,
  initial: InitialView,
}

impl HarnessBuilder {
  pub fn new() -> Self {
    Self {
      config: ViewerConfig::default(),
      widgets: RecordingWidgetHost::default(),
      frames: Arc::new(ImmediateFrameClock),
      initial: InitialView::Empty,
    }
  }

  pub fn config(mut self, config: ViewerConfig) -> Self {
    self.config = config;
    self
  }

  pub fn widgets(mut self, widgets: RecordingWidgetHost) -> Self {
    self.widgets = widgets;
    self
  }

  pub fn frames(mut self, frames: Arc<dyn FrameClock>) -> Self {
    self.frames = frames;
    self
  }

  pub fn initial(mut self, initial: InitialView) -> Self {
    self.initial = initial;
    self
  }

  pub fn spawn(self) -> Harness {
    let (notifier, events) = ChannelNotifier::channel();
    let counters = self.widgets.counters.clone();
    let toc = Arc::new(RecordingToc::default());
    let title = Arc::new(RecordingTitleSink::default());
    let errors = Arc::new(RecordingErrorLog::default());

    let collaborators = Collaborators::headless(&self.config)
      .with_widgets(Arc::new(self.widgets))
      .with_frames(self.frames)
      .with_toc(toc.clone())
      .with_title(title.clone())
      .with_errors(errors.clone())
      .with_notifier(Arc::new(notifier));
    let viewer = DocViewer::new(self.config, collaborators, self.initial).unwrap();

    Harness {
      handle: viewer.spawn(),
      events,
      widgets: counters,
      toc,
      title,
      errors,
    }
  }
}

impl Harness {
  /// Push a document and wait until its run settles.
  pub async fn render(&self, id: &str, contents: &str) -> docview_engine::ViewSnapshot {
    self
      .handle
      .push(docview_engine::Document::new(id, contents))
      .await
      .unwrap();
    self
      .handle
      .wait_for(|s| s.settled_doc.as_deref() == Some(id))
      .await
      .unwrap()
  }

  /// Every event emitted so far.
  pub fn drain_events(&mut self) -> Vec<ViewerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = self.events.try_recv() {
      events.push(event);
    }
    events
  }
}

/// Let the viewer task run until it blocks.
pub async fn settle() {
  tokio::time::sleep(Duration::from_millis(1)).await;
}

pub const FULL_RUN: [ViewerEvent; 4] = [
  ViewerEvent::DocReady,
  ViewerEvent::DocRemoved,
  ViewerEvent::DocInserted,
  ViewerEvent::DocRendered,
];
