//! Single-owner viewer task and its handle.
//!
//! The spawned task owns the [`DocViewer`] and is the only writer of the
//! container pair and the widget list. Documents arrive over an mpsc channel;
//! a document that arrives while a run is in flight drops that run's future,
//! so its remaining stages never execute. Only the most recent document
//! renders to completion.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::ViewerError;
use crate::lifecycle::{self, SharedLifecycle};
use crate::viewer::{DocViewer, Document, ViewSnapshot};

/// Handle to a running viewer task.
pub struct DocViewerHandle {
  sender: mpsc::Sender<Document>,
  shutdown: CancellationToken,
  lifecycle: SharedLifecycle,
  snapshot: watch::Receiver<ViewSnapshot>,
  task: JoinHandle<()>,
}

impl DocViewer {
  /// Start the viewer task on the current tokio runtime.
  pub fn spawn(self) -> DocViewerHandle {
    let (sender, receiver) = mpsc::channel(self.config.channel_buffer);
    let shutdown = self.shutdown.clone();
    let lifecycle = self.lifecycle.clone();
    let snapshot = self.snapshot.subscribe();
    let task = tokio::spawn(run(self, receiver));

    DocViewerHandle {
      sender,
      shutdown,
      lifecycle,
      snapshot,
      task,
    }
  }
}

/// The viewer loop. Runs until teardown or until every sender is dropped.
async fn run(mut viewer: DocViewer, mut receiver: mpsc::Receiver<Document>) {
  let shutdown = viewer.shutdown.clone();
  info!("doc viewer started");

  let mut pending: Option<Document> = None;
  let mut closed = false;

  'outer: loop {
    let doc = match pending.take() {
      Some(doc) => doc,
      None if closed => break,
      None => tokio::select! {
          biased;
          _ = shutdown.cancelled() => break,
          doc = receiver.recv() => match doc {
              Some(doc) => doc,
              None => break,
          },
      },
    };

    let doc_id = doc.id.clone();
    let render = viewer.render(doc);
    tokio::pin!(render);

    loop {
      tokio::select! {
          biased;
          _ = shutdown.cancelled() => {
              info!(doc_id = %doc_id, "teardown during render");
              break 'outer;
          }
          next = receiver.recv(), if !closed => match next {
              Some(next) => {
                  debug!(superseded = %doc_id, next = %next.id, "render superseded");
                  pending = Some(next);
                  break;
              }
              None => closed = true,
          },
          _ = &mut render => break,
      }
    }
  }

  viewer.teardown();
}

impl DocViewerHandle {
  /// Queue a document. It supersedes any document still rendering.
  ///
  /// Fails once shutdown was requested, even while the task has not yet
  /// closed its receiver; such a document is never rendered.
  pub async fn push(&self, doc: Document) -> Result<(), ViewerError> {
    let sent = self.sender.send(doc).await;
    if sent.is_err() || self.shutdown.is_cancelled() {
      return Err(ViewerError::ShutDown);
    }
    Ok(())
  }

  /// Input-style setter: `None` is ignored.
  pub async fn set_doc(&self, doc: Option<Document>) -> Result<(), ViewerError> {
    match doc {
      Some(doc) => self.push(doc).await,
      None => Ok(()),
    }
  }

  /// A sender for document sources that live elsewhere.
  pub fn sender(&self) -> mpsc::Sender<Document> {
    self.sender.clone()
  }

  /// Run change detection on the live widgets. Call once per host check cycle.
  pub fn tick(&self) -> usize {
    lifecycle::lock(&self.lifecycle).tick()
  }

  /// The state after the most recent settled run.
  pub fn snapshot(&self) -> ViewSnapshot {
    self.snapshot.borrow().clone()
  }

  pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
    self.snapshot.clone()
  }

  /// Wait until a settled-run snapshot satisfies `predicate`.
  pub async fn wait_for(
    &self,
    mut predicate: impl FnMut(&ViewSnapshot) -> bool,
  ) -> Result<ViewSnapshot, ViewerError> {
    let mut snapshot = self.snapshot.clone();
    let found = snapshot
      .wait_for(|s| predicate(s))
      .await
      .map_err(|_| ViewerError::ShutDown)?;
    Ok(found.clone())
  }

  pub fn is_shut_down(&self) -> bool {
    self.shutdown.is_cancelled()
  }

  /// Tear the viewer down and wait for its task to finish.
  ///
  /// No lifecycle events are emitted afterwards and every live widget has
  /// been destroyed once this returns.
  pub async fn shutdown(self) -> Result<(), ViewerError> {
    self.shutdown.cancel();
    self.task.await.map_err(|e| ViewerError::Task {
      message: e.to_string(),
    })
  }
}
