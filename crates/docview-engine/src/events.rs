//! Lifecycle events and notifiers.
//!
//! The viewer emits four zero-payload signals per run, always in the order
//! `DocReady`, `DocRemoved` (only when a view was attached), `DocInserted`,
//! `DocRendered`. Events of a superseded or torn-down run are suppressed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Lifecycle events of a render run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewerEvent {
  /// The new document and its widgets are ready but not visible yet.
  DocReady,

  /// The previous view finished its leave animation and was detached.
  DocRemoved,

  /// The new view was attached. Its enter animation may still be running.
  DocInserted,

  /// The enter animation completed.
  DocRendered,
}

impl ViewerEvent {
  pub fn as_str(&self) -> &'static str {
    match self {
      ViewerEvent::DocReady => "docReady",
      ViewerEvent::DocRemoved => "docRemoved",
      ViewerEvent::DocInserted => "docInserted",
      ViewerEvent::DocRendered => "docRendered",
    }
  }
}

/// Trait for receiving viewer lifecycle events.
pub trait ViewerNotifier: Send + Sync {
  fn notify(&self, event: ViewerEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ViewerNotifier for NoopNotifier {
  fn notify(&self, _event: ViewerEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow page shell never stalls a transition; at most four
  // events per document are produced.
  sender: mpsc::UnboundedSender<ViewerEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ViewerEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with the receiving end.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ViewerEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl ViewerNotifier for ChannelNotifier {
  fn notify(&self, event: ViewerEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}

/// Owns the generation counter and decides whether a run may still emit.
#[derive(Clone)]
pub(crate) struct EventGate {
  notifier: Arc<dyn ViewerNotifier>,
  latest: Arc<AtomicU64>,
  shutdown: CancellationToken,
}

impl EventGate {
  pub(crate) fn new(notifier: Arc<dyn ViewerNotifier>, shutdown: CancellationToken) -> Self {
    Self {
      notifier,
      latest: Arc::new(AtomicU64::new(0)),
      shutdown,
    }
  }

  /// Start a new run, superseding every earlier one.
  pub(crate) fn begin_run(&self) -> RunEvents {
    let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
    RunEvents {
      gate: self.clone(),
      generation,
    }
  }

  pub(crate) fn latest(&self) -> u64 {
    self.latest.load(Ordering::SeqCst)
  }
}

/// Event emitter bound to a single run's generation.
pub(crate) struct RunEvents {
  gate: EventGate,
  generation: u64,
}

impl RunEvents {
  pub(crate) fn generation(&self) -> u64 {
    self.generation
  }

  /// True while no newer run has started and the viewer is not torn down.
  pub(crate) fn is_current(&self) -> bool {
    !self.gate.shutdown.is_cancelled() && self.gate.latest() == self.generation
  }

  pub(crate) fn emit(&self, event: ViewerEvent) {
    if !self.is_current() {
      debug!(
        generation = self.generation,
        event = event.as_str(),
        "suppressed event from stale run"
      );
      return;
    }
    debug!(generation = self.generation, event = event.as_str(), "lifecycle event");
    self.gate.notifier.notify(event);
  }
}
