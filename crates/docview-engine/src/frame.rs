//! Animation frame clocks.
//!
//! A frame boundary is a barrier: styles written before it are committed
//! before anything written after it. The animator awaits one frame between
//! each style write of a phase.

use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{Mutex, watch};

use crate::error::ViewerError;

/// Source of animation frame boundaries.
pub trait FrameClock: Send + Sync {
  /// Resolve at the next frame boundary.
  fn next_frame(&self) -> BoxFuture<'_, Result<(), ViewerError>>;
}

/// Frames on a fixed timer, ~60Hz by default.
#[derive(Debug, Clone)]
pub struct IntervalFrameClock {
  interval: Duration,
}

impl IntervalFrameClock {
  pub fn new(interval: Duration) -> Self {
    Self { interval }
  }
}

impl Default for IntervalFrameClock {
  fn default() -> Self {
    Self::new(Duration::from_millis(16))
  }
}

impl FrameClock for IntervalFrameClock {
  fn next_frame(&self) -> BoxFuture<'_, Result<(), ViewerError>> {
    let interval = self.interval;
    Box::pin(async move {
      tokio::time::sleep(interval).await;
      Ok(())
    })
  }
}

/// Frames that resolve after a scheduler yield. Useful for headless runs.
#[derive(Debug, Clone, Default)]
pub struct ImmediateFrameClock;

impl FrameClock for ImmediateFrameClock {
  fn next_frame(&self) -> BoxFuture<'_, Result<(), ViewerError>> {
    Box::pin(async {
      tokio::task::yield_now().await;
      Ok(())
    })
  }
}

/// Frames delivered by an external driver, e.g. a host's vsync callback.
///
/// A frame delivered while nobody waits is kept and resolves the next wait.
/// Once every [`FrameDriver`] is dropped, waits fail.
#[derive(Debug)]
pub struct ManualFrameClock {
  frames: Mutex<watch::Receiver<u64>>,
}

/// Drives a [`ManualFrameClock`].
#[derive(Debug, Clone)]
pub struct FrameDriver {
  frames: watch::Sender<u64>,
}

impl ManualFrameClock {
  pub fn new() -> (Self, FrameDriver) {
    let (sender, receiver) = watch::channel(0);
    (
      Self {
        frames: Mutex::new(receiver),
      },
      FrameDriver { frames: sender },
    )
  }
}

impl FrameDriver {
  /// Deliver one frame boundary.
  pub fn frame(&self) {
    self.frames.send_modify(|count| *count += 1);
  }

  /// Number of frames delivered so far.
  pub fn delivered(&self) -> u64 {
    *self.frames.borrow()
  }
}

impl FrameClock for ManualFrameClock {
  fn next_frame(&self) -> BoxFuture<'_, Result<(), ViewerError>> {
    Box::pin(async move {
      let mut frames = self.frames.lock().await;
      frames
        .changed()
        .await
        .map_err(|_| ViewerError::frame_clock("frame driver dropped"))
    })
  }
}
