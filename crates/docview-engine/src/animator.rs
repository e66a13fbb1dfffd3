//! Crossfade between the current and the next view.
//!
//! A swap runs two phases. Each phase writes three styles, separated by frame
//! boundaries so the renderer commits the starting opacity before the
//! transition is enabled, and the transition before the target opacity:
//!
//! ```text
//! Idle -> Leaving -> Removed -> Inserting -> Entering -> Settled
//!         (only when the current view is attached)
//! ```
//!
//! Disabling animations collapses every phase to a single style write. Event
//! order is unchanged.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use docview_config::ViewerConfig;
use docview_dom::{HostElement, ViewContainer};
use tracing::debug;

use crate::error::ViewerError;
use crate::events::{RunEvents, ViewerEvent};
use crate::frame::FrameClock;

static ANIMATIONS_ENABLED: AtomicBool = AtomicBool::new(true);

/// Process-wide animation switch, combined with each viewer's config.
///
/// Turning it off makes transitions instantaneous, e.g. for end-to-end runs.
pub fn set_animations_enabled(enabled: bool) {
  ANIMATIONS_ENABLED.store(enabled, Ordering::SeqCst);
}

pub fn animations_enabled() -> bool {
  ANIMATIONS_ENABLED.load(Ordering::SeqCst)
}

const LEAVE_OPACITY: (f32, f32) = (1.0, 0.25);
const ENTER_OPACITY: (f32, f32) = (0.25, 1.0);

/// Where the animator is within a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
  Idle,
  Leaving,
  Removed,
  Inserting,
  Entering,
  Settled,
}

/// The two recycled containers and the roles they currently play.
#[derive(Debug)]
pub struct ViewPair {
  pub current: ViewContainer,
  pub next: ViewContainer,
}

impl ViewPair {
  pub fn swap_roles(&mut self) {
    std::mem::swap(&mut self.current, &mut self.next);
  }
}

/// Drives the leave/enter crossfade.
pub struct TransitionAnimator {
  frames: Arc<dyn FrameClock>,
  enabled: bool,
  transition: Duration,
  stylesheet_transition: Option<String>,
  phase: TransitionPhase,
}

impl TransitionAnimator {
  pub fn new(config: &ViewerConfig, frames: Arc<dyn FrameClock>) -> Self {
    Self {
      frames,
      enabled: config.animations_enabled,
      transition: config.transition(),
      stylesheet_transition: config.stylesheet_transition.clone(),
      phase: TransitionPhase::Idle,
    }
  }

  pub fn phase(&self) -> TransitionPhase {
    self.phase
  }

  /// Forget an interrupted swap.
  pub fn reset(&mut self) {
    self.set_phase(TransitionPhase::Idle);
  }

  pub fn is_enabled(&self) -> bool {
    self.enabled && animations_enabled()
  }

  /// Replace the current view with the next one.
  ///
  /// `on_inserted` runs as soon as the next view is attached, before its
  /// enter animation. On success the roles are swapped and the now unused
  /// container is emptied.
  pub(crate) async fn swap<F>(
    &mut self,
    host: &mut HostElement,
    views: &mut ViewPair,
    events: &RunEvents,
    on_inserted: F,
  ) -> Result<(), ViewerError>
  where
    F: FnOnce(&ViewContainer) + Send,
  {
    self.set_phase(TransitionPhase::Idle);

    if host.contains(&views.current) {
      self.set_phase(TransitionPhase::Leaving);
      self.animate(&mut views.current, LEAVE_OPACITY).await?;
      host.remove(&views.current);
      self.set_phase(TransitionPhase::Removed);
      events.emit(ViewerEvent::DocRemoved);
    }

    self.set_phase(TransitionPhase::Inserting);
    host.append(&views.next);
    on_inserted(&views.next);
    events.emit(ViewerEvent::DocInserted);

    self.set_phase(TransitionPhase::Entering);
    self.animate(&mut views.next, ENTER_OPACITY).await?;

    views.swap_roles();
    views.next.clear();
    views.next.reset_style();
    self.set_phase(TransitionPhase::Settled);
    Ok(())
  }

  async fn animate(
    &self,
    elem: &mut ViewContainer,
    (from, to): (f32, f32),
  ) -> Result<(), ViewerError> {
    elem.style_mut().transition = None;

    if !self.is_enabled() {
      elem.style_mut().opacity = Some(to);
      return Ok(());
    }

    self.frames.next_frame().await?;
    elem.style_mut().opacity = Some(from);
    self.frames.next_frame().await?;
    elem.style_mut().transition = Some(format!(
      "all {}ms ease-in-out",
      self.transition.as_millis()
    ));
    self.frames.next_frame().await?;
    elem.style_mut().opacity = Some(to);

    tokio::time::sleep(self.actual_duration(elem)).await;
    Ok(())
  }

  /// The configured duration, or the computed one when global styles make it longer.
  pub fn actual_duration(&self, elem: &ViewContainer) -> Duration {
    elem
      .computed_transition_duration(self.stylesheet_transition.as_deref())
      .map_or(self.transition, |computed| computed.max(self.transition))
  }

  fn set_phase(&mut self, phase: TransitionPhase) {
    if self.phase != phase {
      debug!(from = ?self.phase, to = ?phase, "transition phase");
      self.phase = phase;
    }
  }
}
