//! Docview Transition Engine
//!
//! This crate swaps rendered documents inside a host element. It owns two
//! recycled view containers, crossfades between them, and keeps the embedded
//! widgets of exactly one document alive at a time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     DocViewerHandle                         │
//! │  - push(doc) / set_doc(Option<doc>) over an mpsc channel    │
//! │  - tick() runs change detection on live widgets             │
//! │  - shutdown() tears the viewer down                         │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   viewer task (runner)                      │
//! │  - one render in flight; a newer doc drops it               │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        DocViewer                            │
//! │  - TitleTocPreparer: title + ToC placeholder                │
//! │  - WidgetHost: embed widgets into the next view             │
//! │  - WidgetLifecycle: destroy old, adopt new                  │
//! │  - TransitionAnimator: leave / remove / insert / enter      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use docview_config::ViewerConfig;
//! use docview_engine::{Collaborators, DocViewer, Document, InitialView};
//!
//! let config = ViewerConfig::default();
//! let collaborators = Collaborators::headless(&config);
//! let handle = DocViewer::new(config, collaborators, InitialView::Empty)?.spawn();
//!
//! handle.push(Document::new("guide", "<h1>Guide</h1>")).await?;
//! handle.shutdown().await?;
//! ```

mod animator;
mod error;
mod events;
mod frame;
mod lifecycle;
mod runner;
mod title_toc;
mod viewer;

pub use animator::{
  TransitionAnimator, TransitionPhase, ViewPair, animations_enabled, set_animations_enabled,
};
pub use error::ViewerError;
pub use events::{ChannelNotifier, NoopNotifier, ViewerEvent, ViewerNotifier};
pub use frame::{FrameClock, FrameDriver, ImmediateFrameClock, IntervalFrameClock, ManualFrameClock};
pub use lifecycle::{SharedLifecycle, WidgetLifecycle};
pub use runner::DocViewerHandle;
pub use title_toc::{TitleTocPlan, TitleTocPreparer};
pub use viewer::{Collaborators, DocViewer, Document, InitialView, RunOutcome, ViewSnapshot};
