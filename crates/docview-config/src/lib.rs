//! Viewer configuration for docview.
//!
//! These types are serializable and describe how a viewer instance behaves:
//! animation timing, title formatting and ToC placement. They are the only
//! tunables the engine reads; everything else is supplied as collaborators.

mod error;
mod viewer;

pub use error::ConfigError;
pub use viewer::ViewerConfig;
