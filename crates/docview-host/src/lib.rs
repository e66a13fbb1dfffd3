//! Docview host collaborators
//!
//! The view engine talks to the rest of the page through a handful of narrow
//! traits defined here:
//!
//! - [`WidgetHost`]: instantiates live widgets for placeholder tags in a container
//! - [`WidgetHandle`]: a live widget; change detection and a one-shot destroy
//! - [`TocBuilder`]: builds the table of contents from a rendered container
//! - [`TitleSink`]: receives the window title
//! - [`ErrorLog`]: receives failures the engine recovered from
//!
//! Each trait ships with an in-memory implementation suitable for headless
//! use and testing.

mod embed;
mod error;
mod log;
mod title;
mod toc;
mod widget;

pub use embed::{TagWidgetHost, WidgetHost};
pub use error::WidgetError;
pub use log::{ErrorLog, TracingErrorLog};
pub use title::{RecordingTitleSink, TitleSink};
pub use toc::{OutlineTocBuilder, TocBuilder, TocItem};
pub use widget::{LoggingWidget, LoggingWidgetFactory, WidgetFactory, WidgetHandle};
