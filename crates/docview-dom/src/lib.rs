//! Docview DOM model
//!
//! A deliberately small, in-memory stand-in for the browser DOM that the
//! view engine drives. It models exactly what the engine touches:
//!
//! - [`ViewContainer`]: a subtree root holding raw markup and an inline style
//!   (`opacity`, `transition`).
//! - [`HostElement`]: the visible element containers are attached to and
//!   detached from. It also hands out container ids.
//! - [`query`]: regex-backed lookups over markup (first heading, class
//!   attribute, text content, custom element tags).
//! - [`css`]: parsing of CSS `<time>` values into [`std::time::Duration`].

pub mod css;
mod container;
mod host;
pub mod query;

pub use container::{ContainerId, InlineStyle, ViewContainer};
pub use host::HostElement;
