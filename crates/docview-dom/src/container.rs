use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::css;

/// Identity of a view container, unique per [`HostElement`](crate::HostElement).
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ContainerId(pub u64);

impl fmt::Display for ContainerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "view-{}", self.0)
  }
}

/// Inline style of a container. Only the properties the transition touches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InlineStyle {
  pub opacity: Option<f32>,
  pub transition: Option<String>,
}

/// An in-memory DOM subtree root.
///
/// Containers are recycled rather than reallocated: the engine rewrites the
/// markup of the same two containers for every document it shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewContainer {
  id: ContainerId,
  markup: String,
  style: InlineStyle,
}

impl ViewContainer {
  pub(crate) fn new(id: ContainerId) -> Self {
    Self {
      id,
      markup: String::new(),
      style: InlineStyle::default(),
    }
  }

  pub fn id(&self) -> ContainerId {
    self.id
  }

  /// The raw markup of the subtree.
  pub fn inner_html(&self) -> &str {
    &self.markup
  }

  /// Replace the subtree with raw markup. No sanitization happens here.
  pub fn set_inner_html(&mut self, markup: impl Into<String>) {
    self.markup = markup.into();
  }

  /// Insert markup at a byte offset into the current markup.
  ///
  /// Offsets past the end append. Offsets inside a UTF-8 sequence are moved
  /// forward to the next character boundary.
  pub fn insert_html(&mut self, offset: usize, markup: &str) {
    let mut offset = offset.min(self.markup.len());
    while !self.markup.is_char_boundary(offset) {
      offset += 1;
    }
    self.markup.insert_str(offset, markup);
  }

  /// Drop all content to release memory.
  pub fn clear(&mut self) {
    self.markup = String::new();
  }

  pub fn is_empty(&self) -> bool {
    self.markup.trim().is_empty()
  }

  pub fn style(&self) -> &InlineStyle {
    &self.style
  }

  pub fn style_mut(&mut self) -> &mut InlineStyle {
    &mut self.style
  }

  /// Reset the inline style to its initial (fully visible, no transition) state.
  pub fn reset_style(&mut self) {
    self.style = InlineStyle::default();
  }

  /// The computed `transition-duration`.
  ///
  /// `stylesheet` stands in for global styles; when set it wins over the inline
  /// transition, as a stylesheet rule with higher precedence would.
  pub fn computed_transition_duration(&self, stylesheet: Option<&str>) -> Option<Duration> {
    match stylesheet {
      Some(value) => css::parse_duration_list(value),
      None => self
        .style
        .transition
        .as_deref()
        .and_then(css::shorthand_duration),
    }
  }
}
