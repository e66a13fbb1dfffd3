//! CSS `<time>` parsing.
//!
//! Computed `transition-duration` values are serialized in seconds (`0.333s`),
//! but authored values may use `ms`. Lists (`0.2s, 1s`) resolve to the longest
//! entry since that is when the last transitioned property settles.

use std::time::Duration;

/// Parse a single CSS time value (`0.333s`, `333ms`, or a bare number of seconds).
pub fn parse_time(value: &str) -> Option<Duration> {
  let value = value.trim();
  if value.is_empty() {
    return None;
  }

  let (number, millis_per_unit) = if let Some(ms) = value.strip_suffix("ms") {
    (ms, 1.0)
  } else if let Some(secs) = value.strip_suffix('s') {
    (secs, 1000.0)
  } else {
    (value, 1000.0)
  };

  let number: f64 = number.trim().parse().ok()?;
  if !number.is_finite() || number < 0.0 {
    return None;
  }

  let nanos = (number * millis_per_unit * 1_000_000.0).round();
  Some(Duration::from_nanos(nanos as u64))
}

/// Parse a comma-separated `transition-duration` list, returning the longest entry.
pub fn parse_duration_list(value: &str) -> Option<Duration> {
  value.split(',').filter_map(parse_time).max()
}

/// Extract the duration from a `transition` shorthand such as `all 333ms ease-in-out`.
///
/// The first time token of each comma-separated transition is its duration.
pub fn shorthand_duration(transition: &str) -> Option<Duration> {
  transition
    .split(',')
    .filter_map(|single| {
      single
        .split_whitespace()
        .find(|token| token.ends_with('s') && parse_time(token).is_some())
        .and_then(parse_time)
    })
    .max()
}
