//! Markup queries.
//!
//! The engine only needs a handful of selector-like lookups, so they are
//! expressed as regexes over the raw markup rather than a full parse.

use std::sync::LazyLock;

use regex::Regex;

static FIRST_H1: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?is)<h1(\s[^>]*)?>(.*?)</h1\s*>").expect("valid regex"));

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?is)<h([1-6])(\s[^>]*)?>(.*?)</h([1-6])\s*>").expect("valid regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?:^|\s)([^\s=/>"']+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).expect("valid regex")
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// A matched element with its byte span in the source markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementMatch {
  pub tag: String,
  /// Raw attribute text between the tag name and `>`.
  pub attrs: String,
  pub inner: String,
  /// Byte offset of `<`.
  pub start: usize,
  /// Byte offset just past the closing tag.
  pub end: usize,
}

impl ElementMatch {
  pub fn class_name(&self) -> Option<String> {
    attribute(&self.attrs, "class")
  }

  pub fn id(&self) -> Option<String> {
    attribute(&self.attrs, "id")
  }

  pub fn text(&self) -> String {
    text_content(&self.inner)
  }

  /// Heading level for `h1`..`h6`.
  pub fn heading_level(&self) -> Option<u8> {
    let mut chars = self.tag.chars();
    match (chars.next(), chars.next(), chars.next()) {
      (Some('h' | 'H'), Some(d @ '1'..='6'), None) => d.to_digit(10).map(|d| d as u8),
      _ => None,
    }
  }
}

/// An opening tag of a custom element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagOccurrence {
  pub tag: String,
  pub attrs: String,
  pub offset: usize,
}

/// The first `<h1>` anywhere in the markup.
pub fn first_heading(markup: &str) -> Option<ElementMatch> {
  let caps = FIRST_H1.captures(markup)?;
  let whole = caps.get(0)?;
  Some(ElementMatch {
    tag: "h1".to_string(),
    attrs: caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
    inner: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
    start: whole.start(),
    end: whole.end(),
  })
}

/// All headings (`h1`..`h6`) in document order. Mismatched close tags are skipped.
pub fn headings(markup: &str) -> Vec<ElementMatch> {
  HEADING
    .captures_iter(markup)
    .filter(|caps| caps.get(1).map(|m| m.as_str()) == caps.get(4).map(|m| m.as_str()))
    .filter_map(|caps| {
      let whole = caps.get(0)?;
      Some(ElementMatch {
        tag: format!("h{}", caps.get(1)?.as_str()),
        attrs: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
        inner: caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default(),
        start: whole.start(),
        end: whole.end(),
      })
    })
    .collect()
}

/// Finds opening tags of a fixed set of element names.
///
/// The pattern is compiled once and reused for every document.
#[derive(Debug, Clone, Default)]
pub struct TagMatcher {
  pattern: Option<Regex>,
}

impl TagMatcher {
  pub fn new<I, S>(tags: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let alternatives: Vec<String> = tags
      .into_iter()
      .map(|tag| regex::escape(tag.as_ref()))
      .collect();
    if alternatives.is_empty() {
      return Self::default();
    }

    let pattern = Regex::new(&format!(r"(?is)<({})(\s[^>]*)?/?>", alternatives.join("|"))).ok();
    Self { pattern }
  }

  /// Opening tags in document order.
  pub fn find(&self, markup: &str) -> Vec<TagOccurrence> {
    let Some(pattern) = &self.pattern else {
      return Vec::new();
    };

    pattern
      .captures_iter(markup)
      .filter_map(|caps| {
        Some(TagOccurrence {
          tag: caps.get(1)?.as_str().to_ascii_lowercase(),
          attrs: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
          offset: caps.get(0)?.start(),
        })
      })
      .collect()
  }
}

/// Read an attribute value from raw attribute text. Quoted and bare values are supported.
pub fn attribute(attrs: &str, name: &str) -> Option<String> {
  ATTRIBUTE
    .captures_iter(attrs)
    .find(|caps| caps.get(1).is_some_and(|m| m.as_str().eq_ignore_ascii_case(name)))
    .and_then(|caps| caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4)))
    .map(|m| m.as_str().to_string())
}

/// Text content of a markup fragment: tags stripped, entities decoded, whitespace collapsed.
pub fn text_content(markup: &str) -> String {
  let stripped = TAG.replace_all(markup, " ");
  let decoded = decode_entities(&stripped);
  WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

fn decode_entities(text: &str) -> String {
  text
    .replace("&nbsp;", " ")
    .replace("&lt;", "<")
    .replace("&gt;", ">")
    .replace("&quot;", "\"")
    .replace("&#39;", "'")
    .replace("&apos;", "'")
    .replace("&amp;", "&")
}
