//! Docstring heading detection
//!
//! numpydoc-style docstrings mark section headings by underlining them:
//!
//! ```text
//! Parameters
//! ----------
//! ```
//!
//! [`highlight_headings`] splits a docstring into plain text and heading
//! segments so renderers can emphasise the headings. The underline itself is
//! consumed.

use once_cell::sync::Lazy;
use regex::Regex;

/// A line followed by a line starting with two or more hyphens
static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|\n)([^\n]+?)\n-{2,}").expect("heading pattern is valid"));

/// Piece of a rendered docstring
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocSegment {
    /// Text rendered as-is
    Text(String),
    /// Heading rendered with emphasis
    Heading(String),
}

impl DocSegment {
    /// Segment text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) | Self::Heading(text) => text,
        }
    }

    /// Whether this is a heading
    #[inline]
    #[must_use]
    pub fn is_heading(&self) -> bool {
        matches!(self, Self::Heading(_))
    }
}

/// Split a docstring into text and heading segments
///
/// Adjacent text is merged, so segments alternate between text and headings.
///
/// ```rust
/// use headergen_analysis::{highlight_headings, DocSegment};
///
/// let segments = highlight_headings("Linear\n-----");
/// assert_eq!(segments[0], DocSegment::Heading("Linear".into()));
/// ```
#[must_use]
pub fn highlight_headings(text: &str) -> Vec<DocSegment> {
    let mut segments = Vec::new();
    let mut plain = String::new();
    let mut last = 0;

    for caps in HEADING.captures_iter(text) {
        let (Some(whole), Some(heading)) = (caps.get(0), caps.get(2)) else {
            continue;
        };

        plain.push_str(&text[last..whole.start()]);
        if let Some(prefix) = caps.get(1) {
            plain.push_str(prefix.as_str());
        }
        if !plain.is_empty() {
            segments.push(DocSegment::Text(std::mem::take(&mut plain)));
        }

        segments.push(DocSegment::Heading(heading.as_str().to_string()));
        plain.push('\n');
        last = whole.end();
    }

    plain.push_str(&text[last..]);
    if !plain.is_empty() {
        segments.push(DocSegment::Text(plain));
    }

    segments
}
