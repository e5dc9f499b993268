//! Search term matching and highlighting.
//!
//! # Responsibility
//! - Decide which task texts are visible under the current search term.
//! - Wrap matched substrings in highlight markers for display.
//!
//! # Invariants
//! - Terms shorter than `MIN_TERM_CHARS` (raw, untrimmed) match everything and
//!   highlight nothing.
//! - The term is always matched literally; pattern metacharacters are escaped.
//! - Filtering and highlighting share one case-insensitive matcher, so a text
//!   is visible exactly when it has something to highlight.
//! - Highlighting keeps the original casing of the matched text.

use log::warn;
use regex::{Captures, Regex, RegexBuilder};

/// Minimum term length, in characters, before filtering kicks in.
pub const MIN_TERM_CHARS: usize = 2;

/// Opening/closing markup placed around highlighted matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightMarker {
    pub open: String,
    pub close: String,
}

impl HighlightMarker {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

impl Default for HighlightMarker {
    fn default() -> Self {
        Self::new(r#"<span class="highlight">"#, "</span>")
    }
}

/// Current search term with its precompiled matchers.
#[derive(Debug, Clone, Default)]
pub struct SearchTerm {
    raw: String,
    needle: Option<String>,
    pattern: Option<Regex>,
}

impl SearchTerm {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.chars().count() < MIN_TERM_CHARS {
            return Self {
                raw,
                needle: None,
                pattern: None,
            };
        }

        // Lowercase fallback for terms the regex engine refuses.
        let needle = Some(raw.to_lowercase());
        let pattern = match RegexBuilder::new(&regex::escape(&raw))
            .case_insensitive(true)
            .build()
        {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                // Only reachable for terms beyond the regex size limit.
                warn!(
                    "event=search_term module=search status=highlight_disabled term_len={} error={err}",
                    raw.len()
                );
                None
            }
        };

        Self {
            raw,
            needle,
            pattern,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the term is long enough to filter.
    pub fn is_active(&self) -> bool {
        self.needle.is_some()
    }

    /// Case-insensitive substring test; inactive terms match everything.
    pub fn matches(&self, text: &str) -> bool {
        match (&self.pattern, &self.needle) {
            (Some(pattern), _) => pattern.is_match(text),
            (None, Some(needle)) => text.to_lowercase().contains(needle.as_str()),
            (None, None) => true,
        }
    }

    /// Highlights every match with the default `<span class="highlight">` marker.
    pub fn highlight(&self, text: &str) -> String {
        self.highlight_with(text, &HighlightMarker::default())
    }

    pub fn highlight_with(&self, text: &str, marker: &HighlightMarker) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };

        pattern
            .replace_all(text, |caps: &Captures<'_>| {
                format!("{}{}{}", marker.open, &caps[0], marker.close)
            })
            .into_owned()
    }
}
