//! # Term Highlighter
//!
//! ## Purpose
//! Applies query-derived patterns to arbitrary text, producing a markup
//! string in which every match is wrapped in highlight markers and every
//! marker-significant character of the source text is escaped.
//!
//! ## Input/Output Specification
//! - **Input**: Plain text plus the raw query it was retrieved with
//! - **Output**: Bracket-markup text with non-overlapping highlighted spans
//! - **Failure**: Never fails; an uncompilable pattern set degrades to the
//!   escaped text without highlights
//!
//! The output uses the bracket markup of the terminal front end: `[` is the
//! only structurally significant character and is escaped as `\[`. Escaping
//! happens per segment after match extraction, so it can never alter match
//! boundaries.

use crate::terms::parse_terms;
use regex::RegexBuilder;

/// Marker opening a highlighted span.
pub const HIGHLIGHT_OPEN: &str = "[black on yellow]";
/// Marker closing a highlighted span.
pub const HIGHLIGHT_CLOSE: &str = "[/black on yellow]";

/// Escape the markup's structural characters in a text segment.
pub fn escape_markup(text: &str) -> String {
    text.replace('[', "\\[")
}

/// Highlight all query terms in `text`.
///
/// Patterns are applied longest-literal-first so that when several patterns
/// could claim the same span, the more specific one wins and no byte is ever
/// covered by two highlights. An empty or all-noise query returns the text
/// fully escaped with no highlighting.
pub fn highlight(text: &str, query: &str) -> String {
    if query.is_empty() || text.is_empty() {
        return escape_markup(text);
    }

    let mut patterns = parse_terms(query);
    if patterns.is_empty() {
        return escape_markup(text);
    }
    patterns.sort_by(|a, b| b.literal_len.cmp(&a.literal_len));

    let alternation = patterns
        .iter()
        .map(|p| format!("(?:{})", p.regex))
        .collect::<Vec<_>>()
        .join("|");
    let combined = match RegexBuilder::new(&alternation).case_insensitive(true).build() {
        Ok(re) => re,
        Err(_) => return escape_markup(text),
    };

    let mut out = String::with_capacity(text.len() + 64);
    let mut cursor = 0;
    for m in combined.find_iter(text) {
        out.push_str(&escape_markup(&text[cursor..m.start()]));
        out.push_str(HIGHLIGHT_OPEN);
        out.push_str(&escape_markup(m.as_str()));
        out.push_str(HIGHLIGHT_CLOSE);
        cursor = m.end();
    }
    out.push_str(&escape_markup(&text[cursor..]));
    out
}
