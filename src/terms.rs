//! # Query Term Parser
//!
//! ## Purpose
//! Turns a free-form ArianeWeb query into the ordered set of patterns used to
//! highlight matching terms in retrieved texts, and derives the matching mode
//! sent with search requests.
//!
//! ## Input/Output Specification
//! - **Input**: A raw query string (operators, quoted phrases, wildcards)
//! - **Output**: Regex patterns in scan order, each with its literal length
//! - **Failure**: Never fails; malformed quoting degrades to free tokens
//!
//! ## Tokenization Rules
//! Scanning left to right, non-overlapping:
//! - `«expression exacte»` or `"expression exacte"` is one phrase token,
//!   matched as whole words with its internal spacing preserved
//! - any other maximal run of non-whitespace characters is one free token
//! - the boolean operators `ET`, `OU`, `SAUF` and tokens shorter than two
//!   characters are dropped (phrases are exempt from both filters)
//! - in free tokens, `?` matches exactly one character and `*` matches any
//!   run of characters; a token carrying a wildcard is not anchored to word
//!   boundaries since the wildcard may itself stand for the word edge

use regex::Regex;
use std::sync::OnceLock;

/// Reserved boolean operators of the remote query syntax.
pub const OPERATORS: [&str; 3] = ["ET", "OU", "SAUF"];

/// Minimum length of a free token kept for highlighting.
const MIN_TOKEN_LEN: usize = 2;

/// One highlight pattern derived from a query token or phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// Regex source, ready to compile case-insensitively.
    pub regex: String,
    /// Length of the produced expression, used by the highlighter to give
    /// longer (more specific) patterns precedence over shorter ones.
    pub literal_len: usize,
}

impl Pattern {
    fn new(regex: String) -> Self {
        Self {
            literal_len: regex.len(),
            regex,
        }
    }
}

/// Matching mode sent with a search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Explicit operator syntax is respected verbatim by the remote engine.
    Boolean,
    /// Synonym-aware mode used for plain queries.
    Smart,
}

impl MatchMode {
    /// Wire value of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            MatchMode::Boolean => "boolean",
            MatchMode::Smart => "smart",
        }
    }
}

// Token scan: guillemet phrase, ASCII-quoted phrase, or free token. An
// unterminated phrase falls through to the free-token alternative, so the
// opening delimiter is treated as an ordinary character.
fn token_re() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| Regex::new(r#"«([^»]+)»|"([^"]+)"|(\S+)"#).unwrap())
}

fn is_operator(token: &str) -> bool {
    OPERATORS.iter().any(|op| token.eq_ignore_ascii_case(op))
}

/// Parse a query into highlight patterns, in scan order.
///
/// Callers that need longest-first matching re-sort explicitly on
/// [`Pattern::literal_len`]; see the highlighter.
pub fn parse_terms(query: &str) -> Vec<Pattern> {
    let mut patterns = Vec::new();

    for caps in token_re().captures_iter(query) {
        if let Some(phrase) = caps.get(1).or_else(|| caps.get(2)) {
            let phrase = phrase.as_str().trim();
            if !phrase.is_empty() {
                patterns.push(Pattern::new(format!(r"\b{}\b", regex::escape(phrase))));
            }
            continue;
        }

        let token = match caps.get(3) {
            Some(token) => token.as_str(),
            None => continue,
        };
        if is_operator(token) || token.chars().count() < MIN_TOKEN_LEN {
            continue;
        }

        if token.contains('?') || token.contains('*') {
            let mut regex = String::with_capacity(token.len() * 2);
            for ch in token.chars() {
                match ch {
                    '?' => regex.push('.'),
                    '*' => regex.push_str(".*"),
                    _ => regex.push_str(&regex::escape(ch.encode_utf8(&mut [0u8; 4]))),
                }
            }
            patterns.push(Pattern::new(regex));
        } else {
            patterns.push(Pattern::new(format!(r"\b{}\b", regex::escape(token))));
        }
    }

    patterns
}

/// Derive the matching mode from the query alone.
///
/// Boolean when an operator appears as a standalone token or either quote
/// delimiter occurs; the synonym-aware mode otherwise.
pub fn match_mode(query: &str) -> MatchMode {
    let has_operator = query.split_whitespace().any(is_operator);
    if has_operator || query.contains('"') || query.contains('«') {
        MatchMode::Boolean
    } else {
        MatchMode::Smart
    }
}
