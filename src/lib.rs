//! # ArianeWeb Query & Retrieval Engine
//!
//! ## Overview
//! This library implements a terminal-oriented query and retrieval engine for
//! the ArianeWeb index of French administrative case law (Conseil d'État and
//! cours administratives d'appel). It combines query-term parsing with
//! wildcard and phrase support, overlap-free term highlighting, structural
//! HTML-to-text extraction, and a cancellable, user-gated retrieval pipeline.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `terms`: Query tokenization into highlight patterns and match-mode selection
//! - `highlight`: Escaped, overlap-free term highlighting of document text
//! - `extract`: Structural HTML-to-plain-text extraction and normalization
//! - `client`: Wire-level search pagination and document-content requests
//! - `controller`: Session orchestration with confirmation gate and cancellation
//! - `bridge`: Worker-to-frontend event stream and blocking confirmation gate
//! - `export`: One-shot JSON export of a finished result set
//! - `console`: Minimal line-oriented front end consuming bridge events
//! - `config`: Configuration management and settings
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: Free-form boolean/phrase/wildcard queries (text)
//! - **Output**: Ordered decision metadata with optional extracted full texts
//! - **Remote**: The ArianeWeb search and content endpoints own ranking and
//!   total-count semantics; nothing is indexed or ranked locally
//!
//! ## Usage
//! ```rust,no_run
//! use std::sync::Arc;
//! use ariane_retrieval::bridge::UiBridge;
//! use ariane_retrieval::client::HttpBackend;
//! use ariane_retrieval::console;
//! use ariane_retrieval::controller::{Controller, SearchOptions};
//! use ariane_retrieval::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::from_file("config.toml")?);
//!     let backend = Arc::new(HttpBackend::new(&config)?);
//!     let controller = Controller::new(backend, config);
//!     let (ui, events) = UiBridge::channel();
//!     let frontend = tokio::spawn(console::run(events, true));
//!     let session = controller.start(SearchOptions::new("urbanisme"), ui)?;
//!     let outcome = session.wait().await?;
//!     frontend.await?;
//!     println!("{} decision(s)", outcome.decisions.len());
//!     Ok(())
//! }
//! ```

// Core modules
pub mod bridge;
pub mod client;
pub mod config;
pub mod console;
pub mod controller;
pub mod errors;
pub mod export;
pub mod extract;
pub mod highlight;
pub mod terms;

// Re-exports for convenience
pub use config::Config;
pub use controller::{Controller, SearchOptions, SessionOutcome};
pub use errors::{Result, RetrievalError};

use chrono::NaiveDate;

/// Decision sources exposed by the remote index.
///
/// The index hosts two collections of administrative case law, addressed on
/// the wire by their source code and shown to the user as a short label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Source {
    /// Conseil d'État decisions (source `AW_DCE`).
    #[serde(rename = "CE")]
    ConseilEtat,
    /// Cours administratives d'appel decisions (source `AW_DCA`).
    #[serde(rename = "CAA")]
    CourAdministrativeAppel,
}

impl Source {
    /// All sources queried by a retrieval session, in collection order.
    pub const ALL: [Source; 2] = [Source::ConseilEtat, Source::CourAdministrativeAppel];

    /// Source identifier sent in search requests.
    pub fn code(self) -> &'static str {
        match self {
            Source::ConseilEtat => "AW_DCE",
            Source::CourAdministrativeAppel => "AW_DCA",
        }
    }

    /// Short label shown in result rows and logs.
    pub fn label(self) -> &'static str {
        match self {
            Source::ConseilEtat => "CE",
            Source::CourAdministrativeAppel => "CAA",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Full-text attachment state of a [`Decision`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextState {
    /// No text attached. The remote identifier may still be live, either
    /// because the fetch has not run yet or because metadata-only mode or a
    /// declined confirmation skipped it.
    Absent,
    /// Full text fetched and extracted to plain text.
    Fetched(String),
    /// The fetch failed; the cause is shown in place of the text and the
    /// remote identifier is retained so the fetch can be retried.
    Failed { cause: String },
}

impl TextState {
    /// Whether a full text is attached.
    pub fn is_fetched(&self) -> bool {
        matches!(self, TextState::Fetched(_))
    }

    /// Text shown to the user: the extracted text, a visible error marker,
    /// or nothing when no fetch has been attempted.
    pub fn display(&self) -> Option<String> {
        match self {
            TextState::Absent => None,
            TextState::Fetched(text) => Some(text.clone()),
            TextState::Failed { cause } => Some(error_marker(cause)),
        }
    }
}

/// Visible marker recorded in place of a document text when its fetch failed.
pub fn error_marker(cause: &str) -> String {
    format!("[Erreur : {cause}]")
}

/// One retrieved legal-decision record.
///
/// Created from one remote search-result row during collection and mutated
/// once when full text is attached. The remote identifier and an attached
/// full text are mutually exclusive: the identifier is cleared on a
/// successful fetch and retained only while no text is attached or after a
/// failed fetch, where it supports a manual retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Opaque identifier used by the content endpoint. `None` once the full
    /// text has been fetched.
    pub remote_id: Option<String>,
    /// Source collection the decision came from.
    pub source: Source,
    /// Case number.
    pub number: String,
    /// Decision date in `DD/MM/YYYY` form, when the remote date parsed.
    pub date: Option<String>,
    /// Issuing body, when reported.
    pub chamber: Option<String>,
    /// Canonical URL of the decision, when derivable.
    pub url: Option<String>,
    /// Full-text attachment state.
    pub text: TextState,
}

impl Decision {
    /// Remote identifier still awaiting a fetch, if any.
    pub fn pending_fetch(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    /// Total-order sort key: the decision date, or the earliest
    /// representable date when the date is missing or unparsable.
    pub fn sort_key(&self) -> NaiveDate {
        self.date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%d/%m/%Y").ok())
            .unwrap_or(NaiveDate::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_key_falls_back_to_minimal_date() {
        let mut decision = Decision {
            remote_id: None,
            source: Source::ConseilEtat,
            number: "450000".to_string(),
            date: Some("31/12/2021".to_string()),
            chamber: None,
            url: None,
            text: TextState::Absent,
        };
        assert_eq!(
            decision.sort_key(),
            NaiveDate::from_ymd_opt(2021, 12, 31).unwrap()
        );

        decision.date = Some("pas une date".to_string());
        assert_eq!(decision.sort_key(), NaiveDate::MIN);

        decision.date = None;
        assert_eq!(decision.sort_key(), NaiveDate::MIN);
    }

    #[test]
    fn error_marker_is_visible_text() {
        assert_eq!(error_marker("HTTP 503"), "[Erreur : HTTP 503]");
    }
}
