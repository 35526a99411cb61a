//! # Result-Set Export
//!
//! ## Purpose
//! One-shot JSON export of a finished result set: the query, an extraction
//! timestamp, the total count and every decision with internal-only fields
//! stripped.
//!
//! ## Input/Output Specification
//! - **Input**: The active query and the frozen decision list
//! - **Output**: A pretty-printed JSON document on disk
//! - **Filename**: Derived from the query, non-word characters collapsed to
//!   underscores

use crate::errors::Result;
use crate::{Decision, Source};
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

/// Exported form of the result set.
#[derive(Debug, Serialize)]
pub struct ExportDocument {
    /// The query the decisions were retrieved with.
    pub requete: String,
    /// Extraction timestamp, `YYYY-MM-DD HH:MM:SS` local time.
    pub date_extraction: String,
    /// Number of exported decisions.
    pub total: usize,
    pub decisions: Vec<ExportedDecision>,
}

/// One decision without internal-only fields (the pending remote
/// identifier never leaves the process).
#[derive(Debug, Serialize)]
pub struct ExportedDecision {
    #[serde(rename = "type")]
    pub source: Source,
    pub juridiction: Option<String>,
    pub numero: String,
    pub date: Option<String>,
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texte: Option<String>,
}

impl From<&Decision> for ExportedDecision {
    fn from(decision: &Decision) -> Self {
        Self {
            source: decision.source,
            juridiction: decision.chamber.clone(),
            numero: decision.number.clone(),
            date: decision.date.clone(),
            url: decision.url.clone(),
            texte: decision.text.display(),
        }
    }
}

fn non_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\-]").unwrap())
}

fn underscore_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_+").unwrap())
}

/// Derive the export filename from the query.
pub fn export_filename(query: &str) -> String {
    let safe = non_word().replace_all(query, "_");
    let safe = underscore_runs().replace_all(&safe, "_");
    let safe = safe.trim_matches('_');
    let stem = if safe.is_empty() { "export" } else { safe };
    format!("resultats_{stem}.json")
}

/// Build the export document for the current result set.
pub fn build_export(query: &str, decisions: &[Decision]) -> ExportDocument {
    ExportDocument {
        requete: query.to_string(),
        date_extraction: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        total: decisions.len(),
        decisions: decisions.iter().map(ExportedDecision::from).collect(),
    }
}

/// Write the export document as pretty-printed JSON.
pub fn write_export<P: AsRef<Path>>(path: P, document: &ExportDocument) -> Result<()> {
    let json = serde_json::to_string_pretty(document)?;
    std::fs::write(path.as_ref(), json)?;
    tracing::info!(path = %path.as_ref().display(), "result set exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextState;

    fn decision(number: &str, text: TextState) -> Decision {
        Decision {
            remote_id: Some("/Ariane_Web/CE1".to_string()),
            source: Source::ConseilEtat,
            number: number.to_string(),
            date: Some("31/12/2021".to_string()),
            chamber: Some("2ème chambre".to_string()),
            url: Some("https://example.org/d/1".to_string()),
            text,
        }
    }

    #[test]
    fn filenames_collapse_non_word_characters() {
        assert_eq!(export_filename("89-271"), "resultats_89-271.json");
        assert_eq!(
            export_filename("\"acte clair\" ET urbanisme"),
            "resultats_acte_clair_ET_urbanisme.json"
        );
        assert_eq!(export_filename("«»"), "resultats_export.json");
        assert_eq!(export_filename(""), "resultats_export.json");
    }

    #[test]
    fn internal_fields_never_leave_the_process() {
        let doc = build_export("urbanisme", &[decision("1", TextState::Absent)]);
        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("remote_id"));
        assert!(!json.contains("Ariane_Web"));
        assert!(json.contains("\"requete\":\"urbanisme\""));
        assert!(json.contains("\"type\":\"CE\""));
        // An absent text is omitted rather than serialized as null.
        assert!(!json.contains("texte"));
    }

    #[test]
    fn failed_fetches_export_their_visible_marker() {
        let doc = build_export(
            "x",
            &[decision(
                "1",
                TextState::Failed {
                    cause: "HTTP 503".to_string(),
                },
            )],
        );
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("[Erreur : HTTP 503]"));
    }

    #[test]
    fn export_writes_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(export_filename("test"));
        let doc = build_export(
            "test",
            &[decision("1", TextState::Fetched("corps du texte".to_string()))],
        );
        write_export(&path, &doc).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["total"], 1);
        assert_eq!(parsed["decisions"][0]["texte"], "corps du texte");
    }
}
