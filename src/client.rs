//! # Retrieval Client
//!
//! ## Purpose
//! Stateless request builders and response parsers for the two remote
//! operations of the ArianeWeb index: paginated search and single-document
//! content fetch.
//!
//! ## Input/Output Specification
//! - **Input**: Source code, literal query text, 0-based record offset, or a
//!   document identifier
//! - **Output**: A parsed result page (total count plus document rows), or
//!   the raw HTML body of one decision
//! - **Errors**: Search failures are recoverable network/parsing errors;
//!   content-fetch failures are always the recoverable [`RetrievalError::Fetch`]
//!   kind carrying a human-readable cause
//!
//! ## Key Features
//! - One HTTP client built once with default headers and timeout
//! - Deterministic, query-only matching-mode selection (boolean vs smart)
//! - Mapping of raw result rows to [`Decision`] records with normalized
//!   dates and derived canonical URLs
//! - A backend trait seam so the controller can be exercised without a
//!   live server

use crate::config::{ApiConfig, Config};
use crate::errors::{Result, RetrievalError};
use crate::terms::match_mode;
use crate::{Decision, Source, TextState};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, ACCEPT, REFERER};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Prefix stripped from remote identifiers before a content request.
const REMOTE_ID_PREFIX: &str = "/Ariane_Web/";

/// Fixed two-key sort order requested from the remote index.
const SORT_ORDER: &str = "SourceDateTime1.desc,SourceStr5.desc";

/// One page of search results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    /// Total record count reported by the remote index for this query.
    #[serde(rename = "TotalCount", default)]
    pub total_count: usize,
    /// Document rows of this page.
    #[serde(rename = "Documents", default)]
    pub documents: Vec<SearchRow>,
}

/// One raw search-result row as returned by the remote index.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRow {
    /// Opaque document identifier used by the content endpoint.
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
    /// Issuing body.
    #[serde(rename = "SourceStr3", default)]
    pub chamber: Option<String>,
    /// Case number.
    #[serde(rename = "SourceStr5", default)]
    pub number: Option<String>,
    /// ISO-prefixed date-time; only the date portion is significant.
    #[serde(rename = "SourceDateTime1", default)]
    pub date_time: Option<String>,
    /// Path prefix used to derive the canonical URL.
    #[serde(rename = "SourceStr39", default)]
    pub url_prefix: Option<String>,
}

impl SearchRow {
    /// Map this row to a [`Decision`] with full text left absent.
    pub fn to_decision(&self, source: Source, canonical_base: &str) -> Decision {
        Decision {
            remote_id: self.id.clone().filter(|id| !id.is_empty()),
            source,
            number: self.number.clone().unwrap_or_default(),
            date: self.date_time.as_deref().and_then(parse_decision_date),
            chamber: self.chamber.clone().filter(|c| !c.is_empty()),
            url: canonical_url(canonical_base, self),
            text: TextState::Absent,
        }
    }
}

/// Normalize a raw ISO-prefixed date-time to `DD/MM/YYYY`.
///
/// An unparsable value degrades to its first ten characters rather than
/// being dropped, so the user still sees what the remote sent.
pub fn parse_decision_date(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    let prefix = raw.get(..10).unwrap_or(raw);
    match NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
        Ok(date) => Some(date.format("%d/%m/%Y").to_string()),
        Err(_) => Some(prefix.to_string()),
    }
}

/// Derive the canonical URL of a decision, when every component is present.
pub fn canonical_url(base: &str, row: &SearchRow) -> Option<String> {
    let prefix = row.url_prefix.as_deref().filter(|s| !s.is_empty())?;
    let number = row.number.as_deref().filter(|s| !s.is_empty())?;
    let raw_date = row.date_time.as_deref().filter(|s| !s.is_empty())?;
    let date_segment = raw_date.get(..10).unwrap_or(raw_date);
    Some(format!("{base}{prefix}{date_segment}/{number}"))
}

/// Remote operations the retrieval controller depends on.
#[async_trait]
pub trait DecisionBackend: Send + Sync {
    /// Fetch one page of search results at a 0-based record offset.
    async fn search_page(&self, source: Source, query: &str, offset: usize) -> Result<SearchPage>;

    /// Fetch the raw HTML body of one decision. Any transport or remote
    /// error is reported as the recoverable [`RetrievalError::Fetch`] kind.
    async fn fetch_document(&self, remote_id: &str) -> Result<String>;
}

/// Production backend speaking to the ArianeWeb endpoints.
pub struct HttpBackend {
    client: Client,
    api: ApiConfig,
    page_size: usize,
}

impl HttpBackend {
    /// Build the HTTP client with the headers the remote service expects.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            REFERER,
            config.api.referer.parse().map_err(|e| RetrievalError::Config {
                message: format!("Invalid referer header: {e}"),
            })?,
        );
        headers.insert(
            ACCEPT,
            "application/json".parse().map_err(|e| RetrievalError::Config {
                message: format!("Invalid accept header: {e}"),
            })?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_seconds))
            .default_headers(headers)
            .user_agent(&config.api.user_agent)
            .build()
            .map_err(|e| RetrievalError::Network {
                details: e.to_string(),
            })?;

        Ok(Self {
            client,
            api: config.api.clone(),
            page_size: config.retrieval.page_size,
        })
    }
}

#[async_trait]
impl DecisionBackend for HttpBackend {
    async fn search_page(&self, source: Source, query: &str, offset: usize) -> Result<SearchPage> {
        let mode = match_mode(query);
        tracing::debug!(source = source.label(), offset, mode = mode.as_str(), "search page");

        let page_size = self.page_size.to_string();
        let offset = offset.to_string();
        let params: [(&str, &str); 9] = [
            ("advanced", "1"),
            ("type", "json"),
            ("SourceStr4", source.code()),
            ("text.add", query),
            ("synonyms", "true"),
            ("scmode", mode.as_str()),
            ("SkipCount", &page_size),
            ("SkipFrom", &offset),
            ("sort", SORT_ORDER),
        ];

        let response = self
            .client
            .post(&self.api.search_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::RemoteStatus {
                operation: "search".to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<SearchPage>()
            .await
            .map_err(|e| RetrievalError::DataParsing {
                origin: "search response".to_string(),
                details: e.to_string(),
            })
    }

    async fn fetch_document(&self, remote_id: &str) -> Result<String> {
        let document_id = remote_id.replace(REMOTE_ID_PREFIX, "");
        let body = serde_json::json!({
            "documentId": document_id,
            "matchLocations": "",
        });

        tracing::debug!(%document_id, "fetch document");

        let response = self
            .client
            .post(&self.api.content_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Fetch {
                cause: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Fetch {
                cause: format!("HTTP {status}"),
            });
        }

        response.text().await.map_err(|e| RetrievalError::Fetch {
            cause: e.to_string(),
        })
    }
}
