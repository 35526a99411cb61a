//! # Retrieval Controller
//!
//! ## Purpose
//! Orchestrates one retrieval session: multi-source paginated collection of
//! decision metadata, date-descending sort, a user confirmation gate, bulk
//! full-text fetching with a politeness throttle, and cooperative
//! cancellation at every loop boundary.
//!
//! ## Input/Output Specification
//! - **Input**: A search query plus the metadata-only flag
//! - **Output**: A frozen, ordered result set with per-decision text state,
//!   handed to the front end as a completion message
//! - **Workflow**: Collect → Sort → Confirm → Fetch → Done
//!
//! ## Key Features
//! - Per-source failure isolation; one failing source never aborts the rest
//! - Cancellation polled at page, source and document boundaries; an
//!   in-flight call always completes before cancellation takes effect
//! - A declined confirmation skips full-text retrieval but preserves and
//!   shows the collected metadata
//! - At most one session active at a time; concurrent starts are rejected

use crate::bridge::{RowUpdate, UiBridge};
use crate::client::DecisionBackend;
use crate::config::Config;
use crate::errors::{Result, RetrievalError};
use crate::extract::extract;
use crate::{Decision, Source, TextState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Parameters of one search.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Literal query text, sent verbatim to the remote index.
    pub query: String,
    /// Skip full-text retrieval entirely, keeping identifiers live for
    /// later on-demand fetches.
    pub metadata_only: bool,
}

impl SearchOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            metadata_only: false,
        }
    }

    pub fn metadata_only(mut self) -> Self {
        self.metadata_only = true;
        self
    }
}

/// Phases of a retrieval session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Collecting,
    ConfirmPending,
    FetchingText,
    Done,
}

impl SessionPhase {
    fn describe(self) -> &'static str {
        match self {
            SessionPhase::Idle => "Idle",
            SessionPhase::Collecting => "Collecting metadata",
            SessionPhase::ConfirmPending => "Awaiting confirmation",
            SessionPhase::FetchingText => "Fetching full texts",
            SessionPhase::Done => "Done",
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Every stage ran to completion.
    Completed,
    /// The cancellation flag was observed at a loop boundary.
    Cancelled,
    /// The user declined full-text retrieval; metadata was preserved.
    Declined,
}

/// The frozen result of a finished session.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    /// Decisions in final display order (date descending).
    pub decisions: Vec<Decision>,
    /// How the session ended.
    pub termination: Termination,
}

/// Shared cancellation flag, set by the front end and polled by the worker.
///
/// Setting it is idempotent; it never interrupts a call already in flight.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Handle on a running session.
pub struct SessionHandle {
    flag: CancelFlag,
    join: JoinHandle<SessionOutcome>,
}

impl SessionHandle {
    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.flag.cancel();
    }

    /// The session's cancellation flag.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.flag.clone()
    }

    /// Wait for the session to finish and take its outcome.
    pub async fn wait(self) -> Result<SessionOutcome> {
        self.join.await.map_err(|e| RetrievalError::Internal {
            message: format!("session task failed: {e}"),
        })
    }
}

// Clears the active marker even if the worker task is aborted.
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Session orchestrator. Owns the single-active-session discipline; the
/// per-session state lives in the spawned worker.
pub struct Controller {
    backend: Arc<dyn DecisionBackend>,
    config: Arc<Config>,
    active: Arc<AtomicBool>,
}

impl Controller {
    pub fn new(backend: Arc<dyn DecisionBackend>, config: Arc<Config>) -> Self {
        Self {
            backend,
            config,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a retrieval session on a background task.
    ///
    /// Rejected with [`RetrievalError::SessionActive`] while another session
    /// is running.
    pub fn start(&self, options: SearchOptions, bridge: UiBridge) -> Result<SessionHandle> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(RetrievalError::SessionActive);
        }

        let flag = CancelFlag::new();
        let worker = SessionWorker {
            backend: self.backend.clone(),
            config: self.config.clone(),
            options,
            bridge,
            cancel: flag.clone(),
        };
        let guard = ActiveGuard(self.active.clone());
        let join = tokio::spawn(async move {
            let _guard = guard;
            worker.run().await
        });

        Ok(SessionHandle { flag, join })
    }
}

/// Fetch, extract and attach the full text of one decision.
///
/// Shared by the bulk fetch loop and the on-demand fetch of a detail view.
/// On success the text is attached and the identifier cleared; on failure
/// the cause is recorded in place of the text and the identifier retained,
/// so calling again retries from scratch. A decision without a pending
/// identifier is left untouched.
pub async fn attach_full_text(backend: &dyn DecisionBackend, decision: &mut Decision) {
    let remote_id = match decision.pending_fetch() {
        Some(id) => id.to_string(),
        None => return,
    };

    match backend.fetch_document(&remote_id).await {
        Ok(markup) => {
            decision.text = TextState::Fetched(extract(&markup));
            decision.remote_id = None;
        }
        Err(err) => {
            tracing::warn!(number = %decision.number, error = %err, "document fetch failed");
            decision.text = TextState::Failed {
                cause: err.to_string(),
            };
        }
    }
}

/// Per-session worker state. Sole mutator of the decision list until the
/// handoff into `Done`.
struct SessionWorker {
    backend: Arc<dyn DecisionBackend>,
    config: Arc<Config>,
    options: SearchOptions,
    bridge: UiBridge,
    cancel: CancelFlag,
}

impl SessionWorker {
    fn enter(&self, phase: SessionPhase) {
        tracing::debug!(phase = phase.describe(), "session phase");
        self.bridge.status(phase.describe());
    }

    async fn run(self) -> SessionOutcome {
        let query = self.options.query.clone();
        self.bridge.log(format!("━━ Search: « {query} » ━━"));
        if self.options.metadata_only {
            self.bridge.log("Mode: metadata only");
        } else {
            self.bridge.log("Mode: full texts");
        }

        // Collection: every configured source, page by page. A failing
        // source is logged and skipped; its already-collected rows stay.
        self.enter(SessionPhase::Collecting);
        let mut decisions: Vec<Decision> = Vec::new();
        for source in Source::ALL {
            if self.cancel.is_cancelled() {
                break;
            }
            if let Err(err) = self.collect_source(source, &query, &mut decisions).await {
                self.bridge
                    .log(format!("✗ [{}] {}", source.label(), err));
                tracing::warn!(source = source.label(), error = %err, "source collection failed");
            }
        }

        decisions.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));

        // Confirmation gate, only when there is something to fetch.
        let mut declined = false;
        let mut fetch_text = !self.options.metadata_only;
        if fetch_text && !self.cancel.is_cancelled() && !decisions.is_empty() {
            self.enter(SessionPhase::ConfirmPending);
            if !self.bridge.confirm(decisions.len()).await {
                declined = true;
                fetch_text = false;
                self.bridge
                    .log("Full-text retrieval declined; metadata kept.");
            }
        }

        if fetch_text && !self.cancel.is_cancelled() {
            self.enter(SessionPhase::FetchingText);
            self.fetch_texts(&mut decisions).await;
        }

        self.enter(SessionPhase::Done);
        for (index, decision) in decisions.iter().enumerate() {
            self.bridge.row(RowUpdate::new(index, decision));
        }

        let termination = if declined {
            Termination::Declined
        } else if self.cancel.is_cancelled() {
            Termination::Cancelled
        } else {
            Termination::Completed
        };
        let note = match termination {
            Termination::Completed => "",
            Termination::Cancelled => " (cancelled)",
            Termination::Declined => " (full texts declined)",
        };
        self.bridge
            .log(format!("✓ {} decision(s) found{}.", decisions.len(), note));
        self.bridge
            .status(format!("{} decision(s)", decisions.len()));

        let outcome = SessionOutcome {
            decisions,
            termination,
        };
        self.bridge.finished(outcome.clone());
        outcome
    }

    /// Collect every page of one source, mapping rows to decisions as they
    /// arrive. Stops when the reported total is reached, a page comes back
    /// empty, or cancellation is observed at a page boundary.
    async fn collect_source(
        &self,
        source: Source,
        query: &str,
        decisions: &mut Vec<Decision>,
    ) -> Result<()> {
        let base = &self.config.api.canonical_base;
        let page_size = self.config.retrieval.page_size;

        let first = self.backend.search_page(source, query, 0).await?;
        let total = first.total_count;
        self.bridge
            .log(format!("  [{}] {} result(s)", source.label(), total));

        let mut collected = first.documents.len();
        decisions.extend(
            first
                .documents
                .iter()
                .map(|row| row.to_decision(source, base)),
        );

        let mut offset = 0;
        while collected < total && !self.cancel.is_cancelled() {
            offset += page_size;
            let page = self.backend.search_page(source, query, offset).await?;
            if page.documents.is_empty() {
                // The remote total can overshoot; an empty page ends the loop.
                break;
            }
            collected += page.documents.len();
            decisions.extend(
                page.documents
                    .iter()
                    .map(|row| row.to_decision(source, base)),
            );
            self.bridge.log(format!(
                "  [{}] {}/{} collected…",
                source.label(),
                collected,
                total
            ));
        }

        Ok(())
    }

    /// Fetch full texts in display order, throttled between documents.
    async fn fetch_texts(&self, decisions: &mut Vec<Decision>) {
        let total = decisions.len();
        self.bridge
            .log(format!("Fetching full texts ({total} decisions)…"));
        let delay = Duration::from_millis(self.config.retrieval.request_delay_ms);

        for index in 0..total {
            if self.cancel.is_cancelled() {
                break;
            }
            let decision = &mut decisions[index];
            if decision.pending_fetch().is_none() {
                continue;
            }
            attach_full_text(self.backend.as_ref(), decision).await;

            let label = decision.source.label();
            let position = format!("{:>3}/{}", index + 1, total);
            match &decision.text {
                TextState::Fetched(text) => self.bridge.log(format!(
                    "  {position} {label} {} ({}) ✓ {} chars",
                    decision.number,
                    decision.date.as_deref().unwrap_or(""),
                    text.chars().count()
                )),
                TextState::Failed { cause } => self
                    .bridge
                    .log(format!("  {position} {label} {} ✗ {cause}", decision.number)),
                TextState::Absent => {}
            }

            if index + 1 < total {
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::UiEvent;
    use crate::client::{SearchPage, SearchRow};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::AtomicUsize;

    fn row(id: &str, number: &str, date: &str) -> SearchRow {
        SearchRow {
            id: Some(format!("/Ariane_Web/{id}")),
            chamber: Some("chambre".to_string()),
            number: Some(number.to_string()),
            date_time: Some(format!("{date}T00:00:00")),
            url_prefix: Some("/ce/decision/".to_string()),
        }
    }

    #[derive(Default)]
    struct MockBackend {
        rows: HashMap<Source, Vec<SearchRow>>,
        reported_totals: HashMap<Source, usize>,
        page_size: usize,
        failing_sources: HashSet<Source>,
        failing_docs: HashSet<String>,
        search_calls: AtomicUsize,
        search_delay_ms: u64,
        /// When filled, the flag is raised from inside every search call,
        /// after the call has been served.
        cancel_on_search: std::sync::Mutex<Option<CancelFlag>>,
    }

    #[async_trait]
    impl DecisionBackend for MockBackend {
        async fn search_page(
            &self,
            source: Source,
            _query: &str,
            offset: usize,
        ) -> crate::Result<SearchPage> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            if self.search_delay_ms > 0 {
                sleep(Duration::from_millis(self.search_delay_ms)).await;
            }
            if let Some(flag) = self.cancel_on_search.lock().unwrap().as_ref() {
                flag.cancel();
            }
            if self.failing_sources.contains(&source) {
                return Err(RetrievalError::Network {
                    details: "connection reset".to_string(),
                });
            }

            let rows = self.rows.get(&source).cloned().unwrap_or_default();
            let end = rows.len().min(offset + self.page_size);
            let documents = if offset >= rows.len() {
                Vec::new()
            } else {
                rows[offset..end].to_vec()
            };
            let total_count = self
                .reported_totals
                .get(&source)
                .copied()
                .unwrap_or(rows.len());
            Ok(SearchPage {
                total_count,
                documents,
            })
        }

        async fn fetch_document(&self, remote_id: &str) -> crate::Result<String> {
            if self.failing_docs.contains(remote_id) {
                return Err(RetrievalError::Fetch {
                    cause: "HTTP 503".to_string(),
                });
            }
            Ok(format!(
                "<html><body><p>Texte de la décision {remote_id}</p></body></html>"
            ))
        }
    }

    struct Collected {
        logs: Vec<String>,
        rows: Vec<RowUpdate>,
        confirms: usize,
        outcome: Option<SessionOutcome>,
    }

    fn spawn_frontend(answer: bool) -> (UiBridge, JoinHandle<Collected>) {
        let (bridge, mut events) = UiBridge::channel();
        let join = tokio::spawn(async move {
            let mut collected = Collected {
                logs: Vec::new(),
                rows: Vec::new(),
                confirms: 0,
                outcome: None,
            };
            while let Some(event) = events.recv().await {
                match event {
                    UiEvent::Log(line) => collected.logs.push(line),
                    UiEvent::Status(_) => {}
                    UiEvent::Row(update) => collected.rows.push(update),
                    UiEvent::Confirm { reply, .. } => {
                        collected.confirms += 1;
                        let _ = reply.send(answer);
                    }
                    UiEvent::Finished(outcome) => collected.outcome = Some(outcome),
                }
            }
            collected
        });
        (bridge, join)
    }

    fn test_config(page_size: usize) -> Arc<Config> {
        let mut config = Config::default();
        config.retrieval.page_size = page_size;
        config.retrieval.request_delay_ms = 0;
        Arc::new(config)
    }

    fn assert_identifier_invariant(decisions: &[Decision]) {
        for decision in decisions {
            // Outside the failed-fetch retry state, a live identifier and an
            // attached text never co-occur.
            assert!(
                !(decision.remote_id.is_some() && decision.text.is_fetched()),
                "identifier and text both live on {:?}",
                decision.number
            );
        }
    }

    #[tokio::test]
    async fn full_pipeline_sorts_fetches_and_clears_identifiers() {
        let mut backend = MockBackend {
            page_size: 50,
            ..Default::default()
        };
        backend.rows.insert(
            Source::ConseilEtat,
            vec![row("CE1", "100001", "2020-05-01"), row("CE2", "100002", "2022-03-15")],
        );
        backend
            .rows
            .insert(Source::CourAdministrativeAppel, vec![row("CAA1", "200001", "2021-07-20")]);

        let controller = Controller::new(Arc::new(backend), test_config(50));
        let (bridge, frontend) = spawn_frontend(true);
        let session = controller
            .start(SearchOptions::new("urbanisme"), bridge)
            .unwrap();
        let outcome = session.wait().await.unwrap();
        let collected = frontend.await.unwrap();

        assert_eq!(outcome.termination, Termination::Completed);
        let numbers: Vec<&str> = outcome.decisions.iter().map(|d| d.number.as_str()).collect();
        assert_eq!(numbers, ["100002", "200001", "100001"]); // date descending

        for decision in &outcome.decisions {
            assert!(decision.text.is_fetched());
            assert_eq!(decision.remote_id, None);
        }
        assert_identifier_invariant(&outcome.decisions);

        // Row events arrive in the sorted order.
        let row_numbers: Vec<&str> = collected.rows.iter().map(|r| r.number.as_str()).collect();
        assert_eq!(row_numbers, numbers);
        assert_eq!(collected.confirms, 1);
    }

    #[tokio::test]
    async fn metadata_only_keeps_identifiers_and_skips_the_gate() {
        let mut backend = MockBackend {
            page_size: 50,
            ..Default::default()
        };
        backend
            .rows
            .insert(Source::ConseilEtat, vec![row("CE1", "89-271", "1989-10-20")]);

        let controller = Controller::new(Arc::new(backend), test_config(50));
        let (bridge, frontend) = spawn_frontend(true);
        let session = controller
            .start(SearchOptions::new("89-271").metadata_only(), bridge)
            .unwrap();
        let outcome = session.wait().await.unwrap();
        let collected = frontend.await.unwrap();

        assert_eq!(outcome.termination, Termination::Completed);
        assert_eq!(collected.confirms, 0);
        for decision in &outcome.decisions {
            assert_eq!(decision.text, TextState::Absent);
            assert!(decision.remote_id.is_some());
        }
    }

    #[tokio::test]
    async fn misreported_totals_still_terminate() {
        let mut backend = MockBackend {
            page_size: 2,
            ..Default::default()
        };
        backend.rows.insert(
            Source::ConseilEtat,
            vec![
                row("CE1", "1", "2020-01-01"),
                row("CE2", "2", "2020-01-02"),
                row("CE3", "3", "2020-01-03"),
            ],
        );
        // The remote claims far more records than it actually serves.
        backend.reported_totals.insert(Source::ConseilEtat, 10);

        let backend = Arc::new(backend);
        let controller = Controller::new(backend.clone(), test_config(2));
        let (bridge, _frontend) = spawn_frontend(true);
        let session = controller
            .start(SearchOptions::new("x").metadata_only(), bridge)
            .unwrap();
        let outcome = session.wait().await.unwrap();

        assert_eq!(outcome.decisions.len(), 3);
        // ceil(10 / 2) + 1 = 6 is the bound; the empty page stops earlier.
        let calls = backend.search_calls.load(Ordering::SeqCst);
        assert!(calls <= 6, "made {calls} calls");
    }

    #[tokio::test]
    async fn a_failing_source_does_not_abort_the_others() {
        let mut backend = MockBackend {
            page_size: 50,
            ..Default::default()
        };
        backend.failing_sources.insert(Source::ConseilEtat);
        backend
            .rows
            .insert(Source::CourAdministrativeAppel, vec![row("CAA1", "200001", "2021-07-20")]);

        let controller = Controller::new(Arc::new(backend), test_config(50));
        let (bridge, frontend) = spawn_frontend(true);
        let session = controller
            .start(SearchOptions::new("x"), bridge)
            .unwrap();
        let outcome = session.wait().await.unwrap();
        let collected = frontend.await.unwrap();

        assert_eq!(outcome.termination, Termination::Completed);
        assert_eq!(outcome.decisions.len(), 1);
        assert_eq!(outcome.decisions[0].source, Source::CourAdministrativeAppel);
        assert!(collected.logs.iter().any(|l| l.contains("✗ [CE]")));
    }

    #[tokio::test]
    async fn declining_the_gate_preserves_metadata() {
        let mut backend = MockBackend {
            page_size: 50,
            ..Default::default()
        };
        backend
            .rows
            .insert(Source::ConseilEtat, vec![row("CE1", "100001", "2020-05-01")]);

        let controller = Controller::new(Arc::new(backend), test_config(50));
        let (bridge, frontend) = spawn_frontend(false);
        let session = controller.start(SearchOptions::new("x"), bridge).unwrap();
        let outcome = session.wait().await.unwrap();
        let collected = frontend.await.unwrap();

        assert_eq!(outcome.termination, Termination::Declined);
        assert_eq!(collected.confirms, 1);
        assert_eq!(outcome.decisions.len(), 1);
        assert_eq!(outcome.decisions[0].text, TextState::Absent);
        assert!(outcome.decisions[0].remote_id.is_some());
        // The metadata rows are still rendered.
        assert_eq!(collected.rows.len(), 1);
    }

    #[tokio::test]
    async fn cancelling_mid_collection_preserves_gathered_decisions() {
        let mut backend = MockBackend {
            page_size: 2,
            ..Default::default()
        };
        backend.rows.insert(
            Source::ConseilEtat,
            vec![
                row("CE1", "1", "2020-01-01"),
                row("CE2", "2", "2020-01-02"),
                row("CE3", "3", "2020-01-03"),
                row("CE4", "4", "2020-01-04"),
            ],
        );
        backend
            .rows
            .insert(Source::CourAdministrativeAppel, vec![row("CAA1", "5", "2021-01-01")]);

        let backend = Arc::new(backend);
        let controller = Controller::new(backend.clone(), test_config(2));
        let (bridge, _frontend) = spawn_frontend(true);
        let session = controller.start(SearchOptions::new("x"), bridge).unwrap();
        // The mock raises the session's own flag while serving the first
        // call, so the worker observes it at the next page boundary.
        backend
            .cancel_on_search
            .lock()
            .unwrap()
            .replace(session.cancel_flag());
        let outcome = session.wait().await.unwrap();

        assert_eq!(outcome.termination, Termination::Cancelled);
        // The first page of CE was kept; CAA was never reached.
        assert_eq!(outcome.decisions.len(), 2);
        for decision in &outcome.decisions {
            assert!(!decision.number.is_empty());
            assert_eq!(decision.text, TextState::Absent);
        }
        assert_identifier_invariant(&outcome.decisions);
    }

    #[tokio::test]
    async fn a_failed_fetch_retains_the_identifier_and_continues() {
        let mut backend = MockBackend {
            page_size: 50,
            ..Default::default()
        };
        backend.rows.insert(
            Source::ConseilEtat,
            vec![
                row("CE1", "100001", "2022-01-03"),
                row("CE2", "100002", "2022-01-02"),
                row("CE3", "100003", "2022-01-01"),
            ],
        );
        // Second decision in display order fails.
        backend
            .failing_docs
            .insert("/Ariane_Web/CE2".to_string());

        let controller = Controller::new(Arc::new(backend), test_config(50));
        let (bridge, _frontend) = spawn_frontend(true);
        let session = controller.start(SearchOptions::new("x"), bridge).unwrap();
        let outcome = session.wait().await.unwrap();

        assert_eq!(outcome.termination, Termination::Completed);
        let decisions = &outcome.decisions;
        assert!(decisions[0].text.is_fetched());
        assert_eq!(decisions[0].remote_id, None);
        assert!(matches!(decisions[1].text, TextState::Failed { .. }));
        assert_eq!(decisions[1].remote_id.as_deref(), Some("/Ariane_Web/CE2"));
        assert!(decisions[2].text.is_fetched());
        assert_eq!(decisions[2].remote_id, None);
        assert_identifier_invariant(decisions);

        let marker = decisions[1].text.display().unwrap();
        assert!(marker.starts_with("[Erreur :"));
    }

    #[tokio::test]
    async fn a_second_session_is_rejected_while_one_is_active() {
        let mut backend = MockBackend {
            page_size: 50,
            search_delay_ms: 50,
            ..Default::default()
        };
        backend
            .rows
            .insert(Source::ConseilEtat, vec![row("CE1", "1", "2020-01-01")]);

        let controller = Controller::new(Arc::new(backend), test_config(50));
        let (bridge, _frontend) = spawn_frontend(true);
        let session = controller
            .start(SearchOptions::new("x").metadata_only(), bridge)
            .unwrap();

        let (second_bridge, _second) = spawn_frontend(true);
        let err = controller
            .start(SearchOptions::new("y"), second_bridge)
            .unwrap_err();
        assert!(matches!(err, RetrievalError::SessionActive));

        session.wait().await.unwrap();

        // Once the first session finished, a new one may start.
        let (third_bridge, _third) = spawn_frontend(true);
        assert!(controller
            .start(SearchOptions::new("z").metadata_only(), third_bridge)
            .is_ok());
    }

    #[tokio::test]
    async fn on_demand_fetch_retries_from_scratch() {
        let mut failing = MockBackend {
            page_size: 50,
            ..Default::default()
        };
        failing.failing_docs.insert("/Ariane_Web/CE1".to_string());

        let mut decision =
            row("CE1", "100001", "2022-01-01").to_decision(Source::ConseilEtat, "https://b");

        attach_full_text(&failing, &mut decision).await;
        assert!(matches!(decision.text, TextState::Failed { .. }));
        assert!(decision.remote_id.is_some());

        // A later attempt against a healthy backend succeeds and clears the
        // identifier.
        let healthy = MockBackend {
            page_size: 50,
            ..Default::default()
        };
        attach_full_text(&healthy, &mut decision).await;
        assert!(decision.text.is_fetched());
        assert_eq!(decision.remote_id, None);

        // Re-invocation without a pending identifier is a no-op.
        let before = decision.clone();
        attach_full_text(&healthy, &mut decision).await;
        assert_eq!(decision, before);
    }
}
