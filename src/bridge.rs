//! # Worker-to-Frontend Bridge
//!
//! ## Purpose
//! The synchronization primitive between the retrieval worker and the
//! interactive front end. The worker pushes fire-and-forget updates (log
//! lines, status text, result rows, the finished result set) through an
//! ordered event stream, and can request exactly one blocking yes/no
//! decision per confirmation gate.
//!
//! ## Key Properties
//! - Events are delivered in the order they were produced
//! - The front end never blocks on the worker; the confirmation gate is the
//!   only worker-blocks-on-frontend rendezvous
//! - Each gate resolves exactly once; if the frontend side is torn down
//!   while a gate is pending, the gate resolves to "declined" rather than
//!   hanging

use crate::controller::SessionOutcome;
use crate::{Decision, Source};
use tokio::sync::{mpsc, oneshot};

/// Display fields of one result row, in final display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowUpdate {
    /// Position of the row in the sorted result set.
    pub index: usize,
    pub source: Source,
    pub number: String,
    pub date: String,
    pub chamber: String,
    pub url: String,
}

impl RowUpdate {
    pub fn new(index: usize, decision: &Decision) -> Self {
        Self {
            index,
            source: decision.source,
            number: decision.number.clone(),
            date: decision.date.clone().unwrap_or_default(),
            chamber: decision.chamber.clone().unwrap_or_default(),
            url: decision.url.clone().unwrap_or_default(),
        }
    }
}

/// One event pushed from the worker to the front end.
#[derive(Debug)]
pub enum UiEvent {
    /// Journal line.
    Log(String),
    /// Status-bar text.
    Status(String),
    /// One result row, marshaled in display order.
    Row(RowUpdate),
    /// Blocking confirmation request before full-text retrieval.
    Confirm {
        /// Number of decisions awaiting a fetch.
        pending: usize,
        /// One-shot reply slot; dropping it counts as "declined".
        reply: oneshot::Sender<bool>,
    },
    /// The finished, frozen result set. Nothing follows this event.
    Finished(SessionOutcome),
}

/// Worker-side handle of the bridge.
#[derive(Debug, Clone)]
pub struct UiBridge {
    events: mpsc::UnboundedSender<UiEvent>,
}

impl UiBridge {
    /// Create a bridge and the frontend-side event receiver.
    pub fn channel() -> (UiBridge, mpsc::UnboundedReceiver<UiEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (UiBridge { events }, receiver)
    }

    // A closed receiver means the front end is tearing down; updates are
    // dropped silently rather than treated as errors.
    fn push(&self, event: UiEvent) {
        let _ = self.events.send(event);
    }

    /// Fire-and-forget journal line.
    pub fn log(&self, line: impl Into<String>) {
        self.push(UiEvent::Log(line.into()));
    }

    /// Fire-and-forget status update.
    pub fn status(&self, line: impl Into<String>) {
        self.push(UiEvent::Status(line.into()));
    }

    /// Fire-and-forget row render request.
    pub fn row(&self, update: RowUpdate) {
        self.push(UiEvent::Row(update));
    }

    /// Hand the frozen result set to the front end.
    pub fn finished(&self, outcome: SessionOutcome) {
        self.push(UiEvent::Finished(outcome));
    }

    /// Request a yes/no decision and block until it is produced.
    ///
    /// Resolves exactly once. Returns `false` when the frontend side is
    /// already gone or drops the reply slot without answering.
    pub async fn confirm(&self, pending: usize) -> bool {
        let (reply, answer) = oneshot::channel();
        if self.events.send(UiEvent::Confirm { pending, reply }).is_err() {
            return false;
        }
        answer.await.unwrap_or(false)
    }
}
