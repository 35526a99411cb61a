//! # Console Front End
//!
//! A minimal line-oriented front end: it drains the bridge event stream,
//! prints the journal and result rows, answers the confirmation gate from
//! stdin, and returns the finished result set. Visual layout beyond plain
//! lines is deliberately out of scope.

use crate::bridge::{RowUpdate, UiEvent};
use crate::controller::SessionOutcome;
use crate::highlight::{HIGHLIGHT_CLOSE, HIGHLIGHT_OPEN};
use std::io::Write;
use tokio::sync::mpsc::UnboundedReceiver;

const ANSI_HIGHLIGHT: &str = "\x1b[30;43m";
const ANSI_RESET: &str = "\x1b[0m";

/// Translate highlight markup to ANSI escapes for terminal display.
///
/// The line is split at escaped brackets first, so a bracket that was
/// escaped in the source text can never form a marker even when the text
/// itself spells out a marker sequence.
pub fn render_ansi(line: &str) -> String {
    line.split("\\[")
        .map(|segment| {
            segment
                .replace(HIGHLIGHT_OPEN, ANSI_HIGHLIGHT)
                .replace(HIGHLIGHT_CLOSE, ANSI_RESET)
        })
        .collect::<Vec<_>>()
        .join("[")
}

fn print_row(update: &RowUpdate) {
    println!(
        "{:>4}  {:<4} {:<12} {:<10}  {:<30}  {}",
        update.index + 1,
        update.source.label(),
        update.number,
        update.date,
        truncate(&update.chamber, 30),
        update.url
    );
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

async fn prompt_confirmation(pending: usize) -> bool {
    print!("{pending} decision(s) found. Fetch the full texts? [Y/n] ");
    let _ = std::io::stdout().flush();

    // Stdin is blocking; keep it off the runtime threads.
    let line = tokio::task::spawn_blocking(|| {
        let mut buffer = String::new();
        std::io::stdin().read_line(&mut buffer).map(|_| buffer)
    })
    .await;

    match line {
        Ok(Ok(answer)) => matches!(
            answer.trim().to_lowercase().as_str(),
            "" | "y" | "yes" | "o" | "oui"
        ),
        _ => false,
    }
}

/// Drain the event stream until the session hands over its result set.
///
/// With `auto_confirm` set, the confirmation gate is answered positively
/// without prompting, for non-interactive use.
pub async fn run(mut events: UnboundedReceiver<UiEvent>, auto_confirm: bool) -> Option<SessionOutcome> {
    let mut outcome = None;
    while let Some(event) = events.recv().await {
        match event {
            UiEvent::Log(line) => println!("{line}"),
            UiEvent::Status(line) => tracing::debug!(status = %line),
            UiEvent::Row(update) => print_row(&update),
            UiEvent::Confirm { pending, reply } => {
                let answer = if auto_confirm {
                    true
                } else {
                    prompt_confirmation(pending).await
                };
                // A dropped reply counts as declined on the worker side.
                let _ = reply.send(answer);
            }
            UiEvent::Finished(finished) => outcome = Some(finished),
        }
    }
    outcome
}
