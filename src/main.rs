//! # ArianeWeb Search Driver
//!
//! ## Purpose
//! Command-line entry point for the retrieval engine. Loads configuration,
//! initializes logging, runs one retrieval session against the remote index
//! and drives the console front end until the result set is handed over.
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Start the retrieval session on a background task
//! 4. Drive the console front end (journal, rows, confirmation gate)
//! 5. Optionally export the result set or print one decision's text

use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ariane_retrieval::bridge::UiBridge;
use ariane_retrieval::client::HttpBackend;
use ariane_retrieval::console;
use ariane_retrieval::controller::{Controller, SearchOptions, Termination};
use ariane_retrieval::export::{build_export, export_filename, write_export};
use ariane_retrieval::highlight::highlight;
use ariane_retrieval::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("ariane-search")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Legal Search Team")
        .about("Query the ArianeWeb index of French administrative case law")
        .arg(
            Arg::new("query")
                .value_name("QUERY")
                .help("Search query (e.g. 89-271, urbanisme, \"acte clair\")")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("metadata-only")
                .long("metadata-only")
                .help("Collect metadata without fetching full texts")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("yes")
                .short('y')
                .long("yes")
                .help("Answer the full-text confirmation without prompting")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("export")
                .long("export")
                .help("Write the result set to a JSON file when done")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("show")
                .long("show")
                .value_name("N")
                .help("Print the full text of result N with highlighted terms")
                .value_parser(clap::value_parser!(usize)),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").expect("has default");
    let config = Arc::new(Config::from_file(config_path)?);
    init_logging(&config)?;

    let query = matches.get_one::<String>("query").expect("required").clone();
    let metadata_only = matches.get_flag("metadata-only");

    let backend = Arc::new(HttpBackend::new(&config)?);
    let controller = Controller::new(backend, config.clone());

    let (ui, events) = UiBridge::channel();
    let mut options = SearchOptions::new(query.clone());
    if metadata_only {
        options = options.metadata_only();
    }
    let session = controller.start(options, ui)?;

    let auto_confirm = matches.get_flag("yes");
    let mut frontend = tokio::spawn(console::run(events, auto_confirm));

    let outcome = tokio::select! {
        finished = &mut frontend => finished?,
        _ = signal::ctrl_c() => {
            info!("cancellation requested");
            session.cancel();
            frontend.await?
        }
    };

    let outcome = outcome.context("the session ended without handing over a result set")?;
    if outcome.termination == Termination::Cancelled {
        info!("session cancelled; partial results kept");
    }

    if matches.get_flag("export") {
        let path = export_filename(&query);
        write_export(&path, &build_export(&query, &outcome.decisions))?;
        println!("Exported to {path}");
    }

    if let Some(position) = matches.get_one::<usize>("show").copied() {
        show_decision(&outcome.decisions, position, &query);
    }

    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Config) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .with_context(|| format!("Invalid log level: {}", config.logging.level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Print one decision's text with query terms highlighted.
fn show_decision(decisions: &[ariane_retrieval::Decision], position: usize, query: &str) {
    let Some(decision) = position.checked_sub(1).and_then(|i| decisions.get(i)) else {
        println!("No result at position {position}.");
        return;
    };

    let mut header = format!("{} {}", decision.source.label(), decision.number);
    if let Some(date) = &decision.date {
        header.push_str(&format!("  {date}"));
    }
    if let Some(chamber) = &decision.chamber {
        header.push_str(&format!("  — {chamber}"));
    }
    println!("\n{header}");
    if let Some(url) = &decision.url {
        println!("{url}");
    }

    match decision.text.display() {
        Some(text) => println!("\n{}", console::render_ansi(&highlight(&text, query))),
        None => println!("\n(text not retrieved; rerun without --metadata-only)"),
    }
}
