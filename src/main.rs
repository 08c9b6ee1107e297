//! storepick - pick the newest vector store for each name
//!
//! A command-line tool that lists vector stores from an OpenAI-compatible
//! API, keeps the newest store per name, and prints, resolves or exports
//! the latest few.

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use storepick::cli::{refresh_config, Cli, Command, RuntimeConfig};
use storepick::data::{format_timestamp, OpenAiLister, StoreLister};
use storepick::mapping::build_mapping;
use storepick::refresh::{RefreshHandle, RefreshMessage};
use storepick::snapshot::{default_snapshot_path, load_snapshot, ImportedSnapshot, SnapshotWriter};
use storepick::{Selection, StoreSelector};

/// Installs the stderr log subscriber, honouring `RUST_LOG`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("storepick=info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Builds a selector backed by the HTTP lister
fn build_selector(config: &RuntimeConfig) -> Result<StoreSelector, Box<dyn std::error::Error>> {
    let api_key = config.require_api_key()?;
    let lister = OpenAiLister::with_base_url(&config.base_url, api_key).with_retry(config.retry);
    Ok(StoreSelector::new(
        Arc::new(lister) as Arc<dyn StoreLister>,
        config.selector,
    ))
}

/// Describes how old the data behind a selection is
fn freshness_line(selection: &Selection) -> String {
    let age = selection
        .age()
        .map(|age| format!("fetched {}s ago", age.num_seconds().max(0)))
        .unwrap_or_else(|| "nothing fetched".to_string());
    let mut line = format!(
        "{} of {} stores, {}",
        selection.records.len(),
        selection.total_available,
        age
    );
    if selection.is_stale {
        line.push_str(" (stale)");
    }
    if let Some(err) = &selection.refresh_error {
        line.push_str(&format!(", last refresh failed: {}", err));
    }
    line
}

/// Prints a selection as a table with totals
fn print_table(selection: &Selection) {
    if selection.records.is_empty() {
        println!("No vector stores found");
        println!("{}", freshness_line(selection));
        return;
    }

    println!(
        "{:>4}  {:<32}  {:<32}  {:<19}  {:>8}  {:>10}",
        "RANK", "NAME", "ID", "CREATED", "FILES", "USAGE(MB)"
    );
    for (i, record) in selection.records.iter().enumerate() {
        println!(
            "{:>4}  {:<32}  {:<32}  {:<19}  {:>8}  {:>10.2}",
            i + 1,
            record.name,
            record.id,
            record.created_at_formatted(),
            record.file_count,
            record.usage_mb()
        );
    }

    let total_files: u64 = selection.records.iter().map(|r| r.file_count).sum();
    let total_bytes: u64 = selection.records.iter().map(|r| r.usage_bytes).sum();
    let newest = selection.records.iter().map(|r| r.created_at).max().unwrap_or(0);
    println!();
    println!(
        "files: {}  usage: {:.2} MB  newest: {}",
        total_files,
        total_bytes as f64 / (1024.0 * 1024.0),
        format_timestamp(newest)
    );
    println!("{}", freshness_line(selection));
}

/// Prints an imported snapshot
fn print_snapshot(snapshot: &ImportedSnapshot) {
    let meta = &snapshot.metadata;
    println!("snapshot: {}", snapshot.path.display());
    println!(
        "written {} by {} (format {}), {} of {} stores",
        meta.updated_at.to_rfc3339(),
        meta.source,
        meta.version,
        meta.selected_count,
        meta.total_available
    );
    for (i, record) in snapshot.records.iter().enumerate() {
        println!(
            "{:>4}. {} ({}) {}",
            i + 1,
            record.name,
            record.id,
            record.created_at_formatted()
        );
    }
}

fn export(selection: &Selection, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    SnapshotWriter::default().export(&selection.records, selection.total_available, path)?;
    println!("Saved {} stores to {}", selection.records.len(), path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cli = Cli::parse();
    let config = RuntimeConfig::from_args(&cli.connection)?;

    match cli.command {
        Command::Inspect { path } => {
            let snapshot = load_snapshot(&path)?;
            print_snapshot(&snapshot);
        }
        Command::List {
            count,
            refresh,
            json,
        } => {
            let selector = build_selector(&config)?;
            let selection = selector.get_latest_n(count, refresh).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&selection)?);
            } else {
                print_table(&selection);
            }
        }
        Command::Select { count, pick } => {
            let selector = build_selector(&config)?;
            let selection = selector.get_latest_n(count, false).await?;
            let mapping = build_mapping(&selection.records)?;
            match mapping.resolve(&pick) {
                Some((name, id)) => println!("{}\t{}", name, id),
                None => {
                    for label in &mapping.labels {
                        eprintln!("  {}", label);
                    }
                    return Err(format!("no store matches '{}'", pick).into());
                }
            }
        }
        Command::Export { count, output } => {
            let selector = build_selector(&config)?;
            let selection = selector.get_latest_n(count, false).await?;
            let path = output.unwrap_or_else(default_snapshot_path);
            export(&selection, &path)?;
        }
        Command::Watch { count, interval } => {
            let refresh = refresh_config(count, interval)?;
            let selector = Arc::new(build_selector(&config)?);

            let selection = selector.get_latest_n(count, false).await?;
            print_table(&selection);

            let mut handle = RefreshHandle::spawn(Arc::clone(&selector), refresh);
            loop {
                tokio::select! {
                    message = handle.recv() => match message {
                        Some(RefreshMessage::RefreshStarted) => {}
                        Some(RefreshMessage::Refreshed(selection)) => {
                            println!();
                            print_table(&selection);
                        }
                        Some(RefreshMessage::RefreshError(err)) => eprintln!("refresh failed: {}", err),
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            handle.shutdown().await;
        }
    }

    Ok(())
}
