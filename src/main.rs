//! CLI entry point for the tag exporter.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tag_exporter_core::{
    ApiClient, ExportOptions, ExportRoot, Exporter, HostInfo, PROGRAM_NAME, ProgressReporter,
    RunLog,
};
use tracing::{debug, info, warn};

mod cli;
mod config;

use cli::Args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let settings = config::load_settings(&args)?;
    info!(
        config = %settings.source.display(),
        export_dir = %settings.export_dir.display(),
        "Tag exporter starting"
    );

    let client = ApiClient::with_timeouts(
        &settings.api_url,
        &settings.token,
        &settings.auth_scheme,
        settings.connect_timeout_secs,
        settings.read_timeout_secs,
    )
    .context("Failed to set up the API client")?;

    let mut run_log = RunLog::open(&settings.log_dir, PROGRAM_NAME, Local::now().naive_local())
        .with_context(|| {
            format!(
                "Failed to create run log in '{}'",
                settings.log_dir.display()
            )
        })?;

    let progress = ProgressReporter::new(
        !args.quiet && !args.no_progress && io::stderr().is_terminal(),
    );
    let exporter = Exporter::new(
        client,
        ExportRoot::new(&settings.export_dir),
        ExportOptions {
            program: PROGRAM_NAME.to_string(),
            currency_locale: settings.currency_locale,
            host: HostInfo::gather(),
        },
    );

    let result = exporter.run(&mut run_log, &progress).await;

    // The run log is renamed on success and failure alike
    match run_log.finalize() {
        Ok(path) => info!(path = %path.display(), "Run log written"),
        Err(error) => warn!(%error, "Failed to finalize run log"),
    }

    let summary = result.context("Export failed")?;
    for outcome in &summary.jobs {
        debug!(?outcome, "job outcome");
    }
    info!(
        exported = summary.exported_count(),
        skipped_today = summary.skipped_count(),
        missing_directories = summary.missing_count(),
        orphaned_directories = summary.orphaned_directories.len(),
        documents = summary.documents_exported(),
        download_failures = summary.download_failures(),
        "Export complete"
    );

    Ok(())
}
