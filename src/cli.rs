//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Export documents grouped by tag into per-tag folders with spreadsheet reports.
///
/// Every subdirectory of the export directory that is named after a tag on
/// the server receives that tag's documents (PDF + JSON) and a report; the
/// `ALLDocs` directory receives every document once per day. Previous
/// contents are archived into a zip file first.
#[derive(Parser, Debug)]
#[command(name = "tag-exporter")]
#[command(author, version, about)]
pub struct Args {
    /// Config file (default: ./tag-exporter.local.toml, ./tag-exporter.toml,
    /// then the user config directory)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Export root directory (overrides `[export] directory`)
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Directory for run logs (overrides `[log] directory`)
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Do not draw the progress bar
    #[arg(long)]
    pub no_progress: bool,
}
