//! Command-line argument parsing for the ingest binary.

use std::path::PathBuf;

use clap::Parser;

/// Runs the ingest pipeline over `raw_dir`, building the vector index and
/// knowledge graph (Ingest CLI).
#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a `config.toml` layered over the built-in defaults.
    #[arg(long, env = "CHATBOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bypasses the content-hash skip check, reprocessing every document.
    #[arg(long)]
    pub force: bool,

    /// Restricts the run to a single document, by file stem.
    #[arg(long)]
    pub doc: Option<String>,

    /// Skips the post-ingest knowledge-graph rebuild.
    #[arg(long)]
    pub skip_graph: bool,

    /// An additional directory of PDF source documents, scanned alongside
    /// the configured `raw_dir`.
    #[arg(long)]
    pub pdf_dir: Option<PathBuf>,
}
