//! Ingest command execution: wires parsed CLI flags into `ingest::run`.

use crate::config::Config;
use crate::embedding::default_embedder;
use crate::error::Result;
use crate::ingest::{self, IngestOptions, IngestReport};

use super::parser::Cli;

/// Loads configuration, runs the ingest pipeline, and logs per-document
/// outcomes.
///
/// # Errors
///
/// Returns an error if configuration fails to load or the orchestrator
/// fails (exit `1` if no inputs or a configured input is missing).
pub fn execute(cli: &Cli) -> Result<IngestReport> {
    let config = Config::load(cli.config.as_deref())?;
    let embedder = default_embedder(config.retrieval.embedding_dimensions);

    let options = IngestOptions {
        force: cli.force,
        only_document: cli.doc.clone(),
        skip_graph: cli.skip_graph,
        extra_dir: cli.pdf_dir.clone(),
    };

    let report = ingest::run(&config, embedder.as_ref(), &options)?;

    for document in &report.documents {
        match &document.outcome {
            ingest::DocumentOutcome::Skipped => {
                tracing::info!(document = %document.document_name, "skipped (unchanged)");
            }
            ingest::DocumentOutcome::Processed { chunk_count } => {
                tracing::info!(document = %document.document_name, chunks = chunk_count, "processed");
            }
            ingest::DocumentOutcome::Failed { stage, reason } => {
                tracing::warn!(document = %document.document_name, stage = %stage, reason = %reason, "failed");
            }
        }
    }
    tracing::info!(
        total_chunks = report.total_chunks,
        graph_nodes = ?report.graph_nodes,
        "ingest run complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_raw_dir_reports_input_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            format!(
                "[paths]\nraw_dir = \"{}\"\nprocessed_dir = \"{}\"\nindex_dir = \"{}\"\ngraph_dir = \"{}\"\n",
                dir.path().join("missing-raw").display(),
                dir.path().join("processed").display(),
                dir.path().join("index").display(),
                dir.path().join("graph").display(),
            ),
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            force: false,
            doc: None,
            skip_graph: false,
            pdf_dir: None,
        };
        let err = execute(&cli).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Internal);
    }
}
