//! Binary entry point for the ingest pipeline.

#![allow(clippy::print_stderr)]

use std::process::ExitCode;

use chatbot_admin::cli::{self, Cli};
use clap::Parser;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli::execute(&cli) {
        Ok(report) => {
            tracing::info!(documents = report.documents.len(), "ingest finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "ingest failed");
            ExitCode::FAILURE
        }
    }
}
