//! End-to-end tests driving the `ingest` binary and the library query surface
//! together against a small synthetic corpus.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use chatbot_admin::embedding::default_embedder;
use chatbot_admin::fusion::Mode;
use chatbot_admin::{Config, EchoLlm, KnowledgeGraph, QueryEngine, VectorIndex};
use tempfile::TempDir;

fn write_corpus(dir: &TempDir) -> std::path::PathBuf {
    let raw_dir = dir.path().join("raw");
    std::fs::create_dir_all(&raw_dir).unwrap();
    std::fs::write(
        raw_dir.join("reglamento-general.txt"),
        "El Reglamento General establece que la inscripcion al posgrado \
         debe realizarse antes del inicio de cada cuatrimestre. \
         Los estudiantes deben presentar su proyecto final antes de la defensa.",
    )
    .unwrap();
    std::fs::write(
        raw_dir.join("resolucion-001.txt"),
        "La Resolucion 001 aprueba el plan de estudios de la Maestria \
         en Inteligencia Artificial y fija los requisitos de admision.",
    )
    .unwrap();
    raw_dir
}

fn write_config(dir: &TempDir, raw_dir: &std::path::Path) -> std::path::PathBuf {
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            "[paths]\nraw_dir = \"{}\"\nprocessed_dir = \"{}\"\nindex_dir = \"{}\"\ngraph_dir = \"{}\"\nregistry_path = \"{}\"\n",
            raw_dir.display(),
            dir.path().join("processed").display(),
            dir.path().join("index").display(),
            dir.path().join("graph").display(),
            dir.path().join("registry.toml").display(),
        ),
    )
    .unwrap();
    config_path
}

#[test]
fn ingest_binary_succeeds_on_a_fresh_corpus() {
    let dir = TempDir::new().unwrap();
    let raw_dir = write_corpus(&dir);
    let config_path = write_config(&dir, &raw_dir);

    Command::cargo_bin("ingest")
        .unwrap()
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success();

    assert!(dir.path().join("index").exists());
    assert!(dir.path().join("graph").exists());
}

#[test]
fn ingest_binary_fails_when_raw_dir_is_missing() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, &dir.path().join("nonexistent-raw"));

    Command::cargo_bin("ingest")
        .unwrap()
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .code(1);
}

#[test]
fn ingest_then_query_round_trip_returns_grounded_answer() {
    let dir = TempDir::new().unwrap();
    let raw_dir = write_corpus(&dir);
    let config_path = write_config(&dir, &raw_dir);

    Command::cargo_bin("ingest")
        .unwrap()
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success();

    let config = Config::load(Some(&config_path)).unwrap();
    let embedder = default_embedder(config.retrieval.embedding_dimensions);
    let index = chatbot_admin::storage::index_store::load(&config.paths.index_dir).unwrap();
    let graph = chatbot_admin::storage::graph_store::load(&config.paths.graph_dir)
        .unwrap_or_default();
    let llm = EchoLlm;

    let engine = QueryEngine::new(&index, &graph, embedder.as_ref(), &llm, None, &config);
    let response = engine
        .answer("Cuando debo inscribirme al posgrado?", Mode::RagOnly, None, None)
        .unwrap();

    assert!(!response.sources.is_empty());
    assert!(response.confidence >= 0.0);
}

#[test]
fn query_on_empty_corpus_abstains_gracefully() {
    let dir = TempDir::new().unwrap();
    let raw_dir = dir.path().join("raw");
    std::fs::create_dir_all(&raw_dir).unwrap();
    let config_path = write_config(&dir, &raw_dir);
    let config = Config::load(Some(&config_path)).unwrap();

    let embedder = default_embedder(config.retrieval.embedding_dimensions);
    let index = VectorIndex::new();
    let graph = KnowledgeGraph::new();
    let llm = EchoLlm;

    let engine = QueryEngine::new(&index, &graph, embedder.as_ref(), &llm, None, &config);
    let response = engine
        .answer("Cuando debo inscribirme al posgrado?", Mode::Hybrid, None, None)
        .unwrap();

    assert!((response.confidence - 0.0).abs() < f32::EPSILON);
    assert!(!response.fallback_contacts.is_empty());
}
