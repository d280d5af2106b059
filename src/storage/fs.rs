//! Filesystem artifact layout under `processed_dir`:
//! `extracted/`, `cleaned/`, `metadata/`, `chunks/`, `.pipeline_state.json`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::Chunk;
use crate::error::{Result, StorageError};

/// A document's extracted metadata snapshot (`metadata/<stem>.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// The document's file stem.
    pub document_name: String,
    /// The document's detected or registry-assigned class.
    pub document_type: crate::core::DocumentType,
    /// Content hash at extraction time.
    pub content_hash: String,
}

/// `document_name -> sha256(content)` map, persisted atomically after each
/// ingest run. A `BTreeMap` keeps key order deterministic across runs so
/// `.pipeline_state.json` serializes byte-identically given identical input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineState(pub BTreeMap<String, String>);

/// Owns the `processed_dir` artifact layout.
pub struct ArtifactStore {
    root: PathBuf,
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(StorageError::from)?;
    }
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, contents).map_err(StorageError::from)?;
    std::fs::rename(&tmp_path, path).map_err(StorageError::from)?;
    Ok(())
}

impl ArtifactStore {
    /// Opens (without creating) the artifact store rooted at `processed_dir`.
    #[must_use]
    pub fn new(processed_dir: impl Into<PathBuf>) -> Self {
        Self { root: processed_dir.into() }
    }

    fn path_for(&self, subdir: &str, stem: &str, extension: &str) -> PathBuf {
        self.root.join(subdir).join(format!("{stem}.{extension}"))
    }

    /// Writes `extracted/<stem>.txt`.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn write_extracted(&self, stem: &str, text: &str) -> Result<()> {
        write_atomic(&self.path_for("extracted", stem, "txt"), text)
    }

    /// Writes `cleaned/<stem>.txt`.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn write_cleaned(&self, stem: &str, text: &str) -> Result<()> {
        write_atomic(&self.path_for("cleaned", stem, "txt"), text)
    }

    /// Reads `cleaned/<stem>.txt`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure other than not-found.
    pub fn read_cleaned(&self, stem: &str) -> Result<Option<String>> {
        let path = self.path_for("cleaned", stem, "txt");
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path).map_err(StorageError::from)?))
    }

    /// Writes `metadata/<stem>.json`.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or serialization failure.
    pub fn write_metadata(&self, stem: &str, metadata: &DocumentMetadata) -> Result<()> {
        let json = serde_json::to_string_pretty(metadata).map_err(StorageError::from)?;
        write_atomic(&self.path_for("metadata", stem, "json"), &json)
    }

    /// Writes `chunks/<stem>.json` as a JSON array of chunk records.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or serialization failure.
    pub fn write_chunks(&self, stem: &str, chunks: &[Chunk]) -> Result<()> {
        let json = serde_json::to_string_pretty(chunks).map_err(StorageError::from)?;
        write_atomic(&self.path_for("chunks", stem, "json"), &json)
    }

    /// Reads `chunks/<stem>.json`. Unknown fields are ignored; missing
    /// optional fields default.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or deserialization failure.
    pub fn read_chunks(&self, stem: &str) -> Result<Vec<Chunk>> {
        let path = self.path_for("chunks", stem, "json");
        let text = std::fs::read_to_string(path).map_err(StorageError::from)?;
        serde_json::from_str(&text).map_err(|e| StorageError::from(e).into())
    }

    /// Reads every `chunks/*.json` file in the store, concatenated.
    ///
    /// # Errors
    ///
    /// Returns an error if the `chunks/` directory or one of its files
    /// cannot be read.
    pub fn read_all_chunks(&self) -> Result<Vec<Chunk>> {
        let dir = self.root.join("chunks");
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut all = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(StorageError::from)? {
            let entry = entry.map_err(StorageError::from)?;
            let text = std::fs::read_to_string(entry.path()).map_err(StorageError::from)?;
            let chunks: Vec<Chunk> = serde_json::from_str(&text).map_err(StorageError::from)?;
            all.extend(chunks);
        }
        Ok(all)
    }

    /// Loads `.pipeline_state.json`; a missing file yields empty state.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or deserialization failure other than
    /// not-found.
    pub fn load_state(&self) -> Result<PipelineState> {
        let path = self.root.join(".pipeline_state.json");
        if !path.exists() {
            return Ok(PipelineState::default());
        }
        let text = std::fs::read_to_string(path).map_err(StorageError::from)?;
        serde_json::from_str(&text).map_err(|e| StorageError::from(e).into())
    }

    /// Persists `.pipeline_state.json` atomically (step 4).
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or serialization failure.
    pub fn save_state(&self, state: &PipelineState) -> Result<()> {
        let json = serde_json::to_string_pretty(state).map_err(StorageError::from)?;
        write_atomic(&self.root.join(".pipeline_state.json"), &json)
    }
}
