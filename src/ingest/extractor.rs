//! Document text extraction. A trait seam over the input format so PDFs,
//! plain text, and future formats share the ingest pipeline.

use std::path::Path;

use crate::error::{IngestError, Result};

/// Extracts raw text from a source document.
pub trait TextExtractor: Send + Sync {
    /// Reads `path` and returns its raw extracted text.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its format is
    /// unsupported.
    fn extract(&self, path: &Path) -> Result<String>;
}

/// Extracts plain-text (`.txt`) documents by reading them verbatim.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| {
            IngestError::StageFailed {
                document: path.display().to_string(),
                stage: "extracting",
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// Extracts PDF documents. No in-pack PDF-parsing crate is depended on;
/// this stub always reports failure so the orchestrator's per-document
/// `failed` transition is exercised until a PDF backend is wired in.
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        Err(IngestError::StageFailed {
            document: path.display().to_string(),
            stage: "extracting",
            reason: "PDF extraction is not wired to a backend in this build".to_string(),
        }
        .into())
    }
}

/// Selects an extractor by file extension.
#[must_use]
pub fn extractor_for(path: &Path) -> Box<dyn TextExtractor> {
    match path.extension().and_then(std::ffi::OsStr::to_str) {
        Some("pdf") => Box::new(PdfExtractor),
        _ => Box::new(PlainTextExtractor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_extractor_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "hola mundo").unwrap();
        let extractor = PlainTextExtractor;
        assert_eq!(extractor.extract(&path).unwrap(), "hola mundo");
    }

    #[test]
    fn pdf_extractor_reports_stage_failure() {
        let extractor = PdfExtractor;
        let err = extractor.extract(Path::new("doc.pdf")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Internal);
    }

    #[test]
    fn extractor_for_dispatches_by_extension() {
        assert!(extractor_for(Path::new("a.pdf")).extract(Path::new("a.pdf")).is_err());
    }
}
