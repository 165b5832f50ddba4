//! Inventory of the fillable fields of a PDF document.
//!
//! Native AcroForm widgets are read directly. Pages without them are scanned
//! by heuristic detectors over vector drawings and text, and the candidates
//! are consolidated into one list per page.

use std::path::Path;

use thiserror::Error;

pub mod config;
pub mod consolidate;
pub mod detect;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod types;

pub use config::{AnalyzerConfig, Strategy};
pub use report::{AnalysisReport, Diagnostic, Summary};
pub use source::{Document, PageSource};
pub use types::*;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("Document is empty")]
    Empty,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Analyze PDF bytes with the default configuration.
pub fn analyze(bytes: &[u8]) -> AnalysisReport {
    analyze_with(bytes, &AnalyzerConfig::default())
}

/// Analyze PDF bytes. A document that cannot be opened yields a report with
/// `success == false`; this never fails.
pub fn analyze_with(bytes: &[u8], config: &AnalyzerConfig) -> AnalysisReport {
    match Document::open(bytes) {
        Ok(document) => analyze_source(&document, config),
        Err(e) => {
            log::warn!("could not open document: {e}");
            AnalysisReport::failure(e)
        }
    }
}

/// Read and analyze the file at `path`.
pub fn analyze_file(path: impl AsRef<Path>, config: &AnalyzerConfig) -> AnalysisReport {
    match std::fs::read(path.as_ref()) {
        Ok(bytes) => analyze_with(&bytes, config),
        Err(e) => AnalysisReport::failure(PdfError::from(e)),
    }
}

/// Analyze an already opened document or any other [`PageSource`].
pub fn analyze_source(source: &dyn PageSource, config: &AnalyzerConfig) -> AnalysisReport {
    pipeline::analyze_source(source, config)
}
