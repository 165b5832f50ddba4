//! Field detectors.
//!
//! Each detector looks at one page through a [`PageSource`] and returns
//! candidate records. Candidates from different detectors are expected to
//! overlap; reconciling them is the job of [`crate::consolidate`].

use thiserror::Error;

use crate::config::AnalyzerConfig;
use crate::source::PageSource;
use crate::types::FieldRecord;

pub mod cues;
pub mod geometric;
pub mod native;
pub mod patterns;
pub mod primitives;
pub mod section;
pub mod textual;

pub use cues::VisualCueDetector;
pub use geometric::GeometricDetector;
pub use native::NativeDetector;
pub use section::SectionDetector;
pub use textual::TextualDetector;

/// A detector could not process one page.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{detector} detector failed on page {page}: {message}")]
pub struct DetectorError {
    pub detector: &'static str,
    pub page: u32,
    pub message: String,
}

impl DetectorError {
    pub fn new(detector: &'static str, page: u32, cause: impl std::fmt::Display) -> Self {
        Self {
            detector,
            page,
            message: cause.to_string(),
        }
    }
}

pub trait Detector {
    /// Short identifier used in logs and diagnostics.
    fn name(&self) -> &'static str;

    fn detect(
        &self,
        source: &dyn PageSource,
        page: u32,
        config: &AnalyzerConfig,
    ) -> Result<Vec<FieldRecord>, DetectorError>;
}
