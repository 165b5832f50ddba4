//! The analysis envelope returned to callers.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::detect::DetectorError;
use crate::types::{FieldRecord, FieldType};

/// A detector failure that was recovered from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub page: u32,
    pub detector: String,
    pub message: String,
}

impl From<DetectorError> for Diagnostic {
    fn from(e: DetectorError) -> Self {
        Self {
            page: e.page,
            detector: e.detector.to_string(),
            message: e.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Summary {
    pub by_type: BTreeMap<FieldType, usize>,
    /// Keyed by the full provenance tag, so merged records count separately.
    pub by_method: BTreeMap<String, usize>,
    pub by_page: BTreeMap<u32, usize>,
}

impl Summary {
    pub fn of(fields: &[FieldRecord]) -> Self {
        let mut summary = Summary::default();
        for f in fields {
            *summary.by_type.entry(f.field_type).or_default() += 1;
            *summary
                .by_method
                .entry(f.detection_method.to_string())
                .or_default() += 1;
            *summary.by_page.entry(f.page).or_default() += 1;
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub success: bool,
    pub fields: Vec<FieldRecord>,
    pub field_count: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub page_count: u32,
    pub interactive_field_count: usize,
    /// Field-shaped drawn rectangles across all pages, whatever the strategy.
    pub visual_field_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    pub summary: Summary,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisReport {
    pub fn success(fields: Vec<FieldRecord>, page_count: u32, diagnostics: Vec<Diagnostic>) -> Self {
        let interactive_field_count = fields.iter().filter(|f| f.is_native()).count();
        let mut report = Self {
            success: true,
            field_count: fields.len(),
            summary: Summary::of(&fields),
            fields,
            message: String::new(),
            error: None,
            page_count,
            interactive_field_count,
            visual_field_count: 0,
            document_type: None,
            diagnostics,
        };
        report.message = report.describe();
        report
    }

    /// Attach what was learned about the document as a whole.
    pub fn with_insight(mut self, visual_field_count: usize, document_type: Option<String>) -> Self {
        self.visual_field_count = visual_field_count;
        self.document_type = document_type;
        self.message = self.describe();
        self
    }

    fn describe(&self) -> String {
        let mut m = if self.fields.is_empty() {
            "No fillable fields found".to_string()
        } else {
            format!(
                "Found {} form fields across {} pages",
                self.fields.len(),
                self.page_count
            )
        };
        if self.interactive_field_count > 0 {
            m.push_str(&format!(" ({} interactive)", self.interactive_field_count));
        }
        if self.visual_field_count > self.interactive_field_count {
            m.push_str(&format!(
                " (detected {} visual form elements that aren't interactive)",
                self.visual_field_count
            ));
        }
        m
    }

    /// The document could not be opened. No partial results.
    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            fields: Vec::new(),
            field_count: 0,
            message: "Failed to analyze document".to_string(),
            error: Some(error.to_string()),
            page_count: 0,
            interactive_field_count: 0,
            visual_field_count: 0,
            document_type: None,
            summary: Summary::default(),
            diagnostics: Vec::new(),
        }
    }
}
