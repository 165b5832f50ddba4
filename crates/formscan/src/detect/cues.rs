//! Weak visual cues: signature wording, date masks and empty brackets.

use super::patterns;
use super::primitives::rectangles_overlap;
use super::textual::char_x;
use super::{Detector, DetectorError};
use crate::config::AnalyzerConfig;
use crate::parser::layout::TextSpan;
use crate::source::PageSource;
use crate::types::{DetectionMethod, FieldRecord, FieldType, Rect};

const NAME: &str = "visual_cues";

pub const SIGNATURE_CONFIDENCE: f32 = 0.5;
pub const DATE_CONFIDENCE: f32 = 0.5;
pub const BRACKET_CONFIDENCE: f32 = 0.6;

fn span_cues(span: &TextSpan, page: u32, config: &AnalyzerConfig) -> Vec<FieldRecord> {
    let mut out = Vec::new();
    if patterns::has_signature_keyword(&span.text) {
        out.push(FieldRecord::new(
            FieldType::SignatureField,
            page,
            span.bbox,
            DetectionMethod::SignatureText,
            SIGNATURE_CONFIDENCE,
        ));
    }
    if patterns::date_pattern().is_match(&span.text) {
        out.push(FieldRecord::new(
            FieldType::DateField,
            page,
            span.bbox,
            DetectionMethod::DatePattern,
            DATE_CONFIDENCE,
        ));
    }
    for m in patterns::empty_bracket_pattern().find_iter(&span.text) {
        let x = char_x(span, span.text[..m.start()].chars().count());
        out.push(FieldRecord::new(
            FieldType::Checkbox,
            page,
            Rect::new(x, span.bbox.y0, x + config.text.glyph_box_size, span.bbox.y1),
            DetectionMethod::BracketCheckbox,
            BRACKET_CONFIDENCE,
        ));
    }
    out
}

/// Cue records for a page, dropping any that mostly cover an earlier one.
pub fn cue_fields(spans: &[TextSpan], page: u32, config: &AnalyzerConfig) -> Vec<FieldRecord> {
    let mut kept: Vec<FieldRecord> = Vec::new();
    for candidate in spans.iter().flat_map(|s| span_cues(s, page, config)) {
        let duplicate = kept
            .iter()
            .any(|k| rectangles_overlap(&k.rect, &candidate.rect, config.merge.cue_overlap));
        if !duplicate {
            kept.push(candidate);
        }
    }
    kept
}

pub struct VisualCueDetector;

impl Detector for VisualCueDetector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn detect(
        &self,
        source: &dyn PageSource,
        page: u32,
        config: &AnalyzerConfig,
    ) -> Result<Vec<FieldRecord>, DetectorError> {
        let spans = source
            .text_spans(page)
            .map_err(|e| DetectorError::new(NAME, page, e))?;
        Ok(cue_fields(&spans, page, config))
    }
}
