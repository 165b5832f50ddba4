//! Checkbox glyphs, colon labels and blank runs in the page text.

use super::patterns::{self, CHECKBOX_GLYPH};
use super::{Detector, DetectorError};
use crate::config::{AnalyzerConfig, TextConfig};
use crate::parser::layout::TextSpan;
use crate::source::PageSource;
use crate::types::{DetectionMethod, FieldRecord, FieldType, Rect, PLACEHOLDER_HEIGHT, PLACEHOLDER_ORIGIN};

const NAME: &str = "textual";

pub const GLYPH_CONFIDENCE: f32 = 0.9;
pub const LABEL_CONFIDENCE: f32 = 0.7;
pub const UNDERLINE_CONFIDENCE: f32 = 0.6;

/// Left edge of the `index`-th character of `span`, assuming every
/// character has the same width.
pub fn char_x(span: &TextSpan, index: usize) -> f32 {
    let len = span.text.chars().count().max(1);
    span.bbox.x0 + index as f32 * (span.bbox.width() / len as f32)
}

/// One checkbox per filled-square glyph in the span.
fn glyph_checkboxes(span: &TextSpan, page: u32, text: &TextConfig) -> Vec<FieldRecord> {
    span.text
        .chars()
        .enumerate()
        .filter(|(_, c)| *c == CHECKBOX_GLYPH)
        .map(|(i, _)| {
            let x = char_x(span, i);
            FieldRecord::new(
                FieldType::Checkbox,
                page,
                Rect::new(x, span.bbox.y0, x + text.glyph_box_size, span.bbox.y1),
                DetectionMethod::CheckboxSymbolPositioned,
                GLYPH_CONFIDENCE,
            )
        })
        .collect()
}

/// The input area projected to the right of a label.
fn label_field(span: &TextSpan, label: &str, page: u32, text: &TextConfig) -> FieldRecord {
    let b = span.bbox;
    let height = b.height().max(text.label_min_height);
    FieldRecord::new(
        FieldType::TextField,
        page,
        Rect::new(
            b.x1 + text.label_gap,
            b.y0,
            b.x1 + text.label_input_width,
            b.y0 + height,
        ),
        DetectionMethod::LabelBasedPositioning,
        LABEL_CONFIDENCE,
    )
    .with_name(patterns::label_field_name(label))
    .with_label(label)
}

/// Blank runs found anywhere in the page text. Their position is unknown,
/// so each gets a placeholder rect whose width follows the run length.
pub fn underline_fields(plain_text: &str, page: u32, text: &TextConfig) -> Vec<FieldRecord> {
    let (x, y) = PLACEHOLDER_ORIGIN;
    patterns::underline_patterns()
        .iter()
        .flat_map(|re| re.find_iter(plain_text))
        .map(|m| {
            let width = m.as_str().chars().count() as f32 * text.underline_char_width;
            FieldRecord::new(
                FieldType::TextField,
                page,
                Rect::new(x, y, x + width, y + PLACEHOLDER_HEIGHT),
                DetectionMethod::UnderlinePattern,
                UNDERLINE_CONFIDENCE,
            )
        })
        .collect()
}

pub fn span_fields(spans: &[TextSpan], page: u32, text: &TextConfig) -> Vec<FieldRecord> {
    let mut records = Vec::new();
    for span in spans {
        if span.text.contains(CHECKBOX_GLYPH) {
            records.extend(glyph_checkboxes(span, page, text));
            continue;
        }
        let label = patterns::normalize(&span.text);
        if patterns::is_label(&label) {
            records.push(label_field(span, &label, page, text));
        }
    }
    records
}

pub struct TextualDetector;

impl Detector for TextualDetector {
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
        let mut records = span_fields(&spans, page, &config.text);

        let plain = source
            .plain_text(page)
            .map_err(|e| DetectorError::new(NAME, page, e))?;
        records.extend(underline_fields(&plain, page, &config.text));
        Ok(records)
    }
}
