//! Template fields expected below common form-section headings.
//!
//! These records are guesses anchored on a heading, not on any visual
//! evidence of an input.

use super::patterns;
use super::{Detector, DetectorError};
use crate::config::AnalyzerConfig;
use crate::parser::layout::TextBlock;
use crate::source::PageSource;
use crate::types::{DetectionMethod, FieldRecord, FieldType, Rect};

const NAME: &str = "section";

pub const SECTION_CONFIDENCE: f32 = 0.6;

const FIELD_OFFSET: f32 = 5.0;
const FIELD_HEIGHT: f32 = 20.0;
const NAME_FIELD_WIDTH: f32 = 200.0;
const ADDRESS_FIELD_WIDTH: f32 = 300.0;
const ADDRESS_LINES: usize = 3;
const ADDRESS_LINE_PITCH: f32 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Name,
    Address,
    Contact,
    Signature,
    General,
}

impl SectionKind {
    /// First match wins: name, address, contact, signature.
    pub fn classify(text: &str) -> SectionKind {
        let lower = text.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
        if has(&["name", "client"]) {
            SectionKind::Name
        } else if has(&["address"]) {
            SectionKind::Address
        } else if has(&["phone", "contact"]) {
            SectionKind::Contact
        } else if has(&["signature", "sign"]) {
            SectionKind::Signature
        } else {
            SectionKind::General
        }
    }
}

fn text_field(page: u32, x0: f32, y0: f32, width: f32, name: String) -> FieldRecord {
    FieldRecord::new(
        FieldType::TextField,
        page,
        Rect::new(x0, y0, x0 + width, y0 + FIELD_HEIGHT),
        DetectionMethod::SectionPattern,
        SECTION_CONFIDENCE,
    )
    .with_name(name)
}

/// Template fields for one block, empty when the block is no heading or its
/// section has no template.
pub fn section_fields(block: &TextBlock, page: u32) -> Vec<FieldRecord> {
    let text = patterns::normalize(&block.text());
    if !patterns::is_section_heading(&text) {
        return Vec::new();
    }
    let b = block.bbox;
    let top = b.y1 + FIELD_OFFSET;
    match SectionKind::classify(&text) {
        SectionKind::Name => vec![text_field(page, b.x0, top, NAME_FIELD_WIDTH, "name_field".into())],
        SectionKind::Address => (0..ADDRESS_LINES)
            .map(|i| {
                text_field(
                    page,
                    b.x0,
                    top + i as f32 * ADDRESS_LINE_PITCH,
                    ADDRESS_FIELD_WIDTH,
                    format!("address_line_{}", i + 1),
                )
            })
            .collect(),
        kind => {
            log::debug!("page {page}: {kind:?} section {text:?} has no template");
            Vec::new()
        }
    }
}

pub struct SectionDetector;

impl Detector for SectionDetector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn detect(
        &self,
        source: &dyn PageSource,
        page: u32,
        _config: &AnalyzerConfig,
    ) -> Result<Vec<FieldRecord>, DetectorError> {
        let blocks = source
            .text_blocks(page)
            .map_err(|e| DetectorError::new(NAME, page, e))?;
        Ok(blocks
            .iter()
            .flat_map(|block| section_fields(block, page))
            .collect())
    }
}
