//! Field-shaped rectangles and underline rules in the page's vector drawings.

use super::primitives::{
    classify_rectangle_by_size, group_nearby_lines, is_field_shaped_rectangle, HorizontalLine,
};
use super::{Detector, DetectorError};
use crate::config::AnalyzerConfig;
use crate::parser::drawing::DrawingPath;
use crate::source::PageSource;
use crate::types::{DetectionMethod, FieldRecord, FieldType, Rect};

const NAME: &str = "geometric";

pub const RECTANGLE_CONFIDENCE: f32 = 0.8;
pub const LINE_CONFIDENCE: f32 = 0.7;

/// An underline field spans from 5 units above the rule to 15 below it.
const LINE_FIELD_ABOVE: f32 = 5.0;
const LINE_FIELD_BELOW: f32 = 15.0;

pub struct GeometricDetector;

impl GeometricDetector {
    /// Records for one page's drawings. Curves are ignored.
    pub fn records_from_drawings(
        drawings: &[DrawingPath],
        page: u32,
        config: &AnalyzerConfig,
    ) -> Vec<FieldRecord> {
        let geometry = &config.geometry;
        let mut records = Vec::new();

        for rect in drawings.iter().flat_map(DrawingPath::rects) {
            let (w, h) = (rect.width(), rect.height());
            // Checkbox squares sit below the text-box gate's minimum width.
            let kind = classify_rectangle_by_size(w, h, geometry);
            if kind != FieldType::Checkbox && !is_field_shaped_rectangle(w, h, geometry) {
                continue;
            }
            records.push(FieldRecord::new(
                kind,
                page,
                *rect,
                DetectionMethod::RectangleAnalysis,
                RECTANGLE_CONFIDENCE,
            ));
        }

        let horizontal: Vec<HorizontalLine> = drawings
            .iter()
            .flat_map(DrawingPath::lines)
            .filter(|(start, end)| (end.1 - start.1).abs() < geometry.horizontal_tolerance)
            .map(|(start, end)| HorizontalLine {
                x0: start.0.min(end.0),
                x1: start.0.max(end.0),
                y: start.1,
            })
            .filter(|line| line.length() > geometry.min_line_length)
            .collect();

        for group in group_nearby_lines(horizontal, geometry.line_group_tolerance) {
            // Stacked rules are table or box borders, not a single blank.
            let [line] = group.as_slice() else {
                continue;
            };
            records.push(FieldRecord::new(
                FieldType::TextField,
                page,
                Rect::new(
                    line.x0,
                    line.y - LINE_FIELD_ABOVE,
                    line.x1,
                    line.y + LINE_FIELD_BELOW,
                ),
                DetectionMethod::LineAnalysis,
                LINE_CONFIDENCE,
            ));
        }

        records
    }
}

impl Detector for GeometricDetector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn detect(
        &self,
        source: &dyn PageSource,
        page: u32,
        config: &AnalyzerConfig,
    ) -> Result<Vec<FieldRecord>, DetectorError> {
        let drawings = source
            .drawings(page)
            .map_err(|e| DetectorError::new(NAME, page, e))?;
        Ok(Self::records_from_drawings(&drawings, page, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::drawing::PathItem;

    fn path(items: Vec<PathItem>) -> DrawingPath {
        DrawingPath {
            items,
            stroked: true,
            filled: false,
        }
    }

    fn line(x0: f32, y0: f32, x1: f32, y1: f32) -> PathItem {
        PathItem::Line {
            start: (x0, y0),
            end: (x1, y1),
        }
    }

    fn detect(drawings: &[DrawingPath]) -> Vec<FieldRecord> {
        GeometricDetector::records_from_drawings(drawings, 1, &AnalyzerConfig::default())
    }

    #[test]
    fn square_box_is_checkbox() {
        let records = detect(&[path(vec![PathItem::Rect(Rect::new(100.0, 100.0, 120.0, 120.0))])]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].field_type, FieldType::Checkbox);
        assert_eq!(records[0].confidence, 0.8);
        assert_eq!(records[0].detection_method.to_string(), "rectangle_analysis");
    }

    #[test]
    fn small_square_is_checkbox_below_text_gate() {
        let records = detect(&[path(vec![PathItem::Rect(Rect::new(0.0, 0.0, 15.0, 15.0))])]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].field_type, FieldType::Checkbox);
    }

    #[test]
    fn wide_box_is_text_field_and_out_of_gate_boxes_are_ignored() {
        let records = detect(&[path(vec![
            PathItem::Rect(Rect::new(50.0, 50.0, 250.0, 70.0)),
            PathItem::Rect(Rect::new(0.0, 0.0, 612.0, 792.0)),
            PathItem::Rect(Rect::new(0.0, 0.0, 15.0, 4.0)),
            PathItem::Rect(Rect::new(0.0, 0.0, 3.0, 3.0)),
        ])]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].field_type, FieldType::TextField);
    }

    #[test]
    fn lone_rule_becomes_line_field() {
        let records = detect(&[path(vec![line(300.0, 200.0, 100.0, 201.0)])]);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.field_type, FieldType::TextField);
        assert_eq!(r.confidence, 0.7);
        assert_eq!(r.rect, Rect::new(100.0, 195.0, 300.0, 215.0));
        assert_eq!(r.detection_method.to_string(), "line_analysis");
    }

    #[test]
    fn short_steep_and_stacked_lines_are_ignored() {
        let records = detect(&[path(vec![
            line(100.0, 100.0, 120.0, 100.0),
            line(100.0, 100.0, 300.0, 150.0),
            line(100.0, 400.0, 300.0, 400.0),
            line(100.0, 405.0, 300.0, 405.0),
        ])]);
        assert!(records.is_empty());
    }

    #[test]
    fn curves_are_not_classified() {
        let records = detect(&[path(vec![PathItem::Curve {
            start: (0.0, 0.0),
            end: (200.0, 0.0),
        }])]);
        assert!(records.is_empty());
    }
}
