//! Shape tests shared by the detectors.

use crate::config::GeometryConfig;
use crate::types::{FieldType, Rect};

/// A horizontal segment in page space, `x0 <= x1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizontalLine {
    pub x0: f32,
    pub x1: f32,
    pub y: f32,
}

impl HorizontalLine {
    pub fn length(&self) -> f32 {
        self.x1 - self.x0
    }
}

/// Could a box of this size be a fillable area?
pub fn is_field_shaped_rectangle(width: f32, height: f32, geometry: &GeometryConfig) -> bool {
    width >= geometry.min_width
        && height >= geometry.min_height
        && height <= geometry.max_height
        && width <= geometry.max_width
}

/// Small near-squares are checkboxes; every other shape is a text field.
pub fn classify_rectangle_by_size(width: f32, height: f32, geometry: &GeometryConfig) -> FieldType {
    let side = geometry.checkbox_min..=geometry.checkbox_max;
    let aspect = if height > 0.0 { width / height } else { 0.0 };
    if side.contains(&width)
        && side.contains(&height)
        && (geometry.checkbox_min_aspect..=geometry.checkbox_max_aspect).contains(&aspect)
    {
        FieldType::Checkbox
    } else {
        FieldType::TextField
    }
}

/// Sort by y and bucket lines whose y differs from the previous line in the
/// bucket by less than `y_tolerance`.
pub fn group_nearby_lines(
    mut lines: Vec<HorizontalLine>,
    y_tolerance: f32,
) -> Vec<Vec<HorizontalLine>> {
    lines.sort_by(|a, b| a.y.total_cmp(&b.y));

    let mut groups: Vec<Vec<HorizontalLine>> = Vec::new();
    for line in lines {
        match groups.last_mut() {
            Some(group) if group.last().is_some_and(|prev| (line.y - prev.y).abs() < y_tolerance) => {
                group.push(line)
            }
            _ => groups.push(vec![line]),
        }
    }
    groups
}

/// Intersection area over the smaller rect's area is at least `threshold`.
///
/// A zero-area rect overlaps nothing.
pub fn rectangles_overlap(a: &Rect, b: &Rect, threshold: f32) -> bool {
    let min_area = a.area().min(b.area());
    if min_area <= 0.0 {
        return false;
    }
    a.intersection_area(b) / min_area >= threshold
}
