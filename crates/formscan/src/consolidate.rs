//! Reconciling overlapping candidates from several detectors.
//!
//! A single greedy pass over the candidates in `(page, y0, x0)` order: each
//! surviving record absorbs every later same-type heuristic record whose
//! center lies within the merge distance of its (growing) rect. Native
//! records never merge.

use crate::config::MergeConfig;
use crate::types::{FieldRecord, Provenance};

/// Whether `a` and `b` describe the same physical field.
pub fn should_merge(a: &FieldRecord, b: &FieldRecord, max_center_distance: f32) -> bool {
    a.page == b.page
        && a.field_type == b.field_type
        && !a.is_native()
        && !b.is_native()
        && a.rect.center_distance(&b.rect) < max_center_distance
}

/// Union of both rects, attributes of the more confident record (`a` on a
/// tie), provenance `merged_<a>_<b>`, and the higher confidence.
pub fn merge(a: &FieldRecord, b: &FieldRecord) -> FieldRecord {
    let base = if a.confidence >= b.confidence { a } else { b };
    FieldRecord {
        rect: a.rect.union(&b.rect),
        detection_method: Provenance::merged(a.detection_method.clone(), b.detection_method.clone()),
        confidence: a.confidence.max(b.confidence),
        ..base.clone()
    }
}

fn sort_key(a: &FieldRecord, b: &FieldRecord) -> std::cmp::Ordering {
    a.page
        .cmp(&b.page)
        .then(a.rect.y0.total_cmp(&b.rect.y0))
        .then(a.rect.x0.total_cmp(&b.rect.x0))
}

/// Merge near-coincident same-type records. Output stays in sort order.
pub fn consolidate(mut records: Vec<FieldRecord>, config: &MergeConfig) -> Vec<FieldRecord> {
    records.sort_by(sort_key);

    let mut merged_away = vec![false; records.len()];
    let mut out = Vec::with_capacity(records.len());

    for i in 0..records.len() {
        if merged_away[i] {
            continue;
        }
        let mut current = records[i].clone();
        for j in (i + 1)..records.len() {
            if merged_away[j] {
                continue;
            }
            if should_merge(&current, &records[j], config.max_center_distance) {
                current = merge(&current, &records[j]);
                merged_away[j] = true;
            }
        }
        out.push(current);
    }

    let absorbed = records.len() - out.len();
    if absorbed > 0 {
        log::debug!("consolidation merged {absorbed} of {} candidates", records.len());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DetectionMethod, FieldType, Rect};

    fn record(kind: FieldType, rect: Rect, method: DetectionMethod, confidence: f32) -> FieldRecord {
        FieldRecord::new(kind, 1, rect, method, confidence)
    }

    fn text(rect: Rect, method: DetectionMethod, confidence: f32) -> FieldRecord {
        record(FieldType::TextField, rect, method, confidence)
    }

    fn merge_config() -> MergeConfig {
        MergeConfig::default()
    }

    #[test]
    fn near_same_type_records_merge() {
        let a = text(Rect::new(100.0, 100.0, 200.0, 120.0), DetectionMethod::LineAnalysis, 0.7);
        let b = text(Rect::new(104.0, 102.0, 204.0, 122.0), DetectionMethod::RectangleAnalysis, 0.8);
        let out = consolidate(vec![b, a], &merge_config());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rect, Rect::new(100.0, 100.0, 204.0, 122.0));
        assert_eq!(out[0].confidence, 0.8);
        assert_eq!(
            out[0].detection_method.to_string(),
            "merged_line_analysis_rectangle_analysis"
        );
    }

    #[test]
    fn merge_is_symmetric_in_rect_and_confidence() {
        let pairs = [
            (0.6, 0.9, Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(3.0, 4.0, 9.0, 20.0)),
            (0.7, 0.7, Rect::new(50.0, 50.0, 60.0, 55.0), Rect::new(40.0, 52.0, 58.0, 70.0)),
            (1.0, 0.4, Rect::new(-5.0, 0.0, 5.0, 1.0), Rect::new(0.0, -1.0, 1.0, 0.0)),
        ];
        for (ca, cb, ra, rb) in pairs {
            let a = text(ra, DetectionMethod::LabelBasedPositioning, ca);
            let b = text(rb, DetectionMethod::UnderlinePattern, cb);
            let ab = merge(&a, &b);
            let ba = merge(&b, &a);
            assert_eq!(ab.rect, ba.rect);
            assert_eq!(ab.confidence, ba.confidence);
            assert_eq!(ab.confidence, ca.max(cb));
        }
    }

    #[test]
    fn higher_confidence_record_is_the_base() {
        let a = text(Rect::new(0.0, 0.0, 10.0, 10.0), DetectionMethod::UnderlinePattern, 0.6);
        let b = text(Rect::new(1.0, 1.0, 11.0, 11.0), DetectionMethod::LabelBasedPositioning, 0.7)
            .with_name("text_field_after_name")
            .with_label("Name:");
        let m = merge(&a, &b);
        assert_eq!(m.name, "text_field_after_name");
        assert_eq!(m.label.as_deref(), Some("Name:"));
    }

    #[test]
    fn different_types_pages_or_distant_records_stay() {
        let r = Rect::new(0.0, 0.0, 20.0, 20.0);
        let mut other_page = text(r, DetectionMethod::RectangleAnalysis, 0.8);
        other_page.page = 2;
        let out = consolidate(
            vec![
                text(r, DetectionMethod::RectangleAnalysis, 0.8),
                record(FieldType::Checkbox, r, DetectionMethod::RectangleAnalysis, 0.8),
                other_page,
                text(Rect::new(30.0, 0.0, 50.0, 20.0), DetectionMethod::LineAnalysis, 0.7),
            ],
            &merge_config(),
        );
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn native_records_are_never_touched() {
        let widget = record(
            FieldType::Checkbox,
            Rect::new(10.0, 10.0, 22.0, 22.0),
            DetectionMethod::InteractiveWidget,
            1.0,
        )
        .with_name("agree");
        let widget2 = record(
            FieldType::Checkbox,
            Rect::new(13.0, 10.0, 25.0, 22.0),
            DetectionMethod::InteractiveWidget,
            1.0,
        );
        let heuristic = record(
            FieldType::Checkbox,
            Rect::new(11.0, 11.0, 23.0, 23.0),
            DetectionMethod::CheckboxSymbolPositioned,
            0.9,
        );
        let out = consolidate(vec![heuristic.clone(), widget2.clone(), widget.clone()], &merge_config());
        assert_eq!(out.len(), 3);
        assert!(out.contains(&widget));
        assert!(out.contains(&widget2));
        assert!(out.contains(&heuristic));
    }

    #[test]
    fn greedy_pass_chains_through_the_growing_rect() {
        let a = text(Rect::new(0.0, 0.0, 20.0, 10.0), DetectionMethod::LineAnalysis, 0.7);
        let b = text(Rect::new(10.0, 0.0, 30.0, 10.0), DetectionMethod::LineAnalysis, 0.7);
        let c = text(Rect::new(24.0, 0.0, 44.0, 10.0), DetectionMethod::LineAnalysis, 0.7);
        let out = consolidate(vec![a, b, c], &merge_config());
        // a+b has center x 15; c has center x 34, too far.
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].rect, Rect::new(0.0, 0.0, 30.0, 10.0));
    }

    #[test]
    fn output_is_sorted_by_page_then_position() {
        let mut late = text(Rect::new(0.0, 0.0, 100.0, 20.0), DetectionMethod::LineAnalysis, 0.7);
        late.page = 2;
        let low = text(Rect::new(0.0, 300.0, 100.0, 320.0), DetectionMethod::LineAnalysis, 0.7);
        let high_right = text(Rect::new(200.0, 100.0, 300.0, 120.0), DetectionMethod::LineAnalysis, 0.7);
        let high_left = text(Rect::new(0.0, 100.0, 100.0, 120.0), DetectionMethod::LineAnalysis, 0.7);
        let out = consolidate(
            vec![late.clone(), low.clone(), high_right.clone(), high_left.clone()],
            &merge_config(),
        );
        assert_eq!(out, vec![high_left, high_right, low, late]);
    }
}
