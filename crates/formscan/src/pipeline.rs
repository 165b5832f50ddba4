//! Per-page orchestration: detectors, consolidation, naming and filters.

use std::collections::HashMap;

use crate::config::AnalyzerConfig;
use crate::consolidate::consolidate;
use crate::detect::patterns;
use crate::detect::primitives::is_field_shaped_rectangle;
use crate::detect::{
    Detector, GeometricDetector, NativeDetector, SectionDetector, TextualDetector,
    VisualCueDetector,
};
use crate::report::{AnalysisReport, Diagnostic};
use crate::source::PageSource;
use crate::types::FieldRecord;

/// The detectors `config.strategy` selects, in run order.
pub fn detectors_for(source: &dyn PageSource, config: &AnalyzerConfig) -> Vec<Box<dyn Detector>> {
    let mut detectors: Vec<Box<dyn Detector>> = Vec::new();
    if config.strategy.runs_native() {
        detectors.push(Box::new(NativeDetector::from_source(source, config)));
    }
    if config.strategy.runs_heuristics() {
        detectors.push(Box::new(GeometricDetector));
        detectors.push(Box::new(TextualDetector));
        detectors.push(Box::new(SectionDetector));
        detectors.push(Box::new(VisualCueDetector));
    }
    detectors
}

/// Give every unnamed record `<prefix>_<page>_<n>`, counting per page and
/// prefix in list order.
pub fn assign_names(records: &mut [FieldRecord]) {
    let mut counters: HashMap<(u32, &'static str), usize> = HashMap::new();
    for record in records.iter_mut().filter(|r| r.name.is_empty()) {
        let prefix = record.detection_method.primary().name_prefix();
        let n = counters.entry((record.page, prefix)).or_default();
        *n += 1;
        record.name = format!("{prefix}_{}_{n}", record.page);
    }
}

fn keep(record: &FieldRecord, config: &AnalyzerConfig) -> bool {
    record.confidence >= config.min_confidence
        && !(config.drop_placeholders && record.is_low_fidelity())
}

/// All detectors over one page, then consolidation, naming and filtering.
pub fn analyze_page(
    source: &dyn PageSource,
    page: u32,
    detectors: &[Box<dyn Detector>],
    config: &AnalyzerConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<FieldRecord> {
    let mut candidates = Vec::new();
    for detector in detectors {
        match detector.detect(source, page, config) {
            Ok(records) => {
                let found = records.len();
                candidates.extend(
                    records
                        .into_iter()
                        .filter(|r| r.page == page && r.is_well_formed()),
                );
                log::debug!("page {page}: {} found {found} candidates", detector.name());
            }
            Err(e) => {
                log::warn!("{e}");
                diagnostics.push(e.into());
            }
        }
    }

    let mut records = consolidate(candidates, &config.merge);
    assign_names(&mut records);
    records.retain(|r| keep(r, config));
    records
}

/// Drawn rectangles on `page` that pass the field-shape gate. Unreadable
/// drawings count as none.
pub fn visual_field_count(source: &dyn PageSource, page: u32, config: &AnalyzerConfig) -> usize {
    match source.drawings(page) {
        Ok(drawings) => drawings
            .iter()
            .flat_map(|path| path.rects())
            .filter(|r| is_field_shaped_rectangle(r.width(), r.height(), &config.geometry))
            .count(),
        Err(e) => {
            log::debug!("page {page}: no visual count, {e}");
            0
        }
    }
}

/// The well-known form the first page's text identifies, if any.
pub fn document_type(source: &dyn PageSource) -> Option<String> {
    if source.page_count() == 0 {
        return None;
    }
    let text = source.plain_text(1).ok()?;
    patterns::document_type(&text).map(str::to_string)
}

/// Analyze every page of an opened document.
pub fn analyze_source(source: &dyn PageSource, config: &AnalyzerConfig) -> AnalysisReport {
    let page_count = source.page_count();
    let detectors = detectors_for(source, config);
    let document_type = document_type(source);

    let mut fields = Vec::new();
    let mut diagnostics = Vec::new();
    let mut visual = 0;
    for page in 1..=page_count {
        fields.extend(analyze_page(source, page, &detectors, config, &mut diagnostics));
        visual += visual_field_count(source, page, config);
    }

    let report = AnalysisReport::success(fields, page_count, diagnostics)
        .with_insight(visual, document_type);
    log::info!(
        "{} ({} detector failures)",
        report.message,
        report.diagnostics.len()
    );
    report
}
