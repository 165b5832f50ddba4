//! Interactive form fields: page widgets plus the AcroForm hierarchy.

use super::primitives::rectangles_overlap;
use super::{Detector, DetectorError};
use crate::config::AnalyzerConfig;
use crate::parser::forms::{FieldFlags, FieldNode, RawWidget};
use crate::source::PageSource;
use crate::types::{DetectionMethod, FieldRecord, FieldType, Rect};

const NAME: &str = "native";

/// Map an `/FT` code and `/Ff` flags to a field type. Flags decide between
/// the button and choice variants.
pub fn field_type_for(type_code: Option<&str>, flags: FieldFlags) -> FieldType {
    match type_code {
        Some("Tx") => FieldType::TextField,
        Some("Btn") if flags.contains(FieldFlags::RADIO) => FieldType::RadioButton,
        Some("Btn") if flags.contains(FieldFlags::PUSHBUTTON) => FieldType::Button,
        Some("Btn") => FieldType::Checkbox,
        Some("Ch") if flags.contains(FieldFlags::COMBO) => FieldType::Dropdown,
        Some("Ch") => FieldType::ListBox,
        Some("Sig") => FieldType::SignatureField,
        _ => FieldType::Unknown,
    }
}

/// `form1[0].page1[0].f1_01[0]` -> `f1_01`.
pub fn short_name(qualified: &str) -> &str {
    let last = qualified.rsplit('.').next().unwrap_or(qualified);
    match last.rfind('[') {
        Some(open)
            if last.ends_with(']')
                && last[open + 1..last.len() - 1].chars().all(|c| c.is_ascii_digit()) =>
        {
            &last[..open]
        }
        _ => last,
    }
}

#[allow(clippy::too_many_arguments)]
fn native_record(
    name: Option<&str>,
    type_code: Option<&str>,
    flags: FieldFlags,
    page: u32,
    rect: Rect,
    value: Option<&String>,
    default_value: Option<&String>,
    options: &[String],
    description: Option<&String>,
    config: &AnalyzerConfig,
) -> FieldRecord {
    let mut record = FieldRecord::new(
        field_type_for(type_code, flags),
        page,
        rect,
        DetectionMethod::InteractiveWidget,
        1.0,
    );
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        record.name = if config.short_names {
            short_name(name).to_string()
        } else {
            name.to_string()
        };
    }
    record.required = Some(flags.contains(FieldFlags::REQUIRED));
    record.default_value = default_value.or(value).cloned();
    record.options = options.to_vec();
    record.description = description.cloned();
    record
}

fn widget_record(widget: &RawWidget, page: u32, config: &AnalyzerConfig) -> Option<FieldRecord> {
    let Some(rect) = widget.rect else {
        log::warn!(
            "page {page}: skipping widget {:?} without a rectangle",
            widget.name.as_deref().unwrap_or("<unnamed>")
        );
        return None;
    };
    Some(native_record(
        widget.name.as_deref(),
        widget.type_code.as_deref(),
        widget.flags,
        page,
        rect,
        widget.value.as_ref(),
        widget.default_value.as_ref(),
        &widget.options,
        widget.description.as_ref(),
        config,
    ))
}

/// Union of the rects of every descendant widget and the first page among
/// them.
fn descendant_extent(node: &FieldNode) -> (Option<Rect>, Option<u32>) {
    let mut rect: Option<Rect> = None;
    let mut page: Option<u32> = None;
    for child in &node.children {
        let (child_rect, child_page) = match child.rect {
            Some(r) => (Some(r), child.page),
            None => descendant_extent(child),
        };
        if let Some(r) = child_rect {
            rect = Some(rect.map_or(r, |acc| acc.union(&r)));
        }
        page = page.or(child_page);
    }
    (rect, page)
}

/// Records read from the field tree. Leaves repeat what page widgets already
/// show; groups are named parents carrying a value, which no widget stands for.
#[derive(Debug, Default)]
struct HierarchyRecords {
    leaves: Vec<FieldRecord>,
    groups: Vec<FieldRecord>,
}

/// Records for every hierarchy leaf and every named parent carrying a value.
fn hierarchy_records(nodes: &[FieldNode], config: &AnalyzerConfig, out: &mut HierarchyRecords) {
    for node in nodes {
        let to_record = |rect: Rect, page: u32| {
            native_record(
                Some(&node.name),
                node.type_code.as_deref(),
                node.flags,
                page,
                rect,
                node.value.as_ref(),
                node.default_value.as_ref(),
                &node.options,
                node.description.as_ref(),
                config,
            )
        };

        if node.is_leaf() {
            match node.rect {
                Some(rect) => out.leaves.push(to_record(rect, node.page.unwrap_or(1))),
                None => log::debug!("field {:?} has no widget rectangle", node.name),
            }
        } else {
            if !node.name.is_empty() && node.value.is_some() {
                let (rect, page) = descendant_extent(node);
                out.groups
                    .push(to_record(rect.unwrap_or(Rect::ZERO), page.unwrap_or(1)));
            }
            hierarchy_records(&node.children, config, out);
        }
    }
}

/// Authoritative records read from the document's form structures.
pub struct NativeDetector {
    hierarchy: HierarchyRecords,
}

impl NativeDetector {
    pub fn new(hierarchy: &[FieldNode], config: &AnalyzerConfig) -> Self {
        let mut records = HierarchyRecords::default();
        hierarchy_records(hierarchy, config, &mut records);
        Self { hierarchy: records }
    }

    /// Read the field hierarchy from `source`. A broken hierarchy degrades to
    /// widget-only detection.
    pub fn from_source(source: &dyn PageSource, config: &AnalyzerConfig) -> Self {
        match source.field_hierarchy() {
            Ok(tree) => Self::new(&tree, config),
            Err(e) => {
                log::warn!("field hierarchy unreadable, using page widgets only: {e}");
                Self::new(&[], config)
            }
        }
    }
}

impl Detector for NativeDetector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn detect(
        &self,
        source: &dyn PageSource,
        page: u32,
        config: &AnalyzerConfig,
    ) -> Result<Vec<FieldRecord>, DetectorError> {
        let widgets = source
            .widgets(page)
            .map_err(|e| DetectorError::new(NAME, page, e))?;

        let mut records: Vec<FieldRecord> = widgets
            .iter()
            .filter_map(|w| widget_record(w, page, config))
            .collect();
        let widget_count = records.len();

        for candidate in self.hierarchy.leaves.iter().filter(|r| r.page == page) {
            let duplicate = records[..widget_count].iter().any(|w| {
                (!candidate.name.is_empty() && w.name == candidate.name)
                    || rectangles_overlap(&w.rect, &candidate.rect, config.merge.widget_overlap)
            });
            let repeated = records[widget_count..].contains(candidate);
            if !duplicate && !repeated {
                records.push(candidate.clone());
            }
        }

        // A group's rect spans its kids and a radio group shares their name,
        // so groups are only deduplicated against each other.
        let mut groups: Vec<&FieldRecord> = Vec::new();
        for group in self.hierarchy.groups.iter().filter(|r| r.page == page) {
            if !groups.iter().any(|g| g.name == group.name) {
                groups.push(group);
            }
        }
        records.extend(groups.into_iter().cloned());

        Ok(records)
    }
}
