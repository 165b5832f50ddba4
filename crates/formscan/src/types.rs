use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Field type
// ---------------------------------------------------------------------------

/// The kind of fillable control a [`FieldRecord`] describes.
///
/// `Unknown` is a legitimate terminal classification, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldType {
    TextField,
    Checkbox,
    RadioButton,
    Dropdown,
    ListBox,
    SignatureField,
    Button,
    DateField,
    Unknown,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::TextField => "TextField",
            FieldType::Checkbox => "Checkbox",
            FieldType::RadioButton => "RadioButton",
            FieldType::Dropdown => "Dropdown",
            FieldType::ListBox => "ListBox",
            FieldType::SignatureField => "SignatureField",
            FieldType::Button => "Button",
            FieldType::DateField => "DateField",
            FieldType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box `[x0, y0, x1, y1]` in unscaled page units.
///
/// The origin is the top-left corner of the page and y grows downward.
/// Serialized as a four-element array.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        x0: 0.0,
        y0: 0.0,
        x1: 0.0,
        y1: 0.0,
    };

    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Build a rect from two arbitrary corners, ordering the coordinates.
    pub fn from_corners(ax: f32, ay: f32, bx: f32, by: f32) -> Self {
        Self {
            x0: ax.min(bx),
            y0: ay.min(by),
            x1: ax.max(bx),
            y1: ay.max(by),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Euclidean distance between the centers of two rects.
    pub fn center_distance(&self, other: &Rect) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }

    /// Smallest rect containing both inputs.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Area of the intersection, `0.0` when the rects do not overlap.
    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let left = self.x0.max(other.x0);
        let top = self.y0.max(other.y0);
        let right = self.x1.min(other.x1);
        let bottom = self.y1.min(other.y1);
        if left >= right || top >= bottom {
            return 0.0;
        }
        (right - left) * (bottom - top)
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    /// Zero width or zero height.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

impl From<[f32; 4]> for Rect {
    fn from(v: [f32; 4]) -> Self {
        Rect::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Rect> for [f32; 4] {
    fn from(r: Rect) -> Self {
        [r.x0, r.y0, r.x1, r.y1]
    }
}

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// The detector that produced a candidate record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DetectionMethod {
    InteractiveWidget,
    RectangleAnalysis,
    LineAnalysis,
    CheckboxSymbolPositioned,
    LabelBasedPositioning,
    UnderlinePattern,
    SectionPattern,
    SignatureText,
    DatePattern,
    BracketCheckbox,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::InteractiveWidget => "interactive_widget",
            DetectionMethod::RectangleAnalysis => "rectangle_analysis",
            DetectionMethod::LineAnalysis => "line_analysis",
            DetectionMethod::CheckboxSymbolPositioned => "checkbox_symbol_positioned",
            DetectionMethod::LabelBasedPositioning => "label_based_positioning",
            DetectionMethod::UnderlinePattern => "underline_pattern",
            DetectionMethod::SectionPattern => "section_pattern",
            DetectionMethod::SignatureText => "signature_text",
            DetectionMethod::DatePattern => "date_pattern",
            DetectionMethod::BracketCheckbox => "bracket_checkbox",
        }
    }

    /// Prefix used when a record of this method needs a synthetic name.
    pub fn name_prefix(&self) -> &'static str {
        match self {
            DetectionMethod::InteractiveWidget => "widget",
            DetectionMethod::RectangleAnalysis => "rect_field",
            DetectionMethod::LineAnalysis => "line_field",
            DetectionMethod::CheckboxSymbolPositioned | DetectionMethod::BracketCheckbox => {
                "checkbox"
            }
            DetectionMethod::LabelBasedPositioning => "text_field",
            DetectionMethod::UnderlinePattern => "underline_field",
            DetectionMethod::SectionPattern => "section_field",
            DetectionMethod::SignatureText => "signature_area",
            DetectionMethod::DatePattern => "date_field",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which detector(s) produced a record.
///
/// Merged records keep both sides, rendering as `merged_<a>_<b>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    Single(DetectionMethod),
    Merged(Box<Provenance>, Box<Provenance>),
}

impl Provenance {
    pub fn merged(a: Provenance, b: Provenance) -> Self {
        Provenance::Merged(Box::new(a), Box::new(b))
    }

    /// The leftmost single method; for merged records this is the method of
    /// the record that absorbed the others.
    pub fn primary(&self) -> DetectionMethod {
        match self {
            Provenance::Single(m) => *m,
            Provenance::Merged(a, _) => a.primary(),
        }
    }

    /// Every single method contributing to this record, left to right.
    pub fn methods(&self) -> Vec<DetectionMethod> {
        match self {
            Provenance::Single(m) => vec![*m],
            Provenance::Merged(a, b) => {
                let mut out = a.methods();
                out.extend(b.methods());
                out
            }
        }
    }

    pub fn contains(&self, method: DetectionMethod) -> bool {
        match self {
            Provenance::Single(m) => *m == method,
            Provenance::Merged(a, b) => a.contains(method) || b.contains(method),
        }
    }
}

impl From<DetectionMethod> for Provenance {
    fn from(m: DetectionMethod) -> Self {
        Provenance::Single(m)
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Single(m) => f.write_str(m.as_str()),
            Provenance::Merged(a, b) => write!(f, "merged_{a}_{b}"),
        }
    }
}

impl Serialize for Provenance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// FieldRecord
// ---------------------------------------------------------------------------

/// Placeholder origin used by detectors that can prove a field exists but
/// cannot locate it on the page.
pub const PLACEHOLDER_ORIGIN: (f32, f32) = (100.0, 100.0);

/// Height of a placeholder rect.
pub const PLACEHOLDER_HEIGHT: f32 = 20.0;

/// One fillable form field, as detected on one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRecord {
    /// Empty until the pipeline assigns a synthetic name.
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// 1-based page index.
    pub page: u32,
    pub rect: Rect,
    pub detection_method: Provenance,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FieldRecord {
    pub fn new(
        field_type: FieldType,
        page: u32,
        rect: Rect,
        method: DetectionMethod,
        confidence: f32,
    ) -> Self {
        Self {
            name: String::new(),
            field_type,
            page,
            rect,
            detection_method: Provenance::Single(method),
            confidence,
            required: None,
            default_value: None,
            options: Vec::new(),
            description: None,
            label: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// True when any contributing detector is the native widget extractor.
    pub fn is_native(&self) -> bool {
        self.detection_method
            .contains(DetectionMethod::InteractiveWidget)
    }

    /// Finite coordinates, non-inverted rect, confidence in `[0, 1]`, page
    /// index at least 1.
    pub fn is_well_formed(&self) -> bool {
        self.page >= 1
            && self.rect.is_finite()
            && self.rect.x1 >= self.rect.x0
            && self.rect.y1 >= self.rect.y0
            && (0.0..=1.0).contains(&self.confidence)
    }

    /// The rect sits at the placeholder origin with the placeholder height.
    pub fn has_placeholder_rect(&self) -> bool {
        let (px, py) = PLACEHOLDER_ORIGIN;
        self.rect.x0 == px && self.rect.y0 == py && self.rect.y1 == py + PLACEHOLDER_HEIGHT
    }

    /// Degenerate or placeholder geometry: the record says a field exists
    /// but its rect must not be trusted.
    pub fn is_low_fidelity(&self) -> bool {
        self.rect.is_degenerate() || self.has_placeholder_rect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
