//! Analyzer configuration.
//!
//! Every field has a default, so a TOML file only needs the keys it
//! overrides:
//!
//! ```toml
//! strategy = "heuristic"
//! min_confidence = 0.6
//!
//! [merge]
//! max_center_distance = 20.0
//! ```

use serde::{Deserialize, Serialize};

use crate::PdfError;

/// Which detectors run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Interactive widgets only.
    Native,
    /// Everything except interactive widgets.
    Heuristic,
    #[default]
    Full,
}

impl Strategy {
    pub fn runs_native(&self) -> bool {
        matches!(self, Strategy::Native | Strategy::Full)
    }

    pub fn runs_heuristics(&self) -> bool {
        matches!(self, Strategy::Heuristic | Strategy::Full)
    }
}

/// Shape gates for the geometric detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub min_width: f32,
    pub min_height: f32,
    pub max_width: f32,
    pub max_height: f32,
    /// Both sides of a checkbox fall in `[checkbox_min, checkbox_max]`.
    pub checkbox_min: f32,
    pub checkbox_max: f32,
    pub checkbox_min_aspect: f32,
    pub checkbox_max_aspect: f32,
    /// Lines whose endpoints differ by less than this in y are horizontal.
    pub horizontal_tolerance: f32,
    pub min_line_length: f32,
    /// Horizontal lines closer than this in y form one group.
    pub line_group_tolerance: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            min_width: 20.0,
            min_height: 8.0,
            max_width: 500.0,
            max_height: 100.0,
            checkbox_min: 5.0,
            checkbox_max: 25.0,
            checkbox_min_aspect: 0.7,
            checkbox_max_aspect: 1.3,
            horizontal_tolerance: 3.0,
            min_line_length: 30.0,
            line_group_tolerance: 10.0,
        }
    }
}

/// Projection constants for the textual detectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Gap between a label's right edge and its projected input.
    pub label_gap: f32,
    pub label_input_width: f32,
    pub label_min_height: f32,
    /// Side of the box placed on a checkbox glyph.
    pub glyph_box_size: f32,
    /// Estimated width of one character of an underline run.
    pub underline_char_width: f32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            label_gap: 5.0,
            label_input_width: 200.0,
            label_min_height: 16.0,
            glyph_box_size: 12.0,
            underline_char_width: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Same-type heuristic records whose centers are closer than this merge.
    pub max_center_distance: f32,
    /// Overlap ratio at which a hierarchy node duplicates a page widget.
    pub widget_overlap: f32,
    /// Overlap ratio at which a visual cue duplicates an earlier cue.
    pub cue_overlap: f32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            max_center_distance: 15.0,
            widget_overlap: 0.7,
            cue_overlap: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub strategy: Strategy,
    /// Records below this confidence are dropped from the report.
    pub min_confidence: f32,
    /// Drop records whose rect is degenerate or a placeholder.
    pub drop_placeholders: bool,
    /// Reduce qualified names such as `form1[0].page1[0].f1_01[0]` to `f1_01`.
    pub short_names: bool,
    pub geometry: GeometryConfig,
    pub text: TextConfig,
    pub merge: MergeConfig,
}

impl AnalyzerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, PdfError> {
        let config: AnalyzerConfig = toml::from_str(s).map_err(|e| PdfError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<(), PdfError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(PdfError::Config(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        let g = &self.geometry;
        if g.min_width > g.max_width || g.min_height > g.max_height {
            return Err(PdfError::Config(
                "geometry minimums must not exceed maximums".into(),
            ));
        }
        if g.checkbox_min > g.checkbox_max || g.checkbox_min_aspect > g.checkbox_max_aspect {
            return Err(PdfError::Config("checkbox bounds are inverted".into()));
        }
        if self.merge.max_center_distance < 0.0 {
            return Err(PdfError::Config(
                "merge.max_center_distance must not be negative".into(),
            ));
        }
        Ok(())
    }
}
