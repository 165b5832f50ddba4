//! Text extraction, line grouping and block assembly.
//!
//! The content-stream interpreter turns text-showing operators into
//! [`TextSpan`]s in top-left page space. Everything after that is a pure
//! transformation over spans.
//!
//! ```text
//! content ops  ->  TextSpan[]  ->  TextLine[]  ->  TextBlock[]
//!                  extract         group_spans      group_lines
//!                                  plain_text
//! ```

use super::backend::{
    decode_shown_text, numbers, ContentOp, FontMap, Operand, PageBox, PageId, PdfBackend,
};
use super::graphics::{self, CtmStack, Matrix, IDENTITY};
use crate::types::Rect;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A run of text with its estimated bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    /// Top-left page space.
    pub bbox: Rect,
    /// Base font name, or the resource key when the font is not resolvable.
    pub font: String,
    /// Rendered font size in page units.
    pub size: f32,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, bbox: Rect, size: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            font: String::new(),
            size,
        }
    }
}

/// Spans sharing a baseline, left to right.
#[derive(Debug, Clone)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    pub bbox: Rect,
    pub font_size: f32,
}

impl TextLine {
    /// Span texts in order, separated by a space wherever there is a visible gap.
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut prev_end: Option<f32> = None;
        for span in &self.spans {
            if let Some(end) = prev_end {
                if span.bbox.x0 - end >= MIN_WORD_GAP && !out.ends_with(' ') {
                    out.push(' ');
                }
            }
            out.push_str(&span.text);
            prev_end = Some(span.bbox.x1);
        }
        out
    }
}

/// Vertically adjacent lines.
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
    pub bbox: Rect,
}

impl TextBlock {
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(TextLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Two spans whose baselines differ by at most this are on the same line.
const Y_TOLERANCE: f32 = 1.0;

/// Approximate glyph advance as a fraction of the font size.
pub const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Ascent and descent as fractions of the font size.
const ASCENT_RATIO: f32 = 0.8;
const DESCENT_RATIO: f32 = 0.2;

/// Minimum horizontal gap (points) rendered as a space.
const MIN_WORD_GAP: f32 = 1.5;

/// A vertical gap larger than this multiple of the font size starts a block.
const BLOCK_GAP_FACTOR: f32 = 1.4;

// ---------------------------------------------------------------------------
// Internal: text-state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TextState {
    font_key: Vec<u8>,
    font_name: String,
    font_size: f32,
    text_matrix: Matrix,
    line_matrix: Matrix,
    /// Tz / 100.
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_name: String::new(),
            font_size: 0.0,
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Td / TD / T*: translate the line matrix and reset the text matrix to it.
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    fn glyph_advance(&self) -> f32 {
        self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale
    }

    /// Text-space width of `text`, without spacing adjustments.
    fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.glyph_advance()
    }

    /// Move past `text`, applying Tc and Tw.
    fn advance_after_show(&mut self, text: &str) {
        let mut dx = 0.0;
        for ch in text.chars() {
            dx += self.glyph_advance() + self.char_spacing;
            if ch == ' ' {
                dx += self.word_spacing;
            }
        }
        self.advance_x(dx);
    }
}

/// Interpreter state for one page: text state plus the CTM and the page's
/// flip into top-left space.
struct SpanCollector<'a> {
    page_id: PageId,
    page_box: &'a PageBox,
    fonts: FontMap,
    state: TextState,
    ctm: CtmStack,
    spans: Vec<TextSpan>,
}

impl SpanCollector<'_> {
    fn decode(&self, val: &Operand) -> String {
        match val {
            Operand::Str(bytes) => decode_shown_text(self.fonts.get(&self.state.font_key), bytes),
            _ => String::new(),
        }
    }

    /// Push a span for `text` rendered with text matrix `origin`. Does not
    /// advance.
    fn push_span(&mut self, text: &str, origin: Matrix) {
        let trimmed = text.trim_end();
        if trimmed.trim().is_empty() {
            return;
        }
        let rendering = graphics::multiply(&origin, self.ctm.current());
        let (ux, uy) = graphics::apply(&rendering, 0.0, self.state.text_rise);
        let size = (self.state.font_size * graphics::vertical_scale(&rendering)).abs();
        let width = self.state.text_width(trimmed) * graphics::horizontal_scale(&rendering);

        let (x, baseline) = self.page_box.to_page_space(ux, uy);
        let bbox = Rect::new(
            x,
            baseline - size * ASCENT_RATIO,
            x + width,
            baseline + size * DESCENT_RATIO,
        );
        if !bbox.is_finite() {
            log::warn!("dropping span with non-finite geometry on page {:?}", self.page_id);
            return;
        }
        self.spans.push(TextSpan {
            text: trimmed.to_string(),
            bbox,
            font: self.state.font_name.clone(),
            size,
        });
    }

    fn show_string(&mut self, operand: &Operand) {
        let text = self.decode(operand);
        if text.is_empty() {
            return;
        }
        let origin = self.state.text_matrix;
        self.push_span(&text, origin);
        self.state.advance_after_show(&text);
    }

    /// TJ: strings and kerning numbers. A kerning gap wider than a third of a
    /// glyph becomes a space inside the same span.
    fn show_array(&mut self, arr: &[Operand]) {
        let mut buf = String::new();
        let mut origin = self.state.text_matrix;
        for elem in arr {
            match elem {
                Operand::Str(_) => {
                    let fragment = self.decode(elem);
                    if buf.is_empty() {
                        origin = self.state.text_matrix;
                    }
                    buf.push_str(&fragment);
                    self.state.advance_after_show(&fragment);
                }
                val => {
                    if let Some(adj) = val.number() {
                        let dx = -adj / 1000.0 * self.state.font_size * self.state.horiz_scale;
                        if dx > self.state.glyph_advance() * 0.3 && !buf.is_empty() {
                            buf.push(' ');
                        }
                        self.state.advance_x(dx);
                    }
                }
            }
        }
        self.push_span(&buf, origin);
    }

    fn set_font(&mut self, operands: &[Operand]) {
        if operands.len() < 2 {
            return;
        }
        let key = match &operands[0] {
            Operand::Name(n) | Operand::Str(n) => n.clone(),
            _ => return,
        };
        self.state.font_size = operands[1].number().unwrap_or(0.0);
        self.state.font_name = self
            .fonts
            .get(&key)
            .and_then(|font| font.base_font.clone())
            .unwrap_or_else(|| String::from_utf8_lossy(&key).into_owned());
        self.state.font_key = key;
    }

    fn handle(&mut self, op: &ContentOp) {
        if self.ctm.handle(&op.operator, &op.operands) {
            return;
        }
        let operands = &op.operands;
        let first_number = || operands.first().and_then(Operand::number);
        match op.operator.as_str() {
            "BT" => {
                self.state.text_matrix = IDENTITY;
                self.state.line_matrix = IDENTITY;
            }
            "Tf" => self.set_font(operands),
            "Tm" => {
                if let Some(m) = numbers::<6>(operands) {
                    self.state.text_matrix = m;
                    self.state.line_matrix = m;
                }
            }
            "Td" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.state.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.state.leading = -ty;
                    self.state.translate_line(tx, ty);
                }
            }
            "T*" => self.state.next_line(),
            "TL" => {
                if let Some(v) = first_number() {
                    self.state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = first_number() {
                    self.state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = first_number() {
                    self.state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = first_number() {
                    self.state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = first_number() {
                    self.state.text_rise = v;
                }
            }
            "Tj" => {
                if let Some(first) = operands.first() {
                    self.show_string(first);
                }
            }
            "TJ" => {
                if let Some(Operand::Array(arr)) = operands.first() {
                    self.show_array(arr);
                }
            }
            "'" => {
                self.state.next_line();
                if let Some(first) = operands.first() {
                    self.show_string(first);
                }
            }
            "\"" => {
                if operands.len() >= 3 {
                    if let Some(aw) = operands[0].number() {
                        self.state.word_spacing = aw;
                    }
                    if let Some(ac) = operands[1].number() {
                        self.state.char_spacing = ac;
                    }
                    self.state.next_line();
                    self.show_string(&operands[2]);
                }
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Public API: span extraction
// ---------------------------------------------------------------------------

/// Interpret a page's decoded operators and return its text spans.
///
/// | Operator | Action |
/// |----------|--------|
/// | `q` `Q` `cm` | Save, restore, concatenate the CTM |
/// | `BT` | Reset text and line matrices |
/// | `Tf` | Set font and size |
/// | `Tm` `Td` `TD` `T*` `TL` | Position |
/// | `Tc` `Tw` `Tz` `Ts` | Spacing, scaling, rise |
/// | `Tj` `TJ` `'` `"` | Show text |
pub fn extract_page_spans(
    backend: &dyn PdfBackend,
    page_id: PageId,
    page_box: &PageBox,
    ops: &[ContentOp],
) -> Vec<TextSpan> {
    let mut collector = SpanCollector {
        page_id,
        page_box,
        fonts: backend.page_fonts(page_id).unwrap_or_default(),
        state: TextState::default(),
        ctm: CtmStack::default(),
        spans: Vec::new(),
    };
    for op in ops {
        collector.handle(op);
    }
    collector.spans
}

// ---------------------------------------------------------------------------
// Public API: span -> line -> block grouping
// ---------------------------------------------------------------------------

fn baseline(span: &TextSpan) -> f32 {
    span.bbox.y1 - span.size * DESCENT_RATIO
}

/// Group spans whose baselines lie within [`Y_TOLERANCE`] of each other.
///
/// Lines come out top to bottom; spans within a line left to right.
pub fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    spans.sort_by(|a, b| {
        baseline(a)
            .total_cmp(&baseline(b))
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y = 0.0;

    for span in spans {
        let y = baseline(&span);
        if !current.is_empty() && (y - current_y).abs() > Y_TOLERANCE {
            lines.push(assemble_line(std::mem::take(&mut current)));
        }
        if current.is_empty() {
            current_y = y;
        }
        current.push(span);
    }
    if !current.is_empty() {
        lines.push(assemble_line(current));
    }
    lines
}

fn assemble_line(mut spans: Vec<TextSpan>) -> TextLine {
    spans.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
    let bbox = spans
        .iter()
        .skip(1)
        .fold(spans[0].bbox, |acc, s| acc.union(&s.bbox));
    let font_size = spans.iter().map(|s| s.size).fold(0.0, f32::max);
    TextLine {
        spans,
        bbox,
        font_size,
    }
}

/// Split lines into blocks wherever the vertical gap exceeds
/// [`BLOCK_GAP_FACTOR`] times the previous line's font size.
pub fn group_lines_into_blocks(lines: Vec<TextLine>) -> Vec<TextBlock> {
    let mut blocks: Vec<TextBlock> = Vec::new();
    let mut current: Vec<TextLine> = Vec::new();

    for line in lines {
        let gap_break = current.last().is_some_and(|prev: &TextLine| {
            line.bbox.y0 - prev.bbox.y1 > prev.font_size * BLOCK_GAP_FACTOR
        });
        if gap_break {
            blocks.push(assemble_block(std::mem::take(&mut current)));
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push(assemble_block(current));
    }
    blocks
}

fn assemble_block(lines: Vec<TextLine>) -> TextBlock {
    let bbox = lines
        .iter()
        .skip(1)
        .fold(lines[0].bbox, |acc, l| acc.union(&l.bbox));
    TextBlock { lines, bbox }
}

/// Flattened reading-order text: one `\n`-separated row per line.
pub fn plain_text(lines: &[TextLine]) -> String {
    lines
        .iter()
        .map(TextLine::text)
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::mock::{self, op, MockBackend};

    fn spans_of(ops: Vec<ContentOp>) -> Vec<TextSpan> {
        let backend = MockBackend::single_page(ops.clone());
        extract_page_spans(&backend, (1, 0), &PageBox::default(), &ops)
    }

    fn span(text: &str, x: f32, baseline: f32, size: f32) -> TextSpan {
        let width = text.chars().count() as f32 * size * APPROX_CHAR_WIDTH_RATIO;
        TextSpan::new(
            text,
            Rect::new(x, baseline - size * 0.8, x + width, baseline + size * 0.2),
            size,
        )
    }

    #[test]
    fn tj_span_is_flipped_to_top_left() {
        let spans = spans_of(mock::text_at("Name:", 72.0, 700.0, 10.0));
        assert_eq!(spans.len(), 1);
        let s = &spans[0];
        assert_eq!(s.text, "Name:");
        assert_eq!(s.font, "Helvetica");
        assert_eq!(s.size, 10.0);
        assert_eq!(s.bbox, Rect::new(72.0, 84.0, 97.0, 94.0));
    }

    #[test]
    fn cm_scales_span_geometry() {
        let mut ops = vec![op("q", &[]), op("cm", &[2.0, 0.0, 0.0, 2.0, 0.0, 0.0])];
        ops.extend(mock::text_at("ab", 10.0, 300.0, 10.0));
        ops.push(op("Q", &[]));
        let spans = spans_of(ops);
        let s = &spans[0];
        assert_eq!(s.size, 20.0);
        assert_eq!(s.bbox.x0, 20.0);
        assert_eq!(s.bbox.width(), 20.0);
        // Baseline at user y = 600, page y = 192.
        assert_eq!(s.bbox.y1, 192.0 + 4.0);
    }

    #[test]
    fn td_moves_relative_to_line_start() {
        let ops = vec![
            op("BT", &[]),
            mock::font(12.0),
            op("Td", &[100.0, 500.0]),
            mock::show("first"),
            op("Td", &[0.0, -20.0]),
            mock::show("second"),
            op("ET", &[]),
        ];
        let spans = spans_of(ops);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].bbox.x0, 100.0);
        assert_eq!(spans[1].bbox.x0, 100.0);
        assert_eq!(spans[1].bbox.y0 - spans[0].bbox.y0, 20.0);
    }

    #[test]
    fn tj_array_kerning_inserts_space() {
        let ops = vec![
            op("BT", &[]),
            mock::font(10.0),
            ContentOp {
                operator: "TJ".into(),
                operands: vec![Operand::Array(vec![
                    Operand::Str(b"Sign".to_vec()),
                    Operand::Number(-300.0),
                    Operand::Str(b"here".to_vec()),
                ])],
            },
            op("ET", &[]),
        ];
        let spans = spans_of(ops);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Sign here");
    }

    #[test]
    fn whitespace_only_strings_emit_nothing() {
        assert!(spans_of(mock::text_at("   ", 10.0, 10.0, 10.0)).is_empty());
    }

    #[test]
    fn spans_group_into_lines_top_to_bottom() {
        let lines = group_spans_into_lines(vec![
            span("lower", 10.0, 200.0, 10.0),
            span("right", 80.0, 100.5, 10.0),
            span("left", 10.0, 100.0, 10.0),
        ]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "left right");
        assert_eq!(lines[1].text(), "lower");
        assert_eq!(plain_text(&lines), "left right\nlower");
    }

    #[test]
    fn adjacent_spans_concatenate_without_space() {
        let lines = group_spans_into_lines(vec![
            span("Na", 10.0, 100.0, 10.0),
            span("me:", 20.0, 100.0, 10.0),
        ]);
        assert_eq!(lines[0].text(), "Name:");
    }

    #[test]
    fn blocks_split_on_large_vertical_gap() {
        let lines = group_spans_into_lines(vec![
            span("Applicant Information", 10.0, 100.0, 10.0),
            span("continued", 10.0, 112.0, 10.0),
            span("Address", 10.0, 200.0, 10.0),
        ]);
        let blocks = group_lines_into_blocks(lines);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text(), "Applicant Information\ncontinued");
        assert_eq!(blocks[0].bbox.y0, 92.0);
        assert_eq!(blocks[0].bbox.y1, 114.0);
        assert_eq!(blocks[1].text(), "Address");
    }

    #[test]
    fn empty_inputs_produce_nothing() {
        assert!(group_spans_into_lines(Vec::new()).is_empty());
        assert!(group_lines_into_blocks(Vec::new()).is_empty());
        assert_eq!(plain_text(&[]), "");
    }
}
