//! The PDF access seam and its `lopdf` implementation.
//!
//! Interpreters above [`PdfBackend`] see only plain data: decoded operators,
//! font resources, page boxes and raw form dictionaries.

use std::collections::BTreeMap;

use lopdf::content::Content;

use super::forms::{self, FieldNode, RawWidget};
use crate::types::Rect;
use crate::PdfError;

/// An object identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

/// US Letter height, used when a page carries no usable MediaBox.
pub const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// A `/Font` entry of a page's resources.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontResource {
    pub base_font: Option<String>,
    pub encoding: Option<String>,
}

impl FontResource {
    /// Identity-H/V fonts show two-byte codes.
    pub fn is_two_byte(&self) -> bool {
        self.encoding
            .as_deref()
            .is_some_and(|e| e.starts_with("Identity"))
    }
}

/// Font resources keyed by resource name (`b"F1"`).
pub type FontMap = BTreeMap<Vec<u8>, FontResource>;

/// A content-stream operand. Integers and reals collapse into `Number`;
/// dictionaries, booleans and references, which no interpreter here reads,
/// become `Other`.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<Operand>),
    Other,
}

impl Operand {
    pub fn number(&self) -> Option<f32> {
        match self {
            Operand::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&lopdf::Object> for Operand {
    fn from(obj: &lopdf::Object) -> Self {
        match obj {
            lopdf::Object::Integer(i) => Operand::Number(*i as f32),
            lopdf::Object::Real(r) => Operand::Number(*r),
            lopdf::Object::Name(n) => Operand::Name(n.clone()),
            lopdf::Object::String(s, _) => Operand::Str(s.clone()),
            lopdf::Object::Array(items) => Operand::Array(items.iter().map(Operand::from).collect()),
            _ => Operand::Other,
        }
    }
}

/// One operator with its operands.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<Operand>,
}

/// The first `N` operands as numbers, or `None` if any is missing or
/// non-numeric.
pub fn numbers<const N: usize>(operands: &[Operand]) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    if operands.len() < N {
        return None;
    }
    for (slot, operand) in out.iter_mut().zip(operands) {
        *slot = operand.number()?;
    }
    Some(out)
}

/// The MediaBox of a page in PDF user space (bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl PageBox {
    /// Map a PDF user-space point to top-left-origin page space.
    pub fn to_page_space(&self, x: f32, y: f32) -> (f32, f32) {
        (x - self.llx, self.ury - y)
    }

    pub fn rect_to_page_space(&self, r: &Rect) -> Rect {
        let (ax, ay) = self.to_page_space(r.x0, r.y0);
        let (bx, by) = self.to_page_space(r.x1, r.y1);
        Rect::from_corners(ax, ay, bx, by)
    }
}

impl Default for PageBox {
    fn default() -> Self {
        Self {
            llx: 0.0,
            lly: 0.0,
            urx: 612.0,
            ury: DEFAULT_PAGE_HEIGHT,
        }
    }
}

fn utf16be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// A PDF text string (`/T`, `/V`, `/TU` ...): UTF-16BE behind a byte-order
/// mark, else UTF-8, else Latin-1.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(payload) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return utf16be(payload);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => bytes.iter().copied().map(char::from).collect(),
    }
}

/// The string operand of a text-showing operator, decoded for `font`.
///
/// Two-byte fonts are read as UTF-16BE when that yields printable text, which
/// holds for the common Identity-H subsets whose CIDs follow Unicode.
pub fn decode_shown_text(font: Option<&FontResource>, bytes: &[u8]) -> String {
    if font.is_some_and(FontResource::is_two_byte) && !bytes.is_empty() && bytes.len() % 2 == 0 {
        let decoded = utf16be(bytes);
        if decoded.chars().any(|c| c != '\u{FFFD}' && c != '\0') {
            return decoded;
        }
    }
    decode_pdf_string(bytes)
}

/// Raw PDF access. Implemented over `lopdf` here and by in-memory mocks in
/// tests.
pub trait PdfBackend {
    /// 1-based page number to page object.
    fn pages(&self) -> BTreeMap<u32, PageId>;

    fn page_fonts(&self, page: PageId) -> Result<FontMap, PdfError>;

    /// The page's decompressed content, all streams concatenated.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError>;

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError>;

    /// The page's MediaBox, inherited through the page tree.
    fn page_box(&self, page: PageId) -> Result<PageBox, PdfError>;

    /// Widget annotations placed on the page, in PDF user space.
    fn page_widgets(&self, page: PageId) -> Result<Vec<RawWidget>, PdfError>;

    /// The document's AcroForm field tree, in PDF user space.
    fn field_tree(&self) -> Result<Vec<FieldNode>, PdfError>;
}

pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    /// Parse a PDF from memory. Encrypted documents are refused.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        if data.is_empty() {
            return Err(PdfError::Empty);
        }
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }
        Ok(Self { doc })
    }

    /// `/MediaBox` of the page or its nearest ancestor.
    fn media_box<'a>(&'a self, page: &'a lopdf::Dictionary) -> Option<&'a Vec<lopdf::Object>> {
        let mut node = page;
        for _ in 0..forms::MAX_DEPTH {
            if let Some(arr) = node
                .get(b"MediaBox")
                .ok()
                .and_then(|o| forms::resolve(&self.doc, o).as_array().ok())
            {
                return Some(arr);
            }
            let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
            node = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }
}

fn name_of(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        lopdf::Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
        _ => None,
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_fonts(&self, page: PageId) -> Result<FontMap, PdfError> {
        let fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| PdfError::Parse(format!("cannot read page fonts: {e}")))?;
        Ok(fonts
            .into_iter()
            .map(|(key, dict)| {
                let resource = FontResource {
                    base_font: name_of(dict, b"BaseFont"),
                    encoding: name_of(dict, b"Encoding"),
                };
                (key, resource)
            })
            .collect())
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
        self.doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot read page content: {e}")))
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
        let content = Content::decode(data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {e}")))?;
        Ok(content
            .operations
            .iter()
            .map(|op| ContentOp {
                operator: op.operator.clone(),
                operands: op.operands.iter().map(Operand::from).collect(),
            })
            .collect())
    }

    fn page_box(&self, page: PageId) -> Result<PageBox, PdfError> {
        let dict = self
            .doc
            .get_dictionary(page)
            .map_err(|e| PdfError::Parse(format!("page object is not a dictionary: {e}")))?;
        let media_box = self
            .media_box(dict)
            .ok_or_else(|| PdfError::Parse("MediaBox not found for page".into()))?;

        let nums: Vec<f32> = media_box
            .iter()
            .filter_map(|o| forms::object_to_f32(forms::resolve(&self.doc, o)))
            .collect();
        let [a, b, c, d] = nums[..] else {
            return Err(PdfError::Parse(format!(
                "MediaBox has {} numeric elements, expected 4",
                nums.len()
            )));
        };
        let r = Rect::from_corners(a, b, c, d);
        Ok(PageBox {
            llx: r.x0,
            lly: r.y0,
            urx: r.x1,
            ury: r.y1,
        })
    }

    fn page_widgets(&self, page: PageId) -> Result<Vec<RawWidget>, PdfError> {
        forms::page_widgets(&self.doc, page)
    }

    fn field_tree(&self) -> Result<Vec<FieldNode>, PdfError> {
        forms::field_tree(&self.doc)
    }
}
