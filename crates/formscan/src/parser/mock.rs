//! In-memory [`PdfBackend`] used by unit tests across the crate.

use std::cell::Cell;
use std::collections::BTreeMap;

use super::backend::{ContentOp, FontMap, FontResource, Operand, PageBox, PageId, PdfBackend};
use super::forms::{FieldNode, RawWidget};
use crate::PdfError;

#[derive(Debug, Clone, Default)]
pub struct MockPage {
    pub ops: Vec<ContentOp>,
    pub widgets: Vec<RawWidget>,
    pub page_box: PageBox,
    /// Make `page_content` fail for this page.
    pub broken_content: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    pub pages: Vec<MockPage>,
    pub fonts: FontMap,
    pub tree: Vec<FieldNode>,
    /// Number of `page_content` calls so far.
    pub content_reads: Cell<usize>,
}

impl MockBackend {
    pub fn single_page(ops: Vec<ContentOp>) -> Self {
        Self {
            pages: vec![MockPage {
                ops,
                ..MockPage::default()
            }],
            fonts: helvetica(),
            ..Self::default()
        }
    }

    fn page(&self, page: PageId) -> Result<&MockPage, PdfError> {
        self.pages
            .get(page.0 as usize - 1)
            .ok_or_else(|| PdfError::Parse(format!("no page {:?}", page)))
    }
}

impl PdfBackend for MockBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        (1..=self.pages.len() as u32).map(|n| (n, (n, 0))).collect()
    }

    fn page_fonts(&self, _page: PageId) -> Result<FontMap, PdfError> {
        Ok(self.fonts.clone())
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
        self.content_reads.set(self.content_reads.get() + 1);
        let p = self.page(page)?;
        if p.broken_content {
            return Err(PdfError::Parse("corrupt content stream".into()));
        }
        // Page number as a marker; decode_content returns the stored ops.
        Ok(vec![page.0 as u8])
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
        let page = data.first().copied().unwrap_or(1) as u32;
        Ok(self.page((page, 0))?.ops.clone())
    }

    fn page_box(&self, page: PageId) -> Result<PageBox, PdfError> {
        Ok(self.page(page)?.page_box)
    }

    fn page_widgets(&self, page: PageId) -> Result<Vec<RawWidget>, PdfError> {
        Ok(self.page(page)?.widgets.clone())
    }

    fn field_tree(&self) -> Result<Vec<FieldNode>, PdfError> {
        Ok(self.tree.clone())
    }
}

/// `/F1` as Helvetica.
pub fn helvetica() -> FontMap {
    FontMap::from([(
        b"F1".to_vec(),
        FontResource {
            base_font: Some("Helvetica".to_string()),
            encoding: None,
        },
    )])
}

pub fn op(operator: &str, operands: &[f32]) -> ContentOp {
    ContentOp {
        operator: operator.to_string(),
        operands: operands.iter().copied().map(Operand::Number).collect(),
    }
}

pub fn font(size: f32) -> ContentOp {
    ContentOp {
        operator: "Tf".to_string(),
        operands: vec![Operand::Name(b"F1".to_vec()), Operand::Number(size)],
    }
}

pub fn show(text: &str) -> ContentOp {
    ContentOp {
        operator: "Tj".to_string(),
        operands: vec![Operand::Str(text.as_bytes().to_vec())],
    }
}

/// `BT /F1 size Tf 1 0 0 1 x y Tm (text) Tj ET`, with `x`/`y` in PDF user space.
pub fn text_at(text: &str, x: f32, y: f32, size: f32) -> Vec<ContentOp> {
    vec![
        op("BT", &[]),
        font(size),
        op("Tm", &[1.0, 0.0, 0.0, 1.0, x, y]),
        show(text),
        op("ET", &[]),
    ]
}
