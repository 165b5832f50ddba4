//! The per-page capabilities the detectors consume.
//!
//! [`PageSource`] is the seam between detection and PDF access. Every rect
//! that crosses it is in unscaled top-left page space.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::parser::backend::{ContentOp, LopdfBackend, PageBox, PageId, PdfBackend};
use crate::parser::drawing::{self, DrawingPath};
use crate::parser::forms::{FieldNode, RawWidget};
use crate::parser::layout::{self, TextBlock, TextSpan};
use crate::PdfError;

/// Per-page access to an opened document. Pages are 1-based.
pub trait PageSource {
    fn page_count(&self) -> u32;

    /// Widget annotations on `page`, rects in page space.
    fn widgets(&self, page: u32) -> Result<Vec<RawWidget>, PdfError>;

    /// The AcroForm field tree, rects in the page space of each node's page.
    fn field_hierarchy(&self) -> Result<Vec<FieldNode>, PdfError>;

    fn drawings(&self, page: u32) -> Result<Vec<DrawingPath>, PdfError>;

    fn text_spans(&self, page: u32) -> Result<Vec<TextSpan>, PdfError>;

    /// Reading-order text of `page`, one row per text line.
    fn plain_text(&self, page: u32) -> Result<String, PdfError> {
        let lines = layout::group_spans_into_lines(self.text_spans(page)?);
        Ok(layout::plain_text(&lines))
    }

    fn text_blocks(&self, page: u32) -> Result<Vec<TextBlock>, PdfError> {
        let lines = layout::group_spans_into_lines(self.text_spans(page)?);
        Ok(layout::group_lines_into_blocks(lines))
    }
}

/// A [`PageSource`] over any [`PdfBackend`].
///
/// The operators of the most recently read page are kept, so the drawing and
/// text capabilities of one page share a single content decode.
pub struct Document<B: PdfBackend> {
    backend: B,
    pages: BTreeMap<u32, PageId>,
    last_ops: RefCell<Option<(u32, Rc<Vec<ContentOp>>)>>,
}

impl Document<LopdfBackend> {
    /// Parse PDF bytes. Fails on empty, unparseable or encrypted input.
    pub fn open(bytes: &[u8]) -> Result<Self, PdfError> {
        LopdfBackend::load_bytes(bytes).map(Self::new)
    }
}

impl<B: PdfBackend> Document<B> {
    pub fn new(backend: B) -> Self {
        let pages = backend.pages();
        Self {
            backend,
            pages,
            last_ops: RefCell::new(None),
        }
    }

    fn page_id(&self, page: u32) -> Result<PageId, PdfError> {
        self.pages
            .get(&page)
            .copied()
            .ok_or_else(|| PdfError::Parse(format!("page {page} out of range")))
    }

    /// The page's MediaBox, or US Letter when it cannot be read.
    pub fn page_box(&self, page: u32) -> PageBox {
        let Ok(id) = self.page_id(page) else {
            return PageBox::default();
        };
        self.backend.page_box(id).unwrap_or_else(|e| {
            log::debug!("page {page}: {e}, assuming US Letter");
            PageBox::default()
        })
    }

    fn ops(&self, page: u32) -> Result<Rc<Vec<ContentOp>>, PdfError> {
        if let Some((cached, ops)) = self.last_ops.borrow().as_ref() {
            if *cached == page {
                return Ok(Rc::clone(ops));
            }
        }
        let id = self.page_id(page)?;
        let raw = self.backend.page_content(id)?;
        let ops = Rc::new(self.backend.decode_content(&raw)?);
        *self.last_ops.borrow_mut() = Some((page, Rc::clone(&ops)));
        Ok(ops)
    }

    fn flip_node(&self, node: &mut FieldNode) {
        let page_box = self.page_box(node.page.unwrap_or(1));
        if let Some(rect) = node.rect.as_mut() {
            *rect = page_box.rect_to_page_space(rect);
        }
        for child in &mut node.children {
            self.flip_node(child);
        }
    }
}

impl<B: PdfBackend> PageSource for Document<B> {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn widgets(&self, page: u32) -> Result<Vec<RawWidget>, PdfError> {
        let id = self.page_id(page)?;
        let page_box = self.page_box(page);
        let mut widgets = self.backend.page_widgets(id)?;
        for widget in &mut widgets {
            if let Some(rect) = widget.rect.as_mut() {
                *rect = page_box.rect_to_page_space(rect);
            }
        }
        Ok(widgets)
    }

    fn field_hierarchy(&self) -> Result<Vec<FieldNode>, PdfError> {
        let mut roots = self.backend.field_tree()?;
        for root in &mut roots {
            self.flip_node(root);
        }
        Ok(roots)
    }

    fn drawings(&self, page: u32) -> Result<Vec<DrawingPath>, PdfError> {
        let ops = self.ops(page)?;
        Ok(drawing::extract_page_drawings(&self.page_box(page), &ops))
    }

    fn text_spans(&self, page: u32) -> Result<Vec<TextSpan>, PdfError> {
        let ops = self.ops(page)?;
        Ok(layout::extract_page_spans(
            &self.backend,
            self.page_id(page)?,
            &self.page_box(page),
            &ops,
        ))
    }
}
