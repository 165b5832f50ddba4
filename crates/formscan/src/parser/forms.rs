//! Interactive-form metadata: widget annotations and the AcroForm field tree.
//!
//! Both extractors read `lopdf` objects directly and produce plain data in
//! PDF user space. They never fail on a single malformed entry; the entry
//! is skipped and logged.

use std::collections::{BTreeMap, HashMap, HashSet};

use bitflags::bitflags;

use super::backend::{decode_pdf_string, PageId};
use crate::types::Rect;
use crate::PdfError;

/// Recursion cap for `/Parent` chains, `/Kids` trees and page-tree lookups.
pub const MAX_DEPTH: usize = 64;

bitflags! {
    /// Field flags (`/Ff`), ISO 32000-1 Tables 221, 226, 228 and 230.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FieldFlags: u32 {
        const READ_ONLY = 1 << 0;
        const REQUIRED = 1 << 1;
        const NO_EXPORT = 1 << 2;
        const MULTILINE = 1 << 12;
        const PASSWORD = 1 << 13;
        const NO_TOGGLE_TO_OFF = 1 << 14;
        const RADIO = 1 << 15;
        const PUSHBUTTON = 1 << 16;
        const COMBO = 1 << 17;
        const EDIT = 1 << 18;
        const MULTI_SELECT = 1 << 21;
    }
}

/// A widget annotation with its (inherited) field attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawWidget {
    /// Fully qualified field name (`parent.child`), if any part is named.
    pub name: Option<String>,
    /// `/FT` value without the leading slash: `Tx`, `Btn`, `Ch` or `Sig`.
    pub type_code: Option<String>,
    pub flags: FieldFlags,
    /// `/Rect`: PDF user space from the backend, page space once it has
    /// passed through a `PageSource`.
    pub rect: Option<Rect>,
    pub value: Option<String>,
    pub default_value: Option<String>,
    pub options: Vec<String>,
    pub description: Option<String>,
}

/// One node of the AcroForm field tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldNode {
    pub id: PageId,
    /// Fully qualified name; widget kids without `/T` repeat the parent's.
    pub name: String,
    pub type_code: Option<String>,
    pub flags: FieldFlags,
    pub value: Option<String>,
    pub default_value: Option<String>,
    pub options: Vec<String>,
    pub description: Option<String>,
    /// `/Rect` when the node is also a widget annotation, in PDF user space.
    pub rect: Option<Rect>,
    /// 1-based page, from `/P` or from the page whose `/Annots` lists the node.
    pub page: Option<u32>,
    pub children: Vec<FieldNode>,
}

impl FieldNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Object helpers
// ---------------------------------------------------------------------------

/// Follow one level of indirection.
pub fn resolve<'a>(doc: &'a lopdf::Document, obj: &'a lopdf::Object) -> &'a lopdf::Object {
    match obj {
        lopdf::Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

pub fn object_to_f32(obj: &lopdf::Object) -> Option<f32> {
    match obj {
        lopdf::Object::Integer(i) => Some(*i as f32),
        lopdf::Object::Real(f) => Some(*f),
        _ => None,
    }
}

fn object_to_string(doc: &lopdf::Document, obj: &lopdf::Object) -> Option<String> {
    match resolve(doc, obj) {
        lopdf::Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        lopdf::Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        lopdf::Object::Integer(i) => Some(i.to_string()),
        lopdf::Object::Real(f) => Some(f.to_string()),
        lopdf::Object::Boolean(b) => Some(b.to_string()),
        lopdf::Object::Array(arr) => {
            let vals: Vec<String> = arr
                .iter()
                .filter_map(|item| object_to_string(doc, item))
                .collect();
            if vals.is_empty() {
                None
            } else {
                Some(vals.join(", "))
            }
        }
        _ => None,
    }
}

/// Look up `key` on `dict` or, failing that, along its `/Parent` chain.
fn inherited<'a>(
    doc: &'a lopdf::Document,
    dict: &'a lopdf::Dictionary,
    key: &[u8],
) -> Option<&'a lopdf::Object> {
    let mut current = dict;
    for _ in 0..MAX_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(resolve(doc, value));
        }
        let parent_id = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_object(parent_id).ok()?.as_dict().ok()?;
    }
    None
}

/// Join the `/T` entries of `dict` and its ancestors with `.`.
fn qualified_name(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Option<String> {
    let mut parts = Vec::new();
    let mut current = Some(dict);
    let mut depth = 0;
    while let Some(d) = current {
        if depth >= MAX_DEPTH {
            break;
        }
        if let Some(part) = d.get(b"T").ok().and_then(|t| object_to_string(doc, t)) {
            parts.push(part);
        }
        current = d
            .get(b"Parent")
            .ok()
            .and_then(|p| p.as_reference().ok())
            .and_then(|id| doc.get_object(id).ok())
            .and_then(|o| o.as_dict().ok());
        depth += 1;
    }
    if parts.is_empty() {
        return None;
    }
    parts.reverse();
    Some(parts.join("."))
}

fn type_code(obj: Option<&lopdf::Object>) -> Option<String> {
    match obj {
        Some(lopdf::Object::Name(name)) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

fn flags(obj: Option<&lopdf::Object>) -> FieldFlags {
    match obj {
        Some(lopdf::Object::Integer(n)) => FieldFlags::from_bits_truncate(*n as u32),
        _ => FieldFlags::empty(),
    }
}

fn rect(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Option<Rect> {
    let arr = resolve(doc, dict.get(b"Rect").ok()?).as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let nums: Vec<f32> = arr
        .iter()
        .filter_map(|o| object_to_f32(resolve(doc, o)))
        .collect();
    if nums.len() != 4 || nums.iter().any(|n| !n.is_finite()) {
        return None;
    }
    Some(Rect::from_corners(nums[0], nums[1], nums[2], nums[3]))
}

/// `/Opt` entries; `[export, display]` pairs contribute their display value.
fn options(doc: &lopdf::Document, obj: Option<&lopdf::Object>) -> Vec<String> {
    let Some(arr) = obj.and_then(|o| o.as_array().ok()) else {
        return Vec::new();
    };
    arr.iter()
        .filter_map(|item| match resolve(doc, item) {
            lopdf::Object::Array(pair) => pair
                .get(1)
                .or_else(|| pair.first())
                .and_then(|o| object_to_string(doc, o)),
            other => object_to_string(doc, other),
        })
        .collect()
}

fn annots<'a>(doc: &'a lopdf::Document, page_dict: &'a lopdf::Dictionary) -> &'a [lopdf::Object] {
    page_dict
        .get(b"Annots")
        .ok()
        .and_then(|o| resolve(doc, o).as_array().ok())
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

fn is_widget(dict: &lopdf::Dictionary) -> bool {
    matches!(dict.get(b"Subtype"), Ok(lopdf::Object::Name(n)) if n == b"Widget")
}

// ---------------------------------------------------------------------------
// Page widgets
// ---------------------------------------------------------------------------

/// Every `/Subtype /Widget` annotation on a page, with inherited attributes.
pub fn page_widgets(doc: &lopdf::Document, page_id: PageId) -> Result<Vec<RawWidget>, PdfError> {
    let page_dict = doc
        .get_object(page_id)
        .and_then(|o| o.as_dict())
        .map_err(|e| PdfError::Parse(format!("failed to get page dictionary: {e}")))?;

    let mut widgets = Vec::new();
    for entry in annots(doc, page_dict) {
        let Ok(dict) = resolve(doc, entry).as_dict() else {
            log::warn!("skipping non-dictionary annotation on page {:?}", page_id);
            continue;
        };
        if !is_widget(dict) {
            continue;
        }

        widgets.push(RawWidget {
            name: qualified_name(doc, dict),
            type_code: type_code(inherited(doc, dict, b"FT")),
            flags: flags(inherited(doc, dict, b"Ff")),
            rect: rect(doc, dict),
            value: inherited(doc, dict, b"V").and_then(|v| object_to_string(doc, v)),
            default_value: inherited(doc, dict, b"DV").and_then(|v| object_to_string(doc, v)),
            options: options(doc, inherited(doc, dict, b"Opt")),
            description: dict.get(b"TU").ok().and_then(|v| object_to_string(doc, v)),
        });
    }

    Ok(widgets)
}

// ---------------------------------------------------------------------------
// Field tree
// ---------------------------------------------------------------------------

struct TreeWalk<'a> {
    doc: &'a lopdf::Document,
    /// Page object id -> 1-based page number.
    page_numbers: HashMap<PageId, u32>,
    /// Annotation object id -> 1-based page number.
    annot_pages: HashMap<PageId, u32>,
    visited: HashSet<PageId>,
}

/// The `/Root /AcroForm /Fields` tree. Documents without an AcroForm yield
/// an empty list.
pub fn field_tree(doc: &lopdf::Document) -> Result<Vec<FieldNode>, PdfError> {
    let Some(fields) = acroform_fields(doc) else {
        return Ok(Vec::new());
    };

    let pages: BTreeMap<u32, PageId> = doc.get_pages();
    let page_numbers: HashMap<PageId, u32> = pages.iter().map(|(n, id)| (*id, *n)).collect();
    let mut annot_pages = HashMap::new();
    for (&num, &page_id) in &pages {
        let Ok(page_dict) = doc.get_object(page_id).and_then(|o| o.as_dict()) else {
            continue;
        };
        for entry in annots(doc, page_dict) {
            if let lopdf::Object::Reference(id) = entry {
                annot_pages.insert(*id, num);
            }
        }
    }

    let mut walk = TreeWalk {
        doc,
        page_numbers,
        annot_pages,
        visited: HashSet::new(),
    };

    let mut roots = Vec::new();
    for entry in fields {
        let lopdf::Object::Reference(id) = entry else {
            continue;
        };
        if let Some(node) = walk.node(*id, None, None, FieldFlags::empty(), 0) {
            roots.push(node);
        }
    }
    Ok(roots)
}

fn acroform_fields(doc: &lopdf::Document) -> Option<&[lopdf::Object]> {
    let catalog = resolve(doc, doc.trailer.get(b"Root").ok()?).as_dict().ok()?;
    let acroform = resolve(doc, catalog.get(b"AcroForm").ok()?).as_dict().ok()?;
    let fields = resolve(doc, acroform.get(b"Fields").ok()?).as_array().ok()?;
    Some(fields.as_slice())
}

impl TreeWalk<'_> {
    fn node(
        &mut self,
        id: PageId,
        parent_name: Option<&str>,
        inherited_ft: Option<&str>,
        inherited_flags: FieldFlags,
        depth: usize,
    ) -> Option<FieldNode> {
        if depth >= MAX_DEPTH {
            log::warn!("field tree deeper than {MAX_DEPTH} levels, truncating at {:?}", id);
            return None;
        }
        if !self.visited.insert(id) {
            log::warn!("field tree cycle through object {:?}", id);
            return None;
        }

        let doc = self.doc;
        let dict = doc.get_object(id).ok()?.as_dict().ok()?;

        let partial = dict.get(b"T").ok().and_then(|t| object_to_string(doc, t));
        let name = match (parent_name, partial) {
            (Some(parent), Some(part)) if !parent.is_empty() => format!("{parent}.{part}"),
            (_, Some(part)) => part,
            (Some(parent), None) => parent.to_string(),
            (None, None) => String::new(),
        };

        let type_code = type_code(dict.get(b"FT").ok()).or_else(|| inherited_ft.map(String::from));
        let flags = match dict.get(b"Ff") {
            Ok(obj) => flags(Some(obj)),
            Err(_) => inherited_flags,
        };

        let page = dict
            .get(b"P")
            .ok()
            .and_then(|p| p.as_reference().ok())
            .and_then(|p| self.page_numbers.get(&p).copied())
            .or_else(|| self.annot_pages.get(&id).copied());

        let kids: Vec<PageId> = dict
            .get(b"Kids")
            .ok()
            .and_then(|k| resolve(doc, k).as_array().ok())
            .map(|arr| {
                arr.iter()
                    .filter_map(|k| k.as_reference().ok())
                    .collect()
            })
            .unwrap_or_default();

        let children = kids
            .into_iter()
            .filter_map(|kid| self.node(kid, Some(&name), type_code.as_deref(), flags, depth + 1))
            .collect();

        Some(FieldNode {
            id,
            name,
            type_code,
            flags,
            value: dict.get(b"V").ok().and_then(|v| object_to_string(doc, v)),
            default_value: dict.get(b"DV").ok().and_then(|v| object_to_string(doc, v)),
            options: options(doc, dict.get(b"Opt").ok().map(|o| resolve(doc, o))),
            description: dict.get(b"TU").ok().and_then(|v| object_to_string(doc, v)),
            rect: if is_widget(dict) || dict.get(b"Rect").is_ok() {
                rect(doc, dict)
            } else {
                None
            },
            page,
            children,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
