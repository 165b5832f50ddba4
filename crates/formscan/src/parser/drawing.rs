//! Vector path extraction.
//!
//! Path-construction operators accumulate [`PathItem`]s; a painting operator
//! emits them as one [`DrawingPath`]. Coordinates are transformed by the CTM
//! and flipped into top-left page space.

use super::backend::{numbers, ContentOp, PageBox};
use super::graphics::{self, CtmStack};
use crate::types::Rect;

pub type Point = (f32, f32);

/// One primitive of a painted path, in top-left page space.
#[derive(Debug, Clone, PartialEq)]
pub enum PathItem {
    /// A `re` rectangle. Under a rotating CTM this is the bounding box of the
    /// transformed corners.
    Rect(Rect),
    Line { start: Point, end: Point },
    /// Any Bézier segment; only the endpoints are kept.
    Curve { start: Point, end: Point },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawingPath {
    pub items: Vec<PathItem>,
    pub stroked: bool,
    pub filled: bool,
}

impl DrawingPath {
    pub fn rects(&self) -> impl Iterator<Item = &Rect> {
        self.items.iter().filter_map(|item| match item {
            PathItem::Rect(r) => Some(r),
            _ => None,
        })
    }

    pub fn lines(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.items.iter().filter_map(|item| match item {
            PathItem::Line { start, end } => Some((*start, *end)),
            _ => None,
        })
    }
}

#[derive(Default)]
struct PathBuilder {
    items: Vec<PathItem>,
    current: Option<Point>,
    subpath_start: Option<Point>,
}

impl PathBuilder {
    fn move_to(&mut self, p: Point) {
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    fn line_to(&mut self, p: Point) {
        if let Some(start) = self.current {
            self.items.push(PathItem::Line { start, end: p });
        }
        self.current = Some(p);
    }

    fn curve_to(&mut self, p: Point) {
        if let Some(start) = self.current {
            self.items.push(PathItem::Curve { start, end: p });
        }
        self.current = Some(p);
    }

    fn close(&mut self) {
        if let (Some(cur), Some(start)) = (self.current, self.subpath_start) {
            if cur != start {
                self.items.push(PathItem::Line { start: cur, end: start });
            }
            self.current = Some(start);
        }
    }

    fn take(&mut self) -> Vec<PathItem> {
        self.current = None;
        self.subpath_start = None;
        std::mem::take(&mut self.items)
    }
}

/// Interpret a page's decoded operators and return its painted paths.
///
/// Clip-only paths (`W n`) and paths ended with `n` are discarded.
pub fn extract_page_drawings(page_box: &PageBox, ops: &[ContentOp]) -> Vec<DrawingPath> {
    let mut ctm = CtmStack::default();
    let mut path = PathBuilder::default();
    let mut drawings = Vec::new();

    let to_page = |ctm: &CtmStack, x: f32, y: f32| -> Point {
        let (ux, uy) = graphics::apply(ctm.current(), x, y);
        page_box.to_page_space(ux, uy)
    };

    for op in ops {
        if ctm.handle(&op.operator, &op.operands) {
            continue;
        }
        let operands = &op.operands;
        match op.operator.as_str() {
            "m" => {
                if let Some([x, y]) = numbers::<2>(operands) {
                    path.move_to(to_page(&ctm, x, y));
                }
            }
            "l" => {
                if let Some([x, y]) = numbers::<2>(operands) {
                    path.line_to(to_page(&ctm, x, y));
                }
            }
            "c" => {
                if let Some([_, _, _, _, x, y]) = numbers::<6>(operands) {
                    path.curve_to(to_page(&ctm, x, y));
                }
            }
            "v" | "y" => {
                if let Some([_, _, x, y]) = numbers::<4>(operands) {
                    path.curve_to(to_page(&ctm, x, y));
                }
            }
            "h" => path.close(),
            "re" => {
                if let Some([x, y, w, h]) = numbers::<4>(operands) {
                    let corners = [
                        to_page(&ctm, x, y),
                        to_page(&ctm, x + w, y),
                        to_page(&ctm, x + w, y + h),
                        to_page(&ctm, x, y + h),
                    ];
                    let rect = corners.iter().skip(1).fold(
                        Rect::from_corners(corners[0].0, corners[0].1, corners[0].0, corners[0].1),
                        |acc, &(px, py)| acc.union(&Rect::new(px, py, px, py)),
                    );
                    path.items.push(PathItem::Rect(rect));
                    // `re` leaves the current point at its origin.
                    path.move_to(corners[0]);
                }
            }
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                if matches!(op.operator.as_str(), "s" | "b" | "b*") {
                    path.close();
                }
                let items = path.take();
                if items.is_empty() {
                    continue;
                }
                let stroked = matches!(op.operator.as_str(), "S" | "s" | "B" | "B*" | "b" | "b*");
                let filled = !matches!(op.operator.as_str(), "S" | "s");
                drawings.push(DrawingPath {
                    items,
                    stroked,
                    filled,
                });
            }
            "n" => {
                path.take();
            }
            _ => {}
        }
    }

    drawings
}
