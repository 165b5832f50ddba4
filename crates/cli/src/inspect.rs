use std::path::PathBuf;

use colored::Colorize;
use formscan::parser::drawing::PathItem;
use formscan::{Document, PageSource};

use crate::prelude::{println, *};

#[derive(Debug, clap::Args)]
pub struct InspectOptions {
    /// PDF file to inspect
    #[arg(value_name = "PDF")]
    pub path: PathBuf,

    /// Only this page (1-indexed)
    #[arg(short, long)]
    pub page: Option<u32>,
}

pub fn run(options: InspectOptions, global: crate::Global) -> Result<()> {
    let bytes = std::fs::read(&options.path)
        .with_context(|| f!("reading {}", options.path.display()))?;
    let document = Document::open(&bytes)
        .map_err(|e| Error::Open(options.path.display().to_string(), e.to_string()))?;

    let count = document.page_count();
    let pages = match options.page {
        Some(page) if page == 0 || page > count => {
            return Err(Error::PageOutOfRange { page, count }.into())
        }
        Some(page) => page..=page,
        None => 1..=count,
    };

    if global.verbose {
        match document.field_hierarchy() {
            Ok(roots) => println!("AcroForm: {} root fields", roots.len()),
            Err(e) => println!("AcroForm: {}", e.to_string().red()),
        }
    }

    for page in pages {
        println!("\n{}", "=".repeat(80).bright_cyan());
        println!("{}", f!("PAGE {page} of {count}").bold());
        println!("{}", "=".repeat(80).bright_cyan());
        print_widgets(&document, page);
        print_drawings(&document, page);
        print_spans(&document, page);
    }
    Ok(())
}

fn section(title: &str, len: usize) {
    println!("\n{} ({len})", title.bright_yellow().bold());
}

fn print_widgets(document: &dyn PageSource, page: u32) {
    let widgets = match document.widgets(page) {
        Ok(widgets) => widgets,
        Err(e) => return println!("widgets: {}", e.to_string().red()),
    };
    section("Widgets", widgets.len());
    if widgets.is_empty() {
        return;
    }
    let mut table = new_table();
    table.add_row(prettytable::row!["Name", "FT", "Flags", "Rect", "Value"]);
    for w in &widgets {
        table.add_row(prettytable::row![
            w.name.as_deref().unwrap_or("-"),
            w.type_code.as_deref().unwrap_or("-"),
            f!("{:#x}", w.flags.bits()),
            w.rect.as_ref().map(format_rect).unwrap_or_else(|| "-".into()),
            w.value.as_deref().unwrap_or("")
        ]);
    }
    table.printstd();
}

fn print_drawings(document: &dyn PageSource, page: u32) {
    let drawings = match document.drawings(page) {
        Ok(drawings) => drawings,
        Err(e) => return println!("drawings: {}", e.to_string().red()),
    };
    section("Drawings", drawings.len());
    if drawings.is_empty() {
        return;
    }
    let mut table = new_table();
    table.add_row(prettytable::row!["#", "Paint", "Item", "Geometry"]);
    for (i, path) in drawings.iter().enumerate() {
        let paint = match (path.stroked, path.filled) {
            (true, true) => "stroke+fill",
            (true, false) => "stroke",
            (false, true) => "fill",
            (false, false) => "-",
        };
        for item in &path.items {
            let (kind, geometry) = match item {
                PathItem::Rect(r) => ("rect", format_rect(r)),
                PathItem::Line { start, end } => (
                    "line",
                    f!("({:.1}, {:.1}) -> ({:.1}, {:.1})", start.0, start.1, end.0, end.1),
                ),
                PathItem::Curve { start, end } => (
                    "curve",
                    f!("({:.1}, {:.1}) -> ({:.1}, {:.1})", start.0, start.1, end.0, end.1),
                ),
            };
            table.add_row(prettytable::row![i + 1, paint, kind, geometry]);
        }
    }
    table.printstd();
}

fn print_spans(document: &dyn PageSource, page: u32) {
    let spans = match document.text_spans(page) {
        Ok(spans) => spans,
        Err(e) => return println!("text: {}", e.to_string().red()),
    };
    section("Text spans", spans.len());
    if spans.is_empty() {
        return;
    }
    let mut table = new_table();
    table.add_row(prettytable::row!["Text", "Font", "Size", "BBox"]);
    for span in &spans {
        table.add_row(prettytable::row![
            &span.text,
            &span.font,
            f!("{:.1}", span.size),
            format_rect(&span.bbox)
        ]);
    }
    table.printstd();
}
