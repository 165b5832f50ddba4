pub use crate::error::Error;

pub use anstream::eprintln;
pub use anstream::println;
pub use color_eyre::eyre::{eyre, Context, Result};
pub use std::format as f;

pub fn new_table() -> prettytable::Table {
    let mut table = prettytable::Table::new();

    let format = prettytable::format::FormatBuilder::new()
        .padding(1, 1)
        .build();

    table.set_format(format);

    table
}

/// `[x0, y0, x1, y1]` rounded to one decimal.
pub fn format_rect(rect: &formscan::Rect) -> String {
    f!(
        "[{:.1}, {:.1}, {:.1}, {:.1}]",
        rect.x0,
        rect.y0,
        rect.x1,
        rect.y1
    )
}
