//! Writer for .grd file format

use crate::error::Result;
use sheetlex_engine::engine::{CellType, Grid};
use std::fs;
use std::path::Path;

/// Write a Grid to a .grd file
pub fn write_grd(path: &Path, grid: &Grid) -> Result<()> {
    let content = write_grd_content(grid);
    fs::write(path, content)?;
    Ok(())
}

/// Write a Grid to a .grd format string, one cell per line in row-major order.
/// Invalid formulas are written back verbatim.
pub fn write_grd_content(grid: &Grid) -> String {
    let mut lines = vec!["# Sheetlex Sheet".to_string()];

    let mut cells: Vec<_> = grid.iter().collect();
    cells.sort_by(|a, b| a.key().cmp(b.key()));

    for entry in cells {
        let value_str = match &entry.value().contents {
            CellType::Empty => continue,
            CellType::Number(n) => n.to_string(),
            CellType::Text(s) => format!("\"{}\"", escape_grd_text(s)),
            CellType::Formula { source, .. } | CellType::Invalid { source, .. } => source.clone(),
        };
        lines.push(format!("{}: {}", entry.key(), value_str));
    }

    lines.join("\n") + "\n"
}

fn escape_grd_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(ch),
        }
    }
    out
}
