//! Range helpers: expanding `A1:B3` style ranges into cells and collapsing
//! scattered cells back into compact range strings.

use std::collections::BTreeMap;

use super::cell_ref::CellRef;

/// Most cells a single expansion may produce.
pub const MAX_RANGE_CELLS: usize = 1_000_000;

/// Parse a cell range like "A1:B5" into its two corners, as written.
pub fn parse_range(range: &str) -> Option<(CellRef, CellRef)> {
    let (start, end) = range.split_once(':')?;
    if end.contains(':') {
        return None;
    }
    Some((CellRef::from_str(start)?, CellRef::from_str(end)?))
}

/// Number of cells spanned by two corners, `None` on overflow.
pub fn range_cell_count(start: &CellRef, end: &CellRef) -> Option<usize> {
    let rows = start.row.abs_diff(end.row).checked_add(1)?;
    let cols = start.col.abs_diff(end.col).checked_add(1)?;
    rows.checked_mul(cols)
}

/// Every cell between two corners, row by row.
pub fn cells_in_range(start: &CellRef, end: &CellRef) -> Vec<CellRef> {
    let (min_row, max_row) = (start.row.min(end.row), start.row.max(end.row));
    let (min_col, max_col) = (start.col.min(end.col), start.col.max(end.col));
    let mut cells = Vec::new();
    for row in min_row..=max_row {
        for col in min_col..=max_col {
            cells.push(CellRef::new(col, row));
        }
    }
    cells
}

/// Expand a space separated list of cells and ranges ("A1:A2 B1:B2 C5")
/// into individual cells. Returns None if any entry is malformed or the
/// expansion would exceed [`MAX_RANGE_CELLS`].
pub fn expand_cell_ranges(ranges: &str) -> Option<Vec<CellRef>> {
    let mut cells = Vec::new();
    for entry in ranges.split_whitespace() {
        if entry.contains(':') {
            let (start, end) = parse_range(entry)?;
            let count = range_cell_count(&start, &end)?;
            if count > MAX_RANGE_CELLS - cells.len() {
                return None;
            }
            cells.extend(cells_in_range(&start, &end));
        } else {
            if cells.len() == MAX_RANGE_CELLS {
                return None;
            }
            cells.push(CellRef::from_str(entry)?);
        }
    }
    Some(cells)
}

/// Collapse cells into contiguous vertical runs per column, appended to any
/// ranges passed through verbatim. A1, A2, A3, B1 becomes "A1:A3 B1".
pub fn collapse_cell_addresses(cells: &[CellRef], input_ranges: &[&str]) -> String {
    let mut by_col: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for cell in cells {
        by_col.entry(cell.col).or_default().push(cell.row);
    }

    let mut ranges: Vec<String> = input_ranges.iter().map(|r| r.to_string()).collect();
    for (col, mut rows) in by_col {
        rows.sort_unstable();
        rows.dedup();

        let mut run_start = rows[0];
        let mut prev = rows[0];
        for &row in &rows[1..] {
            if row != prev + 1 {
                ranges.push(format_run(col, run_start, prev));
                run_start = row;
            }
            prev = row;
        }
        ranges.push(format_run(col, run_start, prev));
    }

    ranges.join(" ")
}

fn format_run(col: usize, first_row: usize, last_row: usize) -> String {
    let start = CellRef::new(col, first_row);
    if first_row == last_row {
        start.to_string()
    } else {
        format!("{}:{}", start, CellRef::new(col, last_row))
    }
}
