//! Sheet engine API built on the tokenizer.
//!
//! - [`Cell`], [`CellType`], [`Grid`] - Data structures for cell storage
//! - [`CellRef`], [`A1Ref`], [`RefPart`] - Cell reference parsing (A1 notation ↔ row/col indices)
//! - [`detect_cycle`] - Circular dependency detection
//! - [`extract_dependencies`] - Cells a tokenized formula refers to
//! - [`expand_cell_ranges`], [`collapse_cell_addresses`] - Range list helpers
//! - [`offset_formula_references`], [`shift_formula_references`] - Reference translation

mod cell;
mod cell_ref;
mod cycle;
mod deps;
mod range;
mod translate;

pub use cell::{Cell, CellType, Grid};
pub use cell_ref::{A1Ref, CellRef, RefPart};
pub use cycle::detect_cycle;
pub use deps::{extract_dependencies, extract_formula_dependencies};
pub use range::{
    MAX_RANGE_CELLS, cells_in_range, collapse_cell_addresses, expand_cell_ranges, parse_range,
    range_cell_count,
};
pub use translate::{ShiftOperation, offset_formula_references, shift_formula_references};
