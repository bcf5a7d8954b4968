//! Reference transformation on tokenized formulas.
//!
//! Formulas are tokenized first, so only RANGE operands are touched;
//! string literals, function names and error codes pass through untouched.
//! This module handles:
//!
//! - **Offsetting**: copy/paste moves relative references by a delta while
//!   `$`-anchored parts stay put
//! - **Reference shifting**: adjusting references when rows/columns are
//!   inserted or deleted
//!
//! Whitespace runs come back as single spaces, since that is how the
//! tokenizer records them.

use crate::tokenizer::{self, OperandKind, Token, TokenKind, TokenizerOptions};

use super::cell_ref::{A1Ref, CellRef, RefPart};

const REF_ERROR: &str = "#REF!";

/// Operation for shifting cell references in formulas.
#[derive(Clone, Copy, Debug)]
pub enum ShiftOperation {
    InsertRow(usize),
    DeleteRow(usize),
    InsertColumn(usize),
    DeleteColumn(usize),
}

/// Offset all relative references in a formula by a column/row delta.
///
/// Rules:
/// - `A1` offset by (+1, +2) becomes `B3`
/// - `$A1` offset by (+1, +2) becomes `$A3`
/// - both ends of a range move: `SUM(A1:B2)` -> `SUM(B3:C4)`
/// - references that move off the sheet become `#REF!`
///
/// `options` should be the ones the formula was accepted under, so the
/// nesting limit matches; whitespace is always kept.
pub fn offset_formula_references(
    formula: &str,
    delta_col: isize,
    delta_row: isize,
    options: TokenizerOptions,
) -> tokenizer::Result<String> {
    if delta_col == 0 && delta_row == 0 {
        return Ok(formula.to_string());
    }
    rewrite_references(formula, options, |part| {
        offset_part(part, delta_col, delta_row)
    })
}

/// Shift references in a formula when rows/cols are inserted/deleted.
///
/// Rules:
/// - Insert row at R: refs to row >= R become row + 1
/// - Delete row at R: refs to row > R become row - 1; row == R becomes `#REF!`
/// - Same logic for columns
/// - `$` anchors do not pin a reference against structural changes
pub fn shift_formula_references(
    formula: &str,
    op: ShiftOperation,
    options: TokenizerOptions,
) -> tokenizer::Result<String> {
    rewrite_references(formula, options, |part| shift_part(part, op))
}

fn rewrite_references<F>(
    formula: &str,
    options: TokenizerOptions,
    map: F,
) -> tokenizer::Result<String>
where
    F: Fn(RefPart) -> Option<RefPart>,
{
    let options = TokenizerOptions {
        preserve_whitespace: true,
        ..options
    };
    let tokens = tokenizer::tokenize_with(formula, options)?;
    let rewritten: Vec<Token> = tokens
        .into_iter()
        .map(|token| {
            if token.kind() != TokenKind::Operand(OperandKind::Range) {
                return token;
            }
            match rewrite_range(token.value(), &map) {
                Some(value) => Token::make_operand(value),
                None => token,
            }
        })
        .collect();
    Ok(tokenizer::render(&rewritten))
}

/// Rewrite one RANGE operand. Returns None when the operand is not a
/// reference this module understands (defined names, structured refs).
///
/// A reference pushed off the grid becomes a bare `#REF!`, sheet prefix
/// included, since `Sheet2!#REF!` would not tokenize again.
fn rewrite_range<F>(value: &str, map: &F) -> Option<String>
where
    F: Fn(RefPart) -> Option<RefPart>,
{
    let (sheet, reference) = match value.rfind('!') {
        Some(idx) => value.split_at(idx + 1),
        None => ("", value),
    };
    if reference.contains('[') {
        return None;
    }

    let parts: Vec<RefPart> = reference
        .split(':')
        .map(RefPart::parse)
        .collect::<Option<Vec<_>>>()?;
    let consistent = match parts.as_slice() {
        [RefPart::Cell(_)] => true,
        [a, b] => std::mem::discriminant(a) == std::mem::discriminant(b),
        _ => false,
    };
    if !consistent {
        return None;
    }

    let mut out = String::from(sheet);
    for (idx, part) in parts.into_iter().enumerate() {
        let Some(moved) = map(part) else {
            return Some(REF_ERROR.to_string());
        };
        if idx > 0 {
            out.push(':');
        }
        out.push_str(&moved.to_string());
    }
    Some(out)
}

fn offset_index(index: usize, delta: isize, absolute: bool) -> Option<usize> {
    if absolute {
        return Some(index);
    }
    index.checked_add_signed(delta)
}

fn offset_part(part: RefPart, delta_col: isize, delta_row: isize) -> Option<RefPart> {
    match part {
        RefPart::Cell(r) => {
            let col = offset_index(r.cell.col, delta_col, r.col_absolute)?;
            let row = offset_index(r.cell.row, delta_row, r.row_absolute)?;
            Some(RefPart::Cell(A1Ref {
                cell: CellRef::new(col, row),
                ..r
            }))
        }
        RefPart::Column { col, absolute } => Some(RefPart::Column {
            col: offset_index(col, delta_col, absolute)?,
            absolute,
        }),
        RefPart::Row { row, absolute } => Some(RefPart::Row {
            row: offset_index(row, delta_row, absolute)?,
            absolute,
        }),
    }
}

/// Apply an insert/delete at `at` to a single index.
fn shift_index(index: usize, at: usize, insert: bool) -> Option<usize> {
    if insert {
        if index >= at { Some(index + 1) } else { Some(index) }
    } else if index == at {
        None
    } else if index > at {
        Some(index - 1)
    } else {
        Some(index)
    }
}

fn shift_part(part: RefPart, op: ShiftOperation) -> Option<RefPart> {
    let (at, insert, on_rows) = match op {
        ShiftOperation::InsertRow(at) => (at, true, true),
        ShiftOperation::DeleteRow(at) => (at, false, true),
        ShiftOperation::InsertColumn(at) => (at, true, false),
        ShiftOperation::DeleteColumn(at) => (at, false, false),
    };
    match part {
        RefPart::Cell(r) => {
            let cell = if on_rows {
                CellRef::new(r.cell.col, shift_index(r.cell.row, at, insert)?)
            } else {
                CellRef::new(shift_index(r.cell.col, at, insert)?, r.cell.row)
            };
            Some(RefPart::Cell(A1Ref { cell, ..r }))
        }
        RefPart::Column { col, absolute } if !on_rows => Some(RefPart::Column {
            col: shift_index(col, at, insert)?,
            absolute,
        }),
        RefPart::Row { row, absolute } if on_rows => Some(RefPart::Row {
            row: shift_index(row, at, insert)?,
            absolute,
        }),
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> TokenizerOptions {
        TokenizerOptions::default()
    }

    #[test]
    fn test_offset_formula_references_positive_delta() {
        let shifted = offset_formula_references("=SUM(A1:B2)+C3*D4", 1, 2, opts()).unwrap();
        assert_eq!(shifted, "=SUM(B3:C4)+D5*E6");
    }

    #[test]
    fn test_offset_formula_references_respects_anchors() {
        let shifted = offset_formula_references("=$A1+A$1+$A$1", 2, 3, opts()).unwrap();
        assert_eq!(shifted, "=$A4+C$1+$A$1");
    }

    #[test]
    fn test_offset_formula_references_out_of_bounds() {
        let shifted = offset_formula_references("=A1+B2", -1, 0, opts()).unwrap();
        assert_eq!(shifted, "=#REF!+A2");
    }

    #[test]
    fn test_offset_leaves_strings_names_and_literals() {
        let shifted = offset_formula_references("=IF(Rate>0,\"A1\",Table1[Col])", 1, 1, opts()).unwrap();
        assert_eq!(shifted, "=IF(Rate>0,\"A1\",Table1[Col])");
        assert_eq!(
            offset_formula_references("A1 plain text", 1, 1, opts()).unwrap(),
            "A1 plain text"
        );
    }

    #[test]
    fn test_offset_sheet_and_whole_column_ranges() {
        let shifted = offset_formula_references("='My Sheet'!B2+SUM(A:B)+SUM(1:$3)", 1, 1, opts()).unwrap();
        assert_eq!(shifted, "='My Sheet'!C3+SUM(B:C)+SUM(2:$3)");
    }

    #[test]
    fn test_offset_keeps_single_spaces() {
        let shifted = offset_formula_references("=A1 + B1", 0, 1, opts()).unwrap();
        assert_eq!(shifted, "=A2 + B2");
    }

    #[test]
    fn test_offset_propagates_tokenizer_errors() {
        assert!(offset_formula_references("=SUM(A1", 1, 0, opts()).is_err());
    }

    #[test]
    fn test_shift_formula_references_preserves_paren() {
        let shifted =
            shift_formula_references("=SUM(A1:A100)", ShiftOperation::InsertColumn(0), opts()).unwrap();
        assert_eq!(shifted, "=SUM(B1:B100)");
    }

    #[test]
    fn test_shift_formula_references_mixed_range_and_cell() {
        let shifted =
            shift_formula_references("=SUM(A1:A3)+B1", ShiftOperation::InsertColumn(0), opts()).unwrap();
        assert_eq!(shifted, "=SUM(B1:B3)+C1");
    }

    #[test]
    fn test_shift_delete_row() {
        let shifted =
            shift_formula_references("=A1+A2+A3+$A$3", ShiftOperation::DeleteRow(1), opts()).unwrap();
        assert_eq!(shifted, "=A1+#REF!+A2+$A$2");
    }

    #[test]
    fn test_shift_insert_row_leaves_columns() {
        let shifted =
            shift_formula_references("=SUM(B:B)+SUM(2:4)", ShiftOperation::InsertRow(0), opts()).unwrap();
        assert_eq!(shifted, "=SUM(B:B)+SUM(3:5)");
    }

    #[test]
    fn test_off_grid_sheet_reference_becomes_ref_error() {
        let shifted = shift_formula_references(
            "=Sheet2!A1+'My Sheet'!B1:B3",
            ShiftOperation::DeleteRow(0),
            opts(),
        )
        .unwrap();
        assert_eq!(shifted, "=#REF!+#REF!");
        assert!(tokenizer::tokenize(&shifted).is_ok());
    }

    #[test]
    fn test_translation_honours_nesting_limit() {
        let formula = format!("={}A5{}", "(".repeat(1100), ")".repeat(1100));
        assert!(shift_formula_references(&formula, ShiftOperation::InsertRow(0), opts()).is_err());

        let deep = TokenizerOptions {
            max_depth: 4096,
            ..TokenizerOptions::default()
        };
        let shifted = shift_formula_references(&formula, ShiftOperation::InsertRow(0), deep).unwrap();
        assert!(shifted.contains("A6"));
        assert!(!shifted.contains("A5"));
        let moved = offset_formula_references(&formula, 1, 0, deep).unwrap();
        assert!(moved.contains("B5"));
    }
}
