//! Dependency extraction from tokenized formulas.
//!
//! Walks the RANGE operands of a token sequence and collects every cell
//! they name. This feeds the reverse-dependency map and cycle detection.
//!
//! Handles:
//! - Simple cell references: `A1`, `$B$2`
//! - Cell ranges: `B2:C5`
//!
//! Sheet-qualified references, whole-row/column ranges, structured
//! references and defined names are not resolved and are skipped.

use crate::tokenizer::{self, OperandKind, Token, TokenKind};

use super::cell_ref::CellRef;
use super::range::{MAX_RANGE_CELLS, cells_in_range, parse_range, range_cell_count};

const MAX_DEPENDENCY_RANGE_CELLS: usize = MAX_RANGE_CELLS;

/// Extract all same-sheet cell references from a token sequence.
pub fn extract_dependencies(tokens: &[Token]) -> Vec<CellRef> {
    let mut deps = Vec::new();

    for token in tokens {
        if token.kind() != TokenKind::Operand(OperandKind::Range) {
            continue;
        }
        let value = token.value();
        if value.contains('!') || value.contains('[') {
            continue;
        }

        if value.contains(':') {
            let Some((start, end)) = parse_range(value) else {
                continue;
            };
            match range_cell_count(&start, &end) {
                Some(count) if count <= MAX_DEPENDENCY_RANGE_CELLS => {
                    deps.extend(cells_in_range(&start, &end));
                }
                _ => {
                    tracing::debug!(range = value, "skipping oversized dependency range");
                }
            }
        } else if let Some(cell) = CellRef::from_str(value) {
            deps.push(cell);
        }
    }

    deps
}

/// Tokenize a formula and extract its dependencies.
pub fn extract_formula_dependencies(formula: &str) -> tokenizer::Result<Vec<CellRef>> {
    let tokens = tokenizer::tokenize(formula)?;
    Ok(extract_dependencies(&tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(formula: &str) -> Vec<CellRef> {
        extract_formula_dependencies(formula).unwrap()
    }

    #[test]
    fn test_extract_dependencies_empty() {
        assert!(deps("").is_empty());
        assert!(deps("=10 + 20").is_empty());
        assert!(deps("A1 is not a formula").is_empty());
    }

    #[test]
    fn test_extract_dependencies_cells_and_ranges() {
        assert_eq!(
            deps("=SUM(A1:B2)+$C$3"),
            vec![
                CellRef::new(0, 0),
                CellRef::new(1, 0),
                CellRef::new(0, 1),
                CellRef::new(1, 1),
                CellRef::new(2, 2),
            ]
        );
    }

    #[test]
    fn test_extract_dependencies_ignores_strings_and_functions() {
        assert_eq!(deps("=LOG10(\"A1\")&B2"), vec![CellRef::new(1, 1)]);
    }

    #[test]
    fn test_extract_dependencies_skips_unresolvable() {
        assert!(deps("=Sheet2!A1+'My Sheet'!B2").is_empty());
        assert!(deps("=SUM(A:A)+SUM(1:1)+Rate").is_empty());
        assert!(deps("=SUM(Table1[Sales])").is_empty());
    }

    #[test]
    fn test_extract_dependencies_skips_over_limit_ranges() {
        assert_eq!(deps("=SUM(A1:A1000001)+B2"), vec![CellRef::new(1, 1)]);
    }

    #[test]
    fn test_extract_formula_dependencies_propagates_errors() {
        assert!(extract_formula_dependencies("=SUM(A1").is_err());
    }
}
