//! Parser for .grd file format
//!
//! One cell per line as `CELLREF: VALUE`. Formulas keep their leading `=`
//! and are tokenized on load; a formula that fails to tokenize is kept as an
//! invalid cell so the file still opens.

use super::read_sheet_file;
use crate::error::{Result, SheetlexError};
use sheetlex_engine::engine::{Cell, CellRef, Grid};
use sheetlex_engine::tokenizer::TokenizerOptions;
use std::path::Path;

/// Parse a .grd file and return a Grid
pub fn parse_grd(path: &Path, options: TokenizerOptions) -> Result<Grid> {
    let content = read_sheet_file(path)?;
    parse_grd_content(&content, options)
}

/// Parse .grd content from a string
pub fn parse_grd_content(content: &str, options: TokenizerOptions) -> Result<Grid> {
    let grid: Grid = std::sync::Arc::new(dashmap::DashMap::new());

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((cell_ref_str, value_str)) = line.split_once(':') else {
            return Err(SheetlexError::Parse {
                line: line_num + 1,
                message: "Expected 'CELLREF: VALUE' format".to_string(),
            });
        };

        let cell_ref_str = cell_ref_str.trim();
        let cell_ref = CellRef::from_str(cell_ref_str).ok_or_else(|| SheetlexError::Parse {
            line: line_num + 1,
            message: format!("Invalid cell reference: {}", cell_ref_str),
        })?;

        let cell = parse_cell_value(value_str, line_num + 1, options)?;
        if cell.is_invalid() {
            tracing::warn!(cell = %cell_ref, line = line_num + 1, "formula does not tokenize");
        }
        grid.insert(cell_ref, cell);
    }

    Ok(grid)
}

fn parse_cell_value(value: &str, line_num: usize, options: TokenizerOptions) -> Result<Cell> {
    let value = value.trim();

    if value.is_empty() {
        return Ok(Cell::new_empty());
    }

    if value.starts_with('=') {
        return Ok(Cell::new_formula(value, options));
    }

    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        let text = unescape_grd_text(&value[1..value.len() - 1]);
        return Ok(Cell::new_text(&text));
    }

    if let Ok(n) = value.parse::<f64>() {
        return Ok(Cell::new_number(n));
    }

    Err(SheetlexError::Parse {
        line: line_num,
        message: format!("Invalid value: {}. Use quotes for text.", value),
    })
}

fn unescape_grd_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(next @ ('\\' | '"')) => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetlex_engine::engine::CellType;

    fn parse(content: &str) -> Grid {
        parse_grd_content(content, TokenizerOptions::default()).unwrap()
    }

    #[test]
    fn test_parse_number_and_text() {
        let grid = parse("A1: 42\nB1: \"He said \\\"hi\\\"\"");
        assert_eq!(
            grid.get(&CellRef::new(0, 0)).unwrap().contents,
            CellType::Number(42.0)
        );
        assert_eq!(
            grid.get(&CellRef::new(1, 0)).unwrap().contents,
            CellType::Text("He said \"hi\"".to_string())
        );
    }

    #[test]
    fn test_parse_formula_keeps_source_and_tokens() {
        let grid = parse("C1: =A1 + B1");
        let cell = grid.get(&CellRef::new(2, 0)).unwrap();
        assert_eq!(cell.to_input_string(), "=A1 + B1");
        assert_eq!(cell.depends_on, vec![CellRef::new(0, 0), CellRef::new(1, 0)]);
        assert!(cell.tokens().is_some());
    }

    #[test]
    fn test_parse_keeps_invalid_formula() {
        let grid = parse("A1: =SUM(B1");
        let cell = grid.get(&CellRef::new(0, 0)).unwrap();
        assert!(cell.is_invalid());
        assert_eq!(cell.to_input_string(), "=SUM(B1");
    }

    #[test]
    fn test_skip_comments_and_empty_lines() {
        let content = r#"
# This is a comment
A1: 42

# Another comment

B1: 100
"#;
        assert_eq!(parse(content).len(), 2);
    }

    #[test]
    fn test_parse_errors_report_line() {
        let err = parse_grd_content("A1: 1\nnot a cell", TokenizerOptions::default()).unwrap_err();
        assert!(matches!(err, SheetlexError::Parse { line: 2, .. }));

        let err = parse_grd_content("1A: 1", TokenizerOptions::default()).unwrap_err();
        assert!(err.to_string().contains("Invalid cell reference"));

        let err = parse_grd_content("A1: hello", TokenizerOptions::default()).unwrap_err();
        assert!(err.to_string().contains("Use quotes for text"));
    }
}
