//! Cell data structures for the sheet grid.
//!
//! - [`CellType`] - The type of content in a cell (empty, text, number, formula, invalid)
//! - [`Cell`] - A cell with content and the cells its formula depends on
//! - [`Grid`] - Thread-safe sparse storage for cells (backed by `DashMap`)

use dashmap::DashMap;
use std::sync::Arc;

use crate::tokenizer::{self, Token, TokenizerError, TokenizerOptions};

use super::cell_ref::CellRef;
use super::deps::extract_dependencies;

/// The type of content stored in a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellType {
    Empty,
    Text(String),
    Number(f64),
    /// A formula that tokenized cleanly. `tokens` renders back to the source.
    Formula { source: String, tokens: Vec<Token> },
    /// A formula the tokenizer rejected. Kept verbatim so it can be fixed.
    Invalid {
        source: String,
        error: TokenizerError,
    },
}

/// A cell in the sheet grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub contents: CellType,
    pub depends_on: Vec<CellRef>,
}

impl Cell {
    pub fn new_empty() -> Cell {
        Cell {
            contents: CellType::Empty,
            depends_on: vec![],
        }
    }

    pub fn new_text(text: &str) -> Cell {
        Cell {
            contents: CellType::Text(text.to_string()),
            depends_on: vec![],
        }
    }

    pub fn new_number(n: f64) -> Cell {
        Cell {
            contents: CellType::Number(n),
            depends_on: vec![],
        }
    }

    /// Create a cell from `=`-prefixed formula text.
    /// Dependencies are extracted from the tokens; a formula that fails to
    /// tokenize becomes an [`CellType::Invalid`] cell with no dependencies.
    pub fn new_formula(source: &str, options: TokenizerOptions) -> Cell {
        match tokenizer::tokenize_with(source, options) {
            Ok(tokens) => Cell {
                depends_on: extract_dependencies(&tokens),
                contents: CellType::Formula {
                    source: source.to_string(),
                    tokens,
                },
            },
            Err(error) => Cell {
                contents: CellType::Invalid {
                    source: source.to_string(),
                    error,
                },
                depends_on: vec![],
            },
        }
    }

    /// Parse user input and create appropriate cell type.
    /// - Empty string or whitespace -> Empty
    /// - Starts with '=' -> Formula (or Invalid)
    /// - Quoted string -> Text (without quotes)
    /// - Valid number -> Number
    /// - Otherwise -> Text
    pub fn from_input(input: &str, options: TokenizerOptions) -> Cell {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Cell::new_empty();
        }

        if trimmed.starts_with('=') {
            return Cell::new_formula(trimmed, options);
        }

        if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
            let text = &trimmed[1..trimmed.len() - 1];
            return Cell::new_text(text);
        }

        if let Ok(n) = trimmed.parse::<f64>() {
            return Cell::new_number(n);
        }

        Cell::new_text(trimmed)
    }

    /// Get a display string for the cell content (for editing).
    pub fn to_input_string(&self) -> String {
        match &self.contents {
            CellType::Empty => String::new(),
            CellType::Text(s) => s.clone(),
            CellType::Number(n) => n.to_string(),
            CellType::Formula { source, .. } | CellType::Invalid { source, .. } => source.clone(),
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.contents, CellType::Invalid { .. })
    }

    pub fn tokens(&self) -> Option<&[Token]> {
        match &self.contents {
            CellType::Formula { tokens, .. } => Some(tokens),
            _ => None,
        }
    }
}

/// Thread-safe sparse grid storage.
pub type Grid = Arc<DashMap<CellRef, Cell>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_input_classifies() {
        let opts = TokenizerOptions::default();
        assert_eq!(Cell::from_input("   ", opts).contents, CellType::Empty);
        assert_eq!(Cell::from_input("42", opts).contents, CellType::Number(42.0));
        assert_eq!(
            Cell::from_input("\"007\"", opts).contents,
            CellType::Text("007".to_string())
        );
        assert_eq!(
            Cell::from_input("hello", opts).contents,
            CellType::Text("hello".to_string())
        );
    }

    #[test]
    fn test_formula_cell_tracks_dependencies() {
        let cell = Cell::from_input("=A1+SUM(B1:B2)", TokenizerOptions::default());
        assert!(!cell.is_invalid());
        assert_eq!(
            cell.depends_on,
            vec![CellRef::new(0, 0), CellRef::new(1, 0), CellRef::new(1, 1)]
        );
        assert_eq!(cell.tokens().map(|t| t.len()), Some(5));
        assert_eq!(cell.to_input_string(), "=A1+SUM(B1:B2)");
    }

    #[test]
    fn test_bad_formula_becomes_invalid() {
        let cell = Cell::from_input("=SUM(A1", TokenizerOptions::default());
        assert!(cell.is_invalid());
        assert!(cell.depends_on.is_empty());
        assert_eq!(cell.to_input_string(), "=SUM(A1");
    }
}
