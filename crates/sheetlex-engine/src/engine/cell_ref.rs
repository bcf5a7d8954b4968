//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "$B$2", "AA100") and zero-indexed column/row coordinates.
//!
//! # Examples
//!
//! ```ignore
//! let cell = CellRef::from_str("B3").unwrap();
//! assert_eq!(cell.col, 1);  // 0-indexed
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A reference to a cell by column and row indices (0-indexed).
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

fn a1_re() -> &'static Regex {
    static A1_RE: OnceLock<Regex> = OnceLock::new();
    A1_RE.get_or_init(|| {
        Regex::new(r"^(?<col_abs>\$?)(?<letters>[A-Za-z]+)(?<row_abs>\$?)(?<numbers>[0-9]+)$")
            .expect("A1 reference regex must compile")
    })
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "$B2", "AA10").
    /// `$` anchors are accepted and dropped. Returns None if the input is invalid.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellRef> {
        A1Ref::parse(name).map(|r| r.cell)
    }

    /// Convert column letters to a 0-indexed column (A -> 0, Z -> 25, AA -> 26).
    pub fn letters_to_col(letters: &str) -> Option<usize> {
        if letters.is_empty() {
            return None;
        }
        let mut col_acc = 0usize;
        for c in letters.to_ascii_uppercase().bytes() {
            if !c.is_ascii_uppercase() {
                return None;
            }
            let digit = (c - b'A') as usize + 1;
            col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
        }
        col_acc.checked_sub(1)
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        A1Ref::parse(s)
            .map(|r| r.cell)
            .ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

/// A cell reference as written in a formula, `$` anchors included.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct A1Ref {
    pub cell: CellRef,
    pub col_absolute: bool,
    pub row_absolute: bool,
}

impl A1Ref {
    pub fn parse(text: &str) -> Option<A1Ref> {
        let caps = a1_re().captures(text)?;
        let col = CellRef::letters_to_col(&caps["letters"])?;
        let row = caps["numbers"].parse::<usize>().ok()?.checked_sub(1)?;
        Some(A1Ref {
            cell: CellRef::new(col, row),
            col_absolute: !caps["col_abs"].is_empty(),
            row_absolute: !caps["row_abs"].is_empty(),
        })
    }
}

impl fmt::Display for A1Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let col_mark = if self.col_absolute { "$" } else { "" };
        let row_mark = if self.row_absolute { "$" } else { "" };
        write!(
            f,
            "{}{}{}{}",
            col_mark,
            CellRef::col_to_letters(self.cell.col),
            row_mark,
            self.cell.row + 1
        )
    }
}

/// One end of a reference: a cell, or a bare column/row of a whole-column
/// (`A:C`) or whole-row (`1:3`) range.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RefPart {
    Cell(A1Ref),
    Column { col: usize, absolute: bool },
    Row { row: usize, absolute: bool },
}

impl RefPart {
    pub fn parse(text: &str) -> Option<RefPart> {
        if let Some(cell) = A1Ref::parse(text) {
            return Some(RefPart::Cell(cell));
        }
        let (absolute, body) = match text.strip_prefix('$') {
            Some(body) => (true, body),
            None => (false, text),
        };
        if !body.is_empty() && body.bytes().all(|b| b.is_ascii_alphabetic()) {
            let col = CellRef::letters_to_col(body)?;
            return Some(RefPart::Column { col, absolute });
        }
        if !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit()) {
            let row = body.parse::<usize>().ok()?.checked_sub(1)?;
            return Some(RefPart::Row { row, absolute });
        }
        None
    }
}

impl fmt::Display for RefPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefPart::Cell(cell) => write!(f, "{}", cell),
            RefPart::Column { col, absolute } => {
                let mark = if *absolute { "$" } else { "" };
                write!(f, "{}{}", mark, CellRef::col_to_letters(*col))
            }
            RefPart::Row { row, absolute } => {
                let mark = if *absolute { "$" } else { "" };
                write!(f, "{}{}", mark, row + 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_a1_overflow_returns_none() {
        let huge = format!("{}1", "Z".repeat(40));
        assert!(CellRef::from_str(&huge).is_none());
    }

    #[test]
    fn test_col_to_letters_handles_max_usize() {
        let letters = CellRef::col_to_letters(usize::MAX);
        assert!(!letters.is_empty());
        assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_from_str_columns_and_rows() {
        assert_eq!(CellRef::from_str("A1"), Some(CellRef::new(0, 0)));
        assert_eq!(CellRef::from_str("Z10"), Some(CellRef::new(25, 9)));
        assert_eq!(CellRef::from_str("AA1"), Some(CellRef::new(26, 0)));
        assert_eq!(CellRef::from_str("ba3"), Some(CellRef::new(52, 2)));
    }

    #[test]
    fn test_from_str_invalid_inputs() {
        assert!(CellRef::from_str("").is_none());
        assert!(CellRef::from_str("123").is_none());
        assert!(CellRef::from_str("ABC").is_none());
        assert!(CellRef::from_str("A0").is_none());
        assert!(CellRef::from_str("1A").is_none());
        assert!(CellRef::from_str("A 1").is_none());
    }

    #[test]
    fn test_absolute_markers_round_trip() {
        let r = A1Ref::parse("$C$7").unwrap();
        assert_eq!(r.cell, CellRef::new(2, 6));
        assert!(r.col_absolute && r.row_absolute);
        assert_eq!(r.to_string(), "$C$7");

        let r = A1Ref::parse("C$7").unwrap();
        assert!(!r.col_absolute && r.row_absolute);
        assert_eq!(CellRef::from_str("$C$7"), Some(CellRef::new(2, 6)));
    }

    #[test]
    fn test_ref_part_parse() {
        assert_eq!(
            RefPart::parse("$B"),
            Some(RefPart::Column {
                col: 1,
                absolute: true
            })
        );
        assert_eq!(
            RefPart::parse("12"),
            Some(RefPart::Row {
                row: 11,
                absolute: false
            })
        );
        assert_eq!(RefPart::parse("0"), None);
        assert_eq!(RefPart::parse("My_Name"), None);
        assert_eq!(RefPart::parse("$B$2").unwrap().to_string(), "$B$2");
    }
}
