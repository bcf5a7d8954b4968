//! CSV import

use super::read_sheet_file;
use crate::error::Result;
use sheetlex_engine::engine::{Cell, CellRef};
use sheetlex_engine::tokenizer::TokenizerOptions;
use std::path::Path;

/// Parse a CSV file into cells, starting at the given offset
pub fn parse_csv(
    path: &Path,
    start_col: usize,
    start_row: usize,
    options: TokenizerOptions,
) -> Result<Vec<(CellRef, Cell)>> {
    let content = read_sheet_file(path)?;
    Ok(parse_csv_content(&content, start_col, start_row, options))
}

pub fn parse_csv_content(
    content: &str,
    start_col: usize,
    start_row: usize,
    options: TokenizerOptions,
) -> Vec<(CellRef, Cell)> {
    let mut cells = Vec::new();
    for (row_idx, record) in parse_csv_records(content).into_iter().enumerate() {
        for (col_idx, field) in record.into_iter().enumerate() {
            if field.is_empty() {
                continue;
            }
            let cell_ref = CellRef::new(start_col + col_idx, start_row + row_idx);
            cells.push((cell_ref, parse_csv_field(&field, options)));
        }
    }
    cells
}

/// Split CSV content into records of fields. Quoted fields may hold commas,
/// doubled quotes and line breaks; outside quotes `\n` or `\r\n` ends a record.
pub(crate) fn parse_csv_records(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c != '"' {
                current.push(c);
            } else if chars.next_if_eq(&'"').is_some() {
                current.push('"');
            } else {
                in_quotes = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                field_was_quoted = true;
            }
            ',' => {
                fields.push(finish_field(std::mem::take(&mut current), field_was_quoted));
                field_was_quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(finish_field(std::mem::take(&mut current), field_was_quoted));
                field_was_quoted = false;
                records.push(std::mem::take(&mut fields));
            }
            _ => current.push(c),
        }
    }

    // No record after a trailing newline.
    if !current.is_empty() || field_was_quoted || !fields.is_empty() {
        fields.push(finish_field(current, field_was_quoted));
        records.push(fields);
    }
    records
}

fn finish_field(field: String, quoted: bool) -> String {
    if quoted { field } else { field.trim().to_string() }
}

/// Parse a CSV field into an appropriate Cell type
/// - `=`-prefixed -> Formula (or Invalid)
/// - Valid number -> Number (unless it has leading zeros like "007")
/// - Otherwise -> Text
pub(crate) fn parse_csv_field(field: &str, options: TokenizerOptions) -> Cell {
    if field.is_empty() {
        return Cell::new_empty();
    }

    // Surrounding whitespace only survives on quoted fields; keep it as text.
    let trimmed = field.trim();
    if field != trimmed {
        return Cell::new_text(field);
    }

    if trimmed.starts_with('=') {
        return Cell::new_formula(trimmed, options);
    }

    // "007" stays text, "0" and "0.5" are numbers
    if trimmed.starts_with('0')
        && trimmed.chars().nth(1).is_some_and(|c| c.is_ascii_digit())
    {
        return Cell::new_text(trimmed);
    }

    if let Ok(n) = trimmed.parse::<f64>() {
        return Cell::new_number(n);
    }

    Cell::new_text(trimmed)
}
