//! Error types for Sheetlex core.

use thiserror::Error;

use sheetlex_engine::engine::CellRef;
use sheetlex_engine::tokenizer::TokenizerError;

/// Errors that can occur while editing, loading or saving a sheet
#[derive(Error, Debug)]
pub enum SheetlexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Circular dependency detected: {}", format_path(.0))]
    CircularDependency(Vec<CellRef>),

    #[error("No file path set")]
    NoFilePath,

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),
}

fn format_path(path: &[CellRef]) -> String {
    path.iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub type Result<T> = std::result::Result<T, SheetlexError>;
