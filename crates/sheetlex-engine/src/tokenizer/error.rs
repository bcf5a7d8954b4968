//! Tokenizer error type.

use thiserror::Error;

/// What went wrong while tokenizing.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    #[error("reached end of formula while parsing string")]
    UnterminatedString,

    #[error("reached end of formula while parsing link")]
    UnterminatedLink,

    #[error("encountered unmatched '['")]
    UnmatchedBracket,

    #[error("invalid error code")]
    InvalidErrorCode,

    #[error("mismatched ( and {{ pair")]
    MismatchedPair,

    #[error("unexpected character {0:?}")]
    UnexpectedCharacter(char),

    #[error("closing {0:?} has no matching opener")]
    UnmatchedCloser(char),

    #[error("unclosed subexpression {0:?}")]
    UnclosedSubexpression(String),

    #[error("subexpressions nested deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error("{0:?} does not end with a subexpression bracket")]
    InvalidSubexpression(String),

    #[error("{0:?} is not a subexpression opener")]
    NotAnOpener(String),

    #[error("{0:?} is not a separator")]
    InvalidSeparator(String),
}

/// The single error raised by the tokenizer.
///
/// Carries the formula and the byte offset of the failure when the error
/// came out of a scan; constructor failures outside a scan carry neither.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
#[error("{kind}{}", location(.offset, .formula))]
pub struct TokenizerError {
    pub kind: ErrorKind,
    pub offset: Option<usize>,
    pub formula: String,
}

impl TokenizerError {
    pub fn new(kind: ErrorKind, offset: usize, formula: &str) -> Self {
        TokenizerError {
            kind,
            offset: Some(offset),
            formula: formula.to_string(),
        }
    }

    /// An error not tied to a formula (token constructor preconditions).
    pub fn detached(kind: ErrorKind) -> Self {
        TokenizerError {
            kind,
            offset: None,
            formula: String::new(),
        }
    }

    /// Attach scan context to an error raised by a token constructor.
    pub(crate) fn located(mut self, offset: usize, formula: &str) -> Self {
        self.offset = Some(offset);
        self.formula = formula.to_string();
        self
    }
}

fn location(offset: &Option<usize>, formula: &str) -> String {
    match offset {
        Some(offset) => format!(" at position {} in '{}'", offset, formula),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, TokenizerError>;
