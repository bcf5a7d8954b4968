//! Excel formula tokenizer.
//!
//! Turns A1-notation formula text into a flat sequence of typed [`Token`]s
//! and back again:
//!
//! - [`tokenize`] / [`tokenize_with`] - formula text to tokens
//! - [`render`] - tokens back to formula text
//! - [`infers_infix`] / [`comma_role`] - the two context-sensitive decisions
//!
//! ```ignore
//! let tokens = tokenize("=SUM(A1:A2,B1)")?;
//! assert_eq!(tokens[0].value(), "SUM(");
//! assert_eq!(render(&tokens), "=SUM(A1:A2,B1)");
//! ```

mod error;
mod scan;
mod stack;
mod token;

pub use error::{ErrorKind, Result, TokenizerError};
pub use scan::{
    CommaRole, Tokenizer, TokenizerOptions, comma_role, infers_infix, render, tokenize,
    tokenize_with,
};
pub use stack::{DEFAULT_MAX_DEPTH, OpenerStack};
pub use token::{Boundary, OperandKind, SepKind, Token, TokenKind, TokenSubtype, TokenType};
