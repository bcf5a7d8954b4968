//! Token model for tokenized formulas.
//!
//! A [`Token`] pairs the exact text consumed from the formula with a
//! [`TokenKind`]. The kind is a tagged union: subtypes only exist on the
//! major types that allow them, so an `OPERAND` can never carry `OPEN` and a
//! `SEP` can never carry `NUMBER`.
//!
//! [`TokenType`] and [`TokenSubtype`] are the flat views downstream code
//! switches on. Their `Display` strings are stable.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

use super::error::{ErrorKind, TokenizerError};

/// Operand flavours.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum OperandKind {
    Text,
    Number,
    Logical,
    Error,
    Range,
}

/// Whether a subexpression token opens or closes it.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Boundary {
    Open,
    Close,
}

/// Separator flavours: `,` between arguments, `;` between array rows.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum SepKind {
    Arg,
    Row,
}

/// Major type plus the subtype legal for it.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum TokenKind {
    Literal,
    Operand(OperandKind),
    Func(Boundary),
    Array(Boundary),
    Paren(Boundary),
    Sep(SepKind),
    OperatorPrefix,
    OperatorInfix,
    OperatorPostfix,
    Whitespace,
}

/// Flat major type of a token.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum TokenType {
    Literal,
    Operand,
    Func,
    Array,
    Paren,
    Sep,
    OperatorPrefix,
    OperatorInfix,
    OperatorPostfix,
    Whitespace,
}

/// Flat subtype of a token.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum TokenSubtype {
    Text,
    Number,
    Logical,
    Error,
    Range,
    Open,
    Close,
    Arg,
    Row,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Literal => "LITERAL",
            TokenType::Operand => "OPERAND",
            TokenType::Func => "FUNC",
            TokenType::Array => "ARRAY",
            TokenType::Paren => "PAREN",
            TokenType::Sep => "SEP",
            TokenType::OperatorPrefix => "OPERATOR_PREFIX",
            TokenType::OperatorInfix => "OPERATOR_INFIX",
            TokenType::OperatorPostfix => "OPERATOR_POSTFIX",
            TokenType::Whitespace => "WHITESPACE",
        }
    }
}

impl TokenSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSubtype::Text => "TEXT",
            TokenSubtype::Number => "NUMBER",
            TokenSubtype::Logical => "LOGICAL",
            TokenSubtype::Error => "ERROR",
            TokenSubtype::Range => "RANGE",
            TokenSubtype::Open => "OPEN",
            TokenSubtype::Close => "CLOSE",
            TokenSubtype::Arg => "ARG",
            TokenSubtype::Row => "ROW",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TokenSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TokenKind {
    pub fn token_type(&self) -> TokenType {
        match self {
            TokenKind::Literal => TokenType::Literal,
            TokenKind::Operand(_) => TokenType::Operand,
            TokenKind::Func(_) => TokenType::Func,
            TokenKind::Array(_) => TokenType::Array,
            TokenKind::Paren(_) => TokenType::Paren,
            TokenKind::Sep(_) => TokenType::Sep,
            TokenKind::OperatorPrefix => TokenType::OperatorPrefix,
            TokenKind::OperatorInfix => TokenType::OperatorInfix,
            TokenKind::OperatorPostfix => TokenType::OperatorPostfix,
            TokenKind::Whitespace => TokenType::Whitespace,
        }
    }

    pub fn subtype(&self) -> Option<TokenSubtype> {
        match self {
            TokenKind::Operand(kind) => Some(match kind {
                OperandKind::Text => TokenSubtype::Text,
                OperandKind::Number => TokenSubtype::Number,
                OperandKind::Logical => TokenSubtype::Logical,
                OperandKind::Error => TokenSubtype::Error,
                OperandKind::Range => TokenSubtype::Range,
            }),
            TokenKind::Func(b) | TokenKind::Array(b) | TokenKind::Paren(b) => Some(match b {
                Boundary::Open => TokenSubtype::Open,
                Boundary::Close => TokenSubtype::Close,
            }),
            TokenKind::Sep(SepKind::Arg) => Some(TokenSubtype::Arg),
            TokenKind::Sep(SepKind::Row) => Some(TokenSubtype::Row),
            _ => None,
        }
    }

    /// The boundary of a FUNC/ARRAY/PAREN token, `None` for anything else.
    pub fn boundary(&self) -> Option<Boundary> {
        match self {
            TokenKind::Func(b) | TokenKind::Array(b) | TokenKind::Paren(b) => Some(*b),
            _ => None,
        }
    }
}

/// One classified lexical unit of a formula.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Token {
    value: String,
    kind: TokenKind,
}

impl Token {
    pub fn new(value: impl Into<String>, kind: TokenKind) -> Token {
        Token {
            value: value.into(),
            kind,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn token_type(&self) -> TokenType {
        self.kind.token_type()
    }

    pub fn subtype(&self) -> Option<TokenSubtype> {
        self.kind.subtype()
    }

    pub fn is_open(&self) -> bool {
        self.kind.boundary() == Some(Boundary::Open)
    }

    pub fn is_close(&self) -> bool {
        self.kind.boundary() == Some(Boundary::Close)
    }

    /// Build an operand, inferring its subtype from the text.
    pub fn make_operand(value: impl Into<String>) -> Token {
        let value = value.into();
        let kind = if value.starts_with('"') {
            OperandKind::Text
        } else if value.starts_with('#') {
            OperandKind::Error
        } else if value == "TRUE" || value == "FALSE" {
            OperandKind::Logical
        } else if value.parse::<f64>().is_ok() {
            OperandKind::Number
        } else {
            OperandKind::Range
        };
        Token::new(value, TokenKind::Operand(kind))
    }

    /// Build a subexpression token from text ending in one of `{ } ( )`.
    ///
    /// With `is_func` the token is a FUNC; otherwise the bracket decides
    /// between ARRAY and PAREN.
    pub fn make_subexp(value: impl Into<String>, is_func: bool) -> Result<Token, TokenizerError> {
        let value = value.into();
        let (boundary, is_brace) = match value.chars().last() {
            Some('{') => (Boundary::Open, true),
            Some('}') => (Boundary::Close, true),
            Some('(') => (Boundary::Open, false),
            Some(')') => (Boundary::Close, false),
            _ => {
                return Err(TokenizerError::detached(ErrorKind::InvalidSubexpression(
                    value,
                )));
            }
        };
        let kind = if is_func {
            TokenKind::Func(boundary)
        } else if is_brace {
            TokenKind::Array(boundary)
        } else {
            TokenKind::Paren(boundary)
        };
        Ok(Token::new(value, kind))
    }

    /// The closing token that matches this opener.
    pub fn get_closer(&self) -> Result<Token, TokenizerError> {
        match self.kind {
            TokenKind::Func(Boundary::Open) => Ok(Token::new(")", TokenKind::Func(Boundary::Close))),
            TokenKind::Paren(Boundary::Open) => {
                Ok(Token::new(")", TokenKind::Paren(Boundary::Close)))
            }
            TokenKind::Array(Boundary::Open) => {
                Ok(Token::new("}", TokenKind::Array(Boundary::Close)))
            }
            _ => Err(TokenizerError::detached(ErrorKind::NotAnOpener(
                self.value.clone(),
            ))),
        }
    }

    /// Build a separator: `,` is ARG, `;` is ROW.
    pub fn make_separator(value: &str) -> Result<Token, TokenizerError> {
        match value {
            "," => Ok(Token::new(",", TokenKind::Sep(SepKind::Arg))),
            ";" => Ok(Token::new(";", TokenKind::Sep(SepKind::Row))),
            other => Err(TokenizerError::detached(ErrorKind::InvalidSeparator(
                other.to_string(),
            ))),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subtype() {
            Some(subtype) => write!(f, "{}/{} {:?}", self.token_type(), subtype, self.value),
            None => write!(f, "{} {:?}", self.token_type(), self.value),
        }
    }
}

impl Serialize for Token {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Token", 3)?;
        state.serialize_field("value", &self.value)?;
        state.serialize_field("type", self.token_type().as_str())?;
        state.serialize_field("subtype", &self.subtype().map(|s| s.as_str()))?;
        state.end()
    }
}
