//! The scanning engine.
//!
//! A [`Tokenizer`] walks the formula left to right and dispatches on the
//! current character to a consumer. Consumers may look ahead as far as they
//! like in the remaining text, but they only report how many bytes they
//! consumed; the scan loop alone moves the cursor.
//!
//! Characters that no consumer claims collect in a pending buffer that is
//! flushed into an operand whenever a token ender shows up.

use regex::Regex;
use std::sync::OnceLock;

use super::error::{ErrorKind, Result, TokenizerError};
use super::stack::{DEFAULT_MAX_DEPTH, OpenerStack};
use super::token::{Token, TokenKind};

/// Error literals, matched by prefix in this order.
const ERROR_CODES: [&str; 7] = [
    "#NULL!", "#DIV/0!", "#VALUE!", "#REF!", "#NAME?", "#NUM!", "#N/A",
];

/// Each of these ends the operand being collected in the pending buffer.
const TOKEN_ENDERS: &str = ",;}) +-*/^&=><%";

/// Knobs fixed for the lifetime of one scan.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TokenizerOptions {
    /// Emit a WHITESPACE token for every run of spaces.
    pub preserve_whitespace: bool,
    /// Maximum subexpression nesting depth.
    pub max_depth: usize,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        TokenizerOptions {
            preserve_whitespace: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// What a `,` means at the current nesting level.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommaRole {
    /// Range union, e.g. `(A1,B1)`.
    Operator,
    /// Argument or array-column separator.
    Separator,
}

/// Whether a `+`/`-` following `previous` is binary.
///
/// It is when something value-like precedes it: an operand, a closed
/// subexpression, or a postfix operator. Otherwise it is a sign.
pub fn infers_infix(previous: Option<&Token>) -> bool {
    match previous {
        Some(token) => {
            token.is_close()
                || matches!(
                    token.kind(),
                    TokenKind::OperatorPostfix | TokenKind::Operand(_)
                )
        }
        None => false,
    }
}

/// Role of a `,` given the innermost unmatched opener.
pub fn comma_role(top: Option<&Token>) -> CommaRole {
    match top.map(Token::kind) {
        None | Some(TokenKind::Paren(_)) => CommaRole::Operator,
        Some(_) => CommaRole::Separator,
    }
}

fn scientific_notation_re() -> &'static Regex {
    static SN_RE: OnceLock<Regex> = OnceLock::new();
    SN_RE.get_or_init(|| {
        Regex::new(r"^[1-9](\.[0-9]+)?E$").expect("scientific notation regex must compile")
    })
}

/// Length of the quoted run at the start of `text`, delimiters included.
/// A doubled delimiter is an escaped delimiter and does not end the run.
fn quoted_len(text: &str, delim: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == delim {
            if bytes.get(i + 1) == Some(&delim) {
                i += 2;
                continue;
            }
            return Some(i + 1);
        }
        i += 1;
    }
    None
}

/// Scanning state for one formula.
///
/// Built for a single formula and consumed by [`Tokenizer::parse`], so a
/// tokenizer can never be run twice.
pub struct Tokenizer<'a> {
    formula: &'a str,
    offset: usize,
    tokens: Vec<Token>,
    stack: OpenerStack,
    pending: String,
    preserve_whitespace: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(formula: &'a str, options: TokenizerOptions) -> Self {
        Tokenizer {
            formula,
            offset: 0,
            tokens: Vec::new(),
            stack: OpenerStack::new(options.max_depth),
            pending: String::new(),
            preserve_whitespace: options.preserve_whitespace,
        }
    }

    /// Run the scan to completion and hand back the tokens.
    pub fn parse(mut self) -> Result<Vec<Token>> {
        match self.run() {
            Ok(()) => Ok(self.tokens),
            Err(err) => {
                tracing::debug!(%err, "formula rejected");
                Err(err)
            }
        }
    }

    fn run(&mut self) -> Result<()> {
        let formula = self.formula;
        if formula.is_empty() {
            return Ok(());
        }
        if !formula.starts_with('=') {
            self.tokens.push(Token::new(formula, TokenKind::Literal));
            return Ok(());
        }

        self.offset = 1;
        while self.offset < formula.len() {
            if self.check_scientific_notation() {
                continue;
            }
            let rest = &formula[self.offset..];
            let Some(ch) = rest.chars().next() else {
                break;
            };
            if TOKEN_ENDERS.contains(ch) {
                self.save_token();
            }
            let consumed = match ch {
                '"' | '\'' => self.parse_string(rest)?,
                '[' => self.parse_brackets(rest)?,
                '#' => self.parse_error(rest)?,
                ' ' => self.parse_whitespace(rest),
                '+' | '-' | '*' | '/' | '^' | '&' | '=' | '>' | '<' | '%' => {
                    self.parse_operator(rest)
                }
                '{' | '(' => self.parse_opener(ch)?,
                ')' | '}' => self.parse_closer(ch)?,
                ';' | ',' => self.parse_separator(ch)?,
                _ => {
                    self.pending.push(ch);
                    ch.len_utf8()
                }
            };
            self.offset += consumed;
        }
        self.save_token();

        if let Some(open) = self.stack.top() {
            return Err(self.error_at(
                ErrorKind::UnclosedSubexpression(open.value().to_string()),
                formula.len(),
            ));
        }
        Ok(())
    }

    /// `"`-delimited strings become TEXT operands; `'`-delimited links join
    /// the pending buffer since a reference usually follows (`'My Sheet'!A1`).
    fn parse_string(&mut self, rest: &str) -> Result<usize> {
        self.assert_empty_pending(rest)?;
        let delim = rest.as_bytes()[0];
        let Some(len) = quoted_len(rest, delim) else {
            let kind = if delim == b'"' {
                ErrorKind::UnterminatedString
            } else {
                ErrorKind::UnterminatedLink
            };
            return Err(self.error_at(kind, self.offset));
        };
        let matched = &rest[..len];
        if delim == b'"' {
            self.tokens.push(Token::make_operand(matched));
        } else {
            self.pending.push_str(matched);
        }
        Ok(len)
    }

    /// Structured and external references: `[...]` is kept verbatim in the
    /// pending buffer.
    fn parse_brackets(&mut self, rest: &str) -> Result<usize> {
        let Some(close) = rest.find(']') else {
            return Err(self.error_at(ErrorKind::UnmatchedBracket, self.offset));
        };
        self.pending.push_str(&rest[..=close]);
        Ok(close + 1)
    }

    fn parse_error(&mut self, rest: &str) -> Result<usize> {
        self.assert_empty_pending(rest)?;
        for code in ERROR_CODES {
            if rest.starts_with(code) {
                self.tokens.push(Token::make_operand(code));
                return Ok(code.len());
            }
        }
        Err(self.error_at(ErrorKind::InvalidErrorCode, self.offset))
    }

    fn parse_whitespace(&mut self, rest: &str) -> usize {
        if self.preserve_whitespace {
            self.tokens.push(Token::new(" ", TokenKind::Whitespace));
        }
        rest.len() - rest.trim_start_matches(' ').len()
    }

    fn parse_operator(&mut self, rest: &str) -> usize {
        if let Some(pair) = rest.get(..2)
            && matches!(pair, ">=" | "<=" | "<>")
        {
            self.tokens.push(Token::new(pair, TokenKind::OperatorInfix));
            return 2;
        }

        let op = &rest[..1];
        let kind = match op {
            "%" => TokenKind::OperatorPostfix,
            "+" | "-" => {
                if infers_infix(self.tokens.last()) {
                    TokenKind::OperatorInfix
                } else {
                    TokenKind::OperatorPrefix
                }
            }
            _ => TokenKind::OperatorInfix,
        };
        self.tokens.push(Token::new(op, kind));
        1
    }

    fn parse_opener(&mut self, ch: char) -> Result<usize> {
        let token = if ch == '{' {
            if !self.pending.is_empty() {
                return Err(self.error_at(ErrorKind::UnexpectedCharacter(ch), self.offset));
            }
            Token::make_subexp("{", false)
        } else if !self.pending.is_empty() {
            let mut name = std::mem::take(&mut self.pending);
            name.push('(');
            Token::make_subexp(name, true)
        } else {
            Token::make_subexp("(", false)
        }
        .map_err(|err| err.located(self.offset, self.formula))?;

        if self.stack.push(token.clone()).is_err() {
            let limit = self.stack.max_depth();
            return Err(self.error_at(ErrorKind::NestingTooDeep(limit), self.offset));
        }
        self.tokens.push(token);
        Ok(1)
    }

    fn parse_closer(&mut self, ch: char) -> Result<usize> {
        let Some(opener) = self.stack.pop() else {
            return Err(self.error_at(ErrorKind::UnmatchedCloser(ch), self.offset));
        };
        let closer = opener
            .get_closer()
            .map_err(|err| err.located(self.offset, self.formula))?;
        if !closer.value().starts_with(ch) {
            return Err(self.error_at(ErrorKind::MismatchedPair, self.offset));
        }
        self.tokens.push(closer);
        Ok(1)
    }

    fn parse_separator(&mut self, ch: char) -> Result<usize> {
        let token = if ch == ';' {
            Token::make_separator(";")
        } else {
            match comma_role(self.stack.top()) {
                CommaRole::Operator => Ok(Token::new(",", TokenKind::OperatorInfix)),
                CommaRole::Separator => Token::make_separator(","),
            }
        }
        .map_err(|err| err.located(self.offset, self.formula))?;
        self.tokens.push(token);
        Ok(1)
    }

    /// A sign right after `1E`, `2.5E` and the like belongs to the exponent.
    fn check_scientific_notation(&mut self) -> bool {
        let formula = self.formula;
        let Some(ch) = formula[self.offset..].chars().next() else {
            return false;
        };
        if (ch == '+' || ch == '-')
            && !self.pending.is_empty()
            && scientific_notation_re().is_match(&self.pending)
        {
            self.pending.push(ch);
            self.offset += 1;
            return true;
        }
        false
    }

    fn assert_empty_pending(&self, rest: &str) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let ch = rest.chars().next().unwrap_or_default();
        Err(self.error_at(ErrorKind::UnexpectedCharacter(ch), self.offset))
    }

    fn save_token(&mut self) {
        if !self.pending.is_empty() {
            let value = std::mem::take(&mut self.pending);
            self.tokens.push(Token::make_operand(value));
        }
    }

    fn error_at(&self, kind: ErrorKind, offset: usize) -> TokenizerError {
        TokenizerError::new(kind, offset, self.formula)
    }
}

/// Tokenize a formula with default options.
pub fn tokenize(formula: &str) -> Result<Vec<Token>> {
    tokenize_with(formula, TokenizerOptions::default())
}

#[tracing::instrument(level = "trace", skip_all, fields(len = formula.len()))]
pub fn tokenize_with(formula: &str, options: TokenizerOptions) -> Result<Vec<Token>> {
    Tokenizer::new(formula, options).parse()
}

/// Rebuild formula text from tokens.
pub fn render(tokens: &[Token]) -> String {
    match tokens {
        [] => String::new(),
        [first, ..] if first.kind() == TokenKind::Literal => first.value().to_string(),
        _ => {
            let mut out = String::from("=");
            for token in tokens {
                out.push_str(token.value());
            }
            out
        }
    }
}
