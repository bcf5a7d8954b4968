//! Bounded stack of unmatched subexpression openers.

use super::token::Token;

/// Default nesting limit. Excel itself stops at 64 levels of function
/// nesting; arrays and parentheses get some headroom on top.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Stack of OPEN tokens (FUNC, ARRAY, PAREN) awaiting their closer.
#[derive(Clone, Debug)]
pub struct OpenerStack {
    items: Vec<Token>,
    max_depth: usize,
}

impl OpenerStack {
    pub fn new(max_depth: usize) -> Self {
        OpenerStack {
            items: Vec::new(),
            max_depth,
        }
    }

    /// Push an opener. Returns the token back if the stack is full.
    pub fn push(&mut self, token: Token) -> Result<(), Token> {
        if self.items.len() >= self.max_depth {
            return Err(token);
        }
        self.items.push(token);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Token> {
        self.items.pop()
    }

    pub fn top(&self) -> Option<&Token> {
        self.items.last()
    }

    pub fn depth(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for OpenerStack {
    fn default() -> Self {
        OpenerStack::new(DEFAULT_MAX_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_respects_limit() {
        let mut stack = OpenerStack::new(2);
        assert!(stack.push(Token::make_subexp("(", false).unwrap()).is_ok());
        assert!(stack.push(Token::make_subexp("{", false).unwrap()).is_ok());
        let rejected = stack.push(Token::make_subexp("SUM(", true).unwrap());
        assert_eq!(rejected.unwrap_err().value(), "SUM(");
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.top().unwrap().value(), "{");
    }

    #[test]
    fn test_pop_empty() {
        let mut stack = OpenerStack::default();
        assert!(stack.pop().is_none());
        assert!(stack.is_empty());
    }
}
