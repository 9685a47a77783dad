use crate::parser::lexer::Lexer;
use crate::parser::lexer::token::Item;
use crate::runtime::error::SyntaxError;

/// What the compiler pulls tokens from.
pub trait TokenSource {
    fn next_item(&mut self) -> Result<Item, SyntaxError>;

    /// Push the most recently returned item back. Only one level of
    /// pushback is supported.
    fn backup(&mut self);

    /// Item the next call to `next_item` will return, without consuming it
    fn peek_item(&mut self) -> Result<Item, SyntaxError> {
        let item = self.next_item()?;
        self.backup();
        Ok(item)
    }
}

pub struct TokenStream<'src> {
    lexer: Lexer<'src>,
    last: Option<Item>,
    pushed_back: bool,
}

impl<'src> TokenStream<'src> {
    pub fn new(source: &'src str, filename: &str) -> Self {
        Self {
            lexer: Lexer::new(source, filename),
            last: None,
            pushed_back: false,
        }
    }
}

impl TokenSource for TokenStream<'_> {
    fn next_item(&mut self) -> Result<Item, SyntaxError> {
        if self.pushed_back {
            self.pushed_back = false;
            if let Some(item) = &self.last {
                return Ok(item.clone());
            }
        }
        let item = self.lexer.next_item()?;
        self.last = Some(item.clone());
        Ok(item)
    }

    fn backup(&mut self) {
        debug_assert!(!self.pushed_back, "backup called twice in a row");
        self.pushed_back = self.last.is_some();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::token::TokenKind;

    #[test]
    fn test_backup_replays_last_item() {
        let mut stream = TokenStream::new("<?php echo $a;", "-");
        let first = stream.next_item().unwrap();
        assert_eq!(first.kind, TokenKind::Echo);
        stream.backup();
        assert_eq!(stream.next_item().unwrap(), first);
        assert_eq!(stream.next_item().unwrap().kind, TokenKind::Variable);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut stream = TokenStream::new("<?php 1 2", "-");
        assert_eq!(stream.peek_item().unwrap().literal, "1");
        assert_eq!(stream.next_item().unwrap().literal, "1");
        assert_eq!(stream.next_item().unwrap().literal, "2");
        assert!(stream.next_item().unwrap().is_eof());
    }
}
