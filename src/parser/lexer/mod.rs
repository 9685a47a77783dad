pub mod token;

use crate::parser::line_index::LineIndex;
use crate::runtime::error::SyntaxError;
use memchr::{memchr, memchr2};
use token::{Item, TokenKind, keyword_lookup};

/// Pull-based tokenizer over one source buffer.
///
/// Whitespace and comments never reach the caller. After the input is
/// exhausted every call yields an `Eof` item.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    source: &'src str,
    input: &'src [u8],
    cursor: usize,
    index: LineIndex,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, filename: &str) -> Self {
        let input = source.as_bytes();
        let mut cursor = 0;
        if input.starts_with(b"#!") {
            cursor = memchr(b'\n', input).map_or(input.len(), |pos| pos + 1);
        }

        let mut lexer = Self {
            source,
            input,
            cursor,
            index: LineIndex::new(filename, input),
        };
        lexer.skip_open_tag();
        lexer
    }

    fn skip_open_tag(&mut self) {
        let start = self.cursor;
        self.skip_whitespace();
        let rest = &self.input[self.cursor..];
        if rest.len() >= 5 && rest[..5].eq_ignore_ascii_case(b"<?php") {
            self.advance_n(5);
        } else {
            self.cursor = start;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.cursor).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.input.get(self.cursor + n).copied()
    }

    fn advance(&mut self) {
        self.cursor += 1;
    }

    fn advance_n(&mut self, n: usize) {
        self.cursor += n;
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.advance();
        }
    }

    /// Skip whitespace and comments. Fails on an unterminated block comment.
    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        loop {
            self.skip_whitespace();
            match (self.peek(), self.peek_at(1)) {
                (Some(b'#'), _) | (Some(b'/'), Some(b'/')) => self.consume_single_line_comment(),
                (Some(b'/'), Some(b'*')) => self.consume_multi_line_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn consume_single_line_comment(&mut self) {
        let remaining = &self.input[self.cursor..];
        match memchr2(b'\n', b'\r', remaining) {
            Some(pos) => self.cursor += pos,
            None => self.cursor = self.input.len(),
        }
    }

    fn consume_multi_line_comment(&mut self) -> Result<(), SyntaxError> {
        let start = self.cursor;
        self.advance_n(2);
        while self.cursor < self.input.len() {
            let remaining = &self.input[self.cursor..];
            match memchr(b'*', remaining) {
                Some(pos) => {
                    self.cursor += pos;
                    self.advance(); // Consume *
                    if self.peek() == Some(b'/') {
                        self.advance();
                        return Ok(());
                    }
                }
                None => break,
            }
        }
        Err(self.error_at(start, "unterminated comment"))
    }

    fn read_identifier(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' || c >= 0x80 {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> TokenKind {
        let mut is_float = false;

        // Check for hex/binary/octal
        if self.peek() == Some(b'0') {
            let radix_digits: Option<fn(u8) -> bool> = match self.peek_at(1) {
                Some(b'x' | b'X') => Some(is_hex_digit),
                Some(b'b' | b'B') => Some(is_bin_digit),
                Some(b'o' | b'O') => Some(is_oct_digit),
                _ => None,
            };
            if let Some(is_digit) = radix_digits {
                self.advance_n(2);
                while self.peek().is_some_and(|c| is_digit(c) || c == b'_') {
                    self.advance();
                }
                return TokenKind::LNumber;
            }
        }

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == b'_' {
                self.advance();
            } else if c == b'.' {
                if is_float {
                    break; // Already found a dot
                }
                is_float = true;
                self.advance();
            } else if (c == b'e' || c == b'E')
                && match self.peek_at(1) {
                    Some(b'+' | b'-') => self.peek_at(2).is_some_and(|d| d.is_ascii_digit()),
                    Some(d) => d.is_ascii_digit(),
                    None => false,
                }
            {
                is_float = true;
                self.advance();
                if let Some(next) = self.peek()
                    && (next == b'+' || next == b'-')
                {
                    self.advance();
                }
                while self.peek().is_some_and(|d| d.is_ascii_digit()) {
                    self.advance();
                }
                break;
            } else {
                break;
            }
        }

        if is_float {
            TokenKind::DNumber
        } else {
            TokenKind::LNumber
        }
    }

    /// Consume a quoted string; the cursor sits on the opening quote.
    fn read_quoted(&mut self, quote: u8) -> Result<(), SyntaxError> {
        let start = self.cursor;
        self.advance();
        while self.cursor < self.input.len() {
            let remaining = &self.input[self.cursor..];
            match memchr2(quote, b'\\', remaining) {
                Some(pos) => {
                    self.cursor += pos;
                    let c = self.input[self.cursor];
                    self.advance();
                    if c == quote {
                        return Ok(());
                    }
                    // escaped character, whatever it is
                    if self.peek().is_some() {
                        self.advance();
                    }
                }
                None => break,
            }
        }
        Err(self.error_at(start, "end of file"))
    }

    fn error_at(&self, offset: usize, token: &str) -> SyntaxError {
        SyntaxError {
            token: token.to_string(),
            loc: self.index.loc(offset),
        }
    }

    pub fn next_item(&mut self) -> Result<Item, SyntaxError> {
        self.skip_trivia()?;
        let start = self.cursor;
        let loc = self.index.loc(start);

        let Some(c) = self.peek() else {
            return Ok(Item::new(TokenKind::Eof, "", loc));
        };

        let kind = match c {
            b'$' if self
                .peek_at(1)
                .is_some_and(|n| n.is_ascii_alphabetic() || n == b'_' || n >= 0x80) =>
            {
                self.advance();
                self.read_identifier();
                TokenKind::Variable
            }
            c if c.is_ascii_alphabetic() || c == b'_' || c >= 0x80 => {
                self.read_identifier();
                keyword_lookup(&self.source[start..self.cursor].to_ascii_lowercase())
            }
            c if c.is_ascii_digit() => self.read_number(),
            b'.' if self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => self.read_number(),
            b'\'' | b'"' => {
                self.read_quoted(c)?;
                TokenKind::ConstantString
            }
            c if c.is_ascii_punctuation() => {
                self.advance();
                TokenKind::Single
            }
            c => {
                return Err(self.error_at(start, &format!("character 0x{:02X}", c)));
            }
        };

        Ok(Item::new(kind, &self.source[start..self.cursor], loc))
    }
}

fn is_hex_digit(c: u8) -> bool {
    c.is_ascii_hexdigit()
}

fn is_bin_digit(c: u8) -> bool {
    c == b'0' || c == b'1'
}

fn is_oct_digit(c: u8) -> bool {
    (b'0'..=b'7').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, String)> {
        let mut lexer = Lexer::new(src, "-");
        let mut out = Vec::new();
        loop {
            let item = lexer.next_item().unwrap();
            if item.is_eof() {
                break;
            }
            out.push((item.kind, item.literal));
        }
        out
    }

    #[test]
    fn test_open_tag_and_keywords() {
        let tokens = kinds("<?php IF ($a) echo 'x'; ElseIf endif");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::If, "IF".into()),
                (TokenKind::Single, "(".into()),
                (TokenKind::Variable, "$a".into()),
                (TokenKind::Single, ")".into()),
                (TokenKind::Echo, "echo".into()),
                (TokenKind::ConstantString, "'x'".into()),
                (TokenKind::Single, ";".into()),
                (TokenKind::ElseIf, "ElseIf".into()),
                (TokenKind::EndIf, "endif".into()),
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = kinds("<?php // line\n# hash\n/* block\n */ return 1;");
        assert_eq!(tokens[0], (TokenKind::Return, "return".into()));
        assert_eq!(tokens[1], (TokenKind::LNumber, "1".into()));
    }

    #[test]
    fn test_numbers() {
        let tokens = kinds("1 1.5 .5 1e3 1_000 0x1F 0b101 0o17 2.5E-3");
        let expected = [
            (TokenKind::LNumber, "1"),
            (TokenKind::DNumber, "1.5"),
            (TokenKind::DNumber, ".5"),
            (TokenKind::DNumber, "1e3"),
            (TokenKind::LNumber, "1_000"),
            (TokenKind::LNumber, "0x1F"),
            (TokenKind::LNumber, "0b101"),
            (TokenKind::LNumber, "0o17"),
            (TokenKind::DNumber, "2.5E-3"),
        ];
        assert_eq!(tokens.len(), expected.len());
        for ((kind, lit), (want_kind, want_lit)) in tokens.iter().zip(expected) {
            assert_eq!(*kind, want_kind);
            assert_eq!(lit, want_lit);
        }
    }

    #[test]
    fn test_strings_keep_escapes_raw() {
        let tokens = kinds(r#""a\"b" 'c\'d'"#);
        assert_eq!(tokens[0], (TokenKind::ConstantString, r#""a\"b""#.into()));
        assert_eq!(tokens[1], (TokenKind::ConstantString, r"'c\'d'".into()));
    }

    #[test]
    fn test_locations() {
        let mut lexer = Lexer::new("<?php\n  $x\n;", "t.php");
        let var = lexer.next_item().unwrap();
        assert_eq!((var.loc.line, var.loc.column), (2, 3));
        let semi = lexer.next_item().unwrap();
        assert_eq!((semi.loc.line, semi.loc.column), (3, 1));
        assert!(lexer.next_item().unwrap().is_eof());
        assert!(lexer.next_item().unwrap().is_eof());
    }

    #[test]
    fn test_errors() {
        let err = Lexer::new("<?php 'open", "-").next_item().unwrap_err();
        assert_eq!(err.token, "end of file");
        let err = Lexer::new("<?php /* open", "-").next_item().unwrap_err();
        assert_eq!(err.token, "unterminated comment");
        let err = Lexer::new("<?php \u{1}", "-").next_item().unwrap_err();
        assert_eq!(err.token, "character 0x01");
    }

    #[test]
    fn test_lone_dollar_is_punctuation() {
        let tokens = kinds("$ $1");
        assert_eq!(tokens[0], (TokenKind::Single, "$".into()));
        assert_eq!(tokens[1], (TokenKind::Single, "$".into()));
        assert_eq!(tokens[2], (TokenKind::LNumber, "1".into()));
    }
}
