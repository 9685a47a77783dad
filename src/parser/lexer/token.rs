use crate::parser::span::Loc;
use crate::runtime::error::SyntaxError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    // Keywords
    If,
    ElseIf,
    Else,
    EndIf,
    Echo,
    Return,

    Variable,
    Identifier,
    /// Integer literal
    LNumber,
    /// Float literal
    DNumber,
    /// Quoted string, raw text including the quotes
    ConstantString,
    /// Single ASCII punctuation character
    Single,
    Eof,
}

impl TokenKind {
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::If
                | TokenKind::ElseIf
                | TokenKind::Else
                | TokenKind::EndIf
                | TokenKind::Echo
                | TokenKind::Return
        )
    }
}

/// Keywords are case-insensitive; `text` must already be lowercased.
pub(crate) fn keyword_lookup(text: &str) -> TokenKind {
    match text {
        "if" => TokenKind::If,
        "elseif" => TokenKind::ElseIf,
        "else" => TokenKind::Else,
        "endif" => TokenKind::EndIf,
        "echo" => TokenKind::Echo,
        "return" => TokenKind::Return,
        _ => TokenKind::Identifier,
    }
}

/// One token as handed to the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub kind: TokenKind,
    pub literal: String,
    pub loc: Loc,
}

impl Item {
    pub fn new(kind: TokenKind, literal: impl Into<String>, loc: Loc) -> Self {
        Self {
            kind,
            literal: literal.into(),
            loc,
        }
    }

    pub fn is_single(&self, c: u8) -> bool {
        self.kind == TokenKind::Single && self.literal.as_bytes() == [c]
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// Token description used in syntax errors
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::Variable => format!("variable \"{}\"", self.literal),
            TokenKind::Identifier => format!("identifier \"{}\"", self.literal),
            TokenKind::LNumber => format!("integer \"{}\"", self.literal),
            TokenKind::DNumber => format!("floating-point number \"{}\"", self.literal),
            TokenKind::ConstantString => format!("string content {}", self.literal),
            TokenKind::Single => format!("token \"{}\"", self.literal),
            _ => format!("token \"{}\"", self.literal),
        }
    }

    pub fn unexpected(&self) -> SyntaxError {
        SyntaxError {
            token: self.describe(),
            loc: self.loc.clone(),
        }
    }
}
