use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Pos;

use super::literals::quote;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert(".", TokenKind::Dot);
        map.insert("block", TokenKind::Block);
        map.insert("break", TokenKind::Break);
        map.insert("continue", TokenKind::Continue);
        map.insert("define", TokenKind::Define);
        map.insert("else", TokenKind::Else);
        map.insert("end", TokenKind::End);
        map.insert("if", TokenKind::If);
        map.insert("range", TokenKind::Range);
        map.insert("nil", TokenKind::Nil);
        map.insert("template", TokenKind::Template);
        map.insert("with", TokenKind::With);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub enum TokenKind {
    Error,
    Bool,
    Char,         // printable ASCII character; grab bag for comma etc.
    CharConstant, // 'a'
    Comment,
    Complex,  // 1+2i
    Assign,   // =
    Declare,  // :=
    #[default]
    EOF,
    Field,      // .Field
    Identifier, // function name
    LeftDelim,
    LeftParen,
    Number,
    Pipe,
    RawString,
    RightDelim,
    RightParen,
    Space,
    String,
    Text,
    Variable, // $x

    // Reserved
    Block,
    Break,
    Continue,
    Dot,
    Define,
    Else,
    End,
    If,
    Nil,
    Range,
    Template,
    With,
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Block
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Dot
                | TokenKind::Define
                | TokenKind::Else
                | TokenKind::End
                | TokenKind::If
                | TokenKind::Nil
                | TokenKind::Range
                | TokenKind::Template
                | TokenKind::With
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
    pub value: String,
    pub line: usize,
}

/// The form used in diagnostics: `EOF`, the raw message for errors,
/// `<kw>` for keywords and a quoted value for everything else.
impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::EOF => write!(f, "EOF"),
            TokenKind::Error => write!(f, "{}", self.value),
            kind if kind.is_keyword() => write!(f, "<{}>", self.value),
            _ if self.value.chars().count() > 10 => {
                let head: String = self.value.chars().take(10).collect();
                write!(f, "{}...", quote(&head))
            }
            _ => write!(f, "{}", quote(&self.value)),
        }
    }
}

impl Token {
    pub fn is_one_of_many(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.kind)
    }
}
