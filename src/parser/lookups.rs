use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::{ast::ast::NodeWrapper, errors::errors::Error, lexer::tokens::{Token, TokenKind}};

use super::{parser::Parser, stmt::*};

/// Parses the rest of an action whose first token is a keyword. The
/// keyword token has already been consumed and is passed along.
pub type ActionHandler = fn(&mut Parser, &Token) -> Result<NodeWrapper, Error>;

lazy_static! {
    /// Keywords that start a control action. Anything else after `{{`
    /// is a plain pipeline.
    pub static ref ACTION_LOOKUP: HashMap<TokenKind, ActionHandler> = {
        let mut map: HashMap<TokenKind, ActionHandler> = HashMap::new();
        map.insert(TokenKind::Block, parse_block_control);
        map.insert(TokenKind::Break, parse_break_control);
        map.insert(TokenKind::Continue, parse_continue_control);
        map.insert(TokenKind::Else, parse_else_control);
        map.insert(TokenKind::End, parse_end_control);
        map.insert(TokenKind::If, parse_if_control);
        map.insert(TokenKind::Range, parse_range_control);
        map.insert(TokenKind::Template, parse_template_control);
        map.insert(TokenKind::With, parse_with_control);
        map
    };
}
