#![allow(clippy::module_inception)]

use std::rc::Rc;

pub mod ast;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;

pub use parser::parser::{parse, FuncMap, Mode, Tree, TreeSet};

/// Byte offset into the template source.
pub type Pos = usize;

/// A byte offset paired with the name of the tree that owns it.
///
/// Nodes carry one of these as their back reference: the name resolves to
/// the owning `Tree` inside a `TreeSet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position(pub Pos, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

/// Finds the line containing `position`.
///
/// Returns the 1-based line number, the line text and the offset of
/// `position` within that line.
pub fn get_line_at_position(content: &str, position: Pos) -> Option<(usize, String, usize)> {
    if position > content.len() {
        return None;
    }

    let mut start = 0;
    let mut line_number = 1;

    for line in content.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&position) {
            return Some((line_number, line.to_string(), position - start));
        }

        start = end;
        line_number += 1;
    }

    // Position sits right at the end of the input.
    let last = content.rsplit('\n').next().unwrap_or("");
    let line_number = if content.ends_with('\n') {
        line_number
    } else {
        line_number - 1
    };
    Some((line_number.max(1), last.to_string(), last.len()))
}
