//! Parser module for building template parse trees.
//!
//! This module turns the token stream of a `Lexer` into `Tree`s. It is a
//! recursive descent parser with one function per production and
//! handles:
//!
//! - Text, comments and actions (item lists)
//! - Control actions: if, range, with, template, block, define, break, continue
//! - Pipelines with variable declarations, commands and operands
//! - Numeric and string literals
//! - Variable scoping and function name checks
//!
//! Actions are dispatched on their leading keyword through a lookup table.

pub mod expr;
pub mod lookups;
pub mod number;
pub mod parser;
pub mod stmt;
