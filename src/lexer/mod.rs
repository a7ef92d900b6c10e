//! Lexical analysis for templates.
//!
//! This module contains the lexer that turns template source into a
//! stream of tokens, one token per call. It handles:
//!
//! - Text outside of actions and the `{{ }}` delimiters themselves
//! - Trim markers (`{{- ` and ` -}}`) that eat surrounding whitespace
//! - Comments, strings, raw strings, character constants and numbers
//! - Keywords, identifiers, fields and variables inside actions
//! - Lex errors, reported as an `Error` token rather than a Rust error

pub mod lexer;
pub mod literals;
pub mod tokens;
