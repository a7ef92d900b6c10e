//! Error types for lexing and parsing templates.
//!
//! This module defines the single error type returned by the parser:
//!
//! - `ErrorImpl` variants, one per failure class, carrying the message text
//! - `Error`, which adds the template name, position and line
//! - `ErrorTip` suggestions shown by the command-line front end

pub mod errors;
