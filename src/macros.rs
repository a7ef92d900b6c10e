//! Utility macros for the template parser.
//!
//! - `MK_TOKEN!` - Creates a Token instance

/// Creates a Token instance.
///
/// # Arguments
///
/// * `$kind` - The TokenKind
/// * `$pos` - Byte offset of the token in the source
/// * `$value` - The token's text
/// * `$line` - 1-based line the token starts on
///
/// # Example
///
/// ```ignore
/// let token = MK_TOKEN!(TokenKind::Number, 3, "42".to_string(), 1);
/// ```
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $pos:expr, $value:expr, $line:expr) => {
        $crate::lexer::tokens::Token {
            kind: $kind,
            pos: $pos,
            value: $value,
            line: $line,
        }
    };
}
