//! Evaluation of numeric literals.
//!
//! A literal is checked against every numeric view it could have. Integer
//! syntax follows the usual base prefixes (`0x`, `0o`, `0b`, a bare
//! leading `0` for octal) with `_` separators between digits.

use crate::{
    ast::expressions::NumberNode,
    lexer::{
        literals::{quote, unquote_char, Decoded},
        tokens::TokenKind,
    },
    Position,
};

/// Builds a `NumberNode` from a `Number`, `Complex` or `CharConstant` token.
pub fn new_number(position: Position, text: &str, kind: TokenKind) -> Result<NumberNode, String> {
    let mut n = NumberNode {
        position,
        is_int: false,
        is_uint: false,
        is_float: false,
        is_complex: false,
        int64: 0,
        uint64: 0,
        float64: 0.0,
        complex128: (0.0, 0.0),
        text: text.to_string(),
    };

    match kind {
        TokenKind::CharConstant => {
            let mut chars = text.chars();
            let quote_char = chars.next().ok_or_else(|| String::from("invalid syntax"))?;
            let (decoded, tail) = unquote_char(chars.as_str(), quote_char)?;
            if tail != "'" {
                return Err(format!("malformed character constant: {}", text));
            }
            let rune = match decoded {
                Decoded::Char(c) => c as u32,
                Decoded::Byte(b) => b as u32,
            };
            n.int64 = rune as i64;
            n.is_int = true;
            n.uint64 = rune as u64;
            n.is_uint = true;
            n.float64 = rune as f64;
            n.is_float = true;
            return Ok(n);
        }
        TokenKind::Complex => {
            n.complex128 = parse_complex(text)
                .ok_or_else(|| format!("illegal number syntax: {}", quote(text)))?;
            n.is_complex = true;
            n.simplify_complex();
            return Ok(n);
        }
        _ => {}
    }

    // Imaginary constants can only be complex unless they are zero.
    if let Some(imaginary) = text.strip_suffix('i') {
        if let Some(f) = parse_float(imaginary) {
            n.is_complex = true;
            n.complex128 = (0.0, f);
            n.simplify_complex();
            return Ok(n);
        }
    }

    // Integer syntax first so 0x123 and friends come out exact.
    let u = parse_uint(text);
    if let Some(u) = u {
        n.is_uint = true;
        n.uint64 = u;
    }
    if let Some(i) = parse_int(text) {
        n.is_int = true;
        n.int64 = i;
        if i == 0 {
            // -0 is a uint too.
            n.is_uint = true;
            n.uint64 = u.unwrap_or(0);
        }
    }

    if n.is_int {
        n.is_float = true;
        n.float64 = n.int64 as f64;
    } else if n.is_uint {
        n.is_float = true;
        n.float64 = n.uint64 as f64;
    } else if let Some(f) = parse_float(text) {
        // Integer-looking but too big for 64 bits.
        if !text.contains(['.', 'e', 'E', 'p', 'P']) {
            return Err(format!("integer overflow: {}", quote(text)));
        }
        n.is_float = true;
        n.float64 = f;
        if let Some(i) = exact_i64(f) {
            n.is_int = true;
            n.int64 = i;
        }
        if let Some(u) = exact_u64(f) {
            n.is_uint = true;
            n.uint64 = u;
        }
    }

    if !n.is_int && !n.is_uint && !n.is_float {
        return Err(format!("illegal number syntax: {}", quote(text)));
    }
    Ok(n)
}

impl NumberNode {
    /// Fills in the real views when the imaginary part is zero.
    fn simplify_complex(&mut self) {
        let (re, im) = self.complex128;
        self.is_float = im == 0.0;
        if self.is_float {
            self.float64 = re;
            if let Some(i) = exact_i64(re) {
                self.is_int = true;
                self.int64 = i;
            }
            if let Some(u) = exact_u64(re) {
                self.is_uint = true;
                self.uint64 = u;
            }
        }
    }
}

fn exact_i64(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        return Some(f as i64);
    }
    None
}

fn exact_u64(f: f64) -> Option<u64> {
    if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 {
        return Some(f as u64);
    }
    None
}

/// Splits `1+2i` into its parts. The sign that starts the imaginary part
/// is the last one not belonging to an exponent.
fn parse_complex(text: &str) -> Option<(f64, f64)> {
    let bytes = text.as_bytes();
    let split = (1..bytes.len()).rev().find(|&i| {
        matches!(bytes[i], b'+' | b'-') && !matches!(bytes[i - 1], b'e' | b'E' | b'p' | b'P')
    })?;
    let re = parse_float(&text[..split])?;
    let im = parse_float(text[split..].strip_suffix('i')?)?;
    Some((re, im))
}

/// Unsigned integer with base prefix detection.
fn parse_uint(text: &str) -> Option<u64> {
    if text.is_empty() || !underscore_ok(text) {
        return None;
    }
    let bytes = text.as_bytes();
    let (radix, digits) = if bytes[0] == b'0' && bytes.len() >= 3 {
        match bytes[1].to_ascii_lowercase() {
            b'b' => (2, &text[2..]),
            b'o' => (8, &text[2..]),
            b'x' => (16, &text[2..]),
            _ => (8, &text[1..]),
        }
    } else if bytes[0] == b'0' {
        (8, &text[1..])
    } else {
        (10, text)
    };

    let mut value: u64 = 0;
    for c in digits.chars() {
        if c == '_' {
            continue;
        }
        let d = c.to_digit(radix)? as u64;
        value = value.checked_mul(radix as u64)?.checked_add(d)?;
    }
    Some(value)
}

/// Signed integer: optional sign, then `parse_uint` rules.
fn parse_int(text: &str) -> Option<i64> {
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'+') => (false, &text[1..]),
        Some(b'-') => (true, &text[1..]),
        _ => (false, text),
    };
    let magnitude = parse_uint(rest)?;
    if negative {
        if magnitude > 1 << 63 {
            return None;
        }
        return Some((magnitude as i64).wrapping_neg());
    }
    i64::try_from(magnitude).ok()
}

/// Decimal or hexadecimal float, with `_` separators.
fn parse_float(text: &str) -> Option<f64> {
    if !underscore_ok(text) {
        return None;
    }
    let cleaned = text.replace('_', "");
    let (negative, body) = match cleaned.as_bytes().first() {
        Some(b'+') => (false, &cleaned[1..]),
        Some(b'-') => (true, &cleaned[1..]),
        _ => (false, cleaned.as_str()),
    };
    let value = if body.len() > 2 && body[..2].eq_ignore_ascii_case("0x") {
        parse_hex_float(&body[2..])?
    } else {
        if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit() || b".eE+-".contains(&b)) {
            return None;
        }
        body.parse::<f64>().ok()?
    };
    Some(if negative { -value } else { value })
}

/// Hex mantissa with a mandatory binary exponent: `1.8p3`.
fn parse_hex_float(body: &str) -> Option<f64> {
    let p = body.find(['p', 'P'])?;
    let (mantissa, exponent) = (&body[..p], &body[p + 1..]);
    let exponent: i32 = exponent.parse().ok()?;

    let mut value = 0.0f64;
    let mut scale = 0i32;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for c in mantissa.chars() {
        if c == '.' {
            if seen_dot {
                return None;
            }
            seen_dot = true;
            continue;
        }
        let d = c.to_digit(16)?;
        seen_digit = true;
        value = value * 16.0 + d as f64;
        if seen_dot {
            scale -= 4;
        }
    }
    if !seen_digit {
        return None;
    }
    Some(value * 2f64.powi(exponent + scale))
}

/// Underscores may only sit between digits, or between a base prefix
/// and a digit.
fn underscore_ok(text: &str) -> bool {
    let mut s = text.as_bytes();
    if let Some(b'+' | b'-') = s.first() {
        s = &s[1..];
    }

    // '^' start, '0' digit or prefix, '_' underscore, '!' anything else.
    let mut saw = b'^';
    let mut hex = false;
    let mut i = 0;
    if s.len() >= 2 && s[0] == b'0' && matches!(s[1].to_ascii_lowercase(), b'b' | b'o' | b'x') {
        i = 2;
        saw = b'0';
        hex = s[1].to_ascii_lowercase() == b'x';
    }
    while i < s.len() {
        let c = s[i];
        i += 1;
        if c.is_ascii_digit() || (hex && c.is_ascii_hexdigit()) {
            saw = b'0';
            continue;
        }
        if c == b'_' {
            if saw != b'0' {
                return false;
            }
            saw = b'_';
            continue;
        }
        if saw == b'_' {
            return false;
        }
        saw = b'!';
    }
    saw != b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(text: &str) -> Result<NumberNode, String> {
        let kind = if text.starts_with('\'') {
            TokenKind::CharConstant
        } else if text.len() > 1 && text[1..].contains(['+', '-']) && text.ends_with('i') {
            TokenKind::Complex
        } else {
            TokenKind::Number
        };
        new_number(Position::null(), text, kind)
    }

    #[test]
    fn test_integers() {
        let n = number("0").unwrap();
        assert!(n.is_int && n.is_uint && n.is_float && !n.is_complex);
        assert_eq!(n.int64, 0);

        let n = number("-73").unwrap();
        assert!(n.is_int && !n.is_uint && n.is_float);
        assert_eq!(n.int64, -73);
        assert_eq!(n.float64, -73.0);

        let n = number("073").unwrap();
        assert_eq!(n.int64, 0o73);
        let n = number("0o73").unwrap();
        assert_eq!(n.int64, 0o73);
        let n = number("0x10").unwrap();
        assert_eq!(n.uint64, 16);
        let n = number("0b101").unwrap();
        assert_eq!(n.int64, 5);
        let n = number("1_000").unwrap();
        assert_eq!(n.int64, 1000);
        let n = number("-0x8000_0000_0000_0000").unwrap();
        assert_eq!(n.int64, i64::MIN);
        assert!(!n.is_uint);
    }

    #[test]
    fn test_unsigned_only() {
        let n = number("0xFFFFFFFFFFFFFFFF").unwrap();
        assert!(n.is_uint && !n.is_int && n.is_float);
        assert_eq!(n.uint64, u64::MAX);
    }

    #[test]
    fn test_floats() {
        let n = number("1.5").unwrap();
        assert!(n.is_float && !n.is_int && !n.is_uint);
        assert_eq!(n.float64, 1.5);

        let n = number("1e3").unwrap();
        assert!(n.is_float && n.is_int && n.is_uint);
        assert_eq!(n.int64, 1000);

        let n = number("-1e3").unwrap();
        assert!(n.is_int && !n.is_uint);

        let n = number("0x1.ep4").unwrap();
        assert_eq!(n.float64, 30.0);
        assert_eq!(n.int64, 30);

        let n = number(".5").unwrap();
        assert_eq!(n.float64, 0.5);
    }

    #[test]
    fn test_imaginary_and_complex() {
        let n = number("2i").unwrap();
        assert!(n.is_complex && !n.is_float);
        assert_eq!(n.complex128, (0.0, 2.0));

        let n = number("0i").unwrap();
        assert!(n.is_complex && n.is_float && n.is_int && n.is_uint);

        let n = number("1+2i").unwrap();
        assert_eq!(n.complex128, (1.0, 2.0));
        assert!(!n.is_float);

        let n = number("1.5-0i").unwrap();
        assert!(n.is_complex && n.is_float && !n.is_int);
        assert_eq!(n.float64, 1.5);
    }

    #[test]
    fn test_char_constants() {
        let n = number("'a'").unwrap();
        assert!(n.is_int && n.is_uint && n.is_float);
        assert_eq!(n.int64, 'a' as i64);

        let n = number("'\\n'").unwrap();
        assert_eq!(n.int64, 10);

        let n = number("'\\x41'").unwrap();
        assert_eq!(n.int64, 0x41);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            number("18446744073709551616").unwrap_err(),
            "integer overflow: \"18446744073709551616\""
        );
        assert_eq!(number("0x").unwrap_err(), "illegal number syntax: \"0x\"");
        assert_eq!(number("1__0").unwrap_err(), "illegal number syntax: \"1__0\"");
        assert_eq!(number("'ab'").unwrap_err(), "malformed character constant: 'ab'");
        assert_eq!(number("'\\é'").unwrap_err(), "invalid syntax");
        assert_eq!(number("'\\本'").unwrap_err(), "invalid syntax");
    }

    #[test]
    fn test_underscore_rules() {
        assert!(underscore_ok("1_000"));
        assert!(underscore_ok("0x_1f"));
        assert!(!underscore_ok("_1"));
        assert!(!underscore_ok("1_"));
        assert!(!underscore_ok("1__0"));
    }
}
