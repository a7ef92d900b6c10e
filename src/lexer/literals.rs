//! Quoting helpers for template literals.
//!
//! Interpreted strings and character constants follow the usual escape
//! rules (`\n`, `\xHH`, `\uHHHH`, octal, ...). Raw strings are taken
//! verbatim minus carriage returns.

const SYNTAX: &str = "invalid syntax";

/// Result of decoding one (possibly escaped) character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    Char(char),
    /// `\xHH` or octal escape inside a string: a raw byte, not a code point.
    Byte(u8),
}

/// Unicode format characters (category Cf), which print as nothing.
const FORMAT_RANGES: &[(u32, u32)] = &[
    (0x00AD, 0x00AD),
    (0x0600, 0x0605),
    (0x061C, 0x061C),
    (0x06DD, 0x06DD),
    (0x070F, 0x070F),
    (0x0890, 0x0891),
    (0x08E2, 0x08E2),
    (0x180E, 0x180E),
    (0x200B, 0x200F),
    (0x202A, 0x202E),
    (0x2060, 0x2064),
    (0x2066, 0x206F),
    (0xFEFF, 0xFEFF),
    (0xFFF9, 0xFFFB),
    (0x110BD, 0x110BD),
    (0x110CD, 0x110CD),
    (0x13430, 0x1343F),
    (0x1BCA0, 0x1BCA3),
    (0x1D173, 0x1D17A),
    (0xE0001, 0xE0001),
    (0xE0020, 0xE007F),
];

fn is_format(c: char) -> bool {
    let c = c as u32;
    FORMAT_RANGES.iter().any(|&(lo, hi)| (lo..=hi).contains(&c))
}

fn is_private_use(c: char) -> bool {
    matches!(c as u32, 0xE000..=0xF8FF | 0xF0000..=0xFFFFD | 0x100000..=0x10FFFD)
}

fn is_print(c: char) -> bool {
    c == ' ' || !(c.is_control() || c.is_whitespace() || is_format(c) || is_private_use(c))
}

/// Wraps `s` in double quotes, escaping anything that is not printable.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            _ if is_print(c) => out.push(c),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{b}' => out.push_str("\\v"),
            _ if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            _ if (c as u32) < 0x10000 => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push_str(&format!("\\U{:08x}", c as u32)),
        }
    }
    out.push('"');
    out
}

/// Formats a rune for diagnostics as `U+0041 'A'`, omitting the quoted
/// form when the rune is not printable.
pub fn format_rune(c: char) -> String {
    if is_print(c) {
        format!("U+{:04X} '{}'", c as u32, c)
    } else {
        format!("U+{:04X}", c as u32)
    }
}

fn hex_value(c: u8) -> Option<u32> {
    (c as char).to_digit(16)
}

/// Decodes the first character of `s`, which sits inside a literal
/// delimited by `quote`. Returns the decoded value and the unread tail.
pub fn unquote_char(s: &str, quote: char) -> Result<(Decoded, &str), String> {
    let mut chars = s.chars();
    let c = chars.next().ok_or_else(|| SYNTAX.to_string())?;
    if c == quote && (quote == '\'' || quote == '"') {
        return Err(SYNTAX.to_string());
    }
    if c != '\\' {
        return Ok((Decoded::Char(c), chars.as_str()));
    }

    let escape = chars.next().ok_or_else(|| SYNTAX.to_string())?;
    let rest = chars.as_str();

    let simple = match escape {
        'a' => Some('\u{7}'),
        'b' => Some('\u{8}'),
        'f' => Some('\u{c}'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\u{b}'),
        '\\' => Some('\\'),
        '\'' | '"' => {
            if escape != quote {
                return Err(SYNTAX.to_string());
            }
            Some(escape)
        }
        _ => None,
    };
    if let Some(c) = simple {
        return Ok((Decoded::Char(c), rest));
    }

    match escape {
        'x' | 'u' | 'U' => {
            let n = match escape {
                'x' => 2,
                'u' => 4,
                _ => 8,
            };
            let digits = rest.as_bytes();
            if digits.len() < n {
                return Err(SYNTAX.to_string());
            }
            let mut value: u32 = 0;
            for &d in &digits[..n] {
                let v = hex_value(d).ok_or_else(|| SYNTAX.to_string())?;
                value = (value << 4) | v;
            }
            // The first n bytes are ASCII hex digits, so this is a char boundary.
            let tail = &rest[n..];
            if escape == 'x' {
                if quote == '\'' {
                    let c = char::from_u32(value).ok_or_else(|| SYNTAX.to_string())?;
                    return Ok((Decoded::Char(c), tail));
                }
                return Ok((Decoded::Byte(value as u8), tail));
            }
            let c = char::from_u32(value).ok_or_else(|| SYNTAX.to_string())?;
            Ok((Decoded::Char(c), tail))
        }
        '0'..='7' => {
            let digits = rest.as_bytes();
            if digits.len() < 2 {
                return Err(SYNTAX.to_string());
            }
            let mut value = escape as u32 - '0' as u32;
            for &d in &digits[..2] {
                if !(b'0'..=b'7').contains(&d) {
                    return Err(SYNTAX.to_string());
                }
                value = (value << 3) | (d - b'0') as u32;
            }
            if value > 255 {
                return Err(SYNTAX.to_string());
            }
            let tail = &rest[2..];
            if quote == '\'' {
                return Ok((Decoded::Char(value as u8 as char), tail));
            }
            Ok((Decoded::Byte(value as u8), tail))
        }
        _ => Err(SYNTAX.to_string()),
    }
}

/// Interprets a quoted literal: `"..."`, `` `...` `` or `'x'`.
pub fn unquote(s: &str) -> Result<String, String> {
    let bytes = s.as_bytes();
    if bytes.len() < 2 {
        return Err(SYNTAX.to_string());
    }
    let quote = bytes[0];
    if quote != bytes[bytes.len() - 1] {
        return Err(SYNTAX.to_string());
    }
    let body = &s[1..s.len() - 1];

    match quote {
        b'`' => {
            if body.contains('`') {
                return Err(SYNTAX.to_string());
            }
            Ok(body.replace('\r', ""))
        }
        b'"' | b'\'' => {
            if body.contains('\n') {
                return Err(SYNTAX.to_string());
            }
            let quote = quote as char;
            let mut buf: Vec<u8> = Vec::with_capacity(body.len());
            let mut rest = body;
            let mut count = 0;
            while !rest.is_empty() {
                let (decoded, tail) = unquote_char(rest, quote)?;
                match decoded {
                    Decoded::Char(c) => {
                        let mut tmp = [0u8; 4];
                        buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
                    }
                    Decoded::Byte(b) => buf.push(b),
                }
                rest = tail;
                count += 1;
            }
            if quote == '\'' && count != 1 {
                return Err(SYNTAX.to_string());
            }
            // Byte escapes must still spell out UTF-8.
            String::from_utf8(buf).map_err(|_| SYNTAX.to_string())
        }
        _ => Err(SYNTAX.to_string()),
    }
}
