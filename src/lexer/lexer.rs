use tracing::{debug, trace};

use crate::{
    errors::errors::{Error, ErrorImpl},
    Pos, Position, MK_TOKEN,
};

use super::{
    literals::{format_rune, quote},
    tokens::{Token, TokenKind, RESERVED_LOOKUP},
};

pub const LEFT_DELIM: &str = "{{";
pub const RIGHT_DELIM: &str = "}}";

const LEFT_COMMENT: &str = "/*";
const RIGHT_COMMENT: &str = "*/";
const TRIM_MARKER: u8 = b'-';
/// A trim marker plus the whitespace that separates it from the delimiter.
const TRIM_MARKER_LEN: usize = 2;

const DECIMAL_DIGITS: &str = "0123456789_";
const HEX_DIGITS: &str = "0123456789abcdefABCDEF_";
const OCTAL_DIGITS: &str = "01234567_";
const BINARY_DIGITS: &str = "01_";

/// Knobs the parser sets on the lexer before pulling tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexOptions {
    /// Emit `Comment` tokens instead of dropping comments.
    pub emit_comment: bool,
    /// Treat `break` as a keyword rather than an identifier.
    pub break_ok: bool,
    /// Treat `continue` as a keyword rather than an identifier.
    pub continue_ok: bool,
}

impl Default for LexOptions {
    fn default() -> Self {
        LexOptions {
            emit_comment: false,
            break_ok: true,
            continue_ok: true,
        }
    }
}

/// Lexer states. Each step either moves to another state or returns
/// `None` once `item` holds a token ready for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Text,
    LeftDelim,
    Comment,
    RightDelim,
    InsideAction,
    Space,
    Identifier,
    Field,
    Variable,
    Char,
    Number,
    Quote,
    RawQuote,
}

/// Pull-based template tokenizer.
///
/// Tokens are produced one at a time by `next_token`. A malformed input
/// yields a single `Error` token, after which the input is discarded and
/// every later call returns `EOF` or the same error again.
#[derive(Debug, Clone)]
pub struct Lexer {
    name: String,
    input: String,
    left_delim: String,
    right_delim: String,
    pos: Pos,
    start: Pos,
    at_eof: bool,
    paren_depth: i32,
    line: usize,
    start_line: usize,
    item: Token,
    inside_action: bool,
    options: LexOptions,
}

impl Lexer {
    /// Creates a lexer over `input`. Empty delimiters select `{{` and `}}`.
    pub fn new(name: &str, input: &str, left_delim: &str, right_delim: &str) -> Lexer {
        let left_delim = if left_delim.is_empty() {
            LEFT_DELIM
        } else {
            left_delim
        };
        let right_delim = if right_delim.is_empty() {
            RIGHT_DELIM
        } else {
            right_delim
        };

        Lexer {
            name: name.to_string(),
            input: input.to_string(),
            left_delim: left_delim.to_string(),
            right_delim: right_delim.to_string(),
            pos: 0,
            start: 0,
            at_eof: false,
            paren_depth: 0,
            line: 1,
            start_line: 1,
            item: Token::default(),
            inside_action: false,
            options: LexOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LexOptions) -> Lexer {
        self.options = options;
        self
    }

    pub fn set_options(&mut self, options: LexOptions) {
        self.options = options;
    }

    pub fn options(&self) -> LexOptions {
        self.options
    }

    /// Returns the next token. Once the input is exhausted this keeps
    /// returning `EOF`.
    pub fn next_token(&mut self) -> Token {
        self.item = MK_TOKEN!(TokenKind::EOF, self.pos, String::from("EOF"), self.start_line);
        let mut state = if self.inside_action {
            State::InsideAction
        } else {
            State::Text
        };
        while let Some(next) = self.step(state) {
            state = next;
        }
        self.item.clone()
    }

    fn step(&mut self, state: State) -> Option<State> {
        match state {
            State::Text => self.lex_text(),
            State::LeftDelim => self.lex_left_delim(),
            State::Comment => self.lex_comment(),
            State::RightDelim => self.lex_right_delim(),
            State::InsideAction => self.lex_inside_action(),
            State::Space => self.lex_space(),
            State::Identifier => self.lex_identifier(),
            State::Field => self.lex_field_or_variable(TokenKind::Field),
            State::Variable => self.lex_variable(),
            State::Char => self.lex_char(),
            State::Number => self.lex_number(),
            State::Quote => self.lex_quote(),
            State::RawQuote => self.lex_raw_quote(),
        }
    }

    fn next(&mut self) -> Option<char> {
        match self.input[self.pos..].chars().next() {
            Some(c) => {
                self.pos += c.len_utf8();
                if c == '\n' {
                    self.line += 1;
                }
                Some(c)
            }
            None => {
                self.at_eof = true;
                None
            }
        }
    }

    fn peek(&mut self) -> Option<char> {
        let c = self.next();
        self.backup();
        c
    }

    /// Steps back one rune. Only valid once per call of `next`.
    fn backup(&mut self) {
        if self.at_eof || self.pos == 0 {
            return;
        }
        if let Some(c) = self.input[..self.pos].chars().next_back() {
            self.pos -= c.len_utf8();
            if c == '\n' {
                self.line -= 1;
            }
        }
    }

    fn this_item(&mut self, kind: TokenKind) -> Token {
        let item = MK_TOKEN!(
            kind,
            self.start,
            self.input[self.start..self.pos].to_string(),
            self.start_line
        );
        self.start = self.pos;
        self.start_line = self.line;
        item
    }

    fn emit(&mut self, kind: TokenKind) -> Option<State> {
        let item = self.this_item(kind);
        self.emit_item(item)
    }

    fn emit_item(&mut self, item: Token) -> Option<State> {
        trace!(lexer = %self.name, kind = %item.kind, pos = item.pos, "token");
        self.item = item;
        None
    }

    /// Skips the pending input. Counts the newlines it skips, so only use
    /// it for text passed over without `next`.
    fn ignore(&mut self) {
        self.line += count_newlines(&self.input[self.start..self.pos]);
        self.start = self.pos;
        self.start_line = self.line;
    }

    fn accept(&mut self, valid: &str) -> bool {
        match self.next() {
            Some(c) if valid.contains(c) => true,
            _ => {
                self.backup();
                false
            }
        }
    }

    fn accept_run(&mut self, valid: &str) {
        while let Some(c) = self.next() {
            if !valid.contains(c) {
                break;
            }
        }
        self.backup();
    }

    /// Records an error token and discards the rest of the input.
    fn errorf(&mut self, message: String) -> Option<State> {
        debug!(lexer = %self.name, line = self.start_line, %message, "lex error");
        self.item = MK_TOKEN!(TokenKind::Error, self.start, message, self.start_line);
        self.start = 0;
        self.pos = 0;
        self.input.clear();
        None
    }

    fn lex_text(&mut self) -> Option<State> {
        if let Some(x) = self.input[self.pos..].find(self.left_delim.as_str()) {
            if x > 0 {
                self.pos += x;
                // Trailing space is dropped when the delimiter carries a trim marker.
                let mut trim_length = 0;
                let delim_end = self.pos + self.left_delim.len();
                if has_left_trim_marker(&self.input[delim_end..]) {
                    trim_length = right_trim_length(&self.input[self.start..self.pos]);
                }
                self.pos -= trim_length;
                self.line += count_newlines(&self.input[self.start..self.pos]);
                let item = self.this_item(TokenKind::Text);
                self.pos += trim_length;
                self.ignore();
                if !item.value.is_empty() {
                    return self.emit_item(item);
                }
            }
            return Some(State::LeftDelim);
        }

        self.pos = self.input.len();
        if self.pos > self.start {
            self.line += count_newlines(&self.input[self.start..self.pos]);
            return self.emit(TokenKind::Text);
        }
        self.emit(TokenKind::EOF)
    }

    /// Reports whether the input is at a right delimiter, possibly
    /// preceded by a trim marker.
    fn at_right_delim(&self) -> (bool, bool) {
        let rest = &self.input[self.pos..];
        if has_right_trim_marker(rest) && rest[TRIM_MARKER_LEN..].starts_with(&self.right_delim) {
            return (true, true);
        }
        if rest.starts_with(&self.right_delim) {
            return (true, false);
        }
        (false, false)
    }

    fn lex_left_delim(&mut self) -> Option<State> {
        self.pos += self.left_delim.len();
        let trim_space = has_left_trim_marker(&self.input[self.pos..]);
        let after_marker = if trim_space { TRIM_MARKER_LEN } else { 0 };
        if self.input[self.pos + after_marker..].starts_with(LEFT_COMMENT) {
            self.pos += after_marker;
            self.ignore();
            return Some(State::Comment);
        }
        let item = self.this_item(TokenKind::LeftDelim);
        self.inside_action = true;
        self.pos += after_marker;
        self.ignore();
        self.paren_depth = 0;
        self.emit_item(item)
    }

    fn lex_comment(&mut self) -> Option<State> {
        self.pos += LEFT_COMMENT.len();
        let Some(x) = self.input[self.pos..].find(RIGHT_COMMENT) else {
            return self.errorf(String::from("unclosed comment"));
        };
        self.pos += x + RIGHT_COMMENT.len();
        let (delim, trim_space) = self.at_right_delim();
        if !delim {
            return self.errorf(String::from("comment ends before closing delimiter"));
        }
        self.line += count_newlines(&self.input[self.start..self.pos]);
        let item = self.this_item(TokenKind::Comment);
        if trim_space {
            self.pos += TRIM_MARKER_LEN;
        }
        self.pos += self.right_delim.len();
        if trim_space {
            self.pos += left_trim_length(&self.input[self.pos..]);
        }
        self.ignore();
        if self.options.emit_comment {
            return self.emit_item(item);
        }
        Some(State::Text)
    }

    fn lex_right_delim(&mut self) -> Option<State> {
        let (_, trim_space) = self.at_right_delim();
        if trim_space {
            self.pos += TRIM_MARKER_LEN;
            self.ignore();
        }
        self.pos += self.right_delim.len();
        let item = self.this_item(TokenKind::RightDelim);
        if trim_space {
            self.pos += left_trim_length(&self.input[self.pos..]);
            self.ignore();
        }
        self.inside_action = false;
        self.emit_item(item)
    }

    fn lex_inside_action(&mut self) -> Option<State> {
        let (delim, _) = self.at_right_delim();
        if delim {
            if self.paren_depth == 0 {
                return Some(State::RightDelim);
            }
            return self.errorf(String::from("unclosed left paren"));
        }

        let Some(r) = self.next() else {
            return self.errorf(String::from("unclosed action"));
        };
        match r {
            _ if is_space(r) => {
                // Put the space back in case this is " -}}".
                self.backup();
                Some(State::Space)
            }
            '=' => self.emit(TokenKind::Assign),
            ':' => {
                if self.next() != Some('=') {
                    return self.errorf(String::from("expected :="));
                }
                self.emit(TokenKind::Declare)
            }
            '|' => self.emit(TokenKind::Pipe),
            '"' => Some(State::Quote),
            '`' => Some(State::RawQuote),
            '$' => Some(State::Variable),
            '\'' => Some(State::Char),
            '.' => {
                // Look ahead for ".field" without disturbing backup.
                if let Some(&b) = self.input.as_bytes().get(self.pos) {
                    if !b.is_ascii_digit() {
                        return Some(State::Field);
                    }
                }
                // '.' can start a number.
                self.backup();
                Some(State::Number)
            }
            '+' | '-' | '0'..='9' => {
                self.backup();
                Some(State::Number)
            }
            _ if is_alpha_numeric(r) => {
                self.backup();
                Some(State::Identifier)
            }
            '(' => {
                self.paren_depth += 1;
                self.emit(TokenKind::LeftParen)
            }
            ')' => {
                self.paren_depth -= 1;
                if self.paren_depth < 0 {
                    return self.errorf(String::from("unexpected right paren"));
                }
                self.emit(TokenKind::RightParen)
            }
            _ if r.is_ascii() && !r.is_ascii_control() => self.emit(TokenKind::Char),
            _ => self.errorf(format!("unrecognized character in action: {}", format_rune(r))),
        }
    }

    fn lex_space(&mut self) -> Option<State> {
        let mut num_spaces = 0;
        while let Some(r) = self.peek() {
            if !is_space(r) {
                break;
            }
            self.next();
            num_spaces += 1;
        }
        // A trim-marked right delimiter has a minus after a space; the space
        // belongs to the delimiter, not to a Space token.
        let rest = &self.input[self.pos - 1..];
        if has_right_trim_marker(rest) && rest[TRIM_MARKER_LEN..].starts_with(&self.right_delim) {
            self.backup();
            if num_spaces == 1 {
                return Some(State::RightDelim);
            }
        }
        self.emit(TokenKind::Space)
    }

    fn lex_identifier(&mut self) -> Option<State> {
        loop {
            match self.next() {
                Some(r) if is_alpha_numeric(r) => {}
                r => {
                    self.backup();
                    if !self.at_terminator() {
                        return self.errorf(format!("bad character {}", describe(r)));
                    }
                    let word = &self.input[self.start..self.pos];
                    let kind = match RESERVED_LOOKUP.get(word) {
                        Some(TokenKind::Break) if !self.options.break_ok => TokenKind::Identifier,
                        Some(TokenKind::Continue) if !self.options.continue_ok => {
                            TokenKind::Identifier
                        }
                        Some(kind) => *kind,
                        None if word.starts_with('.') => TokenKind::Field,
                        None if word == "true" || word == "false" => TokenKind::Bool,
                        None => TokenKind::Identifier,
                    };
                    return self.emit(kind);
                }
            }
        }
    }

    fn lex_variable(&mut self) -> Option<State> {
        // Nothing interesting follows: a bare "$".
        if self.at_terminator() {
            return self.emit(TokenKind::Variable);
        }
        self.lex_field_or_variable(TokenKind::Variable)
    }

    fn lex_field_or_variable(&mut self, kind: TokenKind) -> Option<State> {
        if self.at_terminator() {
            if kind == TokenKind::Variable {
                return self.emit(TokenKind::Variable);
            }
            return self.emit(TokenKind::Dot);
        }
        let mut last;
        loop {
            last = self.next();
            match last {
                Some(r) if is_alpha_numeric(r) => {}
                _ => {
                    self.backup();
                    break;
                }
            }
        }
        if !self.at_terminator() {
            return self.errorf(format!("bad character {}", describe(last)));
        }
        self.emit(kind)
    }

    /// Reports whether the input is at a valid termination character to
    /// appear after an identifier.
    fn at_terminator(&mut self) -> bool {
        match self.peek() {
            None => true,
            Some(r) if is_space(r) => true,
            Some('.' | ',' | '|' | ':' | ')' | '(') => true,
            Some(_) => self.input[self.pos..].starts_with(&self.right_delim),
        }
    }

    fn lex_char(&mut self) -> Option<State> {
        loop {
            match self.next() {
                Some('\\') => match self.next() {
                    Some('\n') | None => {
                        return self.errorf(String::from("unterminated character constant"))
                    }
                    Some(_) => {}
                },
                Some('\n') | None => {
                    return self.errorf(String::from("unterminated character constant"))
                }
                Some('\'') => break,
                Some(_) => {}
            }
        }
        self.emit(TokenKind::CharConstant)
    }

    fn lex_number(&mut self) -> Option<State> {
        if !self.scan_number() {
            return self.errorf(format!(
                "bad number syntax: {}",
                quote(&self.input[self.start..self.pos])
            ));
        }
        if let Some('+' | '-') = self.peek() {
            // Complex: 1+2i. No spaces, must end in 'i'.
            if !self.scan_number() || !self.input[..self.pos].ends_with('i') {
                return self.errorf(format!(
                    "bad number syntax: {}",
                    quote(&self.input[self.start..self.pos])
                ));
            }
            return self.emit(TokenKind::Complex);
        }
        self.emit(TokenKind::Number)
    }

    fn scan_number(&mut self) -> bool {
        self.accept("+-");
        let mut digits = DECIMAL_DIGITS;
        if self.accept("0") {
            if self.accept("xX") {
                digits = HEX_DIGITS;
            } else if self.accept("oO") {
                digits = OCTAL_DIGITS;
            } else if self.accept("bB") {
                digits = BINARY_DIGITS;
            }
        }
        self.accept_run(digits);
        if self.accept(".") {
            self.accept_run(digits);
        }
        if digits == DECIMAL_DIGITS && self.accept("eE") {
            self.accept("+-");
            self.accept_run(DECIMAL_DIGITS);
        }
        if digits == HEX_DIGITS && self.accept("pP") {
            self.accept("+-");
            self.accept_run(DECIMAL_DIGITS);
        }
        // Is it imaginary?
        self.accept("i");
        // Next thing mustn't be alphanumeric.
        if let Some(r) = self.peek() {
            if is_alpha_numeric(r) {
                self.next();
                return false;
            }
        }
        true
    }

    fn lex_quote(&mut self) -> Option<State> {
        loop {
            match self.next() {
                Some('\\') => match self.next() {
                    Some('\n') | None => {
                        return self.errorf(String::from("unterminated quoted string"))
                    }
                    Some(_) => {}
                },
                Some('\n') | None => return self.errorf(String::from("unterminated quoted string")),
                Some('"') => break,
                Some(_) => {}
            }
        }
        self.emit(TokenKind::String)
    }

    fn lex_raw_quote(&mut self) -> Option<State> {
        loop {
            match self.next() {
                None => return self.errorf(String::from("unterminated raw quoted string")),
                Some('`') => break,
                Some(_) => {}
            }
        }
        self.emit(TokenKind::RawString)
    }
}

/// Drains a lexer into a token vector ending in `EOF`, or returns the
/// first lex error.
pub fn tokenize(
    name: &str,
    source: &str,
    left_delim: &str,
    right_delim: &str,
    options: LexOptions,
) -> Result<Vec<Token>, Error> {
    let mut lex = Lexer::new(name, source, left_delim, right_delim).with_options(options);
    let mut tokens = vec![];

    loop {
        let token = lex.next_token();
        match token.kind {
            TokenKind::Error => {
                return Err(Error::new(
                    ErrorImpl::Lex {
                        message: token.value,
                        extra: String::new(),
                    },
                    Position(token.pos, std::rc::Rc::new(name.to_string())),
                    token.line,
                ));
            }
            TokenKind::EOF => {
                tokens.push(token);
                return Ok(tokens);
            }
            _ => tokens.push(token),
        }
    }
}

fn describe(r: Option<char>) -> String {
    match r {
        Some(c) => format_rune(c),
        None => String::from("EOF"),
    }
}

fn count_newlines(s: &str) -> usize {
    s.bytes().filter(|b| *b == b'\n').count()
}

fn is_space(r: char) -> bool {
    matches!(r, ' ' | '\t' | '\r' | '\n')
}

fn is_alpha_numeric(r: char) -> bool {
    r == '_' || r.is_alphabetic() || r.is_numeric()
}

fn has_left_trim_marker(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 2 && b[0] == TRIM_MARKER && is_space(b[1] as char)
}

fn has_right_trim_marker(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 2 && is_space(b[0] as char) && b[1] == TRIM_MARKER
}

fn right_trim_length(s: &str) -> usize {
    s.len() - s.trim_end_matches(is_space).len()
}

fn left_trim_length(s: &str) -> usize {
    s.len() - s.trim_start_matches(is_space).len()
}
