//! Parser state and entry points.
//!
//! This module contains the `Tree` produced by a parse, the `Parser`
//! that drives a `Lexer` while building one, and the top-level `parse`
//! function. The grammar itself lives in `stmt.rs` (item lists and control
//! actions) and `expr.rs` (pipelines and operands).
//!
//! A parse fills a `TreeSet`: the named template being parsed plus every
//! `{{define}}` and `{{block}}` found inside it. Nested definitions are
//! parsed by a nested `Parser` that shares the lexer, the tree set and the
//! function tables of the enclosing one.

use std::{any::Any, collections::HashMap, rc::Rc};

use tracing::debug;

use crate::{
    ast::{
        ast::{is_empty_tree, render, Node, NodeWrapper},
        expressions::VariableNode,
        statements::ListNode,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::{
        lexer::{LexOptions, Lexer},
        tokens::{Token, TokenKind},
    },
    Pos, Position,
};

use super::stmt::parse_template;

/// Parse mode flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mode {
    /// Keep `{{/* */}}` comments as `CommentNode`s.
    pub parse_comments: bool,
    /// Do not require identifiers to name a known function.
    pub skip_func_check: bool,
}

/// A table of template functions.
///
/// The parser never calls the functions; it only checks that an
/// identifier used as a command names one of them.
#[derive(Debug, Clone, Default)]
pub struct FuncMap(HashMap<String, Rc<dyn Any>>);

impl FuncMap {
    pub fn new() -> Self {
        FuncMap(HashMap::new())
    }

    /// A table whose entries carry no callable, for membership checks only.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = FuncMap::new();
        for name in names {
            map.insert(name, ());
        }
        map
    }

    pub fn insert<F: Any>(&mut self, name: impl Into<String>, function: F) {
        self.0.insert(name.into(), Rc::new(function));
    }

    pub fn with<F: Any>(mut self, name: impl Into<String>, function: F) -> Self {
        self.insert(name, function);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Rc<dyn Any>> {
        self.0.get(name)
    }
}

/// Every tree produced by one parse, keyed by template name.
pub type TreeSet = HashMap<String, Tree>;

/// A single parsed template.
#[derive(Debug, Clone)]
pub struct Tree {
    /// Name of the template the tree represents.
    pub name: String,
    /// Name of the top-level template during parsing, for error messages.
    pub parse_name: String,
    /// Top-level list of nodes. `None` until the tree has been parsed.
    pub root: Option<ListNode>,
    pub mode: Mode,
    /// The source text. Nested definitions share the text of the
    /// template they were found in.
    text: Rc<str>,
}

impl Tree {
    pub fn new(name: &str) -> Self {
        Tree {
            name: name.to_string(),
            parse_name: String::new(),
            root: None,
            mode: Mode::default(),
            text: Rc::from(""),
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parses `text` into this tree and registers it, plus any definitions
    /// found along the way, in `tree_set`.
    ///
    /// Empty delimiters select `{{` and `}}`.
    pub fn parse(
        mut self,
        text: &str,
        left_delim: &str,
        right_delim: &str,
        tree_set: &mut TreeSet,
        funcs: &[FuncMap],
    ) -> Result<Tree, Error> {
        self.parse_name = self.name.clone();
        self.text = Rc::from(text);
        let mut lex = Lexer::new(&self.name, text, left_delim, right_delim);
        let mut parser = Parser::new(self, &mut lex, tree_set, funcs);

        match parse_template(&mut parser).and_then(|_| parser.add()) {
            Ok(()) => Ok(parser.stop_parse()),
            Err(err) => {
                debug!(template = %parser.tree.name, error = %err, "parse failed");
                Err(err)
            }
        }
    }

    /// Deep copy of the tree.
    pub fn copy(&self) -> Tree {
        Tree {
            name: self.name.clone(),
            parse_name: self.parse_name.clone(),
            root: self.root.clone(),
            mode: self.mode,
            text: Rc::clone(&self.text),
        }
    }

    /// Canonical template text of the tree.
    pub fn render(&self, quote_text: bool) -> String {
        self.root
            .as_ref()
            .map(|root| render(root, quote_text))
            .unwrap_or_default()
    }

    /// Describes where `node` sits in the source, for diagnostics.
    ///
    /// Returns `"<parse_name>:<line>:<column>"` and the node's text.
    pub fn error_context(&self, node: &dyn Node) -> (String, String) {
        let pos = node.get_position().0;
        let text = self.text.get(..pos).unwrap_or(&self.text);
        let column = match text.rfind('\n') {
            Some(newline) => pos - (newline + 1),
            None => pos,
        };
        let line = 1 + text.matches('\n').count();
        let location = format!("{}:{}:{}", self.parse_name, line, column);
        (location, render(node, false))
    }
}

/// Finds the tree a node belongs to.
pub fn owning_tree<'a>(tree_set: &'a TreeSet, node: &dyn Node) -> Option<&'a Tree> {
    tree_set.get(node.get_position().1.as_str())
}

/// Parses a named template and returns every tree it defines.
pub fn parse(
    name: &str,
    text: &str,
    left_delim: &str,
    right_delim: &str,
    funcs: &[FuncMap],
    mode: Mode,
) -> Result<TreeSet, Error> {
    let mut tree_set = TreeSet::new();
    Tree::new(name)
        .with_mode(mode)
        .parse(text, left_delim, right_delim, &mut tree_set, funcs)?;
    Ok(tree_set)
}

/// Parse-time state for one tree.
pub struct Parser<'a> {
    tree: Tree,
    /// Name of the tree being built, stamped on every node.
    owner: Rc<String>,
    parse_name: Rc<String>,
    lex: &'a mut Lexer,
    /// Three-token look-ahead buffer.
    token: [Token; 3],
    peek_count: usize,
    /// Variables in scope. Starts as `["$"]`.
    pub(super) vars: Vec<String>,
    funcs: &'a [FuncMap],
    tree_set: &'a mut TreeSet,
    /// Line of the action being parsed, or 0 outside of actions.
    pub(super) action_line: usize,
    pub(super) range_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(
        tree: Tree,
        lex: &'a mut Lexer,
        tree_set: &'a mut TreeSet,
        funcs: &'a [FuncMap],
    ) -> Self {
        let mut parser = Parser {
            owner: Rc::new(tree.name.clone()),
            parse_name: Rc::new(tree.parse_name.clone()),
            tree,
            lex,
            token: Default::default(),
            peek_count: 0,
            vars: vec![String::from("$")],
            funcs,
            tree_set,
            action_line: 0,
            range_depth: 0,
        };
        parser.start_parse();
        parser
    }

    fn start_parse(&mut self) {
        let options = LexOptions {
            emit_comment: self.tree.mode.parse_comments,
            break_ok: !self.has_function("break"),
            continue_ok: !self.has_function("continue"),
        };
        self.lex.set_options(options);
    }

    /// Ends the parse and hands back the finished tree.
    pub fn stop_parse(self) -> Tree {
        self.tree
    }

    /// A parser for a `{{define}}` or `{{block}}` body, sharing this
    /// parser's lexer, tree set and functions.
    pub(super) fn nested(&mut self, name: &str) -> Parser<'_> {
        let tree = Tree {
            name: name.to_string(),
            parse_name: self.tree.parse_name.clone(),
            root: None,
            mode: self.tree.mode,
            text: Rc::clone(&self.tree.text),
        };
        Parser::new(tree, &mut *self.lex, &mut *self.tree_set, self.funcs)
    }

    pub(super) fn set_name(&mut self, name: &str) {
        self.tree.name = name.to_string();
        self.owner = Rc::new(self.tree.name.clone());
    }

    pub(super) fn set_root(&mut self, root: ListNode) {
        self.tree.root = Some(root);
    }

    pub fn mode(&self) -> Mode {
        self.tree.mode
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.funcs.iter().any(|funcs| funcs.contains(name))
    }

    /// Position of a token within the tree being built.
    pub fn position(&self, pos: Pos) -> Position {
        Position(pos, Rc::clone(&self.owner))
    }

    // TOKEN ACCESS

    /// Returns the next token.
    pub fn next(&mut self) -> Token {
        if self.peek_count > 0 {
            self.peek_count -= 1;
        } else {
            self.token[0] = self.lex.next_token();
        }
        self.token[self.peek_count].clone()
    }

    /// Backs the input stream up one token.
    pub fn backup(&mut self) {
        self.peek_count += 1;
    }

    /// Backs the input stream up two tokens. The zeroth token is already there.
    pub fn backup2(&mut self, t1: Token) {
        self.token[1] = t1;
        self.peek_count = 2;
    }

    /// Backs the input stream up three tokens. The zeroth token is already there.
    pub fn backup3(&mut self, t2: Token, t1: Token) {
        self.token[1] = t1;
        self.token[2] = t2;
        self.peek_count = 3;
    }

    /// Returns but does not consume the next token.
    pub fn peek(&mut self) -> Token {
        if self.peek_count > 0 {
            return self.token[self.peek_count - 1].clone();
        }
        self.peek_count = 1;
        self.token[0] = self.lex.next_token();
        self.token[0].clone()
    }

    pub fn next_non_space(&mut self) -> Token {
        loop {
            let token = self.next();
            if token.kind != TokenKind::Space {
                return token;
            }
        }
    }

    pub fn peek_non_space(&mut self) -> Token {
        let token = self.next_non_space();
        self.backup();
        token
    }

    /// Consumes the next non-space token, which must be of kind `expected`.
    pub fn expect(&mut self, expected: TokenKind, context: &str) -> Result<Token, Error> {
        let token = self.next_non_space();
        if token.kind != expected {
            return Err(self.unexpected(&token, context));
        }
        Ok(token)
    }

    pub fn expect_one_of(
        &mut self,
        expected1: TokenKind,
        expected2: TokenKind,
        context: &str,
    ) -> Result<Token, Error> {
        let token = self.next_non_space();
        if !token.is_one_of_many(&[expected1, expected2]) {
            return Err(self.unexpected(&token, context));
        }
        Ok(token)
    }

    // ERRORS

    /// Builds an error located at the most recently read token.
    pub fn errorf(&self, error_impl: ErrorImpl) -> Error {
        let token = &self.token[0];
        Error::new(
            error_impl,
            Position(token.pos, Rc::clone(&self.parse_name)),
            token.line,
        )
    }

    /// Reports an unexpected token. Lex errors pass their own message
    /// through, noting where the action began when it spans lines.
    pub fn unexpected(&self, token: &Token, context: &str) -> Error {
        if token.kind == TokenKind::Error {
            let mut extra = String::new();
            if self.action_line != 0 && self.action_line != token.line {
                extra = format!(
                    " in action started at {}:{}",
                    self.parse_name, self.action_line
                );
                if token.value.ends_with(" action") {
                    // Avoid "action in action".
                    extra = extra[" in action".len()..].to_string();
                }
            }
            return self.errorf(ErrorImpl::Lex {
                message: token.value.clone(),
                extra,
            });
        }
        self.errorf(ErrorImpl::UnexpectedToken {
            token: token.to_string(),
            context: context.to_string(),
        })
    }

    // SCOPE

    pub fn declare(&mut self, name: &str) {
        self.vars.push(name.to_string());
    }

    /// Trims the variable list back to `n` entries.
    pub fn pop_vars(&mut self, n: usize) {
        self.vars.truncate(n);
    }

    /// A reference to a variable, which must be in scope.
    pub fn use_var(&self, pos: Pos, name: &str) -> Result<NodeWrapper, Error> {
        let v = VariableNode::new(self.position(pos), name);
        let base = v.ident.first().map(String::as_str).unwrap_or_default();
        if self.vars.iter().any(|var| var == base) {
            return Ok(NodeWrapper::new(v));
        }
        Err(self.errorf(ErrorImpl::UndefinedVariable {
            name: base.to_string(),
        }))
    }

    /// Registers the finished tree in the tree set. A tree may replace an
    /// empty one of the same name; two non-empty definitions conflict.
    pub fn add(&mut self) -> Result<(), Error> {
        let existing_empty = match self.tree_set.get(&self.tree.name) {
            None => true,
            Some(existing) => existing.root.as_ref().map_or(true, |root| is_empty_tree(root)),
        };
        if existing_empty {
            debug!(template = %self.tree.name, "registered template");
            self.tree_set
                .insert(self.tree.name.clone(), self.tree.copy());
            return Ok(());
        }
        if self.tree.root.as_ref().is_some_and(|root| !is_empty_tree(root)) {
            return Err(self.errorf(ErrorImpl::MultipleDefinition {
                name: self.tree.name.clone(),
            }));
        }
        debug!(template = %self.tree.name, "ignored empty redefinition");
        Ok(())
    }
}
