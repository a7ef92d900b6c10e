use std::fmt::Display;

use thiserror::Error;

use crate::{lexer::literals::quote, Position};

/// A fatal template error.
///
/// Displays as `template: <name>:<line>: <message>`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("template: {}:{line}: {internal_error}", .position.1)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
    line: usize,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position, line: usize) -> Self {
        Error {
            internal_error: error_impl,
            position,
            line,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    /// Name of the template being parsed when the error was raised.
    pub fn get_name(&self) -> &str {
        &self.position.1
    }

    pub fn get_line(&self) -> usize {
        self.line
    }

    /// The bare message, without the `template: name:line:` prefix.
    pub fn get_message(&self) -> String {
        self.internal_error.to_string()
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::Lex { .. } => "Lex",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedNode { .. } => "UnexpectedNode",
            ErrorImpl::UnexpectedNodeIn { .. } => "UnexpectedNodeIn",
            ErrorImpl::ExpectedEnd { .. } => "ExpectedEnd",
            ErrorImpl::UnexpectedEof => "UnexpectedEof",
            ErrorImpl::UndefinedVariable { .. } => "UndefinedVariable",
            ErrorImpl::UndefinedFunction { .. } => "UndefinedFunction",
            ErrorImpl::MultipleDefinition { .. } => "MultipleDefinition",
            ErrorImpl::TooManyDeclarations { .. } => "TooManyDeclarations",
            ErrorImpl::RangeInitOnly => "RangeInitOnly",
            ErrorImpl::BreakOutsideRange => "BreakOutsideRange",
            ErrorImpl::ContinueOutsideRange => "ContinueOutsideRange",
            ErrorImpl::DotAfterTerm { .. } => "DotAfterTerm",
            ErrorImpl::MissingValue { .. } => "MissingValue",
            ErrorImpl::NonExecutableCommand { .. } => "NonExecutableCommand",
            ErrorImpl::EmptyCommand => "EmptyCommand",
            ErrorImpl::Syntax { .. } => "Syntax",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::Lex { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { context, .. } => {
                ErrorTip::Suggestion(format!("check the syntax of the {}", context))
            }
            ErrorImpl::UnexpectedNode { .. } => ErrorTip::Suggestion(String::from(
                "{{else}} and {{end}} must close an {{if}}, {{range}}, {{with}}, {{block}} or {{define}}",
            )),
            ErrorImpl::UnexpectedNodeIn { .. } | ErrorImpl::ExpectedEnd { .. } => {
                ErrorTip::Suggestion(String::from("each block takes at most one {{else}} before its {{end}}"))
            }
            ErrorImpl::UnexpectedEof => {
                ErrorTip::Suggestion(String::from("is an {{end}} missing?"))
            }
            ErrorImpl::UndefinedVariable { name } => ErrorTip::Suggestion(format!(
                "declare it first with {{{{{} := ...}}}}, variables end with their enclosing block",
                name
            )),
            ErrorImpl::UndefinedFunction { name } => {
                ErrorTip::Suggestion(format!("add `{}` to the function table", name))
            }
            ErrorImpl::MultipleDefinition { name } => {
                ErrorTip::Suggestion(format!("template `{}` already has a body", name))
            }
            ErrorImpl::TooManyDeclarations { .. } | ErrorImpl::RangeInitOnly => {
                ErrorTip::Suggestion(String::from("only {{range}} may declare two variables"))
            }
            ErrorImpl::BreakOutsideRange | ErrorImpl::ContinueOutsideRange => {
                ErrorTip::Suggestion(String::from("only valid in the body of a {{range}}"))
            }
            ErrorImpl::DotAfterTerm { .. } => {
                ErrorTip::Suggestion(String::from("literal values have no fields"))
            }
            ErrorImpl::MissingValue { .. } | ErrorImpl::EmptyCommand => ErrorTip::None,
            ErrorImpl::NonExecutableCommand { .. } => ErrorTip::Suggestion(String::from(
                "later pipeline stages must be a function, method or field",
            )),
            ErrorImpl::Syntax { .. } => ErrorTip::None,
        }
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    /// A lexer `Error` token, with the optional "started at" suffix.
    #[error("{message}{extra}")]
    Lex { message: String, extra: String },
    #[error("unexpected {token} in {context}")]
    UnexpectedToken { token: String, context: String },
    #[error("unexpected {node}")]
    UnexpectedNode { node: String },
    #[error("unexpected {node} in {context}")]
    UnexpectedNodeIn { node: String, context: String },
    #[error("expected end; found {node}")]
    ExpectedEnd { node: String },
    #[error("unexpected EOF")]
    UnexpectedEof,
    #[error("undefined variable {}", quote(.name))]
    UndefinedVariable { name: String },
    #[error("function {} not defined", quote(.name))]
    UndefinedFunction { name: String },
    #[error("template: multiple definition of template {}", quote(.name))]
    MultipleDefinition { name: String },
    #[error("too many declarations in {context}")]
    TooManyDeclarations { context: String },
    #[error("range can only initialize variables")]
    RangeInitOnly,
    #[error("{{{{break}}}} outside {{{{range}}}}")]
    BreakOutsideRange,
    #[error("{{{{continue}}}} outside {{{{range}}}}")]
    ContinueOutsideRange,
    #[error("unexpected . after term {}", quote(.term))]
    DotAfterTerm { term: String },
    #[error("missing value for {context}")]
    MissingValue { context: String },
    #[error("non executable command in pipeline stage {stage}")]
    NonExecutableCommand { stage: usize },
    #[error("empty command")]
    EmptyCommand,
    /// Malformed literal: bad quoting or number syntax.
    #[error("{message}")]
    Syntax { message: String },
}
