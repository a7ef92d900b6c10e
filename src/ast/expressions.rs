use std::any::Any;

use crate::Position;

use super::ast::{Node, NodeType, NodeWrapper};

// PIPELINES

/// Pipe Node
/// A pipeline with optional declarations: `$x := a | b c | d`.
#[derive(Debug, Clone)]
pub struct PipeNode {
    pub position: Position,
    pub line: usize,
    /// The variables are being assigned, not declared.
    pub is_assign: bool,
    pub decl: Vec<VariableNode>,
    pub cmds: Vec<CommandNode>,
}

impl PipeNode {
    pub fn new(position: Position, line: usize, decl: Vec<VariableNode>) -> Self {
        PipeNode {
            position,
            line,
            is_assign: false,
            decl,
            cmds: vec![],
        }
    }

    pub fn append(&mut self, command: CommandNode) {
        self.cmds.push(command);
    }
}

impl Node for PipeNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Pipe
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> NodeWrapper {
        NodeWrapper::new(self.clone())
    }
    fn get_position(&self) -> &Position {
        &self.position
    }
    fn write_to(&self, sb: &mut String, quote_text: bool) {
        if !self.decl.is_empty() {
            for (i, v) in self.decl.iter().enumerate() {
                if i > 0 {
                    sb.push_str(", ");
                }
                v.write_to(sb, quote_text);
            }
            sb.push_str(if self.is_assign { " = " } else { " := " });
        }
        for (i, c) in self.cmds.iter().enumerate() {
            if i > 0 {
                sb.push_str(" | ");
            }
            c.write_to(sb, quote_text);
        }
    }
}

/// Command Node
/// One stage of a pipeline: space separated arguments.
#[derive(Debug, Clone)]
pub struct CommandNode {
    pub position: Position,
    pub args: Vec<NodeWrapper>,
}

impl CommandNode {
    pub fn new(position: Position) -> Self {
        CommandNode {
            position,
            args: vec![],
        }
    }

    pub fn append(&mut self, arg: NodeWrapper) {
        self.args.push(arg);
    }
}

impl Node for CommandNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Command
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> NodeWrapper {
        NodeWrapper::new(self.clone())
    }
    fn get_position(&self) -> &Position {
        &self.position
    }
    fn write_to(&self, sb: &mut String, quote_text: bool) {
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                sb.push(' ');
            }
            if arg.get_node_type() == NodeType::Pipe {
                sb.push('(');
                arg.write_to(sb, quote_text);
                sb.push(')');
                continue;
            }
            arg.write_to(sb, quote_text);
        }
    }
}

// NAMES

/// Identifier Node
/// A function name.
#[derive(Debug, Clone)]
pub struct IdentifierNode {
    pub position: Position,
    pub ident: String,
}

impl Node for IdentifierNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Identifier
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> NodeWrapper {
        NodeWrapper::new(self.clone())
    }
    fn get_position(&self) -> &Position {
        &self.position
    }
    fn write_to(&self, sb: &mut String, _quote_text: bool) {
        sb.push_str(&self.ident);
    }
}

/// Variable Node
/// A `$` variable with an optional field chain: `$x.a.b` is `["$x", "a", "b"]`.
#[derive(Debug, Clone)]
pub struct VariableNode {
    pub position: Position,
    pub ident: Vec<String>,
}

impl VariableNode {
    pub fn new(position: Position, ident: &str) -> Self {
        VariableNode {
            position,
            ident: ident.split('.').map(String::from).collect(),
        }
    }
}

impl Node for VariableNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Variable
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> NodeWrapper {
        NodeWrapper::new(self.clone())
    }
    fn get_position(&self) -> &Position {
        &self.position
    }
    fn write_to(&self, sb: &mut String, _quote_text: bool) {
        sb.push_str(&self.ident.join("."));
    }
}

/// Dot Node
/// The cursor, `.`.
#[derive(Debug, Clone)]
pub struct DotNode {
    pub position: Position,
}

impl Node for DotNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Dot
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> NodeWrapper {
        NodeWrapper::new(self.clone())
    }
    fn get_position(&self) -> &Position {
        &self.position
    }
    fn write_to(&self, sb: &mut String, _quote_text: bool) {
        sb.push('.');
    }
}

/// Nil Node
/// The untyped `nil` constant.
#[derive(Debug, Clone)]
pub struct NilNode {
    pub position: Position,
}

impl Node for NilNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Nil
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> NodeWrapper {
        NodeWrapper::new(self.clone())
    }
    fn get_position(&self) -> &Position {
        &self.position
    }
    fn write_to(&self, sb: &mut String, _quote_text: bool) {
        sb.push_str("nil");
    }
}

/// Field Node
/// A field chain on dot: `.a.b` is `["a", "b"]`.
#[derive(Debug, Clone)]
pub struct FieldNode {
    pub position: Position,
    pub ident: Vec<String>,
}

impl FieldNode {
    pub fn new(position: Position, ident: &str) -> Self {
        let ident = ident.strip_prefix('.').unwrap_or(ident);
        FieldNode {
            position,
            ident: ident.split('.').map(String::from).collect(),
        }
    }
}

impl Node for FieldNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Field
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> NodeWrapper {
        NodeWrapper::new(self.clone())
    }
    fn get_position(&self) -> &Position {
        &self.position
    }
    fn write_to(&self, sb: &mut String, _quote_text: bool) {
        for id in &self.ident {
            sb.push('.');
            sb.push_str(id);
        }
    }
}

/// Chain Node
/// A term followed by field accesses, such as `(pipe).a.b`.
#[derive(Debug, Clone)]
pub struct ChainNode {
    pub position: Position,
    pub node: NodeWrapper,
    pub field: Vec<String>,
}

impl ChainNode {
    pub fn new(position: Position, node: NodeWrapper) -> Self {
        ChainNode {
            position,
            node,
            field: vec![],
        }
    }

    /// Adds a `.field` token, dropping its leading dot.
    pub fn add(&mut self, field: &str) {
        let field = field.strip_prefix('.').unwrap_or(field);
        self.field.push(field.to_string());
    }
}

impl Node for ChainNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Chain
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> NodeWrapper {
        NodeWrapper::new(self.clone())
    }
    fn get_position(&self) -> &Position {
        &self.position
    }
    fn write_to(&self, sb: &mut String, quote_text: bool) {
        if self.node.get_node_type() == NodeType::Pipe {
            sb.push('(');
            self.node.write_to(sb, quote_text);
            sb.push(')');
        } else {
            self.node.write_to(sb, quote_text);
        }
        for field in &self.field {
            sb.push('.');
            sb.push_str(field);
        }
    }
}

// LITERALS

#[derive(Debug, Clone)]
pub struct BoolNode {
    pub position: Position,
    pub value: bool,
}

impl Node for BoolNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Bool
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> NodeWrapper {
        NodeWrapper::new(self.clone())
    }
    fn get_position(&self) -> &Position {
        &self.position
    }
    fn write_to(&self, sb: &mut String, _quote_text: bool) {
        sb.push_str(if self.value { "true" } else { "false" });
    }
}

/// Number Node
/// A numeric literal. Several of the `is_*` views may hold at once: `1`
/// is an int, a uint and a float, while `1.5` is only a float.
#[derive(Debug, Clone)]
pub struct NumberNode {
    pub position: Position,
    pub is_int: bool,
    pub is_uint: bool,
    pub is_float: bool,
    pub is_complex: bool,
    pub int64: i64,
    pub uint64: u64,
    pub float64: f64,
    /// Real and imaginary parts.
    pub complex128: (f64, f64),
    /// The literal as it appeared in the source.
    pub text: String,
}

impl Node for NumberNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Number
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> NodeWrapper {
        NodeWrapper::new(self.clone())
    }
    fn get_position(&self) -> &Position {
        &self.position
    }
    fn write_to(&self, sb: &mut String, _quote_text: bool) {
        sb.push_str(&self.text);
    }
}

/// String Node
/// Keeps both the source form (with quotes) and the unquoted value.
#[derive(Debug, Clone)]
pub struct StringNode {
    pub position: Position,
    pub quoted: String,
    pub text: String,
}

impl Node for StringNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::String
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_wrapper(&self) -> NodeWrapper {
        NodeWrapper::new(self.clone())
    }
    fn get_position(&self) -> &Position {
        &self.position
    }
    fn write_to(&self, sb: &mut String, _quote_text: bool) {
        sb.push_str(&self.quoted);
    }
}
