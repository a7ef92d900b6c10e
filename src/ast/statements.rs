use std::{any::Any, slice::Iter};

use crate::{lexer::literals::quote, Position};

use super::{
    ast::{Node, NodeType, NodeWrapper},
    expressions::PipeNode,
};

#[derive(Debug, Clone)]
pub struct ListNode {
    pub position: Position,
    pub nodes: Vec<NodeWrapper>,
}

impl ListNode {
    pub fn new(position: Position) -> Self {
        ListNode {
            position,
            nodes: vec![],
        }
    }

    pub fn append(&mut self, node: NodeWrapper) {
        self.nodes.push(node);
    }

    pub fn iter(&self) -> Iter<'_, NodeWrapper> {
        self.nodes.iter()
    }
}

impl Node for ListNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::List
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
        for node in &self.nodes {
            node.write_to(sb, quote_text);
        }
    }
}

/// Text Node
/// Plain text between actions, already trimmed by any adjacent trim markers.
#[derive(Debug, Clone)]
pub struct TextNode {
    pub position: Position,
    pub text: String,
}

impl Node for TextNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Text
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
        if quote_text {
            sb.push_str(&quote(&self.text));
        } else {
            sb.push_str(&self.text);
        }
    }
}

/// Comment Node
/// Only produced when comments are kept. `text` includes the `/* */` markers.
#[derive(Debug, Clone)]
pub struct CommentNode {
    pub position: Position,
    pub text: String,
}

impl Node for CommentNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Comment
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
        sb.push_str("{{");
        sb.push_str(&self.text);
        sb.push_str("}}");
    }
}

/// Action Node
/// A non-control action such as a field evaluation: `{{.X | f}}`.
#[derive(Debug, Clone)]
pub struct ActionNode {
    pub position: Position,
    pub line: usize,
    pub pipe: PipeNode,
}

impl Node for ActionNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Action
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
        sb.push_str("{{");
        self.pipe.write_to(sb, quote_text);
        sb.push_str("}}");
    }
}

/// Branch Node
/// Shared shape of `if`, `range` and `with`. `node_type` says which.
#[derive(Debug, Clone)]
pub struct BranchNode {
    pub node_type: NodeType,
    pub position: Position,
    pub line: usize,
    pub pipe: PipeNode,
    pub list: ListNode,
    pub else_list: Option<ListNode>,
}

impl BranchNode {
    fn keyword(&self) -> &'static str {
        match self.node_type {
            NodeType::Range => "range",
            NodeType::With => "with",
            _ => "if",
        }
    }
}

impl Node for BranchNode {
    fn get_node_type(&self) -> NodeType {
        self.node_type
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
        sb.push_str("{{");
        sb.push_str(self.keyword());
        sb.push(' ');
        self.pipe.write_to(sb, quote_text);
        sb.push_str("}}");
        self.list.write_to(sb, quote_text);
        if let Some(else_list) = &self.else_list {
            sb.push_str("{{else}}");
            else_list.write_to(sb, quote_text);
        }
        sb.push_str("{{end}}");
    }
}

#[derive(Debug, Clone)]
pub struct BreakNode {
    pub position: Position,
    pub line: usize,
}

impl Node for BreakNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Break
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
        sb.push_str("{{break}}");
    }
}

#[derive(Debug, Clone)]
pub struct ContinueNode {
    pub position: Position,
    pub line: usize,
}

impl Node for ContinueNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Continue
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
        sb.push_str("{{continue}}");
    }
}

/// Template Node
/// A `{{template "name" pipeline}}` invocation. `block` actions also
/// leave one of these behind in the enclosing list.
#[derive(Debug, Clone)]
pub struct TemplateNode {
    pub position: Position,
    pub line: usize,
    /// The unquoted name of the template.
    pub name: String,
    pub pipe: Option<PipeNode>,
}

impl Node for TemplateNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Template
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
        sb.push_str("{{template ");
        sb.push_str(&quote(&self.name));
        if let Some(pipe) = &self.pipe {
            sb.push(' ');
            pipe.write_to(sb, quote_text);
        }
        sb.push_str("}}");
    }
}

// Markers returned by item lists. They never end up inside a tree.

#[derive(Debug, Clone)]
pub struct EndNode {
    pub position: Position,
}

impl Node for EndNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::End
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
        sb.push_str("{{end}}");
    }
}

#[derive(Debug, Clone)]
pub struct ElseNode {
    pub position: Position,
    pub line: usize,
}

impl Node for ElseNode {
    fn get_node_type(&self) -> NodeType {
        NodeType::Else
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
        sb.push_str("{{else}}");
    }
}
