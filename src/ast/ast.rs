use std::{
    any::Any,
    fmt::{Debug, Display},
    ops::Deref,
};

use crate::Position;

use super::statements::{ListNode, TextNode};

/// Node Types
///
/// Identifies the concrete type behind a `NodeWrapper`. If, Range and With
/// share the `BranchNode` shape and are told apart only by this tag.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum NodeType {
    Text,
    Action,
    Bool,
    Chain,
    Command,
    Dot,
    Else,
    End,
    Field,
    Identifier,
    If,
    List,
    Nil,
    Number,
    Pipe,
    Range,
    String,
    Template,
    Variable,
    With,
    Comment,
    Break,
    Continue,
}

/// Node Trait
///
/// Defines the behavior of every element of a parse tree.
pub trait Node: Debug {
    /// Returns the type of the node.
    fn get_node_type(&self) -> NodeType;
    /// Type conversion purposes - used with `.downcast_ref<T>()`
    fn as_any(&self) -> &dyn Any;
    /// Deep copies the node into a NodeWrapper.
    /// Clone cannot be derived for trait objects, so this method is necessary.
    fn clone_wrapper(&self) -> NodeWrapper;
    /// Byte offset of the node plus the name of the tree that owns it.
    fn get_position(&self) -> &Position;
    /// Writes the canonical template text of the node.
    ///
    /// With `quote_text` set, text nodes are written as quoted strings so
    /// that text boundaries show up in the output.
    fn write_to(&self, sb: &mut String, quote_text: bool);
}

/// Node Wrapper
///
/// A wrapper that allows for any node kind to be stored with helper methods
#[derive(Debug)]
pub struct NodeWrapper(Box<dyn Node>);

impl NodeWrapper {
    pub fn new<T: Node + 'static>(node: T) -> Self {
        NodeWrapper(Box::new(node))
    }

    /// Returns the concrete node if it is a `T`.
    pub fn downcast<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl Deref for NodeWrapper {
    type Target = Box<dyn Node>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Node for NodeWrapper {
    fn get_node_type(&self) -> NodeType {
        self.0.get_node_type()
    }
    fn as_any(&self) -> &dyn Any {
        self.0.as_any()
    }
    fn clone_wrapper(&self) -> NodeWrapper {
        self.0.clone_wrapper()
    }
    fn get_position(&self) -> &Position {
        self.0.get_position()
    }
    fn write_to(&self, sb: &mut String, quote_text: bool) {
        self.0.write_to(sb, quote_text)
    }
}

impl Clone for NodeWrapper {
    fn clone(&self) -> Self {
        self.clone_wrapper()
    }
}

impl Display for NodeWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&render(self, false))
    }
}

/// Renders a node back to template text.
pub fn render(node: &dyn Node, quote_text: bool) -> String {
    let mut sb = String::new();
    node.write_to(&mut sb, quote_text);
    sb
}

/// Reports whether a tree contains nothing but space and comments.
///
/// A `with` block counts as content even when its body is empty, the same
/// as `if` and `range`; only lists, text and comments can be empty.
pub fn is_empty_tree(node: &dyn Node) -> bool {
    match node.get_node_type() {
        NodeType::Comment => true,
        NodeType::List => node
            .as_any()
            .downcast_ref::<ListNode>()
            .is_some_and(|list| list.nodes.iter().all(|n| is_empty_tree(n))),
        NodeType::Text => node
            .as_any()
            .downcast_ref::<TextNode>()
            .is_some_and(|text| text.text.trim().is_empty()),
        _ => false,
    }
}
