/// AST (Abstract Syntax Tree) module
/// Contains the node types a parsed template is made of
///
/// Submodules:
/// - ast: The Node trait, NodeWrapper, rendering and emptiness checks
/// - expressions: Pipeline and operand nodes
/// - statements: List, text and action-level nodes
pub mod ast;
pub mod expressions;
pub mod statements;

#[cfg(test)]
mod tests;
