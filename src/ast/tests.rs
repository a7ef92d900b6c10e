//! Unit tests for AST nodes: rendering, copying and emptiness.

use std::rc::Rc;

use super::{
    ast::{is_empty_tree, render, Node, NodeType, NodeWrapper},
    expressions::{
        BoolNode, ChainNode, CommandNode, DotNode, FieldNode, IdentifierNode, PipeNode,
        StringNode, VariableNode,
    },
    statements::{
        ActionNode, BranchNode, CommentNode, ListNode, TemplateNode, TextNode,
    },
};
use crate::Position;

fn pos(offset: usize) -> Position {
    Position(offset, Rc::new(String::from("t")))
}

fn text(s: &str) -> NodeWrapper {
    NodeWrapper::new(TextNode {
        position: pos(0),
        text: s.to_string(),
    })
}

fn pipe_of(args: Vec<NodeWrapper>) -> PipeNode {
    let mut cmd = CommandNode::new(pos(0));
    for arg in args {
        cmd.append(arg);
    }
    let mut pipe = PipeNode::new(pos(0), 1, vec![]);
    pipe.append(cmd);
    pipe
}

fn field(s: &str) -> NodeWrapper {
    NodeWrapper::new(FieldNode::new(pos(0), s))
}

fn branch(node_type: NodeType, body: Vec<NodeWrapper>) -> NodeWrapper {
    let mut list = ListNode::new(pos(0));
    for node in body {
        list.append(node);
    }
    NodeWrapper::new(BranchNode {
        node_type,
        position: pos(0),
        line: 1,
        pipe: pipe_of(vec![field(".X")]),
        list,
        else_list: None,
    })
}

#[test]
fn test_field_and_variable_split() {
    let node = FieldNode::new(pos(0), ".a.b");
    assert_eq!(node.ident, vec!["a", "b"]);
    assert_eq!(render(&node, false), ".a.b");

    let node = VariableNode::new(pos(0), "$x.y");
    assert_eq!(node.ident, vec!["$x", "y"]);
    assert_eq!(render(&node, false), "$x.y");
}

#[test]
fn test_pipe_rendering() {
    let mut pipe = PipeNode::new(
        pos(0),
        1,
        vec![VariableNode::new(pos(0), "$i"), VariableNode::new(pos(0), "$v")],
    );
    pipe.append(pipe_of(vec![field(".SI")]).cmds.remove(0));
    assert_eq!(render(&pipe, false), "$i, $v := .SI");

    pipe.is_assign = true;
    assert_eq!(render(&pipe, false), "$i, $v = .SI");
}

#[test]
fn test_command_wraps_nested_pipeline() {
    let inner = pipe_of(vec![
        NodeWrapper::new(IdentifierNode {
            position: pos(0),
            ident: String::from("f"),
        }),
        NodeWrapper::new(DotNode { position: pos(0) }),
    ]);
    let outer = pipe_of(vec![
        NodeWrapper::new(IdentifierNode {
            position: pos(0),
            ident: String::from("printf"),
        }),
        NodeWrapper::new(inner),
    ]);
    assert_eq!(render(&outer, false), "printf (f .)");
}

#[test]
fn test_chain_rendering() {
    let mut chain = ChainNode::new(pos(0), NodeWrapper::new(pipe_of(vec![field(".X")])));
    chain.add(".Y");
    chain.add(".Z");
    assert_eq!(chain.field, vec!["Y", "Z"]);
    assert_eq!(render(&chain, false), "(.X).Y.Z");
}

#[test]
fn test_text_quoting() {
    let node = text("a\n\"b\"");
    assert_eq!(render(&node, false), "a\n\"b\"");
    assert_eq!(render(&node, true), "\"a\\n\\\"b\\\"\"");
}

#[test]
fn test_branch_rendering() {
    let node = branch(NodeType::If, vec![text("yes")]);
    assert_eq!(render(&node, true), "{{if .X}}\"yes\"{{end}}");

    let mut else_list = ListNode::new(pos(0));
    else_list.append(text("no"));
    let node = BranchNode {
        node_type: NodeType::Range,
        position: pos(0),
        line: 1,
        pipe: pipe_of(vec![field(".X")]),
        list: ListNode::new(pos(0)),
        else_list: Some(else_list),
    };
    assert_eq!(render(&node, false), "{{range .X}}{{else}}no{{end}}");
}

#[test]
fn test_template_rendering() {
    let node = TemplateNode {
        position: pos(0),
        line: 1,
        name: String::from("foo"),
        pipe: None,
    };
    assert_eq!(render(&node, false), "{{template \"foo\"}}");

    let node = TemplateNode {
        pipe: Some(pipe_of(vec![NodeWrapper::new(DotNode { position: pos(0) })])),
        ..node
    };
    assert_eq!(render(&node, false), "{{template \"foo\" .}}");
}

#[test]
fn test_literal_rendering() {
    let node = StringNode {
        position: pos(0),
        quoted: String::from("`raw`"),
        text: String::from("raw"),
    };
    assert_eq!(render(&node, false), "`raw`");

    let node = BoolNode {
        position: pos(0),
        value: false,
    };
    assert_eq!(render(&node, false), "false");
}

#[test]
fn test_clone_wrapper_is_deep() {
    let mut list = ListNode::new(pos(3));
    list.append(text("a"));
    let copy = list.clone_wrapper();
    list.append(text("b"));

    assert_eq!(copy.to_string(), "a");
    assert_eq!(copy.get_position().0, 3);
    assert_eq!(list.iter().count(), 2);
    assert!(copy.downcast::<ListNode>().is_some());
    assert!(copy.downcast::<TextNode>().is_none());
}

#[test]
fn test_is_empty_tree() {
    let mut list = ListNode::new(pos(0));
    assert!(is_empty_tree(&list));

    list.append(text(" \n\t"));
    list.append(NodeWrapper::new(CommentNode {
        position: pos(0),
        text: String::from("/* c */"),
    }));
    assert!(is_empty_tree(&list));

    list.append(text("x"));
    assert!(!is_empty_tree(&list));

    let action = ActionNode {
        position: pos(0),
        line: 1,
        pipe: pipe_of(vec![field(".X")]),
    };
    assert!(!is_empty_tree(&action));
}

#[test]
fn test_is_empty_tree_with_counts_as_content() {
    // An empty `with` body still makes the tree non-empty, like `if` and `range`.
    assert!(!is_empty_tree(&branch(NodeType::With, vec![])));
    assert!(!is_empty_tree(&branch(NodeType::With, vec![text("  ")])));
    assert!(!is_empty_tree(&branch(NodeType::If, vec![])));
    assert!(!is_empty_tree(&branch(NodeType::Range, vec![])));
}
