use crate::{
    ast::{
        ast::{Node, NodeType, NodeWrapper},
        expressions::PipeNode,
        statements::{
            ActionNode, BranchNode, BreakNode, CommentNode, ContinueNode, ElseNode, EndNode,
            ListNode, TemplateNode, TextNode,
        },
    },
    errors::errors::{Error, ErrorImpl},
    lexer::{
        literals::unquote,
        tokens::{Token, TokenKind},
    },
    Position,
};

use super::{
    expr::parse_pipeline,
    lookups::{ActionHandler, ACTION_LOOKUP},
    parser::Parser,
};

/// Parses the whole template into the parser's tree. `{{define}}` actions
/// at the top level become trees of their own and are left out of the
/// enclosing list.
pub fn parse_template(parser: &mut Parser) -> Result<(), Error> {
    let pos = parser.peek().pos;
    let mut root = ListNode::new(parser.position(pos));

    while parser.peek().kind != TokenKind::EOF {
        if parser.peek().kind == TokenKind::LeftDelim {
            let delim = parser.next();
            if parser.next_non_space().kind == TokenKind::Define {
                // The name is set once it has been read.
                let mut definition = parser.nested("definition");
                parse_definition(&mut definition)?;
                continue;
            }
            parser.backup2(delim);
        }

        let node = parse_text_or_action(parser)?;
        match node.get_node_type() {
            NodeType::End | NodeType::Else => {
                return Err(parser.errorf(ErrorImpl::UnexpectedNode {
                    node: node.to_string(),
                }));
            }
            _ => root.append(node),
        }
    }

    parser.set_root(root);
    Ok(())
}

/// `{{define "name"}} ... {{end}}`, with `{{define` already consumed.
fn parse_definition(parser: &mut Parser) -> Result<(), Error> {
    const CONTEXT: &str = "define clause";

    let name = parser.expect_one_of(TokenKind::String, TokenKind::RawString, CONTEXT)?;
    let name = unquote(&name.value).map_err(|message| parser.errorf(ErrorImpl::Syntax { message }))?;
    parser.set_name(&name);
    parser.expect(TokenKind::RightDelim, CONTEXT)?;

    let (list, end) = parse_item_list(parser)?;
    if end.get_node_type() != NodeType::End {
        return Err(parser.errorf(ErrorImpl::UnexpectedNodeIn {
            node: end.to_string(),
            context: CONTEXT.to_string(),
        }));
    }
    parser.set_root(list);
    parser.add()
}

/// Parses items up to an `{{end}}` or `{{else}}`, which is returned
/// alongside the list.
pub fn parse_item_list(parser: &mut Parser) -> Result<(ListNode, NodeWrapper), Error> {
    let pos = parser.peek_non_space().pos;
    let mut list = ListNode::new(parser.position(pos));

    while parser.peek_non_space().kind != TokenKind::EOF {
        let node = parse_text_or_action(parser)?;
        if matches!(node.get_node_type(), NodeType::End | NodeType::Else) {
            return Ok((list, node));
        }
        list.append(node);
    }

    Err(parser.errorf(ErrorImpl::UnexpectedEof))
}

fn parse_text_or_action(parser: &mut Parser) -> Result<NodeWrapper, Error> {
    let token = parser.next_non_space();
    match token.kind {
        TokenKind::Text => Ok(NodeWrapper::new(TextNode {
            position: parser.position(token.pos),
            text: token.value,
        })),
        TokenKind::LeftDelim => {
            parser.action_line = token.line;
            let node = parse_action(parser);
            parser.action_line = 0;
            node
        }
        TokenKind::Comment => Ok(NodeWrapper::new(CommentNode {
            position: parser.position(token.pos),
            text: token.value,
        })),
        _ => Err(parser.unexpected(&token, "input")),
    }
}

/// Control actions are dispatched on their keyword; anything else is a
/// pipeline whose declared variables stay in scope until the enclosing
/// `{{end}}`.
fn parse_action(parser: &mut Parser) -> Result<NodeWrapper, Error> {
    let token = parser.next_non_space();
    if let Some(handler) = ACTION_LOOKUP.get(&token.kind) {
        return handler(parser, &token);
    }

    parser.backup();
    let token = parser.peek();
    let pipe = parse_pipeline(parser, "command", TokenKind::RightDelim)?;
    Ok(NodeWrapper::new(ActionNode {
        position: parser.position(token.pos),
        line: token.line,
        pipe,
    }))
}

pub fn parse_break_control(parser: &mut Parser, token: &Token) -> Result<NodeWrapper, Error> {
    let next = parser.next_non_space();
    if next.kind != TokenKind::RightDelim {
        return Err(parser.unexpected(&next, "{{break}}"));
    }
    if parser.range_depth == 0 {
        return Err(parser.errorf(ErrorImpl::BreakOutsideRange));
    }
    Ok(NodeWrapper::new(BreakNode {
        position: parser.position(token.pos),
        line: token.line,
    }))
}

pub fn parse_continue_control(parser: &mut Parser, token: &Token) -> Result<NodeWrapper, Error> {
    let next = parser.next_non_space();
    if next.kind != TokenKind::RightDelim {
        return Err(parser.unexpected(&next, "{{continue}}"));
    }
    if parser.range_depth == 0 {
        return Err(parser.errorf(ErrorImpl::ContinueOutsideRange));
    }
    Ok(NodeWrapper::new(ContinueNode {
        position: parser.position(token.pos),
        line: token.line,
    }))
}

struct Control {
    pipe: PipeNode,
    list: ListNode,
    else_list: Option<ListNode>,
}

/// Shared body of `if`, `range` and `with`. Variables declared in the
/// pipeline go out of scope when the control ends, whether or not it
/// parsed.
fn parse_control(parser: &mut Parser, context: &str) -> Result<Control, Error> {
    let vars = parser.vars.len();
    let range_depth = parser.range_depth;
    let control = parse_control_body(parser, context);
    parser.pop_vars(vars);
    parser.range_depth = range_depth;
    control
}

fn parse_control_body(parser: &mut Parser, context: &str) -> Result<Control, Error> {
    let pipe = parse_pipeline(parser, context, TokenKind::RightDelim)?;

    if context == "range" {
        parser.range_depth += 1;
    }
    let (list, next) = parse_item_list(parser)?;
    if context == "range" {
        parser.range_depth -= 1;
    }

    let mut else_list = None;
    if next.get_node_type() == NodeType::Else {
        // "{{else if ...}}" and "{{else with ...}}" leave their keyword
        // pending. Parse the nested control up to its {{end}}, which also
        // serves as ours:
        //   {{if a}}_{{else if b}}_{{end}}
        // is
        //   {{if a}}_{{else}}{{if b}}_{{end}}{{end}}
        let nested = match parser.peek().kind {
            TokenKind::If if context == "if" => Some(parse_if_control as ActionHandler),
            TokenKind::With if context == "with" => Some(parse_with_control as ActionHandler),
            _ => None,
        };
        match nested {
            Some(control) => {
                let keyword = parser.next();
                let mut list = ListNode::new(next.get_position().clone());
                list.append(control(parser, &keyword)?);
                else_list = Some(list);
            }
            None => {
                let (list, next) = parse_item_list(parser)?;
                if next.get_node_type() != NodeType::End {
                    return Err(parser.errorf(ErrorImpl::ExpectedEnd {
                        node: next.to_string(),
                    }));
                }
                else_list = Some(list);
            }
        }
    }

    Ok(Control {
        pipe,
        list,
        else_list,
    })
}

fn branch(node_type: NodeType, control: Control) -> NodeWrapper {
    NodeWrapper::new(BranchNode {
        node_type,
        position: control.pipe.position.clone(),
        line: control.pipe.line,
        pipe: control.pipe,
        list: control.list,
        else_list: control.else_list,
    })
}

/// `{{if pipeline}} itemList {{end}}`, optionally with `{{else}}` or
/// `{{else if ...}}`.
pub fn parse_if_control(parser: &mut Parser, _token: &Token) -> Result<NodeWrapper, Error> {
    Ok(branch(NodeType::If, parse_control(parser, "if")?))
}

pub fn parse_range_control(parser: &mut Parser, _token: &Token) -> Result<NodeWrapper, Error> {
    Ok(branch(NodeType::Range, parse_control(parser, "range")?))
}

pub fn parse_with_control(parser: &mut Parser, _token: &Token) -> Result<NodeWrapper, Error> {
    Ok(branch(NodeType::With, parse_control(parser, "with")?))
}

pub fn parse_end_control(parser: &mut Parser, _token: &Token) -> Result<NodeWrapper, Error> {
    let token = parser.expect(TokenKind::RightDelim, "end")?;
    Ok(NodeWrapper::new(EndNode {
        position: parser.position(token.pos),
    }))
}

pub fn parse_else_control(parser: &mut Parser, _token: &Token) -> Result<NodeWrapper, Error> {
    // "{{else if" and "{{else with" leave the keyword for the enclosing control.
    let peek = parser.peek_non_space();
    if matches!(peek.kind, TokenKind::If | TokenKind::With) {
        return Ok(NodeWrapper::new(ElseNode {
            position: parser.position(peek.pos),
            line: peek.line,
        }));
    }
    let token = parser.expect(TokenKind::RightDelim, "else")?;
    Ok(NodeWrapper::new(ElseNode {
        position: parser.position(token.pos),
        line: token.line,
    }))
}

/// `{{block "name" pipeline}} itemList {{end}}`: defines a template and
/// invokes it in place.
pub fn parse_block_control(parser: &mut Parser, _token: &Token) -> Result<NodeWrapper, Error> {
    const CONTEXT: &str = "block clause";

    let token = parser.next_non_space();
    let name = parse_template_name(parser, &token, CONTEXT)?;
    let pipe = parse_pipeline(parser, CONTEXT, TokenKind::RightDelim)?;

    let unexpected_end = {
        let mut block = parser.nested(&name);
        let (list, end) = parse_item_list(&mut block)?;
        block.set_root(list);
        if end.get_node_type() == NodeType::End {
            block.add()?;
            None
        } else {
            Some(end)
        }
    };
    if let Some(end) = unexpected_end {
        return Err(parser.errorf(ErrorImpl::UnexpectedNodeIn {
            node: end.to_string(),
            context: CONTEXT.to_string(),
        }));
    }

    Ok(template_node(parser.position(token.pos), token.line, name, Some(pipe)))
}

/// `{{template "name"}}` or `{{template "name" pipeline}}`.
pub fn parse_template_control(parser: &mut Parser, _token: &Token) -> Result<NodeWrapper, Error> {
    const CONTEXT: &str = "template clause";

    let token = parser.next_non_space();
    let name = parse_template_name(parser, &token, CONTEXT)?;
    let mut pipe = None;
    if parser.next_non_space().kind != TokenKind::RightDelim {
        parser.backup();
        pipe = Some(parse_pipeline(parser, CONTEXT, TokenKind::RightDelim)?);
    }

    Ok(template_node(parser.position(token.pos), token.line, name, pipe))
}

fn template_node(position: Position, line: usize, name: String, pipe: Option<PipeNode>) -> NodeWrapper {
    NodeWrapper::new(TemplateNode {
        position,
        line,
        name,
        pipe,
    })
}

/// A template name must be a string literal, not a variable or field.
fn parse_template_name(parser: &Parser, token: &Token, context: &str) -> Result<String, Error> {
    match token.kind {
        TokenKind::String | TokenKind::RawString => {
            unquote(&token.value).map_err(|message| parser.errorf(ErrorImpl::Syntax { message }))
        }
        _ => Err(parser.unexpected(token, context)),
    }
}
