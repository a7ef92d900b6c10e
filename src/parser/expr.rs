use crate::{
    ast::{
        ast::{render, NodeType, NodeWrapper},
        expressions::{
            BoolNode, ChainNode, CommandNode, DotNode, FieldNode, IdentifierNode, NilNode,
            PipeNode, StringNode, VariableNode,
        },
    },
    errors::errors::{Error, ErrorImpl},
    lexer::{literals::unquote, tokens::TokenKind},
};

use super::{number::new_number, parser::Parser};

/// Parses a pipeline up to and including the `end` token.
///
/// A pipeline may start with declarations (`$x :=`), assignments
/// (`$x =`) or, for `range`, two comma separated variables.
pub fn parse_pipeline(parser: &mut Parser, context: &str, end: TokenKind) -> Result<PipeNode, Error> {
    let token = parser.peek_non_space();
    let mut pipe = PipeNode::new(parser.position(token.pos), token.line, vec![]);

    loop {
        let v = parser.peek_non_space();
        if v.kind != TokenKind::Variable {
            break;
        }
        parser.next();
        // Space is a token, so telling "$x foo" from "$x := foo" takes
        // three tokens of look-ahead. Keep the token right after the
        // variable so it can be pushed back.
        let token_after_variable = parser.peek();
        let next = parser.peek_non_space();

        if matches!(next.kind, TokenKind::Assign | TokenKind::Declare) {
            pipe.is_assign = next.kind == TokenKind::Assign;
            parser.next_non_space();
            pipe.decl.push(VariableNode::new(parser.position(v.pos), &v.value));
            parser.declare(&v.value);
        } else if next.kind == TokenKind::Char && next.value == "," {
            parser.next_non_space();
            pipe.decl.push(VariableNode::new(parser.position(v.pos), &v.value));
            parser.declare(&v.value);
            if context == "range" && pipe.decl.len() < 2 {
                match parser.peek_non_space().kind {
                    // Second initialized variable in a range pipeline.
                    TokenKind::Variable | TokenKind::RightDelim | TokenKind::RightParen => continue,
                    _ => return Err(parser.errorf(ErrorImpl::RangeInitOnly)),
                }
            }
            return Err(parser.errorf(ErrorImpl::TooManyDeclarations {
                context: context.to_string(),
            }));
        } else if token_after_variable.kind == TokenKind::Space {
            parser.backup3(v, token_after_variable);
        } else {
            parser.backup2(v);
        }
        break;
    }

    loop {
        let token = parser.next_non_space();
        if token.kind == end {
            check_pipeline(parser, &pipe, context)?;
            return Ok(pipe);
        }
        match token.kind {
            TokenKind::Bool
            | TokenKind::CharConstant
            | TokenKind::Complex
            | TokenKind::Dot
            | TokenKind::Field
            | TokenKind::Identifier
            | TokenKind::Number
            | TokenKind::Nil
            | TokenKind::RawString
            | TokenKind::String
            | TokenKind::Variable
            | TokenKind::LeftParen => {
                parser.backup();
                let command = parse_command(parser)?;
                pipe.append(command);
            }
            _ => return Err(parser.unexpected(&token, context)),
        }
    }
}

/// Only the first command of a pipeline may start with a literal.
fn check_pipeline(parser: &Parser, pipe: &PipeNode, context: &str) -> Result<(), Error> {
    if pipe.cmds.is_empty() {
        return Err(parser.errorf(ErrorImpl::MissingValue {
            context: context.to_string(),
        }));
    }
    for (i, command) in pipe.cmds.iter().enumerate().skip(1) {
        let Some(first) = command.args.first() else {
            continue;
        };
        if matches!(
            first.get_node_type(),
            NodeType::Bool | NodeType::Dot | NodeType::Nil | NodeType::Number | NodeType::String
        ) {
            // With A|B|C, pipeline stage 2 is B.
            return Err(parser.errorf(ErrorImpl::NonExecutableCommand { stage: i + 1 }));
        }
    }
    Ok(())
}

/// Space separated operands, up to a `|`, `)` or the closing delimiter.
fn parse_command(parser: &mut Parser) -> Result<CommandNode, Error> {
    let pos = parser.peek_non_space().pos;
    let mut command = CommandNode::new(parser.position(pos));

    loop {
        parser.peek_non_space();
        if let Some(operand) = parse_operand(parser)? {
            command.append(operand);
        }
        let token = parser.next();
        match token.kind {
            TokenKind::Space => continue,
            TokenKind::RightDelim | TokenKind::RightParen => parser.backup(),
            TokenKind::Pipe => {}
            _ => return Err(parser.unexpected(&token, "operand")),
        }
        break;
    }

    if command.args.is_empty() {
        return Err(parser.errorf(ErrorImpl::EmptyCommand));
    }
    Ok(command)
}

/// A term with any `.field` accesses that follow it.
///
/// Fields after a field or variable extend it in place. Fields after a
/// literal are rejected here; anything else becomes a `ChainNode`.
fn parse_operand(parser: &mut Parser) -> Result<Option<NodeWrapper>, Error> {
    let Some(node) = parse_term(parser)? else {
        return Ok(None);
    };
    if parser.peek().kind != TokenKind::Field {
        return Ok(Some(node));
    }

    let pos = parser.peek().pos;
    let mut chain = ChainNode::new(parser.position(pos), node);
    while parser.peek().kind == TokenKind::Field {
        let field = parser.next();
        chain.add(&field.value);
    }

    let node = match chain.node.get_node_type() {
        NodeType::Field => NodeWrapper::new(FieldNode::new(chain.position.clone(), &render(&chain, false))),
        NodeType::Variable => {
            NodeWrapper::new(VariableNode::new(chain.position.clone(), &render(&chain, false)))
        }
        NodeType::Bool | NodeType::String | NodeType::Number | NodeType::Nil | NodeType::Dot => {
            return Err(parser.errorf(ErrorImpl::DotAfterTerm {
                term: chain.node.to_string(),
            }));
        }
        _ => NodeWrapper::new(chain),
    };
    Ok(Some(node))
}

/// A single operand. Returns `None`, with the token pushed back, when the
/// next token cannot start one.
fn parse_term(parser: &mut Parser) -> Result<Option<NodeWrapper>, Error> {
    let token = parser.next_non_space();
    let position = parser.position(token.pos);

    let node = match token.kind {
        TokenKind::Identifier => {
            if !parser.mode().skip_func_check && !parser.has_function(&token.value) {
                return Err(parser.errorf(ErrorImpl::UndefinedFunction { name: token.value }));
            }
            NodeWrapper::new(IdentifierNode {
                position,
                ident: token.value,
            })
        }
        TokenKind::Dot => NodeWrapper::new(DotNode { position }),
        TokenKind::Nil => NodeWrapper::new(NilNode { position }),
        TokenKind::Variable => parser.use_var(token.pos, &token.value)?,
        TokenKind::Field => NodeWrapper::new(FieldNode::new(position, &token.value)),
        TokenKind::Bool => NodeWrapper::new(BoolNode {
            position,
            value: token.value == "true",
        }),
        TokenKind::CharConstant | TokenKind::Complex | TokenKind::Number => {
            let number = new_number(position, &token.value, token.kind)
                .map_err(|message| parser.errorf(ErrorImpl::Syntax { message }))?;
            NodeWrapper::new(number)
        }
        TokenKind::LeftParen => {
            NodeWrapper::new(parse_pipeline(parser, "parenthesized pipeline", TokenKind::RightParen)?)
        }
        TokenKind::String | TokenKind::RawString => {
            let text = unquote(&token.value)
                .map_err(|message| parser.errorf(ErrorImpl::Syntax { message }))?;
            NodeWrapper::new(StringNode {
                position,
                quoted: token.value,
                text,
            })
        }
        _ => {
            parser.backup();
            return Ok(None);
        }
    };
    Ok(Some(node))
}
