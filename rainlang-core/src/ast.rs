//! Rainlang abstract syntax tree.
//!
//! Every node carries the span it was parsed from, relative to the text
//! handed to the parser.

use serde::Serialize;

use crate::span::Span;

/// A block comment found in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub comment: String,
    pub position: Span,
}

/// RHS node of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Value(Value),
    Opcode(Opcode),
    Alias(Alias),
}

impl Node {
    pub fn position(&self) -> Span {
        match self {
            Node::Value(value) => value.position,
            Node::Opcode(opcode) => opcode.position,
            Node::Alias(alias) => alias.position,
        }
    }

    pub fn as_opcode(&self) -> Option<&Opcode> {
        match self {
            Node::Opcode(opcode) => Some(opcode),
            _ => None,
        }
    }
}

/// A literal, or a constant resolved from a name recorded in `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub value: String,
    pub position: Span,
    pub id: Option<String>,
}

/// A name reference: an LHS alias, or a placeholder for an undefined word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: String,
    pub position: Span,
}

/// Where a context-alias opcode reads from. `row` is `None` when the
/// row is supplied through operand args at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextRead {
    pub column: u32,
    pub row: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeName {
    pub name: String,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperandArg {
    pub value: String,
    pub name: String,
    pub description: String,
    pub position: Span,
}

/// The `<...>` list following an opcode name; `position` covers the brackets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperandArgs {
    pub position: Span,
    pub args: Vec<OperandArg>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opcode {
    pub opcode: OpcodeName,
    /// `None` until the opcode resolves.
    pub operand: Option<u64>,
    /// Stack slots produced, `None` until the opcode resolves.
    pub output: Option<u64>,
    pub position: Span,
    /// Opening and closing parenthesis offsets.
    pub parens: (usize, usize),
    pub parameters: Vec<Node>,
    pub operand_args: Option<OperandArgs>,
    pub context: Option<ContextRead>,
    /// Authoring word a dotted or aliased name resolved to.
    pub word: Option<String>,
    /// LHS aliases this node's outputs are bound to.
    pub lhs_alias: Vec<Alias>,
}

impl Opcode {
    pub fn is_ctx(&self) -> bool {
        self.context.is_some()
    }
}

/// One `,`-delimited `lhs: rhs` unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    pub nodes: Vec<Node>,
    pub aliases: Vec<Alias>,
    pub position: Span,
}

/// One `;`-terminated unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Source {
    pub lines: Vec<Line>,
    pub position: Span,
}

impl Source {
    /// Depth-first walk over every node in the source.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        for line in &self.lines {
            for node in &line.nodes {
                walk_node(node, visit);
            }
        }
    }
}

fn walk_node<'a>(node: &'a Node, visit: &mut impl FnMut(&'a Node)) {
    visit(node);
    if let Node::Opcode(opcode) = node {
        for parameter in &opcode.parameters {
            walk_node(parameter, visit);
        }
    }
}
