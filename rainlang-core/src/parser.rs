//! Error-tolerant Rainlang parser.
//!
//! `parse` never fails: malformed input becomes a [`Problem`] and a
//! best-effort node, so callers always get a complete tree shape. All
//! blanking is length preserving, so every span indexes the text that
//! was passed in.
//!
//! The state for one invocation lives in [`Parser`] and the per-line
//! [`LineState`]; nothing is shared between calls.

use std::ptr;

use tracing::trace;

use crate::ast::{
    Alias, Comment, ContextRead, Line, Node, Opcode, OpcodeName, OperandArg, OperandArgs, Source,
    Value,
};
use crate::binding::Binding;
use crate::builtins::find_constant;
use crate::diagnostic::{ErrorCode, Problem};
use crate::lexer::{
    Chunk, blank_comments, blank_illegal, classify_numeric, fits_u256, is_alias, is_boundary,
    is_hex, is_path, is_quote, is_whitespace, is_word, split, tokens,
};
use crate::meta::{AuthoringWord, ContextAlias, find_word};
use crate::namespace::{Element, Namespace, NamespaceItem, ResolveError};
use crate::span::{Span, line_col, offset_at};

/// Comment text that suppresses problems on the following line.
pub const IGNORE_NEXT_LINE: &str = "ignore-next-line";

/// Largest integer accepted as a plain operand arg.
const MAX_OPERAND_ARG: u64 = u16::MAX as u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Do not report opcodes missing from the authoring words.
    pub ignore_unknown_opcodes: bool,
    /// Do not report bare words and namespace members that resolve to nothing.
    pub ignore_undefined_words: bool,
}

/// What the parser resolves names against.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub words: &'a [AuthoringWord],
    pub namespace: &'a Namespace,
    /// Name of the binding whose content is being parsed. Quotes are
    /// only accepted when this is set.
    pub binding: Option<&'a str>,
    pub options: ParseOptions,
}

impl<'a> ParseContext<'a> {
    pub fn new(words: &'a [AuthoringWord], namespace: &'a Namespace) -> Self {
        ParseContext {
            words,
            namespace,
            binding: None,
            options: ParseOptions::default(),
        }
    }

    pub fn binding(mut self, name: &'a str) -> Self {
        self.binding = Some(name);
        self
    }

    pub fn options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseResult {
    pub ast: Vec<Source>,
    pub problems: Vec<Problem>,
    pub comments: Vec<Comment>,
    /// Bindings quoted from operand args, in first-encounter order.
    pub dependencies: Vec<String>,
}

/// Parse one Rainlang fragment.
pub fn parse(text: &str, cx: &ParseContext<'_>) -> ParseResult {
    let (sanitized, mut problems) = blank_illegal(text);
    let (sanitized, comments, comment_problems) = blank_comments(&sanitized);
    problems.extend(comment_problems);

    let mut parser = Parser {
        cx,
        text: sanitized,
        ast: Vec::new(),
        problems,
        dependencies: Vec::new(),
    };
    if let Err(fault) = parser.parse_sources() {
        let problem = fault.into_problem(parser.text.len());
        parser.problems.push(problem);
    }

    let Parser {
        text,
        ast,
        mut problems,
        dependencies,
        ..
    } = parser;
    apply_ignore_directives(&text, &comments, &ast, &mut problems);
    trace!(sources = ast.len(), problems = problems.len(), "parsed rainlang fragment");

    ParseResult {
        ast,
        problems,
        comments,
        dependencies,
    }
}

/// Internal invariant violation; becomes a single `RuntimeError`.
#[derive(Debug)]
struct Fault {
    position: usize,
    message: &'static str,
}

impl Fault {
    fn new(position: usize, message: &'static str) -> Self {
        Fault { position, message }
    }

    /// Cover everything from the fault to the end of a text of `len` units.
    fn into_problem(self, len: usize) -> Problem {
        let end = len.saturating_sub(1);
        let start = self.position.min(end);
        Problem::new(ErrorCode::RuntimeError, self.message, Span::new(start, end))
    }
}

/// What an opcode name resolved to.
enum OpcodeTarget {
    Word(AuthoringWord),
    Context(ContextAlias),
}

struct Parser<'a, 'cx> {
    cx: &'a ParseContext<'cx>,
    text: String,
    ast: Vec<Source>,
    problems: Vec<Problem>,
    dependencies: Vec<String>,
}

/// RHS nodes of the line being parsed plus the path of indices to the
/// innermost opcode whose parenthesis is still open.
#[derive(Debug, Default)]
struct LineState {
    nodes: Vec<Node>,
    cursor: Vec<usize>,
}

impl LineState {
    /// Parameter list new nodes are appended to.
    fn container(&mut self, at: usize) -> Result<&mut Vec<Node>, Fault> {
        let mut nodes = &mut self.nodes;
        for &index in &self.cursor {
            nodes = match nodes.get_mut(index) {
                Some(Node::Opcode(opcode)) => &mut opcode.parameters,
                _ => return Err(Fault::new(at, "paren cursor points at a non-opcode node")),
            };
        }
        Ok(nodes)
    }

    fn push(&mut self, node: Node, at: usize) -> Result<(), Fault> {
        self.container(at)?.push(node);
        Ok(())
    }

    /// Push an opcode and make it the innermost open one.
    fn open(&mut self, node: Node, at: usize) -> Result<(), Fault> {
        let container = self.container(at)?;
        container.push(node);
        let index = container.len() - 1;
        self.cursor.push(index);
        Ok(())
    }

    fn current(&mut self, at: usize) -> Result<&mut Opcode, Fault> {
        let Some((last, path)) = self.cursor.split_last() else {
            return Err(Fault::new(at, "no open paren to close"));
        };
        let mut nodes = &mut self.nodes;
        for &index in path {
            nodes = match nodes.get_mut(index) {
                Some(Node::Opcode(opcode)) => &mut opcode.parameters,
                _ => return Err(Fault::new(at, "paren cursor points at a non-opcode node")),
            };
        }
        match nodes.get_mut(*last) {
            Some(Node::Opcode(opcode)) => Ok(opcode),
            _ => Err(Fault::new(at, "paren cursor points at a non-opcode node")),
        }
    }
}

impl<'a, 'cx> Parser<'a, 'cx> {
    fn problem(&mut self, code: ErrorCode, message: impl Into<String>, position: Span) {
        self.problems.push(Problem::new(code, message, position));
    }

    fn parse_sources(&mut self) -> Result<(), Fault> {
        let chunks = split(&self.text, b';', 0);
        for chunk in &chunks {
            if chunk.is_blank() {
                if let Some(semi) = chunk.separator {
                    self.problem(
                        ErrorCode::InvalidEmptyBinding,
                        "invalid empty expression",
                        Span::point(semi),
                    );
                }
                continue;
            }
            let source = self.parse_source(chunk)?;
            self.ast.push(source);
            if chunk.separator.is_none() {
                let position = chunk
                    .trimmed_span()
                    .ok_or(Fault::new(chunk.start, "non-blank chunk without a span"))?;
                self.problem(ErrorCode::ExpectedSemi, "expected to end with semi", position);
            }
        }
        Ok(())
    }

    fn parse_source(&mut self, chunk: &Chunk) -> Result<Source, Fault> {
        let position = chunk
            .trimmed_span()
            .ok_or(Fault::new(chunk.start, "non-blank chunk without a span"))?;
        let mut source = Source {
            lines: Vec::new(),
            position,
        };
        let mut declared: Vec<String> = Vec::new();
        let pieces = split(&chunk.text, b',', chunk.start);

        for (index, piece) in pieces.iter().enumerate() {
            if piece.is_blank() {
                let at = piece
                    .separator
                    .or_else(|| index.checked_sub(1).and_then(|prev| pieces[prev].separator))
                    .unwrap_or(position.start);
                self.problem(
                    ErrorCode::InvalidExpression,
                    "expected an expression",
                    Span::point(at),
                );
                continue;
            }
            let line = self.parse_line(piece, &mut declared)?;
            source.lines.push(line);
        }
        Ok(source)
    }

    fn parse_line(&mut self, chunk: &Chunk, declared: &mut Vec<String>) -> Result<Line, Fault> {
        let position = chunk
            .trimmed_span()
            .ok_or(Fault::new(chunk.start, "non-blank line without a span"))?;
        let colons: Vec<usize> = chunk
            .text
            .bytes()
            .enumerate()
            .filter(|(_, byte)| *byte == b':')
            .map(|(index, _)| index)
            .collect();

        let (lhs, rhs, rhs_start) = match colons.first() {
            None => {
                self.problem(ErrorCode::ExpectedColon, "expected colon", position);
                (String::new(), chunk.text.clone(), chunk.start)
            }
            Some(&colon) => {
                let mut rhs = chunk.text[colon + 1..].to_string();
                for &extra in &colons[1..] {
                    self.problem(
                        ErrorCode::UnexpectedColon,
                        "unexpected colon",
                        Span::point(chunk.start + extra),
                    );
                    rhs.replace_range(extra - colon - 1..extra - colon, " ");
                }
                (chunk.text[..colon].to_string(), rhs, chunk.start + colon + 1)
            }
        };

        let aliases = self.parse_lhs(&lhs, chunk.start, declared);
        let mut state = LineState::default();
        self.parse_rhs(&rhs, rhs_start, &aliases, declared, &mut state)?;

        for (node, alias) in state.nodes.iter_mut().zip(&aliases) {
            if let Node::Opcode(opcode) = node {
                opcode.lhs_alias = vec![alias.clone()];
            }
        }
        declared.extend(
            aliases
                .iter()
                .filter(|alias| alias.name != "_")
                .map(|alias| alias.name.clone()),
        );

        Ok(Line {
            nodes: state.nodes,
            aliases,
            position,
        })
    }

    fn parse_lhs(&mut self, lhs: &str, base: usize, declared: &[String]) -> Vec<Alias> {
        let mut aliases: Vec<Alias> = Vec::new();
        for (name, position) in tokens(lhs, base) {
            if !is_alias(&name) {
                self.problem(
                    ErrorCode::InvalidWordPattern,
                    format!("invalid pattern for alias: {name}"),
                    position,
                );
            } else if name != "_"
                && (self.is_reserved(&name)
                    || declared.contains(&name)
                    || aliases.iter().any(|alias| alias.name == name))
            {
                self.problem(
                    ErrorCode::DuplicateAlias,
                    format!("duplicate alias: {name}"),
                    position,
                );
            }
            aliases.push(Alias { name, position });
        }
        aliases
    }

    fn is_reserved(&self, name: &str) -> bool {
        find_word(self.cx.words, name).is_some() || find_constant(name).is_some()
    }

    fn parse_rhs(
        &mut self,
        rhs: &str,
        base: usize,
        aliases: &[Alias],
        declared: &[String],
        state: &mut LineState,
    ) -> Result<(), Fault> {
        let bytes = rhs.as_bytes();
        let mut index = 0;
        while index < bytes.len() {
            let at = base + index;
            match bytes[index] {
                byte if is_whitespace(byte) => index += 1,
                b')' => {
                    self.close_paren(state, at)?;
                    if let Some(&next) = bytes.get(index + 1) {
                        if !is_whitespace(next) && next != b')' {
                            self.problem(
                                ErrorCode::ExpectedSpace,
                                "expected to be separated by space",
                                Span::point(at + 1),
                            );
                        }
                    }
                    index += 1;
                }
                b'(' | b'<' => {
                    self.problem(ErrorCode::ExpectedOpcode, "expected opcode", Span::point(at));
                    index += 1;
                }
                b'>' => {
                    self.problem(
                        ErrorCode::UnexpectedClosingAngleParen,
                        "unexpected \">\"",
                        Span::point(at),
                    );
                    index += 1;
                }
                _ => {
                    let start = index;
                    while index < bytes.len() && !is_boundary(bytes[index]) {
                        index += 1;
                    }
                    let token = &rhs[start..index];
                    let span = Span::new(base + start, base + index - 1);
                    match bytes.get(index) {
                        Some(b'(') | Some(b'<') => {
                            index = self.parse_opcode(rhs, base, token, span, index, state)?;
                        }
                        _ => {
                            let node = self.parse_operand(token, span, aliases, declared);
                            state.push(node, span.start)?;
                        }
                    }
                }
            }
        }

        let line_end = base + bytes.len().saturating_sub(1);
        while !state.cursor.is_empty() {
            state.current(line_end)?.position.end = line_end;
            state.cursor.pop();
        }
        Ok(())
    }

    fn close_paren(&mut self, state: &mut LineState, at: usize) -> Result<(), Fault> {
        if state.cursor.is_empty() {
            self.problem(
                ErrorCode::UnexpectedClosingParen,
                "unexpected \")\"",
                Span::point(at),
            );
            return Ok(());
        }
        let opcode = state.current(at)?;
        opcode.parens.1 = at;
        opcode.position.end = at;
        if opcode.word.is_some() || opcode.context.is_some() {
            opcode.operand = Some(0);
            opcode.output = Some(1);
        }
        let pending = Span::new(opcode.opcode.position.start, opcode.parens.0);
        if let Some(found) = self
            .problems
            .iter()
            .rposition(|p| p.code == ErrorCode::ExpectedClosingParen && p.position == pending)
        {
            self.problems.remove(found);
        }
        state.cursor.pop();
        Ok(())
    }

    /// Parse an opcode whose name is `token`; `index` points at the `(`
    /// or `<` after it. Returns the index to continue from.
    fn parse_opcode(
        &mut self,
        rhs: &str,
        base: usize,
        token: &str,
        span: Span,
        mut index: usize,
        state: &mut LineState,
    ) -> Result<usize, Fault> {
        let bytes = rhs.as_bytes();
        let mut opcode = Opcode {
            opcode: OpcodeName {
                name: token.to_string(),
                position: span,
            },
            operand: None,
            output: None,
            position: span,
            parens: (0, 0),
            parameters: Vec::new(),
            operand_args: None,
            context: None,
            word: None,
            lhs_alias: Vec::new(),
        };

        let target = self.resolve_opcode(token, span);
        let meta = match &target {
            Some(OpcodeTarget::Word(word)) => {
                opcode.word = Some(word.word.clone());
                Some(word)
            }
            Some(OpcodeTarget::Context(alias)) => {
                opcode.context = Some(ContextRead {
                    column: alias.column,
                    row: alias.row,
                });
                None
            }
            None => None,
        };

        if bytes.get(index) == Some(&b'<') {
            let open = index;
            let Some(relative) = rhs[open..].find('>') else {
                let end = base + bytes.len() - 1;
                self.problem(
                    ErrorCode::ExpectedClosingAngleBracket,
                    "expected \">\"",
                    Span::new(base + open, end),
                );
                opcode.position.end = end;
                state.push(Node::Opcode(opcode), span.start)?;
                return Ok(bytes.len());
            };
            let close = open + relative;
            let args = self.parse_operand_args(&rhs[open + 1..close], base + open + 1, meta);
            if let Some(word) = meta {
                if !word.operand_args.is_empty() && word.operand_args.len() != args.len() {
                    self.problem(
                        ErrorCode::MismatchOperandArgs,
                        format!(
                            "expected {} operand args for {}, found {}",
                            word.operand_args.len(),
                            word.word,
                            args.len()
                        ),
                        Span::new(base + open, base + close),
                    );
                }
            }
            opcode.operand_args = Some(OperandArgs {
                position: Span::new(base + open, base + close),
                args,
            });
            opcode.position.end = base + close;
            index = close + 1;
        }

        if let Some(context) = opcode.context {
            self.check_context_args(&opcode, context);
        }

        if bytes.get(index) != Some(&b'(') {
            let at = if index < bytes.len() { base + index } else { opcode.position.end };
            self.problem(
                ErrorCode::ExpectedOpeningParen,
                "expected \"(\"",
                Span::point(at),
            );
            state.push(Node::Opcode(opcode), span.start)?;
            return Ok(index);
        }

        opcode.parens.0 = base + index;
        self.problem(
            ErrorCode::ExpectedClosingParen,
            "expected \")\"",
            Span::new(span.start, base + index),
        );
        state.open(Node::Opcode(opcode), span.start)?;
        Ok(index + 1)
    }

    fn check_context_args(&mut self, opcode: &Opcode, context: ContextRead) {
        let found = opcode.operand_args.as_ref().map(|args| args.args.len());
        match (context.row, found) {
            (None, None) => self.problem(
                ErrorCode::ExpectedOperandArgs,
                format!("expected the row operand arg for {}", opcode.opcode.name),
                opcode.opcode.position,
            ),
            (None, Some(count)) if count != 1 => self.problem(
                ErrorCode::MismatchOperandArgs,
                format!("expected exactly one operand arg for {}", opcode.opcode.name),
                opcode.opcode.position,
            ),
            (Some(_), Some(_)) => self.problem(
                ErrorCode::MismatchOperandArgs,
                format!("{} does not take operand args", opcode.opcode.name),
                opcode.opcode.position,
            ),
            _ => {}
        }
    }

    fn resolve_opcode(&mut self, token: &str, span: Span) -> Option<OpcodeTarget> {
        if !is_word(token) && !is_path(token) {
            self.problem(
                ErrorCode::InvalidWordPattern,
                format!("invalid pattern for opcode: {token}"),
                span,
            );
            return None;
        }

        let cx = self.cx;
        let resolved = if token.contains('.') {
            cx.namespace.resolve(token).map(|(node, _)| &node.element)
        } else if let Some(word) = find_word(cx.words, token) {
            return Some(OpcodeTarget::Word(word.clone()));
        } else {
            match cx.namespace.get(token) {
                Some(NamespaceItem::Node(node)) => Ok(&node.element),
                _ => Err(ResolveError::Undefined(token.to_string())),
            }
        };

        match resolved {
            Ok(Element::Word(word)) => Some(OpcodeTarget::Word(word.clone())),
            Ok(Element::ContextAlias(alias)) => Some(OpcodeTarget::Context(alias.clone())),
            Ok(Element::Words(_)) => {
                self.problem(
                    ErrorCode::MultipleWords,
                    format!("ambiguous opcode, {token} is imported from more than one source"),
                    span,
                );
                None
            }
            Ok(Element::Binding(_)) => {
                self.problem(
                    ErrorCode::InvalidReference,
                    format!("invalid reference to binding: {token}, bindings cannot be called"),
                    span,
                );
                None
            }
            Err(err) if err.is_undefined() => {
                if !self.cx.options.ignore_unknown_opcodes {
                    self.problem(
                        ErrorCode::UndefinedOpcode,
                        format!("unknown opcode: {token}"),
                        span,
                    );
                }
                None
            }
            Err(err) => {
                self.problem(err.code(), err.to_string(), span);
                None
            }
        }
    }

    fn parse_operand_args(
        &mut self,
        text: &str,
        base: usize,
        meta: Option<&AuthoringWord>,
    ) -> Vec<OperandArg> {
        let mut args = Vec::new();
        for (index, (value, position)) in tokens(text, base).into_iter().enumerate() {
            let declared = meta.and_then(|word| word.operand_args.get(index));
            let small = value.parse::<u64>().is_ok_and(|n| n <= MAX_OPERAND_ARG);
            if is_quote(&value) {
                self.check_quote(&value[1..], position);
            } else if !small && !is_hex(&value) {
                self.problem(
                    ErrorCode::InvalidOperandArg,
                    format!("invalid operand arg: {value}"),
                    position,
                );
            }
            args.push(OperandArg {
                value,
                name: declared.map(|s| s.name.clone()).unwrap_or_default(),
                description: declared.map(|s| s.description.clone()).unwrap_or_default(),
                position,
            });
        }
        args
    }

    /// Validate a quoted binding reference and record it as a dependency.
    fn check_quote(&mut self, name: &str, position: Span) {
        if self.cx.binding.is_none() {
            self.problem(
                ErrorCode::InvalidOperandArg,
                format!("quotes are only allowed in binding expressions: '{name}"),
                position,
            );
            return;
        }
        let cx = self.cx;
        let binding = match cx.namespace.resolve(name) {
            Ok((node, parent)) => match &node.element {
                Element::Binding(binding) => {
                    if self.is_self(binding, parent) {
                        self.problem(
                            ErrorCode::CircularDependency,
                            format!("quote references its own binding: {name}"),
                            position,
                        );
                        return;
                    }
                    binding
                }
                other => {
                    self.problem(
                        ErrorCode::InvalidQuote,
                        format!("invalid quote: {name} is a {}, not a binding", other.kind()),
                        position,
                    );
                    return;
                }
            },
            Err(ResolveError::TooDeep) => {
                self.problem(ErrorCode::DeepNamespace, "namespace too deep", position);
                return;
            }
            Err(err) => {
                self.problem(
                    ErrorCode::UndefinedQuote,
                    format!("undefined quote: {name}, {err}"),
                    position,
                );
                return;
            }
        };

        if let Some(reason) = binding.elided() {
            self.problem(
                ErrorCode::ElidedBinding,
                format!("quoted binding {name} is elided: {reason}"),
                position,
            );
        } else if binding.constant().is_some() {
            self.problem(
                ErrorCode::InvalidQuote,
                format!("invalid quote: {name}, constant bindings cannot be quoted"),
                position,
            );
        } else if binding.is_circular() {
            self.problem(
                ErrorCode::CircularDependency,
                format!("quoted binding {name} has a circular dependency"),
                position,
            );
        } else if !self.dependencies.iter().any(|dep| dep == name) {
            self.dependencies.push(name.to_string());
        }
    }

    fn is_self(&self, binding: &Binding, parent: &Namespace) -> bool {
        self.cx.binding == Some(binding.name.as_str()) && ptr::eq(parent, self.cx.namespace)
    }

    /// Classify an RHS token that is not followed by `(` or `<`.
    fn parse_operand(
        &mut self,
        token: &str,
        span: Span,
        aliases: &[Alias],
        declared: &[String],
    ) -> Node {
        if token.contains('.') && classify_numeric(token).is_none() {
            if !is_path(token) {
                self.problem(
                    ErrorCode::InvalidWordPattern,
                    format!("invalid pattern for reference: {token}"),
                    span,
                );
                return placeholder(token, span);
            }
            return self.parse_reference(token, span);
        }

        if classify_numeric(token).is_some() {
            if !fits_u256(token) {
                self.problem(ErrorCode::OutOfRangeValue, "value out of range", span);
            }
            return Node::Value(Value {
                value: token.to_string(),
                position: span,
                id: None,
            });
        }

        if let Some(constant) = find_constant(token) {
            return Node::Value(Value {
                value: constant.value.to_string(),
                position: span,
                id: Some(token.to_string()),
            });
        }

        if declared.iter().any(|name| name == token) {
            return Node::Alias(Alias {
                name: token.to_string(),
                position: span,
            });
        }

        if aliases.iter().any(|alias| alias.name == token) || self.cx.binding == Some(token) {
            self.problem(
                ErrorCode::InvalidSelfReference,
                format!("invalid self reference: {token}"),
                span,
            );
            return placeholder(token, span);
        }

        if find_word(self.cx.words, token).is_some() {
            self.problem(
                ErrorCode::ExpectedOpeningParen,
                format!("expected \"(\" after opcode {token}"),
                span,
            );
            return placeholder(token, span);
        }

        if self.cx.namespace.contains(token) {
            return self.parse_reference(token, span);
        }

        if !self.cx.options.ignore_undefined_words {
            self.problem(
                ErrorCode::UndefinedWord,
                format!("undefined word: {token}"),
                span,
            );
        }
        placeholder(token, span)
    }

    /// Resolve a namespace reference used as a value. Only constant
    /// bindings can be referenced this way.
    fn parse_reference(&mut self, token: &str, span: Span) -> Node {
        let cx = self.cx;
        let (node, parent) = match cx.namespace.resolve(token) {
            Ok(found) => found,
            Err(err) => {
                if !(err.is_undefined() && self.cx.options.ignore_undefined_words) {
                    self.problem(err.code(), err.to_string(), span);
                }
                return placeholder(token, span);
            }
        };
        match &node.element {
            Element::Binding(binding) if self.is_self(binding, parent) => {
                self.problem(
                    ErrorCode::InvalidSelfReference,
                    format!("invalid self reference: {token}"),
                    span,
                );
                placeholder(token, span)
            }
            Element::Binding(binding) => match binding.constant() {
                Some(value) => Node::Value(Value {
                    value: value.to_string(),
                    position: span,
                    id: Some(token.to_string()),
                }),
                None => {
                    self.problem(
                        ErrorCode::InvalidReference,
                        format!("invalid reference to binding: {token}, only constant bindings can be referenced"),
                        span,
                    );
                    placeholder(token, span)
                }
            },
            other => {
                self.problem(
                    ErrorCode::InvalidReference,
                    format!("invalid reference to {}: {token}", other.kind()),
                    span,
                );
                placeholder(token, span)
            }
        }
    }
}

fn placeholder(token: &str, span: Span) -> Node {
    Node::Alias(Alias {
        name: token.to_string(),
        position: span,
    })
}

/// Drop problems inside the AST lines on the text line after every
/// comment carrying the ignore directive.
fn apply_ignore_directives(
    text: &str,
    comments: &[Comment],
    ast: &[Source],
    problems: &mut Vec<Problem>,
) {
    for comment in comments
        .iter()
        .filter(|comment| comment.comment.contains(IGNORE_NEXT_LINE))
    {
        let (comment_line, _) = line_col(text, comment.position.end);
        let line_start = offset_at(text, comment_line + 1, 0);
        if line_start >= text.len() {
            continue;
        }
        let line_end = text[line_start..]
            .find('\n')
            .map(|at| line_start + at)
            .unwrap_or(text.len());
        let text_line = Span::new(line_start, line_end.max(line_start + 1) - 1);
        for line in ast.iter().flat_map(|source| &source.lines) {
            if line.position.overlaps(text_line) {
                problems.retain(|problem| !line.position.contains_span(problem.position));
            }
        }
    }
}
