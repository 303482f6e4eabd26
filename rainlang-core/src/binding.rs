//! Named bindings: a lazily parsed expression, a constant, or an elided
//! placeholder.

use std::sync::OnceLock;

use crate::diagnostic::{ErrorCode, Problem};
use crate::meta::AuthoringWord;
use crate::namespace::Namespace;
use crate::parser::{ParseContext, ParseOptions, ParseResult, parse};
use crate::span::Span;

/// What a binding holds. Exactly one kind per binding.
#[derive(Debug, Clone)]
pub enum BindingItem {
    /// Rainlang content, parsed on first use and cached.
    Expression(OnceLock<ParseResult>),
    /// Placeholder with the reason it was left out.
    Elided(String),
    /// Literal value.
    Constant(String),
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub name_position: Span,
    pub content: String,
    pub content_position: Span,
    pub position: Span,
    /// Problems found while the binding was declared, with positions
    /// relative to the owning document.
    pub problems: Vec<Problem>,
    pub item: BindingItem,
}

impl Binding {
    pub fn new_expression(
        name: &str,
        name_position: Span,
        content: &str,
        content_position: Span,
    ) -> Self {
        Binding::with_item(
            name,
            name_position,
            content,
            content_position,
            BindingItem::Expression(OnceLock::new()),
        )
    }

    pub fn new_constant(name: &str, name_position: Span, value: &str, content_position: Span) -> Self {
        Binding::with_item(
            name,
            name_position,
            value,
            content_position,
            BindingItem::Constant(value.to_string()),
        )
    }

    pub fn new_elided(name: &str, name_position: Span, reason: &str, content_position: Span) -> Self {
        Binding::with_item(
            name,
            name_position,
            reason,
            content_position,
            BindingItem::Elided(reason.to_string()),
        )
    }

    fn with_item(
        name: &str,
        name_position: Span,
        content: &str,
        content_position: Span,
        item: BindingItem,
    ) -> Self {
        Binding {
            name: name.to_string(),
            name_position,
            content: content.to_string(),
            content_position,
            position: Span::new(
                name_position.start,
                name_position.end.max(content_position.end),
            ),
            problems: Vec::new(),
            item,
        }
    }

    /// Copy of this binding with an empty parse cache.
    pub fn unparsed(&self) -> Binding {
        let item = match &self.item {
            BindingItem::Expression(_) => BindingItem::Expression(OnceLock::new()),
            other => other.clone(),
        };
        Binding {
            item,
            ..self.clone()
        }
    }

    pub fn constant(&self) -> Option<&str> {
        match &self.item {
            BindingItem::Constant(value) => Some(value),
            _ => None,
        }
    }

    pub fn elided(&self) -> Option<&str> {
        match &self.item {
            BindingItem::Elided(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn is_expression(&self) -> bool {
        matches!(self.item, BindingItem::Expression(_))
    }

    /// Parsed content of an expression binding, parsing it against the
    /// namespace it is mounted in on first call. Later calls return the
    /// cached result regardless of arguments.
    pub fn parsed(
        &self,
        words: &[AuthoringWord],
        parent: &Namespace,
        options: ParseOptions,
    ) -> Option<&ParseResult> {
        match &self.item {
            BindingItem::Expression(cell) => Some(cell.get_or_init(|| {
                let cx = ParseContext::new(words, parent)
                    .binding(&self.name)
                    .options(options);
                parse(&self.content, &cx)
            })),
            _ => None,
        }
    }

    /// Whether the binding is known to quote itself, from its declaration
    /// problems or a parse that already ran.
    pub fn is_circular(&self) -> bool {
        let parsed = self.exp().into_iter().flat_map(|parsed| &parsed.problems);
        self.problems
            .iter()
            .chain(parsed)
            .any(|problem| problem.code == ErrorCode::CircularDependency)
    }

    /// Cached parse result, if the expression was already parsed.
    pub fn exp(&self) -> Option<&ParseResult> {
        match &self.item {
            BindingItem::Expression(cell) => cell.get(),
            _ => None,
        }
    }
}
