//! Hierarchical namespace of bindings, words and context aliases.
//!
//! Keys are namespace words. A key maps either to a nested namespace or
//! to a leaf node; the two are distinct variants, never inferred from
//! the shape of the value.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::binding::Binding;
use crate::diagnostic::ErrorCode;
use crate::lexer::is_word;
use crate::meta::{AuthoringWord, ContextAlias};

/// Maximum number of segments in a dotted path.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone)]
pub enum Element {
    Word(AuthoringWord),
    /// Same word imported more than once from different sources.
    Words(Vec<AuthoringWord>),
    ContextAlias(ContextAlias),
    Binding(Arc<Binding>),
}

impl Element {
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Word(_) => "opcode",
            Element::Words(_) => "ambiguous opcode",
            Element::ContextAlias(_) => "context alias",
            Element::Binding(_) => "binding",
        }
    }
}

/// A leaf of the namespace tree.
#[derive(Debug, Clone)]
pub struct NamespaceNode {
    /// Meta hash the element came from, empty for local bindings.
    pub hash: String,
    /// Index of the top-level import the element was reached through.
    pub import_index: Option<usize>,
    pub element: Element,
}

impl NamespaceNode {
    pub fn local(element: Element) -> Self {
        NamespaceNode {
            hash: String::new(),
            import_index: None,
            element,
        }
    }

    pub fn binding(&self) -> Option<&Arc<Binding>> {
        match &self.element {
            Element::Binding(binding) => Some(binding),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum NamespaceItem {
    Namespace(Namespace),
    Node(NamespaceNode),
}

#[derive(Debug, Clone, Default)]
pub struct Namespace {
    entries: BTreeMap<String, NamespaceItem>,
}

/// Why a dotted lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("namespace too deep")]
    TooDeep,
    #[error("expected to end with a node")]
    ExpectedNode,
    #[error("invalid word pattern: {0}")]
    InvalidSegment(String),
    #[error("undefined identifier: {0}")]
    Undefined(String),
    #[error("namespace {namespace} has no member {member}")]
    NoMember { namespace: String, member: String },
    #[error("expected to end with a node, {0} is a namespace")]
    IsNamespace(String),
    #[error("{0} is not a namespace")]
    NotANamespace(String),
}

impl ResolveError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ResolveError::TooDeep => ErrorCode::DeepNamespace,
            ResolveError::InvalidSegment(_) => ErrorCode::InvalidWordPattern,
            ResolveError::Undefined(_) | ResolveError::NoMember { .. } => {
                ErrorCode::UndefinedNamespaceMember
            }
            ResolveError::ExpectedNode
            | ResolveError::IsNamespace(_)
            | ResolveError::NotANamespace(_) => ErrorCode::InvalidNamespaceReference,
        }
    }

    /// Whether the path was well formed but names nothing.
    pub fn is_undefined(&self) -> bool {
        matches!(self, ResolveError::Undefined(_) | ResolveError::NoMember { .. })
    }
}

/// Why an insertion into a namespace was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamespaceError {
    #[error("invalid namespace key: {0}")]
    InvalidKey(String),
    #[error("{0} is already occupied")]
    Occupied(String),
    #[error("colliding namespace nodes: {0}")]
    Colliding(String),
}

impl NamespaceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            NamespaceError::InvalidKey(_) => ErrorCode::InvalidWordPattern,
            NamespaceError::Occupied(_) => ErrorCode::OccupiedNamespace,
            NamespaceError::Colliding(_) => ErrorCode::CollidingNamespaceNodes,
        }
    }
}

impl Namespace {
    pub fn new() -> Self {
        Namespace::default()
    }

    pub fn get(&self, key: &str) -> Option<&NamespaceItem> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<NamespaceItem> {
        self.entries.remove(key)
    }

    /// Insert a leaf. Words merge into an ambiguous `Words` element;
    /// anything else colliding is refused and the existing entry kept.
    pub fn insert_node(&mut self, key: &str, node: NamespaceNode) -> Result<(), NamespaceError> {
        if !is_word(key) {
            return Err(NamespaceError::InvalidKey(key.to_string()));
        }
        match self.entries.get_mut(key) {
            None => {
                self.entries.insert(key.to_string(), NamespaceItem::Node(node));
                Ok(())
            }
            Some(NamespaceItem::Namespace(_)) => Err(NamespaceError::Occupied(key.to_string())),
            Some(NamespaceItem::Node(existing)) => merge_nodes(key, existing, node),
        }
    }

    /// Mount `namespace` under `key`, merging into an existing namespace
    /// with the same key.
    pub fn mount(&mut self, key: &str, namespace: Namespace) -> Vec<NamespaceError> {
        if !is_word(key) {
            return vec![NamespaceError::InvalidKey(key.to_string())];
        }
        match self.entries.get_mut(key) {
            None => {
                self.entries.insert(key.to_string(), NamespaceItem::Namespace(namespace));
                Vec::new()
            }
            Some(NamespaceItem::Namespace(existing)) => existing.merge(namespace),
            Some(NamespaceItem::Node(_)) => vec![NamespaceError::Occupied(key.to_string())],
        }
    }

    /// Merge every entry of `other` into this namespace, reporting the
    /// entries that could not be merged.
    pub fn merge(&mut self, other: Namespace) -> Vec<NamespaceError> {
        let mut errors = Vec::new();
        for (key, item) in other.entries {
            match item {
                NamespaceItem::Namespace(inner) => errors.extend(self.mount(&key, inner)),
                NamespaceItem::Node(node) => {
                    if let Err(err) = self.insert_node(&key, node) {
                        errors.push(err);
                    }
                }
            }
        }
        errors
    }

    /// Give every expression binding in the tree its own empty parse
    /// cache, so it is parsed again against the namespace it ends up
    /// mounted in rather than the one it was declared in.
    pub fn detach_bindings(&mut self) {
        for item in self.entries.values_mut() {
            match item {
                NamespaceItem::Namespace(inner) => inner.detach_bindings(),
                NamespaceItem::Node(node) => {
                    if let Element::Binding(binding) = &mut node.element {
                        if binding.is_expression() {
                            *binding = Arc::new(binding.unparsed());
                        }
                    }
                }
            }
        }
    }

    /// Tag every leaf as reached through import `index` with `hash`.
    pub fn retag(&mut self, hash: &str, index: usize) {
        for item in self.entries.values_mut() {
            match item {
                NamespaceItem::Namespace(inner) => inner.retag(hash, index),
                NamespaceItem::Node(node) => {
                    if node.hash.is_empty() {
                        node.hash = hash.to_string();
                    }
                    node.import_index = Some(index);
                }
            }
        }
    }

    /// Resolve a dotted path to a leaf and the namespace that holds it.
    ///
    /// A leading `.` is accepted and means "from this namespace". The
    /// path must end on a leaf.
    pub fn resolve(&self, path: &str) -> Result<(&NamespaceNode, &Namespace), ResolveError> {
        let mut segments: Vec<&str> = path.split('.').collect();
        if segments.len() > 1 && segments[0].is_empty() {
            segments.remove(0);
        }
        if segments.len() > MAX_DEPTH {
            return Err(ResolveError::TooDeep);
        }
        if segments.last().is_none_or(|last| last.is_empty()) {
            return Err(ResolveError::ExpectedNode);
        }
        if let Some(invalid) = segments.iter().find(|segment| !is_word(segment)) {
            return Err(ResolveError::InvalidSegment((*invalid).to_string()));
        }

        let mut current = self;
        let last = segments.len() - 1;
        for (index, segment) in segments.iter().enumerate() {
            match current.entries.get(*segment) {
                None if index == 0 => return Err(ResolveError::Undefined((*segment).to_string())),
                None => {
                    return Err(ResolveError::NoMember {
                        namespace: segments[..index].join("."),
                        member: (*segment).to_string(),
                    });
                }
                Some(NamespaceItem::Namespace(inner)) => {
                    if index == last {
                        return Err(ResolveError::IsNamespace((*segment).to_string()));
                    }
                    current = inner;
                }
                Some(NamespaceItem::Node(node)) => {
                    if index == last {
                        return Ok((node, current));
                    }
                    return Err(ResolveError::NotANamespace((*segment).to_string()));
                }
            }
        }
        Err(ResolveError::ExpectedNode)
    }
}

fn merge_nodes(key: &str, existing: &mut NamespaceNode, node: NamespaceNode) -> Result<(), NamespaceError> {
    match (&mut existing.element, node.element) {
        (Element::Word(current), Element::Word(incoming)) => {
            if existing.hash != node.hash {
                let current = current.clone();
                existing.element = Element::Words(vec![current, incoming]);
            }
            Ok(())
        }
        (Element::Words(words), Element::Word(incoming)) => {
            words.push(incoming);
            Ok(())
        }
        _ => Err(NamespaceError::Colliding(key.to_string())),
    }
}
