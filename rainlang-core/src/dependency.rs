//! Entrypoint resolution and dependency expansion.
//!
//! Requested names are resolved against the root namespace, then every
//! binding quoted by a resolved binding is pulled in, relative to the
//! namespace that binding is mounted in. The result is a flat node list
//! in discovery order with per-node dependency indices.

use std::ptr;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::binding::Binding;
use crate::diagnostic::Problem;
use crate::meta::AuthoringWord;
use crate::namespace::{Namespace, NamespaceItem, NamespaceNode, ResolveError};
use crate::parser::ParseOptions;
use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntrypointError {
    #[error("no entrypoints were given")]
    Empty,
    #[error("cannot resolve {name}: {source}")]
    Unresolved { name: String, source: ResolveError },
    #[error("{name} is a {kind}, not a binding")]
    NotABinding { name: String, kind: &'static str },
    #[error("elided binding {name}: {reason}")]
    Elided { name: String, reason: String },
    #[error("constant binding {name} cannot be an entrypoint")]
    Constant { name: String },
    #[error("binding {name} has {} problem(s)", .problems.len())]
    Problems { name: String, problems: Vec<Problem> },
    #[error("circular dependency: {path}")]
    CircularDependency { path: String },
}

impl EntrypointError {
    /// Problems carried by the rejection, already in document offsets.
    pub fn problems(&self) -> &[Problem] {
        match self {
            EntrypointError::Problems { problems, .. } => problems,
            _ => &[],
        }
    }
}

/// A binding selected for flattening.
#[derive(Debug, Clone)]
pub struct ResolvedNode<'a> {
    /// Name or path the binding was requested or quoted by.
    pub name: String,
    pub binding: Arc<Binding>,
    /// Namespace the binding is mounted in.
    pub parent: &'a Namespace,
    pub import_index: Option<usize>,
    /// Indices into [`Resolution::nodes`], one per quoted dependency in
    /// the order the binding quotes them.
    pub dependencies: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub nodes: Vec<ResolvedNode<'a>>,
    /// The first `entrypoints` nodes are the requested ones.
    pub entrypoints: usize,
}

pub struct Resolver<'a> {
    namespace: &'a Namespace,
    words: &'a [AuthoringWord],
    /// Hash position of each top-level import, by import index.
    import_positions: Vec<Span>,
    options: ParseOptions,
}

impl<'a> Resolver<'a> {
    pub fn new(namespace: &'a Namespace, words: &'a [AuthoringWord]) -> Self {
        Resolver {
            namespace,
            words,
            import_positions: Vec::new(),
            options: ParseOptions::default(),
        }
    }

    pub fn import_positions(mut self, positions: Vec<Span>) -> Self {
        self.import_positions = positions;
        self
    }

    pub fn options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Resolution<'a>, EntrypointError> {
        if names.is_empty() {
            return Err(EntrypointError::Empty);
        }
        let mut nodes: Vec<ResolvedNode<'a>> = Vec::new();
        for name in names {
            let name = name.as_ref();
            let found = lookup(self.namespace, name).map_err(|source| EntrypointError::Unresolved {
                name: name.to_string(),
                source,
            })?;
            let node = self.accept(name, found)?;
            nodes.push(node);
        }
        let entrypoints = nodes.len();

        let mut index = 0;
        while index < nodes.len() {
            let parent = nodes[index].parent;
            let quoted = self.quoted(&nodes[index]);
            let mut dependencies = Vec::with_capacity(quoted.len());
            for path in quoted {
                let found = parent.resolve(&path).map_err(|source| EntrypointError::Unresolved {
                    name: path.clone(),
                    source,
                })?;
                let existing = nodes.iter().position(|node| {
                    found.0.binding().is_some_and(|b| Arc::ptr_eq(&node.binding, b))
                        && ptr::eq(node.parent, found.1)
                });
                let at = match existing {
                    Some(at) => at,
                    None => {
                        let node = self.accept(&path, found)?;
                        nodes.push(node);
                        nodes.len() - 1
                    }
                };
                dependencies.push(at);
            }
            nodes[index].dependencies = dependencies;
            index += 1;
        }

        if let Some(cycle) = find_cycle(&nodes) {
            let path = cycle
                .iter()
                .map(|&at| nodes[at].name.as_str())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(EntrypointError::CircularDependency { path });
        }

        debug!(
            entrypoints,
            nodes = nodes.len(),
            "resolved entrypoints"
        );
        Ok(Resolution { nodes, entrypoints })
    }

    /// Validate a resolved leaf and parse its expression.
    fn accept(
        &self,
        name: &str,
        (leaf, parent): (&'a NamespaceNode, &'a Namespace),
    ) -> Result<ResolvedNode<'a>, EntrypointError> {
        let Some(binding) = leaf.binding() else {
            return Err(EntrypointError::NotABinding {
                name: name.to_string(),
                kind: leaf.element.kind(),
            });
        };
        if let Some(reason) = binding.elided() {
            return Err(EntrypointError::Elided {
                name: name.to_string(),
                reason: reason.to_string(),
            });
        }
        if binding.constant().is_some() {
            return Err(EntrypointError::Constant {
                name: name.to_string(),
            });
        }

        let words = if leaf.import_index.is_some() { &[][..] } else { self.words };
        let mut problems = binding.problems.clone();
        if let Some(parsed) = binding.parsed(words, parent, self.options) {
            problems.extend(
                parsed
                    .problems
                    .iter()
                    .map(|problem| problem.shifted(binding.content_position.start)),
            );
        }
        if !problems.is_empty() {
            if let Some(position) = leaf
                .import_index
                .and_then(|index| self.import_positions.get(index).copied())
            {
                for problem in &mut problems {
                    *problem = problem.relocated(position);
                }
            }
            return Err(EntrypointError::Problems {
                name: name.to_string(),
                problems,
            });
        }

        Ok(ResolvedNode {
            name: name.to_string(),
            binding: Arc::clone(binding),
            parent,
            import_index: leaf.import_index,
            dependencies: Vec::new(),
        })
    }

    fn quoted(&self, node: &ResolvedNode<'a>) -> Vec<String> {
        node.binding
            .exp()
            .map(|parsed| parsed.dependencies.clone())
            .unwrap_or_default()
    }
}

/// Root lookup with a fast path for bare names.
fn lookup<'n>(root: &'n Namespace, name: &str) -> Result<(&'n NamespaceNode, &'n Namespace), ResolveError> {
    if name.contains('.') {
        return root.resolve(name);
    }
    match root.get(name) {
        Some(NamespaceItem::Node(node)) => Ok((node, root)),
        Some(NamespaceItem::Namespace(_)) => Err(ResolveError::IsNamespace(name.to_string())),
        None => root.resolve(name),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Depth-first search over dependency indices. Returns the node indices
/// of the first cycle found, closed with its starting node.
fn find_cycle(nodes: &[ResolvedNode<'_>]) -> Option<Vec<usize>> {
    let mut marks = vec![Mark::Unvisited; nodes.len()];
    for root in 0..nodes.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::OnStack;
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        while let Some(top) = stack.last_mut() {
            let node = top.0;
            let Some(&next) = nodes[node].dependencies.get(top.1) else {
                marks[node] = Mark::Done;
                stack.pop();
                continue;
            };
            top.1 += 1;
            match marks[next] {
                Mark::OnStack => {
                    let from = stack.iter().position(|&(at, _)| at == next).unwrap_or(0);
                    let mut cycle: Vec<usize> = stack[from..].iter().map(|&(at, _)| at).collect();
                    cycle.push(next);
                    return Some(cycle);
                }
                Mark::Unvisited => {
                    marks[next] = Mark::OnStack;
                    stack.push((next, 0));
                }
                Mark::Done => {}
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::ErrorCode;
    use crate::namespace::Element;

    fn expression(name: &str, content: &str) -> NamespaceNode {
        NamespaceNode::local(Element::Binding(Arc::new(Binding::new_expression(
            name,
            Span::new(0, name.len()),
            content,
            Span::new(100, 100 + content.len()),
        ))))
    }

    fn words() -> Vec<AuthoringWord> {
        vec![
            AuthoringWord::new("add", ""),
            AuthoringWord::new("call", "").with_operand_args(&["source"]),
        ]
    }

    fn root() -> Namespace {
        let mut ns = Namespace::new();
        ns.insert_node("main", expression("main", "_: call<'helper>() call<'shared>();"))
            .expect("insert");
        ns.insert_node("helper", expression("helper", "_: call<'shared>();"))
            .expect("insert");
        ns.insert_node("shared", expression("shared", "_: add(1 2);"))
            .expect("insert");
        ns.insert_node("broken", expression("broken", "_: nope(1);"))
            .expect("insert");
        ns.insert_node(
            "later",
            NamespaceNode::local(Element::Binding(Arc::new(Binding::new_elided(
                "later",
                Span::new(0, 4),
                "not yet wired",
                Span::new(6, 18),
            )))),
        )
        .expect("insert");
        ns.insert_node(
            "fee",
            NamespaceNode::local(Element::Binding(Arc::new(Binding::new_constant(
                "fee",
                Span::new(0, 2),
                "1",
                Span::new(4, 4),
            )))),
        )
        .expect("insert");
        ns
    }

    #[test]
    fn expands_dependencies_in_discovery_order() {
        let ns = root();
        let words = words();
        let resolution = Resolver::new(&ns, &words).resolve(&["main"]).expect("resolve");
        let names: Vec<_> = resolution.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["main", "helper", "shared"]);
        assert_eq!(resolution.entrypoints, 1);
        assert_eq!(resolution.nodes[0].dependencies, [1, 2]);
        assert_eq!(resolution.nodes[1].dependencies, [2]);
        assert!(resolution.nodes[2].dependencies.is_empty());
    }

    #[test]
    fn shared_entrypoints_are_not_duplicated() {
        let ns = root();
        let words = words();
        let resolution = Resolver::new(&ns, &words)
            .resolve(&["shared", "main"])
            .expect("resolve");
        assert_eq!(resolution.entrypoints, 2);
        assert_eq!(resolution.nodes.len(), 3);
        assert_eq!(resolution.nodes[1].dependencies, [2, 0]);
    }

    #[test]
    fn elided_entrypoint_reports_reason() {
        let ns = root();
        let words = words();
        let err = Resolver::new(&ns, &words).resolve(&["later"]).unwrap_err();
        assert_eq!(
            err,
            EntrypointError::Elided {
                name: "later".to_string(),
                reason: "not yet wired".to_string()
            }
        );
        assert!(err.to_string().contains("not yet wired"));
    }

    #[test]
    fn rejects_constants_missing_names_and_empty_requests() {
        let ns = root();
        let words = words();
        let resolver = Resolver::new(&ns, &words);
        assert!(matches!(resolver.resolve(&["fee"]), Err(EntrypointError::Constant { .. })));
        assert!(matches!(
            resolver.resolve(&["missing"]),
            Err(EntrypointError::Unresolved { .. })
        ));
        assert_eq!(resolver.resolve::<&str>(&[]).unwrap_err(), EntrypointError::Empty);
    }

    #[test]
    fn binding_problems_are_shifted_to_document_offsets() {
        let ns = root();
        let words = words();
        let err = Resolver::new(&ns, &words).resolve(&["broken"]).unwrap_err();
        let problems = err.problems();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].code, ErrorCode::UndefinedOpcode);
        assert_eq!(problems[0].position, Span::new(103, 106));
    }

    #[test]
    fn imported_problems_point_at_the_import() {
        let mut ns = Namespace::new();
        let mut node = expression("broken", "_: nope(1);");
        node.import_index = Some(0);
        ns.insert_node("broken", node).expect("insert");
        let err = Resolver::new(&ns, &[])
            .import_positions(vec![Span::new(2, 67)])
            .resolve(&["broken"])
            .unwrap_err();
        assert!(err.problems().iter().all(|p| p.position == Span::new(2, 67)));
    }

    #[test]
    fn detects_indirect_cycles() {
        let mut ns = Namespace::new();
        ns.insert_node("a", expression("a", "_: call<'b>();")).expect("insert");
        ns.insert_node("b", expression("b", "_: call<'a>();")).expect("insert");
        let words = words();
        let err = Resolver::new(&ns, &words).resolve(&["a"]).unwrap_err();
        assert_eq!(
            err,
            EntrypointError::CircularDependency {
                path: "a -> b -> a".to_string()
            }
        );
    }
}
