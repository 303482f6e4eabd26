//! RainDocument: front matter, imports and bindings assembled into one
//! namespace.
//!
//! A document body is a sequence of statements. `@` starts an import,
//! `#` starts a binding; a marker only counts at the start of the body
//! or after whitespace. Imports are fetched through a [`MetaProvider`]
//! while the document is built; binding expressions are parsed lazily.

use std::sync::Arc;

use tracing::debug;

use crate::ast::Comment;
use crate::binding::Binding;
use crate::builtins::find_constant;
use crate::dependency::Resolver;
use crate::diagnostic::{ErrorCode, Problem};
use crate::lexer::{
    blank_comments, blank_illegal, classify_numeric, fits_u256, is_hash, is_whitespace, is_word,
    tokens, trimmed_span,
};
use crate::meta::{AuthoringWord, ContextAlias, MetaProvider};
use crate::namespace::{Element, MAX_DEPTH, Namespace, NamespaceError, NamespaceItem, NamespaceNode};
use crate::parser::ParseOptions;
use crate::span::{Span, slice};

/// Line separating front matter from the body.
pub const FRONT_MATTER_SEPARATOR: &str = "---";
/// Import name that merges into the root namespace.
pub const ROOT_IMPORT: &str = ".";

const DEFAULT_ELIDED: &str = "elided binding";
const EMPTY_BINDING: &str = "empty binding";
const ELIDED_BY_IMPORT: &str = "elided by import";

/// Key/value pair after an import hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconfig {
    pub key: String,
    pub key_position: Span,
    pub value: String,
    pub value_position: Span,
}

/// Everything fetched for one import hash.
#[derive(Debug, Clone, Default)]
pub struct ImportSequence {
    pub dispair: Option<Vec<AuthoringWord>>,
    pub ctxmeta: Option<Vec<ContextAlias>>,
    pub dotrain: Option<Arc<RainDocument>>,
}

impl ImportSequence {
    pub fn is_empty(&self) -> bool {
        self.dispair.is_none() && self.ctxmeta.is_none() && self.dotrain.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Import {
    pub name: String,
    pub name_position: Span,
    pub hash: String,
    pub hash_position: Span,
    pub position: Span,
    pub problems: Vec<Problem>,
    pub reconfigs: Vec<Reconfig>,
    pub sequence: ImportSequence,
}

#[derive(Debug, Clone)]
pub struct RainDocument {
    pub text: String,
    pub front_matter: String,
    pub imports: Vec<Import>,
    /// Local bindings in declaration order.
    pub bindings: Vec<Arc<Binding>>,
    pub namespace: Namespace,
    /// Words of the root-merged imports, first occurrence wins.
    pub words: Vec<AuthoringWord>,
    /// Document-level problems, in document offsets.
    pub problems: Vec<Problem>,
    pub comments: Vec<Comment>,
    pub options: ParseOptions,
}

impl RainDocument {
    pub fn create(text: &str, provider: &dyn MetaProvider) -> RainDocument {
        RainDocument::create_with_options(text, provider, ParseOptions::default())
    }

    pub fn create_with_options(
        text: &str,
        provider: &dyn MetaProvider,
        options: ParseOptions,
    ) -> RainDocument {
        Builder {
            provider,
            chain: Vec::new(),
            options,
        }
        .build(text)
    }

    pub fn binding(&self, name: &str) -> Option<&Arc<Binding>> {
        self.bindings.iter().find(|binding| binding.name == name)
    }

    /// Document problems plus the parse problems of every local
    /// expression binding, all in document offsets.
    pub fn all_problems(&self) -> Vec<Problem> {
        let mut problems = self.problems.clone();
        for binding in &self.bindings {
            if let Some(parsed) = binding.parsed(&self.words, &self.namespace, self.options) {
                let base = binding.content_position.start;
                problems.extend(parsed.problems.iter().map(|problem| problem.shifted(base)));
            }
        }
        problems
    }

    pub fn import_positions(&self) -> Vec<Span> {
        self.imports.iter().map(|import| import.hash_position).collect()
    }

    /// Entrypoint resolver over this document's namespace.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.namespace, &self.words)
            .import_positions(self.import_positions())
            .options(self.options)
    }
}

/// A statement located in the sanitized body.
#[derive(Debug, Clone, Copy)]
struct Statement {
    marker: u8,
    start: usize,
    /// Exclusive.
    end: usize,
}

struct Builder<'p> {
    provider: &'p dyn MetaProvider,
    /// Hashes of the documents currently being imported, outermost first.
    chain: Vec<String>,
    options: ParseOptions,
}

impl Builder<'_> {
    fn build(&self, text: &str) -> RainDocument {
        let (sanitized, mut lexical) = blank_illegal(text);
        let (sanitized, comments, comment_problems) = blank_comments(&sanitized);
        lexical.extend(comment_problems);

        let body_start = body_start(&sanitized);
        let mut doc = RainDocument {
            text: text.to_string(),
            front_matter: slice_to(text, body_start),
            imports: Vec::new(),
            bindings: Vec::new(),
            namespace: Namespace::new(),
            words: Vec::new(),
            problems: Vec::new(),
            comments,
            options: self.options,
        };

        let statements = locate_statements(&sanitized, body_start);
        let first = statements.first().map_or(sanitized.len(), |s| s.start);
        let mut problems = Vec::new();
        if let Some(garbage) = trimmed_span(&sanitized[body_start..first], body_start) {
            problems.push(Problem::new(ErrorCode::UnexpectedToken, "unexpected token", garbage));
        }

        for statement in &statements {
            match statement.marker {
                b'@' => self.parse_import(&mut doc, &sanitized, statement, &mut problems),
                _ => parse_binding(&mut doc, &sanitized, statement, &mut problems),
            }
        }

        // expression bindings report their own lexical problems when parsed
        lexical.retain(|problem| {
            !doc.bindings.iter().any(|binding| {
                binding.is_expression() && binding.content_position.contains_span(problem.position)
            })
        });
        lexical.extend(problems);
        doc.problems = lexical;

        self.assemble(&mut doc);
        debug!(
            depth = self.chain.len(),
            imports = doc.imports.len(),
            bindings = doc.bindings.len(),
            problems = doc.problems.len(),
            "assembled rain document"
        );
        doc
    }

    fn parse_import(
        &self,
        doc: &mut RainDocument,
        sanitized: &str,
        statement: &Statement,
        problems: &mut Vec<Problem>,
    ) {
        let base = statement.start + 1;
        let mut parts = tokens(&sanitized[base..statement.end], base).into_iter().peekable();
        let position = trimmed_span(&sanitized[statement.start..statement.end], statement.start)
            .unwrap_or(Span::point(statement.start));

        let (name, name_position) = match parts.peek() {
            Some((token, span)) if is_word(token) || token == ROOT_IMPORT => {
                let named = (token.clone(), *span);
                parts.next();
                named
            }
            _ => (ROOT_IMPORT.to_string(), Span::point(statement.start)),
        };

        let mut import = Import {
            name,
            name_position,
            hash: String::new(),
            hash_position: position,
            position,
            problems: Vec::new(),
            reconfigs: Vec::new(),
            sequence: ImportSequence::default(),
        };

        match parts.next() {
            None => import.problems.push(Problem::new(
                ErrorCode::ExpectedHash,
                "expected import hash",
                position,
            )),
            Some((hash, span)) => {
                import.hash_position = span;
                if is_hash(&hash) {
                    import.hash = hash.to_ascii_lowercase();
                } else {
                    import.problems.push(Problem::new(
                        ErrorCode::InvalidHash,
                        format!("invalid hash: {hash}"),
                        span,
                    ));
                }
            }
        }

        let rest: Vec<(String, Span)> = parts.collect();
        for pair in rest.chunks(2) {
            match pair {
                [(key, key_position), (value, value_position)] => import.reconfigs.push(Reconfig {
                    key: key.clone(),
                    key_position: *key_position,
                    value: value.clone(),
                    value_position: *value_position,
                }),
                [(_, key_position)] => import.problems.push(Problem::new(
                    ErrorCode::ExpectedElisionOrRebinding,
                    "expected elision or rebinding",
                    *key_position,
                )),
                _ => {}
            }
        }

        if !import.hash.is_empty() {
            let duplicate = doc
                .imports
                .iter()
                .any(|other| other.hash == import.hash && other.name == import.name);
            if duplicate {
                problems.push(Problem::new(
                    ErrorCode::DuplicateImport,
                    format!("duplicate import: {}", import.hash),
                    position,
                ));
                return;
            }
            self.fetch(&mut import);
        }

        problems.extend(import.problems.iter().cloned());
        doc.imports.push(import);
    }

    fn fetch(&self, import: &mut Import) {
        let at = import.hash_position;
        if self.chain.contains(&import.hash) {
            import.problems.push(Problem::new(
                ErrorCode::CircularDependency,
                format!("circular import: {}", import.hash),
                at,
            ));
            return;
        }
        if self.chain.len() >= MAX_DEPTH {
            import.problems.push(Problem::new(
                ErrorCode::DeepImport,
                "import too deep",
                at,
            ));
            return;
        }

        let hash = import.hash.as_str();
        import.sequence.dispair = self.provider.authoring_words(hash);
        import.sequence.ctxmeta = self.provider.context_aliases(hash);
        import.sequence.dotrain = self.provider.document(hash).map(|text| {
            let mut chain = self.chain.clone();
            chain.push(hash.to_string());
            let child = Builder {
                provider: self.provider,
                chain,
                options: self.options,
            };
            Arc::new(child.build(&text))
        });

        if import.sequence.is_empty() {
            import.problems.push(Problem::new(
                ErrorCode::UndefinedMeta,
                format!("cannot find any meta for hash: {hash}"),
                at,
            ));
        } else if let Some(imported) = &import.sequence.dotrain {
            if !imported.all_problems().is_empty() {
                import.problems.push(Problem::new(
                    ErrorCode::InvalidImport,
                    "imported document has problems",
                    at,
                ));
            }
        }
    }

    /// Mount local bindings and every import into the document namespace.
    fn assemble(&self, doc: &mut RainDocument) {
        for binding in &doc.bindings {
            let node = NamespaceNode::local(Element::Binding(Arc::clone(binding)));
            if let Err(err) = doc.namespace.insert_node(&binding.name, node) {
                doc.problems.push(namespace_problem(&err, binding.name_position));
            }
        }

        for (index, import) in doc.imports.iter().enumerate() {
            let mut sub = Namespace::new();
            let mut problems = Vec::new();
            let tag = |element| NamespaceNode {
                hash: import.hash.clone(),
                import_index: Some(index),
                element,
            };

            for word in import.sequence.dispair.iter().flatten() {
                if let Err(err) = sub.insert_node(&word.word, tag(Element::Word(word.clone()))) {
                    problems.push(namespace_problem(&err, import.hash_position));
                }
            }
            for alias in import.sequence.ctxmeta.iter().flatten() {
                if let Err(err) = sub.insert_node(&alias.name, tag(Element::ContextAlias(alias.clone()))) {
                    problems.push(namespace_problem(&err, import.hash_position));
                }
            }
            match &import.sequence.dotrain {
                Some(imported) => {
                    let mut namespace = imported.namespace.clone();
                    // reconfigured constants must reach the imported expressions
                    namespace.detach_bindings();
                    problems.extend(reconfigure(&mut namespace, &import.reconfigs));
                    for err in sub.merge(namespace) {
                        problems.push(namespace_problem(&err, import.hash_position));
                    }
                }
                None => problems.extend(import.reconfigs.iter().map(|reconfig| {
                    Problem::new(
                        ErrorCode::UndefinedIdentifier,
                        format!("undefined identifier: {}", reconfig.key),
                        reconfig.key_position,
                    )
                })),
            }
            sub.retag(&import.hash, index);

            let errors = if import.name == ROOT_IMPORT {
                doc.namespace.merge(sub)
            } else {
                doc.namespace.mount(&import.name, sub)
            };
            for err in errors {
                let at = match err {
                    NamespaceError::Occupied(_) => import.name_position,
                    _ => import.hash_position,
                };
                problems.push(namespace_problem(&err, at));
            }

            if import.name == ROOT_IMPORT {
                let imported_words = import
                    .sequence
                    .dotrain
                    .iter()
                    .flat_map(|imported| imported.words.iter());
                for word in import.sequence.dispair.iter().flatten().chain(imported_words) {
                    if !doc.words.iter().any(|known| known.word == word.word) {
                        doc.words.push(word.clone());
                    }
                }
            }
            doc.problems.extend(problems);
        }
    }
}

fn namespace_problem(err: &NamespaceError, at: Span) -> Problem {
    Problem::new(err.code(), err.to_string(), at)
}

/// Apply import reconfigurations to the imported namespace's root.
fn reconfigure(namespace: &mut Namespace, reconfigs: &[Reconfig]) -> Vec<Problem> {
    let mut problems = Vec::new();
    for reconfig in reconfigs {
        let key = reconfig.key.strip_prefix('\'').unwrap_or(&reconfig.key);
        let node = match namespace.get(key) {
            Some(NamespaceItem::Node(node)) if node.binding().is_some() => node.clone(),
            _ => {
                problems.push(Problem::new(
                    ErrorCode::UndefinedIdentifier,
                    format!("undefined identifier: {key}"),
                    reconfig.key_position,
                ));
                continue;
            }
        };
        let Some(binding) = node.binding() else {
            continue;
        };

        let value = reconfig.value.as_str();
        let (target, replaced) = if let Some(renamed) = value.strip_prefix('\'') {
            if !is_word(renamed) {
                problems.push(Problem::new(
                    ErrorCode::InvalidWordPattern,
                    format!("invalid pattern for binding name: {renamed}"),
                    reconfig.value_position,
                ));
                continue;
            }
            let mut binding = Binding::clone(binding);
            binding.name = renamed.to_string();
            (renamed, binding)
        } else if value == "!" {
            (
                key,
                Binding::new_elided(key, binding.name_position, ELIDED_BY_IMPORT, binding.content_position),
            )
        } else if classify_numeric(value).is_some() {
            if !fits_u256(value) {
                problems.push(Problem::new(
                    ErrorCode::OutOfRangeValue,
                    "value out of range",
                    reconfig.value_position,
                ));
                continue;
            }
            (
                key,
                Binding::new_constant(key, binding.name_position, value, binding.content_position),
            )
        } else {
            problems.push(Problem::new(
                ErrorCode::ExpectedElisionOrRebinding,
                format!("expected elision or rebinding for {key}"),
                reconfig.value_position,
            ));
            continue;
        };

        namespace.remove(key);
        let node = NamespaceNode {
            element: Element::Binding(Arc::new(replaced)),
            ..node
        };
        if let Err(err) = namespace.insert_node(target, node) {
            problems.push(namespace_problem(&err, reconfig.value_position));
        }
    }
    problems
}

fn parse_binding(
    doc: &mut RainDocument,
    sanitized: &str,
    statement: &Statement,
    problems: &mut Vec<Problem>,
) {
    let base = statement.start + 1;
    let body = &sanitized[base..statement.end];
    let name_len = body.bytes().take_while(|byte| !is_whitespace(*byte)).count();
    if name_len == 0 {
        problems.push(Problem::new(
            ErrorCode::ExpectedName,
            "expected binding name",
            Span::point(statement.start),
        ));
        return;
    }

    let name = &body[..name_len];
    let name_position = Span::new(base, base + name_len - 1);
    if !is_word(name) {
        problems.push(Problem::new(
            ErrorCode::InvalidBindingIdentifier,
            format!("invalid binding identifier: {name}"),
            name_position,
        ));
        return;
    }
    if doc.binding(name).is_some() {
        problems.push(Problem::new(
            ErrorCode::DuplicateIdentifier,
            format!("duplicate identifier: {name}"),
            name_position,
        ));
        return;
    }

    let rest_start = base + name_len;
    let Some(content_position) = trimmed_span(&body[name_len..], rest_start) else {
        let problem = Problem::new(
            ErrorCode::InvalidEmptyBinding,
            format!("empty binding: {name}"),
            name_position,
        );
        problems.push(problem.clone());
        let mut binding =
            Binding::new_elided(name, name_position, EMPTY_BINDING, Span::point(name_position.end));
        binding.problems.push(problem);
        doc.bindings.push(Arc::new(binding));
        return;
    };

    let content = slice(&doc.text, content_position);
    let working = &sanitized[content_position.start..=content_position.end];
    let binding = if let Some(reason) = content.strip_prefix('!') {
        let reason = reason.trim();
        let reason = if reason.is_empty() { DEFAULT_ELIDED } else { reason };
        Binding::new_elided(name, name_position, reason, content_position)
    } else if !working.bytes().any(is_whitespace) && classify_numeric(working).is_some() {
        let mut binding = Binding::new_constant(name, name_position, working, content_position);
        if !fits_u256(working) {
            binding.problems.push(Problem::new(
                ErrorCode::OutOfRangeValue,
                "value out of range",
                content_position,
            ));
        }
        binding
    } else if let Some(constant) = find_constant(working) {
        Binding::new_constant(name, name_position, constant.value, content_position)
    } else {
        Binding::new_expression(name, name_position, &content, content_position)
    };

    problems.extend(binding.problems.iter().cloned());
    doc.bindings.push(Arc::new(binding));
}

/// Offset of the body: just past the front matter separator line, or 0
/// when there is none.
fn body_start(sanitized: &str) -> usize {
    let mut offset = 0;
    for line in sanitized.split_inclusive('\n') {
        offset += line.len();
        if line.trim() == FRONT_MATTER_SEPARATOR {
            return offset;
        }
    }
    0
}

/// Front matter text, excluding the separator line.
fn slice_to(text: &str, body_start: usize) -> String {
    if body_start == 0 {
        return String::new();
    }
    let head = slice(text, Span::new(0, body_start - 1));
    let mut lines: Vec<&str> = head.split_inclusive('\n').collect();
    lines.pop();
    lines.concat()
}

fn locate_statements(sanitized: &str, body_start: usize) -> Vec<Statement> {
    let bytes = sanitized.as_bytes();
    let mut markers = Vec::new();
    for index in body_start..bytes.len() {
        let at_boundary = index == body_start || is_whitespace(bytes[index - 1]);
        if at_boundary && matches!(bytes[index], b'@' | b'#') {
            markers.push(index);
        }
    }
    markers
        .iter()
        .enumerate()
        .map(|(position, &start)| Statement {
            marker: bytes[start],
            start,
            end: markers.get(position + 1).copied().unwrap_or(bytes.len()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MetaStore;

    fn hash(fill: char) -> String {
        format!("0x{}", fill.to_string().repeat(64))
    }

    fn store() -> MetaStore {
        let mut store = MetaStore::new();
        store.insert_words(
            &hash('a'),
            vec![
                AuthoringWord::new("add", "adds"),
                AuthoringWord::new("call", "").with_operand_args(&["source"]),
            ],
        );
        store.insert_context(
            &hash('c'),
            vec![ContextAlias {
                name: "sender".to_string(),
                description: String::new(),
                column: 0,
                row: Some(0),
            }],
        );
        store.insert_document(
            &hash('d'),
            format!("@ {}\n#rate 5\n#double _: add(rate rate);\n", hash('a')),
        );
        store
    }

    fn codes(problems: &[Problem]) -> Vec<ErrorCode> {
        problems.iter().map(|problem| problem.code).collect()
    }

    #[test]
    fn parses_front_matter_and_bindings() {
        let text = format!(
            "title: fees\n---\n@ {}\n#fee 1000\n#later ! not yet wired\n#main\n_: add(fee 1);\n",
            hash('a')
        );
        let doc = RainDocument::create(&text, &store());
        assert!(doc.all_problems().is_empty(), "{:?}", doc.all_problems());
        assert_eq!(doc.front_matter, "title: fees\n");
        assert_eq!(doc.bindings.len(), 3);
        assert_eq!(doc.binding("fee").and_then(|b| b.constant()), Some("1000"));
        assert_eq!(doc.binding("later").and_then(|b| b.elided()), Some("not yet wired"));
        let main = doc.binding("main").expect("main");
        assert!(main.is_expression());
        assert_eq!(main.content, "_: add(fee 1);");
        assert_eq!(slice(&text, main.content_position), main.content);
        assert_eq!(doc.words.len(), 2);
    }

    #[test]
    fn binding_problems_are_in_document_offsets() {
        let text = format!("@ {}\n#main _: nope(1);", hash('a'));
        let doc = RainDocument::create(&text, &store());
        let problems = doc.all_problems();
        assert_eq!(codes(&problems), [ErrorCode::UndefinedOpcode]);
        let start = text.find("nope").expect("nope");
        assert_eq!(problems[0].position, Span::new(start, start + 3));
    }

    #[test]
    fn reports_statement_problems() {
        let text = "junk\n#Bad 1\n#\n#ok 1\n#ok 2\n#empty\n#big 0x1".to_string() + &"0".repeat(64);
        let doc = RainDocument::create(&text, &MetaStore::new());
        assert_eq!(
            codes(&doc.problems),
            [
                ErrorCode::UnexpectedToken,
                ErrorCode::InvalidBindingIdentifier,
                ErrorCode::ExpectedName,
                ErrorCode::DuplicateIdentifier,
                ErrorCode::InvalidEmptyBinding,
                ErrorCode::OutOfRangeValue,
            ]
        );
        assert_eq!(doc.problems[0].position, Span::new(0, 3));
        assert!(doc.binding("empty").and_then(|b| b.elided()).is_some());
    }

    #[test]
    fn named_imports_mount_under_their_name() {
        let text = format!("@ math {}\n@ ctx {}\n#main _: math.add(1 ctx.sender());", hash('a'), hash('c'));
        let doc = RainDocument::create(&text, &store());
        assert!(doc.all_problems().is_empty(), "{:?}", doc.all_problems());
        assert!(doc.words.is_empty());
        let (node, _) = doc.namespace.resolve("math.add").expect("math.add");
        assert_eq!(node.import_index, Some(0));
        assert_eq!(node.hash, hash('a'));
        let (node, _) = doc.namespace.resolve("ctx.sender").expect("ctx.sender");
        assert_eq!(node.import_index, Some(1));
    }

    #[test]
    fn imported_documents_and_reconfigs() {
        let text = format!(
            "@ {a}\n@ lib {d} rate 7 double 'twice\n#main _: add(lib.rate 1);",
            a = hash('a'),
            d = hash('d')
        );
        let doc = RainDocument::create(&text, &store());
        assert!(doc.all_problems().is_empty(), "{:?}", doc.all_problems());
        let (rate, _) = doc.namespace.resolve("lib.rate").expect("rate");
        assert_eq!(rate.binding().and_then(|b| b.constant()), Some("7"));
        assert!(doc.namespace.resolve("lib.twice").is_ok());
        assert!(doc.namespace.resolve("lib.double").is_err());
        // the imported document's words come along through the import
        assert!(doc.namespace.resolve("lib.add").is_ok());
    }

    #[test]
    fn import_problems() {
        let text = format!(
            "@ {a}\n@ {a}\n@ 0x12\n@ {m}\n@ x {a} rate\n@ y {a} nope 1",
            a = hash('a'),
            m = hash('9')
        );
        let doc = RainDocument::create(&text, &store());
        assert_eq!(
            codes(&doc.problems),
            [
                ErrorCode::DuplicateImport,
                ErrorCode::InvalidHash,
                ErrorCode::UndefinedMeta,
                ErrorCode::ExpectedElisionOrRebinding,
                ErrorCode::UndefinedIdentifier,
            ]
        );
        let missing = text.find(&hash('9')).expect("hash");
        assert_eq!(doc.problems[2].position, Span::new(missing, missing + 65));
    }

    #[test]
    fn circular_and_broken_imports() {
        let mut store = store();
        store.insert_document(&hash('e'), format!("@ {}\n#x 1", hash('f')));
        store.insert_document(&hash('f'), format!("@ {}\n#y 1", hash('e')));
        store.insert_document(&hash('b'), "#broken _: nope(1);");

        let doc = RainDocument::create(&format!("@ {}", hash('e')), &store);
        assert_eq!(codes(&doc.problems), [ErrorCode::InvalidImport]);
        let inner = doc.imports[0].sequence.dotrain.as_ref().expect("imported");
        let innermost = inner.imports[0].sequence.dotrain.as_ref().expect("imported");
        assert_eq!(codes(&innermost.problems), [ErrorCode::CircularDependency]);

        let doc = RainDocument::create(&format!("@ {}", hash('b')), &store);
        assert_eq!(codes(&doc.problems), [ErrorCode::InvalidImport]);
    }

    #[test]
    fn colliding_imports_are_reported() {
        let text = format!("#math 1\n@ math {}", hash('a'));
        let doc = RainDocument::create(&text, &store());
        assert_eq!(codes(&doc.problems), [ErrorCode::OccupiedNamespace]);

        let mut store = store();
        store.insert_words(&hash('b'), vec![AuthoringWord::new("add", "other")]);
        let text = format!("@ {}\n@ {}\n#main _: add(1 2);", hash('a'), hash('b'));
        let doc = RainDocument::create(&text, &store);
        assert!(doc.problems.is_empty());
        assert_eq!(doc.words[0].description, "adds");
        assert!(matches!(
            doc.namespace.resolve("add").expect("add").0.element,
            Element::Words(_)
        ));
    }

    #[test]
    fn comments_and_illegal_chars_in_content_are_reported_once() {
        let text = format!("@ {}\n/* doc */\n#main _: add(1 \u{e9});", hash('a'));
        let doc = RainDocument::create(&text, &store());
        assert!(doc.problems.is_empty());
        assert_eq!(codes(&doc.all_problems()), [ErrorCode::IllegalChar]);
        assert_eq!(doc.comments.len(), 1);
    }
}
