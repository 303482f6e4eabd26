use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::ast::Node;
use crate::builtins::CONTEXT_WORD;
use crate::dependency::EntrypointError;
use crate::diagnostic::{ErrorCode, Problem};
use crate::document::RainDocument;
use crate::error::CoreError;
use crate::meta::{AuthoringWord, find_word};
use crate::namespace::Namespace;
use crate::parser::{ParseContext, parse};
use crate::rewrite::{Fragment, backmap, flatten};
use crate::span::Span;
use crate::store::MetaStore;

/// Flattened program ready for a bytecode backend.
#[derive(Debug, Clone)]
pub struct Composition {
    pub text: String,
    /// Distinct literal values of the composite, in encounter order.
    pub constants: Vec<String>,
    pub fragments: Vec<Fragment>,
    /// Number of leading sources that are entrypoints.
    pub entrypoints: usize,
    import_positions: Vec<Span>,
}

impl Composition {
    /// Map a problem on the composite text back to the document.
    pub fn backmap(&self, problem: &Problem) -> Problem {
        backmap(problem, &self.fragments, &self.import_positions)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytecode: Vec<u8>,
    pub constants: Vec<String>,
}

/// Structured failure reported by a bytecode backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}({})", .args.join(", "))]
pub struct NativeError {
    pub name: String,
    pub args: Vec<String>,
    /// Composite offset (UTF-16 units) the backend failed at, if it knows one.
    pub offset: Option<usize>,
}

/// Turns composite Rainlang text into bytecode.
pub trait Backend {
    fn build(&self, text: &str, entrypoints: usize) -> Result<Artifact, NativeError>;
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Entrypoint(#[from] EntrypointError),
    #[error("found {} problem(s)", .0.len())]
    Problems(Vec<Problem>),
    #[error("backend rejected the program: {0}")]
    Native(NativeError),
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl CompileError {
    pub fn problems(&self) -> &[Problem] {
        match self {
            CompileError::Problems(problems) => problems,
            CompileError::Entrypoint(err) => err.problems(),
            _ => &[],
        }
    }
}

/// Resolve `entrypoints` in `document`, flatten them with their
/// dependencies and validate the composite program. Parse options come
/// from the document.
pub fn compose<S: AsRef<str>>(
    document: &RainDocument,
    entrypoints: &[S],
) -> Result<Composition, CompileError> {
    let problems = document.all_problems();
    if !problems.is_empty() {
        return Err(CompileError::Problems(problems));
    }

    let resolution = document.resolver().resolve(entrypoints)?;
    let flattened = flatten(&resolution)?;
    let words = composite_words(&document.words, &flattened.fragments);
    let empty = Namespace::new();
    let cx = ParseContext::new(&words, &empty).options(document.options);
    let result = parse(&flattened.text, &cx);

    let import_positions = document.import_positions();
    if !result.problems.is_empty() {
        let problems = result
            .problems
            .iter()
            .map(|problem| backmap(problem, &flattened.fragments, &import_positions))
            .collect();
        return Err(CompileError::Problems(problems));
    }

    let mut constants: Vec<String> = Vec::new();
    for source in &result.ast {
        source.walk(&mut |node| {
            if let Node::Value(value) = node {
                if !constants.contains(&value.value) {
                    constants.push(value.value.clone());
                }
            }
        });
    }

    debug!(
        entrypoints = resolution.entrypoints,
        fragments = flattened.fragments.len(),
        constants = constants.len(),
        "composed rainlang"
    );
    Ok(Composition {
        text: flattened.text,
        constants,
        fragments: flattened.fragments,
        entrypoints: resolution.entrypoints,
        import_positions,
    })
}

/// Build `text` against a meta store directory and compose it.
pub fn compose_from_dir<S: AsRef<str>>(
    text: &str,
    store_root: impl AsRef<Path>,
    entrypoints: &[S],
) -> Result<Composition, CompileError> {
    let store = MetaStore::from_dir(store_root)?;
    let document = RainDocument::create(text, &store);
    compose(&document, entrypoints)
}

/// Compose and hand the composite program to `backend`. Backend errors
/// carrying an offset become a `NativeParserError` problem at the
/// original position.
pub fn compile<S: AsRef<str>>(
    document: &RainDocument,
    entrypoints: &[S],
    backend: &dyn Backend,
) -> Result<Artifact, CompileError> {
    let composition = compose(document, entrypoints)?;
    backend
        .build(&composition.text, composition.entrypoints)
        .map_err(|err| match err.offset {
            Some(offset) => {
                let problem = Problem::new(
                    ErrorCode::NativeParserError,
                    err.to_string(),
                    Span::point(offset),
                );
                CompileError::Problems(vec![composition.backmap(&problem)])
            }
            None => CompileError::Native(err),
        })
}

/// Words the composite is validated against: the document's words, the
/// context word and every word a flattened binding resolved to.
fn composite_words(words: &[AuthoringWord], fragments: &[Fragment]) -> Vec<AuthoringWord> {
    let mut known = words.to_vec();
    let mut add = |name: &str| {
        if find_word(&known, name).is_none() {
            known.push(AuthoringWord::new(name, ""));
        }
    };
    add(CONTEXT_WORD);
    for parsed in fragments.iter().filter_map(|fragment| fragment.binding.exp()) {
        for source in &parsed.ast {
            source.walk(&mut |node| {
                if let Some(word) = node.as_opcode().and_then(|opcode| opcode.word.as_deref()) {
                    add(word);
                }
            });
        }
    }
    known
}
