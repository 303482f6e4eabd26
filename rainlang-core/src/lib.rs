//! Core front end for Rainlang documents.
//!
//! The pipeline is roughly:
//!
//!   document text
//!     -> document   (front matter, imports, bindings, namespace)
//!     -> parser     (per-binding AST and problems)
//!     -> dependency (entrypoints and the bindings they quote)
//!     -> rewrite    (one composite program plus a source map)
//!     -> compiler   (composite validation and backend hand-off)
//!
//! Malformed input is reported as [`Problem`]s with positions in the
//! text the author wrote. Editors and the `rainc` binary should depend
//! on this crate rather than reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod span;
pub mod diagnostic;
pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod lexer;
pub mod ast;
pub mod parser;

// ---------------------------------------------------------------------
// Meta, namespaces and documents
// ---------------------------------------------------------------------

pub mod meta;
pub mod store;
pub mod builtins;
pub mod namespace;
pub mod binding;
pub mod document;

// ---------------------------------------------------------------------
// Back-end: resolution, flattening and compiler orchestration
// ---------------------------------------------------------------------

pub mod dependency;
pub mod edit;
pub mod rewrite;
pub mod compiler;

#[cfg(test)]
mod property_tests;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use binding::Binding;
pub use compiler::{
    Artifact, Backend, CompileError, Composition, NativeError, compile, compose, compose_from_dir,
};
pub use dependency::{EntrypointError, Resolution, Resolver};
pub use diagnostic::{ErrorCode, Problem};
pub use document::RainDocument;
pub use error::CoreError;
pub use meta::{AuthoringWord, ContextAlias, MetaProvider};
pub use namespace::{Namespace, ResolveError};
pub use parser::{ParseContext, ParseOptions, ParseResult, parse};
pub use span::{Span, line_col};
pub use store::MetaStore;
