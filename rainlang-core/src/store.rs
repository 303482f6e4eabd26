//! In-memory meta store, optionally loaded from a directory tree.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::CoreError;
use crate::lexer::is_hash;
use crate::meta::{AuthoringWord, ContextAlias, MetaProvider};

const WORDS_SUFFIX: &str = ".words.json";
const CONTEXT_SUFFIX: &str = ".ctx.json";
const DOCUMENT_SUFFIX: &str = ".rain";

/// Meta and documents keyed by lowercase meta hash.
#[derive(Debug, Clone, Default)]
pub struct MetaStore {
    words: HashMap<String, Vec<AuthoringWord>>,
    contexts: HashMap<String, Vec<ContextAlias>>,
    documents: HashMap<String, String>,
}

impl MetaStore {
    pub fn new() -> Self {
        MetaStore::default()
    }

    pub fn insert_words(&mut self, hash: &str, words: Vec<AuthoringWord>) {
        self.words.insert(hash.to_ascii_lowercase(), words);
    }

    pub fn insert_context(&mut self, hash: &str, aliases: Vec<ContextAlias>) {
        self.contexts.insert(hash.to_ascii_lowercase(), aliases);
    }

    pub fn insert_document(&mut self, hash: &str, text: impl Into<String>) {
        self.documents.insert(hash.to_ascii_lowercase(), text.into());
    }

    pub fn len(&self) -> usize {
        self.words.len() + self.contexts.len() + self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load every `<hash>.words.json`, `<hash>.ctx.json` and
    /// `<hash>.rain` file under `root`.
    ///
    /// Files whose stem is not a meta hash are skipped. Undecodable JSON
    /// is an error.
    pub fn from_dir(root: impl AsRef<Path>) -> Result<Self, CoreError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(CoreError::MissingStore(root.to_path_buf()));
        }
        let mut store = MetaStore::new();
        for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if let Some(hash) = hash_stem(file_name, WORDS_SUFFIX) {
                store.insert_words(hash, decode(path)?);
            } else if let Some(hash) = hash_stem(file_name, CONTEXT_SUFFIX) {
                store.insert_context(hash, decode(path)?);
            } else if let Some(hash) = hash_stem(file_name, DOCUMENT_SUFFIX) {
                store.insert_document(hash, fs::read_to_string(path)?);
            } else {
                warn!(path = %path.display(), "skipping file that is not named after a meta hash");
            }
        }
        debug!(root = %root.display(), entries = store.len(), "loaded meta store");
        Ok(store)
    }
}

fn hash_stem<'a>(file_name: &'a str, suffix: &str) -> Option<&'a str> {
    file_name.strip_suffix(suffix).filter(|stem| is_hash(stem))
}

fn decode<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CoreError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|err| CoreError::CorruptMeta {
        path: PathBuf::from(path),
        message: err.to_string(),
    })
}

impl MetaProvider for MetaStore {
    fn authoring_words(&self, hash: &str) -> Option<Vec<AuthoringWord>> {
        self.words.get(&hash.to_ascii_lowercase()).cloned()
    }

    fn context_aliases(&self, hash: &str) -> Option<Vec<ContextAlias>> {
        self.contexts.get(&hash.to_ascii_lowercase()).cloned()
    }

    fn document(&self, hash: &str) -> Option<String> {
        self.documents.get(&hash.to_ascii_lowercase()).cloned()
    }
}
