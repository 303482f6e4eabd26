//! Metadata consumed by the parser and the document layer, and the
//! provider interface used to fetch it by hash.

use serde::{Deserialize, Serialize};

/// Name and description of one operand argument of a word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperandArgSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// An opcode word as described by authoring meta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoringWord {
    pub word: String,
    #[serde(default)]
    pub description: String,
    /// Declared operand args; empty when the word takes none or does
    /// not describe them.
    #[serde(default)]
    pub operand_args: Vec<OperandArgSpec>,
}

impl AuthoringWord {
    pub fn new(word: impl Into<String>, description: impl Into<String>) -> Self {
        AuthoringWord {
            word: word.into(),
            description: description.into(),
            operand_args: Vec::new(),
        }
    }

    pub fn with_operand_args(mut self, names: &[&str]) -> Self {
        self.operand_args = names
            .iter()
            .map(|name| OperandArgSpec {
                name: (*name).to_string(),
                description: String::new(),
            })
            .collect();
        self
    }
}

/// Named read of a context cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextAlias {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub column: u32,
    /// `None` means the row is supplied at the call site.
    #[serde(default)]
    pub row: Option<u32>,
}

/// Source of meta and imported documents, keyed by meta hash.
///
/// Implementations may fetch from a network or a cache; `None` after a
/// fetch is a hard resolution failure for the caller.
pub trait MetaProvider {
    fn authoring_words(&self, hash: &str) -> Option<Vec<AuthoringWord>>;
    fn context_aliases(&self, hash: &str) -> Option<Vec<ContextAlias>>;
    fn document(&self, hash: &str) -> Option<String>;
}

/// Find a word by name, first occurrence wins.
pub fn find_word<'a>(words: &'a [AuthoringWord], name: &str) -> Option<&'a AuthoringWord> {
    words.iter().find(|word| word.word == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_sparse_json() {
        let words: Vec<AuthoringWord> =
            serde_json::from_str(r#"[{"word":"add"},{"word":"read","operand_args":[{"name":"slot"}]}]"#)
                .expect("decode words");
        assert_eq!(words[0], AuthoringWord::new("add", ""));
        assert_eq!(words[1].operand_args[0].name, "slot");

        let aliases: Vec<ContextAlias> =
            serde_json::from_str(r#"[{"name":"sender","column":0,"row":0},{"name":"arg","column":1}]"#)
                .expect("decode aliases");
        assert_eq!(aliases[0].row, Some(0));
        assert_eq!(aliases[1].row, None);
    }

    #[test]
    fn finds_first_word() {
        let words = vec![AuthoringWord::new("add", "first"), AuthoringWord::new("add", "second")];
        assert_eq!(find_word(&words, "add").map(|w| w.description.as_str()), Some("first"));
        assert!(find_word(&words, "sub").is_none());
    }
}
