//! Names the language reserves independently of any authoring meta.
//!
//! Well-known constants resolve to literal values on the RHS and can
//! never be used as LHS aliases. The context word is what context-alias
//! reads are rewritten to when bindings are flattened.

use crate::lexer::MAX_UINT256;

/// Word every context-alias read is rewritten to.
pub const CONTEXT_WORD: &str = "context";

/// A reserved constant name and the literal it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantDescriptor {
    pub name: &'static str,
    pub value: &'static str,
    pub description: &'static str,
}

/// The complete list of well-known constants.
pub const CONSTANTS: &[ConstantDescriptor] = &[
    ConstantDescriptor {
        name: "max-uint256",
        value: MAX_UINT256,
        description: "the maximum possible unsigned 256-bit integer value",
    },
    ConstantDescriptor {
        name: "max-uint-256",
        value: MAX_UINT256,
        description: "the maximum possible unsigned 256-bit integer value",
    },
    ConstantDescriptor {
        name: "infinity",
        value: MAX_UINT256,
        description: "alias of the maximum unsigned 256-bit integer value",
    },
];

/// Look up a well-known constant by name.
///
/// The search is linear over `CONSTANTS` because the table is small.
pub fn find_constant(name: &str) -> Option<&'static ConstantDescriptor> {
    CONSTANTS.iter().find(|constant| constant.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{fits_u256, is_word};

    #[test]
    fn constants_are_words_with_in_range_values() {
        for constant in CONSTANTS {
            assert!(is_word(constant.name), "{}", constant.name);
            assert!(fits_u256(constant.value), "{}", constant.name);
        }
    }

    #[test]
    fn finds_constants_by_name() {
        assert_eq!(find_constant("infinity").map(|c| c.value), Some(MAX_UINT256));
        assert!(find_constant("zero").is_none());
    }
}
