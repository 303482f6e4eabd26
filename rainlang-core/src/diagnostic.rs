//! Problems reported while parsing and resolving Rainlang.

use core::fmt;

use serde::Serialize;

use crate::span::Span;

/// Flat error taxonomy. The high nibble of the second byte groups codes:
/// `0x0xx` structural, `0x1xx` undefined, `0x2xx` invalid, `0x3xx`
/// unexpected, `0x4xx` expected, `0x5xx` mismatch, `0x6xx` out of range,
/// `0x7xx` duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u16)]
pub enum ErrorCode {
    IllegalChar = 0x000,
    RuntimeError = 0x001,
    CircularDependency = 0x002,
    UnresolvableDependencies = 0x003,
    DeepImport = 0x004,
    DeepNamespace = 0x005,
    CorruptMeta = 0x006,
    ElidedBinding = 0x007,
    MultipleWords = 0x008,
    OccupiedNamespace = 0x009,
    CollidingNamespaceNodes = 0x00a,
    NativeParserError = 0x00b,

    UndefinedWord = 0x101,
    UndefinedMeta = 0x102,
    UndefinedQuote = 0x103,
    UndefinedOpcode = 0x104,
    UndefinedIdentifier = 0x105,
    UndefinedNamespaceMember = 0x106,

    InvalidWordPattern = 0x201,
    InvalidExpression = 0x202,
    InvalidNamespaceReference = 0x203,
    InvalidEmptyBinding = 0x204,
    InvalidBindingIdentifier = 0x205,
    InvalidQuote = 0x206,
    InvalidOperandArg = 0x207,
    InvalidReference = 0x208,
    InvalidHash = 0x209,
    InvalidImport = 0x20a,
    InvalidSelfReference = 0x20b,

    UnexpectedToken = 0x301,
    UnexpectedClosingParen = 0x302,
    UnexpectedClosingAngleParen = 0x303,
    UnexpectedEndOfComment = 0x304,
    UnexpectedColon = 0x305,

    ExpectedOpcode = 0x401,
    ExpectedSpace = 0x402,
    ExpectedElisionOrRebinding = 0x403,
    ExpectedClosingParen = 0x404,
    ExpectedOpeningParen = 0x405,
    ExpectedClosingAngleBracket = 0x406,
    ExpectedName = 0x407,
    ExpectedSemi = 0x408,
    ExpectedHash = 0x409,
    ExpectedOperandArgs = 0x40a,
    ExpectedColon = 0x40b,

    MismatchRhs = 0x501,
    MismatchLhs = 0x502,
    MismatchOperandArgs = 0x503,

    OutOfRangeInputs = 0x601,
    OutOfRangeOperandArgs = 0x602,
    OutOfRangeValue = 0x603,

    DuplicateAlias = 0x701,
    DuplicateIdentifier = 0x702,
    DuplicateImport = 0x703,
}

impl ErrorCode {
    #[inline]
    pub fn value(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}(0x{:03x})", self, self.value())
    }
}

/// A single diagnostic at a position in the text it was reported on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    pub message: String,
    pub position: Span,
    pub code: ErrorCode,
}

impl Problem {
    pub fn new(code: ErrorCode, message: impl Into<String>, position: Span) -> Self {
        Problem {
            message: message.into(),
            position,
            code,
        }
    }

    /// Same problem moved forward by `by` units.
    pub fn shifted(&self, by: usize) -> Self {
        Problem {
            message: self.message.clone(),
            position: self.position.shift(by),
            code: self.code,
        }
    }

    /// Same problem reported at another position.
    pub fn relocated(&self, position: Span) -> Self {
        Problem {
            message: self.message.clone(),
            position,
            code: self.code,
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.code, self.position, self.message)
    }
}
