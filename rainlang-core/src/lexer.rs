//! Length-preserving blanking, positioned splitting and the fixed
//! textual patterns shared by the parser and the document layer.
//!
//! Every rewrite here replaces text with the same number of blank
//! UTF-16 units, so an offset computed on the output indexes the input.

use crate::ast::Comment;
use crate::diagnostic::{ErrorCode, Problem};
use crate::span::Span;

/// Maximum number of hex digits in a 256-bit value.
const MAX_HEX_DIGITS: usize = 64;
/// Maximum number of binary digits in a 256-bit value.
const MAX_BINARY_DIGITS: usize = 256;
/// `2^256 - 1` in decimal.
pub const MAX_UINT256: &str =
    "115792089237316195423570985008687907853269984665640564039457584007913129639935";

/// A positioned piece of text produced by [`split`].
///
/// `start` is the absolute offset of the first unit; `separator`
/// is the absolute offset of the separator that terminated the chunk,
/// if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub start: usize,
    pub separator: Option<usize>,
}

impl Chunk {
    pub fn is_blank(&self) -> bool {
        self.text.bytes().all(is_whitespace)
    }

    /// Span of the chunk with surrounding whitespace removed.
    pub fn trimmed_span(&self) -> Option<Span> {
        trimmed_span(&self.text, self.start)
    }
}

/// Replace every character outside printable ASCII and whitespace with
/// one blank per UTF-16 unit. One `IllegalChar` problem is reported per
/// run.
pub fn blank_illegal(text: &str) -> (String, Vec<Problem>) {
    let mut output = String::with_capacity(text.len());
    let mut problems = Vec::new();
    let mut run: Option<usize> = None;

    for ch in text.chars() {
        let index = output.len();
        if is_legal_char(ch) {
            if let Some(start) = run.take() {
                problems.push(illegal_run(start, index - 1));
            }
            output.push(ch);
        } else {
            run.get_or_insert(index);
            output.extend(core::iter::repeat_n(' ', ch.len_utf16()));
        }
    }
    if let Some(start) = run {
        problems.push(illegal_run(start, output.len() - 1));
    }
    (output, problems)
}

fn illegal_run(start: usize, end: usize) -> Problem {
    Problem::new(ErrorCode::IllegalChar, "illegal character", Span::new(start, end))
}

/// Replace block comments with blanks, keeping newlines.
///
/// `text` must already be ASCII (see [`blank_illegal`]). An unterminated
/// comment runs to the end of the text and reports
/// `UnexpectedEndOfComment` over the same span it is recorded with.
pub fn blank_comments(text: &str) -> (String, Vec<Comment>, Vec<Problem>) {
    let bytes = text.as_bytes();
    let mut output = bytes.to_vec();
    let mut comments = Vec::new();
    let mut problems = Vec::new();
    let mut index = 0;

    while index + 1 < bytes.len() {
        if bytes[index] != b'/' || bytes[index + 1] != b'*' {
            index += 1;
            continue;
        }
        let start = index;
        let close = find_from(bytes, start + 2, b"*/");
        let end = match close {
            Some(at) => at + 1,
            None => bytes.len() - 1,
        };
        let position = Span::new(start, end);
        if close.is_none() {
            problems.push(Problem::new(
                ErrorCode::UnexpectedEndOfComment,
                "unexpected end of comment",
                position,
            ));
        }
        comments.push(Comment {
            comment: text[start..=end].to_string(),
            position,
        });
        for byte in &mut output[start..=end] {
            if *byte != b'\n' {
                *byte = b' ';
            }
        }
        index = end + 1;
    }

    let output = String::from_utf8(output).unwrap_or_else(|_| " ".repeat(text.len()));
    (output, comments, problems)
}

fn find_from(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from > bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|at| at + from)
}

/// Split ASCII `text` on `separator`, keeping absolute positions.
///
/// The separators themselves are not part of any chunk. The final chunk
/// is always present (possibly empty) and has no separator.
pub fn split(text: &str, separator: u8, base: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for (index, byte) in text.bytes().enumerate() {
        if byte == separator {
            chunks.push(Chunk {
                text: text[start..index].to_string(),
                start: base + start,
                separator: Some(base + index),
            });
            start = index + 1;
        }
    }
    chunks.push(Chunk {
        text: text[start..].to_string(),
        start: base + start,
        separator: None,
    });
    chunks
}

/// Whitespace-separated tokens of ASCII `text` with absolute spans.
pub fn tokens(text: &str, base: usize) -> Vec<(String, Span)> {
    let bytes = text.as_bytes();
    let mut result = Vec::new();
    let mut index = 0;
    while index < bytes.len() {
        if is_whitespace(bytes[index]) {
            index += 1;
            continue;
        }
        let start = index;
        while index < bytes.len() && !is_whitespace(bytes[index]) {
            index += 1;
        }
        result.push((
            text[start..index].to_string(),
            Span::new(base + start, base + index - 1),
        ));
    }
    result
}

/// Span of `text` (starting at `base`) without leading and trailing
/// whitespace, `None` if it is blank.
pub fn trimmed_span(text: &str, base: usize) -> Option<Span> {
    let bytes = text.as_bytes();
    let first = bytes.iter().position(|b| !is_whitespace(*b))?;
    let last = bytes.iter().rposition(|b| !is_whitespace(*b))?;
    Some(Span::new(base + first, base + last))
}

pub fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\n' | b'\r')
}

pub fn is_legal_char(ch: char) -> bool {
    matches!(ch, ' '..='~' | '\t' | '\n' | '\r')
}

/// Characters that end an RHS token.
pub fn is_boundary(ch: u8) -> bool {
    matches!(ch, b'(' | b')' | b'<' | b'>') || is_whitespace(ch)
}

/// Namespace word: lowercase start, lowercase/digit/hyphen body.
pub fn is_word(text: &str) -> bool {
    let bytes = text.as_bytes();
    match bytes.split_first() {
        Some((first, rest)) => {
            first.is_ascii_lowercase()
                && rest
                    .iter()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        }
        None => false,
    }
}

/// LHS alias: a word or the `_` placeholder.
pub fn is_alias(text: &str) -> bool {
    text == "_" || is_word(text)
}

/// Dotted namespace path, optionally starting with a `.`.
pub fn is_path(text: &str) -> bool {
    let body = text.strip_prefix('.').unwrap_or(text);
    !body.is_empty() && body.split('.').all(is_word)
}

/// Quoted binding reference used as an operand argument: `'name` or `'a.b`.
pub fn is_quote(text: &str) -> bool {
    text.strip_prefix('\'').is_some_and(is_path)
}

/// Meta hash: `0x` followed by exactly 64 hex digits.
pub fn is_hash(text: &str) -> bool {
    text.len() == 66 && is_hex(text)
}

pub fn is_hex(text: &str) -> bool {
    text.strip_prefix("0x")
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Numeric literal forms accepted on the RHS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numeric {
    Hex,
    Binary,
    Decimal,
    Scientific,
}

pub fn classify_numeric(text: &str) -> Option<Numeric> {
    if is_hex(text) {
        return Some(Numeric::Hex);
    }
    if let Some(digits) = text.strip_prefix("0b") {
        return (!digits.is_empty() && digits.bytes().all(|b| b == b'0' || b == b'1'))
            .then_some(Numeric::Binary);
    }
    if is_digits(text) {
        return Some(Numeric::Decimal);
    }
    let (mantissa, exponent) = text.split_once('e')?;
    if !is_digits(exponent) {
        return None;
    }
    let valid = match mantissa.split_once('.') {
        Some((int, frac)) => is_digits(int) && is_digits(frac),
        None => is_digits(mantissa),
    };
    valid.then_some(Numeric::Scientific)
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Whether a numeric literal denotes an integer in `[0, 2^256 - 1]`.
pub fn fits_u256(text: &str) -> bool {
    match classify_numeric(text) {
        Some(Numeric::Hex) => significant(&text[2..]).len() <= MAX_HEX_DIGITS,
        Some(Numeric::Binary) => significant(&text[2..]).len() <= MAX_BINARY_DIGITS,
        Some(Numeric::Decimal) => decimal_fits(significant(text)),
        Some(Numeric::Scientific) => scientific_digits(text)
            .is_some_and(|digits| decimal_fits(significant(&digits))),
        None => false,
    }
}

/// Integer digits of a scientific literal, `None` if it has a
/// non-zero fractional part or an absurd exponent.
fn scientific_digits(text: &str) -> Option<String> {
    let (mantissa, exponent) = text.split_once('e')?;
    let exponent: usize = exponent.parse().ok()?;
    if exponent > MAX_UINT256.len() * 2 {
        return None;
    }
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let mut digits = String::from(int);
    if exponent >= frac.len() {
        digits.push_str(frac);
        digits.extend(core::iter::repeat_n('0', exponent - frac.len()));
    } else {
        let (kept, dropped) = frac.split_at(exponent);
        if dropped.bytes().any(|b| b != b'0') {
            return None;
        }
        digits.push_str(kept);
    }
    Some(digits)
}

fn significant(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() { "0" } else { trimmed }
}

fn decimal_fits(digits: &str) -> bool {
    digits.len() < MAX_UINT256.len()
        || (digits.len() == MAX_UINT256.len() && digits <= MAX_UINT256)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blanks_illegal_runs() {
        let (text, problems) = blank_illegal("ab\u{e9}\u{e9}c\u{1f600}");
        assert_eq!(text, "ab  c  ");
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].position, Span::new(2, 3));
        // astral chars take two units
        assert_eq!(problems[1].position, Span::new(5, 6));
        assert!(problems.iter().all(|p| p.code == ErrorCode::IllegalChar));
    }

    #[test]
    fn blanks_comments_preserving_newlines() {
        let (text, comments, problems) = blank_comments("a /* x\ny */ b");
        assert_eq!(text, "a     \n     b");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].position, Span::new(2, 10));
        assert!(problems.is_empty());
    }

    #[test]
    fn unterminated_comment_spans_to_end() {
        let input = "/* never closed";
        let (text, comments, problems) = blank_comments(input);
        assert_eq!(text.trim(), "");
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].code, ErrorCode::UnexpectedEndOfComment);
        assert_eq!(problems[0].position, Span::new(0, input.len() - 1));
        assert_eq!(comments[0].position, problems[0].position);
    }

    #[test]
    fn split_keeps_positions() {
        let chunks = split("a;bc;", b';', 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].trimmed_span(), Some(Span::new(10, 10)));
        assert_eq!(chunks[0].separator, Some(11));
        assert_eq!(chunks[1].text, "bc");
        assert_eq!(chunks[1].separator, Some(14));
        assert!(chunks[2].text.is_empty() && chunks[2].separator.is_none());
    }

    #[test]
    fn tokens_and_trim() {
        let found = tokens("  ab  c ", 5);
        assert_eq!(found[0], ("ab".to_string(), Span::new(7, 8)));
        assert_eq!(found[1], ("c".to_string(), Span::new(11, 11)));
        assert_eq!(trimmed_span("  ab  c ", 5), Some(Span::new(7, 11)));
        assert_eq!(trimmed_span("   ", 0), None);
    }

    #[test]
    fn word_patterns() {
        assert!(is_word("add") && is_word("max-value2"));
        assert!(!is_word("Add") && !is_word("2x") && !is_word(""));
        assert!(is_alias("_") && !is_alias("__"));
        assert!(is_path("a.b-c.d") && is_path(".a") && !is_path("a..b") && !is_path("a."));
        assert!(is_quote("'foo") && is_quote("'ns.foo") && !is_quote("foo"));
        let hash = format!("0x{}", "ab".repeat(32));
        assert!(is_hash(&hash) && !is_hash("0x1234"));
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(classify_numeric("0x1F"), Some(Numeric::Hex));
        assert_eq!(classify_numeric("0b101"), Some(Numeric::Binary));
        assert_eq!(classify_numeric("123"), Some(Numeric::Decimal));
        assert_eq!(classify_numeric("1.5e3"), Some(Numeric::Scientific));
        assert_eq!(classify_numeric("1e18"), Some(Numeric::Scientific));
        assert_eq!(classify_numeric("1.5"), None);
        assert_eq!(classify_numeric("abc"), None);
    }

    #[test]
    fn range_checks() {
        assert!(fits_u256(MAX_UINT256));
        assert!(!fits_u256(
            "115792089237316195423570985008687907853269984665640564039457584007913129639936"
        ));
        assert!(fits_u256(&format!("0x{}", "f".repeat(64))));
        assert!(!fits_u256(&format!("0x1{}", "0".repeat(64))));
        assert!(fits_u256("1e77"));
        assert!(!fits_u256("1e78"));
        assert!(fits_u256("2.50e1"));
        assert!(!fits_u256("2.55e1"));
    }
}
