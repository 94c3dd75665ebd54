//! Syntax error types
//!
//! Every error carries the byte offset at which it was detected; line and
//! column are derived on demand from the original query text.

use crate::dialect::CypherVersion;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyntaxError>;

/// Error produced while parsing a query. The parser stops at the first
/// error; there is no recovery and no partial query tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    /// Illegal character, unterminated string, bad escape, malformed number.
    #[error("invalid input at offset {offset}: {message}")]
    Lexical { offset: usize, message: String },

    /// The parser expected one of a set of tokens and found something else.
    #[error("unexpected input at offset {offset}: expected {expected:?}, found {found}")]
    UnexpectedToken {
        offset: usize,
        expected: Vec<String>,
        found: String,
    },

    /// A construct that is only valid under a different language version.
    #[error("{feature} is not supported in cypher {version} (offset {offset})")]
    DialectFeature {
        offset: usize,
        feature: String,
        version: CypherVersion,
    },

    /// Structurally valid syntax with an unsupported shape, such as a
    /// composite index or an index without properties.
    #[error("{message} (offset {offset})")]
    SemanticArity { offset: usize, message: String },

    /// Invariant violation in the query-tree builder. Never triggered by
    /// well-formed input.
    #[error("internal parser error at offset {offset}: {message}")]
    Internal { offset: usize, message: String },
}

impl SyntaxError {
    /// Byte offset into the query text at which the error was detected.
    pub fn offset(&self) -> usize {
        match self {
            SyntaxError::Lexical { offset, .. }
            | SyntaxError::UnexpectedToken { offset, .. }
            | SyntaxError::DialectFeature { offset, .. }
            | SyntaxError::SemanticArity { offset, .. }
            | SyntaxError::Internal { offset, .. } => *offset,
        }
    }

    /// 1-based `(line, column)` of the error in `source`.
    ///
    /// Columns count bytes within the line, which matches how offsets are
    /// reported everywhere else in this crate.
    pub fn position(&self, source: &str) -> (usize, usize) {
        let offset = self.offset().min(source.len());
        let mut line = 1;
        let mut line_start = 0;
        for (i, b) in source.as_bytes()[..offset].iter().enumerate() {
            if *b == b'\n' {
                line += 1;
                line_start = i + 1;
            }
        }
        (line, offset - line_start + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_first_line() {
        let err = SyntaxError::Lexical {
            offset: 4,
            message: "bad".into(),
        };
        assert_eq!(err.position("start"), (1, 5));
    }

    #[test]
    fn test_position_later_line() {
        let err = SyntaxError::Lexical {
            offset: 8,
            message: "bad".into(),
        };
        assert_eq!(err.position("start\nx=node"), (2, 3));
    }

    #[test]
    fn test_position_clamps_to_input() {
        let err = SyntaxError::Lexical {
            offset: 99,
            message: "bad".into(),
        };
        assert_eq!(err.position("ab"), (1, 3));
    }
}
