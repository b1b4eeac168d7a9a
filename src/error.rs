//! Error types shared across the tokenizer, parser and evaluator.

use std::fmt;

/// A `(line, column-within-line)` pair used to report where a failure
/// occurred. Lines and columns are 1-based; columns are character offsets
/// within the line, not byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcePos {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Character-class predicate failures raised while scanning raw input.
#[derive(Debug, thiserror::Error)]
pub enum TokenizerError {
    #[error("{pos}: unexpected end of input")]
    UnexpectedEof { pos: SourcePos },

    #[error("{pos}: expected character {expected:?}, found {found:?}")]
    UnexpectedChar {
        pos: SourcePos,
        expected: char,
        found: Option<char>,
    },

    #[error("{pos}: {message}")]
    InvalidCharacterClass { pos: SourcePos, message: &'static str },

    #[error("{pos}: unterminated string literal")]
    UnterminatedString { pos: SourcePos },

    #[error("{pos}: unterminated date literal")]
    UnterminatedDate { pos: SourcePos },

    #[error("{pos}: malformed numeric literal")]
    MalformedNumber { pos: SourcePos },

    #[error("{pos}: unrecognized delimiter or directive")]
    UnrecognizedDelimiter { pos: SourcePos },
}

/// Failures raised by constant folding during expression evaluation.
///
/// `ObjectComparisonNotFoldable` is not really an error condition for the
/// parser: it is the signal `parser::expr` uses to decide a subtree must be
/// left unfolded (see spec §4.3/§4.4).
#[derive(Debug, thiserror::Error)]
pub enum EvaluatorError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("'Is'/'Is Not' comparisons cannot be constant-folded")]
    ObjectComparisonNotFoldable,

    #[error("operand type mismatch for this operator")]
    TypeMismatch,

    #[error("numeric value out of range")]
    Overflow,
}

/// Failures raised by the recursive-descent parser, including statement,
/// declaration and built-in left-expression validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("{pos}: unexpected token {found}, expected {expected}")]
    UnexpectedToken {
        pos: SourcePos,
        found: String,
        expected: &'static str,
    },

    #[error("{pos}: unexpected end of token stream, expected {expected}")]
    UnexpectedEof { pos: SourcePos, expected: &'static str },

    #[error("{pos}: {message}")]
    Grammar { pos: SourcePos, message: String },

    #[error("{pos}: invalid use of built-in left-expression '{name}': {message}")]
    InvalidBuiltin {
        pos: SourcePos,
        name: String,
        message: &'static str,
    },

    #[error("expression nesting exceeded the configured limit of {limit}")]
    ExprDepthExceeded { limit: u32 },

    #[error("block nesting exceeded the configured limit of {limit}")]
    BlockDepthExceeded { limit: u32 },

    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),

    #[error("{pos}: {source}")]
    Evaluator {
        pos: SourcePos,
        #[source]
        source: EvaluatorError,
    },
}
