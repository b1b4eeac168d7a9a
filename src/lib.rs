//! Tokenizer and recursive-descent parser for Classic ASP/VBScript source:
//! mode-switching between template text and `<% %>` script regions,
//! constant folding and algebraic normalization as expressions are built,
//! and a post-parse classifier that promotes generic left-expressions into
//! `Response`/`Request`/`Server` intrinsics.
//!
//! Code generation, `#include` resolution, and VBScript execution
//! semantics are out of scope — see [`parser::IncludeResolver`] for the
//! extension point a downstream consumer hangs inclusion on.

pub mod ast;
pub mod char_cursor;
pub mod diagnostics;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{Program, TopLevelItem};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{EvaluatorError, ParserError, SourcePos, TokenizerError};
pub use parser::{parse_program, parse_program_with, IncludeResolver, NullResolver, ParserSettings, TokenCursor};
