//! The recursive-descent parser: turns the flat token stream `lexer`
//! produces into the typed AST in `ast`. Laid out as one module per
//! grammar layer, mirroring `ast_types/expression_parser.py` and
//! `ast_types/parser.py`.

pub mod cursor;
pub mod decl;
pub mod driver;
pub mod expr;
pub mod stmt;

pub use cursor::TokenCursor;
pub use driver::{parse_program, parse_program_with, IncludeResolver, NullResolver, ParserSettings};
