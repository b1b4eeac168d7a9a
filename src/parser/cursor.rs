//! A read cursor over an already-lexed token slice, the parser-side analog
//! of [`crate::char_cursor::CursorHandle`]. Owns no allocation; every
//! accessor borrows either the token slice or the source text, both tied
//! to the caller's lifetime.

use crate::error::{ParserError, SourcePos};
use crate::token::{KeywordType, Token, TokenKind};

/// Default expression-nesting ceiling, mirroring
/// `ParserSettings::default().max_expr_depth` for callers (tests, mostly)
/// that build a cursor without going through `parse_program_with`.
const DEFAULT_MAX_EXPR_DEPTH: u32 = 200;

pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    source: &'a str,
    idx: usize,
    expr_depth: u32,
    max_expr_depth: u32,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [Token], source: &'a str) -> Self {
        TokenCursor {
            tokens,
            source,
            idx: 0,
            expr_depth: 0,
            max_expr_depth: DEFAULT_MAX_EXPR_DEPTH,
        }
    }

    /// Overrides the expression-nesting ceiling (spec §2/§4.3); called once
    /// by `parse_program_with` with the configured `ParserSettings`.
    pub fn set_max_expr_depth(&mut self, limit: u32) {
        self.max_expr_depth = limit;
    }

    /// Enters one more level of expression-parser recursion, failing with
    /// `ExprDepthExceeded` once the configured ceiling is passed. Paired
    /// with `exit_expr` by `parser::expr::parse_imp_expr`, the ladder's sole
    /// re-entry point (parenthesized sub-expressions and call arguments
    /// both recurse back through it).
    pub fn enter_expr(&mut self) -> Result<(), ParserError> {
        self.expr_depth += 1;
        if self.expr_depth > self.max_expr_depth {
            return Err(ParserError::ExprDepthExceeded { limit: self.max_expr_depth });
        }
        Ok(())
    }

    pub fn exit_expr(&mut self) {
        self.expr_depth -= 1;
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn at_end(&self) -> bool {
        self.idx >= self.tokens.len()
    }

    pub fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.idx)
    }

    /// Looks `n` tokens ahead of the current position without consuming
    /// anything; used to recognize two-keyword terminators (`End If`, `End
    /// Select`, ...) before committing to consume them.
    pub fn peek_nth(&self, n: usize) -> Option<&'a Token> {
        self.tokens.get(self.idx + n)
    }

    /// The position to report for an error anchored at the current token,
    /// or the position just past the last token at end of stream.
    pub fn current_pos(&self) -> SourcePos {
        self.current()
            .or_else(|| self.tokens.last())
            .map(|t| t.pos)
            .unwrap_or_default()
    }

    pub fn current_text(&self) -> Option<&'a str> {
        self.current().map(|t| t.text(self.source))
    }

    pub fn advance(&mut self) -> Option<&'a Token> {
        let tok = self.current();
        if tok.is_some() {
            self.idx += 1;
        }
        tok
    }

    pub fn try_kind(&self, kind: TokenKind) -> bool {
        self.current().map(|t| t.kind == kind).unwrap_or(false)
    }

    pub fn try_multiple_kind(&self, kinds: &[TokenKind]) -> bool {
        self.current().map(|t| kinds.contains(&t.kind)).unwrap_or(false)
    }

    pub fn try_consume_kind(&mut self, kind: TokenKind) -> Option<&'a Token> {
        if self.try_kind(kind) {
            self.advance()
        } else {
            None
        }
    }

    /// Consumes a `Symbol` token whose text matches `sym` exactly.
    pub fn try_consume_symbol(&mut self, sym: &str) -> bool {
        let matches = self.current().map(|t| t.kind == TokenKind::Symbol && t.text(self.source) == sym).unwrap_or(false);
        if matches {
            self.advance();
        }
        matches
    }

    /// Consumes an identifier token whose text case-insensitively matches
    /// `word` (used for soft keywords like `Preserve`, `Each`, `Step`).
    pub fn try_consume_identifier_ci(&mut self, word: &str) -> bool {
        let matches = self
            .current()
            .map(|t| t.is_identifier() && t.text(self.source).eq_ignore_ascii_case(word))
            .unwrap_or(false);
        if matches {
            self.advance();
        }
        matches
    }

    /// Consumes the current token if it is an identifier naming any
    /// keyword at all (safe or reserved) — the reference's
    /// `try_keyword_id()`, used where a keyword is allowed in identifier
    /// position (e.g. `ExtendedID`, qualified-id segments).
    pub fn try_keyword_id(&mut self) -> Option<(&'a Token, KeywordType)> {
        let tok = self.current()?;
        if !tok.is_identifier() {
            return None;
        }
        let kw = KeywordType::from_str_ci(tok.text(self.source))?;
        self.advance();
        Some((tok, kw))
    }

    /// Consumes the current token if it is an identifier naming the given
    /// "safe" keyword specifically.
    pub fn try_safe_keyword(&mut self, kw: KeywordType) -> bool {
        debug_assert!(kw.is_safe());
        let matches = self
            .current()
            .map(|t| t.is_identifier() && t.text(self.source).eq_ignore_ascii_case(kw.as_str()))
            .unwrap_or(false);
        if matches {
            self.advance();
        }
        matches
    }

    pub fn unexpected(&self, expected: &'static str) -> ParserError {
        match self.current() {
            Some(tok) => ParserError::UnexpectedToken {
                pos: tok.pos,
                found: tok.text(self.source).to_string(),
                expected,
            },
            None => ParserError::UnexpectedEof {
                pos: self.current_pos(),
                expected,
            },
        }
    }

    pub fn assert_consume_symbol(&mut self, sym: &'static str) -> Result<(), ParserError> {
        if self.try_consume_symbol(sym) {
            Ok(())
        } else {
            Err(self.unexpected(sym))
        }
    }

    pub fn assert_consume_kind(&mut self, kind: TokenKind, expected: &'static str) -> Result<&'a Token, ParserError> {
        if self.try_kind(kind) {
            Ok(self.advance().expect("try_kind confirmed a token is present"))
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// A statement/declaration terminator: either a `NEWLINE` (consumed),
    /// or the tokenizer sitting at `DELIM_END`/end-of-stream, which is left
    /// untouched so the enclosing block-statement loop can see it and fall
    /// back into template mode.
    pub fn assert_newline_or_script_end(&mut self) -> Result<(), ParserError> {
        if self.try_kind(TokenKind::Newline) {
            self.advance();
            return Ok(());
        }
        if self.try_kind(TokenKind::DelimEnd) || self.at_end() {
            return Ok(());
        }
        Err(self.unexpected("newline or end of script block"))
    }
}
