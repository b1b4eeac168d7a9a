//! Scoped character-by-character cursor over raw source text.
//!
//! Mirrors the reference tokenizer's `CodeWrapper`, but the "must not be
//! used outside of a runtime context" rule that the Python type enforces
//! with a `RuntimeError` at call time is instead enforced by the borrow
//! checker: [`CharCursor::open`] takes `&mut self`, so only one
//! [`CursorHandle`] can exist at a time, and nothing about `CursorHandle`
//! survives past the point where it is dropped.

use crate::error::{SourcePos, TokenizerError};

/// Character classes the lexer tests the current character against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterType {
    Letter,
    Digit,
    StringChar,
    DateChar,
    IdNameChar,
    HexDigit,
    OctDigit,
    Ws,
    IdTail,
}

impl CharacterType {
    fn expectation(self) -> &'static str {
        match self {
            CharacterType::Letter => "an alphabetic character",
            CharacterType::Digit => "a digit",
            CharacterType::StringChar => "a character other than '\"'",
            CharacterType::DateChar => "a printable character other than '#'",
            CharacterType::IdNameChar => "a printable character other than '[' or ']'",
            CharacterType::HexDigit => "a hexadecimal digit",
            CharacterType::OctDigit => "an octal digit",
            CharacterType::Ws => "whitespace other than '\\r' or '\\n'",
            CharacterType::IdTail => "an alphanumeric character or '_'",
        }
    }
}

/// `Printable` per the GOLD grammar character-set definitions: `U+00A0`
/// plus the printable ASCII range `[0x20, 0x7F)`.
fn is_printable(c: char) -> bool {
    let code = c as u32;
    code == 0xA0 || (0x20..0x7F).contains(&code)
}

fn matches_type(c: char, ty: CharacterType) -> bool {
    match ty {
        CharacterType::Letter => c.is_alphabetic(),
        CharacterType::Digit => c.is_numeric(),
        CharacterType::StringChar => c != '"',
        CharacterType::DateChar => is_printable(c) && c != '#',
        CharacterType::IdNameChar => is_printable(c) && c != '[' && c != ']',
        CharacterType::HexDigit => c.is_ascii_hexdigit(),
        CharacterType::OctDigit => ('0'..='7').contains(&c),
        CharacterType::Ws => c.is_whitespace() && c != '\r' && c != '\n',
        CharacterType::IdTail => c.is_alphanumeric() || c == '_',
    }
}

/// Owns the character table for one source document. Call [`open`] to get a
/// cursor positioned at the first character.
///
/// [`open`]: CharCursor::open
pub struct CharCursor<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
}

impl<'a> CharCursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().collect(),
        }
    }

    pub fn source(&self) -> &'a str {
        self.src
    }

    pub fn open(&mut self) -> CursorHandle<'_, 'a> {
        CursorHandle {
            src: self.src,
            chars: &self.chars,
            idx: 0,
            line_no: 1,
            line_start: 0,
            pending_error: None,
        }
    }
}

/// A live, single-use cursor into a [`CharCursor`]'s source text.
pub struct CursorHandle<'c, 'a> {
    src: &'a str,
    chars: &'c [(usize, char)],
    idx: usize,
    line_no: u32,
    line_start: usize,
    pending_error: Option<String>,
}

impl<'c, 'a> CursorHandle<'c, 'a> {
    /// The character at the cursor, or `None` at end of input.
    pub fn current(&self) -> Option<char> {
        self.chars.get(self.idx).map(|&(_, c)| c)
    }

    /// Byte offset of the cursor within the original source, suitable for
    /// use as one endpoint of a token span. Equal to `src.len()` at end of
    /// input.
    pub fn byte_pos(&self) -> usize {
        self.chars
            .get(self.idx)
            .map(|&(b, _)| b)
            .unwrap_or(self.src.len())
    }

    pub fn source(&self) -> &'a str {
        self.src
    }

    pub fn at_end(&self) -> bool {
        self.idx >= self.chars.len()
    }

    pub fn pos(&self) -> SourcePos {
        SourcePos {
            line: self.line_no,
            column: (self.idx - self.line_start) as u32 + 1,
        }
    }

    /// Advances by one character, returning whether a character remains
    /// under the cursor afterwards.
    pub fn advance(&mut self) -> bool {
        if self.at_end() {
            return false;
        }
        self.idx += 1;
        !self.at_end()
    }

    /// Resets the line-tracking fields after consuming a newline sequence.
    pub fn advance_line(&mut self) {
        self.line_no += 1;
        self.line_start = self.idx;
    }

    pub fn matches_char(&self, expected: char) -> bool {
        self.current() == Some(expected)
    }

    pub fn matches_type(&self, ty: CharacterType) -> bool {
        self.current().map_or(false, |c| matches_type(c, ty))
    }

    /// Consumes the current character if it equals `expected`.
    pub fn try_next_char(&mut self, expected: char) -> bool {
        if self.matches_char(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes the current character if it belongs to `ty`.
    pub fn try_next_type(&mut self, ty: CharacterType) -> bool {
        if self.matches_type(ty) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes the current character, requiring it to equal `expected`.
    /// On mismatch, records a diagnostic for `Drop` and returns an error.
    pub fn assert_next_char(&mut self, expected: char) -> Result<(), TokenizerError> {
        let pos = self.pos();
        match self.current() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            found => {
                let err = TokenizerError::UnexpectedChar {
                    pos,
                    expected,
                    found,
                };
                self.pending_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Consumes the current character, requiring it to belong to `ty`.
    pub fn assert_next_type(&mut self, ty: CharacterType) -> Result<char, TokenizerError> {
        let pos = self.pos();
        match self.current() {
            Some(c) if matches_type(c, ty) => {
                self.advance();
                Ok(c)
            }
            Some(_) | None => {
                let err = TokenizerError::InvalidCharacterClass {
                    pos,
                    message: ty.expectation(),
                };
                self.pending_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.src[start..end]
    }
}

impl<'c, 'a> Drop for CursorHandle<'c, 'a> {
    fn drop(&mut self) {
        if let Some(message) = self.pending_error.take() {
            tracing::error!(
                pos = %self.pos(),
                current = ?self.current(),
                "char cursor dropped mid-error: {message}"
            );
        }
    }
}
