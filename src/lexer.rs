//! Mode-switching tokenizer over interleaved HTML/template text and
//! VBScript script regions. Ported in behavior from the reference's
//! pushdown state machine (`tokenizer/state_machine.py`,
//! `tokenizer_state.py`, `state_handlers.py`), but — per the Design
//! Notes — collapsed from a `yield`-driven coroutine stack into a plain
//! imperative scan: each lexical rule is one function operating on a
//! [`CursorHandle`], with a small amount of carried-over local state
//! (`pending_dot_start`) standing in for the reference's `START_DOT`
//! push/pop bookkeeping.

use crate::char_cursor::{CharCursor, CharacterType, CursorHandle};
use crate::error::{SourcePos, TokenizerError};
use crate::token::Token;

/// Tokenizes an entire document up front. The parser driver consumes the
/// result as a flat, mode-agnostic stream; `DelimStart*`/`DelimEnd` tokens
/// carry the ASP-mode boundaries it alternates on (spec §4.6).
pub fn tokenize(source: &str) -> Result<Vec<Token>, TokenizerError> {
    let mut cursor = CharCursor::new(source);
    let mut handle = cursor.open();
    let mut tokens = Vec::new();

    while !handle.at_end() {
        if peek_str(&handle, "<%") {
            scan_script_region(&mut handle, &mut tokens)?;
        } else {
            scan_template_chunk(&mut handle, &mut tokens)?;
        }
    }
    Ok(tokens)
}

fn peek_str(h: &CursorHandle<'_, '_>, needle: &str) -> bool {
    h.source()[h.byte_pos()..].starts_with(needle)
}

fn peek_str_ci(h: &CursorHandle<'_, '_>, needle: &str) -> bool {
    let rest = &h.source()[h.byte_pos()..];
    rest.len() >= needle.len() && rest[..needle.len()].eq_ignore_ascii_case(needle)
}

fn advance_n(h: &mut CursorHandle<'_, '_>, n: usize) {
    for _ in 0..n {
        h.advance();
    }
}

fn skip_horizontal_ws(h: &mut CursorHandle<'_, '_>) {
    while h.try_next_type(CharacterType::Ws) {}
}

// ---- template mode ---------------------------------------------------

/// Consumes raw template text up to (not including) the next `<%`
/// boundary or the start of an `<!-- #include ... -->` directive,
/// emitting it as one `FILE_TEXT` token. Any other `<!-- ... -->` HTML
/// comment is swallowed into the surrounding text unchanged (spec §4.2).
fn scan_template_chunk(
    h: &mut CursorHandle<'_, '_>,
    tokens: &mut Vec<Token>,
) -> Result<(), TokenizerError> {
    let start = h.byte_pos();
    let pos = h.pos();
    while !h.at_end() && !peek_str(h, "<%") && !include_comment_follows(h) {
        h.advance();
    }
    if h.byte_pos() > start {
        tokens.push(Token::file_text(start, h.byte_pos(), pos));
    }
    if include_comment_follows(h) {
        scan_include_comment(h, tokens)?;
    }
    Ok(())
}

fn include_comment_follows(h: &CursorHandle<'_, '_>) -> bool {
    if !peek_str(h, "<!--") {
        return false;
    }
    let rest = &h.source()[h.byte_pos() + 4..];
    let trimmed = rest.trim_start_matches(|c: char| c.is_whitespace());
    trimmed.len() >= 8 && trimmed[..8].eq_ignore_ascii_case("#include")
}

fn scan_include_comment(
    h: &mut CursorHandle<'_, '_>,
    tokens: &mut Vec<Token>,
) -> Result<(), TokenizerError> {
    let start = h.byte_pos();
    let pos = h.pos();
    advance_n(h, 4); // "<!--"
    tokens.push(Token::new_html_comment_start(start, h.byte_pos(), pos));

    skip_horizontal_ws(h);
    let kw_start = h.byte_pos();
    let kw_pos = h.pos();
    advance_n(h, 8); // "#include"
    tokens.push(Token::include_kw(kw_start, h.byte_pos(), kw_pos));

    skip_horizontal_ws(h);
    let ty_start = h.byte_pos();
    let ty_pos = h.pos();
    if peek_str_ci(h, "virtual") {
        advance_n(h, 7);
    } else if peek_str_ci(h, "file") {
        advance_n(h, 4);
    } else {
        return Err(TokenizerError::UnrecognizedDelimiter { pos: ty_pos });
    }
    tokens.push(Token::include_type(ty_start, h.byte_pos(), ty_pos));

    skip_horizontal_ws(h);
    h.assert_next_char('=')?;
    skip_horizontal_ws(h);

    let path_start = h.byte_pos();
    let path_pos = h.pos();
    h.assert_next_char('"')?;
    while h.matches_type(CharacterType::StringChar) {
        h.advance();
    }
    h.assert_next_char('"')?;
    tokens.push(Token::include_path(path_start, h.byte_pos(), path_pos));

    skip_horizontal_ws(h);
    let end_start = h.byte_pos();
    let end_pos = h.pos();
    if !peek_str(h, "-->") {
        return Err(TokenizerError::UnrecognizedDelimiter { pos: end_pos });
    }
    advance_n(h, 3);
    tokens.push(Token::new_html_comment_end(end_start, h.byte_pos(), end_pos));
    Ok(())
}

// ---- script mode -------------------------------------------------------

/// Consumes one `<% ... %>` / `<%@ ... %>` / `<%= ... %>` region: the
/// opening delimiter, the VBScript tokens inside, and the closing `%>`.
fn scan_script_region(
    h: &mut CursorHandle<'_, '_>,
    tokens: &mut Vec<Token>,
) -> Result<(), TokenizerError> {
    let start = h.byte_pos();
    let pos = h.pos();
    let is_processing = peek_str(h, "<%@");
    let is_output = peek_str(h, "<%=");
    advance_n(h, if is_processing || is_output { 3 } else { 2 });
    tokens.push(if is_processing {
        Token::delim_start_processing(start, h.byte_pos(), pos)
    } else if is_output {
        Token::delim_start_output(start, h.byte_pos(), pos)
    } else {
        Token::delim_start_script(start, h.byte_pos(), pos)
    });

    let mut pending_dot_start = false;
    loop {
        if h.at_end() {
            return Err(TokenizerError::UnexpectedEof { pos: h.pos() });
        }
        if peek_str(h, "%>") {
            let end_start = h.byte_pos();
            let end_pos = h.pos();
            advance_n(h, 2);
            tokens.push(Token::delim_end(end_start, h.byte_pos(), end_pos));
            return Ok(());
        }
        scan_one_script_token(h, tokens, &mut pending_dot_start)?;
    }
}

/// Scans exactly one VBScript lexical element, pushing zero or one token
/// (whitespace, comments and line continuations push nothing).
fn scan_one_script_token(
    h: &mut CursorHandle<'_, '_>,
    tokens: &mut Vec<Token>,
    pending_dot_start: &mut bool,
) -> Result<(), TokenizerError> {
    if h.try_next_type(CharacterType::Ws) {
        while h.try_next_type(CharacterType::Ws) {}
        return Ok(());
    }

    if h.matches_char('_') && line_continuation_follows(h) {
        consume_line_continuation(h)?;
        return Ok(());
    }

    if h.matches_char('\'') {
        skip_comment(h);
        return Ok(());
    }

    if h.matches_char('\r') || h.matches_char('\n') || h.matches_char(':') {
        scan_newline(h, tokens);
        *pending_dot_start = false;
        return Ok(());
    }

    if h.matches_char('.') {
        scan_dot(h, tokens)?;
        *pending_dot_start = false;
        return Ok(());
    }

    if h.matches_type(CharacterType::Letter) {
        let started_comment = scan_identifier(h, tokens, *pending_dot_start)?;
        *pending_dot_start = false;
        if started_comment {
            skip_comment(h);
        }
        return Ok(());
    }

    if h.matches_char('[') {
        scan_escaped_identifier(h, tokens, *pending_dot_start)?;
        *pending_dot_start = false;
        return Ok(());
    }

    if h.matches_char('"') {
        scan_string(h, tokens)?;
        return Ok(());
    }

    if h.matches_type(CharacterType::Digit) {
        scan_number(h, tokens)?;
        return Ok(());
    }

    if h.matches_char('&') {
        scan_amp(h, tokens)?;
        return Ok(());
    }

    if h.matches_char('#') {
        scan_date(h, tokens)?;
        return Ok(());
    }

    scan_symbol(h, tokens);
    Ok(())
}

fn line_continuation_follows(h: &CursorHandle<'_, '_>) -> bool {
    let rest = &h.source()[h.byte_pos() + 1..];
    let trimmed = rest.trim_start_matches(|c: char| c.is_whitespace() && c != '\r' && c != '\n');
    trimmed.starts_with('\r') || trimmed.starts_with('\n')
}

fn consume_line_continuation(h: &mut CursorHandle<'_, '_>) -> Result<(), TokenizerError> {
    h.advance(); // '_'
    while h.try_next_type(CharacterType::Ws) {}
    consume_newline_sequence(h);
    Ok(())
}

fn consume_newline_sequence(h: &mut CursorHandle<'_, '_>) {
    if h.try_next_char('\r') {
        h.try_next_char('\n');
    } else {
        h.try_next_char('\n');
    }
    h.advance_line();
}

/// `'` or a bare `Rem` opens a comment lasting until `:`, CR, LF, `%>`, or
/// end of input (the terminator itself is left for the caller to handle).
fn skip_comment(h: &mut CursorHandle<'_, '_>) {
    if h.matches_char('\'') {
        h.advance();
    }
    while !h.at_end() && !h.matches_char(':') && !h.matches_char('\r') && !h.matches_char('\n') && !peek_str(h, "%>")
    {
        h.advance();
    }
}

/// Collapses one or more of `:`, CR, LF, CR LF into a single `NEWLINE`
/// token (spec §4.2).
fn scan_newline(h: &mut CursorHandle<'_, '_>, tokens: &mut Vec<Token>) {
    let start = h.byte_pos();
    let pos = h.pos();
    loop {
        if h.try_next_char(':') {
            continue;
        }
        if h.matches_char('\r') || h.matches_char('\n') {
            consume_newline_sequence(h);
            continue;
        }
        break;
    }
    tokens.push(Token::newline(start, h.byte_pos(), pos));
}

/// A `.` not already consumed as part of an identifier's trailing fusion:
/// either the start of a dotted identifier continuation or a leading-dot
/// float literal (spec §4.2's `START_DOT`).
fn scan_dot(h: &mut CursorHandle<'_, '_>, tokens: &mut Vec<Token>) -> Result<(), TokenizerError> {
    let dot_start = h.byte_pos();
    let dot_pos = h.pos();
    h.advance();
    if h.matches_type(CharacterType::Letter) {
        scan_identifier(h, tokens, true)?;
        Ok(())
    } else if h.matches_char('[') {
        scan_escaped_identifier(h, tokens, true)?;
        Ok(())
    } else if h.matches_type(CharacterType::Digit) {
        scan_float_from_dot(h, tokens, dot_start, dot_pos)
    } else {
        Err(TokenizerError::InvalidCharacterClass {
            pos: dot_pos,
            message: "expected an identifier or digit after '.'",
        })
    }
}

/// Reads an unescaped identifier (`LETTER ID_TAIL*`); if immediately
/// followed by `.` and another identifier start, fuses the trailing dot
/// into this token instead of emitting it separately. Returns `true` if
/// the identifier text is the bare `Rem` comment keyword, in which case
/// no token was pushed and the caller must skip a comment.
fn scan_identifier(
    h: &mut CursorHandle<'_, '_>,
    tokens: &mut Vec<Token>,
    dot_start: bool,
) -> Result<bool, TokenizerError> {
    let start = h.byte_pos();
    let pos = h.pos();
    h.assert_next_type(CharacterType::Letter)?;
    while h.try_next_type(CharacterType::IdTail) {}
    let name_end = h.byte_pos();

    let is_rem = h.slice(start, name_end).eq_ignore_ascii_case("rem");
    if is_rem && !dot_start {
        return Ok(true);
    }

    let dot_end = dot_follows_identifier(h);
    if dot_end {
        h.advance(); // consume the fused '.'
    }
    tokens.push(Token::identifier(start, name_end, pos, dot_start, dot_end));
    Ok(false)
}

fn dot_follows_identifier(h: &CursorHandle<'_, '_>) -> bool {
    let rest = &h.source()[h.byte_pos()..];
    if !rest.starts_with('.') {
        return false;
    }
    let after = &rest[1..];
    after.starts_with(|c: char| c.is_alphabetic()) || after.starts_with('[')
}

fn scan_escaped_identifier(
    h: &mut CursorHandle<'_, '_>,
    tokens: &mut Vec<Token>,
    dot_start: bool,
) -> Result<(), TokenizerError> {
    let start = h.byte_pos();
    let pos = h.pos();
    h.assert_next_char('[')?;
    while h.matches_type(CharacterType::IdNameChar) {
        h.advance();
    }
    h.assert_next_char(']')?;
    let name_end = h.byte_pos();

    let dot_end = dot_follows_identifier(h);
    if dot_end {
        h.advance();
    }
    tokens.push(Token::identifier(start, name_end, pos, dot_start, dot_end));
    Ok(())
}

fn scan_string(h: &mut CursorHandle<'_, '_>, tokens: &mut Vec<Token>) -> Result<(), TokenizerError> {
    let start = h.byte_pos();
    let pos = h.pos();
    h.assert_next_char('"')?;
    loop {
        while h.matches_type(CharacterType::StringChar) {
            h.advance();
        }
        if h.at_end() {
            return Err(TokenizerError::UnterminatedString { pos });
        }
        h.advance(); // the '"' that ended the StringChar run
        if h.try_next_char('"') {
            // doubled quote: an escaped '"' inside the literal, keep scanning
            continue;
        }
        break;
    }
    tokens.push(Token::string_literal(start, h.byte_pos(), pos));
    Ok(())
}

/// Integer/float numeric literals starting with a digit (spec §4.2).
fn scan_number(h: &mut CursorHandle<'_, '_>, tokens: &mut Vec<Token>) -> Result<(), TokenizerError> {
    let start = h.byte_pos();
    let pos = h.pos();
    while h.try_next_type(CharacterType::Digit) {}

    let mut is_float = false;
    if h.matches_char('.') && h.source()[h.byte_pos() + 1..].starts_with(|c: char| c.is_numeric()) {
        h.advance();
        while h.try_next_type(CharacterType::Digit) {}
        is_float = true;
    }
    if h.matches_char('E') || h.matches_char('e') {
        let save = h.byte_pos();
        h.advance();
        if h.matches_char('+') || h.matches_char('-') {
            h.advance();
        }
        if h.matches_type(CharacterType::Digit) {
            while h.try_next_type(CharacterType::Digit) {}
            is_float = true;
        } else if save != h.byte_pos() {
            return Err(TokenizerError::MalformedNumber { pos });
        }
    }

    tokens.push(if is_float {
        Token::float_literal(start, h.byte_pos(), pos)
    } else {
        Token::int_literal(start, h.byte_pos(), pos)
    });
    Ok(())
}

/// A float literal that began with a leading `.` (the dot has already
/// been consumed by [`scan_dot`]).
fn scan_float_from_dot(
    h: &mut CursorHandle<'_, '_>,
    tokens: &mut Vec<Token>,
    start: usize,
    pos: SourcePos,
) -> Result<(), TokenizerError> {
    if !h.try_next_type(CharacterType::Digit) {
        return Err(TokenizerError::MalformedNumber { pos });
    }
    while h.try_next_type(CharacterType::Digit) {}
    if h.matches_char('E') || h.matches_char('e') {
        h.advance();
        if h.matches_char('+') || h.matches_char('-') {
            h.advance();
        }
        while h.try_next_type(CharacterType::Digit) {}
    }
    tokens.push(Token::float_literal(start, h.byte_pos(), pos));
    Ok(())
}

/// `&`: either the start of a hex/octal literal or the bare concatenation
/// operator (spec §4.2).
fn scan_amp(h: &mut CursorHandle<'_, '_>, tokens: &mut Vec<Token>) -> Result<(), TokenizerError> {
    let start = h.byte_pos();
    let pos = h.pos();
    h.advance(); // '&'

    if h.matches_char('H') || h.matches_char('h') {
        h.advance();
        if !h.matches_type(CharacterType::HexDigit) {
            return Err(TokenizerError::MalformedNumber { pos });
        }
        while h.try_next_type(CharacterType::HexDigit) {}
        h.try_next_char('&');
        tokens.push(Token::hex_literal(start, h.byte_pos(), pos));
        return Ok(());
    }
    if h.matches_type(CharacterType::OctDigit) {
        while h.try_next_type(CharacterType::OctDigit) {}
        h.try_next_char('&');
        tokens.push(Token::oct_literal(start, h.byte_pos(), pos));
        return Ok(());
    }
    tokens.push(Token::symbol(start, h.byte_pos(), pos));
    Ok(())
}

fn scan_date(h: &mut CursorHandle<'_, '_>, tokens: &mut Vec<Token>) -> Result<(), TokenizerError> {
    let start = h.byte_pos();
    let pos = h.pos();
    h.assert_next_char('#')?;
    if !h.matches_type(CharacterType::DateChar) {
        return Err(TokenizerError::UnterminatedDate { pos });
    }
    while h.try_next_type(CharacterType::DateChar) {}
    h.assert_next_char('#').map_err(|_| TokenizerError::UnterminatedDate { pos })?;
    tokens.push(Token::date_literal(start, h.byte_pos(), pos));
    Ok(())
}

/// Everything not otherwise recognized: single-character symbols plus the
/// three two-character comparison operators `<=`, `>=`, `<>`.
fn scan_symbol(h: &mut CursorHandle<'_, '_>, tokens: &mut Vec<Token>) {
    let start = h.byte_pos();
    let pos = h.pos();
    let c = h.current();
    h.advance();
    if matches!(c, Some('<')) && (h.matches_char('=') || h.matches_char('>')) {
        h.advance();
    } else if matches!(c, Some('>')) && h.matches_char('=') {
        h.advance();
    }
    tokens.push(Token::symbol(start, h.byte_pos(), pos));
}
