//! Statement-level grammar: everything that can appear in a global script
//! region or inside a block body (`If`/`With`/`Select`/`Loop`/`For`).
//! Ported in behavior from `ast_types/parser.py`'s statement productions.
//!
//! Two statement-list shapes recur throughout this module:
//! [`parse_block_stmt_list`] (used by `If`/`With`/`Select`/`Loop`/`For`
//! bodies, which may not declare their own `Const`s) and
//! [`parse_method_stmt_list`] (used by `Sub`/`Function`/`Property` bodies,
//! which may). Both tolerate a `%>`/`<%` gap mid-body by delegating to
//! [`scan_nonscript_into`], since the reference's `NonscriptBlock` can
//! appear anywhere a statement can.

use crate::ast::expr::Expr;
use crate::ast::{
    AccessModifier, AssignStmt, BlockStmt, CallStmt, CaseStmt, ConstDecl, ConstListItem, ElseStmt, EraseStmt,
    ErrorGoto, ErrorStmt, ExitKind, ExitStmt, ExtendedId, FieldDecl, FieldId, FieldName, ForHeader, ForStmt,
    GlobalStmt, IfStmt, InlineStmt, LoopConditionKind, LoopStmt, MethodStmt, RedimDecl, RedimStmt, SelectStmt,
    SubCallStmt, VarDecl, VarName, WithStmt,
};
use crate::diagnostics::Diagnostics;
use crate::error::ParserError;
use crate::token::{is_reserved_keyword, Token, TokenKind};

use super::cursor::TokenCursor;
use super::driver::scan_nonscript_into;
use super::ParserSettings;

/// Looks `n` tokens ahead for an identifier matching `word` case-insensitively,
/// without consuming anything — used to recognize two-keyword terminators
/// (`End If`, `End Select`, ...) before a block-statement loop decides to stop.
fn is_keyword_at(cur: &TokenCursor<'_>, n: usize, word: &str) -> bool {
    cur.peek_nth(n)
        .map(|t| t.is_identifier() && t.text(cur.source()).eq_ignore_ascii_case(word))
        .unwrap_or(false)
}

fn is_end_of(cur: &TokenCursor<'_>, word: &str) -> bool {
    is_keyword_at(cur, 0, "end") && is_keyword_at(cur, 1, word)
}

fn assert_end_of(cur: &mut TokenCursor<'_>, word: &'static str) -> Result<(), ParserError> {
    if !cur.try_consume_identifier_ci("end") {
        return Err(cur.unexpected("'End'"));
    }
    if !cur.try_consume_identifier_ci(word) {
        return Err(cur.unexpected(word));
    }
    cur.assert_newline_or_script_end()
}

// ---- identifiers -------------------------------------------------------

/// An identifier that is not a reserved keyword (spec §4.2's `ExtendedID`);
/// "safe" keywords (`Default`, `Erase`, ...) are still accepted here since
/// the lexer never distinguishes them from ordinary identifiers positionally.
pub(super) fn parse_extended_id(cur: &mut TokenCursor<'_>) -> Result<ExtendedId, ParserError> {
    let tok = cur.current().ok_or_else(|| cur.unexpected("an identifier"))?;
    if !tok.is_identifier() {
        return Err(cur.unexpected("an identifier"));
    }
    let text = tok.text(cur.source());
    if is_reserved_keyword(text) {
        return Err(ParserError::Grammar {
            pos: tok.pos,
            message: format!("'{text}' is a reserved word and cannot be used as an identifier"),
        });
    }
    let id_token = cur.advance().expect("current() confirmed a token").clone();
    Ok(ExtendedId { id_token })
}

pub(super) fn try_parse_access_modifier(cur: &mut TokenCursor<'_>) -> Option<AccessModifier> {
    if cur.try_consume_identifier_ci("public") {
        if cur.try_consume_identifier_ci("default") {
            Some(AccessModifier::PublicDefault)
        } else {
            Some(AccessModifier::Public)
        }
    } else if cur.try_consume_identifier_ci("private") {
        Some(AccessModifier::Private)
    } else {
        None
    }
}

/// `Public Default` only makes sense on a `Property` member, which carries
/// its own access-modifier slot in `parse_property_decl` rather than going
/// through this helper — so any caller reaching here rejects it outright
/// (spec §4.5/§7).
fn reject_public_default(cur: &TokenCursor<'_>, access_mod: Option<AccessModifier>, what: &str) -> Result<(), ParserError> {
    if access_mod == Some(AccessModifier::PublicDefault) {
        return Err(ParserError::Grammar {
            pos: cur.current_pos(),
            message: format!("'Public Default' cannot be used with {what}"),
        });
    }
    Ok(())
}

// ---- Dim / ReDim / Const / field declarations --------------------------

fn parse_array_rank_list(cur: &mut TokenCursor<'_>) -> Result<Vec<Token>, ParserError> {
    let mut ranks = Vec::new();
    if !cur.try_consume_symbol("(") {
        return Ok(ranks);
    }
    loop {
        if cur.current_text() == Some(")") {
            break;
        }
        let tok = cur.assert_consume_kind(TokenKind::LiteralInt, "an array bound")?.clone();
        ranks.push(tok);
        if !cur.try_consume_symbol(",") {
            break;
        }
    }
    cur.assert_consume_symbol(")")?;
    Ok(ranks)
}

fn parse_var_name(cur: &mut TokenCursor<'_>) -> Result<VarName, ParserError> {
    let extended_id = parse_extended_id(cur)?;
    let array_rank_list = parse_array_rank_list(cur)?;
    Ok(VarName { extended_id, array_rank_list })
}

pub(super) fn parse_var_decl(cur: &mut TokenCursor<'_>) -> Result<VarDecl, ParserError> {
    let mut var_name = vec![parse_var_name(cur)?];
    while cur.try_consume_symbol(",") {
        var_name.push(parse_var_name(cur)?);
    }
    Ok(VarDecl { var_name })
}

fn parse_redim_decl(cur: &mut TokenCursor<'_>) -> Result<RedimDecl, ParserError> {
    let extended_id = parse_extended_id(cur)?;
    cur.assert_consume_symbol("(")?;
    let mut expr_list = vec![super::expr::parse_expr(cur)?];
    while cur.try_consume_symbol(",") {
        expr_list.push(super::expr::parse_expr(cur)?);
    }
    cur.assert_consume_symbol(")")?;
    Ok(RedimDecl { extended_id, expr_list })
}

fn parse_redim_stmt(cur: &mut TokenCursor<'_>) -> Result<RedimStmt, ParserError> {
    let preserve = cur.try_consume_identifier_ci("preserve");
    let mut redim_decl_list = vec![parse_redim_decl(cur)?];
    while cur.try_consume_symbol(",") {
        redim_decl_list.push(parse_redim_decl(cur)?);
    }
    Ok(RedimStmt { redim_decl_list, preserve })
}

fn parse_const_list_item(cur: &mut TokenCursor<'_>) -> Result<ConstListItem, ParserError> {
    let extended_id = parse_extended_id(cur)?;
    cur.assert_consume_symbol("=")?;
    let const_expr = super::expr::parse_expr(cur)?;
    Ok(ConstListItem { extended_id, const_expr })
}

pub(super) fn parse_const_decl(cur: &mut TokenCursor<'_>, access_mod: Option<AccessModifier>) -> Result<ConstDecl, ParserError> {
    reject_public_default(cur, access_mod, "a const declaration")?;
    let mut const_list = vec![parse_const_list_item(cur)?];
    while cur.try_consume_symbol(",") {
        const_list.push(parse_const_list_item(cur)?);
    }
    Ok(ConstDecl { const_list, access_mod })
}

/// Field names accept any identifier token, including ones that double as
/// reserved words elsewhere — class members live in their own namespace,
/// unlike free-standing `Dim`/`Const` names (spec §4.2).
fn parse_field_name(cur: &mut TokenCursor<'_>) -> Result<FieldName, ParserError> {
    let tok = cur.current().ok_or_else(|| cur.unexpected("a field name"))?;
    if !tok.is_identifier() {
        return Err(cur.unexpected("a field name"));
    }
    let id_token = cur.advance().expect("current() confirmed a token").clone();
    let array_rank_list = parse_array_rank_list(cur)?;
    Ok(FieldName { field_id: FieldId { id_token }, array_rank_list })
}

pub(super) fn parse_field_decl(cur: &mut TokenCursor<'_>, access_mod: Option<AccessModifier>) -> Result<FieldDecl, ParserError> {
    reject_public_default(cur, access_mod, "a non-property field declaration")?;
    let field_name = parse_field_name(cur)?;
    let mut other_vars = Vec::new();
    while cur.try_consume_symbol(",") {
        other_vars.push(parse_var_name(cur)?);
    }
    Ok(FieldDecl { field_name, other_vars, access_mod })
}

// ---- inline (leaf) statements -------------------------------------------

fn parse_exit_kind(cur: &mut TokenCursor<'_>) -> Result<ExitKind, ParserError> {
    if cur.try_consume_identifier_ci("do") {
        return Ok(ExitKind::Do);
    }
    if cur.try_consume_identifier_ci("for") {
        return Ok(ExitKind::For);
    }
    if cur.try_consume_identifier_ci("function") {
        return Ok(ExitKind::Function);
    }
    if cur.try_consume_identifier_ci("property") {
        return Ok(ExitKind::Property);
    }
    if cur.try_consume_identifier_ci("sub") {
        return Ok(ExitKind::Sub);
    }
    Err(cur.unexpected("'Do', 'For', 'Function', 'Property', or 'Sub'"))
}

fn parse_error_stmt_tail(cur: &mut TokenCursor<'_>) -> Result<ErrorStmt, ParserError> {
    if !cur.try_consume_identifier_ci("error") {
        return Err(cur.unexpected("'Error'"));
    }
    if cur.try_consume_identifier_ci("resume") {
        if !cur.try_consume_identifier_ci("next") {
            return Err(cur.unexpected("'Next'"));
        }
        return Ok(ErrorStmt { spec: ErrorGoto::ResumeNext });
    }
    if cur.try_consume_identifier_ci("goto") {
        let tok = cur.assert_consume_kind(TokenKind::LiteralInt, "'0'")?;
        if tok.text(cur.source()) != "0" {
            return Err(ParserError::Grammar {
                pos: tok.pos,
                message: "'On Error Goto' only supports target 0".to_string(),
            });
        }
        return Ok(ErrorStmt { spec: ErrorGoto::GotoZero });
    }
    Err(cur.unexpected("'Resume Next' or 'Goto 0'"))
}

/// Parses a `SubCallStmt`'s argument tail once its `left_expr` is already
/// in hand. A first argument written in bare space-separated form (`Foo 1,
/// 2`) or in parens directly after the name (`Foo (1), 2`) both land in
/// `sub_safe_expr`; anything the greedy left-expr parse already folded into
/// its own call-parens (`Foo(1)` with nothing after) simply has no
/// `sub_safe_expr` and the remaining comma-separated values follow.
fn parse_sub_call_tail(cur: &mut TokenCursor<'_>, left_expr: Expr) -> Result<SubCallStmt, ParserError> {
    let at_statement_end = cur.try_kind(TokenKind::Newline) || cur.try_kind(TokenKind::DelimEnd) || cur.at_end();
    let sub_safe_expr = if at_statement_end || cur.current_text() == Some(",") {
        None
    } else {
        Some(super::expr::parse_expr_sub_safe(cur)?)
    };
    let mut comma_expr_list = Vec::new();
    let mut found_expr = false;
    loop {
        if cur.try_kind(TokenKind::Newline) || cur.try_kind(TokenKind::DelimEnd) || cur.at_end() {
            break;
        }
        if cur.try_consume_symbol(",") {
            if found_expr {
                found_expr = false;
            } else {
                comma_expr_list.push(None);
            }
            continue;
        }
        comma_expr_list.push(Some(super::expr::parse_expr(cur)?));
        found_expr = true;
    }
    Ok(SubCallStmt { left_expr, sub_safe_expr, comma_expr_list })
}

fn parse_inline_stmt(cur: &mut TokenCursor<'_>) -> Result<InlineStmt, ParserError> {
    if cur.try_consume_identifier_ci("call") {
        let left_expr = super::expr::parse_expr(cur)?;
        return Ok(InlineStmt::Call(CallStmt { left_expr }));
    }
    if cur.try_consume_identifier_ci("on") {
        return Ok(InlineStmt::Error(parse_error_stmt_tail(cur)?));
    }
    if cur.try_consume_identifier_ci("exit") {
        return Ok(InlineStmt::Exit(ExitStmt { exit_kind: parse_exit_kind(cur)? }));
    }
    if cur.try_consume_identifier_ci("erase") {
        let extended_id = parse_extended_id(cur)?;
        return Ok(InlineStmt::Erase(EraseStmt { extended_id }));
    }
    let is_set = cur.try_consume_identifier_ci("set");
    let left_expr = super::expr::parse_expr_sub_safe(cur)?;
    if cur.try_consume_symbol("=") {
        let is_new = cur.try_consume_identifier_ci("new");
        let assign_expr = super::expr::parse_expr(cur)?;
        return Ok(InlineStmt::Assign(AssignStmt {
            target_expr: left_expr,
            assign_expr,
            is_new,
        }));
    }
    if is_set {
        return Err(cur.unexpected("'=' after 'Set'"));
    }
    Ok(InlineStmt::SubCall(parse_sub_call_tail(cur, left_expr)?))
}

// ---- block statement dispatch -------------------------------------------

fn parse_block_stmt(
    cur: &mut TokenCursor<'_>,
    diagnostics: &mut Diagnostics,
    settings: ParserSettings,
    depth: u32,
) -> Result<BlockStmt, ParserError> {
    if cur.try_consume_identifier_ci("dim") {
        let decl = parse_var_decl(cur)?;
        cur.assert_newline_or_script_end()?;
        return Ok(BlockStmt::Var(decl));
    }
    if cur.try_consume_identifier_ci("redim") {
        let decl = parse_redim_stmt(cur)?;
        cur.assert_newline_or_script_end()?;
        return Ok(BlockStmt::Redim(decl));
    }
    if cur.try_consume_identifier_ci("if") {
        return Ok(BlockStmt::If(parse_if_stmt(cur, diagnostics, settings, depth + 1)?));
    }
    if cur.try_consume_identifier_ci("with") {
        return Ok(BlockStmt::With(parse_with_stmt(cur, diagnostics, settings, depth + 1)?));
    }
    if cur.try_consume_identifier_ci("select") {
        return Ok(BlockStmt::Select(parse_select_stmt(cur, diagnostics, settings, depth + 1)?));
    }
    if cur.try_consume_identifier_ci("do") {
        return Ok(BlockStmt::Loop(parse_do_loop_stmt(cur, diagnostics, settings, depth + 1)?));
    }
    if cur.try_consume_identifier_ci("while") {
        return Ok(BlockStmt::Loop(parse_while_wend_stmt(cur, diagnostics, settings, depth + 1)?));
    }
    if cur.try_consume_identifier_ci("for") {
        return Ok(BlockStmt::For(parse_for_stmt(cur, diagnostics, settings, depth + 1)?));
    }
    let inline = parse_inline_stmt(cur)?;
    cur.assert_newline_or_script_end()?;
    Ok(BlockStmt::Inline(inline))
}

/// A block body with no `Const` productions of its own (`If`/`With`/
/// `Select`/`Loop`/`For`). Crosses `%>`/`<%` gaps transparently by folding
/// the scanned template run directly into the list as `Output`/`Include`.
fn parse_block_stmt_list(
    cur: &mut TokenCursor<'_>,
    diagnostics: &mut Diagnostics,
    settings: ParserSettings,
    depth: u32,
    is_terminator: impl Fn(&TokenCursor<'_>) -> bool,
) -> Result<Vec<BlockStmt>, ParserError> {
    if depth > settings.max_block_depth {
        return Err(ParserError::BlockDepthExceeded { limit: settings.max_block_depth });
    }
    let mut out = Vec::new();
    loop {
        if cur.at_end() || is_terminator(cur) {
            break;
        }
        if cur.try_kind(TokenKind::DelimEnd) {
            cur.advance();
            scan_nonscript_into(cur, diagnostics, &mut out, BlockStmt::Output, BlockStmt::Include)?;
            cur.assert_consume_kind(TokenKind::DelimStartScript, "'<%' resuming the script block")?;
            continue;
        }
        out.push(parse_block_stmt(cur, diagnostics, settings, depth)?);
    }
    Ok(out)
}

/// A `Sub`/`Function`/`Property` body: like [`parse_block_stmt_list`] but
/// also accepts nested `Const` declarations directly (spec §4.4).
pub(super) fn parse_method_stmt_list(
    cur: &mut TokenCursor<'_>,
    diagnostics: &mut Diagnostics,
    settings: ParserSettings,
    depth: u32,
    is_terminator: impl Fn(&TokenCursor<'_>) -> bool,
) -> Result<Vec<MethodStmt>, ParserError> {
    if depth > settings.max_block_depth {
        return Err(ParserError::BlockDepthExceeded { limit: settings.max_block_depth });
    }
    let mut out = Vec::new();
    loop {
        if cur.at_end() || is_terminator(cur) {
            break;
        }
        if cur.try_kind(TokenKind::DelimEnd) {
            cur.advance();
            let mut nonscript = Vec::new();
            scan_nonscript_into(cur, diagnostics, &mut nonscript, BlockStmt::Output, BlockStmt::Include)?;
            cur.assert_consume_kind(TokenKind::DelimStartScript, "'<%' resuming the script block")?;
            out.extend(nonscript.into_iter().map(MethodStmt::Block));
            continue;
        }
        let access_mod = try_parse_access_modifier(cur);
        if cur.try_consume_identifier_ci("const") {
            let decl = parse_const_decl(cur, access_mod)?;
            cur.assert_newline_or_script_end()?;
            out.push(MethodStmt::Const(decl));
            continue;
        }
        if access_mod.is_some() {
            return Err(cur.unexpected("'Const' after an access modifier inside a method body"));
        }
        out.push(MethodStmt::Block(parse_block_stmt(cur, diagnostics, settings, depth)?));
    }
    Ok(out)
}

// ---- If / With / Select ---------------------------------------------

fn is_if_terminator(cur: &TokenCursor<'_>) -> bool {
    is_keyword_at(cur, 0, "else") || is_keyword_at(cur, 0, "elseif") || is_end_of(cur, "if")
}

fn parse_if_stmt(
    cur: &mut TokenCursor<'_>,
    diagnostics: &mut Diagnostics,
    settings: ParserSettings,
    depth: u32,
) -> Result<IfStmt, ParserError> {
    let if_expr = super::expr::parse_expr(cur)?;
    if !cur.try_consume_identifier_ci("then") {
        return Err(cur.unexpected("'Then'"));
    }
    cur.assert_newline_or_script_end()?;
    let block_stmt_list = parse_block_stmt_list(cur, diagnostics, settings, depth, is_if_terminator)?;

    let mut else_stmt_list = Vec::new();
    loop {
        if cur.try_consume_identifier_ci("elseif") {
            let elif_expr = super::expr::parse_expr(cur)?;
            if !cur.try_consume_identifier_ci("then") {
                return Err(cur.unexpected("'Then'"));
            }
            cur.assert_newline_or_script_end()?;
            let stmt_list = parse_block_stmt_list(cur, diagnostics, settings, depth, is_if_terminator)?;
            else_stmt_list.push(ElseStmt {
                stmt_list,
                elif_expr: Some(elif_expr),
                is_else: false,
            });
            continue;
        }
        if cur.try_consume_identifier_ci("else") {
            cur.assert_newline_or_script_end()?;
            let stmt_list = parse_block_stmt_list(cur, diagnostics, settings, depth, |c| is_end_of(c, "if"))?;
            else_stmt_list.push(ElseStmt {
                stmt_list,
                elif_expr: None,
                is_else: true,
            });
        }
        break;
    }
    assert_end_of(cur, "if")?;
    Ok(IfStmt { if_expr, block_stmt_list, else_stmt_list })
}

fn parse_with_stmt(
    cur: &mut TokenCursor<'_>,
    diagnostics: &mut Diagnostics,
    settings: ParserSettings,
    depth: u32,
) -> Result<WithStmt, ParserError> {
    let with_expr = super::expr::parse_expr(cur)?;
    cur.assert_newline_or_script_end()?;
    let block_stmt_list = parse_block_stmt_list(cur, diagnostics, settings, depth, |c| is_end_of(c, "with"))?;
    assert_end_of(cur, "with")?;
    Ok(WithStmt { with_expr, block_stmt_list })
}

/// The gap between `Select Case expr` and its first `Case` label is
/// discarded rather than kept as output, matching the reference's
/// handling of whitespace-only nonscript runs in that position.
fn skip_leading_nonscript_gap(cur: &mut TokenCursor<'_>, diagnostics: &mut Diagnostics) -> Result<(), ParserError> {
    if cur.try_kind(TokenKind::DelimEnd) {
        cur.advance();
        let mut discarded = Vec::new();
        scan_nonscript_into(cur, diagnostics, &mut discarded, BlockStmt::Output, BlockStmt::Include)?;
        cur.assert_consume_kind(TokenKind::DelimStartScript, "'<%' resuming the script block")?;
    }
    Ok(())
}

fn parse_select_stmt(
    cur: &mut TokenCursor<'_>,
    diagnostics: &mut Diagnostics,
    settings: ParserSettings,
    depth: u32,
) -> Result<SelectStmt, ParserError> {
    if !cur.try_consume_identifier_ci("case") {
        return Err(cur.unexpected("'Case'"));
    }
    let select_case_expr = super::expr::parse_expr(cur)?;
    cur.assert_newline_or_script_end()?;
    skip_leading_nonscript_gap(cur, diagnostics)?;

    let mut case_stmt_list = Vec::new();
    loop {
        if is_end_of(cur, "select") {
            break;
        }
        if !cur.try_consume_identifier_ci("case") {
            return Err(cur.unexpected("'Case'"));
        }
        let is_else = cur.try_consume_identifier_ci("else");
        let mut case_expr_list = Vec::new();
        if !is_else {
            case_expr_list.push(super::expr::parse_expr(cur)?);
            while cur.try_consume_symbol(",") {
                case_expr_list.push(super::expr::parse_expr(cur)?);
            }
        }
        cur.assert_newline_or_script_end()?;
        let block_stmt_list = parse_block_stmt_list(cur, diagnostics, settings, depth, |c| {
            is_keyword_at(c, 0, "case") || is_end_of(c, "select")
        })?;
        case_stmt_list.push(CaseStmt { block_stmt_list, case_expr_list, is_else });
        if is_else {
            break;
        }
    }
    assert_end_of(cur, "select")?;
    Ok(SelectStmt { select_case_expr, case_stmt_list })
}

// ---- Do/Loop, While/WEnd, For --------------------------------------------

fn parse_do_loop_stmt(
    cur: &mut TokenCursor<'_>,
    diagnostics: &mut Diagnostics,
    settings: ParserSettings,
    depth: u32,
) -> Result<LoopStmt, ParserError> {
    let mut loop_type = None;
    let mut loop_expr = None;
    let mut condition_at_head = false;
    if cur.try_consume_identifier_ci("while") {
        loop_type = Some(LoopConditionKind::While);
        loop_expr = Some(super::expr::parse_expr(cur)?);
        condition_at_head = true;
    } else if cur.try_consume_identifier_ci("until") {
        loop_type = Some(LoopConditionKind::Until);
        loop_expr = Some(super::expr::parse_expr(cur)?);
        condition_at_head = true;
    }
    cur.assert_newline_or_script_end()?;
    let block_stmt_list = parse_block_stmt_list(cur, diagnostics, settings, depth, |c| is_keyword_at(c, 0, "loop"))?;
    if !cur.try_consume_identifier_ci("loop") {
        return Err(cur.unexpected("'Loop'"));
    }
    if loop_type.is_none() {
        if cur.try_consume_identifier_ci("while") {
            loop_type = Some(LoopConditionKind::While);
            loop_expr = Some(super::expr::parse_expr(cur)?);
        } else if cur.try_consume_identifier_ci("until") {
            loop_type = Some(LoopConditionKind::Until);
            loop_expr = Some(super::expr::parse_expr(cur)?);
        }
    }
    cur.assert_newline_or_script_end()?;
    Ok(LoopStmt { block_stmt_list, loop_type, loop_expr, condition_at_head })
}

fn parse_while_wend_stmt(
    cur: &mut TokenCursor<'_>,
    diagnostics: &mut Diagnostics,
    settings: ParserSettings,
    depth: u32,
) -> Result<LoopStmt, ParserError> {
    let loop_expr = super::expr::parse_expr(cur)?;
    cur.assert_newline_or_script_end()?;
    let block_stmt_list = parse_block_stmt_list(cur, diagnostics, settings, depth, |c| is_keyword_at(c, 0, "wend"))?;
    if !cur.try_consume_identifier_ci("wend") {
        return Err(cur.unexpected("'WEnd'"));
    }
    cur.assert_newline_or_script_end()?;
    Ok(LoopStmt {
        block_stmt_list,
        loop_type: Some(LoopConditionKind::While),
        loop_expr: Some(loop_expr),
        condition_at_head: true,
    })
}

fn parse_for_stmt(
    cur: &mut TokenCursor<'_>,
    diagnostics: &mut Diagnostics,
    settings: ParserSettings,
    depth: u32,
) -> Result<ForStmt, ParserError> {
    if cur.try_consume_identifier_ci("each") {
        let target_id = parse_extended_id(cur)?;
        if !cur.try_consume_identifier_ci("in") {
            return Err(cur.unexpected("'In'"));
        }
        let each_in_expr = super::expr::parse_expr(cur)?;
        cur.assert_newline_or_script_end()?;
        let block_stmt_list = parse_block_stmt_list(cur, diagnostics, settings, depth, |c| is_keyword_at(c, 0, "next"))?;
        if !cur.try_consume_identifier_ci("next") {
            return Err(cur.unexpected("'Next'"));
        }
        cur.assert_newline_or_script_end()?;
        return Ok(ForStmt {
            target_id,
            header: ForHeader::EachIn { each_in_expr },
            block_stmt_list,
        });
    }

    let target_id = parse_extended_id(cur)?;
    cur.assert_consume_symbol("=")?;
    let eq_expr = super::expr::parse_expr(cur)?;
    if !cur.try_consume_identifier_ci("to") {
        return Err(cur.unexpected("'To'"));
    }
    let to_expr = super::expr::parse_expr(cur)?;
    let step_expr = if cur.try_consume_identifier_ci("step") {
        Some(super::expr::parse_expr(cur)?)
    } else {
        None
    };
    cur.assert_newline_or_script_end()?;
    let block_stmt_list = parse_block_stmt_list(cur, diagnostics, settings, depth, |c| is_keyword_at(c, 0, "next"))?;
    if !cur.try_consume_identifier_ci("next") {
        return Err(cur.unexpected("'Next'"));
    }
    cur.assert_newline_or_script_end()?;
    Ok(ForStmt {
        target_id,
        header: ForHeader::ToLoop { eq_expr, to_expr, step_expr },
        block_stmt_list,
    })
}

// ---- global (top-level, per script region) statement list ---------------

fn parse_global_stmt(
    cur: &mut TokenCursor<'_>,
    diagnostics: &mut Diagnostics,
    settings: ParserSettings,
    depth: u32,
) -> Result<GlobalStmt, ParserError> {
    if cur.try_consume_identifier_ci("option") {
        if !cur.try_consume_identifier_ci("explicit") {
            return Err(cur.unexpected("'Explicit'"));
        }
        cur.assert_newline_or_script_end()?;
        return Ok(GlobalStmt::OptionExplicit);
    }
    if cur.try_consume_identifier_ci("class") {
        let decl = super::decl::parse_class_decl(cur, diagnostics, settings, depth + 1)?;
        return Ok(GlobalStmt::Class(decl));
    }

    let access_mod = try_parse_access_modifier(cur);
    if cur.try_consume_identifier_ci("const") {
        let decl = parse_const_decl(cur, access_mod)?;
        cur.assert_newline_or_script_end()?;
        return Ok(GlobalStmt::Const(decl));
    }
    if cur.try_consume_identifier_ci("sub") {
        return Ok(GlobalStmt::Sub(super::decl::parse_sub_decl(cur, diagnostics, settings, depth + 1, access_mod)?));
    }
    if cur.try_consume_identifier_ci("function") {
        return Ok(GlobalStmt::Function(super::decl::parse_function_decl(
            cur,
            diagnostics,
            settings,
            depth + 1,
            access_mod,
        )?));
    }
    if access_mod.is_some() {
        let decl = parse_field_decl(cur, access_mod)?;
        cur.assert_newline_or_script_end()?;
        return Ok(GlobalStmt::Field(decl));
    }

    Ok(GlobalStmt::Block(parse_block_stmt(cur, diagnostics, settings, depth)?))
}

/// The statement list for a single `<% ... %>` script region at the top
/// level. Unlike [`parse_block_stmt_list`], this does *not* cross `%>`/`<%`
/// gaps itself — at this level a `%>` simply ends the region, and the
/// driver's own loop picks the next one back up, whether that is more
/// template text or a fresh script region.
pub(super) fn parse_global_stmt_list(
    cur: &mut TokenCursor<'_>,
    diagnostics: &mut Diagnostics,
    settings: ParserSettings,
    depth: u32,
) -> Result<Vec<GlobalStmt>, ParserError> {
    let mut out = Vec::new();
    while !cur.try_kind(TokenKind::DelimEnd) && !cur.at_end() {
        out.push(parse_global_stmt(cur, diagnostics, settings, depth)?);
    }
    Ok(out)
}
