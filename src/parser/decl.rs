//! `Class`/`Sub`/`Function`/`Property` declarations and their argument
//! lists. Ported in behavior from `ast_types/parser.py`'s
//! `parse_class_decl`/`parse_sub_decl`/`parse_function_decl`/
//! `parse_property_decl`.

use crate::ast::{
    AccessModifier, Arg, ArgModifier, ClassDecl, FunctionDecl, MemberDecl, PropertyAccessType, PropertyDecl, SubDecl,
};
use crate::diagnostics::Diagnostics;
use crate::error::ParserError;

use super::cursor::TokenCursor;
use super::stmt::{
    parse_const_decl, parse_extended_id, parse_field_decl, parse_method_stmt_list, parse_var_decl,
    try_parse_access_modifier,
};
use super::ParserSettings;

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

/// `[ByVal|ByRef] ExtendedID[()]`, comma-separated inside a method's
/// `(...)` parameter list (spec §4.4's `Arg`).
fn parse_arg(cur: &mut TokenCursor<'_>) -> Result<Arg, ParserError> {
    let arg_modifier = if cur.try_consume_identifier_ci("byval") {
        Some(ArgModifier::ByVal)
    } else if cur.try_consume_identifier_ci("byref") {
        Some(ArgModifier::ByRef)
    } else {
        None
    };
    let extended_id = parse_extended_id(cur)?;
    let has_paren = if cur.try_consume_symbol("(") {
        cur.assert_consume_symbol(")")?;
        true
    } else {
        false
    };
    Ok(Arg { extended_id, arg_modifier, has_paren })
}

fn parse_method_arg_list(cur: &mut TokenCursor<'_>) -> Result<Vec<Arg>, ParserError> {
    if !cur.try_consume_symbol("(") {
        return Ok(Vec::new());
    }
    let mut args = Vec::new();
    if cur.current_text() != Some(")") {
        args.push(parse_arg(cur)?);
        while cur.try_consume_symbol(",") {
            args.push(parse_arg(cur)?);
        }
    }
    cur.assert_consume_symbol(")")?;
    Ok(args)
}

pub(super) fn parse_sub_decl(
    cur: &mut TokenCursor<'_>,
    diagnostics: &mut Diagnostics,
    settings: ParserSettings,
    depth: u32,
    access_mod: Option<AccessModifier>,
) -> Result<SubDecl, ParserError> {
    let extended_id = parse_extended_id(cur)?;
    let method_arg_list = parse_method_arg_list(cur)?;
    cur.assert_newline_or_script_end()?;
    let method_stmt_list = parse_method_stmt_list(cur, diagnostics, settings, depth, |c| is_end_of(c, "sub"))?;
    assert_end_of(cur, "sub")?;
    Ok(SubDecl { extended_id, method_arg_list, method_stmt_list, access_mod })
}

pub(super) fn parse_function_decl(
    cur: &mut TokenCursor<'_>,
    diagnostics: &mut Diagnostics,
    settings: ParserSettings,
    depth: u32,
    access_mod: Option<AccessModifier>,
) -> Result<FunctionDecl, ParserError> {
    let extended_id = parse_extended_id(cur)?;
    let method_arg_list = parse_method_arg_list(cur)?;
    cur.assert_newline_or_script_end()?;
    let method_stmt_list = parse_method_stmt_list(cur, diagnostics, settings, depth, |c| is_end_of(c, "function"))?;
    assert_end_of(cur, "function")?;
    Ok(FunctionDecl { extended_id, method_arg_list, method_stmt_list, access_mod })
}

fn parse_property_access_type(cur: &mut TokenCursor<'_>) -> Result<PropertyAccessType, ParserError> {
    if cur.try_consume_identifier_ci("get") {
        Ok(PropertyAccessType::Get)
    } else if cur.try_consume_identifier_ci("let") {
        Ok(PropertyAccessType::Let)
    } else if cur.try_consume_identifier_ci("set") {
        Ok(PropertyAccessType::Set)
    } else {
        Err(cur.unexpected("'Get', 'Let', or 'Set'"))
    }
}

fn parse_property_decl(
    cur: &mut TokenCursor<'_>,
    diagnostics: &mut Diagnostics,
    settings: ParserSettings,
    depth: u32,
    access_mod: Option<AccessModifier>,
) -> Result<PropertyDecl, ParserError> {
    let prop_access_type = parse_property_access_type(cur)?;
    let extended_id = parse_extended_id(cur)?;
    let method_arg_list = parse_method_arg_list(cur)?;
    cur.assert_newline_or_script_end()?;
    let method_stmt_list = parse_method_stmt_list(cur, diagnostics, settings, depth, |c| is_end_of(c, "property"))?;
    assert_end_of(cur, "property")?;
    Ok(PropertyDecl {
        prop_access_type,
        extended_id,
        method_arg_list,
        method_stmt_list,
        access_mod,
    })
}

fn parse_member_decl(
    cur: &mut TokenCursor<'_>,
    diagnostics: &mut Diagnostics,
    settings: ParserSettings,
    depth: u32,
) -> Result<MemberDecl, ParserError> {
    let access_mod = try_parse_access_modifier(cur);
    if cur.try_consume_identifier_ci("const") {
        let decl = parse_const_decl(cur, access_mod)?;
        cur.assert_newline_or_script_end()?;
        return Ok(MemberDecl::Const(decl));
    }
    if cur.try_consume_identifier_ci("sub") {
        return Ok(MemberDecl::Sub(parse_sub_decl(cur, diagnostics, settings, depth, access_mod)?));
    }
    if cur.try_consume_identifier_ci("function") {
        return Ok(MemberDecl::Function(parse_function_decl(cur, diagnostics, settings, depth, access_mod)?));
    }
    if cur.try_consume_identifier_ci("property") {
        return Ok(MemberDecl::Property(parse_property_decl(cur, diagnostics, settings, depth, access_mod)?));
    }
    if access_mod.is_some() {
        let decl = parse_field_decl(cur, access_mod)?;
        cur.assert_newline_or_script_end()?;
        return Ok(MemberDecl::Field(decl));
    }
    if cur.try_consume_identifier_ci("dim") {
        let decl = parse_var_decl(cur)?;
        cur.assert_newline_or_script_end()?;
        return Ok(MemberDecl::Var(decl));
    }
    Err(cur.unexpected("a class member (`Dim`, `Const`, `Sub`, `Function`, or `Property`)"))
}

pub(super) fn parse_class_decl(
    cur: &mut TokenCursor<'_>,
    diagnostics: &mut Diagnostics,
    settings: ParserSettings,
    depth: u32,
) -> Result<ClassDecl, ParserError> {
    if depth > settings.max_block_depth {
        return Err(ParserError::BlockDepthExceeded { limit: settings.max_block_depth });
    }
    let extended_id = parse_extended_id(cur)?;
    cur.assert_newline_or_script_end()?;
    let mut member_decl_list = Vec::new();
    while !is_end_of(cur, "class") {
        if cur.at_end() {
            return Err(cur.unexpected("'End Class'"));
        }
        member_decl_list.push(parse_member_decl(cur, diagnostics, settings, depth)?);
    }
    assert_end_of(cur, "class")?;
    Ok(ClassDecl { extended_id, member_decl_list })
}
