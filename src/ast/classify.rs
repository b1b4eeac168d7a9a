//! Post-parse promotion of generic [`LeftExpr`] nodes into the closed
//! built-in intrinsic variants [`ast::builtins`] defines (spec §4.7). Runs
//! once over the finished [`Program`], after every statement and
//! expression shape is already fixed — the only place in the tree that
//! knows whether a `LeftExpr` sits in "sub-call position"
//! (`SubCallStmt::left_expr`, spec's `is_subcall`) is the statement walk
//! itself, not the expression parser that built the node.

use super::builtins::classify as classify_left_expr;
use super::expr::{Expr, IndexOrParams, LeftExpr};
use super::special::OutputText;
use super::stmt::{
    BlockStmt, ClassDecl, ConstDecl, ForHeader, GlobalStmt, InlineStmt, MemberDecl, MethodStmt,
};
use super::{Program, TopLevelItem};
use crate::error::ParserError;

/// Walks every expression reachable from `program` and replaces each
/// `Expr::LeftExpr` whose root symbol names a built-in (`Response`/
/// `Request`/`Server`) with the classified `Expr::Builtin` variant.
pub fn promote_program(program: &mut Program) -> Result<(), ParserError> {
    for item in &mut program.items {
        promote_top_level_item(item)?;
    }
    Ok(())
}

fn promote_top_level_item(item: &mut TopLevelItem) -> Result<(), ParserError> {
    match item {
        TopLevelItem::Global(g) => promote_global_stmt(g),
        TopLevelItem::Processing(_) | TopLevelItem::Include(_) => Ok(()),
        TopLevelItem::Output(out) => promote_output_text(out),
    }
}

fn promote_output_text(out: &mut OutputText) -> Result<(), ParserError> {
    for d in &mut out.directives {
        promote_expr(&mut d.output_expr, false)?;
    }
    Ok(())
}

fn promote_global_stmt(stmt: &mut GlobalStmt) -> Result<(), ParserError> {
    match stmt {
        GlobalStmt::OptionExplicit | GlobalStmt::Field(_) => Ok(()),
        GlobalStmt::Class(c) => promote_class_decl(c),
        GlobalStmt::Const(c) => promote_const_decl(c),
        GlobalStmt::Sub(s) => promote_method_stmts(&mut s.method_stmt_list),
        GlobalStmt::Function(f) => promote_method_stmts(&mut f.method_stmt_list),
        GlobalStmt::Block(b) => promote_block_stmt(b),
    }
}

fn promote_const_decl(c: &mut ConstDecl) -> Result<(), ParserError> {
    for item in &mut c.const_list {
        promote_expr(&mut item.const_expr, false)?;
    }
    Ok(())
}

fn promote_class_decl(c: &mut ClassDecl) -> Result<(), ParserError> {
    for m in &mut c.member_decl_list {
        promote_member_decl(m)?;
    }
    Ok(())
}

fn promote_member_decl(m: &mut MemberDecl) -> Result<(), ParserError> {
    match m {
        MemberDecl::Field(_) | MemberDecl::Var(_) => Ok(()),
        MemberDecl::Const(c) => promote_const_decl(c),
        MemberDecl::Sub(s) => promote_method_stmts(&mut s.method_stmt_list),
        MemberDecl::Function(f) => promote_method_stmts(&mut f.method_stmt_list),
        MemberDecl::Property(p) => promote_method_stmts(&mut p.method_stmt_list),
    }
}

fn promote_method_stmts(list: &mut [MethodStmt]) -> Result<(), ParserError> {
    for stmt in list {
        match stmt {
            MethodStmt::Const(c) => promote_const_decl(c)?,
            MethodStmt::Block(b) => promote_block_stmt(b)?,
        }
    }
    Ok(())
}

fn promote_block_stmts(list: &mut [BlockStmt]) -> Result<(), ParserError> {
    for stmt in list {
        promote_block_stmt(stmt)?;
    }
    Ok(())
}

fn promote_block_stmt(stmt: &mut BlockStmt) -> Result<(), ParserError> {
    match stmt {
        BlockStmt::Var(_) | BlockStmt::Include(_) => Ok(()),
        BlockStmt::Redim(r) => {
            for decl in &mut r.redim_decl_list {
                for e in &mut decl.expr_list {
                    promote_expr(e, false)?;
                }
            }
            Ok(())
        }
        BlockStmt::If(i) => {
            promote_expr(&mut i.if_expr, false)?;
            promote_block_stmts(&mut i.block_stmt_list)?;
            for else_stmt in &mut i.else_stmt_list {
                if let Some(e) = &mut else_stmt.elif_expr {
                    promote_expr(e, false)?;
                }
                promote_block_stmts(&mut else_stmt.stmt_list)?;
            }
            Ok(())
        }
        BlockStmt::With(w) => {
            promote_expr(&mut w.with_expr, false)?;
            promote_block_stmts(&mut w.block_stmt_list)
        }
        BlockStmt::Select(s) => {
            promote_expr(&mut s.select_case_expr, false)?;
            for case in &mut s.case_stmt_list {
                for e in &mut case.case_expr_list {
                    promote_expr(e, false)?;
                }
                promote_block_stmts(&mut case.block_stmt_list)?;
            }
            Ok(())
        }
        BlockStmt::Loop(l) => {
            if let Some(e) = &mut l.loop_expr {
                promote_expr(e, false)?;
            }
            promote_block_stmts(&mut l.block_stmt_list)
        }
        BlockStmt::For(f) => {
            match &mut f.header {
                ForHeader::ToLoop { eq_expr, to_expr, step_expr } => {
                    promote_expr(eq_expr, false)?;
                    promote_expr(to_expr, false)?;
                    if let Some(e) = step_expr {
                        promote_expr(e, false)?;
                    }
                }
                ForHeader::EachIn { each_in_expr } => promote_expr(each_in_expr, false)?,
            }
            promote_block_stmts(&mut f.block_stmt_list)
        }
        BlockStmt::Inline(inline) => promote_inline_stmt(inline),
        BlockStmt::Output(out) => promote_output_text(out),
    }
}

/// The only place in the tree where `is_subcall` can be `true`: a bare
/// `SubCallStmt`'s own callee (`Foo.Bar ...`), never its arguments.
fn promote_inline_stmt(inline: &mut InlineStmt) -> Result<(), ParserError> {
    match inline {
        InlineStmt::Assign(a) => {
            promote_expr(&mut a.target_expr, false)?;
            promote_expr(&mut a.assign_expr, false)
        }
        InlineStmt::Call(c) => promote_expr(&mut c.left_expr, false),
        InlineStmt::SubCall(s) => {
            if let Some(e) = &mut s.sub_safe_expr {
                promote_expr(e, false)?;
            }
            for e in s.comma_expr_list.iter_mut().flatten() {
                promote_expr(e, false)?;
            }
            match &mut s.left_expr {
                Expr::LeftExpr(left) => {
                    promote_left_expr_args(left)?;
                    synthesize_subcall_args(left, s.sub_safe_expr.take(), &mut s.comma_expr_list);
                    if let Some(promoted) = classify_left_expr(left, true, left.pos)? {
                        s.left_expr = Expr::Builtin(Box::new(promoted));
                    }
                    Ok(())
                }
                other => promote_expr(other, true),
            }
        }
        InlineStmt::Error(_) | InlineStmt::Exit(_) | InlineStmt::Erase(_) => Ok(()),
    }
}

/// `Foo.Bar arg1, arg2` (no parens) reads identically to `Foo.Bar(arg1,
/// arg2)` for classification purposes: a bare sub-call statement's
/// trailing arguments live on `SubCallStmt` itself, not on the callee's
/// own `LeftExpr`, since the parser doesn't know at that point whether
/// parens will follow. Fold them into the callee's call-segment before
/// `classify` ever sees it, so e.g. `Response.Write "x"` classifies the
/// same way `Response.Write("x")` does. No-op when the callee already
/// carries explicit call parens (`Response.Write("x") `, `, "y"`).
fn synthesize_subcall_args(left: &mut LeftExpr, sub_safe_expr: Option<Expr>, trailing: &mut Vec<Option<Expr>>) {
    let already_called = !left.index_or_params.is_empty()
        || left.tail.last().map(|t| !t.index_or_params.is_empty()).unwrap_or(false);
    if already_called {
        return;
    }
    let mut args = Vec::new();
    if let Some(e) = sub_safe_expr {
        args.push(Some(e));
    }
    args.append(trailing);
    if args.is_empty() {
        return;
    }
    let group = IndexOrParams { args, dot: false };
    match left.tail.last_mut() {
        Some(t) => t.index_or_params.push(group),
        None => left.index_or_params.push(group),
    }
}

fn promote_left_expr_args(left: &mut LeftExpr) -> Result<(), ParserError> {
    for group in &mut left.index_or_params {
        for arg in group.args.iter_mut().flatten() {
            promote_expr(arg, false)?;
        }
    }
    for t in &mut left.tail {
        for group in &mut t.index_or_params {
            for arg in group.args.iter_mut().flatten() {
                promote_expr(arg, false)?;
            }
        }
    }
    Ok(())
}

fn promote_expr(expr: &mut Expr, is_subcall: bool) -> Result<(), ParserError> {
    match expr {
        Expr::Imp(l, r)
        | Expr::Eqv(l, r)
        | Expr::Xor(l, r)
        | Expr::Or(l, r)
        | Expr::And(l, r)
        | Expr::Compare(_, l, r)
        | Expr::Concat(l, r)
        | Expr::Add(l, r)
        | Expr::Mod(l, r)
        | Expr::IntDiv(l, r)
        | Expr::Mult(l, r)
        | Expr::Exp(l, r) => {
            promote_expr(l, false)?;
            promote_expr(r, false)?;
            Ok(())
        }
        Expr::Not(inner)
        | Expr::Unary(_, inner)
        | Expr::AddNegated(inner)
        | Expr::MultReciprocal(inner)
        | Expr::Foldable(inner) => promote_expr(inner, false),
        Expr::Const(_) | Expr::Eval(_) | Expr::Builtin(_) => Ok(()),
        Expr::LeftExpr(left) => {
            promote_left_expr_args(left)?;
            if let Some(promoted) = classify_left_expr(left, is_subcall, left.pos)? {
                *expr = Expr::Builtin(Box::new(promoted));
            }
            Ok(())
        }
    }
}
