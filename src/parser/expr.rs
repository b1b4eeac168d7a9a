//! The expression parser: one function per precedence level, folding
//! constants in as each node is built rather than as a separate pass.
//! Ported in behavior from `ast_types/expression_parser.py`'s
//! `ExpressionParser`.
//!
//! `sub_safe` threads through every level unchanged and is consulted only
//! by [`parse_value`]: when set, a leading `(` is parsed as an ordinary
//! value expression rather than a parenthesized sub-expression, which is
//! what lets a `SubCallStmt`'s first argument read `Foo (1), 2` without
//! the parser mistaking `(1)` for a call's argument list.

use std::collections::VecDeque;

use crate::ast::eval::Value;
use crate::ast::expr::{
    CompareExprType, ConstLeaf, Expr, IdSegment, IndexOrParams, LeftExpr, LeftExprTail, QualifiedId, UnarySign,
};
use crate::ast::fold::{can_fold, reduce_foldable, try_fold, wrap_add_negated, wrap_mult_reciprocal};
use crate::error::ParserError;
use crate::token::TokenKind;

use super::cursor::TokenCursor;

/// A left-to-right fold queue: `dequeue` pops the *front*, giving
/// left-associative combination when paired with `fold_front`.
struct ExprQueue(VecDeque<Expr>);

impl ExprQueue {
    fn new(first: Expr) -> Self {
        let mut q = VecDeque::new();
        q.push_back(first);
        ExprQueue(q)
    }

    fn enqueue(&mut self, expr: Expr) {
        self.0.push_back(expr);
    }

    fn dequeue(&mut self) -> Expr {
        self.0.pop_front().expect("ExprQueue emptied by an unbalanced fold")
    }

    fn must_combine(&self) -> bool {
        self.0.len() > 1
    }

    fn fold_front_with(&mut self, ctor: impl FnOnce(Box<Expr>, Box<Expr>) -> Expr) {
        let left = self.dequeue();
        let right = self.dequeue();
        let folded = try_fold(left, right, ctor);
        self.0.push_front(folded);
    }

    fn fold(&mut self, ctor: fn(Box<Expr>, Box<Expr>) -> Expr) {
        while self.must_combine() {
            self.fold_front_with(ctor);
        }
    }
}

/// A right-to-left fold stack: `pop` pops the *back*, and combining the
/// top two entries first gives right-associative combination — needed
/// only for `^`.
struct ExprStack(Vec<Expr>);

impl ExprStack {
    fn new(first: Expr) -> Self {
        ExprStack(vec![first])
    }

    fn push(&mut self, expr: Expr) {
        self.0.push(expr);
    }

    fn pop(&mut self) -> Expr {
        self.0.pop().expect("ExprStack emptied by an unbalanced fold")
    }

    fn must_combine(&self) -> bool {
        self.0.len() > 1
    }

    fn fold_back(&mut self, ctor: fn(Box<Expr>, Box<Expr>) -> Expr) {
        let right = self.pop();
        let left = self.pop();
        let folded = try_fold(left, right, ctor);
        self.0.push(folded);
    }

    fn fold(&mut self, ctor: fn(Box<Expr>, Box<Expr>) -> Expr) {
        while self.must_combine() {
            self.fold_back(ctor);
        }
    }
}

/// Entry point used everywhere outside a sub-call's first argument.
pub fn parse_expr(cur: &mut TokenCursor<'_>) -> Result<Expr, ParserError> {
    parse_imp_expr(cur, false)
}

/// Entry point for a position where a leading `(` must not be read as a
/// parenthesized sub-expression (spec §4.3/§4.5's `SubCallStmt` ambiguity).
pub fn parse_expr_sub_safe(cur: &mut TokenCursor<'_>) -> Result<Expr, ParserError> {
    parse_imp_expr(cur, true)
}

/// The precedence ladder's sole re-entry point: `parse_value`'s
/// parenthesized-subexpression case and `parse_arg_list`'s per-argument
/// parse both call back in here directly, so guarding recursion depth at
/// this one spot bounds both (spec §2's depth limit).
fn parse_imp_expr(cur: &mut TokenCursor<'_>, sub_safe: bool) -> Result<Expr, ParserError> {
    cur.enter_expr()?;
    let result = parse_imp_expr_inner(cur, sub_safe);
    cur.exit_expr();
    result
}

fn parse_imp_expr_inner(cur: &mut TokenCursor<'_>, sub_safe: bool) -> Result<Expr, ParserError> {
    let mut q = ExprQueue::new(parse_eqv_expr(cur, sub_safe)?);
    while cur.try_consume_identifier_ci("imp") {
        q.enqueue(parse_eqv_expr(cur, sub_safe)?);
    }
    q.fold(Expr::Imp);
    Ok(q.dequeue())
}

fn parse_eqv_expr(cur: &mut TokenCursor<'_>, sub_safe: bool) -> Result<Expr, ParserError> {
    let mut q = ExprQueue::new(parse_xor_expr(cur, sub_safe)?);
    while cur.try_consume_identifier_ci("eqv") {
        q.enqueue(parse_xor_expr(cur, sub_safe)?);
    }
    q.fold(Expr::Eqv);
    Ok(q.dequeue())
}

fn parse_xor_expr(cur: &mut TokenCursor<'_>, sub_safe: bool) -> Result<Expr, ParserError> {
    let mut q = ExprQueue::new(parse_or_expr(cur, sub_safe)?);
    while cur.try_consume_identifier_ci("xor") {
        q.enqueue(parse_or_expr(cur, sub_safe)?);
    }
    q.fold(Expr::Xor);
    Ok(q.dequeue())
}

fn parse_or_expr(cur: &mut TokenCursor<'_>, sub_safe: bool) -> Result<Expr, ParserError> {
    let mut q = ExprQueue::new(parse_and_expr(cur, sub_safe)?);
    while cur.try_consume_identifier_ci("or") {
        q.enqueue(parse_and_expr(cur, sub_safe)?);
    }
    q.fold(Expr::Or);
    Ok(q.dequeue())
}

fn parse_and_expr(cur: &mut TokenCursor<'_>, sub_safe: bool) -> Result<Expr, ParserError> {
    let mut q = ExprQueue::new(parse_not_expr(cur, sub_safe)?);
    while cur.try_consume_identifier_ci("and") {
        q.enqueue(parse_not_expr(cur, sub_safe)?);
    }
    q.fold(Expr::And);
    Ok(q.dequeue())
}

/// `Not` only wraps once per *parity* of consecutive `not` tokens: an even
/// run cancels out and is dropped (it would already have been folded away
/// by `parse_compare_expr` if the operand was constant).
fn parse_not_expr(cur: &mut TokenCursor<'_>, sub_safe: bool) -> Result<Expr, ParserError> {
    let mut not_count: u32 = 0;
    while cur.try_consume_identifier_ci("not") {
        not_count += 1;
    }
    let expr = parse_compare_expr(cur, sub_safe)?;
    if not_count % 2 == 0 {
        return Ok(expr);
    }
    let foldable = can_fold(&expr);
    let inner = match expr {
        Expr::Foldable(inner) => *inner,
        other => other,
    };
    let not_expr = Expr::Not(Box::new(inner));
    Ok(if foldable {
        reduce_foldable(Expr::Foldable(Box::new(not_expr)))
    } else {
        not_expr
    })
}

fn peek_compare_op(cur: &TokenCursor<'_>) -> bool {
    match cur.current() {
        Some(tok) if tok.is_identifier() => tok.text(cur.source()).eq_ignore_ascii_case("is"),
        Some(tok) if tok.kind == TokenKind::Symbol => {
            matches!(tok.text(cur.source()), ">=" | "<=" | "<>" | ">" | "<" | "=")
        }
        _ => false,
    }
}

fn consume_compare_op(cur: &mut TokenCursor<'_>) -> CompareExprType {
    if cur.try_consume_identifier_ci("is") {
        return if cur.try_consume_identifier_ci("not") {
            CompareExprType::IsNot
        } else {
            CompareExprType::Is
        };
    }
    let tok = cur.advance().expect("peek_compare_op confirmed a comparison token");
    match tok.text(cur.source()) {
        ">=" => CompareExprType::GtEq,
        "<=" => CompareExprType::LtEq,
        "<>" => CompareExprType::LtGt,
        ">" => CompareExprType::Gt,
        "<" => CompareExprType::Lt,
        "=" => CompareExprType::Eq,
        other => unreachable!("peek_compare_op accepted an unknown symbol {other:?}"),
    }
}

/// Compare chains carry their own operator queue alongside the expression
/// queue, since each fold step needs a different `CompareExprType`.
fn parse_compare_expr(cur: &mut TokenCursor<'_>, sub_safe: bool) -> Result<Expr, ParserError> {
    let mut q = ExprQueue::new(parse_concat_expr(cur, sub_safe)?);
    let mut ops: VecDeque<CompareExprType> = VecDeque::new();
    while peek_compare_op(cur) {
        ops.push_back(consume_compare_op(cur));
        q.enqueue(parse_concat_expr(cur, sub_safe)?);
    }
    while q.must_combine() {
        let op = ops.pop_front().expect("one operator per fold step");
        q.fold_front_with(move |l, r| Expr::Compare(op, l, r));
    }
    debug_assert!(ops.is_empty());
    Ok(q.dequeue())
}

/// `&` re-folds into an existing `Concat`'s right operand when that
/// operand is itself foldable, rather than wrapping the whole chain in a
/// new outer node — keeps a long literal concatenation collapsing to one
/// constant instead of a right-leaning tree of `Foldable` markers.
fn parse_concat_expr(cur: &mut TokenCursor<'_>, sub_safe: bool) -> Result<Expr, ParserError> {
    let mut concat_expr = parse_add_expr(cur, sub_safe)?;
    while cur.try_consume_symbol("&") {
        let next = parse_add_expr(cur, sub_safe)?;
        concat_expr = match concat_expr {
            Expr::Concat(left, right) if can_fold(&right) => {
                let new_right = try_fold(*right, next, Expr::Concat);
                Expr::Concat(left, Box::new(new_right))
            }
            other => try_fold(other, next, Expr::Concat),
        };
    }
    Ok(concat_expr)
}

/// Accumulates one more term of an `Add`/`Mult` chain into whichever of
/// the two running accumulators it belongs to: constant terms fold
/// eagerly into `imm`, everything else chains onto `dfr` with a plain
/// node (spec §4.3's algebraic-normalization pass).
fn accumulate(
    imm: &mut Option<Expr>,
    dfr: &mut Option<Expr>,
    term: Expr,
    ctor: fn(Box<Expr>, Box<Expr>) -> Expr,
) {
    if can_fold(&term) {
        *imm = Some(match imm.take() {
            Some(acc) => try_fold(acc, term, ctor),
            None => term,
        });
    } else {
        *dfr = Some(match dfr.take() {
            Some(acc) => ctor(Box::new(acc), Box::new(term)),
            None => term,
        });
    }
}

/// Combines the `imm`/`dfr` accumulators built by `accumulate`: an
/// immediate-only chain evaluates down to one constant, a deferred-only
/// chain is returned as-is, and a mix puts the folded constant on the
/// left and the deferred chain on the right.
fn combine(imm: Option<Expr>, dfr: Option<Expr>, ctor: fn(Box<Expr>, Box<Expr>) -> Expr) -> Expr {
    match (imm, dfr) {
        (Some(i), None) => reduce_foldable(i),
        (None, Some(d)) => d,
        (Some(i), Some(d)) => ctor(Box::new(reduce_foldable(i)), Box::new(d)),
        (None, None) => unreachable!("at least one term was parsed before combine() runs"),
    }
}

fn parse_add_expr(cur: &mut TokenCursor<'_>, sub_safe: bool) -> Result<Expr, ParserError> {
    let mut imm = None;
    let mut dfr = None;
    accumulate(&mut imm, &mut dfr, parse_mod_expr(cur, sub_safe)?, Expr::Add);
    loop {
        let term = if cur.try_consume_symbol("+") {
            parse_mod_expr(cur, sub_safe)?
        } else if cur.try_consume_symbol("-") {
            wrap_add_negated(parse_mod_expr(cur, sub_safe)?)
        } else {
            break;
        };
        accumulate(&mut imm, &mut dfr, term, Expr::Add);
    }
    Ok(combine(imm, dfr, Expr::Add))
}

fn parse_mod_expr(cur: &mut TokenCursor<'_>, sub_safe: bool) -> Result<Expr, ParserError> {
    let mut q = ExprQueue::new(parse_int_div_expr(cur, sub_safe)?);
    while cur.try_consume_identifier_ci("mod") {
        q.enqueue(parse_int_div_expr(cur, sub_safe)?);
    }
    q.fold(Expr::Mod);
    Ok(q.dequeue())
}

fn parse_int_div_expr(cur: &mut TokenCursor<'_>, sub_safe: bool) -> Result<Expr, ParserError> {
    let mut q = ExprQueue::new(parse_mult_expr(cur, sub_safe)?);
    while cur.try_consume_symbol("\\") {
        q.enqueue(parse_mult_expr(cur, sub_safe)?);
    }
    q.fold(Expr::IntDiv);
    Ok(q.dequeue())
}

fn parse_mult_expr(cur: &mut TokenCursor<'_>, sub_safe: bool) -> Result<Expr, ParserError> {
    let mut imm = None;
    let mut dfr = None;
    accumulate(&mut imm, &mut dfr, parse_unary_expr(cur, sub_safe)?, Expr::Mult);
    loop {
        let term = if cur.try_consume_symbol("*") {
            parse_unary_expr(cur, sub_safe)?
        } else if cur.try_consume_symbol("/") {
            wrap_mult_reciprocal(parse_unary_expr(cur, sub_safe)?)
        } else {
            break;
        };
        accumulate(&mut imm, &mut dfr, term, Expr::Mult);
    }
    Ok(combine(imm, dfr, Expr::Mult))
}

/// Leading `+`/`-` runs are collected in source order, then applied
/// innermost-first by popping the stack — the last sign written ends up
/// as the outermost wrap, matching ordinary left-to-right unary reading
/// (`--x` is `-(-x)`).
fn parse_unary_expr(cur: &mut TokenCursor<'_>, sub_safe: bool) -> Result<Expr, ParserError> {
    let mut signs = Vec::new();
    loop {
        if cur.try_consume_symbol("+") {
            signs.push(UnarySign::Pos);
        } else if cur.try_consume_symbol("-") {
            signs.push(UnarySign::Neg);
        } else {
            break;
        }
    }
    let mut ret_expr = parse_exp_expr(cur, sub_safe)?;
    let foldable = can_fold(&ret_expr) && !signs.is_empty();
    if foldable {
        ret_expr = match ret_expr {
            Expr::Foldable(inner) => *inner,
            other => other,
        };
    }
    while let Some(sign) = signs.pop() {
        ret_expr = Expr::Unary(sign, Box::new(ret_expr));
    }
    Ok(if foldable {
        reduce_foldable(Expr::Foldable(Box::new(ret_expr)))
    } else {
        ret_expr
    })
}

/// Right-associative: the stack combines its top two entries first, so
/// the rightmost operand is folded into its neighbor before the result is
/// combined with everything to its left.
fn parse_exp_expr(cur: &mut TokenCursor<'_>, sub_safe: bool) -> Result<Expr, ParserError> {
    let mut stack = ExprStack::new(parse_value(cur, sub_safe)?);
    while cur.try_consume_symbol("^") {
        stack.push(parse_value(cur, sub_safe)?);
    }
    stack.fold(Expr::Exp);
    Ok(stack.pop())
}

fn is_const_keyword(cur: &TokenCursor<'_>) -> bool {
    cur.current()
        .map(|t| {
            t.is_identifier()
                && matches!(
                    t.text(cur.source()).to_ascii_lowercase().as_str(),
                    "true" | "false" | "nothing" | "null" | "empty"
                )
        })
        .unwrap_or(false)
}

fn parse_value(cur: &mut TokenCursor<'_>, sub_safe: bool) -> Result<Expr, ParserError> {
    if !sub_safe && cur.try_consume_symbol("(") {
        let inner = parse_imp_expr(cur, false)?;
        cur.assert_consume_symbol(")")?;
        return Ok(inner);
    }
    match cur.current().map(|t| t.kind) {
        Some(
            TokenKind::LiteralInt
            | TokenKind::LiteralHex
            | TokenKind::LiteralOct
            | TokenKind::LiteralFloat
            | TokenKind::LiteralString
            | TokenKind::LiteralDate,
        ) => parse_const_expr(cur),
        Some(TokenKind::Identifier | TokenKind::IdentifierIdDot) if is_const_keyword(cur) => parse_const_expr(cur),
        Some(TokenKind::Identifier | TokenKind::IdentifierIdDot) => parse_left_expr(cur).map(Expr::LeftExpr),
        _ => Err(cur.unexpected("a value expression")),
    }
}

fn malformed_number(cur: &TokenCursor<'_>) -> ParserError {
    ParserError::Grammar {
        pos: cur.current_pos(),
        message: "malformed numeric literal".to_string(),
    }
}

fn parse_const_expr(cur: &mut TokenCursor<'_>) -> Result<Expr, ParserError> {
    let source = cur.source();
    let tok = cur.advance().expect("parse_value confirmed a constant token");
    let text = tok.text(source);
    match tok.kind {
        TokenKind::LiteralInt => {
            let n: i64 = text.parse().map_err(|_| malformed_number(cur))?;
            Ok(Expr::Eval(Value::Int(n)))
        }
        TokenKind::LiteralHex => {
            let body = text.trim_start_matches(['&', 'H', 'h']);
            let body = body.strip_suffix('&').unwrap_or(body);
            let n = i64::from_str_radix(body, 16).map_err(|_| malformed_number(cur))?;
            Ok(Expr::Eval(Value::Int(n)))
        }
        TokenKind::LiteralOct => {
            let body = text.trim_start_matches('&');
            let body = body.strip_suffix('&').unwrap_or(body);
            let n = i64::from_str_radix(body, 8).map_err(|_| malformed_number(cur))?;
            Ok(Expr::Eval(Value::Int(n)))
        }
        TokenKind::LiteralFloat => {
            let f: f64 = text.parse().map_err(|_| malformed_number(cur))?;
            Ok(Expr::Eval(Value::Float(f)))
        }
        TokenKind::LiteralString => {
            let inner = &text[1..text.len() - 1];
            Ok(Expr::Eval(Value::Str(inner.replace("\"\"", "\""))))
        }
        TokenKind::LiteralDate => {
            let inner = text[1..text.len() - 1].to_string();
            Ok(Expr::Const(ConstLeaf::DateLiteral(inner)))
        }
        TokenKind::Identifier | TokenKind::IdentifierIdDot => match text.to_ascii_lowercase().as_str() {
            "true" => Ok(Expr::Eval(Value::Bool(true))),
            "false" => Ok(Expr::Eval(Value::Bool(false))),
            "nothing" | "null" | "empty" => Ok(Expr::Const(ConstLeaf::Nothing)),
            other => Err(ParserError::Grammar {
                pos: tok.pos,
                message: format!("'{other}' is not a constant"),
            }),
        },
        _ => Err(ParserError::Grammar {
            pos: tok.pos,
            message: "expected a constant".to_string(),
        }),
    }
}

const LEADING_IDENTIFIER_KINDS: &[TokenKind] = &[
    TokenKind::Identifier,
    TokenKind::IdentifierIdDot,
    TokenKind::IdentifierDotId,
    TokenKind::IdentifierDotIdDot,
];

fn parse_qualified_id_tail(cur: &mut TokenCursor<'_>) -> Result<IdSegment, ParserError> {
    if let Some((tok, _)) = cur.try_keyword_id() {
        return Ok(IdSegment {
            name: tok.text(cur.source()).to_string(),
            dot_start: tok.dot_start(),
            dot_end: tok.dot_end(),
        });
    }
    if cur.try_multiple_kind(LEADING_IDENTIFIER_KINDS) {
        let tok = cur.advance().expect("try_multiple_kind confirmed a token");
        return Ok(IdSegment {
            name: tok.text(cur.source()).to_string(),
            dot_start: tok.dot_start(),
            dot_end: tok.dot_end(),
        });
    }
    Err(cur.unexpected("an identifier"))
}

/// Collects one or more dot-fused segments into a single qualified name:
/// `Foo.Bar.Baz` arrives as three `IDENTIFIER_*DOT*` tokens at the lexer
/// level and is reassembled here into one `QualifiedId`.
fn parse_qualified_id(cur: &mut TokenCursor<'_>) -> Result<QualifiedId, ParserError> {
    let starts_fused = cur
        .current()
        .map(|t| matches!(t.kind, TokenKind::IdentifierIdDot | TokenKind::IdentifierDotIdDot))
        .unwrap_or(false);
    if starts_fused {
        let mut segments = Vec::new();
        loop {
            let seg = parse_qualified_id_tail(cur)?;
            let continues = seg.dot_end;
            segments.push(seg);
            if !continues {
                break;
            }
        }
        Ok(QualifiedId { segments })
    } else if cur.try_multiple_kind(&[TokenKind::Identifier, TokenKind::IdentifierDotId]) {
        Ok(QualifiedId {
            segments: vec![parse_qualified_id_tail(cur)?],
        })
    } else {
        Err(cur.unexpected("a qualified identifier"))
    }
}

fn parse_arg_list(cur: &mut TokenCursor<'_>) -> Result<Vec<Option<Expr>>, ParserError> {
    let mut args = Vec::new();
    let mut found_expr = false;
    loop {
        if cur.current_text() == Some(")") {
            break;
        }
        if cur.try_consume_symbol(",") {
            if found_expr {
                found_expr = false;
            } else {
                args.push(None);
            }
            continue;
        }
        args.push(Some(parse_imp_expr(cur, false)?));
        found_expr = true;
    }
    Ok(args)
}

/// Zero or more `(...)` groups, each optionally followed directly by a
/// dotted identifier continuation (spec §4.3's `IndexOrParams`/dot flag).
fn parse_index_or_params_list(cur: &mut TokenCursor<'_>) -> Result<Vec<IndexOrParams>, ParserError> {
    let mut groups = Vec::new();
    while cur.try_consume_symbol("(") {
        let args = parse_arg_list(cur)?;
        cur.assert_consume_symbol(")")?;
        let dot = cur
            .current()
            .map(|t| matches!(t.kind, TokenKind::IdentifierDotId | TokenKind::IdentifierDotIdDot))
            .unwrap_or(false);
        groups.push(IndexOrParams { args, dot });
        if !dot {
            break;
        }
    }
    Ok(groups)
}

fn parse_left_expr_tail(cur: &mut TokenCursor<'_>) -> Result<LeftExprTail, ParserError> {
    let qual_id = parse_qualified_id(cur)?;
    let index_or_params = parse_index_or_params_list(cur)?;
    Ok(LeftExprTail { qual_id, index_or_params })
}

pub(super) fn parse_left_expr(cur: &mut TokenCursor<'_>) -> Result<LeftExpr, ParserError> {
    let pos = cur.current_pos();
    let qual_id = parse_qualified_id(cur)?;
    let index_or_params = parse_index_or_params_list(cur)?;
    let mut tail = Vec::new();
    if index_or_params.last().map(|g| g.dot).unwrap_or(false) {
        loop {
            let t = parse_left_expr_tail(cur)?;
            let continues = t.index_or_params.last().map(|g| g.dot).unwrap_or(false);
            tail.push(t);
            if !continues {
                break;
            }
        }
    }
    Ok(LeftExpr { pos, qual_id, index_or_params, tail })
}
