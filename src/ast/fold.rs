//! Constant-folding primitives shared by every precedence level in
//! `parser::expr`. Ported in behavior from `optimize.py`'s `FoldableExpr`
//! and the `AddNegated`/`MultReciprocal` wrap helpers.

use crate::ast::eval::evaluate_expr;
use crate::ast::expr::Expr;

/// Whether `expr` is entirely constant and therefore safe to evaluate
/// eagerly. `Nothing`/date-literal leaves are deliberately excluded: their
/// evaluation is execution-dependent and out of scope (spec §1), so they
/// are treated the same way `Is`/`Is Not` comparisons are — left
/// unfolded rather than given invented semantics.
pub fn can_fold(expr: &Expr) -> bool {
    matches!(expr, Expr::Eval(_) | Expr::Foldable(_))
}

fn unwrap_foldable(expr: Expr) -> Expr {
    match expr {
        Expr::Foldable(inner) => *inner,
        other => other,
    }
}

/// The constant-folding contract used after constructing every binary
/// node (spec §4.3):
/// - both sides constant → fold eagerly into `Expr::Eval`.
/// - exactly one side wrapped in `Foldable` → unwrap it before
///   reconstructing, so only the combined result carries the marker.
/// - otherwise → the plain node, unchanged.
pub fn try_fold(left: Expr, right: Expr, ctor: impl FnOnce(Box<Expr>, Box<Expr>) -> Expr) -> Expr {
    let left_const = can_fold(&left);
    let right_const = can_fold(&right);
    if left_const && right_const {
        let folded = Expr::Foldable(Box::new(ctor(
            Box::new(unwrap_foldable(left)),
            Box::new(unwrap_foldable(right)),
        )));
        return reduce_foldable(folded);
    }
    ctor(
        Box::new(unwrap_foldable(left)),
        Box::new(unwrap_foldable(right)),
    )
}

/// If `expr` is `Foldable`, evaluates it down to `Expr::Eval`; otherwise
/// passes it through. `Is`/`Is Not` comparisons (and any other evaluator
/// refusal) are caught here and leave the node as a plain, unfolded node —
/// the signal the parser relies on (spec §4.4, §4.8).
pub fn reduce_foldable(expr: Expr) -> Expr {
    match expr {
        Expr::Foldable(inner) => match evaluate_expr(&inner) {
            Ok(value) => Expr::Eval(value),
            Err(_) => *inner,
        },
        other => other,
    }
}

/// Wraps `expr` for subtraction-as-addition-of-negation, adding a
/// `Foldable` marker whenever the operand is itself constant — not only
/// when it already carried the marker — so a negated literal still reads
/// as constant to the next `accumulate` step (spec §4.3: "the folded
/// annotation is the outermost wrapper").
pub fn wrap_add_negated(expr: Expr) -> Expr {
    if can_fold(&expr) {
        Expr::Foldable(Box::new(Expr::AddNegated(Box::new(unwrap_foldable(expr)))))
    } else {
        Expr::AddNegated(Box::new(expr))
    }
}

/// Wraps `expr` for division-as-multiplication-by-reciprocal, with the
/// same outermost-`Foldable` rule as [`wrap_add_negated`].
pub fn wrap_mult_reciprocal(expr: Expr) -> Expr {
    if can_fold(&expr) {
        Expr::Foldable(Box::new(Expr::MultReciprocal(Box::new(unwrap_foldable(expr)))))
    } else {
        Expr::MultReciprocal(Box::new(expr))
    }
}
