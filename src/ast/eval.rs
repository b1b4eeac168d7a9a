//! The expression evaluator: reduces fully-constant `Expr` subtrees to a
//! single [`Value`]. Ported in behavior from
//! `ast_types/expression_evaluator.py`'s dispatch table, but expressed as
//! one `match` over the node variant per the Design Notes rather than a
//! registry of per-type callables — Rust's exhaustiveness checking gives
//! us what the Python registry existed to simulate.

use crate::ast::expr::{CompareExprType, ConstLeaf, Expr, UnarySign};
use crate::error::EvaluatorError;

/// The evaluated-literal type. Corresponds to the reference's `EvalExpr`
/// payload; VBScript has no other primitive scalar forms that this
/// front-end needs to fold (dates and object references are left
/// unevaluated, see `ConstLeaf`).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

/// A value coerced for arithmetic: VBScript treats `True`/`False` as
/// `-1`/`0` once they participate in arithmetic, but keeps them distinct
/// for bitwise/boolean logical operators.
#[derive(Debug, Clone, Copy)]
enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(i) => i as f64,
            Numeric::Float(f) => f,
        }
    }
}

fn to_numeric(v: &Value) -> Result<Numeric, EvaluatorError> {
    match v {
        Value::Int(i) => Ok(Numeric::Int(*i)),
        Value::Float(f) => Ok(Numeric::Float(*f)),
        Value::Bool(b) => Ok(Numeric::Int(if *b { -1 } else { 0 })),
        Value::Str(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                Ok(Numeric::Int(i))
            } else if let Ok(f) = trimmed.parse::<f64>() {
                Ok(Numeric::Float(f))
            } else {
                Err(EvaluatorError::TypeMismatch)
            }
        }
    }
}

/// Promotes two values to a common numeric representation: integer if
/// both sides are integral, float otherwise.
fn promote(a: &Value, b: &Value) -> Result<(Numeric, Numeric), EvaluatorError> {
    Ok((to_numeric(a)?, to_numeric(b)?))
}

fn numeric_to_value(n: Numeric) -> Value {
    match n {
        Numeric::Int(i) => Value::Int(i),
        Numeric::Float(f) => Value::Float(f),
    }
}

impl Value {
    /// Locale-free decimal rendering used by `&` concatenation.
    pub fn str_cast(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.is_finite() {
                    format!("{f:.0}")
                } else {
                    f.to_string()
                }
            }
            Value::Bool(b) => if *b { "True" } else { "False" }.to_string(),
            Value::Str(s) => s.clone(),
        }
    }

    /// `1 / self`, used to fold `MultReciprocal`. VBScript's `/` always
    /// yields a `Double`, so this always returns `Value::Float`.
    pub fn reciprocal(&self) -> Result<Value, EvaluatorError> {
        let n = to_numeric(self)?.as_f64();
        if n == 0.0 {
            return Err(EvaluatorError::DivisionByZero);
        }
        Ok(Value::Float(1.0 / n))
    }

    pub fn neg(&self) -> Result<Value, EvaluatorError> {
        match to_numeric(self)? {
            Numeric::Int(i) => Ok(Value::Int(-i)),
            Numeric::Float(f) => Ok(Value::Float(-f)),
        }
    }

    pub fn pos(&self) -> Result<Value, EvaluatorError> {
        Ok(numeric_to_value(to_numeric(self)?))
    }

    pub fn add(&self, other: &Value) -> Result<Value, EvaluatorError> {
        match promote(self, other)? {
            (Numeric::Int(a), Numeric::Int(b)) => Ok(Value::Int(a + b)),
            (a, b) => Ok(Value::Float(a.as_f64() + b.as_f64())),
        }
    }

    pub fn mul(&self, other: &Value) -> Result<Value, EvaluatorError> {
        match promote(self, other)? {
            (Numeric::Int(a), Numeric::Int(b)) => Ok(Value::Int(a * b)),
            (a, b) => Ok(Value::Float(a.as_f64() * b.as_f64())),
        }
    }

    pub fn pow(&self, other: &Value) -> Result<Value, EvaluatorError> {
        let base = to_numeric(self)?.as_f64();
        let exp = to_numeric(other)?.as_f64();
        Ok(Value::Float(base.powf(exp)))
    }

    /// `\`: integer division truncating toward zero (spec §4.4).
    pub fn int_div(&self, other: &Value) -> Result<Value, EvaluatorError> {
        let a = to_numeric(self)?.as_f64();
        let b = to_numeric(other)?.as_f64();
        if b == 0.0 {
            return Err(EvaluatorError::DivisionByZero);
        }
        Ok(Value::Int((a / b).trunc() as i64))
    }

    /// `Mod`: result takes the sign of the dividend (spec §4.4), unlike
    /// Rust's `%` on floats or Python's `%` on ints (both take the
    /// divisor's sign) — this is implemented directly rather than reused
    /// from either.
    pub fn modulo(&self, other: &Value) -> Result<Value, EvaluatorError> {
        match promote(self, other)? {
            (Numeric::Int(a), Numeric::Int(b)) => {
                if b == 0 {
                    return Err(EvaluatorError::DivisionByZero);
                }
                Ok(Value::Int(a - b * (a / b)))
            }
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                if b == 0.0 {
                    return Err(EvaluatorError::DivisionByZero);
                }
                Ok(Value::Float(a - b * (a / b).trunc()))
            }
        }
    }

    pub fn concat(&self, other: &Value) -> Value {
        Value::Str(format!("{}{}", self.str_cast(), other.str_cast()))
    }

    fn as_bool_or_int(&self) -> Result<Result<bool, i64>, EvaluatorError> {
        match self {
            Value::Bool(b) => Ok(Ok(*b)),
            _ => match to_numeric(self)? {
                Numeric::Int(i) => Ok(Err(i)),
                Numeric::Float(f) => Ok(Err(f as i64)),
            },
        }
    }

    /// Logical operators are boolean when both sides are `Bool`, bitwise
    /// on the integer coercion otherwise (spec §4.4).
    fn logical(
        &self,
        other: &Value,
        bool_op: impl Fn(bool, bool) -> bool,
        int_op: impl Fn(i64, i64) -> i64,
    ) -> Result<Value, EvaluatorError> {
        fn to_int(v: Result<bool, i64>) -> i64 {
            match v {
                Ok(b) => if b { -1 } else { 0 },
                Err(i) => i,
            }
        }
        match (self.as_bool_or_int()?, other.as_bool_or_int()?) {
            (Ok(a), Ok(b)) => Ok(Value::Bool(bool_op(a, b))),
            (a, b) => Ok(Value::Int(int_op(to_int(a), to_int(b)))),
        }
    }

    pub fn and(&self, other: &Value) -> Result<Value, EvaluatorError> {
        self.logical(other, |a, b| a && b, |a, b| a & b)
    }

    pub fn or(&self, other: &Value) -> Result<Value, EvaluatorError> {
        self.logical(other, |a, b| a || b, |a, b| a | b)
    }

    pub fn xor(&self, other: &Value) -> Result<Value, EvaluatorError> {
        self.logical(other, |a, b| a != b, |a, b| a ^ b)
    }

    pub fn not(&self) -> Result<Value, EvaluatorError> {
        match self {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            _ => match to_numeric(self)? {
                Numeric::Int(i) => Ok(Value::Int(!i)),
                Numeric::Float(f) => Ok(Value::Int(!(f as i64))),
            },
        }
    }

    fn partial_cmp(&self, other: &Value) -> Result<std::cmp::Ordering, EvaluatorError> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            _ => {
                let (a, b) = promote(self, other)?;
                a.as_f64()
                    .partial_cmp(&b.as_f64())
                    .ok_or(EvaluatorError::TypeMismatch)
            }
        }
    }

    pub fn compare(&self, other: &Value, cmp: CompareExprType) -> Result<Value, EvaluatorError> {
        use std::cmp::Ordering::*;
        match cmp {
            CompareExprType::Is | CompareExprType::IsNot => {
                Err(EvaluatorError::ObjectComparisonNotFoldable)
            }
            CompareExprType::Eq => Ok(Value::Bool(self == other)),
            CompareExprType::LtGt => Ok(Value::Bool(self != other)),
            CompareExprType::Gt => Ok(Value::Bool(self.partial_cmp(other)? == Greater)),
            CompareExprType::GtEq => Ok(Value::Bool(self.partial_cmp(other)? != Less)),
            CompareExprType::Lt => Ok(Value::Bool(self.partial_cmp(other)? == Less)),
            CompareExprType::LtEq => Ok(Value::Bool(self.partial_cmp(other)? != Greater)),
        }
    }
}

/// Reduces `expr` to a single [`Value`]. Only ever called on subtrees
/// [`crate::ast::fold::can_fold`] has already accepted, but still returns
/// `Result` because `Is`/`Is Not` comparisons are only detected here
/// (spec §4.4).
pub fn evaluate_expr(expr: &Expr) -> Result<Value, EvaluatorError> {
    match expr {
        Expr::Eval(v) => Ok(v.clone()),
        Expr::Foldable(inner) => evaluate_expr(inner),
        Expr::Const(ConstLeaf::Nothing) | Expr::Const(ConstLeaf::DateLiteral(_)) => {
            Err(EvaluatorError::TypeMismatch)
        }
        Expr::LeftExpr(_) | Expr::Builtin(_) => Err(EvaluatorError::TypeMismatch),
        Expr::Imp(l, r) => evaluate_expr(l)?.not()?.or(&evaluate_expr(r)?),
        Expr::Eqv(l, r) => evaluate_expr(l)?.xor(&evaluate_expr(r)?)?.not(),
        Expr::Xor(l, r) => evaluate_expr(l)?.xor(&evaluate_expr(r)?),
        Expr::Or(l, r) => evaluate_expr(l)?.or(&evaluate_expr(r)?),
        Expr::And(l, r) => evaluate_expr(l)?.and(&evaluate_expr(r)?),
        Expr::Not(inner) => evaluate_expr(inner)?.not(),
        Expr::Compare(cmp, l, r) => evaluate_expr(l)?.compare(&evaluate_expr(r)?, *cmp),
        Expr::Concat(l, r) => Ok(evaluate_expr(l)?.concat(&evaluate_expr(r)?)),
        Expr::Add(l, r) => evaluate_expr(l)?.add(&evaluate_expr(r)?),
        Expr::Mod(l, r) => evaluate_expr(l)?.modulo(&evaluate_expr(r)?),
        Expr::IntDiv(l, r) => evaluate_expr(l)?.int_div(&evaluate_expr(r)?),
        Expr::Mult(l, r) => evaluate_expr(l)?.mul(&evaluate_expr(r)?),
        Expr::Unary(UnarySign::Pos, inner) => evaluate_expr(inner)?.pos(),
        Expr::Unary(UnarySign::Neg, inner) => evaluate_expr(inner)?.neg(),
        Expr::Exp(l, r) => evaluate_expr(l)?.pow(&evaluate_expr(r)?),
        Expr::AddNegated(inner) => evaluate_expr(inner)?.neg(),
        Expr::MultReciprocal(inner) => evaluate_expr(inner)?.reciprocal(),
    }
}
