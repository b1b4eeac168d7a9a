//! Expression AST node shapes, ported from the reference grammar
//! (`ast_types/expressions.py`) but flattened into one enum rather than a
//! class-per-node hierarchy, since that's the idiomatic closed-sum-type
//! encoding Rust gives us (see `DESIGN.md`).

use super::builtins::BuiltinLeftExpr;
use crate::error::SourcePos;

/// Comparison operator carried by `Expr::Compare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareExprType {
    Is,
    IsNot,
    GtEq,
    LtEq,
    Gt,
    Lt,
    LtGt,
    Eq,
}

/// Sign carried by `Expr::Unary`, preserved as a tag rather than the
/// original `+`/`-` token (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnarySign {
    Pos,
    Neg,
}

/// Non-numeric, non-evaluated constant leaves: `Nothing`/`Null`/`Empty`
/// collapse to one tag (their distinctions have no bearing on folding or
/// downstream shape checks), and date literals are kept as raw source text
/// since date parsing/locale handling is execution-engine behavior this
/// front-end does not implement.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstLeaf {
    Nothing,
    DateLiteral(String),
}

/// A single identifier segment of a qualified identifier chain, either a
/// plain word or a keyword used in identifier position (spec §4.3's
/// `parse_qualified_id_tail`, which accepts `try_keyword_id()` results).
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedId {
    pub segments: Vec<IdSegment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdSegment {
    pub name: String,
    pub dot_start: bool,
    pub dot_end: bool,
}

impl QualifiedId {
    /// The case-folded name of the first segment, used both as the
    /// `LeftExpr`'s `symbol_name` and as the key the built-in classifier
    /// dispatches on.
    pub fn first_name(&self) -> &str {
        &self.segments[0].name
    }

    pub fn to_dotted_string(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// One parenthesized call/index segment: `(a, , c)` with `None` entries
/// preserving omitted positional arguments (spec §3, §4.3).
#[derive(Debug, Clone, PartialEq)]
pub struct IndexOrParams {
    pub args: Vec<Option<Expr>>,
    /// Whether a dotted identifier immediately follows the closing `)`,
    /// forcing a `LeftExprTail` continuation.
    pub dot: bool,
}

/// A continuation of a left expression after a dotted call/index segment.
#[derive(Debug, Clone, PartialEq)]
pub struct LeftExprTail {
    pub qual_id: QualifiedId,
    pub index_or_params: Vec<IndexOrParams>,
}

/// The primary addressable expression form: a qualified identifier
/// followed by zero or more call/index segments and dotted continuations.
#[derive(Debug, Clone, PartialEq)]
pub struct LeftExpr {
    /// Where `qual_id`'s first segment starts, kept so the post-parse
    /// built-in classifier (`ast::classify`) can report a useful position
    /// without every AST node needing to carry one.
    pub pos: SourcePos,
    pub qual_id: QualifiedId,
    pub index_or_params: Vec<IndexOrParams>,
    pub tail: Vec<LeftExprTail>,
}

impl LeftExpr {
    pub fn symbol_name(&self) -> &str {
        self.qual_id.first_name()
    }

    /// Whether this is a bare name with no call/index segments at all —
    /// used by several built-in shape checks (`end_idx == 1`, spec §4.7).
    pub fn is_bare_name(&self) -> bool {
        self.index_or_params.is_empty() && self.tail.is_empty()
    }
}

/// The expression AST. Binary/unary operator nodes, the two algebraic
/// rewrite annotations (`AddNegated`, `MultReciprocal`), the `Foldable`
/// marker, and the three leaf forms all live in one enum (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Imp(Box<Expr>, Box<Expr>),
    Eqv(Box<Expr>, Box<Expr>),
    Xor(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Compare(CompareExprType, Box<Expr>, Box<Expr>),
    Concat(Box<Expr>, Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Mod(Box<Expr>, Box<Expr>),
    IntDiv(Box<Expr>, Box<Expr>),
    Mult(Box<Expr>, Box<Expr>),
    Unary(UnarySign, Box<Expr>),
    Exp(Box<Expr>, Box<Expr>),

    /// `x` rewritten as `-x` inside an `Add` chain (spec §4.3).
    AddNegated(Box<Expr>),
    /// `x` rewritten as `1/x` inside a `Mult` chain (spec §4.3).
    MultReciprocal(Box<Expr>),
    /// Marks a subtree known to be entirely constant; unwrapped as soon as
    /// it is combined with another node (see `ast::fold`).
    Foldable(Box<Expr>),

    Const(ConstLeaf),
    Eval(super::eval::Value),
    LeftExpr(LeftExpr),
    /// A `LeftExpr` the post-parse classifier (`ast::classify`) promoted
    /// into a closed built-in intrinsic variant (spec §4.7).
    Builtin(Box<BuiltinLeftExpr>),
}
