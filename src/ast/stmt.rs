//! Statement and declaration AST node shapes, ported from
//! `ast_types/declarations.py` and `ast_types/statements.py`.
//!
//! The reference encodes category membership with multiple inheritance
//! (`BlockStmt(GlobalStmt, MethodStmt)`, `VarDecl(MemberDecl, BlockStmt)`,
//! ...). Per the Design Notes, this is modeled here as a tagged union per
//! category (`GlobalStmt`, `MethodStmt`, `BlockStmt`, `MemberDecl`) plus
//! small wrapper variants where one concrete statement needs to appear in
//! more than one category — e.g. `ConstDecl` is reachable from
//! `GlobalStmt`, `MethodStmt` and `MemberDecl` alike, so each of those
//! enums carries its own `Const` arm over the same `ConstDecl` payload.

use crate::ast::expr::Expr;
use crate::ast::special::{IncludeFile, OutputText};
use crate::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessModifier {
    Private,
    Public,
    PublicDefault,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedId {
    pub id_token: Token,
}

// ---- declarations --------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub extended_id: ExtendedId,
    pub member_decl_list: Vec<MemberDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldId {
    pub id_token: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldName {
    pub field_id: FieldId,
    pub array_rank_list: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarName {
    pub extended_id: ExtendedId,
    pub array_rank_list: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub field_name: FieldName,
    pub other_vars: Vec<VarName>,
    pub access_mod: Option<AccessModifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub var_name: Vec<VarName>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstListItem {
    pub extended_id: ExtendedId,
    pub const_expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    pub const_list: Vec<ConstListItem>,
    pub access_mod: Option<AccessModifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgModifier {
    ByVal,
    ByRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub extended_id: ExtendedId,
    pub arg_modifier: Option<ArgModifier>,
    pub has_paren: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubDecl {
    pub extended_id: ExtendedId,
    pub method_arg_list: Vec<Arg>,
    pub method_stmt_list: Vec<MethodStmt>,
    pub access_mod: Option<AccessModifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub extended_id: ExtendedId,
    pub method_arg_list: Vec<Arg>,
    pub method_stmt_list: Vec<MethodStmt>,
    pub access_mod: Option<AccessModifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyAccessType {
    Get,
    Let,
    Set,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub prop_access_type: PropertyAccessType,
    pub extended_id: ExtendedId,
    pub method_arg_list: Vec<Arg>,
    pub method_stmt_list: Vec<MethodStmt>,
    pub access_mod: Option<AccessModifier>,
}

/// Anything that may appear inside a `Class ... End Class` body.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberDecl {
    Field(FieldDecl),
    Var(VarDecl),
    Const(ConstDecl),
    Sub(SubDecl),
    Function(FunctionDecl),
    Property(PropertyDecl),
}

// ---- statements ------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RedimDecl {
    pub extended_id: ExtendedId,
    pub expr_list: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedimStmt {
    pub redim_decl_list: Vec<RedimDecl>,
    pub preserve: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElseStmt {
    pub stmt_list: Vec<BlockStmt>,
    pub elif_expr: Option<Expr>,
    pub is_else: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub if_expr: Expr,
    pub block_stmt_list: Vec<BlockStmt>,
    pub else_stmt_list: Vec<ElseStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithStmt {
    pub with_expr: Expr,
    pub block_stmt_list: Vec<BlockStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseStmt {
    pub block_stmt_list: Vec<BlockStmt>,
    pub case_expr_list: Vec<Expr>,
    pub is_else: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub select_case_expr: Expr,
    pub case_stmt_list: Vec<CaseStmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopConditionKind {
    While,
    Until,
}

/// The `Do [While|Until] ... Loop [While|Until]` and `While ... WEnd`
/// forms (exactly one of a leading/trailing condition, or neither).
#[derive(Debug, Clone, PartialEq)]
pub struct LoopStmt {
    pub block_stmt_list: Vec<BlockStmt>,
    pub loop_type: Option<LoopConditionKind>,
    pub loop_expr: Option<Expr>,
    /// Whether the condition (if any) was written before the loop body
    /// (`Do While`/`While ... WEnd`) or after it (`Loop While`/`Loop
    /// Until`). Meaningless when `loop_type` is `None`.
    pub condition_at_head: bool,
}

/// Exactly one of `(eq_expr, to_expr, [step_expr])` or `each_in_expr` is
/// populated (spec §4.5's XOR invariant, enforced by the parser rather
/// than a post-construction assertion).
#[derive(Debug, Clone, PartialEq)]
pub enum ForHeader {
    ToLoop {
        eq_expr: Expr,
        to_expr: Expr,
        step_expr: Option<Expr>,
    },
    EachIn {
        each_in_expr: Expr,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub target_id: ExtendedId,
    pub header: ForHeader,
    pub block_stmt_list: Vec<BlockStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub target_expr: Expr,
    pub assign_expr: Expr,
    pub is_new: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallStmt {
    pub left_expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubCallStmt {
    pub left_expr: Expr,
    pub sub_safe_expr: Option<Expr>,
    pub comma_expr_list: Vec<Option<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorGoto {
    ResumeNext,
    GotoZero,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorStmt {
    pub spec: ErrorGoto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Do,
    For,
    Function,
    Property,
    Sub,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitStmt {
    pub exit_kind: ExitKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EraseStmt {
    pub extended_id: ExtendedId,
}

/// A statement with no further nested block: the leaves of `BlockStmt`.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineStmt {
    Assign(AssignStmt),
    Call(CallStmt),
    SubCall(SubCallStmt),
    Error(ErrorStmt),
    Exit(ExitStmt),
    Erase(EraseStmt),
}

/// Anything that may appear in a block's statement list (spec §3). A run
/// of interleaved template text/output directives between `%>` and the
/// next `<%` (the reference's `NonscriptBlock`) is flattened directly into
/// the enclosing list as `Output`/`Include` entries by the parser rather
/// than kept as its own wrapper node — every reference call site just
/// `.extend()`s it into the parent list anyway.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockStmt {
    Var(VarDecl),
    Redim(RedimStmt),
    If(IfStmt),
    With(WithStmt),
    Select(SelectStmt),
    Loop(LoopStmt),
    For(ForStmt),
    Inline(InlineStmt),
    Include(IncludeFile),
    Output(OutputText),
}

/// Statements allowed directly inside a `Sub`/`Function`/`Property` body:
/// nested `Const` declarations plus everything a `BlockStmt` allows.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodStmt {
    Const(ConstDecl),
    Block(BlockStmt),
}

/// Top-level VBScript productions (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub enum GlobalStmt {
    OptionExplicit,
    Class(ClassDecl),
    Field(FieldDecl),
    Const(ConstDecl),
    Sub(SubDecl),
    Function(FunctionDecl),
    Block(BlockStmt),
}
