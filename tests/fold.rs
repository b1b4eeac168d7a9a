//! Constant-folding, algebraic-normalization, and built-in-classifier
//! scenario tests (see SPEC_FULL.md §8).

use aspvb_parse::ast::builtins::BuiltinLeftExpr;
use aspvb_parse::ast::{BlockStmt, Expr, GlobalStmt, InlineStmt, TopLevelItem, Value};
use aspvb_parse::parser::expr::parse_expr;
use aspvb_parse::{parse_program, TokenCursor};

fn first_output_expr(src: &str) -> Expr {
    let (program, _diag) = parse_program(src).expect("parses");
    match program.items.as_slice() {
        [TopLevelItem::Output(out)] => out.directives[0].output_expr.clone(),
        other => panic!("expected a single OutputText item, got {other:?}"),
    }
}

fn first_global(src: &str) -> GlobalStmt {
    let (program, _diag) = parse_program(src).expect("parses");
    match program.items.as_slice() {
        [TopLevelItem::Global(stmt)] => stmt.clone(),
        other => panic!("expected a single Global item, got {other:?}"),
    }
}

fn expr_from_source(src: &str) -> Expr {
    let tokens = aspvb_parse::lexer::tokenize(src).expect("tokenizes");
    let mut cur = TokenCursor::new(&tokens, src);
    parse_expr(&mut cur).expect("parses as an expression")
}

#[test]
fn scenario_output_directive_folds_sum() {
    // 1. `<%= 1 + 2 %>` -> EvalExpr(3)
    let expr = first_output_expr("<%= 1 + 2 %>");
    assert_eq!(expr, Expr::Eval(Value::Int(3)));
}

#[test]
fn scenario_response_write_folds_concatenation() {
    // 4. `Response.Write "Hello, " & "world!"` -> folded EvalExpr, promoted
    // to a built-in `ResponseExpr::Write`, even though the arguments were
    // never written inside parens.
    let stmt = first_global("<% Response.Write \"Hello, \" & \"world!\" %>");
    let GlobalStmt::Block(BlockStmt::Inline(InlineStmt::SubCall(sub))) = stmt else {
        panic!("expected a SubCallStmt, got {stmt:?}");
    };
    let Expr::Builtin(builtin) = sub.left_expr else {
        panic!("expected Response.Write to be classified, got {:?}", sub.left_expr);
    };
    let BuiltinLeftExpr::Response(response) = *builtin else {
        panic!("expected a Response intrinsic");
    };
    match response {
        aspvb_parse::ast::builtins::ResponseExpr::Write(arg) => {
            assert_eq!(arg, Expr::Eval(Value::Str("Hello, world!".to_string())));
        }
        other => panic!("expected ResponseExpr::Write, got {other:?}"),
    }
    assert!(sub.sub_safe_expr.is_none(), "argument should be absorbed into the callee");
    assert!(sub.comma_expr_list.is_empty());
}

#[test]
fn scenario_if_condition_folds_to_true() {
    // 5. `If 1 = 1 Then ... End If` -> if_expr folds to EvalExpr(true).
    let stmt = first_global("<% If 1 = 1 Then\nDim x\nEnd If %>");
    let GlobalStmt::Block(BlockStmt::If(if_stmt)) = stmt else {
        panic!("expected an IfStmt, got {stmt:?}");
    };
    assert_eq!(if_stmt.if_expr, Expr::Eval(Value::Bool(true)));
    assert_eq!(if_stmt.block_stmt_list.len(), 1);
    assert!(if_stmt.else_stmt_list.is_empty());
}

#[test]
fn scenario_server_create_object_is_classified() {
    // 7. `Server.CreateObject("ADODB.Connection")` -> ServerExpr::CreateObject
    // whose progid is the folded string literal, unchanged.
    let expr = first_output_expr("<%= Server.CreateObject(\"ADODB.Connection\") %>");
    let Expr::Builtin(builtin) = expr else {
        panic!("expected Server.CreateObject to be classified, got {expr:?}");
    };
    let BuiltinLeftExpr::Server(aspvb_parse::ast::builtins::ServerExpr::CreateObject(progid)) = *builtin else {
        panic!("expected ServerExpr::CreateObject");
    };
    assert_eq!(progid, Expr::Eval(Value::Str("ADODB.Connection".to_string())));
}

#[test]
fn scenario_subtraction_normalizes_to_negated_constant_left() {
    // 8. `1 - 2 + a` -> AddExpr(EvalExpr(-1), LeftExpr("a")).
    let expr = expr_from_source("1 - 2 + a");
    let Expr::Add(left, right) = expr else {
        panic!("expected an AddExpr, got {expr:?}");
    };
    assert_eq!(*left, Expr::Eval(Value::Int(-1)));
    let Expr::LeftExpr(left_expr) = *right else {
        panic!("expected the right child to be a LeftExpr, got {right:?}");
    };
    assert_eq!(left_expr.symbol_name(), "a");
}

#[test]
fn invariant_eval_subtree_has_no_operators_or_left_exprs() {
    // Every EvalExpr *is* the value: re-folding "1 + 2 * 3" must not leave
    // any nested operator or LeftExpr reachable underneath it.
    let expr = expr_from_source("1 + 2 * 3");
    assert_eq!(expr, Expr::Eval(Value::Int(7)));
}

#[test]
fn invariant_add_and_mult_left_child_constant_iff_any_operand_constant() {
    // `a + 1 + 2` accumulates the two literals into one folded constant
    // regardless of where they appear in the chain, and the combine step
    // always places that constant on the left, the deferred (non-constant)
    // chain on the right.
    let expr = expr_from_source("a + 1 + 2");
    let Expr::Add(left, right) = expr else {
        panic!("expected an AddExpr, got {expr:?}");
    };
    assert_eq!(*left, Expr::Eval(Value::Int(3)));
    let Expr::LeftExpr(left_expr) = *right else {
        panic!("expected the right child to be a LeftExpr, got {right:?}");
    };
    assert_eq!(left_expr.symbol_name(), "a");
}

#[test]
fn invariant_not_not_collapses_to_the_same_node() {
    let plain = expr_from_source("x");
    let double_negated = expr_from_source("Not Not x");
    assert_eq!(plain, double_negated);
}

#[test]
fn invariant_builtin_classifier_rejects_unknown_subname() {
    let result = parse_program("<% Response.Bogus() %>");
    assert!(result.is_err(), "an unrecognized Response member must be a hard parse error");
}

#[test]
fn invariant_response_status_forbidden_in_sub_call_position() {
    let result = parse_program("<% Response.Status %>");
    assert!(result.is_err(), "Response.Status must not appear in sub-call position");
}
