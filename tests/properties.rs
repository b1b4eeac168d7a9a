//! Statement-shape scenario tests, token-span and `LeftExpr`-segment
//! invariants, and output-text round-trip/idempotence properties (see
//! SPEC_FULL.md §8).

use aspvb_parse::ast::{BlockStmt, Expr, ForHeader, GlobalStmt, TopLevelItem, Value};
use aspvb_parse::token::TokenKind;
use aspvb_parse::parse_program;

fn first_global(src: &str) -> GlobalStmt {
    let (program, _diag) = parse_program(src).expect("parses");
    match program.items.as_slice() {
        [TopLevelItem::Global(stmt)] => stmt.clone(),
        other => panic!("expected a single Global item, got {other:?}"),
    }
}

#[test]
fn scenario_option_explicit() {
    // 2. `Option Explicit` -> Program{[OptionExplicit]}.
    let stmt = first_global("<% Option Explicit %>");
    assert_eq!(stmt, GlobalStmt::OptionExplicit);
}

#[test]
fn scenario_dim_with_array_bounds() {
    // 3. `Dim a, b(3, 4)` -> VarDecl[VarName("a"), VarName("b", dims=[3,4])].
    let src = "<% Dim a, b(3, 4) %>";
    let stmt = first_global(src);
    let GlobalStmt::Block(BlockStmt::Var(decl)) = stmt else {
        panic!("expected a VarDecl, got {stmt:?}");
    };
    assert_eq!(decl.var_name.len(), 2);
    assert_eq!(decl.var_name[0].extended_id.id_token.text(src), "a");
    assert!(decl.var_name[0].array_rank_list.is_empty());
    assert_eq!(decl.var_name[1].array_rank_list.len(), 2);
    assert_eq!(decl.var_name[1].array_rank_list[0].text(src), "3");
    assert_eq!(decl.var_name[1].array_rank_list[1].text(src), "4");
}

#[test]
fn scenario_for_each_loop() {
    // 6. `For Each item In arr` -> ForStmt(target_id="item",
    // each_in_expr=LeftExpr("arr"), no block statements).
    let src = "<% For Each item In arr\nNext %>";
    let stmt = first_global(src);
    let GlobalStmt::Block(BlockStmt::For(for_stmt)) = stmt else {
        panic!("expected a ForStmt, got {stmt:?}");
    };
    assert_eq!(for_stmt.target_id.id_token.text(src), "item");
    let ForHeader::EachIn { each_in_expr } = for_stmt.header else {
        panic!("expected the EachIn form, got {:?}", for_stmt.header);
    };
    let Expr::LeftExpr(left) = each_in_expr else {
        panic!("expected a LeftExpr, got {each_in_expr:?}");
    };
    assert_eq!(left.symbol_name(), "arr");
    assert!(for_stmt.block_stmt_list.is_empty());
}

#[test]
fn invariant_left_expr_segments_have_contiguous_exclusive_shape() {
    // Every LeftExpr segment has exactly one of a call/index group or a
    // plain subname at each position: there is no position with both a
    // group and a following dotted tail claiming the same slot, and every
    // `tail` entry is itself contiguous from where the previous group left
    // off (spec §8's "segment indices are contiguous [0, end_idx)").
    let src = "<%= a.b(1).c %>";
    let (program, _diag) = parse_program(src).expect("parses");
    let TopLevelItem::Output(out) = &program.items[0] else {
        panic!("expected an OutputText item");
    };
    let Expr::LeftExpr(left) = &out.directives[0].output_expr else {
        panic!("expected a LeftExpr");
    };
    assert_eq!(left.qual_id.segments.len(), 2, "root qual_id is 'a.b'");
    assert_eq!(left.index_or_params.len(), 1, "exactly one call group follows 'b'");
    assert_eq!(left.tail.len(), 1, "exactly one dotted continuation, '.c'");
    assert!(left.tail[0].index_or_params.is_empty(), "'c' is a bare subname, not a call");
}

#[test]
fn invariant_token_spans_are_nonoverlapping_and_increasing() {
    let src = "<% Dim a\nDim b %>";
    let tokens = aspvb_parse::lexer::tokenize(src).expect("tokenizes");
    let mut last_end = 0usize;
    for tok in &tokens {
        assert!(tok.span.start >= last_end, "token spans must not overlap: {tok:?}");
        assert!(tok.span.end >= tok.span.start);
        last_end = tok.span.end;
    }
}

#[test]
fn roundtrip_reparsing_a_tokens_span_yields_the_same_kind() {
    // Mode-delimiter tokens (`<%`, `%>`, ...) only make sense paired with
    // their counterpart, so this is scoped to the script-content tokens
    // inside a region — identifiers, literals and symbols, each of which
    // is self-contained and must re-tokenize to the same kind regardless
    // of where it's embedded.
    let src = "<% Dim widget_count = 3 %>";
    let tokens = aspvb_parse::lexer::tokenize(src).expect("tokenizes");
    for tok in &tokens {
        if !matches!(
            tok.kind,
            TokenKind::Identifier
                | TokenKind::IdentifierIdDot
                | TokenKind::IdentifierDotId
                | TokenKind::IdentifierDotIdDot
                | TokenKind::Symbol
                | TokenKind::LiteralString
                | TokenKind::LiteralInt
                | TokenKind::LiteralHex
                | TokenKind::LiteralOct
                | TokenKind::LiteralFloat
        ) {
            continue;
        }
        let slice = tok.text(src);
        // Leading/trailing spaces keep the rewrap from accidentally forming
        // `<%=`/`<%@` out of a symbol token that starts with `=`/`@`.
        let rewrapped = format!("<% {slice} %>");
        let resliced = aspvb_parse::lexer::tokenize(&rewrapped).expect("re-tokenizes");
        assert_eq!(resliced[1].kind, tok.kind, "slice {slice:?} of kind {:?}", tok.kind);
    }
}

#[test]
fn roundtrip_merge_then_stitch_equals_stitch_then_concat() {
    // `OutputText.merge(a, b).stitch()` = `a.stitch() ++ b.stitch()`.
    let (program_a, _diag) = parse_program("hello<%= 1 %>").expect("parses");
    let TopLevelItem::Output(a) = &program_a.items[0] else {
        panic!("expected an OutputText item, got {:?}", program_a.items);
    };

    let (program_b, _diag) = parse_program(" world<%= 2 %>").expect("parses");
    let TopLevelItem::Output(b) = &program_b.items[0] else {
        panic!("expected an OutputText item, got {:?}", program_b.items);
    };

    let merged = a.merge(b);

    let expected: Vec<_> = a.stitch().chain(b.stitch()).collect();
    let actual: Vec<_> = merged.stitch().collect();
    assert_eq!(actual, expected);
}

#[test]
fn roundtrip_constant_expression_reparses_to_the_same_eval() {
    let src = "<%= (1 + 2) * 3 %>";
    let (program, _diag) = parse_program(src).expect("parses");
    let TopLevelItem::Output(out) = &program.items[0] else {
        panic!("expected an OutputText item");
    };
    let folded = out.directives[0].output_expr.clone();
    assert_eq!(folded, Expr::Eval(Value::Int(9)));

    // Pretty-print the folded literal back into source and re-parse it:
    // the result must still be the same constant.
    let pretty = match &folded {
        Expr::Eval(Value::Int(i)) => format!("<%= {i} %>"),
        other => panic!("expected an integer literal, got {other:?}"),
    };
    let (reparsed, _diag) = parse_program(&pretty).expect("parses");
    let TopLevelItem::Output(out2) = &reparsed.items[0] else {
        panic!("expected an OutputText item");
    };
    assert_eq!(out2.directives[0].output_expr, folded);
}

