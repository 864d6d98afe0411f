use pretty_assertions::assert_eq;
use rill_ir::ast::{ParseExpr, ParsePattern, TopLevel};
use rill_ir::StringInterner;

use super::*;

fn parse_ok(source: &str) -> (ParseOutput, StringInterner) {
    let interner = StringInterner::new();
    let out = parse_expr(source, &interner);
    assert!(!out.has_errors(), "unexpected errors: {:?}", out.errors);
    (out, interner)
}

fn sexpr_of(source: &str) -> String {
    let interner = StringInterner::new();
    let out = parse_expr(source, &interner);
    assert!(!out.has_errors(), "unexpected errors: {:?}", out.errors);
    render_item_sexpr(&out.ast, &interner, &TopLevel::Expr(out.root))
}

#[test]
fn precedence_mul_over_add() {
    assert_eq!(
        sexpr_of("1 + 2 * 3"),
        "(binop \"+\"\n  (int 1)\n  (binop \"*\"\n    (int 2)\n    (int 3)))\n"
    );
}

#[test]
fn comparison_binds_looser_than_arithmetic() {
    assert_eq!(
        sexpr_of("1 + 2 < 4"),
        "(binop \"<\"\n  (binop \"+\"\n    (int 1)\n    (int 2))\n  (int 4))\n"
    );
}

#[test]
fn lambda_body_extends_right() {
    let rendered = sexpr_of("|x| x + 1");
    assert_eq!(
        rendered,
        "(lambda\n  (params (p-ident \"x\"))\n  (binop \"+\"\n    (ident \"x\")\n    (int 1)))\n"
    );
}

#[test]
fn nested_lambdas() {
    let rendered = sexpr_of("|x| |y| x + y");
    assert!(rendered.starts_with("(lambda"), "got: {rendered}");
    assert_eq!(rendered.matches("(lambda").count(), 2);
}

#[test]
fn application_requires_adjacency() {
    // `f(x)` is a call...
    let (out, _) = parse_ok("f(1)");
    assert!(matches!(out.ast.expr(out.root), ParseExpr::Apply { .. }));
    // ...`0 (x)` is not: `if c (a) else b` must not apply `0`.
    let (out, _) = parse_ok("if outer > 0 (outer + inner) else inner");
    assert!(matches!(
        out.ast.expr(out.root),
        ParseExpr::IfThenElse { .. }
    ));
}

#[test]
fn chained_application() {
    let rendered = sexpr_of("((|x| |y| x + y)(42))(10)");
    // Outer apply wraps inner apply.
    assert!(rendered.starts_with("(apply\n  (apply"), "got: {rendered}");
}

#[test]
fn block_with_let_and_tail() {
    let rendered = sexpr_of("{ z = 1; z + 1 }");
    assert_eq!(
        rendered,
        "(block\n  (let (p-ident \"z\")\n    (int 1))\n  (binop \"+\"\n    (ident \"z\")\n    (int 1)))\n"
    );
}

#[test]
fn block_statements_split_on_newlines() {
    let rendered = sexpr_of("{\n  x = 20\n  x + 1\n}");
    assert!(rendered.contains("(let (p-ident \"x\")"), "got: {rendered}");
}

#[test]
fn record_vs_block_disambiguation() {
    let (out, _) = parse_ok("{ x: 1, y: 2 }");
    assert!(matches!(out.ast.expr(out.root), ParseExpr::Record { .. }));

    let (out, _) = parse_ok("{ x }");
    assert!(matches!(out.ast.expr(out.root), ParseExpr::Block { .. }));

    let (out, _) = parse_ok("{}");
    assert!(matches!(out.ast.expr(out.root), ParseExpr::Record { .. }));
}

#[test]
fn unit_parses_as_empty_record() {
    let (out, _) = parse_ok("()");
    match out.ast.expr(out.root) {
        ParseExpr::Record { fields } => assert!(fields.is_empty()),
        other => panic!("expected empty record, got {other:?}"),
    }
}

#[test]
fn tuple_and_grouping() {
    let (out, _) = parse_ok("(1, 2)");
    assert!(matches!(out.ast.expr(out.root), ParseExpr::Tuple(_)));

    let (out, _) = parse_ok("(1 + 2)");
    assert!(matches!(out.ast.expr(out.root), ParseExpr::Binop { .. }));
}

#[test]
fn match_with_alternatives_and_tags() {
    let rendered = sexpr_of("match x { Ok(v) -> v, 1 | 2 -> 0, _ -> 9 }");
    assert!(rendered.contains("(branch (p-tag \"Ok\" (p-ident \"v\"))"), "got: {rendered}");
    assert!(rendered.contains("(branch (p-int 1) (p-int 2)"), "got: {rendered}");
    assert!(rendered.contains("(branch (p-underscore)"), "got: {rendered}");
}

#[test]
fn list_pattern_with_rest() {
    let rendered = sexpr_of("match xs { [first, .. rest] -> first, _ -> 0 }");
    assert!(
        rendered.contains("(p-list (p-ident \"first\") (p-rest (p-ident \"rest\")))"),
        "got: {rendered}"
    );
}

#[test]
fn top_level_def_and_import() {
    let interner = StringInterner::new();
    let out = parse_file("import Json\nx = 5\nx + 1\n", &interner);
    assert!(!out.has_errors(), "unexpected errors: {:?}", out.errors);
    assert_eq!(out.ast.items.len(), 3);
    assert!(matches!(out.ast.items[0], TopLevel::Import { .. }));
    assert!(matches!(out.ast.items[1], TopLevel::Def { .. }));
    assert!(matches!(out.ast.items[2], TopLevel::Expr(_)));
}

#[test]
fn statement_entry_distinguishes_def_from_expr() {
    let interner = StringInterner::new();
    let def = parse_statement("x = 5", &interner);
    assert!(is_definition(&def.item));
    let expr = parse_statement("x + 5", &interner);
    assert!(!is_definition(&expr.item));
}

#[test]
fn malformed_input_recovers() {
    let interner = StringInterner::new();
    let out = parse_expr("1 + * 2", &interner);
    assert!(out.has_errors());
    // The tree is still complete: a binop with a malformed rhs.
    assert!(matches!(out.ast.expr(out.root), ParseExpr::Binop { .. }));
}

#[test]
fn shadowing_example_parses() {
    let interner = StringInterner::new();
    let source = "x = 5\ny = 10\nouterFunc = |_| {\n    x = 20\n    { z = x + y; z + 1 }\n}\n";
    let out = parse_file(source, &interner);
    assert!(!out.has_errors(), "unexpected errors: {:?}", out.errors);
    assert_eq!(out.ast.items.len(), 3);
}

#[test]
fn underscore_param_lambda() {
    let (out, _) = parse_ok("|_| 42");
    match out.ast.expr(out.root) {
        ParseExpr::Lambda { params, .. } => {
            assert_eq!(params.len(), 1);
            assert!(matches!(
                out.ast.pattern(out.ast.pat_list(params)[0]),
                ParsePattern::Underscore
            ));
        }
        other => panic!("expected lambda, got {other:?}"),
    }
}
