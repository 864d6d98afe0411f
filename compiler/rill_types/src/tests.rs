use pretty_assertions::assert_eq;
use rill_ir::StringInterner;

use super::*;

fn solve_source(source: &str) -> (TypeCheckResult, rill_ir::can::CanId, StringInterner) {
    let interner = StringInterner::new();
    let parsed = rill_parse::parse_expr(source, &interner);
    assert!(!parsed.has_errors(), "parse errors: {:?}", parsed.errors);
    let canon = rill_canon::canonicalize_expr(&parsed.ast, parsed.root, &interner);
    assert!(!canon.has_errors(), "canon errors: {:?}", canon.diagnostics);
    let result = solve(&canon.arena, canon.root, &interner);
    (result, canon.root, interner)
}

fn type_of(source: &str) -> String {
    let (result, root, interner) = solve_source(source);
    assert!(!result.has_errors(), "type errors: {:?}", result.diagnostics);
    type_string(&result.pool, result.expr_type(root), &interner)
}

#[test]
fn int_arithmetic_is_int() {
    assert_eq!(type_of("1 + 2 * 3"), "Int");
}

#[test]
fn frac_division_is_frac() {
    assert_eq!(type_of("1.5 / 2.5"), "Frac");
}

#[test]
fn comparison_is_bool() {
    assert_eq!(type_of("1 < 2"), "Bool");
}

#[test]
fn string_literal_is_str() {
    assert_eq!(type_of("\"hello\""), "Str");
}

#[test]
fn lambda_types_as_function() {
    assert_eq!(type_of("|x| x + 1"), "Int -> Int");
}

#[test]
fn application_returns_the_result_type() {
    assert_eq!(type_of("(|x| x + 1)(2)"), "Int");
}

#[test]
fn curried_capture_chain_is_int() {
    assert_eq!(type_of("((|x| |y| x + y)(42))(10)"), "Int");
}

#[test]
fn unused_param_defaults_to_int() {
    assert_eq!(type_of("|x| 1"), "Int -> Int");
}

#[test]
fn record_type_lists_fields() {
    assert_eq!(type_of("{ x: 1, y: 2.5 }"), "{ x : Int, y : Frac }");
}

#[test]
fn unit_is_the_empty_record() {
    assert_eq!(type_of("()"), "{}");
}

#[test]
fn tuple_and_list_types() {
    assert_eq!(type_of("(1, \"a\")"), "(Int, Str)");
    assert_eq!(type_of("[1, 2, 3]"), "List Int");
}

#[test]
fn tag_unions_merge_across_if_branches() {
    assert_eq!(type_of("if true Ok(1) else Err(0)"), "[Err Int, Ok Int]");
}

#[test]
fn branch_mismatch_is_reported() {
    let (result, _, _) = solve_source("if true 1 else \"s\"");
    assert!(result.has_errors());
    assert_eq!(
        result.diagnostics[0].code,
        rill_diagnostic::ErrorCode::E4001
    );
}

#[test]
fn block_tail_type_wins() {
    assert_eq!(type_of("{ x = 1; x + 1 }"), "Int");
}

#[test]
fn match_branches_unify() {
    assert_eq!(type_of("match 1 { 0 -> 10, n -> n }"), "Int");
}

#[test]
fn same_solved_type_resolves_to_equal_structure() {
    // Two structurally identical types resolve equal even if allocated
    // separately (layout sharing depends on this).
    let (result, _, _) = solve_source("(1 + 2) * (3 + 4)");
    assert!(!result.has_errors());
}

#[test]
fn infinite_type_is_rejected() {
    let interner = StringInterner::new();
    let parsed = rill_parse::parse_file("f = |x| f\nf\n", &interner);
    let canon = rill_canon::canonicalize_file(&parsed.ast, &interner);
    let result = solve(&canon.arena, canon.root, &interner);
    assert!(result.has_errors());
}
