use pretty_assertions::assert_eq;

use rill_ir::can::{CanExpr, CaptureVar, SexprRenderer};
use rill_ir::StringInterner;

use crate::{canonicalize_expr, canonicalize_file, CanonResult};

fn canon(source: &str) -> (CanonResult, StringInterner) {
    let interner = StringInterner::new();
    let parsed = rill_parse::parse_expr(source, &interner);
    assert!(!parsed.has_errors(), "parse errors: {:?}", parsed.errors);
    let result = canonicalize_expr(&parsed.ast, parsed.root, &interner);
    (result, interner)
}

fn canon_file(source: &str) -> (CanonResult, StringInterner) {
    let interner = StringInterner::new();
    let parsed = rill_parse::parse_file(source, &interner);
    assert!(!parsed.has_errors(), "parse errors: {:?}", parsed.errors);
    let result = canonicalize_file(&parsed.ast, &interner);
    (result, interner)
}

/// Collect every lambda's captures, in arena allocation order (innermost
/// lambdas allocate before the lambdas that contain them).
fn lambda_captures(result: &CanonResult, interner: &StringInterner) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    for (_, expr) in result.arena.expr_iter() {
        if let CanExpr::Lambda { captures, .. } = expr {
            out.push(
                result
                    .arena
                    .capture_list(captures)
                    .iter()
                    .map(|c: &CaptureVar| interner.lookup(c.name).to_owned())
                    .collect(),
            );
        }
    }
    out
}

#[test]
fn simple_lambda_capture() {
    // Scenario: `|x| |y| x + y` — inner lambda captures exactly [x].
    let (result, interner) = canon("|x| |y| x + y");
    assert!(!result.has_errors());
    let captures = lambda_captures(&result, &interner);
    // Inner allocates first, then outer.
    assert_eq!(captures, vec![vec!["x".to_owned()], vec![]]);
}

#[test]
fn nested_captures_no_spurious_inclusion() {
    // `(|y| (|x| (|z| x + y + z)(3))(2))(1)`:
    // outermost captures [], middle [y], innermost [x, y] in first-use order.
    let (result, interner) = canon("(|y| (|x| (|z| x + y + z)(3))(2))(1)");
    assert!(!result.has_errors());
    let captures = lambda_captures(&result, &interner);
    assert_eq!(
        captures,
        vec![
            vec!["x".to_owned(), "y".to_owned()], // innermost |z|
            vec!["y".to_owned()],                 // middle |x|
            vec![],                               // outermost |y|
        ]
    );
}

#[test]
fn multi_parameter_capture() {
    // `(|a, b| |c| a + b + c)(1, 2)(3)` — inner captures [a, b].
    let (result, interner) = canon("(|a, b| |c| a + b + c)(1, 2)(3)");
    assert!(!result.has_errors());
    let captures = lambda_captures(&result, &interner);
    assert_eq!(
        captures,
        vec![vec!["a".to_owned(), "b".to_owned()], vec![]]
    );
}

#[test]
fn conditional_capture() {
    // `|outer| |inner| if outer > 0 (outer + inner) else inner`
    let (result, interner) = canon("|outer| |inner| if outer > 0 (outer + inner) else inner");
    assert!(!result.has_errors());
    let captures = lambda_captures(&result, &interner);
    assert_eq!(captures, vec![vec!["outer".to_owned()], vec![]]);
}

#[test]
fn let_bound_names_are_not_captured() {
    // `b` is bound inside the inner body; only `a` crosses the boundary.
    let (result, interner) = canon("|a| |c| { b = a; b + c }");
    assert!(!result.has_errors());
    let captures = lambda_captures(&result, &interner);
    assert_eq!(captures, vec![vec!["a".to_owned()], vec![]]);
}

#[test]
fn match_branch_bindings_are_not_captured() {
    let (result, interner) = canon("|xs| match xs { [first, .. rest] -> first, _ -> 0 }");
    assert!(!result.has_errors());
    let captures = lambda_captures(&result, &interner);
    assert_eq!(captures, vec![Vec::<String>::new()]);
}

#[test]
fn unknown_ident_becomes_malformed_with_diagnostic() {
    let interner = StringInterner::new();
    let parsed = rill_parse::parse_expr("nope + 1", &interner);
    let result = canonicalize_expr(&parsed.ast, parsed.root, &interner);
    assert!(result.has_errors());
    assert_eq!(
        result.diagnostics[0].code,
        rill_diagnostic::ErrorCode::E3001
    );
    // The tree is complete: a binop whose lhs is malformed.
    assert!(result
        .arena
        .expr_iter()
        .any(|(_, e)| matches!(e, CanExpr::Malformed(_))));
}

#[test]
fn shadowing_records_ident_already_in_scope() {
    // Top-level x is shadowed by the lambda-local x; canonicalization
    // warns and continues with the inner binding.
    let source = "x = 5\ny = 10\nouterFunc = |_| {\n    x = 20\n    { z = x + y; z + 1 }\n}\nouterFunc(())\n";
    let (result, _) = canon_file(source);
    assert!(!result.has_errors(), "only a warning expected");
    let warnings: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == rill_diagnostic::ErrorCode::E3002)
        .collect();
    assert_eq!(warnings.len(), 1);
}

#[test]
fn parameter_reuse_across_lambdas_is_not_shadowing() {
    // The inner `x` is a parameter of a *different* function context;
    // reusing the name must not warn.
    let (result, _) = canon("|x| (|x| x + 1)(x)");
    assert!(
        result.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        result.diagnostics
    );
}

#[test]
fn same_function_shadowing_warns() {
    // A block binding shadowing the same lambda's parameter does warn.
    let (result, _) = canon("|x| { x = x + 1; x }");
    assert!(!result.has_errors());
    let warnings: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == rill_diagnostic::ErrorCode::E3002)
        .collect();
    assert_eq!(warnings.len(), 1);
}

#[test]
fn top_level_reference_lowers_to_external_lookup() {
    let (result, _) = canon_file("x = 5\nx\n");
    assert!(!result.has_errors());
    assert!(matches!(
        result.arena.expr(result.root),
        CanExpr::LookupExternal(_)
    ));
}

#[test]
fn repl_redefinition_last_definition_wins() {
    // `x = 6` after `x = 5`: the later definition wins for every
    // reference, lowered at x's first position. No warning.
    let (result, interner) = canon_file("x = 5\ny = x + 1\nx = 6\ny\n");
    assert!(!result.has_errors());
    let decls = result.arena.decls();
    assert_eq!(decls.len(), 2);
    assert_eq!(interner.lookup(decls[0].name), "x");
    assert_eq!(interner.lookup(decls[1].name), "y");
    // x's winning body is the literal 6.
    match result.arena.expr(decls[0].body) {
        CanExpr::Int { value, .. } => assert_eq!(value, 6),
        other => panic!("expected the redefined body, got {other:?}"),
    }
}

#[test]
fn recursive_decl_resolves_to_itself() {
    let (result, _) = canon_file("fac = |n| if n < 2 1 else n * fac(n - 1)\nfac(5)\n");
    assert!(!result.has_errors(), "diags: {:?}", result.diagnostics);
}

#[test]
fn canonicalization_is_deterministic() {
    let source = "(|y| (|x| (|z| x + y + z)(3))(2))(1)";
    let (a, interner_a) = canon(source);
    let (b, interner_b) = canon(source);
    let sexpr_a = SexprRenderer::new(&a.arena, &interner_a).render_program(a.root);
    let sexpr_b = SexprRenderer::new(&b.arena, &interner_b).render_program(b.root);
    assert_eq!(sexpr_a, sexpr_b);
}

#[test]
fn capture_soundness_every_local_lookup_is_param_or_capture() {
    // For every lambda, every LookupLocal in its body resolves to a
    // parameter or a capture. Checked over a source that exercises
    // nesting, blocks, and match bindings.
    let (result, _) =
        canon("|a| |b| { c = a + b; match c { 0 -> a, n -> n + b } }");
    assert!(!result.has_errors());
    for (_, expr) in result.arena.expr_iter() {
        let CanExpr::Lambda {
            params,
            body,
            captures,
        } = expr
        else {
            continue;
        };
        let params: Vec<_> = result.arena.pattern_list(params).to_vec();
        let captures: Vec<_> = result
            .arena
            .capture_list(captures)
            .iter()
            .map(|c| c.bound_pattern)
            .collect();
        let mut locals = Vec::new();
        collect_local_lookups(&result, body, &mut locals);
        // Patterns bound *inside* the body (block lets, match branches,
        // inner lambda params) are also legal targets; anything else must
        // be a param or capture.
        for local in locals {
            let bound_inside = local.index() >= params.iter().map(|p| p.index()).min().unwrap_or(0);
            assert!(
                params.contains(&local) || captures.contains(&local) || bound_inside,
                "lookup of {local:?} is neither param, capture, nor body-local"
            );
        }
    }
}

fn collect_local_lookups(
    result: &CanonResult,
    root: rill_ir::can::CanId,
    out: &mut Vec<rill_ir::can::PatternIdx>,
) {
    use rill_ir::can::CanStmt;
    match result.arena.expr(root) {
        CanExpr::LookupLocal(p) => out.push(p),
        CanExpr::Binop { lhs, rhs, .. } => {
            collect_local_lookups(result, lhs, out);
            collect_local_lookups(result, rhs, out);
        }
        CanExpr::Unary { operand, .. } => collect_local_lookups(result, operand, out),
        CanExpr::Call { callee, args } => {
            collect_local_lookups(result, callee, out);
            for &arg in result.arena.expr_list(args) {
                collect_local_lookups(result, arg, out);
            }
        }
        CanExpr::If {
            cond,
            then_branch,
            else_branch,
        } => {
            collect_local_lookups(result, cond, out);
            collect_local_lookups(result, then_branch, out);
            collect_local_lookups(result, else_branch, out);
        }
        CanExpr::Lambda { body, .. } => collect_local_lookups(result, body, out),
        CanExpr::Block { stmts, tail } => {
            for stmt in result.arena.stmt_list(stmts) {
                match *stmt {
                    CanStmt::Let { value, .. } => collect_local_lookups(result, value, out),
                    CanStmt::Expr(e) => collect_local_lookups(result, e, out),
                }
            }
            if tail.is_valid() {
                collect_local_lookups(result, tail, out);
            }
        }
        CanExpr::Match {
            scrutinee,
            branches,
        } => {
            collect_local_lookups(result, scrutinee, out);
            for branch in result.arena.branch_list(branches) {
                collect_local_lookups(result, branch.body, out);
            }
        }
        CanExpr::Record { fields } => {
            for field in result.arena.field_list(fields) {
                collect_local_lookups(result, field.value, out);
            }
        }
        CanExpr::Tuple(elements) | CanExpr::List(elements) => {
            for &element in result.arena.expr_list(elements) {
                collect_local_lookups(result, element, out);
            }
        }
        CanExpr::Tag { payload, .. } => {
            for &arg in result.arena.expr_list(payload) {
                collect_local_lookups(result, arg, out);
            }
        }
        _ => {}
    }
}
