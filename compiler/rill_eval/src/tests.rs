use pretty_assertions::assert_eq;
use rill_ir::StringInterner;
use rill_layout::LayoutCache;

use super::*;

struct Evaluated {
    value: String,
    live_cells_after_dispose: usize,
}

fn eval(source: &str) -> Result<Evaluated, EvalError> {
    let interner = StringInterner::new();
    let parsed = rill_parse::parse_file(source, &interner);
    assert!(!parsed.has_errors(), "parse errors: {:?}", parsed.errors);
    let canon = rill_canon::canonicalize_file(&parsed.ast, &interner);
    assert!(!canon.has_errors(), "canon errors: {:?}", canon.diagnostics);
    let types = rill_types::solve(&canon.arena, canon.root, &interner);
    assert!(!types.has_errors(), "type errors: {:?}", types.diagnostics);

    let mut cache = LayoutCache::new();
    let mut interp = Interpreter::new(
        &canon.arena,
        &types,
        &mut cache,
        &interner,
        &canon.diagnostics,
    );
    let value = interp.eval_program(canon.root)?;
    let rendered = render_value(&interp, value);
    interp.dispose(value);
    Ok(Evaluated {
        value: rendered,
        live_cells_after_dispose: interp.live_heap_cells(),
    })
}

fn eval_ok(source: &str) -> String {
    match eval(source) {
        Ok(out) => out.value,
        Err(e) => panic!("evaluation failed: {e:?}"),
    }
}

// Spec scenarios

#[test]
fn simple_lambda_capture_applies_to_52() {
    assert_eq!(eval_ok("((|x| |y| x + y)(42))(10)"), "52");
}

#[test]
fn nested_captures_evaluate_to_6() {
    assert_eq!(eval_ok("(|y| (|x| (|z| x + y + z)(3))(2))(1)"), "6");
}

#[test]
fn multi_parameter_capture_evaluates_to_6() {
    assert_eq!(eval_ok("(|a, b| |c| a + b + c)(1, 2)(3)"), "6");
}

#[test]
fn shadowing_uses_the_inner_binding() {
    let source = "x = 5\ny = 10\nouterFunc = |_| {\n    x = 20\n    { z = x + y; z + 1 }\n}\nouterFunc(())\n";
    assert_eq!(eval_ok(source), "31");
}

#[test]
fn conditional_capture_true_branch() {
    assert_eq!(
        eval_ok("((|outer| |inner| if outer > 0 (outer + inner) else inner)(5))(3)"),
        "8"
    );
}

#[test]
fn conditional_capture_false_branch() {
    assert_eq!(
        eval_ok("((|outer| |inner| if outer > 0 (outer + inner) else inner)(-1))(3)"),
        "3"
    );
}

// Arithmetic and operators

#[test]
fn arithmetic_precedence() {
    assert_eq!(eval_ok("1 + 2 * 3"), "7");
    assert_eq!(eval_ok("7 // 2"), "3");
    assert_eq!(eval_ok("7 % 2"), "1");
    assert_eq!(eval_ok("1.5 / 0.5"), "3.0");
}

#[test]
fn comparisons_and_logic() {
    assert_eq!(eval_ok("1 < 2"), "true");
    assert_eq!(eval_ok("1 == 2"), "false");
    assert_eq!(eval_ok("true and false"), "false");
    assert_eq!(eval_ok("true or false"), "true");
    assert_eq!(eval_ok("!false"), "true");
    assert_eq!(eval_ok("-(3 + 4)"), "-7");
}

#[test]
fn short_circuit_skips_the_rhs() {
    // The rhs would divide by zero; `and` must not evaluate it.
    assert_eq!(eval_ok("false and (1 // 0) == 0"), "false");
    assert_eq!(eval_ok("true or (1 // 0) == 0"), "true");
}

#[test]
fn arithmetic_overflow_is_a_runtime_error() {
    let err = eval("9223372036854775807 + 1").err();
    assert!(
        matches!(
            err,
            Some(EvalError::Runtime(RuntimeError::ArithmeticOverflow { .. }))
        ),
        "got {err:?}"
    );
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let err = eval("1 // 0").err();
    assert!(
        matches!(
            err,
            Some(EvalError::Runtime(RuntimeError::DivisionByZero { .. }))
        ),
        "got {err:?}"
    );
}

// Strings

#[test]
fn string_concat_inline() {
    assert_eq!(eval_ok("\"foo\" + \"bar\""), "\"foobar\"");
}

#[test]
fn string_concat_spills_to_heap_and_frees() {
    let out = match eval("\"the first long half of it \" + \"the second long half of it\"") {
        Ok(out) => out,
        Err(e) => panic!("evaluation failed: {e:?}"),
    };
    assert_eq!(
        out.value,
        "\"the first long half of it the second long half of it\""
    );
    assert_eq!(out.live_cells_after_dispose, 0);
}

// Blocks, records, tuples, lists, tags

#[test]
fn block_lets_bind_in_order() {
    assert_eq!(eval_ok("{ a = 2; b = a * 3; a + b }"), "8");
}

#[test]
fn record_and_tuple_literals_render() {
    assert_eq!(eval_ok("{ x: 1, y: 2 }"), "{ x: 1, y: 2 }");
    assert_eq!(eval_ok("(1, true)"), "(1, true)");
    assert_eq!(eval_ok("()"), "{}");
}

#[test]
fn list_literal_renders_and_frees() {
    let out = match eval("[1, 2, 3]") {
        Ok(out) => out,
        Err(e) => panic!("evaluation failed: {e:?}"),
    };
    assert_eq!(out.value, "[1, 2, 3]");
    assert_eq!(out.live_cells_after_dispose, 0);
}

#[test]
fn tag_values_render() {
    assert_eq!(eval_ok("Ok(42)"), "Ok(42)");
    assert_eq!(eval_ok("if true Ok(1) else Err(2)"), "Ok(1)");
}

// Match

#[test]
fn match_literal_branches() {
    assert_eq!(eval_ok("match 2 { 0 -> 10, 1 | 2 -> 20, _ -> 30 }"), "20");
}

#[test]
fn match_binds_the_scrutinee() {
    assert_eq!(eval_ok("match 5 { 0 -> 0, n -> n * 2 }"), "10");
}

#[test]
fn match_tags_with_payload() {
    assert_eq!(
        eval_ok("match Ok(7) { Ok(v) -> v, Err(_) -> 0 }"),
        "7"
    );
}

#[test]
fn match_list_destructure() {
    assert_eq!(
        eval_ok("match [1, 2, 3] { [first, .. rest] -> first, _ -> 0 }"),
        "1"
    );
    assert_eq!(eval_ok("match [] { [] -> 42, _ -> 0 }"), "42");
}

#[test]
fn match_failure_is_a_runtime_error() {
    let err = eval("match 3 { 0 -> 1 }").err();
    assert!(
        matches!(
            err,
            Some(EvalError::Runtime(RuntimeError::PatternMatchFailed { .. }))
        ),
        "got {err:?}"
    );
}

// Declarations and recursion

#[test]
fn declarations_evaluate_in_order() {
    assert_eq!(eval_ok("x = 5\ny = x + 1\ny\n"), "6");
}

#[test]
fn redefinition_recomputes_dependents() {
    // The accumulated-source shadowing semantics: the later `x` wins for
    // every reference, so `y` recomputes to 7.
    assert_eq!(eval_ok("x = 5\ny = x + 1\nx = 6\ny\n"), "7");
}

#[test]
fn recursive_function_terminates() {
    assert_eq!(
        eval_ok("fac = |n| if n < 2 1 else n * fac(n - 1)\nfac(5)\n"),
        "120"
    );
}

#[test]
fn closures_stored_in_declarations_work() {
    assert_eq!(eval_ok("addOne = |x| x + 1\naddOne(41)\n"), "42");
}

#[test]
fn closure_passed_as_argument() {
    assert_eq!(
        eval_ok("apply = |f, x| f(x)\napply(|n| n * 2, 21)\n"),
        "42"
    );
}

#[test]
fn closure_returned_from_block_keeps_its_capture() {
    assert_eq!(eval_ok("{ a = 40; addA = |x| x + a; addA(2) }"), "42");
}

// Failure semantics

#[test]
fn stack_overflow_is_fatal_not_a_panic() {
    let interner = StringInterner::new();
    let parsed = rill_parse::parse_file("f = |n| f(n + 1)\nf(0)\n", &interner);
    let canon = rill_canon::canonicalize_file(&parsed.ast, &interner);
    let types = rill_types::solve(&canon.arena, canon.root, &interner);
    let mut cache = LayoutCache::new();
    let mut interp = Interpreter::with_stack(
        &canon.arena,
        &types,
        &mut cache,
        &interner,
        &canon.diagnostics,
        ValueStack::with_capacity(4 * 1024),
    );
    let err = interp.eval_program(canon.root).err();
    assert!(
        matches!(err, Some(EvalError::Fatal(FatalError::StackOverflow(_)))),
        "got {err:?}"
    );
}

#[test]
fn malformed_expression_carries_its_diagnostic() {
    let interner = StringInterner::new();
    let parsed = rill_parse::parse_expr("nope", &interner);
    let canon = rill_canon::canonicalize_expr(&parsed.ast, parsed.root, &interner);
    let types = rill_types::solve(&canon.arena, canon.root, &interner);
    let mut cache = LayoutCache::new();
    let mut interp = Interpreter::new(
        &canon.arena,
        &types,
        &mut cache,
        &interner,
        &canon.diagnostics,
    );
    let err = interp.eval_program(canon.root).err();
    match err {
        Some(EvalError::Runtime(RuntimeError::MalformedExpression { diagnostic })) => {
            assert_eq!(diagnostic.code, rill_diagnostic::ErrorCode::E3001);
        }
        other => panic!("expected a malformed-expression error, got {other:?}"),
    }
}

// Refcount balance

#[test]
fn heap_is_balanced_across_aliasing() {
    // A long string aliased through a binding, a capture, and a list.
    let source = "{ s = \"a value long enough to live on the heap\"; xs = [s, s]; t = s; xs }";
    let out = match eval(source) {
        Ok(out) => out,
        Err(e) => panic!("evaluation failed: {e:?}"),
    };
    assert_eq!(out.live_cells_after_dispose, 0);
}
