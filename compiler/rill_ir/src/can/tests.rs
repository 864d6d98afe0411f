use pretty_assertions::assert_eq;

use crate::{Region, StringInterner};

use super::*;

#[test]
fn pattern_identity_is_its_index() {
    let interner = StringInterner::new();
    let x = interner.intern("x");
    let mut arena = CanArena::new();
    let p = arena.push_pattern(CanPattern::Ident(x), Region::DUMMY);
    let lookup = arena.push_expr(CanExpr::LookupLocal(p), Region::DUMMY);
    match arena.expr(lookup) {
        CanExpr::LookupLocal(idx) => assert_eq!(idx, p),
        other => panic!("expected LookupLocal, got {other:?}"),
    }
}

#[test]
fn capture_lists_round_trip() {
    let interner = StringInterner::new();
    let y = interner.intern("y");
    let mut arena = CanArena::new();
    let p = arena.push_pattern(CanPattern::Ident(y), Region::DUMMY);
    let range = arena.push_captures(&[CaptureVar {
        name: y,
        bound_pattern: p,
        scope_depth: 0,
    }]);
    let captures = arena.capture_list(range);
    assert_eq!(captures.len(), 1);
    assert_eq!(captures[0].bound_pattern, p);
}

#[test]
fn sexpr_renders_lambda_with_captures() {
    let interner = StringInterner::new();
    let x = interner.intern("x");
    let y = interner.intern("y");
    let mut arena = CanArena::new();

    // |y| x + y   with x captured from an enclosing scope
    let p_x = arena.push_pattern(CanPattern::Ident(x), Region::DUMMY);
    let p_y = arena.push_pattern(CanPattern::Ident(y), Region::DUMMY);
    let lhs = arena.push_expr(CanExpr::LookupLocal(p_x), Region::DUMMY);
    let rhs = arena.push_expr(CanExpr::LookupLocal(p_y), Region::DUMMY);
    let body = arena.push_expr(
        CanExpr::Binop {
            op: crate::ast::BinOp::Add,
            lhs,
            rhs,
        },
        Region::DUMMY,
    );
    let params = arena.push_pattern_list(&[p_y]);
    let captures = arena.push_captures(&[CaptureVar {
        name: x,
        bound_pattern: p_x,
        scope_depth: 0,
    }]);
    let lambda = arena.push_expr(
        CanExpr::Lambda {
            params,
            body,
            captures,
        },
        Region::DUMMY,
    );

    let rendered = SexprRenderer::new(&arena, &interner).render(lambda);
    let expected = "(lambda\n  (params (p-ident \"y\" p1))\n  (captures (capture \"x\" p0 depth=0))\n  (binop \"+\"\n    (lookup-local p0)\n    (lookup-local p1)))";
    assert_eq!(rendered, expected);
}

#[test]
fn sexpr_renders_empty_captures_explicitly() {
    let interner = StringInterner::new();
    let x = interner.intern("x");
    let mut arena = CanArena::new();
    let p_x = arena.push_pattern(CanPattern::Ident(x), Region::DUMMY);
    let body = arena.push_expr(CanExpr::LookupLocal(p_x), Region::DUMMY);
    let params = arena.push_pattern_list(&[p_x]);
    let lambda = arena.push_expr(
        CanExpr::Lambda {
            params,
            body,
            captures: CaptureRange::EMPTY,
        },
        Region::DUMMY,
    );

    let rendered = SexprRenderer::new(&arena, &interner).render(lambda);
    assert!(rendered.contains("(captures)"), "got: {rendered}");
}

#[test]
fn decls_are_recorded_in_order() {
    let interner = StringInterner::new();
    let mut arena = CanArena::new();
    let a = interner.intern("a");
    let b = interner.intern("b");
    let pa = arena.push_pattern(CanPattern::Ident(a), Region::DUMMY);
    let pb = arena.push_pattern(CanPattern::Ident(b), Region::DUMMY);
    let one = arena.push_expr(
        CanExpr::Int {
            value: 1,
            precision: IntPrecision::I64,
        },
        Region::DUMMY,
    );
    arena.push_decl(CanDecl {
        name: a,
        pattern: pa,
        body: one,
        region: Region::DUMMY,
    });
    arena.push_decl(CanDecl {
        name: b,
        pattern: pb,
        body: one,
        region: Region::DUMMY,
    });
    assert_eq!(arena.decls().len(), 2);
    assert_eq!(arena.decl(DeclId::new(0)).name, a);
    assert_eq!(arena.decl(DeclId::new(1)).name, b);
}
