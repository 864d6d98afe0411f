use pretty_assertions::assert_eq;

use super::*;

#[test]
fn expr_ids_are_sequential() {
    let mut ast = Ast::new();
    let a = ast.push_expr(ParseExpr::Int(1), Region::new(0, 1));
    let b = ast.push_expr(ParseExpr::Int(2), Region::new(2, 3));
    assert_eq!(a.raw(), 0);
    assert_eq!(b.raw(), 1);
    assert_eq!(ast.expr(a), ParseExpr::Int(1));
    assert_eq!(ast.expr_region(b), Region::new(2, 3));
}

#[test]
fn node_lists_round_trip() {
    let mut ast = Ast::new();
    let a = ast.push_expr(ParseExpr::Int(1), Region::DUMMY);
    let b = ast.push_expr(ParseExpr::Int(2), Region::DUMMY);
    let range = ast.push_node_list(&[a, b]);
    assert_eq!(ast.node_list(range), &[a, b]);
}

#[test]
fn empty_list_allocates_nothing() {
    let mut ast = Ast::new();
    let range = ast.push_node_list(&[]);
    assert_eq!(range, NodeRange::EMPTY);
    assert!(ast.node_list(range).is_empty());
}

#[test]
fn invalid_sentinel_is_not_valid() {
    assert!(!NodeId::INVALID.is_valid());
    assert!(NodeId::new(0).is_valid());
    assert_eq!(NodeId::default(), NodeId::INVALID);
}

#[test]
fn statements_round_trip() {
    let mut ast = Ast::new();
    let value = ast.push_expr(ParseExpr::Int(5), Region::DUMMY);
    let pattern = ast.push_pattern(ParsePattern::Underscore, Region::DUMMY);
    let range = ast.push_stmts(&[Stmt::Let { pattern, value }, Stmt::Expr(value)]);
    assert_eq!(range.len(), 2);
    assert_eq!(ast.stmt_list(range)[0], Stmt::Let { pattern, value });
}
