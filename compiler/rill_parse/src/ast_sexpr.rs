//! S-expression rendering of the parse tree.
//!
//! The `PARSE` snapshot section is the byte-exact output of
//! [`render_file_sexpr`]. Same layout conventions as the canonical IR
//! renderer in `rill_ir::can`: atoms inline, compound nodes one child per
//! line, two-space indent.

use std::fmt::Write as _;

use rill_ir::ast::{Ast, NodeId, ParseExpr, ParsePattern, PatId, Stmt, StrSegment, TopLevel};
use rill_ir::{Name, StringInterner};

/// Render every top-level item of a parsed file.
pub fn render_file_sexpr(ast: &Ast, interner: &StringInterner) -> String {
    let mut out = String::new();
    for (i, item) in ast.items.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        render_item(&mut out, ast, interner, item);
    }
    out.push('\n');
    out
}

/// Render one top-level item (REPL statement).
pub fn render_item_sexpr(ast: &Ast, interner: &StringInterner, item: &TopLevel) -> String {
    let mut out = String::new();
    render_item(&mut out, ast, interner, item);
    out.push('\n');
    out
}

fn render_item(out: &mut String, ast: &Ast, interner: &StringInterner, item: &TopLevel) {
    match *item {
        TopLevel::Def { pattern, value } => {
            out.push_str("(def ");
            pattern_sexpr(out, ast, interner, pattern);
            newline(out, 1);
            expr_sexpr(out, ast, interner, value, 1);
            out.push(')');
        }
        TopLevel::Import { name } => {
            let _ = write!(out, "(import \"{}\")", interner.lookup(name));
        }
        TopLevel::Expr(root) => expr_sexpr(out, ast, interner, root, 0),
    }
}

fn newline(out: &mut String, indent: usize) {
    out.push('\n');
    for _ in 0..indent {
        out.push_str("  ");
    }
}

fn name_str(out: &mut String, interner: &StringInterner, name: Name) {
    let _ = write!(out, "\"{}\"", interner.lookup(name));
}

fn expr_sexpr(out: &mut String, ast: &Ast, interner: &StringInterner, id: NodeId, indent: usize) {
    match ast.expr(id) {
        ParseExpr::Int(value) => {
            let _ = write!(out, "(int {value})");
        }
        ParseExpr::Frac(bits) => {
            let _ = write!(out, "(frac {})", f64::from_bits(bits));
        }
        ParseExpr::Bool(value) => {
            let _ = write!(out, "(bool {value})");
        }
        ParseExpr::Str(segments) => {
            out.push_str("(str");
            for segment in ast.str_segment_list(segments) {
                let StrSegment::Literal(text) = segment;
                out.push(' ');
                name_str(out, interner, *text);
            }
            out.push(')');
        }
        ParseExpr::Ident(name) => {
            out.push_str("(ident ");
            name_str(out, interner, name);
            out.push(')');
        }
        ParseExpr::Tag { name, payload } => {
            out.push_str("(tag ");
            name_str(out, interner, name);
            for &arg in ast.node_list(payload) {
                newline(out, indent + 1);
                expr_sexpr(out, ast, interner, arg, indent + 1);
            }
            out.push(')');
        }
        ParseExpr::Lambda { params, body } => {
            out.push_str("(lambda");
            newline(out, indent + 1);
            out.push_str("(params");
            for &param in ast.pat_list(params) {
                out.push(' ');
                pattern_sexpr(out, ast, interner, param);
            }
            out.push(')');
            newline(out, indent + 1);
            expr_sexpr(out, ast, interner, body, indent + 1);
            out.push(')');
        }
        ParseExpr::Apply { callee, args } => {
            out.push_str("(apply");
            newline(out, indent + 1);
            expr_sexpr(out, ast, interner, callee, indent + 1);
            for &arg in ast.node_list(args) {
                newline(out, indent + 1);
                expr_sexpr(out, ast, interner, arg, indent + 1);
            }
            out.push(')');
        }
        ParseExpr::Binop { op, lhs, rhs } => {
            let _ = write!(out, "(binop \"{}\"", op.symbol());
            newline(out, indent + 1);
            expr_sexpr(out, ast, interner, lhs, indent + 1);
            newline(out, indent + 1);
            expr_sexpr(out, ast, interner, rhs, indent + 1);
            out.push(')');
        }
        ParseExpr::Unary { op, operand } => {
            let _ = write!(out, "(unary \"{}\" ", op.symbol());
            expr_sexpr(out, ast, interner, operand, indent);
            out.push(')');
        }
        ParseExpr::IfThenElse {
            cond,
            then_branch,
            else_branch,
        } => {
            out.push_str("(if");
            newline(out, indent + 1);
            expr_sexpr(out, ast, interner, cond, indent + 1);
            newline(out, indent + 1);
            expr_sexpr(out, ast, interner, then_branch, indent + 1);
            newline(out, indent + 1);
            expr_sexpr(out, ast, interner, else_branch, indent + 1);
            out.push(')');
        }
        ParseExpr::Match {
            scrutinee,
            branches,
        } => {
            out.push_str("(match");
            newline(out, indent + 1);
            expr_sexpr(out, ast, interner, scrutinee, indent + 1);
            for branch in ast.branch_list(branches) {
                newline(out, indent + 1);
                out.push_str("(branch");
                for &pattern in ast.pat_list(branch.patterns) {
                    out.push(' ');
                    pattern_sexpr(out, ast, interner, pattern);
                }
                newline(out, indent + 2);
                expr_sexpr(out, ast, interner, branch.body, indent + 2);
                out.push(')');
            }
            out.push(')');
        }
        ParseExpr::Block { stmts, tail } => {
            out.push_str("(block");
            for stmt in ast.stmt_list(stmts) {
                newline(out, indent + 1);
                match *stmt {
                    Stmt::Let { pattern, value } => {
                        out.push_str("(let ");
                        pattern_sexpr(out, ast, interner, pattern);
                        newline(out, indent + 2);
                        expr_sexpr(out, ast, interner, value, indent + 2);
                        out.push(')');
                    }
                    Stmt::Expr(e) => expr_sexpr(out, ast, interner, e, indent + 1),
                }
            }
            if tail.is_valid() {
                newline(out, indent + 1);
                expr_sexpr(out, ast, interner, tail, indent + 1);
            }
            out.push(')');
        }
        ParseExpr::Record { fields } => {
            out.push_str("(record");
            for field in ast.record_field_list(fields) {
                newline(out, indent + 1);
                out.push_str("(field ");
                name_str(out, interner, field.name);
                if field.value.is_valid() {
                    out.push(' ');
                    expr_sexpr(out, ast, interner, field.value, indent + 1);
                }
                out.push(')');
            }
            out.push(')');
        }
        ParseExpr::Tuple(elements) => {
            out.push_str("(tuple");
            for &element in ast.node_list(elements) {
                newline(out, indent + 1);
                expr_sexpr(out, ast, interner, element, indent + 1);
            }
            out.push(')');
        }
        ParseExpr::List(elements) => {
            out.push_str("(list");
            for &element in ast.node_list(elements) {
                newline(out, indent + 1);
                expr_sexpr(out, ast, interner, element, indent + 1);
            }
            out.push(')');
        }
        ParseExpr::Malformed => out.push_str("(malformed)"),
    }
}

fn pattern_sexpr(out: &mut String, ast: &Ast, interner: &StringInterner, id: PatId) {
    match ast.pattern(id) {
        ParsePattern::Ident(name) => {
            out.push_str("(p-ident ");
            name_str(out, interner, name);
            out.push(')');
        }
        ParsePattern::IntLiteral(value) => {
            let _ = write!(out, "(p-int {value})");
        }
        ParsePattern::Tag { name, args } => {
            out.push_str("(p-tag ");
            name_str(out, interner, name);
            for &arg in ast.pat_list(args) {
                out.push(' ');
                pattern_sexpr(out, ast, interner, arg);
            }
            out.push(')');
        }
        ParsePattern::Record { fields } => {
            out.push_str("(p-record");
            for field in ast.pat_field_list(fields) {
                out.push_str(" (p-field ");
                name_str(out, interner, field.name);
                if field.pattern.is_valid() {
                    out.push(' ');
                    pattern_sexpr(out, ast, interner, field.pattern);
                }
                out.push(')');
            }
            out.push(')');
        }
        ParsePattern::Tuple(elements) => {
            out.push_str("(p-tuple");
            for &element in ast.pat_list(elements) {
                out.push(' ');
                pattern_sexpr(out, ast, interner, element);
            }
            out.push(')');
        }
        ParsePattern::List { elems, rest } => {
            out.push_str("(p-list");
            for &element in ast.pat_list(elems) {
                out.push(' ');
                pattern_sexpr(out, ast, interner, element);
            }
            if rest.is_valid() {
                out.push_str(" (p-rest ");
                pattern_sexpr(out, ast, interner, rest);
                out.push(')');
            }
            out.push(')');
        }
        ParsePattern::Underscore => out.push_str("(p-underscore)"),
        ParsePattern::As { inner, name } => {
            out.push_str("(p-as ");
            pattern_sexpr(out, ast, interner, inner);
            out.push(' ');
            name_str(out, interner, name);
            out.push(')');
        }
        ParsePattern::Alternatives(alternatives) => {
            out.push_str("(p-alternatives");
            for &alternative in ast.pat_list(alternatives) {
                out.push(' ');
                pattern_sexpr(out, ast, interner, alternative);
            }
            out.push(')');
        }
        ParsePattern::Malformed => out.push_str("(p-malformed)"),
    }
}
