//! Canonical source formatter.
//!
//! Renders a parse tree back to source in one canonical style; the
//! `FORMATTED` snapshot section is `NO CHANGE` when this output equals
//! the original source. Formatting is syntax-directed and total: any
//! tree the parser produces can be formatted, and re-parsing the output
//! yields an equivalent tree.

use std::fmt::Write as _;

use rill_ir::ast::{
    Ast, BinOp, NodeId, ParseExpr, ParsePattern, PatId, Stmt, StrSegment, TopLevel,
};
use rill_ir::StringInterner;

/// Format a whole file of top-level items.
pub fn format_file(ast: &Ast, interner: &StringInterner) -> String {
    let mut out = String::new();
    for item in &ast.items {
        match *item {
            TopLevel::Def { pattern, value } => {
                format_pattern(&mut out, ast, interner, pattern);
                out.push_str(" = ");
                format_expr(&mut out, ast, interner, value, 0, 0);
            }
            TopLevel::Import { name } => {
                let _ = write!(out, "import {}", interner.lookup(name));
            }
            TopLevel::Expr(root) => format_expr(&mut out, ast, interner, root, 0, 0),
        }
        out.push('\n');
    }
    out
}

/// Format a single expression.
pub fn format_expr_source(ast: &Ast, root: NodeId, interner: &StringInterner) -> String {
    let mut out = String::new();
    format_expr(&mut out, ast, interner, root, 0, 0);
    out.push('\n');
    out
}

/// Left binding power of a binary operator (mirrors the parser).
fn binop_bp(op: BinOp) -> u8 {
    match op {
        BinOp::Or => 1,
        BinOp::And => 3,
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 5,
        BinOp::Add | BinOp::Sub => 7,
        BinOp::Mul | BinOp::Div | BinOp::DivTrunc | BinOp::Rem => 9,
    }
}

/// The binding power a node exposes to its parent.
fn expr_bp(ast: &Ast, id: NodeId) -> u8 {
    match ast.expr(id) {
        ParseExpr::Binop { op, .. } => binop_bp(op),
        ParseExpr::Unary { .. } => 11,
        ParseExpr::Lambda { .. } | ParseExpr::IfThenElse { .. } => 0,
        _ => u8::MAX,
    }
}

/// Is this node a bare atom (safe next to anything without parens)?
fn is_atom(ast: &Ast, id: NodeId) -> bool {
    matches!(
        ast.expr(id),
        ParseExpr::Int(_)
            | ParseExpr::Frac(_)
            | ParseExpr::Bool(_)
            | ParseExpr::Str(_)
            | ParseExpr::Ident(_)
            | ParseExpr::Tuple(_)
            | ParseExpr::List(_)
            | ParseExpr::Record { .. }
            | ParseExpr::Block { .. }
    )
}

fn format_expr(
    out: &mut String,
    ast: &Ast,
    interner: &StringInterner,
    id: NodeId,
    indent: usize,
    min_bp: u8,
) {
    let wrap = expr_bp(ast, id) < min_bp;
    if wrap {
        out.push('(');
    }
    match ast.expr(id) {
        ParseExpr::Int(value) => {
            let _ = write!(out, "{value}");
        }
        ParseExpr::Frac(bits) => {
            let _ = write!(out, "{:?}", f64::from_bits(bits));
        }
        ParseExpr::Bool(value) => {
            let _ = write!(out, "{value}");
        }
        ParseExpr::Str(segments) => {
            out.push('"');
            for segment in ast.str_segment_list(segments) {
                let StrSegment::Literal(text) = segment;
                push_escaped(out, interner.lookup(*text));
            }
            out.push('"');
        }
        ParseExpr::Ident(name) => out.push_str(interner.lookup(name)),
        ParseExpr::Tag { name, payload } => {
            out.push_str(interner.lookup(name));
            if !payload.is_empty() {
                out.push('(');
                for (i, &arg) in ast.node_list(payload).iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    format_expr(out, ast, interner, arg, indent, 0);
                }
                out.push(')');
            }
        }
        ParseExpr::Lambda { params, body } => {
            out.push('|');
            for (i, &param) in ast.pat_list(params).iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                format_pattern(out, ast, interner, param);
            }
            out.push_str("| ");
            format_expr(out, ast, interner, body, indent, 0);
        }
        ParseExpr::Apply { callee, args } => {
            // The callee must sit immediately against the `(`; wrap
            // anything that is not an atom or another application.
            let callee_atomic =
                is_atom(ast, callee) || matches!(ast.expr(callee), ParseExpr::Apply { .. });
            if !callee_atomic {
                out.push('(');
            }
            format_expr(out, ast, interner, callee, indent, 0);
            if !callee_atomic {
                out.push(')');
            }
            out.push('(');
            for (i, &arg) in ast.node_list(args).iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                format_expr(out, ast, interner, arg, indent, 0);
            }
            out.push(')');
        }
        ParseExpr::Binop { op, lhs, rhs } => {
            let bp = binop_bp(op);
            format_expr(out, ast, interner, lhs, indent, bp);
            let _ = write!(out, " {} ", op.symbol());
            format_expr(out, ast, interner, rhs, indent, bp + 1);
        }
        ParseExpr::Unary { op, operand } => {
            out.push_str(op.symbol());
            format_expr(out, ast, interner, operand, indent, 11);
        }
        ParseExpr::IfThenElse {
            cond,
            then_branch,
            else_branch,
        } => {
            out.push_str("if ");
            format_expr(out, ast, interner, cond, indent, 0);
            out.push(' ');
            format_branch(out, ast, interner, then_branch, indent);
            out.push_str(" else ");
            format_branch(out, ast, interner, else_branch, indent);
        }
        ParseExpr::Match {
            scrutinee,
            branches,
        } => {
            out.push_str("match ");
            format_expr(out, ast, interner, scrutinee, indent, u8::MAX);
            out.push_str(" {\n");
            for branch in ast.branch_list(branches) {
                push_indent(out, indent + 1);
                for (i, &pattern) in ast.pat_list(branch.patterns).iter().enumerate() {
                    if i > 0 {
                        out.push_str(" | ");
                    }
                    format_pattern(out, ast, interner, pattern);
                }
                out.push_str(" -> ");
                format_expr(out, ast, interner, branch.body, indent + 1, 0);
                out.push_str(",\n");
            }
            push_indent(out, indent);
            out.push('}');
        }
        ParseExpr::Block { stmts, tail } => {
            out.push_str("{\n");
            for stmt in ast.stmt_list(stmts) {
                push_indent(out, indent + 1);
                match *stmt {
                    Stmt::Let { pattern, value } => {
                        format_pattern(out, ast, interner, pattern);
                        out.push_str(" = ");
                        format_expr(out, ast, interner, value, indent + 1, 0);
                    }
                    Stmt::Expr(e) => format_expr(out, ast, interner, e, indent + 1, 0),
                }
                out.push('\n');
            }
            if tail.is_valid() {
                push_indent(out, indent + 1);
                format_expr(out, ast, interner, tail, indent + 1, 0);
                out.push('\n');
            }
            push_indent(out, indent);
            out.push('}');
        }
        ParseExpr::Record { fields } => {
            if fields.is_empty() {
                out.push_str("{}");
            } else {
                out.push_str("{ ");
                for (i, field) in ast.record_field_list(fields).iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(interner.lookup(field.name));
                    if field.value.is_valid() {
                        out.push_str(": ");
                        format_expr(out, ast, interner, field.value, indent, 0);
                    }
                }
                out.push_str(" }");
            }
        }
        ParseExpr::Tuple(elements) => {
            out.push('(');
            for (i, &element) in ast.node_list(elements).iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                format_expr(out, ast, interner, element, indent, 0);
            }
            out.push(')');
        }
        ParseExpr::List(elements) => {
            out.push('[');
            for (i, &element) in ast.node_list(elements).iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                format_expr(out, ast, interner, element, indent, 0);
            }
            out.push(']');
        }
        ParseExpr::Malformed => out.push_str("<malformed>"),
    }
    if wrap {
        out.push(')');
    }
}

/// An `if` branch: atoms stay bare, anything compound is parenthesized so
/// the branch boundary is unambiguous when re-parsed.
fn format_branch(
    out: &mut String,
    ast: &Ast,
    interner: &StringInterner,
    id: NodeId,
    indent: usize,
) {
    let bare = is_atom(ast, id) || matches!(ast.expr(id), ParseExpr::Apply { .. });
    if bare {
        format_expr(out, ast, interner, id, indent, 0);
    } else {
        out.push('(');
        format_expr(out, ast, interner, id, indent, 0);
        out.push(')');
    }
}

fn format_pattern(out: &mut String, ast: &Ast, interner: &StringInterner, id: PatId) {
    match ast.pattern(id) {
        ParsePattern::Ident(name) => out.push_str(interner.lookup(name)),
        ParsePattern::IntLiteral(value) => {
            let _ = write!(out, "{value}");
        }
        ParsePattern::Tag { name, args } => {
            out.push_str(interner.lookup(name));
            if !args.is_empty() {
                out.push('(');
                for (i, &arg) in ast.pat_list(args).iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    format_pattern(out, ast, interner, arg);
                }
                out.push(')');
            }
        }
        ParsePattern::Record { fields } => {
            out.push_str("{ ");
            for (i, field) in ast.pat_field_list(fields).iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(interner.lookup(field.name));
                if field.pattern.is_valid() {
                    out.push_str(": ");
                    format_pattern(out, ast, interner, field.pattern);
                }
            }
            out.push_str(" }");
        }
        ParsePattern::Tuple(elements) => {
            out.push('(');
            for (i, &element) in ast.pat_list(elements).iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                format_pattern(out, ast, interner, element);
            }
            out.push(')');
        }
        ParsePattern::List { elems, rest } => {
            out.push('[');
            for (i, &element) in ast.pat_list(elems).iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                format_pattern(out, ast, interner, element);
            }
            if rest.is_valid() {
                if !elems.is_empty() {
                    out.push_str(", ");
                }
                out.push_str(".. ");
                format_pattern(out, ast, interner, rest);
            }
            out.push(']');
        }
        ParsePattern::Underscore => out.push('_'),
        ParsePattern::As { inner, name } => {
            format_pattern(out, ast, interner, inner);
            let _ = write!(out, " as {}", interner.lookup(name));
        }
        ParsePattern::Alternatives(alternatives) => {
            out.push('(');
            for (i, &alternative) in ast.pat_list(alternatives).iter().enumerate() {
                if i > 0 {
                    out.push_str(" | ");
                }
                format_pattern(out, ast, interner, alternative);
            }
            out.push(')');
        }
        ParsePattern::Malformed => out.push_str("<malformed>"),
    }
}

fn push_indent(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push_str("    ");
    }
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn round_trip(source: &str) {
        let interner = StringInterner::new();
        let first = rill_parse::parse_file(source, &interner);
        assert!(!first.has_errors(), "parse errors: {:?}", first.errors);
        let formatted = format_file(&first.ast, &interner);

        let second = rill_parse::parse_file(&formatted, &interner);
        assert!(
            !second.has_errors(),
            "formatted output failed to re-parse:\n{formatted}\n{:?}",
            second.errors
        );
        let reformatted = format_file(&second.ast, &interner);
        assert_eq!(formatted, reformatted, "formatting is not a fixpoint");
    }

    #[test]
    fn formatting_is_stable_across_reparse() {
        round_trip("1 + 2 * 3");
        round_trip("|x| |y| x + y");
        round_trip("((|x| |y| x + y)(42))(10)");
        round_trip("if outer > 0 (outer + inner) else inner");
        round_trip("x = 5\ny = 10\nouterFunc = |_| {\n    x = 20\n    { z = x + y; z + 1 }\n}\n");
        round_trip("match xs { [first, .. rest] -> first, _ -> 0 }");
        round_trip("{ x: 1, y: \"two\" }");
        round_trip("import Json\nmain = [1, 2, 3]\n");
    }

    #[test]
    fn precedence_parens_are_minimal() {
        let interner = StringInterner::new();
        let parsed = rill_parse::parse_expr("(1 + 2) * 3", &interner);
        let formatted = format_expr_source(&parsed.ast, parsed.root, &interner);
        assert_eq!(formatted, "(1 + 2) * 3\n");

        let parsed = rill_parse::parse_expr("1 + (2 * 3)", &interner);
        let formatted = format_expr_source(&parsed.ast, parsed.root, &interner);
        assert_eq!(formatted, "1 + 2 * 3\n");
    }

    #[test]
    fn already_canonical_source_is_unchanged() {
        let interner = StringInterner::new();
        let source = "x = 5\nx + 1\n";
        let parsed = rill_parse::parse_file(source, &interner);
        assert_eq!(format_file(&parsed.ast, &interner), source);
    }
}
