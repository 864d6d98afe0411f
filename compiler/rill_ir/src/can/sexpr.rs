//! S-expression rendering of the canonical IR.
//!
//! The `CANONICALIZE` snapshot section is the byte-exact output of this
//! renderer. The format is deterministic: node order follows arena
//! traversal from the rendered root, pattern identities print as `p<idx>`,
//! and capture lists always print (as `(captures)` when empty) so lambda
//! capture sets are visible in every snapshot.

use std::fmt::Write as _;

use crate::{Name, StringInterner};

use super::expr::{CanExpr, CanStmt, CanStrSegment};
use super::pattern::CanPattern;
use super::{CanArena, CanId, PatternIdx};

/// Renders canonical IR to S-expression text.
pub struct SexprRenderer<'a> {
    arena: &'a CanArena,
    interner: &'a StringInterner,
    out: String,
}

impl<'a> SexprRenderer<'a> {
    /// Create a renderer over an arena.
    pub fn new(arena: &'a CanArena, interner: &'a StringInterner) -> Self {
        SexprRenderer {
            arena,
            interner,
            out: String::new(),
        }
    }

    /// Render all declarations followed by the root expression.
    pub fn render_program(mut self, root: CanId) -> String {
        for (i, decl) in self.arena.decls().iter().enumerate() {
            if i > 0 {
                self.out.push('\n');
            }
            self.out.push_str("(decl ");
            self.push_name(decl.name);
            self.out.push(' ');
            self.push_pattern_ref(decl.pattern);
            self.newline(1);
            self.render_expr(decl.body, 1);
            self.out.push(')');
        }
        if root.is_valid() {
            if !self.arena.decls().is_empty() {
                self.out.push('\n');
            }
            self.render_expr(root, 0);
        }
        self.out.push('\n');
        self.out
    }

    /// Render a single expression (test entry point).
    pub fn render(mut self, root: CanId) -> String {
        self.render_expr(root, 0);
        self.out
    }

    fn newline(&mut self, indent: usize) {
        self.out.push('\n');
        for _ in 0..indent {
            self.out.push_str("  ");
        }
    }

    fn push_name(&mut self, name: Name) {
        let _ = write!(self.out, "\"{}\"", self.interner.lookup(name));
    }

    fn push_pattern_ref(&mut self, idx: PatternIdx) {
        let _ = write!(self.out, "p{}", idx.raw());
    }

    fn render_expr(&mut self, id: CanId, indent: usize) {
        match self.arena.expr(id) {
            CanExpr::Int { value, precision } => {
                let _ = write!(self.out, "(int {value} {})", precision.type_name());
            }
            CanExpr::Frac { value, precision } => {
                let _ = write!(
                    self.out,
                    "(frac {} {})",
                    f64::from_bits(value),
                    precision.type_name()
                );
            }
            CanExpr::Bool(b) => {
                let _ = write!(self.out, "(bool {b})");
            }
            CanExpr::Str(segments) => {
                self.out.push_str("(str");
                for segment in self.arena.str_segment_list(segments) {
                    let CanStrSegment::Literal(text) = segment;
                    self.out.push(' ');
                    self.push_name(*text);
                }
                self.out.push(')');
            }
            CanExpr::LookupLocal(p) => {
                self.out.push_str("(lookup-local ");
                self.push_pattern_ref(p);
                self.out.push(')');
            }
            CanExpr::LookupExternal(d) => {
                let decl = self.arena.decl(d);
                self.out.push_str("(lookup-external ");
                self.push_name(decl.name);
                let _ = write!(self.out, " d{})", d.raw());
            }
            CanExpr::Lambda {
                params,
                body,
                captures,
            } => {
                self.out.push_str("(lambda");
                self.newline(indent + 1);
                self.out.push_str("(params");
                for &p in self.arena.pattern_list(params) {
                    self.out.push(' ');
                    self.render_pattern(p);
                }
                self.out.push(')');
                self.newline(indent + 1);
                self.out.push_str("(captures");
                for capture in self.arena.capture_list(captures) {
                    self.out.push_str(" (capture ");
                    self.push_name(capture.name);
                    self.out.push(' ');
                    self.push_pattern_ref(capture.bound_pattern);
                    let _ = write!(self.out, " depth={})", capture.scope_depth);
                }
                self.out.push(')');
                self.newline(indent + 1);
                self.render_expr(body, indent + 1);
                self.out.push(')');
            }
            CanExpr::Call { callee, args } => {
                self.out.push_str("(call");
                self.newline(indent + 1);
                self.render_expr(callee, indent + 1);
                for &arg in self.arena.expr_list(args) {
                    self.newline(indent + 1);
                    self.render_expr(arg, indent + 1);
                }
                self.out.push(')');
            }
            CanExpr::Binop { op, lhs, rhs } => {
                let _ = write!(self.out, "(binop \"{}\"", op.symbol());
                self.newline(indent + 1);
                self.render_expr(lhs, indent + 1);
                self.newline(indent + 1);
                self.render_expr(rhs, indent + 1);
                self.out.push(')');
            }
            CanExpr::Unary { op, operand } => {
                let _ = write!(self.out, "(unary \"{}\" ", op.symbol());
                self.render_expr(operand, indent);
                self.out.push(')');
            }
            CanExpr::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.out.push_str("(if");
                self.newline(indent + 1);
                self.render_expr(cond, indent + 1);
                self.newline(indent + 1);
                self.render_expr(then_branch, indent + 1);
                self.newline(indent + 1);
                self.render_expr(else_branch, indent + 1);
                self.out.push(')');
            }
            CanExpr::Block { stmts, tail } => {
                self.out.push_str("(block");
                for stmt in self.arena.stmt_list(stmts) {
                    self.newline(indent + 1);
                    match *stmt {
                        CanStmt::Let { pattern, value } => {
                            self.out.push_str("(let ");
                            self.render_pattern(pattern);
                            self.newline(indent + 2);
                            self.render_expr(value, indent + 2);
                            self.out.push(')');
                        }
                        CanStmt::Expr(e) => self.render_expr(e, indent + 1),
                    }
                }
                if tail.is_valid() {
                    self.newline(indent + 1);
                    self.render_expr(tail, indent + 1);
                }
                self.out.push(')');
            }
            CanExpr::Record { fields } => {
                self.out.push_str("(record");
                for field in self.arena.field_list(fields) {
                    self.newline(indent + 1);
                    self.out.push_str("(field ");
                    self.push_name(field.name);
                    self.out.push(' ');
                    self.render_expr(field.value, indent + 1);
                    self.out.push(')');
                }
                self.out.push(')');
            }
            CanExpr::Tuple(elements) => {
                self.out.push_str("(tuple");
                for &element in self.arena.expr_list(elements) {
                    self.newline(indent + 1);
                    self.render_expr(element, indent + 1);
                }
                self.out.push(')');
            }
            CanExpr::List(elements) => {
                self.out.push_str("(list");
                for &element in self.arena.expr_list(elements) {
                    self.newline(indent + 1);
                    self.render_expr(element, indent + 1);
                }
                self.out.push(')');
            }
            CanExpr::Tag { name, payload } => {
                self.out.push_str("(tag ");
                self.push_name(name);
                for &arg in self.arena.expr_list(payload) {
                    self.newline(indent + 1);
                    self.render_expr(arg, indent + 1);
                }
                self.out.push(')');
            }
            CanExpr::Match {
                scrutinee,
                branches,
            } => {
                self.out.push_str("(match");
                self.newline(indent + 1);
                self.render_expr(scrutinee, indent + 1);
                for branch in self.arena.branch_list(branches) {
                    self.newline(indent + 1);
                    self.out.push_str("(branch");
                    for &p in self.arena.pattern_list(branch.patterns) {
                        self.out.push(' ');
                        self.render_pattern(p);
                    }
                    self.newline(indent + 2);
                    self.render_expr(branch.body, indent + 2);
                    self.out.push(')');
                }
                self.out.push(')');
            }
            CanExpr::Malformed(diag) => {
                let _ = write!(self.out, "(malformed diag{})", diag.raw());
            }
        }
    }

    fn render_pattern(&mut self, idx: PatternIdx) {
        match self.arena.pattern(idx) {
            CanPattern::Ident(name) => {
                self.out.push_str("(p-ident ");
                self.push_name(name);
                self.out.push(' ');
                self.push_pattern_ref(idx);
                self.out.push(')');
            }
            CanPattern::IntLiteral(value) => {
                let _ = write!(self.out, "(p-int {value})");
            }
            CanPattern::Tag { name, args } => {
                self.out.push_str("(p-tag ");
                self.push_name(name);
                for &arg in self.arena.pattern_list(args) {
                    self.out.push(' ');
                    self.render_pattern(arg);
                }
                self.out.push(')');
            }
            CanPattern::Record { fields } => {
                self.out.push_str("(p-record");
                for field in self.arena.pat_field_list(fields) {
                    self.out.push_str(" (p-field ");
                    self.push_name(field.name);
                    self.out.push(' ');
                    self.render_pattern(field.pattern);
                    self.out.push(')');
                }
                self.out.push(')');
            }
            CanPattern::Tuple(elements) => {
                self.out.push_str("(p-tuple");
                for &element in self.arena.pattern_list(elements) {
                    self.out.push(' ');
                    self.render_pattern(element);
                }
                self.out.push(')');
            }
            CanPattern::List { elems, rest } => {
                self.out.push_str("(p-list");
                for &element in self.arena.pattern_list(elems) {
                    self.out.push(' ');
                    self.render_pattern(element);
                }
                if rest.is_valid() {
                    self.out.push_str(" (p-rest ");
                    self.render_pattern(rest);
                    self.out.push(')');
                }
                self.out.push(')');
            }
            CanPattern::Underscore => self.out.push_str("(p-underscore)"),
            CanPattern::As { inner, name } => {
                self.out.push_str("(p-as ");
                self.render_pattern(inner);
                self.out.push(' ');
                self.push_name(name);
                self.out.push(' ');
                self.push_pattern_ref(idx);
                self.out.push(')');
            }
            CanPattern::Alternatives(alternatives) => {
                self.out.push_str("(p-alternatives");
                for &alternative in self.arena.pattern_list(alternatives) {
                    self.out.push(' ');
                    self.render_pattern(alternative);
                }
                self.out.push(')');
            }
            CanPattern::Malformed(diag) => {
                let _ = write!(self.out, "(p-malformed diag{})", diag.raw());
            }
        }
    }
}
