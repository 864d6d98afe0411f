//! AST → canonical IR lowering.
//!
//! The lowering is a single recursive pass. Every case returns the new
//! canonical node *and* the free-variable set of the subtree — the
//! deduplicated, first-use-ordered set of `PatternIdx` the subtree
//! references but does not bind. Lambdas subtract their parameters from
//! their body's free variables to obtain their capture list; blocks and
//! match branches subtract the patterns they bind.

mod patterns;

#[cfg(test)]
mod tests;

use rustc_hash::FxHashMap;

use rill_diagnostic::{ident_not_in_scope, Diagnostic, ErrorCode};
use rill_ir::ast::{Ast, NodeId, ParseExpr, Stmt, StrSegment, TopLevel};
use rill_ir::can::{
    CanArena, CanBranch, CanDecl, CanExpr, CanField, CanId, CanStmt, CanStrSegment, DeclId,
    DiagIdx, FracPrecision, IntPrecision, PatternIdx,
};
use rill_ir::{Name, Region, StringInterner};

use crate::free_vars::FreeVarSet;
use crate::scope::{Lookup, ScopeStack};
use crate::CanonResult;

/// State for the AST-to-canonical lowering pass.
pub(crate) struct Canonicalizer<'a> {
    /// Source parse tree (read-only).
    ast: &'a Ast,
    /// Interner shared with the rest of the pipeline.
    pub(crate) interner: &'a StringInterner,
    /// Target arena being built.
    pub(crate) arena: CanArena,
    /// Scope frames and function contexts.
    pub(crate) scopes: ScopeStack,
    /// Top-level declarations visible so far; later entries shadow earlier.
    decls: FxHashMap<Name, DeclId>,
    /// Out-of-band diagnostics; `Malformed` nodes hold indices into this.
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl<'a> Canonicalizer<'a> {
    pub(crate) fn new(ast: &'a Ast, interner: &'a StringInterner) -> Self {
        Canonicalizer {
            ast,
            interner,
            arena: CanArena::with_capacity(ast.expr_count()),
            scopes: ScopeStack::new(),
            decls: FxHashMap::default(),
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn finish(self, root: CanId) -> CanonResult {
        tracing::debug!(
            exprs = self.arena.expr_count(),
            patterns = self.arena.pattern_count(),
            diagnostics = self.diagnostics.len(),
            "canonicalization finished"
        );
        CanonResult {
            arena: self.arena,
            root,
            diagnostics: self.diagnostics,
        }
    }

    /// Lower all top-level items; the last bare expression becomes the root.
    ///
    /// Duplicate definitions of one name follow the REPL's shadowing
    /// semantics: the *last* definition wins for every reference, and it
    /// is lowered at the position of the name's first occurrence so
    /// declaration evaluation order still follows first mention.
    pub(crate) fn lower_items(&mut self, items: &[TopLevel]) -> CanId {
        let mut last_def: FxHashMap<Name, usize> = FxHashMap::default();
        for (i, item) in items.iter().enumerate() {
            if let TopLevel::Def { pattern, .. } = *item {
                if let rill_ir::ast::ParsePattern::Ident(name) = self.ast.pattern(pattern) {
                    last_def.insert(name, i);
                }
            }
        }

        let mut seen: rustc_hash::FxHashSet<Name> = rustc_hash::FxHashSet::default();
        let mut root = CanId::INVALID;
        for item in items {
            match *item {
                TopLevel::Def { pattern, value } => {
                    if let rill_ir::ast::ParsePattern::Ident(name) = self.ast.pattern(pattern) {
                        if !seen.insert(name) {
                            continue; // a later definition already won
                        }
                        // Substitute the winning (last) definition.
                        if let Some(&winner) = last_def.get(&name) {
                            if let TopLevel::Def { pattern, value } = items[winner] {
                                self.lower_decl(pattern, value);
                                continue;
                            }
                        }
                    }
                    self.lower_decl(pattern, value);
                }
                TopLevel::Import { .. } => {
                    // Imports are recorded by the session, not the IR:
                    // module linking is out of scope, so nothing resolves
                    // through them.
                }
                TopLevel::Expr(node) => {
                    let (can, free) = self.lower_expr(node);
                    debug_assert!(
                        free.is_empty(),
                        "top-level expression has unbound free variables"
                    );
                    root = can;
                }
            }
        }
        root
    }

    /// Lower one top-level definition into a declaration.
    fn lower_decl(&mut self, pattern: rill_ir::ast::PatId, value: NodeId) {
        let region = self.ast.pattern_region(pattern);
        let rill_ir::ast::ParsePattern::Ident(name) = self.ast.pattern(pattern) else {
            self.diagnostics.push(
                rill_diagnostic::invalid_top_level_statement(
                    "a destructuring definition",
                    region,
                ),
            );
            return;
        };

        let can_pattern = self
            .arena
            .push_pattern(rill_ir::can::CanPattern::Ident(name), region);

        // Register before lowering so the body can reference itself
        // (recursive functions).
        let id = self.arena.push_decl(CanDecl {
            name,
            pattern: can_pattern,
            body: CanId::INVALID,
            region,
        });
        self.decls.insert(name, id);
        let (body, _) = self.lower_expr(value);
        self.arena.set_decl_body(id, body);
    }

    /// The region of a visible top-level declaration with this name.
    pub(crate) fn decl_region(&self, name: Name) -> Option<Region> {
        self.decls.get(&name).map(|&id| self.arena.decl(id).region)
    }

    /// Record a diagnostic and produce the `Malformed` node carrying it.
    pub(crate) fn malformed(&mut self, diag: Diagnostic, region: Region) -> (CanId, FreeVarSet) {
        let idx = DiagIdx::new(u32::try_from(self.diagnostics.len()).unwrap_or(u32::MAX));
        self.diagnostics.push(diag);
        let id = self.arena.push_expr(CanExpr::Malformed(idx), region);
        (id, FreeVarSet::new())
    }

    /// Lower one expression, returning its node and free-variable set.
    pub(crate) fn lower_expr(&mut self, node: NodeId) -> (CanId, FreeVarSet) {
        rill_stack::ensure_sufficient_stack(|| self.lower_expr_inner(node))
    }

    fn lower_expr_inner(&mut self, node: NodeId) -> (CanId, FreeVarSet) {
        let region = self.ast.expr_region(node);
        match self.ast.expr(node) {
            ParseExpr::Int(value) => {
                let id = self.arena.push_expr(
                    CanExpr::Int {
                        value,
                        precision: IntPrecision::I64,
                    },
                    region,
                );
                (id, FreeVarSet::new())
            }
            ParseExpr::Frac(bits) => {
                let id = self.arena.push_expr(
                    CanExpr::Frac {
                        value: bits,
                        precision: FracPrecision::F64,
                    },
                    region,
                );
                (id, FreeVarSet::new())
            }
            ParseExpr::Bool(value) => {
                let id = self.arena.push_expr(CanExpr::Bool(value), region);
                (id, FreeVarSet::new())
            }
            ParseExpr::Str(segments) => {
                let canonical: Vec<CanStrSegment> = self
                    .ast
                    .str_segment_list(segments)
                    .iter()
                    .map(|StrSegment::Literal(text)| CanStrSegment::Literal(*text))
                    .collect();
                let segments = self.arena.push_str_segments(&canonical);
                let id = self.arena.push_expr(CanExpr::Str(segments), region);
                (id, FreeVarSet::new())
            }
            ParseExpr::Ident(name) => self.lower_ident(name, region),
            ParseExpr::Tag { name, payload } => {
                let (args, free) = self.lower_expr_list(self.ast.node_list(payload).to_vec());
                let id = self.arena.push_expr(CanExpr::Tag { name, payload: args }, region);
                (id, free)
            }
            ParseExpr::Lambda { params, body } => self.lower_lambda(params, body, region),
            ParseExpr::Apply { callee, args } => {
                let (can_callee, mut free) = self.lower_expr(callee);
                let (can_args, args_free) = self.lower_expr_list(self.ast.node_list(args).to_vec());
                free.union(args_free);
                let id = self.arena.push_expr(
                    CanExpr::Call {
                        callee: can_callee,
                        args: can_args,
                    },
                    region,
                );
                (id, free)
            }
            ParseExpr::Binop { op, lhs, rhs } => {
                let (can_lhs, mut free) = self.lower_expr(lhs);
                let (can_rhs, rhs_free) = self.lower_expr(rhs);
                free.union(rhs_free);
                let id = self.arena.push_expr(
                    CanExpr::Binop {
                        op,
                        lhs: can_lhs,
                        rhs: can_rhs,
                    },
                    region,
                );
                (id, free)
            }
            ParseExpr::Unary { op, operand } => {
                let (can_operand, free) = self.lower_expr(operand);
                let id = self.arena.push_expr(
                    CanExpr::Unary {
                        op,
                        operand: can_operand,
                    },
                    region,
                );
                (id, free)
            }
            ParseExpr::IfThenElse {
                cond,
                then_branch,
                else_branch,
            } => {
                let (can_cond, mut free) = self.lower_expr(cond);
                let (can_then, then_free) = self.lower_expr(then_branch);
                let (can_else, else_free) = self.lower_expr(else_branch);
                free.union(then_free);
                free.union(else_free);
                let id = self.arena.push_expr(
                    CanExpr::If {
                        cond: can_cond,
                        then_branch: can_then,
                        else_branch: can_else,
                    },
                    region,
                );
                (id, free)
            }
            ParseExpr::Match {
                scrutinee,
                branches,
            } => self.lower_match(scrutinee, branches, region),
            ParseExpr::Block { stmts, tail } => self.lower_block(stmts, tail, region),
            ParseExpr::Record { fields } => self.lower_record(fields, region),
            ParseExpr::Tuple(elements) => {
                let (can_elements, free) =
                    self.lower_expr_list(self.ast.node_list(elements).to_vec());
                let id = self.arena.push_expr(CanExpr::Tuple(can_elements), region);
                (id, free)
            }
            ParseExpr::List(elements) => {
                let (can_elements, free) =
                    self.lower_expr_list(self.ast.node_list(elements).to_vec());
                let id = self.arena.push_expr(CanExpr::List(can_elements), region);
                (id, free)
            }
            ParseExpr::Malformed => {
                let diag = Diagnostic::error(ErrorCode::E5006)
                    .with_message("this expression could not be parsed")
                    .with_region(region);
                self.malformed(diag, region)
            }
        }
    }

    /// Lower an identifier reference.
    ///
    /// Capture recording runs as a side effect of the scope lookup, not of
    /// the free-variable computation.
    fn lower_ident(&mut self, name: Name, region: Region) -> (CanId, FreeVarSet) {
        match self.scopes.lookup(name) {
            Lookup::Resolved { pattern, .. } => {
                let id = self.arena.push_expr(CanExpr::LookupLocal(pattern), region);
                let mut free = FreeVarSet::new();
                free.insert(pattern);
                (id, free)
            }
            Lookup::NotFound => {
                if let Some(&decl) = self.decls.get(&name) {
                    let id = self.arena.push_expr(CanExpr::LookupExternal(decl), region);
                    return (id, FreeVarSet::new());
                }
                let diag = ident_not_in_scope(self.interner.lookup(name), region);
                self.malformed(diag, region)
            }
        }
    }

    /// Lower a lambda: the critical case of the free-variable algorithm.
    fn lower_lambda(
        &mut self,
        params: rill_ir::ast::PatRange,
        body: NodeId,
        region: Region,
    ) -> (CanId, FreeVarSet) {
        // 1. Function context first, so its depth equals the parameter
        //    scope's depth.
        self.scopes.push_function();
        // 2. Fresh scope; parameter patterns populate it.
        self.scopes.push_scope();
        let mut bound = Vec::new();
        let mut can_params = Vec::new();
        for &param in self.ast.pat_list(params) {
            can_params.push(self.lower_pattern(param, &mut bound));
        }
        let params_bound: Vec<PatternIdx> = bound.iter().map(|b| b.pattern).collect();
        self.bind_all(bound);

        // 3. Canonicalize the body.
        let (can_body, mut body_free) = self.lower_expr(body);

        // 4./5. captures = free_vars(body) \ params.
        body_free.subtract(&params_bound);

        // 6. Pop scope and function context; the context accumulated the
        //    same set via the lookup path, in first-use order.
        self.scopes.pop_scope();
        let captures = self.scopes.pop_function();
        debug_assert_eq!(
            captures.len(),
            body_free.len(),
            "capture accumulator and free-variable subtraction disagree"
        );
        debug_assert!(
            captures.iter().all(|c| body_free.contains(c.bound_pattern)),
            "capture accumulator holds a pattern the free-variable set lacks"
        );

        // 7. The captures *are* the lambda expression's own free-variable
        //    set with respect to its enclosing context. Enclosing function
        //    contexts already accumulated them: the lookup path registers
        //    a resolved binding in every context deeper than the binding.
        let free: FreeVarSet = {
            let mut free = FreeVarSet::new();
            for capture in &captures {
                free.insert(capture.bound_pattern);
            }
            free
        };

        let can_params = self.arena.push_pattern_list(&can_params);
        let captures = self.arena.push_captures(&captures);
        let id = self.arena.push_expr(
            CanExpr::Lambda {
                params: can_params,
                body: can_body,
                captures,
            },
            region,
        );
        (id, free)
    }

    fn lower_block(
        &mut self,
        stmts: rill_ir::ast::StmtRange,
        tail: NodeId,
        region: Region,
    ) -> (CanId, FreeVarSet) {
        self.scopes.push_scope();
        let mut free = FreeVarSet::new();
        let mut bound_here: Vec<PatternIdx> = Vec::new();
        let mut can_stmts = Vec::new();

        for stmt in self.ast.stmt_list(stmts).to_vec() {
            match stmt {
                Stmt::Let { pattern, value } => {
                    // RHS first: `x = x` references the outer x.
                    let (can_value, value_free) = self.lower_expr(value);
                    free.union(value_free);
                    let mut bound = Vec::new();
                    let can_pattern = self.lower_pattern(pattern, &mut bound);
                    bound_here.extend(bound.iter().map(|b| b.pattern));
                    self.bind_all(bound);
                    can_stmts.push(CanStmt::Let {
                        pattern: can_pattern,
                        value: can_value,
                    });
                }
                Stmt::Expr(node) => {
                    let (can_node, node_free) = self.lower_expr(node);
                    free.union(node_free);
                    can_stmts.push(CanStmt::Expr(can_node));
                }
            }
        }

        let can_tail = if tail.is_valid() {
            let (can_tail, tail_free) = self.lower_expr(tail);
            free.union(tail_free);
            can_tail
        } else {
            CanId::INVALID
        };

        self.scopes.pop_scope();
        // Variables bound by this block's lets are not free outside it.
        free.subtract(&bound_here);

        let can_stmts = self.arena.push_stmts(&can_stmts);
        let id = self.arena.push_expr(
            CanExpr::Block {
                stmts: can_stmts,
                tail: can_tail,
            },
            region,
        );
        (id, free)
    }

    fn lower_match(
        &mut self,
        scrutinee: NodeId,
        branches: rill_ir::ast::BranchRange,
        region: Region,
    ) -> (CanId, FreeVarSet) {
        let (can_scrutinee, mut free) = self.lower_expr(scrutinee);
        let mut can_branches = Vec::new();

        for branch in self.ast.branch_list(branches).to_vec() {
            self.scopes.push_scope();
            let mut bound = Vec::new();
            let can_patterns = self.lower_branch_patterns(branch.patterns, &mut bound);
            let branch_bound: Vec<PatternIdx> = bound.iter().map(|b| b.pattern).collect();
            self.bind_all(bound);

            let (can_body, mut body_free) = self.lower_expr(branch.body);
            self.scopes.pop_scope();
            body_free.subtract(&branch_bound);
            free.union(body_free);

            can_branches.push(CanBranch {
                patterns: can_patterns,
                body: can_body,
            });
        }

        let can_branches = self.arena.push_branches(&can_branches);
        let id = self.arena.push_expr(
            CanExpr::Match {
                scrutinee: can_scrutinee,
                branches: can_branches,
            },
            region,
        );
        (id, free)
    }

    fn lower_record(
        &mut self,
        fields: rill_ir::ast::FieldRange,
        region: Region,
    ) -> (CanId, FreeVarSet) {
        let mut free = FreeVarSet::new();
        let mut can_fields = Vec::new();
        for field in self.ast.record_field_list(fields).to_vec() {
            let (value, value_free) = if field.value.is_valid() {
                self.lower_expr(field.value)
            } else {
                // Shorthand `{ x }` reads the binding named by the field.
                self.lower_ident(field.name, field.region)
            };
            free.union(value_free);
            can_fields.push(CanField {
                name: field.name,
                value,
            });
        }
        let can_fields = self.arena.push_fields(&can_fields);
        let id = self.arena.push_expr(CanExpr::Record { fields: can_fields }, region);
        (id, free)
    }

    /// Lower a list of child expressions, unioning their free variables.
    fn lower_expr_list(
        &mut self,
        nodes: Vec<NodeId>,
    ) -> (rill_ir::can::CanRange, FreeVarSet) {
        let mut free = FreeVarSet::new();
        let mut can_nodes = Vec::with_capacity(nodes.len());
        for node in nodes {
            let (can_node, node_free) = self.lower_expr(node);
            free.union(node_free);
            can_nodes.push(can_node);
        }
        (self.arena.push_expr_list(&can_nodes), free)
    }
}
