//! Constraint generation and unification.

use rill_diagnostic::{Diagnostic, ErrorCode};
use rill_ir::ast::BinOp;
use rill_ir::can::{
    CanArena, CanExpr, CanId, CanPattern, CanStmt, DeclId, FracPrecision, IntPrecision, PatternIdx,
};
use rill_ir::{Region, StringInterner};

use crate::pool::{Pool, Type, TypeIdx};
use crate::type_string;

/// Output of [`solve`]: the pool plus parallel annotation tables.
///
/// The canonical arena itself is never mutated; annotations are looked up
/// by raw index (`CanId`, `PatternIdx`, `DeclId`).
#[derive(Debug)]
pub struct TypeCheckResult {
    pub pool: Pool,
    expr_types: Vec<TypeIdx>,
    pattern_types: Vec<TypeIdx>,
    decl_types: Vec<TypeIdx>,
    pub diagnostics: Vec<Diagnostic>,
}

impl TypeCheckResult {
    /// Solved type of an expression.
    pub fn expr_type(&self, id: CanId) -> TypeIdx {
        self.expr_types
            .get(id.index())
            .copied()
            .unwrap_or(TypeIdx::INVALID)
    }

    /// Solved type of a pattern binding.
    pub fn pattern_type(&self, idx: PatternIdx) -> TypeIdx {
        self.pattern_types
            .get(idx.index())
            .copied()
            .unwrap_or(TypeIdx::INVALID)
    }

    /// Solved type of a top-level declaration.
    pub fn decl_type(&self, id: DeclId) -> TypeIdx {
        self.decl_types
            .get(id.index())
            .copied()
            .unwrap_or(TypeIdx::INVALID)
    }

    /// Whether solving reported any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_error())
    }
}

/// Solve types for a canonicalized program.
///
/// Declarations are solved in order (each pre-assigned a variable so
/// recursive bodies can reference themselves), then the root expression.
/// A final defaulting pass resolves unconstrained variables to `I64`.
pub fn solve(arena: &CanArena, root: CanId, interner: &StringInterner) -> TypeCheckResult {
    let mut solver = Solver {
        arena,
        interner,
        pool: Pool::new(),
        expr_types: vec![TypeIdx::INVALID; arena.expr_count()],
        pattern_types: vec![TypeIdx::INVALID; arena.pattern_count()],
        decl_types: Vec::new(),
        diagnostics: Vec::new(),
    };

    // Pre-assign declaration variables, then solve bodies in order.
    for _ in arena.decls() {
        let var = solver.pool.fresh_var();
        solver.decl_types.push(var);
    }
    for (i, decl) in arena.decls().iter().enumerate() {
        if decl.body.is_valid() {
            let body_ty = solver.infer_expr(decl.body);
            let decl_ty = solver.decl_types[i];
            solver.unify(decl_ty, body_ty, decl.region);
            let pattern_ty = solver.pattern_ty(decl.pattern);
            solver.unify(pattern_ty, decl_ty, decl.region);
        }
    }

    if root.is_valid() {
        let _ = solver.infer_expr(root);
    }

    solver.default_unbound();
    tracing::debug!(types = solver.pool.len(), "type solving finished");

    TypeCheckResult {
        pool: solver.pool,
        expr_types: solver.expr_types,
        pattern_types: solver.pattern_types,
        decl_types: solver.decl_types,
        diagnostics: solver.diagnostics,
    }
}

struct Solver<'a> {
    arena: &'a CanArena,
    interner: &'a StringInterner,
    pool: Pool,
    expr_types: Vec<TypeIdx>,
    pattern_types: Vec<TypeIdx>,
    decl_types: Vec<TypeIdx>,
    diagnostics: Vec<Diagnostic>,
}

impl Solver<'_> {
    fn infer_expr(&mut self, id: CanId) -> TypeIdx {
        let region = self.arena.expr_region(id);
        let ty = match self.arena.expr(id) {
            CanExpr::Int { precision, .. } => self.pool.push(Type::Int(precision)),
            CanExpr::Frac { precision, .. } => self.pool.push(Type::Frac(precision)),
            CanExpr::Bool(_) => self.pool.push(Type::Bool),
            CanExpr::Str(_) => self.pool.push(Type::Str),
            CanExpr::LookupLocal(p) => self.pattern_ty(p),
            CanExpr::LookupExternal(d) => self.decl_types[d.index()],
            CanExpr::Lambda { params, body, .. } => {
                let param_tys: Vec<TypeIdx> = self
                    .arena
                    .pattern_list(params)
                    .to_vec()
                    .into_iter()
                    .map(|p| self.pattern_ty(p))
                    .collect();
                let ret = self.infer_expr(body);
                self.pool.push(Type::Func {
                    params: param_tys,
                    ret,
                    lambda: id,
                })
            }
            CanExpr::Call { callee, args } => {
                let callee_ty = self.infer_expr(callee);
                let arg_tys: Vec<TypeIdx> = self
                    .arena
                    .expr_list(args)
                    .to_vec()
                    .into_iter()
                    .map(|arg| self.infer_expr(arg))
                    .collect();
                let ret = self.pool.fresh_var();
                let expected = self.pool.push(Type::Func {
                    params: arg_tys,
                    ret,
                    lambda: CanId::INVALID,
                });
                self.unify(callee_ty, expected, region);
                ret
            }
            CanExpr::Binop { op, lhs, rhs } => self.infer_binop(op, lhs, rhs, region),
            CanExpr::Unary { op, operand } => {
                let operand_ty = self.infer_expr(operand);
                match op {
                    rill_ir::ast::UnaryOp::Neg => operand_ty,
                    rill_ir::ast::UnaryOp::Not => {
                        let bool_ty = self.pool.push(Type::Bool);
                        self.unify(operand_ty, bool_ty, region);
                        bool_ty
                    }
                }
            }
            CanExpr::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_ty = self.infer_expr(cond);
                let bool_ty = self.pool.push(Type::Bool);
                self.unify(cond_ty, bool_ty, self.arena.expr_region(cond));
                let then_ty = self.infer_expr(then_branch);
                let else_ty = self.infer_expr(else_branch);
                self.unify(then_ty, else_ty, region);
                then_ty
            }
            CanExpr::Block { stmts, tail } => {
                for stmt in self.arena.stmt_list(stmts).to_vec() {
                    match stmt {
                        CanStmt::Let { pattern, value } => {
                            let value_ty = self.infer_expr(value);
                            let pattern_ty = self.pattern_ty(pattern);
                            self.unify(pattern_ty, value_ty, self.arena.expr_region(value));
                        }
                        CanStmt::Expr(e) => {
                            let _ = self.infer_expr(e);
                        }
                    }
                }
                if tail.is_valid() {
                    self.infer_expr(tail)
                } else {
                    self.pool.push(Type::Record(Vec::new()))
                }
            }
            CanExpr::Record { fields } => {
                let mut field_tys = Vec::new();
                for field in self.arena.field_list(fields).to_vec() {
                    let ty = self.infer_expr(field.value);
                    field_tys.push((field.name, ty));
                }
                self.pool.push(Type::Record(field_tys))
            }
            CanExpr::Tuple(elements) => {
                let tys: Vec<TypeIdx> = self
                    .arena
                    .expr_list(elements)
                    .to_vec()
                    .into_iter()
                    .map(|e| self.infer_expr(e))
                    .collect();
                self.pool.push(Type::Tuple(tys))
            }
            CanExpr::List(elements) => {
                let element_ty = self.pool.fresh_var();
                for element in self.arena.expr_list(elements).to_vec() {
                    let ty = self.infer_expr(element);
                    self.unify(element_ty, ty, self.arena.expr_region(element));
                }
                self.pool.push(Type::List(element_ty))
            }
            CanExpr::Tag { name, payload } => {
                let payload_tys: Vec<TypeIdx> = self
                    .arena
                    .expr_list(payload)
                    .to_vec()
                    .into_iter()
                    .map(|e| self.infer_expr(e))
                    .collect();
                self.pool.push(Type::TagUnion(vec![(name, payload_tys)]))
            }
            CanExpr::Match {
                scrutinee,
                branches,
            } => {
                let scrutinee_ty = self.infer_expr(scrutinee);
                let result_ty = self.pool.fresh_var();
                for branch in self.arena.branch_list(branches).to_vec() {
                    for p in self.arena.pattern_list(branch.patterns).to_vec() {
                        let pattern_ty = self.pattern_ty(p);
                        self.unify(scrutinee_ty, pattern_ty, self.arena.pattern_region(p));
                    }
                    let body_ty = self.infer_expr(branch.body);
                    self.unify(result_ty, body_ty, self.arena.expr_region(branch.body));
                }
                result_ty
            }
            CanExpr::Malformed(_) => self.pool.push(Type::Error),
        };
        self.expr_types[id.index()] = ty;
        ty
    }

    fn infer_binop(&mut self, op: BinOp, lhs: CanId, rhs: CanId, region: Region) -> TypeIdx {
        let lhs_ty = self.infer_expr(lhs);
        let rhs_ty = self.infer_expr(rhs);
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul => {
                self.unify(lhs_ty, rhs_ty, region);
                lhs_ty
            }
            BinOp::Div => {
                let frac = self.pool.push(Type::Frac(FracPrecision::F64));
                self.unify(lhs_ty, frac, region);
                self.unify(rhs_ty, frac, region);
                frac
            }
            BinOp::DivTrunc | BinOp::Rem => {
                let int = self.pool.push(Type::Int(IntPrecision::I64));
                self.unify(lhs_ty, int, region);
                self.unify(rhs_ty, int, region);
                int
            }
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                self.unify(lhs_ty, rhs_ty, region);
                self.pool.push(Type::Bool)
            }
            BinOp::And | BinOp::Or => {
                let bool_ty = self.pool.push(Type::Bool);
                self.unify(lhs_ty, bool_ty, region);
                self.unify(rhs_ty, bool_ty, region);
                bool_ty
            }
        }
    }

    /// The (memoized) type of a pattern, constructed on first request.
    fn pattern_ty(&mut self, idx: PatternIdx) -> TypeIdx {
        let existing = self.pattern_types[idx.index()];
        if existing.is_valid() {
            return existing;
        }
        let ty = match self.arena.pattern(idx) {
            CanPattern::Ident(_) | CanPattern::Underscore => self.pool.fresh_var(),
            CanPattern::IntLiteral(_) => self.pool.push(Type::Int(IntPrecision::I64)),
            CanPattern::Tag { name, args } => {
                let arg_tys: Vec<TypeIdx> = self
                    .arena
                    .pattern_list(args)
                    .to_vec()
                    .into_iter()
                    .map(|p| self.pattern_ty(p))
                    .collect();
                self.pool.push(Type::TagUnion(vec![(name, arg_tys)]))
            }
            CanPattern::Record { fields } => {
                let mut field_tys = Vec::new();
                for field in self.arena.pat_field_list(fields).to_vec() {
                    let ty = self.pattern_ty(field.pattern);
                    field_tys.push((field.name, ty));
                }
                self.pool.push(Type::Record(field_tys))
            }
            CanPattern::Tuple(elements) => {
                let tys: Vec<TypeIdx> = self
                    .arena
                    .pattern_list(elements)
                    .to_vec()
                    .into_iter()
                    .map(|p| self.pattern_ty(p))
                    .collect();
                self.pool.push(Type::Tuple(tys))
            }
            CanPattern::List { elems, rest } => {
                let element_ty = self.pool.fresh_var();
                for p in self.arena.pattern_list(elems).to_vec() {
                    let ty = self.pattern_ty(p);
                    let region = self.arena.pattern_region(p);
                    self.unify(element_ty, ty, region);
                }
                let list_ty = self.pool.push(Type::List(element_ty));
                if rest.is_valid() {
                    // The rest binding is itself a list of the same element.
                    let rest_ty = self.pattern_ty(rest);
                    let region = self.arena.pattern_region(rest);
                    self.unify(rest_ty, list_ty, region);
                }
                list_ty
            }
            CanPattern::As { inner, .. } => self.pattern_ty(inner),
            CanPattern::Alternatives(alternatives) => {
                let ty = self.pool.fresh_var();
                for p in self.arena.pattern_list(alternatives).to_vec() {
                    let alt_ty = self.pattern_ty(p);
                    let region = self.arena.pattern_region(p);
                    self.unify(ty, alt_ty, region);
                }
                ty
            }
            CanPattern::Malformed(_) => self.pool.push(Type::Error),
        };
        self.pattern_types[idx.index()] = ty;
        ty
    }

    /// Unify two types; on mismatch, report and continue.
    fn unify(&mut self, a: TypeIdx, b: TypeIdx, region: Region) -> bool {
        let ra = self.pool.resolve(a);
        let rb = self.pool.resolve(b);
        if ra == rb {
            return true;
        }
        let ta = self.pool.get(ra).clone();
        let tb = self.pool.get(rb).clone();
        match (ta, tb) {
            (Type::Var, _) => {
                if self.occurs(ra, rb) {
                    return self.mismatch(ra, rb, region);
                }
                self.pool.bind(ra, rb);
                true
            }
            (_, Type::Var) => {
                if self.occurs(rb, ra) {
                    return self.mismatch(ra, rb, region);
                }
                self.pool.bind(rb, ra);
                true
            }
            (Type::Error, _) | (_, Type::Error) => true,
            (Type::Int(p), Type::Int(q)) if p == q => true,
            (Type::Frac(p), Type::Frac(q)) if p == q => true,
            (Type::Bool, Type::Bool) | (Type::Str, Type::Str) => true,
            (Type::Record(fa), Type::Record(fb)) => {
                if fa.len() != fb.len() {
                    return self.mismatch(ra, rb, region);
                }
                // Order-insensitive: match fields by name; the left
                // type's field order becomes canonical.
                let mut ok = true;
                for (name, ty_a) in &fa {
                    match fb.iter().find(|(n, _)| n == name) {
                        Some((_, ty_b)) => ok &= self.unify(*ty_a, *ty_b, region),
                        None => return self.mismatch(ra, rb, region),
                    }
                }
                self.pool.set(rb, Type::Link(ra));
                ok
            }
            (Type::Tuple(ea), Type::Tuple(eb)) => {
                if ea.len() != eb.len() {
                    return self.mismatch(ra, rb, region);
                }
                let mut ok = true;
                for (ty_a, ty_b) in ea.iter().zip(&eb) {
                    ok &= self.unify(*ty_a, *ty_b, region);
                }
                ok
            }
            (Type::List(ea), Type::List(eb)) => self.unify(ea, eb, region),
            (Type::TagUnion(va), Type::TagUnion(vb)) => {
                // Merge the unions: shared variants unify payload-wise,
                // distinct variants accumulate.
                let mut merged = va.clone();
                let mut ok = true;
                for (name, payload_b) in vb {
                    match merged.iter().find(|(n, _)| *n == name) {
                        Some((_, payload_a)) => {
                            if payload_a.len() != payload_b.len() {
                                return self.mismatch(ra, rb, region);
                            }
                            let payload_a = payload_a.clone();
                            for (ty_a, ty_b) in payload_a.iter().zip(&payload_b) {
                                ok &= self.unify(*ty_a, *ty_b, region);
                            }
                        }
                        None => merged.push((name, payload_b)),
                    }
                }
                // Alphabetical variant order keeps renderings (and layouts)
                // independent of interning order.
                merged.sort_by_key(|(name, _)| self.interner.lookup(*name));
                self.pool.set(ra, Type::TagUnion(merged));
                self.pool.set(rb, Type::Link(ra));
                ok
            }
            (
                Type::Func {
                    params: pa,
                    ret: reta,
                    lambda: la,
                },
                Type::Func {
                    params: pb,
                    ret: retb,
                    lambda: lb,
                },
            ) => {
                if pa.len() != pb.len() {
                    return self.mismatch(ra, rb, region);
                }
                if la.is_valid() && lb.is_valid() && la != lb {
                    // Two distinct lambdas cannot share a closure layout.
                    return self.mismatch(ra, rb, region);
                }
                let mut ok = true;
                for (ty_a, ty_b) in pa.iter().zip(&pb) {
                    ok &= self.unify(*ty_a, *ty_b, region);
                }
                ok &= self.unify(reta, retb, region);
                // Keep the side that knows its lambda.
                if la.is_valid() {
                    self.pool.set(rb, Type::Link(ra));
                } else {
                    self.pool.set(ra, Type::Link(rb));
                }
                ok
            }
            _ => self.mismatch(ra, rb, region),
        }
    }

    /// Occurs check: does `var` appear inside `ty`?
    fn occurs(&self, var: TypeIdx, ty: TypeIdx) -> bool {
        let root = self.pool.resolve(ty);
        if root == var {
            return true;
        }
        match self.pool.get(root) {
            Type::Record(fields) => fields.iter().any(|(_, t)| self.occurs(var, *t)),
            Type::Tuple(elements) => elements.iter().any(|t| self.occurs(var, *t)),
            Type::List(element) => self.occurs(var, *element),
            Type::TagUnion(variants) => variants
                .iter()
                .any(|(_, payload)| payload.iter().any(|t| self.occurs(var, *t))),
            Type::Func { params, ret, .. } => {
                params.iter().any(|t| self.occurs(var, *t)) || self.occurs(var, *ret)
            }
            _ => false,
        }
    }

    fn mismatch(&mut self, a: TypeIdx, b: TypeIdx, region: Region) -> bool {
        let expected = type_string(&self.pool, a, self.interner);
        let found = type_string(&self.pool, b, self.interner);
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E4001)
                .with_message(format!("type mismatch: `{expected}` vs `{found}`"))
                .with_region(region),
        );
        false
    }

    /// Default every still-unbound variable to `I64`.
    fn default_unbound(&mut self) {
        for i in 0..self.pool.len() {
            let idx = TypeIdx::new(u32::try_from(i).unwrap_or(u32::MAX));
            if matches!(self.pool.get(idx), Type::Var) {
                self.pool.set(idx, Type::Int(IntPrecision::I64));
            }
        }
    }
}
