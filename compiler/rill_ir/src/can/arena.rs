//! Canonical IR arena.

use crate::arena::{to_u16, to_u32};
use crate::Region;

use super::expr::{CanBranch, CanDecl, CanExpr, CanField, CanStmt, CanStrSegment, CaptureVar};
use super::pattern::{CanPatField, CanPattern};
use super::{
    CanBranchRange, CanFieldRange, CanId, CanPatFieldRange, CanRange, CanSegRange, CanStmtRange,
    CaptureRange, DeclId, PatternIdx, PatternRange,
};

/// Arena for canonical expressions, patterns, and declarations.
///
/// Struct-of-arrays layout: expression kinds and regions are parallel
/// vectors indexed by [`CanId`]; pattern kinds and regions by
/// [`PatternIdx`]. Variable-length children (argument lists, capture
/// lists, block statements, record fields) live in flat side lists
/// addressed by `{start, len}` ranges.
///
/// All operations are read-only after canonicalization completes.
#[derive(Clone, Debug, Default)]
pub struct CanArena {
    exprs: Vec<CanExpr>,
    expr_regions: Vec<Region>,
    patterns: Vec<CanPattern>,
    pattern_regions: Vec<Region>,
    decls: Vec<CanDecl>,
    expr_lists: Vec<CanId>,
    pattern_lists: Vec<PatternIdx>,
    captures: Vec<CaptureVar>,
    stmts: Vec<CanStmt>,
    branches: Vec<CanBranch>,
    fields: Vec<CanField>,
    pat_fields: Vec<CanPatField>,
    str_segments: Vec<CanStrSegment>,
}

impl CanArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an arena pre-allocated from the source expression count.
    ///
    /// Canonicalization allocates roughly one node per parse node.
    pub fn with_capacity(expr_count: usize) -> Self {
        CanArena {
            exprs: Vec::with_capacity(expr_count),
            expr_regions: Vec::with_capacity(expr_count),
            ..Self::default()
        }
    }

    /// Allocate a canonical expression node.
    pub fn push_expr(&mut self, kind: CanExpr, region: Region) -> CanId {
        let id = CanId::new(to_u32(self.exprs.len(), "canonical expression"));
        self.exprs.push(kind);
        self.expr_regions.push(region);
        id
    }

    /// Allocate a canonical pattern node.
    pub fn push_pattern(&mut self, kind: CanPattern, region: Region) -> PatternIdx {
        let id = PatternIdx::new(to_u32(self.patterns.len(), "canonical pattern"));
        self.patterns.push(kind);
        self.pattern_regions.push(region);
        id
    }

    /// Replace a pattern node in place.
    ///
    /// Used by the canonicalizer when a pattern's sub-structure is only
    /// known after its index has been reserved (e.g. `As` inner patterns).
    pub fn set_pattern(&mut self, idx: PatternIdx, kind: CanPattern) {
        self.patterns[idx.index()] = kind;
    }

    /// Record a top-level declaration.
    pub fn push_decl(&mut self, decl: CanDecl) -> DeclId {
        let id = DeclId::new(to_u32(self.decls.len(), "declaration"));
        self.decls.push(decl);
        id
    }

    /// Patch a declaration's body.
    ///
    /// Recursive declarations are registered before their body is lowered
    /// (so the body can reference them) and patched here afterwards.
    pub fn set_decl_body(&mut self, id: DeclId, body: CanId) {
        self.decls[id.index()].body = body;
    }

    /// Get an expression kind.
    #[inline]
    pub fn expr(&self, id: CanId) -> CanExpr {
        self.exprs[id.index()]
    }

    /// Get an expression's region.
    #[inline]
    pub fn expr_region(&self, id: CanId) -> Region {
        self.expr_regions[id.index()]
    }

    /// Get a pattern kind.
    #[inline]
    pub fn pattern(&self, idx: PatternIdx) -> CanPattern {
        self.patterns[idx.index()]
    }

    /// Get a pattern's region.
    #[inline]
    pub fn pattern_region(&self, idx: PatternIdx) -> Region {
        self.pattern_regions[idx.index()]
    }

    /// Get a declaration.
    #[inline]
    pub fn decl(&self, id: DeclId) -> CanDecl {
        self.decls[id.index()]
    }

    /// All declarations in source order.
    pub fn decls(&self) -> &[CanDecl] {
        &self.decls
    }

    /// Number of allocated expression nodes.
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    /// Iterate all expression nodes with their IDs, in allocation order.
    pub fn expr_iter(&self) -> impl Iterator<Item = (CanId, CanExpr)> + '_ {
        self.exprs
            .iter()
            .enumerate()
            .map(|(i, &kind)| (CanId::new(to_u32(i, "canonical expression")), kind))
    }

    /// Number of allocated pattern nodes.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Allocate a contiguous expression ID list.
    pub fn push_expr_list(&mut self, ids: &[CanId]) -> CanRange {
        if ids.is_empty() {
            return CanRange::EMPTY;
        }
        let start = to_u32(self.expr_lists.len(), "expression list");
        self.expr_lists.extend_from_slice(ids);
        CanRange::new(start, to_u16(ids.len(), "expression"))
    }

    /// Get expression IDs from a range.
    pub fn expr_list(&self, range: CanRange) -> &[CanId] {
        &self.expr_lists[range.start as usize..range.start as usize + range.len()]
    }

    /// Allocate a contiguous pattern ID list.
    pub fn push_pattern_list(&mut self, ids: &[PatternIdx]) -> PatternRange {
        if ids.is_empty() {
            return PatternRange::EMPTY;
        }
        let start = to_u32(self.pattern_lists.len(), "pattern list");
        self.pattern_lists.extend_from_slice(ids);
        PatternRange::new(start, to_u16(ids.len(), "pattern"))
    }

    /// Get pattern IDs from a range.
    pub fn pattern_list(&self, range: PatternRange) -> &[PatternIdx] {
        &self.pattern_lists[range.start as usize..range.start as usize + range.len()]
    }

    /// Allocate a lambda's capture list.
    pub fn push_captures(&mut self, captures: &[CaptureVar]) -> CaptureRange {
        if captures.is_empty() {
            return CaptureRange::EMPTY;
        }
        let start = to_u32(self.captures.len(), "capture list");
        self.captures.extend_from_slice(captures);
        CaptureRange::new(start, to_u16(captures.len(), "capture"))
    }

    /// Get a lambda's captures.
    pub fn capture_list(&self, range: CaptureRange) -> &[CaptureVar] {
        &self.captures[range.start as usize..range.start as usize + range.len()]
    }

    /// Allocate a contiguous statement list.
    pub fn push_stmts(&mut self, stmts: &[CanStmt]) -> CanStmtRange {
        if stmts.is_empty() {
            return CanStmtRange::EMPTY;
        }
        let start = to_u32(self.stmts.len(), "statement list");
        self.stmts.extend_from_slice(stmts);
        CanStmtRange::new(start, to_u16(stmts.len(), "statement"))
    }

    /// Get statements from a range.
    pub fn stmt_list(&self, range: CanStmtRange) -> &[CanStmt] {
        &self.stmts[range.start as usize..range.start as usize + range.len()]
    }

    /// Allocate a contiguous branch list.
    pub fn push_branches(&mut self, branches: &[CanBranch]) -> CanBranchRange {
        if branches.is_empty() {
            return CanBranchRange::EMPTY;
        }
        let start = to_u32(self.branches.len(), "branch list");
        self.branches.extend_from_slice(branches);
        CanBranchRange::new(start, to_u16(branches.len(), "branch"))
    }

    /// Get branches from a range.
    pub fn branch_list(&self, range: CanBranchRange) -> &[CanBranch] {
        &self.branches[range.start as usize..range.start as usize + range.len()]
    }

    /// Allocate a contiguous record-field list.
    pub fn push_fields(&mut self, fields: &[CanField]) -> CanFieldRange {
        if fields.is_empty() {
            return CanFieldRange::EMPTY;
        }
        let start = to_u32(self.fields.len(), "record field list");
        self.fields.extend_from_slice(fields);
        CanFieldRange::new(start, to_u16(fields.len(), "record field"))
    }

    /// Get record fields from a range.
    pub fn field_list(&self, range: CanFieldRange) -> &[CanField] {
        &self.fields[range.start as usize..range.start as usize + range.len()]
    }

    /// Allocate a contiguous pattern-field list.
    pub fn push_pat_fields(&mut self, fields: &[CanPatField]) -> CanPatFieldRange {
        if fields.is_empty() {
            return CanPatFieldRange::EMPTY;
        }
        let start = to_u32(self.pat_fields.len(), "pattern field list");
        self.pat_fields.extend_from_slice(fields);
        CanPatFieldRange::new(start, to_u16(fields.len(), "pattern field"))
    }

    /// Get pattern fields from a range.
    pub fn pat_field_list(&self, range: CanPatFieldRange) -> &[CanPatField] {
        &self.pat_fields[range.start as usize..range.start as usize + range.len()]
    }

    /// Allocate a contiguous string-segment list.
    pub fn push_str_segments(&mut self, segments: &[CanStrSegment]) -> CanSegRange {
        if segments.is_empty() {
            return CanSegRange::EMPTY;
        }
        let start = to_u32(self.str_segments.len(), "string segment list");
        self.str_segments.extend_from_slice(segments);
        CanSegRange::new(start, to_u16(segments.len(), "string segment"))
    }

    /// Get string segments from a range.
    pub fn str_segment_list(&self, range: CanSegRange) -> &[CanStrSegment] {
        &self.str_segments[range.start as usize..range.start as usize + range.len()]
    }
}
