//! Parse tree produced by `rill_parse`.
//!
//! The tree is read-only after parsing: the canonicalizer walks it once and
//! drops it. Nodes live in [`Ast`], a struct-of-arrays arena; every
//! reference between nodes is a 32-bit index.
//!
//! Malformed input parses to [`ParseExpr::Malformed`] / [`ParsePattern::Malformed`]
//! placeholder nodes so downstream phases always receive a complete tree;
//! the diagnostics themselves are reported out-of-band by the parser.

use crate::arena::{to_u16, to_u32};
use crate::{Name, Region};

mod ops;

pub use ops::{BinOp, UnaryOp};

define_id! {
    /// Index of an expression node in an [`Ast`].
    NodeId
}

define_id! {
    /// Index of a pattern node in an [`Ast`].
    PatId
}

define_range! {
    /// Range of expression IDs in `Ast::node_lists` (args, elements).
    NodeRange
}

define_range! {
    /// Range of pattern IDs in `Ast::pat_lists` (params, tag args).
    PatRange
}

define_range! {
    /// Range of block statements in `Ast::stmts`.
    StmtRange
}

define_range! {
    /// Range of match branches in `Ast::branches`.
    BranchRange
}

define_range! {
    /// Range of record fields in `Ast::record_fields`.
    FieldRange
}

define_range! {
    /// Range of record pattern fields in `Ast::pat_fields`.
    PatFieldRange
}

define_range! {
    /// Range of string segments in `Ast::str_segments`.
    SegRange
}

/// Expression node kinds.
///
/// These are exactly the shapes the canonicalizer consumes; surface sugar
/// is resolved by the parser before a node is allocated.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ParseExpr {
    /// Integer literal: `42`.
    Int(i64),
    /// Fractional literal as `f64` bits: `3.14`.
    Frac(u64),
    /// Boolean literal: `true`, `false`.
    Bool(bool),
    /// String literal: `"hello"`. Segments are interned literal pieces.
    Str(SegRange),
    /// Identifier reference: `x`.
    Ident(Name),
    /// Tag, optionally with a payload: `Ok`, `Pair(1, 2)`.
    Tag { name: Name, payload: NodeRange },
    /// Lambda: `|a, b| body`.
    Lambda { params: PatRange, body: NodeId },
    /// Application: `f(a, b)`.
    Apply { callee: NodeId, args: NodeRange },
    /// Binary operation: `lhs op rhs`.
    Binop { op: BinOp, lhs: NodeId, rhs: NodeId },
    /// Unary operation: `-e`, `!e`.
    Unary { op: UnaryOp, operand: NodeId },
    /// Conditional: `if cond then_branch else else_branch`.
    IfThenElse {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: NodeId,
    },
    /// Pattern match: `match scrutinee { pattern -> body, ... }`.
    Match {
        scrutinee: NodeId,
        branches: BranchRange,
    },
    /// Block: `{ stmt; ...; tail }`. INVALID tail = empty record result.
    Block { stmts: StmtRange, tail: NodeId },
    /// Record literal: `{ x: 1, y: 2 }`.
    Record { fields: FieldRange },
    /// Tuple literal: `(a, b)`.
    Tuple(NodeRange),
    /// List literal: `[1, 2, 3]`.
    List(NodeRange),
    /// Placeholder for unparseable input. The parser reported the error.
    Malformed,
}

// ParseExpr: 16 bytes on 64-bit (Int/Frac force 8-byte alignment).
static_assert_size!(ParseExpr, 16);

/// Pattern node kinds.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ParsePattern {
    /// Binding pattern: `x`.
    Ident(Name),
    /// Integer literal pattern: `0`.
    IntLiteral(i64),
    /// Tag pattern: `Ok(inner)`.
    Tag { name: Name, args: PatRange },
    /// Record destructure: `{ x, y }`.
    Record { fields: PatFieldRange },
    /// Tuple destructure: `(a, b)`.
    Tuple(PatRange),
    /// List destructure: `[first, .. rest]`. INVALID rest = exact-length.
    List { elems: PatRange, rest: PatId },
    /// Wildcard: `_`.
    Underscore,
    /// Named sub-pattern: `pat as name`.
    As { inner: PatId, name: Name },
    /// Alternatives: `1 | 2 | 3`.
    Alternatives(PatRange),
    /// Placeholder for unparseable input.
    Malformed,
}

static_assert_size!(ParsePattern, 16);

/// One string segment. Interpolation would add variants here; today all
/// segments are literal text.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum StrSegment {
    /// A literal piece of the string, escapes already resolved.
    Literal(Name),
}

/// A statement inside a block.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Stmt {
    /// Binding: `pattern = expr`.
    Let { pattern: PatId, value: NodeId },
    /// Bare expression evaluated for effect.
    Expr(NodeId),
}

/// One branch of a `match`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct MatchBranch {
    /// Top-level alternatives: `A | B -> body` stores both patterns here.
    pub patterns: PatRange,
    pub body: NodeId,
}

/// A record literal field. INVALID value = shorthand `{ x }` (reads `x`).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct RecordField {
    pub name: Name,
    pub value: NodeId,
    pub region: Region,
}

/// A record pattern field. INVALID pattern = shorthand `{ x }` (binds `x`).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct PatField {
    pub name: Name,
    pub pattern: PatId,
    pub region: Region,
}

/// A top-level item in a file or REPL statement.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TopLevel {
    /// Definition: `name = expr` (or destructuring `pattern = expr`).
    Def { pattern: PatId, value: NodeId },
    /// Import: `import Name`.
    Import { name: Name },
    /// A bare expression (REPL evaluation target, or a file's trailing expr).
    Expr(NodeId),
}

/// Parse tree arena.
///
/// Struct-of-arrays: expression kinds and regions are parallel vectors
/// indexed by [`NodeId`]; patterns likewise by [`PatId`]; variable-length
/// children live in flat side lists addressed by ranges.
#[derive(Clone, Debug, Default)]
pub struct Ast {
    exprs: Vec<ParseExpr>,
    expr_regions: Vec<Region>,
    patterns: Vec<ParsePattern>,
    pattern_regions: Vec<Region>,
    node_lists: Vec<NodeId>,
    pat_lists: Vec<PatId>,
    stmts: Vec<Stmt>,
    branches: Vec<MatchBranch>,
    record_fields: Vec<RecordField>,
    pat_fields: Vec<PatField>,
    str_segments: Vec<StrSegment>,
    /// Top-level items in source order (files and REPL statements).
    pub items: Vec<TopLevel>,
}

impl Ast {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an expression node.
    pub fn push_expr(&mut self, kind: ParseExpr, region: Region) -> NodeId {
        let id = NodeId::new(to_u32(self.exprs.len(), "parse expression"));
        self.exprs.push(kind);
        self.expr_regions.push(region);
        id
    }

    /// Allocate a pattern node.
    pub fn push_pattern(&mut self, kind: ParsePattern, region: Region) -> PatId {
        let id = PatId::new(to_u32(self.patterns.len(), "parse pattern"));
        self.patterns.push(kind);
        self.pattern_regions.push(region);
        id
    }

    /// Get an expression kind.
    #[inline]
    pub fn expr(&self, id: NodeId) -> ParseExpr {
        self.exprs[id.index()]
    }

    /// Get an expression's region.
    #[inline]
    pub fn expr_region(&self, id: NodeId) -> Region {
        self.expr_regions[id.index()]
    }

    /// Widen an expression's region.
    ///
    /// Used by the parser for parenthesized expressions, whose region must
    /// cover the parens so call adjacency (`(f)(x)`) sees the `)`.
    #[inline]
    pub fn set_expr_region(&mut self, id: NodeId, region: Region) {
        self.expr_regions[id.index()] = region;
    }

    /// Get a pattern kind.
    #[inline]
    pub fn pattern(&self, id: PatId) -> ParsePattern {
        self.patterns[id.index()]
    }

    /// Get a pattern's region.
    #[inline]
    pub fn pattern_region(&self, id: PatId) -> Region {
        self.pattern_regions[id.index()]
    }

    /// Number of allocated expression nodes.
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    /// Allocate a contiguous expression ID list.
    pub fn push_node_list(&mut self, ids: &[NodeId]) -> NodeRange {
        if ids.is_empty() {
            return NodeRange::EMPTY;
        }
        let start = to_u32(self.node_lists.len(), "expression list");
        self.node_lists.extend_from_slice(ids);
        NodeRange::new(start, to_u16(ids.len(), "expression"))
    }

    /// Get expression IDs from a range.
    pub fn node_list(&self, range: NodeRange) -> &[NodeId] {
        &self.node_lists[range.start as usize..range.start as usize + range.len()]
    }

    /// Allocate a contiguous pattern ID list.
    pub fn push_pat_list(&mut self, ids: &[PatId]) -> PatRange {
        if ids.is_empty() {
            return PatRange::EMPTY;
        }
        let start = to_u32(self.pat_lists.len(), "pattern list");
        self.pat_lists.extend_from_slice(ids);
        PatRange::new(start, to_u16(ids.len(), "pattern"))
    }

    /// Get pattern IDs from a range.
    pub fn pat_list(&self, range: PatRange) -> &[PatId] {
        &self.pat_lists[range.start as usize..range.start as usize + range.len()]
    }

    /// Allocate a contiguous statement list.
    pub fn push_stmts(&mut self, stmts: &[Stmt]) -> StmtRange {
        if stmts.is_empty() {
            return StmtRange::EMPTY;
        }
        let start = to_u32(self.stmts.len(), "statement list");
        self.stmts.extend_from_slice(stmts);
        StmtRange::new(start, to_u16(stmts.len(), "statement"))
    }

    /// Get statements from a range.
    pub fn stmt_list(&self, range: StmtRange) -> &[Stmt] {
        &self.stmts[range.start as usize..range.start as usize + range.len()]
    }

    /// Allocate a contiguous match-branch list.
    pub fn push_branches(&mut self, branches: &[MatchBranch]) -> BranchRange {
        if branches.is_empty() {
            return BranchRange::EMPTY;
        }
        let start = to_u32(self.branches.len(), "branch list");
        self.branches.extend_from_slice(branches);
        BranchRange::new(start, to_u16(branches.len(), "branch"))
    }

    /// Get branches from a range.
    pub fn branch_list(&self, range: BranchRange) -> &[MatchBranch] {
        &self.branches[range.start as usize..range.start as usize + range.len()]
    }

    /// Allocate a contiguous record-field list.
    pub fn push_record_fields(&mut self, fields: &[RecordField]) -> FieldRange {
        if fields.is_empty() {
            return FieldRange::EMPTY;
        }
        let start = to_u32(self.record_fields.len(), "record field list");
        self.record_fields.extend_from_slice(fields);
        FieldRange::new(start, to_u16(fields.len(), "record field"))
    }

    /// Get record fields from a range.
    pub fn record_field_list(&self, range: FieldRange) -> &[RecordField] {
        &self.record_fields[range.start as usize..range.start as usize + range.len()]
    }

    /// Allocate a contiguous pattern-field list.
    pub fn push_pat_fields(&mut self, fields: &[PatField]) -> PatFieldRange {
        if fields.is_empty() {
            return PatFieldRange::EMPTY;
        }
        let start = to_u32(self.pat_fields.len(), "pattern field list");
        self.pat_fields.extend_from_slice(fields);
        PatFieldRange::new(start, to_u16(fields.len(), "pattern field"))
    }

    /// Get pattern fields from a range.
    pub fn pat_field_list(&self, range: PatFieldRange) -> &[PatField] {
        &self.pat_fields[range.start as usize..range.start as usize + range.len()]
    }

    /// Allocate a contiguous string-segment list.
    pub fn push_str_segments(&mut self, segments: &[StrSegment]) -> SegRange {
        if segments.is_empty() {
            return SegRange::EMPTY;
        }
        let start = to_u32(self.str_segments.len(), "string segment list");
        self.str_segments.extend_from_slice(segments);
        SegRange::new(start, to_u16(segments.len(), "string segment"))
    }

    /// Get string segments from a range.
    pub fn str_segment_list(&self, range: SegRange) -> &[StrSegment] {
        &self.str_segments[range.start as usize..range.start as usize + range.len()]
    }
}

#[cfg(test)]
mod tests;
