//! Canonical IR — the arena-stored form produced by canonicalization.
//!
//! [`CanExpr`] nodes are scope-resolved: identifier references have become
//! [`CanExpr::LookupLocal`] (a [`PatternIdx`] naming the binding pattern)
//! or [`CanExpr::LookupExternal`] (a [`DeclId`] naming a top-level
//! definition). Every lambda carries its exact capture set, computed by the
//! free-variable analysis in `rill_canon`.
//!
//! The IR is read-only after canonicalization. The type solver annotates
//! nodes through a *parallel* array keyed by [`CanId`], never by mutating
//! the arena, and diagnostics are stored out-of-band so traversal never
//! depends on error state.

mod arena;
mod expr;
mod pattern;
mod sexpr;

pub use arena::CanArena;
pub use expr::{
    CanBranch, CanDecl, CanExpr, CanField, CanStmt, CanStrSegment, CaptureVar, FracPrecision,
    IntPrecision,
};
pub use pattern::{CanPatField, CanPattern};
pub use sexpr::SexprRenderer;

define_id! {
    /// Index of a canonical expression in a [`CanArena`].
    CanId
}

define_id! {
    /// Index of a canonical pattern in a [`CanArena`].
    ///
    /// A pattern's index is its *identity*: `CanExpr::LookupLocal(p)`
    /// refers to the binding introduced by the pattern stored at `p`.
    PatternIdx
}

define_id! {
    /// Index of a top-level declaration in a [`CanArena`].
    DeclId
}

define_id! {
    /// Index into the out-of-band diagnostic list accompanying an arena.
    ///
    /// `CanExpr::Malformed` carries one of these so the interpreter can
    /// surface the original diagnostic as a runtime error value.
    DiagIdx
}

define_range! {
    /// Range of expression IDs in `CanArena::expr_lists`.
    CanRange
}

define_range! {
    /// Range of pattern IDs in `CanArena::pattern_lists`.
    PatternRange
}

define_range! {
    /// Range of capture variables in `CanArena::captures`.
    CaptureRange
}

define_range! {
    /// Range of block statements in `CanArena::stmts`.
    CanStmtRange
}

define_range! {
    /// Range of match branches in `CanArena::branches`.
    CanBranchRange
}

define_range! {
    /// Range of record fields in `CanArena::fields`.
    CanFieldRange
}

define_range! {
    /// Range of record pattern fields in `CanArena::pat_fields`.
    CanPatFieldRange
}

define_range! {
    /// Range of string segments in `CanArena::str_segments`.
    CanSegRange
}

#[cfg(test)]
mod tests;
