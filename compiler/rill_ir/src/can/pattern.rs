//! Canonical pattern node types.

use crate::Name;

use super::{CanPatFieldRange, DiagIdx, PatternIdx, PatternRange};

/// Canonical pattern node.
///
/// A pattern's arena index is its identity: lookups and captures refer to
/// the [`PatternIdx`] of the `Ident` (or `As`) pattern that introduced a
/// binding.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CanPattern {
    /// Binding pattern. Introduces `name` bound to the matched value.
    Ident(Name),
    /// Integer literal pattern; matches by value, binds nothing.
    IntLiteral(i64),
    /// Tag pattern with sub-patterns for the payload.
    Tag { name: Name, args: PatternRange },
    /// Record destructure. Shorthand fields are resolved: every field has
    /// a sub-pattern.
    Record { fields: CanPatFieldRange },
    /// Tuple destructure.
    Tuple(PatternRange),
    /// List destructure. INVALID rest = exact-length match.
    List { elems: PatternRange, rest: PatternIdx },
    /// Wildcard; matches anything, binds nothing.
    Underscore,
    /// Named sub-pattern: matches `inner`, additionally binds `name`.
    As { inner: PatternIdx, name: Name },
    /// Alternatives; matches if any alternative matches. Alternatives
    /// introduce no bindings (enforced by canonicalization).
    Alternatives(PatternRange),
    /// Placeholder for a pattern that failed canonicalization.
    Malformed(DiagIdx),
}

static_assert_size!(CanPattern, 16);

/// A record pattern field with its resolved sub-pattern.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CanPatField {
    pub name: Name,
    pub pattern: PatternIdx,
}
