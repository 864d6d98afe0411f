//! Canonical expression node types.

use crate::ast::{BinOp, UnaryOp};
use crate::{Name, Region};

use super::{
    CanBranchRange, CanFieldRange, CanId, CanRange, CanSegRange, CanStmtRange, CaptureRange,
    DeclId, DiagIdx, PatternIdx, PatternRange,
};

/// Integer precision carried by canonical integer literals.
///
/// Unannotated literals default to [`IntPrecision::I64`] during type
/// solving; the narrower precisions are representable end-to-end for when
/// annotations select them.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum IntPrecision {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntPrecision {
    /// Size of one value of this precision in bytes.
    pub const fn size(self) -> usize {
        match self {
            IntPrecision::I8 | IntPrecision::U8 => 1,
            IntPrecision::I16 | IntPrecision::U16 => 2,
            IntPrecision::I32 | IntPrecision::U32 => 4,
            IntPrecision::I64 | IntPrecision::U64 => 8,
        }
    }

    /// Required alignment, equal to the size for all integer precisions.
    pub const fn align(self) -> usize {
        self.size()
    }

    /// Returns `true` for the signed precisions.
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            IntPrecision::I8 | IntPrecision::I16 | IntPrecision::I32 | IntPrecision::I64
        )
    }

    /// Display name used by type strings: `I64`, `U8`, ...
    pub const fn type_name(self) -> &'static str {
        match self {
            IntPrecision::I8 => "I8",
            IntPrecision::I16 => "I16",
            IntPrecision::I32 => "I32",
            IntPrecision::I64 => "I64",
            IntPrecision::U8 => "U8",
            IntPrecision::U16 => "U16",
            IntPrecision::U32 => "U32",
            IntPrecision::U64 => "U64",
        }
    }
}

/// Fractional precision carried by canonical fractional literals.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FracPrecision {
    F32,
    F64,
}

impl FracPrecision {
    /// Size in bytes.
    pub const fn size(self) -> usize {
        match self {
            FracPrecision::F32 => 4,
            FracPrecision::F64 => 8,
        }
    }

    /// Required alignment.
    pub const fn align(self) -> usize {
        self.size()
    }

    /// Display name used by type strings.
    pub const fn type_name(self) -> &'static str {
        match self {
            FracPrecision::F32 => "F32",
            FracPrecision::F64 => "F64",
        }
    }
}

/// Canonical expression node.
///
/// Scope resolution is complete: there are no raw identifier references.
/// Each subsystem (interpreter, formatter, diagnostics) pattern-matches on
/// this enum exhaustively — adding a variant forces a matching update in
/// each, and the type-checker catches omissions.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CanExpr {
    /// Integer literal with its precision.
    Int { value: i64, precision: IntPrecision },
    /// Fractional literal stored as bits, with its precision.
    Frac { value: u64, precision: FracPrecision },
    /// String literal (segments are interned literal pieces).
    Str(CanSegRange),
    /// Boolean literal.
    Bool(bool),
    /// Reference to a previously bound pattern, by its arena index.
    LookupLocal(PatternIdx),
    /// Reference to a top-level declaration.
    LookupExternal(DeclId),
    /// Lambda with its computed capture set.
    ///
    /// `captures` is exactly `free_vars(body) \ params`: every
    /// `LookupLocal` in the body resolves either to one of `params` or to
    /// a capture. No third possibility.
    Lambda {
        params: PatternRange,
        body: CanId,
        captures: CaptureRange,
    },
    /// Call: `callee(args)`.
    Call { callee: CanId, args: CanRange },
    /// Binary operation.
    Binop { op: BinOp, lhs: CanId, rhs: CanId },
    /// Unary operation.
    Unary { op: UnaryOp, operand: CanId },
    /// Conditional.
    If {
        cond: CanId,
        then_branch: CanId,
        else_branch: CanId,
    },
    /// Block of statements with a tail expression. INVALID tail = unit.
    Block { stmts: CanStmtRange, tail: CanId },
    /// Record literal.
    Record { fields: CanFieldRange },
    /// Tuple literal.
    Tuple(CanRange),
    /// List literal.
    List(CanRange),
    /// Tag, optionally with payload.
    Tag { name: Name, payload: CanRange },
    /// Pattern match.
    Match {
        scrutinee: CanId,
        branches: CanBranchRange,
    },
    /// Placeholder for a subtree that failed canonicalization.
    ///
    /// Carries the index of the diagnostic that replaced it, stored
    /// out-of-band; the interpreter surfaces it as a runtime error value.
    Malformed(DiagIdx),
}

// CanExpr: 24 bytes on 64-bit (Int forces 8-byte alignment).
static_assert_size!(CanExpr, 24);

/// A captured variable, as recorded in a lambda's capture list.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CaptureVar {
    /// The surface name, for diagnostics and snapshots.
    pub name: Name,
    /// The exact pattern that introduced the captured binding. This is
    /// what `LookupLocal` inside the lambda body compares against.
    pub bound_pattern: PatternIdx,
    /// Scope depth at which the binding was introduced. Strictly less than
    /// the capturing lambda's own function-context depth.
    pub scope_depth: u32,
}

/// One string segment of a canonical string literal.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CanStrSegment {
    /// Literal text, escapes resolved, interned.
    Literal(Name),
}

/// A statement inside a canonical block.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CanStmt {
    /// Binding: canonicalize RHS first, then bind the pattern.
    Let { pattern: PatternIdx, value: CanId },
    /// Bare expression evaluated for effect; result discarded.
    Expr(CanId),
}

/// One branch of a canonical match.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CanBranch {
    pub patterns: PatternRange,
    pub body: CanId,
}

/// A record literal field, in source order.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CanField {
    pub name: Name,
    pub value: CanId,
}

/// A top-level declaration: `name = expr` at file or REPL scope.
///
/// Declarations are not scope-frame bindings; references to them lower to
/// [`CanExpr::LookupExternal`] and never participate in capture analysis.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CanDecl {
    pub name: Name,
    /// The binding pattern (always `CanPattern::Ident` today).
    pub pattern: PatternIdx,
    pub body: CanId,
    pub region: Region,
}
