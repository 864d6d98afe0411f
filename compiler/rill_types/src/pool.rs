//! Interned type pool.

use std::fmt;

use rill_ir::can::{CanId, FracPrecision, IntPrecision};
use rill_ir::Name;

/// Index into a [`Pool`].
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct TypeIdx(u32);

impl TypeIdx {
    /// Sentinel for "not yet annotated".
    pub const INVALID: TypeIdx = TypeIdx(u32::MAX);

    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Debug for TypeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "TypeIdx({})", self.0)
        } else {
            write!(f, "TypeIdx::INVALID")
        }
    }
}

impl Default for TypeIdx {
    fn default() -> Self {
        Self::INVALID
    }
}

/// A type in the pool.
///
/// `Var` entries are unification variables; [`Pool::resolve`] follows
/// their bindings to the representative type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Type {
    /// Unbound unification variable.
    Var,
    /// A variable bound to another type (substitution link).
    Link(TypeIdx),
    Int(IntPrecision),
    Frac(FracPrecision),
    Bool,
    Str,
    /// Record with fields in source order.
    Record(Vec<(Name, TypeIdx)>),
    Tuple(Vec<TypeIdx>),
    List(TypeIdx),
    /// Tag union; variants sorted by name for canonical form.
    TagUnion(Vec<(Name, Vec<TypeIdx>)>),
    /// A function type carrying the identity of its defining lambda.
    ///
    /// The lambda reference is what makes closure layout (environment
    /// size and member offsets) derivable from the type.
    Func {
        params: Vec<TypeIdx>,
        ret: TypeIdx,
        lambda: CanId,
    },
    /// Error recovery type; unifies with anything.
    Error,
}

/// Flat arena of types plus the unification substitution.
#[derive(Clone, Debug, Default)]
pub struct Pool {
    types: Vec<Type>,
}

impl Pool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a type.
    pub fn push(&mut self, ty: Type) -> TypeIdx {
        let idx = TypeIdx::new(u32::try_from(self.types.len()).unwrap_or(u32::MAX));
        self.types.push(ty);
        idx
    }

    /// Allocate a fresh unification variable.
    pub fn fresh_var(&mut self) -> TypeIdx {
        self.push(Type::Var)
    }

    /// Read a type without following links.
    pub fn get(&self, idx: TypeIdx) -> &Type {
        &self.types[idx.index()]
    }

    /// Bind a variable to another type.
    pub(crate) fn bind(&mut self, var: TypeIdx, to: TypeIdx) {
        debug_assert!(matches!(self.types[var.index()], Type::Var));
        self.types[var.index()] = Type::Link(to);
    }

    /// Overwrite a type in place (defaulting pass).
    pub(crate) fn set(&mut self, idx: TypeIdx, ty: Type) {
        self.types[idx.index()] = ty;
    }

    /// Follow links to the representative index.
    pub fn resolve(&self, idx: TypeIdx) -> TypeIdx {
        let mut current = idx;
        loop {
            match &self.types[current.index()] {
                Type::Link(next) => current = *next,
                _ => return current,
            }
        }
    }

    /// The representative type for an index.
    pub fn resolved(&self, idx: TypeIdx) -> &Type {
        self.get(self.resolve(idx))
    }

    /// Number of allocated types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
