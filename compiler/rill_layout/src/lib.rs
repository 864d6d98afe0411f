//! Rill Layout - concrete memory layouts derived from solved types.
//!
//! A [`Layout`] describes the runtime shape of a value on the byte stack:
//! size, alignment, and enough structure for the interpreter to copy,
//! refcount, and destructure it. Layouts are a *pure function of the
//! solved type*: the [`LayoutCache`] memoizes per `TypeIdx` and interns
//! layouts structurally, so two nodes with the same solved type always
//! share one `LayoutIdx`.
//!
//! Shapes:
//!
//! - scalars: `Bool` (1), integers (1–8 per precision), fractions (4/8),
//!   `Str` (24-byte slot with small-string optimization), heap handles,
//! - `Record` / `Tuple`: fields in type order, natural alignment padding,
//! - `List`: a 12-byte `[handle | len | cap]` slot; elements live in the
//!   refcounted heap cell,
//! - `TagUnion`: 4-byte discriminant + padded payload,
//! - `Closure`: 12-byte `[body_ref | params_ref | env_size]` header
//!   followed by the packed capture environment.

use rustc_hash::FxHashMap;

use rill_ir::can::{CanArena, CanExpr, FracPrecision, IntPrecision};
use rill_ir::Name;
use rill_types::{Pool, Type, TypeCheckResult, TypeIdx};

#[cfg(test)]
mod tests;

/// Index into a [`LayoutCache`]'s interned layout table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct LayoutIdx(u32);

impl LayoutIdx {
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
}

/// Scalar shapes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ScalarKind {
    Bool,
    Int(IntPrecision),
    Frac(FracPrecision),
    /// 24-byte string slot: inline bytes up to 23, heap handle beyond.
    Str,
}

/// Size of the string stack slot.
pub const STR_SLOT_SIZE: u32 = 24;
/// Maximum string length stored inline (last byte holds the length).
pub const STR_INLINE_MAX: u32 = 23;
/// Marker byte identifying a heap-spilled string slot.
pub const STR_HEAP_MARKER: u8 = 0xFF;
/// Size of the list stack slot: `[handle | len | cap]`.
pub const LIST_SLOT_SIZE: u32 = 12;
/// Size of the closure header: `[body_ref | params_ref | env_size]`.
pub const CLOSURE_HEADER_SIZE: u32 = 12;

/// A concrete runtime shape.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Layout {
    Scalar {
        kind: ScalarKind,
        size: u32,
        align: u32,
    },
    Record {
        /// `(offset, field layout, field name)` in type order.
        fields: Vec<(u32, LayoutIdx, Name)>,
        size: u32,
        align: u32,
    },
    Tuple {
        elements: Vec<(u32, LayoutIdx)>,
        size: u32,
        align: u32,
    },
    List {
        element: LayoutIdx,
        size: u32,
        align: u32,
    },
    TagUnion {
        /// `(name, payload element offsets/layouts)`, in type order.
        /// Offsets are relative to the slot start; the `u32` discriminant
        /// (the variant's position in this list) sits at offset 0.
        variants: Vec<(Name, Vec<(u32, LayoutIdx)>)>,
        size: u32,
        align: u32,
    },
    Closure {
        /// Raw `CanId` of the lambda body.
        body_ref: u32,
        /// Raw `CanId` of the lambda node itself; parameter patterns and
        /// the declared capture list are read back through it.
        params_ref: u32,
        /// `(offset within env, layout)` per capture, in declared order.
        env: Vec<(u32, LayoutIdx)>,
        /// Total environment size including padding.
        env_size: u32,
        size: u32,
        align: u32,
    },
    /// Layout of an error-typed node; evaluating it is a runtime error.
    Error,
}

impl Layout {
    /// Total slot size in bytes.
    pub fn size(&self) -> u32 {
        match self {
            Layout::Scalar { size, .. }
            | Layout::Record { size, .. }
            | Layout::Tuple { size, .. }
            | Layout::List { size, .. }
            | Layout::TagUnion { size, .. }
            | Layout::Closure { size, .. } => *size,
            Layout::Error => 0,
        }
    }

    /// Required alignment in bytes (at least 1).
    pub fn align(&self) -> u32 {
        match self {
            Layout::Scalar { align, .. }
            | Layout::Record { align, .. }
            | Layout::Tuple { align, .. }
            | Layout::List { align, .. }
            | Layout::TagUnion { align, .. }
            | Layout::Closure { align, .. } => (*align).max(1),
            Layout::Error => 1,
        }
    }

    /// Whether values of this layout own heap references that must be
    /// refcounted when copied or dropped.
    pub fn is_refcounted(&self) -> bool {
        matches!(
            self,
            Layout::Scalar {
                kind: ScalarKind::Str,
                ..
            } | Layout::List { .. }
        )
    }

    /// Whether this layout or any nested layout is refcounted.
    pub fn contains_refcounted(&self, cache: &LayoutCache) -> bool {
        if self.is_refcounted() {
            return true;
        }
        match self {
            Layout::Record { fields, .. } => fields
                .iter()
                .any(|(_, idx, _)| cache.get(*idx).contains_refcounted(cache)),
            Layout::Tuple { elements, .. } => elements
                .iter()
                .any(|(_, idx)| cache.get(*idx).contains_refcounted(cache)),
            Layout::TagUnion { variants, .. } => variants.iter().any(|(_, payload)| {
                payload
                    .iter()
                    .any(|(_, idx)| cache.get(*idx).contains_refcounted(cache))
            }),
            Layout::Closure { env, .. } => env
                .iter()
                .any(|(_, idx)| cache.get(*idx).contains_refcounted(cache)),
            _ => false,
        }
    }
}

/// Round `offset` up to the next multiple of `align`.
#[inline]
pub fn align_up(offset: u32, align: u32) -> u32 {
    let align = align.max(1);
    offset.div_ceil(align) * align
}

/// Memoized `TypeIdx → LayoutIdx` mapping with structural interning.
#[derive(Default, Debug)]
pub struct LayoutCache {
    layouts: Vec<Layout>,
    interned: FxHashMap<Layout, LayoutIdx>,
    memo: FxHashMap<TypeIdx, LayoutIdx>,
}

impl LayoutCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an interned layout.
    pub fn get(&self, idx: LayoutIdx) -> &Layout {
        &self.layouts[idx.index()]
    }

    /// Number of distinct interned layouts.
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// Returns `true` if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Intern a layout, returning the shared index for its structure.
    pub fn intern(&mut self, layout: Layout) -> LayoutIdx {
        if let Some(&idx) = self.interned.get(&layout) {
            return idx;
        }
        let idx = LayoutIdx::new(u32::try_from(self.layouts.len()).unwrap_or(u32::MAX));
        self.layouts.push(layout.clone());
        self.interned.insert(layout, idx);
        idx
    }

    /// The layout of a solved type.
    ///
    /// Pure in the resolved type: the same solved type always returns the
    /// same `LayoutIdx` (memoized per `TypeIdx`, interned structurally
    /// across distinct `TypeIdx` with equal structure).
    pub fn layout_of(
        &mut self,
        ty: TypeIdx,
        types: &TypeCheckResult,
        arena: &CanArena,
    ) -> LayoutIdx {
        if !ty.is_valid() {
            return self.intern(Layout::Error);
        }
        let root = types.pool.resolve(ty);
        if let Some(&idx) = self.memo.get(&root) {
            return idx;
        }
        let layout = self.build(root, &types.pool, types, arena);
        let idx = self.intern(layout);
        self.memo.insert(root, idx);
        idx
    }

    fn build(
        &mut self,
        root: TypeIdx,
        pool: &Pool,
        types: &TypeCheckResult,
        arena: &CanArena,
    ) -> Layout {
        match pool.get(root).clone() {
            Type::Var | Type::Link(_) => {
                // Defaulting has run by the time layouts are requested.
                Layout::Error
            }
            Type::Error => Layout::Error,
            Type::Bool => Layout::Scalar {
                kind: ScalarKind::Bool,
                size: 1,
                align: 1,
            },
            Type::Int(precision) => Layout::Scalar {
                kind: ScalarKind::Int(precision),
                size: u32::try_from(precision.size()).unwrap_or(8),
                align: u32::try_from(precision.align()).unwrap_or(8),
            },
            Type::Frac(precision) => Layout::Scalar {
                kind: ScalarKind::Frac(precision),
                size: u32::try_from(precision.size()).unwrap_or(8),
                align: u32::try_from(precision.align()).unwrap_or(8),
            },
            Type::Str => Layout::Scalar {
                kind: ScalarKind::Str,
                size: STR_SLOT_SIZE,
                align: 8,
            },
            Type::Record(field_types) => {
                let mut fields = Vec::with_capacity(field_types.len());
                let mut offset = 0;
                let mut align = 1;
                for (name, field_ty) in field_types {
                    let field_layout = self.layout_of(field_ty, types, arena);
                    let field = self.get(field_layout);
                    let field_align = field.align();
                    let field_size = field.size();
                    offset = align_up(offset, field_align);
                    fields.push((offset, field_layout, name));
                    offset += field_size;
                    align = align.max(field_align);
                }
                Layout::Record {
                    fields,
                    size: align_up(offset, align),
                    align,
                }
            }
            Type::Tuple(element_types) => {
                let mut elements = Vec::with_capacity(element_types.len());
                let mut offset = 0;
                let mut align = 1;
                for element_ty in element_types {
                    let element_layout = self.layout_of(element_ty, types, arena);
                    let element = self.get(element_layout);
                    let element_align = element.align();
                    let element_size = element.size();
                    offset = align_up(offset, element_align);
                    elements.push((offset, element_layout));
                    offset += element_size;
                    align = align.max(element_align);
                }
                Layout::Tuple {
                    elements,
                    size: align_up(offset, align),
                    align,
                }
            }
            Type::List(element_ty) => {
                let element = self.layout_of(element_ty, types, arena);
                Layout::List {
                    element,
                    size: LIST_SLOT_SIZE,
                    align: 4,
                }
            }
            Type::TagUnion(variant_types) => {
                let mut variants = Vec::with_capacity(variant_types.len());
                let mut size = 4; // discriminant
                let mut align = 4;
                for (name, payload_types) in variant_types {
                    let mut payload = Vec::with_capacity(payload_types.len());
                    let mut offset = 4;
                    for payload_ty in payload_types {
                        let payload_layout = self.layout_of(payload_ty, types, arena);
                        let element = self.get(payload_layout);
                        let element_align = element.align();
                        let element_size = element.size();
                        offset = align_up(offset, element_align);
                        payload.push((offset, payload_layout));
                        offset += element_size;
                        align = align.max(element_align);
                    }
                    size = size.max(offset);
                    variants.push((name, payload));
                }
                Layout::TagUnion {
                    variants,
                    size: align_up(size, align),
                    align,
                }
            }
            Type::Func {
                lambda, ..
            } => self.closure_layout(lambda, types, arena),
        }
    }

    /// Closure layout: header plus the packed capture environment.
    ///
    /// `env_size` is the sum of the capture layouts' sizes honoring each
    /// capture's own alignment, in the order declared on the lambda node.
    fn closure_layout(
        &mut self,
        lambda: rill_ir::can::CanId,
        types: &TypeCheckResult,
        arena: &CanArena,
    ) -> Layout {
        if !lambda.is_valid() {
            return Layout::Error;
        }
        let CanExpr::Lambda { body, captures, .. } = arena.expr(lambda) else {
            return Layout::Error;
        };

        let mut env = Vec::new();
        let mut offset = 0;
        let mut align = 4; // header fields are u32
        for capture in arena.capture_list(captures) {
            let capture_ty = types.pattern_type(capture.bound_pattern);
            let capture_layout = self.layout_of(capture_ty, types, arena);
            let element = self.get(capture_layout);
            let element_align = element.align();
            let element_size = element.size();
            offset = align_up(offset, element_align);
            env.push((offset, capture_layout));
            offset += element_size;
            align = align.max(element_align);
        }
        let env_size = offset;
        let size = align_up(CLOSURE_HEADER_SIZE + env_size, align);
        Layout::Closure {
            body_ref: body.raw(),
            params_ref: lambda.raw(),
            env,
            env_size,
            size,
            align,
        }
    }
}
