//! Internal macros shared across IR modules.

/// Assert the size of a type at compile time.
///
/// Keeps hot enums (`ParseExpr`, `CanExpr`) from growing past their size
/// targets unnoticed.
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); std::mem::size_of::<$ty>()];
    };
}

/// Define a `u32` arena index newtype with an `INVALID` sentinel.
///
/// Every cross-node reference in the IR is one of these. Distinct types per
/// index space prevent accidental cross-arena indexing.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Sentinel value indicating "no node". Used for optional
            /// children (no else branch, no list rest pattern).
            pub const INVALID: $name = $name(u32::MAX);

            /// Create from a raw index.
            #[inline]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Index into the owning arena.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Raw `u32` value.
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Returns `true` if this is a valid (non-sentinel) ID.
            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                if self.is_valid() {
                    write!(f, concat!(stringify!($name), "({})"), self.0)
                } else {
                    write!(f, concat!(stringify!($name), "::INVALID"))
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }
    };
}

/// Define a `{start: u32, len: u16}` range into an arena side list.
macro_rules! define_range {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
        #[repr(C)]
        pub struct $name {
            pub start: u32,
            pub len: u16,
        }

        impl $name {
            /// Empty range constant.
            pub const EMPTY: Self = Self { start: 0, len: 0 };

            /// Create a new range.
            #[inline]
            pub const fn new(start: u32, len: u16) -> Self {
                Self { start, len }
            }

            /// Returns `true` if the range contains no elements.
            #[inline]
            pub const fn is_empty(&self) -> bool {
                self.len == 0
            }

            /// Number of elements in the range.
            #[inline]
            pub const fn len(&self) -> usize {
                self.len as usize
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(
                    f,
                    concat!(stringify!($name), "({}..{})"),
                    self.start,
                    self.start + u32::from(self.len)
                )
            }
        }
    };
}
