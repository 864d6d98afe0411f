//! Host-stack growth guard for deep recursion.
//!
//! The parser and canonicalizer recurse over nested expressions. The
//! interpreter does not (it runs a work-item loop), but the front-end
//! phases can still blow the host stack on pathological nesting. Wrapping
//! their recursive entry points in [`ensure_sufficient_stack`] grows the
//! stack on demand instead.
//!
//! On WASM targets the guard is a passthrough; WASM manages its own stack.

/// Minimum stack space to keep available (100KB red zone).
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB per grow).
#[cfg(not(target_arch = "wasm32"))]
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Ensure sufficient stack space is available before executing `f`.
///
/// If the remaining host stack is below the red zone, allocates an
/// additional segment before calling `f`.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
