//! Rill IR - shared representation types for the Rill compiler.
//!
//! This crate owns the data that every phase exchanges:
//!
//! - [`Name`] / [`StringInterner`]: compact interned identifiers with
//!   constant-time equality.
//! - [`Region`]: 8-byte source ranges attached to every node.
//! - [`ast`]: the read-only parse tree produced by `rill_parse`.
//! - [`can`]: the canonical IR produced by `rill_canon` — arena-stored,
//!   index-linked expressions, patterns, and capture lists.
//!
//! All cross-node references are 32-bit arena indices, never pointers.
//! That keeps nodes `Copy`, serialization trivial, and ownership acyclic.

#[macro_use]
mod macros;

pub mod arena;
pub mod ast;
pub mod can;
mod interner;
mod name;
mod region;

pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;
pub use region::Region;
