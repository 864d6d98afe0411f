//! Diagnostic system for structured error reporting.
//!
//! Every phase reports problems as [`Diagnostic`] values: an [`ErrorCode`]
//! for searchability, a [`Severity`], a primary message, an optional source
//! region rendered with an underline, and an optional hint. Phases never
//! format their own errors; they construct diagnostics and hand them to an
//! emitter ([`emitter::render`]) at the driver boundary.
//!
//! [`DiagnosticQueue`] collects a phase's diagnostics, orders them by
//! source position, and suppresses warnings when any error is present.

pub mod emitter;
mod diagnostic;
mod error_code;
mod queue;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use queue::DiagnosticQueue;

mod factories;
pub use factories::{
    ident_already_in_scope, ident_not_in_scope, invalid_top_level_statement,
    pattern_not_canonicalized,
};
