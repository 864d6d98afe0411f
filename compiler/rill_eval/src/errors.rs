//! Evaluation errors.
//!
//! Two tiers, mirroring the recoverability split:
//!
//! - [`RuntimeError`]: a tagged error *value* — overflow, division by
//!   zero, pattern-match failure, evaluating a malformed placeholder. The
//!   current expression halts; the session continues.
//! - [`FatalError`]: the evaluation context is no longer trustworthy —
//!   value-stack overflow, arity mismatch, layout miscomputation. The
//!   session continues only on a fresh stack.

use rill_diagnostic::{Diagnostic, ErrorCode};
use rill_ir::Region;

use crate::value_stack::StackOverflow;

/// Recoverable runtime error, surfaced as a tagged error value.
#[derive(Clone, Debug)]
pub enum RuntimeError {
    /// Signed arithmetic overflowed.
    ArithmeticOverflow { op: &'static str, region: Region },
    /// Integer division or remainder by zero.
    DivisionByZero { region: Region },
    /// No match branch accepted the scrutinee.
    PatternMatchFailed { value: String, region: Region },
    /// A `Malformed` placeholder was reached; carries the original
    /// diagnostic so the REPL or snapshot harness can print it.
    MalformedExpression { diagnostic: Box<Diagnostic> },
    /// An operator was applied to values it does not support.
    UnsupportedOperation { op: &'static str, region: Region },
}

impl RuntimeError {
    /// Convert to a structured diagnostic for rendering.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            RuntimeError::ArithmeticOverflow { op, region } => {
                Diagnostic::error(ErrorCode::E5001)
                    .with_message(format!("`{op}` overflowed its integer range"))
                    .with_region(*region)
            }
            RuntimeError::DivisionByZero { region } => Diagnostic::error(ErrorCode::E5002)
                .with_message("cannot divide by zero")
                .with_region(*region),
            RuntimeError::PatternMatchFailed { value, region } => {
                Diagnostic::error(ErrorCode::E5003)
                    .with_message(format!("no branch matched the value `{value}`"))
                    .with_region(*region)
            }
            RuntimeError::MalformedExpression { diagnostic } => (**diagnostic).clone(),
            RuntimeError::UnsupportedOperation { op, region } => {
                Diagnostic::error(ErrorCode::E5006)
                    .with_message(format!("`{op}` is not supported for these values"))
                    .with_region(*region)
            }
        }
    }
}

/// Fatal evaluation error; the current stack is abandoned.
#[derive(Clone, Debug)]
pub enum FatalError {
    /// The value stack ran out of capacity.
    StackOverflow(StackOverflow),
    /// A call site's argument count disagreed with the callee's
    /// parameters. Indicates a compiler bug, not a user error.
    ArityMismatch { expected: usize, found: usize },
    /// A non-closure value was called.
    NotCallable,
    /// An internal invariant was violated (layout miscompute, missing
    /// binding). Carries the phase tag for the report.
    Internal { message: String },
}

impl FatalError {
    /// Convert to a structured diagnostic for rendering.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            FatalError::StackOverflow(overflow) => Diagnostic::error(ErrorCode::E5004)
                .with_message(overflow.to_string())
                .with_hint("the evaluation was abandoned; the session continues on a fresh stack"),
            FatalError::ArityMismatch { expected, found } => Diagnostic::error(ErrorCode::E5005)
                .with_message(format!(
                    "call expected {expected} argument(s) but received {found}"
                ))
                .with_hint("this is a compiler bug; please report it"),
            FatalError::NotCallable => Diagnostic::error(ErrorCode::E5005)
                .with_message("this value is not a function and cannot be called"),
            FatalError::Internal { message } => Diagnostic::error(ErrorCode::E9001)
                .with_message(format!("eval: {message}")),
        }
    }
}

/// Either error tier.
#[derive(Clone, Debug)]
pub enum EvalError {
    Runtime(RuntimeError),
    Fatal(FatalError),
}

impl EvalError {
    /// Convert to a structured diagnostic for rendering.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            EvalError::Runtime(e) => e.to_diagnostic(),
            EvalError::Fatal(e) => e.to_diagnostic(),
        }
    }

    /// Whether this is a fatal error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EvalError::Fatal(_))
    }
}

impl From<RuntimeError> for EvalError {
    fn from(e: RuntimeError) -> Self {
        EvalError::Runtime(e)
    }
}

impl From<FatalError> for EvalError {
    fn from(e: FatalError) -> Self {
        EvalError::Fatal(e)
    }
}

impl From<StackOverflow> for EvalError {
    fn from(e: StackOverflow) -> Self {
        EvalError::Fatal(FatalError::StackOverflow(e))
    }
}

/// Result alias used throughout the interpreter.
pub type EvalResult<T> = Result<T, EvalError>;
