//! Rill Types - the type solver.
//!
//! The rest of the pipeline consumes this crate as a black box with one
//! contract: [`solve`] takes a canonical arena and returns a
//! [`TypeCheckResult`] mapping every expression, pattern, and declaration
//! to a solved type in a [`Pool`]. Layouts are then a pure function of the
//! solved type (see `rill_layout`).
//!
//! Internally this is a small unification solver: fresh variables for
//! bindings, structural unification at use sites, numeric defaulting
//! (unconstrained integers solve to `I64`, fractions to `F64`). Function
//! types carry the identity of the lambda they came from, which is what
//! lets closure layouts (header + captured environment) be derived from
//! types alone. Unifying two *different* lambdas is reported as a type
//! mismatch; lambda-set polymorphism is out of scope.

mod pool;
mod solver;
mod type_string;

pub use pool::{Pool, Type, TypeIdx};
pub use solver::{solve, TypeCheckResult};
pub use type_string::type_string;

#[cfg(test)]
mod tests;
