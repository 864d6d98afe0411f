//! Rill compiler CLI library.
//!
//! The binary (`rill`) is a thin argument dispatcher; everything it does
//! lives here so tests can drive it:
//!
//! - [`pipeline`]: one-shot source → value evaluation with collected
//!   reports.
//! - [`session`]: the REPL session — past definitions, accumulated
//!   re-evaluation.
//! - [`format`]: the canonical formatter behind the `FORMATTED` snapshot
//!   section.
//! - [`snapshot`]: the labeled-section snapshot file format and its
//!   rayon-parallel runner.
//! - [`reporting`]: diagnostic rendering glue.

pub mod format;
pub mod pipeline;
pub mod reporting;
pub mod session;
pub mod snapshot;
pub mod tracing_setup;
