//! The one-shot evaluation pipeline.
//!
//! `parse → canonicalize → solve → interpret`, collecting every phase's
//! diagnostics. Parse errors skip evaluation entirely; canonicalization
//! and type errors do not — the interpreter evaluates what is well-formed
//! and surfaces `Malformed` placeholders as runtime errors carrying the
//! original diagnostic.

use rill_diagnostic::{Diagnostic, DiagnosticQueue};
use rill_eval::{EvalError, Interpreter, ValueStack};
use rill_ir::StringInterner;
use rill_layout::LayoutCache;

/// What evaluating one source text produced.
#[derive(Debug)]
pub enum Outcome {
    /// A value, rendered, with its layout-derived type string.
    Value { rendered: String, type_str: String },
    /// Evaluation was skipped (parse errors).
    Skipped,
    /// Evaluation started and failed.
    EvalFailed {
        /// The failure as a diagnostic.
        diagnostic: Diagnostic,
        /// Whether the failure was fatal (stack abandoned).
        fatal: bool,
    },
}

/// Full result of running the pipeline on one source.
#[derive(Debug)]
pub struct Evaluation {
    /// All phase diagnostics, warnings suppressed when errors exist,
    /// ordered by source position.
    pub reports: Vec<Diagnostic>,
    pub outcome: Outcome,
}

impl Evaluation {
    /// Whether any report is an error.
    pub fn has_errors(&self) -> bool {
        self.reports.iter().any(|d| d.severity.is_error())
    }
}

/// Evaluate a complete source (definitions plus optional trailing
/// expression) with the given value-stack capacity.
pub fn evaluate_source(
    source: &str,
    interner: &StringInterner,
    stack_capacity: usize,
) -> Evaluation {
    let mut queue = DiagnosticQueue::new();

    let parsed = rill_parse::parse_file(source, interner);
    let parse_errors = parsed.has_errors();
    queue.extend(parsed.errors.iter().map(rill_parse::ParseError::to_diagnostic));

    let canon = rill_canon::canonicalize_file(&parsed.ast, interner);
    queue.extend(canon.diagnostics.iter().cloned());

    let types = rill_types::solve(&canon.arena, canon.root, interner);
    queue.extend(types.diagnostics.iter().cloned());

    if parse_errors {
        return Evaluation {
            reports: queue.flush(),
            outcome: Outcome::Skipped,
        };
    }

    let mut cache = LayoutCache::new();
    let mut interp = Interpreter::with_stack(
        &canon.arena,
        &types,
        &mut cache,
        interner,
        &canon.diagnostics,
        ValueStack::with_capacity(stack_capacity),
    );
    tracing::debug!(
        exprs = canon.arena.expr_count(),
        types = types.pool.len(),
        "pipeline front-end complete"
    );
    let outcome = match interp.eval_program(canon.root) {
        Ok(value) => {
            let rendered = rill_eval::render_value(&interp, value);
            let type_str = if canon.root.is_valid() {
                rill_types::type_string(&types.pool, types.expr_type(canon.root), interner)
            } else {
                "{}".to_owned()
            };
            Outcome::Value { rendered, type_str }
        }
        Err(error) => Outcome::EvalFailed {
            diagnostic: error.to_diagnostic(),
            fatal: matches!(error, EvalError::Fatal(_)),
        },
    };

    Evaluation {
        reports: queue.flush(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rill_eval::DEFAULT_CAPACITY;

    fn eval(source: &str) -> Evaluation {
        let interner = StringInterner::new();
        evaluate_source(source, &interner, DEFAULT_CAPACITY)
    }

    #[test]
    fn value_with_type_string() {
        let result = eval("1 + 2");
        match result.outcome {
            Outcome::Value { rendered, type_str } => {
                assert_eq!(rendered, "3");
                assert_eq!(type_str, "Int");
            }
            other => panic!("expected a value, got {other:?}"),
        }
    }

    #[test]
    fn parse_errors_skip_evaluation() {
        let result = eval("1 + +");
        assert!(result.has_errors());
        assert!(matches!(result.outcome, Outcome::Skipped));
    }

    #[test]
    fn canonicalize_errors_still_reach_evaluation() {
        let result = eval("unknownName");
        assert!(result.has_errors());
        match result.outcome {
            Outcome::EvalFailed { diagnostic, fatal } => {
                assert!(!fatal);
                assert_eq!(diagnostic.code, rill_diagnostic::ErrorCode::E3001);
            }
            other => panic!("expected an eval failure, got {other:?}"),
        }
    }

    #[test]
    fn definitions_and_expression() {
        let result = eval("x = 5\ny = x + 1\ny\n");
        match result.outcome {
            Outcome::Value { rendered, type_str } => {
                assert_eq!(rendered, "6");
                assert_eq!(type_str, "Int");
            }
            other => panic!("expected a value, got {other:?}"),
        }
    }
}
