//! The REPL session.
//!
//! The session never evaluates incrementally: it keeps every past
//! definition as source text and re-runs the whole accumulated program
//! for each input line. Redefinition therefore *recomputes* dependents —
//! after `x = 5`, `y = x + 1`, `x = 6`, evaluating `y` yields 7, because
//! `y`'s definition replays against the current `x`.

use rill_eval::DEFAULT_CAPACITY;
use rill_ir::{SharedInterner, StringInterner};

use crate::pipeline::{evaluate_source, Outcome};
use crate::reporting::render_reports;

/// Kind of a retained definition.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum PastDefKind {
    /// `name = expr`; later entries shadow earlier ones.
    Assignment(String),
    /// `import Name`.
    Import,
}

/// One retained REPL input.
#[derive(Clone, Debug)]
pub struct PastDef {
    pub source: String,
    pub kind: PastDefKind,
}

/// What one input line produced.
#[derive(Debug, PartialEq, Eq)]
pub enum LineOutcome {
    /// Nothing to do (blank input).
    Empty,
    /// `value : Type`.
    Value(String),
    /// A rendered report (errors or warnings).
    Report(String),
    /// The help text.
    Help,
    /// A quit meta-command.
    Exit,
}

/// REPL session state.
pub struct ReplSession {
    interner: SharedInterner,
    past_defs: Vec<PastDef>,
    stack_capacity: usize,
    use_color: bool,
}

impl ReplSession {
    /// Create a session with the default stack capacity.
    pub fn new(use_color: bool) -> Self {
        ReplSession {
            interner: SharedInterner::new(StringInterner::new()),
            past_defs: Vec::new(),
            stack_capacity: DEFAULT_CAPACITY,
            use_color,
        }
    }

    /// Retained definitions, in insertion order.
    pub fn past_defs(&self) -> &[PastDef] {
        &self.past_defs
    }

    /// Process one input line.
    pub fn eval_line(&mut self, line: &str) -> LineOutcome {
        let line = line.trim();
        if line.is_empty() {
            return LineOutcome::Empty;
        }
        match line {
            ":help" => return LineOutcome::Help,
            ":exit" | ":quit" | ":q" => return LineOutcome::Exit,
            _ => {}
        }

        // Classify the line: definition, import, or expression.
        let parsed = rill_parse::parse_statement(line, &self.interner);
        if parsed.has_errors() {
            let reports: Vec<_> = parsed
                .errors
                .iter()
                .map(rill_parse::ParseError::to_diagnostic)
                .collect();
            return LineOutcome::Report(render_reports(&reports, line, self.use_color));
        }

        match parsed.item {
            rill_ir::ast::TopLevel::Import { .. } => {
                self.past_defs.push(PastDef {
                    source: line.to_owned(),
                    kind: PastDefKind::Import,
                });
                LineOutcome::Empty
            }
            rill_ir::ast::TopLevel::Def { pattern, .. } => {
                let name = match parsed.ast.pattern(pattern) {
                    rill_ir::ast::ParsePattern::Ident(name) => {
                        self.interner.lookup(name).to_owned()
                    }
                    _ => {
                        let reports = vec![rill_diagnostic::invalid_top_level_statement(
                            "a destructuring definition",
                            parsed.ast.pattern_region(pattern),
                        )];
                        return LineOutcome::Report(render_reports(
                            &reports,
                            line,
                            self.use_color,
                        ));
                    }
                };
                self.past_defs.push(PastDef {
                    source: line.to_owned(),
                    kind: PastDefKind::Assignment(name.clone()),
                });
                // Echo the definition's value by evaluating its name
                // against the accumulated program.
                let outcome = self.eval_expression(&name);
                if matches!(outcome, LineOutcome::Report(_)) {
                    // A definition that cannot evaluate is not retained.
                    self.past_defs.pop();
                }
                outcome
            }
            rill_ir::ast::TopLevel::Expr(_) => self.eval_expression(line),
        }
    }

    /// Build the composite source (past definitions + expression) and run
    /// the full pipeline on it.
    fn eval_expression(&self, expr: &str) -> LineOutcome {
        let mut source = String::new();
        for def in &self.past_defs {
            source.push_str(&def.source);
            source.push('\n');
        }
        source.push_str(expr);
        source.push('\n');

        let result = evaluate_source(&source, &self.interner, self.stack_capacity);
        if result.has_errors() {
            return LineOutcome::Report(render_reports(
                &result.reports,
                &source,
                self.use_color,
            ));
        }
        match result.outcome {
            Outcome::Value { rendered, type_str } => {
                LineOutcome::Value(format!("{rendered} : {type_str}"))
            }
            Outcome::Skipped => LineOutcome::Report(render_reports(
                &result.reports,
                &source,
                self.use_color,
            )),
            Outcome::EvalFailed { diagnostic, .. } => {
                // Fatal or not, the session continues; a fresh stack is
                // created per line anyway.
                LineOutcome::Report(render_reports(
                    &[diagnostic],
                    &source,
                    self.use_color,
                ))
            }
        }
    }
}

/// The `:help` text.
pub const HELP_TEXT: &str = "\
Enter an expression to evaluate it, or a definition (name = expr) to
remember it for later lines.

  :help          show this text
  :exit, :quit, :q   leave the repl
";

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(session: &mut ReplSession, lines: &[&str]) -> Vec<String> {
        lines
            .iter()
            .map(|line| match session.eval_line(line) {
                LineOutcome::Value(v) => v,
                other => panic!("line `{line}` produced {other:?}"),
            })
            .collect()
    }

    #[test]
    fn definitions_echo_their_value() {
        let mut session = ReplSession::new(false);
        assert_eq!(
            values(&mut session, &["x = 5"]),
            vec!["5 : Int".to_owned()]
        );
    }

    #[test]
    fn repl_shadowing_recomputes_dependents() {
        // The pinned behavior: the session rebuilds the full source each
        // line, so `y` recomputes from the *current* x.
        let mut session = ReplSession::new(false);
        let outputs = values(&mut session, &["x = 5", "y = x + 1", "x = 6", "y"]);
        assert_eq!(
            outputs,
            vec![
                "5 : Int".to_owned(),
                "6 : Int".to_owned(),
                "6 : Int".to_owned(),
                "7 : Int".to_owned(),
            ]
        );
    }

    #[test]
    fn define_then_use_matches_direct_evaluation() {
        let mut session = ReplSession::new(false);
        let via_def = values(&mut session, &["e = (|x| x * 2)(21)", "e"]);
        assert_eq!(via_def[1], "42 : Int");

        let mut fresh = ReplSession::new(false);
        assert_eq!(values(&mut fresh, &["(|x| x * 2)(21)"])[0], "42 : Int");
    }

    #[test]
    fn meta_commands() {
        let mut session = ReplSession::new(false);
        assert_eq!(session.eval_line(":help"), LineOutcome::Help);
        assert_eq!(session.eval_line(":q"), LineOutcome::Exit);
        assert_eq!(session.eval_line("   "), LineOutcome::Empty);
    }

    #[test]
    fn errors_produce_reports_and_the_session_continues() {
        let mut session = ReplSession::new(false);
        let outcome = session.eval_line("nope + 1");
        assert!(matches!(outcome, LineOutcome::Report(_)));
        assert_eq!(
            values(&mut session, &["1 + 1"]),
            vec!["2 : Int".to_owned()]
        );
    }

    #[test]
    fn failed_definitions_are_not_retained() {
        let mut session = ReplSession::new(false);
        let outcome = session.eval_line("bad = nosuchthing");
        assert!(matches!(outcome, LineOutcome::Report(_)));
        assert!(session.past_defs().is_empty());
    }

    #[test]
    fn imports_are_recorded_silently() {
        let mut session = ReplSession::new(false);
        assert_eq!(session.eval_line("import Json"), LineOutcome::Empty);
        assert_eq!(session.past_defs().len(), 1);
        assert_eq!(session.past_defs()[0].kind, PastDefKind::Import);
    }

    #[test]
    fn lambdas_render_as_functions() {
        let mut session = ReplSession::new(false);
        match session.eval_line("|x| x + 1") {
            LineOutcome::Value(v) => assert_eq!(v, "<function> : Int -> Int"),
            other => panic!("got {other:?}"),
        }
    }
}
