//! Snapshot test files.
//!
//! A snapshot is a text file with labeled sections delimited by `# NAME`
//! headers. `META`, `SOURCE`, and `EXPECTED` are authored; `TOKENS`,
//! `PARSE`, `FORMATTED`, `CANONICALIZE`, `TYPES`, and `PROBLEMS` are
//! deterministic functions of `SOURCE` and are regenerated by the runner.
//! A snapshot passes when the regenerated file is byte-identical to the
//! file on disk *and* its `EXPECTED` assertion holds.

mod runner;

pub use runner::{run_snapshots, SnapshotSummary};

use std::fmt::Write as _;

use rill_diagnostic::DiagnosticQueue;
use rill_ir::StringInterner;

use crate::format::format_file;
use crate::reporting::problems_section;
use crate::session::{LineOutcome, ReplSession};

/// What the snapshot's `SOURCE` is parsed as.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SnapshotKind {
    File,
    Expr,
    Statement,
    Header,
    Repl,
}

impl SnapshotKind {
    fn parse(text: &str) -> Option<Self> {
        Some(match text {
            "file" => SnapshotKind::File,
            "expr" => SnapshotKind::Expr,
            "statement" => SnapshotKind::Statement,
            "header" => SnapshotKind::Header,
            "repl" => SnapshotKind::Repl,
            _ => return None,
        })
    }

    fn as_str(self) -> &'static str {
        match self {
            SnapshotKind::File => "file",
            SnapshotKind::Expr => "expr",
            SnapshotKind::Statement => "statement",
            SnapshotKind::Header => "header",
            SnapshotKind::Repl => "repl",
        }
    }
}

/// The authored parts of a snapshot file.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub description: String,
    pub kind: SnapshotKind,
    pub source: String,
    pub expected: String,
}

/// A snapshot file that could not be parsed.
#[derive(Clone, Debug)]
pub struct SnapshotError(pub String);

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid snapshot: {}", self.0)
    }
}

impl std::error::Error for SnapshotError {}

/// Parse a snapshot file's authored sections.
///
/// Generated sections present in the file are ignored here; the runner
/// re-derives them and compares the regenerated whole.
pub fn parse_snapshot(text: &str) -> Result<Snapshot, SnapshotError> {
    let mut sections: Vec<(String, Vec<&str>)> = Vec::new();
    for line in text.lines() {
        if let Some(name) = line.strip_prefix("# ") {
            sections.push((name.trim().to_owned(), Vec::new()));
        } else if let Some((_, body)) = sections.last_mut() {
            body.push(line);
        } else if !line.trim().is_empty() {
            return Err(SnapshotError(format!("content before first section: {line}")));
        }
    }

    let find = |name: &str| {
        sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, body)| body.join("\n"))
    };

    let meta = find("META").ok_or_else(|| SnapshotError("missing META section".to_owned()))?;
    let mut description = String::new();
    let mut kind = None;
    for line in meta.lines() {
        if let Some(value) = line.strip_prefix("description=") {
            description = value.to_owned();
        } else if let Some(value) = line.strip_prefix("type=") {
            kind = SnapshotKind::parse(value.trim());
        }
    }
    let kind = kind.ok_or_else(|| SnapshotError("META is missing a valid type".to_owned()))?;

    let source_raw =
        find("SOURCE").ok_or_else(|| SnapshotError("missing SOURCE section".to_owned()))?;
    let source = strip_fences(&source_raw)
        .ok_or_else(|| SnapshotError("SOURCE is not fenced with ~~~".to_owned()))?;

    let expected = find("EXPECTED").map_or_else(|| "NIL".to_owned(), |e| e.trim().to_owned());

    Ok(Snapshot {
        description,
        kind,
        source,
        expected,
    })
}

fn strip_fences(body: &str) -> Option<String> {
    let mut lines = body.lines();
    if lines.next()?.trim() != "~~~" {
        return None;
    }
    let mut content = Vec::new();
    for line in lines {
        if line.trim() == "~~~" {
            return Some(if content.is_empty() {
                String::new()
            } else {
                content.join("\n") + "\n"
            });
        }
        content.push(line);
    }
    None
}

/// Regenerate the full snapshot file text: authored sections verbatim,
/// generated sections derived from `SOURCE`.
pub fn regenerate(snapshot: &Snapshot) -> String {
    let generated = generate_sections(snapshot);
    let mut out = String::new();
    let _ = writeln!(out, "# META");
    let _ = writeln!(out, "description={}", snapshot.description);
    let _ = writeln!(out, "type={}", snapshot.kind.as_str());
    let _ = writeln!(out, "# SOURCE");
    let _ = writeln!(out, "~~~");
    out.push_str(&snapshot.source);
    let _ = writeln!(out, "~~~");
    let _ = writeln!(out, "# EXPECTED");
    let _ = writeln!(out, "{}", snapshot.expected);
    for (name, content) in generated {
        let _ = writeln!(out, "# {name}");
        out.push_str(&content);
    }
    out
}

/// The generated sections, in canonical order. Every section's content
/// ends with a newline.
fn generate_sections(snapshot: &Snapshot) -> Vec<(&'static str, String)> {
    // Every kind derives its program sections from the source as a file:
    // a single expression or statement is a valid one-item file, and a
    // REPL transcript's concatenated lines replay as the accumulated
    // program. The kind only changes how `EXPECTED` is checked.
    let interner = StringInterner::new();
    let source = snapshot.source.clone();

    // TOKENS
    let lexed = rill_lexer::tokenize(&source, &interner);
    let mut tokens = String::new();
    for token in &lexed.tokens {
        tokens.push_str(&token.snapshot_line(&interner));
        tokens.push('\n');
    }

    // PARSE + FORMATTED share the parse.
    let parsed = rill_parse::parse_file(&source, &interner);
    let parse_section = rill_parse::render_file_sexpr(&parsed.ast, &interner);
    let formatted = format_file(&parsed.ast, &interner);
    let formatted_section = if formatted == source {
        "NO CHANGE\n".to_owned()
    } else {
        formatted
    };

    // CANONICALIZE
    let canon = rill_canon::canonicalize_file(&parsed.ast, &interner);
    let canonicalize_section =
        rill_ir::can::SexprRenderer::new(&canon.arena, &interner).render_program(canon.root);

    // TYPES
    let types = rill_types::solve(&canon.arena, canon.root, &interner);
    let mut types_section = String::new();
    for (i, decl) in canon.arena.decls().iter().enumerate() {
        let _ = writeln!(
            types_section,
            "{} : {}",
            interner.lookup(decl.name),
            rill_types::type_string(
                &types.pool,
                types.decl_type(rill_ir::can::DeclId::new(
                    u32::try_from(i).unwrap_or(u32::MAX)
                )),
                &interner
            )
        );
    }
    if canon.root.is_valid() {
        let _ = writeln!(
            types_section,
            "expr : {}",
            rill_types::type_string(&types.pool, types.expr_type(canon.root), &interner)
        );
    }
    if types_section.is_empty() {
        types_section.push_str("NIL\n");
    }

    // PROBLEMS
    let mut queue = DiagnosticQueue::new();
    queue.extend(parsed.errors.iter().map(rill_parse::ParseError::to_diagnostic));
    queue.extend(canon.diagnostics.iter().cloned());
    queue.extend(types.diagnostics.iter().cloned());
    let problems = problems_section(&queue.flush());

    vec![
        ("TOKENS", tokens),
        ("PARSE", parse_section),
        ("FORMATTED", formatted_section),
        ("CANONICALIZE", canonicalize_section),
        ("TYPES", types_section),
        ("PROBLEMS", problems),
    ]
}

/// Check the `EXPECTED` assertion against the source's actual behavior.
///
/// - `NIL`: no problems may be reported.
/// - a diagnostic summary prefix (e.g. `ident_not_in_scope@4..7`): a
///   matching problem must be reported.
/// - for `repl` snapshots: the expected outputs, separated by `---`
///   lines, compared against running each source line in a session.
pub fn check_expected(snapshot: &Snapshot) -> Result<(), String> {
    if snapshot.kind == SnapshotKind::Repl {
        return check_repl_expected(snapshot);
    }

    let interner = StringInterner::new();
    let parsed = rill_parse::parse_file(&snapshot.source, &interner);
    let canon = rill_canon::canonicalize_file(&parsed.ast, &interner);
    let types = rill_types::solve(&canon.arena, canon.root, &interner);
    let mut queue = DiagnosticQueue::new();
    queue.extend(parsed.errors.iter().map(rill_parse::ParseError::to_diagnostic));
    queue.extend(canon.diagnostics.iter().cloned());
    queue.extend(types.diagnostics.iter().cloned());
    let problems = queue.flush();

    if snapshot.expected == "NIL" {
        if let Some(problem) = problems.first() {
            return Err(format!("expected no problems, found: {}", problem.summary()));
        }
        return Ok(());
    }
    let wanted = snapshot.expected.trim();
    if problems.iter().any(|p| p.summary().starts_with(wanted)) {
        Ok(())
    } else {
        Err(format!(
            "expected a problem matching `{wanted}`, found: {:?}",
            problems.iter().map(rill_diagnostic::Diagnostic::summary).collect::<Vec<_>>()
        ))
    }
}

fn check_repl_expected(snapshot: &Snapshot) -> Result<(), String> {
    let mut session = ReplSession::new(false);
    let mut actual = Vec::new();
    for line in snapshot.source.lines() {
        match session.eval_line(line) {
            LineOutcome::Value(v) => actual.push(v),
            LineOutcome::Empty => actual.push(String::new()),
            LineOutcome::Report(r) => {
                actual.push(r.lines().next().unwrap_or("").to_owned());
            }
            LineOutcome::Help | LineOutcome::Exit => actual.push(String::new()),
        }
    }
    let actual = actual.join("\n---\n");
    let expected = snapshot.expected.trim();
    if actual.trim() == expected {
        Ok(())
    } else {
        Err(format!("repl outputs differ\nexpected:\n{expected}\nactual:\n{actual}"))
    }
}

#[cfg(test)]
mod tests;
