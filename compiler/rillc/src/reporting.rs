//! Diagnostic rendering glue.

use rill_diagnostic::emitter::{render, RenderTarget};
use rill_diagnostic::Diagnostic;

/// Render a batch of reports against their source.
pub fn render_reports(reports: &[Diagnostic], source: &str, use_color: bool) -> String {
    let target = if use_color {
        RenderTarget::ColorTerminal
    } else {
        RenderTarget::PlainText
    };
    let mut out = String::new();
    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = render(report, Some(source), target, &mut out);
    }
    out
}

/// Render reports for the `PROBLEMS` snapshot section: one summary line
/// per diagnostic, `NIL` when empty.
pub fn problems_section(reports: &[Diagnostic]) -> String {
    if reports.is_empty() {
        return "NIL\n".to_owned();
    }
    let mut out = String::new();
    for report in reports {
        out.push_str(&report.summary());
        out.push('\n');
    }
    out
}
