//! Diagnostic rendering.
//!
//! The compiler core constructs [`Diagnostic`](crate::Diagnostic) values;
//! this module is the sink that formats them. Four targets: a color
//! terminal, plain text (used by snapshots and tests), a minimal HTML
//! wrapping, and a single-line LSP-ish form.

use std::fmt::Write;

use rill_ir::Region;

use crate::{Diagnostic, Severity};

#[cfg(test)]
mod tests;

/// Output target for rendering.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum RenderTarget {
    ColorTerminal,
    PlainText,
    Html,
    Lsp,
}

/// ANSI sequences, empty for non-color targets.
struct Styles {
    bold: &'static str,
    red: &'static str,
    yellow: &'static str,
    cyan: &'static str,
    reset: &'static str,
}

impl Styles {
    fn for_target(target: RenderTarget) -> Self {
        if target == RenderTarget::ColorTerminal {
            Styles {
                bold: "\x1b[1m",
                red: "\x1b[31m",
                yellow: "\x1b[33m",
                cyan: "\x1b[36m",
                reset: "\x1b[0m",
            }
        } else {
            Styles {
                bold: "",
                red: "",
                yellow: "",
                cyan: "",
                reset: "",
            }
        }
    }
}

/// Render one diagnostic to `out`.
///
/// `source` enables the snippet-with-underline block; without it only the
/// header, message, and hint are rendered.
pub fn render(
    diag: &Diagnostic,
    source: Option<&str>,
    target: RenderTarget,
    out: &mut String,
) -> std::fmt::Result {
    match target {
        RenderTarget::ColorTerminal | RenderTarget::PlainText => {
            render_terminal(diag, source, target, out)
        }
        RenderTarget::Html => render_html(diag, source, out),
        RenderTarget::Lsp => render_lsp(diag, out),
    }
}

fn render_terminal(
    diag: &Diagnostic,
    source: Option<&str>,
    target: RenderTarget,
    out: &mut String,
) -> std::fmt::Result {
    let styles = Styles::for_target(target);
    let color = match diag.severity {
        Severity::Error => styles.red,
        Severity::Warning => styles.yellow,
        Severity::Note => styles.cyan,
    };

    // Header: `-- TITLE ----- [severity code]`
    writeln!(
        out,
        "{}{color}-- {} {} [{} {}]{}",
        styles.bold,
        diag.title,
        "-".repeat(40_usize.saturating_sub(diag.title.len())),
        diag.severity,
        diag.code,
        styles.reset
    )?;
    writeln!(out)?;
    writeln!(out, "{}", diag.message)?;

    if let (Some(region), Some(src)) = (diag.region, source) {
        writeln!(out)?;
        render_snippet(region, src, color, &styles, out)?;
    }
    for label in &diag.labels {
        if let Some(src) = source {
            writeln!(out)?;
            writeln!(out, "{}:", label.message)?;
            render_snippet(label.region, src, styles.cyan, &styles, out)?;
        }
    }
    if let Some(hint) = &diag.hint {
        writeln!(out)?;
        writeln!(out, "{}hint:{} {hint}", styles.bold, styles.reset)?;
    }
    Ok(())
}

/// Write the `line | text` snippet with a caret underline.
fn render_snippet(
    region: Region,
    source: &str,
    color: &str,
    styles: &Styles,
    out: &mut String,
) -> std::fmt::Result {
    let (line_idx, col) = line_col(source, region.start);
    let line_text = source.lines().nth(line_idx).unwrap_or("");
    let line_no = line_idx + 1;
    let underline_len = (region.len() as usize).clamp(1, line_text.len().saturating_sub(col).max(1));

    writeln!(out, "{line_no:>4} | {line_text}")?;
    writeln!(
        out,
        "     | {}{color}{}{}",
        " ".repeat(col),
        "^".repeat(underline_len),
        styles.reset
    )
}

/// Byte offset → zero-based (line, column).
fn line_col(source: &str, offset: u32) -> (usize, usize) {
    let offset = (offset as usize).min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count();
    let col = before.rfind('\n').map_or(offset, |nl| offset - nl - 1);
    (line, col)
}

fn render_html(diag: &Diagnostic, source: Option<&str>, out: &mut String) -> std::fmt::Result {
    let mut plain = String::new();
    render_terminal(diag, source, RenderTarget::PlainText, &mut plain)?;
    writeln!(
        out,
        "<pre class=\"diagnostic {}\">{}</pre>",
        diag.severity,
        html_escape(&plain)
    )
}

fn render_lsp(diag: &Diagnostic, out: &mut String) -> std::fmt::Result {
    // One line per diagnostic: severity, code, range, message.
    let range = diag
        .region
        .map_or_else(|| "0..0".to_owned(), |region| region.to_string());
    writeln!(
        out,
        "{}:{}:{}: {}",
        diag.severity, diag.code, range, diag.message
    )
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
