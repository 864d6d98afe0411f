use pretty_assertions::assert_eq;
use rill_ir::Region;

use crate::{Diagnostic, ErrorCode};

use super::{line_col, render, RenderTarget};

#[test]
fn line_col_handles_multiline_sources() {
    let src = "abc\ndef\nghi";
    assert_eq!(line_col(src, 0), (0, 0));
    assert_eq!(line_col(src, 5), (1, 1));
    assert_eq!(line_col(src, 8), (2, 0));
}

#[test]
fn plain_text_render_underlines_the_region() {
    let src = "foo + bar";
    let diag = Diagnostic::error(ErrorCode::E3001)
        .with_message("nothing is named `bar` in this scope")
        .with_region(Region::new(6, 9));
    let mut out = String::new();
    let _ = render(&diag, Some(src), RenderTarget::PlainText, &mut out);
    assert!(out.contains("-- UNKNOWN NAME"), "got: {out}");
    assert!(out.contains("   1 | foo + bar"), "got: {out}");
    assert!(out.contains("     |       ^^^"), "got: {out}");
}

#[test]
fn color_render_emits_ansi() {
    let diag = Diagnostic::error(ErrorCode::E5002).with_message("cannot divide by zero");
    let mut out = String::new();
    let _ = render(&diag, None, RenderTarget::ColorTerminal, &mut out);
    assert!(out.contains("\x1b[31m"));
}

#[test]
fn lsp_render_is_single_line() {
    let diag = Diagnostic::error(ErrorCode::E2001)
        .with_message("unexpected token")
        .with_region(Region::new(2, 3));
    let mut out = String::new();
    let _ = render(&diag, None, RenderTarget::Lsp, &mut out);
    assert_eq!(out, "error:E2001:2..3: unexpected token\n");
}
