use pretty_assertions::assert_eq;
use rill_ir::StringInterner;

use super::*;

fn kinds(source: &str) -> Vec<TokenKind> {
    let interner = StringInterner::new();
    tokenize(source, &interner)
        .tokens
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn lambda_tokens() {
    let interner = StringInterner::new();
    let out = tokenize("|x| x + 1", &interner);
    assert!(!out.has_errors());
    let x = interner.intern("x");
    assert_eq!(
        out.tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
        vec![
            TokenKind::Bar,
            TokenKind::LowerIdent(x),
            TokenKind::Bar,
            TokenKind::LowerIdent(x),
            TokenKind::Plus,
            TokenKind::Int(1),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn keywords_beat_identifiers() {
    assert_eq!(
        kinds("if else match import and or as"),
        vec![
            TokenKind::KwIf,
            TokenKind::KwElse,
            TokenKind::KwMatch,
            TokenKind::KwImport,
            TokenKind::KwAnd,
            TokenKind::KwOr,
            TokenKind::KwAs,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn numeric_literals() {
    assert_eq!(
        kinds("42 1_000 3.14"),
        vec![
            TokenKind::Int(42),
            TokenKind::Int(1000),
            TokenKind::Frac(3.14_f64.to_bits()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn int_out_of_range_is_an_error() {
    let interner = StringInterner::new();
    let out = tokenize("99999999999999999999", &interner);
    assert!(out.has_errors());
    assert_eq!(out.errors[0].kind, LexErrorKind::IntOutOfRange);
}

#[test]
fn string_escapes_resolve() {
    let interner = StringInterner::new();
    let out = tokenize(r#""a\nb\u(1F600)""#, &interner);
    assert!(!out.has_errors());
    match out.tokens[0].kind {
        TokenKind::Str(name) => assert_eq!(interner.lookup(name), "a\nb😀"),
        other => panic!("expected Str, got {other:?}"),
    }
}

#[test]
fn unterminated_string_reported() {
    let interner = StringInterner::new();
    let out = tokenize("\"abc", &interner);
    assert_eq!(out.errors[0].kind, LexErrorKind::UnterminatedString);
}

#[test]
fn newline_runs_collapse() {
    assert_eq!(
        kinds("a\n\n\nb"),
        vec![
            TokenKind::LowerIdent(rill_ir::Name::from_raw(1)),
            TokenKind::Newline,
            TokenKind::LowerIdent(rill_ir::Name::from_raw(2)),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn comments_are_dropped() {
    assert_eq!(
        kinds("1 # comment\n2"),
        vec![
            TokenKind::Int(1),
            TokenKind::Newline,
            TokenKind::Int(2),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn slash_slash_is_one_token() {
    assert_eq!(
        kinds("7 // 2"),
        vec![
            TokenKind::Int(7),
            TokenKind::SlashSlash,
            TokenKind::Int(2),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn regions_cover_the_source() {
    let interner = StringInterner::new();
    let out = tokenize("ab + cd", &interner);
    assert_eq!(out.tokens[0].region, rill_ir::Region::new(0, 2));
    assert_eq!(out.tokens[1].region, rill_ir::Region::new(3, 4));
    assert_eq!(out.tokens[2].region, rill_ir::Region::new(5, 7));
}
