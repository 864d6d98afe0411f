//! Typed parse errors.

use rill_diagnostic::{Diagnostic, ErrorCode};
use rill_ir::Region;
use rill_lexer::{LexError, LexErrorKind};

/// A parse problem attached to a source region.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub region: Region,
}

/// What went wrong while parsing.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ParseErrorKind {
    /// A scan-stage problem, forwarded so callers see one error list.
    Tokenize(LexErrorKind),
    /// The parser expected `expected` but found `found`.
    UnexpectedToken {
        expected: &'static str,
        found: &'static str,
    },
    /// An expression was required here.
    ExpectedExpression { found: &'static str },
    /// A pattern was required here.
    ExpectedPattern { found: &'static str },
    /// An opening delimiter was never closed.
    UnclosedDelimiter { open: &'static str },
}

impl ParseError {
    /// Convert to a structured diagnostic for rendering.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match &self.kind {
            ParseErrorKind::Tokenize(lex) => {
                let code = match lex {
                    LexErrorKind::UnterminatedString => ErrorCode::E1002,
                    _ => ErrorCode::E1001,
                };
                Diagnostic::error(code)
                    .with_message(lex.to_string())
                    .with_region(self.region)
            }
            ParseErrorKind::UnexpectedToken { expected, found } => {
                Diagnostic::error(ErrorCode::E2001)
                    .with_message(format!("expected {expected}, found {found}"))
                    .with_region(self.region)
            }
            ParseErrorKind::ExpectedExpression { found } => Diagnostic::error(ErrorCode::E2002)
                .with_message(format!("expected an expression, found {found}"))
                .with_region(self.region),
            ParseErrorKind::ExpectedPattern { found } => Diagnostic::error(ErrorCode::E2002)
                .with_message(format!("expected a pattern, found {found}"))
                .with_region(self.region),
            ParseErrorKind::UnclosedDelimiter { open } => Diagnostic::error(ErrorCode::E2003)
                .with_message(format!("this {open} is never closed"))
                .with_region(self.region),
        }
    }

    /// Forward a lexer error.
    pub fn from_lex(err: &LexError) -> Self {
        ParseError {
            kind: ParseErrorKind::Tokenize(err.kind.clone()),
            region: err.region,
        }
    }
}
