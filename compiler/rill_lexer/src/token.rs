//! Interned token type consumed by the parser.

use rill_ir::{Name, Region, StringInterner};
use std::fmt::Write as _;

/// Token kind after interning and literal parsing.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TokenKind {
    /// Integer literal.
    Int(i64),
    /// Fractional literal as `f64` bits.
    Frac(u64),
    /// String literal, escapes resolved, interned.
    Str(Name),
    /// Lowercase identifier.
    LowerIdent(Name),
    /// Uppercase identifier (a tag).
    UpperIdent(Name),
    /// `_` or `_name`.
    Underscore(Name),

    KwIf,
    KwElse,
    KwMatch,
    KwImport,
    KwAnd,
    KwOr,
    KwAs,
    KwTrue,
    KwFalse,

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    Arrow,
    Bar,
    Comma,
    DotDot,
    Semicolon,
    Colon,

    Assign,
    EqEq,
    NotEq,
    Bang,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    SlashSlash,
    Percent,

    /// Statement separator (one or more newlines collapse to one token).
    Newline,
    /// End of input; always the final token.
    Eof,
}

impl TokenKind {
    /// Human-readable description used in parse error messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Int(_) => "an integer",
            TokenKind::Frac(_) => "a fraction",
            TokenKind::Str(_) => "a string",
            TokenKind::LowerIdent(_) => "an identifier",
            TokenKind::UpperIdent(_) => "a tag",
            TokenKind::Underscore(_) => "`_`",
            TokenKind::KwIf => "`if`",
            TokenKind::KwElse => "`else`",
            TokenKind::KwMatch => "`match`",
            TokenKind::KwImport => "`import`",
            TokenKind::KwAnd => "`and`",
            TokenKind::KwOr => "`or`",
            TokenKind::KwAs => "`as`",
            TokenKind::KwTrue => "`true`",
            TokenKind::KwFalse => "`false`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Arrow => "`->`",
            TokenKind::Bar => "`|`",
            TokenKind::Comma => "`,`",
            TokenKind::DotDot => "`..`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Colon => "`:`",
            TokenKind::Assign => "`=`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Bang => "`!`",
            TokenKind::Lt => "`<`",
            TokenKind::Le => "`<=`",
            TokenKind::Gt => "`>`",
            TokenKind::Ge => "`>=`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::SlashSlash => "`//`",
            TokenKind::Percent => "`%`",
            TokenKind::Newline => "a newline",
            TokenKind::Eof => "end of input",
        }
    }
}

/// One token with its source region.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub region: Region,
}

impl Token {
    /// Render for the `TOKENS` snapshot section: `Kind @ start..end`.
    pub fn snapshot_line(&self, interner: &StringInterner) -> String {
        let mut out = String::new();
        match self.kind {
            TokenKind::Int(value) => {
                let _ = write!(out, "Int({value})");
            }
            TokenKind::Frac(bits) => {
                let _ = write!(out, "Frac({})", f64::from_bits(bits));
            }
            TokenKind::Str(name) => {
                let _ = write!(out, "Str({:?})", interner.lookup(name));
            }
            TokenKind::LowerIdent(name) => {
                let _ = write!(out, "LowerIdent({})", interner.lookup(name));
            }
            TokenKind::UpperIdent(name) => {
                let _ = write!(out, "UpperIdent({})", interner.lookup(name));
            }
            TokenKind::Underscore(name) => {
                let _ = write!(out, "Underscore({})", interner.lookup(name));
            }
            other => {
                let _ = write!(out, "{other:?}");
            }
        }
        let _ = write!(out, " @ {}", self.region);
        out
    }
}
