//! Raw token definition.
//!
//! The [`RawToken`] enum is the logos-derived scanner output before string
//! interning and final token conversion.

use logos::Logos;

/// Raw token from logos (before interning).
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r]+")] // Skip horizontal whitespace
pub(crate) enum RawToken {
    #[regex(r"#[^\n]*")]
    LineComment,

    #[token("\n")]
    Newline,

    // Keywords
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("match")]
    Match,
    #[token("import")]
    Import,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("as")]
    As,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Identifiers
    #[regex(r"[a-z][a-zA-Z0-9_]*")]
    LowerIdent,
    #[regex(r"[A-Z][a-zA-Z0-9_]*")]
    UpperIdent,
    #[regex(r"_[a-zA-Z0-9_]*")]
    Underscore,

    // Literals
    #[regex(r"[0-9][0-9_]*")]
    Int,
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?")]
    Frac,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,
    /// A string missing its closing quote (ends at newline or EOF).
    #[regex(r#""([^"\\\n]|\\.)*"#)]
    UnterminatedStr,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // Punctuation
    #[token("->")]
    Arrow,
    #[token("|")]
    Bar,
    #[token(",")]
    Comma,
    #[token("..")]
    DotDot,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,

    // Operators
    #[token("==")]
    EqEq,
    #[token("=")]
    Assign,
    #[token("!=")]
    NotEq,
    #[token("!")]
    Bang,
    #[token("<=")]
    Le,
    #[token("<")]
    Lt,
    #[token(">=")]
    Ge,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("//")]
    SlashSlash,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
}
