//! Raw-token to interned-token conversion.
//!
//! Drops comments, collapses newline runs, parses numeric literals,
//! resolves string escapes, and interns names. Scan failures become
//! [`LexError`] values; a placeholder is never inserted into the token
//! stream, so the parser sees only well-formed tokens plus the error list.

use logos::Logos;

use rill_ir::{Region, StringInterner};

use crate::raw_token::RawToken;
use crate::token::{Token, TokenKind};

/// A lexing problem attached to a source region.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub region: Region,
}

/// What went wrong while scanning.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum LexErrorKind {
    /// Bytes no token rule matched.
    UnrecognizedCharacter,
    /// A string literal ran to end of line/input without a closing quote.
    UnterminatedString,
    /// Integer literal does not fit in `i64`.
    IntOutOfRange,
    /// Fractional literal failed to parse (malformed exponent).
    MalformedFrac,
    /// An escape sequence the string grammar does not define.
    InvalidEscape,
}

impl std::fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexErrorKind::UnrecognizedCharacter => write!(f, "unrecognized character"),
            LexErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
            LexErrorKind::IntOutOfRange => write!(f, "integer literal out of range"),
            LexErrorKind::MalformedFrac => write!(f, "malformed fractional literal"),
            LexErrorKind::InvalidEscape => write!(f, "invalid escape sequence"),
        }
    }
}

/// Tokenizer output: the token stream plus any scan errors.
#[derive(Clone, Debug, Default)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

impl LexOutput {
    /// Whether scanning produced any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Tokenize `source`, interning names and literals into `interner`.
pub fn tokenize(source: &str, interner: &StringInterner) -> LexOutput {
    let mut out = LexOutput::default();
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        let region = Region::from_range(lexer.span());
        let raw = match result {
            Ok(raw) => raw,
            Err(()) => {
                out.errors.push(LexError {
                    kind: LexErrorKind::UnrecognizedCharacter,
                    region,
                });
                continue;
            }
        };
        let text = lexer.slice();

        let kind = match raw {
            RawToken::LineComment => continue,
            RawToken::Newline => {
                // Collapse newline runs: one separator token per run.
                if matches!(
                    out.tokens.last(),
                    Some(Token {
                        kind: TokenKind::Newline,
                        ..
                    })
                ) {
                    continue;
                }
                TokenKind::Newline
            }
            RawToken::If => TokenKind::KwIf,
            RawToken::Else => TokenKind::KwElse,
            RawToken::Match => TokenKind::KwMatch,
            RawToken::Import => TokenKind::KwImport,
            RawToken::And => TokenKind::KwAnd,
            RawToken::Or => TokenKind::KwOr,
            RawToken::As => TokenKind::KwAs,
            RawToken::True => TokenKind::KwTrue,
            RawToken::False => TokenKind::KwFalse,
            RawToken::LowerIdent => TokenKind::LowerIdent(interner.intern(text)),
            RawToken::UpperIdent => TokenKind::UpperIdent(interner.intern(text)),
            RawToken::Underscore => TokenKind::Underscore(interner.intern(&text[1..])),
            RawToken::Int => match parse_int(text) {
                Some(value) => TokenKind::Int(value),
                None => {
                    out.errors.push(LexError {
                        kind: LexErrorKind::IntOutOfRange,
                        region,
                    });
                    continue;
                }
            },
            RawToken::Frac => match parse_frac(text) {
                Some(bits) => TokenKind::Frac(bits),
                None => {
                    out.errors.push(LexError {
                        kind: LexErrorKind::MalformedFrac,
                        region,
                    });
                    continue;
                }
            },
            RawToken::Str => match unescape(&text[1..text.len() - 1]) {
                Some(content) => TokenKind::Str(interner.intern(&content)),
                None => {
                    out.errors.push(LexError {
                        kind: LexErrorKind::InvalidEscape,
                        region,
                    });
                    continue;
                }
            },
            RawToken::UnterminatedStr => {
                out.errors.push(LexError {
                    kind: LexErrorKind::UnterminatedString,
                    region,
                });
                continue;
            }
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::LBracket => TokenKind::LBracket,
            RawToken::RBracket => TokenKind::RBracket,
            RawToken::Arrow => TokenKind::Arrow,
            RawToken::Bar => TokenKind::Bar,
            RawToken::Comma => TokenKind::Comma,
            RawToken::DotDot => TokenKind::DotDot,
            RawToken::Semicolon => TokenKind::Semicolon,
            RawToken::Colon => TokenKind::Colon,
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::Assign => TokenKind::Assign,
            RawToken::NotEq => TokenKind::NotEq,
            RawToken::Bang => TokenKind::Bang,
            RawToken::Le => TokenKind::Le,
            RawToken::Lt => TokenKind::Lt,
            RawToken::Ge => TokenKind::Ge,
            RawToken::Gt => TokenKind::Gt,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::SlashSlash => TokenKind::SlashSlash,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Percent => TokenKind::Percent,
        };

        out.tokens.push(Token { kind, region });
    }

    let end = Region::from_range(source.len()..source.len());
    out.tokens.push(Token {
        kind: TokenKind::Eof,
        region: end,
    });
    out
}

/// Parse an integer literal, skipping `_` separators.
fn parse_int(text: &str) -> Option<i64> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    cleaned.parse::<i64>().ok()
}

/// Parse a fractional literal to `f64` bits, skipping `_` separators.
fn parse_frac(text: &str) -> Option<u64> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    cleaned.parse::<f64>().ok().map(f64::to_bits)
}

/// Resolve string escapes: `\n`, `\t`, `\\`, `\"`, `\u(HEX)`.
fn unescape(content: &str) -> Option<String> {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            'u' => {
                if chars.next()? != '(' {
                    return None;
                }
                let hex: String = chars.by_ref().take_while(|&c| c != ')').collect();
                let code = u32::from_str_radix(&hex, 16).ok()?;
                out.push(char::from_u32(code)?);
            }
            _ => return None,
        }
    }
    Some(out)
}
