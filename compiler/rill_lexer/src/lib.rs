//! Rill Lexer - tokenizer for the Rill compiler.
//!
//! Two stages, mirroring the token pipeline the parser expects:
//!
//! 1. [`raw_token::RawToken`]: the logos-derived scanner output, spans only.
//! 2. [`Token`]: interned tokens with [`Region`](rill_ir::Region)s, numeric
//!    literals parsed, string escapes resolved.
//!
//! The conversion stage ([`tokenize`]) never fails as a whole: scan errors
//! become [`LexError`] values alongside the tokens that did lex, so the
//! parser always receives a usable stream.

mod convert;
mod raw_token;
mod token;

pub use convert::{tokenize, LexError, LexErrorKind, LexOutput};
pub use token::{Token, TokenKind};

#[cfg(test)]
mod tests;
