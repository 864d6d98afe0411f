//! Rill Parse - parser for the Rill compiler.
//!
//! Recursive descent with Pratt-style operator precedence, producing the
//! read-only [`Ast`](rill_ir::ast::Ast) arena. Three entry points:
//!
//! - [`parse_expr`]: one expression (REPL evaluation target).
//! - [`parse_statement`]: one top-level item (REPL line).
//! - [`parse_file`]: a whole file of top-level items.
//!
//! Parse failures never abort: the offending region becomes a
//! [`ParseExpr::Malformed`](rill_ir::ast::ParseExpr) node and a
//! [`ParseError`] is recorded, so downstream phases always receive a
//! complete tree.

mod ast_sexpr;
mod error;
mod parser;

mod grammar;

pub use ast_sexpr::{render_file_sexpr, render_item_sexpr};
pub use error::{ParseError, ParseErrorKind};
pub use parser::{FileOutput, ParseOutput, StatementOutput};

use rill_ir::ast::TopLevel;
use rill_ir::StringInterner;

/// Parse a single expression.
pub fn parse_expr(source: &str, interner: &StringInterner) -> ParseOutput {
    parser::Parser::new(source, interner).run_expr()
}

/// Parse one top-level statement (definition, import, or expression).
pub fn parse_statement(source: &str, interner: &StringInterner) -> StatementOutput {
    parser::Parser::new(source, interner).run_statement()
}

/// Parse a whole file of top-level items.
pub fn parse_file(source: &str, interner: &StringInterner) -> FileOutput {
    parser::Parser::new(source, interner).run_file()
}

/// Whether a parsed statement is a definition (vs an expression).
pub fn is_definition(item: &TopLevel) -> bool {
    matches!(item, TopLevel::Def { .. } | TopLevel::Import { .. })
}

#[cfg(test)]
mod tests;
