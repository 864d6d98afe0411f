//! Parser state and entry-point drivers.

use rill_ir::ast::{Ast, NodeId, ParseExpr, TopLevel};
use rill_ir::{Region, StringInterner};
use rill_lexer::{tokenize, Token, TokenKind};

use crate::error::{ParseError, ParseErrorKind};

/// Output of [`parse_expr`](crate::parse_expr).
#[derive(Debug)]
pub struct ParseOutput {
    pub ast: Ast,
    pub root: NodeId,
    pub errors: Vec<ParseError>,
}

impl ParseOutput {
    /// Whether any stage produced errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Output of [`parse_statement`](crate::parse_statement).
#[derive(Debug)]
pub struct StatementOutput {
    pub ast: Ast,
    pub item: TopLevel,
    pub errors: Vec<ParseError>,
}

impl StatementOutput {
    /// Whether any stage produced errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Output of [`parse_file`](crate::parse_file). Items live in `ast.items`.
#[derive(Debug)]
pub struct FileOutput {
    pub ast: Ast,
    pub errors: Vec<ParseError>,
}

impl FileOutput {
    /// Whether any stage produced errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Parser state: a token cursor over one source text plus the arena and
/// error list being built.
///
/// Names and literals were interned by the lexer; the parser works purely
/// on tokens.
pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Region of the most recently consumed token.
    last_region: Region,
    pub(crate) ast: Ast,
    pub(crate) errors: Vec<ParseError>,
}

impl Parser {
    pub(crate) fn new(source: &str, interner: &StringInterner) -> Self {
        let lexed = tokenize(source, interner);
        tracing::trace!(tokens = lexed.tokens.len(), "tokenized");
        let errors = lexed.errors.iter().map(ParseError::from_lex).collect();
        Parser {
            tokens: lexed.tokens,
            pos: 0,
            last_region: Region::DUMMY,
            ast: Ast::new(),
            errors,
        }
    }

    // Entry points

    pub(crate) fn run_expr(mut self) -> ParseOutput {
        self.skip_newlines();
        let root = self.expr();
        self.skip_newlines();
        self.expect_eof();
        ParseOutput {
            ast: self.ast,
            root,
            errors: self.errors,
        }
    }

    pub(crate) fn run_statement(mut self) -> StatementOutput {
        self.skip_newlines();
        let item = self.top_level_item();
        self.skip_newlines();
        self.expect_eof();
        StatementOutput {
            ast: self.ast,
            item,
            errors: self.errors,
        }
    }

    pub(crate) fn run_file(mut self) -> FileOutput {
        loop {
            self.skip_newlines();
            if self.at(TokenKind::Eof) {
                break;
            }
            let item = self.top_level_item();
            self.ast.items.push(item);
            // Items are separated by newlines; anything else is noise we
            // recover past in `top_level_item`.
        }
        FileOutput {
            ast: self.ast,
            errors: self.errors,
        }
    }

    fn expect_eof(&mut self) {
        if !self.at(TokenKind::Eof) {
            let region = self.peek_region();
            let found = self.peek().kind.describe();
            self.push_error(
                ParseErrorKind::UnexpectedToken {
                    expected: "end of input",
                    found,
                },
                region,
            );
        }
    }

    // Token cursor

    /// Current token (never past `Eof`).
    pub(crate) fn peek(&self) -> Token {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Current token kind.
    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    /// Current token's region.
    pub(crate) fn peek_region(&self) -> Region {
        self.peek().region
    }

    /// Kind of the `n`-th token ahead (0 = current), newlines included.
    pub(crate) fn peek_nth(&self, n: usize) -> TokenKind {
        self.tokens[(self.pos + n).min(self.tokens.len() - 1)].kind
    }

    /// Kind of the `n`-th token ahead, counting only non-newline tokens.
    pub(crate) fn peek_nth_significant(&self, n: usize) -> TokenKind {
        let mut seen = 0;
        let mut i = self.pos;
        loop {
            let kind = self.tokens[i.min(self.tokens.len() - 1)].kind;
            if kind == TokenKind::Eof {
                return TokenKind::Eof;
            }
            if kind != TokenKind::Newline {
                if seen == n {
                    return kind;
                }
                seen += 1;
            }
            i += 1;
        }
    }

    /// Advance, returning the consumed token.
    pub(crate) fn bump(&mut self) -> Token {
        let token = self.peek();
        self.last_region = token.region;
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Region of the most recently consumed token (closing delimiters).
    pub(crate) fn prev_region(&self) -> Region {
        self.last_region
    }

    /// Whether the current token has the given kind.
    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// Consume the current token if it has the given kind.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or record an `UnexpectedToken` error.
    ///
    /// Returns `true` when the token was present. Does not advance on
    /// failure, so recovery decisions stay with the caller.
    pub(crate) fn expect(&mut self, kind: TokenKind, expected: &'static str) -> bool {
        if self.eat(kind) {
            return true;
        }
        let region = self.peek_region();
        let found = self.peek().kind.describe();
        self.push_error(ParseErrorKind::UnexpectedToken { expected, found }, region);
        false
    }

    /// Skip newline separator tokens.
    pub(crate) fn skip_newlines(&mut self) {
        while self.at(TokenKind::Newline) {
            self.bump();
        }
    }

    /// Skip newline and semicolon separator tokens (block statement gaps).
    pub(crate) fn skip_separators(&mut self) {
        while self.at(TokenKind::Newline) || self.at(TokenKind::Semicolon) {
            self.bump();
        }
    }

    // Errors and recovery

    pub(crate) fn push_error(&mut self, kind: ParseErrorKind, region: Region) {
        self.errors.push(ParseError { kind, region });
    }

    /// Record an error and produce a malformed expression node.
    ///
    /// Bumps one token (unless at `Eof`) to guarantee progress.
    pub(crate) fn malformed_expr(&mut self, kind: ParseErrorKind) -> NodeId {
        let region = self.peek_region();
        self.push_error(kind, region);
        if !self.at(TokenKind::Eof) {
            self.bump();
        }
        self.ast.push_expr(ParseExpr::Malformed, region)
    }
}
