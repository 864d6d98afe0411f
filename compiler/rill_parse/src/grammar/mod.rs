//! Grammar productions.
//!
//! Split by syntactic category: top-level items here, expressions in
//! [`expr`], patterns in [`pattern`].

mod expr;
mod pattern;

use rill_ir::ast::TopLevel;
use rill_lexer::TokenKind;

use crate::error::ParseErrorKind;
use crate::parser::Parser;

impl Parser {
    /// Parse one top-level item: `import Name`, `pattern = expr`, or a
    /// bare expression.
    pub(crate) fn top_level_item(&mut self) -> TopLevel {
        if self.at(TokenKind::KwImport) {
            return self.import_item();
        }
        if self.looks_like_binding() {
            let pattern = self.pattern();
            self.expect(TokenKind::Assign, "`=`");
            self.skip_newlines();
            let value = self.expr();
            return TopLevel::Def { pattern, value };
        }
        TopLevel::Expr(self.expr())
    }

    fn import_item(&mut self) -> TopLevel {
        self.bump(); // `import`
        if let TokenKind::UpperIdent(name) = self.peek_kind() {
            self.bump();
            return TopLevel::Import { name };
        }
        let found = self.peek_kind().describe();
        let node = self.malformed_expr(ParseErrorKind::UnexpectedToken {
            expected: "a module name after `import`",
            found,
        });
        TopLevel::Expr(node)
    }

    /// Lookahead: does a binding (`pattern = ...`) start here?
    ///
    /// Scans forward over pattern-shaped tokens, balancing delimiters,
    /// until it finds `=` at depth zero (binding) or anything a pattern
    /// cannot contain (not a binding). Bounded by the token stream; never
    /// consumes input.
    pub(crate) fn looks_like_binding(&self) -> bool {
        let mut depth = 0_u32;
        let mut n = 0;
        loop {
            let kind = self.peek_nth(n);
            n += 1;
            match kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    if depth == 0 {
                        return false;
                    }
                    depth -= 1;
                }
                TokenKind::Assign if depth == 0 => return true,
                // Tokens a pattern may contain.
                TokenKind::LowerIdent(_)
                | TokenKind::UpperIdent(_)
                | TokenKind::Underscore(_)
                | TokenKind::Int(_)
                | TokenKind::KwAs
                | TokenKind::DotDot => {}
                // Separators are fine only inside delimiters.
                TokenKind::Comma | TokenKind::Colon | TokenKind::Newline if depth > 0 => {}
                // Anything else at depth 0 rules out a binding.
                _ => return false,
            }
        }
    }
}
