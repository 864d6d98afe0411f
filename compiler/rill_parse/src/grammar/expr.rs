//! Expression grammar.
//!
//! Pratt-style binding powers for binary operators; application binds
//! tightest and requires the `(` to immediately follow its callee (no
//! whitespace), which keeps `if x > 0 (x + 1) else 1` unambiguous.

use rill_ir::ast::{
    BinOp, MatchBranch, NodeId, NodeRange, ParseExpr, RecordField, Stmt, StrSegment, UnaryOp,
};
use rill_lexer::TokenKind;

use crate::error::ParseErrorKind;
use crate::parser::Parser;

/// Map a token to its binary operator, if any.
fn binop_of(kind: TokenKind) -> Option<BinOp> {
    Some(match kind {
        TokenKind::KwOr => BinOp::Or,
        TokenKind::KwAnd => BinOp::And,
        TokenKind::EqEq => BinOp::Eq,
        TokenKind::NotEq => BinOp::Ne,
        TokenKind::Lt => BinOp::Lt,
        TokenKind::Le => BinOp::Le,
        TokenKind::Gt => BinOp::Gt,
        TokenKind::Ge => BinOp::Ge,
        TokenKind::Plus => BinOp::Add,
        TokenKind::Minus => BinOp::Sub,
        TokenKind::Star => BinOp::Mul,
        TokenKind::Slash => BinOp::Div,
        TokenKind::SlashSlash => BinOp::DivTrunc,
        TokenKind::Percent => BinOp::Rem,
        _ => return None,
    })
}

/// Left/right binding powers. Comparison operators are non-chaining in
/// spirit but parse left-associatively like everything else.
fn binding_power(op: BinOp) -> (u8, u8) {
    match op {
        BinOp::Or => (1, 2),
        BinOp::And => (3, 4),
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => (5, 6),
        BinOp::Add | BinOp::Sub => (7, 8),
        BinOp::Mul | BinOp::Div | BinOp::DivTrunc | BinOp::Rem => (9, 10),
    }
}

impl Parser {
    /// Parse a full expression.
    pub(crate) fn expr(&mut self) -> NodeId {
        rill_stack::ensure_sufficient_stack(|| self.expr_bp(0))
    }

    fn expr_bp(&mut self, min_bp: u8) -> NodeId {
        let mut lhs = self.unary_expr();
        loop {
            let Some(op) = binop_of(self.peek_kind()) else {
                break;
            };
            let (l_bp, r_bp) = binding_power(op);
            if l_bp < min_bp {
                break;
            }
            self.bump();
            self.skip_newlines();
            let rhs = self.expr_bp(r_bp);
            let region = self
                .ast
                .expr_region(lhs)
                .merge(self.ast.expr_region(rhs));
            lhs = self.ast.push_expr(ParseExpr::Binop { op, lhs, rhs }, region);
        }
        lhs
    }

    fn unary_expr(&mut self) -> NodeId {
        let op = match self.peek_kind() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        };
        let Some(op) = op else {
            return self.postfix_expr();
        };
        let start = self.bump().region;
        let operand = self.unary_expr();
        let region = start.merge(self.ast.expr_region(operand));
        self.ast.push_expr(ParseExpr::Unary { op, operand }, region)
    }

    /// Postfix position: chained application `f(a)(b)`.
    fn postfix_expr(&mut self) -> NodeId {
        let mut expr = self.primary_expr();
        while self.at(TokenKind::LParen)
            && self.peek_region().start == self.ast.expr_region(expr).end
        {
            let args = self.call_args();
            let region = self.ast.expr_region(expr).merge(self.prev_region());
            expr = self.ast.push_expr(
                ParseExpr::Apply {
                    callee: expr,
                    args,
                },
                region,
            );
        }
        expr
    }

    /// Parse `(arg, ...)`, current token being `(`.
    fn call_args(&mut self) -> NodeRange {
        let open = self.bump().region; // `(`
        self.skip_newlines();
        let mut args = Vec::new();
        while !self.at(TokenKind::RParen) {
            if self.at(TokenKind::Eof) {
                self.push_error(ParseErrorKind::UnclosedDelimiter { open: "`(`" }, open);
                break;
            }
            args.push(self.expr());
            self.skip_newlines();
            if !self.eat(TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RParen, "`)` to close the argument list");
        self.ast.push_node_list(&args)
    }

    fn primary_expr(&mut self) -> NodeId {
        match self.peek_kind() {
            TokenKind::Int(value) => {
                let region = self.bump().region;
                self.ast.push_expr(ParseExpr::Int(value), region)
            }
            TokenKind::Frac(bits) => {
                let region = self.bump().region;
                self.ast.push_expr(ParseExpr::Frac(bits), region)
            }
            TokenKind::Str(name) => {
                let region = self.bump().region;
                let segments = self.ast.push_str_segments(&[StrSegment::Literal(name)]);
                self.ast.push_expr(ParseExpr::Str(segments), region)
            }
            TokenKind::KwTrue => {
                let region = self.bump().region;
                self.ast.push_expr(ParseExpr::Bool(true), region)
            }
            TokenKind::KwFalse => {
                let region = self.bump().region;
                self.ast.push_expr(ParseExpr::Bool(false), region)
            }
            TokenKind::LowerIdent(name) => {
                let region = self.bump().region;
                self.ast.push_expr(ParseExpr::Ident(name), region)
            }
            TokenKind::UpperIdent(name) => {
                let region = self.bump().region;
                let payload = if self.at(TokenKind::LParen) && self.peek_region().start == region.end
                {
                    self.call_args()
                } else {
                    NodeRange::EMPTY
                };
                let region = region.merge(self.prev_region());
                self.ast.push_expr(ParseExpr::Tag { name, payload }, region)
            }
            TokenKind::Bar => self.lambda_expr(),
            TokenKind::KwIf => self.if_expr(),
            TokenKind::KwMatch => self.match_expr(),
            TokenKind::LParen => self.paren_expr(),
            TokenKind::LBracket => self.list_expr(),
            TokenKind::LBrace => {
                if self.brace_starts_record() {
                    self.record_expr()
                } else {
                    self.block_expr()
                }
            }
            other => self.malformed_expr(ParseErrorKind::ExpectedExpression {
                found: other.describe(),
            }),
        }
    }

    /// `|a, b| body` — the body extends as far right as possible.
    fn lambda_expr(&mut self) -> NodeId {
        let open = self.bump().region; // `|`
        let mut params = Vec::new();
        while !self.at(TokenKind::Bar) {
            if self.at(TokenKind::Eof) {
                self.push_error(ParseErrorKind::UnclosedDelimiter { open: "`|`" }, open);
                break;
            }
            params.push(self.pattern());
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Bar, "`|` to close the parameter list");
        let params = self.ast.push_pat_list(&params);
        self.skip_newlines();
        let body = self.expr_bp(0);
        let region = open.merge(self.ast.expr_region(body));
        self.ast
            .push_expr(ParseExpr::Lambda { params, body }, region)
    }

    /// `if cond then_expr else else_expr`.
    fn if_expr(&mut self) -> NodeId {
        let open = self.bump().region; // `if`
        let cond = self.expr_bp(0);
        self.skip_newlines();
        let then_branch = self.expr_bp(0);
        self.skip_newlines();
        self.expect(TokenKind::KwElse, "`else`");
        self.skip_newlines();
        let else_branch = self.expr_bp(0);
        let region = open.merge(self.ast.expr_region(else_branch));
        self.ast.push_expr(
            ParseExpr::IfThenElse {
                cond,
                then_branch,
                else_branch,
            },
            region,
        )
    }

    /// `match scrutinee { pattern -> body, ... }`.
    fn match_expr(&mut self) -> NodeId {
        let open = self.bump().region; // `match`
        let scrutinee = self.expr_bp(0);
        self.skip_newlines();
        self.expect(TokenKind::LBrace, "`{` to open the match body");
        let mut branches = Vec::new();
        loop {
            self.skip_separators();
            if self.eat(TokenKind::RBrace) {
                break;
            }
            if self.at(TokenKind::Eof) {
                self.push_error(ParseErrorKind::UnclosedDelimiter { open: "`{`" }, open);
                break;
            }
            let patterns = self.pattern_alternatives();
            self.expect(TokenKind::Arrow, "`->` after the branch pattern");
            self.skip_newlines();
            let body = self.expr();
            branches.push(MatchBranch { patterns, body });
            if !self.eat(TokenKind::Comma) && !self.at(TokenKind::Newline) {
                self.skip_newlines();
                self.expect(TokenKind::RBrace, "`}` to close the match body");
                break;
            }
        }
        let branches = self.ast.push_branches(&branches);
        let region = open.merge(self.prev_region());
        self.ast.push_expr(
            ParseExpr::Match {
                scrutinee,
                branches,
            },
            region,
        )
    }

    /// `(e)` grouped, `(a, b)` tuple, `()` unit (empty record).
    fn paren_expr(&mut self) -> NodeId {
        let open = self.bump().region; // `(`
        self.skip_newlines();
        if self.at(TokenKind::RParen) {
            let close = self.bump().region;
            return self.ast.push_expr(
                ParseExpr::Record {
                    fields: rill_ir::ast::FieldRange::EMPTY,
                },
                open.merge(close),
            );
        }
        let first = self.expr();
        self.skip_newlines();
        if !self.at(TokenKind::Comma) {
            self.expect(TokenKind::RParen, "`)` to close the parenthesized expression");
            // Widen to cover the parens so `(f)(x)` call adjacency holds.
            let region = open.merge(self.prev_region());
            self.ast.set_expr_region(first, region);
            return first;
        }
        let mut elements = vec![first];
        while self.eat(TokenKind::Comma) {
            self.skip_newlines();
            if self.at(TokenKind::RParen) {
                break; // trailing comma
            }
            elements.push(self.expr());
            self.skip_newlines();
        }
        self.expect(TokenKind::RParen, "`)` to close the tuple");
        let elements = self.ast.push_node_list(&elements);
        let region = open.merge(self.prev_region());
        self.ast.push_expr(ParseExpr::Tuple(elements), region)
    }

    /// `[a, b, c]`.
    fn list_expr(&mut self) -> NodeId {
        let open = self.bump().region; // `[`
        self.skip_newlines();
        let mut elements = Vec::new();
        while !self.at(TokenKind::RBracket) {
            if self.at(TokenKind::Eof) {
                self.push_error(ParseErrorKind::UnclosedDelimiter { open: "`[`" }, open);
                break;
            }
            elements.push(self.expr());
            self.skip_newlines();
            if !self.eat(TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RBracket, "`]` to close the list");
        let elements = self.ast.push_node_list(&elements);
        let region = open.merge(self.prev_region());
        self.ast.push_expr(ParseExpr::List(elements), region)
    }

    /// Lookahead after `{`: is this a record literal?
    ///
    /// `{}` and `{ name: ... }` and `{ name, ... }` are records; anything
    /// else (including `{ name }`) is a block.
    fn brace_starts_record(&self) -> bool {
        match self.peek_nth_significant(1) {
            TokenKind::RBrace => true,
            TokenKind::LowerIdent(_) => matches!(
                self.peek_nth_significant(2),
                TokenKind::Colon | TokenKind::Comma
            ),
            _ => false,
        }
    }

    /// `{ x: 1, y: 2 }`.
    fn record_expr(&mut self) -> NodeId {
        let open = self.bump().region; // `{`
        self.skip_newlines();
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if self.at(TokenKind::Eof) {
                self.push_error(ParseErrorKind::UnclosedDelimiter { open: "`{`" }, open);
                break;
            }
            let TokenKind::LowerIdent(name) = self.peek_kind() else {
                let found = self.peek_kind().describe();
                let region = self.peek_region();
                self.push_error(
                    ParseErrorKind::UnexpectedToken {
                        expected: "a field name",
                        found,
                    },
                    region,
                );
                break;
            };
            let name_region = self.bump().region;
            let value = if self.eat(TokenKind::Colon) {
                self.skip_newlines();
                self.expr()
            } else {
                NodeId::INVALID // shorthand: `{ x, y }` reads `x` and `y`
            };
            let region = if value.is_valid() {
                name_region.merge(self.ast.expr_region(value))
            } else {
                name_region
            };
            fields.push(RecordField {
                name,
                value,
                region,
            });
            self.skip_newlines();
            if !self.eat(TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "`}` to close the record");
        let fields = self.ast.push_record_fields(&fields);
        let region = open.merge(self.prev_region());
        self.ast.push_expr(ParseExpr::Record { fields }, region)
    }

    /// `{ stmt; ...; tail }`.
    fn block_expr(&mut self) -> NodeId {
        let open = self.bump().region; // `{`
        let mut stmts: Vec<Stmt> = Vec::new();
        loop {
            self.skip_separators();
            if self.eat(TokenKind::RBrace) {
                break;
            }
            if self.at(TokenKind::Eof) {
                self.push_error(ParseErrorKind::UnclosedDelimiter { open: "`{`" }, open);
                break;
            }
            if self.looks_like_binding() {
                let pattern = self.pattern();
                self.expect(TokenKind::Assign, "`=`");
                self.skip_newlines();
                let value = self.expr();
                stmts.push(Stmt::Let { pattern, value });
            } else {
                stmts.push(Stmt::Expr(self.expr()));
            }
        }
        // A trailing bare expression is the block's tail value.
        let tail = match stmts.last() {
            Some(Stmt::Expr(e)) => {
                let e = *e;
                stmts.pop();
                e
            }
            _ => NodeId::INVALID,
        };
        let stmts = self.ast.push_stmts(&stmts);
        let region = open.merge(self.prev_region());
        self.ast.push_expr(ParseExpr::Block { stmts, tail }, region)
    }
}
