//! Pattern grammar.

use rill_ir::ast::{ParsePattern, PatField, PatId, PatRange};
use rill_lexer::TokenKind;

use crate::error::ParseErrorKind;
use crate::parser::Parser;

impl Parser {
    /// Parse one pattern, including a trailing `as name`.
    pub(crate) fn pattern(&mut self) -> PatId {
        let inner = self.primary_pattern();
        if !self.eat(TokenKind::KwAs) {
            return inner;
        }
        if let TokenKind::LowerIdent(name) = self.peek_kind() {
            let name_region = self.bump().region;
            let region = self.ast.pattern_region(inner).merge(name_region);
            self.ast.push_pattern(ParsePattern::As { inner, name }, region)
        } else {
            let found = self.peek_kind().describe();
            self.malformed_pattern(ParseErrorKind::UnexpectedToken {
                expected: "a name after `as`",
                found,
            })
        }
    }

    /// Parse `pat | pat | ...` (match branch position). Always returns at
    /// least one pattern.
    pub(crate) fn pattern_alternatives(&mut self) -> PatRange {
        let mut alternatives = vec![self.pattern()];
        while self.eat(TokenKind::Bar) {
            self.skip_newlines();
            alternatives.push(self.pattern());
        }
        self.ast.push_pat_list(&alternatives)
    }

    fn primary_pattern(&mut self) -> PatId {
        match self.peek_kind() {
            TokenKind::Int(value) => {
                let region = self.bump().region;
                self.ast.push_pattern(ParsePattern::IntLiteral(value), region)
            }
            TokenKind::Minus => {
                let start = self.bump().region;
                if let TokenKind::Int(value) = self.peek_kind() {
                    let region = start.merge(self.bump().region);
                    self.ast
                        .push_pattern(ParsePattern::IntLiteral(value.wrapping_neg()), region)
                } else {
                    let found = self.peek_kind().describe();
                    self.malformed_pattern(ParseErrorKind::UnexpectedToken {
                        expected: "an integer after `-`",
                        found,
                    })
                }
            }
            TokenKind::LowerIdent(name) => {
                let region = self.bump().region;
                self.ast.push_pattern(ParsePattern::Ident(name), region)
            }
            TokenKind::Underscore(_) => {
                let region = self.bump().region;
                self.ast.push_pattern(ParsePattern::Underscore, region)
            }
            TokenKind::UpperIdent(name) => {
                let region = self.bump().region;
                let args = if self.at(TokenKind::LParen) && self.peek_region().start == region.end
                {
                    self.tag_pattern_args()
                } else {
                    PatRange::EMPTY
                };
                let region = region.merge(self.prev_region());
                self.ast.push_pattern(ParsePattern::Tag { name, args }, region)
            }
            TokenKind::LParen => self.paren_pattern(),
            TokenKind::LBracket => self.list_pattern(),
            TokenKind::LBrace => self.record_pattern(),
            other => self.malformed_pattern(ParseErrorKind::ExpectedPattern {
                found: other.describe(),
            }),
        }
    }

    fn tag_pattern_args(&mut self) -> PatRange {
        let open = self.bump().region; // `(`
        self.skip_newlines();
        let mut args = Vec::new();
        while !self.at(TokenKind::RParen) {
            if self.at(TokenKind::Eof) {
                self.push_error(ParseErrorKind::UnclosedDelimiter { open: "`(`" }, open);
                break;
            }
            args.push(self.pattern());
            self.skip_newlines();
            if !self.eat(TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RParen, "`)` to close the tag arguments");
        self.ast.push_pat_list(&args)
    }

    /// `(pat)` grouped, `(a, b)` tuple, `(1 | 2)` alternatives.
    fn paren_pattern(&mut self) -> PatId {
        let open = self.bump().region; // `(`
        self.skip_newlines();
        let first = self.pattern();
        self.skip_newlines();
        if self.at(TokenKind::Bar) {
            let mut alternatives = vec![first];
            while self.eat(TokenKind::Bar) {
                self.skip_newlines();
                alternatives.push(self.pattern());
                self.skip_newlines();
            }
            self.expect(TokenKind::RParen, "`)` to close the pattern");
            let alternatives = self.ast.push_pat_list(&alternatives);
            let region = open.merge(self.prev_region());
            return self
                .ast
                .push_pattern(ParsePattern::Alternatives(alternatives), region);
        }
        if !self.at(TokenKind::Comma) {
            self.expect(TokenKind::RParen, "`)` to close the pattern");
            return first;
        }
        let mut elements = vec![first];
        while self.eat(TokenKind::Comma) {
            self.skip_newlines();
            if self.at(TokenKind::RParen) {
                break;
            }
            elements.push(self.pattern());
            self.skip_newlines();
        }
        self.expect(TokenKind::RParen, "`)` to close the tuple pattern");
        let elements = self.ast.push_pat_list(&elements);
        let region = open.merge(self.prev_region());
        self.ast.push_pattern(ParsePattern::Tuple(elements), region)
    }

    /// `[a, b]` exact, `[first, .. rest]` with rest binding.
    fn list_pattern(&mut self) -> PatId {
        let open = self.bump().region; // `[`
        self.skip_newlines();
        let mut elements = Vec::new();
        let mut rest = PatId::INVALID;
        while !self.at(TokenKind::RBracket) {
            if self.at(TokenKind::Eof) {
                self.push_error(ParseErrorKind::UnclosedDelimiter { open: "`[`" }, open);
                break;
            }
            if self.at(TokenKind::DotDot) {
                let dots = self.bump().region;
                rest = if let TokenKind::LowerIdent(name) = self.peek_kind() {
                    let region = dots.merge(self.bump().region);
                    self.ast.push_pattern(ParsePattern::Ident(name), region)
                } else {
                    self.ast.push_pattern(ParsePattern::Underscore, dots)
                };
                self.skip_newlines();
                break;
            }
            elements.push(self.pattern());
            self.skip_newlines();
            if !self.eat(TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RBracket, "`]` to close the list pattern");
        let elements = self.ast.push_pat_list(&elements);
        let region = open.merge(self.prev_region());
        self.ast
            .push_pattern(ParsePattern::List { elems: elements, rest }, region)
    }

    /// `{ x, y }` shorthand bindings, `{ x: pat }` explicit sub-patterns.
    fn record_pattern(&mut self) -> PatId {
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
            let pattern = if self.eat(TokenKind::Colon) {
                self.skip_newlines();
                self.pattern()
            } else {
                PatId::INVALID // shorthand binds the field name
            };
            fields.push(PatField {
                name,
                pattern,
                region: name_region,
            });
            self.skip_newlines();
            if !self.eat(TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RBrace, "`}` to close the record pattern");
        let fields = self.ast.push_pat_fields(&fields);
        let region = open.merge(self.prev_region());
        self.ast.push_pattern(ParsePattern::Record { fields }, region)
    }

    /// Record an error and produce a malformed pattern node.
    fn malformed_pattern(&mut self, kind: ParseErrorKind) -> PatId {
        let region = self.peek_region();
        self.push_error(kind, region);
        if !self.at(TokenKind::Eof) {
            self.bump();
        }
        self.ast.push_pattern(ParsePattern::Malformed, region)
    }
}
