//! Recursive-descent parser for the query language.
//!
//! Grammar:
//!
//! ```text
//! query      := "select" "*" ["where" expr] [sort]
//! sort       := "order" "by" field ("asc"|"desc")?
//! expr       := orExpr
//! orExpr     := andExpr ( "or" andExpr )*
//! andExpr    := notExpr ( "and" notExpr )*
//! notExpr    := ["not"] atom
//! atom       := comparison | "(" expr ")"
//! comparison := field operator literal
//! ```
//!
//! `not` binds tighter than `and`, which binds tighter than `or`;
//! `and`/`or` associate left. Parentheses override.

use serde_json::{Number, Value};

use super::ast::{CompareOp, Expr, ParsedQuery, SortDirection, SortSpec};
use super::errors::{ParseError, ParseResult};
use super::lexer::{Lexer, Token, TokenKind};

/// Parse a query string into a [`ParsedQuery`].
pub fn parse(text: &str) -> ParseResult<ParsedQuery> {
    let tokens = Lexer::new(text).tokenize()?;
    Parser::new(tokens).parse_query()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        // tokenize always terminates the stream with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        let token = self.peek().clone();
        if token.kind == kind {
            Ok(self.advance())
        } else {
            Err(ParseError::unexpected(
                token.offset,
                expected,
                token.kind.name(),
            ))
        }
    }

    fn parse_query(&mut self) -> ParseResult<ParsedQuery> {
        self.expect(TokenKind::Select, "`select`")?;
        self.expect(TokenKind::Star, "`*`")?;

        let filter = if self.peek().kind == TokenKind::Where {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };

        let sort = if self.peek().kind == TokenKind::Order {
            self.advance();
            self.expect(TokenKind::By, "`by`")?;
            Some(self.parse_sort()?)
        } else {
            None
        };

        let trailing = self.peek().clone();
        if trailing.kind != TokenKind::Eof {
            return Err(ParseError::unexpected(
                trailing.offset,
                "end of query",
                trailing.kind.name(),
            ));
        }

        Ok(ParsedQuery { filter, sort })
    }

    fn parse_sort(&mut self) -> ParseResult<SortSpec> {
        let field = self.parse_field("sort field")?;
        let direction = match self.peek().kind {
            TokenKind::Asc => {
                self.advance();
                SortDirection::Asc
            }
            TokenKind::Desc => {
                self.advance();
                SortDirection::Desc
            }
            // direction is optional; bare `order by f` sorts ascending
            _ => SortDirection::Asc,
        };
        Ok(SortSpec { field, direction })
    }

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;
        while self.peek().kind == TokenKind::Or {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::or(left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_not()?;
        while self.peek().kind == TokenKind::And {
            self.advance();
            let right = self.parse_not()?;
            left = Expr::and(left, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        if self.peek().kind == TokenKind::Not {
            self.advance();
            let inner = self.parse_atom()?;
            Ok(Expr::not(inner))
        } else {
            self.parse_atom()
        }
    }

    fn parse_atom(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(inner)
            }
            TokenKind::Ident(_) => self.parse_comparison(),
            _ => Err(ParseError::unexpected(
                token.offset,
                "field name or `(`",
                token.kind.name(),
            )),
        }
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let field = self.parse_field("field name")?;
        let op = self.parse_operator()?;
        let value = self.parse_literal()?;
        Ok(Expr::compare(field, op, value))
    }

    fn parse_field(&mut self, expected: &str) -> ParseResult<String> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            TokenKind::Eof => Err(ParseError::unexpected_eof(token.offset, expected)),
            other => Err(ParseError::unexpected(token.offset, expected, other.name())),
        }
    }

    fn parse_operator(&mut self) -> ParseResult<CompareOp> {
        let token = self.peek().clone();
        let op = match token.kind {
            TokenKind::Eq => CompareOp::Eq,
            TokenKind::NotEq => CompareOp::Ne,
            TokenKind::Gt => CompareOp::Gt,
            TokenKind::GtEq => CompareOp::Gte,
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::LtEq => CompareOp::Lte,
            TokenKind::Eof => {
                return Err(ParseError::unexpected_eof(
                    token.offset,
                    "comparison operator",
                ))
            }
            other => {
                return Err(ParseError::unexpected(
                    token.offset,
                    "comparison operator",
                    other.name(),
                ))
            }
        };
        self.advance();
        Ok(op)
    }

    fn parse_literal(&mut self) -> ParseResult<Value> {
        let token = self.peek().clone();
        let value = match token.kind {
            TokenKind::Int(v) => Value::Number(Number::from(v)),
            TokenKind::Float(v) => match Number::from_f64(v) {
                Some(n) => Value::Number(n),
                None => {
                    return Err(ParseError::invalid(
                        token.offset,
                        "non-finite number literal",
                        v.to_string(),
                    ))
                }
            },
            TokenKind::Str(s) => Value::String(s),
            TokenKind::True => Value::Bool(true),
            TokenKind::False => Value::Bool(false),
            TokenKind::Eof => return Err(ParseError::unexpected_eof(token.offset, "literal")),
            other => {
                return Err(ParseError::unexpected(token.offset, "literal", other.name()))
            }
        };
        self.advance();
        Ok(value)
    }
}
