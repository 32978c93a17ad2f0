//! Lexer for the query language.
//!
//! Keywords and word operators are recognized case-insensitively; anything
//! else word-shaped is an identifier (a field name, matched as stored).

use super::errors::{ParseError, ParseResult};

/// Token types.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords (case-insensitive)
    Select,
    Where,
    Order,
    By,
    Asc,
    Desc,
    And,
    Or,
    Not,
    True,
    False,

    // Literals and identifiers
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),

    // Operators; word spellings (eq, ne, gt, gte, lt, lte) lex to these
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,

    // Punctuation
    Star,
    LParen,
    RParen,

    Eof,
}

impl TokenKind {
    /// Display name used in parse error messages.
    pub fn name(&self) -> String {
        match self {
            TokenKind::Select => "`select`".to_string(),
            TokenKind::Where => "`where`".to_string(),
            TokenKind::Order => "`order`".to_string(),
            TokenKind::By => "`by`".to_string(),
            TokenKind::Asc => "`asc`".to_string(),
            TokenKind::Desc => "`desc`".to_string(),
            TokenKind::And => "`and`".to_string(),
            TokenKind::Or => "`or`".to_string(),
            TokenKind::Not => "`not`".to_string(),
            TokenKind::True => "`true`".to_string(),
            TokenKind::False => "`false`".to_string(),
            TokenKind::Ident(name) => format!("identifier `{}`", name),
            TokenKind::Int(v) => format!("number `{}`", v),
            TokenKind::Float(v) => format!("number `{}`", v),
            TokenKind::Str(s) => format!("string '{}'", s),
            TokenKind::Eq => "`=`".to_string(),
            TokenKind::NotEq => "`!=`".to_string(),
            TokenKind::Gt => "`>`".to_string(),
            TokenKind::GtEq => "`>=`".to_string(),
            TokenKind::Lt => "`<`".to_string(),
            TokenKind::LtEq => "`<=`".to_string(),
            TokenKind::Star => "`*`".to_string(),
            TokenKind::LParen => "`(`".to_string(),
            TokenKind::RParen => "`)`".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }

    /// Returns true for the comparison operator tokens.
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::Gt
                | TokenKind::GtEq
                | TokenKind::Lt
                | TokenKind::LtEq
        )
    }
}

/// A token with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

/// Lexer state over the input string.
pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Tokenize the whole input, ending with an Eof token.
    pub fn tokenize(mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        self.skip_whitespace();

        let Some(&(offset, c)) = self.chars.peek() else {
            return Ok(Token::new(TokenKind::Eof, self.input.len()));
        };

        match c {
            '*' => {
                self.chars.next();
                Ok(Token::new(TokenKind::Star, offset))
            }
            '(' => {
                self.chars.next();
                Ok(Token::new(TokenKind::LParen, offset))
            }
            ')' => {
                self.chars.next();
                Ok(Token::new(TokenKind::RParen, offset))
            }
            '=' => {
                self.chars.next();
                Ok(Token::new(TokenKind::Eq, offset))
            }
            '!' => {
                self.chars.next();
                if self.eat('=') {
                    Ok(Token::new(TokenKind::NotEq, offset))
                } else {
                    Err(ParseError::invalid(
                        offset,
                        "`!` must be followed by `=`",
                        "`!`",
                    ))
                }
            }
            '>' => {
                self.chars.next();
                if self.eat('=') {
                    Ok(Token::new(TokenKind::GtEq, offset))
                } else {
                    Ok(Token::new(TokenKind::Gt, offset))
                }
            }
            '<' => {
                self.chars.next();
                if self.eat('=') {
                    Ok(Token::new(TokenKind::LtEq, offset))
                } else {
                    Ok(Token::new(TokenKind::Lt, offset))
                }
            }
            '\'' | '"' => self.lex_string(offset, c),
            '-' => self.lex_number(offset),
            c if c.is_ascii_digit() => self.lex_number(offset),
            c if c.is_alphabetic() || c == '_' => Ok(self.lex_word(offset)),
            other => Err(ParseError::invalid(
                offset,
                format!("unexpected character `{}`", other),
                other.to_string(),
            )),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some(&(_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    /// Consume the next char if it equals `expected`.
    fn eat(&mut self, expected: char) -> bool {
        if matches!(self.chars.peek(), Some(&(_, c)) if c == expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn lex_string(&mut self, start: usize, quote: char) -> ParseResult<Token> {
        self.chars.next(); // opening quote
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((_, c)) if c == quote => {
                    return Ok(Token::new(TokenKind::Str(value), start));
                }
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, escaped)) => value.push(escaped),
                    None => {
                        return Err(ParseError::unexpected_eof(
                            self.input.len(),
                            "escaped character",
                        ))
                    }
                },
                Some((_, c)) => value.push(c),
                None => {
                    return Err(ParseError::unexpected_eof(
                        self.input.len(),
                        &format!("closing `{}`", quote),
                    ))
                }
            }
        }
    }

    fn lex_number(&mut self, start: usize) -> ParseResult<Token> {
        let mut end = start;
        let mut is_float = false;

        if matches!(self.chars.peek(), Some(&(_, '-'))) {
            self.chars.next();
            end += 1;
        }

        while let Some(&(i, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                self.chars.next();
                end = i + c.len_utf8();
            } else if c == '.' && !is_float {
                is_float = true;
                self.chars.next();
                end = i + c.len_utf8();
            } else {
                break;
            }
        }

        let text = &self.input[start..end];
        if is_float {
            match text.parse::<f64>() {
                Ok(v) => Ok(Token::new(TokenKind::Float(v), start)),
                Err(_) => Err(ParseError::invalid(
                    start,
                    format!("malformed number `{}`", text),
                    text.to_string(),
                )),
            }
        } else {
            match text.parse::<i64>() {
                Ok(v) => Ok(Token::new(TokenKind::Int(v), start)),
                Err(_) => Err(ParseError::invalid(
                    start,
                    format!("malformed number `{}`", text),
                    text.to_string(),
                )),
            }
        }
    }

    fn lex_word(&mut self, start: usize) -> Token {
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.chars.next();
                end = i + c.len_utf8();
            } else {
                break;
            }
        }

        let word = &self.input[start..end];
        let kind = match word.to_ascii_lowercase().as_str() {
            "select" => TokenKind::Select,
            "where" => TokenKind::Where,
            "order" => TokenKind::Order,
            "by" => TokenKind::By,
            "asc" => TokenKind::Asc,
            "desc" => TokenKind::Desc,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "eq" => TokenKind::Eq,
            "ne" => TokenKind::NotEq,
            "gt" => TokenKind::Gt,
            "gte" => TokenKind::GtEq,
            "lt" => TokenKind::Lt,
            "lte" => TokenKind::LtEq,
            _ => TokenKind::Ident(word.to_string()),
        };
        Token::new(kind, start)
    }
}
