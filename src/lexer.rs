use crate::token::{Number, Span, Token, TokenKind};

/// Lexical fault: a character no token can start with.
///
/// Lexical faults are non-fatal. The lexer records the offending
/// character, discards it, and resumes scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal character '{ch}' at line {}, column {}", span.line, span.column)]
pub struct LexError {
    pub ch: char,
    pub span: Span,
}

/// Result of tokenizing: the token sequence plus any lexical faults
/// recovered along the way.
///
/// `tokens` always ends with a single [`TokenKind::Eof`] token.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

impl Lexed {
    /// Number of lexical faults encountered.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// Tokenize a Lua source string.
///
/// Tokenization never fails: illegal characters are recorded in
/// [`Lexed::errors`] and skipped, one character at a time.
#[must_use]
pub fn tokenize(input: &str) -> Lexed {
    Lexer::new(input).run()
}

struct Lexer<'a> {
    src: &'a str,
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            src: input,
            input: input.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn run(mut self) -> Lexed {
        while self.pos < self.input.len() {
            let ch = self.input[self.pos];

            match ch {
                b' ' | b'\t' | b'\r' | b'\n' => self.advance(),
                b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.read_name(),
                b'0'..=b'9' => self.read_number(),
                b'"' => self.read_string(),
                b'-' => {
                    if self.peek_at(1) == Some(b'-') {
                        self.skip_comment();
                    } else {
                        self.symbol(TokenKind::Minus, 1);
                    }
                }
                b'.' => {
                    if self.peek_at(1) == Some(b'.') {
                        if self.peek_at(2) == Some(b'.') {
                            self.symbol(TokenKind::Ellipsis, 3);
                        } else {
                            self.symbol(TokenKind::Concat, 2);
                        }
                    } else {
                        self.symbol(TokenKind::Dot, 1);
                    }
                }
                b'=' => {
                    if self.peek_at(1) == Some(b'=') {
                        self.symbol(TokenKind::EqEq, 2);
                    } else {
                        self.symbol(TokenKind::Assign, 1);
                    }
                }
                b'~' => {
                    if self.peek_at(1) == Some(b'=') {
                        self.symbol(TokenKind::NotEq, 2);
                    } else {
                        // `~` on its own is not a Lua token
                        self.illegal_char();
                    }
                }
                b'<' => {
                    if self.peek_at(1) == Some(b'=') {
                        self.symbol(TokenKind::LessEq, 2);
                    } else {
                        self.symbol(TokenKind::Less, 1);
                    }
                }
                b'>' => {
                    if self.peek_at(1) == Some(b'=') {
                        self.symbol(TokenKind::GreaterEq, 2);
                    } else {
                        self.symbol(TokenKind::Greater, 1);
                    }
                }
                b'+' => self.symbol(TokenKind::Plus, 1),
                b'*' => self.symbol(TokenKind::Star, 1),
                b'/' => self.symbol(TokenKind::Slash, 1),
                b'%' => self.symbol(TokenKind::Percent, 1),
                b'#' => self.symbol(TokenKind::Hash, 1),
                b'^' => self.symbol(TokenKind::Caret, 1),
                b'(' => self.symbol(TokenKind::LParen, 1),
                b')' => self.symbol(TokenKind::RParen, 1),
                b'{' => self.symbol(TokenKind::LBrace, 1),
                b'}' => self.symbol(TokenKind::RBrace, 1),
                b'[' => self.symbol(TokenKind::LBracket, 1),
                b']' => self.symbol(TokenKind::RBracket, 1),
                b';' => self.symbol(TokenKind::Semicolon, 1),
                b':' => self.symbol(TokenKind::Colon, 1),
                b',' => self.symbol(TokenKind::Comma, 1),
                _ => self.illegal_char(),
            }
        }

        self.tokens.push(Token {
            kind: TokenKind::Eof,
            span: self.span(),
        });

        Lexed {
            tokens: self.tokens,
            errors: self.errors,
        }
    }

    const fn span(&self) -> Span {
        Span {
            line: self.line,
            column: self.col,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            if self.input[self.pos] == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.pos += 1;
        }
    }

    /// Emit a fixed-symbol token of `len` bytes.
    fn symbol(&mut self, kind: TokenKind, len: usize) {
        let span = self.span();
        self.tokens.push(Token { kind, span });
        for _ in 0..len {
            self.advance();
        }
    }

    fn read_name(&mut self) {
        let span = self.span();
        let start = self.pos;

        while let Some(c) = self.peek() {
            match c {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' => self.advance(),
                _ => break,
            }
        }

        let text = &self.src[start..self.pos];
        let kind = TokenKind::keyword(text).unwrap_or_else(|| TokenKind::Name(text.to_string()));
        self.tokens.push(Token { kind, span });
    }

    fn read_number(&mut self) {
        let span = self.span();
        let start = self.pos;

        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.advance();
        }

        // A dot only belongs to the number when a digit follows;
        // `1..2` stays NUMBER CONCAT NUMBER.
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            self.advance();
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.advance();
            }
        }

        let text = &self.src[start..self.pos];
        self.tokens.push(Token {
            kind: TokenKind::Number(parse_number(text)),
            span,
        });
    }

    fn read_string(&mut self) {
        let span = self.span();
        let save = (self.pos, self.line, self.col);
        self.advance(); // opening quote
        let start = self.pos;

        loop {
            match self.peek() {
                Some(b'"') => {
                    let value = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
                    self.advance();
                    self.tokens.push(Token {
                        kind: TokenKind::Str(value),
                        span,
                    });
                    return;
                }
                Some(b'\\') => match self.peek_at(1) {
                    // a backslash may not end the line or the input
                    None | Some(b'\n') => break,
                    Some(_) => {
                        self.advance();
                        self.advance();
                    }
                },
                None | Some(b'\n') => break,
                Some(_) => self.advance(),
            }
        }

        // Unterminated: report the opening quote as illegal and
        // resume scanning right after it.
        (self.pos, self.line, self.col) = save;
        self.illegal_char();
    }

    fn skip_comment(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos] != b'\n' {
            self.advance();
        }
    }

    fn illegal_char(&mut self) {
        let span = self.span();
        // pos is always a char boundary here: every recognized token
        // consists of ASCII bytes.
        let ch = self
            .src
            .get(self.pos..)
            .and_then(|s| s.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        self.errors.push(LexError { ch, span });
        for _ in 0..ch.len_utf8() {
            self.advance();
        }
    }
}

fn parse_number(text: &str) -> Number {
    if let Ok(n) = text.parse::<i64>() {
        return Number::Int(n);
    }
    // digits with at most one dot always parse as f64; integer
    // literals too long for i64 land here and become floats
    Number::Float(text.parse().unwrap_or(f64::INFINITY))
}
