use std::fmt;

use crate::ast::{
    BinOp, Block, Chunk, ElseIf, Expr, FuncBody, FuncName, FunctionCall, LastStat, Params, Stat,
    TableField, UnOp, Var,
};
use crate::token::{Span, Token, TokenKind};

/// Nesting limit for expressions and blocks. Keeps recursive descent
/// from exhausting the stack on pathological input.
const MAX_DEPTH: usize = 200;

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A required continuation was missing.
    Expected {
        what: &'static str,
        found: String,
    },
    /// No statement or expression can start with this token.
    UnexpectedToken { found: String },
    /// Left side of `=` is not a name, index, or field access.
    InvalidAssignTarget,
    /// Expression/block nesting exceeded [`MAX_DEPTH`].
    NestingTooDeep,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected { what, found } => {
                write!(f, "expected {what}, got '{found}'")
            }
            Self::UnexpectedToken { found } => {
                write!(f, "unexpected token '{found}'")
            }
            Self::InvalidAssignTarget => {
                write!(f, "cannot assign to this expression")
            }
            Self::NestingTooDeep => {
                write!(f, "too many nested constructs")
            }
        }
    }
}

/// Error produced during parsing.
///
/// The first syntax fault aborts the parse; no partial tree is
/// returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

/// Parse a token sequence into a [`Chunk`] AST.
///
/// Consumes tokens strictly left to right with one token of
/// lookahead. The sequence is expected to end with
/// [`TokenKind::Eof`], as produced by [`crate::lexer::tokenize`].
///
/// # Errors
///
/// Returns `ParseError` on the first token that does not match an
/// expected grammar continuation.
pub fn parse(tokens: &[Token]) -> Result<Chunk, ParseError> {
    Parser::new(tokens).parse()
}

/// Stand-in for reads past the end of the token slice.
static EOF: TokenKind = TokenKind::Eof;

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    const fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn parse(mut self) -> Result<Chunk, ParseError> {
        let body = self.block()?;
        if *self.peek() != TokenKind::Eof {
            return Err(self.unexpected());
        }
        Ok(Chunk { body })
    }

    // -- token access ------------------------------------------------

    fn peek(&self) -> &TokenKind {
        self.tokens.get(self.pos).map_or(&EOF, |t| &t.kind)
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map_or(&EOF, |t| &t.kind)
    }

    fn span(&self) -> Span {
        self.tokens.get(self.pos).map_or_else(
            || {
                self.tokens
                    .last()
                    .map_or(Span { line: 1, column: 1 }, |t| t.span)
            },
            |t| t.span,
        )
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &'static str) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.expected(what))
        }
    }

    fn name(&mut self) -> Result<String, ParseError> {
        if let TokenKind::Name(name) = self.peek() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.expected("a name"))
        }
    }

    fn expected(&self, what: &'static str) -> ParseError {
        ParseError {
            kind: ParseErrorKind::Expected {
                what,
                found: self.peek().to_string(),
            },
            span: self.span(),
        }
    }

    fn unexpected(&self) -> ParseError {
        ParseError {
            kind: ParseErrorKind::UnexpectedToken {
                found: self.peek().to_string(),
            },
            span: self.span(),
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            Err(ParseError {
                kind: ParseErrorKind::NestingTooDeep,
                span: self.span(),
            })
        } else {
            Ok(())
        }
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // -- statements --------------------------------------------------

    /// True when the current token may legally follow a block.
    fn block_follows(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::End
                | TokenKind::Else
                | TokenKind::Elseif
                | TokenKind::Until
                | TokenKind::Eof
        )
    }

    fn block(&mut self) -> Result<Block, ParseError> {
        self.enter()?;
        let result = self.block_inner();
        self.leave();
        result
    }

    fn block_inner(&mut self) -> Result<Block, ParseError> {
        let mut stats = Vec::new();
        let mut last = None;

        loop {
            match self.peek() {
                _ if self.block_follows() => break,
                TokenKind::Return => {
                    self.advance();
                    let exprs = if self.block_follows() || *self.peek() == TokenKind::Semicolon {
                        Vec::new()
                    } else {
                        self.expr_list()?
                    };
                    self.eat(&TokenKind::Semicolon);
                    last = Some(LastStat::Return(exprs));
                    break;
                }
                TokenKind::Break => {
                    self.advance();
                    self.eat(&TokenKind::Semicolon);
                    last = Some(LastStat::Break);
                    break;
                }
                _ => {
                    stats.push(self.statement()?);
                    self.eat(&TokenKind::Semicolon);
                }
            }
        }

        Ok(Block { stats, last })
    }

    fn statement(&mut self) -> Result<Stat, ParseError> {
        match self.peek() {
            TokenKind::Do => {
                self.advance();
                let body = self.block()?;
                self.expect(&TokenKind::End, "'end'")?;
                Ok(Stat::Do(body))
            }
            TokenKind::While => {
                self.advance();
                let cond = self.expr()?;
                self.expect(&TokenKind::Do, "'do'")?;
                let body = self.block()?;
                self.expect(&TokenKind::End, "'end'")?;
                Ok(Stat::While { cond, body })
            }
            TokenKind::Repeat => {
                self.advance();
                let body = self.block()?;
                self.expect(&TokenKind::Until, "'until'")?;
                let cond = self.expr()?;
                Ok(Stat::Repeat { body, cond })
            }
            TokenKind::If => self.if_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::Function => {
                self.advance();
                let name = self.func_name()?;
                let body = self.func_body()?;
                Ok(Stat::Function { name, body })
            }
            TokenKind::Local => self.local_statement(),
            TokenKind::Name(_) | TokenKind::LParen => self.expr_statement(),
            _ => Err(self.unexpected()),
        }
    }

    fn if_statement(&mut self) -> Result<Stat, ParseError> {
        self.advance();
        let cond = self.expr()?;
        self.expect(&TokenKind::Then, "'then'")?;
        let body = self.block()?;

        let mut elseifs = Vec::new();
        while self.eat(&TokenKind::Elseif) {
            let cond = self.expr()?;
            self.expect(&TokenKind::Then, "'then'")?;
            let body = self.block()?;
            elseifs.push(ElseIf { cond, body });
        }

        let else_body = if self.eat(&TokenKind::Else) {
            Some(self.block()?)
        } else {
            None
        };
        self.expect(&TokenKind::End, "'end'")?;

        Ok(Stat::If {
            cond,
            body,
            elseifs,
            else_body,
        })
    }

    fn for_statement(&mut self) -> Result<Stat, ParseError> {
        self.advance();
        let first = self.name()?;

        match self.peek() {
            TokenKind::Assign => {
                self.advance();
                let start = self.expr()?;
                self.expect(&TokenKind::Comma, "','")?;
                let stop = self.expr()?;
                let step = if self.eat(&TokenKind::Comma) {
                    Some(self.expr()?)
                } else {
                    None
                };
                self.expect(&TokenKind::Do, "'do'")?;
                let body = self.block()?;
                self.expect(&TokenKind::End, "'end'")?;
                Ok(Stat::NumericFor {
                    var: first,
                    start,
                    stop,
                    step,
                    body,
                })
            }
            TokenKind::Comma | TokenKind::In => {
                let mut names = vec![first];
                while self.eat(&TokenKind::Comma) {
                    names.push(self.name()?);
                }
                self.expect(&TokenKind::In, "'in'")?;
                let exprs = self.expr_list()?;
                self.expect(&TokenKind::Do, "'do'")?;
                let body = self.block()?;
                self.expect(&TokenKind::End, "'end'")?;
                Ok(Stat::GenericFor { names, exprs, body })
            }
            _ => Err(self.expected("'=', ',' or 'in'")),
        }
    }

    fn local_statement(&mut self) -> Result<Stat, ParseError> {
        self.advance();

        if self.eat(&TokenKind::Function) {
            let name = self.name()?;
            let body = self.func_body()?;
            return Ok(Stat::LocalFunction { name, body });
        }

        let mut names = vec![self.name()?];
        while self.eat(&TokenKind::Comma) {
            names.push(self.name()?);
        }
        let values = if self.eat(&TokenKind::Assign) {
            self.expr_list()?
        } else {
            Vec::new()
        };
        Ok(Stat::Local { names, values })
    }

    /// Assignment or bare call, disambiguated after the prefix
    /// expression by `=` / `,` lookahead.
    fn expr_statement(&mut self) -> Result<Stat, ParseError> {
        let first = self.suffixed_expr()?;

        if matches!(self.peek(), TokenKind::Assign | TokenKind::Comma) {
            let mut targets = vec![self.to_var(first)?];
            while self.eat(&TokenKind::Comma) {
                let target = self.suffixed_expr()?;
                targets.push(self.to_var(target)?);
            }
            self.expect(&TokenKind::Assign, "'='")?;
            let values = self.expr_list()?;
            return Ok(Stat::Assign { targets, values });
        }

        if let Expr::Call(call) = first {
            Ok(Stat::Call(*call))
        } else {
            Err(self.expected("'=' or call arguments"))
        }
    }

    fn to_var(&self, expr: Expr) -> Result<Var, ParseError> {
        match expr {
            Expr::Name(name) => Ok(Var::Name(name)),
            Expr::Index { base, key } => Ok(Var::Index {
                base: *base,
                key: *key,
            }),
            Expr::Field { base, name } => Ok(Var::Field { base: *base, name }),
            _ => Err(ParseError {
                kind: ParseErrorKind::InvalidAssignTarget,
                span: self.span(),
            }),
        }
    }

    fn func_name(&mut self) -> Result<FuncName, ParseError> {
        let base = self.name()?;
        let mut path = Vec::new();
        while self.eat(&TokenKind::Dot) {
            path.push(self.name()?);
        }
        let method = if self.eat(&TokenKind::Colon) {
            Some(self.name()?)
        } else {
            None
        };
        Ok(FuncName { base, path, method })
    }

    fn func_body(&mut self) -> Result<FuncBody, ParseError> {
        self.expect(&TokenKind::LParen, "'('")?;
        let params = self.param_list()?;
        self.expect(&TokenKind::RParen, "')'")?;
        let body = self.block()?;
        self.expect(&TokenKind::End, "'end'")?;
        Ok(FuncBody { params, body })
    }

    fn param_list(&mut self) -> Result<Params, ParseError> {
        let mut names = Vec::new();
        let mut is_vararg = false;

        if *self.peek() != TokenKind::RParen {
            loop {
                match self.peek() {
                    TokenKind::Ellipsis => {
                        self.advance();
                        is_vararg = true;
                        break;
                    }
                    TokenKind::Name(_) => {
                        names.push(self.name()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                    _ => return Err(self.expected("a parameter name or '...'")),
                }
            }
        }

        Ok(Params { names, is_vararg })
    }

    // -- expressions -------------------------------------------------

    fn expr_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![self.expr()?];
        while self.eat(&TokenKind::Comma) {
            exprs.push(self.expr()?);
        }
        Ok(exprs)
    }

    /// One function per precedence tier, lowest binding first.
    fn expr(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let result = self.or_expr();
        self.leave();
        result
    }

    fn or_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.and_expr()?;
        while self.eat(&TokenKind::Or) {
            let rhs = self.and_expr()?;
            lhs = binary(BinOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.equality_expr()?;
        while self.eat(&TokenKind::And) {
            let rhs = self.equality_expr()?;
            lhs = binary(BinOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn equality_expr(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.comparison_expr()?;
        let op = match self.peek() {
            TokenKind::EqEq => BinOp::EqEq,
            TokenKind::NotEq => BinOp::NotEq,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.comparison_expr()?;
        // non-associative: `a == b ~= c` needs parentheses
        if matches!(self.peek(), TokenKind::EqEq | TokenKind::NotEq) {
            return Err(self.unexpected());
        }
        Ok(binary(op, lhs, rhs))
    }

    fn comparison_expr(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.concat_expr()?;
        let op = match self.peek() {
            TokenKind::Less => BinOp::Less,
            TokenKind::Greater => BinOp::Greater,
            TokenKind::LessEq => BinOp::LessEq,
            TokenKind::GreaterEq => BinOp::GreaterEq,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.concat_expr()?;
        // non-associative, as above
        if matches!(
            self.peek(),
            TokenKind::Less | TokenKind::Greater | TokenKind::LessEq | TokenKind::GreaterEq
        ) {
            return Err(self.unexpected());
        }
        Ok(binary(op, lhs, rhs))
    }

    fn concat_expr(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.additive_expr()?;
        if self.eat(&TokenKind::Concat) {
            // right-associative
            self.enter()?;
            let rhs = self.concat_expr();
            self.leave();
            return Ok(binary(BinOp::Concat, lhs, rhs?));
        }
        Ok(lhs)
    }

    fn additive_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.multiplicative_expr()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.multiplicative_expr()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn multiplicative_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary_expr()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.unary_expr()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn unary_expr(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            TokenKind::Not => UnOp::Not,
            TokenKind::Minus => UnOp::Neg,
            TokenKind::Hash => UnOp::Len,
            _ => return self.power_expr(),
        };
        self.advance();
        self.enter()?;
        let operand = self.unary_expr();
        self.leave();
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    fn power_expr(&mut self) -> Result<Expr, ParseError> {
        let base = self.simple_expr()?;
        if self.eat(&TokenKind::Caret) {
            // right-associative; the exponent re-enters the unary
            // level so `2^-3` parses
            let rhs = self.unary_expr()?;
            return Ok(binary(BinOp::Pow, base, rhs));
        }
        Ok(base)
    }

    fn simple_expr(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            TokenKind::Nil => {
                self.advance();
                Ok(Expr::Nil)
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::True)
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::False)
            }
            TokenKind::Number(n) => {
                let n = *n;
                self.advance();
                Ok(Expr::Number(n))
            }
            TokenKind::Str(s) => {
                let s = s.clone();
                self.advance();
                Ok(Expr::Str(s))
            }
            TokenKind::Ellipsis => {
                self.advance();
                Ok(Expr::Vararg)
            }
            TokenKind::Function => {
                self.advance();
                let body = self.func_body()?;
                Ok(Expr::Function(body))
            }
            TokenKind::LBrace => Ok(Expr::Table(self.table_constructor()?)),
            TokenKind::Name(_) | TokenKind::LParen => self.suffixed_expr(),
            _ => Err(self.unexpected()),
        }
    }

    /// Name or parenthesized expression, then any chain of field
    /// access, indexing, and calls, associating left to right.
    fn suffixed_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = match self.peek() {
            TokenKind::Name(name) => {
                let name = name.clone();
                self.advance();
                Expr::Name(name)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Expr::Paren(Box::new(inner))
            }
            _ => return Err(self.unexpected()),
        };

        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.name()?;
                    expr = Expr::Field {
                        base: Box::new(expr),
                        name,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let key = self.expr()?;
                    self.expect(&TokenKind::RBracket, "']'")?;
                    expr = Expr::Index {
                        base: Box::new(expr),
                        key: Box::new(key),
                    };
                }
                TokenKind::Colon => {
                    self.advance();
                    let method = self.name()?;
                    let args = self.call_args()?;
                    expr = Expr::Call(Box::new(FunctionCall {
                        callee: expr,
                        method: Some(method),
                        args,
                    }));
                }
                TokenKind::LParen | TokenKind::LBrace | TokenKind::Str(_) => {
                    let args = self.call_args()?;
                    expr = Expr::Call(Box::new(FunctionCall {
                        callee: expr,
                        method: None,
                        args,
                    }));
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        match self.peek() {
            TokenKind::LParen => {
                self.advance();
                let args = if *self.peek() == TokenKind::RParen {
                    Vec::new()
                } else {
                    self.expr_list()?
                };
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(args)
            }
            TokenKind::LBrace => Ok(vec![Expr::Table(self.table_constructor()?)]),
            TokenKind::Str(s) => {
                let s = s.clone();
                self.advance();
                Ok(vec![Expr::Str(s)])
            }
            _ => Err(self.expected("call arguments")),
        }
    }

    fn table_constructor(&mut self) -> Result<Vec<TableField>, ParseError> {
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut fields = Vec::new();

        while *self.peek() != TokenKind::RBrace {
            let field = match self.peek() {
                TokenKind::LBracket => {
                    self.advance();
                    let key = self.expr()?;
                    self.expect(&TokenKind::RBracket, "']'")?;
                    self.expect(&TokenKind::Assign, "'='")?;
                    let value = self.expr()?;
                    TableField::Keyed { key, value }
                }
                TokenKind::Name(_) if *self.peek_at(1) == TokenKind::Assign => {
                    let name = self.name()?;
                    self.advance(); // `=`
                    let value = self.expr()?;
                    TableField::Named { name, value }
                }
                _ => TableField::Item(self.expr()?),
            };
            fields.push(field);

            // `,` or `;` separates fields; a trailing separator
            // before `}` is allowed
            if !(self.eat(&TokenKind::Comma) || self.eat(&TokenKind::Semicolon)) {
                break;
            }
        }

        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(fields)
    }
}

fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}
