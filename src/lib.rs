//! Lua lexer and parser.
//!
//! A syntax front-end for a subset of Lua: source text in, typed
//! abstract syntax tree or error out. No evaluation, scoping, or
//! code generation happens here.
//!
//! # Quick start
//!
//! ## Parse a chunk
//!
//! ```
//! use luaparse_rs::parse_str;
//!
//! let source = "local answer = 6 * 7\nprint(answer)";
//! let parsed = parse_str(source).unwrap();
//! assert_eq!(parsed.chunk.body.stats.len(), 2);
//! assert!(parsed.lex_errors.is_empty());
//! ```
//!
//! ## Lexical faults are recoverable
//!
//! Illegal characters are skipped and reported; the remaining
//! well-formed source still parses:
//!
//! ```
//! use luaparse_rs::parse_str;
//!
//! let parsed = parse_str("$x = 1").unwrap();
//! assert_eq!(parsed.lex_errors.len(), 1);
//! assert_eq!(parsed.chunk.body.stats.len(), 1);
//! ```
//!
//! ## Syntax faults are not
//!
//! The first grammar violation aborts the parse with an error
//! carrying the offending location; no partial tree is produced:
//!
//! ```
//! use luaparse_rs::parse_str;
//!
//! let err = parse_str("x = 1\nend").unwrap_err();
//! assert_eq!(err.span.line, 2);
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{
    BinOp, Block, Chunk, ElseIf, Expr, FuncBody, FuncName, FunctionCall, LastStat, Params, Stat,
    TableField, UnOp, Var,
};
pub use lexer::{LexError, Lexed, tokenize};
pub use parser::{ParseError, ParseErrorKind, parse};
pub use token::{Number, Span, Token, TokenKind};

/// Result of a successful parse: the tree plus the lexical faults
/// recovered along the way.
///
/// A nonzero `lex_errors` does not invalidate the tree; it is an
/// advisory count of characters the lexer had to skip.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub chunk: Chunk,
    pub lex_errors: Vec<LexError>,
}

/// Tokenize and parse a Lua source string in one step.
///
/// Lexical faults do not fail the parse; they are returned in
/// [`Parsed::lex_errors`]. The first syntax fault aborts with a
/// [`ParseError`] and no tree.
pub fn parse_str(input: &str) -> Result<Parsed, ParseError> {
    let lexed = tokenize(input);
    let chunk = parse(&lexed.tokens)?;
    Ok(Parsed {
        chunk,
        lex_errors: lexed.errors,
    })
}
