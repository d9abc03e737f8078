#![allow(dead_code)]

use luaparse_rs::{Chunk, Expr, LastStat, Stat, parse_str};

/// Parse source that must contain no lexical or syntax faults.
pub fn parse_clean(input: &str) -> Chunk {
    let parsed =
        parse_str(input).unwrap_or_else(|e| panic!("parse failed: {e}\n--- source ---\n{input}"));
    assert!(
        parsed.lex_errors.is_empty(),
        "unexpected lexical errors: {:?}\n--- source ---\n{input}",
        parsed.lex_errors
    );
    parsed.chunk
}

/// Parse a source consisting of exactly one statement.
pub fn single_stat(input: &str) -> Stat {
    let chunk = parse_clean(input);
    assert_eq!(
        chunk.body.stats.len(),
        1,
        "expected one statement in: {input}"
    );
    chunk.body.stats.into_iter().next().expect("one statement")
}

/// Parse `input` as a single expression via a `return` wrapper.
pub fn parse_expr(input: &str) -> Expr {
    let chunk = parse_clean(&format!("return {input}"));
    let Some(LastStat::Return(mut exprs)) = chunk.body.last else {
        panic!("expected return statement for: {input}");
    };
    assert_eq!(exprs.len(), 1, "expected one expression in: {input}");
    exprs.remove(0)
}
