//! Parser edge cases and error tests.

mod common;

use common::{parse_clean, single_stat};
use luaparse_rs::{
    Expr, LastStat, Number, ParseErrorKind, Stat, TableField, Var, parse, parse_str, tokenize,
};

// -----------------------------------------------------------
// Statement forms.
// -----------------------------------------------------------

#[test]
fn parse_do_block() {
    let stat = single_stat("do x = 1 end");
    let Stat::Do(body) = stat else {
        panic!("expected do block, got {stat:?}");
    };
    assert_eq!(body.stats.len(), 1);
}

#[test]
fn parse_while_loop() {
    let stat = single_stat("while x > 0 do x = x - 1 end");
    let Stat::While { cond, body } = stat else {
        panic!("expected while, got {stat:?}");
    };
    assert!(matches!(cond, Expr::Binary { .. }));
    assert_eq!(body.stats.len(), 1);
}

#[test]
fn parse_repeat_loop() {
    let stat = single_stat("repeat x = x + 1 until x == 10");
    let Stat::Repeat { body, cond } = stat else {
        panic!("expected repeat, got {stat:?}");
    };
    assert_eq!(body.stats.len(), 1);
    assert!(matches!(cond, Expr::Binary { .. }));
}

#[test]
fn parse_if_without_else() {
    let stat = single_stat("if a then b() end");
    let Stat::If {
        elseifs, else_body, ..
    } = stat
    else {
        panic!("expected if, got {stat:?}");
    };
    assert!(elseifs.is_empty());
    assert!(else_body.is_none());
}

#[test]
fn parse_if_chain() {
    let stat = single_stat("if a then b() elseif c then d() else e() end");
    let Stat::If {
        body,
        elseifs,
        else_body,
        ..
    } = stat
    else {
        panic!("expected if, got {stat:?}");
    };
    assert_eq!(body.stats.len(), 1);
    assert_eq!(elseifs.len(), 1);
    let else_body = else_body.expect("else block");
    assert_eq!(else_body.stats.len(), 1);
}

#[test]
fn parse_multiple_elseifs() {
    let stat = single_stat("if a then elseif b then elseif c then elseif d then end");
    let Stat::If { elseifs, .. } = stat else {
        panic!("expected if, got {stat:?}");
    };
    assert_eq!(elseifs.len(), 3);
}

#[test]
fn parse_numeric_for_without_step() {
    let stat = single_stat("for i = 1, 10 do end");
    let Stat::NumericFor {
        var,
        start,
        stop,
        step,
        body,
    } = stat
    else {
        panic!("expected numeric for, got {stat:?}");
    };
    assert_eq!(var, "i");
    assert_eq!(start, Expr::Number(Number::Int(1)));
    assert_eq!(stop, Expr::Number(Number::Int(10)));
    assert!(step.is_none());
    assert!(body.stats.is_empty());
}

#[test]
fn parse_numeric_for_with_step() {
    let stat = single_stat("for i = 10, 1, -1 do end");
    let Stat::NumericFor { step, .. } = stat else {
        panic!("expected numeric for, got {stat:?}");
    };
    assert!(matches!(step, Some(Expr::Unary { .. })));
}

#[test]
fn parse_generic_for() {
    let stat = single_stat("for k, v in pairs(t) do end");
    let Stat::GenericFor { names, exprs, .. } = stat else {
        panic!("expected generic for, got {stat:?}");
    };
    assert_eq!(names, vec!["k".to_string(), "v".to_string()]);
    assert_eq!(exprs.len(), 1);
    assert!(matches!(exprs[0], Expr::Call(_)));
}

#[test]
fn parse_generic_for_single_name() {
    let stat = single_stat("for line in lines do end");
    let Stat::GenericFor { names, .. } = stat else {
        panic!("expected generic for, got {stat:?}");
    };
    assert_eq!(names, vec!["line".to_string()]);
}

#[test]
fn parse_function_declaration() {
    let stat = single_stat("function f() end");
    let Stat::Function { name, body } = stat else {
        panic!("expected function, got {stat:?}");
    };
    assert_eq!(name.base, "f");
    assert!(name.path.is_empty());
    assert!(name.method.is_none());
    assert!(body.params.names.is_empty());
    assert!(!body.params.is_vararg);
}

#[test]
fn parse_local_function() {
    let stat = single_stat("local function helper(a, b) return a + b end");
    let Stat::LocalFunction { name, body } = stat else {
        panic!("expected local function, got {stat:?}");
    };
    assert_eq!(name, "helper");
    assert_eq!(body.params.names.len(), 2);
    assert!(body.body.last.is_some());
}

#[test]
fn parse_vararg_only_params() {
    let stat = single_stat("function f(...) end");
    let Stat::Function { body, .. } = stat else {
        panic!("expected function, got {stat:?}");
    };
    assert!(body.params.names.is_empty());
    assert!(body.params.is_vararg);
}

#[test]
fn parse_return_without_values() {
    let chunk = parse_clean("return");
    assert_eq!(chunk.body.last, Some(LastStat::Return(Vec::new())));
}

#[test]
fn parse_return_with_values_and_semicolon() {
    let chunk = parse_clean("return 1, 2;");
    let Some(LastStat::Return(exprs)) = chunk.body.last else {
        panic!("expected return");
    };
    assert_eq!(exprs.len(), 2);
}

#[test]
fn parse_break_ends_block() {
    let chunk = parse_clean("while true do break end");
    let Stat::While { body, .. } = &chunk.body.stats[0] else {
        panic!("expected while");
    };
    assert_eq!(body.last, Some(LastStat::Break));
}

#[test]
fn parse_semicolon_separators() {
    let chunk = parse_clean("a = 1; b = 2; c = 3");
    assert_eq!(chunk.body.stats.len(), 3);
}

#[test]
fn parse_table_assignment_targets() {
    let stat = single_stat("t[1], t.x = 10, 20");
    let Stat::Assign { targets, .. } = stat else {
        panic!("expected assignment, got {stat:?}");
    };
    assert!(matches!(targets[0], Var::Index { .. }));
    assert!(matches!(targets[1], Var::Field { .. }));
}

#[test]
fn parse_method_call_statement() {
    let stat = single_stat("obj:method(1, 2)");
    let Stat::Call(call) = stat else {
        panic!("expected call, got {stat:?}");
    };
    assert_eq!(call.method.as_deref(), Some("method"));
    assert_eq!(call.args.len(), 2);
}

#[test]
fn parse_table_constructor_fields() {
    let stat = single_stat("t = {1, x = 2, [3 + 1] = 4}");
    let Stat::Assign { values, .. } = stat else {
        panic!("expected assignment, got {stat:?}");
    };
    let Expr::Table(fields) = &values[0] else {
        panic!("expected table constructor");
    };
    assert_eq!(fields.len(), 3);
    assert!(matches!(fields[0], TableField::Item(_)));
    assert!(matches!(fields[1], TableField::Named { .. }));
    assert!(matches!(fields[2], TableField::Keyed { .. }));
}

#[test]
fn parse_table_semicolon_separators_and_trailing() {
    let stat = single_stat("t = {1; 2, 3;}");
    let Stat::Assign { values, .. } = stat else {
        panic!("expected assignment, got {stat:?}");
    };
    let Expr::Table(fields) = &values[0] else {
        panic!("expected table constructor");
    };
    assert_eq!(fields.len(), 3);
}

#[test]
fn parse_empty_table() {
    let stat = single_stat("t = {}");
    let Stat::Assign { values, .. } = stat else {
        panic!("expected assignment, got {stat:?}");
    };
    assert_eq!(values[0], Expr::Table(Vec::new()));
}

#[test]
fn parse_nested_functions() {
    let chunk = parse_clean(
        "function outer()\n\
         \tlocal function inner() return 1 end\n\
         \treturn inner\n\
         end",
    );
    let Stat::Function { body, .. } = &chunk.body.stats[0] else {
        panic!("expected function");
    };
    assert_eq!(body.body.stats.len(), 1);
}

// -----------------------------------------------------------
// Parser errors.
// -----------------------------------------------------------

#[test]
fn parse_error_missing_end() {
    let err = parse_str("while true do x = 1").unwrap_err();
    assert!(matches!(
        err.kind,
        ParseErrorKind::Expected { what: "'end'", .. }
    ));
}

#[test]
fn parse_error_missing_then() {
    let err = parse_str("if x y = 1 end").unwrap_err();
    assert!(matches!(
        err.kind,
        ParseErrorKind::Expected { what: "'then'", .. }
    ));
}

#[test]
fn parse_error_missing_do() {
    let err = parse_str("for i = 1, 2 end").unwrap_err();
    assert!(matches!(
        err.kind,
        ParseErrorKind::Expected { what: "'do'", .. }
    ));
}

#[test]
fn parse_error_for_without_assign_or_in() {
    let err = parse_str("for i 1, 2 do end").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::Expected { .. }));
}

#[test]
fn parse_error_unmatched_end() {
    let err = parse_str("x = 1\nend").unwrap_err();
    assert_eq!(err.span.line, 2);
}

#[test]
fn parse_error_until_without_repeat() {
    let err = parse_str("until x").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::UnexpectedToken { .. }));
}

#[test]
fn parse_error_leading_semicolon() {
    let err = parse_str("; x = 1").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::UnexpectedToken { .. }));
}

#[test]
fn parse_error_trailing_comma_in_params() {
    let err = parse_str("function f(a,) end").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::Expected { .. }));
}

#[test]
fn parse_error_vararg_must_be_last() {
    let err = parse_str("function f(..., a) end").unwrap_err();
    assert!(matches!(
        err.kind,
        ParseErrorKind::Expected { what: "')'", .. }
    ));
}

#[test]
fn parse_error_unclosed_paren() {
    let err = parse_str("x = (1 + 2").unwrap_err();
    assert!(matches!(
        err.kind,
        ParseErrorKind::Expected { what: "')'", .. }
    ));
}

#[test]
fn parse_error_unclosed_table() {
    let err = parse_str("t = {1, 2").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::Expected { .. }));
}

#[test]
fn parse_error_assignment_without_value() {
    let err = parse_str("x =").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::UnexpectedToken { .. }));
}

#[test]
fn parse_error_invalid_assign_target() {
    let err = parse_str("(x) = 1").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::InvalidAssignTarget);
}

#[test]
fn parse_error_display_includes_location() {
    let err = parse_str("do\nreturn 1\n").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("expected 'end'"), "got: {msg}");
    assert!(msg.contains("line 3"), "got: {msg}");
}

#[test]
fn parse_empty_token_slice() {
    // a slice without an EOF marker still parses as an empty chunk
    let chunk = parse(&[]).expect("empty parse");
    assert!(chunk.body.stats.is_empty());
}

#[test]
fn parse_tokens_directly() {
    let lexed = tokenize("x = 1");
    let chunk = parse(&lexed.tokens).expect("parse");
    assert_eq!(chunk.body.stats.len(), 1);
}
