//! Coverage of the error taxonomy in `SPEC_FULL.md` §7.

use calcscript::{var_cell, Assoc, ErrorKind, Parser};

fn kind_of(p: &mut Parser, expr: &str) -> ErrorKind {
    p.set_expr(expr).unwrap_err().kind
}

#[test]
fn missing_else_clause() {
    let mut p = Parser::new();
    assert_eq!(kind_of(&mut p, "1 ? 2"), ErrorKind::MissingElseClause);
}

#[test]
fn misplaced_colon() {
    let mut p = Parser::new();
    assert_eq!(kind_of(&mut p, "1 : 2"), ErrorKind::MisplacedColon);
}

#[test]
fn stray_conditional_with_no_preceding_value() {
    assert_eq!(kind_of(&mut Parser::new(), "? 1 : 2"), ErrorKind::UnexpectedConditional);
}

#[test]
fn stray_conditional_on_a_string_condition() {
    let mut p = Parser::new();
    p.define_str_const("x", "hi").unwrap();
    assert_eq!(kind_of(&mut p, "\"x\" ? 1 : 2"), ErrorKind::OprtTypeConflict);
    assert_eq!(kind_of(&mut p, "x ? 1 : 2"), ErrorKind::OprtTypeConflict);
}

#[test]
fn assignment_to_non_variable_is_unexpected_operator() {
    let mut p = Parser::new();
    assert_eq!(kind_of(&mut p, "1 = 2"), ErrorKind::UnexpectedOperator);
}

#[test]
fn too_few_params_for_fixed_arity_function() {
    let mut p = Parser::new();
    assert_eq!(kind_of(&mut p, "atan2(1)"), ErrorKind::TooFewParams);
}

#[test]
fn variadic_function_requires_at_least_one_argument() {
    let mut p = Parser::new();
    assert_eq!(kind_of(&mut p, "sum()"), ErrorKind::TooFewParams);
}

#[test]
fn unterminated_string_literal() {
    let mut p = Parser::new();
    p.define_fun_str("strlen", 0, |s, _| Ok(s.len() as f64)).unwrap();
    assert_eq!(kind_of(&mut p, "strlen(\"abc"), ErrorKind::UnterminatedString);
}

#[test]
fn string_expected_when_non_string_passed_to_string_function() {
    let mut p = Parser::new();
    p.define_fun_str("strlen", 0, |s, _| Ok(s.len() as f64)).unwrap();
    assert_eq!(kind_of(&mut p, "strlen(1)"), ErrorKind::StringExpected);
}

#[test]
fn val_expected_when_string_passed_to_numeric_function() {
    let mut p = Parser::new();
    assert_eq!(kind_of(&mut p, "sin(\"abc\")"), ErrorKind::ValExpected);
}

#[test]
fn str_result_when_top_level_expression_is_a_string() {
    let mut p = Parser::new();
    p.define_str_const("str1", "hello").unwrap();
    assert_eq!(kind_of(&mut p, "str1"), ErrorKind::StrResult);
}

#[test]
fn oprt_type_conflict_mixing_string_and_arithmetic() {
    let mut p = Parser::new();
    p.define_str_const("str1", "hello").unwrap();
    assert_eq!(kind_of(&mut p, "str1 + 1"), ErrorKind::OprtTypeConflict);
}

#[test]
fn div_by_zero_is_a_runtime_error() {
    let mut p = Parser::new();
    p.set_expr("1/0").unwrap();
    assert_eq!(p.eval().unwrap_err().kind, ErrorKind::DivByZero);
}

#[test]
fn invalid_name_must_start_with_letter_or_underscore() {
    let mut p = Parser::new();
    let err = p.define_var("1x", var_cell(0.0)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidName);
}

#[test]
fn name_conflict_across_tables() {
    let mut p = Parser::new();
    p.define_const("k", 1.0).unwrap();
    let err = p.define_var("k", var_cell(0.0)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NameConflict);
}

#[test]
fn unary_and_binary_operators_may_share_a_spelling() {
    // `+`/`-` are registered both as infix (unary) operators and as
    // binary operators by `Parser::new`; they live in different
    // lexer-state namespaces and must not collide.
    let mut p = Parser::new();
    p.set_expr("-3 - -2").unwrap();
    assert_eq!(p.eval().unwrap(), -1.0);
}

#[test]
fn eval_of_multi_valued_expression_without_eval_multi_fails() {
    let mut p = Parser::new();
    p.set_expr("1, 2").unwrap();
    assert!(p.eval().is_err());
    assert_eq!(p.eval_multi().unwrap(), vec![1.0, 2.0]);
}

#[test]
fn user_defined_operator_after_disabling_builtin() {
    let mut p = Parser::new();
    p.enable_builtin_oprt(false);
    p.define_oprt("+", |a, b| Ok(a * b), 7, Assoc::Left).unwrap();
    p.set_expr("3+4").unwrap();
    assert_eq!(p.eval().unwrap(), 12.0);
}

#[test]
fn unexpected_parens_on_bare_parens() {
    let mut p = Parser::new();
    assert_eq!(kind_of(&mut p, "()"), ErrorKind::UnexpectedParens);
}

#[test]
fn missing_parens_on_unbalanced_open_paren() {
    let mut p = Parser::new();
    assert_eq!(kind_of(&mut p, "(1+2"), ErrorKind::UnexpectedEof);
    assert_eq!(kind_of(&mut p, "((1+2)"), ErrorKind::MissingParens);
}
