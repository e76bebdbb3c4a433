//! The concrete scenario table from `SPEC_FULL.md` §8, exercised
//! end-to-end through the public `Parser` facade.

use calcscript::{var_cell, Parser};

fn parser_with_test_bindings() -> Parser {
    let mut p = Parser::new();
    p.define_var("a", var_cell(1.0)).unwrap();
    p.define_var("b", var_cell(2.0)).unwrap();
    p.define_var("c", var_cell(3.0)).unwrap();
    p.define_var("d", var_cell(-2.0)).unwrap();
    p.define_const("const", 1.0).unwrap();
    p.define_const("const1", 2.0).unwrap();
    p.define_const("const2", 3.0).unwrap();
    p.define_str_const("str1", "1.11").unwrap();
    p.define_str_const("str2", "2.22").unwrap();
    p
}

#[test]
fn scenario_1_grouping_and_variable() {
    let mut p = parser_with_test_bindings();
    p.set_expr("(1+ 2*a)").unwrap();
    assert_eq!(p.eval().unwrap(), 3.0);
}

#[test]
fn scenario_2_power_is_right_associative() {
    let mut p = parser_with_test_bindings();
    p.set_expr("2^2^3").unwrap();
    assert_eq!(p.eval().unwrap(), 256.0);
}

#[test]
fn scenario_3_division_is_left_associative() {
    let mut p = parser_with_test_bindings();
    p.set_expr("1/2/3").unwrap();
    assert_eq!(p.eval().unwrap(), 1.0 / 2.0 / 3.0);
}

#[test]
fn scenario_4_assignment_and_compound_expression() {
    let mut p = parser_with_test_bindings();
    p.set_expr("a=c, a*10").unwrap();
    assert_eq!(p.eval_multi().unwrap(), vec![3.0, 30.0]);

    // `a` really was mutated: a second, independent read confirms it.
    p.set_expr("a").unwrap();
    assert_eq!(p.eval().unwrap(), 3.0);
}

#[test]
fn scenario_5_ternary_picks_the_taken_branch() {
    let mut p = parser_with_test_bindings();
    p.set_expr("(a<b) ? c : d").unwrap();
    assert_eq!(p.eval().unwrap(), 3.0);

    p.set_expr("(a>b) ? c : d").unwrap();
    assert_eq!(p.eval().unwrap(), -2.0);
}

#[test]
fn scenario_6_variadic_sum_and_max() {
    let mut p = parser_with_test_bindings();
    p.set_expr("sum(1,-max(1,2),3)*2").unwrap();
    assert_eq!(p.eval().unwrap(), 4.0);
}

#[test]
fn scenario_7_hex_literal_recogniser() {
    let mut p = parser_with_test_bindings();
    p.add_val_ident(std::rc::Rc::new(|s: &str| {
        let rest = s.strip_prefix("0x")?;
        let hexdigits: String = rest.chars().take_while(|c| c.is_ascii_hexdigit()).collect();
        if hexdigits.is_empty() {
            return None;
        }
        i64::from_str_radix(&hexdigits, 16).ok().map(|v| (v as f64, 2 + hexdigits.len()))
    }));
    p.set_expr("0xff+10").unwrap();
    assert_eq!(p.eval().unwrap(), 265.0);
}

#[test]
fn scenario_8_sqrt_of_negative_is_domain_error() {
    let mut p = parser_with_test_bindings();
    p.set_expr("sqrt(-1)").unwrap();
    let err = p.eval().unwrap_err();
    assert_eq!(err.kind, calcscript::ErrorKind::DomainError);
}

#[test]
fn scenario_9_structural_errors() {
    let mut p = parser_with_test_bindings();
    assert_eq!(p.set_expr("(2+").unwrap_err().kind, calcscript::ErrorKind::UnexpectedEof);
    assert_eq!(p.set_expr("()").unwrap_err().kind, calcscript::ErrorKind::UnexpectedParens);
    assert_eq!(p.set_expr("sin(3,4)").unwrap_err().kind, calcscript::ErrorKind::TooManyParams);
}

#[test]
fn string_constants_round_trip_through_a_string_function() {
    let mut p = parser_with_test_bindings();
    p.define_fun_str("strlen", 0, |s, _| Ok(s.len() as f64)).unwrap();
    p.set_expr("strlen(str1)").unwrap();
    assert_eq!(p.eval().unwrap(), 4.0);
    p.set_expr("strlen(str2)").unwrap();
    assert_eq!(p.eval().unwrap(), 4.0);
}
