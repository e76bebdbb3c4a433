//! Ternary short-circuit semantics (`SPEC_FULL.md` §4.3, §8).

use calcscript::{var_cell, Parser};

#[test]
fn untaken_then_branch_never_assigns() {
    let mut p = Parser::new();
    let a = var_cell(0.0);
    p.define_var("a", a.clone()).unwrap();
    p.set_expr("0 ? a=10 : 20").unwrap();
    assert_eq!(p.eval().unwrap(), 20.0);
    assert_eq!(a.get(), 0.0);
}

#[test]
fn untaken_else_branch_never_evaluates() {
    let mut p = Parser::new();
    let calls = var_cell(0.0);
    p.define_var("calls", calls.clone()).unwrap();
    // The else branch increments `calls` as a side effect via
    // assignment; since the condition is true, it must never run.
    p.set_expr("1 ? 1 : (calls = calls + 1)").unwrap();
    assert_eq!(p.eval().unwrap(), 1.0);
    assert_eq!(calls.get(), 0.0);
}

#[test]
fn nested_ternary_chains_resolve_to_the_same_end_position() {
    let mut p = Parser::new();
    p.set_expr("0 ? 1 : 0 ? 2 : 3").unwrap();
    assert_eq!(p.eval().unwrap(), 3.0);

    p.set_expr("0 ? 1 : 1 ? 2 : 3").unwrap();
    assert_eq!(p.eval().unwrap(), 2.0);
}

#[test]
fn ternary_inside_function_call_argument() {
    let mut p = Parser::new();
    p.set_expr("max(0 ? 10 : 1, 5)").unwrap();
    assert_eq!(p.eval().unwrap(), 5.0);
}
