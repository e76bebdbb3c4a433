//! Default function, constant, and operator registrations installed by
//! `Parser::new`, grounded in `muParser.cpp`'s `InitFun`/`InitConst`/
//! `InitOprt` (see `examples/original_source/muparser-2.2.5`).
//!
//! See `SPEC_FULL.md` §10.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::{ErrorKind, ParserError};
use crate::tables::{Arity, Assoc, Callable, FunctionEntry, SymbolTables};

pub const PI: f64 = std::f64::consts::PI;
pub const E: f64 = std::f64::consts::E;

fn domain_err() -> ParserError {
    ParserError::new(ErrorKind::DomainError, "", None)
}

fn div_zero_err() -> ParserError {
    ParserError::new(ErrorKind::DivByZero, "", None)
}

fn fixed1(f: impl Fn(f64) -> Result<f64, ParserError> + 'static) -> FunctionEntry {
    FunctionEntry {
        arity: Arity::Fixed(1),
        callable: Callable::Numeric(Rc::new(move |args| f(args[0]))),
    }
}

fn fixed2(f: impl Fn(f64, f64) -> Result<f64, ParserError> + 'static) -> FunctionEntry {
    FunctionEntry {
        arity: Arity::Fixed(2),
        callable: Callable::Numeric(Rc::new(move |args| f(args[0], args[1]))),
    }
}

fn variadic(f: impl Fn(&[f64]) -> Result<f64, ParserError> + 'static) -> FunctionEntry {
    FunctionEntry {
        arity: Arity::Variadic,
        callable: Callable::Numeric(Rc::new(f)),
    }
}

/// Installs the default function, constant, and operator tables that
/// `Parser::new` relies on, mirroring the reference's
/// always-on `InitCharSets`/`InitFun`/`InitConst`/`InitOprt` sequence.
/// `domain_checks` gates the math intrinsics that can fail outside
/// their domain (`asin`, `acos`, `log2`, `log10`, `log`/`ln`, `sqrt`);
/// when disabled they behave like their `f64` method counterparts and
/// return `NaN` instead of a `DomainError`, matching the reference's
/// `MUP_MATH_EXCEPTIONS`-off build.
pub fn install_builtins(tables: &mut SymbolTables, domain_checks: Rc<Cell<bool>>) {
    install_functions(tables, domain_checks);
    install_constants(tables);
    install_operators(tables);
}

fn install_functions(tables: &mut SymbolTables, domain_checks: Rc<Cell<bool>>) {
    let checks = domain_checks;

    tables.define_fun("sin", fixed1(|x| Ok(x.sin()))).unwrap();
    tables.define_fun("cos", fixed1(|x| Ok(x.cos()))).unwrap();
    tables.define_fun("tan", fixed1(|x| Ok(x.tan()))).unwrap();

    {
        let c = checks.clone();
        tables
            .define_fun(
                "asin",
                fixed1(move |x| {
                    if c.get() && !(-1.0..=1.0).contains(&x) {
                        Err(domain_err())
                    } else {
                        Ok(x.asin())
                    }
                }),
            )
            .unwrap();
    }
    {
        let c = checks.clone();
        tables
            .define_fun(
                "acos",
                fixed1(move |x| {
                    if c.get() && !(-1.0..=1.0).contains(&x) {
                        Err(domain_err())
                    } else {
                        Ok(x.acos())
                    }
                }),
            )
            .unwrap();
    }
    tables.define_fun("atan", fixed1(|x| Ok(x.atan()))).unwrap();
    tables.define_fun("atan2", fixed2(|y, x| Ok(y.atan2(x)))).unwrap();

    tables.define_fun("sinh", fixed1(|x| Ok(x.sinh()))).unwrap();
    tables.define_fun("cosh", fixed1(|x| Ok(x.cosh()))).unwrap();
    tables.define_fun("tanh", fixed1(|x| Ok(x.tanh()))).unwrap();

    tables.define_fun("asinh", fixed1(|x| Ok(x.asinh()))).unwrap();
    {
        let c = checks.clone();
        tables
            .define_fun(
                "acosh",
                fixed1(move |x| {
                    if c.get() && x < 1.0 {
                        Err(domain_err())
                    } else {
                        Ok(x.acosh())
                    }
                }),
            )
            .unwrap();
    }
    {
        let c = checks.clone();
        tables
            .define_fun(
                "atanh",
                fixed1(move |x| {
                    if c.get() && !(-1.0..1.0).contains(&x) {
                        Err(domain_err())
                    } else {
                        Ok(x.atanh())
                    }
                }),
            )
            .unwrap();
    }

    {
        let c = checks.clone();
        tables
            .define_fun(
                "log2",
                fixed1(move |x| {
                    if c.get() && x <= 0.0 {
                        Err(domain_err())
                    } else {
                        Ok(x.log2())
                    }
                }),
            )
            .unwrap();
    }
    {
        let c = checks.clone();
        tables
            .define_fun(
                "log10",
                fixed1(move |x| {
                    if c.get() && x <= 0.0 {
                        Err(domain_err())
                    } else {
                        Ok(x.log10())
                    }
                }),
            )
            .unwrap();
    }
    // The reference's `InitFun` registers both "log" and "ln" against
    // the same `Ln` callable; this crate follows that exactly rather
    // than treating "log" as base-10 (see the Open Question
    // resolution in DESIGN.md).
    {
        let c = checks.clone();
        tables
            .define_fun(
                "log",
                fixed1(move |x| {
                    if c.get() && x <= 0.0 {
                        Err(domain_err())
                    } else {
                        Ok(x.ln())
                    }
                }),
            )
            .unwrap();
    }
    {
        let c = checks.clone();
        tables
            .define_fun(
                "ln",
                fixed1(move |x| {
                    if c.get() && x <= 0.0 {
                        Err(domain_err())
                    } else {
                        Ok(x.ln())
                    }
                }),
            )
            .unwrap();
    }

    tables.define_fun("exp", fixed1(|x| Ok(x.exp()))).unwrap();
    {
        let c = checks.clone();
        tables
            .define_fun(
                "sqrt",
                fixed1(move |x| {
                    if c.get() && x < 0.0 {
                        Err(domain_err())
                    } else {
                        Ok(x.sqrt())
                    }
                }),
            )
            .unwrap();
    }
    tables
        .define_fun("sign", fixed1(|x| Ok(if x > 0.0 { 1.0 } else if x < 0.0 { -1.0 } else { 0.0 })))
        .unwrap();
    tables.define_fun("rint", fixed1(|x| Ok(x.round()))).unwrap();
    tables.define_fun("abs", fixed1(|x| Ok(x.abs()))).unwrap();

    tables.define_fun("sum", variadic(|args| Ok(args.iter().sum()))).unwrap();
    tables
        .define_fun("avg", variadic(|args| Ok(args.iter().sum::<f64>() / args.len() as f64)))
        .unwrap();
    tables
        .define_fun(
            "min",
            variadic(|args| Ok(args.iter().copied().fold(f64::INFINITY, f64::min))),
        )
        .unwrap();
    tables
        .define_fun(
            "max",
            variadic(|args| Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max))),
        )
        .unwrap();
}

fn install_constants(tables: &mut SymbolTables) {
    tables.define_const("_pi", PI).unwrap();
    tables.define_const("_e", E).unwrap();
}

fn install_operators(tables: &mut SymbolTables) {
    tables
        .define_infix_oprt("-", Rc::new(|x| Ok(-x)), crate::tables::PRECEDENCE_HIGHEST)
        .unwrap();
    tables
        .define_infix_oprt("+", Rc::new(|x| Ok(x)), crate::tables::PRECEDENCE_HIGHEST)
        .unwrap();

    // The precedence ladder from SPEC_FULL.md §3: assignment (handled
    // directly by the compiler, not a table row) is lowest, `^` is
    // highest and right-associative, everything else left-associative.
    const PREC_LOGIC_OR_AND: i32 = 1;
    const PREC_BOR: i32 = 2;
    const PREC_BAND: i32 = 3;
    const PREC_CMP_EQ: i32 = 4;
    const PREC_CMP_REL: i32 = 5;
    const PREC_SHIFT: i32 = 6;
    const PREC_ADD_SUB: i32 = 7;
    const PREC_MUL_DIV: i32 = 8;
    const PREC_POW: i32 = 9;

    let truthy = |x: f64| x != 0.0;
    let bool_val = |b: bool| if b { 1.0 } else { 0.0 };

    let and = truthy;
    let or = truthy;
    tables
        .define_builtin_oprt(
            "&&",
            Rc::new(move |a, b| Ok(bool_val(and(a) && and(b)))),
            PREC_LOGIC_OR_AND,
            Assoc::Left,
        )
        .unwrap();
    tables
        .define_builtin_oprt(
            "||",
            Rc::new(move |a, b| Ok(bool_val(or(a) || or(b)))),
            PREC_LOGIC_OR_AND,
            Assoc::Left,
        )
        .unwrap();

    tables
        .define_builtin_oprt(
            "|",
            Rc::new(|a, b| Ok(((a as i64) | (b as i64)) as f64)),
            PREC_BOR,
            Assoc::Left,
        )
        .unwrap();
    tables
        .define_builtin_oprt(
            "&",
            Rc::new(|a, b| Ok(((a as i64) & (b as i64)) as f64)),
            PREC_BAND,
            Assoc::Left,
        )
        .unwrap();

    tables
        .define_builtin_oprt("==", Rc::new(move |a, b| Ok(bool_val(a == b))), PREC_CMP_EQ, Assoc::Left)
        .unwrap();
    tables
        .define_builtin_oprt("!=", Rc::new(move |a, b| Ok(bool_val(a != b))), PREC_CMP_EQ, Assoc::Left)
        .unwrap();

    tables
        .define_builtin_oprt("<", Rc::new(move |a, b| Ok(bool_val(a < b))), PREC_CMP_REL, Assoc::Left)
        .unwrap();
    tables
        .define_builtin_oprt(">", Rc::new(move |a, b| Ok(bool_val(a > b))), PREC_CMP_REL, Assoc::Left)
        .unwrap();
    tables
        .define_builtin_oprt("<=", Rc::new(move |a, b| Ok(bool_val(a <= b))), PREC_CMP_REL, Assoc::Left)
        .unwrap();
    tables
        .define_builtin_oprt(">=", Rc::new(move |a, b| Ok(bool_val(a >= b))), PREC_CMP_REL, Assoc::Left)
        .unwrap();

    tables
        .define_builtin_oprt(
            "<<",
            Rc::new(|a, b| Ok(((a as i64) << (b as i64)) as f64)),
            PREC_SHIFT,
            Assoc::Left,
        )
        .unwrap();
    tables
        .define_builtin_oprt(
            ">>",
            Rc::new(|a, b| Ok(((a as i64) >> (b as i64)) as f64)),
            PREC_SHIFT,
            Assoc::Left,
        )
        .unwrap();

    tables
        .define_builtin_oprt("+", Rc::new(|a, b| Ok(a + b)), PREC_ADD_SUB, Assoc::Left)
        .unwrap();
    tables
        .define_builtin_oprt("-", Rc::new(|a, b| Ok(a - b)), PREC_ADD_SUB, Assoc::Left)
        .unwrap();

    tables
        .define_builtin_oprt("*", Rc::new(|a, b| Ok(a * b)), PREC_MUL_DIV, Assoc::Left)
        .unwrap();
    tables
        .define_builtin_oprt(
            "/",
            Rc::new(|a, b| if b == 0.0 { Err(div_zero_err()) } else { Ok(a / b) }),
            PREC_MUL_DIV,
            Assoc::Left,
        )
        .unwrap();
    tables
        .define_builtin_oprt(
            "%",
            Rc::new(|a, b| if b == 0.0 { Err(div_zero_err()) } else { Ok(a % b) }),
            PREC_MUL_DIV,
            Assoc::Left,
        )
        .unwrap();

    tables
        .define_builtin_oprt("^", Rc::new(|a, b| Ok(a.powf(b))), PREC_POW, Assoc::Right)
        .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> SymbolTables {
        let mut t = SymbolTables::new();
        install_builtins(&mut t, Rc::new(Cell::new(true)));
        t
    }

    #[test]
    fn log_and_ln_share_the_natural_log_callable() {
        let t = fresh();
        let (_, log_idx) = t.match_name("log(").unwrap();
        let (_, ln_idx) = t.match_name("ln(").unwrap();
        let crate::tables::NameRef::Fun(log_i) = log_idx else { panic!() };
        let crate::tables::NameRef::Fun(ln_i) = ln_idx else { panic!() };
        let log_fn = &t.function(log_i).callable;
        let ln_fn = &t.function(ln_i).callable;
        let (Callable::Numeric(f1), Callable::Numeric(f2)) = (log_fn, ln_fn) else {
            panic!("expected numeric callables")
        };
        assert_eq!(f1(&[std::f64::consts::E]).unwrap(), f2(&[std::f64::consts::E]).unwrap());
    }

    #[test]
    fn sqrt_of_negative_is_domain_error_by_default() {
        let t = fresh();
        let (_, r) = t.match_name("sqrt(").unwrap();
        let crate::tables::NameRef::Fun(i) = r else { panic!() };
        let Callable::Numeric(f) = &t.function(i).callable else { panic!() };
        let err = f(&[-1.0]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DomainError);
    }
}
