//! Executes a compiled [`Program`] against the current values of bound
//! variables.
//!
//! See `SPEC_FULL.md` §4.3.

use crate::bytecode::{Op, Program, StrArg};
use crate::error::ParserError;
use crate::tables::SymbolTables;

/// Runs `prog` once, returning every `END_OF_STATEMENT`-delimited
/// result plus the final value. `results` always has length equal to
/// the number of comma-separated top-level expressions in the
/// compiled text (at least one).
pub fn eval(prog: &Program, tables: &SymbolTables) -> Result<Vec<f64>, ParserError> {
    let mut stack: Vec<f64> = Vec::with_capacity(prog.max_stack_depth.max(1));
    let mut results = Vec::new();
    let mut pc = 0usize;

    while pc < prog.ops.len() {
        match &prog.ops[pc] {
            Op::PushNum(v) => stack.push(*v),
            Op::PushVar(idx) => stack.push(tables.variable(*idx).get()),
            Op::BinOp(idx) => {
                let rhs = stack.pop().expect("balanced stack");
                let lhs = stack.pop().expect("balanced stack");
                let entry = tables.bin_op(*idx);
                stack.push((entry.callable)(lhs, rhs)?);
            }
            Op::InfixOp(idx) => {
                let v = stack.pop().expect("balanced stack");
                let entry = tables.infix_op(*idx);
                stack.push((entry.callable)(v)?);
            }
            Op::PostfixOp(idx) => {
                let v = stack.pop().expect("balanced stack");
                let entry = tables.postfix_op(*idx);
                stack.push((entry.callable)(v)?);
            }
            Op::Call(idx, argc) => {
                let argc = *argc;
                let start = stack.len() - argc;
                let args: Vec<f64> = stack.split_off(start);
                let entry = tables.function(*idx);
                let f = match &entry.callable {
                    crate::tables::Callable::Numeric(f) => f,
                    crate::tables::Callable::StringArg(_) => {
                        unreachable!("string-accepting calls compile to CallStr")
                    }
                };
                stack.push(f(&args)?);
            }
            Op::CallStr(idx, str_arg, argc) => {
                let argc = *argc;
                let start = stack.len() - argc;
                let args: Vec<f64> = stack.split_off(start);
                let s = resolve_str(str_arg, prog, tables);
                let entry = tables.function(*idx);
                let f = match &entry.callable {
                    crate::tables::Callable::StringArg(f) => f,
                    crate::tables::Callable::Numeric(_) => unreachable!("non-string call compiled as CallStr"),
                };
                stack.push(f(s, &args)?);
            }
            Op::Assign(idx) => {
                let v = *stack.last().expect("balanced stack");
                tables.variable(*idx).set(v);
            }
            Op::JmpIfFalse(target) => {
                let v = stack.pop().expect("balanced stack");
                if v == 0.0 {
                    pc = *target;
                    continue;
                }
            }
            Op::Jmp(target) => {
                pc = *target;
                continue;
            }
            Op::EndOfStatement => {
                results.push(*stack.last().expect("balanced stack"));
                stack.clear();
            }
        }
        pc += 1;
    }

    results.push(*stack.last().expect("program always leaves one value"));
    Ok(results)
}

fn resolve_str<'a>(s: &'a StrArg, prog: &'a Program, tables: &'a SymbolTables) -> &'a str {
    match s {
        StrArg::Literal(i) => &prog.strings[*i],
        StrArg::Const(i) => tables.str_constant_value(*i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::install_builtins;
    use crate::compiler::Compiler;
    use std::cell::Cell;
    use std::rc::Rc;

    fn tables_with_builtins() -> SymbolTables {
        let mut t = SymbolTables::new();
        install_builtins(&mut t, Rc::new(Cell::new(true)));
        t
    }

    #[test]
    fn evaluates_simple_arithmetic() {
        let tables = tables_with_builtins();
        let prog = Compiler::compile("(1+ 2*3)", &tables, &[]).unwrap();
        let results = eval(&prog, &tables).unwrap();
        assert_eq!(results, vec![7.0]);
    }

    #[test]
    fn ternary_short_circuits_the_untaken_branch() {
        let mut tables = tables_with_builtins();
        let a = Rc::new(Cell::new(0.0));
        tables.define_var("a", a.clone()).unwrap();
        let prog = Compiler::compile("0 ? a=10 : 20", &tables, &[]).unwrap();
        let results = eval(&prog, &tables).unwrap();
        assert_eq!(results, vec![20.0]);
        assert_eq!(a.get(), 0.0);
    }

    #[test]
    fn assignment_mutates_the_bound_cell() {
        let mut tables = tables_with_builtins();
        let a = Rc::new(Cell::new(1.0));
        let c = Rc::new(Cell::new(3.0));
        tables.define_var("a", a.clone()).unwrap();
        tables.define_var("c", c).unwrap();
        let prog = Compiler::compile("a=c, a*10", &tables, &[]).unwrap();
        let results = eval(&prog, &tables).unwrap();
        assert_eq!(results, vec![3.0, 30.0]);
        assert_eq!(a.get(), 3.0);
    }
}
