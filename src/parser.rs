//! The public facade: [`Parser`] owns the symbol tables, the cached
//! bytecode, and exposes the bind/define/evaluate API described in
//! `SPEC_FULL.md` §6.

use std::cell::Cell;
use std::rc::Rc;

use crate::bytecode::Program;
use crate::builtins::install_builtins;
use crate::error::{ErrorKind, ParserError};
use crate::evaluator;
use crate::lexer::ValIdentFn;
use crate::tables::{Assoc, BinOpFn, Callable, FunctionEntry, SymbolTables, UnaryOpFn, VarCell};

/// An embeddable expression parser and evaluator.
///
/// Owns its symbol tables and a lazily (re)compiled [`Program`] for
/// the most recently set expression text. Mutating any table
/// invalidates the cache; the next `eval`/`eval_multi` call recompiles
/// it. See `SPEC_FULL.md` §3 ("Lifecycle").
pub struct Parser {
    tables: SymbolTables,
    val_idents: Vec<ValIdentFn>,
    domain_checks: Rc<Cell<bool>>,
    expr: String,
    program: Option<Program>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Constructs a parser with the default character sets, built-in
    /// functions, constants, and operators installed (`SPEC_FULL.md`
    /// §10), matching the reference's always-on
    /// `InitCharSets`/`InitFun`/`InitConst`/`InitOprt` sequence.
    pub fn new() -> Self {
        let domain_checks = Rc::new(Cell::new(true));
        let mut tables = SymbolTables::new();
        install_builtins(&mut tables, domain_checks.clone());
        Self {
            tables,
            val_idents: Vec::new(),
            domain_checks,
            expr: String::new(),
            program: None,
        }
    }

    /// A parser with no tables installed at all, not even the default
    /// built-ins: useful for hosts that want to define their own
    /// complete function/operator set from scratch.
    pub fn bare() -> Self {
        Self {
            tables: SymbolTables::new(),
            val_idents: Vec::new(),
            domain_checks: Rc::new(Cell::new(true)),
            expr: String::new(),
            program: None,
        }
    }

    fn invalidate(&mut self) {
        self.program = None;
    }

    // --- expression text / evaluation --------------------------------

    /// Sets the expression text to be compiled and cached. Compilation
    /// happens immediately so that syntax errors surface at `set_expr`
    /// time rather than at the first `eval`.
    pub fn set_expr(&mut self, text: impl Into<String>) -> Result<(), ParserError> {
        let text = text.into();
        let program = crate::compiler::Compiler::compile(&text, &self.tables, &self.val_idents)?;
        self.expr = text;
        self.program = Some(program);
        Ok(())
    }

    /// Returns the expression text most recently passed to
    /// [`Self::set_expr`].
    pub fn expr(&self) -> &str {
        &self.expr
    }

    fn ensure_compiled(&mut self) -> Result<&Program, ParserError> {
        if self.program.is_none() {
            let program = crate::compiler::Compiler::compile(&self.expr, &self.tables, &self.val_idents)?;
            self.program = Some(program);
        }
        Ok(self.program.as_ref().unwrap())
    }

    /// Evaluates the cached (or freshly recompiled) bytecode, failing
    /// with `GENERIC` if the expression is multi-valued (comma-joined
    /// at the top level). Use [`Self::eval_multi`] for those.
    pub fn eval(&mut self) -> Result<f64, ParserError> {
        let results = self.eval_multi()?;
        if results.len() != 1 {
            return Err(ParserError::generic(
                "expression yields multiple results; use eval_multi",
            ));
        }
        Ok(results[0])
    }

    /// Evaluates the cached (or freshly recompiled) bytecode, returning
    /// one result per top-level comma-separated sub-expression.
    pub fn eval_multi(&mut self) -> Result<Vec<f64>, ParserError> {
        self.ensure_compiled()?;
        let program = self.program.as_ref().unwrap();
        evaluator::eval(program, &self.tables)
    }

    // --- variables -----------------------------------------------------

    /// Binds `name` to a host-owned storage cell. The parser keeps its
    /// own clone of `cell`; writes the host makes through its own
    /// clone are visible at the next `eval` (see `SPEC_FULL.md` §5).
    pub fn define_var(&mut self, name: &str, cell: VarCell) -> Result<(), ParserError> {
        self.tables.define_var(name, cell)?;
        self.invalidate();
        Ok(())
    }

    pub fn remove_var(&mut self, name: &str) -> Result<(), ParserError> {
        self.tables.remove_var(name)?;
        self.invalidate();
        Ok(())
    }

    pub fn clear_var(&mut self) {
        self.tables.clear_var();
        self.invalidate();
    }

    // --- constants -----------------------------------------------------

    pub fn define_const(&mut self, name: &str, value: f64) -> Result<(), ParserError> {
        self.tables.define_const(name, value)?;
        self.invalidate();
        Ok(())
    }

    pub fn clear_const(&mut self) {
        self.tables.clear_const();
        self.invalidate();
    }

    pub fn define_str_const(&mut self, name: &str, value: impl Into<String>) -> Result<(), ParserError> {
        self.tables.define_str_const(name, value)?;
        self.invalidate();
        Ok(())
    }

    pub fn clear_str_const(&mut self) {
        self.tables.clear_str_const();
        self.invalidate();
    }

    // --- functions -----------------------------------------------------

    /// Registers a fixed-arity numeric function.
    pub fn define_fun(
        &mut self,
        name: &str,
        arity: usize,
        f: impl Fn(&[f64]) -> Result<f64, ParserError> + 'static,
    ) -> Result<(), ParserError> {
        self.tables.define_fun(
            name,
            FunctionEntry {
                arity: crate::tables::Arity::Fixed(arity),
                callable: Callable::Numeric(Rc::new(f)),
            },
        )?;
        self.invalidate();
        Ok(())
    }

    /// Registers a variadic (arity ≥ 1) numeric function, e.g. a
    /// custom `sum`-like aggregate.
    pub fn define_fun_variadic(
        &mut self,
        name: &str,
        f: impl Fn(&[f64]) -> Result<f64, ParserError> + 'static,
    ) -> Result<(), ParserError> {
        self.tables.define_fun(
            name,
            FunctionEntry {
                arity: crate::tables::Arity::Variadic,
                callable: Callable::Numeric(Rc::new(f)),
            },
        )?;
        self.invalidate();
        Ok(())
    }

    /// Registers a string-accepting function: its first call-site
    /// argument must be a string literal or string constant; `f`
    /// receives that string plus `numeric_arity` trailing numeric
    /// arguments.
    pub fn define_fun_str(
        &mut self,
        name: &str,
        numeric_arity: usize,
        f: impl Fn(&str, &[f64]) -> Result<f64, ParserError> + 'static,
    ) -> Result<(), ParserError> {
        self.tables.define_fun(
            name,
            FunctionEntry {
                arity: crate::tables::Arity::Fixed(numeric_arity + 1),
                callable: Callable::StringArg(Rc::new(f)),
            },
        )?;
        self.invalidate();
        Ok(())
    }

    pub fn clear_fun(&mut self) {
        self.tables.clear_fun();
        self.invalidate();
    }

    // --- operators -------------------------------------------------------

    pub fn define_oprt(
        &mut self,
        name: &str,
        f: impl Fn(f64, f64) -> Result<f64, ParserError> + 'static,
        precedence: i32,
        assoc: Assoc,
    ) -> Result<(), ParserError> {
        let f: BinOpFn = Rc::new(f);
        self.tables.define_oprt(name, f, precedence, assoc)?;
        self.invalidate();
        Ok(())
    }

    pub fn clear_oprt(&mut self) {
        self.tables.clear_oprt();
        self.invalidate();
    }

    pub fn define_infix_oprt(
        &mut self,
        name: &str,
        f: impl Fn(f64) -> Result<f64, ParserError> + 'static,
        precedence: i32,
    ) -> Result<(), ParserError> {
        let f: UnaryOpFn = Rc::new(f);
        self.tables.define_infix_oprt(name, f, precedence)?;
        self.invalidate();
        Ok(())
    }

    pub fn clear_infix_oprt(&mut self) {
        self.tables.clear_infix_oprt();
        self.invalidate();
    }

    pub fn define_postfix_oprt(
        &mut self,
        name: &str,
        f: impl Fn(f64) -> Result<f64, ParserError> + 'static,
    ) -> Result<(), ParserError> {
        let f: UnaryOpFn = Rc::new(f);
        self.tables.define_postfix_oprt(name, f)?;
        self.invalidate();
        Ok(())
    }

    pub fn clear_postfix_oprt(&mut self) {
        self.tables.clear_postfix_oprt();
        self.invalidate();
    }

    // --- character sets / built-ins / numeric literals --------------------

    pub fn define_name_chars(&mut self, chars: &str) {
        self.tables.define_name_chars(chars);
        self.invalidate();
    }

    pub fn define_oprt_chars(&mut self, chars: &str) {
        self.tables.define_oprt_chars(chars);
        self.invalidate();
    }

    pub fn define_infix_oprt_chars(&mut self, chars: &str) {
        self.tables.define_infix_oprt_chars(chars);
        self.invalidate();
    }

    /// Enables or disables the built-in binary operators; once
    /// disabled, a user-defined operator with the same spelling
    /// becomes reachable (`SPEC_FULL.md` §3).
    pub fn enable_builtin_oprt(&mut self, enabled: bool) {
        self.tables.set_builtin_oprt_enabled(enabled);
        self.invalidate();
    }

    /// Registers an additional numeric-literal recogniser, tried
    /// before the default decimal reader, in registration order.
    pub fn add_val_ident(&mut self, f: ValIdentFn) {
        self.val_idents.push(f);
        self.invalidate();
    }

    /// Enables or disables domain-error checking (`MUP_MATH_EXCEPTIONS`
    /// in the reference) for the built-in math intrinsics installed by
    /// [`Self::new`]. Has no effect on a [`Self::bare`] parser or on
    /// user-registered functions.
    pub fn set_domain_checks(&mut self, enabled: bool) {
        self.domain_checks.set(enabled);
        self.invalidate();
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser").field("expr", &self.expr).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell as StdCell;

    #[test]
    fn simple_arithmetic() {
        let mut p = Parser::new();
        p.set_expr("(1+ 2*a)").unwrap();
        let a = Rc::new(StdCell::new(1.0));
        p.define_var("a", a).unwrap();
        assert_eq!(p.eval().unwrap(), 3.0);
    }

    #[test]
    fn right_assoc_power_and_left_assoc_division() {
        let mut p = Parser::new();
        p.set_expr("2^2^3").unwrap();
        assert_eq!(p.eval().unwrap(), 256.0);

        let mut p = Parser::new();
        p.set_expr("1/2/3").unwrap();
        assert_eq!(p.eval().unwrap(), 1.0 / 2.0 / 3.0);
    }

    #[test]
    fn assignment_and_compound_expression() {
        let mut p = Parser::new();
        let a = Rc::new(StdCell::new(1.0));
        let c = Rc::new(StdCell::new(3.0));
        p.define_var("a", a.clone()).unwrap();
        p.define_var("c", c).unwrap();
        p.set_expr("a=c, a*10").unwrap();
        assert_eq!(p.eval_multi().unwrap(), vec![3.0, 30.0]);
        assert_eq!(a.get(), 3.0);
    }

    #[test]
    fn ternary_picks_the_right_branch() {
        let mut p = Parser::new();
        let a = Rc::new(StdCell::new(1.0));
        let b = Rc::new(StdCell::new(2.0));
        let c = Rc::new(StdCell::new(3.0));
        let d = Rc::new(StdCell::new(-2.0));
        p.define_var("a", a).unwrap();
        p.define_var("b", b).unwrap();
        p.define_var("c", c).unwrap();
        p.define_var("d", d).unwrap();

        p.set_expr("(a<b) ? c : d").unwrap();
        assert_eq!(p.eval().unwrap(), 3.0);

        p.set_expr("(a>b) ? c : d").unwrap();
        assert_eq!(p.eval().unwrap(), -2.0);
    }

    #[test]
    fn variadic_functions() {
        let mut p = Parser::new();
        p.set_expr("sum(1,-max(1,2),3)*2").unwrap();
        assert_eq!(p.eval().unwrap(), 4.0);
    }

    #[test]
    fn hex_literal_recogniser() {
        let mut p = Parser::new();
        p.add_val_ident(Rc::new(|s: &str| {
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
    fn domain_error_on_sqrt_of_negative() {
        let mut p = Parser::new();
        p.set_expr("sqrt(-1)").unwrap();
        let err = p.eval().unwrap_err();
        assert_eq!(err.kind, ErrorKind::DomainError);
    }

    #[test]
    fn syntax_errors() {
        let mut p = Parser::new();
        assert_eq!(p.set_expr("(2+").unwrap_err().kind, ErrorKind::UnexpectedEof);
        assert_eq!(p.set_expr("()").unwrap_err().kind, ErrorKind::UnexpectedParens);
        assert_eq!(p.set_expr("sin(3,4)").unwrap_err().kind, ErrorKind::TooManyParams);
    }

    #[test]
    fn string_accepting_function() {
        let mut p = Parser::new();
        p.define_fun_str("strlen", 0, |s, _| Ok(s.len() as f64)).unwrap();
        p.define_str_const("str1", "1.11").unwrap();
        p.set_expr("strlen(str1)").unwrap();
        assert_eq!(p.eval().unwrap(), 4.0);
    }

    #[test]
    fn name_conflict_on_duplicate_variable() {
        let mut p = Parser::new();
        p.define_var("a", Rc::new(StdCell::new(0.0))).unwrap();
        let err = p.define_var("a", Rc::new(StdCell::new(0.0))).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NameConflict);
    }

    #[test]
    fn invalid_name_rejected() {
        let mut p = Parser::new();
        let err = p.define_var("1bad", Rc::new(StdCell::new(0.0))).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidName);
    }

    #[test]
    fn disabling_builtin_oprt_frees_the_spelling() {
        let mut p = Parser::new();
        p.enable_builtin_oprt(false);
        p.define_oprt("+", |a, b| Ok(a - b), 7, Assoc::Left).unwrap();
        p.set_expr("5+2").unwrap();
        assert_eq!(p.eval().unwrap(), 3.0);
    }

    #[test]
    fn recompiles_lazily_after_binding_change() {
        let mut p = Parser::new();
        let a = Rc::new(StdCell::new(1.0));
        p.define_var("a", a.clone()).unwrap();
        p.set_expr("a*2").unwrap();
        assert_eq!(p.eval().unwrap(), 2.0);
        a.set(5.0);
        assert_eq!(p.eval().unwrap(), 10.0);
    }
}
