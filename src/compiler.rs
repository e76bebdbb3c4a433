//! The shunting-yard compiler: turns a pulled token stream into a
//! [`Program`], performing constant folding and ternary short-circuit
//! jump patching as it goes.
//!
//! See `SPEC_FULL.md` §4.2.

use crate::bytecode::{Op, Program, StrArg};
use crate::error::{ErrorKind, ParserError};
use crate::lexer::{Lexer, ValIdentFn};
use crate::tables::{Assoc, Callable, SymbolTables};
use crate::token::TokenKind;

#[derive(Debug, Clone)]
enum ShadowKind {
    Const(f64),
    NonConst,
    StrLit(usize),
    StrConst(usize),
}

#[derive(Debug, Clone)]
struct ShadowVal {
    kind: ShadowKind,
    emit_start: usize,
    /// `Some(var_idx)` only while this shadow value is still exactly
    /// the bare `Variable` token it was pushed from, with no operator
    /// applied yet — used to validate assignment left-hand sides.
    bare_var: Option<usize>,
}

struct ParenEntry {
    fn_idx: Option<usize>,
    fn_name: String,
    fn_name_pos: usize,
    argc: usize,
    open_pos: usize,
}

struct TernaryEntry {
    jmp_if_false_pos: usize,
    jmp_pos: Option<usize>,
}

enum OpEntry {
    BinOp { idx: usize, precedence: i32, assoc: Assoc },
    Assign { var_idx: usize },
    Infix { idx: usize, precedence: i32 },
    Paren(ParenEntry),
    Ternary(TernaryEntry),
}

const PREC_ASSIGN: i32 = 0;

pub struct Compiler<'a> {
    tables: &'a SymbolTables,
    prog: Program,
    values: Vec<ShadowVal>,
    ops: Vec<OpEntry>,
    max_depth: usize,
}

impl<'a> Compiler<'a> {
    pub fn compile(expr: &str, tables: &'a SymbolTables, val_idents: &[ValIdentFn]) -> Result<Program, ParserError> {
        let mut c = Compiler {
            tables,
            prog: Program::new(),
            values: Vec::new(),
            ops: Vec::new(),
            max_depth: 0,
        };
        c.run(expr, val_idents)?;
        Ok(c.prog)
    }

    fn push_value(&mut self, kind: ShadowKind, emit_start: usize, bare_var: Option<usize>) {
        self.values.push(ShadowVal { kind, emit_start, bare_var });
        self.max_depth = self.max_depth.max(self.values.len());
    }

    fn run(&mut self, expr: &str, val_idents: &[ValIdentFn]) -> Result<(), ParserError> {
        let mut lexer = Lexer::new(expr, val_idents);
        let mut expect_value = true;
        let mut pending_fn: Option<(usize, String, usize)> = None;
        let mut just_opened_paren = false;

        loop {
            let token = lexer.next(expect_value, self.tables, &mut self.prog)?;
            let was_just_opened = just_opened_paren;
            just_opened_paren = false;

            match token.kind {
                TokenKind::Number(v) => {
                    let start = self.prog.ops.len();
                    self.prog.ops.push(Op::PushNum(v));
                    self.push_value(ShadowKind::Const(v), start, None);
                    expect_value = false;
                }
                TokenKind::Variable(idx) => {
                    let start = self.prog.ops.len();
                    self.prog.ops.push(Op::PushVar(idx));
                    self.push_value(ShadowKind::NonConst, start, Some(idx));
                    expect_value = false;
                }
                TokenKind::Constant(idx) => {
                    let v = self.tables.constant_value(idx);
                    let start = self.prog.ops.len();
                    self.prog.ops.push(Op::PushNum(v));
                    self.push_value(ShadowKind::Const(v), start, None);
                    expect_value = false;
                }
                TokenKind::StringLiteral(idx) => {
                    let start = self.prog.ops.len();
                    self.push_value(ShadowKind::StrLit(idx), start, None);
                    expect_value = false;
                }
                TokenKind::StringConstant(idx) => {
                    let start = self.prog.ops.len();
                    self.push_value(ShadowKind::StrConst(idx), start, None);
                    expect_value = false;
                }
                TokenKind::Function(idx) => {
                    pending_fn = Some((idx, token.lexeme.clone(), token.pos));
                    expect_value = true;
                }
                TokenKind::OpenParen => {
                    let (fn_idx, fn_name, fn_name_pos) = match pending_fn.take() {
                        Some((i, n, p)) => (Some(i), n, p),
                        None => (None, String::new(), token.pos),
                    };
                    self.ops.push(OpEntry::Paren(ParenEntry {
                        fn_idx,
                        fn_name,
                        fn_name_pos,
                        argc: 0,
                        open_pos: self.prog.ops.len(),
                    }));
                    expect_value = true;
                    just_opened_paren = true;
                }
                TokenKind::CloseParen => {
                    if pending_fn.is_some() {
                        return Err(ParserError::with_token(
                            ErrorKind::UnexpectedFun,
                            pending_fn.take().unwrap().1,
                            token.pos,
                        ));
                    }
                    self.close_paren(was_just_opened, token.pos)?;
                    expect_value = false;
                }
                TokenKind::Comma => {
                    if pending_fn.is_some() {
                        return Err(ParserError::with_token(ErrorKind::UnexpectedFun, "(", token.pos));
                    }
                    self.comma(token.pos)?;
                    expect_value = true;
                }
                TokenKind::Question => {
                    self.flush_operators_unconditional()?;
                    let top = self.values.last().ok_or_else(|| {
                        ParserError::with_token(ErrorKind::UnexpectedConditional, "?", token.pos)
                    })?;
                    if matches!(top.kind, ShadowKind::StrLit(_) | ShadowKind::StrConst(_)) {
                        return Err(ParserError::with_token(ErrorKind::OprtTypeConflict, "?", token.pos));
                    }
                    let jmp_if_false_pos = self.prog.ops.len();
                    self.prog.ops.push(Op::JmpIfFalse(usize::MAX));
                    self.values.pop();
                    self.ops.push(OpEntry::Ternary(TernaryEntry {
                        jmp_if_false_pos,
                        jmp_pos: None,
                    }));
                    expect_value = true;
                }
                TokenKind::Colon => {
                    self.flush_operators_unconditional()?;
                    match self.ops.last_mut() {
                        Some(OpEntry::Ternary(t)) if t.jmp_pos.is_none() => {
                            let jmp_pos = self.prog.ops.len();
                            self.prog.ops.push(Op::Jmp(usize::MAX));
                            if let Op::JmpIfFalse(target) = &mut self.prog.ops[t.jmp_if_false_pos] {
                                *target = jmp_pos + 1;
                            }
                            t.jmp_pos = Some(jmp_pos);
                        }
                        _ => return Err(ParserError::with_token(ErrorKind::MisplacedColon, ":", token.pos)),
                    }
                    expect_value = true;
                }
                TokenKind::Assign => {
                    self.precedence_flush(PREC_ASSIGN, Assoc::Right)?;
                    let top = self.values.last().ok_or_else(|| {
                        ParserError::with_token(ErrorKind::UnexpectedOperator, "=", token.pos)
                    })?;
                    let var_idx = top.bare_var.ok_or_else(|| {
                        ParserError::with_token(ErrorKind::UnexpectedOperator, "=", token.pos)
                    })?;
                    let lhs = self.values.pop().unwrap();
                    self.prog.ops.truncate(lhs.emit_start);
                    self.ops.push(OpEntry::Assign { var_idx });
                    expect_value = true;
                }
                TokenKind::BinaryOp(idx) => {
                    let entry = self.tables.bin_op(idx);
                    let (prec, assoc) = (entry.precedence, entry.assoc);
                    self.precedence_flush(prec, assoc)?;
                    self.ops.push(OpEntry::BinOp { idx, precedence: prec, assoc });
                    expect_value = true;
                }
                TokenKind::InfixOp(idx) => {
                    let precedence = self.tables.infix_op(idx).precedence;
                    self.ops.push(OpEntry::Infix { idx, precedence });
                    expect_value = true;
                }
                TokenKind::PostfixOp(idx) => {
                    self.apply_postfix(idx, token.pos)?;
                    expect_value = false;
                }
                TokenKind::EndOfExpr => {
                    if expect_value {
                        return Err(ParserError::at(ErrorKind::UnexpectedEof, token.pos));
                    }
                    break;
                }
            }
        }

        self.resolve_to_paren_or_top()?;
        if !self.ops.is_empty() {
            return Err(ParserError::new(ErrorKind::MissingParens, "", None));
        }
        match self.values.pop() {
            Some(v) => {
                if matches!(v.kind, ShadowKind::StrLit(_) | ShadowKind::StrConst(_)) {
                    return Err(ParserError::new(ErrorKind::StrResult, "", None));
                }
            }
            None => return Err(ParserError::at(ErrorKind::UnexpectedEof, 0)),
        }
        self.prog.max_stack_depth = self.max_depth;
        Ok(())
    }

    // --- operator stack flushing -----------------------------------------

    fn emit_one(&mut self, entry: OpEntry) -> Result<(), ParserError> {
        match entry {
            OpEntry::BinOp { idx, .. } => self.combine_binop(idx),
            OpEntry::Assign { var_idx } => self.combine_assign(var_idx),
            OpEntry::Infix { idx, .. } => self.combine_infix(idx),
            OpEntry::Paren(_) | OpEntry::Ternary(_) => unreachable!("structural entries are not emitted"),
        }
    }

    /// Pops and emits BinOp/Assign/Infix entries while the new
    /// operator's precedence requires it (standard precedence
    /// climbing), stopping at a Paren or Ternary boundary.
    fn precedence_flush(&mut self, new_prec: i32, new_assoc: Assoc) -> Result<(), ParserError> {
        loop {
            let should_pop = match self.ops.last() {
                Some(OpEntry::BinOp { precedence, .. }) => {
                    *precedence > new_prec || (*precedence == new_prec && new_assoc == Assoc::Left)
                }
                Some(OpEntry::Assign { .. }) => {
                    PREC_ASSIGN > new_prec || (PREC_ASSIGN == new_prec && new_assoc == Assoc::Left)
                }
                Some(OpEntry::Infix { precedence, .. }) => {
                    *precedence > new_prec || (*precedence == new_prec && new_assoc == Assoc::Left)
                }
                _ => false,
            };
            if !should_pop {
                break;
            }
            let entry = self.ops.pop().unwrap();
            self.emit_one(entry)?;
        }
        Ok(())
    }

    /// Pops and emits every BinOp/Assign/Infix entry unconditionally,
    /// stopping at a Paren or Ternary boundary (or an empty stack).
    /// Used when a structural boundary token arrives (`?`, `:`).
    fn flush_operators_unconditional(&mut self) -> Result<(), ParserError> {
        loop {
            match self.ops.last() {
                Some(OpEntry::BinOp { .. }) | Some(OpEntry::Assign { .. }) | Some(OpEntry::Infix { .. }) => {
                    let entry = self.ops.pop().unwrap();
                    self.emit_one(entry)?;
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Like [`Self::flush_operators_unconditional`], but also resolves
    /// (patches and pops) any Ternary markers it encounters, erroring
    /// if one was never closed with `:`. Stops at a Paren boundary or
    /// an empty stack. Used by `,` (top-level), `)`, and end of
    /// expression.
    fn resolve_to_paren_or_top(&mut self) -> Result<(), ParserError> {
        loop {
            match self.ops.last() {
                Some(OpEntry::BinOp { .. }) | Some(OpEntry::Assign { .. }) | Some(OpEntry::Infix { .. }) => {
                    let entry = self.ops.pop().unwrap();
                    self.emit_one(entry)?;
                }
                Some(OpEntry::Ternary(t)) => {
                    if t.jmp_pos.is_none() {
                        return Err(ParserError::new(ErrorKind::MissingElseClause, "", None));
                    }
                    let jmp_pos = t.jmp_pos.unwrap();
                    let here = self.prog.ops.len();
                    if let Op::Jmp(target) = &mut self.prog.ops[jmp_pos] {
                        *target = here;
                    }
                    self.ops.pop();
                }
                _ => break,
            }
        }
        Ok(())
    }

    // --- structural token handlers -----------------------------------------

    fn close_paren(&mut self, was_just_opened: bool, pos: usize) -> Result<(), ParserError> {
        if was_just_opened {
            let paren = match self.ops.pop() {
                Some(OpEntry::Paren(p)) => p,
                _ => unreachable!("open-paren flag set without a Paren entry"),
            };
            return match paren.fn_idx {
                Some(fn_idx) => {
                    let arity = self.tables.function(fn_idx).arity;
                    arity
                        .check(0)
                        .map_err(|k| ParserError::with_token(k, paren.fn_name.clone(), paren.fn_name_pos))?;
                    if self.tables.function(fn_idx).callable.is_string_arg() {
                        return Err(ParserError::with_token(
                            ErrorKind::StringExpected,
                            paren.fn_name,
                            paren.fn_name_pos,
                        ));
                    }
                    self.prog.ops.push(Op::Call(fn_idx, 0));
                    self.push_value(ShadowKind::NonConst, paren.open_pos, None);
                    Ok(())
                }
                None => Err(ParserError::with_token(ErrorKind::UnexpectedParens, "()", pos)),
            };
        }

        self.resolve_to_paren_or_top()?;
        let paren = match self.ops.pop() {
            Some(OpEntry::Paren(p)) => p,
            _ => return Err(ParserError::with_token(ErrorKind::UnexpectedParens, ")", pos)),
        };

        let fn_idx = match paren.fn_idx {
            None => return Ok(()),
            Some(i) => i,
        };

        let total_args = paren.argc + 1;
        let arity = self.tables.function(fn_idx).arity;
        arity
            .check(total_args)
            .map_err(|k| ParserError::with_token(k, paren.fn_name.clone(), paren.fn_name_pos))?;

        let is_string_arg = self.tables.function(fn_idx).callable.is_string_arg();
        let len = self.values.len();
        let window_start = len - total_args;

        if is_string_arg {
            let arg0 = self.values[window_start].kind.clone();
            let str_arg = match arg0 {
                ShadowKind::StrLit(i) => StrArg::Literal(i),
                ShadowKind::StrConst(i) => StrArg::Const(i),
                _ => {
                    return Err(ParserError::with_token(
                        ErrorKind::StringExpected,
                        paren.fn_name,
                        paren.fn_name_pos,
                    ))
                }
            };
            for extra in &self.values[window_start + 1..] {
                if matches!(extra.kind, ShadowKind::StrLit(_) | ShadowKind::StrConst(_)) {
                    return Err(ParserError::with_token(ErrorKind::ValExpected, paren.fn_name, paren.fn_name_pos));
                }
            }
            let numeric_argc = total_args - 1;
            let all_const = self.values[window_start + 1..]
                .iter()
                .all(|v| matches!(v.kind, ShadowKind::Const(_)));
            if all_const {
                let nums: Vec<f64> = self.values[window_start + 1..]
                    .iter()
                    .map(|v| match v.kind {
                        ShadowKind::Const(c) => c,
                        _ => unreachable!(),
                    })
                    .collect();
                let s = self.resolve_str(&str_arg).to_string();
                let result = match &self.tables.function(fn_idx).callable {
                    Callable::StringArg(f) => f(&s, &nums),
                    Callable::Numeric(_) => unreachable!(),
                };
                match result {
                    Ok(v) => {
                        let truncate_to = if numeric_argc > 0 {
                            self.values[window_start + 1].emit_start
                        } else {
                            paren.open_pos
                        };
                        self.prog.ops.truncate(truncate_to);
                        self.prog.ops.push(Op::PushNum(v));
                        self.values.truncate(window_start);
                        self.push_value(ShadowKind::Const(v), truncate_to, None);
                    }
                    Err(mut e) => {
                        e.position = e.position.or(Some(paren.fn_name_pos));
                        return Err(e);
                    }
                }
            } else {
                let emit_start = if numeric_argc > 0 {
                    self.values[window_start + 1].emit_start
                } else {
                    paren.open_pos
                };
                self.prog.ops.push(Op::CallStr(fn_idx, str_arg, numeric_argc));
                self.values.truncate(window_start);
                self.push_value(ShadowKind::NonConst, emit_start, None);
            }
        } else {
            for v in &self.values[window_start..] {
                if matches!(v.kind, ShadowKind::StrLit(_) | ShadowKind::StrConst(_)) {
                    return Err(ParserError::with_token(ErrorKind::ValExpected, paren.fn_name, paren.fn_name_pos));
                }
            }
            let emit_start = self.values[window_start].emit_start;
            let all_const = self.values[window_start..].iter().all(|v| matches!(v.kind, ShadowKind::Const(_)));
            if all_const {
                let nums: Vec<f64> = self.values[window_start..]
                    .iter()
                    .map(|v| match v.kind {
                        ShadowKind::Const(c) => c,
                        _ => unreachable!(),
                    })
                    .collect();
                let result = match &self.tables.function(fn_idx).callable {
                    Callable::Numeric(f) => f(&nums),
                    Callable::StringArg(_) => unreachable!(),
                };
                match result {
                    Ok(v) => {
                        self.prog.ops.truncate(emit_start);
                        self.prog.ops.push(Op::PushNum(v));
                        self.values.truncate(window_start);
                        self.push_value(ShadowKind::Const(v), emit_start, None);
                    }
                    Err(mut e) => {
                        e.position = e.position.or(Some(paren.fn_name_pos));
                        return Err(e);
                    }
                }
            } else {
                self.prog.ops.push(Op::Call(fn_idx, total_args));
                self.values.truncate(window_start);
                self.push_value(ShadowKind::NonConst, emit_start, None);
            }
        }
        Ok(())
    }

    fn comma(&mut self, pos: usize) -> Result<(), ParserError> {
        self.resolve_to_paren_or_top()?;
        match self.ops.last_mut() {
            Some(OpEntry::Paren(p)) if p.fn_idx.is_some() => {
                p.argc += 1;
                Ok(())
            }
            Some(OpEntry::Paren(_)) => Err(ParserError::with_token(ErrorKind::UnexpectedComma, ",", pos)),
            _ => {
                let top = self.values.last().ok_or_else(|| ParserError::at(ErrorKind::UnexpectedComma, pos))?;
                if matches!(top.kind, ShadowKind::StrLit(_) | ShadowKind::StrConst(_)) {
                    return Err(ParserError::at(ErrorKind::StrResult, pos));
                }
                self.prog.ops.push(Op::EndOfStatement);
                self.values.pop();
                Ok(())
            }
        }
    }

    fn apply_postfix(&mut self, idx: usize, pos: usize) -> Result<(), ParserError> {
        let top = self.values.pop().ok_or_else(|| ParserError::at(ErrorKind::UnexpectedOperator, pos))?;
        if matches!(top.kind, ShadowKind::StrLit(_) | ShadowKind::StrConst(_)) {
            return Err(ParserError::at(ErrorKind::OprtTypeConflict, pos));
        }
        let entry = self.tables.postfix_op(idx);
        match top.kind {
            ShadowKind::Const(v) => match (entry.callable)(v) {
                Ok(r) => {
                    self.prog.ops.truncate(top.emit_start);
                    self.prog.ops.push(Op::PushNum(r));
                    self.push_value(ShadowKind::Const(r), top.emit_start, None);
                }
                Err(mut e) => {
                    e.position = e.position.or(Some(pos));
                    return Err(e);
                }
            },
            _ => {
                self.prog.ops.push(Op::PostfixOp(idx));
                self.push_value(ShadowKind::NonConst, top.emit_start, None);
            }
        }
        Ok(())
    }

    fn combine_infix(&mut self, idx: usize) -> Result<(), ParserError> {
        let top = self.values.pop().ok_or_else(|| ParserError::new(ErrorKind::UnexpectedOperator, "", None))?;
        if matches!(top.kind, ShadowKind::StrLit(_) | ShadowKind::StrConst(_)) {
            return Err(ParserError::new(ErrorKind::OprtTypeConflict, "", None));
        }
        let entry = self.tables.infix_op(idx);
        match top.kind {
            ShadowKind::Const(v) => match (entry.callable)(v) {
                Ok(r) => {
                    self.prog.ops.truncate(top.emit_start);
                    self.prog.ops.push(Op::PushNum(r));
                    self.push_value(ShadowKind::Const(r), top.emit_start, None);
                }
                Err(e) => return Err(e),
            },
            _ => {
                self.prog.ops.push(Op::InfixOp(idx));
                self.push_value(ShadowKind::NonConst, top.emit_start, None);
            }
        }
        Ok(())
    }

    fn combine_binop(&mut self, idx: usize) -> Result<(), ParserError> {
        let rhs = self.values.pop().ok_or_else(|| ParserError::new(ErrorKind::UnexpectedOperator, "", None))?;
        let lhs = self.values.pop().ok_or_else(|| ParserError::new(ErrorKind::UnexpectedOperator, "", None))?;
        if matches!(rhs.kind, ShadowKind::StrLit(_) | ShadowKind::StrConst(_))
            || matches!(lhs.kind, ShadowKind::StrLit(_) | ShadowKind::StrConst(_))
        {
            return Err(ParserError::new(ErrorKind::OprtTypeConflict, "", None));
        }
        let entry = self.tables.bin_op(idx);
        let emit_start = lhs.emit_start;
        match (lhs.kind, rhs.kind) {
            (ShadowKind::Const(a), ShadowKind::Const(b)) => match (entry.callable)(a, b) {
                Ok(v) => {
                    self.prog.ops.truncate(emit_start);
                    self.prog.ops.push(Op::PushNum(v));
                    self.push_value(ShadowKind::Const(v), emit_start, None);
                }
                Err(e) => return Err(e),
            },
            _ => {
                self.prog.ops.push(Op::BinOp(idx));
                self.push_value(ShadowKind::NonConst, emit_start, None);
            }
        }
        Ok(())
    }

    fn combine_assign(&mut self, var_idx: usize) -> Result<(), ParserError> {
        let rhs = self.values.pop().ok_or_else(|| ParserError::new(ErrorKind::UnexpectedOperator, "", None))?;
        if matches!(rhs.kind, ShadowKind::StrLit(_) | ShadowKind::StrConst(_)) {
            return Err(ParserError::new(ErrorKind::OprtTypeConflict, "", None));
        }
        self.prog.ops.push(Op::Assign(var_idx));
        self.push_value(ShadowKind::NonConst, rhs.emit_start, None);
        Ok(())
    }

    fn resolve_str(&self, s: &StrArg) -> &str {
        match s {
            StrArg::Literal(i) => &self.prog.strings[*i],
            StrArg::Const(i) => self.tables.str_constant_value(*i),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::install_builtins;
    use crate::bytecode::Op;
    use std::cell::Cell;
    use std::rc::Rc;

    fn tables_with_builtins() -> SymbolTables {
        let mut t = SymbolTables::new();
        install_builtins(&mut t, Rc::new(Cell::new(true)));
        t
    }

    #[test]
    fn folds_pure_constant_expression() {
        let tables = tables_with_builtins();
        let prog = Compiler::compile("1+2*3", &tables, &[]).unwrap();
        assert_eq!(prog.ops, vec![Op::PushNum(7.0)]);
    }

    #[test]
    fn right_assoc_power() {
        let tables = tables_with_builtins();
        let prog = Compiler::compile("2^2^3", &tables, &[]).unwrap();
        assert_eq!(prog.ops, vec![Op::PushNum(256.0)]);
    }

    #[test]
    fn left_assoc_division() {
        let tables = tables_with_builtins();
        let prog = Compiler::compile("1/2/3", &tables, &[]).unwrap();
        assert_eq!(prog.ops, vec![Op::PushNum(1.0 / 2.0 / 3.0)]);
    }

    #[test]
    fn bare_parens_is_unexpected_parens() {
        let tables = tables_with_builtins();
        let err = Compiler::compile("()", &tables, &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedParens);
    }

    #[test]
    fn too_many_params_detected_at_compile_time() {
        let tables = tables_with_builtins();
        let err = Compiler::compile("sin(3,4)", &tables, &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TooManyParams);
    }

    #[test]
    fn unterminated_expression_is_unexpected_eof() {
        let tables = tables_with_builtins();
        let err = Compiler::compile("(2+", &tables, &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedEof);
    }

    #[test]
    fn fold_error_surfaces_before_a_lower_precedence_binop_follows() {
        // Folding "1/0" happens when the following "*" forces a
        // precedence-flush of the pending "/" entry; the DIV_BY_ZERO
        // error raised by that fold must propagate out of `compile`
        // rather than being silently dropped.
        let tables = tables_with_builtins();
        let err = Compiler::compile("1/0*2", &tables, &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivByZero);
    }

    #[test]
    fn fold_error_surfaces_before_an_assignment_follows() {
        // A pending infix (prefix) operator outranks assignment's
        // precedence, so assigning right after one forces
        // `precedence_flush` to fold it first; a folding error there
        // must propagate rather than being dropped.
        let mut tables = tables_with_builtins();
        tables.define_var("a", Rc::new(Cell::new(0.0))).unwrap();
        tables
            .define_infix_oprt(
                "~",
                Rc::new(|x| {
                    if x == 0.0 {
                        Err(ParserError::new(ErrorKind::DomainError, "", None))
                    } else {
                        Ok(-x)
                    }
                }),
                crate::tables::PRECEDENCE_HIGHEST,
            )
            .unwrap();
        let err = Compiler::compile("~0=a", &tables, &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DomainError);
    }

    #[test]
    fn fold_error_surfaces_before_a_ternary_question_mark() {
        let tables = tables_with_builtins();
        let err = Compiler::compile("1/0 ? 1 : 2", &tables, &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivByZero);
    }

    #[test]
    fn fold_error_surfaces_before_a_ternary_colon() {
        let tables = tables_with_builtins();
        let err = Compiler::compile("1 ? 1/0 : 2", &tables, &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivByZero);
    }
}
