//! Symbol tables: variables, constants, string constants, functions,
//! and the three operator tables (binary, prefix "infix", postfix).
//!
//! See `SPEC_FULL.md` §3 ("Constant", "Variable binding", "Function
//! entry", "Operator entry") and §9's "Longest-match tokeniser" design
//! note, which this module implements via [`Trie`].

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::error::{ErrorKind, ParserError};

/// A host-owned storage cell for a bound variable. The host constructs
/// one, clones it into the parser via `Parser::define_var`, and keeps
/// writing to it; the parser reads through its own clone at evaluation
/// time. See `SPEC_FULL.md` §5.
pub type VarCell = Rc<Cell<f64>>;

/// Function/operator arity: a fixed count, or variadic (accepts one or
/// more arguments).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Variadic,
}

impl Arity {
    /// Checks a call-site argument count against this arity, returning
    /// the appropriate error on mismatch.
    pub fn check(&self, found: usize) -> Result<(), ErrorKind> {
        match *self {
            Arity::Fixed(n) if found < n => Err(ErrorKind::TooFewParams),
            Arity::Fixed(n) if found > n => Err(ErrorKind::TooManyParams),
            Arity::Fixed(_) => Ok(()),
            Arity::Variadic if found == 0 => Err(ErrorKind::TooFewParams),
            Arity::Variadic => Ok(()),
        }
    }
}

/// Binary operator associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

/// A function's callable body. String-accepting functions (per
/// `SPEC_FULL.md` §3's "Function entry") receive their leading string
/// argument separately from the trailing numeric arguments.
#[derive(Clone)]
pub enum Callable {
    Numeric(Rc<dyn Fn(&[f64]) -> Result<f64, ParserError>>),
    StringArg(Rc<dyn Fn(&str, &[f64]) -> Result<f64, ParserError>>),
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Numeric(_) => write!(f, "Callable::Numeric(..)"),
            Callable::StringArg(_) => write!(f, "Callable::StringArg(..)"),
        }
    }
}

impl Callable {
    pub fn is_string_arg(&self) -> bool {
        matches!(self, Callable::StringArg(_))
    }
}

#[derive(Debug, Clone)]
pub struct FunctionEntry {
    pub arity: Arity,
    pub callable: Callable,
}

pub type BinOpFn = Rc<dyn Fn(f64, f64) -> Result<f64, ParserError>>;
pub type UnaryOpFn = Rc<dyn Fn(f64) -> Result<f64, ParserError>>;

#[derive(Clone)]
pub struct BinOpEntry {
    pub precedence: i32,
    pub assoc: Assoc,
    pub callable: BinOpFn,
    pub builtin: bool,
}

impl fmt::Debug for BinOpEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinOpEntry")
            .field("precedence", &self.precedence)
            .field("assoc", &self.assoc)
            .field("builtin", &self.builtin)
            .finish()
    }
}

#[derive(Clone)]
pub struct UnaryOpEntry {
    pub precedence: i32,
    pub callable: UnaryOpFn,
}

impl fmt::Debug for UnaryOpEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnaryOpEntry")
            .field("precedence", &self.precedence)
            .finish()
    }
}

/// Highest usable precedence; the default for `DefineInfixOprt` per
/// `SPEC_FULL.md` §6.
pub const PRECEDENCE_HIGHEST: i32 = i32::MAX / 2;

/// A minimal trie over `char`, used to resolve longest-match lookups
/// among overlapping operator/name spellings in O(length) time rather
/// than scanning every registered name. See `SPEC_FULL.md` §9.
#[derive(Debug, Default)]
struct TrieNode<V> {
    children: HashMap<char, TrieNode<V>>,
    value: Option<V>,
}

impl<V> TrieNode<V> {
    fn new() -> Self {
        Self {
            children: HashMap::new(),
            value: None,
        }
    }
}

#[derive(Debug)]
pub struct Trie<V> {
    root: TrieNode<V>,
}

impl<V: Clone> Default for Trie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Trie<V> {
    pub fn new() -> Self {
        Self {
            root: TrieNode::new(),
        }
    }

    pub fn insert(&mut self, key: &str, value: V) {
        let mut node = &mut self.root;
        for ch in key.chars() {
            node = node.children.entry(ch).or_insert_with(TrieNode::new);
        }
        node.value = Some(value);
    }

    /// Finds the longest registered key that is a prefix of `haystack`.
    /// Returns `(matched_char_len, value)`.
    pub fn longest_match(&self, haystack: &str) -> Option<(usize, V)> {
        let mut node = &self.root;
        let mut best: Option<(usize, V)> = None;
        for (count, ch) in haystack.chars().enumerate() {
            match node.children.get(&ch) {
                Some(next) => {
                    node = next;
                    if let Some(v) = &node.value {
                        best = Some((count + 1, v.clone()));
                    }
                }
                None => break,
            }
        }
        best
    }
}

/// What a matched name in the combined name trie refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRef {
    Var(usize),
    Const(usize),
    StrConst(usize),
    Fun(usize),
}

fn default_name_chars() -> HashSet<char> {
    "0123456789_abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ"
        .chars()
        .collect()
}

fn default_oprt_chars() -> HashSet<char> {
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ+-*^/?<>=#!$%&|~'_{}"
        .chars()
        .collect()
}

fn default_infix_oprt_chars() -> HashSet<char> {
    "/+-*^?<>=#!$%&|~'_".chars().collect()
}

/// All symbol tables owned by a [`crate::parser::Parser`] instance.
///
/// Holds the six name tables plus the three character sets, and keeps
/// tries over each rebuilt after every mutation so the tokeniser can do
/// longest-match lookups cheaply.
#[derive(Debug)]
pub struct SymbolTables {
    variables: Vec<(String, VarCell)>,
    var_index: HashMap<String, usize>,

    constants: Vec<(String, f64)>,
    const_index: HashMap<String, usize>,

    string_constants: Vec<(String, String)>,
    str_const_index: HashMap<String, usize>,

    functions: Vec<(String, FunctionEntry)>,
    fun_index: HashMap<String, usize>,

    bin_ops: Vec<(String, BinOpEntry)>,
    bin_op_index: HashMap<String, usize>,

    infix_ops: Vec<(String, UnaryOpEntry)>,
    infix_op_index: HashMap<String, usize>,

    postfix_ops: Vec<(String, UnaryOpEntry)>,
    postfix_op_index: HashMap<String, usize>,

    pub name_chars: HashSet<char>,
    pub oprt_chars: HashSet<char>,
    pub infix_oprt_chars: HashSet<char>,

    builtin_oprt_enabled: bool,

    name_trie: Trie<NameRef>,
    bin_op_trie: Trie<usize>,
    infix_op_trie: Trie<usize>,
    postfix_op_trie: Trie<usize>,
}

impl Default for SymbolTables {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTables {
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            var_index: HashMap::new(),
            constants: Vec::new(),
            const_index: HashMap::new(),
            string_constants: Vec::new(),
            str_const_index: HashMap::new(),
            functions: Vec::new(),
            fun_index: HashMap::new(),
            bin_ops: Vec::new(),
            bin_op_index: HashMap::new(),
            infix_ops: Vec::new(),
            infix_op_index: HashMap::new(),
            postfix_ops: Vec::new(),
            postfix_op_index: HashMap::new(),
            name_chars: default_name_chars(),
            oprt_chars: default_oprt_chars(),
            infix_oprt_chars: default_infix_oprt_chars(),
            builtin_oprt_enabled: true,
            name_trie: Trie::new(),
            bin_op_trie: Trie::new(),
            infix_op_trie: Trie::new(),
            postfix_op_trie: Trie::new(),
        }
    }

    // --- name validation -------------------------------------------------
    //
    // The tokeniser never confuses a "value expected" name (variable,
    // constant, string constant, function, infix/prefix operator) with
    // an "operator expected" name (postfix operator, binary operator):
    // they are looked up in different lexer states (SPEC_FULL.md
    // §4.1). So the two groups are independent namespaces; only names
    // *within* a group must be unique. This is also what lets the
    // built-in unary `+`/`-` (infix, value-context) share their
    // spelling with the built-in binary `+`/`-` (operator-context).

    /// True if `name` is already registered among the value-context
    /// tables: variables, constants, string constants, functions,
    /// infix (prefix) operators.
    fn is_value_conflicting(&self, name: &str) -> bool {
        self.var_index.contains_key(name)
            || self.const_index.contains_key(name)
            || self.str_const_index.contains_key(name)
            || self.fun_index.contains_key(name)
            || self.infix_op_index.contains_key(name)
    }

    /// True if `name` is already registered among the
    /// operator-context tables: postfix operators, binary operators.
    fn is_operator_conflicting(&self, name: &str) -> bool {
        self.postfix_op_index.contains_key(name) || self.active_bin_op_index(name).is_some()
    }

    fn check_value_conflict(&self, name: &str) -> Result<(), ParserError> {
        if self.is_value_conflicting(name) {
            Err(ParserError::new(ErrorKind::NameConflict, name, None))
        } else {
            Ok(())
        }
    }

    fn check_operator_conflict(&self, name: &str) -> Result<(), ParserError> {
        if self.is_operator_conflicting(name) {
            Err(ParserError::new(ErrorKind::NameConflict, name, None))
        } else {
            Ok(())
        }
    }

    /// Validates an identifier-style name (variable, constant, string
    /// constant, or function): must start with a letter or `_`, and
    /// every character must be in `name_chars`.
    pub fn validate_identifier_name(&self, name: &str) -> Result<(), ParserError> {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_alphabetic() || c == '_' => {}
            _ => return Err(ParserError::new(ErrorKind::InvalidName, name, None)),
        }
        if !name.chars().all(|c| self.name_chars.contains(&c)) {
            return Err(ParserError::new(ErrorKind::InvalidName, name, None));
        }
        self.check_value_conflict(name)
    }

    /// Validates a binary/postfix operator-style name against the
    /// given character set (the binary-operator charset), which
    /// allows the symbol spellings (`+`, `==`, `<<`, ...) that
    /// identifier rules would reject.
    fn validate_operator_name(&self, name: &str, charset: &HashSet<char>) -> Result<(), ParserError> {
        if name.is_empty() || !name.chars().all(|c| charset.contains(&c)) {
            return Err(ParserError::new(ErrorKind::InvalidName, name, None));
        }
        self.check_operator_conflict(name)
    }

    /// Validates an infix (prefix) operator-style name against the
    /// infix-operator charset; infix operators share the value-context
    /// namespace (see the module-level note above).
    fn validate_infix_operator_name(&self, name: &str, charset: &HashSet<char>) -> Result<(), ParserError> {
        if name.is_empty() || !name.chars().all(|c| charset.contains(&c)) {
            return Err(ParserError::new(ErrorKind::InvalidName, name, None));
        }
        self.check_value_conflict(name)
    }

    // --- variables ---------------------------------------------------------

    pub fn define_var(&mut self, name: &str, cell: VarCell) -> Result<(), ParserError> {
        self.validate_identifier_name(name)?;
        self.var_index.insert(name.to_string(), self.variables.len());
        self.variables.push((name.to_string(), cell));
        self.rebuild_name_trie();
        Ok(())
    }

    pub fn remove_var(&mut self, name: &str) -> Result<(), ParserError> {
        let idx = match self.var_index.remove(name) {
            Some(i) => i,
            None => return Err(ParserError::new(ErrorKind::Generic, name, None)),
        };
        self.variables.remove(idx);
        self.reindex_variables_from(idx);
        self.rebuild_name_trie();
        Ok(())
    }

    fn reindex_variables_from(&mut self, from: usize) {
        self.var_index.clear();
        for (i, (name, _)) in self.variables.iter().enumerate() {
            let _ = from;
            self.var_index.insert(name.clone(), i);
        }
    }

    pub fn clear_var(&mut self) {
        self.variables.clear();
        self.var_index.clear();
        self.rebuild_name_trie();
    }

    pub fn variable(&self, idx: usize) -> &VarCell {
        &self.variables[idx].1
    }

    pub fn variable_name(&self, idx: usize) -> &str {
        &self.variables[idx].0
    }

    pub fn var_count(&self) -> usize {
        self.variables.len()
    }

    // --- constants -----------------------------------------------------

    pub fn define_const(&mut self, name: &str, value: f64) -> Result<(), ParserError> {
        self.validate_identifier_name(name)?;
        self.const_index.insert(name.to_string(), self.constants.len());
        self.constants.push((name.to_string(), value));
        self.rebuild_name_trie();
        Ok(())
    }

    pub fn clear_const(&mut self) {
        self.constants.clear();
        self.const_index.clear();
        self.rebuild_name_trie();
    }

    pub fn constant_value(&self, idx: usize) -> f64 {
        self.constants[idx].1
    }

    // --- string constants ------------------------------------------------

    pub fn define_str_const(&mut self, name: &str, value: impl Into<String>) -> Result<(), ParserError> {
        self.validate_identifier_name(name)?;
        self.str_const_index
            .insert(name.to_string(), self.string_constants.len());
        self.string_constants.push((name.to_string(), value.into()));
        self.rebuild_name_trie();
        Ok(())
    }

    pub fn clear_str_const(&mut self) {
        self.string_constants.clear();
        self.str_const_index.clear();
        self.rebuild_name_trie();
    }

    pub fn str_constant_value(&self, idx: usize) -> &str {
        &self.string_constants[idx].1
    }

    // --- functions -----------------------------------------------------

    pub fn define_fun(&mut self, name: &str, entry: FunctionEntry) -> Result<(), ParserError> {
        self.validate_identifier_name(name)?;
        self.fun_index.insert(name.to_string(), self.functions.len());
        self.functions.push((name.to_string(), entry));
        self.rebuild_name_trie();
        Ok(())
    }

    pub fn clear_fun(&mut self) {
        self.functions.clear();
        self.fun_index.clear();
        self.rebuild_name_trie();
    }

    pub fn function(&self, idx: usize) -> &FunctionEntry {
        &self.functions[idx].1
    }

    // --- binary operators ------------------------------------------------

    fn active_bin_op_index(&self, name: &str) -> Option<usize> {
        let idx = *self.bin_op_index.get(name)?;
        let (_, entry) = &self.bin_ops[idx];
        if entry.builtin && !self.builtin_oprt_enabled {
            None
        } else {
            Some(idx)
        }
    }

    pub fn define_oprt(
        &mut self,
        name: &str,
        callable: BinOpFn,
        precedence: i32,
        assoc: Assoc,
    ) -> Result<(), ParserError> {
        self.define_oprt_internal(name, callable, precedence, assoc, false)
    }

    pub(crate) fn define_builtin_oprt(
        &mut self,
        name: &str,
        callable: BinOpFn,
        precedence: i32,
        assoc: Assoc,
    ) -> Result<(), ParserError> {
        self.define_oprt_internal(name, callable, precedence, assoc, true)
    }

    fn define_oprt_internal(
        &mut self,
        name: &str,
        callable: BinOpFn,
        precedence: i32,
        assoc: Assoc,
        builtin: bool,
    ) -> Result<(), ParserError> {
        self.validate_operator_name(name, &self.oprt_chars.clone())?;
        let entry = BinOpEntry {
            precedence,
            assoc,
            callable,
            builtin,
        };
        self.bin_op_index.insert(name.to_string(), self.bin_ops.len());
        self.bin_ops.push((name.to_string(), entry));
        self.rebuild_bin_op_trie();
        Ok(())
    }

    pub fn clear_oprt(&mut self) {
        self.bin_ops.retain(|(_, e)| e.builtin);
        self.bin_op_index.clear();
        for (i, (name, _)) in self.bin_ops.iter().enumerate() {
            self.bin_op_index.insert(name.clone(), i);
        }
        self.rebuild_bin_op_trie();
    }

    pub fn set_builtin_oprt_enabled(&mut self, enabled: bool) {
        self.builtin_oprt_enabled = enabled;
        self.rebuild_bin_op_trie();
    }

    pub fn bin_op(&self, idx: usize) -> &BinOpEntry {
        &self.bin_ops[idx].1
    }

    // --- infix (prefix) operators ------------------------------------------

    pub fn define_infix_oprt(
        &mut self,
        name: &str,
        callable: UnaryOpFn,
        precedence: i32,
    ) -> Result<(), ParserError> {
        self.validate_infix_operator_name(name, &self.infix_oprt_chars.clone())?;
        self.infix_op_index
            .insert(name.to_string(), self.infix_ops.len());
        self.infix_ops
            .push((name.to_string(), UnaryOpEntry { precedence, callable }));
        self.rebuild_infix_op_trie();
        Ok(())
    }

    pub fn clear_infix_oprt(&mut self) {
        self.infix_ops.clear();
        self.infix_op_index.clear();
        self.rebuild_infix_op_trie();
    }

    pub fn infix_op(&self, idx: usize) -> &UnaryOpEntry {
        &self.infix_ops[idx].1
    }

    // --- postfix operators -------------------------------------------------

    pub fn define_postfix_oprt(&mut self, name: &str, callable: UnaryOpFn) -> Result<(), ParserError> {
        // Postfix operator names may be alphabetic (e.g. "meg"), bounded
        // by the name-character set, per SPEC_FULL.md §4.1.3a — or they
        // may use operator-charset symbols. Accept either.
        let ok_as_name = name
            .chars()
            .all(|c| self.name_chars.contains(&c));
        let ok_as_oprt = name.chars().all(|c| self.oprt_chars.contains(&c));
        if name.is_empty() || !(ok_as_name || ok_as_oprt) {
            return Err(ParserError::new(ErrorKind::InvalidName, name, None));
        }
        self.check_operator_conflict(name)?;
        self.postfix_op_index
            .insert(name.to_string(), self.postfix_ops.len());
        self.postfix_ops
            .push((name.to_string(), UnaryOpEntry { precedence: 0, callable }));
        self.rebuild_postfix_op_trie();
        Ok(())
    }

    pub fn clear_postfix_oprt(&mut self) {
        self.postfix_ops.clear();
        self.postfix_op_index.clear();
        self.rebuild_postfix_op_trie();
    }

    pub fn postfix_op(&self, idx: usize) -> &UnaryOpEntry {
        &self.postfix_ops[idx].1
    }

    // --- character sets ------------------------------------------------

    pub fn define_name_chars(&mut self, chars: &str) {
        self.name_chars = chars.chars().collect();
    }

    pub fn define_oprt_chars(&mut self, chars: &str) {
        self.oprt_chars = chars.chars().collect();
        self.rebuild_bin_op_trie();
    }

    pub fn define_infix_oprt_chars(&mut self, chars: &str) {
        self.infix_oprt_chars = chars.chars().collect();
        self.rebuild_infix_op_trie();
    }

    // --- trie lookups used by the tokeniser ------------------------------

    pub fn match_name(&self, haystack: &str) -> Option<(usize, NameRef)> {
        self.name_trie.longest_match(haystack)
    }

    pub fn match_bin_op(&self, haystack: &str) -> Option<(usize, usize)> {
        self.bin_op_trie.longest_match(haystack)
    }

    pub fn match_infix_op(&self, haystack: &str) -> Option<(usize, usize)> {
        self.infix_op_trie.longest_match(haystack)
    }

    pub fn match_postfix_op(&self, haystack: &str) -> Option<(usize, usize)> {
        self.postfix_op_trie.longest_match(haystack)
    }

    pub fn bin_op_name(&self, idx: usize) -> &str {
        &self.bin_ops[idx].0
    }

    // --- trie maintenance ------------------------------------------------

    fn rebuild_name_trie(&mut self) {
        let mut trie = Trie::new();
        for (i, (name, _)) in self.variables.iter().enumerate() {
            trie.insert(name, NameRef::Var(i));
        }
        for (i, (name, _)) in self.constants.iter().enumerate() {
            trie.insert(name, NameRef::Const(i));
        }
        for (i, (name, _)) in self.string_constants.iter().enumerate() {
            trie.insert(name, NameRef::StrConst(i));
        }
        for (i, (name, _)) in self.functions.iter().enumerate() {
            trie.insert(name, NameRef::Fun(i));
        }
        self.name_trie = trie;
    }

    fn rebuild_bin_op_trie(&mut self) {
        let mut trie = Trie::new();
        for (i, (name, entry)) in self.bin_ops.iter().enumerate() {
            if entry.builtin && !self.builtin_oprt_enabled {
                continue;
            }
            if name.chars().all(|c| self.oprt_chars.contains(&c)) {
                trie.insert(name, i);
            }
        }
        self.bin_op_trie = trie;
    }

    fn rebuild_infix_op_trie(&mut self) {
        let mut trie = Trie::new();
        for (i, (name, _)) in self.infix_ops.iter().enumerate() {
            if name.chars().all(|c| self.infix_oprt_chars.contains(&c)) {
                trie.insert(name, i);
            }
        }
        self.infix_op_trie = trie;
    }

    fn rebuild_postfix_op_trie(&mut self) {
        let mut trie = Trie::new();
        for (i, (name, _)) in self.postfix_ops.iter().enumerate() {
            trie.insert(name, i);
        }
        self.postfix_op_trie = trie;
    }
}
