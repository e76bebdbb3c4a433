//! Error types for the expression engine.
//!
//! This module defines a single structured error type used across the
//! tokeniser, compiler, and evaluator: [`ParserError`], tagged with an
//! [`ErrorKind`] plus the offending token text and source position when
//! known.

use std::fmt;

/// The taxonomy of failures the engine can report.
///
/// Every fallible operation in this crate reports one of these kinds;
/// see `SPEC_FULL.md` §7 for the propagation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No tokenising rule matched at the current position.
    UnassignableToken,
    /// An operator appeared where the grammar does not allow one (e.g.
    /// `=` with a non-variable left-hand side).
    UnexpectedOperator,
    /// The expression ended before a value or closing token was found.
    UnexpectedEof,
    /// A parenthesis appeared where none was expected, or a bare `()`
    /// with nothing between the parens.
    UnexpectedParens,
    /// A value token appeared where an operator was expected.
    UnexpectedVal,
    /// A function name was not followed by `(`.
    UnexpectedFun,
    /// A comma appeared inside a plain grouping paren, or outside any
    /// paren/function-call context where it is not meaningful.
    UnexpectedComma,
    /// A `?` appeared where the grammar does not allow a ternary to
    /// start.
    UnexpectedConditional,
    /// A `:` appeared with no matching open `?` in the current scope.
    MisplacedColon,
    /// A `?` was never closed with a matching `:`.
    MissingElseClause,
    /// An open paren was never closed.
    MissingParens,
    /// A fixed-arity function or operator call received too few
    /// arguments.
    TooFewParams,
    /// A fixed-arity function or operator call received too many
    /// arguments.
    TooManyParams,
    /// A name passed to a `Define*` call violates the configured
    /// name-character set.
    InvalidName,
    /// A name passed to a `Define*` call is already bound in some
    /// table.
    NameConflict,
    /// A string-accepting function's first argument was not a string
    /// literal or string constant.
    StringExpected,
    /// A non-string-accepting function or operator received a string
    /// argument.
    ValExpected,
    /// A string value was used as the operand of an arithmetic
    /// operator, or a top-level expression mixed string and numeric
    /// sub-results.
    OprtTypeConflict,
    /// A `"..."` string literal was never closed.
    UnterminatedString,
    /// A top-level expression's final value was a string.
    StrResult,
    /// Division or modulo by zero.
    DivByZero,
    /// A math intrinsic was called outside its domain (e.g. `sqrt(-1)`).
    DomainError,
    /// Any other failure, carrying a free-form message in the token
    /// field.
    Generic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UnassignableToken => "unassignable token",
            Self::UnexpectedOperator => "unexpected operator",
            Self::UnexpectedEof => "unexpected end of expression",
            Self::UnexpectedParens => "unexpected parentheses",
            Self::UnexpectedVal => "unexpected value",
            Self::UnexpectedFun => "unexpected function",
            Self::UnexpectedComma => "unexpected comma",
            Self::UnexpectedConditional => "unexpected conditional",
            Self::MisplacedColon => "misplaced colon",
            Self::MissingElseClause => "missing else clause",
            Self::MissingParens => "missing closing parenthesis",
            Self::TooFewParams => "too few parameters",
            Self::TooManyParams => "too many parameters",
            Self::InvalidName => "invalid name",
            Self::NameConflict => "name conflict",
            Self::StringExpected => "string expected",
            Self::ValExpected => "value expected",
            Self::OprtTypeConflict => "operator type conflict",
            Self::UnterminatedString => "unterminated string",
            Self::StrResult => "string result",
            Self::DivByZero => "division by zero",
            Self::DomainError => "domain error",
            Self::Generic => "error",
        };
        write!(f, "{s}")
    }
}

/// An error produced by the tokeniser, compiler, or evaluator.
///
/// Carries the offending token text (empty string if not applicable)
/// and a 0-indexed source position (`None` for errors raised outside
/// of a specific expression, such as `Define*` validation).
#[derive(Debug, Clone, PartialEq)]
pub struct ParserError {
    pub kind: ErrorKind,
    pub token: String,
    pub position: Option<usize>,
}

impl ParserError {
    pub fn new(kind: ErrorKind, token: impl Into<String>, position: Option<usize>) -> Self {
        Self {
            kind,
            token: token.into(),
            position,
        }
    }

    pub fn at(kind: ErrorKind, position: usize) -> Self {
        Self::new(kind, "", Some(position))
    }

    pub fn with_token(kind: ErrorKind, token: impl Into<String>, position: usize) -> Self {
        Self::new(kind, token, Some(position))
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Generic, message, None)
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.token.is_empty() {
            write!(f, " '{}'", self.token)?;
        }
        if let Some(pos) = self.position {
            write!(f, " at position {pos}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParserError {}
