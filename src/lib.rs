//! wisp - an embeddable s-expression scripting core.
//!
//! This crate provides a tiny, sandboxable scripting facility meant to be
//! linked into a host program: a position-tracking source registry, a
//! recursive-descent parser producing a span-carrying syntax tree, a chain
//! of lexical scopes, and a tree-walking evaluator with a small prelude of
//! special forms and primitives. Hosts extend the language by injecting
//! native functions into a scope before evaluation; script code never gains
//! access to anything the host did not bind.
//!
//! ```
//! use wisp::{Scope, SourceSet, Value};
//!
//! let sources = SourceSet::new();
//! let root = sources.parse_str("example", "(var x (+ 1 2)) x")?;
//! let scope = Scope::root(&sources);
//! assert_eq!(scope.eval(&root)?, Value::Int(3));
//! # Ok::<(), wisp::Error>(())
//! ```
//!
//! ## Language semantics
//!
//! The language is deliberately small: integers, floats, strings, booleans,
//! `nil`, lists, and functions. Only the boolean `false` is falsy - `0`,
//! `""`, and the empty list are all truthy. Mixed int/float arithmetic
//! promotes to float; pure integer arithmetic wraps at 64 bits. Closures
//! capture their defining scope and stay lexically scoped across calls.
//!
//! ## Errors
//!
//! Every failure - lexical, syntactic, or evaluation-time - carries the
//! position of the innermost expression that caused it, resolved against
//! the [`SourceSet`] the code was parsed into, and formats as
//! `<source-name>:<line>:<column>: <message>`.
//!
//! ## Modules
//!
//! - `pos`: source registry and position resolution
//! - `ast`: parsed syntax tree with exact source spans
//! - `value`: dynamically-typed runtime values and the native-function contract
//! - `scope`: lexical scope chain and the evaluator
//!
//! Evaluation is single-threaded and strictly recursive on the host call
//! stack; deeply recursive script code exhausts the host stack. The core
//! imposes no depth limit of its own - hosts that need a bound should run
//! evaluation on a dedicated worker they are prepared to abandon.

use std::fmt;

/// The closed set of failures the core can report.
///
/// Parse-time kinds are always positioned at the offending token or
/// construct start; evaluation-time kinds are positioned at the innermost
/// symbol or call head that first failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    /// A bare `)` at the top level of a source unit.
    #[error("unexpected )")]
    UnexpectedCloseParen,
    /// Input ended inside an open list.
    #[error("missing )")]
    UnclosedList,
    #[error("invalid int literal: {0}")]
    InvalidIntLiteral(String),
    #[error("invalid float literal: {0}")]
    InvalidFloatLiteral(String),
    /// Empty or truncated single-quoted character literal.
    #[error("invalid single quote")]
    InvalidCharLiteral,
    #[error("unclosed single quote")]
    UnclosedCharLiteral,
    #[error("unclosed string literal: {0}")]
    UnclosedStringLiteral(String),
    /// A string literal with an escape sequence the decoder rejects.
    #[error("invalid string literal: {0}")]
    InvalidStringLiteral(String),

    #[error("undefined symbol: {0}")]
    UndefinedSymbol(String),
    #[error("symbol already defined in current scope: {0}")]
    SymbolRedefined(String),
    #[error("cannot set undefined symbol: {0}")]
    SetUndefinedSymbol(String),

    /// The head of a list evaluated to something that is not callable.
    #[error("cannot use {0} as a function")]
    NotAFunction(String),
    #[error("division by zero")]
    DivisionByZero,
    /// Wrong number of arguments to a builtin, form, or closure.
    #[error("{0}")]
    Arity(String),
    /// Wrong argument type to a builtin or form.
    #[error("{0}")]
    Type(String),
    /// Failure raised from script code via `error`, or from a host native.
    #[error("{0}")]
    User(String),
}

/// An error paired with the source position it was first observed at.
///
/// The position is stamped exactly once, by the first scope frame that sees
/// the failure; enclosing frames propagate it unchanged. Errors built by
/// host natives start unpositioned and pick up the call-head position when
/// they cross back into the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub kind: ErrorKind,
    pub at: Option<PosInfo>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Error { kind, at: None }
    }

    /// Wrong-arity failure with a preformatted message.
    pub fn arity(message: impl Into<String>) -> Self {
        ErrorKind::Arity(message.into()).into()
    }

    /// Wrong-argument-type failure with a preformatted message.
    pub fn type_error(message: impl Into<String>) -> Self {
        ErrorKind::Type(message.into()).into()
    }

    /// Free-form failure, as raised by `(error "...")` or a host native.
    pub fn user(message: impl Into<String>) -> Self {
        ErrorKind::User(message.into()).into()
    }

    /// Whether a source position has been stamped on this error yet.
    pub fn is_positioned(&self) -> bool {
        self.at.is_some()
    }

    pub(crate) fn positioned(kind: ErrorKind, at: PosInfo) -> Self {
        Error { kind, at: Some(at) }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.at {
            Some(info) => write!(f, "{info} {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

pub mod ast;
pub mod pos;
pub mod scope;
pub mod value;

mod globals;
mod parser;

pub use ast::Node;
pub use pos::{Pos, PosInfo, SourceId, SourceSet};
pub use scope::Scope;
pub use value::{Closure, NativeFn, SpecialForm, Value};
