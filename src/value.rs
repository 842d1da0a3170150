//! Dynamically-typed runtime values.
//!
//! [`Value`] is the closed union produced by evaluation. The two callable
//! shapes are distinct variants: a [`NativeFn`] receives already-evaluated
//! arguments (the shape hosts can construct), while a [`SpecialForm`]
//! receives the caller's scope plus raw, unevaluated argument nodes and is
//! only ever built by the prelude - script code cannot obtain a new one and
//! hosts are not given a constructor.
//!
//! Values compare by value and type: an integer never equals a float, even
//! when numerically identical, and functions compare by identity.

use std::fmt;
use std::rc::Rc;

use crate::ast::Node;
use crate::scope::Scope;
use crate::Error;

/// A host- or prelude-supplied applicative function.
///
/// The contract: given the ordered, already-evaluated argument values,
/// return a value or fail with a descriptive message. Errors raised here
/// are positioned at the call head by the evaluator.
#[derive(Clone)]
pub struct NativeFn {
    name: Rc<str>,
    func: Rc<dyn Fn(Vec<Value>) -> Result<Value, Error>>,
}

impl NativeFn {
    /// Diagnostic name the function was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn call(&self, args: Vec<Value>) -> Result<Value, Error> {
        (self.func)(args)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFn({})", self.name)
    }
}

/// A prelude special form: receives the caller's scope and the raw
/// argument nodes, controlling evaluation order itself.
#[derive(Clone, Copy)]
pub struct SpecialForm {
    pub(crate) name: &'static str,
    pub(crate) func: fn(&Scope, &[Node]) -> Result<Value, Error>,
}

impl SpecialForm {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for SpecialForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpecialForm({})", self.name)
    }
}

/// A user-defined function: parameter names, body nodes, and the captured
/// defining scope. The optional name exists purely for diagnostics; the
/// binding that makes recursion work lives in the defining scope itself.
#[derive(Debug)]
pub struct Closure {
    pub(crate) name: Option<String>,
    pub(crate) params: Vec<String>,
    pub(crate) body: Vec<Node>,
    pub(crate) scope: Scope,
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Native(NativeFn),
    Form(SpecialForm),
    Closure(Rc<Closure>),
}

impl Value {
    /// Wrap a host function in the applicative calling convention under a
    /// diagnostic name.
    pub fn native<F>(name: impl Into<String>, func: F) -> Value
    where
        F: Fn(Vec<Value>) -> Result<Value, Error> + 'static,
    {
        Value::Native(NativeFn {
            name: name.into().into(),
            func: Rc::new(func),
        })
    }

    pub(crate) fn form(
        name: &'static str,
        func: fn(&Scope, &[Node]) -> Result<Value, Error>,
    ) -> Value {
        Value::Form(SpecialForm { name, func })
    }

    /// Only the boolean `false` is falsy; `0`, `""`, the empty list and
    /// `nil` are all truthy.
    pub(crate) fn is_falsy(&self) -> bool {
        matches!(self, Value::Bool(false))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_integer {
    ($($int_type:ty),*) => {$(
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Int(n as i64)
            }
        }
    )*};
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            // Functions compare by identity, not structure. Special forms
            // only exist in the prelude, where names are unique.
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(&a.func, &b.func),
            (Value::Form(a), Value::Form(b)) => a.name == b.name,
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::String(s) => {
                write!(f, "\"")?;
                for ch in s.chars() {
                    match ch {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        '\r' => write!(f, "\\r")?,
                        c => write!(f, "{c}")?,
                    }
                }
                write!(f, "\"")
            }
            Value::List(elements) => {
                write!(f, "(")?;
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
            Value::Native(native) => write!(f, "#<builtin {}>", native.name),
            Value::Form(form) => write!(f, "#<special-form {}>", form.name),
            Value::Closure(closure) => match &closure.name {
                Some(name) => write!(f, "#<func {name}>"),
                None => write!(f, "#<func>"),
            },
        }
    }
}
