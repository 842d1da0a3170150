//! Lexical scope chain and the evaluator.
//!
//! A [`Scope`] is a cheap handle to one frame in a singly-linked chain of
//! environments. Children reference their parent, never the other way
//! around, so the chain is cycle-free; a closure keeps its defining scope
//! alive for exactly as long as the closure itself is reachable. The handle
//! is single-threaded by design (`Rc` + `RefCell`): a scope must not be
//! shared across concurrent evaluations.
//!
//! Evaluation is strictly recursive on the host call stack. Unbounded
//! recursion in evaluated code exhausts the host stack; the core imposes no
//! depth limit of its own.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::Node;
use crate::globals;
use crate::pos::SourceSet;
use crate::value::{Closure, Value};
use crate::{Error, ErrorKind};

/// One frame in the scope chain, holding name->value bindings.
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

struct ScopeInner {
    parent: Option<Scope>,
    vars: RefCell<FxHashMap<String, Value>>,
    sources: SourceSet,
}

impl Scope {
    /// A fresh top-level scope seeded with the default globals, for code
    /// parsed into `sources`. Each call builds its own prelude; nothing is
    /// shared between root scopes.
    pub fn root(sources: &SourceSet) -> Scope {
        let mut vars = FxHashMap::default();
        for (name, value) in globals::default_globals() {
            vars.insert(name.to_owned(), value);
        }
        tracing::trace!(globals = vars.len(), "created root scope");
        Scope {
            inner: Rc::new(ScopeInner {
                parent: None,
                vars: RefCell::new(vars),
                sources: sources.clone(),
            }),
        }
    }

    /// A new empty scope with `self` as its parent; the entry point of
    /// every lexical block (`do`, `for`, `range`, and call bodies).
    pub fn branch(&self) -> Scope {
        Scope {
            inner: Rc::new(ScopeInner {
                parent: Some(self.clone()),
                vars: RefCell::new(FxHashMap::default()),
                sources: self.inner.sources.clone(),
            }),
        }
    }

    /// Bind `symbol` in this scope only. Redefining a symbol already bound
    /// here is an error; shadowing an ancestor's binding is not.
    pub fn create(&self, symbol: &str, value: Value) -> Result<(), Error> {
        let mut vars = self.inner.vars.borrow_mut();
        if vars.contains_key(symbol) {
            return Err(ErrorKind::SymbolRedefined(symbol.to_owned()).into());
        }
        vars.insert(symbol.to_owned(), value);
        Ok(())
    }

    /// Mutate `symbol` in the nearest enclosing scope that binds it.
    pub fn set(&self, symbol: &str, value: Value) -> Result<(), Error> {
        let mut current = self;
        loop {
            if current.inner.vars.borrow().contains_key(symbol) {
                current
                    .inner
                    .vars
                    .borrow_mut()
                    .insert(symbol.to_owned(), value);
                return Ok(());
            }
            match &current.inner.parent {
                Some(parent) => current = parent,
                None => return Err(ErrorKind::SetUndefinedSymbol(symbol.to_owned()).into()),
            }
        }
    }

    /// Value of `symbol` in the nearest enclosing scope that binds it.
    pub fn get(&self, symbol: &str) -> Result<Value, Error> {
        let mut current = self;
        loop {
            if let Some(value) = current.inner.vars.borrow().get(symbol) {
                return Ok(value.clone());
            }
            match &current.inner.parent {
                Some(parent) => current = parent,
                None => return Err(ErrorKind::UndefinedSymbol(symbol.to_owned()).into()),
            }
        }
    }

    /// Insert directly into this frame, replacing any existing binding.
    /// Used for call-frame parameter binding, where a duplicated parameter
    /// name shadows the earlier one instead of erroring.
    pub(crate) fn insert(&self, symbol: String, value: Value) {
        self.inner.vars.borrow_mut().insert(symbol, value);
    }

    /// Stamp `err` with the position of `node`, unless an inner frame
    /// already did. Errors carry the position of the innermost expression
    /// whose evaluation first failed; outer frames must not overwrite it.
    fn error_at(&self, node: &Node, err: Error) -> Error {
        if err.is_positioned() {
            return err;
        }
        let at = self.inner.sources.pos_info(node.pos());
        tracing::debug!(error = %err.kind, at = %at, "evaluation failed");
        Error::positioned(err.kind, at)
    }

    /// Evaluate `node` in this scope.
    pub fn eval(&self, node: &Node) -> Result<Value, Error> {
        match node {
            Node::Symbol { name, .. } => self.get(name).map_err(|err| self.error_at(node, err)),
            Node::Int { value, .. } => Ok(Value::Int(*value)),
            Node::Float { value, .. } => Ok(Value::Float(*value)),
            Node::String { value, .. } => Ok(Value::String(value.clone())),
            Node::List { nodes, .. } => {
                let Some((head, args)) = nodes.split_first() else {
                    return Ok(Value::List(Vec::new()));
                };
                let callee = self.eval(head).map_err(|err| self.error_at(head, err))?;
                self.call(&callee, args).map_err(|err| self.error_at(head, err))
            }
            Node::Root { nodes, .. } => {
                let mut value = Value::Nil;
                for node in nodes {
                    value = self.eval(node).map_err(|err| self.error_at(node, err))?;
                }
                Ok(value)
            }
        }
    }

    /// Invoke a callable. Applicative callees (natives and closures) get
    /// their arguments evaluated left to right in this scope, stopping at
    /// the first failure; special forms get the raw nodes and this scope.
    fn call(&self, callee: &Value, args: &[Node]) -> Result<Value, Error> {
        match callee {
            Value::Form(form) => (form.func)(self, args),
            Value::Native(native) => {
                let values = self.eval_args(args)?;
                native.call(values)
            }
            Value::Closure(closure) => {
                let values = self.eval_args(args)?;
                call_closure(closure, values)
            }
            other => Err(ErrorKind::NotAFunction(other.to_string()).into()),
        }
    }

    fn eval_args(&self, args: &[Node]) -> Result<Vec<Value>, Error> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("bindings", &self.inner.vars.borrow().len())
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}

/// Call a closure with already-evaluated arguments. Arity must match
/// exactly; the body runs in a fresh branch of the *defining* scope, so
/// calls are lexically scoped and never observe one another's frames.
fn call_closure(closure: &Rc<Closure>, args: Vec<Value>) -> Result<Value, Error> {
    if args.len() != closure.params.len() {
        let who = match &closure.name {
            Some(name) => format!("function {name:?}"),
            None => "anonymous function".to_owned(),
        };
        let message = match closure.params.len() {
            0 => format!("{who} takes no arguments"),
            1 => format!("{who} takes one argument"),
            n => format!("{who} takes {n} arguments"),
        };
        return Err(Error::arity(message));
    }
    let scope = closure.scope.branch();
    for (param, arg) in closure.params.iter().zip(args) {
        scope.insert(param.clone(), arg);
    }
    let mut value = Value::Nil;
    for node in &closure.body {
        value = scope.eval(node)?;
    }
    Ok(value)
}
