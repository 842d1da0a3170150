//! Default globals: the fixed prelude installed into every root scope.
//!
//! Two kinds of entries live here, mirroring the two calling conventions:
//!
//! - **Primitives** (`error`, `==`, `!=`, `+`, `-`, `*`, `/`): applicative
//!   functions that receive already-evaluated arguments.
//! - **Special forms** (`if`, `and`, `or`, `var`, `set`, `do`, `func`,
//!   `for`, `range`): receive the caller's scope and the raw argument
//!   nodes, controlling evaluation order, short-circuiting, and scope
//!   mutation themselves.
//!
//! The table is pure, fixed data: [`default_globals`] builds a fresh set of
//! bindings per root scope and nothing here holds mutable state across
//! evaluations.
//!
//! Arithmetic accepts any mix of integers and floats; one float operand
//! promotes the whole computation to float. Pure integer arithmetic wraps
//! at 64 bits and integer division truncates toward zero; float arithmetic
//! follows IEEE-754. Only the boolean `false` is falsy anywhere a condition
//! is tested.

use std::rc::Rc;

use crate::ast::Node;
use crate::scope::Scope;
use crate::value::{Closure, Value};
use crate::Error;

/// The bindings every new top-level scope starts with.
pub(crate) fn default_globals() -> Vec<(&'static str, Value)> {
    vec![
        ("true", Value::Bool(true)),
        ("false", Value::Bool(false)),
        ("nil", Value::Nil),
        ("error", Value::native("error", error_fn)),
        ("==", Value::native("==", eq_fn)),
        ("!=", Value::native("!=", ne_fn)),
        ("+", Value::native("+", sum_fn)),
        ("-", Value::native("-", sub_fn)),
        ("*", Value::native("*", mul_fn)),
        ("/", Value::native("/", div_fn)),
        ("or", Value::form("or", or_form)),
        ("and", Value::form("and", and_form)),
        ("if", Value::form("if", if_form)),
        ("var", Value::form("var", var_form)),
        ("set", Value::form("set", set_form)),
        ("do", Value::form("do", do_form)),
        ("func", Value::form("func", func_form)),
        ("for", Value::form("for", for_form)),
        ("range", Value::form("range", range_form)),
    ]
}

//
// Primitives
//

fn error_fn(args: Vec<Value>) -> Result<Value, Error> {
    if let [Value::String(message)] = args.as_slice() {
        return Err(Error::user(message.clone()));
    }
    Err(Error::type_error(
        "error function takes a single string argument",
    ))
}

fn eq_fn(args: Vec<Value>) -> Result<Value, Error> {
    match args.as_slice() {
        [a, b] => Ok(Value::Bool(a == b)),
        _ => Err(Error::arity("== takes two values")),
    }
}

fn ne_fn(args: Vec<Value>) -> Result<Value, Error> {
    match args.as_slice() {
        [a, b] => Ok(Value::Bool(a != b)),
        _ => Err(Error::arity("!= takes two values")),
    }
}

fn sum_fn(args: Vec<Value>) -> Result<Value, Error> {
    let mut int_acc: i64 = 0;
    let mut float_acc: f64 = 0.0;
    let mut promoted = false;
    for arg in &args {
        match arg {
            Value::Int(n) => {
                int_acc = int_acc.wrapping_add(*n);
                float_acc += *n as f64;
            }
            Value::Float(n) => {
                float_acc += n;
                promoted = true;
            }
            other => return Err(Error::type_error(format!("cannot sum {other}"))),
        }
    }
    Ok(if promoted {
        Value::Float(float_acc)
    } else {
        Value::Int(int_acc)
    })
}

fn sub_fn(args: Vec<Value>) -> Result<Value, Error> {
    if args.is_empty() {
        return Err(Error::arity(r#"function "-" takes one or more arguments"#));
    }
    let mut int_acc: i64 = 0;
    let mut float_acc: f64 = 0.0;
    let mut promoted = false;
    for (i, arg) in args.iter().enumerate() {
        // With a single argument the subtraction negates; otherwise the
        // first argument seeds the accumulators.
        let seeds = i == 0 && args.len() > 1;
        match arg {
            Value::Int(n) => {
                if seeds {
                    int_acc = *n;
                    float_acc = *n as f64;
                } else {
                    int_acc = int_acc.wrapping_sub(*n);
                    float_acc -= *n as f64;
                }
            }
            Value::Float(n) => {
                if seeds {
                    float_acc = *n;
                } else {
                    float_acc -= n;
                }
                promoted = true;
            }
            other => return Err(Error::type_error(format!("cannot subtract {other}"))),
        }
    }
    Ok(if promoted {
        Value::Float(float_acc)
    } else {
        Value::Int(int_acc)
    })
}

fn mul_fn(args: Vec<Value>) -> Result<Value, Error> {
    let mut int_acc: i64 = 1;
    let mut float_acc: f64 = 1.0;
    let mut promoted = false;
    for arg in &args {
        match arg {
            Value::Int(n) => {
                int_acc = int_acc.wrapping_mul(*n);
                float_acc *= *n as f64;
            }
            Value::Float(n) => {
                float_acc *= n;
                promoted = true;
            }
            other => return Err(Error::type_error(format!("cannot multiply {other}"))),
        }
    }
    Ok(if promoted {
        Value::Float(float_acc)
    } else {
        Value::Int(int_acc)
    })
}

fn div_fn(args: Vec<Value>) -> Result<Value, Error> {
    if args.len() < 2 {
        return Err(Error::arity(r#"function "/" takes two or more arguments"#));
    }
    let mut int_acc: i64 = 0;
    let mut float_acc: f64 = 0.0;
    let mut promoted = false;
    for (i, arg) in args.iter().enumerate() {
        match arg {
            Value::Int(n) => {
                if i == 0 {
                    int_acc = *n;
                    float_acc = *n as f64;
                } else if *n == 0 {
                    // An integer zero divisor is an error rather than a
                    // host fault; a float zero divisor follows IEEE-754.
                    return Err(crate::ErrorKind::DivisionByZero.into());
                } else {
                    int_acc = int_acc.wrapping_div(*n);
                    float_acc /= *n as f64;
                }
            }
            Value::Float(n) => {
                if i == 0 {
                    float_acc = *n;
                } else {
                    float_acc /= n;
                }
                promoted = true;
            }
            other => return Err(Error::type_error(format!("cannot divide with {other}"))),
        }
    }
    Ok(if promoted {
        Value::Float(float_acc)
    } else {
        Value::Int(int_acc)
    })
}

//
// Special forms
//

/// Empty -> `true`; otherwise the first value equal to `false` wins, else
/// the last value. Arguments after a short-circuit are never evaluated.
fn and_form(scope: &Scope, args: &[Node]) -> Result<Value, Error> {
    let mut value = Value::Bool(true);
    for arg in args {
        value = scope.eval(arg)?;
        if value.is_falsy() {
            return Ok(Value::Bool(false));
        }
    }
    Ok(value)
}

/// Empty -> `false`; otherwise the first value not equal to `false` wins,
/// else the last value.
fn or_form(scope: &Scope, args: &[Node]) -> Result<Value, Error> {
    let mut value = Value::Bool(false);
    for arg in args {
        value = scope.eval(arg)?;
        if !value.is_falsy() {
            return Ok(value);
        }
    }
    Ok(value)
}

fn if_form(scope: &Scope, args: &[Node]) -> Result<Value, Error> {
    if args.len() < 2 || args.len() > 3 {
        return Err(Error::arity(
            r#"function "if" takes two or three arguments"#,
        ));
    }
    let condition = scope.eval(&args[0])?;
    if condition.is_falsy() {
        match args.get(2) {
            Some(alternative) => scope.eval(alternative),
            None => Ok(Value::Bool(false)),
        }
    } else {
        scope.eval(&args[1])
    }
}

fn var_form(scope: &Scope, args: &[Node]) -> Result<Value, Error> {
    if args.is_empty() || args.len() > 2 {
        return Err(Error::arity("var takes one or two arguments"));
    }
    let Node::Symbol { name, .. } = &args[0] else {
        return Err(Error::type_error("var takes a symbol as first argument"));
    };
    let value = match args.get(1) {
        Some(node) => scope.eval(node)?,
        None => Value::Nil,
    };
    scope.create(name, value)?;
    Ok(Value::Nil)
}

fn set_form(scope: &Scope, args: &[Node]) -> Result<Value, Error> {
    if args.len() != 2 {
        return Err(Error::arity(r#"function "set" takes two arguments"#));
    }
    let Node::Symbol { name, .. } = &args[0] else {
        return Err(Error::type_error(
            r#"function "set" takes a symbol as first argument"#,
        ));
    };
    let value = scope.eval(&args[1])?;
    scope.set(name, value)?;
    Ok(Value::Nil)
}

fn do_form(scope: &Scope, args: &[Node]) -> Result<Value, Error> {
    let scope = scope.branch();
    let mut value = Value::Nil;
    for arg in args {
        value = scope.eval(arg)?;
    }
    Ok(value)
}

/// `(func name? (params...) body...)` - builds a closure over the defining
/// scope. A leading name symbol also binds the closure in the defining
/// scope before anything can call it, which is what makes self-recursion
/// work.
fn func_form(scope: &Scope, args: &[Node]) -> Result<Value, Error> {
    if args.len() < 2 {
        return Err(Error::arity("func takes three or more arguments"));
    }
    let (name, rest) = match &args[0] {
        Node::Symbol { name, .. } => (Some(name.clone()), &args[1..]),
        _ => (None, args),
    };
    let Some(Node::List {
        nodes: param_nodes, ..
    }) = rest.first()
    else {
        return Err(Error::type_error("func takes a list of parameters"));
    };
    let mut params = Vec::with_capacity(param_nodes.len());
    for param in param_nodes {
        let Node::Symbol { name, .. } = param else {
            return Err(Error::type_error(
                "func's list of parameters must be a list of symbols",
            ));
        };
        params.push(name.clone());
    }
    let body = &rest[1..];
    if body.is_empty() {
        return Err(Error::arity("func takes a body sequence"));
    }
    let closure = Value::Closure(Rc::new(Closure {
        name: name.clone(),
        params,
        body: body.to_vec(),
        scope: scope.clone(),
    }));
    if let Some(name) = name {
        scope.create(&name, closure.clone())?;
    }
    Ok(closure)
}

/// C-style loop: `(for init test step body...)`. One branched scope is
/// shared across all iterations; the loop ends when `test` evaluates to
/// exactly `false`.
fn for_form(scope: &Scope, args: &[Node]) -> Result<Value, Error> {
    if args.len() < 4 {
        return Err(Error::arity("for takes four or more arguments"));
    }
    let (init, test, step, body) = (&args[0], &args[1], &args[2], &args[3..]);
    let scope = scope.branch();
    scope.eval(init)?;
    let mut value = Value::Nil;
    loop {
        if scope.eval(test)?.is_falsy() {
            return Ok(value);
        }
        for node in body {
            value = scope.eval(node)?;
        }
        scope.eval(step)?;
    }
}

/// `(range i n body...)` iterates `0..n`; `(range (i e) list body...)`
/// iterates a list with index and element rebound each pass. One branched
/// scope is shared across all iterations.
fn range_form(scope: &Scope, args: &[Node]) -> Result<Value, Error> {
    if args.len() < 3 {
        return Err(Error::arity("range takes three or more arguments"));
    }
    let (index_name, element_name) = match &args[0] {
        Node::Symbol { name, .. } => (Some(name.as_str()), None),
        Node::List { nodes, .. } => match nodes.as_slice() {
            [Node::Symbol { name: index, .. }, Node::Symbol { name: element, .. }] => {
                (Some(index.as_str()), Some(element.as_str()))
            }
            _ => (None, None),
        },
        _ => (None, None),
    };
    let Some(index_name) = index_name else {
        return Err(Error::type_error(
            "range takes var name or (i elem) var name pair as first argument",
        ));
    };
    let scope = scope.branch();
    let body = &args[2..];
    match scope.eval(&args[1])? {
        Value::Int(n) => {
            scope.create(index_name, Value::Int(0))?;
            let mut value = Value::Int(n);
            for i in 0..n {
                scope.set(index_name, Value::Int(i))?;
                for node in body {
                    value = scope.eval(node)?;
                }
            }
            Ok(value)
        }
        Value::List(items) => {
            scope.create(index_name, Value::Int(0))?;
            if let Some(element_name) = element_name {
                scope.create(element_name, Value::Nil)?;
            }
            if items.is_empty() {
                return Ok(Value::List(items));
            }
            let mut value = Value::Nil;
            for (i, element) in items.into_iter().enumerate() {
                scope.set(index_name, Value::Int(i as i64))?;
                if let Some(element_name) = element_name {
                    scope.set(element_name, element)?;
                }
                for node in body {
                    value = scope.eval(node)?;
                }
            }
            Ok(value)
        }
        _ => Err(Error::type_error(
            "range takes an integer or a list as second argument",
        )),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::pos::SourceSet;
    use pretty_assertions::assert_eq;

    /// Expected outcome of evaluating one source unit.
    #[derive(Debug)]
    enum Outcome {
        Val(Value),
        Fails(&'static str),
    }
    use Outcome::{Fails, Val};

    fn ok<T: Into<Value>>(value: T) -> Outcome {
        Val(value.into())
    }

    /// Parse and evaluate `code` against a fresh root scope, with the two
    /// list-handling natives the loop tests need registered host-side.
    fn eval_source(code: &str) -> Result<Value, Error> {
        let sources = SourceSet::new();
        let root = sources.parse_str("", code)?;
        let scope = Scope::root(&sources);
        scope
            .create("list", Value::native("list", |args| Ok(Value::List(args))))
            .unwrap();
        scope
            .create(
                "append",
                Value::native("append", |mut args| {
                    let rest = args.split_off(1.min(args.len()));
                    match args.pop() {
                        Some(Value::List(mut items)) => {
                            items.extend(rest);
                            Ok(Value::List(items))
                        }
                        _ => Err(Error::type_error("append takes list as first argument")),
                    }
                }),
            )
            .unwrap();
        scope.eval(&root)
    }

    fn run_eval_tests(cases: Vec<(&str, Outcome)>) {
        for (i, (code, expected)) in cases.into_iter().enumerate() {
            let test_id = format!("eval case #{}", i + 1);
            match (eval_source(code), expected) {
                (Ok(actual), Val(expected)) => {
                    assert_eq!(actual, expected, "{test_id}: '{code}'");
                }
                (Err(err), Fails(expected)) => {
                    assert_eq!(err.to_string(), expected, "{test_id}: '{code}'");
                }
                (Ok(actual), Fails(expected)) => {
                    panic!("{test_id}: expected error '{expected}', got {actual:?} for '{code}'");
                }
                (Err(err), Val(expected)) => {
                    panic!("{test_id}: expected {expected:?}, got error '{err}' for '{code}'");
                }
            }
        }
    }

    #[test]
    fn eval_basics() {
        run_eval_tests(vec![
            ("1", ok(1)),
            ("1.0", ok(1.0)),
            ("0x10", ok(16)),
            ("010", ok(8)),
            ("'a'", ok(97)),
            (r#""foo\"bar""#, ok("foo\"bar")),
            ("foo", Fails("wisp source:1:1: undefined symbol: foo")),
            ("(1)", Fails("wisp source:1:2: cannot use 1 as a function")),
            (
                r#"("x")"#,
                Fails(r#"wisp source:1:2: cannot use "x" as a function"#),
            ),
            ("true", ok(true)),
            ("false", ok(false)),
            ("nil", Val(Value::Nil)),
            ("1 2 3", ok(3)),
        ]);
    }

    #[test]
    fn eval_error_primitive() {
        run_eval_tests(vec![
            (
                "(\nerror \"error message\")",
                Fails("wisp source:2:1: error message"),
            ),
            (
                "(error)",
                Fails("wisp source:1:2: error function takes a single string argument"),
            ),
            (
                "(error 1)",
                Fails("wisp source:1:2: error function takes a single string argument"),
            ),
            (
                "(error \"foo\" 2)",
                Fails("wisp source:1:2: error function takes a single string argument"),
            ),
        ]);
    }

    #[test]
    fn eval_sum() {
        run_eval_tests(vec![
            ("(+)", ok(0)),
            ("(+ 1)", ok(1)),
            ("(+ 1 2)", ok(3)),
            ("(+ 1 (+ 2 3))", ok(6)),
            ("(+ \"123\")", Fails("wisp source:1:2: cannot sum \"123\"")),
            ("(+ 1.5)", ok(1.5)),
            ("(+ 1.5 1.5)", ok(3.0)),
            ("(+ 1.5 1)", ok(2.5)),
            ("(+ 1 1.5)", ok(2.5)),
            // 64-bit wraparound, not overflow detection.
            ("(+ 9223372036854775807 1)", ok(i64::MIN)),
        ]);
    }

    #[test]
    fn eval_sub() {
        run_eval_tests(vec![
            (
                "(-)",
                Fails(r#"wisp source:1:2: function "-" takes one or more arguments"#),
            ),
            ("(- 1)", ok(-1)),
            ("(- 5)", ok(-5)),
            ("(- 10 1)", ok(9)),
            ("(- 10 1 2)", ok(7)),
            ("(- 10 (- 2 1))", ok(9)),
            (
                "(- \"123\")",
                Fails("wisp source:1:2: cannot subtract \"123\""),
            ),
            ("(- 1.5)", ok(-1.5)),
            ("(- 2.0 1.5)", ok(0.5)),
            ("(- 1.5 1)", ok(0.5)),
            ("(- 1 1.5)", ok(-0.5)),
            ("(- -9223372036854775808 1)", ok(i64::MAX)),
        ]);
    }

    #[test]
    fn eval_mul() {
        run_eval_tests(vec![
            ("(*)", ok(1)),
            ("(* 1)", ok(1)),
            ("(* 2 3 4)", ok(24)),
            ("(* 2 (* 3 4))", ok(24)),
            (
                "(* \"123\")",
                Fails("wisp source:1:2: cannot multiply \"123\""),
            ),
            ("(* 1.5)", ok(1.5)),
            ("(* 2.0 1.5)", ok(3.0)),
            ("(* 1.5 1)", ok(1.5)),
            ("(* 1 1.5)", ok(1.5)),
            ("(* 4611686018427387904 2)", ok(i64::MIN)),
        ]);
    }

    #[test]
    fn eval_div() {
        run_eval_tests(vec![
            (
                "(/)",
                Fails(r#"wisp source:1:2: function "/" takes two or more arguments"#),
            ),
            (
                "(/ 1)",
                Fails(r#"wisp source:1:2: function "/" takes two or more arguments"#),
            ),
            ("(/ 10 2)", ok(5)),
            ("(/ 30 3 2)", ok(5)),
            ("(/ 30 (/ 10 2))", ok(6)),
            // Integer division truncates toward zero.
            ("(/ 7 2)", ok(3)),
            ("(/ -7 2)", ok(-3)),
            (
                "(/ 10 \"123\")",
                Fails("wisp source:1:2: cannot divide with \"123\""),
            ),
            ("(/ 10.0 2.0)", ok(5.0)),
            ("(/ 10.0 2)", ok(5.0)),
            ("(/ 10 2.0)", ok(5.0)),
            ("(/ 10 0)", Fails("wisp source:1:2: division by zero")),
            ("(/ 10 0.0)", ok(f64::INFINITY)),
        ]);
    }

    #[test]
    fn eval_equality() {
        run_eval_tests(vec![
            ("(== \"a\" \"a\")", ok(true)),
            ("(== \"a\" \"b\")", ok(false)),
            ("(== 42 42)", ok(true)),
            ("(== 42 43)", ok(false)),
            ("(== 42 \"a\")", ok(false)),
            // Value-and-type equality: int never equals float.
            ("(== 42 42.0)", ok(false)),
            ("(== nil nil)", ok(true)),
            ("(== 1 2 3)", Fails("wisp source:1:2: == takes two values")),
            ("(==)", Fails("wisp source:1:2: == takes two values")),
            ("(!= \"a\" \"a\")", ok(false)),
            ("(!= \"a\" \"b\")", ok(true)),
            ("(!= 42 42)", ok(false)),
            ("(!= 42 43)", ok(true)),
            ("(!= 42 \"a\")", ok(true)),
            ("(!= 42 42.0)", ok(true)),
            ("(!= 1 2 3)", Fails("wisp source:1:2: != takes two values")),
            ("(!=)", Fails("wisp source:1:2: != takes two values")),
        ]);
    }

    #[test]
    fn eval_or_and() {
        run_eval_tests(vec![
            ("(or)", ok(false)),
            ("(or false 1 2 (error \"must not get here\"))", ok(1)),
            (
                "(or (error \"boom\") 1 2 3)",
                Fails("wisp source:1:6: boom"),
            ),
            ("(or false false)", ok(false)),
            ("(and)", ok(true)),
            ("(and 1 2 3)", ok(3)),
            ("(and false (error \"must not get here\"))", ok(false)),
            (
                "(and (error \"boom\") true)",
                Fails("wisp source:1:7: boom"),
            ),
            // Zero and the empty string are truthy.
            ("(and 0 \"\")", ok("")),
        ]);
    }

    #[test]
    fn eval_if() {
        run_eval_tests(vec![
            ("(if true 1)", ok(1)),
            ("(if 0 1)", ok(1)),
            ("(if 0 1 2)", ok(1)),
            ("(if false 1)", ok(false)),
            ("(if false 1 2)", ok(2)),
            (
                "(if)",
                Fails(r#"wisp source:1:2: function "if" takes two or three arguments"#),
            ),
            (
                "(if 1)",
                Fails(r#"wisp source:1:2: function "if" takes two or three arguments"#),
            ),
        ]);
    }

    #[test]
    fn eval_var_and_set() {
        run_eval_tests(vec![
            ("(var x (+ 1 2)) x", ok(3)),
            ("(var x) x", Val(Value::Nil)),
            (
                "(var x 1 2)",
                Fails("wisp source:1:2: var takes one or two arguments"),
            ),
            (
                "(var)",
                Fails("wisp source:1:2: var takes one or two arguments"),
            ),
            (
                "(var 1 2)",
                Fails("wisp source:1:2: var takes a symbol as first argument"),
            ),
            (
                "(var x)\n(var x)",
                Fails("wisp source:2:2: symbol already defined in current scope: x"),
            ),
            ("(var x) (set x 2) (+ x 3)", ok(5)),
            (
                "(set x 1)",
                Fails("wisp source:1:2: cannot set undefined symbol: x"),
            ),
            (
                "(var x) (set x 1 2)",
                Fails(r#"wisp source:1:10: function "set" takes two arguments"#),
            ),
            (
                "(var x) (set x)",
                Fails(r#"wisp source:1:10: function "set" takes two arguments"#),
            ),
            (
                "(var x) (set)",
                Fails(r#"wisp source:1:10: function "set" takes two arguments"#),
            ),
            (
                "(var x) (set 1 2)",
                Fails(r#"wisp source:1:10: function "set" takes a symbol as first argument"#),
            ),
        ]);
    }

    #[test]
    fn eval_do() {
        run_eval_tests(vec![
            ("(do)", Val(Value::Nil)),
            ("(do 1 2 3)", ok(3)),
            ("(var x 1) (do (set x 2) x)", ok(2)),
            // Mutation of an outer binding survives the block...
            ("(var x 1) (do (set x 2)) x", ok(2)),
            ("(var x 1) (do (var x) (set x 2) x)", ok(2)),
            // ...but a block-local shadow does not leak out.
            ("(var x 1) (do (var x) (set x 2)) x", ok(1)),
        ]);
    }

    #[test]
    fn eval_func() {
        run_eval_tests(vec![
            ("((func (a b) (+ a b)) 1 2)", ok(3)),
            // A closure keeps its defining scope alive across calls.
            (
                "(var add (do (var x 0) (func (n) (set x (+ x n)) x))) (add 1) (add 2)",
                ok(3),
            ),
            ("(func add (a b) (+ a b)) (add 1 2)", ok(3)),
            (
                "(func)",
                Fails("wisp source:1:2: func takes three or more arguments"),
            ),
            (
                "(func x)",
                Fails("wisp source:1:2: func takes three or more arguments"),
            ),
            (
                "(func 1 2)",
                Fails("wisp source:1:2: func takes a list of parameters"),
            ),
            (
                "(func f 2)",
                Fails("wisp source:1:2: func takes a list of parameters"),
            ),
            (
                "(func f (a 1) a)",
                Fails("wisp source:1:2: func's list of parameters must be a list of symbols"),
            ),
            (
                "(func f (a)) (f 1 2)",
                Fails("wisp source:1:2: func takes a body sequence"),
            ),
            (
                "(var f (func (a) 1))\n(f 1 2)",
                Fails("wisp source:2:2: anonymous function takes one argument"),
            ),
            (
                "(func f () 1)\n(f 1)",
                Fails(r#"wisp source:2:2: function "f" takes no arguments"#),
            ),
            (
                "(func f (a) 1)\n(f 1 2)",
                Fails(r#"wisp source:2:2: function "f" takes one argument"#),
            ),
            (
                "(func f (a b) 1)\n(f 1)",
                Fails(r#"wisp source:2:2: function "f" takes 2 arguments"#),
            ),
            // Defining a named func twice in the same scope is a
            // redefinition like any other.
            (
                "(func f () 1)\n(func f () 2)",
                Fails("wisp source:2:2: symbol already defined in current scope: f"),
            ),
        ]);
    }

    #[test]
    fn eval_recursion() {
        run_eval_tests(vec![
            (
                "(func fib (n)
                   (if (or (== n 0) (== n 1))
                       n
                       (+ (fib (- n 1)) (fib (- n 2)))))
                 (fib 10)",
                ok(55),
            ),
            (
                "(func fact (n) (if (== n 0) 1 (* n (fact (- n 1))))) (fact 5)",
                ok(120),
            ),
        ]);
    }

    #[test]
    fn eval_for() {
        run_eval_tests(vec![
            (
                "(for 1 2 3)",
                Fails("wisp source:1:2: for takes four or more arguments"),
            ),
            (
                "(for (error \"init\") (error \"test\") (error \"step\") (error \"code\"))",
                Fails("wisp source:1:7: init"),
            ),
            (
                "(for () (error \"test\") (error \"step\") (error \"code\"))",
                Fails("wisp source:1:10: test"),
            ),
            (
                "(for () () (error \"step\") (error \"code\"))",
                Fails("wisp source:1:28: code"),
            ),
            (
                "(for () () (error \"step\") ())",
                Fails("wisp source:1:13: step"),
            ),
            // The loop scope is a branch: its bindings end with the loop.
            (
                "(for (var i 0) false () ()) i",
                Fails("wisp source:1:29: undefined symbol: i"),
            ),
            (
                "(var x 0) (for (var i 0) (!= i 4) (set i (+ i 1)) (set x (+ x i)) (* 2 x))",
                ok(12),
            ),
            ("(var x 0) (for (var i 0) (!= i 4) (set i (+ i 1)) (set x (+ x i))) x", ok(6)),
        ]);
    }

    #[test]
    fn eval_range() {
        run_eval_tests(vec![
            (
                "(range 1 2)",
                Fails("wisp source:1:2: range takes three or more arguments"),
            ),
            (
                "(range 1 2 3)",
                Fails(
                    "wisp source:1:2: range takes var name or (i elem) var name pair as first argument",
                ),
            ),
            (
                "(range (i e f) 2 3)",
                Fails(
                    "wisp source:1:2: range takes var name or (i elem) var name pair as first argument",
                ),
            ),
            (
                "(range i \"four\" ())",
                Fails("wisp source:1:2: range takes an integer or a list as second argument"),
            ),
            // Index and element variables live in the loop's branch only.
            (
                "(range i 0 ()) i",
                Fails("wisp source:1:16: undefined symbol: i"),
            ),
            ("(var x 0) (range i 4 (set x (+ x i)) (* 2 x))", ok(12)),
            ("(var x 0) (range i 4 (set x (+ x i))) x", ok(6)),
            (
                "(var l ()) (range (i e) (list \"A\" \"B\" \"C\") (set l (append l i e))) l",
                Val(Value::List(vec![
                    Value::Int(0),
                    Value::from("A"),
                    Value::Int(1),
                    Value::from("B"),
                    Value::Int(2),
                    Value::from("C"),
                ])),
            ),
        ]);
    }

    #[test]
    fn prelude_is_complete_and_fresh_per_scope() {
        let names: Vec<&str> = default_globals().iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec![
                "true", "false", "nil", "error", "==", "!=", "+", "-", "*", "/", "or", "and",
                "if", "var", "set", "do", "func", "for", "range",
            ]
        );
        // Forms and primitives keep their calling conventions.
        for (name, value) in default_globals() {
            match name {
                "or" | "and" | "if" | "var" | "set" | "do" | "func" | "for" | "range" => {
                    assert!(matches!(value, Value::Form(_)), "{name} should be a form");
                }
                "error" | "==" | "!=" | "+" | "-" | "*" | "/" => {
                    assert!(
                        matches!(value, Value::Native(_)),
                        "{name} should be applicative"
                    );
                }
                _ => {}
            }
        }
    }
}
