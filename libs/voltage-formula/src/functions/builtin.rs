//! Built-in functions: rnd, min, max

use std::sync::Arc;

use super::{arg, Arity, FunctionDescriptor, FunctionPlugin};
use crate::error::EvalResult;
use crate::value::{Payload, Value};

static RND: FunctionPlugin = FunctionPlugin {
    name: "rnd",
    category: "builtin",
    description: "Random number in [0, max)",
    arguments: &["max"],
    arity: Arity::AtLeast(1),
    compute: rnd,
};

static MIN: FunctionPlugin = FunctionPlugin {
    name: "min",
    category: "builtin",
    description: "Smallest argument",
    arguments: &["a", "b"],
    arity: Arity::AtLeast(2),
    compute: min,
};

static MAX: FunctionPlugin = FunctionPlugin {
    name: "max",
    category: "builtin",
    description: "Largest argument",
    arguments: &["a", "b"],
    arity: Arity::AtLeast(2),
    compute: max,
};

pub(super) fn builtins() -> Vec<FunctionDescriptor> {
    vec![Arc::new(RND), Arc::new(MIN), Arc::new(MAX)]
}

/// Only the first argument is used
fn rnd(args: &[Value]) -> EvalResult<Value> {
    let limit = arg("rnd", args, 0)?;
    let result = rand::random::<f64>() * limit.to_double();
    Ok(limit.with_payload(Payload::Scalar(result)))
}

fn min(args: &[Value]) -> EvalResult<Value> {
    fold("min", args, f64::min)
}

fn max(args: &[Value]) -> EvalResult<Value> {
    fold("max", args, f64::max)
}

/// NaN arguments are skipped unless every argument is NaN
fn fold(function: &str, args: &[Value], f: fn(f64, f64) -> f64) -> EvalResult<Value> {
    let first = arg(function, args, 0)?.to_double();
    let result = args[1..].iter().map(Value::to_double).fold(first, f);
    Ok(Value::derived(Payload::Scalar(result), args))
}
