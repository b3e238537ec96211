//! Array plug-in functions
//!
//! Reductions accept numeric arrays and enum arrays (reduced over the
//! indexes); any other payload is rejected with an `InvalidArgument` error.

use super::{arg, Arity, FunctionPlugin};
use crate::error::{EvalError, EvalResult};
use crate::value::{Payload, Value};

pub(super) fn __force_link() {}

inventory::submit! {
    FunctionPlugin {
        name: "arrayOf",
        category: "array",
        description: "Numeric array of the arguments",
        arguments: &["a"],
        arity: Arity::AtLeast(1),
        compute: array_of,
    }
}

inventory::submit! {
    FunctionPlugin {
        name: "arraySum",
        category: "array",
        description: "Sum of the array elements",
        arguments: &["array"],
        arity: Arity::Fixed(1),
        compute: array_sum,
    }
}

inventory::submit! {
    FunctionPlugin {
        name: "arrayMin",
        category: "array",
        description: "Smallest array element",
        arguments: &["array"],
        arity: Arity::Fixed(1),
        compute: array_min,
    }
}

inventory::submit! {
    FunctionPlugin {
        name: "arrayMax",
        category: "array",
        description: "Largest array element",
        arguments: &["array"],
        arity: Arity::Fixed(1),
        compute: array_max,
    }
}

inventory::submit! {
    FunctionPlugin {
        name: "arrayAvg",
        category: "array",
        description: "Average of the array elements",
        arguments: &["array"],
        arity: Arity::Fixed(1),
        compute: array_avg,
    }
}

inventory::submit! {
    FunctionPlugin {
        name: "arrayLength",
        category: "array",
        description: "Number of array elements",
        arguments: &["array"],
        arity: Arity::Fixed(1),
        compute: array_length,
    }
}

inventory::submit! {
    FunctionPlugin {
        name: "elementAt",
        category: "array",
        description: "Array element at a zero-based index",
        arguments: &["array", "index"],
        arity: Arity::Fixed(2),
        compute: element_at,
    }
}

/// Elements of an array argument as doubles
fn elements(function: &str, args: &[Value], index: usize) -> EvalResult<Vec<f64>> {
    match &arg(function, args, index)?.payload {
        Payload::Array { data, .. } => Ok(data.clone()),
        Payload::EnumArray { indexes, .. } => Ok(indexes.iter().map(|i| *i as f64).collect()),
        _ => Err(EvalError::invalid_argument(function, index, "expected an array")),
    }
}

fn reduce(function: &str, args: &[Value], f: fn(&[f64]) -> f64) -> EvalResult<Value> {
    let data = elements(function, args, 0)?;
    Ok(args[0].with_payload(Payload::Scalar(f(&data))))
}

fn array_of(args: &[Value]) -> EvalResult<Value> {
    arg("arrayOf", args, 0)?;
    let data: Vec<f64> = args.iter().map(Value::to_double).collect();
    let shape = vec![data.len()];
    Ok(Value::derived(Payload::Array { data, shape }, args))
}

fn array_sum(args: &[Value]) -> EvalResult<Value> {
    reduce("arraySum", args, |data| data.iter().sum())
}

fn array_min(args: &[Value]) -> EvalResult<Value> {
    reduce("arrayMin", args, |data| {
        data.iter().copied().fold(f64::NAN, f64::min)
    })
}

fn array_max(args: &[Value]) -> EvalResult<Value> {
    reduce("arrayMax", args, |data| {
        data.iter().copied().fold(f64::NAN, f64::max)
    })
}

fn array_avg(args: &[Value]) -> EvalResult<Value> {
    reduce("arrayAvg", args, |data| {
        if data.is_empty() {
            f64::NAN
        } else {
            data.iter().sum::<f64>() / data.len() as f64
        }
    })
}

fn array_length(args: &[Value]) -> EvalResult<Value> {
    reduce("arrayLength", args, |data| data.len() as f64)
}

fn element_at(args: &[Value]) -> EvalResult<Value> {
    let data = elements("elementAt", args, 0)?;
    let index = arg("elementAt", args, 1)?.to_double();
    let element = (index >= 0.0 && index.fract() == 0.0)
        .then(|| data.get(index as usize))
        .flatten()
        .ok_or_else(|| {
            EvalError::invalid_argument(
                "elementAt",
                1,
                format!("index {} out of range for {} elements", index, data.len()),
            )
        })?;
    Ok(Value::derived(Payload::Scalar(*element), args))
}
