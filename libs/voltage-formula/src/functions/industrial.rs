//! Industrial calculation helpers
//!
//! Stateless functions used throughout VoltageEMS calculations:
//!
//! | Function | Signature | Description |
//! |----------|-----------|-------------|
//! | `scale` | `scale(value, factor)` | Multiply by factor |
//! | `clamp` | `clamp(value, min, max)` | Limit to range |
//! | `sign` | `sign(value)` | Sign: -1, 0, or 1 |
//! | `round` | `round(value)` or `round(value, decimals)` | Round to decimals |

use super::{arg, binary, unary, Arity, FunctionPlugin};
use crate::error::{EvalError, EvalResult};
use crate::value::{Payload, Value};

pub(super) fn __force_link() {}

inventory::submit! {
    FunctionPlugin {
        name: "scale",
        category: "industrial",
        description: "Multiply a value by a factor",
        arguments: &["value", "factor"],
        arity: Arity::Fixed(2),
        compute: scale,
    }
}

inventory::submit! {
    FunctionPlugin {
        name: "clamp",
        category: "industrial",
        description: "Limit a value to [min, max]",
        arguments: &["value", "min", "max"],
        arity: Arity::Fixed(3),
        compute: clamp,
    }
}

inventory::submit! {
    FunctionPlugin {
        name: "sign",
        category: "industrial",
        description: "Sign function: -1, 0, or 1",
        arguments: &["value"],
        arity: Arity::Fixed(1),
        compute: sign,
    }
}

inventory::submit! {
    FunctionPlugin {
        name: "round",
        category: "industrial",
        description: "Round to the given number of decimal places (default 0)",
        arguments: &["value"],
        arity: Arity::AtLeast(1),
        compute: round,
    }
}

fn scale(args: &[Value]) -> EvalResult<Value> {
    binary("scale", args, |value, factor| value * factor)
}

fn clamp(args: &[Value]) -> EvalResult<Value> {
    let value = arg("clamp", args, 0)?;
    let min = arg("clamp", args, 1)?.to_double();
    let max = arg("clamp", args, 2)?.to_double();
    if min.is_nan() || max.is_nan() || min > max {
        return Err(EvalError::invalid_argument(
            "clamp",
            1,
            format!("invalid range [{}, {}]", min, max),
        ));
    }
    let result = value.to_double().clamp(min, max);
    Ok(Value::derived(Payload::Scalar(result), args))
}

fn sign(args: &[Value]) -> EvalResult<Value> {
    unary("sign", args, |value| {
        if value > 0.0 {
            1.0
        } else if value < 0.0 {
            -1.0
        } else {
            0.0
        }
    })
}

/// Beyond this `10^decimals` is zero or infinite anyway
const MAX_DECIMALS: f64 = 400.0;

/// Every f64 of at least this magnitude is an integer
const INTEGRAL: f64 = 4_503_599_627_370_496.0;

/// Extra arguments past `decimals` are ignored
fn round(args: &[Value]) -> EvalResult<Value> {
    let value = arg("round", args, 0)?;
    let decimals = args.get(1).map(|d| d.to_double()).unwrap_or(0.0);
    if !decimals.is_finite() {
        return Err(EvalError::invalid_argument(
            "round",
            1,
            "decimals must be a finite number",
        ));
    }
    let x = value.to_double();
    let factor = 10_f64.powi(decimals.clamp(-MAX_DECIMALS, MAX_DECIMALS) as i32);
    let scaled = x * factor;
    let result = if factor == 0.0 && x.is_finite() {
        0.0
    } else if !scaled.is_finite() || scaled.abs() >= INTEGRAL {
        // Already at or below f64 resolution
        x
    } else {
        scaled.round() / factor
    };
    Ok(Value::derived(Payload::Scalar(result), args))
}
