//! Text plug-in functions

use super::{arg, Arity, FunctionPlugin};
use crate::error::{EvalError, EvalResult};
use crate::value::{Payload, Value};

pub(super) fn __force_link() {}

inventory::submit! {
    FunctionPlugin {
        name: "concat",
        category: "text",
        description: "Concatenate the textual forms of the arguments",
        arguments: &["a"],
        arity: Arity::AtLeast(1),
        compute: concat,
    }
}

inventory::submit! {
    FunctionPlugin {
        name: "length",
        category: "text",
        description: "Number of characters in a text",
        arguments: &["text"],
        arity: Arity::Fixed(1),
        compute: length,
    }
}

fn concat(args: &[Value]) -> EvalResult<Value> {
    arg("concat", args, 0)?;
    let text: String = args.iter().map(Value::to_text).collect();
    Ok(Value::derived(Payload::Text(text), args))
}

fn length(args: &[Value]) -> EvalResult<Value> {
    let value = arg("length", args, 0)?;
    let text = value
        .as_text()
        .ok_or_else(|| EvalError::invalid_argument("length", 0, "expected text"))?;
    Ok(value.with_payload(Payload::Scalar(text.chars().count() as f64)))
}
