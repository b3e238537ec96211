//! Math plug-in functions
//!
//! Thin wrappers over the `f64` methods. Domain errors are not raised:
//! `sqrt(-1)` is NaN, `log(0)` is -inf, as the arithmetic operators do.

use super::{binary, unary, Arity, FunctionPlugin};
use crate::error::EvalResult;
use crate::value::Value;

pub(super) fn __force_link() {}

macro_rules! math_unary {
    ($name:literal, $func:ident, $op:expr, $doc:literal) => {
        fn $func(args: &[Value]) -> EvalResult<Value> {
            unary($name, args, $op)
        }

        inventory::submit! {
            FunctionPlugin {
                name: $name,
                category: "math",
                description: $doc,
                arguments: &["x"],
                arity: Arity::Fixed(1),
                compute: $func,
            }
        }
    };
}

macro_rules! math_binary {
    ($name:literal, $func:ident, $op:expr, [$a:literal, $b:literal], $doc:literal) => {
        fn $func(args: &[Value]) -> EvalResult<Value> {
            binary($name, args, $op)
        }

        inventory::submit! {
            FunctionPlugin {
                name: $name,
                category: "math",
                description: $doc,
                arguments: &[$a, $b],
                arity: Arity::Fixed(2),
                compute: $func,
            }
        }
    };
}

math_unary!("abs", abs, f64::abs, "Absolute value");
math_unary!("acos", acos, f64::acos, "Arc cosine");
math_unary!("asin", asin, f64::asin, "Arc sine");
math_unary!("atan", atan, f64::atan, "Arc tangent");
math_unary!("ceil", ceil, f64::ceil, "Round up");
math_unary!("cos", cos, f64::cos, "Cosine (radians)");
math_unary!("cosh", cosh, f64::cosh, "Hyperbolic cosine");
math_unary!("exp", exp, f64::exp, "e^x");
math_unary!("expm1", expm1, f64::exp_m1, "e^x - 1");
math_unary!("floor", floor, f64::floor, "Round down");
math_unary!("log", log, f64::ln, "Natural logarithm");
math_unary!("log10", log10, f64::log10, "Base-10 logarithm");
math_unary!("signum", signum, signum_or_zero, "Sign of x: -1, 0 or 1");
math_unary!("sin", sin, f64::sin, "Sine (radians)");
math_unary!("sinh", sinh, f64::sinh, "Hyperbolic sine");
math_unary!("sqrt", sqrt, f64::sqrt, "Square root");
math_unary!("tan", tan, f64::tan, "Tangent (radians)");
math_unary!("tanh", tanh, f64::tanh, "Hyperbolic tangent");
math_unary!("toDegrees", to_degrees, f64::to_degrees, "Radians to degrees");
math_unary!("toRadians", to_radians, f64::to_radians, "Degrees to radians");

math_binary!("atan2", atan2, f64::atan2, ["y", "x"], "Angle of the point (x, y)");
math_binary!("hypot", hypot, f64::hypot, ["x", "y"], "sqrt(x^2 + y^2)");
math_binary!("pow", pow, f64::powf, ["base", "exponent"], "base^exponent");

/// `f64::signum` maps 0.0 to 1.0; formulas expect 0 for 0
fn signum_or_zero(x: f64) -> f64 {
    if x == 0.0 || x.is_nan() {
        x
    } else {
        x.signum()
    }
}
