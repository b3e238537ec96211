//! voltage-formula - Formula engine for VoltageEMS process values
//!
//! Compiles formula text once into an expression tree and re-evaluates it
//! whenever one of its input variables changes. Results carry the worst
//! alarm and the latest timestamp of the values they were computed from.
//!
//! # Features
//!
//! - **Operators**: `+ - * / ^`, comparisons, `&`/`&&`, `|`/`||`, `!`, `cond ? a : b`
//! - **Variable binding**: none, a fixed set, or discovered from the text
//! - **Functions**: built-in `rnd`, `min`, `max` plus plug-ins (math,
//!   industrial, alarm, array, text) collected at link time
//!
//! # Example
//!
//! ```rust
//! use voltage_formula::{compile_autodetect, Value};
//!
//! let formula = compile_autodetect("P * efficiency > 900 ? 1 : 0").unwrap();
//!
//! // Wire inputs, typically from a data source callback
//! formula.variable("P").unwrap().set_number(1000.0);
//! formula.variable("efficiency").unwrap().set(Value::number(0.95));
//!
//! assert_eq!(formula.eval().unwrap().to_double(), 1.0);
//!
//! formula.variable("efficiency").unwrap().set_number(0.5);
//! assert_eq!(formula.eval().unwrap().to_double(), 0.0);
//! ```
//!
//! # Built-in Functions
//!
//! | Function | Signature | Description |
//! |----------|-----------|-------------|
//! | `rnd` | `rnd(max)` | Random number in `[0, max)` |
//! | `min` | `min(a, b, ...)` | Smallest argument |
//! | `max` | `max(a, b, ...)` | Largest argument |
//!
//! Built-in names match case-insensitively; plug-in names match exactly and
//! take precedence.

pub mod config;
pub mod error;
pub mod formula;
pub mod functions;
pub mod node;
pub mod value;
pub mod variable;

mod parser;
mod scanner;

// Re-exports for convenience
pub use config::{load_config, load_config_from_file, FormulaConfig, RegistryConfig};
pub use error::{
    CompileError, CompileErrorKind, CompileResult, ConfigError, EvalError, EvalResult, QuoteKind,
};
pub use formula::{compile, compile_autodetect, compile_with_variables, BindingMode, Compiler, Formula};
pub use functions::{FormulaFunction, FunctionDescriptor, FunctionRegistry};
pub use value::{Alarm, AlarmSeverity, Payload, PixelFormat, Statistics, Timestamp, Value};
pub use variable::Variable;

// Plug-in crates submit `FunctionPlugin`s through this
pub use inventory;
