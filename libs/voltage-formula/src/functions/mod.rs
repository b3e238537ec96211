//! Function registry
//!
//! Resolves a function name to a callable at compile time. Two sources:
//!
//! - **Built-ins**: `rnd`, `min`, `max` (matched case-insensitively)
//! - **Plug-ins**: [`FunctionPlugin`] items submitted with `inventory::submit!`
//!   anywhere in the final binary, plus providers registered at runtime with
//!   [`FunctionRegistry::register`]
//!
//! Plug-ins are checked first, so a plug-in may replace a built-in.
//!
//! # Plug-in Example
//!
//! ```rust
//! use voltage_formula::functions::{Arity, FunctionPlugin};
//! use voltage_formula::{EvalError, Payload, Value};
//!
//! fn fac(args: &[Value]) -> Result<Value, EvalError> {
//!     let n = args[0].to_double();
//!     let mut result = 1.0;
//!     for i in 2..=(n as u64) {
//!         result *= i as f64;
//!     }
//!     Ok(args[0].with_payload(Payload::Scalar(result)))
//! }
//!
//! voltage_formula::inventory::submit! {
//!     FunctionPlugin {
//!         name: "fac",
//!         category: "demo",
//!         description: "Factorial",
//!         arguments: &["n"],
//!         arity: Arity::Fixed(1),
//!         compute: fac,
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::error::{EvalError, EvalResult};
use crate::parser::is_name_char;
use crate::value::{Payload, Value};

mod alarm;
mod array;
mod builtin;
mod industrial;
mod math;
mod text;

// ============================================================================
// Function contract
// ============================================================================

/// Number of arguments a function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly N arguments
    Fixed(usize),
    /// N or more arguments
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Fixed(n) => count == *n,
            Arity::AtLeast(n) => count >= *n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Contract for functions callable from formulas
pub trait FormulaFunction: Send + Sync {
    /// Name used in formulas
    fn name(&self) -> &str;

    /// Grouping tag (e.g. "math", "alarm")
    fn category(&self) -> &str;

    fn description(&self) -> &str;

    /// Argument names, for signatures
    fn arguments(&self) -> Vec<String>;

    fn arity(&self) -> Arity;

    /// `name(arg1, arg2)`, with `...` appended for variadic functions
    fn signature(&self) -> String {
        let mut args = self.arguments();
        if matches!(self.arity(), Arity::AtLeast(_)) {
            args.push("...".to_string());
        }
        format!("{}({})", self.name(), args.join(", "))
    }

    /// Compute the result. Argument count has already been checked against
    /// [`FormulaFunction::arity`] when the formula was compiled.
    fn compute(&self, args: &[Value]) -> EvalResult<Value>;
}

impl fmt::Debug for dyn FormulaFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FormulaFunction({})", self.signature())
    }
}

/// Resolved function as stored in a compiled formula
pub type FunctionDescriptor = Arc<dyn FormulaFunction>;

/// Statically declared plug-in function, collected at link time
#[derive(Clone, Copy)]
pub struct FunctionPlugin {
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub arguments: &'static [&'static str],
    pub arity: Arity,
    pub compute: fn(&[Value]) -> EvalResult<Value>,
}

inventory::collect!(FunctionPlugin);

impl FormulaFunction for FunctionPlugin {
    fn name(&self) -> &str {
        self.name
    }

    fn category(&self) -> &str {
        self.category
    }

    fn description(&self) -> &str {
        self.description
    }

    fn arguments(&self) -> Vec<String> {
        self.arguments.iter().map(|a| a.to_string()).collect()
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    fn compute(&self, args: &[Value]) -> EvalResult<Value> {
        (self.compute)(args)
    }
}

// Referencing each plug-in module keeps its `inventory::submit!` items in the
// final link even when nothing else in that object file is used.
fn force_link_plugin_modules() {
    let modules: &[fn()] = &[
        alarm::__force_link,
        array::__force_link,
        industrial::__force_link,
        math::__force_link,
        text::__force_link,
    ];
    for f in modules {
        let f = std::hint::black_box(*f);
        f();
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Name → function table consulted by the compiler
pub struct FunctionRegistry {
    plugins: HashMap<String, FunctionDescriptor>,
    builtins: Vec<FunctionDescriptor>,
}

impl FunctionRegistry {
    /// Registry with the built-in functions only
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
            builtins: builtin::builtins(),
        }
    }

    /// Built-ins plus every plug-in linked into the binary
    pub fn discover() -> Self {
        Self::from_config(&RegistryConfig::default())
    }

    /// Built-ins plus the plug-ins the configuration enables
    pub fn from_config(config: &RegistryConfig) -> Self {
        let mut registry = Self::new();
        if config.discover_plugins {
            force_link_plugin_modules();
            for plugin in inventory::iter::<FunctionPlugin> {
                if !config.is_enabled(plugin.category, plugin.name) {
                    debug!(
                        function = plugin.name,
                        category = plugin.category,
                        "Plug-in function disabled by configuration"
                    );
                    continue;
                }
                registry.register(Arc::new(*plugin));
            }
        }
        info!(
            plugins = registry.plugins.len(),
            builtins = registry.builtins.len(),
            "Function registry initialized"
        );
        registry
    }

    /// Process-wide default registry, discovered on first use
    pub fn global() -> &'static FunctionRegistry {
        static GLOBAL: OnceLock<FunctionRegistry> = OnceLock::new();
        GLOBAL.get_or_init(FunctionRegistry::discover)
    }

    /// Add a plug-in function
    ///
    /// Returns `false` (and logs a warning) when the declaration is unusable:
    /// an empty category or a name that cannot be written as a bare
    /// identifier in a formula.
    pub fn register(&mut self, function: FunctionDescriptor) -> bool {
        let name = function.name().to_string();
        let valid_name = name.chars().next().is_some_and(|c| !c.is_ascii_digit())
            && name.chars().all(is_name_char);
        if !valid_name || function.category().is_empty() {
            warn!(
                function = %name,
                category = function.category(),
                "Skipping plug-in function with invalid declaration"
            );
            return false;
        }

        if self.builtin(&name).is_some() {
            warn!(function = %name, "Plug-in function replaces built-in");
        }
        debug!(
            signature = %function.signature(),
            category = function.category(),
            "Registered formula function"
        );
        if let Some(previous) = self.plugins.insert(name, function) {
            warn!(
                signature = %previous.signature(),
                "Plug-in function registered twice, keeping the later one"
            );
        }
        true
    }

    /// Look up a function: plug-ins by exact name, then built-ins
    pub fn resolve(&self, name: &str) -> Option<FunctionDescriptor> {
        self.plugins
            .get(name)
            .cloned()
            .or_else(|| self.builtin(name))
    }

    /// All callable functions, sorted by name
    pub fn functions(&self) -> Vec<FunctionDescriptor> {
        let mut all: Vec<FunctionDescriptor> = self.plugins.values().cloned().collect();
        for builtin in &self.builtins {
            if !self.plugins.contains_key(builtin.name()) {
                all.push(builtin.clone());
            }
        }
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    pub fn len(&self) -> usize {
        self.functions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn builtin(&self, name: &str) -> Option<FunctionDescriptor> {
        self.builtins
            .iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
            .cloned()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("plugins", &self.plugins.len())
            .field("builtins", &self.builtins.len())
            .finish()
    }
}

// ============================================================================
// Helpers for plug-in implementations
// ============================================================================

/// Argument `index`, or an error naming the function
pub(crate) fn arg<'a>(function: &str, args: &'a [Value], index: usize) -> EvalResult<&'a Value> {
    args.get(index)
        .ok_or_else(|| EvalError::invalid_argument(function, index, "missing argument"))
}

/// Apply `f` to one numeric argument, keeping its alarm and timestamp
pub(crate) fn unary(function: &str, args: &[Value], f: fn(f64) -> f64) -> EvalResult<Value> {
    let value = arg(function, args, 0)?;
    Ok(value.with_payload(Payload::Scalar(f(value.to_double()))))
}

/// Apply `f` to two numeric arguments, combining their metadata
pub(crate) fn binary(function: &str, args: &[Value], f: fn(f64, f64) -> f64) -> EvalResult<Value> {
    let a = arg(function, args, 0)?;
    let b = arg(function, args, 1)?;
    Ok(Value::combine(f(a.to_double(), b.to_double()), a, b))
}
