//! Variables - named cells bound to live process values
//!
//! A [`Variable`] is a cheap, cloneable handle. The component that wires the
//! variable to a data source keeps one clone and calls [`Variable::set`] on
//! every update; the compiled formula keeps another clone and reads it on
//! every `eval()`.
//!
//! The value is swapped atomically (no lock), so a reader never sees a torn
//! value. There is no consistency across several variables: one `eval()` may
//! observe the new value of one variable and the old value of another.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::value::Value;

struct VariableCell {
    name: String,
    value: ArcSwap<Value>,
}

/// Named, externally mutable input of a formula
#[derive(Clone)]
pub struct Variable {
    cell: Arc<VariableCell>,
}

impl Variable {
    /// New variable holding NaN
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_value(name, Value::number(f64::NAN))
    }

    pub fn with_value(name: impl Into<String>, value: Value) -> Self {
        Self {
            cell: Arc::new(VariableCell {
                name: name.into(),
                value: ArcSwap::from_pointee(value),
            }),
        }
    }

    pub fn with_number(name: impl Into<String>, value: f64) -> Self {
        Self::with_value(name, Value::number(value))
    }

    pub fn name(&self) -> &str {
        &self.cell.name
    }

    /// Current value
    pub fn get(&self) -> Value {
        self.cell.value.load().as_ref().clone()
    }

    /// Replace the current value
    pub fn set(&self, value: Value) {
        self.cell.value.store(Arc::new(value));
    }

    /// Replace the current value with a plain number (no alarm, stamped now)
    pub fn set_number(&self, value: f64) {
        self.set(Value::number(value));
    }

    /// Both handles refer to the same cell
    pub fn same_cell(&self, other: &Variable) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("name", &self.cell.name)
            .field("value", &self.cell.value.load())
            .finish()
    }
}
