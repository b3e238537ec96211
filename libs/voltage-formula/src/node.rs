//! Formula syntax tree and its evaluation
//!
//! The tree is built once by the parser and never changes afterwards. Every
//! `eval()` walks it again, reading the current value of each variable.

use std::fmt;

use crate::error::EvalResult;
use crate::functions::FunctionDescriptor;
use crate::parser::is_name_char;
use crate::value::{Payload, Value};
use crate::variable::Variable;

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Numeric result for the non-logical operators
    fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Pow => a.powf(b),
            BinaryOp::Lt => flag(a < b),
            BinaryOp::Le => flag(a <= b),
            BinaryOp::Gt => flag(a > b),
            BinaryOp::Ge => flag(a >= b),
            BinaryOp::Eq => flag(a == b),
            BinaryOp::Ne => flag(a != b),
            BinaryOp::And => flag(a != 0.0 && b != 0.0),
            BinaryOp::Or => flag(a != 0.0 || b != 0.0),
        }
    }
}

fn flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

/// Node of a compiled formula
#[derive(Debug, Clone)]
pub enum Node {
    Constant(Value),
    Variable(Variable),
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Conditional {
        condition: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Box<Node>,
    },
    Call {
        function: FunctionDescriptor,
        args: Vec<Node>,
    },
}

impl Node {
    pub fn unary(op: UnaryOp, operand: Node) -> Self {
        Node::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, left: Node, right: Node) -> Self {
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn conditional(condition: Node, then_branch: Node, else_branch: Node) -> Self {
        Node::Conditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    /// Evaluate the subtree
    pub fn eval(&self) -> EvalResult<Value> {
        match self {
            Node::Constant(value) => Ok(value.clone()),
            Node::Variable(variable) => Ok(variable.get()),
            Node::Unary { op, operand } => {
                let value = operand.eval()?;
                let x = value.to_double();
                let result = match op {
                    UnaryOp::Negate => -x,
                    UnaryOp::Not => flag(x == 0.0),
                };
                Ok(value.with_payload(Payload::Scalar(result)))
            },
            Node::Binary { op, left, right } => match op {
                BinaryOp::And | BinaryOp::Or => {
                    let a = left.eval()?;
                    // Left operand decides: false && .., true || ..
                    if a.is_true() == (*op == BinaryOp::Or) {
                        return Ok(a.with_payload(Payload::Scalar(flag(a.is_true()))));
                    }
                    let b = right.eval()?;
                    Ok(Value::combine(op.apply(a.to_double(), b.to_double()), &a, &b))
                },
                BinaryOp::Add => {
                    let a = left.eval()?;
                    let b = right.eval()?;
                    if a.is_text() || b.is_text() {
                        let text = a.to_text() + &b.to_text();
                        return Ok(Value::derived(Payload::Text(text), [&a, &b]));
                    }
                    Ok(Value::combine(a.to_double() + b.to_double(), &a, &b))
                },
                _ => {
                    let a = left.eval()?;
                    let b = right.eval()?;
                    Ok(Value::combine(op.apply(a.to_double(), b.to_double()), &a, &b))
                },
            },
            Node::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if condition.eval()?.is_true() {
                    then_branch.eval()
                } else {
                    else_branch.eval()
                }
            },
            Node::Call { function, args } => {
                let values = args.iter().map(Node::eval).collect::<EvalResult<Vec<_>>>()?;
                function.compute(&values)
            },
        }
    }

    /// Does the subtree read a variable with this name?
    pub fn references(&self, name: &str) -> bool {
        self.any_variable(&|v| v.name() == name)
    }

    /// Does the subtree read this very variable cell?
    pub fn contains_variable(&self, variable: &Variable) -> bool {
        self.any_variable(&|v| v.same_cell(variable))
    }

    fn any_variable(&self, predicate: &dyn Fn(&Variable) -> bool) -> bool {
        match self {
            Node::Constant(_) => false,
            Node::Variable(v) => predicate(v),
            Node::Unary { operand, .. } => operand.any_variable(predicate),
            Node::Binary { left, right, .. } => {
                left.any_variable(predicate) || right.any_variable(predicate)
            },
            Node::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.any_variable(predicate)
                    || then_branch.any_variable(predicate)
                    || else_branch.any_variable(predicate)
            },
            Node::Call { args, .. } => args.iter().any(|a| a.any_variable(predicate)),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Constant(value) => match &value.payload {
                Payload::Scalar(v) => write!(f, "{:?}", v),
                Payload::Text(s) => write!(f, "\"{}\"", s),
                _ => write!(f, "{}", value.to_text()),
            },
            Node::Variable(v) => {
                let name = v.name();
                if !name.is_empty() && name.chars().all(is_name_char) {
                    write!(f, "{}", name)
                } else {
                    write!(f, "'{}'", name)
                }
            },
            Node::Unary { op, operand } => match op {
                UnaryOp::Negate => write!(f, "-{}", operand),
                UnaryOp::Not => write!(f, "!{}", operand),
            },
            Node::Binary { op, left, right } => write!(f, "({} {} {})", left, op.symbol(), right),
            Node::Conditional {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "({} ? {} : {})", condition, then_branch, else_branch),
            Node::Call { function, args } => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            },
        }
    }
}
