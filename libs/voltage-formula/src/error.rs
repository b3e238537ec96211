//! Error types for voltage-formula
//!
//! Compilation and evaluation fail in different ways and callers need to tell
//! them apart: a [`CompileError`] means the formula text is unusable, an
//! [`EvalError`] only means that one `eval()` call failed.

use std::fmt;

use thiserror::Error;

use crate::functions::Arity;

/// Which kind of quoted literal was left open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteKind {
    /// `"text constant"`
    String,
    /// `'name'` or `` `name` ``
    VariableName,
}

impl fmt::Display for QuoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteKind::String => write!(f, "string"),
            QuoteKind::VariableName => write!(f, "variable name"),
        }
    }
}

/// What went wrong while compiling a formula
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileErrorKind {
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Function {signature} takes {expected} arguments but received {found}")]
    ArityMismatch {
        signature: String,
        expected: Arity,
        found: usize,
    },

    #[error("Invalid number '{text}': {reason}")]
    MalformedNumber { text: String, reason: String },

    #[error("Expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Unexpected end of formula")]
    UnexpectedEnd,

    #[error("Unexpected end of quoted {0}")]
    UnterminatedQuote(QuoteKind),

    #[error("Parse error at '{0}'")]
    TrailingInput(String),

    #[error("Formula nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("Expected ':' to follow the (cond) ? ..., but '{0}' was read as one name; quote names containing ':'")]
    ColonInName(String),

    #[error("Failed to read formula: {0}")]
    Scan(String),
}

/// Formula compilation error
///
/// Carries the formula text and the character position where the parser
/// gave up, so diagnostics can point at the offending input.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} (formula '{formula}', position {position})")]
pub struct CompileError {
    kind: CompileErrorKind,
    formula: String,
    position: usize,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, formula: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            formula: formula.into(),
            position,
        }
    }

    pub fn kind(&self) -> &CompileErrorKind {
        &self.kind
    }

    /// Formula text that failed to compile
    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// Character offset into the formula
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Evaluation error raised by a function call
///
/// Fatal to a single `eval()` only; the formula stays usable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Function {function}: {message}")]
    Function { function: String, message: String },

    #[error("Function {function}: invalid argument {index}: {message}")]
    InvalidArgument {
        function: String,
        index: usize,
        message: String,
    },
}

impl EvalError {
    pub fn function(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Function {
            function: function.into(),
            message: message.into(),
        }
    }

    pub fn invalid_argument(
        function: impl Into<String>,
        index: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            function: function.into(),
            index,
            message: message.into(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(String),

    #[error("Unsupported config file format: {0}")]
    UnsupportedFormat(String),
}

impl ConfigError {
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }
}

pub type CompileResult<T> = std::result::Result<T, CompileError>;
pub type EvalResult<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_message() {
        let err = CompileError::new(CompileErrorKind::UnknownVariable("c".into()), "a+c", 2);
        assert_eq!(err.position(), 2);
        assert_eq!(err.formula(), "a+c");
        assert_eq!(
            err.to_string(),
            "Unknown variable 'c' (formula 'a+c', position 2)"
        );
    }

    #[test]
    fn test_arity_message_mentions_arguments() {
        let kind = CompileErrorKind::ArityMismatch {
            signature: "fac(n)".into(),
            expected: Arity::Fixed(1),
            found: 2,
        };
        assert!(kind.to_string().contains("arguments"));
    }

    #[test]
    fn test_colon_hint_names_the_variable() {
        let kind = CompileErrorKind::ColonInName("a:b".into());
        assert!(kind.to_string().contains("'a:b' was read as one name"));
    }

    #[test]
    fn test_unterminated_quote_message() {
        let kind = CompileErrorKind::UnterminatedQuote(QuoteKind::String);
        assert_eq!(kind.to_string(), "Unexpected end of quoted string");
    }
}
