//! Compiled formulas

use std::fmt;
use std::io::Read;

use tracing::{debug, trace};

use crate::error::{CompileError, CompileErrorKind, CompileResult, EvalResult};
use crate::functions::FunctionRegistry;
use crate::node::Node;
use crate::parser::Parser;
use crate::value::Value;
use crate::variable::Variable;

/// How names in the formula text are bound to variables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMode {
    /// Only the constants `E` and `PI`
    NoVariables,
    /// Only the caller-supplied variables (and the constants)
    Fixed,
    /// Every unknown name becomes a new variable
    AutoDetect,
}

/// Parsed formula, ready for repeated evaluation
///
/// The tree is immutable; the values flowing through it come from the bound
/// [`Variable`]s, so `eval()` can be called again whenever an input changes.
#[derive(Debug, Clone)]
pub struct Formula {
    source: String,
    root: Node,
    variables: Vec<Variable>,
    mode: BindingMode,
}

impl Formula {
    /// Evaluate with the current variable values
    pub fn eval(&self) -> EvalResult<Value> {
        let result = self.root.eval();
        trace!(formula = %self.source, ?result, "Evaluated formula");
        result
    }

    /// Formula text as given to the compiler
    pub fn source_text(&self) -> &str {
        &self.source
    }

    /// Bound variables: the caller's in fixed mode, the discovered ones in
    /// order of first appearance in auto-detect mode, none otherwise
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name() == name)
    }

    pub fn binding_mode(&self) -> BindingMode {
        self.mode
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Does the formula read a variable with this name?
    pub fn references(&self, name: &str) -> bool {
        self.root.references(name)
    }

    /// Does the formula read this very variable?
    pub fn contains_variable(&self, variable: &Variable) -> bool {
        self.root.contains_variable(variable)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

// ============================================================================
// Compiler
// ============================================================================

/// Compiles formula text against a function registry
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'r> {
    registry: &'r FunctionRegistry,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r FunctionRegistry) -> Self {
        Self { registry }
    }

    /// Formula without variables
    pub fn compile(&self, text: &str) -> CompileResult<Formula> {
        self.build(text, BindingMode::NoVariables, Vec::new())
    }

    /// Formula restricted to the given variables
    pub fn compile_with_variables(
        &self,
        text: &str,
        variables: &[Variable],
    ) -> CompileResult<Formula> {
        self.build(text, BindingMode::Fixed, variables.to_vec())
    }

    /// Formula whose variables are discovered from the text
    pub fn compile_autodetect(&self, text: &str) -> CompileResult<Formula> {
        self.build(text, BindingMode::AutoDetect, Vec::new())
    }

    /// Read the formula text from `reader`, then compile it in `mode`.
    /// `variables` are only used in fixed mode.
    pub fn compile_reader<R: Read>(
        &self,
        mut reader: R,
        mode: BindingMode,
        variables: &[Variable],
    ) -> CompileResult<Formula> {
        let mut text = String::new();
        if let Err(e) = reader.read_to_string(&mut text) {
            return Err(CompileError::new(
                CompileErrorKind::Scan(e.to_string()),
                text,
                0,
            ));
        }
        let variables = match mode {
            BindingMode::Fixed => variables.to_vec(),
            BindingMode::NoVariables | BindingMode::AutoDetect => Vec::new(),
        };
        self.build(&text, mode, variables)
    }

    fn build(
        &self,
        text: &str,
        mode: BindingMode,
        variables: Vec<Variable>,
    ) -> CompileResult<Formula> {
        let (root, variables) = Parser::new(text, self.registry, mode, variables)
            .parse()
            .inspect_err(|e| debug!(formula = text, error = %e, "Formula compilation failed"))?;
        debug!(
            formula = text,
            ?mode,
            variables = variables.len(),
            "Compiled formula"
        );
        Ok(Formula {
            source: text.to_string(),
            root,
            variables,
            mode,
        })
    }
}

/// Compile a formula without variables, using the global registry
pub fn compile(text: &str) -> CompileResult<Formula> {
    Compiler::new(FunctionRegistry::global()).compile(text)
}

/// Compile a formula restricted to `variables`, using the global registry
pub fn compile_with_variables(text: &str, variables: &[Variable]) -> CompileResult<Formula> {
    Compiler::new(FunctionRegistry::global()).compile_with_variables(text, variables)
}

/// Compile a formula with variable discovery, using the global registry
pub fn compile_autodetect(text: &str) -> CompileResult<Formula> {
    Compiler::new(FunctionRegistry::global()).compile_autodetect(text)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use std::io;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }
    }

    #[test]
    fn test_accessors() {
        let formula = compile_autodetect("x * 2 + y").unwrap();
        assert_eq!(formula.source_text(), "x * 2 + y");
        assert_eq!(formula.binding_mode(), BindingMode::AutoDetect);
        assert!(formula.variable("y").is_some());
        assert!(formula.variable("z").is_none());
        assert_eq!(formula.to_string(), "((x * 2.0) + y)");
    }

    #[test]
    fn test_no_variables_mode_has_none() {
        let formula = compile("1 + 2").unwrap();
        assert!(formula.variables().is_empty());
        assert_eq!(formula.binding_mode(), BindingMode::NoVariables);
    }

    #[test]
    fn test_compile_reader() {
        let registry = FunctionRegistry::new();
        let compiler = Compiler::new(&registry);
        let a = Variable::with_number("a", 4.0);
        let formula = compiler
            .compile_reader("a * a".as_bytes(), BindingMode::Fixed, &[a])
            .unwrap();
        assert_eq!(formula.eval().unwrap().to_double(), 16.0);
    }

    #[test]
    fn test_compile_reader_io_error() {
        let registry = FunctionRegistry::new();
        let err = Compiler::new(&registry)
            .compile_reader(FailingReader, BindingMode::NoVariables, &[])
            .unwrap_err();
        assert!(matches!(err.kind(), CompileErrorKind::Scan(msg) if msg.contains("pipe closed")));
    }

    #[test]
    fn test_explicit_registry_limits_functions() {
        let registry = FunctionRegistry::new();
        let err = Compiler::new(&registry).compile("sqrt(4)").unwrap_err();
        assert_eq!(err.kind(), &CompileErrorKind::UnknownFunction("sqrt".into()));
        assert!(compile("sqrt(4)").is_ok());
    }
}
