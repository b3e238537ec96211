//! Recursive-descent parser
//!
//! Binding strength, lowest first:
//!
//! ```text
//! logical  := compare ( ('&&'|'&') compare | ('||'|'|') compare | '?' compare ':' logical )*
//! compare  := addsub ( ('=='|'!='|'>='|'<='|'>'|'<') addsub )*
//! addsub   := muldiv ( ('+'|'-') muldiv )*
//! muldiv   := unary ( ('^'|'*'|'/') unary )*
//! unary    := '!' primary | primary
//! primary  := ['-'] ( number | "text" | 'name' | `name` | '(' logical ')'
//!                   | identifier | identifier '(' [logical (',' logical)*] ')' )
//! ```
//!
//! The conditional shares its level with `&` and `|`, and its else branch
//! swallows the rest of the logical expression.

use std::f64::consts;

use crate::error::{CompileError, CompileErrorKind, CompileResult, QuoteKind};
use crate::formula::BindingMode;
use crate::functions::FunctionRegistry;
use crate::node::{BinaryOp, Node, UnaryOp};
use crate::scanner::Scanner;
use crate::value::Value;
use crate::variable::Variable;

/// Characters allowed in unquoted variable and function names
pub(crate) fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == ':'
}

/// Characters that start a numeric literal
fn is_number_start(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

/// Named constants, consulted after the caller's variables
const CONSTANTS: [(&str, f64); 2] = [("E", consts::E), ("PI", consts::PI)];

/// Deepest nesting of parentheses, argument lists and else branches
pub(crate) const MAX_NESTING: usize = 64;

/// Tallest syntax tree accepted; evaluation recurses once per level
pub(crate) const MAX_HEIGHT: usize = 256;

/// Parsed subtree with its height
struct Subtree {
    node: Node,
    height: usize,
}

impl Subtree {
    fn leaf(node: Node) -> Self {
        Self { node, height: 1 }
    }
}

pub(crate) struct Parser<'a> {
    text: &'a str,
    scanner: Scanner,
    registry: &'a FunctionRegistry,
    mode: BindingMode,
    variables: Vec<Variable>,
    /// Constants already referenced, one cell per name
    constants: Vec<Variable>,
    nesting: usize,
    /// Most recent unquoted name and where it started
    last_name: Option<(String, usize)>,
}

impl<'a> Parser<'a> {
    /// `variables` are the caller's bindings in fixed mode, empty otherwise
    pub fn new(
        text: &'a str,
        registry: &'a FunctionRegistry,
        mode: BindingMode,
        variables: Vec<Variable>,
    ) -> Self {
        Self {
            text,
            scanner: Scanner::new(text),
            registry,
            mode,
            variables,
            constants: Vec::new(),
            nesting: 0,
            last_name: None,
        }
    }

    /// Parse the whole text, returning the tree and the variable list
    pub fn parse(mut self) -> CompileResult<(Node, Vec<Variable>)> {
        let tree = self.parse_logical()?;
        if !self.scanner.is_done() {
            return Err(self.error(CompileErrorKind::TrailingInput(self.scanner.rest())));
        }
        Ok((tree.node, self.variables))
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    fn error(&self, kind: CompileErrorKind) -> CompileError {
        self.error_at(kind, self.scanner.position())
    }

    fn error_at(&self, kind: CompileErrorKind, position: usize) -> CompileError {
        CompileError::new(kind, self.text, position)
    }

    /// Error for the current character, `consumed` being what was already
    /// read of the token
    fn unexpected(&self, expected: &str, consumed: &str) -> CompileError {
        match self.scanner.peek() {
            None if consumed.is_empty() => self.error(CompileErrorKind::UnexpectedEnd),
            next => self.error(CompileErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("'{}{}'", consumed, next.map(String::from).unwrap_or_default()),
            }),
        }
    }

    fn expect(&mut self, c: char, expected: &str) -> CompileResult<()> {
        if self.scanner.peek() != Some(c) {
            return Err(self.unexpected(expected, ""));
        }
        self.scanner.advance(true);
        Ok(())
    }

    /// Consume `c` if it is the current character
    fn accept(&mut self, c: char) -> bool {
        if self.scanner.peek() == Some(c) {
            self.scanner.advance(true);
            true
        } else {
            false
        }
    }

    /// The ':' of a conditional is missing. When the then-branch ended in a
    /// bare name holding a ':', that name most likely swallowed it.
    fn missing_colon(&self, branch_start: usize) -> CompileError {
        match &self.last_name {
            Some((name, start)) if *start >= branch_start && name.contains(':') => {
                self.error_at(CompileErrorKind::ColonInName(name.clone()), *start)
            },
            _ => self.unexpected("':' to follow the (cond) ? ...", ""),
        }
    }

    // ========================================================================
    // Tree limits
    // ========================================================================

    /// Wrap `node` whose tallest child has height `height - 1`
    fn branch(&self, node: Node, height: usize) -> CompileResult<Subtree> {
        if height > MAX_HEIGHT {
            return Err(self.error(CompileErrorKind::TooDeep { limit: MAX_HEIGHT }));
        }
        Ok(Subtree { node, height })
    }

    fn binary(&self, op: BinaryOp, left: Subtree, right: Subtree) -> CompileResult<Subtree> {
        let height = left.height.max(right.height) + 1;
        self.branch(Node::binary(op, left.node, right.node), height)
    }

    /// Full expression one nesting level down
    fn parse_nested(&mut self) -> CompileResult<Subtree> {
        if self.nesting == MAX_NESTING {
            return Err(self.error(CompileErrorKind::TooDeep { limit: MAX_NESTING }));
        }
        self.nesting += 1;
        let tree = self.parse_logical();
        self.nesting -= 1;
        tree
    }

    // ========================================================================
    // Operator levels
    // ========================================================================

    fn parse_logical(&mut self) -> CompileResult<Subtree> {
        let mut tree = self.parse_compare()?;
        loop {
            if self.accept('&') {
                self.accept('&');
                let right = self.parse_compare()?;
                tree = self.binary(BinaryOp::And, tree, right)?;
            } else if self.accept('|') {
                self.accept('|');
                let right = self.parse_compare()?;
                tree = self.binary(BinaryOp::Or, tree, right)?;
            } else if self.accept('?') {
                let branch_start = self.scanner.position();
                let then_branch = self.parse_compare()?;
                if !self.accept(':') {
                    return Err(self.missing_colon(branch_start));
                }
                let else_branch = self.parse_nested()?;
                let height = tree.height.max(then_branch.height).max(else_branch.height) + 1;
                let node = Node::conditional(tree.node, then_branch.node, else_branch.node);
                tree = self.branch(node, height)?;
            } else {
                return Ok(tree);
            }
        }
    }

    fn parse_compare(&mut self) -> CompileResult<Subtree> {
        let mut tree = self.parse_add_sub()?;
        loop {
            let op = if self.accept('!') {
                if !self.accept('=') {
                    return Err(self.unexpected("'!='", "!"));
                }
                BinaryOp::Ne
            } else if self.accept('=') {
                if !self.accept('=') {
                    return Err(self.unexpected("'=='", "="));
                }
                BinaryOp::Eq
            } else if self.accept('>') {
                if self.accept('=') {
                    BinaryOp::Ge
                } else {
                    BinaryOp::Gt
                }
            } else if self.accept('<') {
                if self.accept('=') {
                    BinaryOp::Le
                } else {
                    BinaryOp::Lt
                }
            } else {
                return Ok(tree);
            };
            let right = self.parse_add_sub()?;
            tree = self.binary(op, tree, right)?;
        }
    }

    fn parse_add_sub(&mut self) -> CompileResult<Subtree> {
        let mut tree = self.parse_mul_div()?;
        loop {
            let op = if self.accept('+') {
                BinaryOp::Add
            } else if self.accept('-') {
                BinaryOp::Sub
            } else {
                return Ok(tree);
            };
            let right = self.parse_mul_div()?;
            tree = self.binary(op, tree, right)?;
        }
    }

    fn parse_mul_div(&mut self) -> CompileResult<Subtree> {
        let mut tree = self.parse_unary()?;
        loop {
            let op = if self.accept('^') {
                BinaryOp::Pow
            } else if self.accept('*') {
                BinaryOp::Mul
            } else if self.accept('/') {
                BinaryOp::Div
            } else {
                return Ok(tree);
            };
            let right = self.parse_unary()?;
            tree = self.binary(op, tree, right)?;
        }
    }

    fn parse_unary(&mut self) -> CompileResult<Subtree> {
        if self.accept('!') {
            let operand = self.parse_primary()?;
            let height = operand.height + 1;
            self.branch(Node::unary(UnaryOp::Not, operand.node), height)
        } else {
            self.parse_primary()
        }
    }

    // ========================================================================
    // Operands
    // ========================================================================

    fn parse_primary(&mut self) -> CompileResult<Subtree> {
        let negative = self.accept('-');
        let Some(c) = self.scanner.peek() else {
            return Err(self.error(CompileErrorKind::UnexpectedEnd));
        };

        let tree = match c {
            '(' => self.parse_braced()?,
            '\'' | '`' => {
                let start = self.scanner.position();
                let name = self.read_quoted_name(c)?;
                Subtree::leaf(self.find_variable(&name, start)?)
            },
            // A minus in front of a text constant has no effect
            '"' => return Ok(Subtree::leaf(self.read_text()?)),
            c if is_number_start(c) => {
                let value = self.read_number()?;
                let value = if negative { -value } else { value };
                return Ok(Subtree::leaf(Node::Constant(Value::number(value))));
            },
            _ => {
                let start = self.scanner.position();
                let mut name = String::new();
                while let Some(c) = self.scanner.peek().filter(|c| is_name_char(*c)) {
                    name.push(c);
                    self.scanner.advance(true);
                }
                if name.is_empty() {
                    return Err(self.unexpected("an operand", ""));
                }
                self.last_name = Some((name.clone(), start));
                if self.scanner.peek() == Some('(') {
                    self.find_function(&name, start)?
                } else {
                    Subtree::leaf(self.find_variable(&name, start)?)
                }
            },
        };

        if negative {
            let zero = Subtree::leaf(Node::Constant(Value::number(0.0)));
            self.binary(BinaryOp::Sub, zero, tree)
        } else {
            Ok(tree)
        }
    }

    fn parse_braced(&mut self) -> CompileResult<Subtree> {
        self.expect('(', "'('")?;
        let tree = self.parse_nested()?;
        self.expect(')', "closing ')'")?;
        Ok(tree)
    }

    /// Digits, '.', 'e'/'E' and a sign right after the exponent marker.
    /// Whitespace between the characters is skipped.
    fn read_number(&mut self) -> CompileResult<f64> {
        let start = self.scanner.position();
        let mut text = String::new();
        let mut last_was_e = false;
        while let Some(c) = self.scanner.peek() {
            let accepted = is_number_start(c)
                || c == 'e'
                || c == 'E'
                || (last_was_e && (c == '+' || c == '-'));
            if !accepted {
                break;
            }
            text.push(c);
            last_was_e = c == 'e' || c == 'E';
            self.scanner.advance(true);
        }
        text.parse::<f64>().map_err(|e| {
            self.error_at(
                CompileErrorKind::MalformedNumber {
                    text: text.clone(),
                    reason: e.to_string(),
                },
                start,
            )
        })
    }

    /// Double-quoted text. Backslashes are dropped and a quote right after a
    /// backslash does not end the literal.
    fn read_text(&mut self) -> CompileResult<Node> {
        let mut text = String::new();
        let mut last = '"';
        self.scanner.advance(false);
        while let Some(c) = self.scanner.peek() {
            if c == '"' && last != '\\' {
                break;
            }
            last = c;
            if c != '\\' {
                text.push(c);
            }
            self.scanner.advance(false);
        }
        if self.scanner.is_done() {
            return Err(self.error(CompileErrorKind::UnterminatedQuote(QuoteKind::String)));
        }
        self.scanner.advance(true);
        Ok(Node::Constant(Value::text(text)))
    }

    /// `'name'` or `` `name` ``, any character up to the matching quote
    fn read_quoted_name(&mut self, quote: char) -> CompileResult<String> {
        let mut name = String::new();
        self.scanner.advance(false);
        while let Some(c) = self.scanner.peek().filter(|c| *c != quote) {
            name.push(c);
            self.scanner.advance(false);
        }
        if self.scanner.is_done() {
            return Err(self.error(CompileErrorKind::UnterminatedQuote(QuoteKind::VariableName)));
        }
        self.scanner.advance(true);
        Ok(name)
    }

    // ========================================================================
    // Name resolution
    // ========================================================================

    fn find_function(&mut self, name: &str, start: usize) -> CompileResult<Subtree> {
        let args = self.parse_args()?;
        let function = self
            .registry
            .resolve(name)
            .ok_or_else(|| self.error_at(CompileErrorKind::UnknownFunction(name.to_string()), start))?;
        let arity = function.arity();
        if !arity.accepts(args.len()) {
            return Err(self.error_at(
                CompileErrorKind::ArityMismatch {
                    signature: function.signature(),
                    expected: arity,
                    found: args.len(),
                },
                start,
            ));
        }
        let height = args.iter().map(|a| a.height).max().unwrap_or(0) + 1;
        let args = args.into_iter().map(|a| a.node).collect();
        self.branch(Node::Call { function, args }, height)
    }

    fn parse_args(&mut self) -> CompileResult<Vec<Subtree>> {
        self.expect('(', "'('")?;
        let mut args = Vec::new();
        if self.accept(')') {
            return Ok(args);
        }
        loop {
            args.push(self.parse_nested()?);
            if !self.accept(',') {
                break;
            }
        }
        self.expect(')', "closing ')'")?;
        Ok(args)
    }

    fn find_variable(&mut self, name: &str, start: usize) -> CompileResult<Node> {
        if let Some(variable) = self.variables.iter().find(|v| v.name() == name) {
            return Ok(Node::Variable(variable.clone()));
        }
        if let Some(constant) = self.constants.iter().find(|v| v.name() == name) {
            return Ok(Node::Variable(constant.clone()));
        }
        if let Some((constant, value)) = CONSTANTS.iter().find(|(n, _)| *n == name) {
            let constant = Variable::with_number(*constant, *value);
            self.constants.push(constant.clone());
            return Ok(Node::Variable(constant));
        }
        if self.mode == BindingMode::AutoDetect {
            let variable = Variable::new(name);
            self.variables.push(variable.clone());
            return Ok(Node::Variable(variable));
        }
        Err(self.error_at(CompileErrorKind::UnknownVariable(name.to_string()), start))
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    fn parse(text: &str, mode: BindingMode) -> CompileResult<(Node, Vec<Variable>)> {
        Parser::new(text, &FunctionRegistry::new(), mode, Vec::new()).parse()
    }

    fn tree(text: &str) -> String {
        parse(text, BindingMode::AutoDetect).unwrap().0.to_string()
    }

    fn kind(text: &str) -> CompileErrorKind {
        parse(text, BindingMode::NoVariables).unwrap_err().kind().clone()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(tree("2+3*4"), "(2.0 + (3.0 * 4.0))");
        assert_eq!(tree("(2+3)*4"), "((2.0 + 3.0) * 4.0)");
        assert_eq!(tree("1 < 2 & 3"), "((1.0 < 2.0) && 3.0)");
        assert_eq!(tree("a - b - c"), "((a - b) - c)");
    }

    #[test]
    fn test_leading_minus() {
        assert_eq!(tree("-3.14 + 2"), "(-3.14 + 2.0)");
        assert_eq!(tree("-(1+2)"), "(0.0 - (1.0 + 2.0))");
        assert_eq!(tree("-x"), "(0.0 - x)");
        assert_eq!(tree("-\"text\""), "\"text\"");
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(tree("1e3"), "1000.0");
        assert_eq!(tree("2.5E-1"), "0.25");
        assert_eq!(tree(".5"), "0.5");
        assert_eq!(tree("1 2"), "12.0");
        assert!(matches!(kind("1.2.3"), CompileErrorKind::MalformedNumber { .. }));
    }

    #[test]
    fn test_conditional_else_takes_rest() {
        assert_eq!(tree("1 ? 2 : 3 & 4"), "(1.0 ? 2.0 : (3.0 && 4.0))");
        assert_eq!(tree("1 & 2 ? 3 : 4"), "((1.0 && 2.0) ? 3.0 : 4.0)");
    }

    #[test]
    fn test_whitespace_inside_names() {
        let (_, variables) = parse("max 2", BindingMode::AutoDetect).unwrap();
        assert_eq!(variables[0].name(), "max2");
    }

    #[test]
    fn test_text_backslashes() {
        assert_eq!(tree(r#""a\"b""#), "\"a\"b\"");
        assert_eq!(tree(r#""c:\temp""#), "\"c:temp\"");
    }

    #[test]
    fn test_quoted_names() {
        let (node, variables) = parse("'a b' + `c-d`", BindingMode::AutoDetect).unwrap();
        assert_eq!(node.to_string(), "('a b' + 'c-d')");
        assert_eq!(variables.len(), 2);
    }

    #[test]
    fn test_auto_detect_reuses_variables() {
        let (_, variables) = parse("a + b * a", BindingMode::AutoDetect).unwrap();
        let names: Vec<&str> = variables.iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_constants() {
        let (_, variables) = parse("PI * E", BindingMode::AutoDetect).unwrap();
        assert!(variables.is_empty());
        assert!(parse("PI", BindingMode::NoVariables).is_ok());
    }

    #[test]
    fn test_errors() {
        assert_eq!(kind(""), CompileErrorKind::UnexpectedEnd);
        assert_eq!(kind("-"), CompileErrorKind::UnexpectedEnd);
        assert_eq!(kind("x"), CompileErrorKind::UnknownVariable("x".into()));
        assert_eq!(kind("foo(1)"), CompileErrorKind::UnknownFunction("foo".into()));
        assert_eq!(kind("1 2 )"), CompileErrorKind::TrailingInput(")".into()));
        assert_eq!(
            kind("1 = 2"),
            CompileErrorKind::UnexpectedToken {
                expected: "'=='".into(),
                found: "'=2'".into()
            }
        );
        assert!(matches!(kind("1 !"), CompileErrorKind::UnexpectedToken { .. }));
        assert!(matches!(kind("(1"), CompileErrorKind::UnexpectedEnd));
        assert!(matches!(kind("1 ? 2"), CompileErrorKind::UnexpectedEnd));
        assert!(matches!(kind("*2"), CompileErrorKind::UnexpectedToken { .. }));
        assert_eq!(
            kind("\"open"),
            CompileErrorKind::UnterminatedQuote(QuoteKind::String)
        );
        assert_eq!(
            kind("'open"),
            CompileErrorKind::UnterminatedQuote(QuoteKind::VariableName)
        );
    }

    #[test]
    fn test_error_position() {
        let err = parse("1 + foo", BindingMode::NoVariables).unwrap_err();
        assert_eq!(err.position(), 4);
        assert_eq!(err.formula(), "1 + foo");
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |n: usize| format!("{}1{}", "(".repeat(n), ")".repeat(n));
        assert_eq!(tree(&nested(MAX_NESTING)), "1.0");
        assert_eq!(
            kind(&nested(MAX_NESTING + 1)),
            CompileErrorKind::TooDeep { limit: MAX_NESTING }
        );
        assert_eq!(
            kind(&nested(100_000)),
            CompileErrorKind::TooDeep { limit: MAX_NESTING }
        );
    }

    #[test]
    fn test_else_branch_nesting_limit() {
        let chained = |n: usize| format!("{}0", "0 ? 1 : ".repeat(n));
        assert!(parse(&chained(MAX_NESTING), BindingMode::NoVariables).is_ok());
        assert_eq!(
            kind(&chained(MAX_NESTING + 1)),
            CompileErrorKind::TooDeep { limit: MAX_NESTING }
        );
    }

    #[test]
    fn test_argument_nesting_limit() {
        let calls = |n: usize| format!("{}1{}", "max(0, ".repeat(n), ")".repeat(n));
        assert!(parse(&calls(MAX_NESTING), BindingMode::NoVariables).is_ok());
        assert_eq!(
            kind(&calls(MAX_NESTING + 1)),
            CompileErrorKind::TooDeep { limit: MAX_NESTING }
        );
    }

    #[test]
    fn test_operator_chain_height_limit() {
        // n additions give a left-leaning tree of height n + 1
        let sum = |n: usize| format!("1{}", "+1".repeat(n));
        assert!(parse(&sum(MAX_HEIGHT - 1), BindingMode::NoVariables).is_ok());
        let err = parse(&sum(MAX_HEIGHT), BindingMode::NoVariables).unwrap_err();
        assert_eq!(err.kind(), &CompileErrorKind::TooDeep { limit: MAX_HEIGHT });

        // Parentheses alone do not add height
        let grouped = format!("({})", sum(MAX_HEIGHT / 2));
        assert!(parse(&grouped, BindingMode::NoVariables).is_ok());
    }

    #[test]
    fn test_colon_swallowed_by_name() {
        let err = parse("c ? a : b", BindingMode::AutoDetect).unwrap_err();
        assert_eq!(err.kind(), &CompileErrorKind::ColonInName("a:b".into()));
        assert_eq!(err.position(), 4);

        // Quoting or parentheses end the name before the ':'
        assert!(parse("c ? 'a' : b", BindingMode::AutoDetect).is_ok());
        assert!(parse("c ? (a) : b", BindingMode::AutoDetect).is_ok());
        // A ':' name before the '?' is not blamed
        assert!(matches!(
            kind("PI:x ? 1"),
            CompileErrorKind::UnknownVariable(_)
        ));
        let err = parse("a:b ? 1", BindingMode::AutoDetect).unwrap_err();
        assert_eq!(err.kind(), &CompileErrorKind::UnexpectedEnd);
    }

    #[test]
    fn test_function_arguments() {
        assert_eq!(tree("max(1, 2, 3)"), "max(1.0, 2.0, 3.0)");
        assert!(matches!(kind("max(3)"), CompileErrorKind::ArityMismatch { found: 1, .. }));
        assert!(matches!(kind("rnd()"), CompileErrorKind::ArityMismatch { found: 0, .. }));
    }
}
