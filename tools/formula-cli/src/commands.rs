//! Subcommand implementations

use std::str::FromStr;

use anyhow::{Context, Result};
use colored::*;
use tracing::warn;
use voltage_formula::{AlarmSeverity, Compiler, Formula, FunctionRegistry, Value};

/// `name=value` from the command line
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub value: Value,
}

impl FromStr for Binding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, raw) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing variable name in '{}'", s));
        }
        let value = match raw.trim().parse::<f64>() {
            Ok(number) => Value::number(number),
            Err(_) => Value::text(raw),
        };
        Ok(Self {
            name: name.to_string(),
            value,
        })
    }
}

fn compile(registry: &FunctionRegistry, text: &str) -> Result<Formula> {
    Compiler::new(registry)
        .compile_autodetect(text)
        .with_context(|| format!("Cannot compile '{}'", text))
}

/// Bind the given values; returns the names that stayed unbound
fn bind(formula: &Formula, bindings: &[Binding]) -> Vec<String> {
    for binding in bindings {
        match formula.variable(&binding.name) {
            Some(variable) => variable.set(binding.value.clone()),
            None => warn!(variable = %binding.name, "Formula does not use this variable"),
        }
    }
    formula
        .variables()
        .iter()
        .filter(|v| !bindings.iter().any(|b| b.name == v.name()))
        .map(|v| v.name().to_string())
        .collect()
}

fn severity_label(severity: AlarmSeverity) -> ColoredString {
    match severity {
        AlarmSeverity::None => severity.as_str().green(),
        AlarmSeverity::Minor => severity.as_str().yellow(),
        AlarmSeverity::Major => severity.as_str().red(),
        AlarmSeverity::Invalid | AlarmSeverity::Disconnected => severity.as_str().magenta(),
    }
}

pub fn eval(registry: &FunctionRegistry, text: &str, bindings: &[Binding], json: bool) -> Result<()> {
    let formula = compile(registry, text)?;
    let unbound = bind(&formula, bindings);
    let value = formula.eval().context("Evaluation failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{} {}", "Formula:".bright_cyan(), formula);
    for name in &unbound {
        println!("{} {} is unbound (NaN)", "WARN".yellow(), name);
    }
    println!("{} {}", "Result:".bright_cyan(), value.to_text().bold());
    println!(
        "{} {} {}",
        "Alarm:".bright_cyan(),
        severity_label(value.alarm.severity),
        value.alarm.status
    );
    println!("{} {}", "Time:".bright_cyan(), value.time);
    Ok(())
}

pub fn vars(registry: &FunctionRegistry, text: &str) -> Result<()> {
    let formula = compile(registry, text)?;
    if formula.variables().is_empty() {
        println!("{}", "No variables".dimmed());
        return Ok(());
    }
    for variable in formula.variables() {
        println!("{}", variable.name());
    }
    Ok(())
}

pub fn functions(registry: &FunctionRegistry, category: Option<&str>) {
    let functions = registry.functions();
    let selected = functions
        .iter()
        .filter(|f| category.is_none_or(|c| f.category() == c));
    let mut count = 0;
    for function in selected {
        println!(
            "{:<32} {:<12} {}",
            function.signature().bold(),
            function.category().dimmed(),
            function.description()
        );
        count += 1;
    }
    if count == 0 {
        println!("{}", "No functions".dimmed());
    }
}
