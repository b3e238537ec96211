//! vformula - Evaluate and inspect VoltageEMS formulas from the command line

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use voltage_formula::{load_config, load_config_from_file, FormulaConfig, FunctionRegistry};

use crate::commands::Binding;

#[derive(Parser)]
#[command(name = "vformula")]
#[command(about = "VoltageEMS formula tool")]
#[command(long_about = "VoltageEMS formula tool

Commands:
  eval        Compile a formula, bind values and print the result
  vars        List the variables a formula reads
  functions   List the callable functions

Examples:
  vformula eval \"2 + 3 * 4\"
  vformula eval \"P * efficiency\" --var P=1000 --var efficiency=0.95
  vformula vars \"'Tank:Level' > 80 ? 1 : 0\"
  vformula functions --category math")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file (default: config/formula.{toml,yaml,json} and FORMULA_* variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a formula, bind values and print the result
    Eval {
        /// Formula text
        formula: String,

        /// Variable value as name=value (numbers, anything else is text)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<Binding>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the variables a formula reads
    Vars {
        /// Formula text
        formula: String,
    },

    /// List the callable functions
    Functions {
        /// Only functions of this category
        #[arg(long)]
        category: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configure colored output
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Initialize logging, RUST_LOG wins over --verbose
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config: FormulaConfig = match cli.config.as_deref() {
        Some(path) => load_config_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => load_config().context("Failed to load configuration")?,
    };
    let registry = FunctionRegistry::from_config(&config.functions);

    match cli.command {
        Commands::Eval {
            formula,
            vars,
            json,
        } => commands::eval(&registry, &formula, &vars, json),
        Commands::Vars { formula } => commands::vars(&registry, &formula),
        Commands::Functions { category } => {
            commands::functions(&registry, category.as_deref());
            Ok(())
        },
    }
}
