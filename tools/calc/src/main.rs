//! calc - interactive arithmetic calculator
//!
//! Starts a REPL by default; `--eval` evaluates the given expressions and
//! exits.

mod config;
mod logging;
mod repl;

use anyhow::Result;
use calc_core::Calculator;
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "calc")]
#[command(about = "Arithmetic expression calculator")]
#[command(long_about = "Arithmetic expression calculator

Operators:  + - * / % ^ and unary -
Functions:  sin cos tan atan2 log sqrt ... (see list_functions)
Constants:  pi e tau

Examples:
  calc                          # Interactive session
  calc -e '2 ^ 3 ^ 2'           # Evaluate and exit
  calc -e '1 + 1' -e 'sin(pi)'  # Several expressions")]
#[command(version)]
struct Cli {
    /// Evaluate an expression and exit (repeatable)
    #[arg(short, long = "eval", value_name = "EXPR")]
    eval: Vec<String>,

    /// Configuration file (TOML, YAML or JSON; default: ./calc.toml if present)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

/// Evaluate each expression, printing results; returns the failure count
fn evaluate_all(calc: &Calculator, expressions: &[String]) -> usize {
    let mut failures = 0;
    for expression in expressions {
        let response = repl::Response::evaluate(calc, expression);
        response.print();
        if response.is_error() {
            failures += 1;
        }
    }
    failures
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::load(cli.config.as_deref())?;
    if cli.no_color {
        config.color = false;
    }

    // Configure colored output
    if !config.color {
        colored::control::set_override(false);
    }

    logging::init(&config.log_level, cli.verbose, config.color)?;
    debug!(?config, "configuration loaded");

    let calc = Calculator::new();

    if !cli.eval.is_empty() {
        let failures = evaluate_all(&calc, &cli.eval);
        if failures > 0 {
            eprintln!(
                "{} {} of {} expressions failed",
                "Error:".red(),
                failures,
                cli.eval.len()
            );
            std::process::exit(1);
        }
        return Ok(());
    }

    repl::run(&calc, &config)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_repeated_eval_flags() {
        let cli = Cli::parse_from(["calc", "-e", "1+1", "--eval", "2*3", "--no-color"]);
        assert_eq!(cli.eval, vec!["1+1", "2*3"]);
        assert!(cli.no_color);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_evaluate_all_counts_failures() {
        let calc = Calculator::new();
        let expressions = vec!["1 + 1".to_string(), "1/0".to_string(), "2 $".to_string()];
        assert_eq!(evaluate_all(&calc, &expressions), 2);
    }
}
