//! Interactive calculator loop
//!
//! Every line is either a command or an expression. Commands never reach the
//! evaluator; expression errors are printed and the session continues.

use crate::config::CalcConfig;
use anyhow::{Context, Result};
use calc_core::{CalcError, Calculator, Environment, Number};
use colored::*;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Editor, Helper};
use std::fmt;
use tracing::{debug, warn};

const COMMANDS: [&str; 5] = [
    "help",
    "list_functions",
    "list_constants",
    "list_operators",
    "exit",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Help,
    ListFunctions,
    ListConstants,
    ListOperators,
    Exit,
    Evaluate(&'a str),
}

impl<'a> Command<'a> {
    /// Classify a trimmed, non-empty input line
    pub fn parse(line: &'a str) -> Self {
        match line {
            "help" => Command::Help,
            "list_functions" => Command::ListFunctions,
            "list_constants" => Command::ListConstants,
            "list_operators" => Command::ListOperators,
            "exit" => Command::Exit,
            expression => Command::Evaluate(expression),
        }
    }
}

/// Outcome of evaluating one expression line
#[derive(Debug)]
pub enum Response {
    Value(Number),
    Error(CalcError),
}

impl Response {
    pub fn evaluate(calc: &Calculator, expression: &str) -> Self {
        match calc.evaluate(expression) {
            Ok(value) => Response::Value(value),
            Err(err) => Response::Error(err),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }

    /// Print with color, errors included, to stdout
    pub fn print(&self) {
        match self {
            Response::Value(value) => println!("{} {}", "=>".bright_green(), value),
            Response::Error(err) => println!("{} {}", "ERROR:".red().bold(), err),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Value(value) => write!(f, "=> {}", value),
            Response::Error(err) => write!(f, "ERROR: {}", err),
        }
    }
}

// ============================================================================
// Tab Completion Helper
// ============================================================================

/// REPL helper providing Tab completion for commands, functions and constants
struct CalcHelper {
    names: Vec<String>,
}

impl CalcHelper {
    fn new(env: &Environment) -> Self {
        let mut names: Vec<String> = COMMANDS.iter().map(|c| c.to_string()).collect();
        names.extend(env.functions().map(|(name, _)| name.to_string()));
        names.extend(env.constants().map(|(name, _)| name.to_string()));
        names.sort();
        names.dedup();
        Self { names }
    }

    /// Candidates for the identifier ending at `pos`
    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<Pair>) {
        let line = &line[..pos];
        let start = line
            .char_indices()
            .rev()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
            .map_or(0, |(i, c)| i + c.len_utf8());
        let prefix = &line[start..];
        if prefix.is_empty() {
            return (pos, vec![]);
        }

        let matches = self
            .names
            .iter()
            .filter(|name| name.starts_with(prefix))
            .map(|name| Pair {
                display: name.clone(),
                replacement: name.clone(),
            })
            .collect();
        (start, matches)
    }
}

impl Helper for CalcHelper {}

impl Hinter for CalcHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for CalcHelper {}

impl Validator for CalcHelper {}

impl Completer for CalcHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.candidates(line, pos))
    }
}

// ============================================================================
// Listings
// ============================================================================

pub fn function_listing(env: &Environment) -> Vec<String> {
    env.functions()
        .map(|(name, function)| {
            let plural = if function.arity == 1 { "" } else { "s" };
            format!("{:<8} {} argument{}", name, function.arity, plural)
        })
        .collect()
}

pub fn constant_listing(env: &Environment) -> Vec<String> {
    env.constants()
        .map(|(name, value)| format!("{:<8} {}", name, value))
        .collect()
}

pub fn operator_listing(env: &Environment) -> Vec<String> {
    let binary = env.binary_operators().map(|(name, op)| {
        format!(
            "{:<3} binary  precedence {}  {} associative",
            name, op.binding.precedence, op.binding.associativity
        )
    });
    let unary = env.unary_operators().map(|(name, op)| {
        format!(
            "{:<3} unary   precedence {}  {} associative",
            name, op.binding.precedence, op.binding.associativity
        )
    });
    binary.chain(unary).collect()
}

fn print_listing(title: &str, lines: Vec<String>) {
    println!("{}", format!("=== {} ===", title).bright_cyan());
    for line in lines {
        println!("  {}", line);
    }
}

fn print_help() {
    println!("{}", "=== Available Commands ===".bright_cyan());
    println!();
    println!("  {}            Show this help message", "help".bright_yellow());
    println!(
        "  {}  List functions and their arity",
        "list_functions".bright_yellow()
    );
    println!(
        "  {}  List named constants",
        "list_constants".bright_yellow()
    );
    println!(
        "  {}  List operators with precedence",
        "list_operators".bright_yellow()
    );
    println!(
        "  {}            Leave the calculator (also Ctrl-C, Ctrl-D)",
        "exit".bright_yellow()
    );
    println!();
    println!("{}", "=== Examples ===".bright_cyan());
    println!();
    println!("  1 + 2 * 3               => 7");
    println!("  2 ^ 3 ^ 2               => 512");
    println!("  atan2(sin(1), tan(2))");
    println!("  -7 % 3                  => 2");
}

/// Execute one input line; returns false once the session should end
fn execute(calc: &Calculator, line: &str) -> bool {
    match Command::parse(line) {
        Command::Help => print_help(),
        Command::ListFunctions => print_listing("Functions", function_listing(calc.environment())),
        Command::ListConstants => print_listing("Constants", constant_listing(calc.environment())),
        Command::ListOperators => print_listing("Operators", operator_listing(calc.environment())),
        Command::Exit => return false,
        Command::Evaluate(expression) => Response::evaluate(calc, expression).print(),
    }
    true
}

/// Interactive REPL loop
pub fn run(calc: &Calculator, config: &CalcConfig) -> Result<()> {
    let editor_config = rustyline::Config::builder()
        .completion_type(rustyline::CompletionType::List)
        .max_history_size(config.max_history)
        .context("Invalid history size")?
        .auto_add_history(false)
        .build();
    let mut rl = Editor::with_config(editor_config).context("Failed to initialize readline")?;
    rl.set_helper(Some(CalcHelper::new(calc.environment())));

    if let Some(path) = &config.history_file {
        // A missing history file is normal on first start
        if let Err(e) = rl.load_history(path) {
            debug!(path = %path.display(), error = %e, "no history loaded");
        }
    }

    if config.banner {
        println!("{}", "calc - arithmetic expression calculator".bright_cyan().bold());
        println!(
            "Type '{}' for commands, {} for completion\n",
            "help".bright_yellow(),
            "Tab".bright_cyan()
        );
    }

    loop {
        match rl.readline(&config.prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                // Add to history (ignore errors)
                let _ = rl.add_history_entry(line);

                if !execute(calc, line) {
                    break;
                }
            },
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{} {}", "Readline error:".red(), e);
                break;
            },
        }
    }

    if let Some(path) = &config.history_file {
        if let Err(e) = rl.save_history(path) {
            warn!(path = %path.display(), error = %e, "failed to save history");
        }
    }

    println!("Bye!");
    Ok(())
}
