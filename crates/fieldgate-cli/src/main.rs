// crates/fieldgate-cli/src/main.rs
// ============================================================================
// Module: Fieldgate CLI Entry Point
// Description: Command dispatcher for schema compilation and validation runs.
// Purpose: Validate JSON documents from the command line with the jaq
//          expression evaluator wired in.
// Dependencies: clap, fieldgate-core, fieldgate-eval, serde_json, thiserror.
// ============================================================================

//! ## Overview
//! Two commands: `validate` compiles a schema, validates a document, and
//! prints either a human-readable error listing or the JSON outcome;
//! `check-schema` compiles only. Exit codes: 0 for a valid document, 1 for
//! an invalid one, 2 for usage, schema, or I/O failures. All output goes
//! through explicit writer helpers; inputs are untrusted and every failure
//! is rendered once at top level.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use fieldgate_core::ValidationOutcome;
use fieldgate_core::Validator;
use fieldgate_core::ValidatorOptions;
use fieldgate_core::core::ParseError;
use fieldgate_eval::JaqEvaluator;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a schema, document, or rules JSON input.
const MAX_INPUT_BYTES: u64 = 16 * 1024 * 1024;

/// Exit code for usage, schema, and I/O failures.
const EXIT_FAILURE: u8 = 2;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "fieldgate", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a JSON document against a schema.
    Validate(ValidateCommand),
    /// Compile a schema without validating anything.
    CheckSchema(CheckSchemaCommand),
}

/// Arguments for document validation.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// Path to the schema JSON file.
    #[arg(long, value_name = "PATH")]
    schema: PathBuf,
    /// Path to the document JSON file.
    #[arg(long, value_name = "PATH")]
    data: PathBuf,
    /// Path to a JSON file overriding the default suppression rule set.
    #[arg(long, value_name = "PATH")]
    rules: Option<PathBuf>,
    /// Leaf-error budget before descent stops.
    #[arg(long, value_name = "N")]
    max_errors: Option<usize>,
    /// Output format for the validation outcome.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Print the final document (with derived values) after the outcome.
    #[arg(long)]
    print_document: bool,
}

/// Arguments for schema compilation.
#[derive(Args, Debug)]
struct CheckSchemaCommand {
    /// Path to the schema JSON file.
    #[arg(long, value_name = "PATH")]
    schema: PathBuf,
    /// Path to a JSON file overriding the default suppression rule set.
    #[arg(long, value_name = "PATH")]
    rules: Option<PathBuf>,
}

/// Output formats for validation outcomes.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum OutputFormat {
    /// One line per failing path.
    Text,
    /// The full outcome as a JSON object.
    Json,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Top-level CLI failures, all mapped to exit code 2.
#[derive(Debug, Error)]
enum CliError {
    /// An input file could not be read.
    #[error("cannot read {path}: {detail}")]
    Read {
        /// The offending path.
        path: String,
        /// The underlying I/O failure.
        detail: String,
    },
    /// An input file did not hold valid JSON.
    #[error("invalid JSON in {path}: {detail}")]
    Json {
        /// The offending path.
        path: String,
        /// The underlying parse failure.
        detail: String,
    },
    /// An input file exceeded the size limit.
    #[error("{path} exceeds the {limit}-byte input limit")]
    TooLarge {
        /// The offending path.
        path: String,
        /// The enforced limit.
        limit: u64,
    },
    /// The schema or rule set failed to compile.
    #[error("schema error: {0}")]
    Schema(#[from] ParseError),
    /// Writing to stdout failed.
    #[error("cannot write to stdout: {0}")]
    Output(String),
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Validate(command) => command_validate(&command),
        Commands::CheckSchema(command) => command_check_schema(&command),
    }
}

// ============================================================================
// SECTION: Validate Command
// ============================================================================

/// Executes the `validate` command.
fn command_validate(command: &ValidateCommand) -> CliResult<ExitCode> {
    let schema = read_json(&command.schema)?;
    let mut document = read_json(&command.data)?;
    let validator = build_validator(&schema, command.rules.as_deref(), command.max_errors)?;
    let outcome = validator.validate(&mut document);
    match command.format {
        OutputFormat::Text => print_text_outcome(&outcome)?,
        OutputFormat::Json => print_json_outcome(&outcome)?,
    }
    if command.print_document {
        let rendered = serde_json::to_string_pretty(&document)
            .map_err(|err| CliError::Output(err.to_string()))?;
        write_stdout_line(&rendered)?;
    }
    if outcome.valid {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Executes the `check-schema` command.
fn command_check_schema(command: &CheckSchemaCommand) -> CliResult<ExitCode> {
    let schema = read_json(&command.schema)?;
    let _validator = build_validator(&schema, command.rules.as_deref(), None)?;
    write_stdout_line("schema ok")?;
    Ok(ExitCode::SUCCESS)
}

/// Builds a validator with the jaq evaluator and optional overrides.
fn build_validator(
    schema: &Value,
    rules: Option<&Path>,
    max_errors: Option<usize>,
) -> CliResult<Validator> {
    let mut options = ValidatorOptions::new().with_evaluator(Arc::new(JaqEvaluator::new()));
    if let Some(path) = rules {
        options = options.with_default_rules(read_json(path)?);
    }
    if let Some(budget) = max_errors {
        options = options.with_max_errors(budget);
    }
    Ok(Validator::new(schema, options)?)
}

// ============================================================================
// SECTION: Outcome Rendering
// ============================================================================

/// Prints the human-readable outcome: a verdict line, one line per leaf
/// failure, and tag observations.
fn print_text_outcome(outcome: &ValidationOutcome) -> CliResult<()> {
    if outcome.valid {
        write_stdout_line("valid")?;
    } else {
        write_stdout_line("invalid")?;
        for (pointer, errors) in outcome.errors.leaf_errors() {
            let location = if pointer.is_empty() { "(root)" } else { pointer.as_str() };
            for error in errors {
                write_stdout_line(&format!("  {location}: [{}] {}", error.keyword, error.message))?;
            }
        }
    }
    for (tag, entries) in &outcome.tags {
        for entry in entries {
            let pointer = entry.path.canonical();
            let location = if pointer.is_empty() { "(root)".to_string() } else { pointer };
            write_stdout_line(&format!("  tag {tag}: {location}"))?;
        }
    }
    if outcome.truncated {
        write_stdout_line("  (error budget reached; listing is incomplete)")?;
    }
    Ok(())
}

/// Prints the outcome as one JSON object.
fn print_json_outcome(outcome: &ValidationOutcome) -> CliResult<()> {
    let errors: BTreeMap<&String, &Vec<fieldgate_core::ValidationError>> =
        outcome.errors.errors().iter().collect();
    let rendered = serde_json::to_string_pretty(&json!({
        "valid": outcome.valid,
        "error": outcome.error,
        "errors": errors,
        "tags": outcome.tags,
        "truncated": outcome.truncated,
    }))
    .map_err(|err| CliError::Output(err.to_string()))?;
    write_stdout_line(&rendered)
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Reads and parses one JSON input file under the size limit.
fn read_json(path: &Path) -> CliResult<Value> {
    let display = path.display().to_string();
    let metadata = fs::metadata(path).map_err(|err| CliError::Read {
        path: display.clone(),
        detail: err.to_string(),
    })?;
    if metadata.len() > MAX_INPUT_BYTES {
        return Err(CliError::TooLarge {
            path: display,
            limit: MAX_INPUT_BYTES,
        });
    }
    let bytes = fs::read(path).map_err(|err| CliError::Read {
        path: display.clone(),
        detail: err.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|err| CliError::Json {
        path: display,
        detail: err.to_string(),
    })
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::Output(err.to_string()))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns the failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::from(EXIT_FAILURE)
}
