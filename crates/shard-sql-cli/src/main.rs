//! shard-sql CLI
//!
//! Parses SQL files (or stdin) and prints canonical SQL, JSON, parse trees or
//! tokens. Logs go to stderr; stdout carries only results.

use std::io::Read;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use shard_sql_core::{parse_batch, tokenize, Dialect, GenericDialect, ParserOptions, ScriptOutcome};
use shard_sql_sqlserver::{registry, run_cases, split_batches, Case, SqlServerDialect};

/// Dialect-aware SQL parser.
#[derive(Parser)]
#[command(name = "shard-sql")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQL dialect.
    #[arg(short, long, env = "SHARD_SQL_DIALECT", value_enum, default_value_t = DialectName::Sqlserver)]
    dialect: DialectName,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DialectName {
    Sqlserver,
    Generic,
}

impl DialectName {
    fn dialect(self) -> &'static dyn Dialect {
        match self {
            Self::Sqlserver => &SqlServerDialect,
            Self::Generic => &GenericDialect,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Canonical SQL, one statement per line.
    Sql,
    /// Per-statement outcomes as JSON.
    Json,
    /// Indented parse trees.
    Tree,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse SQL files, or stdin when no file is given.
    Parse {
        files: Vec<PathBuf>,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = Format::Sql)]
        format: Format,

        /// Keep parsing past errors.
        #[arg(short, long)]
        recover: bool,

        /// Maximum nesting depth.
        #[arg(long)]
        max_depth: Option<usize>,

        /// Tokens that speculative parsing may consume per statement.
        #[arg(long)]
        lookahead_budget: Option<usize>,

        /// Error records kept per input before giving up.
        #[arg(long)]
        max_errors: Option<usize>,

        /// Worker threads (defaults to the number of CPUs).
        #[arg(short, long)]
        jobs: Option<usize>,

        /// JSON file with parser options; flags override its values.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the tokens of a file, or of stdin.
    Tokens {
        file: Option<PathBuf>,

        /// Print tokens as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run the built-in SQL Server regression cases.
    Cases {
        /// Only run cases whose id starts with this prefix.
        #[arg(short, long)]
        filter: Option<String>,

        /// Worker threads (defaults to the number of CPUs).
        #[arg(short, long)]
        jobs: Option<usize>,
    },
}

/// One unit of work: a whole input, or one `GO` batch of it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Unit {
    source: String,
    /// 1-based line of the unit in its source.
    line: usize,
    text: String,
}

#[derive(Serialize)]
struct UnitReport<'a> {
    source: &'a str,
    line: usize,
    #[serde(flatten)]
    outcome: &'a ScriptOutcome,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let dialect = cli.dialect.dialect();
    match cli.command {
        Commands::Parse {
            files,
            format,
            recover,
            max_depth,
            lookahead_budget,
            max_errors,
            jobs,
            config,
        } => {
            let mut options = match &config {
                Some(path) => load_options(path)?,
                None => ParserOptions::default(),
            };
            apply_overrides(&mut options, recover, max_depth, lookahead_budget, max_errors);
            debug!(?options, dialect = dialect.name(), "parser options");

            let units = read_units(&files, cli.dialect)?;
            let clean = parse_units(&units, dialect, &options, worker_count(jobs), format)?;
            Ok(exit_code(clean))
        }

        Commands::Tokens { file, json } => {
            let sql = match &file {
                Some(path) => read_file(path)?,
                None => read_stdin()?,
            };
            let tokens = tokenize(&sql, dialect)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tokens)?);
            } else {
                for token in &tokens {
                    println!("{}:{}\t{:?}\t{}", token.line, token.column, token.kind, token.lexeme);
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Cases { filter, jobs } => {
            let selected: Vec<Case> = registry()?
                .iter()
                .filter(|case| filter.as_deref().is_none_or(|prefix| case.id.starts_with(prefix)))
                .copied()
                .collect();
            let reports = run_cases(&selected, worker_count(jobs));
            let mut failed = 0usize;
            for report in &reports {
                match &report.failure {
                    None => println!("ok   {}", report.id),
                    Some(failure) => {
                        failed += 1;
                        println!("FAIL {}: {failure}", report.id);
                    }
                }
            }
            info!("{} passed, {failed} failed", reports.len() - failed);
            Ok(exit_code(failed == 0))
        }
    }
}

fn load_options(path: &Path) -> anyhow::Result<ParserOptions> {
    let text = read_file(path)?;
    serde_json::from_str(&text).with_context(|| format!("invalid parser options in {}", path.display()))
}

/// Flags win over whatever the config file said.
fn apply_overrides(
    options: &mut ParserOptions,
    recover: bool,
    max_depth: Option<usize>,
    lookahead_budget: Option<usize>,
    max_errors: Option<usize>,
) {
    if recover {
        options.recover = true;
    }
    if let Some(depth) = max_depth {
        options.max_depth = depth;
    }
    if let Some(budget) = lookahead_budget {
        options.lookahead_budget = budget;
    }
    if let Some(errors) = max_errors {
        options.max_errors = errors;
    }
}

fn worker_count(jobs: Option<usize>) -> usize {
    jobs.unwrap_or_else(|| std::thread::available_parallelism().map_or(1, NonZeroUsize::get))
}

const fn exit_code(clean: bool) -> ExitCode {
    if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_stdin() -> anyhow::Result<String> {
    let mut sql = String::new();
    std::io::stdin()
        .read_to_string(&mut sql)
        .context("failed to read stdin")?;
    Ok(sql)
}

fn read_units(files: &[PathBuf], dialect: DialectName) -> anyhow::Result<Vec<Unit>> {
    let mut units = Vec::new();
    if files.is_empty() {
        units.extend(split_units("<stdin>", &read_stdin()?, dialect));
    }
    for path in files {
        let text = read_file(path)?;
        units.extend(split_units(&path.display().to_string(), &text, dialect));
    }
    Ok(units)
}

/// SQL Server scripts are cut on `GO` lines; other dialects parse whole.
fn split_units(source: &str, text: &str, dialect: DialectName) -> Vec<Unit> {
    match dialect {
        DialectName::Sqlserver => split_batches(text)
            .into_iter()
            .map(|batch| Unit {
                source: source.to_string(),
                line: batch.line,
                text: batch.text.to_string(),
            })
            .collect(),
        DialectName::Generic => vec![Unit {
            source: source.to_string(),
            line: 1,
            text: text.to_string(),
        }],
    }
}

/// Parses every unit and prints the results. Returns true when all of them
/// parsed cleanly.
fn parse_units(
    units: &[Unit],
    dialect: &dyn Dialect,
    options: &ParserOptions,
    workers: usize,
    format: Format,
) -> anyhow::Result<bool> {
    let texts: Vec<&str> = units.iter().map(|unit| unit.text.as_str()).collect();
    let results = parse_batch(&texts, dialect, options, workers, None);

    if format == Format::Json {
        let reports: Vec<UnitReport<'_>> = units
            .iter()
            .zip(&results)
            .map(|(unit, result)| UnitReport {
                source: &unit.source,
                line: unit.line,
                outcome: &result.outcome,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    let mut clean = true;
    for (unit, result) in units.iter().zip(&results) {
        let outcome = &result.outcome;
        clean &= outcome.is_clean();
        for error in &outcome.lexical_errors {
            eprintln!("{}:{}:{}: {error}", unit.source, unit.line - 1 + error.line as usize, error.column);
        }
        for statement in &outcome.statements {
            for record in &statement.errors {
                eprintln!(
                    "{}:{}:{}: {}",
                    unit.source,
                    unit.line - 1 + record.line as usize,
                    record.column,
                    record.error
                );
            }
            if let Some(error) = &statement.build_error {
                eprintln!("{}:{}: {error}", unit.source, unit.line);
            }
            match format {
                Format::Sql => {
                    if let Some(ast) = &statement.statement {
                        println!("{ast};");
                    }
                }
                Format::Tree => println!("{}", statement.tree),
                Format::Json => {}
            }
        }
    }
    info!(units = units.len(), clean, "done");
    Ok(clean)
}
