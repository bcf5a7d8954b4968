//! Sheetlex - spreadsheet formula tokenizer and sheet checker

mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use sheetlex_core::Document;
use sheetlex_engine::engine::{
    collapse_cell_addresses, extract_dependencies, offset_formula_references,
};
use sheetlex_engine::tokenizer::{self, TokenizerOptions};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "sheetlex", version, about = "Tokenize, check and rewrite spreadsheet formulas.")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Read settings from this file instead of the default config.toml.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Ignore config files.
    #[arg(long, global = true, conflicts_with = "config")]
    no_config: bool,

    /// Keep whitespace runs as WHITESPACE tokens.
    #[arg(long, global = true)]
    preserve_whitespace: bool,

    /// Maximum nesting of parentheses, functions and arrays.
    #[arg(long, value_name = "N", global = true)]
    max_depth: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tokens of a formula, one per line.
    Tokenize {
        #[arg(allow_hyphen_values = true)]
        formula: String,
        /// Print the tokens as a JSON array.
        #[arg(long)]
        json: bool,
    },
    /// Tokenize and render a formula; fails if the text changes.
    Roundtrip {
        #[arg(allow_hyphen_values = true)]
        formula: String,
    },
    /// List the cells a formula refers to.
    Deps {
        #[arg(allow_hyphen_values = true)]
        formula: String,
        /// Print contiguous column runs as ranges on one line.
        #[arg(long)]
        collapse: bool,
    },
    /// Move the relative references of a formula.
    Translate {
        #[arg(allow_hyphen_values = true)]
        formula: String,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        cols: isize,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        rows: isize,
    },
    /// Report formulas in a .grd or .csv sheet that do not tokenize.
    Check {
        file: PathBuf,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = if cli.no_config {
        Config::default()
    } else {
        config::load_config(cli.config.as_deref())?
    };
    init_tracing(cli.verbose, config.log_level.as_deref());

    let mut options = config.tokenizer_options();
    options.preserve_whitespace |= cli.preserve_whitespace;
    if let Some(depth) = cli.max_depth {
        options.max_depth = depth;
    }
    tracing::debug!(?options, "resolved tokenizer options");

    match cli.command {
        Command::Tokenize { formula, json } => {
            let tokens = tokenizer::tokenize_with(&formula, options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tokens)?);
            } else {
                for token in &tokens {
                    println!("{}", token);
                }
            }
        }
        Command::Roundtrip { formula } => {
            let rendered = tokenizer::render(&tokenizer::tokenize_with(&formula, options)?);
            println!("{}", rendered);
            if rendered != formula {
                eprintln!("Rendered formula differs from input");
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Deps { formula, collapse } => {
            let cells = extract_dependencies(&tokenizer::tokenize_with(&formula, options)?);
            if collapse {
                println!("{}", collapse_cell_addresses(&cells, &[]));
            } else {
                for cell in &cells {
                    println!("{}", cell);
                }
            }
        }
        Command::Translate {
            formula,
            cols,
            rows,
        } => {
            println!("{}", offset_formula_references(&formula, cols, rows, options)?);
        }
        Command::Check { file, json } => return check(&file, json, options),
    }
    Ok(ExitCode::SUCCESS)
}

fn check(path: &std::path::Path, json: bool, options: TokenizerOptions) -> Result<ExitCode> {
    let mut doc = Document::new(options);
    doc.load_file(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    let invalid = doc.invalid_cells();

    if json {
        let report: Vec<serde_json::Value> = invalid
            .iter()
            .map(|(cell, error)| {
                serde_json::json!({
                    "cell": cell.to_string(),
                    "error": error.kind.to_string(),
                    "offset": error.offset,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (cell, error) in &invalid {
            println!("{}: {}", cell, error);
        }
        if invalid.is_empty() {
            println!("{}: {} cells, all formulas tokenize", path.display(), doc.grid.len());
        }
    }

    Ok(if invalid.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing(verbose: u8, config_level: Option<&str>) {
    let default_level = match verbose {
        0 => config_level.unwrap_or("warn"),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
