use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser as ClapParser, Subcommand};
use quarry::ExecutionLimits;
use quarry::cli::{self, CliError, ExplainOptions, RunOptions};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "quarry")]
#[command(about = "Quarry - build, explain and run composable query models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a JSON model description as query text
    Explain {
        /// Path to the JSON model description
        model: PathBuf,

        /// List result operators with their execution strategies
        #[arg(long)]
        strategies: bool,
    },

    /// Run a JSON model description in memory
    Run {
        /// Path to the JSON model description
        model: PathBuf,

        /// JSON input: an object of named arrays (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Maximum items a single source may produce
        #[arg(long)]
        max_source_items: Option<usize>,

        /// Maximum intermediate rows
        #[arg(long)]
        max_rows: Option<usize>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Explain { model, strategies } => run_explain(model, strategies),
        Commands::Run {
            model,
            input,
            pretty,
            max_source_items,
            max_rows,
        } => {
            let mut limits = ExecutionLimits::default();
            if let Some(max) = max_source_items {
                limits.max_source_items = max;
            }
            if let Some(max) = max_rows {
                limits.max_rows = max;
            }
            run_model(model, input, pretty, limits)
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_explain(model: PathBuf, strategies: bool) -> Result<(), CliError> {
    let options = ExplainOptions {
        model: fs::read_to_string(model)?,
        strategies,
    };
    println!("{}", cli::execute_explain(&options)?);
    Ok(())
}

fn run_model(
    model: PathBuf,
    input: Option<String>,
    pretty: bool,
    limits: ExecutionLimits,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = RunOptions {
        model: fs::read_to_string(model)?,
        input,
        limits,
    };

    let output = cli::execute_run(&options)?;
    let json = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", json);
    Ok(())
}
