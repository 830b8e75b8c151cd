use anyhow::Context;
use clap::{Parser, ValueEnum};
use csvcmp_common::{load_config, load_config_from, CompareOutcome, StrategyKind, TokenizerMode};
use csvcmp_core::{unescape_separator, Comparator, SAME_VALUES_MESSAGE};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

/// Exit status for a completed comparison that found a difference (`--exit-code`)
const EXIT_DIFFERENT: u8 = 2;

#[derive(Parser)]
#[command(name = "csvcmp")]
#[command(author = "csvcmp Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Compare two delimited files, treating equal numbers as equal", long_about = None)]
struct Cli {
    /// First file
    #[arg(value_name = "FILE1")]
    left: PathBuf,

    /// Second file
    #[arg(value_name = "FILE2")]
    right: PathBuf,

    /// Delimiter between fields; backslash escapes such as \t are interpreted
    #[arg(short, long)]
    delimiter: Option<String>,

    /// Numeric matching strategy
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Relative tolerance for the relative strategy
    #[arg(short, long)]
    tolerance: Option<f64>,

    /// Split lines on the delimiter without interpreting quotes
    #[arg(long)]
    naive: bool,

    /// Output the result as JSON
    #[arg(long)]
    json: bool,

    /// Exit with status 2 when the files differ
    #[arg(long)]
    exit_code: bool,

    /// Configuration file (defaults to csvcmp.toml in the config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Equal within the precision of the less precise literal
    SigFigs,
    /// Equal within a fixed relative tolerance
    Relative,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::SigFigs => StrategyKind::SigFigs,
            StrategyArg::Relative => StrategyKind::Relative,
        }
    }
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout only carries the report
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn"))
        )
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(outcome) => {
            if cli.exit_code && !outcome.is_equal() {
                ExitCode::from(EXIT_DIFFERENT)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("Comparison failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<CompareOutcome> {
    let loaded = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    debug!(path = %loaded.path.display(), exists = loaded.exists, "loaded config");
    let mut config = loaded.config;

    if let Some(delimiter) = &cli.delimiter {
        config.delimiter = delimiter.clone();
    }
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy.into();
    }
    if let Some(tolerance) = cli.tolerance {
        config.tolerance = tolerance;
    }
    if cli.naive {
        config.tokenizer = TokenizerMode::Naive;
    }

    let separator = unescape_separator(&config.delimiter)?;
    if config.tokenizer == TokenizerMode::Quoted && separator.len() != 1 {
        warn!(
            "Delimiter {:?} is not a single byte; splitting without quote handling",
            separator
        );
        config.tokenizer = TokenizerMode::Naive;
    }

    let comparator = Comparator::from_config(&config)?;

    let outcome = comparator
        .compare_files(&cli.left, &cli.right)
        .with_context(|| {
            format!(
                "Failed to compare {} and {}",
                cli.left.display(),
                cli.right.display()
            )
        })?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        match &outcome {
            CompareOutcome::Equal => println!("{SAME_VALUES_MESSAGE}"),
            CompareOutcome::Unequal(msg) => println!("{msg}"),
        }
    }

    Ok(outcome)
}
