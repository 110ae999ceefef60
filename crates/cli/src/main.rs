// concilia - bank statement reconciliation from the command line

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use rust_decimal::Decimal;

use concilia_recon::Mode;
use exit_codes::{recon_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "concilia")]
#[command(about = "Reconcile payables and receivables against a bank statement")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile ledger tables against a bank statement
    #[command(after_help = "\
Examples:
  concilia run --bank banco.csv --payables egresos.csv --mode payables
  concilia run --bank banco.csv --receivables ingresos.csv --complements complementos.csv
  concilia run --config enero.recon.toml --bank banco.csv --payables egresos.csv --receivables ingresos.csv --json
  concilia run --bank banco.csv --payables egresos.csv --out-dir salida --strict")]
    Run(RunArgs),

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  concilia validate enero.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Path to a .recon.toml config file (built-in defaults when omitted)
    #[arg(long, env = "CONCILIA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bank statement CSV
    #[arg(long)]
    pub bank: PathBuf,

    /// Payables (egresos) CSV
    #[arg(long)]
    pub payables: Option<PathBuf>,

    /// Receivables (ingresos) CSV
    #[arg(long)]
    pub receivables: Option<PathBuf>,

    /// Payment complements CSV (statement mode)
    #[arg(long)]
    pub complements: Option<PathBuf>,

    /// payables | receivables | statement (overrides the config)
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<Mode>,

    /// Amount tolerance (overrides the config)
    #[arg(long)]
    pub tolerance: Option<Decimal>,

    /// Directory for the annotated CSV tables
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Output JSON to stdout instead of only the human summary
    #[arg(long)]
    pub json: bool,

    /// Exit with a distinct code when ledger rows remain unpaid
    #[arg(long)]
    pub strict: bool,
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    Mode::from_key(s).ok_or_else(|| format!("unknown mode '{s}' (expected payables, receivables or statement)"))
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  concilia-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

/// Install the stderr log subscriber. `log` records from the engine are
/// bridged into it.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => recon::cmd_run(args),
        Commands::Validate { config } => recon::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<concilia_recon::ReconError> for CliError {
    fn from(err: concilia_recon::ReconError) -> Self {
        let hint = match &err {
            concilia_recon::ReconError::MissingColumn { table, field } => Some(format!(
                "add an alias for '{field}' under [columns.{table}] in the config"
            )),
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }
}
