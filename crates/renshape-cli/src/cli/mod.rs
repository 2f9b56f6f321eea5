mod commands;
mod helpers;

use clap::Parser;
use renshape_core::domain::RenshapeError;
use tracing_subscriber::EnvFilter;

pub fn run_from_env() -> i32 {
    init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let renshape_error = error.as_renshape_error();
            eprintln!("{}", renshape_error.diagnostic_line());
            renshape_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("renshape".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "renshape",
    version,
    about = "Nuclide beta-decay archive and reactor antineutrino spectra"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Write per-nuclide records (yields, Q-values, half-lives) into an archive
    Ingest(commands::IngestArgs),
    /// Compute spectra from the decay library and ENSDF files
    Process(commands::ProcessArgs),
    /// Derive fission-weighted spectra from an archive
    Spectrum(commands::SpectrumArgs),
    /// List the nuclides of an archive with their provenance
    List(commands::ListArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Ingest(args) => commands::run_ingest_command(args),
        CliCommand::Process(args) => commands::run_process_command(args),
        CliCommand::Spectrum(args) => commands::run_spectrum_command(args),
        CliCommand::List(args) => commands::run_list_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(RenshapeError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<RenshapeError> for CliError {
    fn from(error: RenshapeError) -> Self {
        Self::Compute(error)
    }
}

impl CliError {
    fn as_renshape_error(&self) -> RenshapeError {
        match self {
            Self::Usage(message) => RenshapeError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => RenshapeError::store_io("IO.CLI", format!("{error:#}")),
        }
    }
}
