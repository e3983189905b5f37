//! spkboost CLI - telemetry logging and speaker-model tools for SpeakerBoost amplifiers.

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spkboost")]
#[command(author, version, about = "SpeakerBoost amplifier telemetry and speaker-model tools", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log telemetry and speaker models to files
    Log(commands::log::LogArgs),

    /// Print live telemetry lines as CSV
    Record(commands::record::RecordArgs),

    /// Show, export or write speaker models
    Model(commands::model::ModelArgs),

    /// Show or change calibration values
    Calibrate(commands::calibrate::CalibrateArgs),

    /// List the records of a binary model log
    Modellog(commands::modellog::ModellogArgs),

    /// Show or create the logger configuration file
    Config(commands::config::ConfigArgs),
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Log(args) => commands::log::run(args),
        Commands::Record(args) => commands::record::run(args),
        Commands::Model(args) => commands::model::run(args),
        Commands::Calibrate(args) => commands::calibrate::run(args),
        Commands::Modellog(args) => commands::modellog::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
