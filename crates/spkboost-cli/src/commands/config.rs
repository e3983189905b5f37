//! Logger configuration commands.

use crate::commands::common::{DeviceArgs, load_config};
use clap::{Args, Subcommand};
use spkboost_config::{LoggerConfig, default_config_path, ensure_user_config_dir};
use std::path::PathBuf;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    device: DeviceArgs,

    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Write a configuration file with default values
    Init {
        /// Destination (default: user config dir)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the default configuration file location
    Path,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = load_config(&args.device)?;
            print!("{}", config.to_toml()?);
        }

        ConfigCommand::Init { path, force } => {
            let path = match path {
                Some(path) => path,
                None => {
                    ensure_user_config_dir()?;
                    default_config_path()
                }
            };
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists. Use --force to overwrite.",
                    path.display()
                );
            }
            LoggerConfig::default().save(&path)?;
            println!("Wrote {}", path.display());
        }

        ConfigCommand::Path => {
            println!("{}", default_config_path().display());
        }
    }

    Ok(())
}
