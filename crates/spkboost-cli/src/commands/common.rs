//! Shared CLI helpers used across multiple commands.

use clap::Args;
use spkboost_config::LoggerConfig;
use spkboost_io::{BackendKind, DeviceBackend, DeviceHandle, open_backend, open_live_data_slaves};
use std::path::PathBuf;

/// Options selecting the configuration and the devices to talk to.
#[derive(Args, Clone, Default)]
pub struct DeviceArgs {
    /// Logger configuration file (default: user config dir, then built-in defaults)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend target: dummy, replay:<csv>, /dev/i2c-N, /dev/ttyX or host:port
    #[arg(short, long, global = true)]
    pub target: Option<String>,

    /// Device address, repeat for more channels (e.g. -a 0x34 -a 0x35)
    #[arg(short, long = "address", value_parser = parse_address, global = true)]
    pub addresses: Vec<u8>,
}

/// Parse a 7-bit device address given as hex (`0x34`) or decimal (`52`).
pub fn parse_address(s: &str) -> Result<u8, String> {
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    }
    .map_err(|e| format!("invalid address '{s}': {e}"))?;
    if value > 0x7f {
        return Err(format!("address '{s}' is not a 7-bit address"));
    }
    Ok(value)
}

/// Load the configuration named by `args` and apply the command-line overrides.
pub fn load_config(args: &DeviceArgs) -> anyhow::Result<LoggerConfig> {
    let mut config = match &args.config {
        Some(path) => LoggerConfig::load(path)?,
        None => LoggerConfig::load_default()?,
    };
    if let Some(target) = &args.target {
        config.target.clone_from(target);
    }
    if !args.addresses.is_empty() {
        config.addresses.clone_from(&args.addresses);
    }
    config.validate()?;
    Ok(config)
}

/// Open the configured backend and every configured device on it.
pub fn open_devices(
    config: &LoggerConfig,
) -> anyhow::Result<(Box<dyn DeviceBackend>, Vec<DeviceHandle>)> {
    let kind: BackendKind = config.target.parse()?;
    let mut backend = open_backend(&kind)?;
    let handles = open_live_data_slaves(backend.as_mut(), &config.addresses)?;
    Ok((backend, handles))
}
