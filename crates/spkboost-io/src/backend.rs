//! Runtime backend selection.
//!
//! A target string is parsed once into a [`BackendKind`]:
//!
//! | target | backend |
//! |--------|---------|
//! | `dummy` | [`SimulatedBackend`] |
//! | `replay:<csv>` | [`ReplayBackend`] over a recorded CSV |
//! | `/dev/i2c-*` | Linux i2c-dev bus |
//! | `/dev/tty*`, `COM*` | serial bridge |
//! | `host:port` | socket server |
//!
//! Only the simulated and replay backends ship with this crate. The hardware
//! transports parse, so configuration can name them, but opening one reports
//! [`Error::UnsupportedTransport`] until a driver is registered for it.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::device::DeviceBackend;
use crate::{Error, ReplayBackend, Result, SimulatedBackend};

/// Transport named by a target string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    /// In-memory simulation.
    Simulated,
    /// Replay of a telemetry CSV.
    Replay(PathBuf),
    /// Linux i2c-dev bus device.
    I2c(PathBuf),
    /// Serial bridge.
    Serial(PathBuf),
    /// Socket server at `host:port`.
    Socket(String),
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(target: &str) -> Result<Self> {
        let target = target.trim();
        if target.eq_ignore_ascii_case("dummy") {
            return Ok(Self::Simulated);
        }
        if let Some(path) = target.strip_prefix("replay:") {
            if path.is_empty() {
                return Err(Error::BadParam("replay target needs a file".into()));
            }
            return Ok(Self::Replay(PathBuf::from(path)));
        }
        if target.starts_with("/dev/i2c") {
            return Ok(Self::I2c(PathBuf::from(target)));
        }
        if target.starts_with("/dev/tty") || target.to_ascii_uppercase().starts_with("COM") {
            return Ok(Self::Serial(PathBuf::from(target)));
        }
        if let Some((host, port)) = target.rsplit_once(':')
            && !host.is_empty()
            && port.parse::<u16>().is_ok()
        {
            return Ok(Self::Socket(target.to_string()));
        }
        Err(Error::BadParam(format!("unrecognized target '{target}'")))
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simulated => f.write_str("dummy"),
            Self::Replay(path) => write!(f, "replay:{}", path.display()),
            Self::I2c(path) | Self::Serial(path) => write!(f, "{}", path.display()),
            Self::Socket(addr) => f.write_str(addr),
        }
    }
}

/// Open the backend for `kind`.
pub fn open_backend(kind: &BackendKind) -> Result<Box<dyn DeviceBackend>> {
    let backend: Box<dyn DeviceBackend> = match kind {
        BackendKind::Simulated => Box::new(SimulatedBackend::new()),
        BackendKind::Replay(path) => Box::new(ReplayBackend::open(path)?),
        BackendKind::I2c(_) | BackendKind::Serial(_) | BackendKind::Socket(_) => {
            return Err(Error::UnsupportedTransport(kind.to_string()));
        }
    };
    tracing::info!(transport = %kind, backend = backend.name(), "backend opened");
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_targets() {
        assert_eq!("dummy".parse::<BackendKind>().unwrap(), BackendKind::Simulated);
        assert_eq!(
            "replay:record.csv".parse::<BackendKind>().unwrap(),
            BackendKind::Replay("record.csv".into())
        );
        assert_eq!(
            "/dev/i2c-1".parse::<BackendKind>().unwrap(),
            BackendKind::I2c("/dev/i2c-1".into())
        );
        assert_eq!(
            "/dev/ttyUSB0".parse::<BackendKind>().unwrap(),
            BackendKind::Serial("/dev/ttyUSB0".into())
        );
        assert_eq!(
            "localhost:9887".parse::<BackendKind>().unwrap(),
            BackendKind::Socket("localhost:9887".into())
        );
    }

    #[test]
    fn reject_unknown_targets() {
        for bad in ["", "replay:", "localhost:http", "/tmp/foo", ":9887"] {
            assert!(matches!(bad.parse::<BackendKind>(), Err(Error::BadParam(_))), "{bad}");
        }
    }

    #[test]
    fn display_round_trips() {
        for target in ["dummy", "replay:a.csv", "/dev/i2c-0", "10.0.0.2:9887"] {
            assert_eq!(target.parse::<BackendKind>().unwrap().to_string(), target);
        }
    }

    #[test]
    fn hardware_transports_are_not_built_in() {
        let kind: BackendKind = "/dev/i2c-1".parse().unwrap();
        assert!(matches!(open_backend(&kind), Err(Error::UnsupportedTransport(_))));
        assert!(open_backend(&BackendKind::Simulated).is_ok());
    }
}
