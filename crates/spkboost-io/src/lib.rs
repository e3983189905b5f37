//! Device access and data logging for SpeakerBoost amplifiers.
//!
//! This crate provides:
//!
//! - **Device access**: the [`DeviceBackend`] trait, selected at runtime via
//!   [`BackendKind`], with the built-in [`SimulatedBackend`] and [`ReplayBackend`]
//! - **Telemetry**: [`decode_live_data`] reads one [`LiveDataRecord`] and runs
//!   the [`AnomalySupervisor`] checks
//! - **Calibration**: read-modify-write of the config and preset blocks
//! - **Logging**: [`LoggingPipeline`] writes the CSV and binary model logs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spkboost_io::{BackendKind, LoggerSettings, LoggingPipeline, PassiveSupervisor,
//!                   open_backend, open_live_data_slaves};
//!
//! let mut backend = open_backend(&"dummy".parse::<BackendKind>()?)?;
//! let mut supervisor = PassiveSupervisor;
//! let handles = open_live_data_slaves(backend.as_mut(), &[0x34])?;
//!
//! let settings = LoggerSettings { count: 10, ..LoggerSettings::default() };
//! let mut pipeline = LoggingPipeline::open(backend.as_mut(), &mut supervisor, &handles, settings)?;
//! let summary = pipeline.run()?;
//! println!("{} lines, {} model dumps", summary.lines, summary.model_dumps);
//! ```
//!
//! [`LiveDataRecord`]: spkboost_core::LiveDataRecord

pub mod backend;
pub mod calibration;
pub mod device;
pub mod logger;
pub mod model;
pub mod modellog;
pub mod record;
pub mod replay;
pub mod simulated;
pub mod supervisor;
pub mod telemetry;

use std::path::PathBuf;

use spkboost_core::FormatError;

pub use backend::{BackendKind, open_backend};
pub use device::{DeviceBackend, DeviceHandle, MAX_DEVICES, StateReading, open_live_data_slaves};
pub use logger::{LoggerSettings, LoggingPipeline, PipelineState, RunSummary, TickReport};
pub use modellog::{ModelLogRecord, read_model_log};
pub use record::{format_record_line, print_record_header};
pub use replay::ReplayBackend;
pub use simulated::SimulatedBackend;
pub use supervisor::{AlgorithmHealth, AnomalySupervisor, EventSet, PassiveSupervisor};
pub use telemetry::{LiveData, decode_live_data};

/// Error types for device access and logging.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed wire data.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// File could not be opened, written or read.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Register or parameter access failed.
    #[error("device error: {0}")]
    Device(String),

    /// The DSP on the device at this address is not running.
    #[error("DSP not running on device 0x{0:02x}")]
    DspNotRunning(u8),

    /// The supervisor found the algorithm unhealthy and forced a reload.
    #[error("device 0x{address:02x} faulted (status register 0x{status_register:04x}), reload issued")]
    DeviceFault {
        /// Device address.
        address: u8,
        /// Status register at the time of the fault.
        status_register: u16,
    },

    /// Reading live data from a device failed.
    #[error("no live data from device 0x{address:02x}: {source}")]
    LiveData {
        /// Device address.
        address: u8,
        /// Underlying error.
        #[source]
        source: Box<Error>,
    },

    /// A parameter is outside its accepted range.
    #[error("bad parameter: {0}")]
    BadParam(String),

    /// The transport exists but has no built-in driver.
    #[error("unsupported transport: {0}")]
    UnsupportedTransport(String),

    /// A replay file could not be used.
    #[error("replay error: {0}")]
    Replay(String),
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result type for device and logging operations.
pub type Result<T> = std::result::Result<T, Error>;
