//! Configuration files for SpeakerBoost tooling.
//!
//! # Features
//!
//! - **Logger config**: [`LoggerConfig`], the TOML description of a logging
//!   run (target, devices, cadence, output files, block layout)
//! - **Model files**: [`ModelFile`], a speaker model as editable TOML
//! - **Paths**: platform-specific config directory
//!
//! # Example
//!
//! ```rust,no_run
//! use spkboost_config::{LoggerConfig, default_config_path};
//!
//! let mut config = LoggerConfig::load_default().unwrap();
//! config.count = 3600;
//! config.save(default_config_path()).unwrap();
//! ```

mod error;
mod logger_config;
mod model_file;

/// Platform-specific configuration paths.
#[cfg(feature = "std")]
pub mod paths;

pub use error::ConfigError;
pub use logger_config::{LoggerConfig, MAX_ADDRESSES};
pub use model_file::ModelFile;
#[cfg(feature = "std")]
pub use paths::{default_config_path, ensure_user_config_dir, user_config_dir};
