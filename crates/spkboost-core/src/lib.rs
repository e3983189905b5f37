//! SpeakerBoost Core - wire formats and data model
//!
//! This crate holds everything about the SpeakerBoost amplifier that is pure
//! data: how DSP words are laid out in bytes, what a speaker model contains,
//! how a telemetry sample is assembled and where the calibration scalars live.
//! Nothing here talks to a device.
//!
//! # Modules
//!
//! - [`fixed`] - 24-bit big-endian two's-complement codec ([`encode24`], [`decode24`])
//! - [`model`] - 141-word speaker model layout ([`SpeakerModel`], [`ModelKind`])
//! - [`live`] - telemetry records ([`LiveDataRecord`], [`StatusFlags`])
//! - [`calibration`] - config/preset block slots ([`patch_scalar`], [`BlockLayout`])
//!
//! # Example
//!
//! ```rust
//! use spkboost_core::{MODEL_BYTES, SpeakerModel};
//!
//! let mut model = SpeakerModel::default();
//! model.fir[0] = 0.125;
//! model.f_res = 850;
//!
//! let wire = model.to_wire().unwrap();
//! assert_eq!(wire.len(), MODEL_BYTES);
//! assert_eq!(SpeakerModel::from_wire(&wire).unwrap(), model);
//! ```
//!
//! # no_std Support
//!
//! Disable the default `std` feature to use the codec on an embedded host:
//!
//! ```toml
//! [dependencies]
//! spkboost-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod calibration;
mod error;
pub mod fixed;
pub mod live;
pub mod model;

pub use calibration::{BlockLayout, CalibrationSlot, ViCalibration, patch_scalar, read_scalar};
pub use error::FormatError;
pub use fixed::{clamp24, decode24, encode24, from_fixed, to_fixed};
pub use live::{LiveDataRecord, RawInfoRegisters, StateSnapshot, StatusFlags};
pub use model::{FIR_TAPS, MODEL_BYTES, MODEL_WORDS, ModelKind, ScalarField, SpeakerModel};
