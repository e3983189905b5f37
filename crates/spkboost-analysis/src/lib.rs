//! SpeakerBoost Analysis - frequency response of speaker models
//!
//! The amplifier describes the loudspeaker it protects with two 128-tap FIR
//! models. This crate turns those taps into something a person can read:
//!
//! - [`fft`] - Sorensen split-radix real FFT, in place
//! - [`spectrum`] - magnitude extraction and leaky-integrator compensation
//! - [`response`] - model record to 64-bin impedance or excursion curve
//! - [`export`] - CSV output of parameters and curves
//!
//! ## Example
//!
//! ```rust,ignore
//! use spkboost_analysis::{decode_model, export::write_curve_csv};
//! use spkboost_core::ModelKind;
//!
//! let (model, curve) = decode_model(&raw_bytes, ModelKind::Impedance)?;
//! println!("fRes = {} Hz", model.f_res);
//! write_curve_csv(&curve, &mut std::io::stdout())?;
//! ```

pub mod export;
pub mod fft;
pub mod response;
pub mod spectrum;

pub use fft::real_fft_inplace;
pub use response::{FrequencyResponseCurve, decode_model, encode_model, model_response};
pub use spectrum::{leakage_filter, untangle, untangle_leakage};
