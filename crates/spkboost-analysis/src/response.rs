//! Frequency response of a speaker model.
//!
//! The 128 FIR taps of a model are transformed with
//! [`real_fft_inplace`](crate::fft::real_fft_inplace) and reduced to 64
//! magnitude bins spaced 62.5 Hz apart (8 kHz sampling).
//!
//! - **Impedance**: taps in natural order, plain [`untangle`], then the
//!   reciprocal of each bin. The taps describe an admittance.
//! - **Excursion**: taps reversed, [`untangle_leakage`] with the negated
//!   leakage factor, then doubled.

use spkboost_core::{FIR_TAPS, FormatError, ModelKind, SpeakerModel};

use crate::fft::real_fft_inplace;
use crate::spectrum::{untangle, untangle_leakage};

/// Number of bins in a response curve.
pub const RESPONSE_BINS: usize = FIR_TAPS / 2;

/// Bin spacing in Hz.
pub const BIN_SPACING_HZ: f64 = 62.5;

/// Magnitude response derived from a model's FIR.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyResponseCurve {
    /// Model the curve was derived from.
    pub kind: ModelKind,
    /// Bin frequencies, `i * 62.5` Hz starting at 0.
    pub frequencies: Vec<f64>,
    /// Ohm for impedance, mm/V for excursion.
    pub values: Vec<f64>,
}

impl FrequencyResponseCurve {
    /// Points worth plotting.
    ///
    /// The excursion curve is meaningless at DC, so its first bin is skipped.
    pub fn plot_points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let skip = usize::from(self.kind == ModelKind::Excursion);
        self.frequencies
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .skip(skip)
    }

    /// Bin with the largest value, as `(Hz, value)`.
    ///
    /// For an impedance model this is the resonance peak.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.plot_points()
            .filter(|(_, v)| v.is_finite())
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// Derive the response curve of `model` interpreted as `kind`.
///
/// # Errors
///
/// [`FormatError::FirLength`] if the model does not carry 128 taps.
pub fn model_response(
    model: &SpeakerModel,
    kind: ModelKind,
) -> Result<FrequencyResponseCurve, FormatError> {
    if model.fir.len() != FIR_TAPS {
        return Err(FormatError::FirLength(model.fir.len()));
    }

    let mut buffer = model.fir.clone();
    let values: Vec<f64> = match kind {
        ModelKind::Excursion => {
            buffer.reverse();
            real_fft_inplace(&mut buffer);
            untangle_leakage(&buffer, -model.leakage_factor)
                .into_iter()
                .map(|m| 2.0 * m)
                .collect()
        }
        ModelKind::Impedance => {
            real_fft_inplace(&mut buffer);
            untangle(&buffer).into_iter().map(|m| 1.0 / m).collect()
        }
    };

    let frequencies = (0..RESPONSE_BINS).map(|i| i as f64 * BIN_SPACING_HZ).collect();
    Ok(FrequencyResponseCurve {
        kind,
        frequencies,
        values,
    })
}

/// Decode a 423-byte model record and derive its response curve.
///
/// # Errors
///
/// [`FormatError::Length`] unless `bytes` holds exactly 423 bytes.
///
/// # Example
///
/// ```rust
/// use spkboost_analysis::response::{decode_model, encode_model};
/// use spkboost_core::{ModelKind, SpeakerModel};
///
/// let mut model = SpeakerModel::default();
/// model.fir[0] = 0.125;
/// let wire = encode_model(&model).unwrap();
///
/// let (decoded, curve) = decode_model(&wire, ModelKind::Impedance).unwrap();
/// assert_eq!(decoded, model);
/// // A single tap of 1/8 admittance is a flat 8 Ohm above DC.
/// assert!(curve.values[1..].iter().all(|&z| (z - 8.0).abs() < 1e-9));
/// ```
pub fn decode_model(
    bytes: &[u8],
    kind: ModelKind,
) -> Result<(SpeakerModel, FrequencyResponseCurve), FormatError> {
    let model = SpeakerModel::from_wire(bytes)?;
    let curve = model_response(&model, kind)?;
    Ok((model, curve))
}

/// Serialize a model to its 423-byte record.
///
/// # Errors
///
/// [`FormatError::FirLength`] if the model does not carry 128 taps.
pub fn encode_model(model: &SpeakerModel) -> Result<Vec<u8>, FormatError> {
    model.to_wire()
}
