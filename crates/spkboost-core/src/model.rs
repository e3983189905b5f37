//! Loudspeaker model word layout.
//!
//! The DSP keeps two 141-word speaker models: an impedance model and an
//! excursion model. Both share one layout: 128 FIR taps followed by 13 scalar
//! parameters, each at its own fixed-point width.
//!
//! | word | field | fractional bits |
//! |------|-------|-----------------|
//! | 0..128 | FIR taps | 22 |
//! | 128 | `shift_fir` | 0 |
//! | 129, 130 | `leakage_factor`, `re_correction` | 23 |
//! | 131..135 | `x_init_margin`, `x_damage_margin`, `x_margin`, `bl` | 21 |
//! | 135, 136 | `f_res`, `f_res_init` | 0 |
//! | 137 | `qt` | 17 |
//! | 138 | `x_max` | 16 |
//! | 139 | `t_max` | 14 |
//! | 140 | `t_coef_a` | 23 |
//!
//! Converting to words and back is lossy by one quantization step per field.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::FormatError;
use crate::fixed::{decode24, encode24, from_fixed, to_fixed};

/// Number of FIR taps in a model.
pub const FIR_TAPS: usize = 128;

/// Words in a model record.
pub const MODEL_WORDS: usize = 141;

/// Bytes in a model record on the wire.
pub const MODEL_BYTES: usize = MODEL_WORDS * 3;

/// Fractional bits of each FIR tap.
pub const FIR_FRAC_BITS: u32 = 22;

/// Which of the two chip-side speaker models a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ModelKind {
    /// Loudspeaker impedance model (admittance-like taps).
    Impedance,
    /// Loudspeaker excursion model (leaky-integrator taps).
    Excursion,
}

impl ModelKind {
    /// Both kinds, in the order they are dumped to the model logs.
    pub const ALL: [ModelKind; 2] = [ModelKind::Impedance, ModelKind::Excursion];

    /// DSP parameter id used to read this model.
    pub fn param_id(self) -> u8 {
        match self {
            ModelKind::Impedance => 0x86,
            ModelKind::Excursion => 0xC1,
        }
    }

    /// Suffix of the binary log file for this model.
    pub fn log_suffix(self) -> &'static str {
        match self {
            ModelKind::Impedance => "ZMDL",
            ModelKind::Excursion => "XMDL",
        }
    }

    /// Physical quantity of the derived curve.
    pub fn quantity(self) -> &'static str {
        match self {
            ModelKind::Impedance => "impedance Ohm",
            ModelKind::Excursion => "xcursion mm/V",
        }
    }
}

impl core::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ModelKind::Impedance => f.write_str("impedance"),
            ModelKind::Excursion => f.write_str("excursion"),
        }
    }
}

/// Scalar parameters that follow the FIR, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarField {
    /// Exponent of the FIR data.
    ShiftFir,
    /// Excursion model integration leakage.
    LeakageFactor,
    /// Correction factor for Re.
    ReCorrection,
    /// Excursion margin during startup.
    XInitMargin,
    /// Excursion margin after damage has been detected.
    XDamageMargin,
    /// Excursion margin when look-ahead is 0.
    XMargin,
    /// Loudspeaker force factor.
    Bl,
    /// Estimated resonance compensation cutoff (Hz).
    FRes,
    /// Initial resonance compensation cutoff (Hz).
    FResInit,
    /// Resonance compensation Q-factor.
    Qt,
    /// Maximum membrane excursion.
    XMax,
    /// Maximum coil temperature.
    TMax,
    /// Temperature coefficient.
    TCoefA,
}

impl ScalarField {
    /// All scalar fields in wire order.
    pub const ALL: [ScalarField; MODEL_WORDS - FIR_TAPS] = [
        ScalarField::ShiftFir,
        ScalarField::LeakageFactor,
        ScalarField::ReCorrection,
        ScalarField::XInitMargin,
        ScalarField::XDamageMargin,
        ScalarField::XMargin,
        ScalarField::Bl,
        ScalarField::FRes,
        ScalarField::FResInit,
        ScalarField::Qt,
        ScalarField::XMax,
        ScalarField::TMax,
        ScalarField::TCoefA,
    ];

    /// Fractional bits of this field's fixed-point encoding.
    pub fn frac_bits(self) -> u32 {
        match self {
            ScalarField::ShiftFir | ScalarField::FRes | ScalarField::FResInit => 0,
            ScalarField::LeakageFactor | ScalarField::ReCorrection | ScalarField::TCoefA => 23,
            ScalarField::XInitMargin
            | ScalarField::XDamageMargin
            | ScalarField::XMargin
            | ScalarField::Bl => 21,
            ScalarField::Qt => 17,
            ScalarField::XMax => 16,
            ScalarField::TMax => 14,
        }
    }

    /// Column name used in parameter summaries.
    pub fn name(self) -> &'static str {
        match self {
            ScalarField::ShiftFir => "Shift_FIR",
            ScalarField::LeakageFactor => "leakageFactor",
            ScalarField::ReCorrection => "ReCorrection",
            ScalarField::XInitMargin => "xInitMargin",
            ScalarField::XDamageMargin => "xDamageMargin",
            ScalarField::XMargin => "xMargin",
            ScalarField::Bl => "Bl",
            ScalarField::FRes => "fRes",
            ScalarField::FResInit => "fResInit",
            ScalarField::Qt => "Qt",
            ScalarField::XMax => "xMax",
            ScalarField::TMax => "tMax",
            ScalarField::TCoefA => "tCoefA",
        }
    }
}

/// Loudspeaker model: 128 FIR taps plus 13 scalar parameters.
///
/// Integer fields (`shift_fir`, `f_res`, `f_res_init`) are kept as integers;
/// all other fields are physical values at their field's precision.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeakerModel {
    /// FIR taps in `[-2, 2)` at 2^-22 resolution.
    pub fir: Vec<f64>,
    /// Exponent of the FIR data.
    pub shift_fir: i32,
    /// Excursion model integration leakage.
    pub leakage_factor: f64,
    /// Correction factor for Re.
    pub re_correction: f64,
    /// Excursion margin during startup.
    pub x_init_margin: f64,
    /// Excursion margin after damage has been detected.
    pub x_damage_margin: f64,
    /// Excursion margin when look-ahead is 0.
    pub x_margin: f64,
    /// Loudspeaker force factor.
    pub bl: f64,
    /// Estimated resonance compensation cutoff (Hz).
    pub f_res: i32,
    /// Initial resonance compensation cutoff (Hz).
    pub f_res_init: i32,
    /// Resonance compensation Q-factor.
    pub qt: f64,
    /// Maximum membrane excursion.
    pub x_max: f64,
    /// Maximum coil temperature.
    pub t_max: f64,
    /// Temperature coefficient.
    pub t_coef_a: f64,
}

impl Default for SpeakerModel {
    fn default() -> Self {
        Self {
            fir: vec![0.0; FIR_TAPS],
            shift_fir: 0,
            leakage_factor: 0.0,
            re_correction: 0.0,
            x_init_margin: 0.0,
            x_damage_margin: 0.0,
            x_margin: 0.0,
            bl: 0.0,
            f_res: 0,
            f_res_init: 0,
            qt: 0.0,
            x_max: 0.0,
            t_max: 0.0,
            t_coef_a: 0.0,
        }
    }
}

impl SpeakerModel {
    /// Physical value of a scalar field. Integer fields are widened.
    pub fn scalar(&self, field: ScalarField) -> f64 {
        match field {
            ScalarField::ShiftFir => f64::from(self.shift_fir),
            ScalarField::LeakageFactor => self.leakage_factor,
            ScalarField::ReCorrection => self.re_correction,
            ScalarField::XInitMargin => self.x_init_margin,
            ScalarField::XDamageMargin => self.x_damage_margin,
            ScalarField::XMargin => self.x_margin,
            ScalarField::Bl => self.bl,
            ScalarField::FRes => f64::from(self.f_res),
            ScalarField::FResInit => f64::from(self.f_res_init),
            ScalarField::Qt => self.qt,
            ScalarField::XMax => self.x_max,
            ScalarField::TMax => self.t_max,
            ScalarField::TCoefA => self.t_coef_a,
        }
    }

    fn set_word(&mut self, field: ScalarField, word: i32) {
        let value = from_fixed(word, field.frac_bits());
        match field {
            ScalarField::ShiftFir => self.shift_fir = word,
            ScalarField::LeakageFactor => self.leakage_factor = value,
            ScalarField::ReCorrection => self.re_correction = value,
            ScalarField::XInitMargin => self.x_init_margin = value,
            ScalarField::XDamageMargin => self.x_damage_margin = value,
            ScalarField::XMargin => self.x_margin = value,
            ScalarField::Bl => self.bl = value,
            ScalarField::FRes => self.f_res = word,
            ScalarField::FResInit => self.f_res_init = word,
            ScalarField::Qt => self.qt = value,
            ScalarField::XMax => self.x_max = value,
            ScalarField::TMax => self.t_max = value,
            ScalarField::TCoefA => self.t_coef_a = value,
        }
    }

    fn word(&self, field: ScalarField) -> i32 {
        match field {
            ScalarField::ShiftFir => self.shift_fir,
            ScalarField::FRes => self.f_res,
            ScalarField::FResInit => self.f_res_init,
            other => to_fixed(self.scalar(other), other.frac_bits()),
        }
    }

    /// Build a model from 141 decoded words.
    ///
    /// # Errors
    ///
    /// [`FormatError::Length`] if `words` does not hold exactly 141 entries.
    pub fn from_words(words: &[i32]) -> Result<Self, FormatError> {
        if words.len() != MODEL_WORDS {
            return Err(FormatError::Length {
                expected: MODEL_WORDS,
                actual: words.len(),
            });
        }
        let (taps, scalars) = words.split_at(FIR_TAPS);
        let mut model = SpeakerModel {
            fir: taps.iter().map(|&w| from_fixed(w, FIR_FRAC_BITS)).collect(),
            ..SpeakerModel::default()
        };
        for (&field, &word) in ScalarField::ALL.iter().zip(scalars) {
            model.set_word(field, word);
        }
        Ok(model)
    }

    /// Quantize the model back into 141 words.
    ///
    /// # Errors
    ///
    /// [`FormatError::FirLength`] if the FIR does not hold 128 taps.
    pub fn to_words(&self) -> Result<Vec<i32>, FormatError> {
        if self.fir.len() != FIR_TAPS {
            return Err(FormatError::FirLength(self.fir.len()));
        }
        let mut words = Vec::with_capacity(MODEL_WORDS);
        words.extend(self.fir.iter().map(|&tap| to_fixed(tap, FIR_FRAC_BITS)));
        words.extend(ScalarField::ALL.iter().map(|&field| self.word(field)));
        Ok(words)
    }

    /// Parse a 423-byte wire record.
    ///
    /// # Errors
    ///
    /// [`FormatError::Length`] on any other length.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() != MODEL_BYTES {
            return Err(FormatError::Length {
                expected: MODEL_BYTES,
                actual: bytes.len(),
            });
        }
        Self::from_words(&decode24(bytes)?)
    }

    /// Serialize to a 423-byte wire record.
    pub fn to_wire(&self) -> Result<Vec<u8>, FormatError> {
        Ok(encode24(&self.to_words()?))
    }
}
