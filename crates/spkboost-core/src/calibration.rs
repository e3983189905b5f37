//! Calibration scalars inside the config and preset blocks.
//!
//! Both blocks carry far more configuration than the calibration tool owns.
//! Only the slots listed in [`CalibrationSlot`] are interpreted here; every
//! other byte must survive a patch untouched, which is why patching always
//! works on a copy of the whole block.

use crate::FormatError;
use crate::fixed::{WORD_BYTES, from_fixed, read_word, to_fixed, write_word};

/// Chip-defined block sizes and offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BlockLayout {
    /// Length of the config block in bytes.
    pub config_len: usize,
    /// Length of the preset block in bytes.
    pub preset_len: usize,
    /// Offset of the AGC-gain-max slot inside the preset block.
    pub agc_gain_max_offset: usize,
}

impl Default for BlockLayout {
    fn default() -> Self {
        Self {
            config_len: 165,
            preset_len: 87,
            agc_gain_max_offset: 39,
        }
    }
}

impl BlockLayout {
    /// Bytes returned by a preset read, which starts with the config block.
    pub fn preset_read_len(&self) -> usize {
        self.config_len + self.preset_len
    }

    /// Range of the preset block inside a preset read.
    pub fn preset_range(&self) -> core::ops::Range<usize> {
        self.config_len..self.preset_read_len()
    }
}

/// Calibration values the tool knows how to read and patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationSlot {
    /// Voltage/current sense calibration, config offset 0.
    VisCal,
    /// Voltage sense calibration, config offset 3.
    Vsense,
    /// Current sense calibration, config offset 6.
    Isense,
    /// Maximum AGC gain in dB, inside the preset block.
    AgcGainMax,
}

impl CalibrationSlot {
    /// Fractional bits of the slot's encoding.
    pub fn frac_bits(self) -> u32 {
        match self {
            CalibrationSlot::VisCal => 16,
            CalibrationSlot::Vsense | CalibrationSlot::Isense => 13,
            CalibrationSlot::AgcGainMax => 15,
        }
    }

    /// Byte offset within the slot's own block.
    pub fn offset(self, layout: &BlockLayout) -> usize {
        match self {
            CalibrationSlot::VisCal => 0,
            CalibrationSlot::Vsense => 3,
            CalibrationSlot::Isense => 6,
            CalibrationSlot::AgcGainMax => layout.agc_gain_max_offset,
        }
    }

    /// True for slots stored in the preset block rather than the config block.
    pub fn in_preset(self) -> bool {
        matches!(self, CalibrationSlot::AgcGainMax)
    }
}

/// The three sense calibration values of the config block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViCalibration {
    /// V/I sense calibration.
    pub vis_cal: f64,
    /// Voltage sense calibration.
    pub vsense: f64,
    /// Current sense calibration.
    pub isense: f64,
}

impl ViCalibration {
    /// Decode the three slots from a config block.
    pub fn from_config(block: &[u8]) -> Result<Self, FormatError> {
        Ok(Self {
            vis_cal: read_scalar(block, 0, CalibrationSlot::VisCal.frac_bits())?,
            vsense: read_scalar(block, 3, CalibrationSlot::Vsense.frac_bits())?,
            isense: read_scalar(block, 6, CalibrationSlot::Isense.frac_bits())?,
        })
    }
}

fn check_slot(block: &[u8], offset: usize) -> Result<(), FormatError> {
    if offset + WORD_BYTES > block.len() {
        return Err(FormatError::Offset {
            offset,
            len: block.len(),
        });
    }
    Ok(())
}

/// Overwrite the 3-byte slot at `offset` with `value` at `frac_bits`.
///
/// No other byte of `block` changes.
///
/// # Errors
///
/// [`FormatError::Offset`] if the slot does not fit the block.
pub fn patch_scalar(
    block: &mut [u8],
    offset: usize,
    value: f64,
    frac_bits: u32,
) -> Result<(), FormatError> {
    check_slot(block, offset)?;
    write_word(&mut block[offset..offset + WORD_BYTES], to_fixed(value, frac_bits));
    Ok(())
}

/// Read the 3-byte slot at `offset` as a value with `frac_bits`.
pub fn read_scalar(block: &[u8], offset: usize, frac_bits: u32) -> Result<f64, FormatError> {
    check_slot(block, offset)?;
    Ok(from_fixed(read_word(&block[offset..offset + WORD_BYTES]), frac_bits))
}
