//! 24-bit fixed-point codec for DSP memory.
//!
//! The SpeakerBoost DSP stores every parameter as a 24-bit two's-complement
//! word, transferred most-significant byte first. A value with `n` fractional
//! bits represents `word / 2^n`.
//!
//! # Example
//!
//! ```rust
//! use spkboost_core::fixed::{decode24, encode24};
//!
//! let bytes = encode24(&[1, -1, 0x7f_ffff]);
//! assert_eq!(bytes, [0x00, 0x00, 0x01, 0xff, 0xff, 0xff, 0x7f, 0xff, 0xff]);
//! assert_eq!(decode24(&bytes).unwrap(), [1, -1, 0x7f_ffff]);
//! ```

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::FormatError;

/// Bytes per DSP word.
pub const WORD_BYTES: usize = 3;

/// Largest representable word, `2^23 - 1`.
pub const WORD_MAX: i32 = (1 << 23) - 1;

/// Smallest representable word, `-(2^23)`.
pub const WORD_MIN: i32 = -(1 << 23);

/// Saturate a value to the 24-bit two's-complement range.
#[inline]
pub fn clamp24(value: i32) -> i32 {
    value.clamp(WORD_MIN, WORD_MAX)
}

/// Write one word into a 3-byte slot, saturating first.
#[inline]
pub fn write_word(slot: &mut [u8], value: i32) {
    // Two's complement of the clamped value, truncated to 24 bits.
    let d = (clamp24(value) as u32) & 0x00ff_ffff;
    slot[0] = (d >> 16) as u8;
    slot[1] = (d >> 8) as u8;
    slot[2] = d as u8;
}

/// Read one word from a 3-byte slot, sign-extending bit 23.
#[inline]
pub fn read_word(slot: &[u8]) -> i32 {
    let d = (i32::from(slot[0]) << 16) | (i32::from(slot[1]) << 8) | i32::from(slot[2]);
    if slot[0] & 0x80 != 0 { d - (1 << 24) } else { d }
}

/// Encode integers as big-endian 24-bit words.
///
/// Positive values above `2^23 - 1` and negative values below `-(2^23)` are
/// clipped, so this never fails.
pub fn encode24(values: &[i32]) -> Vec<u8> {
    let mut bytes = vec![0u8; values.len() * WORD_BYTES];
    for (slot, &value) in bytes.chunks_exact_mut(WORD_BYTES).zip(values) {
        write_word(slot, value);
    }
    bytes
}

/// Decode big-endian 24-bit words into sign-extended integers.
///
/// # Errors
///
/// [`FormatError::NotWordAligned`] if the length is not a multiple of 3.
pub fn decode24(bytes: &[u8]) -> Result<Vec<i32>, FormatError> {
    if bytes.len() % WORD_BYTES != 0 {
        return Err(FormatError::NotWordAligned(bytes.len()));
    }
    Ok(bytes.chunks_exact(WORD_BYTES).map(read_word).collect())
}

/// Quantize a physical value to a word with `frac_bits` fractional bits.
///
/// Rounds to nearest; out-of-range values saturate at the `i32` limits and are
/// clipped to 24 bits by [`encode24`].
#[inline]
pub fn to_fixed(value: f64, frac_bits: u32) -> i32 {
    libm::round(value * scale(frac_bits)) as i32
}

/// Convert a word with `frac_bits` fractional bits back to a physical value.
#[inline]
pub fn from_fixed(word: i32, frac_bits: u32) -> f64 {
    f64::from(word) / scale(frac_bits)
}

/// Weight of one unit in the last place for `frac_bits`.
#[inline]
pub fn quantum(frac_bits: u32) -> f64 {
    1.0 / scale(frac_bits)
}

#[inline]
fn scale(frac_bits: u32) -> f64 {
    f64::from(1u32 << frac_bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_msb_first() {
        assert_eq!(encode24(&[0x12_3456]), [0x12, 0x34, 0x56]);
    }

    #[test]
    fn encode_negative_twos_complement() {
        assert_eq!(encode24(&[-2]), [0xff, 0xff, 0xfe]);
        assert_eq!(encode24(&[WORD_MIN]), [0x80, 0x00, 0x00]);
    }

    #[test]
    fn encode_clips_out_of_range() {
        assert_eq!(encode24(&[1 << 24]), [0x7f, 0xff, 0xff]);
        assert_eq!(encode24(&[-(1 << 24)]), [0x80, 0x00, 0x00]);
        assert_eq!(encode24(&[i32::MAX, i32::MIN]), [0x7f, 0xff, 0xff, 0x80, 0x00, 0x00]);
    }

    #[test]
    fn decode_sign_extends() {
        assert_eq!(decode24(&[0x80, 0x00, 0x00]).unwrap(), [WORD_MIN]);
        assert_eq!(decode24(&[0xff, 0xff, 0xff]).unwrap(), [-1]);
        assert_eq!(decode24(&[0x7f, 0xff, 0xff]).unwrap(), [WORD_MAX]);
    }

    #[test]
    fn decode_rejects_partial_word() {
        assert_eq!(decode24(&[0, 0, 0, 1]), Err(FormatError::NotWordAligned(4)));
    }

    #[test]
    fn decode_empty() {
        assert!(decode24(&[]).unwrap().is_empty());
    }

    #[test]
    fn fixed_point_scaling() {
        assert_eq!(to_fixed(0.5, 23), 1 << 22);
        assert_eq!(to_fixed(-1.0, 22), -(1 << 22));
        assert_eq!(from_fixed(1 << 16, 16), 1.0);
        assert_eq!(to_fixed(3.0, 0), 3);
    }

    #[test]
    fn to_fixed_rounds_to_nearest() {
        // 1.3 * 2 = 2.6 -> 3
        assert_eq!(to_fixed(1.3, 1), 3);
        assert_eq!(to_fixed(-1.3, 1), -3);
    }
}
