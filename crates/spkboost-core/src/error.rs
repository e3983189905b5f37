//! Format errors for fixed-width wire data.

/// Malformed fixed-width input.
///
/// Raised by the codec and the model/record parsers when a byte buffer does
/// not have the shape the chip defines. No side effects happen before one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A buffer had the wrong total length.
    Length {
        /// Length the format requires.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },
    /// A 24-bit word stream whose length is not a multiple of 3.
    NotWordAligned(usize),
    /// A speaker model whose FIR does not hold exactly 128 taps.
    FirLength(usize),
    /// A 3-byte slot that does not fit inside its block.
    Offset {
        /// Byte offset of the slot.
        offset: usize,
        /// Length of the block.
        len: usize,
    },
    /// A binary model-log record without the `0x55` marker.
    BadMarker {
        /// Index of the offending record.
        index: usize,
        /// Byte found where the marker belongs.
        found: u8,
    },
}

impl core::fmt::Display for FormatError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Length { expected, actual } => {
                write!(f, "expected {expected} bytes, got {actual}")
            }
            Self::NotWordAligned(len) => {
                write!(f, "{len} bytes is not a whole number of 24-bit words")
            }
            Self::FirLength(len) => write!(f, "speaker model needs 128 FIR taps, got {len}"),
            Self::Offset { offset, len } => {
                write!(f, "3-byte slot at offset {offset} does not fit a {len}-byte block")
            }
            Self::BadMarker { index, found } => {
                write!(f, "model log record {index}: marker 0x{found:02x}, expected 0x55")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FormatError {}
