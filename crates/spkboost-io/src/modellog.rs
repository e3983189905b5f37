//! Binary speaker-model logs.
//!
//! Each dump appends one fixed-size record to `<prefix><side>_ZMDL.BIN` or
//! `<prefix><side>_XMDL.BIN`:
//!
//! | bytes | content |
//! |-------|---------|
//! | 0..4 | line counter, little-endian `u32` |
//! | 4 | marker `0x55` |
//! | 5..428 | raw 423-byte model record |

use std::path::Path;

use spkboost_core::{FormatError, MODEL_BYTES, ModelKind, SpeakerModel};

use crate::{Error, Result};

/// Record marker byte.
pub const RECORD_MARKER: u8 = 0x55;

/// Bytes per log record.
pub const RECORD_BYTES: usize = 4 + 1 + MODEL_BYTES;

/// One model dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLogRecord {
    /// Telemetry line at which the model was dumped.
    pub line: u32,
    /// Raw model record.
    pub raw: Vec<u8>,
}

impl ModelLogRecord {
    /// Serialize to the on-disk layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(RECORD_BYTES);
        out.extend_from_slice(&self.line.to_le_bytes());
        out.push(RECORD_MARKER);
        out.extend_from_slice(&self.raw);
        out
    }

    /// Decode the raw bytes as a speaker model.
    pub fn model(&self) -> std::result::Result<SpeakerModel, FormatError> {
        SpeakerModel::from_wire(&self.raw)
    }
}

/// Parse a whole log file image.
///
/// # Errors
///
/// [`FormatError::Length`] for a truncated trailing record,
/// [`FormatError::BadMarker`] if a record lacks the marker.
pub fn parse_model_log(bytes: &[u8]) -> std::result::Result<Vec<ModelLogRecord>, FormatError> {
    let tail = bytes.len() % RECORD_BYTES;
    if tail != 0 {
        return Err(FormatError::Length {
            expected: RECORD_BYTES,
            actual: tail,
        });
    }
    bytes
        .chunks_exact(RECORD_BYTES)
        .enumerate()
        .map(|(index, chunk)| {
            if chunk[4] != RECORD_MARKER {
                return Err(FormatError::BadMarker {
                    index,
                    found: chunk[4],
                });
            }
            Ok(ModelLogRecord {
                line: u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
                raw: chunk[5..].to_vec(),
            })
        })
        .collect()
}

/// Read every record of a model log file.
pub fn read_model_log(path: impl AsRef<Path>) -> Result<Vec<ModelLogRecord>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    Ok(parse_model_log(&bytes)?)
}

/// Model kind implied by a log file name (`..._ZMDL.BIN` or `..._XMDL.BIN`).
pub fn kind_from_file_name(path: impl AsRef<Path>) -> Option<ModelKind> {
    let stem = path.as_ref().file_stem()?.to_str()?.to_ascii_uppercase();
    ModelKind::ALL
        .into_iter()
        .find(|kind| stem.ends_with(kind.log_suffix()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: u32, fill: u8) -> ModelLogRecord {
        ModelLogRecord {
            line,
            raw: vec![fill; MODEL_BYTES],
        }
    }

    #[test]
    fn layout_is_428_bytes() {
        let bytes = record(0x0102_0304, 0xaa).to_bytes();
        assert_eq!(bytes.len(), 428);
        assert_eq!(&bytes[..5], &[0x04, 0x03, 0x02, 0x01, 0x55]);
        assert!(bytes[5..].iter().all(|&b| b == 0xaa));
    }

    #[test]
    fn parse_several_records() {
        let mut image = record(1, 0).to_bytes();
        image.extend(record(31, 1).to_bytes());
        let records = parse_model_log(&image).unwrap();
        assert_eq!(records, [record(1, 0), record(31, 1)]);
    }

    #[test]
    fn truncated_log() {
        let mut image = record(1, 0).to_bytes();
        image.extend_from_slice(&[1, 0, 0]);
        assert_eq!(
            parse_model_log(&image),
            Err(FormatError::Length {
                expected: RECORD_BYTES,
                actual: 3
            })
        );
    }

    #[test]
    fn bad_marker() {
        let mut image = record(1, 0).to_bytes();
        image.extend(record(2, 0).to_bytes());
        image[RECORD_BYTES + 4] = 0x54;
        assert_eq!(
            parse_model_log(&image),
            Err(FormatError::BadMarker {
                index: 1,
                found: 0x54
            })
        );
    }

    #[test]
    fn kind_from_names() {
        assert_eq!(kind_from_file_name("out/01L_ZMDL.BIN"), Some(ModelKind::Impedance));
        assert_eq!(kind_from_file_name("01R_xmdl.bin"), Some(ModelKind::Excursion));
        assert_eq!(kind_from_file_name("01L_0000.CSV"), None);
    }
}
