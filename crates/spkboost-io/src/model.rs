//! Speaker model transfer between device and host.

use spkboost_analysis::{FrequencyResponseCurve, decode_model, encode_model};
use spkboost_core::{FormatError, MODEL_BYTES, ModelKind, SpeakerModel};

use crate::Result;
use crate::device::{DeviceBackend, DeviceHandle};

/// Read the raw 423-byte `kind` model record.
pub fn read_raw_model(
    backend: &mut dyn DeviceBackend,
    handle: DeviceHandle,
    kind: ModelKind,
) -> Result<Vec<u8>> {
    let bytes = backend.read_param(handle, kind.param_id(), MODEL_BYTES)?;
    if bytes.len() != MODEL_BYTES {
        return Err(FormatError::Length {
            expected: MODEL_BYTES,
            actual: bytes.len(),
        }
        .into());
    }
    Ok(bytes)
}

/// Read and decode the `kind` model together with its response curve.
pub fn read_speaker_model(
    backend: &mut dyn DeviceBackend,
    handle: DeviceHandle,
    kind: ModelKind,
) -> Result<(SpeakerModel, FrequencyResponseCurve)> {
    let bytes = read_raw_model(backend, handle, kind)?;
    Ok(decode_model(&bytes, kind)?)
}

/// Encode `model` and write it as the loudspeaker parameters.
pub fn write_speaker_model(
    backend: &mut dyn DeviceBackend,
    handle: DeviceHandle,
    model: &SpeakerModel,
) -> Result<()> {
    let bytes = encode_model(model)?;
    backend.write_speaker_params(handle, &bytes)?;
    tracing::info!(address = handle.address, f_res = model.f_res, "speaker model written");
    Ok(())
}
