//! Read-modify-write of calibration scalars on a device.
//!
//! The device only accepts whole blocks, so every change reads the full
//! block, patches one slot and writes the full block back.

use spkboost_core::{BlockLayout, CalibrationSlot, FormatError, ViCalibration, patch_scalar, read_scalar};

use crate::Result;
use crate::device::{DeviceBackend, DeviceHandle};

fn expect_len(bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() == expected {
        Ok(())
    } else {
        Err(FormatError::Length {
            expected,
            actual: bytes.len(),
        }
        .into())
    }
}

fn read_config(
    backend: &mut dyn DeviceBackend,
    handle: DeviceHandle,
    layout: &BlockLayout,
) -> Result<Vec<u8>> {
    let block = backend.read_config(handle, layout.config_len)?;
    expect_len(&block, layout.config_len)?;
    Ok(block)
}

fn read_combined(
    backend: &mut dyn DeviceBackend,
    handle: DeviceHandle,
    layout: &BlockLayout,
) -> Result<Vec<u8>> {
    let combined = backend.read_preset(handle, layout.preset_read_len())?;
    expect_len(&combined, layout.preset_read_len())?;
    Ok(combined)
}

/// Write `value` into `slot`, leaving every other byte of its block unchanged.
pub fn set_scalar(
    backend: &mut dyn DeviceBackend,
    handle: DeviceHandle,
    layout: &BlockLayout,
    slot: CalibrationSlot,
    value: f64,
) -> Result<()> {
    if slot.in_preset() {
        let combined = read_combined(backend, handle, layout)?;
        let mut preset = combined[layout.preset_range()].to_vec();
        patch_scalar(&mut preset, slot.offset(layout), value, slot.frac_bits())?;
        backend.write_preset(handle, &preset)?;
    } else {
        let mut config = read_config(backend, handle, layout)?;
        patch_scalar(&mut config, slot.offset(layout), value, slot.frac_bits())?;
        backend.write_config(handle, &config)?;
    }
    tracing::info!(address = handle.address, ?slot, value, "calibration written");
    Ok(())
}

/// Read the current value of `slot`.
pub fn get_scalar(
    backend: &mut dyn DeviceBackend,
    handle: DeviceHandle,
    layout: &BlockLayout,
    slot: CalibrationSlot,
) -> Result<f64> {
    if slot.in_preset() {
        let combined = read_combined(backend, handle, layout)?;
        let offset = layout.config_len + slot.offset(layout);
        Ok(read_scalar(&combined, offset, slot.frac_bits())?)
    } else {
        let config = read_config(backend, handle, layout)?;
        Ok(read_scalar(&config, slot.offset(layout), slot.frac_bits())?)
    }
}

/// Read the three sense calibration values from the config block.
pub fn get_vi_calibration(
    backend: &mut dyn DeviceBackend,
    handle: DeviceHandle,
    layout: &BlockLayout,
) -> Result<ViCalibration> {
    let config = read_config(backend, handle, layout)?;
    Ok(ViCalibration::from_config(&config)?)
}

/// Set the maximum AGC gain in dB.
pub fn set_agc_gain_max(
    backend: &mut dyn DeviceBackend,
    handle: DeviceHandle,
    layout: &BlockLayout,
    db: f64,
) -> Result<()> {
    set_scalar(backend, handle, layout, CalibrationSlot::AgcGainMax, db)
}

/// Maximum AGC gain in dB.
pub fn get_agc_gain_max(
    backend: &mut dyn DeviceBackend,
    handle: DeviceHandle,
    layout: &BlockLayout,
) -> Result<f64> {
    get_scalar(backend, handle, layout, CalibrationSlot::AgcGainMax)
}
