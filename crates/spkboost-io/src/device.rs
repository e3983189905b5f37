//! Register-access abstraction.
//!
//! Everything the toolkit needs from an amplifier goes through
//! [`DeviceBackend`]: the SpeakerBoost state query, raw register reads,
//! parameter reads and the config/preset/speaker-parameter blocks. The wire
//! protocol behind it (I2C, serial bridge, socket server, simulation) is the
//! backend's business.
//!
//! The trait is object-safe so the backend can be picked at runtime from a
//! target string, see [`BackendKind`](crate::BackendKind).

use spkboost_core::StateSnapshot;

use crate::{Error, Result};

/// Most devices a single logger may drive.
pub const MAX_DEVICES: usize = 4;

/// An opened device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle {
    /// Position in the list of opened devices.
    pub index: usize,
    /// 7-bit bus address.
    pub address: u8,
}

/// Result of a SpeakerBoost state query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateReading {
    /// DSP is running and reported its state.
    Running(StateSnapshot),
    /// DSP is not running. Not an error: the firmware may still be loading.
    DspNotRunning,
}

/// Blocking register and parameter access to one or more amplifiers.
///
/// ## Implementing a Backend
///
/// ```rust,ignore
/// use spkboost_io::{DeviceBackend, DeviceHandle, Result, StateReading};
///
/// struct I2cDevBackend { bus: std::fs::File }
///
/// impl DeviceBackend for I2cDevBackend {
///     fn name(&self) -> &str { "i2c-dev" }
///
///     fn open(&mut self, index: usize, address: u8) -> Result<DeviceHandle> {
///         // probe the address
///         todo!()
///     }
///
///     // ... register and block access
/// }
/// ```
pub trait DeviceBackend: Send {
    /// Human-readable name of this backend.
    fn name(&self) -> &str;

    /// Open the device at `address` as the `index`th device.
    fn open(&mut self, index: usize, address: u8) -> Result<DeviceHandle>;

    /// Query the SpeakerBoost state.
    fn read_state(&mut self, handle: DeviceHandle) -> Result<StateReading>;

    /// Read `count` bytes of the register map starting at byte `offset`.
    fn read_bytes(&mut self, handle: DeviceHandle, offset: usize, count: usize) -> Result<Vec<u8>>;

    /// Read a DSP parameter of exactly `len` bytes.
    fn read_param(&mut self, handle: DeviceHandle, param: u8, len: usize) -> Result<Vec<u8>>;

    /// Replace the loudspeaker parameters with a model record.
    fn write_speaker_params(&mut self, handle: DeviceHandle, bytes: &[u8]) -> Result<()>;

    /// Read the config block (`len` bytes).
    fn read_config(&mut self, handle: DeviceHandle, len: usize) -> Result<Vec<u8>>;

    /// Write the whole config block.
    fn write_config(&mut self, handle: DeviceHandle, bytes: &[u8]) -> Result<()>;

    /// Read config and preset together (`len` bytes, config first).
    fn read_preset(&mut self, handle: DeviceHandle, len: usize) -> Result<Vec<u8>>;

    /// Write the preset block alone.
    fn write_preset(&mut self, handle: DeviceHandle, bytes: &[u8]) -> Result<()>;
}

/// Open every device in `addresses`, in order.
///
/// # Errors
///
/// [`Error::BadParam`] unless 1 to [`MAX_DEVICES`] addresses are given; any
/// error from [`DeviceBackend::open`].
pub fn open_live_data_slaves(
    backend: &mut dyn DeviceBackend,
    addresses: &[u8],
) -> Result<Vec<DeviceHandle>> {
    if addresses.is_empty() || addresses.len() > MAX_DEVICES {
        return Err(Error::BadParam(format!(
            "{} devices requested, expected 1 to {MAX_DEVICES}",
            addresses.len()
        )));
    }
    let handles = addresses
        .iter()
        .enumerate()
        .map(|(index, &address)| backend.open(index, address))
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(backend = backend.name(), devices = handles.len(), "devices opened");
    Ok(handles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimulatedBackend;

    #[test]
    fn open_slaves_bounds() {
        let mut backend = SimulatedBackend::new();
        assert!(matches!(
            open_live_data_slaves(&mut backend, &[]),
            Err(Error::BadParam(_))
        ));
        assert!(matches!(
            open_live_data_slaves(&mut backend, &[0x34, 0x35, 0x36, 0x37, 0x38]),
            Err(Error::BadParam(_))
        ));

        let handles = open_live_data_slaves(&mut backend, &[0x34, 0x35, 0x36, 0x37]).unwrap();
        assert_eq!(handles.len(), 4);
        assert_eq!(handles[2], DeviceHandle { index: 2, address: 0x36 });
    }
}
