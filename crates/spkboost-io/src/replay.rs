//! Replay of a recorded telemetry CSV.
//!
//! The file is any CSV written by the logger or the `record` command. Header
//! lines are skipped, every data row becomes one state query answer plus the
//! matching info-register bytes, and the cursor rewinds to the first row at
//! the end of the file. Rows are served per device address when the file
//! contains that address, otherwise all rows are served in file order.
//!
//! Models, config and preset blocks are not part of a recording. They come
//! from an inner [`SimulatedBackend`].

use std::collections::HashMap;
use std::path::Path;

use spkboost_core::{LiveDataRecord, RawInfoRegisters, StateSnapshot, live::INFO_REGISTER_BYTES};

use crate::device::{DeviceBackend, DeviceHandle, StateReading};
use crate::record::parse_record_line;
use crate::{Error, Result, SimulatedBackend};

struct Track {
    rows: Vec<(u8, LiveDataRecord)>,
    cursor: usize,
    current: Option<LiveDataRecord>,
}

/// Backend answering telemetry queries from a recording.
pub struct ReplayBackend {
    rows: Vec<(u8, LiveDataRecord)>,
    tracks: HashMap<u8, Track>,
    blocks: SimulatedBackend,
}

impl std::fmt::Debug for ReplayBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayBackend")
            .field("rows", &self.rows.len())
            .field("tracks", &self.tracks.len())
            .finish_non_exhaustive()
    }
}

impl ReplayBackend {
    /// Load a recording from `path`.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be read, [`Error::Replay`] if it
    /// holds no data row.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let backend = Self::from_csv(&text)?;
        tracing::info!(path = %path.display(), rows = backend.rows.len(), "replay loaded");
        Ok(backend)
    }

    /// Build from CSV text.
    pub fn from_csv(text: &str) -> Result<Self> {
        let rows: Vec<(u8, LiveDataRecord)> = text
            .lines()
            .filter_map(parse_record_line)
            .map(|p| (p.address, p.record))
            .collect();
        if rows.is_empty() {
            return Err(Error::Replay("no data rows in recording".into()));
        }
        Ok(Self {
            rows,
            tracks: HashMap::new(),
            blocks: SimulatedBackend::new(),
        })
    }

    /// Replace the backend serving models and blocks.
    pub fn with_blocks(mut self, blocks: SimulatedBackend) -> Self {
        self.blocks = blocks;
        self
    }

    /// Number of data rows in the recording.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false: a recording without rows is rejected at load.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn track(&mut self, handle: DeviceHandle) -> Result<&mut Track> {
        self.tracks
            .get_mut(&handle.address)
            .ok_or_else(|| Error::Device(format!("device 0x{:02x} not opened", handle.address)))
    }
}

fn snapshot(record: &LiveDataRecord) -> StateSnapshot {
    StateSnapshot {
        status_flags: record.status_flags,
        agc_gain: record.agc_gain,
        lim_gain: record.limit_gain,
        s_max: record.limit_clip,
        t: record.speaker_temp,
        x1: record.boost_excursion,
        x2: record.manual_excursion,
        re: record.speaker_resistance,
        short_on_mips: record.short_on_mips,
    }
}

fn info_registers(record: &LiveDataRecord) -> RawInfoRegisters {
    RawInfoRegisters {
        status_register: record.status_register,
        battery_adc: RawInfoRegisters::battery_adc_for(record.battery_voltage),
        ic_temp_raw: RawInfoRegisters::ic_temp_raw_for(record.ic_temp),
    }
}

impl DeviceBackend for ReplayBackend {
    fn name(&self) -> &str {
        "replay"
    }

    fn open(&mut self, index: usize, address: u8) -> Result<DeviceHandle> {
        let own: Vec<_> = self.rows.iter().filter(|(a, _)| *a == address).copied().collect();
        let rows = if own.is_empty() { self.rows.clone() } else { own };
        self.tracks.insert(
            address,
            Track {
                rows,
                cursor: 0,
                current: None,
            },
        );
        self.blocks.open(index, address)
    }

    fn read_state(&mut self, handle: DeviceHandle) -> Result<StateReading> {
        let track = self.track(handle)?;
        if track.cursor >= track.rows.len() {
            tracing::debug!(address = handle.address, "replay rewound");
            track.cursor = 0;
        }
        let record = track.rows[track.cursor].1;
        track.cursor += 1;
        track.current = Some(record);
        Ok(StateReading::Running(snapshot(&record)))
    }

    fn read_bytes(&mut self, handle: DeviceHandle, offset: usize, count: usize) -> Result<Vec<u8>> {
        let track = self.track(handle)?;
        let record = track
            .current
            .or_else(|| track.rows.first().map(|r| r.1))
            .unwrap_or_default();
        let bytes = info_registers(&record).to_bytes();
        if offset + count > INFO_REGISTER_BYTES {
            return Err(Error::Device(format!(
                "replay holds info registers only, {offset}+{count} requested"
            )));
        }
        Ok(bytes[offset..offset + count].to_vec())
    }

    fn read_param(&mut self, handle: DeviceHandle, param: u8, len: usize) -> Result<Vec<u8>> {
        self.blocks.read_param(handle, param, len)
    }

    fn write_speaker_params(&mut self, handle: DeviceHandle, bytes: &[u8]) -> Result<()> {
        self.blocks.write_speaker_params(handle, bytes)
    }

    fn read_config(&mut self, handle: DeviceHandle, len: usize) -> Result<Vec<u8>> {
        self.blocks.read_config(handle, len)
    }

    fn write_config(&mut self, handle: DeviceHandle, bytes: &[u8]) -> Result<()> {
        self.blocks.write_config(handle, bytes)
    }

    fn read_preset(&mut self, handle: DeviceHandle, len: usize) -> Result<Vec<u8>> {
        self.blocks.read_preset(handle, len)
    }

    fn write_preset(&mut self, handle: DeviceHandle, bytes: &[u8]) -> Result<()> {
        self.blocks.write_preset(handle, bytes)
    }
}
