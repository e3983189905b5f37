//! In-memory amplifier for tests and the `dummy` target.
//!
//! Every opened address gets its own [`SimulatedChip`], cloned from a
//! template. Reads return the chip's current contents; writes to the config
//! block, the preset block and the speaker parameters are stored, so a
//! read-modify-write cycle can be observed end to end.

use std::collections::BTreeMap;

use spkboost_core::{
    BlockLayout, CalibrationSlot, MODEL_BYTES, ModelKind, RawInfoRegisters, SpeakerModel,
    StateSnapshot, StatusFlags, patch_scalar,
};

use crate::device::{DeviceBackend, DeviceHandle, StateReading};
use crate::{Error, Result};

/// Bytes in the simulated register map.
pub const REGISTER_MAP_BYTES: usize = 256;

/// Contents of one simulated amplifier.
#[derive(Debug, Clone)]
pub struct SimulatedChip {
    /// Answer to the state query while the DSP runs.
    pub state: StateSnapshot,
    /// Register map; the first six bytes are the info registers.
    pub registers: Vec<u8>,
    /// Impedance model record.
    pub impedance: Vec<u8>,
    /// Excursion model record.
    pub excursion: Vec<u8>,
    /// Config block.
    pub config: Vec<u8>,
    /// Preset block.
    pub preset: Vec<u8>,
    /// Number of upcoming state queries that report the DSP stopped.
    pub dsp_stopped_reads: usize,
    /// Total state queries answered.
    pub state_reads: usize,
}

impl SimulatedChip {
    /// A plausible running amplifier with an 8 Ohm speaker resonating near 850 Hz.
    pub fn new(layout: BlockLayout) -> Self {
        let mut chip = Self {
            state: StateSnapshot {
                status_flags: StatusFlags(StatusFlags::ACTIVITY | StatusFlags::VOLUME_RDY),
                agc_gain: 0.0,
                lim_gain: 0.0,
                s_max: 2.0,
                t: 28,
                x1: 0.12,
                x2: 0.0,
                re: 7.8,
                short_on_mips: 0,
            },
            registers: vec![0; REGISTER_MAP_BYTES],
            impedance: encode_or_empty(&default_model(ModelKind::Impedance)),
            excursion: encode_or_empty(&default_model(ModelKind::Excursion)),
            config: vec![0; layout.config_len],
            preset: vec![0; layout.preset_len],
            dsp_stopped_reads: 0,
            state_reads: 0,
        };
        chip.set_info(RawInfoRegisters {
            status_register: 0x805f,
            battery_adc: RawInfoRegisters::battery_adc_for(3.7),
            ic_temp_raw: RawInfoRegisters::ic_temp_raw_for(35),
        });

        let defaults = [
            (CalibrationSlot::VisCal, 1.0),
            (CalibrationSlot::Vsense, 1.0),
            (CalibrationSlot::Isense, 1.0),
        ];
        for (slot, value) in defaults {
            // The config block always holds the three sense slots.
            let _ = patch_scalar(&mut chip.config, slot.offset(&layout), value, slot.frac_bits());
        }
        let agc = CalibrationSlot::AgcGainMax;
        let _ = patch_scalar(&mut chip.preset, agc.offset(&layout), 6.0, agc.frac_bits());
        chip
    }

    /// Overwrite the info registers at the top of the register map.
    pub fn set_info(&mut self, info: RawInfoRegisters) {
        self.registers[..6].copy_from_slice(&info.to_bytes());
    }

    fn model_mut(&mut self, kind: ModelKind) -> &mut Vec<u8> {
        match kind {
            ModelKind::Impedance => &mut self.impedance,
            ModelKind::Excursion => &mut self.excursion,
        }
    }
}

fn encode_or_empty(model: &SpeakerModel) -> Vec<u8> {
    model.to_wire().unwrap_or_default()
}

/// Synthetic model: a damped resonance for impedance, a leaky integrator
/// kernel for excursion.
fn default_model(kind: ModelKind) -> SpeakerModel {
    let fir = (0..spkboost_core::FIR_TAPS)
        .map(|i| {
            let t = i as f64;
            match kind {
                ModelKind::Impedance => {
                    let resonance = 0.02 * (-t / 20.0).exp() * (std::f64::consts::TAU * 0.106 * t).cos();
                    if i == 0 { 0.125 + resonance } else { resonance }
                }
                ModelKind::Excursion => 0.05 * (-(127.0 - t) / 12.0).exp(),
            }
        })
        .collect();
    SpeakerModel {
        fir,
        leakage_factor: 0.0078125,
        re_correction: 1.0,
        x_init_margin: 0.5,
        x_damage_margin: 0.75,
        x_margin: 0.25,
        bl: 1.6,
        f_res: 850,
        f_res_init: 850,
        qt: 1.2,
        x_max: 0.35,
        t_max: 120.0,
        t_coef_a: 0.0039,
        ..SpeakerModel::default()
    }
}

/// Backend holding simulated chips keyed by address.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    layout: BlockLayout,
    template: SimulatedChip,
    chips: BTreeMap<u8, SimulatedChip>,
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBackend {
    /// Backend with the default block layout.
    pub fn new() -> Self {
        Self::with_layout(BlockLayout::default())
    }

    /// Backend whose blocks follow `layout`.
    pub fn with_layout(layout: BlockLayout) -> Self {
        Self {
            layout,
            template: SimulatedChip::new(layout),
            chips: BTreeMap::new(),
        }
    }

    /// Use `state` for every chip opened from now on.
    pub fn with_state(mut self, state: StateSnapshot) -> Self {
        self.template.state = state;
        self
    }

    /// Use `info` as the info registers of every chip opened from now on.
    pub fn with_info(mut self, info: RawInfoRegisters) -> Self {
        self.template.set_info(info);
        self
    }

    /// Load `model` as the `kind` model of every chip opened from now on.
    ///
    /// # Errors
    ///
    /// [`Error::Format`] if the model cannot be serialized.
    pub fn with_model(mut self, kind: ModelKind, model: &SpeakerModel) -> Result<Self> {
        *self.template.model_mut(kind) = model.to_wire()?;
        Ok(self)
    }

    /// Report the DSP stopped for the first `reads` state queries of each chip.
    pub fn with_dsp_stopped(mut self, reads: usize) -> Self {
        self.template.dsp_stopped_reads = reads;
        self
    }

    /// Block layout this backend was built with.
    pub fn layout(&self) -> BlockLayout {
        self.layout
    }

    /// Opened chip at `address`.
    pub fn chip(&self, address: u8) -> Option<&SimulatedChip> {
        self.chips.get(&address)
    }

    /// Mutable access to the opened chip at `address`.
    pub fn chip_mut(&mut self, address: u8) -> Option<&mut SimulatedChip> {
        self.chips.get_mut(&address)
    }

    fn opened(&mut self, handle: DeviceHandle) -> Result<&mut SimulatedChip> {
        self.chips
            .get_mut(&handle.address)
            .ok_or_else(|| Error::Device(format!("device 0x{:02x} not opened", handle.address)))
    }
}

fn check_len(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::Device(format!(
            "{what}: {actual} bytes requested, block holds {expected}"
        )))
    }
}

impl DeviceBackend for SimulatedBackend {
    fn name(&self) -> &str {
        "simulated"
    }

    fn open(&mut self, index: usize, address: u8) -> Result<DeviceHandle> {
        let template = &self.template;
        self.chips.entry(address).or_insert_with(|| template.clone());
        Ok(DeviceHandle { index, address })
    }

    fn read_state(&mut self, handle: DeviceHandle) -> Result<StateReading> {
        let chip = self.opened(handle)?;
        chip.state_reads += 1;
        if chip.dsp_stopped_reads > 0 {
            chip.dsp_stopped_reads -= 1;
            return Ok(StateReading::DspNotRunning);
        }
        Ok(StateReading::Running(chip.state))
    }

    fn read_bytes(&mut self, handle: DeviceHandle, offset: usize, count: usize) -> Result<Vec<u8>> {
        let chip = self.opened(handle)?;
        chip.registers
            .get(offset..offset + count)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| Error::Device(format!("register read {offset}+{count} out of range")))
    }

    fn read_param(&mut self, handle: DeviceHandle, param: u8, len: usize) -> Result<Vec<u8>> {
        let chip = self.opened(handle)?;
        let kind = ModelKind::ALL
            .into_iter()
            .find(|k| k.param_id() == param)
            .ok_or_else(|| Error::Device(format!("unknown parameter 0x{param:02x}")))?;
        let record = chip.model_mut(kind).clone();
        check_len("parameter", record.len(), len)?;
        Ok(record)
    }

    fn write_speaker_params(&mut self, handle: DeviceHandle, bytes: &[u8]) -> Result<()> {
        check_len("speaker parameters", MODEL_BYTES, bytes.len())?;
        self.opened(handle)?.impedance = bytes.to_vec();
        Ok(())
    }

    fn read_config(&mut self, handle: DeviceHandle, len: usize) -> Result<Vec<u8>> {
        let chip = self.opened(handle)?;
        check_len("config", chip.config.len(), len)?;
        Ok(chip.config.clone())
    }

    fn write_config(&mut self, handle: DeviceHandle, bytes: &[u8]) -> Result<()> {
        let chip = self.opened(handle)?;
        check_len("config", chip.config.len(), bytes.len())?;
        chip.config.copy_from_slice(bytes);
        Ok(())
    }

    fn read_preset(&mut self, handle: DeviceHandle, len: usize) -> Result<Vec<u8>> {
        let chip = self.opened(handle)?;
        check_len("config+preset", chip.config.len() + chip.preset.len(), len)?;
        let mut out = chip.config.clone();
        out.extend_from_slice(&chip.preset);
        Ok(out)
    }

    fn write_preset(&mut self, handle: DeviceHandle, bytes: &[u8]) -> Result<()> {
        let chip = self.opened(handle)?;
        check_len("preset", chip.preset.len(), bytes.len())?;
        chip.preset.copy_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened() -> (SimulatedBackend, DeviceHandle) {
        let mut backend = SimulatedBackend::new();
        let handle = backend.open(0, 0x34).unwrap();
        (backend, handle)
    }

    #[test]
    fn default_chip_is_running() {
        let (mut backend, handle) = opened();
        match backend.read_state(handle).unwrap() {
            StateReading::Running(state) => assert_eq!(state.t, 28),
            StateReading::DspNotRunning => panic!("expected running DSP"),
        }
        let info = RawInfoRegisters::from_bytes(&backend.read_bytes(handle, 0, 6).unwrap()).unwrap();
        assert_eq!(info.ic_temp(), 35);
        assert!((info.battery_voltage() - 3.7).abs() < 0.01);
    }

    #[test]
    fn stopped_dsp_recovers_after_scripted_reads() {
        let mut backend = SimulatedBackend::new().with_dsp_stopped(2);
        let handle = backend.open(0, 0x34).unwrap();
        assert_eq!(backend.read_state(handle).unwrap(), StateReading::DspNotRunning);
        assert_eq!(backend.read_state(handle).unwrap(), StateReading::DspNotRunning);
        assert!(matches!(backend.read_state(handle).unwrap(), StateReading::Running(_)));
        assert_eq!(backend.chip(0x34).unwrap().state_reads, 3);
    }

    #[test]
    fn unopened_device_is_an_error() {
        let mut backend = SimulatedBackend::new();
        let handle = DeviceHandle { index: 0, address: 0x36 };
        assert!(matches!(backend.read_state(handle), Err(Error::Device(_))));
    }

    #[test]
    fn models_are_served_by_param_id() {
        let (mut backend, handle) = opened();
        let z = backend.read_param(handle, 0x86, MODEL_BYTES).unwrap();
        let x = backend.read_param(handle, 0xC1, MODEL_BYTES).unwrap();
        assert_eq!(z.len(), MODEL_BYTES);
        assert_ne!(z, x);
        assert!(backend.read_param(handle, 0x86, 10).is_err());
        assert!(backend.read_param(handle, 0x42, MODEL_BYTES).is_err());
    }

    #[test]
    fn block_writes_persist() {
        let (mut backend, handle) = opened();
        let layout = backend.layout();
        let mut config = backend.read_config(handle, layout.config_len).unwrap();
        config[100] = 0xab;
        backend.write_config(handle, &config).unwrap();
        let combined = backend.read_preset(handle, layout.preset_read_len()).unwrap();
        assert_eq!(combined[100], 0xab);
        assert!(backend.write_preset(handle, &[0; 3]).is_err());
    }

    #[test]
    fn speaker_params_replace_impedance_model() {
        let (mut backend, handle) = opened();
        let record = vec![0x11; MODEL_BYTES];
        backend.write_speaker_params(handle, &record).unwrap();
        assert_eq!(backend.read_param(handle, 0x86, MODEL_BYTES).unwrap(), record);
    }
}
