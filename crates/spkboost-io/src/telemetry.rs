//! Live telemetry decoding.

use spkboost_core::live::INFO_REGISTER_BYTES;
use spkboost_core::{LiveDataRecord, RawInfoRegisters};

use crate::Result;
use crate::device::{DeviceBackend, DeviceHandle, StateReading};
use crate::supervisor::{AlgorithmHealth, AnomalySupervisor};

/// Outcome of one telemetry read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiveData {
    /// A complete sample.
    Live(LiveDataRecord),
    /// The DSP is not running; no registers were read.
    DspNotRunning,
    /// The supervisor found the algorithm unhealthy and forced one reload.
    ReloadIssued {
        /// Status register of the sample that triggered the reload.
        status_register: u16,
    },
}

/// Read one telemetry sample from `handle` and run the supervisor checks.
///
/// The state query comes first; if the DSP is not running nothing else is
/// read. Otherwise the six info registers are read and decoded, then the
/// supervisor decides between a forced reload and normal incident handling.
pub fn decode_live_data(
    backend: &mut dyn DeviceBackend,
    supervisor: &mut dyn AnomalySupervisor,
    handle: DeviceHandle,
) -> Result<LiveData> {
    let state = match backend.read_state(handle)? {
        StateReading::Running(state) => state,
        StateReading::DspNotRunning => return Ok(LiveData::DspNotRunning),
    };
    tracing::debug!(
        address = handle.address,
        "state: flags {}, agcGain {:.1} limGain {:.1} sMax {:.1} T {} X1 {:.1} Re {:.2} shortOnMips {}",
        state.status_flags,
        state.agc_gain,
        state.lim_gain,
        state.s_max,
        state.t,
        state.x1,
        state.re,
        state.short_on_mips
    );

    let bytes = backend.read_bytes(handle, 0, INFO_REGISTER_BYTES)?;
    let regs = RawInfoRegisters::from_bytes(&bytes)?;
    let record = LiveDataRecord::from_parts(&state, regs);

    if supervisor.check_algorithm_health(backend, handle)? == AlgorithmHealth::NeedsReload {
        tracing::warn!(
            address = handle.address,
            status_register = record.status_register,
            "algorithm check failed, forcing reload"
        );
        supervisor.force_reload(backend, handle)?;
        return Ok(LiveData::ReloadIssued {
            status_register: record.status_register,
        });
    }

    let events = supervisor.classify_events(record.status_register);
    supervisor.resolve_incident(backend, handle, events)?;
    Ok(LiveData::Live(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventSet, PassiveSupervisor, SimulatedBackend};
    use spkboost_core::{StateSnapshot, StatusFlags};

    #[derive(Default)]
    struct Recording {
        reloads: usize,
        resolved: Vec<EventSet>,
        unhealthy: bool,
    }

    impl AnomalySupervisor for Recording {
        fn check_algorithm_health(
            &mut self,
            _backend: &mut dyn DeviceBackend,
            _handle: DeviceHandle,
        ) -> Result<AlgorithmHealth> {
            Ok(if self.unhealthy {
                AlgorithmHealth::NeedsReload
            } else {
                AlgorithmHealth::Healthy
            })
        }

        fn force_reload(
            &mut self,
            _backend: &mut dyn DeviceBackend,
            _handle: DeviceHandle,
        ) -> Result<()> {
            self.reloads += 1;
            Ok(())
        }

        fn classify_events(&self, status_register: u16) -> EventSet {
            EventSet(u32::from(status_register & 0x0f))
        }

        fn resolve_incident(
            &mut self,
            _backend: &mut dyn DeviceBackend,
            _handle: DeviceHandle,
            events: EventSet,
        ) -> Result<()> {
            self.resolved.push(events);
            Ok(())
        }
    }

    fn backend() -> (SimulatedBackend, DeviceHandle) {
        let mut backend = SimulatedBackend::new()
            .with_state(StateSnapshot {
                status_flags: StatusFlags(StatusFlags::ACTIVITY),
                agc_gain: 1.5,
                t: 40,
                re: 7.5,
                ..StateSnapshot::default()
            })
            .with_info(RawInfoRegisters::from_bytes(&[0x12, 0x34, 0x00, 0x64, 0x01, 0x90]).unwrap());
        let handle = backend.open(0, 0x34).unwrap();
        (backend, handle)
    }

    #[test]
    fn reference_vector_decodes() {
        let (mut backend, handle) = backend();
        let LiveData::Live(record) =
            decode_live_data(&mut backend, &mut PassiveSupervisor, handle).unwrap()
        else {
            panic!("expected a live record");
        };
        assert_eq!(record.status_register, 0x1234);
        assert!((record.battery_voltage - 0.537_109_4).abs() < 1e-6);
        assert_eq!(record.ic_temp, -112);
        assert_eq!(record.agc_gain, 1.5);
        assert_eq!(record.speaker_temp, 40);
    }

    #[test]
    fn dsp_not_running_short_circuits() {
        let mut backend = SimulatedBackend::new().with_dsp_stopped(1);
        let handle = backend.open(0, 0x34).unwrap();
        let mut supervisor = Recording::default();
        assert_eq!(
            decode_live_data(&mut backend, &mut supervisor, handle).unwrap(),
            LiveData::DspNotRunning
        );
        assert!(supervisor.resolved.is_empty());
        assert_eq!(supervisor.reloads, 0);
    }

    #[test]
    fn healthy_sample_resolves_events() {
        let (mut backend, handle) = backend();
        let mut supervisor = Recording::default();
        decode_live_data(&mut backend, &mut supervisor, handle).unwrap();
        assert_eq!(supervisor.resolved, [EventSet(0x4)]);
    }

    #[test]
    fn unhealthy_sample_reloads_once() {
        let (mut backend, handle) = backend();
        let mut supervisor = Recording {
            unhealthy: true,
            ..Recording::default()
        };
        assert_eq!(
            decode_live_data(&mut backend, &mut supervisor, handle).unwrap(),
            LiveData::ReloadIssued {
                status_register: 0x1234
            }
        );
        assert_eq!(supervisor.reloads, 1);
        assert!(supervisor.resolved.is_empty());
    }
}
