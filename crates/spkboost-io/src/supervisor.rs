//! Hooks for anomaly detection and recovery.
//!
//! After every telemetry sample the decoder asks an [`AnomalySupervisor`]
//! whether the protection algorithm is still sane. If it is not, the
//! supervisor forces a firmware reload. Otherwise the status register is
//! classified into events and the supervisor resolves them.
//!
//! The classification policy is device-specific and lives outside this
//! crate; [`PassiveSupervisor`] never intervenes.

use crate::device::{DeviceBackend, DeviceHandle};
use crate::Result;

/// Verdict of an algorithm sanity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmHealth {
    /// Keep running.
    Healthy,
    /// The DSP state is inconsistent and must be reloaded.
    NeedsReload,
}

/// Events derived from a status register, as a policy-defined bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct EventSet(pub u32);

impl EventSet {
    /// No events.
    pub const NONE: EventSet = EventSet(0);

    /// True if no event is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Sanity checks and recovery actions for one amplifier.
pub trait AnomalySupervisor: Send {
    /// Decide whether the algorithm on `handle` is healthy.
    fn check_algorithm_health(
        &mut self,
        backend: &mut dyn DeviceBackend,
        handle: DeviceHandle,
    ) -> Result<AlgorithmHealth>;

    /// Reload firmware and settings on `handle`.
    fn force_reload(&mut self, backend: &mut dyn DeviceBackend, handle: DeviceHandle)
    -> Result<()>;

    /// Map a status register value to events.
    fn classify_events(&self, status_register: u16) -> EventSet;

    /// Act on the events found in the latest sample.
    fn resolve_incident(
        &mut self,
        backend: &mut dyn DeviceBackend,
        handle: DeviceHandle,
        events: EventSet,
    ) -> Result<()>;
}

/// Supervisor that reports every device healthy and never acts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassiveSupervisor;

impl AnomalySupervisor for PassiveSupervisor {
    fn check_algorithm_health(
        &mut self,
        _backend: &mut dyn DeviceBackend,
        _handle: DeviceHandle,
    ) -> Result<AlgorithmHealth> {
        Ok(AlgorithmHealth::Healthy)
    }

    fn force_reload(
        &mut self,
        _backend: &mut dyn DeviceBackend,
        handle: DeviceHandle,
    ) -> Result<()> {
        tracing::warn!(address = handle.address, "reload requested but supervisor is passive");
        Ok(())
    }

    fn classify_events(&self, _status_register: u16) -> EventSet {
        EventSet::NONE
    }

    fn resolve_incident(
        &mut self,
        _backend: &mut dyn DeviceBackend,
        _handle: DeviceHandle,
        _events: EventSet,
    ) -> Result<()> {
        Ok(())
    }
}
