//! Interfaces to the physical I/O layer and the telemetry transport.
//!
//! Pipelines only see these traits. Concrete drivers live in the submodules:
//! a Linux 1-Wire sysfs bus, a simulated source for host runs, and two sinks.

use crate::models::{BusHandle, Pin, Reading};

pub mod simulated;
pub mod sinks;
pub mod w1;

pub use simulated::SimulatedHardware;
pub use sinks::{LogSink, RecordingSink};
pub use w1::W1Bus;

/// Edge counter on a dedicated pin.
pub trait PulseSource {
    /// Edges counted since the previous read of `pin`, with the read time.
    fn read_edge_count(&mut self, pin: Pin) -> Reading;
}

/// Shared multi-drop probe bus.
pub trait ProbeBus {
    /// Raw value of the probe selected by `address`, or `None` if the probe
    /// is absent or the read failed.
    fn read_probe(&mut self, bus: BusHandle, address: &str) -> Option<Reading>;
}

/// Telemetry output. Publishing is idempotent and unacknowledged.
pub trait TelemetrySink {
    fn publish(&mut self, path: &str, value: f32);
}

/// The hardware drivers a pipeline reads from during one sample.
pub struct HardwareIo<'a> {
    pub pulses: &'a mut dyn PulseSource,
    pub probes: &'a mut dyn ProbeBus,
}

impl<'a> HardwareIo<'a> {
    pub fn new(pulses: &'a mut dyn PulseSource, probes: &'a mut dyn ProbeBus) -> Self {
        Self { pulses, probes }
    }
}
