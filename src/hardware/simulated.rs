use crate::hardware::{ProbeBus, PulseSource};
use crate::models::{BusHandle, Pin, Reading};
use indexmap::IndexMap;
use rand::Rng;
use std::time::Instant;

const CELSIUS_TO_KELVIN: f32 = 273.15;

/// Stand-in for the GPIO counter and the 1-Wire bus on a development host.
///
/// Each pin produces pulses at a configured frequency with a little jitter;
/// each probe address reports a configured temperature plus noise.
#[derive(Debug)]
pub struct SimulatedHardware {
    started: Instant,
    pulse_hz: IndexMap<Pin, f32>,
    last_read_ms: IndexMap<Pin, u64>,
    probe_celsius: IndexMap<String, f32>,
}

impl Default for SimulatedHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedHardware {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            pulse_hz: IndexMap::new(),
            last_read_ms: IndexMap::new(),
            probe_celsius: IndexMap::new(),
        }
    }

    pub fn with_pulses(mut self, pin: Pin, hz: f32) -> Self {
        self.pulse_hz.insert(pin, hz);
        self
    }

    pub fn with_probe(mut self, address: &str, celsius: f32) -> Self {
        self.probe_celsius.insert(address.to_lowercase(), celsius);
        self
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

impl PulseSource for SimulatedHardware {
    fn read_edge_count(&mut self, pin: Pin) -> Reading {
        let now = self.now_ms();
        let last = self.last_read_ms.insert(pin, now).unwrap_or(now);
        let hz = self.pulse_hz.get(&pin).copied().unwrap_or(0.0);
        let expected = hz * now.saturating_sub(last) as f32 / 1000.0;
        let jitter: f32 = if expected > 0.0 {
            rand::thread_rng().gen_range(-0.5..0.5)
        } else {
            0.0
        };
        Reading::new((expected + jitter).max(0.0).round(), now)
    }
}

impl ProbeBus for SimulatedHardware {
    fn read_probe(&mut self, _bus: BusHandle, address: &str) -> Option<Reading> {
        let celsius = *self.probe_celsius.get(&address.to_lowercase())?;
        let noise: f32 = rand::thread_rng().gen_range(-0.1..0.1);
        Some(Reading::new(celsius + noise + CELSIUS_TO_KELVIN, self.now_ms()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_probe_is_absent() {
        let mut sim = SimulatedHardware::new().with_probe("coolantTemperature", 80.0);
        let bus = BusHandle::new(Pin(25));
        assert!(sim.read_probe(bus, "exhaustTemperature").is_none());

        let reading = sim.read_probe(bus, "coolanttemperature").unwrap();
        assert!((reading.value - 353.15).abs() < 0.2);
    }

    #[test]
    fn test_idle_pin_counts_nothing() {
        let mut sim = SimulatedHardware::new();
        assert_eq!(sim.read_edge_count(Pin(16)).value, 0.0);
        assert_eq!(sim.read_edge_count(Pin(16)).value, 0.0);
    }
}
