//! Periodic sampling of built pipelines.
//!
//! Every pipeline keeps its own due time and is sampled at its own interval.
//! Due times advance from the previous due time, not from when the sample
//! actually ran, so a slow read does not shift the schedule.

use crate::hardware::{HardwareIo, TelemetrySink};
use crate::pipeline::PipelineSet;
use log::{debug, trace, warn};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Sample all pipelines until the task is cancelled.
pub async fn run(
    pipelines: &mut PipelineSet,
    io: &mut HardwareIo<'_>,
    sink: &mut dyn TelemetrySink,
) {
    drive(pipelines, io, sink, None).await;
}

/// Take `ticks` samples in schedule order and return how many published.
pub async fn run_for(
    pipelines: &mut PipelineSet,
    io: &mut HardwareIo<'_>,
    sink: &mut dyn TelemetrySink,
    ticks: usize,
) -> usize {
    drive(pipelines, io, sink, Some(ticks)).await
}

async fn drive(
    pipelines: &mut PipelineSet,
    io: &mut HardwareIo<'_>,
    sink: &mut dyn TelemetrySink,
    limit: Option<usize>,
) -> usize {
    if pipelines.is_empty() {
        warn!("No pipelines to sample");
        return 0;
    }
    debug!("Sampling {} pipeline(s)", pipelines.len());

    let start = Instant::now();
    let mut due = vec![start; pipelines.len()];
    let mut ticks = 0;
    let mut published = 0;

    while limit.map_or(true, |limit| ticks < limit) {
        // Ties go to the earliest built pipeline.
        let Some((index, when)) = due
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|(_, when)| *when)
        else {
            break;
        };
        sleep_until(when).await;

        let Some(pipeline) = pipelines.iter_mut().nth(index) else {
            break;
        };
        match pipeline.sample(io, sink) {
            Some(value) => {
                trace!("{} sampled {}", pipeline.definition().id(), value);
                published += 1;
            }
            None => debug!("{} produced no value", pipeline.definition().id()),
        }
        due[index] = when + pipeline.interval().max(MIN_INTERVAL);
        ticks += 1;
    }
    published
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::SimulatedHardware;
    use crate::models::{BusHandle, Pin};
    use crate::orchestrator::{HardwareHandles, Orchestrator};
    use crate::tables::default_tables;
    use indexmap::IndexMap;

    #[derive(Default)]
    struct CountingSink {
        counts: IndexMap<String, usize>,
    }

    impl TelemetrySink for CountingSink {
        fn publish(&mut self, path: &str, _value: f32) {
            *self.counts.entry(path.to_string()).or_default() += 1;
        }
    }

    fn build(counter_ms: u64, probe_ms: u64) -> PipelineSet {
        let handles = HardwareHandles {
            bus: Some(BusHandle::new(Pin(25))),
            counter_interval: Duration::from_millis(counter_ms),
            probe_interval: Duration::from_millis(probe_ms),
        };
        Orchestrator::new()
            .build_all(&handles, &default_tables(Pin(16), 1.0))
            .unwrap()
    }

    fn simulated() -> SimulatedHardware {
        SimulatedHardware::new()
            .with_pulses(Pin(16), 1000.0)
            .with_probe("coolantTemperature", 80.0)
            .with_probe("seaWaterInTemperature", 12.0)
            .with_probe("seaWaterOutTemperature", 30.0)
    }

    #[tokio::test]
    async fn test_each_pipeline_runs_at_its_own_interval() {
        let mut pipelines = build(5, 20);
        let mut pulses = simulated();
        let mut probes = simulated();
        let mut io = HardwareIo::new(&mut pulses, &mut probes);
        let mut sink = CountingSink::default();

        // t=0: all four, t=5,10,15: RPM, t=20: the three probes come first.
        let published = run_for(&mut pipelines, &mut io, &mut sink, 10).await;

        assert_eq!(published, 10);
        assert_eq!(sink.counts["propulsion.main.revolutions"], 4);
        assert_eq!(sink.counts["propulsion.main.coolantTemperature"], 2);
        assert_eq!(sink.counts["propulsion.main.seaWaterInTemperature"], 2);
        assert_eq!(sink.counts["propulsion.main.seaWaterOutTemperature"], 2);
    }

    #[tokio::test]
    async fn test_missing_probe_is_not_published() {
        let mut pipelines = build(5, 5);
        let mut pulses = SimulatedHardware::new();
        let mut probes = SimulatedHardware::new().with_probe("coolantTemperature", 80.0);
        let mut io = HardwareIo::new(&mut pulses, &mut probes);
        let mut sink = CountingSink::default();

        let published = run_for(&mut pipelines, &mut io, &mut sink, 4).await;

        assert_eq!(published, 2);
        assert_eq!(sink.counts.len(), 2);
        assert!(!sink.counts.contains_key("propulsion.main.seaWaterInTemperature"));
    }

    #[tokio::test]
    async fn test_empty_set_returns_immediately() {
        let mut pipelines = PipelineSet::new();
        let mut pulses = SimulatedHardware::new();
        let mut probes = SimulatedHardware::new();
        let mut io = HardwareIo::new(&mut pulses, &mut probes);
        let mut sink = CountingSink::default();

        assert_eq!(run_for(&mut pipelines, &mut io, &mut sink, 5).await, 0);
        run(&mut pipelines, &mut io, &mut sink).await;
    }
}
