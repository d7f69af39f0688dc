//! Stage chains and the pipelines that own them.
//!
//! A pipeline is `Source -> Transform* -> Sink`. The stages live in a flat
//! arena owned by the pipeline and point at their successor by index, so the
//! chain has a single owner and no reference cycles. [`OpenChain`] only lets
//! a sink terminate a chain that already has a source, which keeps the shape
//! correct by construction.

use crate::error::CalibrationError;
use crate::hardware::{HardwareIo, TelemetrySink};
use crate::models::{BusHandle, ConfigIdentity, Pin, Reading, SensorDefinition, SensorFamily};
use crate::transforms::{Calibration, Frequency, Linear};
use std::fmt;
use std::time::Duration;

pub mod factory;
pub mod set;

pub use factory::{BusProbePipelineFactory, CounterPipelineFactory, PipelineFactory};
pub use set::PipelineSet;

/// Index of a stage within its pipeline's arena.
pub type StageId = usize;

/// The source always sits at the head of the arena.
const HEAD: StageId = 0;

#[derive(Debug, Clone)]
pub enum Source {
    /// Edge counter sampled every interval.
    Counter { pin: Pin },
    /// Probe on a shared bus, selected by sensor id.
    Probe { bus: BusHandle, address: String },
}

impl Source {
    fn read(&self, io: &mut HardwareIo<'_>) -> Option<Reading> {
        match self {
            Source::Counter { pin } => Some(io.pulses.read_edge_count(*pin)),
            Source::Probe { bus, address } => io.probes.read_probe(*bus, address),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Transform {
    Frequency(Frequency),
    Linear(Linear),
}

impl Transform {
    fn apply(&mut self, reading: Reading) -> Option<Reading> {
        match self {
            Transform::Frequency(frequency) => frequency.apply(reading),
            Transform::Linear(linear) => Some(linear.apply(reading)),
        }
    }

    pub fn calibration(&self) -> Calibration {
        match self {
            Transform::Frequency(frequency) => frequency.calibration(),
            Transform::Linear(linear) => linear.calibration(),
        }
    }

    fn set_calibration(&mut self, calibration: Calibration) {
        match self {
            Transform::Frequency(frequency) => frequency.set_calibration(calibration),
            Transform::Linear(linear) => linear.set_calibration(calibration),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Sink {
    Telemetry { path: String },
}

#[derive(Debug, Clone)]
pub enum StageNode {
    Source(Source),
    Transform(Transform),
    Sink(Sink),
}

impl fmt::Display for StageNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageNode::Source(Source::Counter { pin }) => write!(f, "counter({pin})"),
            StageNode::Source(Source::Probe { address, .. }) => write!(f, "probe({address})"),
            StageNode::Transform(Transform::Frequency(_)) => write!(f, "frequency"),
            StageNode::Transform(Transform::Linear(_)) => write!(f, "linear"),
            StageNode::Sink(Sink::Telemetry { path }) => write!(f, "publish({path})"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stage {
    pub node: StageNode,
    pub config_path: Option<String>,
    next: Option<StageId>,
}

impl Stage {
    pub fn next(&self) -> Option<StageId> {
        self.next
    }
}

/// A chain with a source and zero or more transforms, still missing its sink.
#[derive(Debug)]
pub struct OpenChain {
    stages: Vec<Stage>,
}

impl OpenChain {
    pub fn from_source(source: Source, config_path: Option<String>) -> Self {
        let mut chain = Self { stages: Vec::new() };
        chain.push(StageNode::Source(source), config_path);
        chain
    }

    pub fn connect_to(mut self, transform: Transform, config_path: Option<String>) -> Self {
        self.push(StageNode::Transform(transform), config_path);
        self
    }

    pub fn terminate(mut self, sink: Sink, config_path: Option<String>) -> StageChain {
        self.push(StageNode::Sink(sink), config_path);
        StageChain {
            stages: self.stages,
        }
    }

    fn push(&mut self, node: StageNode, config_path: Option<String>) {
        let id = self.stages.len();
        if let Some(tail) = self.stages.last_mut() {
            tail.next = Some(id);
        }
        self.stages.push(Stage {
            node,
            config_path,
            next: None,
        });
    }
}

/// A complete `Source -> Transform* -> Sink` chain.
#[derive(Debug)]
pub struct StageChain {
    stages: Vec<Stage>,
}

/// One wired sensor pipeline, owning its stages.
#[derive(Debug)]
pub struct Pipeline {
    definition: SensorDefinition,
    family: SensorFamily,
    interval: Duration,
    stages: Vec<Stage>,
    config_items: Vec<ConfigIdentity>,
}

impl Pipeline {
    pub(crate) fn new(
        definition: SensorDefinition,
        family: SensorFamily,
        interval: Duration,
        chain: StageChain,
        config_items: Vec<ConfigIdentity>,
    ) -> Self {
        Self {
            definition,
            family,
            interval,
            stages: chain.stages,
            config_items,
        }
    }

    pub fn definition(&self) -> &SensorDefinition {
        &self.definition
    }

    pub fn family(&self) -> SensorFamily {
        self.family
    }

    /// How often the scheduler should sample this pipeline.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn telemetry_path(&self) -> &str {
        self.definition.telemetry_path()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn config_items(&self) -> &[ConfigIdentity] {
        &self.config_items
    }

    pub fn transform_count(&self) -> usize {
        self.stages
            .iter()
            .filter(|stage| matches!(stage.node, StageNode::Transform(_)))
            .count()
    }

    /// Read the source, run the value through every transform and publish it.
    ///
    /// Returns the published value, or `None` if the source had nothing or a
    /// transform swallowed the reading.
    pub fn sample(&mut self, io: &mut HardwareIo<'_>, sink: &mut dyn TelemetrySink) -> Option<f32> {
        let mut reading: Option<Reading> = None;
        let mut cursor = Some(HEAD);
        while let Some(id) = cursor {
            let stage = &mut self.stages[id];
            match &mut stage.node {
                StageNode::Source(source) => reading = Some(source.read(io)?),
                StageNode::Transform(transform) => reading = Some(transform.apply(reading?)?),
                StageNode::Sink(Sink::Telemetry { path }) => {
                    let value = reading?.value;
                    sink.publish(path, value);
                    return Some(value);
                }
            }
            cursor = stage.next;
        }
        None
    }

    pub fn has_config_path(&self, config_path: &str) -> bool {
        self.stages
            .iter()
            .any(|stage| stage.config_path.as_deref() == Some(config_path))
    }

    /// Retune the transform addressed by `config_path`.
    pub fn calibrate(
        &mut self,
        config_path: &str,
        calibration: Calibration,
    ) -> Result<(), CalibrationError> {
        if !self.has_config_path(config_path) {
            return Err(CalibrationError::UnknownConfigPath(config_path.to_string()));
        }
        let transform = self
            .stages
            .iter_mut()
            .filter(|stage| stage.config_path.as_deref() == Some(config_path))
            .find_map(|stage| match &mut stage.node {
                StageNode::Transform(transform) => Some(transform),
                _ => None,
            });
        match transform {
            Some(transform) => {
                transform.set_calibration(calibration);
                Ok(())
            }
            None => Err(CalibrationError::NotCalibratable(config_path.to_string())),
        }
    }

    pub fn calibration(&self, config_path: &str) -> Option<Calibration> {
        self.stages
            .iter()
            .filter(|stage| stage.config_path.as_deref() == Some(config_path))
            .find_map(|stage| match &stage.node {
                StageNode::Transform(transform) => Some(transform.calibration()),
                _ => None,
            })
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut cursor = Some(HEAD);
        let mut first = true;
        while let Some(id) = cursor {
            if !first {
                write!(f, " -> ")?;
            }
            write!(f, "{}", self.stages[id].node)?;
            first = false;
            cursor = self.stages[id].next;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{ProbeBus, PulseSource, RecordingSink};

    struct FixedIo {
        count: f32,
        probe: Option<f32>,
        now_ms: u64,
    }

    impl PulseSource for FixedIo {
        fn read_edge_count(&mut self, _pin: Pin) -> Reading {
            self.now_ms += 1000;
            Reading::new(self.count, self.now_ms)
        }
    }

    impl ProbeBus for FixedIo {
        fn read_probe(&mut self, _bus: BusHandle, _address: &str) -> Option<Reading> {
            self.probe.map(|value| Reading::new(value, self.now_ms))
        }
    }

    fn probe_pipeline() -> Pipeline {
        let definition = SensorDefinition::new(
            "coolantTemperature",
            "propulsion.main.coolantTemperature",
            "Coolant",
            (1, 2, 3),
        );
        let chain = OpenChain::from_source(
            Source::Probe {
                bus: BusHandle::new(Pin(25)),
                address: "coolantTemperature".into(),
            },
            Some("/coolantTemperature/oneWire".into()),
        )
        .connect_to(
            Transform::Linear(Linear::default()),
            Some("/coolantTemperature/linear".into()),
        )
        .terminate(
            Sink::Telemetry {
                path: "propulsion.main.coolantTemperature".into(),
            },
            Some("/coolantTemperature/skPath".into()),
        );
        Pipeline::new(
            definition,
            SensorFamily::BusProbe,
            Duration::from_secs(2),
            chain,
            Vec::new(),
        )
    }

    #[test]
    fn test_chain_links_by_index() {
        let pipeline = probe_pipeline();
        let stages = pipeline.stages();
        assert_eq!(stages.len(), 3);
        assert!(matches!(stages[0].node, StageNode::Source(_)));
        assert_eq!(stages[0].next(), Some(1));
        assert_eq!(stages[1].next(), Some(2));
        assert_eq!(stages[2].next(), None);
        assert_eq!(pipeline.transform_count(), 1);
        assert_eq!(
            pipeline.to_string(),
            "probe(coolantTemperature) -> linear -> publish(propulsion.main.coolantTemperature)"
        );
    }

    #[test]
    fn test_chain_without_transform() {
        let chain = OpenChain::from_source(Source::Counter { pin: Pin(4) }, None)
            .terminate(Sink::Telemetry { path: "a.b".into() }, None);
        assert_eq!(chain.stages.len(), 2);
        assert_eq!(chain.stages[0].next(), Some(1));
    }

    #[test]
    fn test_sample_publishes_calibrated_value() {
        let mut pipeline = probe_pipeline();
        let mut pulses = FixedIo { count: 0.0, probe: None, now_ms: 0 };
        let mut probes = FixedIo { count: 0.0, probe: Some(300.0), now_ms: 0 };
        let mut sink = RecordingSink::new();

        pipeline
            .calibrate("/coolantTemperature/linear", Calibration::new(1.0, -0.5))
            .unwrap();
        let value = pipeline.sample(&mut HardwareIo::new(&mut pulses, &mut probes), &mut sink);

        assert_eq!(value, Some(299.5));
        assert_eq!(sink.latest("propulsion.main.coolantTemperature"), Some(299.5));
        assert_eq!(
            pipeline.calibration("/coolantTemperature/linear"),
            Some(Calibration::new(1.0, -0.5))
        );
    }

    #[test]
    fn test_missing_probe_publishes_nothing() {
        let mut pipeline = probe_pipeline();
        let mut pulses = FixedIo { count: 0.0, probe: None, now_ms: 0 };
        let mut probes = FixedIo { count: 0.0, probe: None, now_ms: 0 };
        let mut sink = RecordingSink::new();

        let mut io = HardwareIo::new(&mut pulses, &mut probes);
        assert_eq!(pipeline.sample(&mut io, &mut sink), None);
        assert_eq!(sink.published, 0);
    }

    #[test]
    fn test_calibration_errors() {
        let mut pipeline = probe_pipeline();
        assert_eq!(
            pipeline.calibrate("/coolantTemperature/skPath", Calibration::IDENTITY),
            Err(CalibrationError::NotCalibratable("/coolantTemperature/skPath".into()))
        );
        assert_eq!(
            pipeline.calibrate("/nope/linear", Calibration::IDENTITY),
            Err(CalibrationError::UnknownConfigPath("/nope/linear".into()))
        );
    }
}
