use crate::error::BuildResult;
use crate::models::{BusHandle, ConfigIdentity, Pin, SensorDefinition, SensorFamily, StageKind};
use crate::pipeline::{OpenChain, Pipeline, Sink, Source, Transform};
use crate::registry::PathRegistry;
use crate::transforms::{Frequency, Linear};
use log::debug;
use std::time::Duration;

/// Builds one family's stage chain from a [`SensorDefinition`].
///
/// Implementations mint every path through the [`PathRegistry`] before any
/// stage is wired; if registration fails nothing is built and nothing is
/// left registered.
pub trait PipelineFactory {
    fn family(&self) -> SensorFamily;

    fn build(&self, definition: &SensorDefinition, paths: &mut PathRegistry)
        -> BuildResult<Pipeline>;
}

/// Validate the definition, derive its config identities and claim every
/// path in one atomic registration.
fn claim_paths(
    definition: &SensorDefinition,
    family: SensorFamily,
    paths: &mut PathRegistry,
) -> BuildResult<Vec<ConfigIdentity>> {
    let identities = ConfigIdentity::derive_all(definition, family)?;
    let config_paths: Vec<&str> = identities.iter().map(|id| id.path.as_str()).collect();
    paths.claim(definition.telemetry_path(), &config_paths)?;
    Ok(identities)
}

/// Pulse counter -> frequency scaling -> telemetry.
#[derive(Debug, Clone)]
pub struct CounterPipelineFactory {
    pub pin: Pin,
    pub interval: Duration,
    pub multiplier: f32,
}

impl CounterPipelineFactory {
    pub fn new(pin: Pin, interval: Duration, multiplier: f32) -> Self {
        Self {
            pin,
            interval,
            multiplier,
        }
    }
}

impl PipelineFactory for CounterPipelineFactory {
    fn family(&self) -> SensorFamily {
        SensorFamily::Counter
    }

    fn build(
        &self,
        definition: &SensorDefinition,
        paths: &mut PathRegistry,
    ) -> BuildResult<Pipeline> {
        let identities = claim_paths(definition, self.family(), paths)?;

        // Counter and frequency share one calibration entry.
        let calibrate = StageKind::CounterCalibration.config_path(definition.id());
        let source = Source::Counter { pin: self.pin };
        let chain = OpenChain::from_source(source, Some(calibrate.clone()))
            .connect_to(
                Transform::Frequency(Frequency::new(self.multiplier, self.interval)),
                Some(calibrate),
            )
            .terminate(
                Sink::Telemetry {
                    path: definition.telemetry_path().to_string(),
                },
                None,
            );

        let pipeline = Pipeline::new(
            definition.clone(),
            self.family(),
            self.interval,
            chain,
            identities,
        );
        debug!("Wired counter pipeline {}: {}", definition.id(), pipeline);
        Ok(pipeline)
    }
}

/// Bus probe -> linear calibration -> telemetry.
#[derive(Debug, Clone)]
pub struct BusProbePipelineFactory {
    pub bus: BusHandle,
    pub interval: Duration,
}

impl BusProbePipelineFactory {
    pub fn new(bus: BusHandle, interval: Duration) -> Self {
        Self { bus, interval }
    }
}

impl PipelineFactory for BusProbePipelineFactory {
    fn family(&self) -> SensorFamily {
        SensorFamily::BusProbe
    }

    fn build(
        &self,
        definition: &SensorDefinition,
        paths: &mut PathRegistry,
    ) -> BuildResult<Pipeline> {
        let identities = claim_paths(definition, self.family(), paths)?;

        let id = definition.id();
        let chain = OpenChain::from_source(
            Source::Probe {
                bus: self.bus,
                address: id.to_string(),
            },
            Some(StageKind::ProbeSelection.config_path(id)),
        )
        .connect_to(
            Transform::Linear(Linear::default()),
            Some(StageKind::LinearCalibration.config_path(id)),
        )
        .terminate(
            Sink::Telemetry {
                path: definition.telemetry_path().to_string(),
            },
            Some(StageKind::TelemetryPath.config_path(id)),
        );

        let pipeline = Pipeline::new(
            definition.clone(),
            self.family(),
            self.interval,
            chain,
            identities,
        );
        debug!("Wired bus probe pipeline {}: {}", id, pipeline);
        Ok(pipeline)
    }
}
