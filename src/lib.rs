pub mod config;
pub mod error;
pub mod hardware;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod registry;
pub mod scheduler;
pub mod tables;
pub mod transforms;

pub use crate::error::{BuildError, BuildResult, CalibrationError};
pub use crate::models::{BusHandle, ConfigIdentity, Pin, SensorDefinition, SensorFamily};
pub use crate::orchestrator::{FamilyTable, HardwareHandles, Orchestrator};
pub use crate::pipeline::{Pipeline, PipelineFactory, PipelineSet};

use crate::config::{AppConfig, Backend};
use crate::hardware::{HardwareIo, LogSink, ProbeBus, SimulatedHardware, W1Bus};
use anyhow::Context;
use log::{debug, error, info, warn};

/// Nominal RPM signal for host runs: 2400 RPM at one pulse per revolution.
const SIMULATED_PULSE_HZ: f32 = 40.0;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting application");

    tokio::select! {
        result = main_loop(&config) => {
            match result {
                Ok(_) => info!("Application completed successfully"),
                Err(e) => {
                    error!("Application error: {e:#}");
                    // Print chain of error causes
                    let mut source = e.source();
                    while let Some(e) = source {
                        error!("Caused by: {e}");
                        source = e.source();
                    }
                    return Err(e).context("Application failed to run");
                }
            }
        }
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
    }

    Ok(())
}

async fn main_loop(config: &AppConfig) -> anyhow::Result<()> {
    for warning in config.check_timing() {
        warn!("{}", warning);
    }

    let mut orchestrator = Orchestrator::new();
    let tables = tables::default_tables(config.rpm_pin(), config.hardware.rpm_multiplier);
    let built = orchestrator
        .bootstrap(&config.hardware_handles(), &tables)
        .context("Failed to build sensor pipelines")?;
    info!("{} pipeline(s) ready", built);

    for pipeline in orchestrator.pipelines().iter() {
        debug!("{}", pipeline);
    }
    debug!(
        "Configuration items:\n{}",
        orchestrator
            .config_items()
            .to_json()
            .context("Failed to export configuration items")?
    );

    let mut pulses = SimulatedHardware::new().with_pulses(config.rpm_pin(), SIMULATED_PULSE_HZ);
    let mut probes: Box<dyn ProbeBus> = match config.backend() {
        Backend::Sysfs => {
            let bus = W1Bus::new(&config.hardware.w1_root, &config.probes);
            info!("1-Wire probes present: {:?}", bus.discover());
            Box::new(bus)
        }
        Backend::Simulated => {
            info!("Using simulated probes");
            Box::new(simulated_probes())
        }
    };

    let mut io = HardwareIo::new(&mut pulses, probes.as_mut());
    let mut sink = LogSink;
    scheduler::run(orchestrator.pipelines_mut(), &mut io, &mut sink).await;
    Ok(())
}

fn simulated_probes() -> SimulatedHardware {
    SimulatedHardware::new()
        .with_probe(tables::coolant_temperature().id(), 82.0)
        .with_probe(tables::sea_water_in_temperature().id(), 14.0)
        .with_probe(tables::sea_water_out_temperature().id(), 31.0)
}
