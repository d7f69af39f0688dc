//! Drives the definition tables through their factories.
//!
//! This is the only surface bootstrap code calls. Each family moves through
//! `Uninitialized -> HandlesBound -> PipelinesBuilt -> Registered`, and the
//! first error of any kind aborts the whole pass.

use crate::error::{BuildError, BuildResult};
use crate::models::{BusHandle, Pin, SensorDefinition, SensorFamily};
use crate::pipeline::{
    BusProbePipelineFactory, CounterPipelineFactory, Pipeline, PipelineFactory, PipelineSet,
};
use crate::registry::{ConfigItemRegistry, PathRegistry};
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyState {
    Uninitialized,
    HandlesBound,
    PipelinesBuilt,
    Registered,
}

/// Hardware resources supplied once at process start.
#[derive(Debug, Clone)]
pub struct HardwareHandles {
    /// Shared probe bus; required when a bus probe table is non-empty.
    pub bus: Option<BusHandle>,
    pub counter_interval: Duration,
    pub probe_interval: Duration,
}

/// A counter definition with the pin and scale it claims.
#[derive(Debug, Clone)]
pub struct CounterEntry {
    pub pin: Pin,
    pub multiplier: f32,
    pub definition: SensorDefinition,
}

/// The definitions of one sensor family.
#[derive(Debug, Clone)]
pub enum FamilyTable {
    Counter(Vec<CounterEntry>),
    BusProbe(Vec<SensorDefinition>),
}

impl FamilyTable {
    pub fn family(&self) -> SensorFamily {
        match self {
            FamilyTable::Counter(_) => SensorFamily::Counter,
            FamilyTable::BusProbe(_) => SensorFamily::BusProbe,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FamilyTable::Counter(entries) => entries.len(),
            FamilyTable::BusProbe(definitions) => definitions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PinOwner {
    Counter(String),
    Bus,
}

#[derive(Debug, Default)]
pub struct Orchestrator {
    paths: PathRegistry,
    config_items: ConfigItemRegistry,
    pins: IndexMap<Pin, PinOwner>,
    states: IndexMap<SensorFamily, FamilyState>,
    pipelines: PipelineSet,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, family: SensorFamily) -> FamilyState {
        self.states
            .get(&family)
            .copied()
            .unwrap_or(FamilyState::Uninitialized)
    }

    pub fn paths(&self) -> &PathRegistry {
        &self.paths
    }

    pub fn config_items(&self) -> &ConfigItemRegistry {
        &self.config_items
    }

    pub fn is_pin_bound(&self, pin: Pin) -> bool {
        self.pins.contains_key(&pin)
    }

    pub fn bound_pin_count(&self) -> usize {
        self.pins.len()
    }

    pub fn pipelines(&self) -> &PipelineSet {
        &self.pipelines
    }

    pub fn pipelines_mut(&mut self) -> &mut PipelineSet {
        &mut self.pipelines
    }

    pub fn into_pipelines(self) -> PipelineSet {
        self.pipelines
    }

    /// Build and register every table, in order.
    ///
    /// Bindings and registered paths persist across calls, so a later call
    /// that reuses a pin or a path fails just as it would within one call.
    /// A failed pass rolls back every path, pin and state it touched.
    pub fn build_all(
        &mut self,
        handles: &HardwareHandles,
        tables: &[FamilyTable],
    ) -> BuildResult<PipelineSet> {
        let paths = self.paths.clone();
        let pins = self.pins.clone();
        let states = self.states.clone();

        let set = match self.build_tables(handles, tables) {
            Ok(set) => set,
            Err(err) => {
                warn!("Build pass failed, rolling back: {}", err);
                self.paths = paths;
                self.pins = pins;
                self.states = states;
                return Err(err);
            }
        };

        let items = set.publish_config_items(&mut self.config_items);
        for table in tables {
            self.states.insert(table.family(), FamilyState::Registered);
        }
        info!(
            "Registered {} pipeline(s) with {} configuration item(s)",
            set.len(),
            items
        );
        Ok(set)
    }

    /// Build all tables and keep the pipelines for the process lifetime.
    /// Returns how many were built.
    pub fn bootstrap(
        &mut self,
        handles: &HardwareHandles,
        tables: &[FamilyTable],
    ) -> BuildResult<usize> {
        let set = self.build_all(handles, tables)?;
        let count = set.len();
        self.pipelines.extend(set);
        Ok(count)
    }

    fn build_tables(
        &mut self,
        handles: &HardwareHandles,
        tables: &[FamilyTable],
    ) -> BuildResult<PipelineSet> {
        let mut set = PipelineSet::new();
        for table in tables {
            let family = table.family();
            let built = self.build_family(handles, table)?;
            info!("Built {} {} pipeline(s)", built.len(), family);
            set.extend(built);
        }
        Ok(set)
    }

    fn build_family(
        &mut self,
        handles: &HardwareHandles,
        table: &FamilyTable,
    ) -> BuildResult<PipelineSet> {
        let family = table.family();
        let mut built = PipelineSet::new();

        match table {
            FamilyTable::BusProbe(definitions) => {
                // An empty table needs no bus.
                let bus = if definitions.is_empty() {
                    None
                } else {
                    Some(self.bind_bus(handles.bus)?)
                };
                self.states.insert(family, FamilyState::HandlesBound);

                if let Some(bus) = bus {
                    let factory = BusProbePipelineFactory::new(bus, handles.probe_interval);
                    for definition in definitions {
                        built.insert(self.build_one(&factory, definition)?);
                    }
                }
            }
            FamilyTable::Counter(entries) => {
                self.states.insert(family, FamilyState::HandlesBound);

                for entry in entries {
                    self.check_pin_free(entry.pin)?;
                    let factory = CounterPipelineFactory::new(
                        entry.pin,
                        handles.counter_interval,
                        entry.multiplier,
                    );
                    built.insert(self.build_one(&factory, &entry.definition)?);
                    self.pins.insert(
                        entry.pin,
                        PinOwner::Counter(entry.definition.id().to_string()),
                    );
                }
            }
        }

        self.states.insert(family, FamilyState::PipelinesBuilt);
        Ok(built)
    }

    fn build_one(
        &mut self,
        factory: &dyn PipelineFactory,
        definition: &SensorDefinition,
    ) -> BuildResult<Pipeline> {
        debug!(
            "Building {} pipeline for {}",
            factory.family(),
            definition.id()
        );
        factory.build(definition, &mut self.paths)
    }

    fn bind_bus(&mut self, bus: Option<BusHandle>) -> BuildResult<BusHandle> {
        let bus = bus.ok_or_else(|| BuildError::binding("probe bus", "no bus handle supplied"))?;
        match self.pins.get(&bus.pin) {
            Some(PinOwner::Counter(owner)) => Err(BuildError::binding(
                bus.pin,
                format!("already bound to counter pipeline '{owner}'"),
            )),
            Some(PinOwner::Bus) => Ok(bus),
            None => {
                debug!("Bound {}", bus);
                self.pins.insert(bus.pin, PinOwner::Bus);
                Ok(bus)
            }
        }
    }

    fn check_pin_free(&self, pin: Pin) -> BuildResult<()> {
        match self.pins.get(&pin) {
            Some(PinOwner::Counter(owner)) => Err(BuildError::binding(
                pin,
                format!("already bound to counter pipeline '{owner}'"),
            )),
            Some(PinOwner::Bus) => Err(BuildError::binding(pin, "already bound to the probe bus")),
            None => Ok(()),
        }
    }
}
