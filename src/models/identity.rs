use crate::error::BuildResult;
use crate::models::definition::SensorDefinition;
use serde::Serialize;
use std::fmt;

/// Sensor families, each built by its own pipeline factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SensorFamily {
    /// Edge-triggered pulse counter on a dedicated pin.
    Counter,
    /// Named probe on a shared multi-drop bus.
    BusProbe,
}

impl SensorFamily {
    /// Configuration stages minted for one pipeline of this family, in
    /// source-to-sink order.
    pub fn config_stages(self) -> &'static [StageKind] {
        match self {
            SensorFamily::Counter => &[StageKind::CounterCalibration],
            SensorFamily::BusProbe => &[
                StageKind::ProbeSelection,
                StageKind::LinearCalibration,
                StageKind::TelemetryPath,
            ],
        }
    }
}

impl fmt::Display for SensorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorFamily::Counter => write!(f, "counter"),
            SensorFamily::BusProbe => write!(f, "bus probe"),
        }
    }
}

/// The configurable stages a pipeline can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StageKind {
    /// Bus probe address selection.
    ProbeSelection,
    /// Linear calibration of a probe reading.
    LinearCalibration,
    /// Published telemetry path.
    TelemetryPath,
    /// Combined counter + scale calibration of a pulse counter.
    CounterCalibration,
}

impl StageKind {
    pub fn suffix(self) -> &'static str {
        match self {
            StageKind::ProbeSelection => "oneWire",
            StageKind::LinearCalibration => "linear",
            StageKind::TelemetryPath => "skPath",
            StageKind::CounterCalibration => "calibrate",
        }
    }

    /// Configuration path of this stage for the sensor `id`.
    pub fn config_path(self, id: &str) -> String {
        format!("/{}/{}", id, self.suffix())
    }
}

/// Persisted-configuration identity of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigIdentity {
    pub path: String,
    pub title: String,
    pub description: String,
    pub sort_order: i32,
}

impl ConfigIdentity {
    /// Derive the identity of `stage` for `definition`.
    ///
    /// Pure: the same inputs always give the same identity. Fails with
    /// `InvalidDefinition` when the definition itself is malformed.
    pub fn derive(definition: &SensorDefinition, stage: StageKind) -> BuildResult<Self> {
        definition.validate()?;

        let label = definition.display_label();
        let path = stage.config_path(definition.id());
        let (title, description, sort_order) = match stage {
            StageKind::ProbeSelection => (
                format!("{label} Sensor"),
                format!("1-Wire probe address for {label}"),
                definition.sensor_sort_order(),
            ),
            StageKind::LinearCalibration => (
                format!("{label} Calibration"),
                format!("Linear calibration applied to {label}"),
                definition.transform_sort_order(),
            ),
            StageKind::TelemetryPath => (
                format!("{label} Signal K Path"),
                format!("Signal K path for {label}"),
                definition.sink_sort_order(),
            ),
            StageKind::CounterCalibration => (
                label.to_string(),
                format!("Pulse counter calibration for {label}"),
                definition.sensor_sort_order(),
            ),
        };

        Ok(Self {
            path,
            title,
            description,
            sort_order,
        })
    }

    /// All identities a pipeline of `family` mints for `definition`.
    pub fn derive_all(
        definition: &SensorDefinition,
        family: SensorFamily,
    ) -> BuildResult<Vec<Self>> {
        family
            .config_stages()
            .iter()
            .map(|stage| Self::derive(definition, *stage))
            .collect()
    }
}
