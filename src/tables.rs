//! Compiled sensor tables for the main engine.
//!
//! Sort orders leave room between sensors: 110-190 for the temperature
//! probes, 200-210 for RPM.

use crate::models::{Pin, SensorDefinition};
use crate::orchestrator::{CounterEntry, FamilyTable};

pub fn coolant_temperature() -> SensorDefinition {
    SensorDefinition::new(
        "coolantTemperature",
        "propulsion.main.coolantTemperature",
        "Coolant Temperature",
        (110, 120, 130),
    )
}

pub fn sea_water_in_temperature() -> SensorDefinition {
    SensorDefinition::new(
        "seaWaterInTemperature",
        "propulsion.main.seaWaterInTemperature",
        "Sea Water In Temperature",
        (140, 150, 160),
    )
}

pub fn sea_water_out_temperature() -> SensorDefinition {
    SensorDefinition::new(
        "seaWaterOutTemperature",
        "propulsion.main.seaWaterOutTemperature",
        "Sea Water Out Temperature",
        (170, 180, 190),
    )
}

/// The counter family mints a single calibration item at the sensor sort
/// order; 205 and 210 only keep the range ascending and are never read.
pub fn engine_rpm() -> SensorDefinition {
    SensorDefinition::new(
        "engineRPM",
        "propulsion.main.revolutions",
        "Engine RPM",
        (200, 205, 210),
    )
}

/// All temperature probes share the one bus.
pub fn temperature_definitions() -> Vec<SensorDefinition> {
    vec![
        coolant_temperature(),
        sea_water_in_temperature(),
        sea_water_out_temperature(),
    ]
}

/// Temperatures first, then RPM.
pub fn default_tables(rpm_pin: Pin, rpm_multiplier: f32) -> Vec<FamilyTable> {
    vec![
        FamilyTable::BusProbe(temperature_definitions()),
        FamilyTable::Counter(vec![CounterEntry {
            pin: rpm_pin,
            multiplier: rpm_multiplier,
            definition: engine_rpm(),
        }]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConfigIdentity, SensorFamily};
    use std::collections::HashSet;

    fn all() -> Vec<SensorDefinition> {
        let mut definitions = temperature_definitions();
        definitions.push(engine_rpm());
        definitions
    }

    #[test]
    fn test_tables_are_valid() {
        for definition in all() {
            assert!(definition.validate().is_ok(), "{definition:?}");
        }
    }

    #[test]
    fn test_ids_and_paths_unique() {
        let definitions = all();
        let ids: HashSet<&str> = definitions.iter().map(|d| d.id()).collect();
        let paths: HashSet<&str> = definitions.iter().map(|d| d.telemetry_path()).collect();
        assert_eq!(ids.len(), definitions.len());
        assert_eq!(paths.len(), definitions.len());
        assert!(definitions
            .iter()
            .all(|d| d.telemetry_path().starts_with("propulsion.main.")));
    }

    #[test]
    fn test_sort_ranges_do_not_overlap() {
        let definitions = all();
        for pair in definitions.windows(2) {
            assert!(pair[0].sink_sort_order() < pair[1].sensor_sort_order());
        }
    }

    #[test]
    fn test_rpm_uses_sensor_sort_order_only() {
        let items = ConfigIdentity::derive_all(&engine_rpm(), SensorFamily::Counter).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].path, "/engineRPM/calibrate");
        assert_eq!(items[0].title, "Engine RPM");
        assert_eq!(items[0].sort_order, 200);
    }
}
