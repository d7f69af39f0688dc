use crate::error::{BuildError, BuildResult};
use regex::Regex;
use std::sync::OnceLock;

/// Dotted telemetry path: at least two segments, no leading slash.
fn telemetry_path_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+(\.[A-Za-z0-9_]+)+$").ok())
        .as_ref()
}

/// Immutable description of one logical sensor.
///
/// Constructed once at startup from the compiled tables and never mutated.
/// The three sort orders place the sensor's configuration items in the UI and
/// must be strictly ascending: source, then transform, then sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorDefinition {
    id: String,
    telemetry_path: String,
    display_label: String,
    sensor_sort_order: i32,
    transform_sort_order: i32,
    sink_sort_order: i32,
}

impl SensorDefinition {
    pub fn new(
        id: impl Into<String>,
        telemetry_path: impl Into<String>,
        display_label: impl Into<String>,
        sort_orders: (i32, i32, i32),
    ) -> Self {
        Self {
            id: id.into(),
            telemetry_path: telemetry_path.into(),
            display_label: display_label.into(),
            sensor_sort_order: sort_orders.0,
            transform_sort_order: sort_orders.1,
            sink_sort_order: sort_orders.2,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn telemetry_path(&self) -> &str {
        &self.telemetry_path
    }

    pub fn display_label(&self) -> &str {
        &self.display_label
    }

    pub fn sensor_sort_order(&self) -> i32 {
        self.sensor_sort_order
    }

    pub fn transform_sort_order(&self) -> i32 {
        self.transform_sort_order
    }

    pub fn sink_sort_order(&self) -> i32 {
        self.sink_sort_order
    }

    /// Check the static data once, at registration time.
    pub fn validate(&self) -> BuildResult<()> {
        if self.id.is_empty() {
            return Err(BuildError::invalid(&self.id, "id is empty"));
        }
        if self.id.contains('/') || self.id.chars().any(char::is_whitespace) {
            return Err(BuildError::invalid(
                &self.id,
                "id may not contain '/' or whitespace",
            ));
        }
        if self.display_label.trim().is_empty() {
            return Err(BuildError::invalid(&self.id, "display label is empty"));
        }
        if self.telemetry_path.is_empty() {
            return Err(BuildError::invalid(&self.id, "telemetry path is empty"));
        }
        let pattern = telemetry_path_pattern()
            .ok_or_else(|| BuildError::invalid(&self.id, "telemetry path pattern unavailable"))?;
        if !pattern.is_match(&self.telemetry_path) {
            return Err(BuildError::invalid(
                &self.id,
                format!(
                    "telemetry path '{}' is not a dotted path",
                    self.telemetry_path
                ),
            ));
        }
        if !(self.sensor_sort_order < self.transform_sort_order
            && self.transform_sort_order < self.sink_sort_order)
        {
            return Err(BuildError::invalid(
                &self.id,
                format!(
                    "sort orders {}/{}/{} are not strictly ascending",
                    self.sensor_sort_order, self.transform_sort_order, self.sink_sort_order
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_path_pattern_compiles() {
        let pattern = telemetry_path_pattern().unwrap();
        assert!(pattern.is_match("propulsion.main.revolutions"));
        assert!(!pattern.is_match("/propulsion/main"));
        assert!(!pattern.is_match("revolutions"));
    }

    fn coolant() -> SensorDefinition {
        SensorDefinition::new(
            "coolantTemperature",
            "propulsion.main.coolantTemperature",
            "Coolant Temperature",
            (110, 120, 130),
        )
    }

    fn reason(err: BuildError) -> String {
        match err {
            BuildError::InvalidDefinition { reason, .. } => reason,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_valid_definition() {
        assert!(coolant().validate().is_ok());
    }

    #[test]
    fn test_empty_label_rejected() {
        let def = SensorDefinition::new("x", "a.b", "  ", (1, 2, 3));
        assert!(reason(def.validate().unwrap_err()).contains("label"));
    }

    #[test]
    fn test_path_shape_rejected() {
        for path in ["", "/propulsion.main", "propulsion", "propulsion..main", "propulsion.main."] {
            let def = SensorDefinition::new("x", path, "X", (1, 2, 3));
            assert!(def.validate().is_err(), "path {path:?} should be rejected");
        }
    }

    #[test]
    fn test_sort_orders_must_ascend() {
        for orders in [(120, 110, 130), (110, 110, 130), (110, 130, 120), (3, 2, 1)] {
            let def = SensorDefinition::new("x", "a.b", "X", orders);
            assert!(reason(def.validate().unwrap_err()).contains("ascending"));
        }
    }

    #[test]
    fn test_id_with_slash_rejected() {
        let def = SensorDefinition::new("engine/rpm", "a.b", "X", (1, 2, 3));
        assert!(def.validate().is_err());
    }
}
