use crate::error::CalibrationError;
use crate::hardware::{HardwareIo, TelemetrySink};
use crate::models::ConfigIdentity;
use crate::pipeline::Pipeline;
use crate::registry::ConfigItemSink;
use crate::transforms::Calibration;
use indexmap::IndexMap;

/// Built pipelines keyed by telemetry path, in build order.
#[derive(Debug, Default)]
pub struct PipelineSet {
    pipelines: IndexMap<String, Pipeline>,
}

impl PipelineSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths are unique by registration, so an insert never replaces.
    pub(crate) fn insert(&mut self, pipeline: Pipeline) {
        self.pipelines
            .insert(pipeline.telemetry_path().to_string(), pipeline);
    }

    pub fn extend(&mut self, other: PipelineSet) {
        self.pipelines.extend(other.pipelines);
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub fn get(&self, telemetry_path: &str) -> Option<&Pipeline> {
        self.pipelines.get(telemetry_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pipeline> {
        self.pipelines.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Pipeline> {
        self.pipelines.values_mut()
    }

    pub fn config_items(&self) -> impl Iterator<Item = &ConfigIdentity> {
        self.iter().flat_map(|pipeline| pipeline.config_items())
    }

    /// Hand every configuration item to the external metadata layer.
    pub fn publish_config_items(&self, sink: &mut dyn ConfigItemSink) -> usize {
        let mut count = 0;
        for item in self.config_items() {
            sink.register_config_item(item);
            count += 1;
        }
        count
    }

    /// Retune the transform addressed by `config_path`, in whichever pipeline
    /// owns it.
    pub fn calibrate(
        &mut self,
        config_path: &str,
        calibration: Calibration,
    ) -> Result<(), CalibrationError> {
        self.iter_mut()
            .find(|pipeline| pipeline.has_config_path(config_path))
            .ok_or_else(|| CalibrationError::UnknownConfigPath(config_path.to_string()))?
            .calibrate(config_path, calibration)
    }

    /// Sample every pipeline once. Returns how many published a value.
    pub fn sample_all(&mut self, io: &mut HardwareIo<'_>, sink: &mut dyn TelemetrySink) -> usize {
        self.iter_mut()
            .filter_map(|pipeline| pipeline.sample(io, sink))
            .count()
    }
}

impl IntoIterator for PipelineSet {
    type Item = Pipeline;
    type IntoIter = indexmap::map::IntoValues<String, Pipeline>;

    fn into_iter(self) -> Self::IntoIter {
        self.pipelines.into_values()
    }
}
