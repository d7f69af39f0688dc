use crate::hardware::TelemetrySink;
use indexmap::IndexMap;
use log::info;

/// Publishes every value to the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn publish(&mut self, path: &str, value: f32) {
        info!(
            "[{}] {} = {:.2}",
            chrono::Local::now().format("%H:%M:%S"),
            path,
            value
        );
    }
}

/// Keeps the latest value per path and a count of all publishes.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub values: IndexMap<String, f32>,
    pub published: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self, path: &str) -> Option<f32> {
        self.values.get(path).copied()
    }
}

impl TelemetrySink for RecordingSink {
    fn publish(&mut self, path: &str, value: f32) {
        self.values.insert(path.to_string(), value);
        self.published += 1;
    }
}
