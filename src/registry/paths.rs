use crate::error::{BuildError, BuildResult};
use indexmap::IndexSet;
use log::debug;

/// Process-wide record of every telemetry and configuration path minted.
///
/// Registration is the only mutation and there is no unregister: the first
/// registration of a path wins, later duplicates are rejected.
#[derive(Debug, Clone, Default)]
pub struct PathRegistry {
    telemetry: IndexSet<String>,
    config: IndexSet<String>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_telemetry(&mut self, path: &str) -> BuildResult<()> {
        if !self.telemetry.insert(path.to_string()) {
            return Err(BuildError::DuplicateTelemetryPath(path.to_string()));
        }
        debug!("Registered telemetry path {}", path);
        Ok(())
    }

    pub fn register_config(&mut self, path: &str) -> BuildResult<()> {
        if !self.config.insert(path.to_string()) {
            return Err(BuildError::DuplicateConfigPath(path.to_string()));
        }
        debug!("Registered configuration path {}", path);
        Ok(())
    }

    /// Register one pipeline's paths as a unit.
    ///
    /// Every path is checked before any is inserted, so on error the registry
    /// is left exactly as it was.
    pub fn claim(&mut self, telemetry_path: &str, config_paths: &[&str]) -> BuildResult<()> {
        if self.telemetry.contains(telemetry_path) {
            return Err(BuildError::DuplicateTelemetryPath(telemetry_path.to_string()));
        }
        let mut pending = IndexSet::with_capacity(config_paths.len());
        for path in config_paths {
            if self.config.contains(*path) || !pending.insert(*path) {
                return Err(BuildError::DuplicateConfigPath(path.to_string()));
            }
        }

        self.register_telemetry(telemetry_path)?;
        for path in pending {
            self.register_config(path)?;
        }
        Ok(())
    }

    pub fn contains_telemetry(&self, path: &str) -> bool {
        self.telemetry.contains(path)
    }

    pub fn contains_config(&self, path: &str) -> bool {
        self.config.contains(path)
    }

    /// Telemetry paths in registration order.
    pub fn telemetry_paths(&self) -> impl Iterator<Item = &str> {
        self.telemetry.iter().map(String::as_str)
    }

    /// Configuration paths in registration order.
    pub fn config_paths(&self) -> impl Iterator<Item = &str> {
        self.config.iter().map(String::as_str)
    }

    pub fn telemetry_count(&self) -> usize {
        self.telemetry.len()
    }

    pub fn config_count(&self) -> usize {
        self.config.len()
    }
}
