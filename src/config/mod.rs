use crate::models::{BusHandle, Pin};
use crate::orchestrator::HardwareHandles;
use anyhow::{Context, Result};
use config::{Config, File};
use indexmap::IndexMap;
use log::{debug, info, LevelFilter};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 1-Wire temperature conversion time at 12-bit resolution.
pub const MIN_ONEWIRE_CONVERSION_MS: u64 = 750;
const MAX_READ_DELAY_MS: u64 = 60_000;

fn default_w1_root() -> String {
    "/sys/bus/w1/devices".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Generated pulses and temperatures.
    Simulated,
    /// Probes from the Linux 1-Wire sysfs tree.
    Sysfs,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HardwareConfig {
    pub onewire_pin: u8,
    pub rpm_pin: u8,
    pub rpm_multiplier: f32,
    pub backend: String,
    #[serde(default = "default_w1_root")]
    pub w1_root: String,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            onewire_pin: 25,
            rpm_pin: 16,
            rpm_multiplier: 1.0,
            backend: "simulated".to_string(),
            w1_root: default_w1_root(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TimingConfig {
    pub rpm_read_delay_ms: u64,
    pub temperature_read_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            rpm_read_delay_ms: 500,
            temperature_read_delay_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    /// Probe selection: sensor id -> 1-Wire device address.
    #[serde(default)]
    pub probes: IndexMap<String, String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        Self::from_file("config.ini")
    }

    pub fn get_log_level(&self) -> LevelFilter {
        match self.logging.level.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info, // Default to Info if invalid
        }
    }

    pub fn backend(&self) -> Backend {
        match self.hardware.backend.to_lowercase().as_str() {
            "sysfs" | "w1" => Backend::Sysfs,
            _ => Backend::Simulated,
        }
    }

    /// Device address configured for a probe, if any.
    pub fn probe_address(&self, id: &str) -> Option<&str> {
        self.probes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(id))
            .map(|(_, address)| address.as_str())
    }

    pub fn rpm_pin(&self) -> Pin {
        Pin(self.hardware.rpm_pin)
    }

    pub fn hardware_handles(&self) -> HardwareHandles {
        HardwareHandles {
            bus: Some(BusHandle::new(Pin(self.hardware.onewire_pin))),
            counter_interval: Duration::from_millis(self.timing.rpm_read_delay_ms),
            probe_interval: Duration::from_millis(self.timing.temperature_read_delay_ms),
        }
    }

    /// Advisory checks on the sample intervals. None of these stop the
    /// build; the caller logs them.
    pub fn check_timing(&self) -> Vec<String> {
        let rpm = self.timing.rpm_read_delay_ms;
        let temperature = self.timing.temperature_read_delay_ms;
        let mut warnings = Vec::new();

        let delays = [
            ("rpm_read_delay_ms", rpm),
            ("temperature_read_delay_ms", temperature),
        ];
        for (name, delay) in delays {
            if delay == 0 || delay >= MAX_READ_DELAY_MS {
                warnings.push(format!(
                    "{name} = {delay} ms is outside 1..{MAX_READ_DELAY_MS} ms"
                ));
            }
        }
        if rpm >= temperature {
            warnings.push(format!(
                "RPM is sampled every {rpm} ms, no faster than temperature ({temperature} ms)"
            ));
        }
        if temperature < MIN_ONEWIRE_CONVERSION_MS {
            warnings.push(format!(
                "temperature_read_delay_ms = {temperature} ms is shorter than the \
                 {MIN_ONEWIRE_CONVERSION_MS} ms 1-Wire conversion time"
            ));
        }
        if self.hardware.onewire_pin == self.hardware.rpm_pin {
            warnings.push(format!(
                "onewire_pin and rpm_pin are both {}",
                self.hardware.rpm_pin
            ));
        }
        warnings
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        debug!("Loading configuration from {}", config_path.display());

        let source = File::with_name(config_path.to_str().unwrap_or(""))
            .format(config::FileFormat::Ini);
        let config = Config::builder()
            .add_source(source)
            .build()
            .context(format!("Failed to load config from {}", config_path.display()))?;

        let app_config: AppConfig = config.try_deserialize()
            .context("Failed to deserialize config")?;

        Ok(app_config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config_path = path.as_ref();

        let mut config_str = String::new();

        config_str.push_str(&format!(
            "[hardware]\nonewire_pin = {}\nrpm_pin = {}\nrpm_multiplier = {}\n\
             backend = {}\nw1_root = {}\n\n",
            self.hardware.onewire_pin,
            self.hardware.rpm_pin,
            self.hardware.rpm_multiplier,
            self.hardware.backend,
            self.hardware.w1_root
        ));

        config_str.push_str(&format!(
            "[timing]\nrpm_read_delay_ms = {}\ntemperature_read_delay_ms = {}\n\n",
            self.timing.rpm_read_delay_ms,
            self.timing.temperature_read_delay_ms
        ));

        config_str.push_str(&format!("[logging]\nlevel = {}\n\n", self.logging.level));

        if !self.probes.is_empty() {
            config_str.push_str("[probes]\n");
            for (id, address) in &self.probes {
                config_str.push_str(&format!("{} = {}\n", id, address));
            }
        }

        fs::write(config_path, config_str)
            .context(format!("Failed to save config to {}", config_path.display()))?;

        info!("Configuration saved to {}", config_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.hardware.onewire_pin, 25);
        assert_eq!(config.hardware.rpm_pin, 16);
        assert_eq!(config.hardware.rpm_multiplier, 1.0);
        assert_eq!(config.timing.rpm_read_delay_ms, 500);
        assert_eq!(config.timing.temperature_read_delay_ms, 2000);
        assert_eq!(config.backend(), Backend::Simulated);
        assert_eq!(config.get_log_level(), LevelFilter::Info);
        assert!(config.check_timing().is_empty());
    }

    #[test]
    fn test_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let config_content = "[hardware]\nonewire_pin = 4\nrpm_pin = 17\nrpm_multiplier = 0.5\n\
            backend = sysfs\n\n\
            [timing]\nrpm_read_delay_ms = 250\ntemperature_read_delay_ms = 1000\n\n\
            [probes]\ncoolantTemperature = 28-00000a1b2c3d\n\n\
            [logging]\nlevel = debug\n";

        temp_file.write_all(config_content.as_bytes()).unwrap();
        let config_path = temp_file.path();

        let config = AppConfig::from_file(config_path).unwrap();

        assert_eq!(config.hardware.onewire_pin, 4);
        assert_eq!(config.hardware.rpm_pin, 17);
        assert_eq!(config.hardware.rpm_multiplier, 0.5);
        assert_eq!(config.backend(), Backend::Sysfs);
        assert_eq!(config.hardware.w1_root, "/sys/bus/w1/devices");
        assert_eq!(config.timing.rpm_read_delay_ms, 250);
        assert_eq!(config.timing.temperature_read_delay_ms, 1000);
        assert_eq!(config.probe_address("coolantTemperature"), Some("28-00000a1b2c3d"));
        assert_eq!(config.get_log_level(), LevelFilter::Debug);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[timing]\nrpm_read_delay_ms = 300\n").unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();

        assert_eq!(config.timing.rpm_read_delay_ms, 300);
        assert_eq!(config.timing.temperature_read_delay_ms, 2000);
        assert_eq!(config.hardware.onewire_pin, 25);
        assert!(config.probes.is_empty());
    }

    #[test]
    fn test_save_config() {
        let mut config = AppConfig::default();
        config.hardware.rpm_pin = 18;
        config.hardware.rpm_multiplier = 2.0;
        config.timing.rpm_read_delay_ms = 400;
        config.logging.level = "warn".to_string();
        config
            .probes
            .insert("seaWaterInTemperature".to_string(), "28-000000000001".to_string());

        let temp_file = NamedTempFile::new().unwrap();
        let config_path = temp_file.path();

        config.save(config_path).unwrap();

        let loaded_config = AppConfig::from_file(config_path).unwrap();

        assert_eq!(loaded_config.hardware.rpm_pin, 18);
        assert_eq!(loaded_config.hardware.rpm_multiplier, 2.0);
        assert_eq!(loaded_config.timing.rpm_read_delay_ms, 400);
        assert_eq!(loaded_config.get_log_level(), LevelFilter::Warn);
        assert_eq!(
            loaded_config.probe_address("seaWaterInTemperature"),
            Some("28-000000000001")
        );
    }

    #[test]
    fn test_timing_advisories() {
        let mut config = AppConfig::default();
        config.timing.rpm_read_delay_ms = 3000;
        config.timing.temperature_read_delay_ms = 500;

        let warnings = config.check_timing();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("no faster than temperature"));
        assert!(warnings[1].contains("conversion time"));
    }

    #[test]
    fn test_hardware_handles() {
        let config = AppConfig::default();
        let handles = config.hardware_handles();
        assert_eq!(handles.bus, Some(BusHandle::new(Pin(25))));
        assert_eq!(handles.counter_interval, Duration::from_millis(500));
        assert_eq!(handles.probe_interval, Duration::from_secs(2));
        assert!(handles.counter_interval < handles.probe_interval);
        assert_eq!(config.rpm_pin(), Pin(16));
    }
}
