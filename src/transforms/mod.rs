//! Numeric transform stages.
//!
//! Both transforms share the same [`Calibration`] (scale then offset) so a
//! single runtime hook can retune either one.

use crate::models::Reading;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scale-and-offset parameters: `value * multiplier + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub multiplier: f32,
    pub offset: f32,
}

impl Calibration {
    pub const IDENTITY: Self = Self {
        multiplier: 1.0,
        offset: 0.0,
    };

    pub const fn new(multiplier: f32, offset: f32) -> Self {
        Self { multiplier, offset }
    }

    pub const fn scale(multiplier: f32) -> Self {
        Self {
            multiplier,
            offset: 0.0,
        }
    }

    #[inline]
    pub fn apply(&self, value: f32) -> f32 {
        value * self.multiplier + self.offset
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Converts pulse counts per sample into a calibrated rate.
///
/// The rate is `count / elapsed_seconds`, where elapsed is measured between
/// successive reading timestamps. The first reading has no predecessor and
/// uses the nominal sample interval instead.
#[derive(Debug, Clone)]
pub struct Frequency {
    calibration: Calibration,
    nominal_interval: Duration,
    last_timestamp_ms: Option<u64>,
}

impl Frequency {
    pub fn new(multiplier: f32, nominal_interval: Duration) -> Self {
        Self {
            calibration: Calibration::scale(multiplier),
            nominal_interval,
            last_timestamp_ms: None,
        }
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub fn set_calibration(&mut self, calibration: Calibration) {
        self.calibration = calibration;
    }

    /// Returns `None` when no time has elapsed since the previous reading.
    pub fn apply(&mut self, reading: Reading) -> Option<Reading> {
        let elapsed_ms = match self.last_timestamp_ms {
            Some(last) => reading.timestamp_ms.saturating_sub(last),
            None => self.nominal_interval.as_millis() as u64,
        };
        self.last_timestamp_ms = Some(reading.timestamp_ms);

        if elapsed_ms == 0 {
            return None;
        }
        let rate = reading.value / (elapsed_ms as f32 / 1000.0);
        Some(reading.with_value(self.calibration.apply(rate)))
    }
}

/// Linear calibration of a raw reading.
#[derive(Debug, Clone, Default)]
pub struct Linear {
    calibration: Calibration,
}

impl Linear {
    pub fn new(calibration: Calibration) -> Self {
        Self { calibration }
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub fn set_calibration(&mut self, calibration: Calibration) {
        self.calibration = calibration;
    }

    pub fn apply(&self, reading: Reading) -> Reading {
        reading.with_value(self.calibration.apply(reading.value))
    }
}
