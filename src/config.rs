// Tuning values, line assignments, host link defaults
//
// Every delay, threshold, and pulse width the mechanism depends on lives in
// `SorterConfig`, which can be overridden from a JSON file at startup instead
// of being re-tuned in source per board.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::hal::{AnalogChannel, DigitalLine};

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Serial link to the classifier host
pub const HOST_PORT: &str = "/dev/ttyAMA0";
pub const HOST_BAUD: u32 = 9600;

// Line and channel assignments for the sorter board. Single source of truth;
// every module references these rather than hard-coding numbers.
pub const DISK_CLOCK_LINE: DigitalLine = DigitalLine(2);
pub const DISK_COUNTER_LINE: DigitalLine = DigitalLine(4);
pub const CROSS_CLOCK_LINE: DigitalLine = DigitalLine(7);
pub const CROSS_COUNTER_LINE: DigitalLine = DigitalLine(8);
pub const PADDLE_LINE: DigitalLine = DigitalLine(12);
pub const DISK_HALL: AnalogChannel = AnalogChannel(0);
pub const CROSS_HALL: AnalogChannel = AnalogChannel(1);

/// Tuning for one specific mechanism build.
///
/// The defaults are the values tuned on the reference machine; a JSON file
/// passed with `--config` overrides any subset of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SorterConfig {
    /// Grace window around serial writes, also the brief dwell between the
    /// out and back steps of a disposal routine.
    pub step_pause_ms: u64,
    /// Drive time that moves the mechanism off a just-detected magnet before
    /// hall polling resumes.
    pub guard_interval_ms: u64,
    /// Deceleration wait before an offset-correction pulse.
    pub settle_interval_ms: u64,
    /// Offset-correction pulse width for the cross motor.
    pub cross_offset_pulse_ms: u64,
    /// Offset-correction pulse width for the disk motor.
    pub disk_offset_pulse_ms: u64,
    /// A magnet reads as present iff the raw sample lies strictly between
    /// these two thresholds (0..=1023 scale).
    pub hall_threshold_low: u16,
    pub hall_threshold_high: u16,
    /// Acknowledgment integer sent to the host after a completed disposal.
    pub done_code: i32,
    /// Paddle agitation burst length.
    pub paddle_going_interval_ms: u64,
    /// Paddle rest length between bursts.
    pub paddle_rest_interval_ms: u64,
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            step_pause_ms: 20,
            guard_interval_ms: 900,
            settle_interval_ms: 200,
            cross_offset_pulse_ms: 170,
            disk_offset_pulse_ms: 95,
            hall_threshold_low: 400,
            hall_threshold_high: 550,
            done_code: 42,
            paddle_going_interval_ms: 70,
            paddle_rest_interval_ms: 1000,
        }
    }
}

impl SorterConfig {
    /// Load tuning from a JSON file; missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn step_pause(&self) -> Duration {
        Duration::from_millis(self.step_pause_ms)
    }

    pub fn guard_interval(&self) -> Duration {
        Duration::from_millis(self.guard_interval_ms)
    }

    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_interval_ms)
    }

    pub fn cross_offset_pulse(&self) -> Duration {
        Duration::from_millis(self.cross_offset_pulse_ms)
    }

    pub fn disk_offset_pulse(&self) -> Duration {
        Duration::from_millis(self.disk_offset_pulse_ms)
    }

    pub fn paddle_going_interval(&self) -> Duration {
        Duration::from_millis(self.paddle_going_interval_ms)
    }

    pub fn paddle_rest_interval(&self) -> Duration {
        Duration::from_millis(self.paddle_rest_interval_ms)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_tuning() {
        let config = SorterConfig::default();
        assert_eq!(config.guard_interval(), Duration::from_millis(900));
        assert_eq!(config.cross_offset_pulse(), Duration::from_millis(170));
        assert_eq!(config.disk_offset_pulse(), Duration::from_millis(95));
        assert_eq!(config.hall_threshold_low, 400);
        assert_eq!(config.hall_threshold_high, 550);
        assert_eq!(config.done_code, 42);
        assert_eq!(config.paddle_going_interval(), Duration::from_millis(70));
        assert_eq!(config.paddle_rest_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config: SorterConfig =
            serde_json::from_str(r#"{"guard_interval_ms": 750, "done_code": 7}"#).unwrap();
        assert_eq!(config.guard_interval(), Duration::from_millis(750));
        assert_eq!(config.done_code, 7);
        // Untouched fields fall back to the reference tuning
        assert_eq!(config.settle_interval(), Duration::from_millis(200));
        assert_eq!(config.hall_threshold_high, 550);
    }
}
