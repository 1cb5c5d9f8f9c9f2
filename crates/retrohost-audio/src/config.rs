//! Audio pipeline configuration.

use crate::resample::ResampleQuality;
use crate::{AudioError, Result};
use std::time::Duration;

/// Upper bound on pitch correction (0.5%).
pub const MAX_DEVIATION_LIMIT: f64 = 0.005;

#[cfg(target_os = "macos")]
const DEFAULT_TARGET_FILL_MS: u64 = 32;
#[cfg(not(target_os = "macos"))]
const DEFAULT_TARGET_FILL_MS: u64 = 100;

/// Configuration for the drain/resample cycle.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Device buffer fill the drift correction steers towards.
    pub target_fill: Duration,
    /// Maximum relative deviation from the nominal resample ratio.
    pub max_deviation: f64,
    /// Drain tick period.
    pub tick_interval: Duration,
    /// Longest a single tick waits for device buffer space.
    pub write_timeout: Duration,
    /// Ring buffer size in stereo frames.
    pub ring_capacity_frames: usize,
    pub quality: ResampleQuality,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_fill: Duration::from_millis(DEFAULT_TARGET_FILL_MS),
            max_deviation: MAX_DEVIATION_LIMIT,
            tick_interval: Duration::from_millis(1),
            write_timeout: Duration::from_millis(5),
            ring_capacity_frames: 8192,
            quality: ResampleQuality::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.target_fill.is_zero() || self.target_fill > Duration::from_secs(2) {
            return Err(AudioError::InvalidConfig(format!(
                "target_fill {:?} out of range (1ms-2s)",
                self.target_fill
            )));
        }
        if !(0.0..=MAX_DEVIATION_LIMIT).contains(&self.max_deviation) {
            return Err(AudioError::InvalidConfig(format!(
                "max_deviation {} out of range (0-{})",
                self.max_deviation, MAX_DEVIATION_LIMIT
            )));
        }
        if self.tick_interval.is_zero() || self.tick_interval > Duration::from_millis(50) {
            return Err(AudioError::InvalidConfig(format!(
                "tick_interval {:?} out of range (1us-50ms)",
                self.tick_interval
            )));
        }
        if self.write_timeout > Duration::from_millis(100) {
            return Err(AudioError::InvalidConfig(format!(
                "write_timeout {:?} exceeds 100ms",
                self.write_timeout
            )));
        }
        if self.ring_capacity_frames < 256 {
            return Err(AudioError::InvalidConfig(format!(
                "ring_capacity_frames {} below minimum of 256",
                self.ring_capacity_frames
            )));
        }
        Ok(())
    }
}
