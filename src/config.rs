//! Session configuration, loadable from TOML.
//!
//! ```toml
//! [host]
//! system_directory = "bios"
//! save_directory = "saves"
//!
//! [audio]
//! target_fill_ms = 64
//! quality = "high"
//!
//! [output]
//! device_index = 1
//! volume = 0.8
//! ```
//!
//! Every key is optional; missing keys take the library defaults. Durations
//! are whole milliseconds.

use crate::Result;
use retrohost_audio::{PipelineConfig, ResampleQuality};
use retrohost_core::HostConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostSection {
    pub system_directory: PathBuf,
    pub save_directory: PathBuf,
    pub content_directory: Option<PathBuf>,
}

impl Default for HostSection {
    fn default() -> Self {
        let host = HostConfig::default();
        Self {
            system_directory: host.system_directory,
            save_directory: host.save_directory,
            content_directory: host.content_directory,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioSection {
    pub target_fill_ms: u64,
    pub max_deviation: f64,
    pub tick_interval_ms: u64,
    pub write_timeout_ms: u64,
    pub ring_capacity_frames: usize,
    pub quality: ResampleQuality,
}

impl Default for AudioSection {
    fn default() -> Self {
        let pipeline = PipelineConfig::default();
        Self {
            target_fill_ms: millis(pipeline.target_fill),
            max_deviation: pipeline.max_deviation,
            tick_interval_ms: millis(pipeline.tick_interval),
            write_timeout_ms: millis(pipeline.write_timeout),
            ring_capacity_frames: pipeline.ring_capacity_frames,
            quality: pipeline.quality,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// Index into the host's output device list; default device when unset.
    pub device_index: Option<usize>,
    pub buffer_ms: u64,
    pub volume: f32,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            device_index: None,
            buffer_ms: 250,
            volume: 1.0,
        }
    }
}

/// Everything a [`Session`](crate::Session) needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub host: HostSection,
    pub audio: AudioSection,
    pub output: OutputSection,
}

impl SessionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SessionConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn host_config(&self) -> HostConfig {
        HostConfig {
            system_directory: self.host.system_directory.clone(),
            save_directory: self.host.save_directory.clone(),
            content_directory: self.host.content_directory.clone(),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            target_fill: Duration::from_millis(self.audio.target_fill_ms),
            max_deviation: self.audio.max_deviation,
            tick_interval: Duration::from_millis(self.audio.tick_interval_ms),
            write_timeout: Duration::from_millis(self.audio.write_timeout_ms),
            ring_capacity_frames: self.audio.ring_capacity_frames,
            quality: self.audio.quality,
        }
    }

    #[cfg(feature = "cpal")]
    pub fn output_config(&self) -> retrohost_audio::OutputConfig {
        retrohost_audio::OutputConfig {
            output_device_index: self.output.device_index,
            buffer_duration: Duration::from_millis(self.output.buffer_ms),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.host_config().validate()?;
        self.pipeline_config().validate()?;
        if self.output.buffer_ms == 0 || self.output.buffer_ms > 2000 {
            return Err(retrohost_audio::AudioError::InvalidConfig(format!(
                "output buffer_ms {} out of range (1-2000)",
                self.output.buffer_ms
            ))
            .into());
        }
        if !(0.0..=1.0).contains(&self.output.volume) {
            return Err(retrohost_audio::AudioError::InvalidConfig(format!(
                "output volume {} out of range (0-1)",
                self.output.volume
            ))
            .into());
        }
        Ok(())
    }
}
