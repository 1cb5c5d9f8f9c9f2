//! Builder for configuring and constructing a `Session`.

use crate::config::SessionConfig;
use crate::{Result, Session};
use retrohost_audio::{DeviceSink, ResampleQuality};
use retrohost_core::{FrameSink, InputSource};
use std::path::PathBuf;
use std::time::Duration;

/// Without an explicit [`sink`](Self::sink) the session plays through CPAL
/// (with the `cpal` feature) or discards audio into a
/// [`NullSink`](retrohost_audio::NullSink).
///
/// # Example
///
/// ```ignore
/// use retrohost::prelude::*;
///
/// let mut session = Session::builder()
///     .save_directory("saves")
///     .target_fill(Duration::from_millis(64))
///     .build()?;
///
/// session.load_core("cores/fceumm_libretro.so")?;
/// session.load_game("roms/game.nes")?;
/// ```
#[derive(Default)]
pub struct SessionBuilder {
    config: SessionConfig,
    sink: Option<Box<dyn DeviceSink>>,
    frame_sink: Option<Box<dyn FrameSink>>,
    input: Option<Box<dyn InputSource>>,
}

impl SessionBuilder {
    /// Replace the whole configuration, e.g. one loaded from TOML.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn system_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.host.system_directory = path.into();
        self
    }

    pub fn save_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.host.save_directory = path.into();
        self
    }

    pub fn content_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.host.content_directory = Some(path.into());
        self
    }

    /// Default: 100ms (32ms on macOS)
    pub fn target_fill(mut self, fill: Duration) -> Self {
        self.config.audio.target_fill_ms = fill.as_millis() as u64;
        self
    }

    /// Default: 0.005, which is also the maximum
    pub fn max_deviation(mut self, deviation: f64) -> Self {
        self.config.audio.max_deviation = deviation;
        self
    }

    pub fn quality(mut self, quality: ResampleQuality) -> Self {
        self.config.audio.quality = quality;
        self
    }

    /// Default: 8192
    pub fn ring_capacity_frames(mut self, frames: usize) -> Self {
        self.config.audio.ring_capacity_frames = frames;
        self
    }

    pub fn output_device(mut self, index: usize) -> Self {
        self.config.output.device_index = Some(index);
        self
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.config.output.volume = volume;
        self
    }

    /// Drain into a custom device sink instead of the default output.
    pub fn sink(mut self, sink: Box<dyn DeviceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn frame_sink(mut self, sink: Box<dyn FrameSink>) -> Self {
        self.frame_sink = Some(sink);
        self
    }

    pub fn input_source(mut self, source: Box<dyn InputSource>) -> Self {
        self.input = Some(source);
        self
    }

    pub fn build(self) -> Result<Session> {
        self.config.validate()?;

        let sink = match self.sink {
            Some(sink) => sink,
            None => default_sink(&self.config)?,
        };

        let mut session = Session::new(&self.config, sink)?;
        if let Some(frame_sink) = self.frame_sink {
            session.host_mut().set_frame_sink(frame_sink);
        }
        if let Some(input) = self.input {
            session.host_mut().set_input_source(input);
        }
        Ok(session)
    }
}

#[cfg(feature = "cpal")]
fn default_sink(config: &SessionConfig) -> Result<Box<dyn DeviceSink>> {
    Ok(Box::new(retrohost_audio::CpalSink::new(config.output_config())?))
}

#[cfg(not(feature = "cpal"))]
fn default_sink(_config: &SessionConfig) -> Result<Box<dyn DeviceSink>> {
    Ok(Box::new(retrohost_audio::NullSink::new()))
}
