//! Drift-corrected audio output for hosted cores.
//!
//! # Primary API
//!
//! - [`AudioPipeline`]: owns the drain thread; hands out the [`AudioProducer`]
//! - [`FormatCell`]: where the producer side publishes its sample rate
//! - [`DeviceSink`]: output device abstraction ([`CpalSink`] with the `cpal` feature)
//! - [`AudioDrain`]: the tick itself, for manual clocking
//!
//! Every tick reads as much core audio as the device buffer is missing relative
//! to a target fill level, resamples it at a ratio nudged by at most
//! [`MAX_DEVIATION_LIMIT`] around the nominal device/core ratio, and writes the
//! result. Device clock drift is absorbed by the ratio nudge instead of by
//! underruns or overflows.
//!
//! # Example
//!
//! ```ignore
//! use retrohost_audio::{AudioFormat, AudioPipeline, CpalSink, OutputConfig, PipelineConfig};
//!
//! let sink = CpalSink::new(OutputConfig::default())?;
//! let (mut pipeline, mut producer) = AudioPipeline::new(PipelineConfig::default(), Box::new(sink))?;
//!
//! pipeline.formats().publish(AudioFormat::core_native(32040));
//! pipeline.set_running(true);
//! pipeline.start();
//!
//! producer.push_frames(&samples);
//! ```

pub mod error;
pub use error::{AudioError, Result};

mod config;
pub use config::{PipelineConfig, MAX_DEVIATION_LIMIT};

pub mod convert;

mod format;
pub use format::{negotiate, AudioFormat, ByteOrder, NegotiatedFormat, SampleFormat};

mod ring;
pub use ring::{audio_ring, AudioConsumer, AudioProducer, RingStats};

mod shared;
pub use shared::{FormatCell, PipelineControl};

mod drift;
pub use drift::{DrainPlan, DriftController};

mod resample;
pub use resample::{ResampleQuality, StreamResampler, MAX_CONVERSION_RATIO};

mod sink;
pub use sink::{DeviceEvent, DeviceSink, NullSink};

mod drain;
pub use drain::{AudioDrain, DrainStats};

mod pipeline;
pub use pipeline::AudioPipeline;

#[cfg(feature = "cpal")]
mod output;
#[cfg(feature = "cpal")]
pub use output::{CpalSink, OutputConfig};
