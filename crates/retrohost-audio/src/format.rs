//! PCM stream formats and device format selection.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sample encoding of one channel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleFormat {
    /// Signed 16-bit integer. Cores always produce this.
    #[default]
    I16,
    /// 32-bit IEEE float in -1.0..=1.0.
    F32,
}

impl SampleFormat {
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            SampleFormat::I16 => 2,
            SampleFormat::F32 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}

/// Interleaved PCM format description.
///
/// All byte/duration conversions round down to whole frames so that a
/// value computed here can be handed to a reader or writer without
/// splitting a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_format: SampleFormat,
    pub byte_order: ByteOrder,
}

impl AudioFormat {
    /// Bytes per interleaved stereo i16 frame as written by the core callbacks.
    pub const CORE_FRAME_BYTES: usize = 4;

    /// Interleaved stereo signed 16-bit little-endian, the format every core emits.
    pub const fn core_native(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 2,
            sample_format: SampleFormat::I16,
            byte_order: ByteOrder::Little,
        }
    }

    pub const fn new(
        sample_rate: u32,
        channels: u16,
        sample_format: SampleFormat,
        byte_order: ByteOrder,
    ) -> Self {
        Self {
            sample_rate,
            channels,
            sample_format,
            byte_order,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.sample_rate > 0 && self.channels > 0
    }

    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        self.sample_format.bytes()
    }

    #[inline]
    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_sample() * self.channels as usize
    }

    #[inline]
    pub fn frames_for_bytes(&self, bytes: usize) -> usize {
        match self.bytes_per_frame() {
            0 => 0,
            n => bytes / n,
        }
    }

    #[inline]
    pub fn bytes_for_frames(&self, frames: usize) -> usize {
        frames * self.bytes_per_frame()
    }

    /// Round `bytes` down to a whole number of frames.
    #[inline]
    pub fn align_bytes(&self, bytes: usize) -> usize {
        self.bytes_for_frames(self.frames_for_bytes(bytes))
    }

    pub fn frames_for_duration(&self, duration: Duration) -> usize {
        (duration.as_secs_f64() * self.sample_rate as f64) as usize
    }

    pub fn bytes_for_duration(&self, duration: Duration) -> usize {
        self.bytes_for_frames(self.frames_for_duration(duration))
    }

    pub fn duration_for_frames(&self, frames: usize) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }

    pub fn duration_for_bytes(&self, bytes: usize) -> Duration {
        self.duration_for_frames(self.frames_for_bytes(bytes))
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} Hz, {} ch, {:?} {:?}-endian",
            self.sample_rate, self.channels, self.sample_format, self.byte_order
        )
    }
}

/// Result of negotiating a device format for a core stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NegotiatedFormat {
    pub input: AudioFormat,
    pub output: AudioFormat,
    /// `output.sample_rate / input.sample_rate`
    pub nominal_ratio: f64,
}

/// Pick the device format for `input`.
///
/// The device's nearest match wins unless it would downsample, in which case
/// the device's preferred format is used instead.
pub fn negotiate(
    input: AudioFormat,
    nearest: AudioFormat,
    preferred: AudioFormat,
) -> NegotiatedFormat {
    let output = if nearest.sample_rate < input.sample_rate {
        preferred
    } else {
        nearest
    };

    let nominal_ratio = if input.sample_rate == 0 {
        1.0
    } else {
        output.sample_rate as f64 / input.sample_rate as f64
    };

    NegotiatedFormat {
        input,
        output,
        nominal_ratio,
    }
}
