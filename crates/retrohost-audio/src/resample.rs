//! Streaming sample rate conversion using rubato.
//!
//! The resampler keeps its filter history for the lifetime of a format pair.
//! Input arrives in arbitrary tick-sized pieces and is accumulated until a full
//! rubato chunk is available; leftovers carry over to the next tick.

use crate::convert;
use crate::error::{AudioError, Result};
use rubato::{
    calculate_cutoff, Resampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};
use serde::{Deserialize, Serialize};

/// Headroom for live ratio changes relative to the construction ratio.
const MAX_RATIO_RELATIVE: f64 = 1.1;

/// Largest conversion factor in either direction. Output chunks scale with
/// the ratio, so a core reporting a bogus rate must not size them.
pub const MAX_CONVERSION_RATIO: f64 = 64.0;

/// Resampling quality presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleQuality {
    /// Short filter, linear interpolation
    Fast,
    /// Balanced quality/latency (default)
    #[default]
    Medium,
    High,
    /// Longest filter, cubic interpolation
    Best,
}

impl ResampleQuality {
    fn chunk_size(&self) -> usize {
        match self {
            ResampleQuality::Fast => 64,
            ResampleQuality::Medium => 128,
            ResampleQuality::High => 256,
            ResampleQuality::Best => 256,
        }
    }

    fn parameters(&self) -> SincInterpolationParameters {
        let (sinc_len, oversampling_factor, interpolation) = match self {
            ResampleQuality::Fast => (64, 128, SincInterpolationType::Linear),
            ResampleQuality::Medium => (128, 256, SincInterpolationType::Linear),
            ResampleQuality::High => (256, 256, SincInterpolationType::Quadratic),
            ResampleQuality::Best => (256, 256, SincInterpolationType::Cubic),
        };
        SincInterpolationParameters {
            sinc_len,
            f_cutoff: calculate_cutoff(sinc_len, WindowFunction::BlackmanHarris2),
            oversampling_factor,
            interpolation,
            window: WindowFunction::BlackmanHarris2,
        }
    }
}

/// Stereo resampler fed with core-format (i16 LE interleaved) bytes.
pub struct StreamResampler {
    inner: SincFixedIn<f32>,
    pending_left: Vec<f32>,
    pending_right: Vec<f32>,
    ratio: f64,
}

impl StreamResampler {
    pub fn new(nominal_ratio: f64, quality: ResampleQuality) -> Result<Self> {
        if !(1.0 / MAX_CONVERSION_RATIO..=MAX_CONVERSION_RATIO).contains(&nominal_ratio) {
            return Err(AudioError::ResamplerInit(format!(
                "ratio {nominal_ratio} outside 1/{MAX_CONVERSION_RATIO}..{MAX_CONVERSION_RATIO}"
            )));
        }
        let chunk_size = quality.chunk_size();
        let inner = SincFixedIn::<f32>::new(
            nominal_ratio,
            MAX_RATIO_RELATIVE,
            quality.parameters(),
            chunk_size,
            2,
        )?;

        Ok(Self {
            inner,
            pending_left: Vec::with_capacity(chunk_size * 4),
            pending_right: Vec::with_capacity(chunk_size * 4),
            ratio: nominal_ratio,
        })
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Change the output/input ratio for subsequent chunks.
    pub fn set_ratio(&mut self, ratio: f64) -> Result<()> {
        if ratio != self.ratio {
            self.inner.set_resample_ratio(ratio, false)?;
            self.ratio = ratio;
        }
        Ok(())
    }

    /// Queue core-format bytes for conversion.
    pub fn push_core_bytes(&mut self, bytes: &[u8]) {
        convert::decode_core(bytes, &mut self.pending_left, &mut self.pending_right);
    }

    /// Input frames waiting for a complete chunk.
    pub fn pending_frames(&self) -> usize {
        self.pending_left.len()
    }

    /// Convert every complete chunk, appending to `left`/`right`.
    ///
    /// Returns the number of output frames appended.
    pub fn process(&mut self, left: &mut Vec<f32>, right: &mut Vec<f32>) -> Result<usize> {
        let mut produced = 0;
        let mut consumed = 0;

        loop {
            let needed = self.inner.input_frames_next();
            if self.pending_left.len() - consumed < needed {
                break;
            }

            let chunk: [&[f32]; 2] = [
                &self.pending_left[consumed..consumed + needed],
                &self.pending_right[consumed..consumed + needed],
            ];
            let output = self.inner.process(&chunk[..], None)?;
            left.extend_from_slice(&output[0]);
            right.extend_from_slice(&output[1]);

            produced += output[0].len();
            consumed += needed;
        }

        self.pending_left.drain(..consumed);
        self.pending_right.drain(..consumed);
        Ok(produced)
    }
}
