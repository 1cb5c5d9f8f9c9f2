//! Dynamic rate control.
//!
//! The drift term compares everything queued for playback (device buffer plus
//! the ring and resampler backlog, in device bytes) against the target fill,
//! and nudges the resample ratio by at most `max_deviation`. A backlog above
//! target shrinks the ratio so each tick consumes more core audio; a deficit
//! stretches it. The ratio is computed twice: once before the ring read to size
//! it, and again from what is actually queued after the read.

use crate::format::{AudioFormat, NegotiatedFormat};
use std::time::Duration;

/// Queue error, as a fraction of the target, that maps to the full deviation.
const DRIFT_SPAN: f64 = 0.25;

/// What a tick should read from the ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrainPlan {
    /// Device bytes still missing to reach the target. Negative when over target.
    pub distance: isize,
    /// Device bytes buffered when the plan was made.
    pub device_used: usize,
    /// Core-format bytes to read, frame aligned.
    pub read_bytes: usize,
    pub sizing_ratio: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct DriftController {
    input: AudioFormat,
    output: AudioFormat,
    nominal_ratio: f64,
    max_deviation: f64,
    target_bytes: usize,
}

impl DriftController {
    pub fn new(format: &NegotiatedFormat, target_fill: Duration, max_deviation: f64) -> Self {
        Self {
            input: format.input,
            output: format.output,
            nominal_ratio: format.nominal_ratio,
            max_deviation,
            target_bytes: format.output.bytes_for_duration(target_fill),
        }
    }

    /// Target fill in device bytes.
    pub fn target_bytes(&self) -> usize {
        self.target_bytes
    }

    pub fn nominal_ratio(&self) -> f64 {
        self.nominal_ratio
    }

    /// `nominal * (1 + max_deviation * drift)` with `drift` clamped to -1..=1.
    pub fn adjusted_ratio(&self, drift: f64) -> f64 {
        self.nominal_ratio * (1.0 + self.max_deviation * drift.clamp(-1.0, 1.0))
    }

    /// Device bytes that `core_bytes` of core audio become at the nominal ratio.
    pub fn device_equivalent(&self, core_bytes: usize) -> usize {
        let frames = self.input.frames_for_bytes(core_bytes) as f64 * self.nominal_ratio;
        self.output.bytes_for_frames(frames as usize)
    }

    /// Drift for a total queue of `device_used` device bytes plus `backlog`
    /// core bytes not yet converted.
    pub fn drift(&self, device_used: usize, backlog: usize) -> f64 {
        if self.target_bytes == 0 {
            return 0.0;
        }
        let queued = device_used + self.device_equivalent(backlog);
        let error = self.target_bytes as f64 - queued as f64;
        error / (self.target_bytes as f64 * DRIFT_SPAN)
    }

    /// Plan a read given the device's total and free buffer space and the
    /// core bytes waiting in the ring and resampler.
    pub fn plan(&self, device_capacity: usize, device_free: usize, backlog: usize) -> DrainPlan {
        let device_used = device_capacity.saturating_sub(device_free);
        let distance = self.target_bytes as isize - device_used as isize;
        let sizing_ratio = self.adjusted_ratio(self.drift(device_used, backlog));

        let read_bytes = if distance > 0 {
            let out_frames = self.output.frames_for_bytes(distance as usize);
            let in_frames = (out_frames as f64 / sizing_ratio).floor() as usize;
            self.input.bytes_for_frames(in_frames)
        } else {
            0
        };

        DrainPlan {
            distance,
            device_used,
            read_bytes,
            sizing_ratio,
        }
    }

    /// Ratio for converting a read, given the core bytes still queued after
    /// it (the read itself included).
    pub fn ratio_for_read(&self, plan: &DrainPlan, backlog: usize) -> f64 {
        self.adjusted_ratio(self.drift(plan.device_used, backlog))
    }
}
