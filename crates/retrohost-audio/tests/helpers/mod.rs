//! Test helpers for retrohost-audio integration tests.
//!
//! [`SimulatedSink`] models an output device with its own clock: the test
//! decides how much audio the device consumes per step, including a relative
//! clock mismatch, and inspects fill level, opens and events through the
//! returned [`DeviceProbe`].

#![allow(dead_code)]

use parking_lot::Mutex;
use retrohost_audio::{AudioFormat, AudioProducer, DeviceEvent, DeviceSink, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Core sample rate used throughout the tests.
pub const CORE_RATE: u32 = 32000;

/// Device sample rate used throughout the tests.
pub const DEVICE_RATE: u32 = 48000;

pub const TICK: Duration = Duration::from_millis(1);

#[derive(Debug)]
struct DeviceState {
    nearest: Option<AudioFormat>,
    preferred: AudioFormat,
    buffer_duration: Duration,
    format: Option<AudioFormat>,
    capacity: usize,
    buffered: usize,
    suspended: bool,
    opens: usize,
    closes: usize,
    volume: f32,
    events: VecDeque<DeviceEvent>,
    underruns: usize,
    written: usize,
    clock: f64,
    fail_open: bool,
}

/// Device sink driven by an explicit clock.
pub struct SimulatedSink {
    state: Arc<Mutex<DeviceState>>,
}

/// Test-side view of a [`SimulatedSink`].
#[derive(Clone)]
pub struct DeviceProbe {
    state: Arc<Mutex<DeviceState>>,
}

impl SimulatedSink {
    pub fn new(preferred: AudioFormat, buffer_duration: Duration) -> (Self, DeviceProbe) {
        let state = Arc::new(Mutex::new(DeviceState {
            nearest: None,
            preferred,
            buffer_duration,
            format: None,
            capacity: 0,
            buffered: 0,
            suspended: false,
            opens: 0,
            closes: 0,
            volume: 1.0,
            events: VecDeque::new(),
            underruns: 0,
            written: 0,
            clock: 0.0,
            fail_open: false,
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            DeviceProbe { state },
        )
    }
}

impl DeviceSink for SimulatedSink {
    fn nearest_format(&self, _requested: &AudioFormat) -> AudioFormat {
        let state = self.state.lock();
        state.nearest.unwrap_or(state.preferred)
    }

    fn preferred_format(&self) -> AudioFormat {
        self.state.lock().preferred
    }

    fn open(&mut self, format: AudioFormat) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_open {
            return Err(retrohost_audio::AudioError::DeviceOpen("simulated failure".into()));
        }
        state.capacity = format.bytes_for_duration(state.buffer_duration);
        state.format = Some(format);
        state.buffered = 0;
        state.suspended = false;
        state.opens += 1;
        state.clock = 0.0;
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        state.format = None;
        state.capacity = 0;
        state.buffered = 0;
        state.closes += 1;
    }

    fn is_open(&self) -> bool {
        self.state.lock().format.is_some()
    }

    fn buffer_size(&self) -> usize {
        self.state.lock().capacity
    }

    fn bytes_free(&self) -> usize {
        let state = self.state.lock();
        state.capacity - state.buffered
    }

    fn write(&mut self, data: &[u8], _timeout: Duration) -> usize {
        let mut state = self.state.lock();
        let Some(format) = state.format else {
            return 0;
        };
        let room = format.align_bytes(state.capacity - state.buffered);
        let take = format.align_bytes(data.len()).min(room);
        state.buffered += take;
        state.written += take;
        take
    }

    fn suspend(&mut self) {
        self.state.lock().suspended = true;
    }

    fn resume(&mut self) {
        self.state.lock().suspended = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.lock().volume = volume;
    }

    fn take_event(&mut self) -> Option<DeviceEvent> {
        self.state.lock().events.pop_front()
    }
}

impl DeviceProbe {
    /// Play `duration` of audio at the device clock, which runs `mismatch`
    /// faster (positive) or slower (negative) than nominal.
    ///
    /// Returns false if the device ran dry.
    pub fn consume(&self, duration: Duration, mismatch: f64) -> bool {
        let mut state = self.state.lock();
        let Some(format) = state.format else {
            return true;
        };
        if state.suspended {
            return true;
        }

        state.clock += format.sample_rate as f64 * (1.0 + mismatch) * duration.as_secs_f64();
        let frames = state.clock.floor();
        state.clock -= frames;

        let bytes = format.bytes_for_frames(frames as usize);
        if state.buffered < bytes {
            state.buffered = 0;
            state.underruns += 1;
            state.events.push_back(DeviceEvent::Underrun);
            return false;
        }
        state.buffered -= bytes;
        true
    }

    pub fn set_nearest(&self, format: AudioFormat) {
        self.state.lock().nearest = Some(format);
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.state.lock().fail_open = fail;
    }

    pub fn push_event(&self, event: DeviceEvent) {
        self.state.lock().events.push_back(event);
    }

    /// Mark the device buffer completely full.
    pub fn saturate(&self) {
        let mut state = self.state.lock();
        state.buffered = state.capacity;
    }

    pub fn buffered(&self) -> usize {
        self.state.lock().buffered
    }

    pub fn format(&self) -> Option<AudioFormat> {
        self.state.lock().format
    }

    pub fn opens(&self) -> usize {
        self.state.lock().opens
    }

    pub fn closes(&self) -> usize {
        self.state.lock().closes
    }

    pub fn is_suspended(&self) -> bool {
        self.state.lock().suspended
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    pub fn underruns(&self) -> usize {
        self.state.lock().underruns
    }

    pub fn bytes_written(&self) -> usize {
        self.state.lock().written
    }

    pub fn clear_underruns(&self) {
        let mut state = self.state.lock();
        state.underruns = 0;
        state.events.clear();
    }
}

/// A core that renders video frames at `fps` and emits each frame's audio in
/// one burst, the way `run_frame` does.
pub struct BurstProducer {
    rate: u32,
    fps: f64,
    elapsed: f64,
    frame_budget: f64,
    phase: f64,
}

impl BurstProducer {
    pub fn new(rate: u32, fps: f64) -> Self {
        Self {
            rate,
            fps,
            elapsed: 0.0,
            frame_budget: 0.0,
            phase: 0.0,
        }
    }

    /// Advance wall time, pushing a burst for every video frame that elapsed.
    ///
    /// Returns frames queued.
    pub fn advance(&mut self, duration: Duration, producer: &mut AudioProducer) -> usize {
        self.elapsed += duration.as_secs_f64() * self.fps;
        let mut queued = 0;

        while self.elapsed >= 1.0 {
            self.elapsed -= 1.0;
            self.frame_budget += self.rate as f64 / self.fps;
            let frames = self.frame_budget.floor() as usize;
            self.frame_budget -= frames as f64;

            let mut samples = Vec::with_capacity(frames * 2);
            for _ in 0..frames {
                let s = (self.phase.sin() * 8000.0) as i16;
                samples.push(s);
                samples.push(s);
                self.phase += 2.0 * std::f64::consts::PI * 440.0 / self.rate as f64;
            }
            queued += producer.push_frames(&samples);
        }

        queued
    }
}
