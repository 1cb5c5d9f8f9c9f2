//! The periodic drain/resample/write cycle.

use crate::config::PipelineConfig;
use crate::convert;
use crate::drift::DriftController;
use crate::format::{negotiate, AudioFormat, NegotiatedFormat};
use crate::resample::StreamResampler;
use crate::ring::AudioConsumer;
use crate::shared::{FormatCell, PipelineControl};
use crate::sink::{DeviceEvent, DeviceSink};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Delay before retrying a device that failed to open.
const REOPEN_BACKOFF: Duration = Duration::from_millis(500);

/// Counters for one drain instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrainStats {
    pub ticks: u64,
    /// Format refreshes (stream + resampler rebuilt).
    pub rebuilds: u64,
    /// Device restarts after underrun.
    pub restarts: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    /// Converted bytes the device had no room for.
    pub bytes_discarded: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickOutcome {
    Idle,
    Drained,
    Refresh,
}

struct ActiveStream {
    format: NegotiatedFormat,
    drift: DriftController,
    resampler: Option<StreamResampler>,
    input: Vec<u8>,
    left: Vec<f32>,
    right: Vec<f32>,
    output: Vec<u8>,
    last_ratio: f64,
}

/// Owns the consumer side of the ring and the device sink.
///
/// Driven by [`crate::AudioPipeline`]'s thread, or directly via
/// [`AudioDrain::tick`] when the caller wants manual clocking.
pub struct AudioDrain {
    consumer: AudioConsumer,
    sink: Box<dyn DeviceSink>,
    formats: Arc<FormatCell>,
    control: Arc<PipelineControl>,
    config: PipelineConfig,
    seen_generation: Option<u64>,
    stream: Option<ActiveStream>,
    suspended: bool,
    applied_volume: f32,
    retry_at: Option<Instant>,
    stats: DrainStats,
}

impl AudioDrain {
    pub fn new(
        consumer: AudioConsumer,
        sink: Box<dyn DeviceSink>,
        formats: Arc<FormatCell>,
        control: Arc<PipelineControl>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            consumer,
            sink,
            formats,
            control,
            config,
            seen_generation: None,
            stream: None,
            suspended: false,
            applied_volume: f32::NAN,
            retry_at: None,
            stats: DrainStats::default(),
        }
    }

    pub fn stats(&self) -> DrainStats {
        self.stats
    }

    /// Negotiated device format, once a stream is open.
    pub fn device_format(&self) -> Option<AudioFormat> {
        self.stream.as_ref().map(|s| s.format.output)
    }

    pub fn negotiated(&self) -> Option<NegotiatedFormat> {
        self.stream.as_ref().map(|s| s.format)
    }

    /// Ratio used for the most recent conversion.
    pub fn current_ratio(&self) -> Option<f64> {
        self.stream.as_ref().map(|s| s.last_ratio)
    }

    pub fn target_bytes(&self) -> Option<usize> {
        self.stream.as_ref().map(|s| s.drift.target_bytes())
    }

    pub fn has_resampler(&self) -> bool {
        self.stream
            .as_ref()
            .is_some_and(|s| s.resampler.is_some())
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Suspend or resume the device to match the running flag.
    ///
    /// Returns whether the pipeline is running.
    pub fn sync_run_state(&mut self) -> bool {
        let running = self.control.is_running();
        if self.stream.is_some() {
            if !running && !self.suspended {
                debug!("Audio paused");
                self.sink.suspend();
                self.suspended = true;
            } else if running && self.suspended {
                debug!("Audio resumed");
                self.sink.resume();
                self.suspended = false;
            }
        }
        running
    }

    /// One drain cycle.
    pub fn tick(&mut self) {
        self.stats.ticks += 1;

        let generation = self.formats.generation();
        if self.seen_generation != Some(generation) {
            self.seen_generation = Some(generation);
            self.rebuild();
        } else if self.stream.is_none() && self.retry_due() {
            self.rebuild();
        }

        self.handle_device_events();
        self.apply_volume();

        if self.drain_once() == TickOutcome::Refresh {
            self.rebuild();
        }
    }

    /// Close the device. The next tick reopens it if a format is published.
    pub fn shutdown(&mut self) {
        if self.stream.take().is_some() {
            self.sink.close();
        }
        self.seen_generation = None;
    }

    fn retry_due(&self) -> bool {
        self.formats.current().is_some()
            && self.retry_at.is_some_and(|at| Instant::now() >= at)
    }

    fn apply_volume(&mut self) {
        let volume = self.control.volume();
        if volume != self.applied_volume {
            self.sink.set_volume(volume);
            self.applied_volume = volume;
        }
    }

    fn handle_device_events(&mut self) {
        let mut restart = false;
        let mut rebuild = false;

        while let Some(event) = self.sink.take_event() {
            match event {
                DeviceEvent::Underrun => restart = true,
                DeviceEvent::StreamError(reason) => {
                    warn!("Audio stream error, reopening device: {}", reason);
                    rebuild = true;
                }
            }
        }

        if rebuild {
            self.rebuild();
        } else if restart && self.stream.is_some() {
            warn!("Audio device underrun, restarting output");
            self.restart_device();
        }
    }

    /// Tear down and recreate the device stream, resampler and scratch buffers
    /// for the currently published format.
    fn rebuild(&mut self) {
        self.stats.rebuilds += 1;
        self.retry_at = None;

        let Some(input) = self.formats.current() else {
            if self.stream.take().is_some() {
                debug!("Audio format withdrawn, closing device");
                self.sink.close();
            }
            return;
        };

        let format = negotiate(
            input,
            self.sink.nearest_format(&input),
            self.sink.preferred_format(),
        );
        debug!(
            "Audio format in: {}, out: {}, ratio {:.6}",
            format.input, format.output, format.nominal_ratio
        );

        if let Err(e) = self.sink.open(format.output) {
            warn!("Failed to open audio device: {}", e);
            self.stream = None;
            self.retry_at = Some(Instant::now() + REOPEN_BACKOFF);
            return;
        }

        let resampler = match StreamResampler::new(format.nominal_ratio, self.config.quality) {
            Ok(resampler) => Some(resampler),
            Err(e) => {
                warn!("Resampler unavailable, output will be silent: {}", e);
                None
            }
        };

        let scratch_bytes = self.sink.buffer_size() * 2;
        let scratch_frames = format.output.frames_for_bytes(scratch_bytes);
        debug!("Allocated {} bytes for conversion", scratch_bytes);

        self.stream = Some(ActiveStream {
            format,
            drift: DriftController::new(&format, self.config.target_fill, self.config.max_deviation),
            resampler,
            input: vec![0u8; self.consumer.capacity_bytes()],
            left: Vec::with_capacity(scratch_frames),
            right: Vec::with_capacity(scratch_frames),
            output: Vec::with_capacity(scratch_bytes),
            last_ratio: format.nominal_ratio,
        });

        self.after_open();
    }

    /// Reopen the device in the current format, keeping resampler state.
    fn restart_device(&mut self) {
        let Some(output) = self.device_format() else {
            return;
        };
        self.stats.restarts += 1;

        if let Err(e) = self.sink.open(output) {
            warn!("Failed to restart audio device: {}", e);
            self.stream = None;
            self.retry_at = Some(Instant::now() + REOPEN_BACKOFF);
            return;
        }
        self.after_open();
    }

    fn after_open(&mut self) {
        self.prefill();
        self.applied_volume = f32::NAN;
        self.suspended = false;
        if !self.control.is_running() {
            self.sink.suspend();
            self.suspended = true;
        }
    }

    /// Fill the fresh device buffer with silence up to the target level.
    fn prefill(&mut self) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        let output = stream.format.output;
        let bytes = stream.drift.target_bytes().min(self.sink.bytes_free());

        stream.output.clear();
        convert::encode_silence(output.frames_for_bytes(bytes), &output, &mut stream.output);
        let written = self.sink.write(&stream.output, Duration::ZERO);
        trace!("Prefilled {} bytes of silence", written);
    }

    fn drain_once(&mut self) -> TickOutcome {
        let Some(stream) = self.stream.as_mut() else {
            return TickOutcome::Idle;
        };

        let capacity = self.sink.buffer_size();
        let free = self.sink.bytes_free();
        if free == 0 {
            warn!("Output buffer full, resetting");
            return TickOutcome::Refresh;
        }

        let pending = stream.format.input.bytes_for_frames(
            stream.resampler.as_ref().map_or(0, |r| r.pending_frames()),
        );
        let plan = stream
            .drift
            .plan(capacity, free, self.consumer.available_bytes() + pending);
        let want = plan.read_bytes.min(stream.input.len());
        if want == 0 {
            trace!("Output {} bytes over target, reading nothing", -plan.distance);
            return TickOutcome::Idle;
        }

        let read = self.consumer.read(&mut stream.input[..want]);
        if read == 0 {
            return TickOutcome::Idle;
        }

        let backlog = read + self.consumer.available_bytes() + pending;
        let ratio = stream.drift.ratio_for_read(&plan, backlog);
        stream.last_ratio = ratio;
        stream.left.clear();
        stream.right.clear();
        stream.output.clear();

        let output = stream.format.output;
        let converted = match stream.resampler.as_mut() {
            Some(resampler) => resample_into(
                resampler,
                &stream.input[..read],
                ratio,
                &mut stream.left,
                &mut stream.right,
            ),
            None => Err(crate::AudioError::ResamplerInit("not initialized".into())),
        };

        match converted {
            Ok(_) => convert::encode_device(&stream.left, &stream.right, &output, &mut stream.output),
            Err(e) => {
                if stream.resampler.is_some() {
                    warn!("Resampling failed, writing silence: {}", e);
                }
                let frames = (stream.format.input.frames_for_bytes(read) as f64 * ratio) as usize;
                convert::encode_silence(frames, &output, &mut stream.output);
            }
        }

        let written = self.sink.write(&stream.output, self.config.write_timeout);
        let discarded = stream.output.len() - written.min(stream.output.len());

        self.stats.bytes_in += read as u64;
        self.stats.bytes_out += written as u64;
        self.stats.bytes_discarded += discarded as u64;

        trace!(
            "Drain: needed {} bytes, read {}, wrote {} (ratio {:.6}, distance {}, backlog {})",
            plan.read_bytes,
            read,
            written,
            ratio,
            plan.distance,
            backlog
        );

        TickOutcome::Drained
    }
}

fn resample_into(
    resampler: &mut StreamResampler,
    input: &[u8],
    ratio: f64,
    left: &mut Vec<f32>,
    right: &mut Vec<f32>,
) -> crate::Result<usize> {
    resampler.set_ratio(ratio)?;
    resampler.push_core_bytes(input);
    resampler.process(left, right)
}

impl Drop for AudioDrain {
    fn drop(&mut self) {
        self.shutdown();
    }
}
