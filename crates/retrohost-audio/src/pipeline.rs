//! Drain thread ownership and the public pipeline handle.

use crate::config::PipelineConfig;
use crate::drain::AudioDrain;
use crate::ring::{audio_ring, AudioProducer, RingStats};
use crate::shared::{FormatCell, PipelineControl};
use crate::sink::DeviceSink;
use crate::Result;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thread_priority::ThreadPriority;

/// Poll period while paused.
const PAUSED_POLL: Duration = Duration::from_millis(10);

/// Owns the audio-drain thread.
///
/// The producer half of the ring is handed out at construction and belongs to
/// whoever runs the core; everything else crosses threads through
/// [`FormatCell`] and [`PipelineControl`].
pub struct AudioPipeline {
    formats: Arc<FormatCell>,
    control: Arc<PipelineControl>,
    ring_stats: Arc<RingStats>,
    config: PipelineConfig,
    drain: Option<AudioDrain>,
    thread_handle: Option<JoinHandle<()>>,
}

impl AudioPipeline {
    /// Build a pipeline draining into `sink`. The thread is not started yet.
    pub fn new(config: PipelineConfig, sink: Box<dyn DeviceSink>) -> Result<(Self, AudioProducer)> {
        config.validate()?;

        let (producer, consumer) = audio_ring(config.ring_capacity_frames);
        let formats = Arc::new(FormatCell::new());
        let control = Arc::new(PipelineControl::default());
        let ring_stats = producer.stats();

        let drain = AudioDrain::new(
            consumer,
            sink,
            Arc::clone(&formats),
            Arc::clone(&control),
            config,
        );

        Ok((
            Self {
                formats,
                control,
                ring_stats,
                config,
                drain: Some(drain),
                thread_handle: None,
            },
            producer,
        ))
    }

    pub fn start(&mut self) {
        if self.thread_handle.is_some() {
            return;
        }
        let Some(drain) = self.drain.take() else {
            return;
        };

        let control = Arc::clone(&self.control);
        let interval = self.config.tick_interval;

        let handle = thread::Builder::new()
            .name("retrohost-audio".into())
            .spawn(move || {
                let _ = thread_priority::set_current_thread_priority(ThreadPriority::Max);
                drain_loop(drain, control, interval);
            })
            .expect("Failed to spawn audio drain thread");

        self.thread_handle = Some(handle);
    }

    pub fn stop(&mut self) {
        self.control.request_shutdown();

        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_started(&self) -> bool {
        self.thread_handle.is_some()
    }

    /// Format cell the core host publishes its audio format to.
    pub fn formats(&self) -> Arc<FormatCell> {
        Arc::clone(&self.formats)
    }

    pub fn control(&self) -> Arc<PipelineControl> {
        Arc::clone(&self.control)
    }

    pub fn ring_stats(&self) -> Arc<RingStats> {
        Arc::clone(&self.ring_stats)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Resume (true) or suspend (false) device output and the drain tick.
    pub fn set_running(&self, running: bool) {
        self.control.set_running(running);
    }

    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    pub fn set_volume(&self, volume: f32) {
        self.control.set_volume(volume);
    }

    pub fn volume(&self) -> f32 {
        self.control.volume()
    }
}

impl Drop for AudioPipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

fn drain_loop(mut drain: AudioDrain, control: Arc<PipelineControl>, interval: Duration) {
    while !control.is_shutdown() {
        if drain.sync_run_state() {
            drain.tick();
            thread::sleep(interval);
        } else {
            thread::sleep(PAUSED_POLL);
        }
    }

    let stats = drain.stats();
    tracing::debug!(
        "Audio drain stopped after {} ticks ({} rebuilds, {} restarts)",
        stats.ticks,
        stats.rebuilds,
        stats.restarts
    );
    drain.shutdown();
}
