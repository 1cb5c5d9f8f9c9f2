//! A core host wired to an audio pipeline.

use crate::builder::SessionBuilder;
use crate::config::SessionConfig;
use crate::Result;
use retrohost_audio::{AudioPipeline, DeviceSink, RingStats};
use retrohost_core::{AvInfo, CoreHost, CoreState, HostEvent, SystemInfo};
use std::path::Path;
use std::sync::Arc;

/// One playable session: the core host produces, the pipeline drains.
///
/// The pipeline runs only while a game is loaded and the session is not
/// paused.
pub struct Session {
    // Dropped first so the core unloads before the drain thread stops.
    host: CoreHost,
    pipeline: AudioPipeline,
    paused: bool,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Build a session draining into `sink` and start the drain thread.
    pub fn new(config: &SessionConfig, sink: Box<dyn DeviceSink>) -> Result<Self> {
        config.validate()?;

        let (mut pipeline, producer) = AudioPipeline::new(config.pipeline_config(), sink)?;
        pipeline.set_volume(config.output.volume);

        let mut host = CoreHost::new(config.host_config())?;
        host.set_audio_output(producer, pipeline.formats());

        pipeline.start();
        tracing::debug!("Session started");

        Ok(Self {
            host,
            pipeline,
            paused: false,
        })
    }

    pub fn host(&self) -> &CoreHost {
        &self.host
    }

    /// Direct host access. Lifecycle changes made through it reach the
    /// pipeline run flag on the next [`run_frame`](Self::run_frame).
    pub fn host_mut(&mut self) -> &mut CoreHost {
        &mut self.host
    }

    pub fn pipeline(&self) -> &AudioPipeline {
        &self.pipeline
    }

    pub fn state(&self) -> CoreState {
        self.host.state()
    }

    pub fn events(&self) -> crossbeam_channel::Receiver<HostEvent> {
        self.host.events()
    }

    pub fn load_core(&mut self, path: impl AsRef<Path>) -> Result<SystemInfo> {
        Ok(self.host.load_core(path)?.clone())
    }

    pub fn load_game(&mut self, path: impl AsRef<Path>) -> Result<AvInfo> {
        let av_info = self.host.load_game(path)?;
        self.sync_running();
        Ok(av_info)
    }

    pub fn run_frame(&mut self) -> Result<()> {
        let result = self.host.run_frame();
        self.sync_running();
        Ok(result?)
    }

    /// Suspend audio output. Frames can still be run.
    pub fn pause(&mut self) {
        self.paused = true;
        self.sync_running();
    }

    pub fn resume(&mut self) {
        self.paused = false;
        self.sync_running();
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_volume(&self, volume: f32) {
        self.pipeline.set_volume(volume);
    }

    pub fn volume(&self) -> f32 {
        self.pipeline.volume()
    }

    pub fn ring_stats(&self) -> Arc<RingStats> {
        self.pipeline.ring_stats()
    }

    /// Save SRAM, unload the game and core, and silence the pipeline.
    pub fn unload(&mut self) -> Result<()> {
        self.host.unload()?;
        self.sync_running();
        Ok(())
    }

    fn sync_running(&self) {
        let running = !self.paused && self.host.state() == CoreState::Ready;
        self.pipeline.set_running(running);
    }
}
