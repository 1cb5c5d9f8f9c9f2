//! # retrohost - libretro core host
//!
//! Loads an emulator or game-engine core that speaks the libretro C ABI and
//! turns its per-frame audio, video and input activity into a playable session.
//!
//! ## Architecture
//!
//! retrohost is an umbrella crate that coordinates:
//! - **retrohost-core** - Core hosting (loading, environment dispatch, frame and save-state lifecycle)
//! - **retrohost-audio** - Drift-corrected audio output (ring buffer, adaptive resampling, device sink)
//!
//! ## Quick Start
//!
//! ```ignore
//! use retrohost::prelude::*;
//!
//! let mut session = Session::builder().save_directory("saves").build()?;
//! session.load_core("cores/snes9x_libretro.so")?;
//! let av = session.load_game("roms/game.sfc")?;
//!
//! let frame_time = Duration::from_secs_f64(1.0 / av.timing.fps);
//! loop {
//!     session.run_frame()?;
//!     std::thread::sleep(frame_time);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - CPAL audio output
//! - `cpal` - Play through the system audio device

/// Re-export of retrohost-core for direct access
pub use retrohost_core as core;

/// Re-export of retrohost-audio for direct access
pub use retrohost_audio as audio;

mod builder;
pub use builder::SessionBuilder;

mod config;
pub use config::{AudioSection, HostSection, OutputSection, SessionConfig};

mod error;
pub use error::{Error, Result};

mod session;
pub use session::Session;

pub use retrohost_core::{
    AvInfo, CoreHost, CoreState, ErrorKind, FrameCapture, FrameSink, HostConfig, HostEvent,
    InputPorts, InputSource, SystemInfo, VideoFrame,
};

pub use retrohost_audio::{
    AudioFormat, AudioPipeline, DeviceSink, NullSink, PipelineConfig, ResampleQuality,
};

#[cfg(feature = "cpal")]
pub use retrohost_audio::{CpalSink, OutputConfig};

pub mod prelude {
    pub use crate::{
        AvInfo, CoreState, Error, FrameCapture, FrameSink, HostEvent, InputPorts, InputSource,
        Result, Session, SessionBuilder, SessionConfig, VideoFrame,
    };
    pub use std::time::Duration;
}
