//! Libretro core hosting.
//!
//! [`CoreHost`] loads a core from a shared library (or attaches a statically
//! linked one), answers its environment calls, and drives the game, frame and
//! save-state lifecycle. Audio produced by the core goes straight into a
//! `retrohost-audio` ring; video goes to a [`FrameSink`]; input comes from an
//! [`InputSource`].
//!
//! ```ignore
//! use retrohost_core::{CoreHost, HostConfig};
//!
//! let mut host = CoreHost::new(HostConfig::default())?;
//! host.load_core("cores/snes9x_libretro.so")?;
//! host.load_game("roms/game.sfc")?;
//! loop {
//!     host.run_frame()?;
//! }
//! ```

pub mod abi;

pub mod error;
pub use error::{ErrorKind, HostError, Result, StateError};

mod config;
pub use config::HostConfig;

mod state;
pub use state::{CoreState, HostEvent};

mod av;
pub use av::{AvInfo, Geometry, HwContextType, HwRenderRequest, InputDescriptor, PixelFormat, SystemInfo, Timing};

mod variables;
pub use variables::{Variable, VariableRegistry};

mod frame;
pub use frame::{CapturedFrame, FrameCapture, FrameContent, FrameSink, NullFrameSink, VideoFrame};

mod input;
pub use input::{InputPorts, InputSource, NullInput, JOYPAD_BUTTONS};

mod symbols;
pub use symbols::{is_library_path, SymbolTable, REQUIRED_SYMBOLS};

mod game;
pub use game::{GameImage, LoadedGame};

mod context;
mod callbacks;
pub use callbacks::CORE_LOG_TARGET;

mod environment;
pub use environment::{EnvCommand, EnvKind};

mod host;
pub use host::{CoreHost, Region};
