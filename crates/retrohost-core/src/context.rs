//! State reachable from the C callbacks.
//!
//! libretro callbacks carry no user pointer, so the host installs its shared
//! state in a thread-local slot for the duration of each call into the core.

use crate::abi::{retro_frame_time_callback, retro_keyboard_callback};
use crate::av::{AvInfo, HwRenderRequest, InputDescriptor, PixelFormat};
use crate::frame::{FrameSink, NullFrameSink};
use crate::input::{InputSource, NullInput};
use crate::state::{EventQueue, HostEvent};
use crate::variables::VariableRegistry;
use parking_lot::Mutex;
use retrohost_audio::{AudioFormat, AudioProducer, FormatCell};
use std::cell::RefCell;
use std::ffi::CString;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Default)]
pub(crate) struct Directories {
    pub system: Option<CString>,
    pub save: Option<CString>,
    pub content: Option<CString>,
    pub libretro_path: Option<CString>,
}

pub(crate) fn path_cstring(path: &Path) -> Option<CString> {
    CString::new(path.to_string_lossy().into_owned()).ok()
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LastFrame {
    pub width: u32,
    pub height: u32,
    pub pitch: usize,
    pub duplicate: bool,
    pub hardware: bool,
}

#[derive(Debug, Default)]
pub(crate) struct VideoState {
    pub pixel_format: PixelFormat,
    pub rotation: u32,
    pub hw_render: Option<HwRenderRequest>,
    pub last_frame: Option<LastFrame>,
    pub refreshes: u64,
}

/// Pointers and requests the core hands over for later use.
#[derive(Debug, Default)]
pub(crate) struct CoreCallbacks {
    pub keyboard: Option<retro_keyboard_callback>,
    pub frame_time: Option<retro_frame_time_callback>,
    pub input_descriptors: Vec<InputDescriptor>,
    pub performance_level: u32,
    pub support_no_game: bool,
    pub shutdown_requested: bool,
}

pub(crate) struct AudioOutput {
    pub producer: Option<AudioProducer>,
    pub formats: Option<Arc<FormatCell>>,
}

impl AudioOutput {
    /// Publish the core rate, or withdraw the format when it is unusable.
    pub fn publish_rate(&self, rate: u32) {
        if let Some(formats) = &self.formats {
            let format = AudioFormat::core_native(rate);
            if format.is_valid() {
                formats.publish(format);
            } else {
                tracing::warn!("Core reported unusable audio rate {}", rate);
                formats.clear();
            }
        }
    }

    pub fn withdraw(&self) {
        if let Some(formats) = &self.formats {
            formats.clear();
        }
    }
}

/// Everything the callbacks touch. Each group has its own lock, held only
/// for the read or write.
pub(crate) struct HostShared {
    pub variables: Mutex<VariableRegistry>,
    pub directories: Mutex<Directories>,
    pub video: Mutex<VideoState>,
    pub av_info: Mutex<Option<AvInfo>>,
    pub frame_sink: Mutex<Box<dyn FrameSink>>,
    pub input: Mutex<Box<dyn InputSource>>,
    pub callbacks: Mutex<CoreCallbacks>,
    pub audio: Mutex<AudioOutput>,
    events: EventQueue,
}

impl HostShared {
    pub fn new(events: EventQueue) -> Self {
        Self {
            variables: Mutex::new(VariableRegistry::new()),
            directories: Mutex::new(Directories::default()),
            video: Mutex::new(VideoState::default()),
            av_info: Mutex::new(None),
            frame_sink: Mutex::new(Box::new(NullFrameSink)),
            input: Mutex::new(Box::new(NullInput)),
            callbacks: Mutex::new(CoreCallbacks::default()),
            audio: Mutex::new(AudioOutput {
                producer: None,
                formats: None,
            }),
            events,
        }
    }

    /// Never blocks; the oldest queued event is dropped when nobody drains
    /// the channel.
    pub fn emit(&self, event: HostEvent) {
        self.events.push(event);
    }

    /// Forget everything the previous core told us.
    pub fn reset_core_state(&self) {
        self.variables.lock().clear();
        *self.video.lock() = VideoState::default();
        *self.av_info.lock() = None;
        *self.callbacks.lock() = CoreCallbacks::default();
        self.directories.lock().libretro_path = None;
    }
}

thread_local! {
    static ACTIVE: RefCell<Option<Arc<HostShared>>> = const { RefCell::new(None) };
}

/// Installs a host as the callback target until dropped, then restores
/// whatever was active before.
pub(crate) struct ActiveHostGuard {
    previous: Option<Arc<HostShared>>,
}

impl ActiveHostGuard {
    pub fn install(shared: &Arc<HostShared>) -> Self {
        let previous = ACTIVE.with(|slot| slot.replace(Some(Arc::clone(shared))));
        Self { previous }
    }
}

impl Drop for ActiveHostGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let _ = ACTIVE.try_with(|slot| *slot.borrow_mut() = previous);
    }
}

/// Run `f` against the active host. `None` when no host is active on this
/// thread, e.g. a callback from a core-spawned thread.
pub(crate) fn with_active<R>(f: impl FnOnce(&HostShared) -> R) -> Option<R> {
    let shared = ACTIVE
        .try_with(|slot| slot.borrow().clone())
        .ok()
        .flatten()?;
    Some(f(&shared))
}
