//! Core lifecycle: load, run, save, unload.

use crate::abi::{self, retro_system_av_info, retro_system_info};
use crate::av::{AvInfo, HwRenderRequest, InputDescriptor, PixelFormat, SystemInfo};
use crate::callbacks;
use crate::config::HostConfig;
use crate::context::{path_cstring, ActiveHostGuard, HostShared};
use crate::error::{HostError, Result, StateError};
use crate::frame::FrameSink;
use crate::game::{check_readable, LoadedGame};
use crate::input::InputSource;
use crate::state::{CoreState, EventQueue, HostEvent};
use crate::symbols::{is_library_path, SymbolTable};
use crate::variables::Variable;
use crossbeam_channel::Receiver;
use libloading::Library;
use retrohost_audio::{AudioProducer, FormatCell};
use std::ffi::CString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const EVENT_CAPACITY: usize = 1024;

/// Video standard reported by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Ntsc,
    Pal,
}

struct LoadedCore {
    symbols: SymbolTable,
    origin: PathBuf,
    system_info: SystemInfo,
    api_version: u32,
    // Dropped after the core is deinitialised.
    _library: Option<Library>,
}

/// Hosts one core and at most one game.
///
/// All calls into the core happen on the caller's thread, synchronously. The
/// host is not re-entrant: frame sinks and input sources must not call back
/// into it.
pub struct CoreHost {
    shared: Arc<HostShared>,
    config: HostConfig,
    state: CoreState,
    core: Option<LoadedCore>,
    game: Option<LoadedGame>,
    events: EventQueue,
}

impl CoreHost {
    pub fn new(config: HostConfig) -> Result<Self> {
        config.validate()?;

        let events = EventQueue::bounded(EVENT_CAPACITY);
        let shared = Arc::new(HostShared::new(events.clone()));

        let host = Self {
            shared,
            config,
            state: CoreState::NeedCore,
            core: None,
            game: None,
            events,
        };
        host.sync_directories();
        Ok(host)
    }

    /// Route core audio into a pipeline ring and publish its format there.
    pub fn set_audio_output(&mut self, producer: AudioProducer, formats: Arc<FormatCell>) {
        let mut audio = self.shared.audio.lock();
        audio.producer = Some(producer);
        audio.formats = Some(formats);
        if let Some(info) = *self.shared.av_info.lock() {
            audio.publish_rate(info.timing.audio_rate());
        }
    }

    pub fn set_frame_sink(&mut self, sink: Box<dyn FrameSink>) {
        *self.shared.frame_sink.lock() = sink;
    }

    pub fn set_input_source(&mut self, source: Box<dyn InputSource>) {
        *self.shared.input.lock() = source;
    }

    /// Receiver for lifecycle events. When it falls behind, the oldest
    /// events are dropped first.
    pub fn events(&self) -> Receiver<HostEvent> {
        self.events.receiver()
    }

    pub fn state(&self) -> CoreState {
        self.state
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    fn transition(&mut self, to: CoreState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        tracing::debug!("Core host {} -> {}", from, to);
        self.events.push(HostEvent::StateChanged { from, to });
    }

    /// Move to Error and report once.
    fn fail(&mut self, error: HostError) -> HostError {
        tracing::error!("{}", error);
        self.transition(CoreState::Error);
        self.events.push(HostEvent::Error(error.kind()));
        error
    }

    /// Report a runtime failure without leaving the current state.
    fn report(&self, error: HostError) -> HostError {
        tracing::warn!("{}", error);
        self.events.push(HostEvent::Error(error.kind()));
        error
    }

    fn require(&self, operation: &'static str, allowed: &[CoreState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(HostError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn symbols(&self) -> Result<SymbolTable> {
        self.core
            .as_ref()
            .map(|core| core.symbols)
            .ok_or(HostError::NoCoreLoaded)
    }

    /// Call into the core with this host installed as the callback target.
    fn with_core<R>(&self, f: impl FnOnce(&SymbolTable) -> R) -> Result<R> {
        let symbols = self.symbols()?;
        let _guard = ActiveHostGuard::install(&self.shared);
        Ok(f(&symbols))
    }

    fn sync_directories(&self) {
        let mut directories = self.shared.directories.lock();
        directories.system = path_cstring(&self.config.system_directory);
        directories.save = path_cstring(&self.config.save_directory);
        directories.content = self.config.content_directory.as_deref().and_then(path_cstring);
    }

    pub fn set_system_directory(&mut self, path: impl Into<PathBuf>) {
        self.config.system_directory = path.into();
        self.sync_directories();
    }

    pub fn set_save_directory(&mut self, path: impl Into<PathBuf>) {
        self.config.save_directory = path.into();
        self.sync_directories();
    }

    pub fn set_content_directory(&mut self, path: Option<PathBuf>) {
        self.config.content_directory = path;
        self.sync_directories();
    }

    /// Load a core from a shared library.
    pub fn load_core(&mut self, path: impl AsRef<Path>) -> Result<&SystemInfo> {
        let path = path.as_ref();
        if let Some(core) = &self.core {
            return Err(HostError::CoreAlreadyLoaded(core.origin.clone()));
        }

        if !is_library_path(path) {
            return Err(self.fail(HostError::CoreNotLibrary(path.to_path_buf())));
        }

        if let Err(e) = check_readable(path) {
            let error = match e.kind() {
                io::ErrorKind::NotFound => HostError::CoreNotFound(path.to_path_buf()),
                io::ErrorKind::PermissionDenied => HostError::CoreAccessDenied(path.to_path_buf()),
                _ => HostError::CoreUnknown {
                    path: path.to_path_buf(),
                    source: e,
                },
            };
            return Err(self.fail(error));
        }

        // SAFETY: loading runs the library's initialisers; cores are trusted
        // to the extent of being loaded at all.
        let library = match unsafe { Library::new(path) } {
            Ok(library) => library,
            Err(e) => {
                return Err(self.fail(HostError::CoreLoad {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }))
            }
        };

        let symbols = match SymbolTable::resolve(&library) {
            Ok(symbols) => symbols,
            Err(missing) => {
                return Err(self.fail(HostError::MissingSymbols {
                    path: path.to_path_buf(),
                    missing,
                }))
            }
        };

        self.install_core(symbols, path.to_path_buf(), Some(library))
    }

    /// Host a core whose entry points are already resolved, e.g. one linked
    /// into the binary. `origin` is reported as the library path.
    pub fn attach_core(&mut self, symbols: SymbolTable, origin: impl Into<PathBuf>) -> Result<&SystemInfo> {
        if let Some(core) = &self.core {
            return Err(HostError::CoreAlreadyLoaded(core.origin.clone()));
        }
        self.install_core(symbols, origin.into(), None)
    }

    fn install_core(
        &mut self,
        symbols: SymbolTable,
        origin: PathBuf,
        library: Option<Library>,
    ) -> Result<&SystemInfo> {
        self.shared.reset_core_state();
        self.shared.directories.lock().libretro_path = path_cstring(&origin);

        let (api_version, raw_info) = {
            let _guard = ActiveHostGuard::install(&self.shared);
            // SAFETY: entry points resolved with libretro.h signatures; the
            // callbacks are installed before retro_init as the ABI requires.
            unsafe {
                (symbols.set_environment)(callbacks::environment);
                (symbols.set_video_refresh)(callbacks::video_refresh);
                (symbols.set_audio_sample)(callbacks::audio_sample);
                (symbols.set_audio_sample_batch)(callbacks::audio_sample_batch);
                (symbols.set_input_poll)(callbacks::input_poll);
                (symbols.set_input_state)(callbacks::input_state);
                (symbols.init)();

                let mut raw_info = retro_system_info::default();
                (symbols.get_system_info)(&mut raw_info);
                ((symbols.api_version)(), raw_info)
            }
        };

        // SAFETY: strings returned by get_system_info are static in the core.
        let system_info = unsafe { SystemInfo::from_raw(&raw_info) };
        if api_version != abi::API_VERSION {
            tracing::warn!(
                "Core {} reports API version {} (expected {})",
                system_info.library_name,
                api_version,
                abi::API_VERSION
            );
        }
        tracing::debug!(
            "Loaded core {} {} from {}",
            system_info.library_name,
            system_info.library_version,
            origin.display()
        );

        self.core = Some(LoadedCore {
            symbols,
            origin,
            system_info,
            api_version,
            _library: library,
        });
        self.transition(CoreState::NeedGame);

        Ok(&self.core.as_ref().ok_or(HostError::NoCoreLoaded)?.system_info)
    }

    /// Load a game into the current core.
    pub fn load_game(&mut self, path: impl AsRef<Path>) -> Result<AvInfo> {
        let path = path.as_ref();
        let need_fullpath = match &self.core {
            Some(core) => core.system_info.need_fullpath,
            None => return Err(HostError::NoCoreLoaded),
        };
        if let Some(game) = &self.game {
            return Err(HostError::GameAlreadyLoaded(game.path().to_path_buf()));
        }
        self.require("load_game", &[CoreState::NeedGame, CoreState::Error])?;

        let game = match LoadedGame::open(path, need_fullpath) {
            Ok(game) => game,
            Err(e) => return Err(self.fail(e)),
        };

        let info = game.game_info();
        // SAFETY: `info` borrows from `game`, which outlives the call.
        let loaded = self.with_core(|core| unsafe { (core.load_game)(&info) })?;
        if !loaded {
            return Err(self.fail(HostError::GameUnknown {
                path: path.to_path_buf(),
                reason: "core rejected the game".to_string(),
            }));
        }

        let mut raw_av = retro_system_av_info::default();
        // SAFETY: plain out-parameter.
        self.with_core(|core| unsafe { (core.get_system_av_info)(&mut raw_av) })?;
        let av_info = AvInfo::from(raw_av);

        *self.shared.av_info.lock() = Some(av_info);
        self.shared.audio.lock().publish_rate(av_info.timing.audio_rate());
        tracing::debug!(
            "Loaded game {} ({}x{} @ {:.3} fps, {:.1} Hz)",
            game.title(),
            av_info.geometry.base_width,
            av_info.geometry.base_height,
            av_info.timing.fps,
            av_info.timing.sample_rate
        );

        self.game = Some(game);
        if let Err(e) = self.load_sram() {
            tracing::warn!("SRAM not restored: {}", e);
        }
        self.transition(CoreState::Ready);
        Ok(av_info)
    }

    /// Run one frame. The core calls the audio, video and input callbacks
    /// from inside this call.
    pub fn run_frame(&mut self) -> Result<()> {
        self.require("run_frame", &[CoreState::Ready])?;
        self.transition(CoreState::Busy);
        // SAFETY: a game is loaded, so retro_run is valid to call.
        let result = self.with_core(|core| unsafe { (core.run)() });
        self.transition(CoreState::Ready);
        result
    }

    pub fn reset(&mut self) -> Result<()> {
        self.require("reset", &[CoreState::Ready])?;
        // SAFETY: game loaded.
        self.with_core(|core| unsafe { (core.reset)() })
    }

    /// Serialize the emulation state into an opaque blob.
    pub fn serialize_state(&mut self) -> Result<Vec<u8>> {
        self.require("serialize_state", &[CoreState::Ready])?;

        // SAFETY: game loaded.
        let size = self.with_core(|core| unsafe { (core.serialize_size)() })?;
        if size == 0 {
            return Err(self.report(StateError::Unsupported.into()));
        }

        let mut data = vec![0u8; size];
        // SAFETY: `data` holds exactly `size` writable bytes.
        let ok = self.with_core(|core| unsafe { (core.serialize)(data.as_mut_ptr().cast(), size) })?;
        if !ok {
            return Err(self.report(StateError::SerializeFailed { size }.into()));
        }
        Ok(data)
    }

    /// Restore a blob produced by [`serialize_state`](Self::serialize_state).
    pub fn unserialize_state(&mut self, data: &[u8]) -> Result<()> {
        self.require("unserialize_state", &[CoreState::Ready])?;

        // SAFETY: game loaded.
        let size = self.with_core(|core| unsafe { (core.serialize_size)() })?;
        if size == 0 {
            return Err(self.report(StateError::Unsupported.into()));
        }

        // SAFETY: the core only reads `data.len()` bytes.
        let ok = self.with_core(|core| unsafe { (core.unserialize)(data.as_ptr().cast(), data.len()) })?;
        if !ok {
            return Err(self.report(StateError::Rejected { size: data.len() }.into()));
        }
        Ok(())
    }

    /// `<save>/<title>_STATE.sav`
    pub fn state_path(&self) -> Option<PathBuf> {
        self.game.as_ref().map(|game| {
            self.config
                .save_directory
                .join(format!("{}_STATE.sav", game.title()))
        })
    }

    /// `<save>/<title>.srm`
    pub fn sram_path(&self) -> Option<PathBuf> {
        self.game
            .as_ref()
            .map(|game| self.config.save_directory.join(format!("{}.srm", game.title())))
    }

    /// Write the current state to the title's state file.
    pub fn save_state(&mut self) -> Result<PathBuf> {
        let data = self.serialize_state()?;
        let path = self.state_path().ok_or(HostError::InvalidState {
            operation: "save_state",
            state: self.state,
        })?;

        if let Err(source) = write_file(&path, &data) {
            return Err(self.report(StateError::File { path, source }.into()));
        }
        tracing::debug!("Saved {} byte state to {}", data.len(), path.display());
        Ok(path)
    }

    /// Restore the title's state file.
    pub fn load_state(&mut self) -> Result<()> {
        self.require("load_state", &[CoreState::Ready])?;
        let path = self.state_path().ok_or(HostError::InvalidState {
            operation: "load_state",
            state: self.state,
        })?;

        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(source) => return Err(self.report(StateError::File { path, source }.into())),
        };
        self.unserialize_state(&data)
    }

    /// Core SRAM region, if it exposes one.
    fn sram_region(&self) -> Result<Option<(*mut u8, usize)>> {
        // SAFETY: plain queries.
        let (data, size) = self.with_core(|core| unsafe {
            (
                (core.get_memory_data)(abi::MEMORY_SAVE_RAM),
                (core.get_memory_size)(abi::MEMORY_SAVE_RAM),
            )
        })?;
        if data.is_null() || size == 0 {
            Ok(None)
        } else {
            Ok(Some((data.cast(), size)))
        }
    }

    /// Persist SRAM. Returns false when the core has none.
    pub fn save_sram(&mut self) -> Result<bool> {
        let Some(path) = self.sram_path() else {
            return Ok(false);
        };
        let Some((data, size)) = self.sram_region()? else {
            return Ok(false);
        };

        // SAFETY: the core owns `size` bytes at `data` while the game is loaded.
        let bytes = unsafe { std::slice::from_raw_parts(data, size) };
        if let Err(source) = write_file(&path, bytes) {
            return Err(self.report(StateError::Sram { path, source }.into()));
        }
        tracing::debug!("Saved {} bytes of SRAM to {}", size, path.display());
        Ok(true)
    }

    /// Restore SRAM from disk. A short file fills a prefix; extra bytes are
    /// ignored. Returns false when there is nothing to restore.
    pub fn load_sram(&mut self) -> Result<bool> {
        let Some(path) = self.sram_path() else {
            return Ok(false);
        };
        let Some((data, size)) = self.sram_region()? else {
            return Ok(false);
        };

        let saved = match std::fs::read(&path) {
            Ok(saved) => saved,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(source) => return Err(self.report(StateError::Sram { path, source }.into())),
        };

        let len = saved.len().min(size);
        // SAFETY: the core owns `size` writable bytes at `data`.
        unsafe { std::ptr::copy_nonoverlapping(saved.as_ptr(), data, len) };
        tracing::debug!("Restored {} bytes of SRAM from {}", len, path.display());
        Ok(true)
    }

    /// Unload the game and core: SRAM is saved, then `retro_unload_game` and
    /// `retro_deinit` run, then the library is released.
    pub fn unload(&mut self) -> Result<()> {
        self.require("unload", &[CoreState::NeedGame, CoreState::Ready, CoreState::Error])?;
        if self.core.is_none() {
            self.transition(CoreState::NeedCore);
            return Ok(());
        }

        if self.game.is_some() {
            if let Err(e) = self.save_sram() {
                tracing::warn!("SRAM not saved: {}", e);
            }
            // SAFETY: game loaded.
            self.with_core(|core| unsafe { (core.unload_game)() })?;
            self.game = None;
        }

        // SAFETY: init ran in install_core.
        self.with_core(|core| unsafe { (core.deinit)() })?;

        if let Some(core) = self.core.take() {
            tracing::debug!("Unloaded core {}", core.origin.display());
        }
        self.shared.audio.lock().withdraw();
        self.shared.reset_core_state();
        self.transition(CoreState::NeedCore);
        Ok(())
    }

    pub fn set_controller_port_device(&mut self, port: u32, device: u32) -> Result<()> {
        // SAFETY: valid after init.
        self.with_core(|core| unsafe { (core.set_controller_port_device)(port, device) })
    }

    pub fn set_cheat(&mut self, index: u32, enabled: bool, code: &str) -> Result<()> {
        self.require("set_cheat", &[CoreState::Ready])?;
        let code = CString::new(code).map_err(|_| HostError::InvalidConfig(
            "cheat code contains a NUL byte".to_string(),
        ))?;
        // SAFETY: `code` outlives the call.
        self.with_core(|core| unsafe { (core.cheat_set)(index, enabled, code.as_ptr()) })
    }

    pub fn reset_cheats(&mut self) -> Result<()> {
        self.require("reset_cheats", &[CoreState::Ready])?;
        // SAFETY: game loaded.
        self.with_core(|core| unsafe { (core.cheat_reset)() })
    }

    pub fn region(&self) -> Result<Region> {
        self.require("region", &[CoreState::Ready])?;
        // SAFETY: game loaded.
        let raw = self.with_core(|core| unsafe { (core.get_region)() })?;
        Ok(if raw == abi::REGION_PAL {
            Region::Pal
        } else {
            Region::Ntsc
        })
    }

    pub fn set_variable(&mut self, key: &str, value: &str) -> Result<()> {
        self.shared.variables.lock().set_value(key, value)
    }

    pub fn variable(&self, key: &str) -> Option<Variable> {
        self.shared.variables.lock().get(key).cloned()
    }

    pub fn variables(&self) -> Vec<Variable> {
        self.shared.variables.lock().iter().cloned().collect()
    }

    pub fn system_info(&self) -> Option<&SystemInfo> {
        self.core.as_ref().map(|core| &core.system_info)
    }

    pub fn api_version(&self) -> Option<u32> {
        self.core.as_ref().map(|core| core.api_version)
    }

    pub fn core_path(&self) -> Option<&Path> {
        self.core.as_ref().map(|core| core.origin.as_path())
    }

    pub fn game_path(&self) -> Option<&Path> {
        self.game.as_ref().map(|game| game.path())
    }

    pub fn game_title(&self) -> Option<&str> {
        self.game.as_ref().map(|game| game.title())
    }

    pub fn game(&self) -> Option<&LoadedGame> {
        self.game.as_ref()
    }

    pub fn av_info(&self) -> Option<AvInfo> {
        *self.shared.av_info.lock()
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.shared.video.lock().pixel_format
    }

    /// Rotation requested by the core, in 90 degree counter-clockwise steps.
    pub fn rotation(&self) -> u32 {
        self.shared.video.lock().rotation
    }

    pub fn hw_render(&self) -> Option<HwRenderRequest> {
        self.shared.video.lock().hw_render
    }

    /// Refresh callbacks seen since the core was loaded.
    pub fn refresh_count(&self) -> u64 {
        self.shared.video.lock().refreshes
    }

    pub fn input_descriptors(&self) -> Vec<InputDescriptor> {
        self.shared.callbacks.lock().input_descriptors.clone()
    }

    pub fn keyboard_callback(&self) -> Option<abi::retro_keyboard_callback> {
        self.shared.callbacks.lock().keyboard
    }

    pub fn frame_time_callback(&self) -> Option<abi::retro_frame_time_callback> {
        self.shared.callbacks.lock().frame_time
    }

    pub fn performance_level(&self) -> u32 {
        self.shared.callbacks.lock().performance_level
    }

    pub fn supports_no_game(&self) -> bool {
        self.shared.callbacks.lock().support_no_game
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shared.callbacks.lock().shutdown_requested
    }
}

impl Drop for CoreHost {
    fn drop(&mut self) {
        if self.core.is_some() {
            if let Err(e) = self.unload() {
                tracing::warn!("Failed to unload core on drop: {}", e);
            }
        }
    }
}

fn write_file(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)
}
