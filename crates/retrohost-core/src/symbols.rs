//! Core entry point resolution.

use crate::abi::*;
use libloading::Library;

/// Every entry point a core must export.
pub const REQUIRED_SYMBOLS: [&str; 25] = [
    "retro_api_version",
    "retro_init",
    "retro_deinit",
    "retro_reset",
    "retro_run",
    "retro_load_game",
    "retro_load_game_special",
    "retro_unload_game",
    "retro_serialize_size",
    "retro_serialize",
    "retro_unserialize",
    "retro_cheat_reset",
    "retro_cheat_set",
    "retro_get_region",
    "retro_get_memory_data",
    "retro_get_memory_size",
    "retro_get_system_info",
    "retro_get_system_av_info",
    "retro_set_controller_port_device",
    "retro_set_environment",
    "retro_set_video_refresh",
    "retro_set_audio_sample",
    "retro_set_audio_sample_batch",
    "retro_set_input_poll",
    "retro_set_input_state",
];

/// Resolved core entry points.
///
/// Built either from a loaded library ([`SymbolTable::resolve`]) or by hand for
/// statically linked cores.
#[derive(Debug, Clone, Copy)]
pub struct SymbolTable {
    pub api_version: retro_api_version_fn,
    pub init: retro_void_fn,
    pub deinit: retro_void_fn,
    pub reset: retro_void_fn,
    pub run: retro_void_fn,
    pub load_game: retro_load_game_fn,
    pub load_game_special: retro_load_game_special_fn,
    pub unload_game: retro_void_fn,
    pub serialize_size: retro_serialize_size_fn,
    pub serialize: retro_serialize_fn,
    pub unserialize: retro_unserialize_fn,
    pub cheat_reset: retro_void_fn,
    pub cheat_set: retro_cheat_set_fn,
    pub get_region: retro_get_region_fn,
    pub get_memory_data: retro_get_memory_data_fn,
    pub get_memory_size: retro_get_memory_size_fn,
    pub get_system_info: retro_get_system_info_fn,
    pub get_system_av_info: retro_get_system_av_info_fn,
    pub set_controller_port_device: retro_set_controller_port_device_fn,
    pub set_environment: retro_set_environment_fn,
    pub set_video_refresh: retro_set_video_refresh_fn,
    pub set_audio_sample: retro_set_audio_sample_fn,
    pub set_audio_sample_batch: retro_set_audio_sample_batch_fn,
    pub set_input_poll: retro_set_input_poll_fn,
    pub set_input_state: retro_set_input_state_fn,
}

/// Look up one symbol and copy the function pointer out.
///
/// # Safety
/// `T` must match the exported symbol's real signature.
unsafe fn symbol<T: Copy>(library: &Library, name: &str) -> Option<T> {
    library.get::<T>(name.as_bytes()).ok().map(|sym| *sym)
}

macro_rules! resolve_table {
    ($library:expr, $($field:ident => $name:literal),* $(,)?) => {{
        let mut missing = Vec::new();
        $(
            // SAFETY: signatures follow libretro.h.
            let $field = unsafe { symbol($library, $name) };
            if $field.is_none() {
                missing.push($name.to_string());
            }
        )*
        match ($($field,)*) {
            ($(Some($field),)*) => Ok(SymbolTable { $($field),* }),
            _ => Err(missing),
        }
    }};
}

impl SymbolTable {
    /// Resolve every required entry point.
    ///
    /// Fails with the complete list of missing names; nothing is partially
    /// resolved.
    pub fn resolve(library: &Library) -> std::result::Result<Self, Vec<String>> {
        resolve_table!(library,
            api_version => "retro_api_version",
            init => "retro_init",
            deinit => "retro_deinit",
            reset => "retro_reset",
            run => "retro_run",
            load_game => "retro_load_game",
            load_game_special => "retro_load_game_special",
            unload_game => "retro_unload_game",
            serialize_size => "retro_serialize_size",
            serialize => "retro_serialize",
            unserialize => "retro_unserialize",
            cheat_reset => "retro_cheat_reset",
            cheat_set => "retro_cheat_set",
            get_region => "retro_get_region",
            get_memory_data => "retro_get_memory_data",
            get_memory_size => "retro_get_memory_size",
            get_system_info => "retro_get_system_info",
            get_system_av_info => "retro_get_system_av_info",
            set_controller_port_device => "retro_set_controller_port_device",
            set_environment => "retro_set_environment",
            set_video_refresh => "retro_set_video_refresh",
            set_audio_sample => "retro_set_audio_sample",
            set_audio_sample_batch => "retro_set_audio_sample_batch",
            set_input_poll => "retro_set_input_poll",
            set_input_state => "retro_set_input_state",
        )
    }
}

/// Platform shared-library extension check.
pub fn is_library_path(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(std::env::consts::DLL_EXTENSION))
        .unwrap_or(false)
}
