//! C ABI shared with libretro cores.
//!
//! Layouts mirror `libretro.h`. Enum-typed fields are kept as raw integers so
//! that out-of-range values coming from a core never produce an invalid Rust
//! enum.

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_int, c_uint, c_void};

pub const API_VERSION: c_uint = 1;

pub const ENVIRONMENT_EXPERIMENTAL: c_uint = 0x10000;

pub const ENVIRONMENT_SET_ROTATION: c_uint = 1;
pub const ENVIRONMENT_GET_OVERSCAN: c_uint = 2;
pub const ENVIRONMENT_GET_CAN_DUPE: c_uint = 3;
pub const ENVIRONMENT_SET_MESSAGE: c_uint = 6;
pub const ENVIRONMENT_SHUTDOWN: c_uint = 7;
pub const ENVIRONMENT_SET_PERFORMANCE_LEVEL: c_uint = 8;
pub const ENVIRONMENT_GET_SYSTEM_DIRECTORY: c_uint = 9;
pub const ENVIRONMENT_SET_PIXEL_FORMAT: c_uint = 10;
pub const ENVIRONMENT_SET_INPUT_DESCRIPTORS: c_uint = 11;
pub const ENVIRONMENT_SET_KEYBOARD_CALLBACK: c_uint = 12;
pub const ENVIRONMENT_SET_DISK_CONTROL_INTERFACE: c_uint = 13;
pub const ENVIRONMENT_SET_HW_RENDER: c_uint = 14;
pub const ENVIRONMENT_GET_VARIABLE: c_uint = 15;
pub const ENVIRONMENT_SET_VARIABLES: c_uint = 16;
pub const ENVIRONMENT_GET_VARIABLE_UPDATE: c_uint = 17;
pub const ENVIRONMENT_SET_SUPPORT_NO_GAME: c_uint = 18;
pub const ENVIRONMENT_GET_LIBRETRO_PATH: c_uint = 19;
pub const ENVIRONMENT_SET_FRAME_TIME_CALLBACK: c_uint = 21;
pub const ENVIRONMENT_SET_AUDIO_CALLBACK: c_uint = 22;
pub const ENVIRONMENT_GET_RUMBLE_INTERFACE: c_uint = 23;
pub const ENVIRONMENT_GET_INPUT_DEVICE_CAPABILITIES: c_uint = 24;
pub const ENVIRONMENT_GET_SENSOR_INTERFACE: c_uint = 25;
pub const ENVIRONMENT_GET_CAMERA_INTERFACE: c_uint = 26;
pub const ENVIRONMENT_GET_LOG_INTERFACE: c_uint = 27;
pub const ENVIRONMENT_GET_PERF_INTERFACE: c_uint = 28;
pub const ENVIRONMENT_GET_LOCATION_INTERFACE: c_uint = 29;
pub const ENVIRONMENT_GET_CORE_ASSETS_DIRECTORY: c_uint = 30;
pub const ENVIRONMENT_GET_SAVE_DIRECTORY: c_uint = 31;
pub const ENVIRONMENT_SET_SYSTEM_AV_INFO: c_uint = 32;
pub const ENVIRONMENT_SET_PROC_ADDRESS_CALLBACK: c_uint = 33;
pub const ENVIRONMENT_SET_SUBSYSTEM_INFO: c_uint = 34;
pub const ENVIRONMENT_SET_CONTROLLER_INFO: c_uint = 35;
pub const ENVIRONMENT_SET_MEMORY_MAPS: c_uint = 36;
pub const ENVIRONMENT_SET_GEOMETRY: c_uint = 37;

pub const PIXEL_FORMAT_0RGB1555: c_int = 0;
pub const PIXEL_FORMAT_XRGB8888: c_int = 1;
pub const PIXEL_FORMAT_RGB565: c_int = 2;

pub const HW_CONTEXT_NONE: c_int = 0;
pub const HW_CONTEXT_OPENGL: c_int = 1;
pub const HW_CONTEXT_OPENGLES2: c_int = 2;
pub const HW_CONTEXT_OPENGL_CORE: c_int = 3;
pub const HW_CONTEXT_OPENGLES3: c_int = 4;
pub const HW_CONTEXT_OPENGLES_VERSION: c_int = 5;
pub const HW_CONTEXT_VULKAN: c_int = 6;

/// Passed as the frame pointer when a hardware-rendered frame is ready.
pub const HW_FRAME_BUFFER_VALID: *const c_void = usize::MAX as *const c_void;

pub const LOG_DEBUG: c_int = 0;
pub const LOG_INFO: c_int = 1;
pub const LOG_WARN: c_int = 2;
pub const LOG_ERROR: c_int = 3;

pub const DEVICE_TYPE_SHIFT: c_uint = 8;
pub const DEVICE_MASK: c_uint = (1 << DEVICE_TYPE_SHIFT) - 1;
pub const DEVICE_NONE: c_uint = 0;
pub const DEVICE_JOYPAD: c_uint = 1;
pub const DEVICE_MOUSE: c_uint = 2;
pub const DEVICE_KEYBOARD: c_uint = 3;
pub const DEVICE_LIGHTGUN: c_uint = 4;
pub const DEVICE_ANALOG: c_uint = 5;
pub const DEVICE_POINTER: c_uint = 6;

pub const MEMORY_SAVE_RAM: c_uint = 0;
pub const MEMORY_RTC: c_uint = 1;
pub const MEMORY_SYSTEM_RAM: c_uint = 2;
pub const MEMORY_VIDEO_RAM: c_uint = 3;

pub const REGION_NTSC: c_uint = 0;
pub const REGION_PAL: c_uint = 1;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct retro_system_info {
    pub library_name: *const c_char,
    pub library_version: *const c_char,
    pub valid_extensions: *const c_char,
    pub need_fullpath: bool,
    pub block_extract: bool,
}

impl Default for retro_system_info {
    fn default() -> Self {
        Self {
            library_name: std::ptr::null(),
            library_version: std::ptr::null(),
            valid_extensions: std::ptr::null(),
            need_fullpath: false,
            block_extract: false,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct retro_game_geometry {
    pub base_width: c_uint,
    pub base_height: c_uint,
    pub max_width: c_uint,
    pub max_height: c_uint,
    pub aspect_ratio: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct retro_system_timing {
    pub fps: f64,
    pub sample_rate: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct retro_system_av_info {
    pub geometry: retro_game_geometry,
    pub timing: retro_system_timing,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct retro_game_info {
    pub path: *const c_char,
    pub data: *const c_void,
    pub size: usize,
    pub meta: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct retro_variable {
    pub key: *const c_char,
    pub value: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct retro_message {
    pub msg: *const c_char,
    pub frames: c_uint,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct retro_input_descriptor {
    pub port: c_uint,
    pub device: c_uint,
    pub index: c_uint,
    pub id: c_uint,
    pub description: *const c_char,
}

pub type retro_keyboard_event_t =
    unsafe extern "C" fn(down: bool, keycode: c_uint, character: u32, key_modifiers: u16);

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct retro_keyboard_callback {
    pub callback: Option<retro_keyboard_event_t>,
}

pub type retro_usec_t = i64;
pub type retro_frame_time_callback_t = unsafe extern "C" fn(usec: retro_usec_t);

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct retro_frame_time_callback {
    pub callback: Option<retro_frame_time_callback_t>,
    pub reference: retro_usec_t,
}

/// Log entry point handed to cores.
///
/// The C declaration is variadic; the host side reads only the format string,
/// which is ABI-compatible with every variadic call on supported targets.
/// The variadic arguments are never read, so conversion specifiers such as
/// `%s` or `%d` reach the log unexpanded.
pub type retro_log_printf_t = unsafe extern "C" fn(level: c_int, fmt: *const c_char);

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct retro_log_callback {
    pub log: Option<retro_log_printf_t>,
}

pub type retro_hw_context_reset_t = unsafe extern "C" fn();
pub type retro_hw_get_current_framebuffer_t = unsafe extern "C" fn() -> usize;
pub type retro_proc_address_t = unsafe extern "C" fn();
pub type retro_hw_get_proc_address_t =
    unsafe extern "C" fn(sym: *const c_char) -> Option<retro_proc_address_t>;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct retro_hw_render_callback {
    pub context_type: c_int,
    pub context_reset: Option<retro_hw_context_reset_t>,
    pub get_current_framebuffer: Option<retro_hw_get_current_framebuffer_t>,
    pub get_proc_address: Option<retro_hw_get_proc_address_t>,
    pub depth: bool,
    pub stencil: bool,
    pub bottom_left_origin: bool,
    pub version_major: c_uint,
    pub version_minor: c_uint,
    pub cache_context: bool,
    pub context_destroy: Option<retro_hw_context_reset_t>,
    pub debug_context: bool,
}

// Frontend callbacks installed into the core.
pub type retro_environment_t = unsafe extern "C" fn(cmd: c_uint, data: *mut c_void) -> bool;
pub type retro_video_refresh_t =
    unsafe extern "C" fn(data: *const c_void, width: c_uint, height: c_uint, pitch: usize);
pub type retro_audio_sample_t = unsafe extern "C" fn(left: i16, right: i16);
pub type retro_audio_sample_batch_t = unsafe extern "C" fn(data: *const i16, frames: usize) -> usize;
pub type retro_input_poll_t = unsafe extern "C" fn();
pub type retro_input_state_t =
    unsafe extern "C" fn(port: c_uint, device: c_uint, index: c_uint, id: c_uint) -> i16;

// Core entry points.
pub type retro_api_version_fn = unsafe extern "C" fn() -> c_uint;
pub type retro_void_fn = unsafe extern "C" fn();
pub type retro_get_system_info_fn = unsafe extern "C" fn(info: *mut retro_system_info);
pub type retro_get_system_av_info_fn = unsafe extern "C" fn(info: *mut retro_system_av_info);
pub type retro_set_environment_fn = unsafe extern "C" fn(cb: retro_environment_t);
pub type retro_set_video_refresh_fn = unsafe extern "C" fn(cb: retro_video_refresh_t);
pub type retro_set_audio_sample_fn = unsafe extern "C" fn(cb: retro_audio_sample_t);
pub type retro_set_audio_sample_batch_fn = unsafe extern "C" fn(cb: retro_audio_sample_batch_t);
pub type retro_set_input_poll_fn = unsafe extern "C" fn(cb: retro_input_poll_t);
pub type retro_set_input_state_fn = unsafe extern "C" fn(cb: retro_input_state_t);
pub type retro_set_controller_port_device_fn = unsafe extern "C" fn(port: c_uint, device: c_uint);
pub type retro_serialize_size_fn = unsafe extern "C" fn() -> usize;
pub type retro_serialize_fn = unsafe extern "C" fn(data: *mut c_void, size: usize) -> bool;
pub type retro_unserialize_fn = unsafe extern "C" fn(data: *const c_void, size: usize) -> bool;
pub type retro_cheat_set_fn = unsafe extern "C" fn(index: c_uint, enabled: bool, code: *const c_char);
pub type retro_load_game_fn = unsafe extern "C" fn(game: *const retro_game_info) -> bool;
pub type retro_load_game_special_fn =
    unsafe extern "C" fn(game_type: c_uint, info: *const retro_game_info, num_info: usize) -> bool;
pub type retro_get_region_fn = unsafe extern "C" fn() -> c_uint;
pub type retro_get_memory_data_fn = unsafe extern "C" fn(id: c_uint) -> *mut c_void;
pub type retro_get_memory_size_fn = unsafe extern "C" fn(id: c_uint) -> usize;
