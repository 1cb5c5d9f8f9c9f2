//! Minimal in-process core for session tests: a 4x4 RGB565 screen and a
//! square-wave tone at 32kHz.
//!
//! Callbacks live in thread-locals, so each test drives its core from the
//! thread that attached it.

#![allow(dead_code)]

use retrohost::core::abi::*;
use retrohost::core::SymbolTable;
use std::cell::{Cell, RefCell};
use std::ffi::{c_char, c_uint, c_void};
use std::path::{Path, PathBuf};
use std::ptr;

pub const TONE_RATE: f64 = 32000.0;
pub const TONE_FPS: f64 = 50.0;
pub const FRAMES_PER_RUN: usize = (TONE_RATE / TONE_FPS) as usize;
const PERIOD: usize = 64;

#[derive(Default)]
struct Callbacks {
    env: Option<retro_environment_t>,
    video: Option<retro_video_refresh_t>,
    audio_batch: Option<retro_audio_sample_batch_t>,
    input_poll: Option<retro_input_poll_t>,
}

thread_local! {
    static CALLBACKS: RefCell<Callbacks> = RefCell::new(Callbacks::default());
    static PHASE: Cell<usize> = const { Cell::new(0) };
    static RUNS: Cell<u32> = const { Cell::new(0) };
}

/// Frames run on this thread's tone core.
pub fn runs() -> u32 {
    RUNS.with(Cell::get)
}

unsafe extern "C" fn api_version() -> c_uint {
    API_VERSION
}

unsafe extern "C" fn init() {}
unsafe extern "C" fn deinit() {}

unsafe extern "C" fn reset() {
    PHASE.with(|p| p.set(0));
}

unsafe extern "C" fn run() {
    let (poll, video, batch) = CALLBACKS.with(|c| {
        let c = c.borrow();
        (c.input_poll, c.video, c.audio_batch)
    });
    if let Some(poll) = poll {
        poll();
    }

    let start = PHASE.with(|p| p.get());
    let mut samples = Vec::with_capacity(FRAMES_PER_RUN * 2);
    for i in 0..FRAMES_PER_RUN {
        let value = if (start + i) % PERIOD < PERIOD / 2 { 8000 } else { -8000 };
        samples.push(value);
        samples.push(value);
    }
    PHASE.with(|p| p.set((start + FRAMES_PER_RUN) % PERIOD));
    if let Some(batch) = batch {
        batch(samples.as_ptr(), FRAMES_PER_RUN);
    }

    let pixels = [0xF800u16; 16];
    if let Some(video) = video {
        video(pixels.as_ptr().cast(), 4, 4, 8);
    }
    RUNS.with(|r| r.set(r.get() + 1));
}

unsafe extern "C" fn load_game(_info: *const retro_game_info) -> bool {
    let env = CALLBACKS.with(|c| c.borrow().env);
    if let Some(env) = env {
        let mut format = PIXEL_FORMAT_RGB565;
        env(ENVIRONMENT_SET_PIXEL_FORMAT, (&mut format as *mut i32).cast());
    }
    true
}

unsafe extern "C" fn load_game_special(_: c_uint, _: *const retro_game_info, _: usize) -> bool {
    false
}

unsafe extern "C" fn unload_game() {}

unsafe extern "C" fn serialize_size() -> usize {
    std::mem::size_of::<usize>()
}

unsafe extern "C" fn serialize(data: *mut c_void, size: usize) -> bool {
    let phase = PHASE.with(|p| p.get()).to_le_bytes();
    if size < phase.len() {
        return false;
    }
    ptr::copy_nonoverlapping(phase.as_ptr(), data.cast::<u8>(), phase.len());
    true
}

unsafe extern "C" fn unserialize(data: *const c_void, size: usize) -> bool {
    let mut phase = [0u8; std::mem::size_of::<usize>()];
    if size != phase.len() {
        return false;
    }
    ptr::copy_nonoverlapping(data.cast::<u8>(), phase.as_mut_ptr(), phase.len());
    PHASE.with(|p| p.set(usize::from_le_bytes(phase)));
    true
}

unsafe extern "C" fn cheat_reset() {}
unsafe extern "C" fn cheat_set(_: c_uint, _: bool, _: *const c_char) {}

unsafe extern "C" fn get_region() -> c_uint {
    REGION_NTSC
}

unsafe extern "C" fn get_memory_data(_: c_uint) -> *mut c_void {
    ptr::null_mut()
}

unsafe extern "C" fn get_memory_size(_: c_uint) -> usize {
    0
}

unsafe extern "C" fn get_system_info(info: *mut retro_system_info) {
    let info = &mut *info;
    info.library_name = b"ToneCore\0".as_ptr().cast();
    info.library_version = b"0.1\0".as_ptr().cast();
    info.valid_extensions = b"tone\0".as_ptr().cast();
    info.need_fullpath = true;
    info.block_extract = false;
}

unsafe extern "C" fn get_system_av_info(info: *mut retro_system_av_info) {
    *info = retro_system_av_info {
        geometry: retro_game_geometry {
            base_width: 4,
            base_height: 4,
            max_width: 4,
            max_height: 4,
            aspect_ratio: 0.0,
        },
        timing: retro_system_timing {
            fps: TONE_FPS,
            sample_rate: TONE_RATE,
        },
    };
}

unsafe extern "C" fn set_controller_port_device(_: c_uint, _: c_uint) {}

unsafe extern "C" fn set_environment(cb: retro_environment_t) {
    CALLBACKS.with(|c| c.borrow_mut().env = Some(cb));
}

unsafe extern "C" fn set_video_refresh(cb: retro_video_refresh_t) {
    CALLBACKS.with(|c| c.borrow_mut().video = Some(cb));
}

unsafe extern "C" fn set_audio_sample(_: retro_audio_sample_t) {}

unsafe extern "C" fn set_audio_sample_batch(cb: retro_audio_sample_batch_t) {
    CALLBACKS.with(|c| c.borrow_mut().audio_batch = Some(cb));
}

unsafe extern "C" fn set_input_poll(cb: retro_input_poll_t) {
    CALLBACKS.with(|c| c.borrow_mut().input_poll = Some(cb));
}

unsafe extern "C" fn set_input_state(_: retro_input_state_t) {}

pub fn tone_symbols() -> SymbolTable {
    SymbolTable {
        api_version,
        init,
        deinit,
        reset,
        run,
        load_game,
        load_game_special,
        unload_game,
        serialize_size,
        serialize,
        unserialize,
        cheat_reset,
        cheat_set,
        get_region,
        get_memory_data,
        get_memory_size,
        get_system_info,
        get_system_av_info,
        set_controller_port_device,
        set_environment,
        set_video_refresh,
        set_audio_sample,
        set_audio_sample_batch,
        set_input_poll,
        set_input_state,
    }
}

pub fn write_game(dir: &Path) -> PathBuf {
    let path = dir.join("Beep.tone");
    std::fs::write(&path, b"tone").unwrap();
    path
}
