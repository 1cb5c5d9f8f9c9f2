//! In-process fake core for host tests.
//!
//! All fake state is thread-local: every test runs on its own thread and only
//! calls into the core from that thread.

#![allow(dead_code)]

use retrohost_core::abi::*;
use retrohost_core::SymbolTable;
use std::cell::RefCell;
use std::ffi::{c_char, c_uint, c_void, CStr};
use std::ptr;

pub const SRAM_SIZE: usize = 64;
pub const FAKE_RATE: f64 = 32000.0;
pub const FAKE_FPS: f64 = 50.0;
pub const FRAMES_PER_RUN: usize = 640;
pub const WIDTH: u32 = 4;
pub const HEIGHT: u32 = 4;
pub const PITCH: usize = WIDTH as usize * 4;

/// Knobs set before attaching, plus everything the fake observed.
#[derive(Default)]
pub struct FakeCore {
    pub need_fullpath: bool,
    pub reject_game: bool,
    pub serialize_supported: bool,
    /// Sample rate announced through SET_SYSTEM_AV_INFO on the next frame.
    pub av_change_rate: Option<f64>,

    env: Option<retro_environment_t>,
    video: Option<retro_video_refresh_t>,
    audio_batch: Option<retro_audio_sample_batch_t>,
    audio_sample: Option<retro_audio_sample_t>,
    input_poll: Option<retro_input_poll_t>,
    input_state: Option<retro_input_state_t>,

    pub calls: Vec<&'static str>,
    pub counter: u32,
    pub game_path: Option<String>,
    pub game_data_present: bool,
    pub game_size: usize,
    pub unknown_env_result: Option<bool>,
    pub can_dupe: bool,
    pub variable_updates: u32,
    pub controller: Option<(c_uint, c_uint)>,
    pub cheats: Vec<(c_uint, bool, String)>,
    pixels: Vec<u8>,
}

thread_local! {
    static FAKE: RefCell<FakeCore> = RefCell::new(FakeCore {
        serialize_supported: true,
        ..Default::default()
    });
    static SRAM: RefCell<[u8; SRAM_SIZE]> = const { RefCell::new([0u8; SRAM_SIZE]) };
}

pub fn configure(f: impl FnOnce(&mut FakeCore)) {
    FAKE.with(|fake| f(&mut fake.borrow_mut()));
}

pub fn inspect<R>(f: impl FnOnce(&FakeCore) -> R) -> R {
    FAKE.with(|fake| f(&fake.borrow()))
}

pub fn sram() -> [u8; SRAM_SIZE] {
    SRAM.with(|s| *s.borrow())
}

pub fn set_sram(data: [u8; SRAM_SIZE]) {
    SRAM.with(|s| *s.borrow_mut() = data);
}

fn with_fake<R>(f: impl FnOnce(&mut FakeCore) -> R) -> R {
    FAKE.with(|fake| f(&mut fake.borrow_mut()))
}

// Callbacks are copied out before calling so no RefCell borrow is held
// while the host runs.
unsafe fn env(cmd: c_uint, data: *mut c_void) -> bool {
    match with_fake(|f| f.env) {
        Some(cb) => cb(cmd, data),
        None => false,
    }
}

unsafe extern "C" fn api_version() -> c_uint {
    API_VERSION
}

unsafe extern "C" fn init() {
    with_fake(|f| f.calls.push("init"));

    let key = b"fake_speed\0";
    let schema = b"Speed; normal|fast\0";
    let mut vars = [
        retro_variable {
            key: key.as_ptr().cast(),
            value: schema.as_ptr().cast(),
        },
        retro_variable {
            key: ptr::null(),
            value: ptr::null(),
        },
    ];
    env(ENVIRONMENT_SET_VARIABLES, vars.as_mut_ptr().cast());

    let mut log = retro_log_callback { log: None };
    if env(ENVIRONMENT_GET_LOG_INTERFACE, (&mut log as *mut retro_log_callback).cast()) {
        if let Some(log) = log.log {
            log(LOG_INFO, b"fake core initialised\n\0".as_ptr().cast());
        }
    }
}

unsafe extern "C" fn deinit() {
    with_fake(|f| f.calls.push("deinit"));
}

unsafe extern "C" fn reset() {
    with_fake(|f| {
        f.calls.push("reset");
        f.counter = 0;
    });
}

unsafe extern "C" fn run() {
    if let Some(rate) = with_fake(|f| f.av_change_rate.take()) {
        let mut info = retro_system_av_info {
            geometry: geometry(),
            timing: retro_system_timing {
                fps: FAKE_FPS,
                sample_rate: rate,
            },
        };
        env(ENVIRONMENT_SET_SYSTEM_AV_INFO, (&mut info as *mut retro_system_av_info).cast());
    }

    let mut updated = false;
    if env(ENVIRONMENT_GET_VARIABLE_UPDATE, (&mut updated as *mut bool).cast()) && updated {
        with_fake(|f| f.variable_updates += 1);
    }

    let key = b"fake_speed\0";
    let mut var = retro_variable {
        key: key.as_ptr().cast(),
        value: ptr::null(),
    };
    let fast = env(ENVIRONMENT_GET_VARIABLE, (&mut var as *mut retro_variable).cast())
        && CStr::from_ptr(var.value).to_bytes() == b"fast";

    let mut unknown = 0u32;
    let unknown_result = env(9999, (&mut unknown as *mut u32).cast());
    let mut can_dupe = false;
    env(ENVIRONMENT_GET_CAN_DUPE, (&mut can_dupe as *mut bool).cast());

    let (poll, state) = with_fake(|f| (f.input_poll, f.input_state));
    if let Some(poll) = poll {
        poll();
    }
    let pressed = state.map(|s| s(0, DEVICE_JOYPAD, 0, 0)).unwrap_or(0) != 0;

    let counter = with_fake(|f| {
        f.unknown_env_result = Some(unknown_result);
        f.can_dupe = can_dupe;
        f.counter += if fast { 2 } else { 1 };
        if pressed {
            f.counter += 100;
        }
        f.counter
    });

    // Audio derived from the counter only.
    let mut samples = vec![0i16; FRAMES_PER_RUN * 2];
    for (i, pair) in samples.chunks_exact_mut(2).enumerate() {
        let value = (counter.wrapping_mul(31).wrapping_add(i as u32) % 2000) as i16 - 1000;
        pair[0] = value;
        pair[1] = -value;
    }
    let (batch, single) = with_fake(|f| (f.audio_batch, f.audio_sample));
    if let Some(batch) = batch {
        batch(samples.as_ptr(), FRAMES_PER_RUN - 1);
    }
    if let Some(single) = single {
        single(samples[samples.len() - 2], samples[samples.len() - 1]);
    }

    // Every third frame is a dupe.
    let video = with_fake(|f| f.video);
    if let Some(video) = video {
        if counter % 3 == 0 {
            video(ptr::null(), WIDTH, HEIGHT, PITCH);
        } else {
            let pixels_ptr = with_fake(|f| {
                f.pixels = vec![(counter % 251) as u8; PITCH * HEIGHT as usize];
                f.pixels.as_ptr()
            });
            video(pixels_ptr.cast(), WIDTH, HEIGHT, PITCH);
        }
    }
}

unsafe extern "C" fn load_game(info: *const retro_game_info) -> bool {
    let info = &*info;
    let path = if info.path.is_null() {
        None
    } else {
        Some(CStr::from_ptr(info.path).to_string_lossy().into_owned())
    };

    let reject = with_fake(|f| {
        f.calls.push("load_game");
        f.game_path = path;
        f.game_data_present = !info.data.is_null();
        f.game_size = info.size;
        f.reject_game
    });
    if reject {
        return false;
    }

    let mut format = PIXEL_FORMAT_XRGB8888;
    env(ENVIRONMENT_SET_PIXEL_FORMAT, (&mut format as *mut i32).cast());
    true
}

unsafe extern "C" fn load_game_special(_: c_uint, _: *const retro_game_info, _: usize) -> bool {
    false
}

unsafe extern "C" fn unload_game() {
    with_fake(|f| f.calls.push("unload_game"));
    // Anything saved after this point would be zeros.
    SRAM.with(|s| *s.borrow_mut() = [0u8; SRAM_SIZE]);
}

unsafe extern "C" fn serialize_size() -> usize {
    if with_fake(|f| f.serialize_supported) {
        4
    } else {
        0
    }
}

unsafe extern "C" fn serialize(data: *mut c_void, size: usize) -> bool {
    if size < 4 {
        return false;
    }
    let counter = with_fake(|f| f.counter);
    ptr::copy_nonoverlapping(counter.to_le_bytes().as_ptr(), data.cast::<u8>(), 4);
    true
}

unsafe extern "C" fn unserialize(data: *const c_void, size: usize) -> bool {
    if size != 4 {
        return false;
    }
    let mut bytes = [0u8; 4];
    ptr::copy_nonoverlapping(data.cast::<u8>(), bytes.as_mut_ptr(), 4);
    with_fake(|f| f.counter = u32::from_le_bytes(bytes));
    true
}

unsafe extern "C" fn cheat_reset() {
    with_fake(|f| f.cheats.clear());
}

unsafe extern "C" fn cheat_set(index: c_uint, enabled: bool, code: *const c_char) {
    let code = CStr::from_ptr(code).to_string_lossy().into_owned();
    with_fake(|f| f.cheats.push((index, enabled, code)));
}

unsafe extern "C" fn get_region() -> c_uint {
    REGION_PAL
}

unsafe extern "C" fn get_memory_data(id: c_uint) -> *mut c_void {
    if id == MEMORY_SAVE_RAM {
        SRAM.with(|s| s.as_ptr().cast())
    } else {
        ptr::null_mut()
    }
}

unsafe extern "C" fn get_memory_size(id: c_uint) -> usize {
    if id == MEMORY_SAVE_RAM {
        SRAM_SIZE
    } else {
        0
    }
}

unsafe extern "C" fn get_system_info(info: *mut retro_system_info) {
    let info = &mut *info;
    info.library_name = b"FakeCore\0".as_ptr().cast();
    info.library_version = b"1.0\0".as_ptr().cast();
    info.valid_extensions = b"fake|bin\0".as_ptr().cast();
    info.need_fullpath = with_fake(|f| f.need_fullpath);
    info.block_extract = false;
}

fn geometry() -> retro_game_geometry {
    retro_game_geometry {
        base_width: WIDTH,
        base_height: HEIGHT,
        max_width: WIDTH,
        max_height: HEIGHT,
        aspect_ratio: 0.0,
    }
}

unsafe extern "C" fn get_system_av_info(info: *mut retro_system_av_info) {
    *info = retro_system_av_info {
        geometry: geometry(),
        timing: retro_system_timing {
            fps: FAKE_FPS,
            sample_rate: FAKE_RATE,
        },
    };
}

unsafe extern "C" fn set_controller_port_device(port: c_uint, device: c_uint) {
    with_fake(|f| f.controller = Some((port, device)));
}

unsafe extern "C" fn set_environment(cb: retro_environment_t) {
    with_fake(|f| f.env = Some(cb));
}

unsafe extern "C" fn set_video_refresh(cb: retro_video_refresh_t) {
    with_fake(|f| f.video = Some(cb));
}

unsafe extern "C" fn set_audio_sample(cb: retro_audio_sample_t) {
    with_fake(|f| f.audio_sample = Some(cb));
}

unsafe extern "C" fn set_audio_sample_batch(cb: retro_audio_sample_batch_t) {
    with_fake(|f| f.audio_batch = Some(cb));
}

unsafe extern "C" fn set_input_poll(cb: retro_input_poll_t) {
    with_fake(|f| f.input_poll = Some(cb));
}

unsafe extern "C" fn set_input_state(cb: retro_input_state_t) {
    with_fake(|f| f.input_state = Some(cb));
}

pub fn fake_symbols() -> SymbolTable {
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

/// A game file in a temp dir.
pub fn write_game(dir: &std::path::Path, name: &str, size: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![0x5Au8; size]).unwrap();
    path
}
