//! `extern "C"` trampolines installed into the core.
//!
//! Each one resolves the active host through the thread-local slot. With no
//! active host the call is ignored: audio is dropped, input reads 0 and the
//! environment reports unhandled.

use crate::abi::{self, HW_FRAME_BUFFER_VALID};
use crate::context::{with_active, LastFrame};
use crate::environment;
use crate::frame::{FrameContent, VideoFrame};
use std::ffi::{c_char, c_int, c_uint, c_void, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Target for messages logged by the core itself.
pub const CORE_LOG_TARGET: &str = "retrohost::core_log";

// Unwinding out of an extern "C" fn aborts, so every trampoline stops panics here.
fn guarded<R>(default: R, f: impl FnOnce() -> R) -> R {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or(default)
}

pub(crate) unsafe extern "C" fn environment(cmd: c_uint, data: *mut c_void) -> bool {
    guarded(false, || {
        with_active(|shared| {
            // SAFETY: the core guarantees `data` matches `cmd`'s payload type.
            match unsafe { environment::EnvCommand::decode(cmd, data) } {
                Some(command) => environment::handle(shared, command),
                None => false,
            }
        })
        .unwrap_or(false)
    })
}

pub(crate) unsafe extern "C" fn video_refresh(
    data: *const c_void,
    width: c_uint,
    height: c_uint,
    pitch: usize,
) {
    guarded((), || {
        with_active(|shared| {
            let format = {
                let mut video = shared.video.lock();
                video.refreshes += 1;
                video.last_frame = Some(LastFrame {
                    width,
                    height,
                    pitch,
                    duplicate: data.is_null(),
                    hardware: data == HW_FRAME_BUFFER_VALID,
                });
                video.pixel_format
            };

            let content = if data.is_null() {
                FrameContent::Duplicate
            } else if data == HW_FRAME_BUFFER_VALID {
                FrameContent::Hardware
            } else {
                // SAFETY: a non-null software frame spans `pitch * height` bytes
                // and stays valid for the duration of this callback.
                FrameContent::Pixels(unsafe {
                    std::slice::from_raw_parts(data.cast::<u8>(), pitch * height as usize)
                })
            };

            let frame = VideoFrame {
                width,
                height,
                pitch,
                format,
                content,
            };
            shared.frame_sink.lock().present(&frame);
        });
    })
}

pub(crate) unsafe extern "C" fn audio_sample(left: i16, right: i16) {
    guarded((), || {
        with_active(|shared| {
            if let Some(producer) = shared.audio.lock().producer.as_mut() {
                producer.push_frame(left, right);
            }
        });
    })
}

pub(crate) unsafe extern "C" fn audio_sample_batch(data: *const i16, frames: usize) -> usize {
    if data.is_null() || frames == 0 {
        return 0;
    }
    guarded(frames, || {
        with_active(|shared| {
            if let Some(producer) = shared.audio.lock().producer.as_mut() {
                // SAFETY: the core passes `frames` interleaved stereo frames.
                let samples = unsafe { std::slice::from_raw_parts(data, frames * 2) };
                producer.push_frames(samples);
            }
        });
        frames
    })
}

pub(crate) unsafe extern "C" fn input_poll() {
    guarded((), || {
        with_active(|shared| shared.input.lock().poll());
    })
}

pub(crate) unsafe extern "C" fn input_state(
    port: c_uint,
    device: c_uint,
    index: c_uint,
    id: c_uint,
) -> i16 {
    guarded(0, || {
        with_active(|shared| shared.input.lock().state(port, device, index, id)).unwrap_or(0)
    })
}

/// Handed out through GET_LOG_INTERFACE.
///
/// Logs the format string as-is (minus trailing line breaks); printf
/// arguments are not substituted.
pub(crate) unsafe extern "C" fn core_log(level: c_int, fmt: *const c_char) {
    if fmt.is_null() {
        return;
    }
    guarded((), || {
        // SAFETY: cores pass a NUL-terminated format string.
        let message = unsafe { CStr::from_ptr(fmt) }.to_string_lossy();
        let message = message.trim_end_matches(|c: char| c == '\n' || c == '\r');
        match level {
            abi::LOG_DEBUG => tracing::debug!(target: CORE_LOG_TARGET, "{}", message),
            abi::LOG_INFO => tracing::info!(target: CORE_LOG_TARGET, "{}", message),
            abi::LOG_WARN => tracing::warn!(target: CORE_LOG_TARGET, "{}", message),
            _ => tracing::error!(target: CORE_LOG_TARGET, "{}", message),
        }
    })
}
