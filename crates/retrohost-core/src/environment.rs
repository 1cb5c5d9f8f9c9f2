//! Environment command decoding and dispatch.

use crate::abi::*;
use crate::av::{string_from_ptr, AvInfo, HwRenderRequest, InputDescriptor, PixelFormat};
use crate::callbacks;
use crate::context::HostShared;
use crate::state::HostEvent;
use std::ffi::{c_char, c_int, c_uint, c_void};

/// Environment commands the host recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvKind {
    SetRotation,
    GetOverscan,
    GetCanDupe,
    SetMessage,
    Shutdown,
    SetPerformanceLevel,
    GetSystemDirectory,
    SetPixelFormat,
    SetInputDescriptors,
    SetKeyboardCallback,
    SetDiskControlInterface,
    SetHwRender,
    GetVariable,
    SetVariables,
    GetVariableUpdate,
    SetSupportNoGame,
    GetLibretroPath,
    SetFrameTimeCallback,
    SetAudioCallback,
    GetRumbleInterface,
    GetInputDeviceCapabilities,
    GetSensorInterface,
    GetCameraInterface,
    GetLogInterface,
    GetPerfInterface,
    GetLocationInterface,
    GetCoreAssetsDirectory,
    GetSaveDirectory,
    SetSystemAvInfo,
    SetProcAddressCallback,
    SetSubsystemInfo,
    SetControllerInfo,
    SetMemoryMaps,
    SetGeometry,
}

static ENV_TABLE: &[(c_uint, EnvKind)] = &[
    (ENVIRONMENT_SET_ROTATION, EnvKind::SetRotation),
    (ENVIRONMENT_GET_OVERSCAN, EnvKind::GetOverscan),
    (ENVIRONMENT_GET_CAN_DUPE, EnvKind::GetCanDupe),
    (ENVIRONMENT_SET_MESSAGE, EnvKind::SetMessage),
    (ENVIRONMENT_SHUTDOWN, EnvKind::Shutdown),
    (ENVIRONMENT_SET_PERFORMANCE_LEVEL, EnvKind::SetPerformanceLevel),
    (ENVIRONMENT_GET_SYSTEM_DIRECTORY, EnvKind::GetSystemDirectory),
    (ENVIRONMENT_SET_PIXEL_FORMAT, EnvKind::SetPixelFormat),
    (ENVIRONMENT_SET_INPUT_DESCRIPTORS, EnvKind::SetInputDescriptors),
    (ENVIRONMENT_SET_KEYBOARD_CALLBACK, EnvKind::SetKeyboardCallback),
    (ENVIRONMENT_SET_DISK_CONTROL_INTERFACE, EnvKind::SetDiskControlInterface),
    (ENVIRONMENT_SET_HW_RENDER, EnvKind::SetHwRender),
    (ENVIRONMENT_GET_VARIABLE, EnvKind::GetVariable),
    (ENVIRONMENT_SET_VARIABLES, EnvKind::SetVariables),
    (ENVIRONMENT_GET_VARIABLE_UPDATE, EnvKind::GetVariableUpdate),
    (ENVIRONMENT_SET_SUPPORT_NO_GAME, EnvKind::SetSupportNoGame),
    (ENVIRONMENT_GET_LIBRETRO_PATH, EnvKind::GetLibretroPath),
    (ENVIRONMENT_SET_FRAME_TIME_CALLBACK, EnvKind::SetFrameTimeCallback),
    (ENVIRONMENT_SET_AUDIO_CALLBACK, EnvKind::SetAudioCallback),
    (ENVIRONMENT_GET_RUMBLE_INTERFACE, EnvKind::GetRumbleInterface),
    (ENVIRONMENT_GET_INPUT_DEVICE_CAPABILITIES, EnvKind::GetInputDeviceCapabilities),
    (ENVIRONMENT_GET_SENSOR_INTERFACE, EnvKind::GetSensorInterface),
    (ENVIRONMENT_GET_CAMERA_INTERFACE, EnvKind::GetCameraInterface),
    (ENVIRONMENT_GET_LOG_INTERFACE, EnvKind::GetLogInterface),
    (ENVIRONMENT_GET_PERF_INTERFACE, EnvKind::GetPerfInterface),
    (ENVIRONMENT_GET_LOCATION_INTERFACE, EnvKind::GetLocationInterface),
    (ENVIRONMENT_GET_CORE_ASSETS_DIRECTORY, EnvKind::GetCoreAssetsDirectory),
    (ENVIRONMENT_GET_SAVE_DIRECTORY, EnvKind::GetSaveDirectory),
    (ENVIRONMENT_SET_SYSTEM_AV_INFO, EnvKind::SetSystemAvInfo),
    (ENVIRONMENT_SET_PROC_ADDRESS_CALLBACK, EnvKind::SetProcAddressCallback),
    (ENVIRONMENT_SET_SUBSYSTEM_INFO, EnvKind::SetSubsystemInfo),
    (ENVIRONMENT_SET_CONTROLLER_INFO, EnvKind::SetControllerInfo),
    (ENVIRONMENT_SET_MEMORY_MAPS, EnvKind::SetMemoryMaps),
    (ENVIRONMENT_SET_GEOMETRY, EnvKind::SetGeometry),
];

impl EnvKind {
    /// Look up a raw command, ignoring the experimental flag.
    pub fn from_code(cmd: c_uint) -> Option<Self> {
        let code = cmd & !ENVIRONMENT_EXPERIMENTAL;
        ENV_TABLE
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, kind)| *kind)
    }
}

/// One decoded environment call with its typed payload.
#[derive(Debug)]
pub enum EnvCommand<'a> {
    SetRotation(c_uint),
    GetOverscan(&'a mut bool),
    GetCanDupe(&'a mut bool),
    SetMessage(&'a retro_message),
    Shutdown,
    SetPerformanceLevel(c_uint),
    GetSystemDirectory(&'a mut *const c_char),
    SetPixelFormat(c_int),
    /// Array terminated by an entry with a null description.
    SetInputDescriptors(*const retro_input_descriptor),
    SetKeyboardCallback(&'a retro_keyboard_callback),
    SetHwRender(&'a mut retro_hw_render_callback),
    GetVariable(&'a mut retro_variable),
    /// Array terminated by an entry with a null key.
    SetVariables(*const retro_variable),
    GetVariableUpdate(&'a mut bool),
    SetSupportNoGame(bool),
    GetLibretroPath(&'a mut *const c_char),
    SetFrameTimeCallback(&'a retro_frame_time_callback),
    GetLogInterface(&'a mut retro_log_callback),
    GetCoreAssetsDirectory(&'a mut *const c_char),
    GetSaveDirectory(&'a mut *const c_char),
    SetSystemAvInfo(&'a retro_system_av_info),
    SetGeometry(&'a retro_game_geometry),
    /// Known command the host does not provide.
    Unsupported(EnvKind),
}

impl<'a> EnvCommand<'a> {
    /// Decode a raw environment call.
    ///
    /// Returns `None` for unknown codes and for a null payload on commands
    /// that carry one.
    ///
    /// # Safety
    /// `data` must be null or point to the payload type libretro defines for
    /// `cmd`, valid for `'a`.
    pub unsafe fn decode(cmd: c_uint, data: *mut c_void) -> Option<Self> {
        let kind = EnvKind::from_code(cmd)?;

        match kind {
            EnvKind::Shutdown => return Some(EnvCommand::Shutdown),
            _ if data.is_null() => return None,
            _ => {}
        }

        let command = match kind {
            EnvKind::SetRotation => EnvCommand::SetRotation(*data.cast::<c_uint>()),
            EnvKind::GetOverscan => EnvCommand::GetOverscan(&mut *data.cast()),
            EnvKind::GetCanDupe => EnvCommand::GetCanDupe(&mut *data.cast()),
            EnvKind::SetMessage => EnvCommand::SetMessage(&*data.cast()),
            EnvKind::SetPerformanceLevel => {
                EnvCommand::SetPerformanceLevel(*data.cast::<c_uint>())
            }
            EnvKind::GetSystemDirectory => EnvCommand::GetSystemDirectory(&mut *data.cast()),
            EnvKind::SetPixelFormat => EnvCommand::SetPixelFormat(*data.cast::<c_int>()),
            EnvKind::SetInputDescriptors => EnvCommand::SetInputDescriptors(data.cast()),
            EnvKind::SetKeyboardCallback => EnvCommand::SetKeyboardCallback(&*data.cast()),
            EnvKind::SetHwRender => EnvCommand::SetHwRender(&mut *data.cast()),
            EnvKind::GetVariable => EnvCommand::GetVariable(&mut *data.cast()),
            EnvKind::SetVariables => EnvCommand::SetVariables(data.cast()),
            EnvKind::GetVariableUpdate => EnvCommand::GetVariableUpdate(&mut *data.cast()),
            EnvKind::SetSupportNoGame => EnvCommand::SetSupportNoGame(*data.cast::<bool>()),
            EnvKind::GetLibretroPath => EnvCommand::GetLibretroPath(&mut *data.cast()),
            EnvKind::SetFrameTimeCallback => EnvCommand::SetFrameTimeCallback(&*data.cast()),
            EnvKind::GetLogInterface => EnvCommand::GetLogInterface(&mut *data.cast()),
            EnvKind::GetCoreAssetsDirectory => {
                EnvCommand::GetCoreAssetsDirectory(&mut *data.cast())
            }
            EnvKind::GetSaveDirectory => EnvCommand::GetSaveDirectory(&mut *data.cast()),
            EnvKind::SetSystemAvInfo => EnvCommand::SetSystemAvInfo(&*data.cast()),
            EnvKind::SetGeometry => EnvCommand::SetGeometry(&*data.cast()),
            other => EnvCommand::Unsupported(other),
        };
        Some(command)
    }
}

/// Apply a decoded command. Returns whether it was handled.
pub(crate) fn handle(shared: &HostShared, command: EnvCommand<'_>) -> bool {
    match command {
        EnvCommand::SetRotation(rotation) => {
            shared.video.lock().rotation = rotation % 4;
            true
        }
        EnvCommand::GetOverscan(out) => {
            *out = false;
            true
        }
        EnvCommand::GetCanDupe(out) => {
            *out = true;
            true
        }
        EnvCommand::SetMessage(message) => {
            // SAFETY: msg is null or a NUL-terminated string.
            let text = unsafe { string_from_ptr(message.msg) };
            tracing::info!("Core message: {}", text);
            shared.emit(HostEvent::Message {
                text,
                frames: message.frames,
            });
            true
        }
        EnvCommand::Shutdown => {
            shared.callbacks.lock().shutdown_requested = true;
            shared.emit(HostEvent::ShutdownRequested);
            true
        }
        EnvCommand::SetPerformanceLevel(level) => {
            shared.callbacks.lock().performance_level = level;
            true
        }
        EnvCommand::GetSystemDirectory(out) => {
            write_path(out, shared.directories.lock().system.as_ref().map(|c| c.as_ptr()))
        }
        EnvCommand::GetSaveDirectory(out) => {
            write_path(out, shared.directories.lock().save.as_ref().map(|c| c.as_ptr()))
        }
        EnvCommand::GetCoreAssetsDirectory(out) => {
            write_path(out, shared.directories.lock().content.as_ref().map(|c| c.as_ptr()))
        }
        EnvCommand::GetLibretroPath(out) => write_path(
            out,
            shared
                .directories
                .lock()
                .libretro_path
                .as_ref()
                .map(|c| c.as_ptr()),
        ),
        EnvCommand::SetPixelFormat(raw) => match PixelFormat::from_raw(raw) {
            Some(format) => {
                tracing::debug!("Core pixel format: {:?}", format);
                shared.video.lock().pixel_format = format;
                true
            }
            None => {
                tracing::warn!("Core requested unsupported pixel format {}", raw);
                false
            }
        },
        EnvCommand::SetInputDescriptors(mut entry) => {
            let mut descriptors = Vec::new();
            // SAFETY: the array ends with a null description.
            unsafe {
                while !(*entry).description.is_null() {
                    let raw = &*entry;
                    descriptors.push(InputDescriptor {
                        port: raw.port,
                        device: raw.device,
                        index: raw.index,
                        id: raw.id,
                        description: string_from_ptr(raw.description),
                    });
                    entry = entry.add(1);
                }
            }
            shared.callbacks.lock().input_descriptors = descriptors;
            true
        }
        EnvCommand::SetKeyboardCallback(callback) => {
            shared.callbacks.lock().keyboard = Some(*callback);
            true
        }
        EnvCommand::SetFrameTimeCallback(callback) => {
            shared.callbacks.lock().frame_time = Some(*callback);
            true
        }
        EnvCommand::SetHwRender(request) => {
            let request = HwRenderRequest::from(&*request);
            if !request.supported {
                tracing::warn!(
                    "Core requested unknown hardware context {:?}",
                    request.context_type
                );
            }
            shared.video.lock().hw_render = Some(request);
            true
        }
        EnvCommand::GetVariable(variable) => {
            if variable.key.is_null() {
                return false;
            }
            // SAFETY: key is a NUL-terminated string.
            let key = unsafe { string_from_ptr(variable.key) };
            match shared.variables.lock().value_ptr(&key) {
                Some(value) => {
                    variable.value = value;
                    true
                }
                None => false,
            }
        }
        EnvCommand::SetVariables(mut entry) => {
            let mut schemas = Vec::new();
            // SAFETY: the array ends with a null key.
            unsafe {
                while !(*entry).key.is_null() {
                    let raw = &*entry;
                    schemas.push((string_from_ptr(raw.key), string_from_ptr(raw.value)));
                    entry = entry.add(1);
                }
            }
            tracing::debug!("Core registered {} variables", schemas.len());
            shared.variables.lock().register_all(schemas);
            true
        }
        EnvCommand::GetVariableUpdate(out) => {
            *out = shared.variables.lock().take_update();
            true
        }
        EnvCommand::SetSupportNoGame(supported) => {
            shared.callbacks.lock().support_no_game = supported;
            true
        }
        EnvCommand::GetLogInterface(log) => {
            log.log = Some(callbacks::core_log);
            true
        }
        EnvCommand::SetSystemAvInfo(raw) => {
            let info = AvInfo::from(*raw);
            tracing::debug!(
                "Core replaced AV info: {}x{} @ {:.3} fps, {:.1} Hz",
                info.geometry.base_width,
                info.geometry.base_height,
                info.timing.fps,
                info.timing.sample_rate
            );
            *shared.av_info.lock() = Some(info);
            shared.audio.lock().publish_rate(info.timing.audio_rate());
            true
        }
        EnvCommand::SetGeometry(raw) => {
            let mut av_info = shared.av_info.lock();
            match av_info.as_mut() {
                Some(info) => {
                    info.geometry = (*raw).into();
                    true
                }
                None => false,
            }
        }
        EnvCommand::Unsupported(kind) => {
            tracing::debug!("Unsupported environment command {:?}", kind);
            false
        }
    }
}

fn write_path(out: &mut *const c_char, path: Option<*const c_char>) -> bool {
    match path {
        Some(ptr) => {
            *out = ptr;
            true
        }
        None => false,
    }
}
