//! Owned copies of core-reported metadata.

use crate::abi;
use std::ffi::{c_char, CStr};

/// Copy a possibly-null C string.
pub(crate) unsafe fn string_from_ptr(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

/// Static core description, fetched once after init.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemInfo {
    pub library_name: String,
    pub library_version: String,
    /// File extensions the core accepts, without dots.
    pub valid_extensions: Vec<String>,
    /// Core reads the game file itself; no in-memory buffer is passed.
    pub need_fullpath: bool,
    pub block_extract: bool,
}

impl SystemInfo {
    /// # Safety
    /// String pointers in `raw` must be null or valid NUL-terminated strings.
    pub(crate) unsafe fn from_raw(raw: &abi::retro_system_info) -> Self {
        let extensions = string_from_ptr(raw.valid_extensions);
        Self {
            library_name: string_from_ptr(raw.library_name),
            library_version: string_from_ptr(raw.library_version),
            valid_extensions: extensions
                .split('|')
                .filter(|e| !e.is_empty())
                .map(|e| e.to_ascii_lowercase())
                .collect(),
            need_fullpath: raw.need_fullpath,
            block_extract: raw.block_extract,
        }
    }

    pub fn supports_extension(&self, extension: &str) -> bool {
        self.valid_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Geometry {
    pub base_width: u32,
    pub base_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    /// Zero or negative means width / height.
    pub aspect_ratio: f32,
}

impl Geometry {
    pub fn display_aspect(&self) -> f32 {
        if self.aspect_ratio > 0.0 {
            self.aspect_ratio
        } else if self.base_height > 0 {
            self.base_width as f32 / self.base_height as f32
        } else {
            0.0
        }
    }
}

impl From<abi::retro_game_geometry> for Geometry {
    fn from(raw: abi::retro_game_geometry) -> Self {
        Self {
            base_width: raw.base_width,
            base_height: raw.base_height,
            max_width: raw.max_width,
            max_height: raw.max_height,
            aspect_ratio: raw.aspect_ratio,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timing {
    pub fps: f64,
    pub sample_rate: f64,
}

impl Timing {
    /// Core audio rate rounded to the nearest integer Hz.
    pub fn audio_rate(&self) -> u32 {
        if self.sample_rate.is_finite() && self.sample_rate > 0.0 {
            self.sample_rate.round() as u32
        } else {
            0
        }
    }
}

/// Audio/video timing and geometry reported after game load.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AvInfo {
    pub geometry: Geometry,
    pub timing: Timing,
}

impl From<abi::retro_system_av_info> for AvInfo {
    fn from(raw: abi::retro_system_av_info) -> Self {
        Self {
            geometry: raw.geometry.into(),
            timing: Timing {
                fps: raw.timing.fps,
                sample_rate: raw.timing.sample_rate,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Core default until SET_PIXEL_FORMAT says otherwise.
    #[default]
    Rgb1555,
    Xrgb8888,
    Rgb565,
}

impl PixelFormat {
    pub fn from_raw(raw: std::ffi::c_int) -> Option<Self> {
        match raw {
            abi::PIXEL_FORMAT_0RGB1555 => Some(PixelFormat::Rgb1555),
            abi::PIXEL_FORMAT_XRGB8888 => Some(PixelFormat::Xrgb8888),
            abi::PIXEL_FORMAT_RGB565 => Some(PixelFormat::Rgb565),
            _ => None,
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb1555 | PixelFormat::Rgb565 => 2,
            PixelFormat::Xrgb8888 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HwContextType {
    None,
    OpenGl,
    OpenGles2,
    OpenGlCore,
    OpenGles3,
    OpenGlesVersion,
    Vulkan,
    Unknown(i32),
}

impl HwContextType {
    pub fn from_raw(raw: std::ffi::c_int) -> Self {
        match raw {
            abi::HW_CONTEXT_NONE => HwContextType::None,
            abi::HW_CONTEXT_OPENGL => HwContextType::OpenGl,
            abi::HW_CONTEXT_OPENGLES2 => HwContextType::OpenGles2,
            abi::HW_CONTEXT_OPENGL_CORE => HwContextType::OpenGlCore,
            abi::HW_CONTEXT_OPENGLES3 => HwContextType::OpenGles3,
            abi::HW_CONTEXT_OPENGLES_VERSION => HwContextType::OpenGlesVersion,
            abi::HW_CONTEXT_VULKAN => HwContextType::Vulkan,
            other => HwContextType::Unknown(other),
        }
    }
}

/// Recorded SET_HW_RENDER request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HwRenderRequest {
    pub context_type: HwContextType,
    pub version_major: u32,
    pub version_minor: u32,
    pub depth: bool,
    pub stencil: bool,
    pub bottom_left_origin: bool,
    /// False for context types this frontend does not know.
    pub supported: bool,
}

impl From<&abi::retro_hw_render_callback> for HwRenderRequest {
    fn from(raw: &abi::retro_hw_render_callback) -> Self {
        let context_type = HwContextType::from_raw(raw.context_type);
        Self {
            context_type,
            version_major: raw.version_major,
            version_minor: raw.version_minor,
            depth: raw.depth,
            stencil: raw.stencil,
            bottom_left_origin: raw.bottom_left_origin,
            supported: !matches!(context_type, HwContextType::Unknown(_)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDescriptor {
    pub port: u32,
    pub device: u32,
    pub index: u32,
    pub id: u32,
    pub description: String,
}
