//! State published between the frame-execution context and the drain thread.

use crate::format::AudioFormat;
use arc_swap::ArcSwapOption;
use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Current core-side audio format plus a generation counter.
///
/// Writers store the format first and bump the generation after, so a reader
/// that sees a new generation always loads a format at least that new.
#[derive(Debug, Default)]
pub struct FormatCell {
    format: ArcSwapOption<AudioFormat>,
    generation: AtomicU64,
}

impl FormatCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `format` and bump the generation, unless it is already current.
    ///
    /// Returns whether anything changed. Single writer.
    pub fn publish(&self, format: AudioFormat) -> bool {
        if self.current() == Some(format) {
            return false;
        }
        self.format.store(Some(Arc::new(format)));
        self.generation.fetch_add(1, Ordering::Release);
        true
    }

    /// Drop the current format (core unloaded). Bumps the generation if a
    /// format was set.
    pub fn clear(&self) -> bool {
        if self.format.swap(None).is_none() {
            return false;
        }
        self.generation.fetch_add(1, Ordering::Release);
        true
    }

    pub fn current(&self) -> Option<AudioFormat> {
        self.format.load_full().map(|f| *f)
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

/// Flags controlling the drain thread.
#[derive(Debug)]
pub struct PipelineControl {
    running: AtomicBool,
    shutdown: AtomicBool,
    volume: AtomicF32,
}

impl Default for PipelineControl {
    fn default() -> Self {
        Self {
            running: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            volume: AtomicF32::new(1.0),
        }
    }
}

impl PipelineControl {
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    #[inline]
    pub fn volume(&self) -> f32 {
        self.volume.load(Ordering::Acquire)
    }

    /// Clamped to 0.0..=1.0.
    pub fn set_volume(&self, volume: f32) {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.volume.store(volume, Ordering::Release);
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_bumps_generation() {
        let cell = FormatCell::new();
        assert_eq!(cell.generation(), 0);
        assert!(cell.current().is_none());

        cell.publish(AudioFormat::core_native(44100));
        assert_eq!(cell.generation(), 1);
        assert_eq!(cell.current().map(|f| f.sample_rate), Some(44100));

        cell.clear();
        assert_eq!(cell.generation(), 2);
        assert!(cell.current().is_none());
    }

    #[test]
    fn test_unchanged_format_keeps_generation() {
        let cell = FormatCell::new();
        assert!(cell.publish(AudioFormat::core_native(32000)));
        assert!(!cell.publish(AudioFormat::core_native(32000)));
        assert_eq!(cell.generation(), 1);

        assert!(cell.publish(AudioFormat::core_native(48000)));
        assert_eq!(cell.generation(), 2);

        assert!(cell.clear());
        assert!(!cell.clear());
        assert_eq!(cell.generation(), 3);
    }

    #[test]
    fn test_volume_is_clamped() {
        let control = PipelineControl::default();
        assert_eq!(control.volume(), 1.0);
        control.set_volume(2.5);
        assert_eq!(control.volume(), 1.0);
        control.set_volume(f32::NAN);
        assert_eq!(control.volume(), 0.0);
        control.set_volume(0.25);
        assert_eq!(control.volume(), 0.25);
    }
}
