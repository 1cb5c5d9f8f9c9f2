//! Video frame hand-off to the presentation layer.

use crate::av::PixelFormat;
use parking_lot::Mutex;
use std::sync::Arc;

/// Content of one refresh callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameContent<'a> {
    /// `pitch * height` bytes owned by the core.
    Pixels(&'a [u8]),
    /// Intentional repeat of the previous frame.
    Duplicate,
    /// Frame rendered into the hardware context.
    Hardware,
}

/// Borrowed view of the latest frame, valid until the next refresh.
#[derive(Debug, Clone, Copy)]
pub struct VideoFrame<'a> {
    pub width: u32,
    pub height: u32,
    pub pitch: usize,
    pub format: PixelFormat,
    pub content: FrameContent<'a>,
}

impl VideoFrame<'_> {
    pub fn is_duplicate(&self) -> bool {
        matches!(self.content, FrameContent::Duplicate)
    }

    pub fn is_hardware(&self) -> bool {
        matches!(self.content, FrameContent::Hardware)
    }
}

/// Receives frames during `run_frame`.
///
/// Sinks must copy whatever they keep; the borrowed pixels are reused by the
/// core on the next refresh.
pub trait FrameSink: Send {
    fn present(&mut self, frame: &VideoFrame<'_>);
}

/// Discards every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFrameSink;

impl FrameSink for NullFrameSink {
    fn present(&mut self, _frame: &VideoFrame<'_>) {}
}

/// Owned copy of a presented frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedFrame {
    pub width: u32,
    pub height: u32,
    pub pitch: usize,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
    pub hardware: bool,
}

#[derive(Debug, Default)]
struct CaptureState {
    latest: Option<CapturedFrame>,
    presented: u64,
    duplicates: u64,
}

/// Copying sink. Clones share the same captured frame, so a UI thread can keep
/// one handle while the host owns another.
#[derive(Debug, Clone, Default)]
pub struct FrameCapture {
    state: Arc<Mutex<CaptureState>>,
}

impl FrameCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<CapturedFrame> {
        self.state.lock().latest.clone()
    }

    /// Refresh callbacks seen, duplicates included.
    pub fn presented(&self) -> u64 {
        self.state.lock().presented
    }

    pub fn duplicates(&self) -> u64 {
        self.state.lock().duplicates
    }
}

impl FrameSink for FrameCapture {
    fn present(&mut self, frame: &VideoFrame<'_>) {
        let mut state = self.state.lock();
        state.presented += 1;

        match frame.content {
            FrameContent::Duplicate => state.duplicates += 1,
            FrameContent::Hardware => {
                state.latest = Some(CapturedFrame {
                    width: frame.width,
                    height: frame.height,
                    pitch: frame.pitch,
                    format: frame.format,
                    pixels: Vec::new(),
                    hardware: true,
                });
            }
            FrameContent::Pixels(pixels) => {
                // Reuse the previous allocation when the size is unchanged.
                let mut captured = state.latest.take().unwrap_or_default();
                captured.width = frame.width;
                captured.height = frame.height;
                captured.pitch = frame.pitch;
                captured.format = frame.format;
                captured.hardware = false;
                captured.pixels.clear();
                captured.pixels.extend_from_slice(pixels);
                state.latest = Some(captured);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(content: FrameContent<'_>) -> VideoFrame<'_> {
        VideoFrame {
            width: 2,
            height: 2,
            pitch: 4,
            format: PixelFormat::Rgb565,
            content,
        }
    }

    #[test]
    fn test_capture_copies_pixels() {
        let capture = FrameCapture::new();
        let mut sink = capture.clone();

        let pixels = [1u8, 2, 3, 4, 5, 6, 7, 8];
        sink.present(&frame(FrameContent::Pixels(&pixels)));

        let latest = capture.latest().unwrap();
        assert_eq!(latest.pixels, pixels);
        assert_eq!(latest.format, PixelFormat::Rgb565);
        assert_eq!(capture.presented(), 1);
    }

    #[test]
    fn test_duplicate_keeps_previous_pixels() {
        let capture = FrameCapture::new();
        let mut sink = capture.clone();

        sink.present(&frame(FrameContent::Pixels(&[9u8; 8])));
        sink.present(&frame(FrameContent::Duplicate));

        assert_eq!(capture.latest().unwrap().pixels, [9u8; 8]);
        assert_eq!(capture.presented(), 2);
        assert_eq!(capture.duplicates(), 1);
    }

    #[test]
    fn test_hardware_marker() {
        let capture = FrameCapture::new();
        let mut sink = capture.clone();
        let hw = frame(FrameContent::Hardware);
        assert!(hw.is_hardware());

        sink.present(&hw);
        let latest = capture.latest().unwrap();
        assert!(latest.hardware);
        assert!(latest.pixels.is_empty());
    }
}
