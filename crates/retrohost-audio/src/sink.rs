//! Output device abstraction.

use crate::format::AudioFormat;
use crate::Result;
use std::time::Duration;

/// Asynchronous notifications from a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The device ran out of data while playing.
    Underrun,
    /// The stream failed or could not be opened.
    StreamError(String),
}

/// A byte-oriented audio output with a bounded internal buffer.
///
/// Sizes are in bytes of the format passed to [`DeviceSink::open`].
pub trait DeviceSink: Send {
    /// Closest format the device supports to `requested`.
    fn nearest_format(&self, requested: &AudioFormat) -> AudioFormat;

    fn preferred_format(&self) -> AudioFormat;

    /// (Re)open the output stream, discarding anything buffered.
    fn open(&mut self, format: AudioFormat) -> Result<()>;

    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Total buffer capacity.
    fn buffer_size(&self) -> usize;

    fn bytes_free(&self) -> usize;

    /// Queue whole frames of `data`, waiting at most `timeout` for space.
    ///
    /// Returns the number of bytes accepted.
    fn write(&mut self, data: &[u8], timeout: Duration) -> usize;

    /// Pause playback, keeping buffered data.
    fn suspend(&mut self);

    fn resume(&mut self);

    /// Output gain in 0.0..=1.0.
    fn set_volume(&mut self, volume: f32);

    /// Pop the oldest pending event.
    fn take_event(&mut self) -> Option<DeviceEvent>;
}

/// Sink that accepts everything and plays nothing.
///
/// Useful for headless sessions; the drain keeps the ring empty.
#[derive(Debug, Default)]
pub struct NullSink {
    format: Option<AudioFormat>,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeviceSink for NullSink {
    fn nearest_format(&self, requested: &AudioFormat) -> AudioFormat {
        *requested
    }

    fn preferred_format(&self) -> AudioFormat {
        AudioFormat::core_native(48000)
    }

    fn open(&mut self, format: AudioFormat) -> Result<()> {
        self.format = Some(format);
        Ok(())
    }

    fn close(&mut self) {
        self.format = None;
    }

    fn is_open(&self) -> bool {
        self.format.is_some()
    }

    fn buffer_size(&self) -> usize {
        self.format
            .map(|f| f.bytes_for_duration(Duration::from_millis(250)))
            .unwrap_or(0)
    }

    fn bytes_free(&self) -> usize {
        self.buffer_size()
    }

    fn write(&mut self, data: &[u8], _timeout: Duration) -> usize {
        match self.format {
            Some(format) => format.align_bytes(data.len()),
            None => 0,
        }
    }

    fn suspend(&mut self) {}

    fn resume(&mut self) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn take_event(&mut self) -> Option<DeviceEvent> {
        None
    }
}
