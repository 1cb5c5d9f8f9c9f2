//! CPAL device sink.

use crate::convert;
use crate::format::{AudioFormat, ByteOrder, SampleFormat};
use crate::sink::{DeviceEvent, DeviceSink};
use crate::{AudioError, Result};
use atomic_float::AtomicF32;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    pub output_device_index: Option<usize>,
    /// Size of the sink's internal buffer.
    pub buffer_duration: Duration,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_device_index: None,
            buffer_duration: Duration::from_millis(250),
        }
    }
}

/// Wrapper to hold a `cpal::Stream` in a `Send` context.
///
/// `cpal::Stream` is `!Send` due to platform internals. The sink is owned by
/// the drain thread, which creates, drives and drops the stream; nothing else
/// ever touches it.
struct StreamHandle(cpal::Stream);

// SAFETY: The stream is created, paused, resumed and dropped only by the
// thread that owns the CpalSink, so it is never accessed concurrently.
unsafe impl Send for StreamHandle {}

#[derive(Debug, Clone, Copy)]
struct SupportedRange {
    channels: u16,
    min_rate: u32,
    max_rate: u32,
    sample_format: cpal::SampleFormat,
}

/// State shared with the real-time callback.
struct CallbackShared {
    volume: AtomicF32,
    playing: AtomicBool,
    underrun: AtomicBool,
    error: Mutex<Option<String>>,
}

pub struct CpalSink {
    config: OutputConfig,
    supported: Vec<SupportedRange>,
    preferred: AudioFormat,
    format: Option<AudioFormat>,
    producer: Option<HeapProd<u8>>,
    capacity: usize,
    shared: Arc<CallbackShared>,
    stream: Option<StreamHandle>,
}

fn map_sample_format(format: cpal::SampleFormat) -> Option<SampleFormat> {
    match format {
        cpal::SampleFormat::F32 => Some(SampleFormat::F32),
        cpal::SampleFormat::I16 | cpal::SampleFormat::U16 => Some(SampleFormat::I16),
        _ => None,
    }
}

impl CpalSink {
    pub fn new(config: OutputConfig) -> Result<Self> {
        let device = Self::get_device(config.output_device_index)?;
        let default_config = device.default_output_config()?;

        let supported = device
            .supported_output_configs()?
            .filter(|range| map_sample_format(range.sample_format()).is_some())
            .map(|range| SupportedRange {
                channels: range.channels(),
                min_rate: range.min_sample_rate().0,
                max_rate: range.max_sample_rate().0,
                sample_format: range.sample_format(),
            })
            .collect();

        let preferred = AudioFormat::new(
            default_config.sample_rate().0,
            default_config.channels(),
            map_sample_format(default_config.sample_format()).unwrap_or(SampleFormat::F32),
            ByteOrder::native(),
        );

        Ok(Self {
            config,
            supported,
            preferred,
            format: None,
            producer: None,
            capacity: 0,
            shared: Arc::new(CallbackShared {
                volume: AtomicF32::new(1.0),
                playing: AtomicBool::new(false),
                underrun: AtomicBool::new(false),
                error: Mutex::new(None),
            }),
            stream: None,
        })
    }

    fn get_device(index: Option<usize>) -> Result<cpal::Device> {
        let host = cpal::default_host();

        if let Some(idx) = index {
            let devices: Vec<_> = host.output_devices()?.collect();

            let device_count = devices.len();
            devices.into_iter().nth(idx).ok_or_else(|| {
                AudioError::InvalidDevice(format!(
                    "Output device index {} out of range (available: {})",
                    idx, device_count
                ))
            })
        } else {
            host.default_output_device()
                .ok_or_else(|| AudioError::InvalidDevice("No output device available".to_string()))
        }
    }

    /// Best matching range for a rate/channel pair, preferring f32.
    fn find_range(&self, rate: u32, channels: u16) -> Option<SupportedRange> {
        let matches = || {
            self.supported
                .iter()
                .filter(move |r| r.channels == channels && (r.min_rate..=r.max_rate).contains(&rate))
        };
        matches()
            .find(|r| r.sample_format == cpal::SampleFormat::F32)
            .or_else(|| matches().next())
            .copied()
    }

    fn build_stream<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        format: AudioFormat,
        mut consumer: HeapCons<u8>,
    ) -> Result<cpal::Stream>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let shared = Arc::clone(&self.shared);
        let error_shared = Arc::clone(&self.shared);
        let bytes_per_sample = format.bytes_per_sample();
        let bytes_per_frame = format.bytes_per_frame();
        let mut bytes = vec![0u8; 8192 * bytes_per_frame];
        let mut samples = vec![0.0f32; 8192 * format.channels as usize];

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    let needed = data.len() * bytes_per_sample;
                    if bytes.len() < needed {
                        bytes.resize(needed, 0);
                        samples.resize(data.len(), 0.0);
                    }

                    let available = consumer.occupied_len();
                    let take = needed.min(available - available % bytes_per_frame);
                    let got = consumer.pop_slice(&mut bytes[..take]);
                    let decoded = convert::decode_device(&bytes[..got], &format, &mut samples);

                    let volume = shared.volume.load(Ordering::Relaxed);
                    for (i, sample) in data.iter_mut().enumerate() {
                        let value = if i < decoded { samples[i] * volume } else { 0.0 };
                        *sample = T::from_sample(value);
                    }

                    if got < needed && shared.playing.load(Ordering::Relaxed) {
                        shared.underrun.store(true, Ordering::Release);
                    }
                }));

                if result.is_err() {
                    // Panic in callback - output silence
                    for sample in data.iter_mut() {
                        *sample = T::from_sample(0.0);
                    }
                }
            },
            move |err| {
                *error_shared.error.lock() = Some(err.to_string());
            },
            None,
        )?;

        Ok(stream)
    }

    /// List available output devices.
    pub fn list_output_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices: Result<Vec<String>> = host
            .output_devices()?
            .enumerate()
            .map(|(idx, device)| Ok(format!("{}: {}", idx, device.name()?)))
            .collect();
        devices
    }
}

impl DeviceSink for CpalSink {
    fn nearest_format(&self, requested: &AudioFormat) -> AudioFormat {
        if let Some(range) = self.find_range(requested.sample_rate, requested.channels) {
            return AudioFormat::new(
                requested.sample_rate,
                requested.channels,
                map_sample_format(range.sample_format).unwrap_or(SampleFormat::F32),
                ByteOrder::native(),
            );
        }

        // Same channel count at the closest supported rate.
        self.supported
            .iter()
            .filter(|r| r.channels == requested.channels)
            .map(|r| {
                let rate = requested.sample_rate.clamp(r.min_rate, r.max_rate);
                (rate.abs_diff(requested.sample_rate), rate, r)
            })
            .min_by_key(|(diff, _, _)| *diff)
            .map(|(_, rate, r)| {
                AudioFormat::new(
                    rate,
                    r.channels,
                    map_sample_format(r.sample_format).unwrap_or(SampleFormat::F32),
                    ByteOrder::native(),
                )
            })
            .unwrap_or(self.preferred)
    }

    fn preferred_format(&self) -> AudioFormat {
        self.preferred
    }

    fn open(&mut self, format: AudioFormat) -> Result<()> {
        self.close();

        if !format.is_valid() {
            return Err(AudioError::InvalidFormat(format.to_string()));
        }

        let device = Self::get_device(self.config.output_device_index)?;
        let stream_format = self
            .find_range(format.sample_rate, format.channels)
            .map(|r| r.sample_format)
            .unwrap_or(cpal::SampleFormat::F32);
        let stream_config = cpal::StreamConfig {
            channels: format.channels,
            sample_rate: cpal::SampleRate(format.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let capacity = format
            .bytes_for_duration(self.config.buffer_duration)
            .max(format.bytes_per_frame());
        let (producer, consumer) = HeapRb::<u8>::new(capacity).split();

        let stream = match stream_format {
            cpal::SampleFormat::F32 => {
                self.build_stream::<f32>(&device, &stream_config, format, consumer)?
            }
            cpal::SampleFormat::I16 => {
                self.build_stream::<i16>(&device, &stream_config, format, consumer)?
            }
            cpal::SampleFormat::U16 => {
                self.build_stream::<u16>(&device, &stream_config, format, consumer)?
            }
            other => {
                return Err(AudioError::DeviceOpen(format!(
                    "Unsupported sample format: {:?}",
                    other
                )));
            }
        };

        self.shared.underrun.store(false, Ordering::Release);
        self.shared.error.lock().take();
        stream.play()?;
        self.shared.playing.store(true, Ordering::Release);

        self.stream = Some(StreamHandle(stream));
        self.producer = Some(producer);
        self.capacity = capacity;
        self.format = Some(format);

        tracing::debug!("Opened audio output: {} ({} byte buffer)", format, capacity);
        Ok(())
    }

    fn close(&mut self) {
        self.shared.playing.store(false, Ordering::Release);
        self.stream = None;
        self.producer = None;
        self.format = None;
        self.capacity = 0;
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn buffer_size(&self) -> usize {
        self.capacity
    }

    fn bytes_free(&self) -> usize {
        match (&self.producer, self.format) {
            (Some(producer), Some(format)) => format.align_bytes(producer.vacant_len()),
            _ => 0,
        }
    }

    fn write(&mut self, data: &[u8], timeout: Duration) -> usize {
        let (Some(producer), Some(format)) = (self.producer.as_mut(), self.format) else {
            return 0;
        };

        let data = &data[..format.align_bytes(data.len())];
        let deadline = Instant::now() + timeout;
        let mut written = 0;

        loop {
            let room = format.align_bytes(producer.vacant_len());
            let take = room.min(data.len() - written);
            if take > 0 {
                written += producer.push_slice(&data[written..written + take]);
            }
            if written == data.len() || Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(Duration::from_micros(250));
        }

        written
    }

    fn suspend(&mut self) {
        self.shared.playing.store(false, Ordering::Release);
        if let Some(StreamHandle(stream)) = &self.stream {
            if let Err(e) = stream.pause() {
                tracing::warn!("Failed to suspend audio output: {}", e);
            }
        }
    }

    fn resume(&mut self) {
        if let Some(StreamHandle(stream)) = &self.stream {
            if let Err(e) = stream.play() {
                tracing::warn!("Failed to resume audio output: {}", e);
                return;
            }
            self.shared.playing.store(true, Ordering::Release);
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.shared.volume.store(volume.clamp(0.0, 1.0), Ordering::Relaxed);
    }

    fn take_event(&mut self) -> Option<DeviceEvent> {
        if let Some(reason) = self.shared.error.lock().take() {
            return Some(DeviceEvent::StreamError(reason));
        }
        if self.shared.underrun.swap(false, Ordering::AcqRel) {
            return Some(DeviceEvent::Underrun);
        }
        None
    }
}
