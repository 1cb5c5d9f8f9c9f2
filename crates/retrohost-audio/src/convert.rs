//! Sample encoding between core bytes, planar f32 and device bytes.

use crate::format::{AudioFormat, ByteOrder, SampleFormat};

const I16_SCALE: f32 = 32768.0;

/// Decode interleaved stereo i16 LE into planar f32, appending.
pub fn decode_core(bytes: &[u8], left: &mut Vec<f32>, right: &mut Vec<f32>) {
    for frame in bytes.chunks_exact(AudioFormat::CORE_FRAME_BYTES) {
        left.push(i16::from_le_bytes([frame[0], frame[1]]) as f32 / I16_SCALE);
        right.push(i16::from_le_bytes([frame[2], frame[3]]) as f32 / I16_SCALE);
    }
}

#[inline]
fn write_sample(value: f32, format: &AudioFormat, out: &mut Vec<u8>) {
    match (format.sample_format, format.byte_order) {
        (SampleFormat::I16, order) => {
            let s = (value.clamp(-1.0, 1.0) * 32767.0).round() as i16;
            match order {
                ByteOrder::Little => out.extend_from_slice(&s.to_le_bytes()),
                ByteOrder::Big => out.extend_from_slice(&s.to_be_bytes()),
            }
        }
        (SampleFormat::F32, ByteOrder::Little) => out.extend_from_slice(&value.to_le_bytes()),
        (SampleFormat::F32, ByteOrder::Big) => out.extend_from_slice(&value.to_be_bytes()),
    }
}

/// Encode planar stereo into interleaved device bytes, appending.
///
/// Mono devices get the average of both channels; channels beyond the
/// second are written as silence.
pub fn encode_device(left: &[f32], right: &[f32], format: &AudioFormat, out: &mut Vec<u8>) {
    let channels = format.channels as usize;
    out.reserve(left.len().min(right.len()) * format.bytes_per_frame());

    for (&l, &r) in left.iter().zip(right) {
        if channels == 1 {
            write_sample((l + r) * 0.5, format, out);
            continue;
        }
        write_sample(l, format, out);
        write_sample(r, format, out);
        for _ in 2..channels {
            write_sample(0.0, format, out);
        }
    }
}

/// Silence for `frames` device frames, appending.
pub fn encode_silence(frames: usize, format: &AudioFormat, out: &mut Vec<u8>) {
    out.resize(out.len() + format.bytes_for_frames(frames), 0);
}

/// Decode interleaved device bytes into interleaved f32.
///
/// Returns the number of samples written to `out`.
pub fn decode_device(bytes: &[u8], format: &AudioFormat, out: &mut [f32]) -> usize {
    let width = format.bytes_per_sample();
    let mut written = 0;

    for (raw, dst) in bytes.chunks_exact(width).zip(out.iter_mut()) {
        *dst = match (format.sample_format, format.byte_order) {
            (SampleFormat::I16, ByteOrder::Little) => {
                i16::from_le_bytes([raw[0], raw[1]]) as f32 / I16_SCALE
            }
            (SampleFormat::I16, ByteOrder::Big) => {
                i16::from_be_bytes([raw[0], raw[1]]) as f32 / I16_SCALE
            }
            (SampleFormat::F32, ByteOrder::Little) => {
                f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])
            }
            (SampleFormat::F32, ByteOrder::Big) => {
                f32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]])
            }
        };
        written += 1;
    }

    written
}
