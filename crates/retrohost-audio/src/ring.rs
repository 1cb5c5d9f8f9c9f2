//! Bounded SPSC byte queue between the core's audio callbacks and the drain tick.
//!
//! The producer half lives with the core host and is written from inside
//! `run_frame`; it never blocks. When the queue is full, the tail of a write is
//! dropped (truncated to whole frames) and counted in [`RingStats`].

use crate::format::AudioFormat;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const FRAME: usize = AudioFormat::CORE_FRAME_BYTES;

/// Shared counters for one ring.
#[derive(Debug, Default)]
pub struct RingStats {
    written: AtomicU64,
    dropped: AtomicU64,
    read: AtomicU64,
}

impl RingStats {
    pub fn bytes_written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Bytes discarded because the queue was full.
    pub fn bytes_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn bytes_read(&self) -> u64 {
        self.read.load(Ordering::Relaxed)
    }
}

/// Create a ring holding `capacity_frames` stereo i16 frames.
pub fn audio_ring(capacity_frames: usize) -> (AudioProducer, AudioConsumer) {
    let capacity = capacity_frames.max(1) * FRAME;
    let (producer, consumer) = HeapRb::<u8>::new(capacity).split();
    let stats = Arc::new(RingStats::default());

    (
        AudioProducer {
            inner: producer,
            stats: Arc::clone(&stats),
        },
        AudioConsumer {
            inner: consumer,
            stats,
            capacity,
        },
    )
}

/// Write half. Owned by the frame-execution context.
pub struct AudioProducer {
    inner: HeapProd<u8>,
    stats: Arc<RingStats>,
}

impl AudioProducer {
    /// Append one stereo frame. Returns false if it was dropped.
    pub fn push_frame(&mut self, left: i16, right: i16) -> bool {
        let mut frame = [0u8; FRAME];
        frame[..2].copy_from_slice(&left.to_le_bytes());
        frame[2..].copy_from_slice(&right.to_le_bytes());
        self.push_bytes(&frame) == FRAME
    }

    /// Append interleaved L/R samples. Returns the number of frames queued.
    pub fn push_frames(&mut self, interleaved: &[i16]) -> usize {
        let mut scratch = [0u8; 1024];
        let mut queued = 0;

        for chunk in interleaved[..interleaved.len() & !1].chunks(scratch.len() / 2) {
            let len = chunk.len() * 2;
            for (dst, sample) in scratch[..len].chunks_exact_mut(2).zip(chunk) {
                dst.copy_from_slice(&sample.to_le_bytes());
            }
            queued += self.push_bytes(&scratch[..len]) / FRAME;
        }

        queued
    }

    /// Append raw core-format bytes, truncated to whole frames and to free space.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> usize {
        let offered = bytes.len() - bytes.len() % FRAME;
        let room = self.inner.vacant_len() - self.inner.vacant_len() % FRAME;
        let take = offered.min(room);

        let pushed = if take > 0 {
            self.inner.push_slice(&bytes[..take])
        } else {
            0
        };

        self.stats.written.fetch_add(pushed as u64, Ordering::Relaxed);
        if pushed < offered {
            self.stats
                .dropped
                .fetch_add((offered - pushed) as u64, Ordering::Relaxed);
        }
        pushed
    }

    pub fn free_bytes(&self) -> usize {
        self.inner.vacant_len()
    }

    pub fn stats(&self) -> Arc<RingStats> {
        Arc::clone(&self.stats)
    }
}

/// Read half. Owned by the audio-drain context.
pub struct AudioConsumer {
    inner: HeapCons<u8>,
    stats: Arc<RingStats>,
    capacity: usize,
}

impl AudioConsumer {
    /// Read up to `buf.len()` bytes, rounded down to whole frames.
    ///
    /// Returns fewer bytes (possibly zero) when starved.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let want = buf.len() - buf.len() % FRAME;
        let take = want.min(self.available_bytes());
        if take == 0 {
            return 0;
        }

        let read = self.inner.pop_slice(&mut buf[..take]);
        self.stats.read.fetch_add(read as u64, Ordering::Relaxed);
        read
    }

    /// Bytes queued, always a multiple of one frame.
    pub fn available_bytes(&self) -> usize {
        let occupied = self.inner.occupied_len();
        occupied - occupied % FRAME
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> Arc<RingStats> {
        Arc::clone(&self.stats)
    }
}
