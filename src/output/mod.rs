//! Circular output frame buffer
//!
//! The synthesizer writes stereo frames (one sample duplicated across
//! both channels) into a fixed-size circular buffer; an external
//! transport drains it. Only producer-side bookkeeping lives here: the
//! write position advances monotonically and wraps over old frames
//! without signaling. Consumers track their own monotonic read position
//! and are skipped forward when they fall a full buffer behind.
//!
//! Synchronization follows the producer/consumer split used elsewhere:
//! a `parking_lot` mutex guards the storage, atomic positions give the
//! reader visibility without holding the lock.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{EngineError, Result};

/// Default buffer capacity in stereo frames
pub const DEFAULT_BUFFER_FRAMES: usize = 256;

/// Sample value representing silence (unsigned midpoint)
pub const SILENCE: u16 = 0x8000;

/// Fixed-size circular buffer of interleaved stereo samples
#[derive(Debug)]
pub struct FrameBuffer {
    /// Interleaved storage, length is a power of two
    samples: Mutex<Vec<u16>>,
    /// Monotonic count of samples written; index = position & mask
    write_pos: AtomicUsize,
    capacity: usize,
    mask: usize,
}

impl FrameBuffer {
    /// Create a buffer of at least `frames` stereo frames, rounded up to
    /// a power of two
    pub fn new(frames: usize) -> Result<Self> {
        if frames == 0 {
            return Err(EngineError::Config(
                "frame buffer capacity must be greater than 0".into(),
            ));
        }
        let capacity = (frames * 2).next_power_of_two();
        Ok(FrameBuffer {
            samples: Mutex::new(vec![SILENCE; capacity]),
            write_pos: AtomicUsize::new(0),
            capacity,
            mask: capacity - 1,
        })
    }

    /// Buffer with the engine's default capacity
    pub fn with_default_capacity() -> Self {
        // Power-of-two default cannot fail validation
        match Self::new(DEFAULT_BUFFER_FRAMES) {
            Ok(buffer) => buffer,
            Err(_) => unreachable!("default capacity is nonzero"),
        }
    }

    /// Capacity in interleaved samples
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Overwrite the whole buffer with silence
    pub fn fill_silence(&self) {
        self.samples.lock().fill(SILENCE);
    }

    /// Write one frame: the sample is duplicated across both stereo
    /// channels. Wraps over the oldest frame when the buffer is full.
    pub fn write_frame(&self, sample: u16) {
        let pos = self.write_pos.load(Ordering::Relaxed);
        {
            let mut samples = self.samples.lock();
            samples[pos & self.mask] = sample;
            samples[(pos + 1) & self.mask] = sample;
        }
        self.write_pos.store(pos + 2, Ordering::Release);
    }

    /// Monotonic count of samples written so far
    pub fn write_position(&self) -> usize {
        self.write_pos.load(Ordering::Acquire)
    }

    /// Copy samples starting at the consumer's monotonic position into
    /// `dest`. Returns `(samples copied, next read position)`; the
    /// position jumps forward when the producer lapped the consumer.
    pub fn read_from(&self, pos: usize, dest: &mut [u16]) -> (usize, usize) {
        let write_pos = self.write_pos.load(Ordering::Acquire);
        let mut read_pos = pos;

        // Lapped: only the last `capacity` samples still exist
        if write_pos - read_pos > self.capacity {
            read_pos = write_pos - self.capacity;
        }

        let available = write_pos - read_pos;
        let to_read = dest.len().min(available);
        if to_read == 0 {
            return (0, read_pos);
        }

        let samples = self.samples.lock();
        let start = read_pos & self.mask;
        if start + to_read <= self.capacity {
            dest[..to_read].copy_from_slice(&samples[start..start + to_read]);
        } else {
            let first = self.capacity - start;
            dest[..first].copy_from_slice(&samples[start..]);
            dest[first..to_read].copy_from_slice(&samples[..to_read - first]);
        }

        (to_read, read_pos + to_read)
    }
}
