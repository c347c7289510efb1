//! Real-time audio output
//!
//! Stands in for the DMA/codec transport on real hardware: an
//! [`AudioDevice`] drains the engine's [`FrameBuffer`] through a rodio
//! output stream. The device owns the read-side position, as the
//! transport contract requires; when it outruns the producer it emits
//! silence rather than blocking.

use std::sync::Arc;
use std::time::Duration;

use rodio::{OutputStream, Sink, Source};

use crate::output::{FrameBuffer, SILENCE};
use crate::{EngineError, Result};

/// Native sample rate of the synthesis engine
pub const DEFAULT_SAMPLE_RATE: u32 = 8_000;

/// Output stream configuration
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channel count (the engine always produces 2)
    pub channels: u16,
}

impl StreamConfig {
    /// Configuration matching the engine's native output
    pub fn new() -> Self {
        StreamConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 2,
        }
    }

    /// Playback latency of `frames` buffered stereo frames at this rate
    pub fn latency_ms(&self, frames: usize) -> f32 {
        frames as f32 * 1000.0 / self.sample_rate as f32
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Audio output device draining a frame buffer
pub struct AudioDevice {
    /// Keeps the OS stream alive for the lifetime of the device
    _stream: OutputStream,
    sink: Sink,
}

impl AudioDevice {
    /// Open the default output device and start draining `buffer`
    pub fn new(config: StreamConfig, buffer: Arc<FrameBuffer>) -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| EngineError::AudioDevice(format!("failed to open output: {e}")))?;
        let sink = Sink::try_new(&handle)
            .map_err(|e| EngineError::AudioDevice(format!("failed to create sink: {e}")))?;

        sink.append(BufferSource::new(config, buffer));
        sink.play();

        Ok(AudioDevice {
            _stream: stream,
            sink,
        })
    }

    /// Pause the output stream
    pub fn pause(&self) {
        self.sink.pause();
    }

    /// Resume the output stream
    pub fn resume(&self) {
        self.sink.play();
    }
}

/// Chunk size for buffer reads, in interleaved samples
const CHUNK_SAMPLES: usize = 128;

/// Infinite rodio source pulling samples out of the frame buffer
struct BufferSource {
    config: StreamConfig,
    buffer: Arc<FrameBuffer>,
    /// Consumer-side monotonic read position
    read_pos: usize,
    chunk: [u16; CHUNK_SAMPLES],
    chunk_len: usize,
    chunk_idx: usize,
}

impl BufferSource {
    fn new(config: StreamConfig, buffer: Arc<FrameBuffer>) -> Self {
        BufferSource {
            config,
            buffer,
            read_pos: 0,
            chunk: [SILENCE; CHUNK_SAMPLES],
            chunk_len: 0,
            chunk_idx: 0,
        }
    }
}

impl Iterator for BufferSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.chunk_idx >= self.chunk_len {
            let (read, next_pos) = self.buffer.read_from(self.read_pos, &mut self.chunk);
            self.read_pos = next_pos;
            self.chunk_len = read;
            self.chunk_idx = 0;
            if read == 0 {
                // Underrun: the producer has not caught up yet
                return Some(0.0);
            }
        }

        let sample = self.chunk[self.chunk_idx];
        self.chunk_idx += 1;
        Some((sample as f32 - 32768.0) / 32768.0)
    }
}

impl Source for BufferSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.config.channels
    }

    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_latency() {
        let config = StreamConfig::new();
        assert_relative_eq!(config.latency_ms(256), 32.0);
        assert_relative_eq!(config.latency_ms(8_000), 1000.0);
    }

    #[test]
    fn test_source_converts_and_underruns_to_silence() {
        let buffer = Arc::new(FrameBuffer::new(8).unwrap());
        buffer.write_frame(0x8000);
        buffer.write_frame(0xc000);
        let mut source = BufferSource::new(StreamConfig::new(), Arc::clone(&buffer));

        assert_relative_eq!(source.next().unwrap(), 0.0);
        assert_relative_eq!(source.next().unwrap(), 0.0);
        assert_relative_eq!(source.next().unwrap(), 0.5);
        assert_relative_eq!(source.next().unwrap(), 0.5);
        // Buffer drained: silence, not None
        assert_relative_eq!(source.next().unwrap(), 0.0);
    }
}
