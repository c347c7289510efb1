//! Four-voice chiptune synthesis engine
//!
//! Decodes a bit-packed song format (songs, tracks, instruments) and
//! synthesizes four-voice audio sample by sample, the way a
//! microcontroller feeds a DAC: a low-rate sequencer tick drives a small
//! instrument bytecode interpreter and per-channel effects, while a
//! hard-real-time sample pump turns the resulting oscillator parameters
//! into a continuous stream of stereo frames.
//!
//! # Architecture
//! - `song` — packed blob container, bit-level unpacker, resource table
//! - `tracker` — tick domain: sequencer, instrument interpreter, effects
//! - `synth` — sample domain: oscillators, noise generator, mixing
//! - `output` — circular frame buffer drained by the transport
//! - `engine` — the context object tying both domains together
//! - `streaming` (feature `streaming`) — rodio-backed output device
//!
//! # Crate feature flags
//! - `streaming` (opt-in): real-time audio output (enables optional
//!   `rodio` dep)
//!
//! # Quick start
//! ```no_run
//! use quadtune::Engine;
//! let blob = std::fs::read("song.bin").unwrap();
//! let mut engine = Engine::new(blob).unwrap();
//! engine.advance_sequencer(0);
//! let frame = engine.produce_sample();
//! assert_ne!(frame, 0); // biased unsigned samples, 0x8000 = silence
//! ```
//!
//! # Timing domains
//! The two pump methods belong to different timing domains and must not
//! be conflated: `advance_sequencer` is polled from a non-real-time
//! context and rate-limits itself to the 50 Hz tick, while
//! `produce_sample` is called exactly once per output frame from the
//! audio callback and never blocks. [`Engine::split`] separates the two
//! halves for multi-threaded use.

#![warn(missing_docs)]

pub mod engine;
pub mod output;
pub mod song;
#[cfg(feature = "streaming")]
pub mod streaming;
pub mod synth;
pub mod tracker;

/// Error types for engine operations
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// Song blob failed load-time validation
    #[error("Invalid song data: {0}")]
    InvalidSong(String),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for EngineError {
    fn from(msg: String) -> Self {
        EngineError::Other(msg)
    }
}

impl From<&str> for EngineError {
    fn from(msg: &str) -> Self {
        EngineError::Other(msg.to_string())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

// Public API exports
pub use engine::{Engine, SequencerPump, SynthPump, TICK_INTERVAL_MS};
pub use output::{FrameBuffer, SILENCE};
pub use song::SongData;
pub use synth::oscillator::{OscParams, OscillatorBank, Waveform};
pub use synth::{NoiseLfsr, Synth};
pub use tracker::opcode::Opcode;
pub use tracker::Tracker;

#[cfg(feature = "streaming")]
pub use streaming::{AudioDevice, StreamConfig, DEFAULT_SAMPLE_RATE};
