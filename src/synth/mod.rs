//! Sample-rate synthesis domain
//!
//! The [`Synth`] runs inside the hard-real-time audio callback. Each
//! output frame it advances the shared noise generator, shapes and mixes
//! the four voices from their current oscillator parameters, and biases
//! the signed mix to the unsigned DAC midpoint. The per-sample work is
//! bounded and allocation-free; the only cross-domain touch is a
//! non-blocking parameter copy from the [`OscillatorBank`].

pub mod oscillator;
pub mod tables;

use std::sync::Arc;

use crate::song::CHANNELS;
use oscillator::{OscParams, OscillatorBank, Waveform};

/// Bias added to the signed mix to produce unsigned 16-bit samples
pub const OUTPUT_BIAS: i32 = 0x8000;

/// 32-bit linear-feedback shift register shared by all noise voices.
///
/// Feedback taps at bits 31, 24, 9 and 6 are XORed into a new bit
/// shifted in at the low end, once per output sample regardless of how
/// many voices read it.
#[derive(Debug, Clone, Copy)]
pub struct NoiseLfsr {
    seed: u32,
}

impl NoiseLfsr {
    /// Create a generator from a seed (the engine uses 1)
    pub fn new(seed: u32) -> Self {
        NoiseLfsr { seed }
    }

    /// Advance the register by one step
    pub fn clock(&mut self) {
        let mut bit = 0u32;
        bit ^= (self.seed >> 31) & 1;
        bit ^= (self.seed >> 24) & 1;
        bit ^= (self.seed >> 9) & 1;
        bit ^= (self.seed >> 6) & 1;
        self.seed = (self.seed << 1) | bit;
    }

    /// Current register value
    pub fn value(&self) -> u32 {
        self.seed
    }
}

impl Default for NoiseLfsr {
    fn default() -> Self {
        NoiseLfsr::new(1)
    }
}

/// Four-voice waveform synthesizer (sample-rate side)
#[derive(Debug)]
pub struct Synth {
    bank: Arc<OscillatorBank>,
    /// Cached copy of the published parameters, refreshed when the bank
    /// lock is free
    params: [OscParams; CHANNELS],
    /// Per-voice phase accumulators; wrapping at 16 bits defines the
    /// waveform period
    phase: [u16; CHANNELS],
    noise: NoiseLfsr,
    last_sample: u16,
}

impl Synth {
    /// Create a synthesizer reading parameters from `bank`
    pub fn new(bank: Arc<OscillatorBank>) -> Self {
        Synth {
            bank,
            params: [OscParams::default(); CHANNELS],
            phase: [0; CHANNELS],
            noise: NoiseLfsr::default(),
            last_sample: OUTPUT_BIAS as u16,
        }
    }

    /// Produce one output sample: refresh parameters without blocking,
    /// advance the noise generator, shape and mix all four voices, and
    /// bias the result to the unsigned midpoint.
    pub fn render_sample(&mut self) -> u16 {
        self.bank.try_copy_into(&mut self.params);
        self.noise.clock();

        let mut acc: i16 = 0;
        for (params, phase) in self.params.iter().zip(self.phase.iter_mut()) {
            let value: i8 = match params.waveform {
                Waveform::Triangle => {
                    if *phase < 0x8000 {
                        -32 + (*phase >> 9) as i8
                    } else {
                        31 - ((*phase - 0x8000) >> 9) as i8
                    }
                }
                Waveform::Sawtooth => -32 + (*phase >> 10) as i8,
                Waveform::Pulse => {
                    if *phase > params.duty {
                        -32
                    } else {
                        31
                    }
                }
                Waveform::Noise => (self.noise.value() & 63) as i8 - 32,
            };
            *phase = phase.wrapping_add(params.freq);

            // Worst case is 4 * 32 * 255, which stays inside i16
            acc += value as i16 * params.volume as i16;
        }

        let sample = (acc as i32 + OUTPUT_BIAS) as u16;
        self.last_sample = sample;
        sample
    }

    /// The most recently produced sample (midpoint before any rendering)
    pub fn last_sample(&self) -> u16 {
        self.last_sample
    }

    /// Current phase accumulator of a voice, for tests and scopes
    pub fn phase(&self, voice: usize) -> u16 {
        self.phase[voice]
    }
}
