//! Oscillator parameters shared between the two timing domains
//!
//! The tick-rate domain computes one [`OscParams`] per voice per tick and
//! publishes all four into an [`OscillatorBank`]. The sample-rate domain
//! copies them out with a non-blocking `try_lock`, keeping the last good
//! copy when the tick side happens to hold the lock. Phase accumulators
//! live on the sample side, so the published set is parameters only.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use parking_lot::Mutex;

use crate::song::CHANNELS;

/// Duty sweep lower bound; sweeping below wraps to the upper bound
pub const DUTY_MIN: u16 = 0x2000;

/// Duty sweep upper bound; sweeping above wraps to the lower bound
pub const DUTY_MAX: u16 = 0xe000;

/// Waveform selector for one voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromPrimitive)]
pub enum Waveform {
    /// Linear ramp up then down across the phase period
    #[default]
    Triangle = 0,
    /// Linear ramp with wraparound
    Sawtooth,
    /// Two-level output switched by the duty threshold
    Pulse,
    /// Output from the shared noise generator
    Noise,
}

impl Waveform {
    /// Decode a raw waveform id; out-of-range ids fall back to triangle
    /// (well-formed songs only ever store 0-3)
    pub fn decode(raw: u8) -> Waveform {
        Waveform::from_u8(raw).unwrap_or_default()
    }
}

/// Instantaneous synthesis parameters for one voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OscParams {
    /// Phase increment per output sample
    pub freq: u16,
    /// Pulse duty threshold
    pub duty: u16,
    /// Waveform selector
    pub waveform: Waveform,
    /// Volume, 0-255
    pub volume: u8,
}

impl Default for OscParams {
    fn default() -> Self {
        OscParams {
            freq: 0,
            duty: 0x8000,
            waveform: Waveform::Triangle,
            volume: 0,
        }
    }
}

/// Single-writer/single-reader hand-off point for oscillator parameters.
///
/// The writer (tick domain) takes the lock briefly once per tick; the
/// reader (sample domain) never blocks on it.
#[derive(Debug, Default)]
pub struct OscillatorBank {
    params: Mutex<[OscParams; CHANNELS]>,
}

impl OscillatorBank {
    /// Create a bank holding silent defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish this tick's parameters (tick-rate side)
    pub fn publish(&self, params: &[OscParams; CHANNELS]) {
        *self.params.lock() = *params;
    }

    /// Copy the current parameters into `dest` without blocking
    /// (sample-rate side). Returns false if the writer held the lock,
    /// in which case `dest` is left untouched.
    pub fn try_copy_into(&self, dest: &mut [OscParams; CHANNELS]) -> bool {
        match self.params.try_lock() {
            Some(guard) => {
                *dest = *guard;
                true
            }
            None => false,
        }
    }

    /// Snapshot the current parameters, blocking briefly if needed.
    /// Intended for tests and metering, not the sample path.
    pub fn snapshot(&self) -> [OscParams; CHANNELS] {
        *self.params.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveform_decode() {
        assert_eq!(Waveform::decode(0), Waveform::Triangle);
        assert_eq!(Waveform::decode(1), Waveform::Sawtooth);
        assert_eq!(Waveform::decode(2), Waveform::Pulse);
        assert_eq!(Waveform::decode(3), Waveform::Noise);
        assert_eq!(Waveform::decode(17), Waveform::Triangle);
    }

    #[test]
    fn test_bank_round_trip() {
        let bank = OscillatorBank::new();
        let mut published = [OscParams::default(); CHANNELS];
        published[2].freq = 0x0217;
        published[2].volume = 200;
        published[2].waveform = Waveform::Pulse;
        bank.publish(&published);

        let mut dest = [OscParams::default(); CHANNELS];
        assert!(bank.try_copy_into(&mut dest));
        assert_eq!(dest, published);
    }

    #[test]
    fn test_reader_keeps_cache_under_contention() {
        let bank = OscillatorBank::new();
        let mut dest = [OscParams::default(); CHANNELS];
        dest[0].volume = 42;

        let guard = bank.params.lock();
        assert!(!bank.try_copy_into(&mut dest));
        drop(guard);
        assert_eq!(dest[0].volume, 42);
    }
}
