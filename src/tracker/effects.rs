//! Per-tick channel effect processor
//!
//! Runs once per channel per tick, after the instrument interpreter, and
//! turns the channel's musical state into that voice's oscillator
//! parameters: portamento toward the target note, vibrato from the sine
//! table, pitch bend accumulation, and the volume and duty ramps.

use crate::synth::oscillator::{OscParams, DUTY_MAX, DUTY_MIN};
use crate::synth::tables::{note_frequency, SINE_TABLE};

use super::channel::ChannelState;

impl ChannelState {
    /// Compute this tick's oscillator parameters for the voice.
    ///
    /// Frequency arithmetic wraps at the 16-bit phase width on purpose;
    /// an extreme bend runs off the end of the frequency range exactly
    /// like the phase accumulator it feeds.
    pub fn apply_effects(&mut self, osc: &mut OscParams) {
        let target = note_frequency(self.synth_note);

        let slur = if self.inertia != 0 {
            let mut diff = target as i16 - self.slur as i16;
            if diff > self.inertia {
                diff = self.inertia;
            } else if diff < -self.inertia {
                diff = -self.inertia;
            }
            self.slur = (self.slur as i16 + diff) as u16;
            self.slur
        } else {
            target
        };

        let vibrato =
            (self.vibrato_depth as i16 * SINE_TABLE[(self.vibrato_phase & 63) as usize] as i16)
                >> 2;
        osc.freq = slur
            .wrapping_add(self.bend as u16)
            .wrapping_add(vibrato as u16);
        self.bend = self.bend.wrapping_add(self.bend_delta as i16);

        let volume = (osc.volume as i16 + self.volume_delta as i16).clamp(0, 255);
        osc.volume = volume as u8;

        let mut duty = osc.duty.wrapping_add(self.duty_delta as u16);
        if duty > DUTY_MAX {
            duty = DUTY_MIN;
        }
        if duty < DUTY_MIN {
            duty = DUTY_MAX;
        }
        osc.duty = duty;

        self.vibrato_phase = self.vibrato_phase.wrapping_add(self.vibrato_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::tables::FREQ_TABLE;

    fn channel_at_note(note: u8) -> ChannelState {
        ChannelState {
            synth_note: note,
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_inertia_snaps_to_target() {
        let mut ch = channel_at_note(12);
        let mut osc = OscParams::default();
        ch.apply_effects(&mut osc);
        assert_eq!(osc.freq, FREQ_TABLE[12]);
    }

    #[test]
    fn test_portamento_converges_monotonically() {
        let mut ch = channel_at_note(40);
        ch.inertia = 16;
        ch.slur = FREQ_TABLE[20];
        let mut osc = OscParams::default();

        let target = FREQ_TABLE[40] as i32;
        let mut distance = (target - ch.slur as i32).abs();
        let bound = (distance / 16 + 2) as usize;
        let mut ticks = 0;
        while ch.slur != FREQ_TABLE[40] {
            ch.apply_effects(&mut osc);
            let next = (target - ch.slur as i32).abs();
            assert!(next < distance, "distance must shrink every tick");
            distance = next;
            ticks += 1;
            assert!(ticks <= bound, "convergence should take at most {bound} ticks");
        }
        assert_eq!(osc.freq, FREQ_TABLE[40]);
    }

    #[test]
    fn test_portamento_steps_are_bounded() {
        let mut ch = channel_at_note(50);
        ch.inertia = 8;
        ch.slur = 100;
        let mut osc = OscParams::default();
        let before = ch.slur;
        ch.apply_effects(&mut osc);
        assert_eq!(ch.slur, before + 8);
    }

    #[test]
    fn test_volume_clamps_at_both_ends() {
        let mut ch = channel_at_note(0);
        let mut osc = OscParams {
            volume: 250,
            ..Default::default()
        };
        ch.volume_delta = 10;
        for _ in 0..5 {
            ch.apply_effects(&mut osc);
        }
        assert_eq!(osc.volume, 255);

        ch.volume_delta = -100;
        for _ in 0..5 {
            ch.apply_effects(&mut osc);
        }
        assert_eq!(osc.volume, 0);
    }

    #[test]
    fn test_duty_sweep_wraps_instead_of_clamping() {
        let mut ch = channel_at_note(0);
        let mut osc = OscParams {
            duty: DUTY_MAX - 0x40,
            ..Default::default()
        };
        ch.duty_delta = 0x100;
        ch.apply_effects(&mut osc);
        assert_eq!(osc.duty, DUTY_MIN, "overflowing the top wraps to the bottom");

        osc.duty = DUTY_MIN + 0x40;
        ch.duty_delta = -0x100;
        ch.apply_effects(&mut osc);
        assert_eq!(osc.duty, DUTY_MAX, "underflowing the bottom wraps to the top");
    }

    #[test]
    fn test_duty_stays_inside_sweep_band() {
        let mut ch = channel_at_note(0);
        let mut osc = OscParams::default();
        ch.duty_delta = 0x2b0;
        for _ in 0..500 {
            ch.apply_effects(&mut osc);
            assert!(osc.duty >= DUTY_MIN && osc.duty <= DUTY_MAX);
        }
    }

    #[test]
    fn test_bend_accumulates_each_tick() {
        let mut ch = channel_at_note(12);
        ch.bend_delta = 3;
        let mut osc = OscParams::default();
        ch.apply_effects(&mut osc); // bend applied before accumulation
        assert_eq!(osc.freq, FREQ_TABLE[12]);
        ch.apply_effects(&mut osc);
        assert_eq!(osc.freq, FREQ_TABLE[12].wrapping_add(3));
        ch.apply_effects(&mut osc);
        assert_eq!(osc.freq, FREQ_TABLE[12].wrapping_add(6));
    }

    #[test]
    fn test_vibrato_modulates_and_advances_phase() {
        let mut ch = channel_at_note(24);
        ch.vibrato_depth = 8;
        ch.vibrato_rate = 16;
        let mut osc = OscParams::default();

        ch.apply_effects(&mut osc);
        assert_eq!(osc.freq, FREQ_TABLE[24], "phase 0 reads sine zero");
        assert_eq!(ch.vibrato_phase, 16);

        ch.apply_effects(&mut osc);
        let expected = FREQ_TABLE[24].wrapping_add(((8 * SINE_TABLE[16] as i16) >> 2) as u16);
        assert_eq!(osc.freq, expected, "phase 16 reads the sine peak");
    }
}
