//! Per-voice channel state
//!
//! One `ChannelState` exists per voice. The sequencer writes note and
//! instrument triggers into it, the instrument interpreter and effect
//! processor mutate it every tick, and the results land in that voice's
//! [`OscParams`](crate::synth::oscillator::OscParams). Nothing here is
//! touched by the sample-rate domain.

use crate::song::unpacker::BitCursor;

/// Musical state for one of the four voices
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelState {
    /// Cursor into this channel's current track data
    pub track_cursor: BitCursor,
    /// Track number assigned for the current song step (0 = silent)
    pub track_num: u8,
    /// Semitone transpose applied to incoming track notes
    pub transpose: i8,
    /// Last note read from the track, transpose applied
    pub track_note: u8,
    /// Most recently triggered instrument id, reused by bare notes
    pub last_instrument: u8,
    /// Active instrument id (0 = program inactive)
    pub instrument: u8,
    /// Instrument program counter
    pub program_counter: u16,
    /// Ticks left before the program resumes
    pub wait: u8,
    /// Note the synthesizer is asked to sound (frequency table index)
    pub synth_note: u8,
    /// Pitch bend accumulator, added to the slur frequency each tick
    pub bend: i16,
    /// Per-tick bend increment
    pub bend_delta: i8,
    /// Per-tick volume increment
    pub volume_delta: i8,
    /// Per-tick duty increment
    pub duty_delta: i16,
    /// Vibrato depth (0-15)
    pub vibrato_depth: u8,
    /// Vibrato phase advance per tick
    pub vibrato_rate: u8,
    /// Vibrato phase, indexes the sine table modulo 64
    pub vibrato_phase: u8,
    /// Portamento inertia: max slur movement per tick (0 = snap)
    pub inertia: i16,
    /// Current slurred (interpolated) frequency
    pub slur: u16,
}

impl ChannelState {
    /// Restart an instrument program on this channel, clearing every
    /// per-note effect accumulator
    pub fn trigger_instrument(&mut self, id: u8) {
        self.last_instrument = id;
        self.instrument = id;
        self.program_counter = 0;
        self.wait = 0;
        self.bend = 0;
        self.bend_delta = 0;
        self.volume_delta = 0;
        self.duty_delta = 0;
        self.vibrato_depth = 0;
    }

    /// Record a note read from the track. The transposed note becomes
    /// both the track note (the `+` opcode's reference) and the sounding
    /// note, so instruments without a `+`/`=` opcode follow the track.
    pub fn set_note(&mut self, note: u8) {
        self.track_note = note.wrapping_add(self.transpose as u8);
        self.synth_note = self.track_note;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_clears_effect_accumulators() {
        let mut ch = ChannelState {
            bend: 100,
            bend_delta: 3,
            volume_delta: -2,
            duty_delta: 64,
            vibrato_depth: 7,
            program_counter: 9,
            wait: 5,
            ..Default::default()
        };
        ch.trigger_instrument(3);
        assert_eq!(ch.instrument, 3);
        assert_eq!(ch.last_instrument, 3);
        assert_eq!(ch.program_counter, 0);
        assert_eq!(ch.wait, 0);
        assert_eq!(ch.bend, 0);
        assert_eq!(ch.bend_delta, 0);
        assert_eq!(ch.volume_delta, 0);
        assert_eq!(ch.duty_delta, 0);
        assert_eq!(ch.vibrato_depth, 0);
    }

    #[test]
    fn test_set_note_applies_transpose() {
        let mut ch = ChannelState {
            transpose: -2,
            ..Default::default()
        };
        ch.set_note(40);
        assert_eq!(ch.track_note, 38);
        assert_eq!(ch.synth_note, 38);
    }
}
