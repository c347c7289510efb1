//! Tick-rate playback domain
//!
//! The [`Tracker`] advances musical time at a fixed logical tick rate.
//! Each tick it steps the song/track sequencer, runs every channel's
//! instrument program, applies the per-tick effects, and leaves the
//! resulting oscillator parameters in its working set for publication to
//! the sample-rate domain. Nothing here runs on the audio callback.

pub mod channel;
pub mod effects;
pub mod opcode;

use bitflags::bitflags;

use crate::song::unpacker::BitCursor;
use crate::song::{SongData, CHANNELS, SONGLEN, TRACKLEN};
use crate::synth::oscillator::{OscParams, Waveform};

use channel::ChannelState;
use opcode::Opcode;

/// Ticks a track line is held before the next one is read
const LINE_TICKS: u8 = 4;

/// Number of independent indicator lines
pub const INDICATOR_LINES: usize = 2;

bitflags! {
    /// Field-presence mask at the head of each packed track line
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct LineFields: u8 {
        /// A 7-bit note follows
        const NOTE = 0x01;
        /// A 4-bit instrument id follows
        const INSTRUMENT = 0x02;
        /// A 4-bit command id and 8-bit parameter follow
        const COMMAND = 0x04;
    }
}

/// Sequencer, instrument interpreter, and effect processor for all four
/// voices. Owns the song data and every piece of tick-domain state.
#[derive(Debug)]
pub struct Tracker {
    song: SongData,
    /// Cursor into the song index (per-step track assignments)
    song_cursor: BitCursor,
    channels: [ChannelState; CHANNELS],
    /// Working oscillator parameters, published after each tick
    osc: [OscParams; CHANNELS],
    /// Ticks left on the current track line
    line_wait: u8,
    /// Position within the current tracks, wraps at `TRACKLEN`
    line_pos: u8,
    /// Song step counter; the transport stops at `SONGLEN`
    song_pos: u8,
    playing: bool,
    /// Pending pulse ticks for the two indicator lines
    indicators: [u8; INDICATOR_LINES],
    tick_count: u64,
}

impl Tracker {
    /// Create a tracker over validated song data, transport playing
    pub fn new(song: SongData) -> Self {
        let song_cursor = BitCursor::new(song.song_offset() as usize);
        Tracker {
            song,
            song_cursor,
            channels: [ChannelState::default(); CHANNELS],
            osc: [OscParams::default(); CHANNELS],
            line_wait: 0,
            line_pos: 0,
            song_pos: 0,
            playing: true,
            indicators: [0; INDICATOR_LINES],
            tick_count: 0,
        }
    }

    /// Run one sequencer tick.
    ///
    /// Once the transport has stopped this is a no-op: channel and
    /// oscillator state stay frozen and the synthesizer keeps emitting
    /// whatever the final parameters produce.
    pub fn tick(&mut self) {
        if !self.playing {
            return;
        }
        self.tick_count += 1;

        if self.line_wait > 0 {
            self.line_wait -= 1;
        } else {
            self.line_wait = LINE_TICKS;

            if self.line_pos == 0 {
                if self.song_pos >= SONGLEN {
                    self.playing = false;
                    return;
                }
                self.read_song_step();
                self.song_pos += 1;
            }

            self.read_track_lines();
            self.line_pos = (self.line_pos + 1) & (TRACKLEN - 1);
        }

        for ch in 0..CHANNELS {
            self.run_program(ch);
            self.channels[ch].apply_effects(&mut self.osc[ch]);
        }
    }

    /// Read the next song step: one track assignment per channel, with
    /// an optional sign-extended semitone transpose. Track 0 leaves the
    /// channel silent for this step and its cursor untouched.
    fn read_song_step(&mut self) {
        let Self {
            song,
            song_cursor,
            channels,
            ..
        } = self;
        let blob = song.blob();

        for chan in channels.iter_mut() {
            let has_transpose = song_cursor.read_bit(blob) != 0;
            chan.track_num = song_cursor.read_field(blob, 6) as u8;
            chan.transpose = if has_transpose {
                let mut raw = song_cursor.read_field(blob, 4) as u8;
                if raw & 0x8 != 0 {
                    raw |= 0xf0;
                }
                raw as i8
            } else {
                0
            };
            if chan.track_num != 0 {
                chan.track_cursor = BitCursor::new(song.track_offset(chan.track_num) as usize);
            }
        }
    }

    /// Decode one track line per active channel and apply its note,
    /// instrument trigger, and immediate command.
    fn read_track_lines(&mut self) {
        for ch in 0..CHANNELS {
            if self.channels[ch].track_num == 0 {
                continue;
            }

            let (note, mut instrument, command, param) = {
                let Self { song, channels, .. } = self;
                let cursor = &mut channels[ch].track_cursor;
                let blob = song.blob();

                let fields = LineFields::from_bits_truncate(cursor.read_field(blob, 3) as u8);
                let note = if fields.contains(LineFields::NOTE) {
                    cursor.read_field(blob, 7) as u8
                } else {
                    0
                };
                let instrument = if fields.contains(LineFields::INSTRUMENT) {
                    cursor.read_field(blob, 4) as u8
                } else {
                    0
                };
                let (command, param) = if fields.contains(LineFields::COMMAND) {
                    (
                        cursor.read_field(blob, 4) as u8,
                        cursor.read_field(blob, 8) as u8,
                    )
                } else {
                    (0, 0)
                };
                (note, instrument, command, param)
            };

            if note != 0 {
                self.channels[ch].set_note(note);
                if instrument == 0 {
                    instrument = self.channels[ch].last_instrument;
                }
            }
            if instrument != 0 {
                self.pulse_indicators(instrument, self.channels[ch].track_num);
                self.channels[ch].trigger_instrument(instrument);
            }
            if command != 0 {
                self.exec(ch, command, param);
            }
        }
    }

    /// Request indicator pulses for the instruments wired to them by
    /// content convention (kick, snare, and the long accent)
    fn pulse_indicators(&mut self, instrument: u8, track_num: u8) {
        match instrument {
            1 => {
                self.indicators[0] = 5;
                if track_num == 4 {
                    self.indicators = [3, 3];
                }
            }
            2 => self.indicators[1] = 5,
            7 => self.indicators = [30, 30],
            _ => {}
        }
    }

    /// Run a channel's instrument program until it waits or stops.
    /// A pending wait is consumed one tick at a time, realizing the `t`
    /// opcode as a coarse sleep.
    fn run_program(&mut self, ch: usize) {
        while self.channels[ch].instrument != 0 && self.channels[ch].wait == 0 {
            let pc = self.channels[ch].program_counter;
            let (raw, param) = self.song.instrument_step(self.channels[ch].instrument, pc);
            self.channels[ch].program_counter = pc.wrapping_add(1);
            self.exec(ch, raw, param);
        }
        if self.channels[ch].wait > 0 {
            self.channels[ch].wait -= 1;
        }
    }

    /// Execute one opcode against a channel. Shared verbatim between
    /// program execution and the sequencer's immediate command path.
    /// Ids outside the opcode table are ignored.
    fn exec(&mut self, ch: usize, raw: u8, param: u8) {
        let Some(op) = Opcode::decode(raw) else {
            return;
        };
        let chan = &mut self.channels[ch];
        let osc = &mut self.osc[ch];

        match op {
            Opcode::Stop => chan.instrument = 0,
            Opcode::Duty => osc.duty = (param as u16) << 8,
            Opcode::VolumeRamp => chan.volume_delta = param as i8,
            Opcode::Inertia => chan.inertia = (param as i16) << 1,
            Opcode::Jump => chan.program_counter = param as u16,
            Opcode::PitchRamp => chan.bend_delta = param as i8,
            Opcode::DutyRamp => chan.duty_delta = (param as i16) << 6,
            Opcode::Wait => chan.wait = param,
            Opcode::Volume => osc.volume = param,
            Opcode::Waveform => osc.waveform = Waveform::decode(param),
            Opcode::Vibrato => {
                if chan.vibrato_depth != param >> 4 {
                    chan.vibrato_phase = 0;
                }
                chan.vibrato_depth = param >> 4;
                chan.vibrato_rate = param & 0x0f;
            }
            Opcode::NoteRelative => {
                chan.synth_note = param.wrapping_add(chan.track_note).wrapping_sub(48);
            }
            Opcode::NoteAbsolute => chan.synth_note = param,
        }
    }

    /// This tick's oscillator parameters
    pub fn osc_params(&self) -> &[OscParams; CHANNELS] {
        &self.osc
    }

    /// Per-voice channel state, for metering and tests
    pub fn channels(&self) -> &[ChannelState; CHANNELS] {
        &self.channels
    }

    /// Whether the transport is still playing
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Current song step
    pub fn song_position(&self) -> u8 {
        self.song_pos
    }

    /// Position within the current tracks
    pub fn line_position(&self) -> u8 {
        self.line_pos
    }

    /// Total sequencer ticks executed
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Observe an indicator line and consume one tick of its pulse.
    /// Returns the ticks that were remaining; an external GPIO driver
    /// drives its pin while this is nonzero.
    pub fn indicator_ticks_remaining(&mut self, line: usize) -> u8 {
        match self.indicators.get_mut(line) {
            Some(ticks) => {
                let remaining = *ticks;
                *ticks = ticks.saturating_sub(1);
                remaining
            }
            None => 0,
        }
    }
}
