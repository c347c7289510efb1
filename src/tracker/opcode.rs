//! Instrument program opcodes
//!
//! An instrument program is a sequence of `(opcode, parameter)` byte
//! pairs. The raw opcode id indexes the fixed symbol order
//! `0 d f i j l m t v w ~ + =` used by the song packer; track-line
//! commands use the same ids, so one executor serves both paths.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// One instrument program opcode, in packer symbol order
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum Opcode {
    /// `0` — deactivate the instrument, ending the program
    Stop = 0,
    /// `d` — set oscillator duty threshold to parameter × 256
    Duty,
    /// `f` — set per-tick volume delta (signed parameter)
    VolumeRamp,
    /// `i` — set portamento inertia to parameter × 2
    Inertia,
    /// `j` — jump: set the program counter to the parameter
    Jump,
    /// `l` — set per-tick pitch-bend delta (signed parameter)
    PitchRamp,
    /// `m` — set per-tick duty delta to parameter × 64
    DutyRamp,
    /// `t` — hold for parameter ticks before resuming
    Wait,
    /// `v` — set oscillator volume (0-255)
    Volume,
    /// `w` — set oscillator waveform (0=tri, 1=saw, 2=pulse, 3=noise)
    Waveform,
    /// `~` — vibrato: depth in the high nibble, rate in the low nibble
    Vibrato,
    /// `+` — set synthesized note relative to the track note minus 48
    NoteRelative,
    /// `=` — set synthesized note absolutely
    NoteAbsolute,
}

impl Opcode {
    /// Decode a raw opcode id. Ids outside the table decode to `None`
    /// and are ignored by the executor.
    pub fn decode(raw: u8) -> Option<Opcode> {
        Opcode::from_u8(raw)
    }
}
