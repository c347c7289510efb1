//! Test-only song blob builder
//!
//! Packs songs in the engine's wire format: a 13-bit resource table,
//! LSB-first bit-packed song and track data, and raw byte-pair
//! instrument programs. Only what the integration tests need; this is
//! not a general authoring tool.

#![allow(dead_code)]

/// Opcode ids in packer symbol order (`0 d f i j l m t v w ~ + =`)
pub const OP_STOP: u8 = 0;
pub const OP_DUTY: u8 = 1;
pub const OP_VOLUME_RAMP: u8 = 2;
pub const OP_INERTIA: u8 = 3;
pub const OP_JUMP: u8 = 4;
pub const OP_PITCH_RAMP: u8 = 5;
pub const OP_DUTY_RAMP: u8 = 6;
pub const OP_WAIT: u8 = 7;
pub const OP_VOLUME: u8 = 8;
pub const OP_WAVEFORM: u8 = 9;
pub const OP_VIBRATO: u8 = 10;
pub const OP_NOTE_REL: u8 = 11;
pub const OP_NOTE_ABS: u8 = 12;

const RESOURCE_COUNT: usize = 16 + 0x92;
const TRACK_LINES: usize = 32;

/// Little-endian bit packer matching the engine's unpacker
#[derive(Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bitpos: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: u16, width: u8) {
        for i in 0..width {
            if self.bitpos % 8 == 0 {
                self.bytes.push(0);
            }
            if value & (1 << i) != 0 {
                *self.bytes.last_mut().unwrap() |= 1 << (self.bitpos % 8);
            }
            self.bitpos += 1;
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Packs one track's 32 lines
pub struct TrackBuilder {
    writer: BitWriter,
    lines: usize,
}

impl TrackBuilder {
    pub fn new() -> Self {
        TrackBuilder {
            writer: BitWriter::new(),
            lines: 0,
        }
    }

    /// Add a line; zero fields are omitted from the stream
    pub fn line(mut self, note: u8, instrument: u8, command: u8, param: u8) -> Self {
        let mut fields = 0u16;
        if note != 0 {
            fields |= 1;
        }
        if instrument != 0 {
            fields |= 2;
        }
        if command != 0 {
            fields |= 4;
        }
        self.writer.push(fields, 3);
        if note != 0 {
            self.writer.push(note as u16, 7);
        }
        if instrument != 0 {
            self.writer.push(instrument as u16, 4);
        }
        if command != 0 {
            self.writer.push(command as u16, 4);
            self.writer.push(param as u16, 8);
        }
        self.lines += 1;
        self
    }

    /// Pad out to 32 lines with empty field masks
    fn finish(mut self) -> Vec<u8> {
        while self.lines < TRACK_LINES {
            self.writer.push(0, 3);
            self.lines += 1;
        }
        self.writer.into_bytes()
    }
}

/// Assembles a complete packed song blob
#[derive(Default)]
pub struct SongBuilder {
    song: BitWriter,
    instruments: Vec<(u8, Vec<u8>)>,
    tracks: Vec<(u8, Vec<u8>)>,
}

impl SongBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a song step assigning one track per channel, no transpose
    pub fn step(&mut self, tracks: [u8; 4]) -> &mut Self {
        self.step_with_transpose(tracks, [None; 4])
    }

    /// Append a song step with optional per-channel transpose
    pub fn step_with_transpose(
        &mut self,
        tracks: [u8; 4],
        transpose: [Option<i8>; 4],
    ) -> &mut Self {
        for ch in 0..4 {
            match transpose[ch] {
                Some(t) => {
                    self.song.push(1, 1);
                    self.song.push(tracks[ch] as u16, 6);
                    self.song.push((t as u8 & 0x0f) as u16, 4);
                }
                None => {
                    self.song.push(0, 1);
                    self.song.push(tracks[ch] as u16, 6);
                }
            }
        }
        self
    }

    /// Define an instrument program as raw `(opcode, parameter)` pairs
    pub fn instrument(&mut self, id: u8, pairs: &[(u8, u8)]) -> &mut Self {
        let bytes = pairs.iter().flat_map(|&(op, p)| [op, p]).collect();
        self.instruments.push((id, bytes));
        self
    }

    /// Define a track's line data
    pub fn track(&mut self, number: u8, track: TrackBuilder) -> &mut Self {
        self.tracks.push((number, track.finish()));
        self
    }

    /// Produce the final blob: resource table, then song data, then
    /// instruments, then tracks
    pub fn build(&self) -> Vec<u8> {
        let table_len = (RESOURCE_COUNT * 13).div_ceil(8);
        let song_bytes = self.song.bytes.clone();

        let mut resources = [0u16; RESOURCE_COUNT];
        let mut offset = table_len;
        resources[0] = offset as u16;
        offset += song_bytes.len();

        let mut instrument_data = Vec::new();
        for (id, bytes) in &self.instruments {
            resources[*id as usize] = offset as u16;
            offset += bytes.len();
            instrument_data.extend_from_slice(bytes);
        }

        let mut track_data = Vec::new();
        for (number, bytes) in &self.tracks {
            resources[16 + *number as usize - 1] = offset as u16;
            offset += bytes.len();
            track_data.extend_from_slice(bytes);
        }

        let mut table = BitWriter::new();
        for r in resources {
            table.push(r, 13);
        }
        let mut blob = table.into_bytes();
        assert_eq!(blob.len(), table_len);

        blob.extend_from_slice(&song_bytes);
        blob.extend_from_slice(&instrument_data);
        blob.extend_from_slice(&track_data);
        blob
    }
}
