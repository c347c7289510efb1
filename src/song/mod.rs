//! Packed song container and resource addressing
//!
//! A song is an opaque, read-only byte blob. It starts with a resource
//! table: `16 + MAXTRACK` offsets of 13 bits each, packed back to back.
//! Entry 0 locates the song index (per-step track assignments), entries
//! 1..16 locate instrument programs, and the remaining entries locate
//! track data. The table is decoded once at load time and validated so
//! that playback never has to bounds-check offsets again.

pub mod unpacker;

use crate::{EngineError, Result};
use unpacker::BitCursor;

/// Number of voices the engine synthesizes
pub const CHANNELS: usize = 4;

/// Lines per track
pub const TRACKLEN: u8 = 32;

/// Song length bound in song steps; reaching it stops the transport
pub const SONGLEN: u8 = 0x37;

/// Maximum number of track slots in the resource table
pub const MAXTRACK: usize = 0x92;

/// Total resource table entries: song index + 15 instruments + tracks
pub const RESOURCE_COUNT: usize = 16 + MAXTRACK;

/// Width in bits of one resource table entry
const RESOURCE_BITS: u8 = 13;

/// Minimum blob size able to hold a full resource table
const MIN_BLOB_LEN: usize = (RESOURCE_COUNT * RESOURCE_BITS as usize).div_ceil(8);

/// A loaded song blob together with its decoded resource table.
///
/// Construction performs the only validation pass the engine does:
/// the blob must be large enough to hold the resource table and every
/// table entry must point inside the blob. Indices read from packed
/// track and instrument data afterwards are trusted preconditions.
#[derive(Debug, Clone)]
pub struct SongData {
    blob: Vec<u8>,
    resources: [u16; RESOURCE_COUNT],
}

impl SongData {
    /// Decode and validate a packed song blob
    pub fn new(blob: Vec<u8>) -> Result<Self> {
        if blob.len() < MIN_BLOB_LEN {
            return Err(EngineError::InvalidSong(format!(
                "blob of {} bytes cannot hold a {} entry resource table",
                blob.len(),
                RESOURCE_COUNT
            )));
        }

        let mut cursor = BitCursor::new(0);
        let mut resources = [0u16; RESOURCE_COUNT];
        for (index, slot) in resources.iter_mut().enumerate() {
            let offset = cursor.read_field(&blob, RESOURCE_BITS);
            if offset as usize >= blob.len() {
                return Err(EngineError::InvalidSong(format!(
                    "resource {index} points at offset {offset:#x} beyond blob end {:#x}",
                    blob.len()
                )));
            }
            *slot = offset;
        }

        Ok(SongData { blob, resources })
    }

    /// Raw song bytes
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    /// Byte offset of the song index (per-step track assignments)
    pub fn song_offset(&self) -> u16 {
        self.resources[0]
    }

    /// Byte offset of an instrument program (ids 1-15)
    pub fn instrument_offset(&self, id: u8) -> u16 {
        self.resources[(id as usize) & 0x0f]
    }

    /// Byte offset of a track's packed line data (track numbers are 1-based)
    pub fn track_offset(&self, track: u8) -> u16 {
        self.resources[16 + track as usize - 1]
    }

    /// Fetch the `(opcode, parameter)` byte pair at step `pc` of an
    /// instrument program. Pairs are stored as raw bytes, not bit-packed.
    /// Reads past the blob end return `(0, 0)`, the stop opcode.
    pub fn instrument_step(&self, id: u8, pc: u16) -> (u8, u8) {
        let base = self.instrument_offset(id) as usize + 2 * pc as usize;
        let byte = |i: usize| self.blob.get(i).copied().unwrap_or(0);
        (byte(base), byte(base + 1))
    }
}
