//! Bit-level unpacker for the packed song format
//!
//! Song data is a stream of variable-width unsigned fields (1-16 bits),
//! packed least-significant-bit first within each byte. A cursor tracks a
//! read position at sub-byte granularity; one cursor drives song-level
//! reads and each channel owns another for its track data.

/// Read cursor into a song blob at sub-byte granularity.
///
/// The cursor does not borrow the blob; callers pass the blob to every
/// read so the cursor can live inside per-channel state without lifetime
/// plumbing. Reads past the end of the blob yield zero bits, which keeps
/// playback of truncated data panic-free (a zero opcode pair terminates
/// any instrument program).
#[derive(Debug, Clone, Copy, Default)]
pub struct BitCursor {
    /// Offset of the next byte to load into the bit buffer
    next_byte: usize,
    /// Bits not yet consumed from the current byte
    buffer: u8,
    /// Number of valid bits left in `buffer`
    bits: u8,
}

impl BitCursor {
    /// Create a cursor positioned at a byte offset into the blob
    pub fn new(offset: usize) -> Self {
        BitCursor {
            next_byte: offset,
            buffer: 0,
            bits: 0,
        }
    }

    /// Byte offset of the next refill
    pub fn byte_offset(&self) -> usize {
        self.next_byte
    }

    /// Consume a single bit, refilling the internal buffer from the next
    /// blob byte when empty
    pub fn read_bit(&mut self, blob: &[u8]) -> u8 {
        if self.bits == 0 {
            self.buffer = blob.get(self.next_byte).copied().unwrap_or(0);
            self.next_byte += 1;
            self.bits = 8;
        }

        self.bits -= 1;
        let val = self.buffer & 1;
        self.buffer >>= 1;
        val
    }

    /// Read an unsigned field of `width` bits (1-16), little-endian bit
    /// order: bit `i` of the stream lands in bit `i` of the result
    pub fn read_field(&mut self, blob: &[u8], width: u8) -> u16 {
        debug_assert!((1..=16).contains(&width));

        let mut val = 0u16;
        for i in 0..width {
            if self.read_bit(blob) != 0 {
                val |= 1 << i;
            }
        }
        val
    }
}
