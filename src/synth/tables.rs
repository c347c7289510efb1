//! Fixed-point pitch and vibrato lookup tables
//!
//! Both tables must match the song packer's assumptions exactly: the
//! frequency table spans seven octaves of equal temperament as phase
//! increments per sample, and the sine table is a signed 8-bit quarter
//! scaled full wave over 64 entries used by the vibrato processor.

/// Phase increment per output sample for each note index
pub const FREQ_TABLE: [u16; 84] = [
    0x010b, 0x011b, 0x012c, 0x013e, 0x0151, 0x0165, 0x017a, 0x0191, 0x01a9,
    0x01c2, 0x01dd, 0x01f9, 0x0217, 0x0237, 0x0259, 0x027d, 0x02a3, 0x02cb,
    0x02f5, 0x0322, 0x0352, 0x0385, 0x03ba, 0x03f3, 0x042f, 0x046f, 0x04b2,
    0x04fa, 0x0546, 0x0596, 0x05eb, 0x0645, 0x06a5, 0x070a, 0x0775, 0x07e6,
    0x085f, 0x08de, 0x0965, 0x09f4, 0x0a8c, 0x0b2c, 0x0bd6, 0x0c8b, 0x0d4a,
    0x0e14, 0x0eea, 0x0fcd, 0x10be, 0x11bd, 0x12cb, 0x13e9, 0x1518, 0x1659,
    0x17ad, 0x1916, 0x1a94, 0x1c28, 0x1dd5, 0x1f9b, 0x217c, 0x237a, 0x2596,
    0x27d3, 0x2a31, 0x2cb3, 0x2f5b, 0x322c, 0x3528, 0x3851, 0x3bab, 0x3f37,
    0x42f9, 0x46f5, 0x4b2d, 0x4fa6, 0x5462, 0x5967, 0x5eb7, 0x6459, 0x6a51,
    0x70a3, 0x7756, 0x7e6f,
];

/// Signed sine wave over 64 steps backing the vibrato effect
pub const SINE_TABLE: [i8; 64] = [
    0, 12, 25, 37, 49, 60, 71, 81, 90, 98, 106, 112, 117, 122, 125, 126,
    127, 126, 125, 122, 117, 112, 106, 98, 90, 81, 71, 60, 49, 37, 25, 12,
    0, -12, -25, -37, -49, -60, -71, -81, -90, -98, -106, -112, -117, -122,
    -125, -126, -127, -126, -125, -122, -117, -112, -106, -98, -90, -81,
    -71, -60, -49, -37, -25, -12,
];

/// Look up a note's frequency, saturating to the top of the table so a
/// malformed note index degrades to the highest pitch instead of a panic
#[inline]
pub fn note_frequency(note: u8) -> u16 {
    FREQ_TABLE[(note as usize).min(FREQ_TABLE.len() - 1)]
}
