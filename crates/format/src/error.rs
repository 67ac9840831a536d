use std::fmt;

/// Everything that can go wrong while decoding a slime world or encoding a
/// schematic.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("invalid magic: 0x{found:04X} (expected 0x{expected:04X})")]
    BadMagic { found: u16, expected: u16 },

    #[error("unsupported slime version: {0} (supported: 12-13)")]
    UnsupportedVersion(u8),

    #[error("{what} size mismatch: got {actual}, expected {expected}")]
    SizeMismatch {
        what: &'static str,
        actual: usize,
        expected: usize,
    },

    #[error("negative length {len} for {what}")]
    NegativeLength { what: &'static str, len: i32 },

    #[error("{what}: need {needed} bytes at offset {offset}, only {available} left")]
    Truncated {
        what: &'static str,
        offset: u64,
        needed: usize,
        available: usize,
    },

    #[error("chunk #{index}/{count} ({pos}, started at byte {start}, failed at byte {failed_at})")]
    Chunk {
        index: usize,
        count: usize,
        pos: PartialChunkPos,
        start: u64,
        failed_at: u64,
        #[source]
        source: Box<FormatError>,
    },

    #[error("section {index}")]
    Section {
        index: usize,
        #[source]
        source: Box<FormatError>,
    },

    #[error("malformed {what} record: {reason}")]
    MalformedRecord { what: &'static str, reason: String },

    #[error("packed word {word} out of range ({len} words, index {index})")]
    PackedIndexOutOfRange { index: usize, word: usize, len: usize },

    #[error("palette index {found} out of range (palette has {len} entries)")]
    PaletteIndexOutOfRange { found: u64, len: usize },

    #[error("world too large for schematic: {width}x{height}x{length} (max {max} per axis)")]
    Capacity {
        width: usize,
        height: usize,
        length: usize,
        max: usize,
    },

    #[error("schematic palette is full ({0} entries)")]
    PaletteFull(usize),

    #[error("byte array of {0} bytes exceeds the NBT length limit")]
    ArrayTooLong(usize),

    #[error("unexpected NBT framing from serializer: {0}")]
    Framing(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Nbt(#[from] fastnbt::error::Error),
}

pub type Result<T> = std::result::Result<T, FormatError>;

impl FormatError {
    pub(crate) fn in_section(self, index: usize) -> Self {
        FormatError::Section {
            index,
            source: Box::new(self),
        }
    }
}

/// Chunk coordinates as far as they were read before a failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialChunkPos {
    pub x: Option<i32>,
    pub z: Option<i32>,
}

impl fmt::Display for PartialChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.x {
            Some(x) => write!(f, "x={x}")?,
            None => f.write_str("x=?")?,
        }
        match self.z {
            Some(z) => write!(f, " z={z}"),
            None => f.write_str(" z=?"),
        }
    }
}
