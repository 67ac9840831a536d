//! SlimeWorld (`.slime`) decoder for format versions 12 and 13.
//!
//! Layout (big-endian):
//!
//! ```text
//! u16 magic (0xB10B) | u8 version | u32 data version | [v13: u8 world flags]
//! i32 compressed size | i32 size | zstd(chunk block)
//! [i32 compressed size | i32 size | zstd(extra NBT)]   optional
//! ```

mod chunk;
mod reader;
mod section;

use std::time::Instant;

pub use chunk::{Chunk, FlaggedDataset};
pub use section::Section;

use crate::error::{FormatError, Result};
use crate::options::DecodeOptions;
use reader::ByteReader;

pub const SLIME_MAGIC: u16 = 0xB10B;

/// Supported on-disk revisions. Selected once from the header and threaded
/// through section decoding, where the light-data layout differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SlimeVersion {
    V12,
    V13,
}

impl SlimeVersion {
    pub const fn as_u8(self) -> u8 {
        match self {
            SlimeVersion::V12 => 12,
            SlimeVersion::V13 => 13,
        }
    }

    /// v13 added the world flags byte to the header.
    pub const fn has_world_flags(self) -> bool {
        matches!(self, SlimeVersion::V13)
    }
}

impl TryFrom<u8> for SlimeVersion {
    type Error = FormatError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            12 => Ok(SlimeVersion::V12),
            13 => Ok(SlimeVersion::V13),
            other => Err(FormatError::UnsupportedVersion(other)),
        }
    }
}

/// Header bitmask announcing which optional per-chunk datasets are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldFlags(pub u8);

impl WorldFlags {
    pub const POI_CHUNKS: u8 = 1;
    pub const FLUID_TICKS: u8 = 2;
    pub const BLOCK_TICKS: u8 = 4;

    pub const fn contains(self, flag: u8) -> bool {
        self.0 & flag != 0
    }
}

/// A fully decoded slime world. Immutable once read.
#[derive(Debug, Clone, PartialEq)]
pub struct SlimeWorld {
    pub version: SlimeVersion,
    /// Minecraft data version the world was saved with.
    pub data_version: u32,
    pub flags: WorldFlags,
    /// Chunks in file order.
    pub chunks: Vec<Chunk>,
}

/// Decode a complete `.slime` file.
pub fn read_world(data: &[u8], options: &DecodeOptions) -> Result<SlimeWorld> {
    let start = Instant::now();
    let mut r = ByteReader::new(data);

    let magic = r.u16("magic")?;
    if magic != SLIME_MAGIC {
        return Err(FormatError::BadMagic {
            found: magic,
            expected: SLIME_MAGIC,
        });
    }

    let version = SlimeVersion::try_from(r.u8("version")?)?;
    let data_version = r.u32("world version")?;
    let flags = if version.has_world_flags() {
        WorldFlags(r.u8("world flags")?)
    } else {
        WorldFlags::default()
    };
    tracing::debug!(
        "Slime header: v{}, data version {}, flags {:#04x}",
        version.as_u8(),
        data_version,
        flags.0,
    );

    let chunk_data = read_compressed(&mut r, "chunks")?;
    let chunks = chunk::read_chunks(&chunk_data, version, flags, options)?;
    drop(chunk_data);

    skip_extra(&mut r);

    tracing::info!(
        "Slime world decoded: {} chunks, v{}, data version {} ({:.2?})",
        chunks.len(),
        version.as_u8(),
        data_version,
        start.elapsed(),
    );

    Ok(SlimeWorld {
        version,
        data_version,
        flags,
        chunks,
    })
}

/// Read a `compressed size | size | zstd bytes` block and inflate it.
fn read_compressed(r: &mut ByteReader<'_>, what: &'static str) -> Result<Vec<u8>> {
    let compressed_len = r.length(what)?;
    let expected = r.length(what)?;
    let compressed = r.bytes(compressed_len, what)?;

    // The declared size caps the allocation; an understated size fails here.
    let data = zstd::bulk::decompress(compressed, expected)?;
    if data.len() != expected {
        return Err(FormatError::SizeMismatch {
            what,
            actual: data.len(),
            expected,
        });
    }
    Ok(data)
}

/// The trailing extra-data block is optional; older writers leave it out and
/// some truncate it. Anything missing here just ends the file.
fn skip_extra(r: &mut ByteReader<'_>) {
    let skipped = r
        .i32("extra compressed size")
        .and_then(|compressed| {
            r.i32("extra size")?;
            r.skip(compressed.max(0) as usize, "extra data")?;
            Ok(compressed)
        });
    match skipped {
        Ok(len) => tracing::debug!("Skipped {} bytes of world extra data", len),
        Err(e) => tracing::debug!("No world extra data: {}", e),
    }
}
