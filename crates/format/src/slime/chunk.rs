use crate::error::{FormatError, PartialChunkPos, Result};
use crate::options::DecodeOptions;
use crate::record::{self, Record};

use super::reader::ByteReader;
use super::section::{self, Section};
use super::{SlimeVersion, WorldFlags};

/// Coordinates, section count and four length prefixes.
const MIN_CHUNK_BYTES: usize = 28;
/// A v13 section with no light and empty block state and biome blocks.
const MIN_SECTION_BYTES: usize = 9;

/// One chunk column as stored in the slime file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    pub x: i32,
    pub z: i32,
    /// Sections bottom to top; the vertical slot is the list position.
    pub sections: Vec<Section>,
    pub tile_entities: Vec<Record>,
    pub entities: Vec<Record>,
}

/// Optional per-chunk datasets gated by the world flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlaggedDataset {
    PoiChunks,
    BlockTicks,
    FluidTicks,
}

impl FlaggedDataset {
    /// File order. Deliberately not flag-bit order: block ticks (4) come
    /// before fluid ticks (2).
    pub const READ_ORDER: [FlaggedDataset; 3] = [
        FlaggedDataset::PoiChunks,
        FlaggedDataset::BlockTicks,
        FlaggedDataset::FluidTicks,
    ];

    pub const fn flag(self) -> u8 {
        match self {
            FlaggedDataset::PoiChunks => WorldFlags::POI_CHUNKS,
            FlaggedDataset::BlockTicks => WorldFlags::BLOCK_TICKS,
            FlaggedDataset::FluidTicks => WorldFlags::FLUID_TICKS,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            FlaggedDataset::PoiChunks => "POI chunks",
            FlaggedDataset::BlockTicks => "block ticks",
            FlaggedDataset::FluidTicks => "fluid ticks",
        }
    }
}

/// Where a skipped flagged dataset sat in the chunk stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SkippedBlock {
    pub dataset: FlaggedDataset,
    /// Offset of the block's length prefix.
    pub offset: u64,
    pub len: usize,
}

pub(crate) fn skip_flagged_datasets(
    r: &mut ByteReader<'_>,
    flags: WorldFlags,
) -> Result<Vec<SkippedBlock>> {
    let mut skipped = Vec::new();
    for dataset in FlaggedDataset::READ_ORDER {
        if !flags.contains(dataset.flag()) {
            continue;
        }
        let offset = r.position();
        let len = r.skip_sized(dataset.name())?;
        skipped.push(SkippedBlock { dataset, offset, len });
    }
    Ok(skipped)
}

/// Parse the decompressed chunk block: a count followed by that many chunks.
pub(crate) fn read_chunks(
    data: &[u8],
    version: SlimeVersion,
    flags: WorldFlags,
    options: &DecodeOptions,
) -> Result<Vec<Chunk>> {
    let mut r = ByteReader::new(data);
    let count = r.length("chunk count")?;

    let mut chunks = Vec::with_capacity(r.capacity_for(count, MIN_CHUNK_BYTES));

    for index in 0..count {
        let start = r.position();
        let mut pos = PartialChunkPos::default();
        match read_chunk(&mut r, version, flags, options, &mut pos) {
            Ok(chunk) => chunks.push(chunk),
            Err(source) => {
                return Err(FormatError::Chunk {
                    index,
                    count,
                    pos,
                    start,
                    failed_at: r.position(),
                    source: Box::new(source),
                });
            }
        }
    }

    if !r.is_empty() {
        tracing::debug!("{} unread bytes after the last chunk", r.remaining());
    }

    Ok(chunks)
}

fn read_chunk(
    r: &mut ByteReader<'_>,
    version: SlimeVersion,
    flags: WorldFlags,
    options: &DecodeOptions,
    pos: &mut PartialChunkPos,
) -> Result<Chunk> {
    let x = r.i32("chunk x")?;
    pos.x = Some(x);
    let z = r.i32("chunk z")?;
    pos.z = Some(z);

    let section_count = r.length("section count")?;
    let mut sections = Vec::with_capacity(r.capacity_for(section_count, MIN_SECTION_BYTES));
    for i in 0..section_count {
        let section = section::read_section(r, version, options).map_err(|e| e.in_section(i))?;
        sections.push(section);
    }

    r.skip_sized("heightmaps")?;

    for skipped in skip_flagged_datasets(r, flags)? {
        tracing::trace!(
            "chunk ({}, {}): skipped {} ({} bytes at {})",
            x,
            z,
            skipped.dataset.name(),
            skipped.len,
            skipped.offset,
        );
    }

    let tile_entities = record::read_record_list(r.sized("tile entities")?, "tileEntities", options.strict)?;
    let entities = record::read_record_list(r.sized("entities")?, "entities", options.strict)?;

    // Per-chunk extra data (PDC).
    r.skip_sized("chunk extra data")?;

    Ok(Chunk {
        x,
        z,
        sections,
        tile_entities,
        entities,
    })
}
