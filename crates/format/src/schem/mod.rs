//! Sponge Schematic v3 volume and its streaming encoder.

mod writer;

use indexmap::IndexSet;

use crate::error::{FormatError, Result};
use crate::record::Record;
use crate::state::AIR;

/// Largest dimension a schematic can describe (stored as unsigned shorts).
pub const MAX_DIMENSION: usize = u16::MAX as usize;
/// Palette indices are stored as `u16` while building.
pub const MAX_PALETTE: usize = u16::MAX as usize + 1;
/// Sponge schematic format version written by `save`.
pub const SCHEMATIC_VERSION: i32 = 3;

/// A block entity with a position relative to the schematic origin.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockEntity {
    pub pos: [i32; 3],
    pub id: String,
    pub data: Record,
}

/// An entity with a position relative to the schematic origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub pos: [f64; 3],
    pub id: String,
    pub data: Record,
}

/// Dense block volume being built for export.
///
/// Blocks are palette indices in a flat `Vec<u16>` indexed
/// `x + z * width + y * width * length`. The palette maps block state strings
/// to indices in first-use order, with `minecraft:air` pinned at 0.
pub struct Schematic {
    width: usize,
    height: usize,
    length: usize,
    pub data_version: i32,
    /// Paste offset relative to the placing player.
    pub offset: [i32; 3],
    palette: IndexSet<String>,
    block_data: Vec<u16>,
    pub block_entities: Vec<BlockEntity>,
    pub entities: Vec<Entity>,
}

impl Schematic {
    /// Create an all-air volume. Dimensions are checked before anything is
    /// allocated.
    pub fn new(width: usize, height: usize, length: usize, data_version: i32) -> Result<Self> {
        if width > MAX_DIMENSION || height > MAX_DIMENSION || length > MAX_DIMENSION {
            return Err(FormatError::Capacity {
                width,
                height,
                length,
                max: MAX_DIMENSION,
            });
        }

        let mut palette = IndexSet::new();
        palette.insert(AIR.to_string());

        Ok(Self {
            width,
            height,
            length,
            data_version,
            offset: [0; 3],
            palette,
            block_data: vec![0; width * height * length],
            block_entities: Vec::new(),
            entities: Vec::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn volume(&self) -> usize {
        self.block_data.len()
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        if x >= self.width || y >= self.height || z >= self.length {
            return None;
        }
        Some(x + z * self.width + y * self.width * self.length)
    }

    /// Set the block at `(x, y, z)` to `state` (a palette key such as
    /// `minecraft:stone`). Returns `Ok(false)` for positions outside the volume.
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, state: &str) -> Result<bool> {
        let Some(index) = self.index(x, y, z) else {
            return Ok(false);
        };
        let palette_idx = self.palette_index(state)?;
        self.block_data[index] = palette_idx;
        Ok(true)
    }

    fn palette_index(&mut self, state: &str) -> Result<u16> {
        if let Some(idx) = self.palette.get_index_of(state) {
            return Ok(idx as u16);
        }
        if self.palette.len() >= MAX_PALETTE {
            return Err(FormatError::PaletteFull(self.palette.len()));
        }
        let (idx, _) = self.palette.insert_full(state.to_string());
        Ok(idx as u16)
    }

    /// Palette index stored at `(x, y, z)`.
    pub fn block_index_at(&self, x: usize, y: usize, z: usize) -> Option<u16> {
        self.index(x, y, z).map(|i| self.block_data[i])
    }

    /// Block state string stored at `(x, y, z)`.
    pub fn block_at(&self, x: usize, y: usize, z: usize) -> Option<&str> {
        let idx = self.block_index_at(x, y, z)?;
        self.palette.get_index(idx as usize).map(String::as_str)
    }

    /// Palette entries with their indices, in index order.
    pub fn palette(&self) -> impl Iterator<Item = (&str, u16)> + '_ {
        self.palette.iter().enumerate().map(|(i, s)| (s.as_str(), i as u16))
    }

    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }
}
