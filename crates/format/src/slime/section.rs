use std::sync::LazyLock;

use crate::bits::{self, SECTION_VOLUME};
use crate::error::{FormatError, Result};
use crate::options::DecodeOptions;
use crate::record;
use crate::state::BlockState;

use super::SlimeVersion;
use super::reader::ByteReader;

/// Size of one nibble-per-block light array.
const LIGHT_ARRAY_LEN: usize = 2048;

// v13 section flags
const SECTION_BLOCK_LIGHT: u8 = 1;
const SECTION_SKY_LIGHT: u8 = 2;

static EMPTY: LazyLock<BlockState> = LazyLock::new(BlockState::air);

/// A 16x16x16 cube of blocks as stored on disk: a palette plus packed indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    pub palette: Vec<BlockState>,
    pub data: Vec<i64>,
}

impl Section {
    pub fn new(palette: Vec<BlockState>, data: Vec<i64>) -> Self {
        Self { palette, data }
    }

    /// Entry width for the current palette. Never read from the file.
    pub fn bits_per_entry(&self) -> usize {
        bits::bits_per_entry(self.palette.len())
    }

    pub fn is_empty(&self) -> bool {
        self.palette.is_empty()
    }

    /// Palette index at a section-local position (each axis 0..16), or
    /// `None` for an empty section, which reads as air everywhere.
    ///
    /// A single-entry palette reads as that entry without touching `data`.
    /// Missing words or indices past the end of the palette fall back to the
    /// first palette entry.
    pub fn palette_index_at(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        match self.palette.len() {
            0 => None,
            1 => Some(0),
            len => {
                let index = bits::unpack(&self.data, bits::section_index(x, y, z), self.bits_per_entry()) as usize;
                Some(if index < len { index } else { 0 })
            }
        }
    }

    /// Like `palette_index_at`, but corrupt packed data is an error instead of
    /// resolving to the first palette entry.
    pub fn checked_palette_index_at(&self, x: usize, y: usize, z: usize) -> Result<Option<usize>> {
        match self.palette.len() {
            0 => Ok(None),
            1 => Ok(Some(0)),
            len => {
                let bits = self.bits_per_entry();
                let index = bits::section_index(x, y, z);
                let entry = bits::try_unpack(&self.data, index, bits).ok_or(
                    FormatError::PackedIndexOutOfRange {
                        index,
                        word: index / (64 / bits),
                        len: self.data.len(),
                    },
                )?;
                if entry as usize >= len {
                    return Err(FormatError::PaletteIndexOutOfRange { found: entry, len });
                }
                Ok(Some(entry as usize))
            }
        }
    }

    /// Block state at a section-local position, with the fallbacks of
    /// `palette_index_at`.
    pub fn block_at(&self, x: usize, y: usize, z: usize) -> &BlockState {
        match self.palette_index_at(x, y, z) {
            Some(i) => &self.palette[i],
            None => &EMPTY,
        }
    }

    pub fn checked_block_at(&self, x: usize, y: usize, z: usize) -> Result<&BlockState> {
        Ok(match self.checked_palette_index_at(x, y, z)? {
            Some(i) => &self.palette[i],
            None => &EMPTY,
        })
    }
}

/// Skip the light arrays, whose layout differs between versions.
fn skip_light(r: &mut ByteReader<'_>, version: SlimeVersion) -> Result<()> {
    match version {
        SlimeVersion::V13 => {
            let flags = r.u8("section flags")?;
            if flags & SECTION_SKY_LIGHT != 0 {
                r.skip(LIGHT_ARRAY_LEN, "sky light")?;
            }
            if flags & SECTION_BLOCK_LIGHT != 0 {
                r.skip(LIGHT_ARRAY_LEN, "block light")?;
            }
        }
        SlimeVersion::V12 => {
            if r.u8("block light flag")? != 0 {
                r.skip(LIGHT_ARRAY_LEN, "block light")?;
            }
            if r.u8("sky light flag")? != 0 {
                r.skip(LIGHT_ARRAY_LEN, "sky light")?;
            }
        }
    }
    Ok(())
}

pub(crate) fn read_section(
    r: &mut ByteReader<'_>,
    version: SlimeVersion,
    options: &DecodeOptions,
) -> Result<Section> {
    skip_light(r, version)?;

    let block_states = r.sized("block states")?;
    let section = if block_states.is_empty() {
        Section::default()
    } else {
        let (palette, data) = record::read_block_states(block_states)?;
        Section::new(palette, data)
    };

    // Biomes are not carried into the schematic.
    r.skip_sized("biomes")?;

    if options.strict && section.palette.len() > 1 {
        let expected = bits::packed_len(SECTION_VOLUME, section.bits_per_entry());
        if section.data.len() < expected {
            return Err(FormatError::SizeMismatch {
                what: "packed block data",
                actual: section.data.len(),
                expected,
            });
        }
    }

    Ok(section)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stone() -> BlockState {
        BlockState::new("minecraft:stone")
    }

    fn dirt() -> BlockState {
        BlockState::new("minecraft:dirt")
    }

    #[test]
    fn test_empty_section_is_air() {
        let section = Section::default();
        assert_eq!(section.block_at(3, 4, 5), &BlockState::air());
        assert_eq!(section.checked_block_at(3, 4, 5).unwrap(), &BlockState::air());
    }

    #[test]
    fn test_single_entry_ignores_data() {
        let section = Section::new(vec![stone()], Vec::new());
        for (x, y, z) in [(0, 0, 0), (15, 15, 15), (7, 2, 9)] {
            assert_eq!(section.block_at(x, y, z), &stone());
            assert_eq!(section.checked_block_at(x, y, z).unwrap(), &stone());
        }
        let noisy = Section::new(vec![dirt()], vec![-1; 256]);
        assert_eq!(noisy.block_at(1, 1, 1), &dirt());
    }

    #[test]
    fn test_bits_follow_palette_size() {
        let palette16: Vec<BlockState> = (0..16).map(|i| BlockState::new(format!("b{i}"))).collect();
        assert_eq!(Section::new(palette16.clone(), Vec::new()).bits_per_entry(), 4);
        let mut palette17 = palette16;
        palette17.push(stone());
        assert_eq!(Section::new(palette17, Vec::new()).bits_per_entry(), 5);
    }

    #[test]
    fn test_lookup_uses_yzx_order() {
        let mut indices = vec![0u16; SECTION_VOLUME];
        indices[bits::section_index(1, 2, 3)] = 1;
        let section = Section::new(vec![stone(), dirt()], bits::pack(&indices, 4));
        assert_eq!(section.block_at(1, 2, 3), &dirt());
        assert_eq!(section.block_at(3, 2, 1), &stone());
        assert_eq!(section.block_at(1, 3, 2), &stone());
    }

    #[test]
    fn test_truncated_data_falls_back() {
        let indices = vec![1u16; 32];
        let section = Section::new(vec![stone(), dirt()], bits::pack(&indices, 4));
        assert_eq!(section.block_at(0, 0, 0), &dirt());
        // Linear index 4095 lives far past the two words present.
        assert_eq!(section.block_at(15, 15, 15), &stone());
        assert!(matches!(
            section.checked_block_at(15, 15, 15),
            Err(FormatError::PackedIndexOutOfRange { index: 4095, word: 255, len: 2 })
        ));
    }

    #[test]
    fn test_palette_index_out_of_range() {
        let indices = vec![9u16; SECTION_VOLUME];
        let section = Section::new(vec![stone(), dirt()], bits::pack(&indices, 4));
        assert_eq!(section.block_at(0, 0, 0), &stone());
        assert!(matches!(
            section.checked_block_at(0, 0, 0),
            Err(FormatError::PaletteIndexOutOfRange { found: 9, len: 2 })
        ));
    }

    #[test]
    fn test_palette_index_at() {
        assert_eq!(Section::default().palette_index_at(0, 0, 0), None);
        assert_eq!(Section::new(vec![stone()], Vec::new()).palette_index_at(9, 9, 9), Some(0));

        let indices: Vec<u16> = (0..SECTION_VOLUME as u16).map(|i| i % 3).collect();
        let palette = vec![stone(), dirt(), BlockState::air()];
        let section = Section::new(palette, bits::pack(&indices, 4));
        assert_eq!(section.palette_index_at(2, 0, 0), Some(2));
        assert_eq!(section.checked_palette_index_at(1, 0, 0).unwrap(), Some(1));
    }

    #[test]
    fn test_light_layouts() {
        // v13: flags = sky | block, then two arrays, then empty states/biomes.
        let mut v13 = vec![SECTION_SKY_LIGHT | SECTION_BLOCK_LIGHT];
        v13.extend(std::iter::repeat_n(0xAA, 2 * LIGHT_ARRAY_LEN));
        v13.extend([0, 0, 0, 0, 0, 0, 0, 0]);
        let mut r = ByteReader::new(&v13);
        let section = read_section(&mut r, SlimeVersion::V13, &DecodeOptions::default()).unwrap();
        assert!(section.is_empty());
        assert!(r.is_empty());

        // v12: block flag + array, sky flag (unset), then empty states/biomes.
        let mut v12 = vec![1];
        v12.extend(std::iter::repeat_n(0xAA, LIGHT_ARRAY_LEN));
        v12.push(0);
        v12.extend([0, 0, 0, 0, 0, 0, 0, 0]);
        let mut r = ByteReader::new(&v12);
        let section = read_section(&mut r, SlimeVersion::V12, &DecodeOptions::default()).unwrap();
        assert!(section.is_empty());
        assert!(r.is_empty());
    }
}
