//! Hand-rolled NBT output for the schematic.
//!
//! The tree is written tag by tag straight into the gzip stream. The block
//! data array (often hundreds of MB once varint-encoded) never exists as a
//! whole: its length is computed in a first pass and its bytes are streamed
//! through a small buffer in a second. Entity lists are small and irregular,
//! so they go through `fastnbt` and get spliced in.

use std::io::{self, Write};
use std::time::Instant;

use byteorder::{BigEndian, WriteBytesExt};
use fastnbt::IntArray;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;

use crate::error::{FormatError, Result};
use crate::record::Record;
use crate::varint;

use super::{BlockEntity, Entity, SCHEMATIC_VERSION, Schematic};

// NBT tag type IDs
const TAG_END: u8 = 0;
const TAG_SHORT: u8 = 2;
const TAG_INT: u8 = 3;
const TAG_BYTE_ARRAY: u8 = 7;
const TAG_COMPOUND: u8 = 10;
const TAG_INT_ARRAY: u8 = 11;

/// What `fastnbt::to_bytes` puts around a root compound: tag, empty name.
const ROOT_HEADER: [u8; 3] = [TAG_COMPOUND, 0, 0];

/// Streaming buffer for the varint pass.
const VARINT_BUF_CAPACITY: usize = 4096;
/// Flush once fewer than one worst-case varint of headroom would remain.
const VARINT_FLUSH_AT: usize = VARINT_BUF_CAPACITY - varint::MAX_LEN;

pub(crate) struct NbtWriter<W: Write> {
    w: W,
}

impl<W: Write> NbtWriter<W> {
    pub fn new(w: W) -> Self {
        Self { w }
    }

    pub fn into_inner(self) -> W {
        self.w
    }

    fn tag_header(&mut self, tag: u8, name: &str) -> io::Result<()> {
        let len = u16::try_from(name.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "NBT tag name too long"))?;
        self.w.write_u8(tag)?;
        self.w.write_u16::<BigEndian>(len)?;
        self.w.write_all(name.as_bytes())
    }

    pub fn begin_compound(&mut self, name: &str) -> io::Result<()> {
        self.tag_header(TAG_COMPOUND, name)
    }

    pub fn end_compound(&mut self) -> io::Result<()> {
        self.w.write_u8(TAG_END)
    }

    pub fn int(&mut self, name: &str, v: i32) -> io::Result<()> {
        self.tag_header(TAG_INT, name)?;
        self.w.write_i32::<BigEndian>(v)
    }

    pub fn short(&mut self, name: &str, v: i16) -> io::Result<()> {
        self.tag_header(TAG_SHORT, name)?;
        self.w.write_i16::<BigEndian>(v)
    }

    pub fn int_array(&mut self, name: &str, v: &[i32]) -> io::Result<()> {
        self.tag_header(TAG_INT_ARRAY, name)?;
        self.w.write_i32::<BigEndian>(v.len() as i32)?;
        for &val in v {
            self.w.write_i32::<BigEndian>(val)?;
        }
        Ok(())
    }

    /// Write a byte array tag holding the varint encoding of every value in
    /// `data`, without materializing the encoded bytes. Returns the array length.
    pub fn varint_byte_array(&mut self, name: &str, data: &[u16]) -> Result<usize> {
        // Pass 1: exact encoded length, no allocation.
        let byte_len: usize = data.iter().map(|&v| varint::encoded_len(v as u32)).sum();
        let declared = i32::try_from(byte_len).map_err(|_| FormatError::ArrayTooLong(byte_len))?;

        self.tag_header(TAG_BYTE_ARRAY, name)?;
        self.w.write_i32::<BigEndian>(declared)?;

        // Pass 2: encode through a small reusable buffer.
        let mut buf = Vec::with_capacity(VARINT_BUF_CAPACITY);
        for &v in data {
            varint::encode_into(v as u32, &mut buf);
            if buf.len() >= VARINT_FLUSH_AT {
                self.w.write_all(&buf)?;
                buf.clear();
            }
        }
        self.w.write_all(&buf)?;

        Ok(byte_len)
    }

    /// Serialize `value` with `fastnbt` and write its fields into the current
    /// compound, dropping the library's root compound header and end tag.
    pub fn splice<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let raw = fastnbt::to_bytes(value)?;
        if raw.len() < ROOT_HEADER.len() + 1 || raw[..ROOT_HEADER.len()] != ROOT_HEADER {
            return Err(FormatError::Framing("missing unnamed root compound header"));
        }
        if raw.last() != Some(&TAG_END) {
            return Err(FormatError::Framing("missing root end tag"));
        }
        self.w.write_all(&raw[ROOT_HEADER.len()..raw.len() - 1])?;
        Ok(())
    }
}

// ── Entity NBT structs (serde) ──────────────────────────────────────────────

#[derive(Serialize)]
struct BlockEntitiesNbt {
    #[serde(rename = "BlockEntities")]
    block_entities: Vec<BlockEntityNbt>,
}

#[derive(Serialize)]
struct BlockEntityNbt {
    #[serde(rename = "Pos")]
    pos: IntArray,
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Data", skip_serializing_if = "Record::is_empty")]
    data: Record,
}

impl From<BlockEntity> for BlockEntityNbt {
    fn from(be: BlockEntity) -> Self {
        Self {
            pos: IntArray::new(be.pos.to_vec()),
            id: be.id,
            data: be.data,
        }
    }
}

#[derive(Serialize)]
struct EntitiesNbt {
    #[serde(rename = "Entities")]
    entities: Vec<EntityNbt>,
}

#[derive(Serialize)]
struct EntityNbt {
    #[serde(rename = "Pos")]
    pos: Vec<f64>,
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Data", skip_serializing_if = "Record::is_empty")]
    data: Record,
}

impl From<Entity> for EntityNbt {
    fn from(e: Entity) -> Self {
        Self {
            pos: e.pos.to_vec(),
            id: e.id,
            data: e.data,
        }
    }
}

// ── Save ────────────────────────────────────────────────────────────────────

impl Schematic {
    /// Write the schematic as gzip-compressed NBT into `writer` and return it.
    ///
    /// Consumes the schematic: the block buffer is freed as soon as it has
    /// been streamed, before the entity lists are encoded.
    pub fn save<W: Write>(self, writer: W) -> Result<W> {
        let start = Instant::now();
        let Schematic {
            width,
            height,
            length,
            data_version,
            offset,
            palette,
            block_data,
            block_entities,
            entities,
        } = self;

        let mut w = NbtWriter::new(GzEncoder::new(writer, Compression::default()));

        // Root compound must be unnamed for WorldEdit/FAWE.
        w.begin_compound("")?;
        w.begin_compound("Schematic")?;
        w.int("Version", SCHEMATIC_VERSION)?;
        w.int("DataVersion", data_version)?;
        // Unsigned on the wire; `new` guarantees each fits in 16 bits.
        w.short("Width", width as u16 as i16)?;
        w.short("Height", height as u16 as i16)?;
        w.short("Length", length as u16 as i16)?;
        w.int_array("Offset", &offset)?;

        w.begin_compound("Blocks")?;

        w.begin_compound("Palette")?;
        for (idx, state) in palette.iter().enumerate() {
            w.int(state, idx as i32)?;
        }
        w.end_compound()?;

        let data_len = w.varint_byte_array("Data", &block_data)?;
        drop(block_data);

        let block_entity_count = block_entities.len();
        if !block_entities.is_empty() {
            w.splice(&BlockEntitiesNbt {
                block_entities: block_entities.into_iter().map(BlockEntityNbt::from).collect(),
            })?;
        }

        w.end_compound()?; // Blocks

        let entity_count = entities.len();
        if !entities.is_empty() {
            w.splice(&EntitiesNbt {
                entities: entities.into_iter().map(EntityNbt::from).collect(),
            })?;
        }

        w.end_compound()?; // Schematic
        w.end_compound()?; // root

        let out = w.into_inner().finish()?;

        tracing::info!(
            "Schematic encoded: {}x{}x{}, {} palette entries, {} data bytes, {} block entities, {} entities ({:.2?})",
            width,
            height,
            length,
            palette.len(),
            data_len,
            block_entity_count,
            entity_count,
            start.elapsed(),
        );
        Ok(out)
    }

    /// Convenience wrapper around `save` that returns the compressed bytes.
    pub fn save_to_vec(self) -> Result<Vec<u8>> {
        self.save(Vec::new())
    }
}
