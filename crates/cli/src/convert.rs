//! Flatten a decoded slime world into a single schematic volume.
//!
//! The volume spans the bounding box of all chunks horizontally and of all
//! section slots vertically. Chunks that are missing inside the box stay air.

use anyhow::{Context, Result, bail};
use slime2schem_format::bits::SECTION_SIZE;
use slime2schem_format::record::{self, Record};
use slime2schem_format::schem::{BlockEntity, Entity};
use slime2schem_format::slime::{Chunk, Section};
use slime2schem_format::{DecodeOptions, Schematic, SlimeWorld};

/// Keys consumed into `BlockEntity::{id, pos}`; everything else goes to `data`.
const BLOCK_ENTITY_KEYS: [&str; 5] = ["id", "Id", "x", "y", "z"];
/// Keys consumed into `Entity::{id, pos}`.
const ENTITY_KEYS: [&str; 3] = ["id", "Id", "Pos"];

pub struct ConvertResult {
    pub schematic: Schematic,
    /// Non-air blocks written into the volume.
    pub total_blocks: usize,
}

/// Chunk and section extents of a world, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldBounds {
    pub min_cx: i32,
    pub max_cx: i32,
    pub min_cz: i32,
    pub max_cz: i32,
    pub min_sy: i32,
    pub max_sy: i32,
}

impl WorldBounds {
    /// `None` for a world without chunks. A world whose chunks have no
    /// sections gets a single section slot.
    pub fn of(chunks: &[Chunk]) -> Option<Self> {
        let first = chunks.first()?;
        let mut b = WorldBounds {
            min_cx: first.x,
            max_cx: first.x,
            min_cz: first.z,
            max_cz: first.z,
            min_sy: i32::MAX,
            max_sy: i32::MIN,
        };

        for chunk in chunks {
            b.min_cx = b.min_cx.min(chunk.x);
            b.max_cx = b.max_cx.max(chunk.x);
            b.min_cz = b.min_cz.min(chunk.z);
            b.max_cz = b.max_cz.max(chunk.z);
            if !chunk.sections.is_empty() {
                b.min_sy = b.min_sy.min(0);
                b.max_sy = b.max_sy.max(chunk.sections.len() as i32 - 1);
            }
        }

        if b.min_sy > b.max_sy {
            b.min_sy = 0;
            b.max_sy = 0;
        }
        Some(b)
    }

    fn span(min: i32, max: i32) -> usize {
        ((max as i64 - min as i64 + 1) as usize).saturating_mul(SECTION_SIZE)
    }

    pub fn width(&self) -> usize {
        Self::span(self.min_cx, self.max_cx)
    }

    pub fn height(&self) -> usize {
        Self::span(self.min_sy, self.max_sy)
    }

    pub fn length(&self) -> usize {
        Self::span(self.min_cz, self.max_cz)
    }

    /// World block coordinates of the volume's (0, 0, 0).
    pub fn origin(&self) -> [i64; 3] {
        [
            self.min_cx as i64 * SECTION_SIZE as i64,
            self.min_sy as i64 * SECTION_SIZE as i64,
            self.min_cz as i64 * SECTION_SIZE as i64,
        ]
    }
}

/// Convert `world` into a schematic. Consumes the world so entity records can
/// move into the schematic without copying.
pub fn convert(world: SlimeWorld, options: &DecodeOptions) -> Result<ConvertResult> {
    let Some(bounds) = WorldBounds::of(&world.chunks) else {
        bail!("no chunks in world");
    };

    let (width, height, length) = (bounds.width(), bounds.height(), bounds.length());
    tracing::info!(
        "World bounds: chunks X=[{}, {}] Z=[{}, {}] sections Y=[{}, {}]",
        bounds.min_cx,
        bounds.max_cx,
        bounds.min_cz,
        bounds.max_cz,
        bounds.min_sy,
        bounds.max_sy,
    );
    tracing::info!("Schematic dimensions: {} x {} x {} (W x H x L)", width, height, length);

    let mut schem = Schematic::new(width, height, length, world.data_version as i32)?;

    // Paste centered on the player's X/Z with the bottom at the player's Y.
    schem.offset = [-((width / 2) as i32), 0, -((length / 2) as i32)];

    let origin = bounds.origin();
    let mut total_blocks = 0usize;

    for chunk in world.chunks {
        let base_x = (chunk.x as i64 - bounds.min_cx as i64) as usize * SECTION_SIZE;
        let base_z = (chunk.z as i64 - bounds.min_cz as i64) as usize * SECTION_SIZE;

        for (slot, section) in chunk.sections.iter().enumerate() {
            let base_y = (slot as i64 - bounds.min_sy as i64) as usize * SECTION_SIZE;
            total_blocks += copy_section(&mut schem, section, [base_x, base_y, base_z], options)
                .with_context(|| format!("chunk ({}, {}) section {}", chunk.x, chunk.z, slot))?;
        }

        for te in chunk.tile_entities {
            if let Some(be) = adjust_block_entity(te, origin) {
                schem.block_entities.push(be);
            }
        }

        for ent in chunk.entities {
            if let Some(e) = adjust_entity(ent, origin).filter(|e| inside(e.pos, [width, height, length])) {
                schem.entities.push(e);
            }
        }
    }

    tracing::debug!(
        "Collected {} block entities and {} entities",
        schem.block_entities.len(),
        schem.entities.len(),
    );

    Ok(ConvertResult {
        schematic: schem,
        total_blocks,
    })
}

/// Write every non-air block of `section` at `base`. Returns how many were written.
fn copy_section(
    schem: &mut Schematic,
    section: &Section,
    base: [usize; 3],
    options: &DecodeOptions,
) -> Result<usize> {
    if section.is_empty() {
        return Ok(0);
    }

    // Palette keys built once per section; `None` marks air.
    let keys: Vec<Option<String>> = section
        .palette
        .iter()
        .map(|state| (!state.is_air()).then(|| state.to_state_string()))
        .collect();
    if keys.iter().all(Option::is_none) {
        return Ok(0);
    }

    let mut written = 0;
    for y in 0..SECTION_SIZE {
        for z in 0..SECTION_SIZE {
            for x in 0..SECTION_SIZE {
                let index = if options.strict {
                    section.checked_palette_index_at(x, y, z)?
                } else {
                    section.palette_index_at(x, y, z)
                };
                let Some(Some(key)) = index.map(|i| &keys[i]) else {
                    continue;
                };
                if schem.set_block(base[0] + x, base[1] + y, base[2] + z, key)? {
                    written += 1;
                }
            }
        }
    }
    Ok(written)
}

fn record_id(record: &Record) -> Option<String> {
    ["id", "Id"]
        .into_iter()
        .filter_map(|key| record::get_str(record, key))
        .find(|id| !id.is_empty())
        .map(str::to_string)
}

fn strip_keys(mut record: Record, keys: &[&str]) -> Record {
    for key in keys {
        record.remove(*key);
    }
    record
}

/// Tile entity with schematic-relative `Pos`. `None` when the id or any
/// coordinate is missing.
fn adjust_block_entity(te: Record, origin: [i64; 3]) -> Option<BlockEntity> {
    let id = record_id(&te)?;
    let x = record::get_int(&te, "x")?;
    let y = record::get_int(&te, "y")?;
    let z = record::get_int(&te, "z")?;

    Some(BlockEntity {
        pos: [
            (x - origin[0]) as i32,
            (y - origin[1]) as i32,
            (z - origin[2]) as i32,
        ],
        id,
        data: strip_keys(te, &BLOCK_ENTITY_KEYS),
    })
}

/// Entity with schematic-relative `Pos`. `None` when the id or `Pos` is missing.
fn adjust_entity(ent: Record, origin: [i64; 3]) -> Option<Entity> {
    let id = record_id(&ent)?;
    let [px, py, pz] = record::get_f64_triple(&ent, "Pos")?;

    Some(Entity {
        pos: [
            px - origin[0] as f64,
            py - origin[1] as f64,
            pz - origin[2] as f64,
        ],
        id,
        data: strip_keys(ent, &ENTITY_KEYS),
    })
}

fn inside(pos: [f64; 3], dims: [usize; 3]) -> bool {
    pos.iter().zip(dims).all(|(&p, d)| p >= 0.0 && p < d as f64)
}
