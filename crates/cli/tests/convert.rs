//! Conversion tests over in-memory slime worlds.

use std::collections::HashMap;
use std::io::Read;

use fastnbt::Value;
use flate2::read::GzDecoder;
use slime2schem::convert::{WorldBounds, convert};
use slime2schem_format::bits::{self, SECTION_VOLUME};
use slime2schem_format::record::Record;
use slime2schem_format::slime::{Chunk, Section, SlimeVersion, WorldFlags};
use slime2schem_format::{BlockState, DecodeOptions, SlimeWorld};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn world(chunks: Vec<Chunk>) -> SlimeWorld {
    SlimeWorld {
        version: SlimeVersion::V13,
        data_version: 3955,
        flags: WorldFlags::default(),
        chunks,
    }
}

fn chunk(x: i32, z: i32, sections: Vec<Section>) -> Chunk {
    Chunk {
        x,
        z,
        sections,
        ..Chunk::default()
    }
}

fn uniform(name: &str) -> Section {
    Section::new(vec![BlockState::new(name)], Vec::new())
}

fn record(fields: Vec<(&str, Value)>) -> Record {
    fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

#[test]
fn alternating_palette_maps_even_and_odd_indices() {
    // 2-entry palette → 4 bits, 16 entries per word; 64 packed indices.
    let indices: Vec<u16> = (0..64).map(|i| i % 2).collect();
    let section = Section::new(
        vec![BlockState::new("minecraft:stone"), BlockState::new("minecraft:dirt")],
        bits::pack(&indices, 4),
    );
    assert_eq!(section.data.len(), 4);

    let result = convert(world(vec![chunk(0, 0, vec![section])]), &DecodeOptions::default()).unwrap();
    let schem = &result.schematic;
    assert_eq!((schem.width(), schem.height(), schem.length()), (16, 16, 16));

    for i in 0..64 {
        let (x, z, y) = (i % 16, (i / 16) % 16, i / 256);
        let expected = if i % 2 == 0 { "minecraft:stone" } else { "minecraft:dirt" };
        assert_eq!(schem.block_at(x, y, z), Some(expected), "linear index {i}");
    }
    // Beyond the packed words every position falls back to palette entry 0.
    assert_eq!(schem.block_at(15, 15, 15), Some("minecraft:stone"));
    assert_eq!(result.total_blocks, SECTION_VOLUME);

    let palette: Vec<(&str, u16)> = schem.palette().collect();
    assert_eq!(
        palette,
        vec![("minecraft:air", 0), ("minecraft:stone", 1), ("minecraft:dirt", 2)]
    );
}

#[test]
fn air_variants_are_not_written() {
    let mut indices = vec![0u16; SECTION_VOLUME];
    indices[bits::section_index(4, 5, 6)] = 1;
    indices[bits::section_index(0, 0, 0)] = 2;
    let section = Section::new(
        vec![
            BlockState::new("minecraft:cave_air"),
            BlockState::new("minecraft:lantern").with_property("hanging", "true"),
            BlockState::air(),
        ],
        bits::pack(&indices, 4),
    );

    let result = convert(world(vec![chunk(0, 0, vec![section])]), &DecodeOptions::default()).unwrap();
    assert_eq!(result.total_blocks, 1);
    assert_eq!(result.schematic.block_at(4, 5, 6), Some("minecraft:lantern[hanging=true]"));
    assert_eq!(result.schematic.block_at(0, 0, 0), Some("minecraft:air"));
    assert_eq!(result.schematic.palette_len(), 2);
}

#[test]
fn bounds_and_offset_span_all_chunks() {
    let chunks = vec![
        chunk(-1, 2, vec![uniform("minecraft:stone")]),
        chunk(1, 3, vec![Section::default(), uniform("minecraft:glass")]),
    ];
    let bounds = WorldBounds::of(&chunks).unwrap();
    assert_eq!(bounds.origin(), [-16, 0, 32]);

    let result = convert(world(chunks), &DecodeOptions::default()).unwrap();
    let schem = &result.schematic;
    assert_eq!((schem.width(), schem.height(), schem.length()), (48, 32, 32));
    assert_eq!(schem.offset, [-24, 0, -16]);

    // Chunk (-1, 2) fills x 0..16, z 0..16, y 0..16.
    assert_eq!(schem.block_at(0, 0, 0), Some("minecraft:stone"));
    // Chunk (1, 3) has glass in its second section: x 32..48, z 16..32, y 16..32.
    assert_eq!(schem.block_at(32, 16, 16), Some("minecraft:glass"));
    assert_eq!(schem.block_at(32, 0, 16), Some("minecraft:air"));
    // Chunk (0, *) is absent and stays air.
    assert_eq!(schem.block_at(20, 0, 0), Some("minecraft:air"));
    assert_eq!(result.total_blocks, 2 * SECTION_VOLUME);
}

#[test]
fn world_without_sections_gets_one_slot() {
    let result = convert(world(vec![chunk(5, 5, Vec::new())]), &DecodeOptions::default()).unwrap();
    assert_eq!(result.schematic.height(), 16);
    assert_eq!(result.total_blocks, 0);
}

#[test]
fn empty_world_is_an_error() {
    assert!(convert(world(Vec::new()), &DecodeOptions::default()).is_err());
}

#[test]
fn strict_mode_rejects_truncated_packed_data() {
    let section = Section::new(
        vec![BlockState::new("minecraft:stone"), BlockState::new("minecraft:dirt")],
        vec![0x10],
    );
    let lenient = convert(world(vec![chunk(0, 0, vec![section.clone()])]), &DecodeOptions::tolerant());
    assert!(lenient.is_ok());

    let err = convert(world(vec![chunk(0, 0, vec![section])]), &DecodeOptions::strict())
        .err()
        .expect("strict conversion should fail");
    assert!(format!("{err:#}").contains("chunk (0, 0) section 0"));
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[test]
fn entities_are_shifted_and_clipped() {
    let mut c = chunk(-1, 0, vec![uniform("minecraft:stone")]);
    c.tile_entities.push(record(vec![
        ("id", Value::String("minecraft:chest".into())),
        ("x", Value::Int(-10)),
        ("y", Value::Int(3)),
        ("z", Value::Int(5)),
    ]));
    c.tile_entities.push(record(vec![("id", Value::String("minecraft:broken".into()))]));
    let pos = |x: f64, y: f64, z: f64| Value::List(vec![Value::Double(x), Value::Double(y), Value::Double(z)]);
    c.entities.push(record(vec![
        ("id", Value::String("minecraft:cow".into())),
        ("Pos", pos(-8.5, 2.0, 8.0)),
        ("Age", Value::Int(0)),
    ]));
    c.entities.push(record(vec![
        ("id", Value::String("minecraft:bat".into())),
        ("Pos", pos(-8.5, 40.0, 8.0)),
    ]));

    let result = convert(world(vec![c]), &DecodeOptions::default()).unwrap();
    let schem = &result.schematic;

    assert_eq!(schem.block_entities.len(), 1);
    assert_eq!(schem.block_entities[0].pos, [6, 3, 5]);
    assert_eq!(schem.block_entities[0].id, "minecraft:chest");

    assert_eq!(schem.entities.len(), 1, "the bat above the volume is dropped");
    assert_eq!(schem.entities[0].id, "minecraft:cow");
    assert_eq!(schem.entities[0].pos, [7.5, 2.0, 8.0]);
    assert_eq!(schem.entities[0].data.get("Age"), Some(&Value::Int(0)));
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

#[test]
fn saved_palette_matches_states_used() {
    let mut indices = vec![0u16; SECTION_VOLUME];
    for (i, idx) in indices.iter_mut().enumerate() {
        *idx = (i % 3) as u16;
    }
    let section = Section::new(
        vec![
            BlockState::air(),
            BlockState::new("minecraft:oak_log").with_property("axis", "y"),
            BlockState::new("minecraft:stone"),
        ],
        bits::pack(&indices, 4),
    );
    let result = convert(world(vec![chunk(0, 0, vec![section])]), &DecodeOptions::default()).unwrap();

    let bytes = result.schematic.save_to_vec().unwrap();
    let mut raw = Vec::new();
    GzDecoder::new(&bytes[..]).read_to_end(&mut raw).unwrap();
    let root: HashMap<String, Value> = fastnbt::from_bytes(&raw).unwrap();

    let Some(Value::Compound(schematic)) = root.get("Schematic") else {
        panic!("missing Schematic compound");
    };
    let Some(Value::Compound(blocks)) = schematic.get("Blocks") else {
        panic!("missing Blocks compound");
    };
    let Some(Value::Compound(palette)) = blocks.get("Palette") else {
        panic!("missing Palette compound");
    };

    let mut expected = HashMap::new();
    expected.insert("minecraft:air".to_string(), Value::Int(0));
    expected.insert("minecraft:oak_log[axis=y]".to_string(), Value::Int(1));
    expected.insert("minecraft:stone".to_string(), Value::Int(2));
    assert_eq!(palette, &expected);
    assert_eq!(schematic.get("DataVersion"), Some(&Value::Int(3955)));
}
