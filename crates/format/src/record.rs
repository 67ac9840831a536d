//! Adapter between `fastnbt`'s dynamic `Value` tree and the typed records the
//! codec works with.
//!
//! Tile entities and entities are kept as dynamic records: their payload
//! schema depends on the entity type and the codec never interprets it.

use std::collections::HashMap;

use fastnbt::{LongArray, Value};
use serde::Deserialize;

use crate::error::{FormatError, Result};
use crate::state::BlockState;

/// A dynamic NBT compound: field name to value.
pub type Record = HashMap<String, Value>;

// ── Block states (serde) ────────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct BlockStatesNbt {
    #[serde(default)]
    palette: Vec<PaletteEntryNbt>,
    #[serde(default)]
    data: Option<LongArray>,
}

#[derive(Deserialize, Debug)]
struct PaletteEntryNbt {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Properties", default)]
    properties: Option<HashMap<String, String>>,
}

impl From<PaletteEntryNbt> for BlockState {
    fn from(entry: PaletteEntryNbt) -> Self {
        BlockState {
            name: entry.name,
            properties: entry.properties.unwrap_or_default(),
        }
    }
}

/// Decode a section's `block_states` compound into its palette and packed words.
pub fn read_block_states(bytes: &[u8]) -> Result<(Vec<BlockState>, Vec<i64>)> {
    let nbt: BlockStatesNbt = fastnbt::from_bytes(bytes)?;
    let palette = nbt.palette.into_iter().map(BlockState::from).collect();
    let data = nbt.data.map(|d| d.to_vec()).unwrap_or_default();
    Ok((palette, data))
}

// ── Entity lists ────────────────────────────────────────────────────────────

/// Decode a compound holding a single list field (`tileEntities`, `entities`)
/// and return the compound items of that list.
///
/// When `strict` is false any decode failure or shape mismatch yields an empty
/// list: a broken entity block should not cost the whole chunk. An absent
/// (zero-length) block is always an empty list.
pub fn read_record_list(bytes: &[u8], field: &'static str, strict: bool) -> Result<Vec<Record>> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    match parse_record_list(bytes, field) {
        Ok(records) => Ok(records),
        Err(reason) if strict => Err(FormatError::MalformedRecord { what: field, reason }),
        Err(reason) => {
            tracing::warn!("Ignoring malformed {} block: {}", field, reason);
            Ok(Vec::new())
        }
    }
}

fn parse_record_list(bytes: &[u8], field: &str) -> std::result::Result<Vec<Record>, String> {
    let mut container: Record = fastnbt::from_bytes(bytes).map_err(|e| e.to_string())?;

    let items = match container.remove(field) {
        Some(Value::List(items)) => items,
        Some(other) => return Err(format!("field `{field}` is not a list: {other:?}")),
        None => return Err(format!("missing field `{field}`")),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Compound(record) => Ok(record),
            other => Err(format!("item {i} of `{field}` is not a compound: {other:?}")),
        })
        .collect()
}

// ── Field helpers ───────────────────────────────────────────────────────────

/// Integer field, accepting any integral NBT kind (and doubles, truncated).
pub fn get_int(record: &Record, key: &str) -> Option<i64> {
    match record.get(key)? {
        Value::Byte(v) => Some(*v as i64),
        Value::Short(v) => Some(*v as i64),
        Value::Int(v) => Some(*v as i64),
        Value::Long(v) => Some(*v),
        Value::Double(v) => Some(*v as i64),
        _ => None,
    }
}

/// Floating point view of a numeric value.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Double(v) => Some(*v),
        Value::Float(v) => Some(*v as f64),
        Value::Byte(v) => Some(*v as f64),
        Value::Short(v) => Some(*v as f64),
        Value::Int(v) => Some(*v as f64),
        Value::Long(v) => Some(*v as f64),
        _ => None,
    }
}

pub fn get_str<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    match record.get(key)? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

/// First three numbers of a list field such as an entity's `Pos`.
pub fn get_f64_triple(record: &Record, key: &str) -> Option<[f64; 3]> {
    let Value::List(items) = record.get(key)? else {
        return None;
    };
    if items.len() < 3 {
        return None;
    }
    Some([as_f64(&items[0])?, as_f64(&items[1])?, as_f64(&items[2])?])
}
