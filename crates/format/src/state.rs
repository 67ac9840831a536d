use std::collections::HashMap;

/// Name of the state every position in an empty section resolves to.
pub const AIR: &str = "minecraft:air";

/// The air variants a converter treats as empty space.
pub const AIR_NAMES: [&str; 3] = [AIR, "minecraft:cave_air", "minecraft:void_air"];

/// A block state: namespaced name plus property map.
///
/// Equality is structural. The property map itself is unordered;
/// `to_state_string` sorts by key so equal states always get the same key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockState {
    pub name: String,
    pub properties: HashMap<String, String>,
}

impl BlockState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
        }
    }

    pub fn air() -> Self {
        Self::new(AIR)
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn is_air(&self) -> bool {
        AIR_NAMES.contains(&self.name.as_str())
    }

    /// Palette key, e.g. `minecraft:oak_stairs[facing=north,half=bottom]`.
    pub fn to_state_string(&self) -> String {
        if self.properties.is_empty() {
            return self.name.clone();
        }

        let mut props: Vec<(&String, &String)> = self.properties.iter().collect();
        props.sort();

        let mut key = String::with_capacity(64);
        key.push_str(&self.name);
        key.push('[');
        for (i, (k, v)) in props.into_iter().enumerate() {
            if i > 0 {
                key.push(',');
            }
            key.push_str(k);
            key.push('=');
            key.push_str(v);
        }
        key.push(']');
        key
    }
}
