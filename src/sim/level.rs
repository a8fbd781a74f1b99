/// Map definitions — the World/Node Loader boundary.
///
/// A map is authored data: a tile grid, named spawn points, and named
/// rectangular zones. The core treats it as opaque input and validates it
/// loudly at load time; nothing here is generated.
///
/// ## TOML format
///   ```toml
///   tile_size = 64.0
///   rows = [
///       "####................",
///       "#..................#",
///       "#######..~~..#######",
///   ]
///
///   [spawns]
///   default = [160.0, 64.0]
///   left    = [96.0, 64.0]
///
///   [[zones]]
///   kind = "exit"
///   direction = "right"
///   rect = [1216.0, 0.0, 64.0, 128.0]
///
///   [[zones]]
///   kind = "ladder"
///   rect = [320.0, 0.0, 64.0, 128.0]
///
///   [[zones]]
///   kind = "max-health-up"
///   rect = [640.0, 32.0, 64.0, 64.0]
///   ```
///
/// ## Tile legend
///   '#' = solid    '~' = lava (solid + lethal)    anything else = empty

use std::collections::HashMap;
use std::path::PathBuf;

use glam::Vec2;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::geom::Aabb;
use crate::domain::graph::Direction;

/// Storage suffix for the max-health collectible's one-shot flag.
pub const ITEM_MAX_HP_UP: &str = "max_hp_up";

#[derive(Error, Debug)]
pub enum LevelError {
    #[error("map {0:?} could not be read: {1}")]
    Io(String, std::io::Error),
    #[error("map {0:?} parse error: {1}")]
    Parse(String, toml::de::Error),
    #[error("map {map:?}: zone kind {kind:?} is not known")]
    UnknownZoneKind { map: String, kind: String },
    #[error("map {map:?}: exit zone needs a valid direction, got {direction:?}")]
    BadExitDirection { map: String, direction: String },
    #[error("map {map:?} defines no spawn point {spawn:?}")]
    MissingSpawn { map: String, spawn: String },
}

/// A tile's collision rectangle plus its lethal tag.
#[derive(Clone, Copy, Debug)]
pub struct TileDef {
    pub aabb: Aabb,
    pub lethal: bool,
}

/// One fully loaded, validated map node.
#[derive(Clone, Debug)]
pub struct MapDef {
    pub id: String,
    pub tile_size: f32,
    pub solids: Vec<TileDef>,
    pub spawns: HashMap<String, Vec2>,
    pub ladders: Vec<Aabb>,
    pub exits: Vec<(Direction, Aabb)>,
    /// Max-health-up item region, at most one per map.
    pub item: Option<Aabb>,
}

impl MapDef {
    /// Spawn point for a named entry side. Absence is a configuration
    /// error surfaced by the caller.
    pub fn spawn(&self, name: &str) -> Option<Vec2> {
        self.spawns.get(name).copied()
    }

    /// Exit zone authored for a direction, if any.
    pub fn exit(&self, direction: Direction) -> Option<Aabb> {
        self.exits
            .iter()
            .find(|(d, _)| *d == direction)
            .map(|(_, r)| *r)
    }

    /// Is the point inside any ladder region? True two-axis containment.
    pub fn in_ladder(&self, p: Vec2) -> bool {
        self.ladders.iter().any(|l| l.contains(p))
    }
}

// ── TOML schema ──

#[derive(Deserialize)]
struct TomlMap {
    #[serde(default = "default_tile_size")]
    tile_size: f32,
    #[serde(default)]
    rows: Vec<String>,
    #[serde(default)]
    spawns: HashMap<String, [f32; 2]>,
    #[serde(default)]
    zones: Vec<TomlZone>,
}

#[derive(Deserialize)]
struct TomlZone {
    kind: String,
    #[serde(default)]
    direction: Option<String>,
    rect: [f32; 4],
}

fn default_tile_size() -> f32 {
    64.0
}

impl MapDef {
    pub fn from_toml_str(id: &str, text: &str) -> Result<Self, LevelError> {
        let raw: TomlMap =
            toml::from_str(text).map_err(|e| LevelError::Parse(id.to_string(), e))?;

        let ts = raw.tile_size;
        let mut solids = Vec::new();
        for (y, row) in raw.rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let lethal = match ch {
                    '#' => false,
                    '~' => true,
                    _ => continue,
                };
                solids.push(TileDef {
                    aabb: Aabb::from_xywh(x as f32 * ts, y as f32 * ts, ts, ts),
                    lethal,
                });
            }
        }

        let spawns = raw
            .spawns
            .into_iter()
            .map(|(name, [x, y])| (name, Vec2::new(x, y)))
            .collect();

        let mut ladders = Vec::new();
        let mut exits = Vec::new();
        let mut item = None;
        for zone in raw.zones {
            let [x, y, w, h] = zone.rect;
            let rect = Aabb::from_xywh(x, y, w, h);
            match zone.kind.as_str() {
                "ladder" => ladders.push(rect),
                "exit" => {
                    let dir_str = zone.direction.unwrap_or_default();
                    let direction = Direction::parse(&dir_str).ok_or_else(|| {
                        LevelError::BadExitDirection {
                            map: id.to_string(),
                            direction: dir_str,
                        }
                    })?;
                    exits.push((direction, rect));
                }
                "max-health-up" => item = Some(rect),
                other => {
                    return Err(LevelError::UnknownZoneKind {
                        map: id.to_string(),
                        kind: other.to_string(),
                    })
                }
            }
        }

        let def = MapDef {
            id: id.to_string(),
            tile_size: ts,
            solids,
            spawns,
            ladders,
            exits,
            item,
        };

        // Every map must be enterable without traversal history.
        if def.spawn(crate::sim::store::DEFAULT_ENTRY).is_none() {
            return Err(LevelError::MissingSpawn {
                map: id.to_string(),
                spawn: crate::sim::store::DEFAULT_ENTRY.to_string(),
            });
        }

        Ok(def)
    }
}

// ══════════════════════════════════════════════════════════════
// Sources
// ══════════════════════════════════════════════════════════════

/// Yields map definitions by id. The session preloads every node of the
/// graph through this at construction, so traversal never does IO.
pub trait MapSource {
    fn load(&self, id: &str) -> Result<MapDef, LevelError>;
}

/// Reads `{id}.toml` from a directory.
pub struct TomlMapSource {
    dir: PathBuf,
}

impl TomlMapSource {
    pub fn new(dir: PathBuf) -> Self {
        TomlMapSource { dir }
    }
}

impl MapSource for TomlMapSource {
    fn load(&self, id: &str) -> Result<MapDef, LevelError> {
        let path = self.dir.join(format!("{id}.toml"));
        let text = std::fs::read_to_string(&path)
            .map_err(|e| LevelError::Io(id.to_string(), e))?;
        MapDef::from_toml_str(id, &text)
    }
}

/// Maps embedded as toml strings; the usual choice for tests and for
/// hosts that ship levels inside the binary.
pub struct EmbeddedMapSource {
    maps: HashMap<String, String>,
}

impl EmbeddedMapSource {
    pub fn new() -> Self {
        EmbeddedMapSource { maps: HashMap::new() }
    }

    pub fn with_map(mut self, id: &str, toml_text: &str) -> Self {
        self.maps.insert(id.to_string(), toml_text.to_string());
        self
    }
}

impl Default for EmbeddedMapSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MapSource for EmbeddedMapSource {
    fn load(&self, id: &str) -> Result<MapDef, LevelError> {
        let text = self.maps.get(id).ok_or_else(|| {
            LevelError::Io(
                id.to_string(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no embedded map"),
            )
        })?;
        MapDef::from_toml_str(id, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = r##########"
tile_size = 64.0
rows = [
    "....................",
    "....................",
    "#######..~~..#######",
]

[spawns]
default = [160.0, 64.0]
left = [96.0, 64.0]

[[zones]]
kind = "exit"
direction = "right"
rect = [1216.0, 0.0, 64.0, 128.0]

[[zones]]
kind = "ladder"
rect = [320.0, 0.0, 64.0, 128.0]
"##########;

    #[test]
    fn parses_tiles_spawns_zones() {
        let def = MapDef::from_toml_str("map_1", MAP).unwrap();
        // 7 + 2 lava + 7 solid cells in the bottom row
        assert_eq!(def.solids.len(), 16);
        assert_eq!(def.solids.iter().filter(|t| t.lethal).count(), 2);
        assert_eq!(def.spawn("default"), Some(Vec2::new(160.0, 64.0)));
        assert_eq!(def.exits.len(), 1);
        assert!(def.exit(Direction::Right).is_some());
        assert!(def.exit(Direction::Left).is_none());
    }

    #[test]
    fn ladder_containment_needs_both_axes() {
        let def = MapDef::from_toml_str("map_1", MAP).unwrap();
        assert!(def.in_ladder(Vec2::new(350.0, 60.0)));
        // Same x-range, below the region: must be outside.
        assert!(!def.in_ladder(Vec2::new(350.0, 500.0)));
    }

    #[test]
    fn missing_default_spawn_is_fatal() {
        let err = MapDef::from_toml_str("m", "rows = [\"#\"]\n");
        assert!(matches!(err, Err(LevelError::MissingSpawn { .. })));
    }

    #[test]
    fn unknown_zone_kind_is_fatal() {
        let text = r##########"
rows = []
[spawns]
default = [0.0, 0.0]
[[zones]]
kind = "teleporter"
rect = [0.0, 0.0, 1.0, 1.0]
"##########;
        let err = MapDef::from_toml_str("m", text);
        assert!(matches!(err, Err(LevelError::UnknownZoneKind { .. })));
    }

    #[test]
    fn exit_without_direction_is_fatal() {
        let text = r##########"
rows = []
[spawns]
default = [0.0, 0.0]
[[zones]]
kind = "exit"
rect = [0.0, 0.0, 1.0, 1.0]
"##########;
        let err = MapDef::from_toml_str("m", text);
        assert!(matches!(err, Err(LevelError::BadExitDirection { .. })));
    }

    #[test]
    fn embedded_source_misses_loudly() {
        let src = EmbeddedMapSource::new();
        assert!(src.load("nope").is_err());
    }
}
