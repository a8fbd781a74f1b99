/// Progression persistence — a flat string key/value surface.
///
/// ## Keys
///   `current_map`       id of the map node the player is in
///   `entry_side`        spawn point name for the next world construction
///   `health`            integer as string
///   `max_hp_bonus`      collected max-health upgrades, integer as string
///   `{map}_{item}`      "1" once the item on that map was collected
///
/// The store outlives every controller and graph object it configures: a
/// world reconstruction reads it once at build time and writes it only at
/// explicit state-changing points (health change, transition commit).
///
/// Missing or garbled values are recovered locally with documented
/// defaults (full health, start map, default spawn) — never propagated.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

// ══════════════════════════════════════════════════════════════
// Store trait + implementations
// ══════════════════════════════════════════════════════════════

pub trait ProgressionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store with shared ownership: clones see the same data, so a
/// host (or test) can keep a handle across world reconstructions.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    data: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.data.borrow_mut().insert(key.to_string(), value.to_string());
    }
}

/// File-backed store: key=value lines, rewritten on every set. Writes are
/// rare (health changes and transition commits), so simplicity wins.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    cache: HashMap<String, String>,
}

impl FileStore {
    pub fn open(path: PathBuf) -> Self {
        let mut cache = HashMap::new();
        if let Ok(content) = std::fs::read_to_string(&path) {
            for line in content.lines() {
                if let Some((k, v)) = line.split_once('=') {
                    cache.insert(k.trim().to_string(), v.trim().to_string());
                }
            }
        }
        FileStore { path, cache }
    }

    fn flush(&self) {
        let mut keys: Vec<&String> = self.cache.keys().collect();
        keys.sort();
        let mut out = String::with_capacity(256);
        for k in keys {
            out.push_str(k);
            out.push('=');
            out.push_str(&self.cache[k]);
            out.push('\n');
        }
        if let Err(e) = std::fs::write(&self.path, out) {
            log::warn!("progression write to {} failed: {e}", self.path.display());
        }
    }
}

impl ProgressionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.cache.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.cache.insert(key.to_string(), value.to_string());
        self.flush();
    }
}

// ══════════════════════════════════════════════════════════════
// Typed accessors
// ══════════════════════════════════════════════════════════════

pub const KEY_CURRENT_MAP: &str = "current_map";
pub const KEY_ENTRY_SIDE: &str = "entry_side";
pub const KEY_HEALTH: &str = "health";
pub const KEY_MAX_HP_BONUS: &str = "max_hp_bonus";

/// Entry side used when no traversal has happened yet (fresh session,
/// or after a game-over reset).
pub const DEFAULT_ENTRY: &str = "default";

/// Typed view over a raw store: parsing, clamping, and defaults live
/// here so callers never touch strings.
pub struct Progress {
    store: Box<dyn ProgressionStore>,
}

impl Progress {
    pub fn new(store: Box<dyn ProgressionStore>) -> Self {
        Progress { store }
    }

    // ── Traversal position ──

    pub fn current_map(&self, start: &str) -> String {
        self.store
            .get(KEY_CURRENT_MAP)
            .unwrap_or_else(|| start.to_string())
    }

    pub fn set_current_map(&mut self, map: &str) {
        self.store.set(KEY_CURRENT_MAP, map);
    }

    pub fn entry_side(&self) -> String {
        self.store
            .get(KEY_ENTRY_SIDE)
            .unwrap_or_else(|| DEFAULT_ENTRY.to_string())
    }

    pub fn set_entry_side(&mut self, side: &str) {
        self.store.set(KEY_ENTRY_SIDE, side);
    }

    // ── Health ──

    /// Stored health clamped to [0, max]. Missing or non-numeric values
    /// recover to full health.
    pub fn health(&self, max: u32) -> u32 {
        match self.store.get(KEY_HEALTH) {
            None => max,
            Some(raw) => match raw.parse::<u32>() {
                Ok(h) => h.min(max),
                Err(_) => {
                    log::warn!("unreadable health value {raw:?}, defaulting to full");
                    max
                }
            },
        }
    }

    pub fn set_health(&mut self, health: u32) {
        self.store.set(KEY_HEALTH, &health.to_string());
    }

    pub fn max_hp_bonus(&self) -> u32 {
        self.store
            .get(KEY_MAX_HP_BONUS)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    pub fn set_max_hp_bonus(&mut self, bonus: u32) {
        self.store.set(KEY_MAX_HP_BONUS, &bonus.to_string());
    }

    // ── One-shot collection flags ──

    fn flag_key(map: &str, item: &str) -> String {
        format!("{map}_{item}")
    }

    pub fn item_collected(&self, map: &str, item: &str) -> bool {
        self.store
            .get(&Self::flag_key(map, item))
            .is_some_and(|v| v == "1")
    }

    pub fn set_item_collected(&mut self, map: &str, item: &str) {
        self.store.set(&Self::flag_key(map, item), "1");
    }

    /// Raw access, for hosts that persist extra keys alongside ours.
    pub fn store_mut(&mut self) -> &mut dyn ProgressionStore {
        self.store.as_mut()
    }
}
