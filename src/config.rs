/// External tuning loader.
///
/// Reads `config.toml` from a host-supplied path. Falls back to defaults
/// if the file is missing or incomplete; the feel constants here are the
/// gameplay contract, not engine numerics.
///
/// Velocities and forces are per-tick quantities: the simulation advances
/// in fixed steps and never consults wall-clock time. Durations are
/// expressed in ticks (15 ticks ≈ 250 ms at 60 Hz).

use serde::Deserialize;
use std::path::Path;

// ── Public Tuning Struct ──

#[derive(Clone, Debug)]
pub struct Tuning {
    /// Downward velocity gained per tick.
    pub gravity: f32,
    /// Horizontal velocity gained per tick of held input while grounded.
    pub move_accel: f32,
    /// Multiplier on `move_accel` while airborne (air control is weaker
    /// so jumps feel committed).
    pub air_factor: f32,
    /// Hard cap on |vx|, enforced by direct velocity override.
    pub max_run_speed: f32,
    /// Upward velocity set on jump.
    pub jump_speed: f32,
    /// Vertical velocity gained per tick of held input on a ladder.
    pub climb_accel: f32,
    /// Overlap left between a wall sensor and the wall after positional
    /// correction, so the sensor keeps reporting contact at rest.
    pub wall_margin: f32,
    /// Ticks between jumps, long enough for the ground sensor to separate.
    pub jump_cooldown_ticks: u32,
    /// Ticks a fade effect runs before a scheduled world reload fires.
    pub fade_ticks: u32,
    /// Health without any collected max-health upgrades.
    pub base_health: u32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    tuning: TomlTuning,
}

#[derive(Deserialize, Debug)]
struct TomlTuning {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_move_accel")]
    move_accel: f32,
    #[serde(default = "default_air_factor")]
    air_factor: f32,
    #[serde(default = "default_max_run_speed")]
    max_run_speed: f32,
    #[serde(default = "default_jump_speed")]
    jump_speed: f32,
    #[serde(default = "default_climb_accel")]
    climb_accel: f32,
    #[serde(default = "default_wall_margin")]
    wall_margin: f32,
    #[serde(default = "default_jump_cooldown")]
    jump_cooldown_ticks: u32,
    #[serde(default = "default_fade_ticks")]
    fade_ticks: u32,
    #[serde(default = "default_base_health")]
    base_health: u32,
}

// ── Defaults ──

fn default_gravity() -> f32 { 0.9 }
fn default_move_accel() -> f32 { 0.35 }
fn default_air_factor() -> f32 { 0.5 }
fn default_max_run_speed() -> f32 { 7.0 }
fn default_jump_speed() -> f32 { 11.0 }
fn default_climb_accel() -> f32 { 1.5 }
fn default_wall_margin() -> f32 { 0.5 }
fn default_jump_cooldown() -> u32 { 15 }   // ≈250 ms at 60 Hz
fn default_fade_ticks() -> u32 { 15 }      // ≈250 ms at 60 Hz
fn default_base_health() -> u32 { 5 }

impl Default for TomlTuning {
    fn default() -> Self {
        TomlTuning {
            gravity: default_gravity(),
            move_accel: default_move_accel(),
            air_factor: default_air_factor(),
            max_run_speed: default_max_run_speed(),
            jump_speed: default_jump_speed(),
            climb_accel: default_climb_accel(),
            wall_margin: default_wall_margin(),
            jump_cooldown_ticks: default_jump_cooldown(),
            fade_ticks: default_fade_ticks(),
            base_health: default_base_health(),
        }
    }
}

impl Default for Tuning {
    fn default() -> Self {
        TomlTuning::default().into()
    }
}

impl From<TomlTuning> for Tuning {
    fn from(t: TomlTuning) -> Self {
        Tuning {
            gravity: t.gravity,
            move_accel: t.move_accel,
            air_factor: t.air_factor,
            max_run_speed: t.max_run_speed,
            jump_speed: t.jump_speed,
            climb_accel: t.climb_accel,
            wall_margin: t.wall_margin,
            jump_cooldown_ticks: t.jump_cooldown_ticks,
            fade_ticks: t.fade_ticks,
            base_health: t.base_health,
        }
    }
}

// ── Loading ──

impl Tuning {
    /// Load tuning from a toml file. Missing file or missing keys
    /// gracefully fall back to defaults; a malformed file is reported and
    /// ignored rather than aborting the host.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(_) => Tuning::default(),
        }
    }

    /// Parse tuning from toml text, falling back to defaults on error.
    pub fn from_toml_str(text: &str) -> Self {
        match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => cfg.tuning.into(),
            Err(e) => {
                log::warn!("tuning parse error, using defaults: {e}");
                Tuning::default()
            }
        }
    }

    /// Maximum health for a given collected bonus.
    #[inline]
    pub fn max_health(&self, bonus: u32) -> u32 {
        self.base_health + bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let t = Tuning::from_toml_str("");
        assert_eq!(t.max_run_speed, 7.0);
        assert_eq!(t.base_health, 5);
        assert_eq!(t.wall_margin, 0.5);
    }

    #[test]
    fn partial_override() {
        let t = Tuning::from_toml_str("[tuning]\njump_speed = 13.5\n");
        assert_eq!(t.jump_speed, 13.5);
        // untouched keys keep defaults
        assert_eq!(t.jump_cooldown_ticks, 15);
    }

    #[test]
    fn malformed_falls_back() {
        let t = Tuning::from_toml_str("[tuning\ngravity = ");
        assert_eq!(t.gravity, 0.9);
    }

    #[test]
    fn max_health_adds_bonus() {
        let t = Tuning::default();
        assert_eq!(t.max_health(0), 5);
        assert_eq!(t.max_health(2), 7);
    }
}
