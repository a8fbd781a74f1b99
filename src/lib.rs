/// lavarun — a side-scrolling platformer's gameplay core.
///
/// Two tightly coupled subsystems:
///
///   **Player Controller** — a compound rigid body (solid main shape plus
///   left/right/bottom touch sensors) driven by coalesced logical input and
///   discrete contact events: movement, jumping, ladder climbing, damage,
///   and the death/respawn state machine.
///
///   **Level Graph & Exit System** — the world as a directed graph of map
///   nodes connected by named directions. One-shot exit triggers commit a
///   transition that persists minimal progression state (current map, entry
///   side, health, collected upgrades) and rebuilds the live world once a
///   fade effect completes.
///
/// The crate is embeddable: there is no binary, no renderer, and no input
/// backend. A host feeds key events into [`sim::input::InputCollector`],
/// calls [`sim::world::Session::step`] once per frame, and consumes the
/// returned [`sim::event::GameEvent`]s for animation/sound/UI.
///
/// Layering follows domain (pure types and queries) → physics (tick-based
/// collision and contact reporting) → sim (stateful world, step pipeline).

pub mod config;
pub mod domain;
pub mod physics;
pub mod sim;

pub use config::Tuning;
pub use domain::graph::{Direction, LevelGraph, MapNode};
pub use sim::event::GameEvent;
pub use sim::input::{Action, InputCollector, InputFrame, Keycode};
pub use sim::level::{EmbeddedMapSource, MapDef, MapSource, TomlMapSource};
pub use sim::store::{FileStore, MemoryStore, ProgressionStore};
pub use sim::world::{Session, WorldError};
