/// World assembly and the session step loop.
///
/// A [`Session`] owns everything with session lifetime: the level graph,
/// the preloaded map definitions, the progression store, and the effects
/// driver. Inside it lives one [`World`] at a time — the current map's
/// physics bodies, zones, player controller, and contact subscriptions.
///
/// Traversal and death both work the same way: persist the destination
/// state, start a fade, and set `reload_requested`. The reload itself is
/// deferred until the fade-out completes, so teardown never runs inside
/// the step that asked for it. Rebuilding reads everything back from the
/// store; there is no other channel between incarnations.

use std::collections::HashMap;
use std::rc::Rc;
use std::cell::Cell;

use glam::Vec2;
use thiserror::Error;

use crate::config::Tuning;
use crate::domain::graph::{Direction, GraphError, LevelGraph};
use crate::physics::{PartRef, PhysicsWorld, ZoneId};
use crate::sim::contact::{ContactRouter, Filter, SubscriptionHandle, TargetMatch};
use crate::sim::effects::Effects;
use crate::sim::event::GameEvent;
use crate::sim::exit::ExitEdge;
use crate::sim::input::InputFrame;
use crate::sim::level::{LevelError, MapDef, MapSource, ITEM_MAX_HP_UP};
use crate::sim::player::{self, Facing, PlayerController, Pose, TouchState};
use crate::sim::store::{Progress, ProgressionStore};

#[derive(Error, Debug)]
pub enum WorldError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("map {map:?} has no spawn point {spawn:?} required by an inbound edge")]
    MissingEntrySpawn { map: String, spawn: String },
    #[error("progression points at map {0:?} which is not in the level graph")]
    UnknownMap(String),
}

/// One incarnation of the playable world, plus the session-lifetime
/// collaborators the contact callbacks need to reach.
pub struct World {
    pub(crate) physics: PhysicsWorld,
    pub(crate) touch: TouchState,
    pub(crate) player: PlayerController,
    pub(crate) map: MapDef,
    pub(crate) graph: Rc<LevelGraph>,
    pub(crate) progress: Progress,
    pub(crate) effects: Box<dyn Effects>,
    pub(crate) events: Vec<GameEvent>,
    pub(crate) reload_requested: bool,
    pub(crate) config: Tuning,
}

/// Commit a traversal: persist destination + entry side, then schedule
/// the fade-gated reload. An exit whose graph edge disappeared is a data
/// bug; it is logged and ignored rather than crashing the session.
pub(crate) fn transition(world: &mut World, direction: Direction) {
    let Some(target) = world.graph.edge(&world.map.id, direction) else {
        log::warn!(
            "exit toward {} fired on {:?} but the graph has no such edge; ignored",
            direction.name(),
            world.map.id
        );
        return;
    };
    let target = target.to_string();
    let from = world.map.id.clone();

    // The player enters the next map from the side they left this one.
    world.progress.set_entry_side(direction.opposite().name());
    world.progress.set_current_map(&target);

    log::info!("leaving {from:?} toward {} for {target:?}", direction.name());
    world.events.push(GameEvent::TransitionStarted { from, to: target, direction });
    world.effects.fade_out(world.config.fade_ticks);
    world.reload_requested = true;
}

// ── Max-health collectible ──

/// One-shot trigger for the max-health-up item. Same cancellation
/// discipline as an exit edge.
struct ItemTrigger {
    handle: SubscriptionHandle,
}

impl ItemTrigger {
    fn cancel(&self) {
        self.handle.cancel();
    }
}

fn wire_item(router: &mut ContactRouter<World>, main: PartRef, zone: ZoneId) -> ItemTrigger {
    let fired = Rc::new(Cell::new(false));
    let handle = SubscriptionHandle::new();
    let h = handle.clone();
    router.subscribe_with(
        handle.clone(),
        Filter { parts: vec![main], target: TargetMatch::Zone(zone), start: true, active: false },
        move |_, w| {
            if fired.replace(true) {
                return;
            }
            h.cancel();
            let World { player, map, progress, effects, events, config, .. } = w;

            progress.set_item_collected(&map.id, ITEM_MAX_HP_UP);
            player.max_bonus += 1;
            progress.set_max_hp_bonus(player.max_bonus);

            // Picking it up also heals to the new maximum.
            let full = config.max_health(player.max_bonus);
            player.health = full;
            progress.set_health(full);

            effects.fade_in(config.fade_ticks);
            events.push(GameEvent::ItemCollected { map: map.id.clone() });
        },
    );
    ItemTrigger { handle }
}

// ══════════════════════════════════════════════════════════════
// Session
// ══════════════════════════════════════════════════════════════

pub struct Session {
    world: World,
    router: ContactRouter<World>,
    maps: Rc<HashMap<String, MapDef>>,
    exits: Vec<ExitEdge>,
    item: Option<ItemTrigger>,
}

impl Session {
    /// Preload every map the graph names, cross-validate entry spawns
    /// against inbound edges, and build the first world from whatever the
    /// store says (fresh stores land on the start map at full health).
    pub fn new(
        graph: LevelGraph,
        source: &dyn MapSource,
        store: Box<dyn ProgressionStore>,
        effects: Box<dyn Effects>,
        config: Tuning,
    ) -> Result<Self, WorldError> {
        let mut maps = HashMap::new();
        for id in graph.node_ids() {
            maps.insert(id.to_string(), source.load(id)?);
        }
        for (from, direction, to) in graph.all_edges() {
            let spawn = direction.opposite().name();
            if maps[to].spawn(spawn).is_none() {
                return Err(WorldError::MissingEntrySpawn {
                    map: to.to_string(),
                    spawn: spawn.to_string(),
                });
            }
            // Inert data, not fatal: the edge just can't be taken.
            if maps[from].exit(direction).is_none() {
                log::warn!(
                    "graph edge {from:?} --{}--> {to:?} has no authored exit zone",
                    direction.name()
                );
            }
        }

        let graph = Rc::new(graph);
        let maps = Rc::new(maps);
        let progress = Progress::new(store);
        let mut router = ContactRouter::new();

        let (physics, map, player, exits, item) =
            build_incarnation(&graph, &maps, &config, &progress, &mut router)?;

        let mut world = World {
            physics,
            touch: TouchState::default(),
            player,
            map,
            graph,
            progress,
            effects,
            events: Vec::new(),
            reload_requested: false,
            config,
        };
        announce(&mut world);

        Ok(Session { world, router, maps, exits, item })
    }

    /// Advance the simulation one tick.
    ///
    /// Order matters: touch flags reset, physics, contact dispatch,
    /// control update, effects, then the fade-gated reload. Callbacks
    /// therefore always run against a world that outlives the dispatch.
    pub fn step(&mut self, frame: &InputFrame) -> Result<Vec<GameEvent>, WorldError> {
        self.world.touch = TouchState::default();
        let contacts = self.world.physics.step();
        self.router.dispatch(&contacts, &mut self.world);
        player::update(&mut self.world, frame);
        self.world.effects.tick();

        if self.world.reload_requested && self.world.effects.fade_out_complete() {
            self.rebuild()?;
        }
        Ok(std::mem::take(&mut self.world.events))
    }

    /// Tear the current incarnation down and build the next from the
    /// store. The store and effects driver carry over; nothing else does.
    fn rebuild(&mut self) -> Result<(), WorldError> {
        {
            let World { player, physics, .. } = &mut self.world;
            player.destroy(physics);
        }
        for exit in self.exits.drain(..) {
            exit.cancel();
        }
        if let Some(item) = self.item.take() {
            item.cancel();
        }
        self.router.clear();

        let (physics, map, player, exits, item) = build_incarnation(
            &self.world.graph,
            &self.maps,
            &self.world.config,
            &self.world.progress,
            &mut self.router,
        )?;
        self.world.physics = physics;
        self.world.map = map;
        self.world.player = player;
        self.world.touch = TouchState::default();
        self.world.reload_requested = false;
        self.exits = exits;
        self.item = item;

        announce(&mut self.world);
        Ok(())
    }

    // ── Read access for hosts ──

    pub fn map_id(&self) -> &str {
        &self.world.map.id
    }

    pub fn map(&self) -> &MapDef {
        &self.world.map
    }

    pub fn player_pos(&self) -> Option<Vec2> {
        self.world.physics.body(self.world.player.body).map(|b| b.pos)
    }

    pub fn health(&self) -> u32 {
        self.world.player.health
    }

    pub fn max_health(&self) -> u32 {
        self.world.config.max_health(self.world.player.max_bonus)
    }

    pub fn is_game_over(&self) -> bool {
        self.world.player.game_over
    }

    pub fn is_dying(&self) -> bool {
        self.world.player.dying
    }

    pub fn pose(&self) -> Pose {
        self.world.player.pose
    }

    pub fn facing(&self) -> Facing {
        self.world.player.facing
    }

    pub fn help_visible(&self) -> bool {
        self.world.player.help_visible
    }

    pub fn touch(&self) -> TouchState {
        self.world.touch
    }

    /// Directions with a live exit trigger in this incarnation (authored
    /// zone AND graph edge both present).
    pub fn exit_directions(&self) -> Vec<Direction> {
        self.exits.iter().map(|e| e.direction).collect()
    }
}

fn announce(world: &mut World) {
    let entry = world.progress.entry_side();
    log::info!("world ready: map {:?}, entry {entry:?}", world.map.id);
    world.events.push(GameEvent::MapLoaded { map: world.map.id.clone(), entry });
}

/// Build the per-incarnation pieces for whatever map the store names.
fn build_incarnation(
    graph: &LevelGraph,
    maps: &HashMap<String, MapDef>,
    config: &Tuning,
    progress: &Progress,
    router: &mut ContactRouter<World>,
) -> Result<(PhysicsWorld, MapDef, PlayerController, Vec<ExitEdge>, Option<ItemTrigger>), WorldError>
{
    let map_id = progress.current_map(graph.start());
    let map = maps
        .get(&map_id)
        .ok_or_else(|| WorldError::UnknownMap(map_id.clone()))?
        .clone();
    let entry = progress.entry_side();
    let spawn = map.spawn(&entry).ok_or_else(|| WorldError::MissingEntrySpawn {
        map: map.id.clone(),
        spawn: entry.clone(),
    })?;

    let mut physics = PhysicsWorld::new(config.gravity);
    for tile in &map.solids {
        physics.add_tile(tile.aabb, tile.lethal);
    }

    let bonus = progress.max_hp_bonus();
    let health = progress.health(config.max_health(bonus));
    let mut player = PlayerController::spawn(&mut physics, spawn, health, bonus);
    // Zero stored health means the last run ended; hold the game-over
    // state until Continue.
    player.game_over = health == 0;
    player::wire(router, &mut player);

    let mut exits = Vec::new();
    for (direction, rect) in &map.exits {
        // An authored exit with no matching graph edge stays inert.
        if graph.edge(&map.id, *direction).is_none() {
            continue;
        }
        let zone = physics.add_zone(*rect);
        exits.push(ExitEdge::wire(router, player.main, zone, *direction));
    }

    let mut item = None;
    if let Some(rect) = map.item {
        if !progress.item_collected(&map.id, ITEM_MAX_HP_UP) {
            let zone = physics.add_zone(rect);
            item = Some(wire_item(router, player.main, zone));
        }
    }

    Ok((physics, map, player, exits, item))
}
