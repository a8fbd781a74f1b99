/// Player body, sensors, and per-tick control.
///
/// The player is a compound body: one solid core plus three sensors.
///
/// ```text
///        ┌──────┐
///   left │ main │ right     left/right: wall feelers, 1px wide
///        │      │           bottom: ground probe under the feet
///        └─◦──◦─┘
///          bottom
/// ```
///
/// Sensor contacts set the frame's touch flags; the update pass then
/// reads those flags to decide grounded movement, wall suppression, and
/// jump eligibility. The flags are cleared at the top of every step, so
/// "touching" always means "touching this tick".

use glam::Vec2;

use crate::physics::{BodyId, ContactEvent, ContactTarget, Part, PartRef, PhysicsWorld};
use crate::sim::contact::{ContactRouter, Filter, SubscriptionHandle, TargetMatch};
use crate::sim::event::GameEvent;
use crate::sim::input::{Action, InputFrame};
use crate::sim::store::DEFAULT_ENTRY;
use crate::sim::world::World;

// Core is slightly narrower than a tile; feelers poke just past it.
const MAIN_HALF: Vec2 = Vec2::new(19.2, 32.0);
const BOTTOM_OFFSET: Vec2 = Vec2::new(0.0, 32.0);
const BOTTOM_HALF: Vec2 = Vec2::new(8.0, 1.0);
const SIDE_OFFSET_X: f32 = 22.4;
const SIDE_HALF: Vec2 = Vec2::new(1.0, 16.0);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Pose {
    Idle,
    Run,
    Airborne,
}

/// Per-tick sensor results. Reset before the physics step, written by
/// contact callbacks, read by the update pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct TouchState {
    pub left: bool,
    pub right: bool,
    pub ground: bool,
}

pub struct PlayerController {
    pub body: BodyId,
    pub main: PartRef,
    pub sensor_bottom: PartRef,
    pub sensor_left: PartRef,
    pub sensor_right: PartRef,

    pub health: u32,
    /// Permanent max-health upgrades collected so far.
    pub max_bonus: u32,
    pub game_over: bool,
    /// Set on lethal contact; suppresses control until the reload.
    pub dying: bool,

    pub facing: Facing,
    pub pose: Pose,
    pub help_visible: bool,

    jump_cooldown: u32,
    destroyed: bool,
    subs: Vec<SubscriptionHandle>,
    lethal_sub: SubscriptionHandle,
}

impl PlayerController {
    /// Create the compound body in the physics world. Subscriptions are
    /// wired separately once the world context exists.
    pub fn spawn(physics: &mut PhysicsWorld, pos: Vec2, health: u32, max_bonus: u32) -> Self {
        let body = physics.add_body(
            pos,
            vec![
                Part::solid(Vec2::ZERO, MAIN_HALF),
                Part::sensor(BOTTOM_OFFSET, BOTTOM_HALF),
                Part::sensor(Vec2::new(-SIDE_OFFSET_X, 0.0), SIDE_HALF),
                Part::sensor(Vec2::new(SIDE_OFFSET_X, 0.0), SIDE_HALF),
            ],
        );
        PlayerController {
            body,
            main: PartRef { body, part: 0 },
            sensor_bottom: PartRef { body, part: 1 },
            sensor_left: PartRef { body, part: 2 },
            sensor_right: PartRef { body, part: 3 },
            health,
            max_bonus,
            game_over: false,
            dying: false,
            facing: Facing::Right,
            pose: Pose::Idle,
            help_visible: false,
            jump_cooldown: 0,
            destroyed: false,
            subs: vec![],
            lethal_sub: SubscriptionHandle::new(),
        }
    }

    /// Teardown for a world reload: detach every subscription, then drop
    /// the body. Idempotent.
    pub fn destroy(&mut self, physics: &mut PhysicsWorld) {
        if self.destroyed {
            return;
        }
        for h in &self.subs {
            h.cancel();
        }
        self.lethal_sub.cancel();
        physics.remove_body(self.body);
        self.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// Register the player's contact subscriptions.
pub(crate) fn wire(router: &mut ContactRouter<World>, player: &mut PlayerController) {
    // Sensors listen every phase: touch flags are re-derived per tick.
    let touch_sub = router.subscribe(
        Filter {
            parts: vec![player.sensor_bottom, player.sensor_left, player.sensor_right],
            target: TargetMatch::AnyTile,
            start: true,
            active: true,
        },
        |ev, w| on_sensor_contact(w, ev),
    );
    player.subs.push(touch_sub);

    // Lethal tiles only matter on first touch; the handler cancels this
    // itself so one brush with lava costs exactly one health.
    let lethal = SubscriptionHandle::new();
    router.subscribe_with(
        lethal.clone(),
        Filter {
            parts: vec![player.main],
            target: TargetMatch::AnyTile,
            start: true,
            active: false,
        },
        |ev, w| on_lethal_contact(w, ev),
    );
    player.lethal_sub = lethal;
}

fn on_sensor_contact(world: &mut World, ev: &ContactEvent) {
    let World { physics, touch, player, config, .. } = world;

    if ev.part == player.sensor_bottom {
        touch.ground = true;
    } else if ev.part == player.sensor_left {
        touch.left = true;
        // Sensors get no collision response; push the body off the wall
        // ourselves, leaving a sliver of overlap so contact persists.
        let push = ev.overlap - config.wall_margin;
        if push > 0.0 {
            if let Some(body) = physics.body_mut(player.body) {
                body.pos.x += push;
            }
        }
    } else if ev.part == player.sensor_right {
        touch.right = true;
        let push = ev.overlap - config.wall_margin;
        if push > 0.0 {
            if let Some(body) = physics.body_mut(player.body) {
                body.pos.x -= push;
            }
        }
    }
}

fn on_lethal_contact(world: &mut World, ev: &ContactEvent) {
    if !matches!(ev.target, ContactTarget::Tile { lethal: true }) {
        return;
    }
    let World {
        physics,
        player,
        graph,
        progress,
        effects,
        events,
        reload_requested,
        config,
        ..
    } = world;
    if player.dying || player.game_over {
        return;
    }

    player.lethal_sub.cancel();
    player.dying = true;

    player.health = player.health.saturating_sub(1);
    progress.set_health(player.health);
    events.push(GameEvent::PlayerDamaged { health: player.health });

    if player.health == 0 {
        // Out of health: the next run restarts from the graph's start.
        let start = graph.start().to_string();
        progress.set_current_map(&start);
        progress.set_entry_side(DEFAULT_ENTRY);
        events.push(GameEvent::GameOver);
    }

    physics.freeze(player.body);
    events.push(GameEvent::PlayerFroze);
    effects.fade_out(config.fade_ticks);
    *reload_requested = true;
}

/// Per-tick control pass. Runs after contact dispatch, so the touch
/// flags describe the current tick.
pub(crate) fn update(world: &mut World, frame: &InputFrame) {
    let World { physics, touch, player, map, progress, events, config, .. } = world;

    if player.destroyed {
        return;
    }

    // No help overlay on the game-over screen.
    if frame.pressed(Action::Help) && !player.game_over {
        player.help_visible = !player.help_visible;
        events.push(GameEvent::HelpToggled { visible: player.help_visible });
    }

    if player.game_over && frame.pressed(Action::Continue) {
        player.game_over = false;
        let full = config.max_health(player.max_bonus);
        player.health = full;
        progress.set_health(full);
        events.push(GameEvent::Continued { health: full });
    }

    if player.jump_cooldown > 0 {
        player.jump_cooldown -= 1;
    }

    if player.dying || player.game_over {
        return;
    }
    let Some(body) = physics.body_mut(player.body) else {
        return;
    };

    // Speed limit applies to carried-over velocity before new forces.
    body.vel.x = body.vel.x.clamp(-config.max_run_speed, config.max_run_speed);

    let on_ground = touch.ground;
    let climbing = map.in_ladder(body.pos);
    let accel = if on_ground {
        config.move_accel
    } else {
        config.move_accel * config.air_factor
    };

    let mut running = false;
    // Off the ground on a ladder, horizontal control is surrendered.
    let steer = on_ground || !climbing;
    if steer {
        if frame.held(Action::MoveLeft) {
            player.facing = Facing::Left;
            // Pushing into a wall mid-air would stick to it; suppress.
            if on_ground || !touch.left {
                body.force.x -= accel;
                running = true;
            }
        }
        if frame.held(Action::MoveRight) {
            player.facing = Facing::Right;
            if on_ground || !touch.right {
                body.force.x += accel;
                running = true;
            }
        }
    }

    if climbing {
        if frame.held(Action::MoveUp) {
            // Exceeds gravity, so the net per-tick motion is upward.
            body.force.y -= config.climb_accel;
            body.vel.x = 0.0;
        } else if !on_ground && frame.held(Action::MoveDown) {
            body.force.y += config.climb_accel;
        }
    } else if frame.held(Action::MoveUp) && on_ground && player.jump_cooldown == 0 {
        body.vel.y = -config.jump_speed;
        player.jump_cooldown = config.jump_cooldown_ticks;
        events.push(GameEvent::Jumped);
    }

    player.pose = if !on_ground {
        Pose::Airborne
    } else if running {
        Pose::Run
    } else {
        Pose::Idle
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_builds_compound_body() {
        let mut physics = PhysicsWorld::new(0.9);
        let p = PlayerController::spawn(&mut physics, Vec2::new(100.0, 50.0), 5, 0);

        let body = physics.body(p.body).unwrap();
        let parts = body.parts();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0].kind, crate::physics::PartKind::Solid);
        for part in &parts[1..] {
            assert_eq!(part.kind, crate::physics::PartKind::Sensor);
        }
        assert_eq!(p.facing, Facing::Right);
        assert_eq!(p.pose, Pose::Idle);
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut physics = PhysicsWorld::new(0.9);
        let mut p = PlayerController::spawn(&mut physics, Vec2::ZERO, 5, 0);
        p.destroy(&mut physics);
        p.destroy(&mut physics);
        assert!(p.is_destroyed());
        assert!(physics.body(p.body).is_none());
    }
}
