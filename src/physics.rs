/// Step-based physics world — the contact-reporting collaborator.
///
/// ## Architecture
///
/// Three kinds of geometry:
///   1. TILES  — static solid rectangles (world collision), optionally
///      tagged lethal. Solid body parts collide with them; sensor parts
///      only report overlap.
///   2. ZONES  — static sensor rectangles (exits, collectibles). No
///      collision response ever; overlap of a solid part is reported.
///   3. BODIES — dynamic compound bodies: one or more parts rigidly
///      attached to a shared position. Fixed orientation (no rotation
///      response). A part is either `Solid` (collides) or `Sensor`
///      (notifications only).
///
/// ## Step model
///
/// Per-tick semantics, no wall-clock dt: velocities are units per step,
/// forces are velocity deltas consumed by the next step. Each `step()`:
///
///   1. Integrate: `vel += gravity + force; pos += vel` (frozen bodies skip)
///   2. Resolve: solid parts are pushed out of tiles along the minimal
///      axis; the opposing velocity component is zeroed. Contacts are
///      recorded with their pre-resolution overlap depth.
///   3. Report: sensor-part/tile and solid-part/zone overlaps are recorded
///      post-resolution.
///
/// Every contact carries a phase — `Start` on the first overlapping step
/// of a pair, `Active` on each following step — and the penetration depth
/// along the minimal axis. Pair identity is tracked across steps so
/// separation re-arms `Start`.

use std::collections::HashSet;

use glam::Vec2;

use crate::domain::geom::Aabb;

// ══════════════════════════════════════════════════════════════
// Identifiers
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BodyId(usize);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ZoneId(usize);

/// A sub-shape of a compound body. Contact events are tagged with the
/// part that matched, so a controller can tell its left wall sensor from
/// its ground sensor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PartRef {
    pub body: BodyId,
    pub part: usize,
}

// ══════════════════════════════════════════════════════════════
// Bodies and parts
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PartKind {
    /// Collides with tiles and is pushed out of them.
    Solid,
    /// Reports overlap only; never generates collision response.
    Sensor,
}

#[derive(Clone, Copy, Debug)]
pub struct Part {
    pub kind: PartKind,
    /// Offset of the part's center from the body position.
    pub offset: Vec2,
    /// Half extents of the part's rectangle.
    pub half: Vec2,
}

impl Part {
    pub fn solid(offset: Vec2, half: Vec2) -> Self {
        Part { kind: PartKind::Solid, offset, half }
    }

    pub fn sensor(offset: Vec2, half: Vec2) -> Self {
        Part { kind: PartKind::Sensor, offset, half }
    }
}

#[derive(Clone, Debug)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Velocity delta applied (and cleared) by the next step.
    pub force: Vec2,
    /// Frozen bodies skip integration and resolution but still report
    /// contacts. Used for the death freeze.
    pub frozen: bool,
    parts: Vec<Part>,
}

impl Body {
    /// World-space rectangle of one part at the body's current position.
    pub fn part_aabb(&self, part: usize) -> Aabb {
        let p = &self.parts[part];
        Aabb::from_center_half(self.pos + p.offset, p.half)
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }
}

// ══════════════════════════════════════════════════════════════
// Contact events
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ContactPhase {
    /// First step this pair overlaps.
    Start,
    /// Pair was already overlapping on the previous step.
    Active,
}

/// What the body part made contact with. Tagged explicitly so handlers
/// never inspect payloads to guess the other side's kind.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ContactTarget {
    Tile { lethal: bool },
    Zone { id: ZoneId },
}

#[derive(Clone, Copy, Debug)]
pub struct ContactEvent {
    pub phase: ContactPhase,
    pub part: PartRef,
    pub target: ContactTarget,
    /// Penetration depth along the minimal axis, pre-resolution for solid
    /// parts. This is the number wall correction subtracts its margin from.
    pub overlap: f32,
}

// ── Pair identity, tracked across steps for Start/Active phases ──

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum TargetKey {
    Tile(usize),
    Zone(usize),
}

type ContactKey = (usize, usize, TargetKey);

// ══════════════════════════════════════════════════════════════
// World
// ══════════════════════════════════════════════════════════════

struct TileCollider {
    aabb: Aabb,
    lethal: bool,
}

struct Zone {
    aabb: Aabb,
}

pub struct PhysicsWorld {
    gravity: f32,
    tiles: Vec<TileCollider>,
    zones: Vec<Zone>,
    bodies: Vec<Option<Body>>,
    prev_contacts: HashSet<ContactKey>,
}

impl PhysicsWorld {
    pub fn new(gravity: f32) -> Self {
        PhysicsWorld {
            gravity,
            tiles: vec![],
            zones: vec![],
            bodies: vec![],
            prev_contacts: HashSet::new(),
        }
    }

    // ── Construction ──

    pub fn add_tile(&mut self, aabb: Aabb, lethal: bool) {
        self.tiles.push(TileCollider { aabb, lethal });
    }

    pub fn add_zone(&mut self, aabb: Aabb) -> ZoneId {
        self.zones.push(Zone { aabb });
        ZoneId(self.zones.len() - 1)
    }

    pub fn add_body(&mut self, pos: Vec2, parts: Vec<Part>) -> BodyId {
        self.bodies.push(Some(Body {
            pos,
            vel: Vec2::ZERO,
            force: Vec2::ZERO,
            frozen: false,
            parts,
        }));
        BodyId(self.bodies.len() - 1)
    }

    // ── Access ──

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0).and_then(Option::as_ref)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Make a body immovable. Contacts keep being reported.
    pub fn freeze(&mut self, id: BodyId) {
        if let Some(b) = self.body_mut(id) {
            b.frozen = true;
            b.vel = Vec2::ZERO;
            b.force = Vec2::ZERO;
        }
    }

    /// Remove a body. Pending pair state is purged so a recycled slot
    /// cannot inherit stale `Active` phases.
    pub fn remove_body(&mut self, id: BodyId) {
        if let Some(slot) = self.bodies.get_mut(id.0) {
            *slot = None;
        }
        self.prev_contacts.retain(|&(body, _, _)| body != id.0);
    }

    // ── Step ──

    /// Advance one tick and report every contact, in deterministic order
    /// (bodies, then parts, then tiles/zones, each in insertion order).
    pub fn step(&mut self) -> Vec<ContactEvent> {
        let mut records: Vec<(ContactKey, ContactEvent)> = Vec::new();

        for body_idx in 0..self.bodies.len() {
            let Some(mut body) = self.bodies[body_idx].take() else { continue };

            if !body.frozen {
                body.vel.y += self.gravity;
                body.vel += body.force;
                body.force = Vec2::ZERO;
                body.pos += body.vel;
            }

            // Solid parts: resolve against tiles, recording pre-push overlap.
            for part_idx in 0..body.parts.len() {
                if body.parts[part_idx].kind != PartKind::Solid {
                    continue;
                }
                for (tile_idx, tile) in self.tiles.iter().enumerate() {
                    let aabb = body.part_aabb(part_idx);
                    let Some(depth) = aabb.overlap(&tile.aabb) else { continue };

                    records.push((
                        (body_idx, part_idx, TargetKey::Tile(tile_idx)),
                        ContactEvent {
                            phase: ContactPhase::Start, // fixed up below
                            part: PartRef { body: BodyId(body_idx), part: part_idx },
                            target: ContactTarget::Tile { lethal: tile.lethal },
                            overlap: depth.min_element(),
                        },
                    ));

                    if !body.frozen {
                        resolve_push(&mut body, &aabb, &tile.aabb, depth);
                    }
                }
            }

            // Sensor parts vs tiles, solid parts vs zones: report only,
            // after the solid resolution settled the body position.
            for part_idx in 0..body.parts.len() {
                let part_kind = body.parts[part_idx].kind;
                let aabb = body.part_aabb(part_idx);

                if part_kind == PartKind::Sensor {
                    for (tile_idx, tile) in self.tiles.iter().enumerate() {
                        if let Some(depth) = aabb.overlap(&tile.aabb) {
                            records.push((
                                (body_idx, part_idx, TargetKey::Tile(tile_idx)),
                                ContactEvent {
                                    phase: ContactPhase::Start,
                                    part: PartRef { body: BodyId(body_idx), part: part_idx },
                                    target: ContactTarget::Tile { lethal: tile.lethal },
                                    overlap: depth.min_element(),
                                },
                            ));
                        }
                    }
                } else {
                    for (zone_idx, zone) in self.zones.iter().enumerate() {
                        if let Some(depth) = aabb.overlap(&zone.aabb) {
                            records.push((
                                (body_idx, part_idx, TargetKey::Zone(zone_idx)),
                                ContactEvent {
                                    phase: ContactPhase::Start,
                                    part: PartRef { body: BodyId(body_idx), part: part_idx },
                                    target: ContactTarget::Zone { id: ZoneId(zone_idx) },
                                    overlap: depth.min_element(),
                                },
                            ));
                        }
                    }
                }
            }

            self.bodies[body_idx] = Some(body);
        }

        // Phase fixup: pairs seen last step are Active, new pairs Start.
        let mut current = HashSet::with_capacity(records.len());
        let mut events = Vec::with_capacity(records.len());
        for (key, mut ev) in records {
            if self.prev_contacts.contains(&key) {
                ev.phase = ContactPhase::Active;
            }
            current.insert(key);
            events.push(ev);
        }
        self.prev_contacts = current;

        events
    }
}

/// Push a body out of a tile along the minimal-penetration axis and kill
/// the velocity component driving it in.
fn resolve_push(body: &mut Body, part: &Aabb, tile: &Aabb, depth: Vec2) {
    if depth.x < depth.y {
        let sign = if part.center().x < tile.center().x { -1.0 } else { 1.0 };
        body.pos.x += sign * depth.x;
        if body.vel.x * sign < 0.0 {
            body.vel.x = 0.0;
        }
    } else {
        let sign = if part.center().y < tile.center().y { -1.0 } else { 1.0 };
        body.pos.y += sign * depth.y;
        if body.vel.y * sign < 0.0 {
            body.vel.y = 0.0;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const GRAVITY: f32 = 0.9;

    fn box_body(world: &mut PhysicsWorld, pos: Vec2) -> BodyId {
        world.add_body(pos, vec![Part::solid(Vec2::ZERO, Vec2::new(16.0, 32.0))])
    }

    fn floor(world: &mut PhysicsWorld, y: f32) {
        world.add_tile(Aabb::from_xywh(-1000.0, y, 2000.0, 64.0), false);
    }

    #[test]
    fn falling_body_lands_and_stops() {
        let mut w = PhysicsWorld::new(GRAVITY);
        floor(&mut w, 128.0);
        let id = box_body(&mut w, Vec2::new(0.0, 0.0));

        for _ in 0..100 {
            w.step();
        }
        let b = w.body(id).unwrap();
        // Resting with its bottom edge on the floor top.
        assert!((b.pos.y - 96.0).abs() < 1.0, "pos.y = {}", b.pos.y);
        assert_eq!(b.vel.y, 0.0);
    }

    #[test]
    fn contact_phases_start_then_active() {
        let mut w = PhysicsWorld::new(0.0);
        w.add_tile(Aabb::from_xywh(-16.0, 20.0, 64.0, 64.0), false);
        let id = w.add_body(
            Vec2::ZERO,
            vec![Part::sensor(Vec2::new(0.0, 20.0), Vec2::new(4.0, 4.0))],
        );

        let first = w.step();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].phase, ContactPhase::Start);

        let second = w.step();
        assert_eq!(second[0].phase, ContactPhase::Active);

        // Separate, then re-contact: phase re-arms to Start.
        w.body_mut(id).unwrap().pos.y -= 100.0;
        assert!(w.step().is_empty());
        w.body_mut(id).unwrap().pos.y += 100.0;
        assert_eq!(w.step()[0].phase, ContactPhase::Start);
    }

    #[test]
    fn sensor_reports_without_response() {
        let mut w = PhysicsWorld::new(0.0);
        w.add_tile(Aabb::from_xywh(10.0, -50.0, 64.0, 100.0), false);
        let id = w.add_body(
            Vec2::ZERO,
            vec![Part::sensor(Vec2::new(12.0, 0.0), Vec2::new(4.0, 8.0))],
        );

        let events = w.step();
        assert_eq!(events.len(), 1);
        // Sensor spans x 8..16, tile starts at 10 → 6 units of overlap.
        assert!((events[0].overlap - 6.0).abs() < 1e-4);
        // And the body was not pushed.
        assert_eq!(w.body(id).unwrap().pos, Vec2::ZERO);
    }

    #[test]
    fn solid_contact_reports_lethal_tag() {
        let mut w = PhysicsWorld::new(GRAVITY);
        w.add_tile(Aabb::from_xywh(-100.0, 30.0, 200.0, 64.0), true);
        box_body(&mut w, Vec2::ZERO);

        let mut saw_lethal = false;
        for _ in 0..10 {
            for ev in w.step() {
                if let ContactTarget::Tile { lethal } = ev.target {
                    saw_lethal |= lethal;
                }
            }
        }
        assert!(saw_lethal);
    }

    #[test]
    fn zone_overlap_reported_for_solid_parts() {
        let mut w = PhysicsWorld::new(0.0);
        let zone = w.add_zone(Aabb::from_xywh(-8.0, -8.0, 16.0, 16.0));
        box_body(&mut w, Vec2::ZERO);

        let events = w.step();
        assert!(events
            .iter()
            .any(|e| e.target == ContactTarget::Zone { id: zone }));
    }

    #[test]
    fn frozen_body_does_not_move() {
        let mut w = PhysicsWorld::new(GRAVITY);
        let id = box_body(&mut w, Vec2::ZERO);
        w.freeze(id);
        for _ in 0..10 {
            w.step();
        }
        assert_eq!(w.body(id).unwrap().pos, Vec2::ZERO);
    }

    #[test]
    fn removed_body_is_gone() {
        let mut w = PhysicsWorld::new(GRAVITY);
        floor(&mut w, 100.0);
        let id = box_body(&mut w, Vec2::ZERO);
        w.remove_body(id);
        assert!(w.body(id).is_none());
        assert!(w.step().is_empty());
    }

    #[test]
    fn force_is_consumed_by_one_step() {
        let mut w = PhysicsWorld::new(0.0);
        let id = box_body(&mut w, Vec2::ZERO);
        w.body_mut(id).unwrap().force = Vec2::new(2.0, 0.0);
        w.step();
        let b = w.body(id).unwrap();
        assert_eq!(b.vel.x, 2.0);
        assert_eq!(b.force, Vec2::ZERO);
        w.step();
        assert_eq!(w.body(id).unwrap().vel.x, 2.0); // no re-application
    }
}
