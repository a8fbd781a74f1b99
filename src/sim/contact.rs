/// Contact subscription router.
///
/// The physics world reports contact events; gameplay objects react to
/// them. This router is the explicit observer seam between the two:
/// a subscription names the body parts it listens on, what kind of
/// target it cares about, and which phases it wants.
///
/// ## Unsubscription discipline
///
/// Handles carry a shared tombstone flag rather than an index, so
/// `cancel()` is:
///   - idempotent (cancelling twice is a no-op)
///   - callable from inside the subscription's own callback, which is how
///     one-shot triggers guarantee at-most-once firing even when the same
///     pair produces duplicate notifications in a single step
///
/// Cancelled subscriptions are skipped during dispatch and swept after.
///
/// The router is generic over the context handed to callbacks so the
/// dispatch discipline can be unit-tested without a live world.

use std::cell::Cell;
use std::rc::Rc;

use crate::physics::{ContactEvent, ContactPhase, ContactTarget, PartRef, ZoneId};

/// Which contact targets a subscription accepts.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TargetMatch {
    /// Any solid tile (lethal or not; handlers check the tag).
    AnyTile,
    /// One specific sensor zone.
    Zone(ZoneId),
}

#[derive(Clone, Debug)]
pub struct Filter {
    /// Body parts this subscription listens on (any match).
    pub parts: Vec<PartRef>,
    pub target: TargetMatch,
    /// Deliver `Start` phase events.
    pub start: bool,
    /// Deliver `Active` phase events.
    pub active: bool,
}

impl Filter {
    fn matches(&self, ev: &ContactEvent) -> bool {
        let phase_ok = match ev.phase {
            ContactPhase::Start => self.start,
            ContactPhase::Active => self.active,
        };
        if !phase_ok || !self.parts.contains(&ev.part) {
            return false;
        }
        match (self.target, ev.target) {
            (TargetMatch::AnyTile, ContactTarget::Tile { .. }) => true,
            (TargetMatch::Zone(want), ContactTarget::Zone { id }) => want == id,
            _ => false,
        }
    }
}

/// Shared cancellation flag for one subscription.
#[derive(Clone, Debug)]
pub struct SubscriptionHandle {
    cancelled: Rc<Cell<bool>>,
}

impl SubscriptionHandle {
    pub fn new() -> Self {
        SubscriptionHandle { cancelled: Rc::new(Cell::new(false)) }
    }

    /// Idempotent; safe from within the subscription's own callback.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

impl Default for SubscriptionHandle {
    fn default() -> Self {
        Self::new()
    }
}

struct Subscription<C> {
    filter: Filter,
    handle: SubscriptionHandle,
    callback: Box<dyn FnMut(&ContactEvent, &mut C)>,
}

pub struct ContactRouter<C> {
    subs: Vec<Subscription<C>>,
}

impl<C> ContactRouter<C> {
    pub fn new() -> Self {
        ContactRouter { subs: vec![] }
    }

    pub fn subscribe(
        &mut self,
        filter: Filter,
        callback: impl FnMut(&ContactEvent, &mut C) + 'static,
    ) -> SubscriptionHandle {
        let handle = SubscriptionHandle::new();
        self.subscribe_with(handle.clone(), filter, callback);
        handle
    }

    /// Register with a pre-made handle, so a callback can capture its own
    /// handle and cancel itself.
    pub fn subscribe_with(
        &mut self,
        handle: SubscriptionHandle,
        filter: Filter,
        callback: impl FnMut(&ContactEvent, &mut C) + 'static,
    ) {
        self.subs.push(Subscription {
            filter,
            handle,
            callback: Box::new(callback),
        });
    }

    /// Same as cancelling through the handle.
    pub fn unsubscribe(&mut self, handle: &SubscriptionHandle) {
        handle.cancel();
    }

    /// Deliver events to live subscriptions in registration order, then
    /// sweep the ones cancelled along the way. The cancellation check
    /// runs per delivery: a subscription cancelled by an earlier event in
    /// the same batch receives nothing further.
    pub fn dispatch(&mut self, events: &[ContactEvent], ctx: &mut C) {
        for ev in events {
            for sub in self.subs.iter_mut() {
                if sub.handle.is_cancelled() {
                    continue;
                }
                if sub.filter.matches(ev) {
                    (sub.callback)(ev, ctx);
                }
            }
        }
        self.subs.retain(|s| !s.handle.is_cancelled());
    }

    /// Drop every subscription (world teardown).
    pub fn clear(&mut self) {
        self.subs.clear();
    }

    /// Live subscription count.
    pub fn len(&self) -> usize {
        self.subs.iter().filter(|s| !s.handle.is_cancelled()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C> Default for ContactRouter<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geom::Aabb;
    use crate::physics::{Part, PhysicsWorld};
    use glam::Vec2;

    /// Build a real event through the physics world so PartRef/ZoneId are
    /// honestly constructed.
    fn zone_events(n: usize) -> (Vec<ContactEvent>, PartRef, ZoneId) {
        let mut w = PhysicsWorld::new(0.0);
        let zone = w.add_zone(Aabb::from_xywh(-8.0, -8.0, 16.0, 16.0));
        let body = w.add_body(
            Vec2::ZERO,
            vec![Part::solid(Vec2::ZERO, Vec2::new(4.0, 4.0))],
        );
        let ev = w.step()[0];
        let part = PartRef { body, part: 0 };
        (vec![ev; n], part, zone)
    }

    fn zone_filter(part: PartRef, zone: ZoneId) -> Filter {
        Filter { parts: vec![part], target: TargetMatch::Zone(zone), start: true, active: true }
    }

    #[test]
    fn self_cancelling_callback_fires_once() {
        let (events, part, zone) = zone_events(3);
        let mut router: ContactRouter<u32> = ContactRouter::new();

        let handle = SubscriptionHandle::new();
        let h = handle.clone();
        router.subscribe_with(handle, zone_filter(part, zone), move |_, count| {
            h.cancel(); // unsubscribe before any other logic
            *count += 1;
        });

        let mut count = 0;
        // Three identical notifications in one batch: exactly one delivery.
        router.dispatch(&events, &mut count);
        assert_eq!(count, 1);
        assert!(router.is_empty()); // swept after dispatch

        // And nothing across later batches either.
        let (events, ..) = zone_events(1);
        router.dispatch(&events, &mut count);
        assert_eq!(count, 1);
    }

    #[test]
    fn cancel_is_idempotent() {
        let (events, part, zone) = zone_events(1);
        let mut router: ContactRouter<u32> = ContactRouter::new();
        let handle = router.subscribe(zone_filter(part, zone), |_, count| *count += 1);

        handle.cancel();
        handle.cancel();
        router.unsubscribe(&handle);

        let mut count = 0;
        router.dispatch(&events, &mut count);
        assert_eq!(count, 0);
    }

    #[test]
    fn filter_rejects_other_parts_and_zones() {
        let (events, part, zone) = zone_events(1);
        let mut router: ContactRouter<u32> = ContactRouter::new();

        // Wrong part index: never delivered.
        let wrong_part = PartRef { body: part.body, part: 7 };
        router.subscribe(zone_filter(wrong_part, zone), |_, count| *count += 100);
        // Tile filter never matches a zone contact.
        router.subscribe(
            Filter { parts: vec![part], target: TargetMatch::AnyTile, start: true, active: true },
            |_, count| *count += 10,
        );
        router.subscribe(zone_filter(part, zone), |_, count| *count += 1);

        let mut count = 0;
        router.dispatch(&events, &mut count);
        assert_eq!(count, 1);
    }

    #[test]
    fn phase_filtering() {
        let (mut events, part, zone) = zone_events(1);
        let mut router: ContactRouter<u32> = ContactRouter::new();
        router.subscribe(
            Filter { parts: vec![part], target: TargetMatch::Zone(zone), start: true, active: false },
            |_, count| *count += 1,
        );

        let mut count = 0;
        router.dispatch(&events, &mut count); // Start phase
        assert_eq!(count, 1);

        events[0].phase = ContactPhase::Active;
        router.dispatch(&events, &mut count); // filtered out
        assert_eq!(count, 1);
    }

    #[test]
    fn clear_drops_everything() {
        let (events, part, zone) = zone_events(1);
        let mut router: ContactRouter<u32> = ContactRouter::new();
        router.subscribe(zone_filter(part, zone), |_, count| *count += 1);
        router.clear();
        let mut count = 0;
        router.dispatch(&events, &mut count);
        assert_eq!(count, 0);
    }
}
