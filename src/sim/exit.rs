/// One-shot exit triggers.
///
/// An exit is a sensor zone at a map edge wired to a graph edge. The
/// trigger must fire at most once per world incarnation: the physics
/// world can report the same overlap repeatedly, and a transition must
/// not be committed twice. Firing therefore cancels the subscription
/// (and checks a local flag) before doing anything else.

use std::cell::Cell;
use std::rc::Rc;

use crate::domain::graph::Direction;
use crate::physics::{PartRef, ZoneId};
use crate::sim::contact::{ContactRouter, Filter, SubscriptionHandle, TargetMatch};
use crate::sim::world::{self, World};

pub struct ExitEdge {
    pub direction: Direction,
    fired: Rc<Cell<bool>>,
    handle: SubscriptionHandle,
}

impl ExitEdge {
    /// Subscribe the player's main part to an exit zone. Fires on the
    /// Start phase only; re-entering an exit region in the same
    /// incarnation (which cannot normally happen, as a reload follows)
    /// is ignored.
    pub fn wire(
        router: &mut ContactRouter<World>,
        main: PartRef,
        zone: ZoneId,
        direction: Direction,
    ) -> Self {
        let fired = Rc::new(Cell::new(false));
        let handle = SubscriptionHandle::new();

        let f = Rc::clone(&fired);
        let h = handle.clone();
        router.subscribe_with(
            handle.clone(),
            Filter { parts: vec![main], target: TargetMatch::Zone(zone), start: true, active: false },
            move |_, w| {
                if f.replace(true) {
                    return;
                }
                h.cancel();
                world::transition(w, direction);
            },
        );

        ExitEdge { direction, fired, handle }
    }

    pub fn has_fired(&self) -> bool {
        self.fired.get()
    }

    /// Teardown: detach from the router.
    pub fn cancel(&self) {
        self.handle.cancel();
    }
}
