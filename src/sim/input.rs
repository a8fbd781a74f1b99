/// Logical input coalescing.
///
/// The core never reads a keyboard. The host forwards raw key
/// presses/releases into an [`InputCollector`], which folds multiple
/// physical triggers (arrow key and WASD equivalent) into one logical
/// action state, and snapshots a per-tick [`InputFrame`] with:
///   - held state (continuous actions: movement, climbing)
///   - just-pressed edges (one-shot actions: help toggle, continue)
///
/// Edge detection happens on the *coalesced* action, not per key: holding
/// Left-arrow and tapping A must not produce a second MoveLeft edge.

use std::collections::HashSet;

/// Logical actions the gameplay core reacts to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    Help,
    Continue,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::MoveLeft,
        Action::MoveRight,
        Action::MoveUp,
        Action::MoveDown,
        Action::Help,
        Action::Continue,
    ];

    #[inline]
    fn idx(self) -> usize {
        match self {
            Action::MoveLeft => 0,
            Action::MoveRight => 1,
            Action::MoveUp => 2,
            Action::MoveDown => 3,
            Action::Help => 4,
            Action::Continue => 5,
        }
    }
}

/// Physical keys the default bindings know about. Hosts translate their
/// backend's key codes into these before forwarding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Keycode {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    KeyW,
    KeyA,
    KeyS,
    KeyD,
    Space,
    KeyH,
    KeyR,
}

/// Default bindings: arrows + WASD for movement, Space as an extra jump
/// key, H for help, R for continue.
fn default_binding(key: Keycode) -> Action {
    match key {
        Keycode::ArrowLeft | Keycode::KeyA => Action::MoveLeft,
        Keycode::ArrowRight | Keycode::KeyD => Action::MoveRight,
        Keycode::ArrowUp | Keycode::KeyW | Keycode::Space => Action::MoveUp,
        Keycode::ArrowDown | Keycode::KeyS => Action::MoveDown,
        Keycode::KeyH => Action::Help,
        Keycode::KeyR => Action::Continue,
    }
}

/// Snapshot of logical input for one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputFrame {
    held: [bool; 6],
    pressed: [bool; 6],
}

impl InputFrame {
    /// Is the action currently down? (continuous)
    #[inline]
    pub fn held(&self, action: Action) -> bool {
        self.held[action.idx()]
    }

    /// Did the action transition up→down since the previous sample?
    /// (edge-triggered, fires once per press regardless of hold length)
    #[inline]
    pub fn pressed(&self, action: Action) -> bool {
        self.pressed[action.idx()]
    }
}

pub struct InputCollector {
    down_keys: HashSet<Keycode>,
    prev_held: [bool; 6],
}

impl InputCollector {
    pub fn new() -> Self {
        InputCollector {
            down_keys: HashSet::with_capacity(8),
            prev_held: [false; 6],
        }
    }

    /// Host callback: a physical key went down.
    pub fn key_down(&mut self, key: Keycode) {
        self.down_keys.insert(key);
    }

    /// Host callback: a physical key was released.
    pub fn key_up(&mut self, key: Keycode) {
        self.down_keys.remove(&key);
    }

    /// Sample the coalesced logical state. Call once per tick; edges are
    /// relative to the previous sample.
    pub fn sample(&mut self) -> InputFrame {
        let mut held = [false; 6];
        for key in &self.down_keys {
            held[default_binding(*key).idx()] = true;
        }

        let mut pressed = [false; 6];
        for action in Action::ALL {
            let i = action.idx();
            pressed[i] = held[i] && !self.prev_held[i];
        }
        self.prev_held = held;

        InputFrame { held, pressed }
    }
}

impl Default for InputCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_keys_one_action() {
        let mut c = InputCollector::new();
        c.key_down(Keycode::ArrowLeft);
        c.key_down(Keycode::KeyA);
        let f = c.sample();
        assert!(f.held(Action::MoveLeft));
        assert!(f.pressed(Action::MoveLeft));

        // Releasing one of two bound keys keeps the action held,
        // and produces no new edge.
        c.key_up(Keycode::ArrowLeft);
        let f = c.sample();
        assert!(f.held(Action::MoveLeft));
        assert!(!f.pressed(Action::MoveLeft));
    }

    #[test]
    fn edge_fires_once_per_press() {
        let mut c = InputCollector::new();
        c.key_down(Keycode::KeyH);
        assert!(c.sample().pressed(Action::Help));
        assert!(!c.sample().pressed(Action::Help)); // still held, no edge
        c.key_up(Keycode::KeyH);
        assert!(!c.sample().pressed(Action::Help));
        c.key_down(Keycode::KeyH);
        assert!(c.sample().pressed(Action::Help)); // re-armed by release
    }

    #[test]
    fn tapping_second_key_while_held_adds_no_edge() {
        let mut c = InputCollector::new();
        c.key_down(Keycode::ArrowUp);
        c.sample();
        c.key_down(Keycode::Space); // second physical trigger, same action
        let f = c.sample();
        assert!(f.held(Action::MoveUp));
        assert!(!f.pressed(Action::MoveUp));
    }

    #[test]
    fn empty_frame() {
        let mut c = InputCollector::new();
        let f = c.sample();
        for a in Action::ALL {
            assert!(!f.held(a));
            assert!(!f.pressed(a));
        }
    }
}
