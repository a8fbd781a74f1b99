/// Visual-effect boundary.
///
/// The core only ever asks for "fade out, tell me when done" and
/// "fade in" — the actual drawing belongs to the rendering collaborator.
/// The fade-out completion signal is load-bearing: it gates the world
/// reload so teardown never happens while the step that requested it is
/// still dispatching contact callbacks.

pub trait Effects {
    /// Begin a fade to black lasting `ticks`. Restarts any fade in flight.
    fn fade_out(&mut self, ticks: u32);

    /// Begin a fade from black. Fire-and-forget; nothing gates on it.
    fn fade_in(&mut self, ticks: u32);

    /// Advance one tick.
    fn tick(&mut self);

    /// True exactly once when a fade-out has run to completion.
    /// A zero-tick fade completes on the tick after it was requested.
    fn fade_out_complete(&mut self) -> bool;
}

/// Default headless driver: counts ticks, draws nothing. A rendering
/// host replaces this with its own implementation.
#[derive(Debug, Default)]
pub struct FadeDriver {
    out_remaining: Option<u32>,
    in_remaining: Option<u32>,
    out_done: bool,
}

impl FadeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Is a fade-in currently running? (exposed for host rendering)
    pub fn fading_in(&self) -> bool {
        self.in_remaining.is_some()
    }
}

impl Effects for FadeDriver {
    fn fade_out(&mut self, ticks: u32) {
        self.out_remaining = Some(ticks);
        self.out_done = false;
    }

    fn fade_in(&mut self, ticks: u32) {
        self.in_remaining = Some(ticks);
    }

    fn tick(&mut self) {
        if let Some(t) = self.out_remaining {
            if t == 0 {
                self.out_remaining = None;
                self.out_done = true;
            } else {
                self.out_remaining = Some(t - 1);
            }
        }
        if let Some(t) = self.in_remaining {
            self.in_remaining = if t == 0 { None } else { Some(t - 1) };
        }
    }

    fn fade_out_complete(&mut self) -> bool {
        std::mem::take(&mut self.out_done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_out_completes_after_ticks() {
        let mut f = FadeDriver::new();
        f.fade_out(3);
        for _ in 0..3 {
            f.tick();
            assert!(!f.fade_out_complete());
        }
        f.tick();
        assert!(f.fade_out_complete());
        // One-shot: a second poll is false.
        assert!(!f.fade_out_complete());
    }

    #[test]
    fn zero_tick_fade_completes_next_tick() {
        let mut f = FadeDriver::new();
        f.fade_out(0);
        assert!(!f.fade_out_complete());
        f.tick();
        assert!(f.fade_out_complete());
    }

    #[test]
    fn idle_driver_never_completes() {
        let mut f = FadeDriver::new();
        for _ in 0..10 {
            f.tick();
        }
        assert!(!f.fade_out_complete());
    }
}
