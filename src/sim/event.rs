/// Events emitted during a simulation step.
/// The presentation layer consumes these for animation/sound/UI.

use crate::domain::graph::Direction;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// A world was (re)constructed for `map`, spawning at `entry`.
    MapLoaded { map: String, entry: String },
    /// An exit edge fired; the reload follows once the fade completes.
    TransitionStarted { from: String, to: String, direction: Direction },
    PlayerDamaged { health: u32 },
    /// The player froze on a lethal tile; a fade + reload is scheduled.
    PlayerFroze,
    GameOver,
    /// Continue pressed on the game-over screen.
    Continued { health: u32 },
    ItemCollected { map: String },
    HelpToggled { visible: bool },
    Jumped,
}
