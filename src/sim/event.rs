/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and the message bar.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    CoinCollected { row: usize, column: usize },
    ExitReached,
    EnemyKilled { id: usize },
    PlayerDied,
    GameOver,
}
