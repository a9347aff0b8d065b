use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("deck exhausted: requested {requested} cards, {remaining} remaining")]
    DeckExhausted { requested: usize, remaining: usize },
    #[error("no round in progress")]
    NoRoundInProgress,
    #[error("round already resolved")]
    RoundResolved,
}
