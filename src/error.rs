use thiserror::Error;

/// Programmer or client errors. Gameplay outcomes (life lost, game over)
/// are state transitions and never show up here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("unknown entity kind: {0:?}")]
    UnknownEntityKind(String),

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("unknown action: {0:?}")]
    UnknownAction(String),

    #[error("unknown direction: {0:?}")]
    UnknownDirection(String),
}
