use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Slot index out of range")]
    InvalidSlot,
    #[error("Deck does not hold every name exactly twice")]
    UnbalancedDeck,
    #[error("Layout does not fit the configured grid")]
    LayoutMismatch,
    #[error("Event does not match the pending card state")]
    UnexpectedEvent,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
    #[error("Slot and card mappings disagree")]
    MappingDesync,
}

pub type Result<T> = core::result::Result<T, GameError>;
