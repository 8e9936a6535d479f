use crate::{Action, Direction, Pattern};
use thiserror::Error;

/// Why an action's precondition failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("size must be at least 1")]
    ZeroSize,
    #[error("range ends at {end}, past the state length {len}")]
    OutOfBounds { end: usize, len: usize },
    #[error("cell {0} is empty")]
    EmptyCell(usize),
    #[error("cell {0} is not a group")]
    NotAGroup(usize),
    #[error("cell {0} holds different group contents")]
    MismatchedContents(usize),
    #[error("pattern {0} has not been unlocked")]
    Locked(Pattern),
    #[error("cell {0} is not a clamp")]
    NotAClamp(usize),
    #[error("no cell at offset {direction} from {position}")]
    NoNeighbour { position: usize, direction: Direction },
    #[error("destination {0} is occupied")]
    DestinationOccupied(usize),
}

/// Errors raised by the puzzle engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Recoverable: the action was rejected and the state is untouched
    #[error("invalid action {action}: {reason}")]
    InvalidAction { action: Action, reason: Rejection },
    /// Construction-time configuration error
    #[error("hole index {hole} is outside a state of length {len}")]
    HoleOutOfRange { hole: usize, len: usize },
}
