use std::error::Error;
use std::fmt;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::rotation::MatchType;

/// Broad classification of a [`CoreError`], used by callers (e.g. the HTTP
/// layer) to map domain failures onto their own error surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
}

/// A rotation-level precondition or validation failure. Every operation on a
/// rotation is all-or-nothing: when one of these is returned, no state was
/// mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CoreError {
    TeamSizeMismatch { match_type: MatchType, expected: usize, got: usize },
    DuplicatePlayer { player_id: Uuid },
    PlayerAlreadyQueued { player_id: Uuid },
    PlayerNotFound { player_id: Uuid },
    EntryNotFound { entry_id: Uuid },
    EntryNotQueued { entry_id: Uuid },
    CourtNotFound { court_occupancy_id: Uuid },
    CourtNotAvailable { court_occupancy_id: Uuid },
    CourtNotInMaintenance { court_occupancy_id: Uuid },
    CourtAlreadyRegistered { court_id: Uuid },
    MatchNotFound { match_id: Uuid },
    MatchNotActive { match_id: Uuid },
    MatchNotEnded { match_id: Uuid },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::TeamSizeMismatch { .. }
            | CoreError::DuplicatePlayer { .. } => ErrorKind::Validation,
            CoreError::PlayerNotFound { .. }
            | CoreError::EntryNotFound { .. }
            | CoreError::EntryNotQueued { .. }
            | CoreError::CourtNotFound { .. }
            | CoreError::MatchNotFound { .. } => ErrorKind::NotFound,
            CoreError::PlayerAlreadyQueued { .. }
            | CoreError::CourtNotAvailable { .. }
            | CoreError::CourtNotInMaintenance { .. }
            | CoreError::CourtAlreadyRegistered { .. }
            | CoreError::MatchNotActive { .. }
            | CoreError::MatchNotEnded { .. } => ErrorKind::Conflict,
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CoreError::TeamSizeMismatch { match_type, expected, got } => {
                write!(f, "Error: {} requires {} player(s) per team, got {}.", match_type, expected, got)
            }
            CoreError::DuplicatePlayer { player_id } => {
                write!(f, "Error: player {} appears more than once.", player_id)
            }
            CoreError::PlayerAlreadyQueued { player_id } => {
                write!(f, "Error: player {} already has a queued entry in this rotation.", player_id)
            }
            CoreError::PlayerNotFound { player_id } => {
                write!(f, "Error: player {} is not part of this rotation.", player_id)
            }
            CoreError::EntryNotFound { entry_id } => {
                write!(f, "Error: queue entry {} does not exist in this rotation.", entry_id)
            }
            CoreError::EntryNotQueued { entry_id } => {
                write!(f, "Error: entry {} is not a queued entry of this rotation.", entry_id)
            }
            CoreError::CourtNotFound { court_occupancy_id } => {
                write!(f, "Error: court occupancy {} does not exist in this rotation.", court_occupancy_id)
            }
            CoreError::CourtNotAvailable { court_occupancy_id } => {
                write!(f, "Error: court occupancy {} is not available.", court_occupancy_id)
            }
            CoreError::CourtNotInMaintenance { court_occupancy_id } => {
                write!(f, "Error: court occupancy {} is not in maintenance.", court_occupancy_id)
            }
            CoreError::CourtAlreadyRegistered { court_id } => {
                write!(f, "Error: court {} is already registered in this rotation.", court_id)
            }
            CoreError::MatchNotFound { match_id } => {
                write!(f, "Error: match {} does not exist in this rotation.", match_id)
            }
            CoreError::MatchNotActive { match_id } => {
                write!(f, "Error: match {} is not active.", match_id)
            }
            CoreError::MatchNotEnded { match_id } => {
                write!(f, "Error: match {} is not ended; only ended matches accept result corrections.", match_id)
            }
        }
    }
}

impl Error for CoreError {}

/// Errors surfaced by [`RotationManager`](crate::RotationManager) operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ManagerError {
    RotationNotFound,
    Core(CoreError),
    LockError,
}

impl From<CoreError> for ManagerError {
    fn from(err: CoreError) -> Self {
        ManagerError::Core(err)
    }
}

impl fmt::Display for ManagerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ManagerError::RotationNotFound => {
                write!(f, "Error: rotation not found.")
            }
            ManagerError::Core(err) => write!(f, "{}", err),
            ManagerError::LockError => {
                write!(f, "Error: rotation lock poisoned.")
            }
        }
    }
}

impl Error for ManagerError {}
