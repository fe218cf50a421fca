use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::lifecycle::MatchRecord;
use crate::rotation::Rotation;

/// Per-rotation state of one physical court.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtStatus {
    Available,
    InMatch,
    Maintenance,
}

/// The per-rotation occupancy row for a court. `current_match_id` is set iff
/// the status is `in_match`; only the match lifecycle drives the
/// `available ⇄ in_match` transitions, operators drive `maintenance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourtOccupancy {
    pub id: Uuid,
    pub court_id: Uuid,
    pub status: CourtStatus,
    pub current_match_id: Option<Uuid>,
    pub next_match_id: Option<Uuid>,
}

impl CourtOccupancy {
    pub(crate) fn new(court_id: Uuid) -> CourtOccupancy {
        CourtOccupancy {
            id: Uuid::new_v4(),
            court_id,
            status: CourtStatus::Available,
            current_match_id: None,
            next_match_id: None,
        }
    }
}

/// One court on the live board, with its active match if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourtBoardEntry {
    pub occupancy: CourtOccupancy,
    pub current_match: Option<MatchRecord>,
}

impl Rotation {
    pub fn court_occupancy(&self, occupancy_id: Uuid) -> Option<&CourtOccupancy> {
        self.courts.iter().find(|c| c.id == occupancy_id)
    }

    pub(crate) fn court_occupancy_mut(&mut self, occupancy_id: Uuid) -> Option<&mut CourtOccupancy> {
        self.courts.iter_mut().find(|c| c.id == occupancy_id)
    }

    /// Register another court mid-rotation. One occupancy row per court.
    pub fn add_court(&mut self, court_id: Uuid) -> Result<&CourtOccupancy, CoreError> {
        if self.courts.iter().any(|c| c.court_id == court_id) {
            return Err(CoreError::CourtAlreadyRegistered { court_id });
        }
        self.courts.push(CourtOccupancy::new(court_id));
        Ok(self.courts.last().unwrap())
    }

    /// Take an available court out of automatic assignment.
    pub fn set_court_maintenance(&mut self, occupancy_id: Uuid) -> Result<(), CoreError> {
        let court = self
            .court_occupancy_mut(occupancy_id)
            .ok_or(CoreError::CourtNotFound { court_occupancy_id: occupancy_id })?;
        if court.status != CourtStatus::Available {
            return Err(CoreError::CourtNotAvailable { court_occupancy_id: occupancy_id });
        }
        court.status = CourtStatus::Maintenance;
        Ok(())
    }

    /// Bring a maintenance court back into play.
    pub fn set_court_available(&mut self, occupancy_id: Uuid) -> Result<(), CoreError> {
        let court = self
            .court_occupancy_mut(occupancy_id)
            .ok_or(CoreError::CourtNotFound { court_occupancy_id: occupancy_id })?;
        if court.status != CourtStatus::Maintenance {
            return Err(CoreError::CourtNotInMaintenance { court_occupancy_id: occupancy_id });
        }
        court.status = CourtStatus::Available;
        Ok(())
    }

    /// Live board: every court with its active match, in registration order.
    pub fn court_board(&self) -> Vec<CourtBoardEntry> {
        self.courts
            .iter()
            .map(|c| CourtBoardEntry {
                occupancy: c.clone(),
                current_match: c
                    .current_match_id
                    .and_then(|match_id| self.match_record(match_id))
                    .cloned(),
            })
            .collect()
    }
}
