use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use serde::{Serialize, Deserialize};
use serde_json::Value;
use uuid::Uuid;

use crate::court::CourtBoardEntry;
use crate::error::ManagerError;
use crate::lifecycle::{MatchRecord, Team};
use crate::queue::QueueEntry;
use crate::rotation::{CheckoutStatus, MatchType, PlayerRotationStatus, RankingEntry, Rotation};
use crate::suggest::MatchSuggestion;
#[cfg(feature = "server")]
use crate::sqlite_store::SqliteStore;

/// Manages every live rotation. Each rotation sits behind its own lock; a
/// write lock held across one operation is what makes that operation's
/// court + match + queue + stats mutations atomic.
#[derive(Clone)]
pub struct RotationManager {
    rotations: Arc<RwLock<HashMap<Uuid, Arc<RwLock<Rotation>>>>>,
    #[cfg(feature = "server")]
    db: Option<Arc<SqliteStore>>,
}

/// Response for creating a new rotation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRotationResponse {
    pub rotation_id: Uuid,
    pub court_occupancy_ids: Vec<Uuid>,
}

/// Snapshot of a rotation for the live board: courts with their active
/// matches, the waiting queue and the player ledger.
#[derive(Debug, Serialize, Deserialize)]
pub struct RotationStateResponse {
    pub rotation_id: Uuid,
    pub return_to_queue: bool,
    pub courts: Vec<CourtBoardEntry>,
    pub queue: Vec<QueueEntry>,
    pub players: Vec<PlayerRotationStatus>,
}

impl RotationManager {
    /// Create a new manager (in-memory only).
    pub fn new() -> Self {
        RotationManager {
            rotations: Arc::new(RwLock::new(HashMap::new())),
            #[cfg(feature = "server")]
            db: None,
        }
    }

    /// Create a manager backed by SQLite. Loads existing rotations from the
    /// database.
    #[cfg(feature = "server")]
    pub fn with_db(path: &str) -> Result<Self, String> {
        let store = SqliteStore::open(path)?;
        let existing = store.load_all_rotations()?;
        let mut rotations_map = HashMap::new();
        for rotation in existing {
            rotations_map.insert(rotation.id, Arc::new(RwLock::new(rotation)));
        }
        tracing::info!(count = rotations_map.len(), "loaded rotations from database");
        Ok(RotationManager {
            rotations: Arc::new(RwLock::new(rotations_map)),
            db: Some(Arc::new(store)),
        })
    }

    fn persist_insert(&self, rotation: &Rotation) {
        #[cfg(feature = "server")]
        if let Some(db) = &self.db {
            if let Err(e) = db.insert_rotation(rotation) {
                tracing::error!(rotation_id = %rotation.id, error = %e, "failed to persist rotation insert");
            }
        }
        #[cfg(not(feature = "server"))]
        let _ = rotation;
    }

    fn persist_update(&self, rotation: &Rotation) {
        #[cfg(feature = "server")]
        if let Some(db) = &self.db {
            if let Err(e) = db.update_rotation(rotation) {
                tracing::error!(rotation_id = %rotation.id, error = %e, "failed to persist rotation update");
            }
        }
        #[cfg(not(feature = "server"))]
        let _ = rotation;
    }

    fn persist_delete(&self, rotation_id: Uuid) {
        #[cfg(feature = "server")]
        if let Some(db) = &self.db {
            if let Err(e) = db.delete_rotation(rotation_id) {
                tracing::error!(%rotation_id, error = %e, "failed to persist rotation delete");
            }
        }
        #[cfg(not(feature = "server"))]
        let _ = rotation_id;
    }

    fn rotation(&self, rotation_id: Uuid) -> Result<Arc<RwLock<Rotation>>, ManagerError> {
        let rotations = self.rotations.read().map_err(|_| ManagerError::LockError)?;
        rotations
            .get(&rotation_id)
            .cloned()
            .ok_or(ManagerError::RotationNotFound)
    }

    /// Open a new rotation over the given courts.
    pub fn create_rotation(&self, court_ids: &[Uuid], return_to_queue: bool) -> Result<CreateRotationResponse, ManagerError> {
        let rotation = Rotation::new(Uuid::new_v4(), court_ids, return_to_queue);
        let rotation_id = rotation.id;
        let court_occupancy_ids = rotation.courts.iter().map(|c| c.id).collect();
        self.persist_insert(&rotation);

        let mut rotations = self.rotations.write().map_err(|_| ManagerError::LockError)?;
        rotations.insert(rotation_id, Arc::new(RwLock::new(rotation)));
        drop(rotations);

        tracing::info!(%rotation_id, "rotation created");
        Ok(CreateRotationResponse { rotation_id, court_occupancy_ids })
    }

    /// List all live rotations.
    pub fn list_rotations(&self) -> Result<Vec<Uuid>, ManagerError> {
        let rotations = self.rotations.read().map_err(|_| ManagerError::LockError)?;
        Ok(rotations.keys().copied().collect())
    }

    /// Drop a rotation from the manager (and the store, if any).
    pub fn remove_rotation(&self, rotation_id: Uuid) -> Result<(), ManagerError> {
        let mut rotations = self.rotations.write().map_err(|_| ManagerError::LockError)?;
        rotations.remove(&rotation_id).ok_or(ManagerError::RotationNotFound)?;
        drop(rotations);

        self.persist_delete(rotation_id);
        tracing::info!(%rotation_id, "rotation removed");
        Ok(())
    }

    /// The live board for a rotation.
    pub fn rotation_state(&self, rotation_id: Uuid) -> Result<RotationStateResponse, ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let rotation = lock.read().map_err(|_| ManagerError::LockError)?;
        Ok(RotationStateResponse {
            rotation_id: rotation.id,
            return_to_queue: rotation.return_to_queue,
            courts: rotation.court_board(),
            queue: rotation.queued_entries().into_iter().cloned().collect(),
            players: rotation.players.clone(),
        })
    }

    pub fn check_in(&self, rotation_id: Uuid, player_id: Uuid, display_name: Option<String>) -> Result<PlayerRotationStatus, ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let mut rotation = lock.write().map_err(|_| ManagerError::LockError)?;
        let player = rotation.check_in(player_id, display_name).clone();
        self.persist_update(&rotation);
        Ok(player)
    }

    pub fn mark_present(&self, rotation_id: Uuid, player_id: Uuid) -> Result<PlayerRotationStatus, ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let mut rotation = lock.write().map_err(|_| ManagerError::LockError)?;
        let player = rotation.mark_present(player_id).clone();
        self.persist_update(&rotation);
        Ok(player)
    }

    pub fn check_out(&self, rotation_id: Uuid, player_id: Uuid, status: CheckoutStatus) -> Result<PlayerRotationStatus, ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let mut rotation = lock.write().map_err(|_| ManagerError::LockError)?;
        let player = rotation.check_out(player_id, status)?.clone();
        self.persist_update(&rotation);
        Ok(player)
    }

    pub fn enqueue(&self, rotation_id: Uuid, match_type: MatchType, player_ids: &[Uuid]) -> Result<QueueEntry, ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let mut rotation = lock.write().map_err(|_| ManagerError::LockError)?;
        let entry = rotation.enqueue(match_type, player_ids)?.clone();
        self.persist_update(&rotation);
        Ok(entry)
    }

    pub fn reorder_queue(&self, rotation_id: Uuid, ordered_entry_ids: &[Uuid]) -> Result<Vec<QueueEntry>, ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let mut rotation = lock.write().map_err(|_| ManagerError::LockError)?;
        rotation.reorder_queue(ordered_entry_ids)?;
        self.persist_update(&rotation);
        Ok(rotation.queued_entries().into_iter().cloned().collect())
    }

    pub fn remove_entry(&self, rotation_id: Uuid, entry_id: Uuid) -> Result<(), ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let mut rotation = lock.write().map_err(|_| ManagerError::LockError)?;
        rotation.remove_entry(entry_id)?;
        self.persist_update(&rotation);
        Ok(())
    }

    /// Waiting entries, position ascending.
    pub fn queue_contents(&self, rotation_id: Uuid) -> Result<Vec<QueueEntry>, ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let rotation = lock.read().map_err(|_| ManagerError::LockError)?;
        Ok(rotation.queued_entries().into_iter().cloned().collect())
    }

    /// Propose the next match; `None` when not enough eligible entries.
    pub fn suggest(&self, rotation_id: Uuid, match_type: MatchType) -> Result<Option<MatchSuggestion>, ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let rotation = lock.read().map_err(|_| ManagerError::LockError)?;
        Ok(rotation.suggest(match_type))
    }

    pub fn start_match(
        &self,
        rotation_id: Uuid,
        court_occupancy_id: Uuid,
        match_type: MatchType,
        teams: [Vec<Uuid>; 2],
        consumed_entry_ids: Option<&[Uuid]>,
    ) -> Result<Uuid, ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let mut rotation = lock.write().map_err(|_| ManagerError::LockError)?;
        let match_id = rotation.start_match(court_occupancy_id, match_type, teams, consumed_entry_ids)?;
        self.persist_update(&rotation);
        tracing::debug!(%rotation_id, %match_id, "match started");
        Ok(match_id)
    }

    pub fn end_match(&self, rotation_id: Uuid, match_id: Uuid, score: Option<Value>, winner_team: Option<Team>) -> Result<(), ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let mut rotation = lock.write().map_err(|_| ManagerError::LockError)?;
        rotation.end_match(match_id, score, winner_team)?;
        self.persist_update(&rotation);
        tracing::debug!(%rotation_id, %match_id, "match ended");
        Ok(())
    }

    pub fn cancel_match(&self, rotation_id: Uuid, match_id: Uuid) -> Result<(), ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let mut rotation = lock.write().map_err(|_| ManagerError::LockError)?;
        rotation.cancel_match(match_id)?;
        self.persist_update(&rotation);
        tracing::debug!(%rotation_id, %match_id, "match cancelled");
        Ok(())
    }

    pub fn correct_result(
        &self,
        rotation_id: Uuid,
        match_id: Uuid,
        score: Option<Value>,
        winner_team: Option<Option<Team>>,
    ) -> Result<(), ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let mut rotation = lock.write().map_err(|_| ManagerError::LockError)?;
        rotation.correct_result(match_id, score, winner_team)?;
        self.persist_update(&rotation);
        tracing::debug!(%rotation_id, %match_id, "match result corrected");
        Ok(())
    }

    pub fn match_record(&self, rotation_id: Uuid, match_id: Uuid) -> Result<MatchRecord, ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let rotation = lock.read().map_err(|_| ManagerError::LockError)?;
        rotation
            .match_record(match_id)
            .cloned()
            .ok_or(ManagerError::Core(crate::error::CoreError::MatchNotFound { match_id }))
    }

    /// Terminal matches, most recently ended first.
    pub fn match_history(&self, rotation_id: Uuid) -> Result<Vec<MatchRecord>, ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let rotation = lock.read().map_err(|_| ManagerError::LockError)?;
        Ok(rotation.match_history().into_iter().cloned().collect())
    }

    pub fn add_court(&self, rotation_id: Uuid, court_id: Uuid) -> Result<Uuid, ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let mut rotation = lock.write().map_err(|_| ManagerError::LockError)?;
        let occupancy_id = rotation.add_court(court_id)?.id;
        self.persist_update(&rotation);
        Ok(occupancy_id)
    }

    pub fn set_court_maintenance(&self, rotation_id: Uuid, court_occupancy_id: Uuid) -> Result<(), ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let mut rotation = lock.write().map_err(|_| ManagerError::LockError)?;
        rotation.set_court_maintenance(court_occupancy_id)?;
        self.persist_update(&rotation);
        Ok(())
    }

    pub fn set_court_available(&self, rotation_id: Uuid, court_occupancy_id: Uuid) -> Result<(), ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let mut rotation = lock.write().map_err(|_| ManagerError::LockError)?;
        rotation.set_court_available(court_occupancy_id)?;
        self.persist_update(&rotation);
        Ok(())
    }

    pub fn rankings(&self, rotation_id: Uuid) -> Result<Vec<RankingEntry>, ManagerError> {
        let lock = self.rotation(rotation_id)?;
        let rotation = lock.read().map_err(|_| ManagerError::LockError)?;
        Ok(rotation.rankings())
    }
}

impl Default for RotationManager {
    fn default() -> Self {
        Self::new()
    }
}
