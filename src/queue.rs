use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::rotation::{MatchType, Rotation, epoch_ms_now};

/// Lifecycle of a queue entry. Entries are never physically deleted; they
/// move to `assigned` when consumed by a match start and to `removed` on
/// dequeue or the away action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Queued,
    Assigned,
    Removed,
}

/// A group of one or two players waiting for a court.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: Uuid,
    pub match_type: MatchType,
    pub status: EntryStatus,
    pub position: u32,
    pub manual_order: bool,
    pub created_at_ms: u64,
    pub player_ids: Vec<Uuid>,
}

impl Rotation {
    /// Next free position: one past the highest position ever handed out in
    /// this rotation, regardless of entry status.
    pub(crate) fn next_position(&self) -> u32 {
        self.queue.iter().map(|e| e.position).max().unwrap_or(0) + 1
    }

    /// Add a waiting entry. Rejects a player-count/type mismatch and any
    /// player who already has a queued entry in this rotation.
    pub fn enqueue(&mut self, match_type: MatchType, player_ids: &[Uuid]) -> Result<&QueueEntry, CoreError> {
        let expected = match_type.team_size();
        if player_ids.len() != expected {
            return Err(CoreError::TeamSizeMismatch { match_type, expected, got: player_ids.len() });
        }
        for (idx, player_id) in player_ids.iter().enumerate() {
            if player_ids[..idx].contains(player_id) {
                return Err(CoreError::DuplicatePlayer { player_id: *player_id });
            }
        }
        if let Some(player_id) = player_ids.iter().find(|&pid| {
            self.queue
                .iter()
                .any(|e| e.status == EntryStatus::Queued && e.player_ids.contains(pid))
        }) {
            return Err(CoreError::PlayerAlreadyQueued { player_id: *player_id });
        }

        let entry = QueueEntry {
            id: Uuid::new_v4(),
            match_type,
            status: EntryStatus::Queued,
            position: self.next_position(),
            manual_order: false,
            created_at_ms: epoch_ms_now(),
            player_ids: player_ids.to_vec(),
        };
        self.queue.push(entry);
        Ok(self.queue.last().unwrap())
    }

    /// Rewrite positions to the 1-based index of each id in the supplied
    /// order and flag the rewritten entries as manually ordered. Entries
    /// absent from the list keep their old position, which may now collide;
    /// position is a sort key, not a unique slot.
    pub fn reorder_queue(&mut self, ordered_entry_ids: &[Uuid]) -> Result<(), CoreError> {
        for entry_id in ordered_entry_ids {
            match self.queue.iter().find(|e| e.id == *entry_id) {
                Some(entry) if entry.status == EntryStatus::Queued => {}
                _ => return Err(CoreError::EntryNotQueued { entry_id: *entry_id }),
            }
        }
        for (idx, entry_id) in ordered_entry_ids.iter().enumerate() {
            if let Some(entry) = self.queue.iter_mut().find(|e| e.id == *entry_id) {
                entry.position = idx as u32 + 1;
                entry.manual_order = true;
            }
        }
        Ok(())
    }

    /// Take an entry out of the rotation (dequeue and the away action share
    /// this transition). Idempotent on an already-removed entry.
    pub fn remove_entry(&mut self, entry_id: Uuid) -> Result<(), CoreError> {
        let entry = self
            .queue
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or(CoreError::EntryNotFound { entry_id })?;
        entry.status = EntryStatus::Removed;
        Ok(())
    }

    /// Currently waiting entries, position ascending. Ties (possible after a
    /// partial reorder) keep creation order.
    pub fn queued_entries(&self) -> Vec<&QueueEntry> {
        let mut entries: Vec<&QueueEntry> = self
            .queue
            .iter()
            .filter(|e| e.status == EntryStatus::Queued)
            .collect();
        entries.sort_by_key(|e| e.position);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotation() -> Rotation {
        Rotation::new(Uuid::new_v4(), &[], true)
    }

    #[test]
    fn test_enqueue_assigns_increasing_positions() {
        let mut r = rotation();
        let first = r.enqueue(MatchType::Singles, &[Uuid::new_v4()]).unwrap().clone();
        let second = r.enqueue(MatchType::Singles, &[Uuid::new_v4()]).unwrap().clone();

        assert_eq!(first.position, 1);
        assert_eq!(second.position, 2);
        assert_eq!(first.status, EntryStatus::Queued);
        assert!(!first.manual_order);
    }

    #[test]
    fn test_enqueue_rejects_wrong_player_count() {
        let mut r = rotation();
        let result = r.enqueue(MatchType::Doubles, &[Uuid::new_v4()]);
        assert!(matches!(result, Err(CoreError::TeamSizeMismatch { expected: 2, got: 1, .. })));

        let result = r.enqueue(MatchType::Singles, &[Uuid::new_v4(), Uuid::new_v4()]);
        assert!(matches!(result, Err(CoreError::TeamSizeMismatch { expected: 1, got: 2, .. })));
        assert!(r.queue.is_empty());
    }

    #[test]
    fn test_enqueue_rejects_duplicate_player_in_pair() {
        let mut r = rotation();
        let player = Uuid::new_v4();
        let result = r.enqueue(MatchType::Doubles, &[player, player]);
        assert_eq!(result, Err(CoreError::DuplicatePlayer { player_id: player }));
    }

    #[test]
    fn test_enqueue_rejects_player_already_queued() {
        let mut r = rotation();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        r.enqueue(MatchType::Doubles, &[a, b]).unwrap();

        let result = r.enqueue(MatchType::Doubles, &[b, c]);
        assert_eq!(result, Err(CoreError::PlayerAlreadyQueued { player_id: b }));
        assert_eq!(r.queue.len(), 1);
    }

    #[test]
    fn test_enqueue_allows_player_after_entry_removed() {
        let mut r = rotation();
        let player = Uuid::new_v4();
        let entry_id = r.enqueue(MatchType::Singles, &[player]).unwrap().id;
        r.remove_entry(entry_id).unwrap();

        let entry = r.enqueue(MatchType::Singles, &[player]).unwrap();
        // Position keeps counting past the removed entry.
        assert_eq!(entry.position, 2);
    }

    #[test]
    fn test_reorder_full_set_rewrites_positions() {
        let mut r = rotation();
        let e1 = r.enqueue(MatchType::Singles, &[Uuid::new_v4()]).unwrap().id;
        let e2 = r.enqueue(MatchType::Singles, &[Uuid::new_v4()]).unwrap().id;
        let e3 = r.enqueue(MatchType::Singles, &[Uuid::new_v4()]).unwrap().id;

        r.reorder_queue(&[e3, e1, e2]).unwrap();

        let ordered: Vec<Uuid> = r.queued_entries().iter().map(|e| e.id).collect();
        assert_eq!(ordered, vec![e3, e1, e2]);
        let positions: Vec<u32> = r.queued_entries().iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert!(r.queue.iter().all(|e| e.manual_order));
    }

    #[test]
    fn test_reorder_unknown_entry_is_not_found() {
        let mut r = rotation();
        let e1 = r.enqueue(MatchType::Singles, &[Uuid::new_v4()]).unwrap().id;
        let ghost = Uuid::new_v4();

        let result = r.reorder_queue(&[e1, ghost]);
        assert_eq!(result, Err(CoreError::EntryNotQueued { entry_id: ghost }));
        // All-or-nothing: the valid id was not touched either.
        assert_eq!(r.queue[0].position, 1);
        assert!(!r.queue[0].manual_order);
    }

    #[test]
    fn test_reorder_rejects_non_queued_entry() {
        let mut r = rotation();
        let e1 = r.enqueue(MatchType::Singles, &[Uuid::new_v4()]).unwrap().id;
        r.remove_entry(e1).unwrap();

        let result = r.reorder_queue(&[e1]);
        assert_eq!(result, Err(CoreError::EntryNotQueued { entry_id: e1 }));
    }

    #[test]
    fn test_partial_reorder_keeps_other_positions() {
        let mut r = rotation();
        let e1 = r.enqueue(MatchType::Singles, &[Uuid::new_v4()]).unwrap().id;
        let e2 = r.enqueue(MatchType::Singles, &[Uuid::new_v4()]).unwrap().id;
        let e3 = r.enqueue(MatchType::Singles, &[Uuid::new_v4()]).unwrap().id;

        // Only reorder e2; e1 and e3 keep positions 1 and 3.
        r.reorder_queue(&[e2]).unwrap();

        let by_id = |id: Uuid| r.queue.iter().find(|e| e.id == id).unwrap().clone();
        assert_eq!(by_id(e2).position, 1);
        assert!(by_id(e2).manual_order);
        assert_eq!(by_id(e1).position, 1);
        assert!(!by_id(e1).manual_order);
        assert_eq!(by_id(e3).position, 3);
    }

    #[test]
    fn test_remove_entry_is_idempotent() {
        let mut r = rotation();
        let entry_id = r.enqueue(MatchType::Singles, &[Uuid::new_v4()]).unwrap().id;

        r.remove_entry(entry_id).unwrap();
        r.remove_entry(entry_id).unwrap();
        assert_eq!(r.queue[0].status, EntryStatus::Removed);
    }

    #[test]
    fn test_remove_unknown_entry_is_not_found() {
        let mut r = rotation();
        let ghost = Uuid::new_v4();
        assert_eq!(r.remove_entry(ghost), Err(CoreError::EntryNotFound { entry_id: ghost }));
    }

    #[test]
    fn test_queued_entries_excludes_terminal_statuses() {
        let mut r = rotation();
        let e1 = r.enqueue(MatchType::Singles, &[Uuid::new_v4()]).unwrap().id;
        let e2 = r.enqueue(MatchType::Singles, &[Uuid::new_v4()]).unwrap().id;
        r.remove_entry(e1).unwrap();

        let queued: Vec<Uuid> = r.queued_entries().iter().map(|e| e.id).collect();
        assert_eq!(queued, vec![e2]);
    }
}
