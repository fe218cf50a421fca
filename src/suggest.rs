use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::fairness::fairness_score;
use crate::queue::{EntryStatus, QueueEntry};
use crate::rotation::{MatchType, PlayerStatus, Rotation, epoch_ms_now};

/// A proposed next match: the first two due entries become team 1 and
/// team 2. Suggesting never mutates state; starting the match is a
/// separate, explicit step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSuggestion {
    pub match_type: MatchType,
    pub teams: [Vec<Uuid>; 2],
    pub entry_ids: [Uuid; 2],
}

/// Rest anchor for an entry: the earliest last-played timestamp among its
/// players that have one. `None` when no player in the entry has played yet,
/// which maps to the never-played sentinel.
fn rest_anchor(rotation: &Rotation, entry: &QueueEntry) -> Option<u64> {
    entry
        .player_ids
        .iter()
        .filter_map(|player_id| rotation.player(*player_id).and_then(|p| p.last_played_at_ms))
        .min()
}

impl Rotation {
    /// Propose the next match of the given type, or `None` when fewer than
    /// two eligible entries are waiting. Eligible means queued, of the right
    /// type, with every player currently `checked_in`.
    ///
    /// If any eligible entry was manually ordered the whole set is taken
    /// strictly by position; manual mode is sticky and overrides fairness
    /// for the entire call. Otherwise entries are ranked by fairness score
    /// descending with creation time as the tie-break.
    pub fn suggest(&self, match_type: MatchType) -> Option<MatchSuggestion> {
        let mut eligible: Vec<&QueueEntry> = self
            .queue
            .iter()
            .filter(|e| e.status == EntryStatus::Queued && e.match_type == match_type)
            .filter(|e| {
                e.player_ids.iter().all(|player_id| {
                    self.player(*player_id)
                        .map(|p| p.status == PlayerStatus::CheckedIn)
                        .unwrap_or(false)
                })
            })
            .collect();
        if eligible.len() < 2 {
            return None;
        }

        eligible.sort_by_key(|e| e.position);
        if !eligible.iter().any(|e| e.manual_order) {
            let now = epoch_ms_now();
            eligible.sort_by(|a, b| {
                let score_a = fairness_score(now, a.created_at_ms, rest_anchor(self, a));
                let score_b = fairness_score(now, b.created_at_ms, rest_anchor(self, b));
                score_b
                    .total_cmp(&score_a)
                    .then_with(|| a.created_at_ms.cmp(&b.created_at_ms))
            });
        }

        let (first, second) = (eligible[0], eligible[1]);
        Some(MatchSuggestion {
            match_type,
            teams: [first.player_ids.clone(), second.player_ids.clone()],
            entry_ids: [first.id, second.id],
        })
    }
}
