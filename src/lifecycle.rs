//! Match lifecycle: start, end, cancel, correct result.
//!
//! This is the only code that mutates court occupancy, queue entries and
//! player stats together. Every operation validates all of its preconditions
//! before touching any state, so a failed call leaves the rotation exactly
//! as it found it; combined with the per-rotation write lock this makes each
//! operation atomic, including the availability check on start.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::court::CourtStatus;
use crate::error::CoreError;
use crate::queue::{EntryStatus, QueueEntry};
use crate::rotation::{MatchType, PlayerStatus, Rotation, epoch_ms_now};

/// A match's place in its lifecycle. `ended` and `cancelled` are final,
/// except that an ended match's score and winner may still be corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Active,
    Ended,
    Cancelled,
}

/// One of the two sides of a match. Serializes as the team number (1 or 2),
/// matching the wire shape callers record winners in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    One,
    Two,
}

impl Team {
    pub fn number(self) -> u8 {
        match self {
            Team::One => 1,
            Team::Two => 2,
        }
    }

    pub fn from_number(number: u8) -> Option<Team> {
        match number {
            1 => Some(Team::One),
            2 => Some(Team::Two),
            _ => None,
        }
    }
}

impl Serialize for Team {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

impl<'de> Deserialize<'de> for Team {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Team, D::Error> {
        let number = u8::deserialize(deserializer)?;
        Team::from_number(number).ok_or_else(|| D::Error::custom("team must be 1 or 2"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchParticipant {
    pub player_id: Uuid,
    pub team: Team,
}

/// A match played (or being played) on one court occupancy. The score is an
/// opaque blob recorded for display; the core only interprets `winner_team`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: Uuid,
    pub court_occupancy_id: Uuid,
    pub status: MatchStatus,
    pub match_type: MatchType,
    pub started_at_ms: u64,
    pub ended_at_ms: Option<u64>,
    pub score: Option<Value>,
    pub winner_team: Option<Team>,
    pub participants: Vec<MatchParticipant>,
}

impl MatchRecord {
    pub fn team_players(&self, team: Team) -> Vec<Uuid> {
        self.participants
            .iter()
            .filter(|p| p.team == team)
            .map(|p| p.player_id)
            .collect()
    }
}

impl Rotation {
    pub fn match_record(&self, match_id: Uuid) -> Option<&MatchRecord> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    fn match_index(&self, match_id: Uuid) -> Result<usize, CoreError> {
        self.matches
            .iter()
            .position(|m| m.id == match_id)
            .ok_or(CoreError::MatchNotFound { match_id })
    }

    /// Terminal matches, most recently ended first.
    pub fn match_history(&self) -> Vec<&MatchRecord> {
        let mut done: Vec<&MatchRecord> = self
            .matches
            .iter()
            .filter(|m| m.status != MatchStatus::Active)
            .collect();
        done.sort_by(|a, b| b.ended_at_ms.cmp(&a.ended_at_ms));
        done
    }

    /// Put a match on a court. The court occupancy must be `available`; the
    /// check and the transition to `in_match` happen under the same rotation
    /// write lock, so two concurrent starts cannot double-book one court.
    ///
    /// When `consumed_entry_ids` names entries those become `assigned`;
    /// otherwise (absent or empty) any queued entry sharing a player with
    /// the match does, matched best-effort by membership rather than
    /// identity.
    pub fn start_match(
        &mut self,
        court_occupancy_id: Uuid,
        match_type: MatchType,
        teams: [Vec<Uuid>; 2],
        consumed_entry_ids: Option<&[Uuid]>,
    ) -> Result<Uuid, CoreError> {
        let expected = match_type.team_size();
        for team in &teams {
            if team.len() != expected {
                return Err(CoreError::TeamSizeMismatch { match_type, expected, got: team.len() });
            }
        }
        let match_players: Vec<Uuid> = teams[0].iter().chain(teams[1].iter()).copied().collect();
        for (idx, player_id) in match_players.iter().enumerate() {
            if match_players[..idx].contains(player_id) {
                return Err(CoreError::DuplicatePlayer { player_id: *player_id });
            }
        }
        let court_idx = self
            .courts
            .iter()
            .position(|c| c.id == court_occupancy_id)
            .ok_or(CoreError::CourtNotFound { court_occupancy_id })?;
        if self.courts[court_idx].status != CourtStatus::Available {
            return Err(CoreError::CourtNotAvailable { court_occupancy_id });
        }

        // Preconditions hold; everything below must succeed together.
        let match_id = Uuid::new_v4();
        let participants = teams[0]
            .iter()
            .map(|player_id| MatchParticipant { player_id: *player_id, team: Team::One })
            .chain(teams[1].iter().map(|player_id| MatchParticipant { player_id: *player_id, team: Team::Two }))
            .collect();
        self.matches.push(MatchRecord {
            id: match_id,
            court_occupancy_id,
            status: MatchStatus::Active,
            match_type,
            started_at_ms: epoch_ms_now(),
            ended_at_ms: None,
            score: None,
            winner_team: None,
            participants,
        });

        let court = &mut self.courts[court_idx];
        court.status = CourtStatus::InMatch;
        court.current_match_id = Some(match_id);

        match consumed_entry_ids {
            Some(entry_ids) if !entry_ids.is_empty() => {
                for entry in self.queue.iter_mut().filter(|e| entry_ids.contains(&e.id)) {
                    entry.status = EntryStatus::Assigned;
                }
            }
            _ => {
                for entry in self.queue.iter_mut().filter(|e| {
                    e.status == EntryStatus::Queued
                        && e.player_ids.iter().any(|pid| match_players.contains(pid))
                }) {
                    entry.status = EntryStatus::Assigned;
                }
            }
        }

        Ok(match_id)
    }

    /// Finish an active match: record the result, free the court, credit
    /// every participant a game and reset them to `checked_in`. Ending a
    /// match does not re-queue anyone.
    pub fn end_match(
        &mut self,
        match_id: Uuid,
        score: Option<Value>,
        winner_team: Option<Team>,
    ) -> Result<(), CoreError> {
        let idx = self.match_index(match_id)?;
        if self.matches[idx].status != MatchStatus::Active {
            return Err(CoreError::MatchNotActive { match_id });
        }

        let now = epoch_ms_now();
        let court_occupancy_id = self.matches[idx].court_occupancy_id;
        let participants = self.matches[idx].participants.clone();
        {
            let record = &mut self.matches[idx];
            record.status = MatchStatus::Ended;
            record.ended_at_ms = Some(now);
            record.score = score;
            record.winner_team = winner_team;
        }

        self.release_court(court_occupancy_id);

        for participant in &participants {
            if let Some(player) = self.player_mut(participant.player_id) {
                player.games_played += 1;
                player.last_played_at_ms = Some(now);
                player.status = PlayerStatus::CheckedIn;
                player.is_new_player = false;
            }
        }
        if let Some(winner) = winner_team {
            self.adjust_result_stats(&participants, winner, 1);
        }

        Ok(())
    }

    /// Abandon an active match: no stats are recorded and the court is
    /// freed. When the rotation's `return_to_queue` flag is set, each team
    /// re-enters the queue as a brand-new entry appended after the current
    /// maximum position (the consumed entries stay `assigned`).
    pub fn cancel_match(&mut self, match_id: Uuid) -> Result<(), CoreError> {
        let idx = self.match_index(match_id)?;
        if self.matches[idx].status != MatchStatus::Active {
            return Err(CoreError::MatchNotActive { match_id });
        }

        let now = epoch_ms_now();
        let court_occupancy_id = self.matches[idx].court_occupancy_id;
        {
            let record = &mut self.matches[idx];
            record.status = MatchStatus::Cancelled;
            record.ended_at_ms = Some(now);
        }
        self.release_court(court_occupancy_id);

        if self.return_to_queue {
            let match_type = self.matches[idx].match_type;
            let teams = [
                self.matches[idx].team_players(Team::One),
                self.matches[idx].team_players(Team::Two),
            ];
            let mut position = self.next_position();
            for player_ids in teams {
                self.queue.push(QueueEntry {
                    id: Uuid::new_v4(),
                    match_type,
                    status: EntryStatus::Queued,
                    position,
                    manual_order: false,
                    created_at_ms: now,
                    player_ids,
                });
                position += 1;
            }
        }

        Ok(())
    }

    /// Amend an ended match's score and/or winner. An absent field keeps the
    /// recorded value; an explicit null winner clears it. Win/loss stats
    /// follow the previous→next winner transition symmetrically: reverse the
    /// previous winner's deltas, then apply the next winner's. The five
    /// cases are none→1, none→2, 1→2, 2→1 and unchanged (a stat no-op even
    /// when the score changes).
    pub fn correct_result(
        &mut self,
        match_id: Uuid,
        score: Option<Value>,
        winner_team: Option<Option<Team>>,
    ) -> Result<(), CoreError> {
        let idx = self.match_index(match_id)?;
        if self.matches[idx].status != MatchStatus::Ended {
            return Err(CoreError::MatchNotEnded { match_id });
        }

        let previous = self.matches[idx].winner_team;
        let next = winner_team.unwrap_or(previous);
        if next != previous {
            let participants = self.matches[idx].participants.clone();
            if let Some(team) = previous {
                self.adjust_result_stats(&participants, team, -1);
            }
            if let Some(team) = next {
                self.adjust_result_stats(&participants, team, 1);
            }
        }

        let record = &mut self.matches[idx];
        if let Some(score) = score {
            record.score = Some(score);
        }
        if winner_team.is_some() {
            record.winner_team = next;
        }
        Ok(())
    }

    fn release_court(&mut self, court_occupancy_id: Uuid) {
        if let Some(court) = self.court_occupancy_mut(court_occupancy_id) {
            court.status = CourtStatus::Available;
            court.current_match_id = None;
            court.next_match_id = None;
        }
    }

    /// Apply (`delta = 1`) or reverse (`delta = -1`) one win/loss outcome for
    /// the given winner across a match's participants.
    fn adjust_result_stats(&mut self, participants: &[MatchParticipant], winner: Team, delta: i32) {
        for participant in participants {
            if let Some(player) = self.player_mut(participant.player_id) {
                if participant.team == winner {
                    player.wins = player.wins.saturating_add_signed(delta);
                } else {
                    player.losses = player.losses.saturating_add_signed(delta);
                }
            }
        }
    }
}
