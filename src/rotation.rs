use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::court::CourtOccupancy;
use crate::error::CoreError;
use crate::lifecycle::MatchRecord;
use crate::queue::QueueEntry;

pub(crate) fn epoch_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Whether an entry or match is played one-a-side or two-a-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Singles,
    Doubles,
}

impl MatchType {
    pub fn team_size(self) -> usize {
        match self {
            MatchType::Singles => 1,
            MatchType::Doubles => 2,
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MatchType::Singles => write!(f, "singles"),
            MatchType::Doubles => write!(f, "doubles"),
        }
    }
}

/// Where a player currently is within a rotation. Only `checked_in` players
/// are eligible for match suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    CheckedIn,
    Present,
    Away,
    Done,
}

/// Terminal presence states an operator can check a player out into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    Away,
    Done,
}

impl CheckoutStatus {
    fn as_player_status(self) -> PlayerStatus {
        match self {
            CheckoutStatus::Away => PlayerStatus::Away,
            CheckoutStatus::Done => PlayerStatus::Done,
        }
    }
}

/// Per-rotation presence and cumulative stats for one player. Created by the
/// check-in upsert, mutated by match end and result correction, never deleted
/// while the rotation is live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRotationStatus {
    pub player_id: Uuid,
    pub display_name: Option<String>,
    pub status: PlayerStatus,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub last_played_at_ms: Option<u64>,
    pub checked_in_at_ms: u64,
    pub is_new_player: bool,
}

/// One row of the rotation leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingEntry {
    pub rank: u32,
    pub player_id: Uuid,
    pub display_name: Option<String>,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_pct: f64,
}

/// A live rotation: the waiting queue, the player ledger, the courts and
/// every match played so far. This is the unit of persistence and the unit
/// of locking: all lifecycle operations mutate one `Rotation` behind one
/// write lock, which is what makes them atomic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rotation {
    pub id: Uuid,
    pub return_to_queue: bool,
    pub queue: Vec<QueueEntry>,
    pub players: Vec<PlayerRotationStatus>,
    pub courts: Vec<CourtOccupancy>,
    pub matches: Vec<MatchRecord>,
}

impl Rotation {
    pub fn new(id: Uuid, court_ids: &[Uuid], return_to_queue: bool) -> Rotation {
        Rotation {
            id,
            return_to_queue,
            queue: Vec::new(),
            players: Vec::new(),
            courts: court_ids.iter().map(|court_id| CourtOccupancy::new(*court_id)).collect(),
            matches: Vec::new(),
        }
    }

    pub fn player(&self, player_id: Uuid) -> Option<&PlayerRotationStatus> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub(crate) fn player_mut(&mut self, player_id: Uuid) -> Option<&mut PlayerRotationStatus> {
        self.players.iter_mut().find(|p| p.player_id == player_id)
    }

    fn upsert_player(&mut self, player_id: Uuid, status: PlayerStatus, display_name: Option<String>) -> &PlayerRotationStatus {
        match self.players.iter().position(|p| p.player_id == player_id) {
            Some(idx) => {
                let player = &mut self.players[idx];
                player.status = status;
                if display_name.is_some() {
                    player.display_name = display_name;
                }
                &self.players[idx]
            }
            None => {
                self.players.push(PlayerRotationStatus {
                    player_id,
                    display_name,
                    status,
                    games_played: 0,
                    wins: 0,
                    losses: 0,
                    last_played_at_ms: None,
                    checked_in_at_ms: epoch_ms_now(),
                    is_new_player: true,
                });
                self.players.last().unwrap()
            }
        }
    }

    /// Check a player into the rotation. Upserts: repeated check-ins reset
    /// the status but keep the accumulated stats.
    pub fn check_in(&mut self, player_id: Uuid, display_name: Option<String>) -> &PlayerRotationStatus {
        self.upsert_player(player_id, PlayerStatus::CheckedIn, display_name)
    }

    /// Mark a player present (on site but not up for a game yet).
    pub fn mark_present(&mut self, player_id: Uuid) -> &PlayerRotationStatus {
        self.upsert_player(player_id, PlayerStatus::Present, None)
    }

    /// Check a player out as away or done for the day.
    pub fn check_out(&mut self, player_id: Uuid, status: CheckoutStatus) -> Result<&PlayerRotationStatus, CoreError> {
        let idx = self
            .players
            .iter()
            .position(|p| p.player_id == player_id)
            .ok_or(CoreError::PlayerNotFound { player_id })?;
        self.players[idx].status = status.as_player_status();
        Ok(&self.players[idx])
    }

    /// Rotation leaderboard: win percentage descending, then wins, then games
    /// played, then display name ascending, with a 1-based rank.
    pub fn rankings(&self) -> Vec<RankingEntry> {
        let mut ranked: Vec<RankingEntry> = self
            .players
            .iter()
            .map(|p| RankingEntry {
                rank: 0,
                player_id: p.player_id,
                display_name: p.display_name.clone(),
                games_played: p.games_played,
                wins: p.wins,
                losses: p.losses,
                win_pct: if p.games_played > 0 {
                    f64::from(p.wins) / f64::from(p.games_played)
                } else {
                    0.0
                },
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.win_pct
                .total_cmp(&a.win_pct)
                .then_with(|| b.wins.cmp(&a.wins))
                .then_with(|| b.games_played.cmp(&a.games_played))
                .then_with(|| {
                    a.display_name
                        .as_deref()
                        .unwrap_or("")
                        .cmp(b.display_name.as_deref().unwrap_or(""))
                })
        });

        for (idx, entry) in ranked.iter_mut().enumerate() {
            entry.rank = idx as u32 + 1;
        }
        ranked
    }
}
