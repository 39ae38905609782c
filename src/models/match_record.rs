//! Match records: head-to-head games, byes, statuses, and round tags.

use crate::models::geography::{GroupId, Level};
use crate::models::player::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Which round of a group a match belongs to. Bracket rounds carry their
/// ordinal; the round-robin fallback is its own kind. All progression logic
/// branches on this tag; the display name is never parsed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundKind {
    Bracket(u32),
    RoundRobin,
}

impl RoundKind {
    /// Display name frozen onto the match row ("Community Round 1",
    /// "Special Round Robin").
    pub fn display_name(self, level: Level) -> String {
        match self {
            RoundKind::Bracket(ordinal) => format!("{} Round {}", level.label(), ordinal),
            RoundKind::RoundRobin => format!("{} Round Robin", level.label()),
        }
    }
}

/// Lifecycle of a match. `Completed` and `Forfeit` are terminal; a terminal
/// match is a historical record and is never deleted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Scheduled,
    InProgress,
    PendingConfirmation,
    Completed,
    Forfeit,
    Disputed,
}

impl MatchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Forfeit)
    }

    /// Whether a confirmed result may still be recorded against the match.
    pub fn is_confirmable(self) -> bool {
        matches!(
            self,
            MatchStatus::Pending
                | MatchStatus::Scheduled
                | MatchStatus::InProgress
                | MatchStatus::PendingConfirmation
        )
    }
}

/// A single match within one (level, group, round) scope. `player_2 = None`
/// marks a bye: a synthetic match created already completed with an implicit
/// win for `player_1`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub level: Level,
    pub group_id: GroupId,
    pub round: RoundKind,
    pub round_name: String,
    pub player_1: PlayerId,
    pub player_2: Option<PlayerId>,
    pub player_1_points: u32,
    pub player_2_points: u32,
    pub winner: Option<PlayerId>,
    pub status: MatchStatus,
    pub submitted_by: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    /// Create a pending head-to-head match.
    pub fn new(group_id: GroupId, round: RoundKind, player_1: PlayerId, player_2: PlayerId) -> Self {
        let level = group_id.level();
        Self {
            id: Uuid::new_v4(),
            level,
            group_id,
            round,
            round_name: round.display_name(level),
            player_1,
            player_2: Some(player_2),
            player_1_points: 0,
            player_2_points: 0,
            winner: None,
            status: MatchStatus::Pending,
            submitted_by: None,
            created_at: Utc::now(),
        }
    }

    /// Create a bye: completed on creation, no opponent, implicit win so the
    /// player counts as already through to the next round.
    pub fn bye(group_id: GroupId, round: RoundKind, player: PlayerId) -> Self {
        let level = group_id.level();
        Self {
            id: Uuid::new_v4(),
            level,
            group_id,
            round,
            round_name: round.display_name(level),
            player_1: player,
            player_2: None,
            player_1_points: 0,
            player_2_points: 0,
            winner: Some(player),
            status: MatchStatus::Completed,
            submitted_by: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_bye(&self) -> bool {
        self.player_2.is_none()
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.player_1 == player || self.player_2 == Some(player)
    }

    /// Participants eliminated by this match once it is terminal. A decided
    /// match eliminates the non-winner; a forfeit with no recorded winner
    /// (double no-show) eliminates both players; a bye eliminates nobody.
    pub fn losers(&self) -> Vec<PlayerId> {
        if !self.status.is_terminal() {
            return Vec::new();
        }
        self.participants()
            .into_iter()
            .filter(|p| Some(*p) != self.winner)
            .collect()
    }

    pub fn participants(&self) -> Vec<PlayerId> {
        match self.player_2 {
            Some(p2) => vec![self.player_1, p2],
            None => vec![self.player_1],
        }
    }

    /// Match points the given player scored here (0 if not a participant).
    pub fn points_for(&self, player: PlayerId) -> u32 {
        if self.player_1 == player {
            self.player_1_points
        } else if self.player_2 == Some(player) {
            self.player_2_points
        } else {
            0
        }
    }
}
