//! Tournament aggregate: configuration, roster, match and winner rows.

use crate::models::geography::{CommunityId, Geography, GroupId, Level};
use crate::models::match_record::{MatchId, MatchRecord, RoundKind};
use crate::models::player::{PlayerId, Registration};
use crate::models::winner::Winner;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur during tournament operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    /// Pairing or generation requested with zero candidates.
    NoEligiblePlayers,
    /// The round/level for this group was already advanced; callers treat
    /// this as a no-op success, not a failure. `group` is None when a whole
    /// level was the duplicate target.
    GroupAlreadyProgressed {
        level: Level,
        group: Option<GroupId>,
    },
    /// Next-level initialization attempted before all required groups
    /// produced their winners. Carries the shortfall per group.
    IncompleteLevel {
        level: Level,
        missing: Vec<GroupShortfall>,
    },
    /// Automatic advancement attempted on a manual-mode tournament.
    InvalidAutomationTransition,
    /// Tournament is not in a state that allows this action.
    InvalidState,
    /// No match with this id.
    MatchNotFound(MatchId),
    /// The match already carries a final result (or is disputed).
    MatchNotConfirmable(MatchId),
    /// The reported winner did not play in the match.
    WinnerNotInMatch { match_id: MatchId, player: PlayerId },
    /// Player not found in the roster.
    PlayerNotFound(PlayerId),
    /// A winner row for this (level, group, position) already exists.
    DuplicateWinnerPosition {
        level: Level,
        group: GroupId,
        position: u32,
    },
    /// A roster upload could not be parsed.
    InvalidRoster(String),
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::NoEligiblePlayers => write!(f, "No eligible players to pair"),
            TournamentError::GroupAlreadyProgressed { .. } => {
                write!(f, "Group has already been advanced")
            }
            TournamentError::IncompleteLevel { level, missing } => write!(
                f,
                "{} level incomplete: {} group(s) still owe winners",
                level.label(),
                missing.len()
            ),
            TournamentError::InvalidAutomationTransition => {
                write!(f, "Tournament is in manual mode; use the admin advance action")
            }
            TournamentError::InvalidState => write!(f, "Invalid state for this action"),
            TournamentError::MatchNotFound(_) => write!(f, "Match not found"),
            TournamentError::MatchNotConfirmable(_) => {
                write!(f, "Match already has a final result")
            }
            TournamentError::WinnerNotInMatch { .. } => {
                write!(f, "Reported winner is not a participant of this match")
            }
            TournamentError::PlayerNotFound(_) => write!(f, "Player not found"),
            TournamentError::DuplicateWinnerPosition { position, .. } => {
                write!(f, "Position {} already recorded for this group", position)
            }
            TournamentError::InvalidRoster(reason) => write!(f, "Invalid roster: {}", reason),
        }
    }
}

/// Per-group winner shortfall, reported when a level cannot initialize.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GroupShortfall {
    pub group_id: GroupId,
    pub group_name: String,
    pub produced: u32,
    pub expected: u32,
}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Whether progression runs by itself on match confirmation or waits for an
/// admin action.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationMode {
    #[default]
    Automatic,
    Manual,
}

/// Lifecycle of the tournament as a whole.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    #[default]
    Registration,
    Upcoming,
    Ongoing,
    Completed,
}

/// Full tournament state: configuration, the eligible roster and geography,
/// and the match/winner rows that are the engine's only shared mutable state.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    /// Flat single-level tournament (Special tier) instead of the 4-tier
    /// geographic climb.
    pub special: bool,
    pub automation_mode: AutomationMode,
    /// Podium positions to award per group (default 3).
    pub winners_per_group: u32,
    pub status: TournamentStatus,
    pub roster: Vec<Registration>,
    pub geography: Geography,
    pub matches: Vec<MatchRecord>,
    pub winners: Vec<Winner>,
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    /// Create a tournament in Registration status with an empty roster.
    pub fn new(
        name: impl Into<String>,
        special: bool,
        automation_mode: AutomationMode,
        winners_per_group: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            special,
            automation_mode,
            winners_per_group: winners_per_group.max(1),
            status: TournamentStatus::Registration,
            roster: Vec::new(),
            geography: Geography::default(),
            matches: Vec::new(),
            winners: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// The level this tournament opens at.
    pub fn first_level(&self) -> Level {
        Level::first(self.special)
    }

    /// Replace the roster and geography index. Only allowed before play
    /// starts.
    pub fn set_roster(
        &mut self,
        registrations: Vec<Registration>,
        geography: Geography,
    ) -> Result<(), TournamentError> {
        if !matches!(
            self.status,
            TournamentStatus::Registration | TournamentStatus::Upcoming
        ) {
            return Err(TournamentError::InvalidState);
        }
        self.roster = registrations;
        self.geography = geography;
        Ok(())
    }

    /// Switch between automatic and manual progression. Allowed at any point
    /// before the tournament completes, so an admin can take over a running
    /// tournament.
    pub fn set_automation_mode(&mut self, mode: AutomationMode) -> Result<(), TournamentError> {
        if self.status == TournamentStatus::Completed {
            return Err(TournamentError::InvalidState);
        }
        self.automation_mode = mode;
        Ok(())
    }

    /// Registrations with completed payment, in registration order.
    pub fn eligible_roster(&self) -> Vec<&Registration> {
        self.roster.iter().filter(|r| r.is_eligible()).collect()
    }

    pub fn registration(&self, player: PlayerId) -> Option<&Registration> {
        self.roster.iter().find(|r| r.player_id == player)
    }

    /// Position in the roster; the deterministic seed for pairing order.
    pub fn registration_index(&self, player: PlayerId) -> Option<usize> {
        self.roster.iter().position(|r| r.player_id == player)
    }

    pub fn community_of(&self, player: PlayerId) -> Option<CommunityId> {
        self.registration(player).map(|r| r.community_id)
    }

    pub fn player_name(&self, player: PlayerId) -> String {
        self.registration(player)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| player.to_string())
    }

    pub fn match_by_id(&self, id: MatchId) -> Option<&MatchRecord> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn match_by_id_mut(&mut self, id: MatchId) -> Option<&mut MatchRecord> {
        self.matches.iter_mut().find(|m| m.id == id)
    }

    /// All matches of one (level, group) scope, in creation order.
    pub fn matches_in_group(&self, level: Level, group: GroupId) -> Vec<&MatchRecord> {
        self.matches
            .iter()
            .filter(|m| m.level == level && m.group_id == group)
            .collect()
    }

    /// All matches of one (level, group, round) scope.
    pub fn matches_in_round(&self, level: Level, group: GroupId, round: RoundKind) -> Vec<&MatchRecord> {
        self.matches
            .iter()
            .filter(|m| m.level == level && m.group_id == group && m.round == round)
            .collect()
    }

    /// Idempotency check used before generating a round.
    pub fn has_matches_in_round(&self, level: Level, group: GroupId, round: RoundKind) -> bool {
        self.matches
            .iter()
            .any(|m| m.level == level && m.group_id == group && m.round == round)
    }

    pub fn has_round_robin(&self, level: Level, group: GroupId) -> bool {
        self.has_matches_in_round(level, group, RoundKind::RoundRobin)
    }

    /// Highest bracket ordinal generated so far for the group.
    pub fn latest_bracket_ordinal(&self, level: Level, group: GroupId) -> Option<u32> {
        self.matches
            .iter()
            .filter(|m| m.level == level && m.group_id == group)
            .filter_map(|m| match m.round {
                RoundKind::Bracket(ordinal) => Some(ordinal),
                RoundKind::RoundRobin => None,
            })
            .max()
    }

    /// Distinct groups that have at least one match at the level.
    pub fn groups_at_level(&self, level: Level) -> Vec<GroupId> {
        let mut groups = Vec::new();
        for m in self.matches.iter().filter(|m| m.level == level) {
            if !groups.contains(&m.group_id) {
                groups.push(m.group_id);
            }
        }
        groups
    }

    /// Distinct players who have appeared in the group's matches.
    pub fn players_in_group(&self, level: Level, group: GroupId) -> Vec<PlayerId> {
        let mut players = Vec::new();
        for m in self.matches.iter().filter(|m| m.level == level && m.group_id == group) {
            for p in m.participants() {
                if !players.contains(&p) {
                    players.push(p);
                }
            }
        }
        players
    }

    /// Players still alive in the group: everyone who has appeared minus
    /// everyone a terminal match eliminated, ordered by registration index
    /// so downstream pairing stays deterministic.
    pub fn survivors(&self, level: Level, group: GroupId) -> Vec<PlayerId> {
        let mut eliminated = Vec::new();
        for m in self.matches.iter().filter(|m| m.level == level && m.group_id == group) {
            eliminated.extend(m.losers());
        }
        let mut alive: Vec<PlayerId> = self
            .players_in_group(level, group)
            .into_iter()
            .filter(|p| !eliminated.contains(p))
            .collect();
        alive.sort_by_key(|p| (self.registration_index(*p).unwrap_or(usize::MAX), *p));
        alive
    }

    /// Whether the player already has a non-terminal match at this level.
    pub fn has_active_match(&self, level: Level, player: PlayerId) -> bool {
        self.matches
            .iter()
            .any(|m| m.level == level && !m.status.is_terminal() && m.involves(player))
    }

    pub fn winners_of_group(&self, level: Level, group: GroupId) -> Vec<&Winner> {
        let mut rows: Vec<&Winner> = self
            .winners
            .iter()
            .filter(|w| w.level == level && w.group_id == group)
            .collect();
        rows.sort_by_key(|w| w.position);
        rows
    }

    pub fn winners_at_level(&self, level: Level) -> Vec<&Winner> {
        self.winners.iter().filter(|w| w.level == level).collect()
    }

    /// Persist winner rows, enforcing (level, group, position) uniqueness.
    /// This is the last line of defense against a duplicate trigger; callers
    /// are expected to have checked `winners_of_group` first.
    pub fn record_winners(&mut self, rows: Vec<Winner>) -> Result<(), TournamentError> {
        for (idx, row) in rows.iter().enumerate() {
            let taken = self
                .winners
                .iter()
                .chain(&rows[..idx])
                .any(|w| {
                    w.level == row.level && w.group_id == row.group_id && w.position == row.position
                });
            if taken {
                return Err(TournamentError::DuplicateWinnerPosition {
                    level: row.level,
                    group: row.group_id,
                    position: row.position,
                });
            }
        }
        self.winners.extend(rows);
        Ok(())
    }
}
