//! Round and level completion checks.

use crate::logic::round_robin::should_trigger_round_robin;
use crate::models::{GroupId, GroupShortfall, Level, RoundKind, Tournament};
use serde::Serialize;

/// What a completed round calls for next.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    /// Matches still outstanding.
    Wait,
    /// Survivors should be paired into the next bracket round.
    PairNextRound,
    /// Too few survivors to bracket; the round robin decides the podium.
    StartRoundRobin,
    /// Nothing left to play at this level; the group's winners can be
    /// recorded.
    GroupDone,
}

/// Completion report for one bracket round.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct RoundCompletion {
    pub complete: bool,
    pub next_action: NextAction,
}

/// Check one bracket round of a group. Round-robin rounds are deliberately
/// outside this check: their completion is the round-robin engine's own
/// path, which keeps a single confirmation from triggering progression
/// twice.
pub fn check_round_completion(
    tournament: &Tournament,
    group: GroupId,
    ordinal: u32,
) -> RoundCompletion {
    let level = group.level();
    let matches = tournament.matches_in_round(level, group, RoundKind::Bracket(ordinal));
    if matches.is_empty() || matches.iter().any(|m| !m.status.is_terminal()) {
        return RoundCompletion {
            complete: false,
            next_action: NextAction::Wait,
        };
    }

    let survivors = tournament.survivors(level, group);
    let next_action = if survivors.len() <= 1 {
        NextAction::GroupDone
    } else if should_trigger_round_robin(tournament.winners_per_group, survivors.len()) {
        NextAction::StartRoundRobin
    } else {
        NextAction::PairNextRound
    };

    RoundCompletion {
        complete: true,
        next_action,
    }
}

/// Per-group progress towards the level's winner quota.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GroupProgress {
    pub group_id: GroupId,
    pub group_name: String,
    pub expected: u32,
    pub produced: u32,
    pub complete: bool,
}

/// Completion report for a whole level.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LevelCompletion {
    pub complete: bool,
    pub groups: Vec<GroupProgress>,
}

impl LevelCompletion {
    /// The groups still owing winners, as error diagnostics.
    pub fn shortfalls(&self) -> Vec<GroupShortfall> {
        self.groups
            .iter()
            .filter(|g| !g.complete)
            .map(|g| GroupShortfall {
                group_id: g.group_id,
                group_name: g.group_name.clone(),
                produced: g.produced,
                expected: g.expected,
            })
            .collect()
    }
}

/// Check whether every expected group at the level has recorded its winners.
///
/// Expected groups are those with at least one match row at the level; a
/// geography with no participants never gets matches and so never blocks
/// promotion. Winner rows are written once, as a whole set, when a group
/// finishes, so any recorded row means the group is done — the set can come
/// up short of the quota when forfeits shrink the field below it, and such
/// a group must still count as settled rather than stall the level forever.
/// The quota (capped by the group's own player count, so a two-player
/// community owes two winners, not three) only feeds the shortfall
/// diagnostics for groups that have recorded nothing.
pub fn check_level_completion(tournament: &Tournament, level: Level) -> LevelCompletion {
    let groups: Vec<GroupProgress> = tournament
        .groups_at_level(level)
        .into_iter()
        .map(|group_id| {
            let players = tournament.players_in_group(level, group_id).len() as u32;
            let expected = tournament.winners_per_group.min(players);
            let produced = tournament.winners_of_group(level, group_id).len() as u32;
            GroupProgress {
                group_id,
                group_name: tournament.geography.group_name(group_id),
                expected,
                produced,
                complete: produced > 0,
            }
        })
        .collect();

    LevelCompletion {
        complete: !groups.is_empty() && groups.iter().all(|g| g.complete),
        groups,
    }
}
