//! Progression orchestration: result confirmation and everything that
//! follows from it (round robins, next rounds, winners, new levels).

use crate::logic::completion::{check_level_completion, check_round_completion, NextAction};
use crate::logic::pairing::pair_round;
use crate::logic::round_robin::{
    generate_round_robin_matches, round_robin_complete, should_trigger_round_robin,
};
use crate::logic::winners::record_final_positions;
use crate::models::{
    AutomationMode, GroupId, Level, MatchId, MatchStatus, PlayerId, RoundKind, Tournament,
    TournamentError, TournamentStatus,
};
use serde::{Deserialize, Serialize};

/// A match result submitted for confirmation.
#[derive(Clone, Debug, Deserialize)]
pub struct MatchConfirmation {
    pub match_id: MatchId,
    pub winner_id: PlayerId,
    pub player_1_points: u32,
    pub player_2_points: u32,
    #[serde(default)]
    pub submitted_by: Option<PlayerId>,
}

/// One progression step the engine carried out.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ProgressionAction {
    RoundRobinStarted { matches: usize },
    NextRoundPaired { ordinal: u32, matches: usize },
    WinnersRecorded { count: usize },
    /// Manual mode: the group's next step awaits an admin.
    GroupReady,
    LevelInitialized { level: Level, groups: usize },
    /// Manual mode: the level is complete and the next one awaits an admin.
    LevelReady { level: Level },
    TournamentCompleted,
}

/// What one confirmation set in motion. Step failures land in `errors`
/// instead of failing the confirmation; the steps rerun on the next
/// confirmation or an admin advance.
#[derive(Clone, Debug, Serialize)]
pub struct ProgressionReport {
    pub match_id: MatchId,
    pub level: Level,
    pub group_id: GroupId,
    pub actions: Vec<ProgressionAction>,
    pub errors: Vec<String>,
}

/// Who asked for a progression step.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AdvanceTrigger {
    Automatic,
    AdminAction,
}

/// Confirm a match result and run the progression that hangs off it.
///
/// Validation failures (unknown match, wrong winner, already settled) fail
/// the whole call. Once the result is applied, the follow-on steps are
/// fail-soft: each error is logged and reported, and the confirmation
/// still succeeds so the result is never lost.
pub fn confirm_match_result(
    tournament: &mut Tournament,
    confirmation: &MatchConfirmation,
) -> Result<ProgressionReport, TournamentError> {
    if tournament.status != TournamentStatus::Ongoing {
        return Err(TournamentError::InvalidState);
    }

    let record = tournament
        .match_by_id_mut(confirmation.match_id)
        .ok_or(TournamentError::MatchNotFound(confirmation.match_id))?;
    if !record.status.is_confirmable() {
        return Err(TournamentError::MatchNotConfirmable(confirmation.match_id));
    }
    if !record.involves(confirmation.winner_id) {
        return Err(TournamentError::WinnerNotInMatch {
            match_id: confirmation.match_id,
            player: confirmation.winner_id,
        });
    }

    record.winner = Some(confirmation.winner_id);
    record.player_1_points = confirmation.player_1_points;
    record.player_2_points = confirmation.player_2_points;
    record.submitted_by = confirmation.submitted_by;
    record.status = MatchStatus::Completed;
    let level = record.level;
    let group = record.group_id;
    let round = record.round;

    let mut report = ProgressionReport {
        match_id: confirmation.match_id,
        level,
        group_id: group,
        actions: Vec::new(),
        errors: Vec::new(),
    };
    run_group_progression(tournament, group, round, &mut report);
    run_level_progression(tournament, level, &mut report);
    Ok(report)
}

/// Execute the single step a group is due for: start its round robin, pair
/// its next round, or record its winners. Errors when the group is not
/// actually due for anything, so admin calls get a real answer.
pub fn advance_group(
    tournament: &mut Tournament,
    group: GroupId,
    trigger: AdvanceTrigger,
) -> Result<Vec<ProgressionAction>, TournamentError> {
    if tournament.status != TournamentStatus::Ongoing {
        return Err(TournamentError::InvalidState);
    }
    if trigger == AdvanceTrigger::Automatic
        && tournament.automation_mode == AutomationMode::Manual
    {
        return Err(TournamentError::InvalidAutomationTransition);
    }
    let level = group.level();
    if !tournament.winners_of_group(level, group).is_empty() {
        return Err(TournamentError::GroupAlreadyProgressed {
            level,
            group: Some(group),
        });
    }

    if tournament.has_round_robin(level, group) {
        if !round_robin_complete(tournament, level, group) {
            return Err(TournamentError::InvalidState);
        }
        let rows = record_final_positions(tournament, group)?;
        return Ok(vec![ProgressionAction::WinnersRecorded { count: rows.len() }]);
    }

    let ordinal = tournament
        .latest_bracket_ordinal(level, group)
        .ok_or(TournamentError::InvalidState)?;
    let completion = check_round_completion(tournament, group, ordinal);
    if !completion.complete {
        return Err(TournamentError::InvalidState);
    }
    match completion.next_action {
        NextAction::Wait => Err(TournamentError::InvalidState),
        NextAction::GroupDone => {
            let rows = record_final_positions(tournament, group)?;
            Ok(vec![ProgressionAction::WinnersRecorded { count: rows.len() }])
        }
        NextAction::StartRoundRobin => {
            let survivors = tournament.survivors(level, group);
            let matches = generate_round_robin_matches(tournament, group, &survivors)?;
            if matches.is_empty() {
                return Err(TournamentError::GroupAlreadyProgressed {
                    level,
                    group: Some(group),
                });
            }
            let count = matches.len();
            tournament.matches.extend(matches);
            log::info!(
                "started round robin of {} match(es) in {} group {}",
                count,
                level.label(),
                tournament.geography.group_name(group),
            );
            Ok(vec![ProgressionAction::RoundRobinStarted { matches: count }])
        }
        NextAction::PairNextRound => {
            let next_ordinal = ordinal + 1;
            if tournament.has_matches_in_round(level, group, RoundKind::Bracket(next_ordinal)) {
                return Err(TournamentError::GroupAlreadyProgressed {
                    level,
                    group: Some(group),
                });
            }
            let survivors = tournament.survivors(level, group);
            let matches = pair_round(tournament, group, &survivors, next_ordinal)?;
            let count = matches.len();
            tournament.matches.extend(matches);
            log::info!(
                "paired round {} with {} match(es) in {} group {}",
                next_ordinal,
                count,
                level.label(),
                tournament.geography.group_name(group),
            );
            Ok(vec![ProgressionAction::NextRoundPaired {
                ordinal: next_ordinal,
                matches: count,
            }])
        }
    }
}

/// Seed every group of the level after `completed_level` from its recorded
/// winners: small fields open straight into a round robin, larger ones into
/// bracket round 1. Errors if the level is not fully decided yet or the
/// next level already has matches.
pub fn initialize_next_level(
    tournament: &mut Tournament,
    completed_level: Level,
) -> Result<Vec<ProgressionAction>, TournamentError> {
    let next = match completed_level.next() {
        Some(next) => next,
        None => return Err(TournamentError::InvalidState),
    };
    let completion = check_level_completion(tournament, completed_level);
    if !completion.complete {
        return Err(TournamentError::IncompleteLevel {
            level: completed_level,
            missing: completion.shortfalls(),
        });
    }
    if !tournament.groups_at_level(next).is_empty() {
        return Err(TournamentError::GroupAlreadyProgressed {
            level: next,
            group: None,
        });
    }

    // Regroup the promoted players by the next level's geography, keeping
    // winner order (position within group) inside each new group.
    let promoted: Vec<PlayerId> = tournament
        .winners_at_level(completed_level)
        .iter()
        .map(|w| w.player_id)
        .collect();
    let mut grouped: Vec<(GroupId, Vec<PlayerId>)> = Vec::new();
    for player in promoted {
        let registration = tournament
            .registration(player)
            .ok_or(TournamentError::PlayerNotFound(player))?;
        let group = next.group_of(registration);
        match grouped.iter_mut().find(|(g, _)| *g == group) {
            Some((_, members)) => members.push(player),
            None => grouped.push((group, vec![player])),
        }
    }

    let mut actions = vec![ProgressionAction::LevelInitialized {
        level: next,
        groups: grouped.len(),
    }];
    for (group, players) in &grouped {
        seed_group(tournament, *group, players)?;
    }
    log::info!(
        "initialized {} level with {} group(s) from {} promoted player(s)",
        next.label(),
        grouped.len(),
        grouped.iter().map(|(_, p)| p.len()).sum::<usize>(),
    );

    // A single-player group is one bye, already terminal, so it owes its
    // winner row before any confirmation can arrive.
    for (group, _) in &grouped {
        settle_instant_byes(tournament, *group, &mut actions);
    }
    finish_settled_level(tournament, next, &mut actions);
    Ok(actions)
}

/// Open the first round for a group: a round robin when the field is already
/// inside the too-small-to-bracket window, a bracket round otherwise.
pub(crate) fn seed_group(
    tournament: &mut Tournament,
    group: GroupId,
    players: &[PlayerId],
) -> Result<(), TournamentError> {
    let matches = if should_trigger_round_robin(tournament.winners_per_group, players.len()) {
        generate_round_robin_matches(tournament, group, players)?
    } else {
        pair_round(tournament, group, players, 1)?
    };
    tournament.matches.extend(matches);
    Ok(())
}

/// Record winners for a group whose seeded round was nothing but byes.
pub(crate) fn settle_instant_byes(
    tournament: &mut Tournament,
    group: GroupId,
    actions: &mut Vec<ProgressionAction>,
) {
    let level = group.level();
    if !tournament.winners_of_group(level, group).is_empty()
        || tournament.has_round_robin(level, group)
    {
        return;
    }
    let ordinal = match tournament.latest_bracket_ordinal(level, group) {
        Some(ordinal) => ordinal,
        None => return,
    };
    let completion = check_round_completion(tournament, group, ordinal);
    if completion.complete && completion.next_action == NextAction::GroupDone {
        match record_final_positions(tournament, group) {
            Ok(rows) => actions.push(ProgressionAction::WinnersRecorded { count: rows.len() }),
            Err(e) => log::warn!(
                "settling bye-only {} group {} failed: {}",
                level.label(),
                tournament.geography.group_name(group),
                e,
            ),
        }
    }
}

/// Steps awaiting an admin in manual mode, or retryable steps whose
/// automatic run failed.
#[derive(Clone, Debug, Serialize)]
pub struct PendingApproval {
    pub level: Level,
    /// None for a whole-level step (initializing the next level).
    pub group_id: Option<GroupId>,
    pub group_name: String,
    pub ready_for_next_level: bool,
}

/// Every progression step the tournament is currently waiting on.
pub fn pending_approvals(tournament: &Tournament) -> Vec<PendingApproval> {
    let mut pending = Vec::new();
    if tournament.status != TournamentStatus::Ongoing {
        return pending;
    }

    let mut cursor = Some(tournament.first_level());
    while let Some(level) = cursor {
        for group in tournament.groups_at_level(level) {
            if !tournament.winners_of_group(level, group).is_empty() {
                continue;
            }
            if group_awaits_step(tournament, level, group) {
                pending.push(PendingApproval {
                    level,
                    group_id: Some(group),
                    group_name: tournament.geography.group_name(group),
                    ready_for_next_level: false,
                });
            }
        }
        let completion = check_level_completion(tournament, level);
        if completion.complete {
            if let Some(next) = level.next() {
                if tournament.groups_at_level(next).is_empty() {
                    pending.push(PendingApproval {
                        level,
                        group_id: None,
                        group_name: format!("{} level", level.label()),
                        ready_for_next_level: true,
                    });
                }
            }
        }
        cursor = level.next();
    }
    pending
}

fn group_awaits_step(tournament: &Tournament, level: Level, group: GroupId) -> bool {
    if tournament.has_round_robin(level, group) {
        return round_robin_complete(tournament, level, group);
    }
    match tournament.latest_bracket_ordinal(level, group) {
        Some(ordinal) => {
            let completion = check_round_completion(tournament, group, ordinal);
            completion.complete && completion.next_action != NextAction::Wait
        }
        None => false,
    }
}

fn run_group_progression(
    tournament: &mut Tournament,
    group: GroupId,
    round: RoundKind,
    report: &mut ProgressionReport,
) {
    let level = group.level();
    match round {
        RoundKind::RoundRobin => {
            // Winners come off the table in either automation mode; no
            // matches are created here.
            if round_robin_complete(tournament, level, group) {
                record_group_winners(tournament, group, report);
            }
        }
        RoundKind::Bracket(ordinal) => {
            let completion = check_round_completion(tournament, group, ordinal);
            if !completion.complete {
                return;
            }
            match completion.next_action {
                NextAction::Wait => {}
                NextAction::GroupDone => record_group_winners(tournament, group, report),
                NextAction::StartRoundRobin | NextAction::PairNextRound => {
                    if tournament.automation_mode == AutomationMode::Manual {
                        report.actions.push(ProgressionAction::GroupReady);
                        return;
                    }
                    match advance_group(tournament, group, AdvanceTrigger::Automatic) {
                        Ok(actions) => report.actions.extend(actions),
                        Err(e) => fail_soft(tournament, report, "group advancement", e),
                    }
                }
            }
        }
    }
}

fn run_level_progression(tournament: &mut Tournament, level: Level, report: &mut ProgressionReport) {
    let completion = check_level_completion(tournament, level);
    if !completion.complete {
        return;
    }
    match level.next() {
        None => mark_completed(tournament, &mut report.actions),
        Some(next) => {
            if !tournament.groups_at_level(next).is_empty() {
                return;
            }
            if tournament.automation_mode == AutomationMode::Manual {
                report.actions.push(ProgressionAction::LevelReady { level });
                return;
            }
            match initialize_next_level(tournament, level) {
                Ok(actions) => report.actions.extend(actions),
                Err(e) => fail_soft(tournament, report, "level initialization", e),
            }
        }
    }
}

/// After settling byes in a freshly seeded level, the level itself may
/// already be decided; carry the tournament forward the same way a
/// confirmation would have.
pub(crate) fn finish_settled_level(
    tournament: &mut Tournament,
    level: Level,
    actions: &mut Vec<ProgressionAction>,
) {
    if !check_level_completion(tournament, level).complete {
        return;
    }
    match level.next() {
        None => mark_completed(tournament, actions),
        Some(_) => {
            if tournament.automation_mode == AutomationMode::Manual {
                actions.push(ProgressionAction::LevelReady { level });
                return;
            }
            match initialize_next_level(tournament, level) {
                Ok(next_actions) => actions.extend(next_actions),
                Err(e) => log::warn!(
                    "initializing level after {} failed: {}",
                    level.label(),
                    e,
                ),
            }
        }
    }
}

fn mark_completed(tournament: &mut Tournament, actions: &mut Vec<ProgressionAction>) {
    if tournament.status != TournamentStatus::Completed {
        tournament.status = TournamentStatus::Completed;
        actions.push(ProgressionAction::TournamentCompleted);
        log::info!("tournament {} completed", tournament.id);
    }
}

fn record_group_winners(
    tournament: &mut Tournament,
    group: GroupId,
    report: &mut ProgressionReport,
) {
    match record_final_positions(tournament, group) {
        Ok(rows) => report
            .actions
            .push(ProgressionAction::WinnersRecorded { count: rows.len() }),
        Err(e) => fail_soft(tournament, report, "winner recording", e),
    }
}

fn fail_soft(
    tournament: &Tournament,
    report: &mut ProgressionReport,
    step: &str,
    err: TournamentError,
) {
    if let TournamentError::GroupAlreadyProgressed { .. } = err {
        // Duplicate trigger, somebody else got there first.
        log::debug!("{} skipped: {}", step, err);
        return;
    }
    log::warn!(
        "tournament {}: {} failed for {} group {} after match {}: {}",
        tournament.id,
        step,
        report.level.label(),
        tournament.geography.group_name(report.group_id),
        report.match_id,
        err,
    );
    report.errors.push(format!("{}: {}", step, err));
}
