//! Setup phase: open play by seeding the first level from the roster.

use crate::logic::progression::{
    finish_settled_level, seed_group, settle_instant_byes, ProgressionAction,
};
use crate::models::{
    GroupId, PlayerId, Tournament, TournamentError, TournamentStatus,
};

/// Start the tournament: group every eligible registrant at the first level
/// and open each group's first round. Groups follow registration order, so
/// identical rosters always produce identical openings.
pub fn start_tournament(
    tournament: &mut Tournament,
) -> Result<Vec<ProgressionAction>, TournamentError> {
    if tournament.status != TournamentStatus::Registration
        && tournament.status != TournamentStatus::Upcoming
    {
        return Err(TournamentError::InvalidState);
    }

    let level = tournament.first_level();
    let mut grouped: Vec<(GroupId, Vec<PlayerId>)> = Vec::new();
    for registration in tournament.eligible_roster() {
        let group = level.group_of(registration);
        match grouped.iter_mut().find(|(g, _)| *g == group) {
            Some((_, members)) => members.push(registration.player_id),
            None => grouped.push((group, vec![registration.player_id])),
        }
    }
    if grouped.is_empty() {
        return Err(TournamentError::NoEligiblePlayers);
    }

    for (group, players) in &grouped {
        seed_group(tournament, *group, players)?;
    }
    tournament.status = TournamentStatus::Ongoing;
    log::info!(
        "tournament {} started: {} {} group(s), {} player(s)",
        tournament.id,
        grouped.len(),
        level.label(),
        grouped.iter().map(|(_, p)| p.len()).sum::<usize>(),
    );

    let mut actions = vec![ProgressionAction::LevelInitialized {
        level,
        groups: grouped.len(),
    }];
    // One-player groups open as a lone bye and are decided on the spot.
    for (group, _) in &grouped {
        settle_instant_byes(tournament, *group, &mut actions);
    }
    finish_settled_level(tournament, level, &mut actions);
    Ok(actions)
}
