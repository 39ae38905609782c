//! Winner determination: final position assignment once a group finishes.

use crate::logic::round_robin::{calculate_standings, round_robin_complete};
use crate::models::{
    GroupId, Level, MatchRecord, PlayerId, RoundKind, Tournament, TournamentError, Winner,
    POINTS_PER_WIN,
};
use chrono::Utc;

/// Derive the group's final positions without writing anything.
///
/// Round-robin groups take their podium straight from the standings.
/// Bracket groups: position 1 is the final-match winner, position 2 the
/// final-match loser, position 3 the semifinal-eliminated player with the
/// better aggregate record (wins, then match points, then head-to-head,
/// then player id). Positions are contiguous from 1 and capped by both the
/// configured winner count and the group's player count.
pub fn determine_final_positions(
    tournament: &Tournament,
    group: GroupId,
) -> Result<Vec<Winner>, TournamentError> {
    let level = group.level();
    if !tournament.winners_of_group(level, group).is_empty() {
        return Err(TournamentError::GroupAlreadyProgressed {
            level,
            group: Some(group),
        });
    }

    let players = tournament.players_in_group(level, group);
    if players.is_empty() {
        return Err(TournamentError::InvalidState);
    }
    let required = tournament.winners_per_group.min(players.len() as u32) as usize;

    let ranked: Vec<(PlayerId, u32, u32)> = if tournament.has_round_robin(level, group) {
        if !round_robin_complete(tournament, level, group) {
            return Err(TournamentError::InvalidState);
        }
        calculate_standings(tournament, level, group)
            .into_iter()
            .map(|s| (s.player_id, s.points, s.wins))
            .collect()
    } else {
        bracket_podium(tournament, level, group)?
    };

    let group_name = tournament.geography.group_name(group);
    Ok(ranked
        .into_iter()
        .take(required)
        .enumerate()
        .map(|(idx, (player_id, points, wins))| Winner {
            level,
            group_id: group,
            group_name: group_name.clone(),
            player_id,
            position: idx as u32 + 1,
            points,
            wins,
            recorded_at: Utc::now(),
        })
        .collect())
}

/// Determine and persist the group's positions. The write is guarded by the
/// per-(level, group, position) uniqueness check in `record_winners`, so a
/// duplicate trigger can never produce duplicate rows.
pub fn record_final_positions(
    tournament: &mut Tournament,
    group: GroupId,
) -> Result<Vec<Winner>, TournamentError> {
    let rows = determine_final_positions(tournament, group)?;
    tournament.record_winners(rows.clone())?;
    log::info!(
        "tournament {}: recorded {} winner(s) for {} group {}",
        tournament.id,
        rows.len(),
        group.level().label(),
        rows.first().map(|w| w.group_name.as_str()).unwrap_or("?"),
    );
    Ok(rows)
}

/// Podium candidates for a bracket-decided group, best first:
/// champion, then the final-match loser, then semifinal losers by aggregate
/// record.
fn bracket_podium(
    tournament: &Tournament,
    level: Level,
    group: GroupId,
) -> Result<Vec<(PlayerId, u32, u32)>, TournamentError> {
    let final_ordinal = tournament
        .latest_bracket_ordinal(level, group)
        .ok_or(TournamentError::InvalidState)?;
    let final_matches = tournament.matches_in_round(level, group, RoundKind::Bracket(final_ordinal));
    if final_matches.iter().any(|m| !m.status.is_terminal()) {
        return Err(TournamentError::InvalidState);
    }

    // A decided bracket leaves exactly one player standing. Zero survivors
    // is an all-forfeit washout, more than one an unfinished bracket.
    let survivors = tournament.survivors(level, group);
    if survivors.len() != 1 {
        return Err(TournamentError::InvalidState);
    }
    let champion = survivors[0];

    let mut ordered = vec![champion];
    let runner_up = final_matches
        .iter()
        .find(|m| m.involves(champion) && !m.is_bye())
        .and_then(|m| m.losers().first().copied());
    if let Some(runner_up) = runner_up {
        ordered.push(runner_up);
    }

    if final_ordinal >= 2 {
        let semifinal =
            tournament.matches_in_round(level, group, RoundKind::Bracket(final_ordinal - 1));
        let mut consolation: Vec<PlayerId> = semifinal
            .iter()
            .flat_map(|m| m.losers())
            .filter(|p| !ordered.contains(p))
            .collect();
        rank_by_aggregate_record(tournament, level, group, &mut consolation);
        ordered.extend(consolation);
    }

    Ok(ordered
        .into_iter()
        .map(|p| {
            let wins = wins_in_group(tournament, level, group, p);
            (p, wins * POINTS_PER_WIN, wins)
        })
        .collect())
}

/// Order players by record within the group: wins desc, total match points
/// desc, head-to-head when exactly two are tied, player id last.
fn rank_by_aggregate_record(
    tournament: &Tournament,
    level: Level,
    group: GroupId,
    players: &mut [PlayerId],
) {
    let record = |p: PlayerId| {
        let wins = wins_in_group(tournament, level, group, p);
        let points: u32 = tournament
            .matches_in_group(level, group)
            .iter()
            .map(|m| m.points_for(p))
            .sum();
        (wins, points)
    };
    players.sort_by(|a, b| {
        let (wa, pa) = record(*a);
        let (wb, pb) = record(*b);
        wb.cmp(&wa).then(pb.cmp(&pa)).then(a.cmp(b))
    });
    if players.len() == 2 {
        let (first, second) = (players[0], players[1]);
        if record(first) == record(second) {
            let mutual = tournament
                .matches_in_group(level, group)
                .into_iter()
                .find(|m| m.status.is_terminal() && m.involves(first) && m.involves(second));
            if let Some(m) = mutual {
                if m.winner == Some(second) {
                    players.swap(0, 1);
                }
            }
        }
    }
}

fn wins_in_group(tournament: &Tournament, level: Level, group: GroupId, player: PlayerId) -> u32 {
    tournament
        .matches_in_group(level, group)
        .iter()
        .filter(|m| m.status.is_terminal() && m.winner == Some(player))
        .count() as u32
}
