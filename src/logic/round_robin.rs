//! Round-robin fallback: all-play-all generation, standings, and winners.

use crate::models::{
    GroupId, Level, MatchRecord, PlayerId, RoundKind, Standing, Tournament, TournamentError,
    POINTS_PER_WIN,
};

/// Whether a group with `remaining` survivors must switch to a round robin.
///
/// Another elimination round would leave ⌈remaining/2⌉ survivors; when that
/// is fewer than the podium positions to award, a bracket can no longer rank
/// them and the group plays all-play-all instead. With the default 3 winners
/// this triggers for 2–4 survivors.
pub fn should_trigger_round_robin(winners_per_group: u32, remaining: usize) -> bool {
    if remaining < 2 {
        return false;
    }
    let survivors_after_round = (remaining + 1) / 2;
    (survivors_after_round as u32) < winners_per_group
}

/// Generate every pairwise match for the group's round robin, all at once.
///
/// Idempotent: if the group already has round-robin matches the call is a
/// no-op and returns no new rows.
pub fn generate_round_robin_matches(
    tournament: &Tournament,
    group: GroupId,
    players: &[PlayerId],
) -> Result<Vec<MatchRecord>, TournamentError> {
    if players.len() < 2 {
        return Err(TournamentError::NoEligiblePlayers);
    }
    let level = group.level();
    if tournament.has_round_robin(level, group) {
        return Ok(Vec::new());
    }

    let mut matches = Vec::with_capacity(players.len() * (players.len() - 1) / 2);
    for i in 0..players.len() {
        for j in (i + 1)..players.len() {
            matches.push(MatchRecord::new(
                group,
                RoundKind::RoundRobin,
                players[i],
                players[j],
            ));
        }
    }
    Ok(matches)
}

/// Whether every round-robin match in the group has a terminal status.
pub fn round_robin_complete(tournament: &Tournament, level: Level, group: GroupId) -> bool {
    let matches = tournament.matches_in_round(level, group, RoundKind::RoundRobin);
    !matches.is_empty() && matches.iter().all(|m| m.status.is_terminal())
}

/// Compute the group's round-robin table from terminal matches.
///
/// 3 points per win, 0 per loss; ties are impossible (a match has a winner
/// or is a forfeit, and a forfeit without a winner awards neither player).
/// Rank: points desc, wins desc, head-to-head between exactly two tied
/// players, then player id ascending. A pure function of the match rows, so
/// repeated calls yield identical ordering.
pub fn calculate_standings(tournament: &Tournament, level: Level, group: GroupId) -> Vec<Standing> {
    let matches = tournament.matches_in_round(level, group, RoundKind::RoundRobin);

    let mut players: Vec<PlayerId> = Vec::new();
    for m in &matches {
        for p in m.participants() {
            if !players.contains(&p) {
                players.push(p);
            }
        }
    }

    let mut standings: Vec<Standing> = players
        .into_iter()
        .map(|player| {
            let terminal = matches
                .iter()
                .filter(|m| m.status.is_terminal() && m.involves(player));
            let mut wins = 0;
            let mut played = 0;
            for m in terminal {
                played += 1;
                if m.winner == Some(player) {
                    wins += 1;
                }
            }
            Standing {
                player_id: player,
                points: wins * POINTS_PER_WIN,
                wins,
                matches_played: played,
            }
        })
        .collect();

    standings.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.wins.cmp(&a.wins))
            .then(a.player_id.cmp(&b.player_id))
    });

    // Head-to-head pass: within a tie on (points, wins) of exactly two
    // players, the winner of their mutual match ranks first. Larger tie
    // groups keep player-id order so the ranking stays total even through
    // win cycles.
    let mut i = 0;
    while i < standings.len() {
        let mut j = i + 1;
        while j < standings.len()
            && standings[j].points == standings[i].points
            && standings[j].wins == standings[i].wins
        {
            j += 1;
        }
        if j - i == 2 {
            if let Some(winner) =
                head_to_head_winner(&matches, standings[i].player_id, standings[i + 1].player_id)
            {
                if winner == standings[i + 1].player_id {
                    standings.swap(i, i + 1);
                }
            }
        }
        i = j;
    }

    standings
}

/// Top `winners_per_group` of the ranking, ordered by position.
pub fn round_robin_winners(tournament: &Tournament, level: Level, group: GroupId) -> Vec<PlayerId> {
    let take = tournament.winners_per_group as usize;
    calculate_standings(tournament, level, group)
        .into_iter()
        .take(take)
        .map(|s| s.player_id)
        .collect()
}

fn head_to_head_winner(matches: &[&MatchRecord], a: PlayerId, b: PlayerId) -> Option<PlayerId> {
    matches
        .iter()
        .find(|m| m.status.is_terminal() && m.involves(a) && m.involves(b))
        .and_then(|m| m.winner)
}
