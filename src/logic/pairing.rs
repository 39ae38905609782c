//! Bracket pairing: seeded sequential pairing with community avoidance and byes.

use crate::models::{GroupId, MatchRecord, PlayerId, RoundKind, Tournament, TournamentError};

/// Pair one bracket round for a group.
///
/// 1. Order candidates by registration index (the deterministic seed).
/// 2. Pair sequentially; when both members of a candidate pair share a
///    community and the next candidate does not, swap them. One swap, no
///    backtracking: avoidance is best-effort and some orders still produce
///    same-community pairings (always, at community level itself).
/// 3. Odd count: the last unmatched player gets an automatic bye (a
///    completed match with no opponent) so later rounds treat them as
///    already through.
///
/// Produces exactly ⌈N/2⌉ matches with every player appearing once.
pub fn pair_round(
    tournament: &Tournament,
    group: GroupId,
    players: &[PlayerId],
    ordinal: u32,
) -> Result<Vec<MatchRecord>, TournamentError> {
    if players.is_empty() {
        return Err(TournamentError::NoEligiblePlayers);
    }

    let mut queue: Vec<PlayerId> = players.to_vec();
    queue.sort_by_key(|p| (tournament.registration_index(*p).unwrap_or(usize::MAX), *p));

    let round = RoundKind::Bracket(ordinal);
    let mut matches = Vec::with_capacity(queue.len() / 2 + 1);

    let mut i = 0;
    while i + 1 < queue.len() {
        if same_community(tournament, queue[i], queue[i + 1])
            && i + 2 < queue.len()
            && !same_community(tournament, queue[i], queue[i + 2])
        {
            queue.swap(i + 1, i + 2);
        }
        matches.push(MatchRecord::new(group, round, queue[i], queue[i + 1]));
        i += 2;
    }
    if i < queue.len() {
        matches.push(MatchRecord::bye(group, round, queue[i]));
    }

    Ok(matches)
}

fn same_community(tournament: &Tournament, a: PlayerId, b: PlayerId) -> bool {
    match (tournament.community_of(a), tournament.community_of(b)) {
        (Some(ca), Some(cb)) => ca == cb,
        _ => false,
    }
}
