//! Integration tests for progression orchestration: the five-player scenario
//! end to end, duplicate triggers, manual-mode gating, and level hand-off.

use pool_tournament_web::{
    advance_group, check_level_completion, confirm_match_result, initialize_next_level,
    pending_approvals, start_tournament, AdvanceTrigger, AutomationMode, CommunityInfo,
    CountyInfo, Geography, GroupId, Level, MatchConfirmation, MatchStatus, PaymentStatus,
    PlayerId, ProgressionAction, ProgressionReport, Registration, Tournament, TournamentError,
    TournamentStatus,
};
use uuid::Uuid;

fn tournament_with_communities(
    sizes: &[usize],
    automation_mode: AutomationMode,
) -> (Tournament, Vec<Vec<PlayerId>>, Vec<GroupId>) {
    let region = Uuid::from_u128(900);
    let county = Uuid::from_u128(800);
    let mut geography = Geography::default();
    geography.regions.insert(region, "North".to_string());
    geography.counties.insert(
        county,
        CountyInfo {
            name: "Highland".to_string(),
            region_id: region,
        },
    );
    let mut roster = Vec::new();
    let mut ids = Vec::new();
    let mut groups = Vec::new();
    let mut n = 1u128;
    for (ci, size) in sizes.iter().enumerate() {
        let community = Uuid::from_u128(700 + ci as u128);
        geography.communities.insert(
            community,
            CommunityInfo {
                name: format!("Community {}", ci + 1),
                county_id: county,
            },
        );
        groups.push(GroupId::Community(community));
        let mut members = Vec::new();
        for _ in 0..*size {
            let r = Registration {
                player_id: Uuid::from_u128(n),
                name: format!("P{}", n),
                community_id: community,
                county_id: county,
                region_id: region,
                payment_status: PaymentStatus::Completed,
            };
            members.push(r.player_id);
            roster.push(r);
            n += 1;
        }
        ids.push(members);
    }
    let mut t = Tournament::new("Progression", false, automation_mode, 3);
    t.set_roster(roster, geography).unwrap();
    (t, ids, groups)
}

fn confirm(t: &mut Tournament, a: PlayerId, b: PlayerId, winner: PlayerId) -> ProgressionReport {
    let id = t
        .matches
        .iter()
        .find(|m| m.status == MatchStatus::Pending && m.involves(a) && m.involves(b))
        .map(|m| m.id)
        .expect("no pending match between the two players");
    confirm_match_result(
        t,
        &MatchConfirmation {
            match_id: id,
            winner_id: winner,
            player_1_points: 7,
            player_2_points: 4,
            submitted_by: None,
        },
    )
    .unwrap()
}

/// Play a three-player round robin so that `first` beats both others and
/// `second` beats `third`.
fn play_trio(t: &mut Tournament, first: PlayerId, second: PlayerId, third: PlayerId) {
    confirm(t, first, second, first);
    confirm(t, first, third, first);
    confirm(t, second, third, second);
}

#[test]
fn five_player_community_reaches_the_national_podium() {
    let (mut t, ids, groups) = tournament_with_communities(&[5], AutomationMode::Automatic);
    start_tournament(&mut t).unwrap();
    let p = &ids[0];

    // Opening round: (1,2), (3,4) and a bye for the fifth registrant.
    let round_1 = t.matches_in_group(Level::Community, groups[0]);
    assert_eq!(round_1.len(), 3);
    assert!(round_1[2].is_bye());
    assert_eq!(round_1[2].player_1, p[4]);
    assert!(t.has_active_match(Level::Community, p[0]));
    // A bye is terminal on creation, so its player is not waiting on a table.
    assert!(!t.has_active_match(Level::Community, p[4]));

    confirm(&mut t, p[0], p[1], p[0]);
    let report = confirm(&mut t, p[2], p[3], p[2]);
    assert!(report
        .actions
        .contains(&ProgressionAction::RoundRobinStarted { matches: 3 }));

    // Survivors 1, 3 and 5 settle the podium all-play-all.
    play_trio(&mut t, p[0], p[2], p[4]);
    let community_winners = t.winners_of_group(Level::Community, groups[0]);
    assert_eq!(community_winners.len(), 3);
    assert_eq!(community_winners[0].player_id, p[0]);
    assert_eq!(community_winners[1].player_id, p[2]);
    assert_eq!(community_winners[2].player_id, p[4]);

    // All three promote together through county, regional and national,
    // each level opening straight into a three-player round robin.
    for level in [Level::County, Level::Regional, Level::National] {
        assert_eq!(
            t.matches.iter().filter(|m| m.level == level).count(),
            3,
            "{} round robin",
            level.label()
        );
        play_trio(&mut t, p[0], p[2], p[4]);
        assert_eq!(t.winners_at_level(level).len(), 3);
    }

    assert_eq!(t.status, TournamentStatus::Completed);
    assert_eq!(t.winners.len(), 12);
    let national = t.winners_at_level(Level::National);
    assert_eq!(national[0].player_id, p[0]);
    assert_eq!(national[0].position, 1);
    assert_eq!(national[2].player_id, p[4]);
}

#[test]
fn duplicate_triggers_never_duplicate_rows() {
    let (mut t, ids, groups) = tournament_with_communities(&[5], AutomationMode::Automatic);
    start_tournament(&mut t).unwrap();
    let p = &ids[0];
    confirm(&mut t, p[0], p[1], p[0]);
    confirm(&mut t, p[2], p[3], p[2]);
    play_trio(&mut t, p[0], p[2], p[4]);

    let matches_before = t.matches.len();
    let winners_before = t.winners.len();

    assert!(matches!(
        advance_group(&mut t, groups[0], AdvanceTrigger::AdminAction),
        Err(TournamentError::GroupAlreadyProgressed { .. })
    ));
    assert!(matches!(
        initialize_next_level(&mut t, Level::Community),
        Err(TournamentError::GroupAlreadyProgressed { group: None, .. })
    ));
    assert_eq!(t.matches.len(), matches_before);
    assert_eq!(t.winners.len(), winners_before);
}

#[test]
fn reconfirming_a_settled_match_is_rejected() {
    let (mut t, ids, _) = tournament_with_communities(&[5], AutomationMode::Automatic);
    start_tournament(&mut t).unwrap();
    let p = &ids[0];
    let report = confirm(&mut t, p[0], p[1], p[0]);

    let again = confirm_match_result(
        &mut t,
        &MatchConfirmation {
            match_id: report.match_id,
            winner_id: p[1],
            player_1_points: 7,
            player_2_points: 4,
            submitted_by: None,
        },
    );
    assert!(matches!(
        again,
        Err(TournamentError::MatchNotConfirmable(_))
    ));
}

#[test]
fn wrong_winner_is_rejected() {
    let (mut t, ids, _) = tournament_with_communities(&[5], AutomationMode::Automatic);
    start_tournament(&mut t).unwrap();
    let p = &ids[0];
    let id = t
        .matches
        .iter()
        .find(|m| m.involves(p[0]) && m.involves(p[1]))
        .map(|m| m.id)
        .unwrap();

    let outsider = confirm_match_result(
        &mut t,
        &MatchConfirmation {
            match_id: id,
            winner_id: p[2],
            player_1_points: 7,
            player_2_points: 4,
            submitted_by: None,
        },
    );
    assert!(matches!(
        outsider,
        Err(TournamentError::WinnerNotInMatch { .. })
    ));
    assert_eq!(
        t.match_by_id(id).unwrap().status,
        MatchStatus::Pending,
        "rejected confirmation must not touch the match"
    );
}

#[test]
fn manual_mode_waits_for_admin_between_steps() {
    let (mut t, ids, groups) = tournament_with_communities(&[5], AutomationMode::Manual);
    start_tournament(&mut t).unwrap();
    let p = &ids[0];

    assert!(pending_approvals(&t).is_empty());
    confirm(&mut t, p[0], p[1], p[0]);
    let report = confirm(&mut t, p[2], p[3], p[2]);
    assert_eq!(report.actions, vec![ProgressionAction::GroupReady]);
    assert!(!t.has_round_robin(Level::Community, groups[0]));

    let pending = pending_approvals(&t);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].group_id, Some(groups[0]));
    assert!(!pending[0].ready_for_next_level);

    // The admin pulls the trigger; the round robin appears.
    let actions = advance_group(&mut t, groups[0], AdvanceTrigger::AdminAction).unwrap();
    assert_eq!(
        actions,
        vec![ProgressionAction::RoundRobinStarted { matches: 3 }]
    );

    // Winners still record by themselves: no matches are created by that.
    confirm(&mut t, p[0], p[2], p[0]);
    confirm(&mut t, p[0], p[4], p[0]);
    let report = confirm(&mut t, p[2], p[4], p[2]);
    assert!(report
        .actions
        .contains(&ProgressionAction::WinnersRecorded { count: 3 }));
    assert!(report.actions.contains(&ProgressionAction::LevelReady {
        level: Level::Community
    }));
    assert!(t.groups_at_level(Level::County).is_empty());

    let pending = pending_approvals(&t);
    assert_eq!(pending.len(), 1);
    assert!(pending[0].ready_for_next_level);

    initialize_next_level(&mut t, Level::Community).unwrap();
    assert_eq!(t.groups_at_level(Level::County).len(), 1);
}

#[test]
fn automatic_trigger_is_rejected_in_manual_mode() {
    let (mut t, _, groups) = tournament_with_communities(&[5], AutomationMode::Manual);
    start_tournament(&mut t).unwrap();
    assert!(matches!(
        advance_group(&mut t, groups[0], AdvanceTrigger::Automatic),
        Err(TournamentError::InvalidAutomationTransition)
    ));
}

#[test]
fn initializing_past_an_unfinished_level_is_rejected() {
    let (mut t, ids, _) = tournament_with_communities(&[5], AutomationMode::Automatic);
    start_tournament(&mut t).unwrap();
    let p = &ids[0];
    confirm(&mut t, p[0], p[1], p[0]);

    match initialize_next_level(&mut t, Level::Community) {
        Err(TournamentError::IncompleteLevel { level, missing }) => {
            assert_eq!(level, Level::Community);
            assert_eq!(missing.len(), 1);
            assert_eq!(missing[0].expected, 3);
        }
        other => panic!("expected IncompleteLevel, got {:?}", other),
    }
}

#[test]
fn special_tournament_plays_a_single_flat_level() {
    let region = Uuid::from_u128(900);
    let county = Uuid::from_u128(800);
    let community = Uuid::from_u128(700);
    let roster: Vec<Registration> = (1..=3u128)
        .map(|i| Registration {
            player_id: Uuid::from_u128(i),
            name: format!("P{}", i),
            community_id: community,
            county_id: county,
            region_id: region,
            payment_status: PaymentStatus::Completed,
        })
        .collect();
    let ids: Vec<PlayerId> = roster.iter().map(|r| r.player_id).collect();
    let mut t = Tournament::new("Invitational", true, AutomationMode::Automatic, 3);
    t.set_roster(roster, Geography::default()).unwrap();
    start_tournament(&mut t).unwrap();

    // Three entrants, one nationwide group, straight to a round robin.
    assert_eq!(t.groups_at_level(Level::Special), vec![GroupId::Special]);
    assert_eq!(t.matches.len(), 3);

    play_trio(&mut t, ids[0], ids[1], ids[2]);
    assert_eq!(t.status, TournamentStatus::Completed);
    let winners = t.winners_at_level(Level::Special);
    assert_eq!(winners.len(), 3);
    assert_eq!(winners[0].player_id, ids[0]);

    // Nothing left to confirm once the tournament is over.
    let id = t.matches[0].id;
    assert!(matches!(
        confirm_match_result(
            &mut t,
            &MatchConfirmation {
                match_id: id,
                winner_id: ids[0],
                player_1_points: 7,
                player_2_points: 4,
                submitted_by: None,
            },
        ),
        Err(TournamentError::InvalidState)
    ));
}

#[test]
fn single_player_community_settles_at_start() {
    let (mut t, ids, groups) = tournament_with_communities(&[1, 2], AutomationMode::Automatic);
    start_tournament(&mut t).unwrap();

    // The lone registrant byes straight through to a recorded winner row.
    let solo = t.winners_of_group(Level::Community, groups[0]);
    assert_eq!(solo.len(), 1);
    assert_eq!(solo[0].player_id, ids[0][0]);
    assert_eq!(solo[0].position, 1);

    // The two-player community still has its round robin to play.
    confirm(&mut t, ids[1][0], ids[1][1], ids[1][0]);
    assert_eq!(t.winners_at_level(Level::Community).len(), 3);

    // All three promoted players land in one county round robin.
    let county = t.matches.iter().filter(|m| m.level == Level::County);
    assert_eq!(county.count(), 3);
}

#[test]
fn pending_payment_keeps_a_registrant_out_of_the_bracket() {
    let (mut t, ids, groups) = tournament_with_communities(&[7], AutomationMode::Automatic);
    let unpaid = ids[0][6];
    t.roster
        .iter_mut()
        .find(|r| r.player_id == unpaid)
        .unwrap()
        .payment_status = PaymentStatus::Pending;
    start_tournament(&mut t).unwrap();

    // Six paid players pair cleanly: three matches, no bye, and the unpaid
    // registrant appears nowhere.
    let round_1 = t.matches_in_group(Level::Community, groups[0]);
    assert_eq!(round_1.len(), 3);
    assert!(round_1.iter().all(|m| !m.is_bye()));
    assert!(round_1.iter().all(|m| !m.involves(unpaid)));
}

#[test]
fn washed_out_group_cannot_stall_the_level() {
    let (mut t, ids, groups) = tournament_with_communities(&[6], AutomationMode::Automatic);
    start_tournament(&mut t).unwrap();
    let p = &ids[0];
    confirm(&mut t, p[0], p[1], p[0]);
    confirm(&mut t, p[2], p[3], p[2]);
    // The third pair never shows; the venue records a double forfeit.
    let m = t
        .matches
        .iter_mut()
        .find(|m| m.involves(p[4]) && m.involves(p[5]))
        .unwrap();
    m.status = MatchStatus::Forfeit;
    m.winner = None;

    // Two survivors settle the group in a one-match round robin.
    let actions = advance_group(&mut t, groups[0], AdvanceTrigger::AdminAction).unwrap();
    assert_eq!(
        actions,
        vec![ProgressionAction::RoundRobinStarted { matches: 1 }]
    );
    confirm(&mut t, p[0], p[2], p[0]);

    // The podium comes up one row short of the quota of three, but the
    // group is done for good: the level promotes instead of deadlocking.
    assert_eq!(t.winners_of_group(Level::Community, groups[0]).len(), 2);
    assert!(check_level_completion(&t, Level::Community).complete);
    assert!(!t.groups_at_level(Level::County).is_empty());
}

#[test]
fn forfeit_without_a_winner_eliminates_both_players() {
    let (mut t, ids, groups) = tournament_with_communities(&[10], AutomationMode::Automatic);
    start_tournament(&mut t).unwrap();
    let p = &ids[0];
    for pair in p.chunks(2).take(4) {
        confirm(&mut t, pair[0], pair[1], pair[0]);
    }
    // The last match never gets played; the venue records a double forfeit.
    let m = t
        .matches
        .iter_mut()
        .find(|m| m.involves(p[8]) && m.involves(p[9]))
        .unwrap();
    m.status = MatchStatus::Forfeit;
    m.winner = None;

    // Four survivors, not six: the forfeited pair is out.
    let actions = advance_group(&mut t, groups[0], AdvanceTrigger::AdminAction).unwrap();
    assert_eq!(
        actions,
        vec![ProgressionAction::RoundRobinStarted { matches: 6 }]
    );
    let rr: Vec<_> = t
        .matches
        .iter()
        .filter(|m| m.round == pool_tournament_web::RoundKind::RoundRobin)
        .collect();
    assert!(rr.iter().all(|m| !m.involves(p[8]) && !m.involves(p[9])));
}
