//! Simulates a full tournament: fabricated roster, random results, progression
//! from community play to the national podium.
//! Run with: cargo run --bin simulate
//! Shape the roster with env: REGIONS, COUNTIES_PER_REGION, COMMUNITIES_PER_COUNTY,
//! PLAYERS_PER_COMMUNITY, SEED (deterministic run when set).

use pool_tournament_web::{
    confirm_match_result, start_tournament, AutomationMode, CommunityInfo, CountyInfo, Geography,
    Level, MatchConfirmation, MatchStatus, Registration, Tournament, TournamentStatus,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn build_roster(
    regions: usize,
    counties_per_region: usize,
    communities_per_county: usize,
    players_per_community: usize,
) -> (Vec<Registration>, Geography) {
    let mut geography = Geography::default();
    let mut registrations = Vec::new();

    for r in 1..=regions {
        let region_id = Uuid::new_v4();
        geography.regions.insert(region_id, format!("Region {}", r));
        for c in 1..=counties_per_region {
            let county_id = Uuid::new_v4();
            geography.counties.insert(
                county_id,
                CountyInfo {
                    name: format!("County {}-{}", r, c),
                    region_id,
                },
            );
            for v in 1..=communities_per_county {
                let community_id = Uuid::new_v4();
                geography.communities.insert(
                    community_id,
                    CommunityInfo {
                        name: format!("Community {}-{}-{}", r, c, v),
                        county_id,
                    },
                );
                for p in 1..=players_per_community {
                    registrations.push(Registration::new(
                        format!("Player {}-{}-{}-{}", r, c, v, p),
                        community_id,
                        county_id,
                        region_id,
                    ));
                }
            }
        }
    }
    (registrations, geography)
}

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let regions = env_usize("REGIONS", 2);
    let counties = env_usize("COUNTIES_PER_REGION", 2);
    let communities = env_usize("COMMUNITIES_PER_COUNTY", 3);
    let players = env_usize("PLAYERS_PER_COMMUNITY", 5);
    let mut rng: StdRng = match std::env::var("SEED").ok().and_then(|s| s.parse().ok()) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let (registrations, geography) = build_roster(regions, counties, communities, players);
    println!(
        "Roster: {} players across {} communities, {} counties, {} regions",
        registrations.len(),
        geography.communities.len(),
        geography.counties.len(),
        geography.regions.len()
    );

    let mut tournament = Tournament::new("Simulated Nationals", false, AutomationMode::Automatic, 3);
    tournament
        .set_roster(registrations, geography)
        .expect("fresh tournament accepts a roster");
    start_tournament(&mut tournament).expect("roster is non-empty");

    let mut confirmations = 0u32;
    while tournament.status == TournamentStatus::Ongoing {
        let playable: Vec<_> = tournament
            .matches
            .iter()
            .filter(|m| m.status == MatchStatus::Pending && m.player_2.is_some())
            .map(|m| (m.id, m.player_1, m.player_2.unwrap()))
            .collect();
        if playable.is_empty() {
            println!("No playable matches left but tournament is still ongoing; stopping");
            break;
        }
        for (match_id, player_1, player_2) in playable {
            // Race to 7 racks; loser keeps whatever they got to.
            let winner = if rng.gen_bool(0.5) { player_1 } else { player_2 };
            let loser_points = rng.gen_range(0..7);
            let (player_1_points, player_2_points) = if winner == player_1 {
                (7, loser_points)
            } else {
                (loser_points, 7)
            };
            let report = confirm_match_result(
                &mut tournament,
                &MatchConfirmation {
                    match_id,
                    winner_id: winner,
                    player_1_points,
                    player_2_points,
                    submitted_by: Some(winner),
                },
            )
            .expect("simulated confirmation is valid");
            confirmations += 1;
            for err in &report.errors {
                println!("progression error after match {}: {}", match_id, err);
            }
        }
    }

    println!(
        "Simulated {} confirmations across {} matches",
        confirmations,
        tournament.matches.len()
    );
    for winner in tournament.winners_at_level(Level::National) {
        println!(
            "National position {}: {} ({} wins, {} points)",
            winner.position,
            tournament.player_name(winner.player_id),
            winner.wins,
            winner.points
        );
    }
    if tournament.status == TournamentStatus::Completed {
        println!("Tournament completed");
    }
}
