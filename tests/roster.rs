//! Integration tests for CSV roster import: geography minting, field
//! trimming, and row-addressed rejection of bad input.

use pool_tournament_web::{roster_from_csv, PaymentStatus, TournamentError};

const HEADER: &str = "player,community,county,region\n";

#[test]
fn import_builds_paid_registrations_and_geography() {
    let data = format!(
        "{}Alice,Harbor,Coastal,North\n\
         Bob,Harbor,Coastal,North\n\
         Cara,Summit,Inland,North\n\
         Dan,Harbor,Inland,North\n",
        HEADER
    );
    let import = roster_from_csv(&data).unwrap();

    assert_eq!(import.registrations.len(), 4);
    assert!(import
        .registrations
        .iter()
        .all(|r| r.payment_status == PaymentStatus::Completed));
    assert_eq!(import.registrations[0].name, "Alice");

    // "Harbor" under two different counties mints two distinct communities.
    assert_eq!(import.geography.regions.len(), 1);
    assert_eq!(import.geography.counties.len(), 2);
    assert_eq!(import.geography.communities.len(), 3);

    let alice = &import.registrations[0];
    let bob = &import.registrations[1];
    let dan = &import.registrations[3];
    assert_eq!(alice.community_id, bob.community_id);
    assert_eq!(alice.county_id, bob.county_id);
    assert_ne!(alice.community_id, dan.community_id);
    assert_ne!(alice.county_id, dan.county_id);
    assert_eq!(alice.region_id, dan.region_id);
}

#[test]
fn fields_are_trimmed_before_minting_ids() {
    let data = format!(
        "{}  Alice , Harbor , Coastal , North \n\
         Bob,Harbor,Coastal,North\n",
        HEADER
    );
    let import = roster_from_csv(&data).unwrap();
    assert_eq!(import.registrations[0].name, "Alice");
    // Padded and unpadded spellings land in the same groups.
    assert_eq!(
        import.registrations[0].community_id,
        import.registrations[1].community_id
    );
    assert_eq!(import.geography.communities.len(), 1);
    let community = import.geography.communities.values().next().unwrap();
    assert_eq!(community.name, "Harbor");
}

#[test]
fn header_only_import_is_an_empty_roster() {
    let import = roster_from_csv(HEADER).unwrap();
    assert!(import.registrations.is_empty());
    assert!(import.geography.communities.is_empty());
}

#[test]
fn blank_player_name_is_rejected_with_its_row() {
    let data = format!(
        "{}Alice,Harbor,Coastal,North\n\
         \u{20},Summit,Inland,North\n",
        HEADER
    );
    match roster_from_csv(&data) {
        Err(TournamentError::InvalidRoster(reason)) => {
            assert!(reason.contains("row 2"), "reason was: {}", reason);
            assert!(reason.contains("player name"), "reason was: {}", reason);
        }
        other => panic!("expected InvalidRoster, got {:?}", other),
    }
}

#[test]
fn incomplete_geography_is_rejected_with_its_row() {
    let data = format!("{}Alice,,Coastal,North\n", HEADER);
    match roster_from_csv(&data) {
        Err(TournamentError::InvalidRoster(reason)) => {
            assert!(reason.contains("row 1"), "reason was: {}", reason);
            assert!(reason.contains("geography"), "reason was: {}", reason);
        }
        other => panic!("expected InvalidRoster, got {:?}", other),
    }
}

#[test]
fn short_row_is_a_parse_error() {
    let data = format!("{}Alice,Harbor\n", HEADER);
    assert!(matches!(
        roster_from_csv(&data),
        Err(TournamentError::InvalidRoster(_))
    ));
}
