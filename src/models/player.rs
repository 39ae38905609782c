//! Player registrations: the eligible pool with geographic attributes.

use crate::models::geography::{
    CommunityId, CommunityInfo, CountyId, CountyInfo, Geography, RegionId,
};
use crate::models::tournament::TournamentError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for a player (used in matches and lookups).
pub type PlayerId = Uuid;

/// Payment state of a registration. Only completed registrations enter the
/// bracket.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
}

impl Default for PaymentStatus {
    /// Rosters arrive from the registration service already vetted, so an
    /// entry without an explicit status counts as paid.
    fn default() -> Self {
        PaymentStatus::Completed
    }
}

/// A registered player and the geography they play under.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub player_id: PlayerId,
    pub name: String,
    pub community_id: CommunityId,
    pub county_id: CountyId,
    pub region_id: RegionId,
    #[serde(default)]
    pub payment_status: PaymentStatus,
}

impl Registration {
    /// Create a paid registration with a fresh player id.
    pub fn new(
        name: impl Into<String>,
        community_id: CommunityId,
        county_id: CountyId,
        region_id: RegionId,
    ) -> Self {
        Self {
            player_id: Uuid::new_v4(),
            name: name.into(),
            community_id,
            county_id,
            region_id,
            payment_status: PaymentStatus::Completed,
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.payment_status == PaymentStatus::Completed
    }
}

/// Result of a roster import: the registrations plus the geography index
/// built from them.
#[derive(Clone, Debug, Default)]
pub struct RosterImport {
    pub registrations: Vec<Registration>,
    pub geography: Geography,
}

#[derive(Deserialize)]
struct CsvRow {
    player: String,
    community: String,
    county: String,
    region: String,
}

/// Parse a roster from CSV with columns `player,community,county,region`.
///
/// Geography ids are minted per distinct name (communities scoped by county,
/// counties by region) so the same community name in two counties stays two
/// groups. Every imported row is a paid registration.
pub fn roster_from_csv(data: &str) -> Result<RosterImport, TournamentError> {
    let mut geography = Geography::default();
    let mut registrations = Vec::new();

    let mut regions_by_name: HashMap<String, RegionId> = HashMap::new();
    let mut counties_by_name: HashMap<(RegionId, String), CountyId> = HashMap::new();
    let mut communities_by_name: HashMap<(CountyId, String), CommunityId> = HashMap::new();

    let mut reader = csv::Reader::from_reader(data.as_bytes());
    for (idx, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row.map_err(|e| {
            TournamentError::InvalidRoster(format!("row {}: {}", idx + 1, e))
        })?;
        let player = row.player.trim();
        if player.is_empty() {
            return Err(TournamentError::InvalidRoster(format!(
                "row {}: empty player name",
                idx + 1
            )));
        }

        let region = row.region.trim().to_string();
        let county = row.county.trim().to_string();
        let community = row.community.trim().to_string();
        if region.is_empty() || county.is_empty() || community.is_empty() {
            return Err(TournamentError::InvalidRoster(format!(
                "row {}: incomplete geography",
                idx + 1
            )));
        }

        let region_id = *regions_by_name.entry(region.clone()).or_insert_with(|| {
            let id = Uuid::new_v4();
            geography.regions.insert(id, region.clone());
            id
        });
        let county_id = *counties_by_name
            .entry((region_id, county.clone()))
            .or_insert_with(|| {
                let id = Uuid::new_v4();
                geography.counties.insert(
                    id,
                    CountyInfo {
                        name: county.clone(),
                        region_id,
                    },
                );
                id
            });
        let community_id = *communities_by_name
            .entry((county_id, community.clone()))
            .or_insert_with(|| {
                let id = Uuid::new_v4();
                geography.communities.insert(
                    id,
                    CommunityInfo {
                        name: community.clone(),
                        county_id,
                    },
                );
                id
            });

        registrations.push(Registration::new(player, community_id, county_id, region_id));
    }

    Ok(RosterImport {
        registrations,
        geography,
    })
}
