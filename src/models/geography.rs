//! Geographic hierarchy: levels, groups, and the static name index.

use crate::models::player::Registration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for a community (lowest geographic tier).
pub type CommunityId = Uuid;
/// Unique identifier for a county.
pub type CountyId = Uuid;
/// Unique identifier for a region.
pub type RegionId = Uuid;

/// One tier of the tournament. Hierarchical tournaments climb
/// Community → County → Regional → National; flat tournaments play a single
/// Special tier. Adding a tier means extending each method here.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Community,
    County,
    Regional,
    National,
    Special,
}

impl Level {
    /// The level a tournament opens at.
    pub fn first(special: bool) -> Self {
        if special {
            Level::Special
        } else {
            Level::Community
        }
    }

    /// The level promoted winners feed into. None for terminal levels.
    pub fn next(self) -> Option<Self> {
        match self {
            Level::Community => Some(Level::County),
            Level::County => Some(Level::Regional),
            Level::Regional => Some(Level::National),
            Level::National => None,
            Level::Special => None,
        }
    }

    /// Display label used in round names ("Community Round 1").
    pub fn label(self) -> &'static str {
        match self {
            Level::Community => "Community",
            Level::County => "County",
            Level::Regional => "Regional",
            Level::National => "National",
            Level::Special => "Special",
        }
    }

    /// Grouping-key extractor: which group a registered player contests at
    /// this level.
    pub fn group_of(self, registration: &Registration) -> GroupId {
        match self {
            Level::Community => GroupId::Community(registration.community_id),
            Level::County => GroupId::County(registration.county_id),
            Level::Regional => GroupId::Region(registration.region_id),
            Level::National => GroupId::National,
            Level::Special => GroupId::Special,
        }
    }
}

impl std::str::FromStr for Level {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "community" => Ok(Level::Community),
            "county" => Ok(Level::County),
            "regional" => Ok(Level::Regional),
            "national" => Ok(Level::National),
            "special" => Ok(Level::Special),
            _ => Err(()),
        }
    }
}

/// The geography instance whose players contest one independent bracket.
/// National and Special levels play as a single nationwide group.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupId {
    Community(CommunityId),
    County(CountyId),
    Region(RegionId),
    National,
    Special,
}

impl GroupId {
    /// The level this group belongs to.
    pub fn level(self) -> Level {
        match self {
            GroupId::Community(_) => Level::Community,
            GroupId::County(_) => Level::County,
            GroupId::Region(_) => Level::Regional,
            GroupId::National => Level::National,
            GroupId::Special => Level::Special,
        }
    }

    /// Build a group from a level and an optional geography id (as they
    /// arrive in query strings). National and Special need no id.
    pub fn from_parts(level: Level, id: Option<Uuid>) -> Option<Self> {
        match (level, id) {
            (Level::Community, Some(id)) => Some(GroupId::Community(id)),
            (Level::County, Some(id)) => Some(GroupId::County(id)),
            (Level::Regional, Some(id)) => Some(GroupId::Region(id)),
            (Level::National, _) => Some(GroupId::National),
            (Level::Special, _) => Some(GroupId::Special),
            _ => None,
        }
    }
}

/// A community entry in the geography index.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CommunityInfo {
    pub name: String,
    pub county_id: CountyId,
}

/// A county entry in the geography index.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CountyInfo {
    pub name: String,
    pub region_id: RegionId,
}

/// Static hierarchy Region → County → Community, kept only for grouping and
/// display names. Populated alongside the roster; never mutated by the
/// progression engine.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Geography {
    pub regions: HashMap<RegionId, String>,
    pub counties: HashMap<CountyId, CountyInfo>,
    pub communities: HashMap<CommunityId, CommunityInfo>,
}

impl Geography {
    /// Human-readable name for a group (for winner rows and the
    /// pending-approvals list).
    pub fn group_name(&self, group: GroupId) -> String {
        match group {
            GroupId::Community(id) => self
                .communities
                .get(&id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| format!("Community {id}")),
            GroupId::County(id) => self
                .counties
                .get(&id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| format!("County {id}")),
            GroupId::Region(id) => self
                .regions
                .get(&id)
                .cloned()
                .unwrap_or_else(|| format!("Region {id}")),
            GroupId::National => "National".to_string(),
            GroupId::Special => "Special".to_string(),
        }
    }
}
