//! Winner rows and derived round-robin standings.

use crate::models::geography::{GroupId, Level};
use crate::models::player::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Points awarded per match win when ranking players within a group.
pub const POINTS_PER_WIN: u32 = 3;

/// A persisted position assignment: one row per (level, group, position),
/// written exactly once when a group finishes. The next level reads these as
/// its seed input.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Winner {
    pub level: Level,
    pub group_id: GroupId,
    pub group_name: String,
    pub player_id: PlayerId,
    /// 1-based podium position, contiguous within the group.
    pub position: u32,
    pub points: u32,
    pub wins: u32,
    pub recorded_at: DateTime<Utc>,
}

/// One line of a round-robin table, recomputed on demand from terminal
/// matches and never stored.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub player_id: PlayerId,
    pub points: u32,
    pub wins: u32,
    pub matches_played: u32,
}
