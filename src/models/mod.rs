//! Data structures for the pool tournament: geography, registrations,
//! matches, winners, and the tournament aggregate.

mod geography;
mod match_record;
mod player;
mod tournament;
mod winner;

pub use geography::{
    CommunityId, CommunityInfo, CountyId, CountyInfo, Geography, GroupId, Level, RegionId,
};
pub use match_record::{MatchId, MatchRecord, MatchStatus, RoundKind};
pub use player::{roster_from_csv, PaymentStatus, PlayerId, Registration, RosterImport};
pub use tournament::{
    AutomationMode, GroupShortfall, Tournament, TournamentError, TournamentId, TournamentStatus,
};
pub use winner::{Standing, Winner, POINTS_PER_WIN};
