//! Pool tournament web app: library with models and progression logic.

pub mod logic;
pub mod models;

pub use logic::{
    advance_group, calculate_standings, check_level_completion, check_round_completion,
    confirm_match_result, determine_final_positions, generate_round_robin_matches,
    initialize_next_level, pair_round, pending_approvals, record_final_positions,
    round_robin_complete, round_robin_winners, should_trigger_round_robin, start_tournament,
    AdvanceTrigger, GroupProgress, LevelCompletion, MatchConfirmation, NextAction,
    PendingApproval, ProgressionAction, ProgressionReport, RoundCompletion,
};
pub use models::{
    roster_from_csv, AutomationMode, CommunityId, CommunityInfo, CountyId, CountyInfo, Geography,
    GroupId, GroupShortfall, Level, MatchId, MatchRecord, MatchStatus, PaymentStatus, PlayerId,
    RegionId, Registration, RosterImport, RoundKind, Standing, Tournament, TournamentError,
    TournamentId, TournamentStatus, Winner, POINTS_PER_WIN,
};
