//! Tournament progression logic: pairing, round robins, completion checks,
//! winner determination.

mod completion;
mod pairing;
mod progression;
mod round_robin;
mod setup;
mod winners;

pub use completion::{
    check_level_completion, check_round_completion, GroupProgress, LevelCompletion, NextAction,
    RoundCompletion,
};
pub use pairing::pair_round;
pub use progression::{
    advance_group, confirm_match_result, initialize_next_level, pending_approvals, AdvanceTrigger,
    MatchConfirmation, PendingApproval, ProgressionAction, ProgressionReport,
};
pub use round_robin::{
    calculate_standings, generate_round_robin_matches, round_robin_complete, round_robin_winners,
    should_trigger_round_robin,
};
pub use setup::start_tournament;
pub use winners::{determine_final_positions, record_final_positions};
