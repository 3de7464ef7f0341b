pub mod difficulty;
pub mod league_assignment;
pub mod run_matching;
pub mod statistics;

pub use difficulty::{DifficultyLabel, DifficultyOutcome, DifficultyReport, calculate};
pub use league_assignment::{LeagueAssigner, ThresholdLeagueAssigner};
pub use run_matching::best_runs_in_window;
pub use statistics::LeagueStatistics;
