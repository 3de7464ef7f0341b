pub mod analysis;
pub mod enumeration;
pub mod queries;
pub mod scheduler;

pub use analysis::{AnalysisService, AnalysisSummary, NotifyThresholds};
pub use enumeration::{EnumerationService, LeagueOutcome};
pub use queries::QueryService;
pub use scheduler::{CycleReport, TournamentScheduler};
