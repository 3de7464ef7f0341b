pub mod calendar;
pub mod models;
pub mod progress;
pub mod session;

pub use calendar::{TournamentCalendar, TournamentWindow};
pub use models::{Bracket, BracketId, PlayerEntry, RunRecord, TournamentSnapshot};
pub use progress::EnumerationProgress;
pub use session::{EnumerationSession, EnumerationStatus};
