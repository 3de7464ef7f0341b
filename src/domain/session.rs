use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use super::models::{Bracket, BracketId};
use crate::errors::PartialReason;

/// How an enumeration run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnumerationStatus {
    /// The viewer cycled back to already seen brackets
    Complete,
    /// Stopped before the cycle closed; results are a lower bound
    Partial(PartialReason),
}

impl EnumerationStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, EnumerationStatus::Complete)
    }
}

impl fmt::Display for EnumerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumerationStatus::Complete => f.write_str("complete"),
            EnumerationStatus::Partial(reason) => write!(f, "partial ({reason})"),
        }
    }
}

/// Everything one enumeration run produced, returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct EnumerationSession {
    pub league: String,
    pub tournament_date: NaiveDate,
    pub status: EnumerationStatus,
    pub brackets: Vec<Bracket>,
    pub skipped_ids: Vec<BracketId>,
    pub iterations: usize,
    pub navigation_failures: usize,
    pub persistence_failures: usize,
    pub errors: Vec<String>,
}

impl EnumerationSession {
    pub fn new(league: &str, tournament_date: NaiveDate) -> Self {
        Self {
            league: league.to_string(),
            tournament_date,
            status: EnumerationStatus::Partial(PartialReason::IterationCeiling),
            brackets: Vec::new(),
            skipped_ids: Vec::new(),
            iterations: 0,
            navigation_failures: 0,
            persistence_failures: 0,
            errors: Vec::new(),
        }
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn player_count(&self) -> usize {
        self.brackets.iter().map(|b| b.players.len()).sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} {}: {}, {} brackets, {} players, {} skipped, {} navigation failures, {} persistence failures, {} iterations",
            self.league,
            self.tournament_date,
            self.status,
            self.brackets.len(),
            self.player_count(),
            self.skipped_ids.len(),
            self.navigation_failures,
            self.persistence_failures,
            self.iterations,
        )
    }
}
