use serde::Serialize;
use thiserror::Error;

/// Why a rendered page could not be turned into a roster.
///
/// Incomplete rendering and malformed markup look the same from outside,
/// so callers treat every variant as "not rendered yet".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    #[error("roster incomplete: found {found} of {expected} rows")]
    Incomplete { found: usize, expected: usize },
    #[error("roster oversized: found {found} rows, expected {expected}")]
    Oversized { found: usize, expected: usize },
    #[error("row {row}: missing {field}")]
    MissingField { row: usize, field: &'static str },
    #[error("row {row}: {field} is not numeric: {value:?}")]
    NonNumeric {
        row: usize,
        field: &'static str,
        value: String,
    },
    #[error("rank {rank} appears more than once")]
    DuplicateRank { rank: u32 },
    #[error("player {player_id} appears more than once")]
    DuplicatePlayer { player_id: String },
    #[error("player {player_id} is already listed in bracket {bracket_id}")]
    StaleRoster {
        player_id: String,
        bracket_id: String,
    },
}

/// A navigation step that could not be completed
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("bracket unreachable after {attempts} attempts: {last_error}")]
    Unreachable { attempts: u32, last_error: String },
    #[error("no next control on the current page")]
    NoNextControl,
    #[error("viewer request failed: {0}")]
    Http(String),
}

/// Why enumeration stopped before the viewer cycled back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
pub enum PartialReason {
    #[error("iteration ceiling reached")]
    IterationCeiling,
    #[error("consecutive failure threshold exceeded")]
    FailureThreshold,
    #[error("cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Add context to viewer fetch errors
pub fn fetch_context(url: &str) -> String {
    format!("Failed to fetch from: {}", url)
}

/// Add context to store errors
pub fn store_context(operation: &str, key: &str) -> String {
    format!("Failed to {} for key: {}", operation, key)
}
