use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::analysis::DifficultyReport;

/// One persisted roster row, keyed by (tournament_date, league, player_id)
#[derive(Debug, Clone, PartialEq)]
pub struct BracketEntryRow {
    pub tournament_date: NaiveDate,
    pub league: String,
    pub bracket_id: String,
    pub player_id: String,
    pub player_name: String,
    pub real_name: String,
    pub wave: u32,
    pub rank: u32,
    pub bracket_median_wave: f64,
    pub bracket_total_waves: i64,
    pub scraped_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyReportRow {
    pub id: i64,
    pub player_id: String,
    pub run_id: Option<i64>,
    pub league: String,
    pub tournament_date: NaiveDate,
    pub wave: u32,
    pub difficulty_score: f64,
    pub difficulty_label: String,
    pub actual_rank: u32,
    pub best_possible_rank: u32,
    pub worst_possible_rank: u32,
    pub average_rank: f64,
    pub count_better: i64,
    pub count_worse: i64,
    pub count_same: i64,
    pub total_brackets_analyzed: i64,
    pub percentile_vs_winners: f64,
    pub snapshot_complete: bool,
    pub analyzed_at: DateTime<Utc>,
}

/// A freshly computed report plus the context it was computed in
#[derive(Debug, Clone)]
pub struct NewReport<'a> {
    pub report: &'a DifficultyReport,
    pub run_id: Option<i64>,
    pub league: &'a str,
    pub tournament_date: NaiveDate,
    pub snapshot_complete: bool,
    pub analyzed_at: DateTime<Utc>,
}
