use serde::Serialize;

use crate::domain::TournamentSnapshot;

/// Aggregate view of one league's latest snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueStatistics {
    pub league: String,
    pub tournament_date: chrono::NaiveDate,
    pub bracket_count: usize,
    pub player_count: usize,
    pub min_median_wave: f64,
    pub max_median_wave: f64,
    pub mean_median_wave: f64,
    pub mean_total_waves: f64,
    pub highest_wave: u32,
    pub mean_winning_wave: f64,
}

impl LeagueStatistics {
    pub fn from_snapshot(snapshot: &TournamentSnapshot) -> Option<Self> {
        let brackets = &snapshot.brackets;
        if brackets.is_empty() {
            return None;
        }

        let count = brackets.len() as f64;
        let medians: Vec<f64> = brackets.iter().map(|b| b.median_wave).collect();
        let winning: Vec<u32> = brackets.iter().filter_map(|b| b.winning_wave()).collect();

        Some(Self {
            league: snapshot.league.clone(),
            tournament_date: snapshot.tournament_date,
            bracket_count: brackets.len(),
            player_count: snapshot.player_count(),
            min_median_wave: medians.iter().copied().fold(f64::INFINITY, f64::min),
            max_median_wave: medians.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean_median_wave: medians.iter().sum::<f64>() / count,
            mean_total_waves: brackets.iter().map(|b| b.total_waves as f64).sum::<f64>() / count,
            highest_wave: winning.iter().copied().max().unwrap_or(0),
            mean_winning_wave: mean(&winning),
        })
    }
}

fn mean(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}
