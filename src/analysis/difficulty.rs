//! Bracket difficulty: how a player would have placed in every other bracket.
//!
//! The comparison set always includes the player's own bracket. Their own
//! bracket reproduces the actual rank, so it lands in `count_same` and is
//! counted in `total_brackets_analyzed`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::Bracket;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifficultyLabel {
    VeryHard,
    Hard,
    Medium,
    Easy,
    VeryEasy,
}

impl DifficultyLabel {
    pub fn from_score(score: f64) -> Self {
        if score < 20.0 {
            DifficultyLabel::VeryHard
        } else if score < 40.0 {
            DifficultyLabel::Hard
        } else if score < 60.0 {
            DifficultyLabel::Medium
        } else if score < 80.0 {
            DifficultyLabel::Easy
        } else {
            DifficultyLabel::VeryEasy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLabel::VeryHard => "Very Hard",
            DifficultyLabel::Hard => "Hard",
            DifficultyLabel::Medium => "Medium",
            DifficultyLabel::Easy => "Easy",
            DifficultyLabel::VeryEasy => "Very Easy",
        }
    }
}

impl fmt::Display for DifficultyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Very Hard" => Ok(DifficultyLabel::VeryHard),
            "Hard" => Ok(DifficultyLabel::Hard),
            "Medium" => Ok(DifficultyLabel::Medium),
            "Easy" => Ok(DifficultyLabel::Easy),
            "Very Easy" => Ok(DifficultyLabel::VeryEasy),
            other => Err(format!("unknown difficulty label: {}", other)),
        }
    }
}

/// Derived comparison of one player's result against a bracket set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyReport {
    pub player_id: String,
    pub actual_rank: u32,
    pub actual_wave: u32,
    pub total_brackets_analyzed: usize,
    pub best_possible_rank: u32,
    pub worst_possible_rank: u32,
    pub average_rank: f64,
    /// Share of brackets where the player would have placed worse (0-100)
    pub difficulty_score: f64,
    pub difficulty_label: DifficultyLabel,
    pub count_better: usize,
    pub count_worse: usize,
    pub count_same: usize,
    /// Share of brackets the player would have won outright (0-100)
    pub percentile_vs_winners: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DifficultyOutcome {
    Analyzed(DifficultyReport),
    /// No brackets to compare against
    InsufficientData { player_id: String },
}

impl DifficultyOutcome {
    pub fn report(&self) -> Option<&DifficultyReport> {
        match self {
            DifficultyOutcome::Analyzed(report) => Some(report),
            DifficultyOutcome::InsufficientData { .. } => None,
        }
    }
}

/// Rank `target_wave` would have taken in `bracket`; ties never push the player down
pub fn hypothetical_rank(target_wave: u32, bracket: &Bracket) -> u32 {
    let better = bracket.waves().filter(|&wave| wave > target_wave).count();
    better as u32 + 1
}

pub fn hypothetical_ranks(target_wave: u32, brackets: &[Bracket]) -> Vec<u32> {
    brackets
        .iter()
        .map(|bracket| hypothetical_rank(target_wave, bracket))
        .collect()
}

pub fn calculate(
    player_id: &str,
    target_wave: u32,
    actual_rank: u32,
    brackets: &[Bracket],
) -> DifficultyOutcome {
    let ranks = hypothetical_ranks(target_wave, brackets);

    let (Some(&best), Some(&worst)) = (ranks.iter().min(), ranks.iter().max()) else {
        return DifficultyOutcome::InsufficientData {
            player_id: player_id.to_string(),
        };
    };

    let total = ranks.len();
    let count_better = ranks.iter().filter(|&&r| r < actual_rank).count();
    let count_worse = ranks.iter().filter(|&&r| r > actual_rank).count();
    let count_same = total - count_better - count_worse;
    let wins = ranks.iter().filter(|&&r| r == 1).count();

    let difficulty_score = percentage(count_worse, total);

    DifficultyOutcome::Analyzed(DifficultyReport {
        player_id: player_id.to_string(),
        actual_rank,
        actual_wave: target_wave,
        total_brackets_analyzed: total,
        best_possible_rank: best,
        worst_possible_rank: worst,
        average_rank: average(&ranks),
        difficulty_score,
        difficulty_label: DifficultyLabel::from_score(difficulty_score),
        count_better,
        count_worse,
        count_same,
        percentile_vs_winners: percentage(wins, total),
    })
}

fn percentage(part: usize, total: usize) -> f64 {
    100.0 * part as f64 / total as f64
}

fn average(ranks: &[u32]) -> f64 {
    ranks.iter().map(|&r| r as f64).sum::<f64>() / ranks.len() as f64
}
