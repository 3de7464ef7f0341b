use colored::{ColoredString, Colorize};

use crate::analysis::{DifficultyLabel, LeagueStatistics};
use crate::database::DifficultyReportRow;
use crate::domain::EnumerationStatus;
use crate::services::{AnalysisSummary, CycleReport, LeagueOutcome};

pub fn print_cycle(report: &CycleReport) {
    println!("{} {}", "Tournament".bold(), report.tournament_date);
    print_outcomes(&report.leagues);

    match &report.analysis {
        Some(summary) => print_analysis(summary),
        None => println!("  {}", "analysis skipped (cancelled)".yellow()),
    }
}

pub fn print_outcomes(outcomes: &[LeagueOutcome]) {
    for outcome in outcomes {
        match outcome {
            LeagueOutcome::Enumerated(session) => println!(
                "  {:<10} {} {} brackets, {} players, {} skipped",
                session.league,
                status_text(&session.status),
                session.brackets.len(),
                session.player_count(),
                session.skipped_ids.len()
            ),
            LeagueOutcome::Failed { league, error } => {
                println!("  {:<10} {} {}", league, "failed".red().bold(), error)
            }
        }
    }
}

fn print_analysis(summary: &AnalysisSummary) {
    println!(
        "  {} {} matched, {} analyzed, {} without data, {} skipped, {} notified",
        "Analysis".bold(),
        summary.matched_players,
        summary.analyzed,
        summary.insufficient_data,
        summary.skipped,
        summary.notified
    );
}

pub fn print_report(row: &DifficultyReportRow) {
    let label = stored_label(row);

    println!("{} {} ({}, {})", "Player".bold(), row.player_id, row.league, row.tournament_date);
    println!("  Difficulty:   {:.1} {}", row.difficulty_score, label);
    println!("  Actual rank:  {} with wave {}", row.actual_rank, row.wave);
    println!(
        "  Possible:     best {}, worst {}, average {:.2}",
        row.best_possible_rank, row.worst_possible_rank, row.average_rank
    );
    println!(
        "  Brackets:     {} analyzed ({} better, {} same, {} worse)",
        row.total_brackets_analyzed, row.count_better, row.count_same, row.count_worse
    );
    println!("  Would win:    {:.1}% of brackets", row.percentile_vs_winners);
    if !row.snapshot_complete {
        println!("  {}", "Based on a partial snapshot; figures are a lower bound".yellow());
    }
}

pub fn print_history(rows: &[DifficultyReportRow]) {
    for row in rows {
        let label = stored_label(row);
        let partial = if row.snapshot_complete { "" } else { " (partial)" };

        println!(
            "  {}  {:<6} wave {:<5} rank {:<3} {:>5.1} {}{}",
            row.tournament_date,
            row.league,
            row.wave,
            row.actual_rank,
            row.difficulty_score,
            label,
            partial.yellow()
        );
    }
}

pub fn print_stats(stats: &LeagueStatistics) {
    println!("{} {} ({})", "League".bold(), stats.league, stats.tournament_date);
    println!("  Brackets:          {}", stats.bracket_count);
    println!("  Players:           {}", stats.player_count);
    println!(
        "  Median wave:       min {:.1}, mean {:.1}, max {:.1}",
        stats.min_median_wave, stats.mean_median_wave, stats.max_median_wave
    );
    println!("  Mean total waves:  {:.1}", stats.mean_total_waves);
    println!("  Winning wave:      mean {:.1}, highest {}", stats.mean_winning_wave, stats.highest_wave);
}

fn status_text(status: &EnumerationStatus) -> ColoredString {
    match status {
        EnumerationStatus::Complete => status.to_string().as_str().green(),
        EnumerationStatus::Partial(_) => status.to_string().as_str().yellow(),
    }
}

/// Labels are stored as text; unknown ones print uncoloured
fn stored_label(row: &DifficultyReportRow) -> ColoredString {
    row.difficulty_label
        .parse::<DifficultyLabel>()
        .map(label_text)
        .unwrap_or_else(|_| row.difficulty_label.as_str().normal())
}

fn label_text(label: DifficultyLabel) -> ColoredString {
    match label {
        DifficultyLabel::VeryHard => label.as_str().red().bold(),
        DifficultyLabel::Hard => label.as_str().red(),
        DifficultyLabel::Medium => label.as_str().normal(),
        DifficultyLabel::Easy => label.as_str().green(),
        DifficultyLabel::VeryEasy => label.as_str().green().bold(),
    }
}
