use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::analysis::{DifficultyOutcome, LeagueAssigner, best_runs_in_window, calculate};
use crate::config::LeagueConfig;
use crate::database::{BracketStore, NewReport, ReportStore, RunSource};
use crate::domain::{RunRecord, TournamentCalendar, TournamentSnapshot};
use crate::notify::{DifficultyNotice, NotifierSet, is_notable};

/// Counts from one analysis batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub matched_players: usize,
    pub analyzed: usize,
    pub insufficient_data: usize,
    pub skipped: usize,
    pub notified: usize,
}

/// Thresholds outside which a report triggers a notification
#[derive(Debug, Clone, Copy)]
pub struct NotifyThresholds {
    pub below: f64,
    pub above: f64,
}

/// Matches tracked runs to a tournament and stores one report per player
pub struct AnalysisService {
    brackets: Arc<dyn BracketStore>,
    reports: Arc<dyn ReportStore>,
    runs: Arc<dyn RunSource>,
    assigner: Box<dyn LeagueAssigner>,
    notifiers: NotifierSet,
    calendar: TournamentCalendar,
    thresholds: NotifyThresholds,
}

/// Where a player's result was found
struct Placement<'a> {
    snapshot: &'a TournamentSnapshot,
    actual_rank: u32,
}

enum RunResult {
    Analyzed { notified: bool },
    InsufficientData,
}

impl AnalysisService {
    pub fn new(
        brackets: Arc<dyn BracketStore>,
        reports: Arc<dyn ReportStore>,
        runs: Arc<dyn RunSource>,
        assigner: Box<dyn LeagueAssigner>,
        notifiers: NotifierSet,
        calendar: TournamentCalendar,
        thresholds: NotifyThresholds,
    ) -> Self {
        Self {
            brackets,
            reports,
            runs,
            assigner,
            notifiers,
            calendar,
            thresholds,
        }
    }

    /// `completeness` maps league name to whether its snapshot closed the cycle;
    /// leagues missing from it are treated as partial
    pub async fn analyze(
        &self,
        leagues: &[LeagueConfig],
        tournament_date: NaiveDate,
        completeness: &HashMap<String, bool>,
    ) -> Result<AnalysisSummary> {
        info!("=== Analyzing bracket difficulty for {} ===", tournament_date);

        // Step 1: Match runs to the tournament window
        let window = self.calendar.window(tournament_date);
        let runs = self
            .runs
            .runs_between(window.start, window.end)
            .context("Failed to load run records")?;
        let matched = best_runs_in_window(&runs, &window);
        info!("  → {} runs, {} players in window", runs.len(), matched.len());

        // Step 2: Load every league's snapshot once
        let snapshots = self.load_snapshots(leagues, tournament_date)?;
        info!("  → {} league snapshots loaded", snapshots.len());

        // Step 3: One report per matched player
        let mut summary = AnalysisSummary {
            matched_players: matched.len(),
            ..AnalysisSummary::default()
        };

        for run in &matched {
            match self.analyze_run(run, &snapshots, completeness).await {
                Ok(RunResult::Analyzed { notified }) => {
                    summary.analyzed += 1;
                    if notified {
                        summary.notified += 1;
                    }
                }
                Ok(RunResult::InsufficientData) => summary.insufficient_data += 1,
                Err(e) => {
                    warn!("  Skipping {} ({}): {:#}", run.player_name, run.player_id, e);
                    summary.skipped += 1;
                }
            }
        }

        info!(
            "  → {} analyzed, {} without data, {} skipped, {} notifications\n",
            summary.analyzed, summary.insufficient_data, summary.skipped, summary.notified
        );
        Ok(summary)
    }

    fn load_snapshots(&self, leagues: &[LeagueConfig], tournament_date: NaiveDate) -> Result<Vec<TournamentSnapshot>> {
        let mut snapshots = Vec::new();
        for league in leagues {
            if let Some(snapshot) = self.brackets.snapshot(league.name, tournament_date)? {
                snapshots.push(snapshot);
            }
        }
        Ok(snapshots)
    }

    // --- Per-Player Analysis ---

    async fn analyze_run(
        &self,
        run: &RunRecord,
        snapshots: &[TournamentSnapshot],
        completeness: &HashMap<String, bool>,
    ) -> Result<RunResult> {
        let assigned = self
            .assigner
            .assign(run)
            .ok_or_else(|| anyhow!("no league could be assigned"))?;

        let placement = locate_player(run, assigned.name, snapshots)
            .ok_or_else(|| anyhow!("not listed in any tracked league's brackets"))?;
        let league = placement.snapshot.league.as_str();
        if league != assigned.name {
            debug!("  {} assigned to {} but listed in {}", run.player_id, assigned.name, league);
        }

        let outcome = calculate(&run.player_id, run.wave, placement.actual_rank, &placement.snapshot.brackets);
        let DifficultyOutcome::Analyzed(report) = outcome else {
            return Ok(RunResult::InsufficientData);
        };

        let snapshot_complete = completeness.get(league).copied().unwrap_or(false);
        self.reports.insert_report(&NewReport {
            report: &report,
            run_id: Some(run.run_id),
            league,
            tournament_date: placement.snapshot.tournament_date,
            snapshot_complete,
            analyzed_at: Utc::now(),
        })?;

        let mut notified = false;
        if is_notable(report.difficulty_score, self.thresholds.below, self.thresholds.above) {
            let notice = DifficultyNotice::new(&report, league, placement.snapshot.tournament_date, snapshot_complete);
            notified = self.notifiers.dispatch(&notice).await > 0;
        }

        Ok(RunResult::Analyzed { notified })
    }
}

/// Prefer the assigned league; fall back to whichever snapshot lists the player
fn locate_player<'a>(run: &RunRecord, assigned: &str, snapshots: &'a [TournamentSnapshot]) -> Option<Placement<'a>> {
    let assigned_first = snapshots
        .iter()
        .filter(|s| s.league == assigned)
        .chain(snapshots.iter().filter(|s| s.league != assigned));

    for snapshot in assigned_first {
        if let Some((_, entry)) = snapshot.find_player(&run.player_id) {
            return Some(Placement {
                snapshot,
                actual_rank: entry.rank,
            });
        }
    }
    None
}
