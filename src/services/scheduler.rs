use anyhow::{Result, anyhow};
use chrono::{NaiveDate, Utc};
use log::{error, info, warn};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};

use super::analysis::{AnalysisService, AnalysisSummary};
use super::enumeration::{EnumerationService, LeagueOutcome};
use crate::config::LeagueConfig;
use crate::domain::TournamentCalendar;
use crate::enumeration::CancelSignal;
use crate::navigation::DriverFactory;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Result of one enumerate-then-analyze cycle
#[derive(Debug)]
pub struct CycleReport {
    pub tournament_date: NaiveDate,
    pub leagues: Vec<LeagueOutcome>,
    /// `None` when the cycle was cancelled before analysis
    pub analysis: Option<AnalysisSummary>,
}

/// Periodic control loop tying enumeration and analysis together
pub struct TournamentScheduler<F: DriverFactory> {
    enumeration: EnumerationService<F>,
    analysis: AnalysisService,
    calendar: TournamentCalendar,
    leagues: Vec<LeagueConfig>,
    period: Duration,
}

impl<F: DriverFactory + 'static> TournamentScheduler<F> {
    pub fn new(
        enumeration: EnumerationService<F>,
        analysis: AnalysisService,
        calendar: TournamentCalendar,
        leagues: Vec<LeagueConfig>,
        interval_days: u64,
    ) -> Self {
        Self {
            enumeration,
            analysis,
            calendar,
            leagues,
            period: Duration::from_secs(interval_days.max(1) * SECONDS_PER_DAY),
        }
    }

    /// One full cycle; defaults to the most recent tournament whose window closed
    pub async fn run_cycle(&self, date: Option<NaiveDate>, cancel: &CancelSignal) -> Result<CycleReport> {
        let tournament_date = match date {
            Some(date) => date,
            None => self
                .calendar
                .latest_completed(Utc::now())
                .ok_or_else(|| anyhow!("No completed tournament in the lookback period"))?,
        };

        info!("=== Tournament cycle for {} ===\n", tournament_date);

        // Step 1: Enumerate every tracked league
        let outcomes = self
            .enumeration
            .enumerate_leagues(&self.leagues, tournament_date, cancel)
            .await;

        if cancel.is_cancelled() {
            warn!("Cycle cancelled, analysis skipped; extracted brackets are kept");
            return Ok(CycleReport {
                tournament_date,
                leagues: outcomes,
                analysis: None,
            });
        }

        // Step 2: Analyze matched players against what was enumerated
        let completeness: HashMap<String, bool> = outcomes
            .iter()
            .map(|outcome| (outcome.league().to_string(), outcome.is_complete()))
            .collect();
        let summary = self
            .analysis
            .analyze(&self.leagues, tournament_date, &completeness)
            .await?;

        info!("=== Cycle Complete ===");
        Ok(CycleReport {
            tournament_date,
            leagues: outcomes,
            analysis: Some(summary),
        })
    }

    /// Runs a cycle every period until cancelled
    pub async fn run_forever(&self, mut cancel: CancelSignal) -> Result<()> {
        info!("Scheduler started, one cycle every {} days", self.period.as_secs() / SECONDS_PER_DAY);

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let cycle_signal = cancel.clone();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle(None, &cycle_signal).await {
                        error!("Cycle failed: {:#}", e);
                    }
                    if cycle_signal.is_cancelled() {
                        break;
                    }
                }
                _ = cancel.cancelled() => break,
            }
        }

        info!("Scheduler stopped");
        Ok(())
    }
}
