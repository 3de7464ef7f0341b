use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};

use crate::analysis::LeagueStatistics;
use crate::config::find_league;
use crate::database::{BracketStore, DifficultyReportRow, ReportStore, SqliteStore};
use crate::domain::RunRecord;

/// Read/write accessors for operators and collaborating layers
pub struct QueryService {
    store: SqliteStore,
}

impl QueryService {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }

    /// Most recent difficulty report for a player in a league
    pub fn difficulty_report(&self, player_id: &str, league: &str) -> Result<Option<DifficultyReportRow>> {
        let league = resolve_league(league)?;
        self.store
            .latest_report(player_id, league)
            .with_context(|| format!("Failed to load report for {} in {}", player_id, league))
    }

    /// Every report for a player in a league, newest first
    pub fn report_history(&self, player_id: &str, league: &str) -> Result<Vec<DifficultyReportRow>> {
        let league = resolve_league(league)?;
        let history = self
            .store
            .report_history(player_id)
            .with_context(|| format!("Failed to load report history for {}", player_id))?;
        Ok(history.into_iter().filter(|row| row.league == league).collect())
    }

    /// Statistics of the league's most recent snapshot
    pub fn league_statistics(&self, league: &str) -> Result<Option<LeagueStatistics>> {
        let league = resolve_league(league)?;
        let snapshot = self.store.latest_snapshot(league)?;
        Ok(snapshot.as_ref().and_then(LeagueStatistics::from_snapshot))
    }

    pub fn record_run(
        &self,
        player_id: &str,
        player_name: &str,
        tier: u32,
        wave: u32,
        recorded_at: DateTime<Utc>,
    ) -> Result<RunRecord> {
        if player_id.trim().is_empty() {
            bail!("Player id must not be empty");
        }
        self.store.record_run(player_id, player_name, tier, wave, recorded_at)
    }
}

/// Accepts a league slug or display name and returns the stored display name
fn resolve_league(key: &str) -> Result<&'static str> {
    find_league(key)
        .map(|league| league.name)
        .with_context(|| format!("Unknown league: {}", key))
}
