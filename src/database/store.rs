use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

use super::connection::{DbPool, create_memory_pool, create_pool, get_connection};
use super::models::{BracketEntryRow, DifficultyReportRow, NewReport};
use super::{brackets, reports, runs, setup};
use crate::domain::{Bracket, BracketId, PlayerEntry, RunRecord, TournamentSnapshot};
use crate::errors::store_context;

/// Idempotent bracket persistence shared by every enumeration worker
pub trait BracketStore: Send + Sync {
    fn upsert_bracket(&self, bracket: &Bracket) -> Result<()>;

    fn snapshot(&self, league: &str, tournament_date: NaiveDate) -> Result<Option<TournamentSnapshot>>;

    fn latest_snapshot(&self, league: &str) -> Result<Option<TournamentSnapshot>>;
}

/// Append-only history of difficulty reports
pub trait ReportStore: Send + Sync {
    fn insert_report(&self, new: &NewReport<'_>) -> Result<DifficultyReportRow>;

    fn latest_report(&self, player_id: &str, league: &str) -> Result<Option<DifficultyReportRow>>;
}

/// Internally tracked run submissions
pub trait RunSource: Send + Sync {
    fn runs_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<RunRecord>>;
}

/// SQLite-backed implementation of every store
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn open(database_path: &str) -> Result<Self> {
        let pool = create_pool(database_path)?;
        Self::with_pool(pool)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_pool(create_memory_pool()?)
    }

    fn with_pool(pool: DbPool) -> Result<Self> {
        let mut conn = get_connection(&pool)?;
        setup::initialize_schema(&mut conn)?;
        Ok(Self { pool })
    }

    pub fn record_run(
        &self,
        player_id: &str,
        player_name: &str,
        tier: u32,
        wave: u32,
        recorded_at: DateTime<Utc>,
    ) -> Result<RunRecord> {
        let mut conn = get_connection(&self.pool)?;
        runs::insert_run(&mut conn, player_id, player_name, tier, wave, recorded_at)
    }

    pub fn report_history(&self, player_id: &str) -> Result<Vec<DifficultyReportRow>> {
        let mut conn = get_connection(&self.pool)?;
        reports::list_for_player(&mut conn, player_id)
    }

    pub fn entries(&self, league: &str, tournament_date: NaiveDate) -> Result<Vec<BracketEntryRow>> {
        let mut conn = get_connection(&self.pool)?;
        brackets::list_entries(&mut conn, league, tournament_date)
    }
}

impl BracketStore for SqliteStore {
    fn upsert_bracket(&self, bracket: &Bracket) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        brackets::upsert_bracket(&mut conn, bracket, Utc::now())
            .with_context(|| store_context("upsert bracket", bracket.bracket_id.as_str()))
            .map(|_| ())
    }

    fn snapshot(&self, league: &str, tournament_date: NaiveDate) -> Result<Option<TournamentSnapshot>> {
        let entries = self.entries(league, tournament_date)?;
        Ok(assemble_snapshot(league, tournament_date, entries))
    }

    fn latest_snapshot(&self, league: &str) -> Result<Option<TournamentSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let Some(date) = brackets::latest_tournament_date(&mut conn, league)? else {
            return Ok(None);
        };
        drop(conn);

        self.snapshot(league, date)
    }
}

impl ReportStore for SqliteStore {
    fn insert_report(&self, new: &NewReport<'_>) -> Result<DifficultyReportRow> {
        let mut conn = get_connection(&self.pool)?;
        reports::insert_report(&mut conn, new)
    }

    fn latest_report(&self, player_id: &str, league: &str) -> Result<Option<DifficultyReportRow>> {
        let mut conn = get_connection(&self.pool)?;
        reports::latest_for_player(&mut conn, player_id, league)
    }
}

impl RunSource for SqliteStore {
    fn runs_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<RunRecord>> {
        let mut conn = get_connection(&self.pool)?;
        runs::list_between(&mut conn, start, end)
    }
}

/// Regroup persisted rows into brackets; wave aggregates are recomputed
fn assemble_snapshot(
    league: &str,
    tournament_date: NaiveDate,
    entries: Vec<BracketEntryRow>,
) -> Option<TournamentSnapshot> {
    if entries.is_empty() {
        return None;
    }

    let mut grouped: BTreeMap<String, Vec<PlayerEntry>> = BTreeMap::new();
    for entry in entries {
        grouped.entry(entry.bracket_id).or_default().push(PlayerEntry {
            player_id: entry.player_id,
            display_name: entry.player_name,
            real_name: entry.real_name,
            wave: entry.wave,
            rank: entry.rank,
        });
    }

    let brackets = grouped
        .into_iter()
        .map(|(id, players)| Bracket::new(BracketId::new(id), league, tournament_date, players))
        .collect();

    Some(TournamentSnapshot {
        league: league.to_string(),
        tournament_date,
        brackets,
    })
}
