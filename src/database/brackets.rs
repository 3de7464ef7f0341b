use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::params;

use super::connection::DbConn;
use super::models::BracketEntryRow;
use crate::domain::Bracket;

const UPSERT_ENTRY_SQL: &str = "
    INSERT INTO bracket_entries (
        tournament_date, league, bracket_id, player_id, player_name, real_name,
        wave, rank, bracket_median_wave, bracket_total_waves, scraped_at
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    ON CONFLICT (tournament_date, league, player_id) DO UPDATE SET
        bracket_id = excluded.bracket_id,
        player_name = excluded.player_name,
        real_name = excluded.real_name,
        wave = excluded.wave,
        rank = excluded.rank,
        bracket_median_wave = excluded.bracket_median_wave,
        bracket_total_waves = excluded.bracket_total_waves,
        scraped_at = excluded.scraped_at
";

/// Upsert every player of a bracket in one transaction
pub fn upsert_bracket(
    conn: &mut DbConn,
    bracket: &Bracket,
    scraped_at: DateTime<Utc>,
) -> Result<usize> {
    let tx = conn.transaction().context("Failed to begin bracket transaction")?;

    {
        let mut stmt = tx.prepare_cached(UPSERT_ENTRY_SQL)?;
        for player in &bracket.players {
            stmt.execute(params![
                bracket.tournament_date,
                bracket.league,
                bracket.bracket_id.as_str(),
                player.player_id,
                player.display_name,
                player.real_name,
                player.wave,
                player.rank,
                bracket.median_wave,
                bracket.total_waves as i64,
                scraped_at,
            ])
            .with_context(|| format!("Failed to upsert player {}", player.player_id))?;
        }
    }

    tx.commit().context("Failed to commit bracket transaction")?;
    Ok(bracket.players.len())
}

pub fn latest_tournament_date(conn: &mut DbConn, league: &str) -> Result<Option<NaiveDate>> {
    let sql = "SELECT MAX(tournament_date) FROM bracket_entries WHERE league = ?1";

    conn.query_row(sql, params![league], |row| row.get(0))
        .context("Failed to query latest tournament date")
}

pub fn list_entries(
    conn: &mut DbConn,
    league: &str,
    tournament_date: NaiveDate,
) -> Result<Vec<BracketEntryRow>> {
    let sql = "SELECT tournament_date, league, bracket_id, player_id, player_name, real_name, wave, rank, bracket_median_wave, bracket_total_waves, scraped_at FROM bracket_entries WHERE league = ?1 AND tournament_date = ?2 ORDER BY bracket_id, rank";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![league, tournament_date], parse_entry_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

fn parse_entry_row(row: &rusqlite::Row) -> rusqlite::Result<BracketEntryRow> {
    Ok(BracketEntryRow {
        tournament_date: row.get(0)?,
        league: row.get(1)?,
        bracket_id: row.get(2)?,
        player_id: row.get(3)?,
        player_name: row.get(4)?,
        real_name: row.get(5)?,
        wave: row.get(6)?,
        rank: row.get(7)?,
        bracket_median_wave: row.get(8)?,
        bracket_total_waves: row.get(9)?,
        scraped_at: row.get(10)?,
    })
}
