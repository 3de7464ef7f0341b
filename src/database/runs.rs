use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::params;

use super::connection::DbConn;
use crate::domain::RunRecord;

pub fn insert_run(
    conn: &mut DbConn,
    player_id: &str,
    player_name: &str,
    tier: u32,
    wave: u32,
    recorded_at: DateTime<Utc>,
) -> Result<RunRecord> {
    let sql = "INSERT INTO run_records (player_id, player_name, tier, wave, recorded_at) VALUES (?1, ?2, ?3, ?4, ?5) RETURNING run_id, player_id, player_name, tier, wave, recorded_at";

    conn.query_row(
        sql,
        params![player_id, player_name, tier, wave, recorded_at],
        parse_run_row,
    )
    .context("Failed to insert run record")
}

/// Runs recorded in `[start, end)`
pub fn list_between(
    conn: &mut DbConn,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<RunRecord>> {
    let sql = "SELECT run_id, player_id, player_name, tier, wave, recorded_at FROM run_records WHERE recorded_at >= ?1 AND recorded_at < ?2 ORDER BY recorded_at";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![start, end], parse_run_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

fn parse_run_row(row: &rusqlite::Row) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        run_id: row.get(0)?,
        player_id: row.get(1)?,
        player_name: row.get(2)?,
        tier: row.get(3)?,
        wave: row.get(4)?,
        recorded_at: row.get(5)?,
    })
}
