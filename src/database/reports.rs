use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, params};

use super::connection::DbConn;
use super::models::{DifficultyReportRow, NewReport};

const REPORT_COLUMNS: &str = "id, player_id, run_id, league, tournament_date, wave, difficulty_score, difficulty_label, actual_rank, best_possible_rank, worst_possible_rank, average_rank, count_better, count_worse, count_same, total_brackets_analyzed, percentile_vs_winners, snapshot_complete, analyzed_at";

pub fn insert_report(conn: &mut DbConn, new: &NewReport<'_>) -> Result<DifficultyReportRow> {
    let report = new.report;
    let sql = format!(
        "INSERT INTO difficulty_reports (player_id, run_id, league, tournament_date, wave, difficulty_score, difficulty_label, actual_rank, best_possible_rank, worst_possible_rank, average_rank, count_better, count_worse, count_same, total_brackets_analyzed, percentile_vs_winners, snapshot_complete, analyzed_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18) RETURNING {}",
        REPORT_COLUMNS
    );

    conn.query_row(
        &sql,
        params![
            report.player_id,
            new.run_id,
            new.league,
            new.tournament_date,
            report.actual_wave,
            report.difficulty_score,
            report.difficulty_label.as_str(),
            report.actual_rank,
            report.best_possible_rank,
            report.worst_possible_rank,
            report.average_rank,
            report.count_better as i64,
            report.count_worse as i64,
            report.count_same as i64,
            report.total_brackets_analyzed as i64,
            report.percentile_vs_winners,
            new.snapshot_complete,
            new.analyzed_at,
        ],
        parse_report_row,
    )
    .context("Failed to insert difficulty report")
}

pub fn latest_for_player(
    conn: &mut DbConn,
    player_id: &str,
    league: &str,
) -> Result<Option<DifficultyReportRow>> {
    let sql = format!(
        "SELECT {} FROM difficulty_reports WHERE player_id = ?1 AND league = ?2 ORDER BY analyzed_at DESC, id DESC LIMIT 1",
        REPORT_COLUMNS
    );

    conn.query_row(&sql, params![player_id, league], parse_report_row)
        .optional()
        .context("Failed to get latest difficulty report for player")
}

pub fn list_for_player(conn: &mut DbConn, player_id: &str) -> Result<Vec<DifficultyReportRow>> {
    let sql = format!(
        "SELECT {} FROM difficulty_reports WHERE player_id = ?1 ORDER BY analyzed_at DESC, id DESC",
        REPORT_COLUMNS
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![player_id], parse_report_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

fn parse_report_row(row: &rusqlite::Row) -> rusqlite::Result<DifficultyReportRow> {
    Ok(DifficultyReportRow {
        id: row.get(0)?,
        player_id: row.get(1)?,
        run_id: row.get(2)?,
        league: row.get(3)?,
        tournament_date: row.get(4)?,
        wave: row.get(5)?,
        difficulty_score: row.get(6)?,
        difficulty_label: row.get(7)?,
        actual_rank: row.get(8)?,
        best_possible_rank: row.get(9)?,
        worst_possible_rank: row.get(10)?,
        average_rank: row.get(11)?,
        count_better: row.get(12)?,
        count_worse: row.get(13)?,
        count_same: row.get(14)?,
        total_brackets_analyzed: row.get(15)?,
        percentile_vs_winners: row.get(16)?,
        snapshot_complete: row.get(17)?,
        analyzed_at: row.get(18)?,
    })
}
