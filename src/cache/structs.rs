use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{BracketId, EnumerationSession};

/// File-based diagnostics cache with two areas:
/// `failed/` keeps raw pages that never yielded a roster,
/// `sessions/` keeps the last session outcome per league and date.
pub struct RenderCache {
    failed_dir: PathBuf,
    sessions_dir: PathBuf,
}

impl RenderCache {
    /// Create a new cache instance
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Result<Self> {
        let cache_dir = cache_dir.as_ref();
        let failed_dir = cache_dir.join("failed");
        let sessions_dir = cache_dir.join("sessions");

        fs::create_dir_all(&failed_dir).context("Failed to create failed-render cache directory")?;
        fs::create_dir_all(&sessions_dir).context("Failed to create session cache directory")?;

        Ok(Self {
            failed_dir,
            sessions_dir,
        })
    }

    /// Save the raw page of a bracket that never rendered a full roster
    pub fn save_failed_render(
        &self,
        league: &str,
        tournament_date: NaiveDate,
        bracket_id: &BracketId,
        html: &str,
    ) -> Result<PathBuf> {
        let file_path = self.build_failed_path(league, tournament_date, bracket_id);
        fs::write(&file_path, html).context("Failed to write failed render")?;
        info!("Saved failed render to cache: {}", file_path.display());
        Ok(file_path)
    }

    pub fn load_failed_render(
        &self,
        league: &str,
        tournament_date: NaiveDate,
        bracket_id: &BracketId,
    ) -> Result<Option<String>> {
        let file_path = self.build_failed_path(league, tournament_date, bracket_id);
        if !file_path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&file_path)
            .map(Some)
            .context("Failed to read failed render")
    }

    /// Save a session outcome (without rosters) for later inspection
    pub fn save_session(&self, session: &EnumerationSession) -> Result<PathBuf> {
        let file_path = self.build_session_path(&session.league, session.tournament_date);
        self.write_json(&file_path, &SessionRecord::from(session))?;
        info!("Saved session outcome to cache: {}", file_path.display());
        Ok(file_path)
    }

    // --- Helper Methods ---

    fn build_failed_path(&self, league: &str, date: NaiveDate, bracket_id: &BracketId) -> PathBuf {
        self.failed_dir
            .join(format!("{}_{}_{}.html", sanitize(league), date, sanitize(bracket_id.as_str())))
    }

    fn build_session_path(&self, league: &str, date: NaiveDate) -> PathBuf {
        self.sessions_dir.join(format!("{}_{}.json", sanitize(league), date))
    }

    fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        fs::write(path, json).context("Failed to write cache file")?;
        Ok(())
    }
}

#[derive(Serialize)]
struct SessionRecord<'a> {
    league: &'a str,
    tournament_date: NaiveDate,
    status: String,
    bracket_ids: Vec<&'a str>,
    skipped_ids: Vec<&'a str>,
    iterations: usize,
    navigation_failures: usize,
    persistence_failures: usize,
    errors: &'a [String],
}

impl<'a> From<&'a EnumerationSession> for SessionRecord<'a> {
    fn from(session: &'a EnumerationSession) -> Self {
        Self {
            league: &session.league,
            tournament_date: session.tournament_date,
            status: session.status.to_string(),
            bracket_ids: session.brackets.iter().map(|b| b.bracket_id.as_str()).collect(),
            skipped_ids: session.skipped_ids.iter().map(BracketId::as_str).collect(),
            iterations: session.iterations,
            navigation_failures: session.navigation_failures,
            persistence_failures: session.persistence_failures,
            errors: &session.errors,
        }
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
