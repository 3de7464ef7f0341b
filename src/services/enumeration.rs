use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{Instant, timeout};

use crate::cache::RenderCache;
use crate::config::LeagueConfig;
use crate::domain::{EnumerationSession, EnumerationStatus};
use crate::enumeration::{BracketEnumerator, CancelSignal, RunLimits};
use crate::errors::PartialReason;
use crate::navigation::DriverFactory;

/// What happened to one league in an enumeration round
#[derive(Debug)]
pub enum LeagueOutcome {
    Enumerated(EnumerationSession),
    /// The session could not be opened, or the task died
    Failed { league: String, error: String },
}

impl LeagueOutcome {
    pub fn league(&self) -> &str {
        match self {
            LeagueOutcome::Enumerated(session) => &session.league,
            LeagueOutcome::Failed { league, .. } => league,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, LeagueOutcome::Enumerated(session) if session.status.is_complete())
    }
}

/// Enumerates several leagues at once, one viewer session per league
pub struct EnumerationService<F: DriverFactory> {
    factory: Arc<F>,
    enumerator: BracketEnumerator,
    cache: Option<Arc<RenderCache>>,
    max_concurrent: usize,
    league_deadline: Duration,
}

impl<F: DriverFactory + 'static> EnumerationService<F> {
    pub fn new(
        factory: F,
        enumerator: BracketEnumerator,
        cache: Option<Arc<RenderCache>>,
        max_concurrent: usize,
        league_deadline: Duration,
    ) -> Self {
        Self {
            factory: Arc::new(factory),
            enumerator,
            cache,
            max_concurrent: max_concurrent.max(1),
            league_deadline,
        }
    }

    pub async fn enumerate_leagues(
        &self,
        leagues: &[LeagueConfig],
        tournament_date: NaiveDate,
        cancel: &CancelSignal,
    ) -> Vec<LeagueOutcome> {
        info!(
            "=== Enumerating {} leagues for {} ({} at a time) ===",
            leagues.len(),
            tournament_date,
            self.max_concurrent
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::with_capacity(leagues.len());

        for league in leagues {
            let task = LeagueTask {
                factory: self.factory.clone(),
                enumerator: self.enumerator.clone(),
                league: league.clone(),
                tournament_date,
                cancel: cancel.clone(),
                league_deadline: self.league_deadline,
            };
            let semaphore = semaphore.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.context("worker pool closed")?;
                task.run().await
            });
            handles.push((league.name, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (league, handle) in handles {
            let outcome = match handle.await {
                Ok(Ok(session)) => {
                    self.save_session(&session);
                    LeagueOutcome::Enumerated(session)
                }
                Ok(Err(e)) => {
                    warn!("  League {} failed: {:#}", league, e);
                    LeagueOutcome::Failed {
                        league: league.to_string(),
                        error: format!("{:#}", e),
                    }
                }
                Err(join_error) => {
                    error!("  League {} task aborted: {}", league, join_error);
                    LeagueOutcome::Failed {
                        league: league.to_string(),
                        error: join_error.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let complete = outcomes.iter().filter(|o| o.is_complete()).count();
        info!("  → {}/{} leagues fully enumerated\n", complete, outcomes.len());
        outcomes
    }

    /// Sessions that never ran an iteration would overwrite a real earlier record
    fn save_session(&self, session: &EnumerationSession) {
        if session.iterations == 0 {
            return;
        }
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save_session(session) {
                warn!("  Could not cache session for {}: {:#}", session.league, e);
            }
        }
    }
}

/// Everything one spawned league worker owns
struct LeagueTask<F: DriverFactory> {
    factory: Arc<F>,
    enumerator: BracketEnumerator,
    league: LeagueConfig,
    tournament_date: NaiveDate,
    cancel: CancelSignal,
    league_deadline: Duration,
}

impl<F: DriverFactory> LeagueTask<F> {
    async fn run(self) -> Result<EnumerationSession> {
        if self.cancel.is_cancelled() {
            let mut session = EnumerationSession::new(self.league.name, self.tournament_date);
            session.status = EnumerationStatus::Partial(PartialReason::Cancelled);
            return Ok(session);
        }

        // The budget starts once a worker slot is held
        let deadline = Instant::now() + self.league_deadline;

        let mut driver = timeout(self.league_deadline, self.factory.open(&self.league, self.tournament_date))
            .await
            .with_context(|| format!("Timed out opening viewer for {}", self.league.name))?
            .with_context(|| format!("Failed to open viewer for {}", self.league.name))?;

        let limits = RunLimits {
            cancel: self.cancel.clone(),
            deadline: Some(deadline),
        };

        Ok(self
            .enumerator
            .run(&mut driver, self.league.name, self.tournament_date, &limits)
            .await)
    }
}
