use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::time::{Instant, sleep};

use super::cancel::CancelSignal;
use crate::cache::RenderCache;
use crate::config::settings::EnumeratorSettings;
use crate::database::BracketStore;
use crate::domain::{Bracket, BracketId, EnumerationProgress, EnumerationSession, EnumerationStatus, PlayerEntry};
use crate::errors::{ExtractionFailure, PartialReason};
use crate::fetchers::RosterExtractor;
use crate::navigation::{NavigationDriver, advance_with_retry};

/// External stop conditions checked once per iteration
#[derive(Debug, Clone)]
pub struct RunLimits {
    pub cancel: CancelSignal,
    pub deadline: Option<Instant>,
}

impl RunLimits {
    pub fn unbounded() -> Self {
        Self {
            cancel: CancelSignal::never(),
            deadline: None,
        }
    }

    fn interruption(&self) -> Option<PartialReason> {
        if self.cancel.is_cancelled() {
            return Some(PartialReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(PartialReason::DeadlineExceeded),
            _ => None,
        }
    }
}

/// Walks one league's viewer session until it cycles back to seen brackets.
///
/// Every successfully extracted bracket is persisted before the next
/// advance, so an interrupted run keeps everything it already saw.
#[derive(Clone)]
pub struct BracketEnumerator {
    settings: EnumeratorSettings,
    extractor: Arc<RosterExtractor>,
    store: Arc<dyn BracketStore>,
    cache: Option<Arc<RenderCache>>,
}

/// Loop counters; `stalled_on` marks an id whose advance failed
#[derive(Default)]
struct LoopState {
    seen: HashSet<BracketId>,
    assigned_players: HashMap<String, BracketId>,
    consecutive_failures: usize,
    consecutive_repeats: usize,
    stalled_on: Option<BracketId>,
}

enum Step {
    Continue,
    Stop(EnumerationStatus),
}

impl BracketEnumerator {
    pub fn new(
        settings: EnumeratorSettings,
        extractor: Arc<RosterExtractor>,
        store: Arc<dyn BracketStore>,
        cache: Option<Arc<RenderCache>>,
    ) -> Self {
        Self {
            settings,
            extractor,
            store,
            cache,
        }
    }

    pub async fn run<D: NavigationDriver + ?Sized>(
        &self,
        driver: &mut D,
        league: &str,
        tournament_date: NaiveDate,
        limits: &RunLimits,
    ) -> EnumerationSession {
        info!("Enumerating {} brackets for {}...", league, tournament_date);

        let mut session = EnumerationSession::new(league, tournament_date);
        let mut progress = EnumerationProgress::new(league);
        let mut state = LoopState::default();

        session.status = loop {
            if let Some(reason) = limits.interruption() {
                break EnumerationStatus::Partial(reason);
            }
            if session.iterations >= self.settings.max_iterations {
                break EnumerationStatus::Partial(PartialReason::IterationCeiling);
            }
            session.iterations += 1;

            if let Step::Stop(status) = self
                .visit_current(driver, &mut state, &mut session, &mut progress)
                .await
            {
                break status;
            }

            if let Step::Stop(status) = self.advance(driver, &mut state, &mut session).await {
                break status;
            }
        };

        progress.finish();
        info!("  → {}", session.summary());
        session
    }

    // --- Loop Steps ---

    async fn visit_current<D: NavigationDriver + ?Sized>(
        &self,
        driver: &mut D,
        state: &mut LoopState,
        session: &mut EnumerationSession,
        progress: &mut EnumerationProgress,
    ) -> Step {
        let Some(id) = driver.current_id() else {
            warn!("  No readable bracket id on iteration {}", session.iterations);
            return self.register_failure(state, session, "no readable bracket id");
        };

        if state.seen.contains(&id) {
            // A failed advance leaves the same id in place; that is not a cycle
            if state.stalled_on.as_ref() == Some(&id) {
                return Step::Continue;
            }
            state.consecutive_failures = 0;

            state.consecutive_repeats += 1;
            debug!("  Repeat {} ({}/{})", id, state.consecutive_repeats, self.settings.repeat_threshold);
            if state.consecutive_repeats >= self.settings.repeat_threshold {
                return Step::Stop(EnumerationStatus::Complete);
            }
            return Step::Continue;
        }

        state.consecutive_failures = 0;
        state.consecutive_repeats = 0;
        state.seen.insert(id.clone());

        match self.extract_with_retry(driver, &id, &state.assigned_players).await {
            Ok(players) => {
                let bracket = Bracket::new(id, &session.league, session.tournament_date, players);
                for player in &bracket.players {
                    state
                        .assigned_players
                        .insert(player.player_id.clone(), bracket.bracket_id.clone());
                }
                self.persist(&bracket, session).await;
                session.brackets.push(bracket);
                progress.increment_extracted();
            }
            Err(failure) => {
                warn!("  Skipping bracket {}: {}", id, failure);
                self.save_failed_render(driver, session, &id);
                session.record_error(format!("bracket {} skipped: {}", id, failure));
                session.skipped_ids.push(id);
                progress.increment_skipped();
            }
        }

        Step::Continue
    }

    async fn advance<D: NavigationDriver + ?Sized>(
        &self,
        driver: &mut D,
        state: &mut LoopState,
        session: &mut EnumerationSession,
    ) -> Step {
        let result = advance_with_retry(driver, self.settings.advance_retries, self.settings.advance_backoff).await;

        match result {
            Ok(()) => {
                state.stalled_on = None;
                Step::Continue
            }
            Err(e) => {
                warn!("  Advance failed: {}", e);
                session.navigation_failures += 1;
                state.stalled_on = driver.current_id();
                self.register_failure(state, session, &format!("advance failed: {}", e))
            }
        }
    }

    fn register_failure(&self, state: &mut LoopState, session: &mut EnumerationSession, message: &str) -> Step {
        state.consecutive_failures += 1;
        session.record_error(format!("iteration {}: {}", session.iterations, message));

        if state.consecutive_failures > self.settings.failure_threshold {
            warn!(
                "  {} consecutive failures, stopping {} early",
                state.consecutive_failures, session.league
            );
            return Step::Stop(EnumerationStatus::Partial(PartialReason::FailureThreshold));
        }
        Step::Continue
    }

    // --- Extraction ---

    async fn extract_with_retry<D: NavigationDriver + ?Sized>(
        &self,
        driver: &mut D,
        id: &BracketId,
        assigned_players: &HashMap<String, BracketId>,
    ) -> Result<Vec<PlayerEntry>, ExtractionFailure> {
        let size = self.settings.roster_size;
        let mut attempt = 0;

        loop {
            let extracted = self
                .extractor
                .extract(driver.rendered_state(), size)
                .and_then(|players| check_not_stale(players, assigned_players));

            match extracted {
                Ok(players) => return Ok(players),
                Err(failure) if attempt >= self.settings.extraction_retries => return Err(failure),
                Err(failure) => {
                    attempt += 1;
                    debug!(
                        "  Bracket {} not ready ({}), waiting {}/{}",
                        id, failure, attempt, self.settings.extraction_retries
                    );
                    driver.await_roster_ready(size, self.settings.roster_timeout).await;
                }
            }
        }
    }

    fn save_failed_render<D: NavigationDriver + ?Sized>(
        &self,
        driver: &D,
        session: &EnumerationSession,
        id: &BracketId,
    ) {
        let Some(cache) = &self.cache else {
            return;
        };
        let html = driver.rendered_state().html();
        if let Err(e) = cache.save_failed_render(&session.league, session.tournament_date, id, html) {
            warn!("  Could not cache failed render for {}: {:#}", id, e);
        }
    }

    // --- Persistence ---

    async fn persist(&self, bracket: &Bracket, session: &mut EnumerationSession) {
        if let Err(e) = self.persist_with_retry(bracket).await {
            warn!("  Dropping bracket {} after persistence failures: {:#}", bracket.bracket_id, e);
            session.persistence_failures += 1;
            session.record_error(format!("bracket {} not persisted: {:#}", bracket.bracket_id, e));
        }
    }

    async fn persist_with_retry(&self, bracket: &Bracket) -> Result<()> {
        let attempts = self.settings.persistence_retries.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.store.upsert_bracket(bracket) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!("  Upsert of {} failed ({}/{}): {:#}", bracket.bracket_id, attempt, attempts, e);
                    last_error = Some(e);
                }
            }
            if attempt < attempts {
                sleep(self.settings.persistence_backoff * attempt).await;
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("no persistence attempt made")))
    }
}

/// A roster sharing players with an earlier bracket is the previous page still on screen
fn check_not_stale(
    players: Vec<PlayerEntry>,
    assigned_players: &HashMap<String, BracketId>,
) -> Result<Vec<PlayerEntry>, ExtractionFailure> {
    let stale = players
        .iter()
        .find_map(|p| assigned_players.get(&p.player_id).map(|bracket| (p, bracket)));

    match stale {
        Some((player, bracket)) => Err(ExtractionFailure::StaleRoster {
            player_id: player.player_id.clone(),
            bracket_id: bracket.to_string(),
        }),
        None => Ok(players),
    }
}
