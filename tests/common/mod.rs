#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

use tower_brackets::config::settings::{EnumeratorSettings, RosterSelectors};
use tower_brackets::database::BracketStore;
use tower_brackets::domain::BracketId;
use tower_brackets::enumeration::{BracketEnumerator, CancelHandle};
use tower_brackets::errors::NavigationError;
use tower_brackets::fetchers::RosterExtractor;
use tower_brackets::navigation::{NavigationDriver, RenderedState};

pub const ROSTER: usize = 30;

pub fn tournament_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
}

/// How one simulated bracket renders
#[derive(Debug, Clone)]
pub struct SimBracket {
    pub id: String,
    pub waves: Vec<u32>,
    /// `await_roster_ready` calls before the full roster shows
    pub render_delay: usize,
    /// Always one row short
    pub never_completes: bool,
    /// Shows the previous bracket's roster until waited on once
    pub lags_behind: bool,
}

impl SimBracket {
    pub fn new(id: &str, waves: Vec<u32>) -> Self {
        Self {
            id: id.to_string(),
            waves,
            render_delay: 0,
            never_completes: false,
            lags_behind: false,
        }
    }

    pub fn player_id(&self, index: usize) -> String {
        format!("{}-P{:02}", self.id, index + 1)
    }
}

/// `count` brackets of 30 players with distinct waves
pub fn brackets(count: usize) -> Vec<SimBracket> {
    (0..count)
        .map(|b| {
            let top = 900 - (b as u32) * 40;
            let waves = (0..ROSTER as u32).map(|i| top - i * 5).collect();
            SimBracket::new(&format!("BR{:04}", b + 1), waves)
        })
        .collect()
}

/// In-process stand-in for the results viewer: one cyclic selection
pub struct SimulatedViewer {
    brackets: Vec<SimBracket>,
    position: usize,
    previous: Option<usize>,
    waits_on_current: usize,
    pub unreadable_ids: bool,
    pub failing_advances: usize,
    cancel_after: Option<(usize, CancelHandle)>,
    pub advances: usize,
    state: RenderedState,
}

impl SimulatedViewer {
    pub fn new(brackets: Vec<SimBracket>) -> Self {
        let mut viewer = Self {
            brackets,
            position: 0,
            previous: None,
            waits_on_current: 0,
            unreadable_ids: false,
            failing_advances: 0,
            cancel_after: None,
            advances: 0,
            state: RenderedState::default(),
        };
        viewer.render();
        viewer
    }

    /// Raise `handle` once `advances` navigation steps happened
    pub fn cancel_after(mut self, advances: usize, handle: CancelHandle) -> Self {
        self.cancel_after = Some((advances, handle));
        self
    }

    fn render(&mut self) {
        let current = &self.brackets[self.position];

        let shown = match self.previous {
            Some(previous) if current.lags_behind && self.waits_on_current == 0 => &self.brackets[previous],
            _ => current,
        };

        let row_count = if current.never_completes {
            ROSTER - 1
        } else if self.waits_on_current < current.render_delay {
            ROSTER / 2
        } else {
            shown.waves.len()
        };

        let rows: String = shown
            .waves
            .iter()
            .take(row_count)
            .enumerate()
            .map(|(idx, wave)| {
                format!(
                    "<tr><td data-field='rank'>{}</td><td data-field='player_id'>{}</td>\
                     <td data-field='name'>name{}</td><td data-field='wave'>{}</td></tr>",
                    idx + 1,
                    shown.player_id(idx),
                    idx + 1,
                    wave
                )
            })
            .collect();

        self.state = RenderedState::new(format!(
            "<html><body><select id='bracket-select'><option value='{id}' selected>{id}</option></select>\
             <table class='bracket-roster' data-bracket-id='{id}'><tbody>{rows}</tbody></table></body></html>",
            id = current.id
        ));
    }
}

#[async_trait]
impl NavigationDriver for SimulatedViewer {
    fn current_id(&self) -> Option<BracketId> {
        if self.unreadable_ids {
            return None;
        }
        Some(BracketId::new(self.brackets[self.position].id.clone()))
    }

    fn rendered_state(&self) -> &RenderedState {
        &self.state
    }

    async fn advance(&mut self) -> Result<(), NavigationError> {
        self.advances += 1;
        if let Some((after, handle)) = &self.cancel_after {
            if self.advances >= *after {
                handle.cancel();
            }
        }

        if self.failing_advances > 0 {
            self.failing_advances -= 1;
            return Err(NavigationError::NoNextControl);
        }

        self.previous = Some(self.position);
        self.position = (self.position + 1) % self.brackets.len();
        self.waits_on_current = 0;
        self.render();
        Ok(())
    }

    async fn await_roster_ready(&mut self, expected_size: usize, _timeout: Duration) -> bool {
        self.waits_on_current += 1;
        self.render();
        RosterExtractor::new(&RosterSelectors::default())
            .map(|extractor| extractor.is_ready(&self.state, expected_size))
            .unwrap_or(false)
    }
}

pub fn fast_settings() -> EnumeratorSettings {
    EnumeratorSettings {
        roster_size: ROSTER,
        max_iterations: 500,
        failure_threshold: 5,
        repeat_threshold: 3,
        extraction_retries: 3,
        roster_timeout: Duration::from_millis(5),
        advance_retries: 3,
        advance_backoff: Duration::from_millis(1),
        persistence_retries: 3,
        persistence_backoff: Duration::from_millis(1),
    }
}

pub fn enumerator(settings: EnumeratorSettings, store: Arc<dyn BracketStore>) -> BracketEnumerator {
    let extractor = RosterExtractor::new(&RosterSelectors::default()).unwrap();
    BracketEnumerator::new(settings, Arc::new(extractor), store, None)
}
