use async_trait::async_trait;
use chrono::NaiveDate;
use log::warn;
use scraper::Html;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LeagueConfig;
use crate::domain::BracketId;
use crate::errors::NavigationError;

/// Snapshot of what the viewer currently renders
#[derive(Debug, Clone, Default)]
pub struct RenderedState {
    html: String,
}

impl RenderedState {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }
}

/// Drives the viewer's single "current bracket" selection.
///
/// A driver owns one viewer session. It must only ever be driven by one
/// task at a time, which `&mut self` on every mutating call enforces.
#[async_trait]
pub trait NavigationDriver: Send {
    /// Identifier of the bracket currently selected, if one can be read
    fn current_id(&self) -> Option<BracketId>;

    /// Last rendered view, as handed to the roster extractor
    fn rendered_state(&self) -> &RenderedState;

    /// One navigation step to the next bracket
    async fn advance(&mut self) -> Result<(), NavigationError>;

    /// Waits until the current roster shows `expected_size` rows
    async fn await_roster_ready(&mut self, expected_size: usize, timeout: Duration) -> bool;
}

/// Opens an independent viewer session per league
#[async_trait]
pub trait DriverFactory: Send + Sync {
    type Driver: NavigationDriver + 'static;

    async fn open(&self, league: &LeagueConfig, date: NaiveDate) -> anyhow::Result<Self::Driver>;
}

/// Calls `advance()` up to `retries` times with exponential backoff
pub async fn advance_with_retry<D: NavigationDriver + ?Sized>(
    driver: &mut D,
    retries: u32,
    backoff: Duration,
) -> Result<(), NavigationError> {
    let attempts = retries.max(1);
    let mut last_error = String::new();

    for attempt in 0..attempts {
        match driver.advance().await {
            Ok(()) => return Ok(()),
            Err(e) => {
                warn!("  Advance attempt {}/{} failed: {}", attempt + 1, attempts, e);
                last_error = e.to_string();
            }
        }

        if attempt + 1 < attempts {
            sleep(backoff_delay(backoff, attempt)).await;
        }
    }

    Err(NavigationError::Unreachable {
        attempts,
        last_error,
    })
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}
