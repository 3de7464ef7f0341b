use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use regex::Regex;
use reqwest::Url;
use scraper::{Html, Selector};
use std::time::Duration;
use tokio::time::{Instant, sleep};

use crate::config::LeagueConfig;
use crate::config::settings::{RosterSelectors, ViewerSettings};
use crate::domain::BracketId;
use crate::errors::NavigationError;
use crate::fetchers::RosterExtractor;
use crate::http::RateLimitedClient;
use crate::navigation::{DriverFactory, NavigationDriver, RenderedState};

/// Drives the results viewer by following its explicit "next" control.
///
/// The selector dropdown only lists brackets the viewer has loaded so far,
/// so it is a fallback when the next control is missing, never a listing.
pub struct ViewerDriver {
    client: RateLimitedClient,
    selectors: PageSelectors,
    extractor: RosterExtractor,
    bracket_id_regex: Regex,
    session_url: String,
    current_url: String,
    state: RenderedState,
    last_id: Option<BracketId>,
    poll_interval: Duration,
}

struct PageSelectors {
    option: Selector,
    container: Selector,
    next: Selector,
}

impl ViewerDriver {
    /// Open a session on the first bracket of a league's tournament
    pub async fn open(settings: &ViewerSettings, league: &LeagueConfig, date: NaiveDate) -> Result<Self> {
        let client = RateLimitedClient::new(
            &settings.user_agent,
            settings.timeout_secs,
            settings.rate_limit_ms,
        )?;
        let session_url = Self::build_session_url(&settings.base_url, league.slug, date);

        let mut driver = Self {
            client,
            selectors: PageSelectors::compile(&settings.selectors)?,
            extractor: RosterExtractor::new(&settings.selectors)?,
            bracket_id_regex: Self::compile_regex()?,
            session_url: session_url.clone(),
            current_url: session_url.clone(),
            state: RenderedState::default(),
            last_id: None,
            poll_interval: Duration::from_millis(settings.roster_poll_ms),
        };

        info!("Opening viewer session for {} ({}): {}", league.name, date, session_url);
        driver.load(&session_url).await?;
        Ok(driver)
    }

    // --- Construction Helpers ---

    fn compile_regex() -> Result<Regex> {
        Regex::new(r"^[A-Za-z0-9_-]{4,64}$").context("Failed to compile bracket ID regex")
    }

    // --- URL Building ---

    fn build_session_url(base_url: &str, league_slug: &str, date: NaiveDate) -> String {
        format!(
            "{}?league={}&date={}",
            base_url,
            urlencoding::encode(league_slug),
            date.format("%Y-%m-%d")
        )
    }

    fn build_bracket_url(&self, bracket_id: &str) -> String {
        format!("{}&bracket={}", self.session_url, urlencoding::encode(bracket_id))
    }

    fn resolve_href(&self, href: &str) -> Option<String> {
        let base = Url::parse(&self.current_url).ok()?;
        base.join(href).ok().map(String::from)
    }

    // --- Page Loading ---

    async fn load(&mut self, url: &str) -> Result<()> {
        let page = self.client.fetch_page(url).await?;
        self.state = RenderedState::new(page.html);
        self.current_url = page.final_url;
        self.last_id = self.read_current_id();
        debug!("  Loaded {} (bracket {:?})", self.current_url, self.last_id);
        Ok(())
    }

    // --- Page Reading ---

    fn read_current_id(&self) -> Option<BracketId> {
        let document = self.state.document();

        let selected = document
            .select(&self.selectors.option)
            .find(|option| option.value().attr("selected").is_some())
            .and_then(|option| option.value().attr("value").map(str::to_string));

        let raw = selected.or_else(|| {
            document
                .select(&self.selectors.container)
                .next()
                .and_then(|el| el.value().attr("data-bracket-id").map(str::to_string))
        })?;

        let trimmed = raw.trim();
        if self.bracket_id_regex.is_match(trimmed) {
            Some(BracketId::new(trimmed))
        } else {
            debug!("  Ignoring malformed bracket id {:?}", raw);
            None
        }
    }

    fn next_target(&self) -> Option<String> {
        let document = self.state.document();

        if let Some(href) = self.next_control_href(&document) {
            return self.resolve_href(&href);
        }

        self.next_option_value(&document)
            .map(|id| self.build_bracket_url(&id))
    }

    fn next_control_href(&self, document: &Html) -> Option<String> {
        document
            .select(&self.selectors.next)
            .filter(|el| {
                let disabled_class = el
                    .value()
                    .attr("class")
                    .is_some_and(|class| class.to_lowercase().contains("disabled"));
                let aria_disabled = el.value().attr("aria-disabled") == Some("true");
                !disabled_class && !aria_disabled
            })
            .find_map(|el| el.value().attr("href").map(str::to_string))
    }

    /// Option after the current one, wrapping to the first
    fn next_option_value(&self, document: &Html) -> Option<String> {
        let values: Vec<String> = document
            .select(&self.selectors.option)
            .filter_map(|option| option.value().attr("value").map(|v| v.trim().to_string()))
            .filter(|v| self.bracket_id_regex.is_match(v))
            .collect();

        let current = self.last_id.as_ref()?;
        let position = values.iter().position(|v| v == current.as_str())?;
        values.get((position + 1) % values.len()).cloned()
    }
}

impl PageSelectors {
    fn compile(selectors: &RosterSelectors) -> Result<Self> {
        Ok(Self {
            option: parse_selector(&selectors.bracket_option)?,
            container: parse_selector(&selectors.bracket_container)?,
            next: parse_selector(&selectors.next_control)?,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("Invalid selector {:?}: {:?}", selector, e))
}

#[async_trait]
impl NavigationDriver for ViewerDriver {
    fn current_id(&self) -> Option<BracketId> {
        self.last_id.clone()
    }

    fn rendered_state(&self) -> &RenderedState {
        &self.state
    }

    async fn advance(&mut self) -> Result<(), NavigationError> {
        let target = self.next_target().ok_or(NavigationError::NoNextControl)?;
        self.load(&target)
            .await
            .map_err(|e| NavigationError::Http(format!("{:#}", e)))
    }

    /// Reloads at least once; ready means the roster parses, not that enough rows show
    async fn await_roster_ready(&mut self, expected_size: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            sleep(self.poll_interval.min(remaining)).await;

            let url = self.current_url.clone();
            if let Err(e) = self.load(&url).await {
                debug!("  Reload of {} failed: {:#}", url, e);
            }

            if self.extractor.is_ready(&self.state, expected_size) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
        }
    }
}

/// Opens one `ViewerDriver` per league session
pub struct ViewerDriverFactory {
    settings: ViewerSettings,
}

impl ViewerDriverFactory {
    pub fn new(settings: ViewerSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl DriverFactory for ViewerDriverFactory {
    type Driver = ViewerDriver;

    async fn open(&self, league: &LeagueConfig, date: NaiveDate) -> Result<ViewerDriver> {
        ViewerDriver::open(&self.settings, league, date).await
    }
}
