use std::time::Duration;

/// CSS selectors describing the viewer's markup
#[derive(Debug, Clone)]
pub struct RosterSelectors {
    pub row: String,
    pub rank: String,
    pub player_id: String,
    pub display_name: String,
    pub real_name: String,
    pub wave: String,
    pub bracket_option: String,
    pub bracket_container: String,
    pub next_control: String,
}

impl Default for RosterSelectors {
    fn default() -> Self {
        Self {
            row: "table.bracket-roster tbody tr".to_string(),
            rank: "td[data-field='rank']".to_string(),
            player_id: "td[data-field='player_id']".to_string(),
            display_name: "td[data-field='name']".to_string(),
            real_name: "td[data-field='real_name']".to_string(),
            wave: "td[data-field='wave']".to_string(),
            bracket_option: "select#bracket-select option".to_string(),
            bracket_container: "[data-bracket-id]".to_string(),
            next_control: "a.next-bracket".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewerSettings {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub rate_limit_ms: u64,
    pub roster_poll_ms: u64,
    pub selectors: RosterSelectors,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            base_url: "https://thetower.lol/bracket".to_string(),
            user_agent: "TowerBrackets/1.0".to_string(),
            timeout_secs: 30,
            rate_limit_ms: 500, // 2 req/sec per session
            roster_poll_ms: 1000,
            selectors: RosterSelectors::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnumeratorSettings {
    pub roster_size: usize,
    pub max_iterations: usize,
    pub failure_threshold: usize,
    pub repeat_threshold: usize,
    pub extraction_retries: usize,
    pub roster_timeout: Duration,
    pub advance_retries: u32,
    pub advance_backoff: Duration,
    pub persistence_retries: u32,
    pub persistence_backoff: Duration,
}

impl Default for EnumeratorSettings {
    fn default() -> Self {
        Self {
            roster_size: 30,
            max_iterations: 2000,
            failure_threshold: 10,
            repeat_threshold: 3,
            extraction_retries: 3,
            roster_timeout: Duration::from_secs(10),
            advance_retries: 3,
            advance_backoff: Duration::from_millis(500),
            persistence_retries: 3,
            persistence_backoff: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub interval_days: u64,
    pub max_concurrent_leagues: usize,
    pub league_deadline: Duration,
    pub tournament_window_hours: i64,
    pub notify_below: f64,
    pub notify_above: f64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval_days: 3,
            max_concurrent_leagues: 2,
            league_deadline: Duration::from_secs(45 * 60),
            tournament_window_hours: 30,
            notify_below: 20.0,
            notify_above: 80.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub path: String,
    pub failed_render_dir: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "tower_brackets.db".to_string(),
            failed_render_dir: "cache".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotifySettings {
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub viewer: ViewerSettings,
    pub enumerator: EnumeratorSettings,
    pub scheduler: SchedulerSettings,
    pub database: DatabaseSettings,
    pub notify: NotifySettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            viewer: ViewerSettings::default(),
            enumerator: EnumeratorSettings::default(),
            scheduler: SchedulerSettings::default(),
            database: DatabaseSettings::default(),
            notify: NotifySettings::default(),
        }
    }

    /// Defaults overlaid with environment variables
    pub fn from_env() -> Self {
        let mut config = Self::new();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("DATABASE_PATH") {
            self.database.path = path;
        }
        if let Some(url) = lookup("VIEWER_BASE_URL") {
            self.viewer.base_url = url;
        }
        if let Some(url) = lookup("NOTIFY_WEBHOOK_URL").filter(|u| !u.trim().is_empty()) {
            self.notify.webhook_url = Some(url);
        }
        if let Some(days) = lookup("SCHEDULE_INTERVAL_DAYS").and_then(|v| v.parse().ok()) {
            self.scheduler.interval_days = days;
        }
        if let Some(workers) = lookup("MAX_CONCURRENT_LEAGUES").and_then(|v| v.parse().ok()) {
            self.scheduler.max_concurrent_leagues = workers;
        }
    }
}
