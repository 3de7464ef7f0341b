pub mod analysis;
pub mod cache;
pub mod cli;
pub mod config;
pub mod database;
pub mod display;
pub mod domain;
pub mod enumeration;
pub mod errors;
pub mod fetchers;
pub mod http;
pub mod navigation;
pub mod notify;
pub mod rate_limiter;
pub mod services;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use log::{info, warn};
use std::sync::Arc;

use crate::analysis::ThresholdLeagueAssigner;
use crate::cache::RenderCache;
use crate::cli::{Cli, Command};
use crate::config::settings::AppConfig;
use crate::config::{LeagueConfig, find_league, get_leagues};
use crate::database::SqliteStore;
use crate::domain::TournamentCalendar;
use crate::enumeration::{BracketEnumerator, CancelHandle, cancel_pair};
use crate::fetchers::{RosterExtractor, ViewerDriverFactory};
use crate::notify::NotifierSet;
use crate::services::{AnalysisService, EnumerationService, NotifyThresholds, QueryService, TournamentScheduler};

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_enumerate(leagues: &[String], date: Option<NaiveDate>) -> Result<()> {
    let config = AppConfig::from_env();
    let leagues = select_leagues(leagues)?;
    let date = match date {
        Some(date) => date,
        None => calendar(&config)
            .latest_completed(Utc::now())
            .ok_or_else(|| anyhow!("No completed tournament in the lookback period"))?,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let store = SqliteStore::open(&config.database.path)?;
        let service = build_enumeration_service(&config, &store)?;
        let cancel = cancel_on_ctrl_c();

        let outcomes = service.enumerate_leagues(&leagues, date, &cancel.signal()).await;
        display::print_outcomes(&outcomes);
        Ok(())
    })
}

pub fn handle_analyze(date: Option<NaiveDate>) -> Result<()> {
    let config = AppConfig::from_env();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let scheduler = build_scheduler(&config)?;
        let cancel = cancel_on_ctrl_c();

        let report = scheduler.run_cycle(date, &cancel.signal()).await?;
        display::print_cycle(&report);
        Ok(())
    })
}

pub fn handle_schedule() -> Result<()> {
    let config = AppConfig::from_env();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let scheduler = build_scheduler(&config)?;
        let cancel = cancel_on_ctrl_c();
        scheduler.run_forever(cancel.signal()).await
    })
}

pub fn handle_report(player: &str, league: &str, history: bool) -> Result<()> {
    let queries = open_queries()?;
    if history {
        let rows = queries.report_history(player, league)?;
        if rows.is_empty() {
            println!("No difficulty reports for {} in {}", player, league);
        }
        display::print_history(&rows);
        return Ok(());
    }

    match queries.difficulty_report(player, league)? {
        Some(row) => display::print_report(&row),
        None => println!("No difficulty report for {} in {}", player, league),
    }
    Ok(())
}

pub fn handle_stats(league: &str) -> Result<()> {
    let queries = open_queries()?;
    match queries.league_statistics(league)? {
        Some(stats) => display::print_stats(&stats),
        None => println!("No brackets stored for {}", league),
    }
    Ok(())
}

pub fn handle_record_run(
    player: &str,
    name: &str,
    tier: u32,
    wave: u32,
    at: Option<DateTime<Utc>>,
) -> Result<()> {
    let queries = open_queries()?;
    let run = queries.record_run(player, name, tier, wave, at.unwrap_or_else(Utc::now))?;
    info!("Recorded run {} for {} (tier {}, wave {})", run.run_id, run.player_id, run.tier, run.wave);
    Ok(())
}

pub fn handle_completions(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
    Ok(())
}

// --- Wiring ---

fn open_queries() -> Result<QueryService> {
    let config = AppConfig::from_env();
    Ok(QueryService::new(SqliteStore::open(&config.database.path)?))
}

fn calendar(config: &AppConfig) -> TournamentCalendar {
    TournamentCalendar::with_window_hours(config.scheduler.tournament_window_hours)
}

fn select_leagues(keys: &[String]) -> Result<Vec<LeagueConfig>> {
    if keys.is_empty() {
        return Ok(get_leagues());
    }
    keys.iter()
        .map(|key| find_league(key).with_context(|| format!("Unknown league: {}", key)))
        .collect()
}

fn open_render_cache(config: &AppConfig) -> Option<Arc<RenderCache>> {
    match RenderCache::new(&config.database.failed_render_dir) {
        Ok(cache) => Some(Arc::new(cache)),
        Err(e) => {
            warn!("Render cache disabled: {:#}", e);
            None
        }
    }
}

fn build_enumeration_service(config: &AppConfig, store: &SqliteStore) -> Result<EnumerationService<ViewerDriverFactory>> {
    let cache = open_render_cache(config);
    let extractor = Arc::new(RosterExtractor::new(&config.viewer.selectors)?);
    let enumerator = BracketEnumerator::new(
        config.enumerator.clone(),
        extractor,
        Arc::new(store.clone()),
        cache.clone(),
    );

    Ok(EnumerationService::new(
        ViewerDriverFactory::new(config.viewer.clone()),
        enumerator,
        cache,
        config.scheduler.max_concurrent_leagues,
        config.scheduler.league_deadline,
    ))
}

fn build_scheduler(config: &AppConfig) -> Result<TournamentScheduler<ViewerDriverFactory>> {
    let store = SqliteStore::open(&config.database.path)?;
    let enumeration = build_enumeration_service(config, &store)?;

    let shared = Arc::new(store);
    let analysis = AnalysisService::new(
        shared.clone(),
        shared.clone(),
        shared,
        Box::new(ThresholdLeagueAssigner::from_tracked_leagues()),
        NotifierSet::from_webhook(config.notify.webhook_url.as_deref())?,
        calendar(config),
        NotifyThresholds {
            below: config.scheduler.notify_below,
            above: config.scheduler.notify_above,
        },
    );

    Ok(TournamentScheduler::new(
        enumeration,
        analysis,
        calendar(config),
        get_leagues(),
        config.scheduler.interval_days,
    ))
}

/// First Ctrl-C cancels running work; already stored brackets are kept
fn cancel_on_ctrl_c() -> CancelHandle {
    let (handle, watcher) = cancel_pair();
    let trigger = handle.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() && !watcher.is_cancelled() {
            warn!("Interrupt received, stopping after the current step");
            trigger.cancel();
        }
    });

    handle
}
