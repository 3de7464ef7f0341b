mod common;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{SimulatedViewer, brackets, enumerator, fast_settings, tournament_date};
use tower_brackets::analysis::{DifficultyLabel, ThresholdLeagueAssigner};
use tower_brackets::cache::RenderCache;
use tower_brackets::config::{LeagueConfig, find_league};
use tower_brackets::database::{BracketStore, ReportStore, SqliteStore};
use tower_brackets::domain::{Bracket, BracketId, EnumerationStatus, PlayerEntry, TournamentCalendar};
use tower_brackets::enumeration::{CancelSignal, cancel_pair};
use tower_brackets::errors::PartialReason;
use tower_brackets::navigation::DriverFactory;
use tower_brackets::notify::{DifficultyNotice, Notifier, NotifierSet};
use tower_brackets::services::{
    AnalysisService, EnumerationService, LeagueOutcome, NotifyThresholds, TournamentScheduler,
};

/// Keeps every notice it receives
#[derive(Clone, Default)]
struct RecordingNotifier {
    notices: Arc<Mutex<Vec<DifficultyNotice>>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notice: &DifficultyNotice) -> Result<()> {
        self.notices.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

/// Serves simulated sessions for Gold only
struct GoldOnlyFactory {
    bracket_count: usize,
}

#[async_trait]
impl DriverFactory for GoldOnlyFactory {
    type Driver = SimulatedViewer;

    async fn open(&self, league: &LeagueConfig, _date: NaiveDate) -> Result<SimulatedViewer> {
        if league.slug != "gold" {
            bail!("viewer refused {}", league.slug);
        }
        Ok(SimulatedViewer::new(brackets(self.bracket_count)))
    }
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
}

fn bracket(id: &str, players: &[(&str, u32)]) -> Bracket {
    let entries = players
        .iter()
        .enumerate()
        .map(|(idx, (player_id, wave))| PlayerEntry {
            player_id: player_id.to_string(),
            display_name: player_id.to_lowercase(),
            real_name: String::new(),
            wave: *wave,
            rank: idx as u32 + 1,
        })
        .collect();
    Bracket::new(BracketId::new(id), "Gold", tournament_date(), entries)
}

fn leagues(keys: &[&str]) -> Vec<LeagueConfig> {
    keys.iter().map(|key| find_league(key).unwrap()).collect()
}

fn analysis_service(store: &Arc<SqliteStore>, notifier: &RecordingNotifier) -> AnalysisService {
    AnalysisService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Box::new(ThresholdLeagueAssigner::from_tracked_leagues()),
        NotifierSet::new(vec![Box::new(notifier.clone())]),
        TournamentCalendar::default(),
        NotifyThresholds {
            below: 20.0,
            above: 80.0,
        },
    )
}

#[tokio::test]
async fn matched_players_get_reports_and_extremes_notify() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    for b in [
        bracket("HARD", &[("A1", 500), ("A2", 400), ("G1", 300)]),
        bracket("EASY", &[("G2", 100), ("B2", 90), ("B3", 80)]),
        bracket("MIDA", &[("C1", 150), ("C2", 140), ("C3", 130)]),
        bracket("MIDB", &[("D1", 120), ("D2", 110), ("D3", 100)]),
    ] {
        store.upsert_bracket(&b).unwrap();
    }

    store.record_run("G1", "gee one", 6, 280, at(14, 2)).unwrap();
    store.record_run("G1", "gee one", 6, 300, at(14, 5)).unwrap();
    store.record_run("G1", "gee one", 6, 999, at(16, 5)).unwrap();
    store.record_run("G2", "gee two", 6, 100, at(15, 1)).unwrap();
    store.record_run("ghost", "nobody", 6, 120, at(14, 9)).unwrap();

    let notifier = RecordingNotifier::default();
    let service = analysis_service(&store, &notifier);
    let completeness = HashMap::from([("Gold".to_string(), true)]);

    let summary = service
        .analyze(&leagues(&["gold", "silver"]), tournament_date(), &completeness)
        .await
        .unwrap();

    assert_eq!(summary.matched_players, 3);
    assert_eq!(summary.analyzed, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.notified, 1);

    let hard = store.latest_report("G1", "Gold").unwrap().unwrap();
    assert_eq!(hard.wave, 300);
    assert_eq!(hard.actual_rank, 3);
    assert_eq!(hard.difficulty_score, 0.0);
    assert_eq!(hard.difficulty_label, DifficultyLabel::VeryHard.as_str());
    assert_eq!(hard.count_same, 1);
    assert!(hard.snapshot_complete);
    assert!(hard.run_id.is_some());

    let easy = store.latest_report("G2", "Gold").unwrap().unwrap();
    assert_eq!(easy.difficulty_score, 75.0);
    assert_eq!(easy.difficulty_label, "Easy");

    let notices = notifier.notices.lock().unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].player_id, "G1");
}

#[tokio::test]
async fn unknown_completeness_is_reported_as_partial() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    store
        .upsert_bracket(&bracket("ONLY", &[("G1", 300), ("G9", 200)]))
        .unwrap();
    store.record_run("G1", "gee one", 6, 300, at(14, 3)).unwrap();

    let service = analysis_service(&store, &RecordingNotifier::default());
    service
        .analyze(&leagues(&["gold"]), tournament_date(), &HashMap::new())
        .await
        .unwrap();

    let report = store.latest_report("G1", "Gold").unwrap().unwrap();
    assert!(!report.snapshot_complete);
    assert_eq!(report.total_brackets_analyzed, 1);
}

fn enumeration_service(bracket_count: usize) -> (EnumerationService<GoldOnlyFactory>, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let service = EnumerationService::new(
        GoldOnlyFactory { bracket_count },
        enumerator(fast_settings(), store.clone()),
        None,
        2,
        Duration::from_secs(30),
    );
    (service, store)
}

#[tokio::test]
async fn failed_league_does_not_block_others() {
    let (service, store) = enumeration_service(3);

    let outcomes = service
        .enumerate_leagues(&leagues(&["silver", "gold", "copper"]), tournament_date(), &CancelSignal::never())
        .await;

    assert_eq!(outcomes.len(), 3);
    assert!(matches!(&outcomes[0], LeagueOutcome::Failed { league, .. } if league == "Silver"));
    assert!(outcomes[1].is_complete());
    assert!(matches!(&outcomes[2], LeagueOutcome::Failed { .. }));
    assert_eq!(store.entries("Gold", tournament_date()).unwrap().len(), 90);
}

#[tokio::test]
async fn cancelled_round_opens_no_sessions() {
    let (service, store) = enumeration_service(3);
    let (handle, signal) = cancel_pair();
    handle.cancel();

    let outcomes = service
        .enumerate_leagues(&leagues(&["gold"]), tournament_date(), &signal)
        .await;

    let LeagueOutcome::Enumerated(session) = &outcomes[0] else {
        panic!("expected a session");
    };
    assert_eq!(session.status, EnumerationStatus::Partial(PartialReason::Cancelled));
    assert_eq!(session.iterations, 0);
    assert!(store.entries("Gold", tournament_date()).unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_round_keeps_earlier_cached_session() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(RenderCache::new(dir.path()).unwrap());
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let service = EnumerationService::new(
        GoldOnlyFactory { bracket_count: 3 },
        enumerator(fast_settings(), store),
        Some(cache),
        2,
        Duration::from_secs(30),
    );
    let gold = leagues(&["gold"]);

    service
        .enumerate_leagues(&gold, tournament_date(), &CancelSignal::never())
        .await;
    let path = dir.path().join("sessions").join(format!("Gold_{}.json", tournament_date()));
    let first = std::fs::read_to_string(&path).unwrap();

    let (handle, signal) = cancel_pair();
    handle.cancel();
    service.enumerate_leagues(&gold, tournament_date(), &signal).await;

    assert_eq!(std::fs::read_to_string(&path).unwrap(), first);
    let record: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert_eq!(record["bracket_ids"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn scheduler_cycle_enumerates_then_analyzes() {
    let (enumeration, store) = enumeration_service(3);
    let notifier = RecordingNotifier::default();
    let analysis = analysis_service(&store, &notifier);

    // Fifth player of the second simulated bracket
    store.record_run("BR0002-P05", "five", 7, 840, at(14, 12)).unwrap();

    let scheduler = TournamentScheduler::new(
        enumeration,
        analysis,
        TournamentCalendar::default(),
        leagues(&["gold", "silver"]),
        3,
    );
    let report = scheduler
        .run_cycle(Some(tournament_date()), &CancelSignal::never())
        .await
        .unwrap();

    assert_eq!(report.tournament_date, tournament_date());
    assert!(report.leagues[0].is_complete());
    assert!(!report.leagues[1].is_complete());

    let summary = report.analysis.unwrap();
    assert_eq!(summary.analyzed, 1);

    let row = store.latest_report("BR0002-P05", "Gold").unwrap().unwrap();
    assert_eq!(row.actual_rank, 5);
    assert_eq!(row.total_brackets_analyzed, 3);
    assert_eq!(row.count_worse, 1);
    assert_eq!(row.count_better, 1);
    assert!(row.snapshot_complete);
}
