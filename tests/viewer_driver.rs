use chrono::NaiveDate;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use tower_brackets::config::find_league;
use tower_brackets::config::settings::{RosterSelectors, ViewerSettings};
use tower_brackets::domain::BracketId;
use tower_brackets::errors::{ExtractionFailure, NavigationError};
use tower_brackets::fetchers::{RosterExtractor, ViewerDriver};
use tower_brackets::navigation::NavigationDriver;

const ROSTER: usize = 30;

/// Answers a request target given how many requests came before it; `None` is a 404
type Pages = Arc<dyn Fn(&str, usize) -> Option<String> + Send + Sync>;

/// Local HTTP server standing in for the results viewer
struct ViewerSite {
    base_url: String,
    hits: Arc<AtomicUsize>,
}

impl ViewerSite {
    async fn start(pages: impl Fn(&str, usize) -> Option<String> + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let pages: Pages = Arc::new(pages);

        let counter = hits.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let hit = counter.fetch_add(1, Ordering::SeqCst);
                let pages = pages.clone();

                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    let mut read = 0;
                    while read < buf.len() {
                        match socket.read(&mut buf[read..]).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => read += n,
                        }
                        if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }

                    let request = String::from_utf8_lossy(&buf[..read]).to_string();
                    let target = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                    let response = match pages(&target, hit) {
                        Some(body) => format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\n\
                             Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        ),
                        None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
                    };
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            base_url: format!("http://{}/bracket", addr),
            hits,
        }
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn settings(&self) -> ViewerSettings {
        ViewerSettings {
            base_url: self.base_url.clone(),
            timeout_secs: 5,
            rate_limit_ms: 0,
            roster_poll_ms: 5,
            ..ViewerSettings::default()
        }
    }

    async fn open(&self) -> anyhow::Result<ViewerDriver> {
        let league = find_league("gold").unwrap();
        ViewerDriver::open(&self.settings(), &league, date()).await
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
}

/// Bracket page with `rows` roster rows; `wave` renders each row's wave cell
fn bracket_page(id: &str, next: Option<&str>, rows: usize, wave: impl Fn(usize) -> String) -> String {
    let roster: String = (1..=rows)
        .map(|i| {
            format!(
                "<tr><td data-field='rank'>{i}</td><td data-field='player_id'>{id}-P{i:02}</td>\
                 <td data-field='name'>name{i}</td><td data-field='wave'>{}</td></tr>",
                wave(i)
            )
        })
        .collect();
    let next_control = next
        .map(|next| format!("<a class='next-bracket' href='?league=gold&bracket={next}'>Next</a>"))
        .unwrap_or_default();

    format!(
        "<html><body><select id='bracket-select'><option value='{id}' selected>{id}</option></select>\
         <table class='bracket-roster' data-bracket-id='{id}'><tbody>{roster}</tbody></table>\
         {next_control}</body></html>"
    )
}

fn waves(i: usize) -> String {
    (1000 - i * 7).to_string()
}

fn extract(driver: &ViewerDriver) -> Result<Vec<tower_brackets::domain::PlayerEntry>, ExtractionFailure> {
    RosterExtractor::new(&RosterSelectors::default())
        .unwrap()
        .extract(driver.rendered_state(), ROSTER)
}

/// Bracket id named by the `bracket=` query parameter; the session page is the first one
fn requested_bracket(target: &str) -> Option<&str> {
    target.split("bracket=").nth(1).map(|rest| rest.split('&').next().unwrap_or(rest))
}

#[tokio::test]
async fn roster_filling_in_is_polled_until_parsed() {
    let site = ViewerSite::start(|_, hit| {
        let rows = if hit < 3 { 12 } else { ROSTER };
        Some(bracket_page("AAAA1", None, rows, waves))
    })
    .await;

    let mut driver = site.open().await.unwrap();
    assert!(matches!(extract(&driver), Err(ExtractionFailure::Incomplete { found: 12, .. })));

    assert!(driver.await_roster_ready(ROSTER, Duration::from_secs(2)).await);
    assert_eq!(site.hits(), 4);
    assert_eq!(extract(&driver).unwrap().len(), ROSTER);
}

#[tokio::test]
async fn placeholder_waves_are_refetched() {
    let site = ViewerSite::start(|_, hit| {
        if hit == 0 {
            Some(bracket_page("AAAA1", None, ROSTER, |_| "loading…".to_string()))
        } else {
            Some(bracket_page("AAAA1", None, ROSTER, waves))
        }
    })
    .await;

    let mut driver = site.open().await.unwrap();
    assert!(matches!(extract(&driver), Err(ExtractionFailure::NonNumeric { field: "wave", .. })));

    assert!(driver.await_roster_ready(ROSTER, Duration::from_secs(1)).await);
    assert_eq!(site.hits(), 2);
    assert_eq!(extract(&driver).unwrap()[0].wave, 993);
}

#[tokio::test]
async fn full_roster_on_screen_is_still_reloaded() {
    let site = ViewerSite::start(|_, _| Some(bracket_page("AAAA1", None, ROSTER, waves))).await;

    let mut driver = site.open().await.unwrap();
    assert!(driver.await_roster_ready(ROSTER, Duration::ZERO).await);
    assert_eq!(site.hits(), 2);
}

#[tokio::test]
async fn roster_that_never_completes_times_out() {
    let site = ViewerSite::start(|_, _| Some(bracket_page("AAAA1", None, ROSTER - 1, waves))).await;

    let mut driver = site.open().await.unwrap();
    assert!(!driver.await_roster_ready(ROSTER, Duration::from_millis(60)).await);
    assert!(site.hits() > 2);
}

#[tokio::test]
async fn next_control_chain_wraps_around() {
    let site = ViewerSite::start(|target, _| {
        let page = match requested_bracket(target) {
            None | Some("AAAA1") => bracket_page("AAAA1", Some("BBBB2"), ROSTER, waves),
            Some("BBBB2") => bracket_page("BBBB2", Some("CCCC3"), ROSTER, waves),
            Some("CCCC3") => bracket_page("CCCC3", Some("AAAA1"), ROSTER, waves),
            Some(_) => return None,
        };
        Some(page)
    })
    .await;

    let mut driver = site.open().await.unwrap();
    assert_eq!(driver.current_id(), Some(BracketId::new("AAAA1")));

    let mut visited = Vec::new();
    for _ in 0..3 {
        driver.advance().await.unwrap();
        visited.push(driver.current_id().unwrap().to_string());
    }
    assert_eq!(visited, ["BBBB2", "CCCC3", "AAAA1"]);
    assert_eq!(extract(&driver).unwrap()[0].player_id, "AAAA1-P01");
}

#[tokio::test]
async fn failed_load_keeps_current_page() {
    let site = ViewerSite::start(|target, _| match requested_bracket(target) {
        None => Some(bracket_page("AAAA1", Some("GONE9"), ROSTER, waves)),
        Some(_) => None,
    })
    .await;

    let mut driver = site.open().await.unwrap();
    let before = driver.rendered_state().html().to_string();

    let err = driver.advance().await.unwrap_err();
    assert!(matches!(err, NavigationError::Http(_)));
    assert_eq!(driver.current_id(), Some(BracketId::new("AAAA1")));
    assert_eq!(driver.rendered_state().html(), before);
}

#[tokio::test]
async fn unreachable_session_fails_to_open() {
    let site = ViewerSite::start(|_, _| None).await;
    assert!(site.open().await.is_err());
}
