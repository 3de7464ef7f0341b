use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{info, warn};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::analysis::{DifficultyLabel, DifficultyReport};

/// An extreme difficulty result worth telling someone about
#[derive(Debug, Clone, Serialize)]
pub struct DifficultyNotice {
    pub player_id: String,
    pub league: String,
    pub tournament_date: NaiveDate,
    pub difficulty_score: f64,
    pub difficulty_label: DifficultyLabel,
    pub actual_rank: u32,
    pub average_rank: f64,
    pub snapshot_complete: bool,
}

impl DifficultyNotice {
    pub fn new(report: &DifficultyReport, league: &str, tournament_date: NaiveDate, snapshot_complete: bool) -> Self {
        Self {
            player_id: report.player_id.clone(),
            league: league.to_string(),
            tournament_date,
            difficulty_score: report.difficulty_score,
            difficulty_label: report.difficulty_label,
            actual_rank: report.actual_rank,
            average_rank: report.average_rank,
            snapshot_complete,
        }
    }

    fn message(&self) -> String {
        let confidence = if self.snapshot_complete { "" } else { " (partial snapshot)" };
        format!(
            "{} in {} on {}: {} bracket, score {:.1}, rank {} vs average {:.1}{}",
            self.player_id,
            self.league,
            self.tournament_date,
            self.difficulty_label,
            self.difficulty_score,
            self.actual_rank,
            self.average_rank,
            confidence
        )
    }
}

/// Scores strictly outside `[below, above]` are notable
pub fn is_notable(score: f64, below: f64, above: f64) -> bool {
    score < below || score > above
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &DifficultyNotice) -> Result<()>;
}

/// Writes notices to the log
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notice: &DifficultyNotice) -> Result<()> {
        info!("  ⚑ {}", notice.message());
        Ok(())
    }
}

/// POSTs notices as JSON to a webhook
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: String,
    notice: &'a DifficultyNotice,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build webhook client")?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notice: &DifficultyNotice) -> Result<()> {
        let payload = WebhookPayload {
            content: notice.message(),
            notice,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .context("Failed to send webhook notification")?;

        if !response.status().is_success() {
            anyhow::bail!("Webhook returned status: {}", response.status());
        }
        Ok(())
    }
}

/// Fans a notice out to every notifier; failures are logged only
pub struct NotifierSet {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierSet {
    pub fn new(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    /// Log notifier plus a webhook when one is configured
    pub fn from_webhook(webhook_url: Option<&str>) -> Result<Self> {
        let mut notifiers: Vec<Box<dyn Notifier>> = vec![Box::new(LogNotifier)];
        if let Some(url) = webhook_url {
            notifiers.push(Box::new(WebhookNotifier::new(url)?));
        }
        Ok(Self::new(notifiers))
    }

    pub async fn dispatch(&self, notice: &DifficultyNotice) -> usize {
        let mut delivered = 0;
        for notifier in &self.notifiers {
            match notifier.notify(notice).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!("  Notification for {} failed: {:#}", notice.player_id, e),
            }
        }
        delivered
    }
}
