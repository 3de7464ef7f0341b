use crate::errors::fetch_context;
use crate::rate_limiter::RateLimiter;
use anyhow::{Context, Result, bail};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, redirect};
use std::time::Duration;

const MAX_REDIRECTS: usize = 5;

/// A viewer page after redirects were followed
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Where the viewer actually answered; relative links resolve against it
    pub final_url: String,
    pub html: String,
}

/// HTTP client with built-in rate limiting, one per viewer session
pub struct RateLimitedClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl RateLimitedClient {
    pub fn new(user_agent: &str, timeout_secs: u64, rate_limit_ms: u64) -> Result<Self> {
        Ok(Self {
            client: build_client(user_agent, timeout_secs)?,
            rate_limiter: RateLimiter::new(rate_limit_ms),
        })
    }

    /// Load one HTML page; non-2xx statuses are errors
    pub async fn fetch_page(&mut self, url: &str) -> Result<FetchedPage> {
        self.rate_limiter.wait().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| fetch_context(url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("HTTP error {} for {}", status, url);
        }

        let final_url = response.url().to_string();
        let html = response.text().await.with_context(|| fetch_context(url))?;
        Ok(FetchedPage { final_url, html })
    }
}

fn build_client(user_agent: &str, timeout_secs: u64) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml"));

    Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .redirect(redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}
