use crate::api::error::{Operation, RequestFailed};
use crate::api::{ApiResult, ScoringApi};
use crate::config::Settings;
use crate::domain::{AddedCompany, Company, CreditScore, NewsItem, ScoreHistoryPoint};
use anyhow::Context;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;

// Longest error body we echo into a RequestFailed message.
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct HttpScoringClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpScoringClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(&settings.api_base_url)
    }

    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .with_context(|| format!("invalid scoring API base URL: {base_url}"))?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "scoring API base URL cannot be used as a base: {base_url}"
        );

        // No timeout: every call is a single attempt that waits for the backend.
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build scoring API http client")?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn url(&self, operation: Operation, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| RequestFailed::new(operation, "base URL cannot hold a path"))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        operation: Operation,
        method: Method,
        segments: &[&str],
    ) -> ApiResult<T> {
        let url = self.url(operation, segments)?;
        tracing::debug!(%method, %url, ?operation, "scoring API request");

        let res = self
            .http
            .request(method, url.clone())
            .send()
            .await
            .map_err(|e| RequestFailed::new(operation, e.to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| RequestFailed::new(operation, format!("failed to read body: {e}")))?;

        if !status.is_success() {
            tracing::warn!(%url, %status, ?operation, "scoring API returned non-success status");
            return Err(
                RequestFailed::new(operation, error_detail(status, &text)).with_status(status.as_u16())
            );
        }

        serde_json::from_str::<T>(&text).map_err(|e| {
            tracing::warn!(%url, error = %e, ?operation, "scoring API body did not decode");
            RequestFailed::new(operation, format!("invalid response body: {e}"))
        })
    }
}

fn require_ticker(operation: Operation, ticker: &str) -> ApiResult<&str> {
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(RequestFailed::new(operation, "ticker must be non-empty"));
    }
    Ok(ticker)
}

/// `HTTP 404 Not Found`, plus the backend's `detail` (or a short body excerpt) when present.
fn error_detail(status: reqwest::StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect());

    if detail.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {detail}")
    }
}

#[async_trait::async_trait]
impl ScoringApi for HttpScoringClient {
    async fn fetch_companies(&self) -> ApiResult<Vec<Company>> {
        self.request(Operation::FetchCompanies, Method::GET, &["companies"])
            .await
    }

    async fn fetch_company(&self, ticker: &str) -> ApiResult<Company> {
        let ticker = require_ticker(Operation::FetchCompany, ticker)?;
        self.request(Operation::FetchCompany, Method::GET, &["company", ticker])
            .await
    }

    async fn fetch_credit_score(&self, ticker: &str) -> ApiResult<CreditScore> {
        let ticker = require_ticker(Operation::FetchCreditScore, ticker)?;
        self.request(Operation::FetchCreditScore, Method::GET, &["score", ticker])
            .await
    }

    async fn fetch_score_history(&self, ticker: &str) -> ApiResult<Vec<ScoreHistoryPoint>> {
        let ticker = require_ticker(Operation::FetchScoreHistory, ticker)?;
        self.request(
            Operation::FetchScoreHistory,
            Method::GET,
            &["score_history", ticker],
        )
        .await
    }

    async fn fetch_news(&self, ticker: &str) -> ApiResult<Vec<NewsItem>> {
        let ticker = require_ticker(Operation::FetchNews, ticker)?;
        self.request(Operation::FetchNews, Method::GET, &["news", ticker])
            .await
    }

    async fn add_company(&self, ticker: &str) -> ApiResult<AddedCompany> {
        let ticker = require_ticker(Operation::AddCompany, ticker)?;
        let added: AddedCompany = self
            .request(Operation::AddCompany, Method::POST, &["add_company", ticker])
            .await?;
        tracing::info!(%ticker, id = added.id, message = ?added.message, "company added");
        Ok(added)
    }
}
