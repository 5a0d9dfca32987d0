use crate::config::Settings;
use crate::domain::records::{DateRange, IndexRecord, MonthKey, MonthlyNewsRecord};
use crate::ingest::types::{parse_index_payload, NewsCountResponse};
use crate::time::calendar::DATE_FORMAT;
use anyhow::{Context, Result};
use serde_json::Value;

const DEFAULT_NEWS_PATH: &str = "/process";
const DEFAULT_INDEX_PATH: &str = "/colcap";

/// News collaborator: one record per calendar month.
#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_month(&self, month: MonthKey) -> Result<MonthlyNewsRecord>;
}

/// Index collaborator: the full daily series for a range in one call.
#[async_trait::async_trait]
pub trait IndexProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_range(&self, range: DateRange) -> Result<Vec<IndexRecord>>;
}

#[derive(Debug, Clone)]
pub struct HttpNewsProvider {
    http: reqwest::Client,
    base_url: String,
    path: String,
    term: String,
}

impl HttpNewsProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_news_service_url()?.to_string();

        let path = std::env::var("NEWS_SERVICE_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NEWS_PATH.to_string());

        // Per-call timeouts are enforced by the fetch orchestrator; this one
        // only bounds a client used outside of it.
        let http = reqwest::Client::builder()
            .timeout(settings.upstream_timeout)
            .build()
            .context("failed to build news service http client")?;

        Ok(Self {
            http,
            base_url,
            path,
            term: settings.news_search_term.clone(),
        })
    }

    fn url(&self) -> String {
        join_url(&self.base_url, &self.path)
    }
}

#[async_trait::async_trait]
impl NewsProvider for HttpNewsProvider {
    fn provider_name(&self) -> &'static str {
        "news_http_json"
    }

    async fn fetch_month(&self, month: MonthKey) -> Result<MonthlyNewsRecord> {
        let res = self
            .http
            .get(self.url())
            .query(&[
                ("term", self.term.clone()),
                ("year", format!("{:04}", month.year())),
                ("month", format!("{:02}", month.month())),
            ])
            .send()
            .await
            .with_context(|| format!("news service request failed for {month}"))?;

        let raw_json = read_json(res, "news service").await?;
        let parsed = serde_json::from_value::<NewsCountResponse>(raw_json)
            .context("failed to parse news service response")?;
        parsed.validate_and_into_record(month)
    }
}

#[derive(Debug, Clone)]
pub struct HttpIndexProvider {
    http: reqwest::Client,
    base_url: String,
    path: String,
}

impl HttpIndexProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_index_service_url()?.to_string();

        let path = std::env::var("INDEX_SERVICE_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_INDEX_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(settings.upstream_timeout)
            .build()
            .context("failed to build index service http client")?;

        Ok(Self {
            http,
            base_url,
            path,
        })
    }

    fn url(&self) -> String {
        join_url(&self.base_url, &self.path)
    }
}

#[async_trait::async_trait]
impl IndexProvider for HttpIndexProvider {
    fn provider_name(&self) -> &'static str {
        "index_http_json"
    }

    async fn fetch_range(&self, range: DateRange) -> Result<Vec<IndexRecord>> {
        let res = self
            .http
            .get(self.url())
            .query(&[
                ("start_date", range.start().format(DATE_FORMAT).to_string()),
                ("end_date", range.end().format(DATE_FORMAT).to_string()),
            ])
            .send()
            .await
            .context("index service request failed")?;

        let raw_json = read_json(res, "index service").await?;
        parse_index_payload(raw_json)
    }
}

async fn read_json(res: reqwest::Response, service: &str) -> Result<Value> {
    let status = res.status();
    let text = res
        .text()
        .await
        .with_context(|| format!("failed to read {service} response"))?;
    check_response(status, &text, service)
}

/// Non-2xx statuses fail with the body attached, whether or not it is JSON.
fn check_response(status: reqwest::StatusCode, text: &str, service: &str) -> Result<Value> {
    if !status.is_success() {
        anyhow::bail!("{service} HTTP {status}: {}", text.trim());
    }
    serde_json::from_str::<Value>(text)
        .with_context(|| format!("{service} response is not valid JSON: {text}"))
}

fn join_url(base_url: &str, path: &str) -> String {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    format!("{}{}", base_url.trim_end_matches('/'), path)
}
