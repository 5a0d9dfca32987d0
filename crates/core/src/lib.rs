pub mod domain;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    pub const DEFAULT_NEWS_SEARCH_TERM: &str = "inflacion";
    pub const DEFAULT_SIMULATION_SEED: u64 = 42;
    pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_FETCH_WORKERS: usize = 3;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum UpstreamMode {
        Http,
        Simulated,
    }

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub news_service_url: Option<String>,
        pub index_service_url: Option<String>,
        pub news_search_term: String,
        pub upstream_mode: UpstreamMode,
        pub simulation_seed: u64,
        pub upstream_timeout: Duration,
        pub fetch_workers: usize,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let upstream_mode = match std::env::var("UPSTREAM_MODE")
                .ok()
                .map(|s| s.trim().to_ascii_lowercase())
                .as_deref()
            {
                None | Some("") | Some("http") => UpstreamMode::Http,
                Some("simulated") => UpstreamMode::Simulated,
                Some(other) => anyhow::bail!("UPSTREAM_MODE must be http or simulated (got {other})"),
            };

            let timeout_secs = std::env::var("UPSTREAM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS);

            let fetch_workers = std::env::var("FETCH_WORKERS")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_FETCH_WORKERS);

            Ok(Self {
                news_service_url: non_empty_var("NEWS_SERVICE_URL"),
                index_service_url: non_empty_var("INDEX_SERVICE_URL"),
                news_search_term: non_empty_var("NEWS_SEARCH_TERM")
                    .unwrap_or_else(|| DEFAULT_NEWS_SEARCH_TERM.to_string()),
                upstream_mode,
                simulation_seed: std::env::var("SIMULATION_SEED")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_SIMULATION_SEED),
                upstream_timeout: Duration::from_secs(timeout_secs),
                fetch_workers,
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_news_service_url(&self) -> anyhow::Result<&str> {
            self.news_service_url
                .as_deref()
                .context("NEWS_SERVICE_URL is required")
        }

        pub fn require_index_service_url(&self) -> anyhow::Result<&str> {
            self.index_service_url
                .as_deref()
                .context("INDEX_SERVICE_URL is required")
        }
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                news_service_url: None,
                index_service_url: None,
                news_search_term: DEFAULT_NEWS_SEARCH_TERM.to_string(),
                upstream_mode: UpstreamMode::Http,
                simulation_seed: DEFAULT_SIMULATION_SEED,
                upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
                fetch_workers: DEFAULT_FETCH_WORKERS,
                sentry_dsn: None,
            }
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }
}
