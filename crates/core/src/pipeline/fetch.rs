use crate::config::{Settings, DEFAULT_FETCH_WORKERS, DEFAULT_UPSTREAM_TIMEOUT_SECS};
use crate::domain::records::{MonthKey, MonthlyNewsRecord};
use crate::domain::response::ProcessingMethod;
use crate::ingest::provider::NewsProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Maximum in-flight news calls in parallel mode.
    pub workers: usize,
    /// Applies to each upstream call on its own.
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_FETCH_WORKERS,
            timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

impl FetchOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            workers: settings.fetch_workers.max(1),
            timeout: settings.upstream_timeout,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewsFetchOutcome {
    /// Successfully fetched months, ascending by month key.
    pub records: Vec<MonthlyNewsRecord>,
    pub method: ProcessingMethod,
    pub failures: usize,
}

/// Fetches one news record per month. Failed or timed-out months are dropped;
/// the call itself never fails.
pub async fn fetch_monthly_news(
    provider: Arc<dyn NewsProvider>,
    months: &[MonthKey],
    parallel: bool,
    opts: FetchOptions,
) -> NewsFetchOutcome {
    let (mut records, method) = if parallel && months.len() > 1 {
        (
            fetch_concurrent(Arc::clone(&provider), months, opts).await,
            ProcessingMethod::Parallel,
        )
    } else {
        (
            fetch_sequential(provider.as_ref(), months, opts).await,
            ProcessingMethod::Sequential,
        )
    };

    records.sort_by_key(|r| r.month);
    let failures = months.len() - records.len();
    if failures > 0 {
        tracing::warn!(
            requested = months.len(),
            failures,
            provider = provider.provider_name(),
            "some news months could not be fetched"
        );
    }

    NewsFetchOutcome {
        records,
        method,
        failures,
    }
}

async fn fetch_sequential(
    provider: &dyn NewsProvider,
    months: &[MonthKey],
    opts: FetchOptions,
) -> Vec<MonthlyNewsRecord> {
    let mut out = Vec::with_capacity(months.len());
    for &month in months {
        if let Some(record) = fetch_one(provider, month, opts.timeout).await {
            out.push(record);
        }
    }
    out
}

async fn fetch_concurrent(
    provider: Arc<dyn NewsProvider>,
    months: &[MonthKey],
    opts: FetchOptions,
) -> Vec<MonthlyNewsRecord> {
    let semaphore = Arc::new(Semaphore::new(opts.workers.max(1)));
    let mut tasks = JoinSet::new();

    for &month in months {
        let provider = Arc::clone(&provider);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            // The timeout starts once a worker slot is held.
            let _permit = semaphore.acquire_owned().await.ok()?;
            fetch_one(provider.as_ref(), month, opts.timeout).await
        });
    }

    let mut out = Vec::with_capacity(months.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(record)) => out.push(record),
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "news fetch task aborted; dropping month"),
        }
    }
    out
}

async fn fetch_one(
    provider: &dyn NewsProvider,
    month: MonthKey,
    timeout: Duration,
) -> Option<MonthlyNewsRecord> {
    match tokio::time::timeout(timeout, provider.fetch_month(month)).await {
        Ok(Ok(record)) => Some(record),
        Ok(Err(err)) => {
            tracing::warn!(%month, error = %err, "news fetch failed; dropping month");
            None
        }
        Err(_) => {
            tracing::warn!(%month, ?timeout, "news fetch timed out; dropping month");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Returns `month * 10` as the count; fails or stalls on configured months.
    #[derive(Default)]
    struct StubNews {
        fail: HashSet<u32>,
        stall: HashSet<u32>,
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: Mutex<Vec<MonthKey>>,
    }

    #[async_trait::async_trait]
    impl NewsProvider for StubNews {
        fn provider_name(&self) -> &'static str {
            "stub"
        }

        async fn fetch_month(&self, month: MonthKey) -> anyhow::Result<MonthlyNewsRecord> {
            self.calls.lock().unwrap().push(month);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if self.stall.contains(&month.month()) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            } else if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            anyhow::ensure!(!self.fail.contains(&month.month()), "upstream 500 for {month}");
            Ok(MonthlyNewsRecord {
                month,
                news_count: month.month() as u64 * 10,
                analysis: Map::new(),
            })
        }
    }

    fn months(n: u32) -> Vec<MonthKey> {
        (1..=n).map(|m| MonthKey::new(2024, m).unwrap()).collect()
    }

    fn fast() -> FetchOptions {
        FetchOptions {
            workers: 3,
            timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn sequential_calls_in_month_order() {
        let stub = Arc::new(StubNews::default());
        let out = fetch_monthly_news(stub.clone(), &months(4), false, fast()).await;
        assert_eq!(out.method, ProcessingMethod::Sequential);
        assert_eq!(out.records.len(), 4);
        assert_eq!(*stub.calls.lock().unwrap(), months(4));
        assert_eq!(stub.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn parallel_is_bounded_by_worker_count() {
        let stub = Arc::new(StubNews {
            delay: Duration::from_millis(20),
            ..StubNews::default()
        });
        let out = fetch_monthly_news(stub.clone(), &months(9), true, fast()).await;
        assert_eq!(out.method, ProcessingMethod::Parallel);
        assert_eq!(out.records.len(), 9);
        assert!(stub.max_in_flight.load(Ordering::SeqCst) <= 3);
        let keys: Vec<_> = out.records.iter().map(|r| r.month).collect();
        assert_eq!(keys, months(9));
    }

    #[tokio::test]
    async fn single_month_runs_sequentially_even_when_parallel_requested() {
        let stub = Arc::new(StubNews::default());
        let out = fetch_monthly_news(stub, &months(1), true, fast()).await;
        assert_eq!(out.method, ProcessingMethod::Sequential);
        assert_eq!(out.records.len(), 1);
    }

    #[tokio::test]
    async fn failed_and_timed_out_months_are_dropped() {
        let stub = Arc::new(StubNews {
            fail: HashSet::from([2]),
            stall: HashSet::from([3]),
            ..StubNews::default()
        });
        for parallel in [true, false] {
            let out = fetch_monthly_news(stub.clone(), &months(4), parallel, fast()).await;
            let got: Vec<_> = out.records.iter().map(|r| r.month.month()).collect();
            assert_eq!(got, vec![1, 4]);
            assert_eq!(out.failures, 2);
        }
    }

    #[tokio::test]
    async fn all_failures_yield_empty_outcome() {
        let stub = Arc::new(StubNews {
            fail: (1..=3).collect(),
            ..StubNews::default()
        });
        let out = fetch_monthly_news(stub, &months(3), true, fast()).await;
        assert!(out.records.is_empty());
        assert_eq!(out.failures, 3);
    }
}
