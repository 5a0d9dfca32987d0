//! The aggregation-and-correlation engine.
//!
//! months → news fetch → day expansion → join with the index series →
//! correlation → report.

pub mod assemble;
pub mod correlation;
pub mod expand;
pub mod fetch;
pub mod merge;
pub mod stats;

use crate::config::Settings;
use crate::domain::records::{DailyNewsRecord, DateRange, IndexRecord, MergedRecord};
use crate::domain::response::{AggregateReport, CorrelationReport, Summary};
use crate::error::AggregateError;
use crate::ingest::types::validate_index_series;
use crate::ingest::Upstreams;
use crate::time::calendar::{bounded_range, months_in_range};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub use fetch::FetchOptions;

#[derive(Clone)]
pub struct Aggregator {
    upstreams: Upstreams,
    fetch: FetchOptions,
}

struct PipelineRun {
    summary: Summary,
    daily_news: BTreeMap<NaiveDate, DailyNewsRecord>,
    index: Vec<IndexRecord>,
    merged: Vec<MergedRecord>,
}

impl Aggregator {
    pub fn new(upstreams: Upstreams, fetch: FetchOptions) -> Self {
        Self { upstreams, fetch }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self::new(
            Upstreams::from_settings(settings)?,
            FetchOptions::from_settings(settings),
        ))
    }

    pub async fn aggregate(
        &self,
        range: DateRange,
        parallel: bool,
    ) -> Result<AggregateReport, AggregateError> {
        let run = self.run(range, parallel).await?;
        let correlation = correlation::analyze(&run.merged);

        tracing::info!(
            start = %range.start(),
            end = %range.end(),
            data_points = run.summary.total_data_points,
            months_processed = run.summary.months_processed,
            correlated = correlation.is_some(),
            "aggregation complete"
        );

        Ok(assemble::assemble_report(
            &range,
            run.summary,
            correlation,
            run.merged,
        ))
    }

    /// Same pipeline as [`Aggregator::aggregate`], reporting only the
    /// correlation plus per-series statistics.
    pub async fn correlation(
        &self,
        range: DateRange,
        parallel: bool,
    ) -> Result<CorrelationReport, AggregateError> {
        let run = self.run(range, parallel).await?;
        let correlation = correlation::analyze(&run.merged);
        let series = correlation::series_stats(&run.daily_news, &run.index);

        Ok(assemble::assemble_correlation(run.summary, series, correlation))
    }

    async fn run(&self, range: DateRange, parallel: bool) -> Result<PipelineRun, AggregateError> {
        let range = bounded_range(range.start(), range.end())?;
        let months = months_in_range(&range);
        let news = fetch::fetch_monthly_news(
            self.upstreams.news.clone(),
            &months,
            parallel,
            self.fetch,
        )
        .await;

        let index = self.fetch_index(range).await?;

        let daily_news = expand::expand_months(&news.records);
        let merged = merge::merge_on_date(&daily_news, &index);
        let summary = assemble::summary(&merged, news.records.len(), news.method);

        Ok(PipelineRun {
            summary,
            daily_news,
            index,
            merged,
        })
    }

    async fn fetch_index(&self, range: DateRange) -> Result<Vec<IndexRecord>, AggregateError> {
        let provider = self.upstreams.index.as_ref();
        let detail = match tokio::time::timeout(self.fetch.timeout, provider.fetch_range(range)).await {
            Ok(Ok(records)) => match validate_index_series(records) {
                Ok(records) => return Ok(records),
                Err(err) => format!("{err:#}"),
            },
            Ok(Err(err)) => format!("{err:#}"),
            Err(_) => format!("index service timed out after {:?}", self.fetch.timeout),
        };

        tracing::error!(
            provider = provider.provider_name(),
            error = %detail,
            "index fetch failed; aborting aggregation"
        );
        Err(AggregateError::IndexUnavailable(detail))
    }
}
