use crate::domain::records::{DailyNewsRecord, MonthlyNewsRecord};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Broadcasts a monthly record onto every day of its month. Upstream only
/// reports monthly totals, so each day carries the same count and analysis.
pub fn expand_month(record: &MonthlyNewsRecord) -> Vec<DailyNewsRecord> {
    record
        .month
        .days()
        .map(|date| DailyNewsRecord {
            date,
            news_count: record.news_count,
            analysis: record.analysis.clone(),
        })
        .collect()
}

pub fn expand_months(records: &[MonthlyNewsRecord]) -> BTreeMap<NaiveDate, DailyNewsRecord> {
    records
        .iter()
        .flat_map(expand_month)
        .map(|daily| (daily.date, daily))
        .collect()
}
