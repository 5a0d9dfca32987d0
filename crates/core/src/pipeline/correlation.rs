use crate::domain::records::{CorrelationResult, DailyNewsRecord, IndexRecord, MergedRecord};
use crate::domain::response::SeriesStats;
use crate::pipeline::stats::{mean, pearson, std_dev};
use chrono::NaiveDate;
use std::collections::BTreeMap;

const STRONG: f64 = 0.70;
const MODERATE: f64 = 0.40;
const WEAK: f64 = 0.20;

/// Correlates daily news volume with the index value over merged records.
///
/// Returns `None` below two usable points. When the coefficient itself is
/// undefined (a constant series) it is reported as 0 with the weakest label,
/// keeping the means and volatility.
pub fn analyze(merged: &[MergedRecord]) -> Option<CorrelationResult> {
    let (news, values): (Vec<f64>, Vec<f64>) = merged
        .iter()
        .filter(|r| r.value.is_finite())
        .map(|r| (r.news_count as f64, r.value))
        .unzip();

    if news.len() < 2 {
        return None;
    }

    let coefficient = pearson(&news, &values).unwrap_or_else(|| {
        tracing::debug!(data_points = news.len(), "correlation undefined; reporting 0");
        0.0
    });
    let coefficient = round_to(coefficient, 4);

    Some(CorrelationResult {
        coefficient,
        data_points: news.len(),
        avg_news_count: round_to(mean(&news)?, 2),
        avg_index_value: round_to(mean(&values)?, 2),
        index_volatility: round_to(std_dev(&values)?, 2),
        interpretation: interpret(coefficient),
    })
}

/// Describes each series on its own, without the date join.
pub fn series_stats(
    daily_news: &BTreeMap<NaiveDate, DailyNewsRecord>,
    index: &[IndexRecord],
) -> SeriesStats {
    let news: Vec<f64> = daily_news.values().map(|d| d.news_count as f64).collect();
    let values: Vec<f64> = index
        .iter()
        .map(|r| r.value)
        .filter(|v| v.is_finite())
        .collect();

    SeriesStats {
        news_days: news.len(),
        avg_news_count: mean(&news).map(|v| round_to(v, 2)),
        index_days: values.len(),
        avg_index_value: mean(&values).map(|v| round_to(v, 2)),
        index_volatility: std_dev(&values).map(|v| round_to(v, 2)),
    }
}

pub fn interpret(coefficient: f64) -> String {
    let magnitude = coefficient.abs();
    let strength = if magnitude >= STRONG {
        "Strong"
    } else if magnitude >= MODERATE {
        "Moderate"
    } else if magnitude >= WEAK {
        "Weak"
    } else {
        "Very weak"
    };
    let direction = if coefficient >= 0.0 {
        "positive"
    } else {
        "negative"
    };

    format!("{strength} {direction} correlation between economic news volume and the COLCAP index")
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (v * factor).round() / factor
}
