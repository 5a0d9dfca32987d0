use crate::domain::records::{CorrelationResult, MergedRecord};
use chrono::NaiveDate;
use serde::Serialize;

/// Merged records beyond this many are left out of the report body.
pub const MAX_DATA_RECORDS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMethod {
    Parallel,
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_data_points: usize,
    pub months_processed: usize,
    pub processing_method: ProcessingMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub status: ResponseStatus,
    pub period: Period,
    pub summary: Summary,
    pub correlation: Option<CorrelationResult>,
    pub data: Vec<MergedRecord>,
}

/// Statistics of each input series on its own, before the date join.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStats {
    pub news_days: usize,
    pub avg_news_count: Option<f64>,
    pub index_days: usize,
    pub avg_index_value: Option<f64>,
    pub index_volatility: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationSummary {
    #[serde(flatten)]
    pub summary: Summary,
    pub series: SeriesStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationReport {
    pub status: ResponseStatus,
    pub correlation: Option<CorrelationResult>,
    pub summary: CorrelationSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    pub status: ResponseStatus,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_envelope_has_no_data_field() {
        let v = serde_json::to_value(ErrorEnvelope::new("boom")).unwrap();
        assert_eq!(v, json!({"status": "error", "message": "boom"}));
    }

    #[test]
    fn correlation_summary_flattens_base_summary() {
        let summary = CorrelationSummary {
            summary: Summary {
                total_data_points: 3,
                months_processed: 1,
                processing_method: ProcessingMethod::Sequential,
            },
            series: SeriesStats {
                news_days: 31,
                avg_news_count: Some(50.0),
                index_days: 3,
                avg_index_value: None,
                index_volatility: None,
            },
        };
        let v = serde_json::to_value(summary).unwrap();
        assert_eq!(v["total_data_points"], 3);
        assert_eq!(v["processing_method"], "sequential");
        assert_eq!(v["series"]["news_days"], 31);
        assert!(v["series"]["avg_index_value"].is_null());
    }
}
