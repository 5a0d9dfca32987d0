use crate::domain::records::{CorrelationResult, DateRange, MergedRecord};
use crate::domain::response::{
    AggregateReport, CorrelationReport, CorrelationSummary, Period, ProcessingMethod,
    ResponseStatus, SeriesStats, Summary, MAX_DATA_RECORDS,
};

pub fn summary(merged: &[MergedRecord], months_processed: usize, method: ProcessingMethod) -> Summary {
    Summary {
        total_data_points: merged.len(),
        months_processed,
        processing_method: method,
    }
}

/// Builds the success envelope. `data` keeps at most the first
/// `MAX_DATA_RECORDS` merged records; `total_data_points` counts all of them.
pub fn assemble_report(
    range: &DateRange,
    summary: Summary,
    correlation: Option<CorrelationResult>,
    mut merged: Vec<MergedRecord>,
) -> AggregateReport {
    merged.truncate(MAX_DATA_RECORDS);
    AggregateReport {
        status: ResponseStatus::Success,
        period: Period {
            start: range.start(),
            end: range.end(),
        },
        summary,
        correlation,
        data: merged,
    }
}

pub fn assemble_correlation(
    summary: Summary,
    series: SeriesStats,
    correlation: Option<CorrelationResult>,
) -> CorrelationReport {
    CorrelationReport {
        status: ResponseStatus::Success,
        correlation,
        summary: CorrelationSummary { summary, series },
    }
}
