use thiserror::Error;

/// Failures that abort an aggregation request.
///
/// Per-month news fetch failures never surface here: they are logged and the
/// month is dropped. Too few merged points is not an error either; it yields
/// `correlation: None` in an otherwise successful report.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// Malformed or inverted date input. The request is not executed.
    #[error("invalid date range: {0}")]
    InvalidRange(String),

    /// The index collaborator failed, timed out, or returned an unusable payload.
    #[error("index data unavailable: {0}")]
    IndexUnavailable(String),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl AggregateError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, AggregateError::InvalidRange(_))
    }
}
