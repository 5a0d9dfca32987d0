use crate::domain::records::{DateRange, MonthKey};
use crate::error::AggregateError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Longest accepted range in days, roughly ten years. Every month touched
/// by the range costs one news fetch.
pub const MAX_RANGE_DAYS: i64 = 3660;

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

// Window used when the caller omits start_date.
const DEFAULT_LOOKBACK_DAYS: i64 = 90;

/// Parses a `YYYY-MM-DD` date. Years outside 1..=9999 are rejected.
pub fn parse_date(s: &str) -> Result<NaiveDate, AggregateError> {
    let date = NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| AggregateError::InvalidRange(format!("cannot parse date {s:?}: {e}")))?;
    check_year(date)
}

/// Resolves optional query bounds into a range. `end` defaults to today and
/// `start` to 90 days before `end`.
pub fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    now_utc: DateTime<Utc>,
) -> Result<DateRange, AggregateError> {
    let end = match end.filter(|s| !s.trim().is_empty()) {
        Some(s) => parse_date(s)?,
        None => now_utc.date_naive(),
    };
    let start = match start.filter(|s| !s.trim().is_empty()) {
        Some(s) => parse_date(s)?,
        None => end
            .checked_sub_signed(Duration::days(DEFAULT_LOOKBACK_DAYS))
            .ok_or_else(|| {
                AggregateError::InvalidRange(format!("no default start date before {end}"))
            })?,
    };

    bounded_range(start, end)
}

/// Builds a range inside the supported calendar, at most [`MAX_RANGE_DAYS`] long.
pub fn bounded_range(start: NaiveDate, end: NaiveDate) -> Result<DateRange, AggregateError> {
    let range = DateRange::new(check_year(start)?, check_year(end)?)
        .map_err(|e| AggregateError::InvalidRange(e.to_string()))?;
    if range.num_days() > MAX_RANGE_DAYS {
        return Err(AggregateError::InvalidRange(format!(
            "range {start}..{end} covers {} days; at most {MAX_RANGE_DAYS} are allowed",
            range.num_days()
        )));
    }
    Ok(range)
}

fn check_year(date: NaiveDate) -> Result<NaiveDate, AggregateError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        Ok(date)
    } else {
        Err(AggregateError::InvalidRange(format!(
            "date {date} is outside years {MIN_YEAR}..={MAX_YEAR}"
        )))
    }
}

/// Every calendar month intersecting the range, ascending, partial months included.
pub fn months_in_range(range: &DateRange) -> Vec<MonthKey> {
    let last = MonthKey::of(range.end());
    let mut out = Vec::new();
    let mut key = MonthKey::of(range.start());
    while key <= last {
        out.push(key);
        key = key.next();
    }
    out
}

pub fn months_between(start: NaiveDate, end: NaiveDate) -> Result<Vec<MonthKey>, AggregateError> {
    Ok(months_in_range(&bounded_range(start, end)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn keys(v: &[(i32, u32)]) -> Vec<MonthKey> {
        v.iter().map(|(y, m)| MonthKey::new(*y, *m).unwrap()).collect()
    }

    #[test]
    fn single_day_touches_one_month() {
        let months = months_between(d(2024, 1, 15), d(2024, 1, 15)).unwrap();
        assert_eq!(months, keys(&[(2024, 1)]));
    }

    #[test]
    fn partial_months_at_both_ends_are_included() {
        let months = months_between(d(2023, 11, 30), d(2024, 2, 1)).unwrap();
        assert_eq!(months, keys(&[(2023, 11), (2023, 12), (2024, 1), (2024, 2)]));
    }

    #[test]
    fn months_are_unique_and_ascending_for_long_ranges() {
        let months = months_between(d(2021, 3, 9), d(2024, 7, 2)).unwrap();
        assert_eq!(months.len(), 41);
        assert!(months.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(months.first().copied(), Some(MonthKey::new(2021, 3).unwrap()));
        assert_eq!(months.last().copied(), Some(MonthKey::new(2024, 7).unwrap()));
    }

    #[test]
    fn inverted_range_is_invalid() {
        let err = months_between(d(2024, 2, 1), d(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, AggregateError::InvalidRange(_)));
    }

    #[test]
    fn unparseable_date_is_invalid() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let err = resolve_range(Some("2024-13-01"), None, now).unwrap_err();
        assert!(matches!(err, AggregateError::InvalidRange(_)));
    }

    #[test]
    fn defaults_to_ninety_days_ending_today() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let range = resolve_range(None, None, now).unwrap();
        assert_eq!(range.end(), d(2024, 6, 1));
        assert_eq!(range.start(), d(2024, 3, 3));
    }

    #[test]
    fn default_start_follows_explicit_end() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let range = resolve_range(None, Some("2024-01-31"), now).unwrap();
        assert_eq!(range.start(), d(2023, 11, 2));
    }

    #[test]
    fn years_outside_four_digits_are_invalid() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        for bad in ["0000-03-01", "+12345-03-01"] {
            let err = resolve_range(Some(bad), Some("2024-01-01"), now).unwrap_err();
            assert!(matches!(err, AggregateError::InvalidRange(_)), "{bad}");
        }
        let err = resolve_range(Some("0000-03-01"), Some("0000-03-02"), now).unwrap_err();
        assert!(matches!(err, AggregateError::InvalidRange(_)));
    }

    #[test]
    fn default_start_before_the_calendar_is_invalid() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let err = resolve_range(None, Some("-262143-01-05"), now).unwrap_err();
        assert!(matches!(err, AggregateError::InvalidRange(_)));

        // Ninety days before 0001-01-05 falls in year 0.
        let err = resolve_range(None, Some("0001-01-05"), now).unwrap_err();
        assert!(matches!(err, AggregateError::InvalidRange(_)));
    }

    #[test]
    fn span_is_capped() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let err = resolve_range(Some("0001-01-01"), Some("9999-12-31"), now).unwrap_err();
        assert!(matches!(err, AggregateError::InvalidRange(_)));

        let start = d(2014, 1, 1);
        let last_allowed = start + Duration::days(MAX_RANGE_DAYS - 1);
        assert_eq!(bounded_range(start, last_allowed).unwrap().num_days(), MAX_RANGE_DAYS);
        let err = months_between(start, last_allowed + Duration::days(1)).unwrap_err();
        assert!(matches!(err, AggregateError::InvalidRange(_)));
    }
}
