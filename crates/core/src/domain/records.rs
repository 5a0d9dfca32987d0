use anyhow::ensure;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// One calendar month; the unit the news collaborator is queried by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> anyhow::Result<Self> {
        ensure!((1..=9999).contains(&year), "year must be 4 digits (got {year})");
        ensure!((1..=12).contains(&month), "month must be 1..=12 (got {month})");
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Every calendar day of the month, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let key = *self;
        self.first_day()
            .into_iter()
            .flat_map(|first| first.iter_days())
            .take_while(move |d| MonthKey::of(*d) == key)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("month key must be YYYY-MM (got {s})"))?;
        ensure!(year.len() == 4, "month key must be YYYY-MM (got {s})");
        Self::new(year.parse()?, month.parse()?)
    }
}

/// Inclusive calendar date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> anyhow::Result<Self> {
        ensure!(start <= end, "start date {start} is after end date {end}");
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyNewsRecord {
    pub month: MonthKey,
    pub news_count: u64,
    pub analysis: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyNewsRecord {
    pub date: NaiveDate,
    pub news_count: u64,
    pub analysis: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub date: NaiveDate,
    pub value: f64,
    pub change: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRecord {
    pub date: NaiveDate,
    pub news_count: u64,
    pub analysis: Map<String, Value>,
    pub value: f64,
    pub change: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub coefficient: f64,
    pub data_points: usize,
    pub avg_news_count: f64,
    pub avg_index_value: f64,
    pub index_volatility: f64,
    pub interpretation: String,
}
