use crate::domain::records::{DailyNewsRecord, IndexRecord, MergedRecord};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Inner join on exact date. Output follows the order of `index`; index days
/// without a news entry are dropped.
pub fn merge_on_date(
    daily_news: &BTreeMap<NaiveDate, DailyNewsRecord>,
    index: &[IndexRecord],
) -> Vec<MergedRecord> {
    index
        .iter()
        .filter_map(|idx| {
            let news = daily_news.get(&idx.date)?;
            Some(MergedRecord {
                date: idx.date,
                news_count: news.news_count,
                analysis: news.analysis.clone(),
                value: idx.value,
                change: idx.change,
                volume: idx.volume,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn news(days: &[u32]) -> BTreeMap<NaiveDate, DailyNewsRecord> {
        days.iter()
            .map(|&day| {
                (
                    d(day),
                    DailyNewsRecord {
                        date: d(day),
                        news_count: day as u64,
                        analysis: Map::new(),
                    },
                )
            })
            .collect()
    }

    fn index(days: &[u32]) -> Vec<IndexRecord> {
        days.iter()
            .map(|&day| IndexRecord {
                date: d(day),
                value: 1400.0 + day as f64,
                change: 0.5,
                volume: 1_000,
            })
            .collect()
    }

    #[test]
    fn keeps_only_dates_present_on_both_sides() {
        let daily = news(&[1, 2, 3, 5]);
        let idx = index(&[2, 3, 4, 5, 6]);
        let merged = merge_on_date(&daily, &idx);

        let dates: Vec<_> = merged.iter().map(|m| m.date).collect();
        assert_eq!(dates, vec![d(2), d(3), d(5)]);
        assert!(merged.len() <= daily.len().min(idx.len()));
        for m in &merged {
            assert!(daily.contains_key(&m.date));
            assert!(idx.iter().any(|i| i.date == m.date));
        }
        assert_eq!(merged[2].news_count, 5);
        assert_eq!(merged[2].value, 1405.0);
    }

    #[test]
    fn follows_index_order() {
        let daily = news(&[1, 2, 3]);
        let idx = index(&[3, 1, 2]);
        let dates: Vec<_> = merge_on_date(&daily, &idx).iter().map(|m| m.date).collect();
        assert_eq!(dates, vec![d(3), d(1), d(2)]);
    }

    #[test]
    fn empty_news_yields_empty_merge() {
        assert!(merge_on_date(&BTreeMap::new(), &index(&[1, 2])).is_empty());
    }
}
