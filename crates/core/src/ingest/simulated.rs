//! Seeded stand-ins for the news and index collaborators.
//!
//! Every request draws from a fresh `StdRng` whose seed is derived from the
//! configured base seed and the request parameters, so identical requests
//! produce identical series on every platform.

use crate::domain::records::{DateRange, IndexRecord, MonthKey, MonthlyNewsRecord};
use crate::ingest::provider::{IndexProvider, NewsProvider};
use anyhow::{Context, Result};
use chrono::Datelike;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde_json::{json, Map, Value};

const BASE_INDEX_VALUE: f64 = 1400.0;
const INDEX_TREND_SPAN: f64 = 50.0;
const INDEX_NOISE_STD: f64 = 20.0;
const INDEX_FLOOR: f64 = 1200.0;

#[derive(Debug, Clone)]
pub struct SimulatedNewsProvider {
    seed: u64,
    term: String,
}

impl SimulatedNewsProvider {
    pub fn new(seed: u64, term: impl Into<String>) -> Self {
        Self {
            seed,
            term: term.into(),
        }
    }

    fn month_seed(&self, month: MonthKey) -> u64 {
        mix(self.seed, (month.year() as u64) * 100 + month.month() as u64)
    }
}

#[async_trait::async_trait]
impl NewsProvider for SimulatedNewsProvider {
    fn provider_name(&self) -> &'static str {
        "news_simulated"
    }

    async fn fetch_month(&self, month: MonthKey) -> Result<MonthlyNewsRecord> {
        let mut rng = StdRng::seed_from_u64(self.month_seed(month));
        let news_count = rng.gen_range(20..200);

        let mut analysis = Map::new();
        analysis.insert("term".to_string(), Value::String(self.term.clone()));
        analysis.insert("source".to_string(), json!("simulated"));

        Ok(MonthlyNewsRecord {
            month,
            news_count,
            analysis,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedIndexProvider {
    seed: u64,
}

impl SimulatedIndexProvider {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn range_seed(&self, range: DateRange) -> u64 {
        let start = range.start().num_days_from_ce() as u64;
        let end = range.end().num_days_from_ce() as u64;
        mix(mix(self.seed, start), end)
    }
}

#[async_trait::async_trait]
impl IndexProvider for SimulatedIndexProvider {
    fn provider_name(&self) -> &'static str {
        "index_simulated"
    }

    async fn fetch_range(&self, range: DateRange) -> Result<Vec<IndexRecord>> {
        let mut rng = StdRng::seed_from_u64(self.range_seed(range));
        let noise = Normal::new(0.0, INDEX_NOISE_STD).context("invalid index noise distribution")?;

        let days = range.num_days() as usize;
        let step = if days > 1 {
            INDEX_TREND_SPAN / (days - 1) as f64
        } else {
            0.0
        };

        let out = range
            .start()
            .iter_days()
            .take(days)
            .enumerate()
            .map(|(i, date)| {
                let raw = BASE_INDEX_VALUE + step * i as f64 + noise.sample(&mut rng);
                IndexRecord {
                    date,
                    value: round2(raw.max(INDEX_FLOOR)),
                    change: round2(rng.gen_range(-2.0..=2.0)),
                    volume: rng.gen_range(1_000_000..5_000_000),
                }
            })
            .collect();

        Ok(out)
    }
}

// SplitMix64 step; keeps seeds reproducible without relying on std's hasher.
fn mix(seed: u64, value: u64) -> u64 {
    let mut z = seed ^ value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
