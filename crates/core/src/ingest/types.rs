use crate::domain::records::{IndexRecord, MonthKey, MonthlyNewsRecord};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body returned by the news collaborator for one month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsCountResponse {
    pub date: String,
    pub news_count: u64,
    #[serde(default)]
    pub analysis: Option<Map<String, Value>>,
}

impl NewsCountResponse {
    pub fn validate_and_into_record(self, expected: MonthKey) -> anyhow::Result<MonthlyNewsRecord> {
        let month: MonthKey = self
            .date
            .parse()
            .with_context(|| format!("news response has malformed date {:?}", self.date))?;
        ensure!(
            month == expected,
            "news response month mismatch: expected {expected}, got {month}"
        );

        Ok(MonthlyNewsRecord {
            month,
            news_count: self.news_count,
            analysis: self.analysis.unwrap_or_default(),
        })
    }
}

/// Body returned by the index collaborator: either a bare record list or the
/// `{status, count, data}` envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IndexPayload {
    Records(Vec<IndexRecord>),
    Envelope(IndexEnvelope),
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<IndexRecord>>,
}

impl IndexPayload {
    pub fn into_records(self) -> anyhow::Result<Vec<IndexRecord>> {
        let records = match self {
            IndexPayload::Records(records) => records,
            IndexPayload::Envelope(env) => {
                if env.status.as_deref() == Some("error") {
                    bail!(
                        "index service reported an error: {}",
                        env.message.as_deref().unwrap_or("no message")
                    );
                }
                env.data.context("index response has no data list")?
            }
        };

        validate_index_series(records)
    }
}

/// Checks an index series and returns it sorted by date. The series must be
/// non-empty, finite and carry at most one record per day.
pub fn validate_index_series(mut records: Vec<IndexRecord>) -> anyhow::Result<Vec<IndexRecord>> {
    ensure!(!records.is_empty(), "index response contains no records");
    for r in &records {
        ensure!(
            r.value.is_finite() && r.change.is_finite(),
            "index record for {} has non-finite values",
            r.date
        );
    }

    records.sort_by_key(|r| r.date);
    if let Some(w) = records.windows(2).find(|w| w[0].date >= w[1].date) {
        bail!("index response repeats date {}", w[1].date);
    }
    Ok(records)
}

pub fn parse_index_payload(raw: Value) -> anyhow::Result<Vec<IndexRecord>> {
    let payload = serde_json::from_value::<IndexPayload>(raw)
        .context("index response is not a well-formed record list")?;
    payload.into_records()
}
