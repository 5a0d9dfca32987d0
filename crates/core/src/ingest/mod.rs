pub mod provider;
pub mod simulated;
pub mod types;

use crate::config::{Settings, UpstreamMode};
use crate::ingest::provider::{HttpIndexProvider, HttpNewsProvider, IndexProvider, NewsProvider};
use crate::ingest::simulated::{SimulatedIndexProvider, SimulatedNewsProvider};
use std::sync::Arc;

/// Upstream collaborators handed to the aggregation pipeline.
#[derive(Clone)]
pub struct Upstreams {
    pub news: Arc<dyn NewsProvider>,
    pub index: Arc<dyn IndexProvider>,
}

impl Upstreams {
    pub fn new(news: Arc<dyn NewsProvider>, index: Arc<dyn IndexProvider>) -> Self {
        Self { news, index }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        match settings.upstream_mode {
            UpstreamMode::Http => Ok(Self::new(
                Arc::new(HttpNewsProvider::from_settings(settings)?),
                Arc::new(HttpIndexProvider::from_settings(settings)?),
            )),
            UpstreamMode::Simulated => Ok(Self::new(
                Arc::new(SimulatedNewsProvider::new(
                    settings.simulation_seed,
                    settings.news_search_term.clone(),
                )),
                Arc::new(SimulatedIndexProvider::new(settings.simulation_seed)),
            )),
        }
    }
}
