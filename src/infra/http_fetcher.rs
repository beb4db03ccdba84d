use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::app::ports::{DatasetFetcher, SourceId};
use crate::config::SourceSettings;
use crate::error::{PipelineError, Result};

/// Fetches the row-oriented source tables as JSON over HTTP. Upstream
/// serves them already pivoted to long format; this boundary never sees
/// the raw wide downloads.
pub struct HttpDatasetFetcher {
    client: reqwest::Client,
    endpoints: HashMap<SourceId, String>,
}

impl HttpDatasetFetcher {
    pub fn new(sources: &SourceSettings) -> Self {
        let endpoints = HashMap::from([
            (SourceId::ConfirmedCases, sources.confirmed_url.clone()),
            (SourceId::ConfirmedDeaths, sources.deaths_url.clone()),
            (SourceId::Recovered, sources.recovered_url.clone()),
            (SourceId::PolicyIndicators, sources.indicators_url.clone()),
            (SourceId::WorldPopulation, sources.population_url.clone()),
        ]);
        Self {
            client: reqwest::Client::new(),
            endpoints,
        }
    }

    fn unavailable(source: SourceId, message: impl ToString) -> PipelineError {
        PipelineError::SourceUnavailable {
            source: source.to_string(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl DatasetFetcher for HttpDatasetFetcher {
    async fn fetch(&self, source: SourceId) -> Result<Vec<Value>> {
        let url = self
            .endpoints
            .get(&source)
            .ok_or_else(|| Self::unavailable(source, "no endpoint configured"))?;

        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::unavailable(source, e))?;
        let status = response.status();
        if !status.is_success() {
            warn!(%source, %status, "source endpoint returned an error status");
            return Err(Self::unavailable(source, format!("HTTP status {status}")));
        }
        let records: Vec<Value> = response
            .json()
            .await
            .map_err(|e| Self::unavailable(source, e))?;
        info!(
            %source,
            rows = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetched source table"
        );
        Ok(records)
    }
}
