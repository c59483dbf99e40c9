use std::{sync::Arc, time::Duration};

use itertools::Itertools;
use tokio::{
    task::JoinSet,
    time::{self, Instant},
};

use crate::{
    configuration::AggregationSettings,
    domain::{ImageCandidate, RawRecord, RetrievalMode, Source},
    error::SourceError,
    services::{normalize, AdapterRegistry, SourceAdapter},
};

/// Fans a query out to the requested platforms and merges what comes back
/// in time. No single platform can fail or stall the whole search.
#[derive(Clone)]
pub struct Orchestrator {
    registry: AdapterRegistry,
    direct_api_budget: Duration,
    browser_budget: Duration,
}

impl Orchestrator {
    pub fn new(registry: AdapterRegistry, settings: &AggregationSettings) -> Self {
        Orchestrator {
            registry,
            direct_api_budget: Duration::from_secs(settings.direct_api_timeout_secs),
            browser_budget: Duration::from_secs(settings.browser_timeout_secs),
        }
    }

    /// Runs one platform under its budget. Failures are returned rather than
    /// swallowed so the caller can report them.
    pub async fn search_one(
        &self,
        source: Source,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ImageCandidate>, SourceError> {
        let adapter = self
            .registry
            .get(source)
            .ok_or(SourceError::NotConfigured(source))?;
        let run_stamp = chrono::Utc::now().timestamp_millis().to_string();

        let records = run_adapter(adapter, query.to_string(), limit, self.budget(source)).await?;

        Ok(normalize(source, records, &run_stamp))
    }

    fn budget(&self, source: Source) -> Duration {
        match source.retrieval_mode() {
            RetrievalMode::DirectApi => self.direct_api_budget,
            RetrievalMode::AuthenticatedBrowser => self.browser_budget,
        }
    }

    /// Runs every requested adapter concurrently and concatenates their
    /// normalized output in request order. Platforms that fail, time out or
    /// are still running at `deadline` contribute nothing.
    pub async fn aggregate(
        &self,
        query: &str,
        platforms: &[Source],
        per_platform_limit: usize,
        deadline: Instant,
    ) -> Vec<ImageCandidate> {
        let run_stamp = chrono::Utc::now().timestamp_millis().to_string();
        let platforms: Vec<Source> = platforms.iter().copied().unique().collect();
        let mut slots: Vec<Option<Vec<RawRecord>>> = vec![None; platforms.len()];

        let mut tasks = JoinSet::new();
        for (slot, &source) in platforms.iter().enumerate() {
            let Some(adapter) = self.registry.get(source) else {
                log::warn!("[{}] No adapter registered, skipping", source);
                continue;
            };
            let budget = self.budget(source);
            let query = query.to_string();
            tasks.spawn(async move {
                (slot, run_adapter(adapter, query, per_platform_limit, budget).await)
            });
        }

        loop {
            match time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((slot, Ok(records))))) => slots[slot] = Some(records),
                Ok(Some(Ok((_, Err(e))))) => log::error!("{}", e),
                Ok(Some(Err(e))) => log::error!("Adapter task failed: {}", e),
                Ok(None) => break,
                Err(_) => {
                    log::error!(
                        "Search deadline reached with {} platform(s) still running",
                        tasks.len()
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        platforms
            .into_iter()
            .zip(slots)
            .filter_map(|(source, records)| records.map(|r| normalize(source, r, &run_stamp)))
            .flatten()
            .collect()
    }
}

async fn run_adapter(
    adapter: Arc<dyn SourceAdapter>,
    query: String,
    limit: usize,
    budget: Duration,
) -> Result<Vec<RawRecord>, SourceError> {
    let source = adapter.source();
    let started = Instant::now();
    log::info!("[{}] Searching for: {}", source, query);

    let result = match time::timeout(budget, adapter.search(&query, limit)).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout(source)),
    };

    match &result {
        Ok(records) => log::info!(
            "[{}] Got {} records in {:?}",
            source,
            records.len(),
            started.elapsed()
        ),
        Err(_) => log::warn!("[{}] Contributed nothing after {:?}", source, started.elapsed()),
    }

    result
}
