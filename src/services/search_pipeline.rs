use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use uuid::Uuid;

use crate::{
    configuration::{AggregationSettings, IntentSettings},
    domain::{ImageCandidate, SearchIntent, Source, UserFilters},
    error::SearchError,
    services::{IntentSource, Orchestrator, RelevanceFilter, RelevanceScorer},
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub platforms: Option<Vec<Source>>,
    #[serde(default)]
    pub user_filters: Option<UserFilters>,
}

impl SearchRequest {
    pub fn new(query: &str) -> Self {
        SearchRequest {
            query: query.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub images: Vec<ImageCandidate>,
    pub intent: SearchIntent,
    pub suggestions: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct PlatformResponse {
    pub source: Source,
    pub images: Vec<ImageCandidate>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Query in, ranked mood-board candidates out.
pub struct SearchService {
    intent_source: Arc<dyn IntentSource>,
    orchestrator: Orchestrator,
    filter: RelevanceFilter,
    scorer: RelevanceScorer,
    default_platforms: Vec<Source>,
    per_platform_limit: usize,
    request_timeout: Duration,
    intent_timeout: Duration,
}

impl SearchService {
    pub fn new(
        intent_source: Arc<dyn IntentSource>,
        orchestrator: Orchestrator,
        filter: RelevanceFilter,
        scorer: RelevanceScorer,
        settings: &AggregationSettings,
        intent_settings: &IntentSettings,
    ) -> Self {
        let request_timeout = Duration::from_secs(settings.request_timeout_secs);
        let intent_timeout =
            Duration::from_secs(intent_settings.timeout_secs).min(request_timeout / 4);

        SearchService {
            intent_source,
            orchestrator,
            filter,
            scorer,
            default_platforms: settings.default_platforms.clone(),
            per_platform_limit: settings.per_platform_limit,
            request_timeout,
            intent_timeout,
        }
    }

    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidRequest("Query is required"));
        }

        let request_id = Uuid::new_v4();
        let deadline = Instant::now() + self.request_timeout;
        log::info!("[{}] New search: {}", request_id, query);

        // The language model gets its own budget so a stall leaves aggregation
        // most of the deadline.
        let parsed = self.intent_source.parse_intent(query);
        let intent = match time::timeout(self.intent_timeout, parsed).await {
            Ok(Ok(intent)) => intent,
            Ok(Err(e)) => {
                log::warn!("[{}] Intent parsing failed, using raw query: {}", request_id, e);
                SearchIntent::fallback(query)
            }
            Err(_) => {
                log::warn!("[{}] Intent parsing timed out, using raw query", request_id);
                SearchIntent::fallback(query)
            }
        };
        let intent = match &request.user_filters {
            Some(filters) => intent.merge(filters),
            None => intent,
        };

        let platforms = match request.platforms {
            Some(platforms) if !platforms.is_empty() => platforms,
            _ => self.default_platforms.clone(),
        };
        let mood: Vec<String> = intent.mood.iter().cloned().collect();

        let (candidates, suggestions) = tokio::join!(
            self.orchestrator.aggregate(
                intent.platform_query(query),
                &platforms,
                self.per_platform_limit,
                deadline
            ),
            self.suggestions(query, &mood, deadline.min(Instant::now() + self.intent_timeout)),
        );

        let aggregated = candidates.len();
        let filtered = self.filter.filter(candidates, &intent);
        let filtered_out = aggregated - filtered.len();
        let images = self.scorer.rank(filtered, &intent);
        log::info!(
            "[{}] {} aggregated, {} filtered out, {} returned",
            request_id,
            aggregated,
            filtered_out,
            images.len()
        );

        Ok(SearchResponse {
            total: images.len(),
            images,
            intent,
            suggestions,
        })
    }

    /// One platform, raw query, no intent or ranking. The platform's error is
    /// reported alongside an empty image list.
    pub async fn search_platform(
        &self,
        source: Source,
        query: &str,
        limit: Option<usize>,
    ) -> Result<PlatformResponse, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidRequest("Query is required"));
        }
        let limit = limit.unwrap_or(self.per_platform_limit).max(1);

        let (images, error) = match self.orchestrator.search_one(source, query, limit).await {
            Ok(images) => (images, None),
            Err(e) => (Vec::new(), Some(e.to_string())),
        };

        Ok(PlatformResponse {
            source,
            total: images.len(),
            images,
            error,
        })
    }

    async fn suggestions(&self, query: &str, mood: &[String], deadline: Instant) -> Vec<String> {
        match time::timeout_at(deadline, self.intent_source.suggestions(query, mood)).await {
            Ok(Ok(suggestions)) => suggestions,
            Ok(Err(e)) => {
                log::warn!("Suggestions unavailable: {}", e);
                Vec::new()
            }
            Err(_) => Vec::new(),
        }
    }
}


#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{testing::search_service, SearchRequest};
    use crate::{
        domain::{SearchIntent, Source, UserFilters},
        error::SearchError,
        services::{AdapterRegistry, Behaviour, FakeIntentSource, ScriptedAdapter},
    };

    fn registry() -> AdapterRegistry {
        AdapterRegistry::new()
            .register(ScriptedAdapter::new(
                Source::Pinterest,
                Behaviour::Returns(vec!["https://i.pinimg.com/736x/1.jpg"]),
            ))
            .register(ScriptedAdapter::new(
                Source::Arena,
                Behaviour::Returns(vec!["https://cdn.are.na/1.jpg", "https://cdn.are.na/2.jpg"]),
            ))
            .register(ScriptedAdapter::new(Source::Savee, Behaviour::Fails))
    }

    fn forest_intent() -> SearchIntent {
        SearchIntent {
            refined_query: "misty forest".to_string(),
            subjects: BTreeSet::from(["forest".to_string()]),
            mood: BTreeSet::from(["moody".to_string()]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn blank_query_is_rejected() {
        let service = search_service(registry(), FakeIntentSource::failing());

        let result = service.search(SearchRequest::new("   ")).await;

        assert!(matches!(result, Err(SearchError::InvalidRequest("Query is required"))));
    }

    #[tokio::test]
    async fn searches_default_platforms_with_refined_query() {
        let intent_source =
            FakeIntentSource::answering(forest_intent(), vec!["foggy pines".to_string()]);
        let service = search_service(registry(), intent_source);

        let response = service.search(SearchRequest::new("moody forest")).await.unwrap();

        assert_eq!(response.total, 3);
        assert_eq!(response.images.len(), 3);
        assert!(response.images.iter().all(|c| c.title == "misty forest"));
        assert!(response.images.iter().all(|c| c.relevance.is_some()));
        assert_eq!(response.intent.refined_query, "misty forest");
        assert_eq!(response.suggestions, vec!["foggy pines"]);
    }

    #[tokio::test]
    async fn failing_intent_source_falls_back_to_raw_query() {
        let service = search_service(registry(), FakeIntentSource::failing());
        let request = SearchRequest {
            query: " forest ".to_string(),
            platforms: Some(vec![Source::Arena, Source::Savee]),
            user_filters: None,
        };

        let response = service.search(request).await.unwrap();

        assert_eq!(response.intent, SearchIntent::fallback("forest"));
        assert_eq!(response.total, 2);
        assert!(response.images.iter().all(|c| c.source == Source::Arena));
        assert!(response.suggestions.is_empty());
    }

    #[tokio::test]
    async fn stalled_intent_source_leaves_time_for_aggregation() {
        let service = search_service(registry(), FakeIntentSource::stalled());
        let request = SearchRequest {
            query: "forest".to_string(),
            platforms: Some(vec![Source::Arena]),
            user_filters: None,
        };

        let started = std::time::Instant::now();
        let response = service.search(request).await.unwrap();

        // Request deadline is 3s, so intent parsing gets at most 750ms.
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
        assert_eq!(response.intent, SearchIntent::fallback("forest"));
        assert_eq!(response.total, 2);
        assert!(response.suggestions.is_empty());
    }

    #[tokio::test]
    async fn user_filters_are_merged_and_applied() {
        let service = search_service(registry(), FakeIntentSource::failing());
        let request = SearchRequest {
            query: "forest".to_string(),
            platforms: Some(vec![Source::Arena]),
            user_filters: Some(UserFilters {
                colors: BTreeSet::from(["green".to_string()]),
                negative_filters: BTreeSet::from(["Forest".to_string()]),
                ..Default::default()
            }),
        };

        let response = service.search(request).await.unwrap();

        assert_eq!(response.total, 0);
        assert!(response.intent.colors.contains("green"));
        assert!(response.intent.negative_filters.contains("Forest"));
    }

    #[tokio::test]
    async fn platform_search_reports_errors_without_failing() {
        let service = search_service(registry(), FakeIntentSource::failing());

        let ok = service
            .search_platform(Source::Arena, "forest", Some(1))
            .await
            .unwrap();
        assert_eq!(ok.total, 1);
        assert!(ok.error.is_none());

        let failed = service
            .search_platform(Source::Savee, "forest", None)
            .await
            .unwrap();
        assert_eq!(failed.total, 0);
        assert!(failed.error.unwrap().starts_with("[savee]"));
    }
}
