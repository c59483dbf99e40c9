use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::{
    configuration::ArenaSettings,
    domain::{ArenaSearchResponse, RawRecord, Source},
    error::SourceError,
};

use super::SourceAdapter;

#[derive(Serialize)]
struct ArenaQuery<'a> {
    q: &'a str,
    per: u32,
}

/// Are.na public search API. No authentication needed for public blocks.
pub struct ArenaAdapter {
    client: Client,
    url: String,
    page_size: u32,
}

impl ArenaAdapter {
    pub fn new(settings: &ArenaSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(ArenaAdapter {
            client,
            url: format!("{}/v2/search", settings.base_url.trim_end_matches('/')),
            page_size: settings.page_size,
        })
    }
}

#[async_trait]
impl SourceAdapter for ArenaAdapter {
    fn source(&self) -> Source {
        Source::Arena
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawRecord>, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .query(&ArenaQuery {
                q: query,
                per: self.page_size,
            })
            .send()
            .await
            .map_err(|e| SourceError::fetch(Source::Arena, e))?;

        if !response.status().is_success() {
            return Err(SourceError::fetch(
                Source::Arena,
                format!("Are.na API error: {}", response.status()),
            ));
        }

        let body = response
            .json::<ArenaSearchResponse>()
            .await
            .map_err(|e| SourceError::fetch(Source::Arena, e))?;

        Ok(body
            .blocks
            .into_iter()
            .filter(|block| block.image_url().is_some())
            .take(limit)
            .map(RawRecord::Arena)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::ArenaAdapter;
    use crate::{
        configuration::ArenaSettings,
        domain::RawRecord,
        error::SourceError,
        services::SourceAdapter,
    };

    fn adapter(server: &MockServer) -> ArenaAdapter {
        ArenaAdapter::new(&ArenaSettings {
            base_url: server.uri(),
            page_size: 100,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn keeps_only_image_blocks_up_to_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/search"))
            .and(query_param("q", "misty forest"))
            .and(query_param("per", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "blocks": [
                    {"id": 1, "title": "text block"},
                    {"id": 2, "title": "fog", "image": {"display": {"url": "https://d2w9rnfcy7mm78.cloudfront.net/2/display.jpg"}}},
                    {"id": 3, "title": "pines", "image": {"original": {"url": "https://d2w9rnfcy7mm78.cloudfront.net/3/original.jpg"}}},
                    {"id": 4, "title": "moss", "image": {"display": {"url": "https://d2w9rnfcy7mm78.cloudfront.net/4/display.jpg"}}}
                ]
            })))
            .mount(&server)
            .await;

        let records = adapter(&server).search("misty forest", 2).await.unwrap();

        let ids: Vec<u64> = records
            .iter()
            .map(|r| match r {
                RawRecord::Arena(block) => block.id,
                RawRecord::Scraped(_) => 0,
            })
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn http_error_is_a_tagged_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = adapter(&server).search("forest", 10).await;

        match result {
            Err(SourceError::Fetch { message, .. }) => assert!(message.contains("503")),
            other => panic!("expected fetch error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let result = adapter(&server).search("forest", 10).await;

        assert!(matches!(result, Err(SourceError::Fetch { .. })));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_error() {
        let adapter = ArenaAdapter::new(&ArenaSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            page_size: 100,
        })
        .unwrap();

        let result = adapter.search("forest", 10).await;

        assert!(matches!(result, Err(SourceError::Fetch { .. })));
    }
}
