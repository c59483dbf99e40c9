use std::str::FromStr;

use actix_web::{error, get, post, web, HttpResponse};
use serde::Deserialize;

use crate::{
    domain::Source,
    error::SearchError,
    services::{SearchRequest, SearchService},
};

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(Deserialize)]
struct PlatformQuery {
    q: Option<String>,
    limit: Option<usize>,
}

/// Malformed bodies get the same JSON error shape as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("Rejected search body: {}", err);
        error::Error::from(SearchError::InvalidRequest("Invalid search request"))
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        log::warn!("Rejected search query string: {}", err);
        error::Error::from(SearchError::InvalidRequest("Invalid search request"))
    })
}

#[post("")]
pub async fn search(
    service: web::Data<SearchService>,
    body: web::Json<SearchRequest>,
) -> Result<HttpResponse, SearchError> {
    run_search(service, body.into_inner()).await
}

#[get("")]
pub async fn search_by_query(
    service: web::Data<SearchService>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, SearchError> {
    let query = query.into_inner().q.unwrap_or_default();
    run_search(service, SearchRequest::new(&query)).await
}

#[get("/{platform}")]
pub async fn search_platform(
    service: web::Data<SearchService>,
    platform: web::Path<String>,
    query: web::Query<PlatformQuery>,
) -> Result<HttpResponse, SearchError> {
    let source = Source::from_str(&platform)
        .map_err(|_| SearchError::InvalidRequest("Unknown platform"))?;
    let PlatformQuery { q, limit } = query.into_inner();

    let response = service
        .search_platform(source, q.as_deref().unwrap_or_default(), limit)
        .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Runs the pipeline on its own task so a panic anywhere inside surfaces as a
/// generic 500 instead of a dropped connection.
async fn run_search(
    service: web::Data<SearchService>,
    request: SearchRequest,
) -> Result<HttpResponse, SearchError> {
    let service = service.into_inner();
    let response = tokio::spawn(async move { service.search(request).await })
        .await
        .map_err(|e| SearchError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(response))
}
