use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::domain::Source;

/// Why a single platform contributed nothing to a run.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("[{0}] not configured: missing credentials")]
    NotConfigured(Source),

    #[error("[{platform}] fetch failed: {message}")]
    Fetch { platform: Source, message: String },

    #[error("[{0}] timed out")]
    Timeout(Source),

    #[error("[{platform}] browser session failed: {error}")]
    Session { platform: Source, error: SessionError },
}

impl SourceError {
    pub fn fetch(platform: Source, message: impl ToString) -> Self {
        SourceError::Fetch {
            platform,
            message: message.to_string(),
        }
    }

    pub fn session(platform: Source, error: SessionError) -> Self {
        SourceError::Session { platform, error }
    }

    pub fn platform(&self) -> Source {
        match self {
            SourceError::NotConfigured(s) | SourceError::Timeout(s) => *s,
            SourceError::Fetch { platform, .. } | SourceError::Session { platform, .. } => *platform,
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("could not launch browser: {0}")]
    Launch(String),

    #[error("browser disconnected")]
    Disconnected,

    #[error("no element matches {0}")]
    SelectorNotFound(String),

    #[error("login did not complete within {0} seconds")]
    LoginTimeout(u64),

    #[error("webdriver error: {0}")]
    Driver(String),
}

impl From<thirtyfour::error::WebDriverError> for SessionError {
    fn from(e: thirtyfour::error::WebDriverError) -> Self {
        SessionError::Driver(e.to_string())
    }
}

/// Failures of the language-model collaborator. Never reaches the caller.
#[derive(Error, Debug)]
pub enum IntentError {
    #[error("language model not configured")]
    NotConfigured,

    #[error("language model request failed: {0}")]
    Request(#[from] async_openai::error::OpenAIError),

    #[error("language model returned no content")]
    EmptyResponse,

    #[error("could not decode language model output: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The only error a search caller ever sees.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("{0}")]
    InvalidRequest(&'static str),

    #[error("search pipeline failed: {0}")]
    Internal(String),
}

impl ResponseError for SearchError {
    fn status_code(&self) -> StatusCode {
        match self {
            SearchError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            SearchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            SearchError::InvalidRequest(message) => *message,
            SearchError::Internal(detail) => {
                log::error!("Search error: {}", detail);
                "Search failed. Please try again."
            }
        };

        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{body::to_bytes, ResponseError};

    use super::{SearchError, SourceError};
    use crate::domain::Source;

    #[test]
    fn source_errors_are_tagged_with_platform() {
        let e = SourceError::NotConfigured(Source::Pinterest);
        assert_eq!(e.to_string(), "[pinterest] not configured: missing credentials");

        let e = SourceError::fetch(Source::Arena, "status 502");
        assert_eq!(e.platform(), Source::Arena);
        assert!(e.to_string().starts_with("[arena]"));
    }

    #[actix_web::test]
    async fn internal_error_hides_detail() {
        let response = SearchError::Internal("token=abc leaked".to_string()).error_response();
        assert_eq!(response.status().as_u16(), 500);

        let body = to_bytes(response.into_body()).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Search failed. Please try again."));
        assert!(!body.contains("token"));
    }
}
