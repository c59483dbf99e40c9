use serde::{Deserialize, Serialize};

use super::source::Source;

/// Canonical record every adapter's output is normalized into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCandidate {
    pub id: String,
    pub url: String,
    pub thumbnail_url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: Source,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f64>,
}

impl ImageCandidate {
    /// Title and description, the text that keyword filtering and scoring read.
    pub fn text(&self) -> String {
        match &self.description {
            Some(description) => format!("{} {}", self.title, description),
            None => self.title.clone(),
        }
    }

    /// Image URL followed by the origin page URL, matched by the URL blocklist.
    pub fn url_text(&self) -> String {
        format!("{} {}", self.url, self.source_url)
    }
}
