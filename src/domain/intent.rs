use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Structured reading of a free-text query, as produced by the intent source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchIntent {
    pub refined_query: String,
    pub mood: BTreeSet<String>,
    pub colors: BTreeSet<String>,
    pub style: BTreeSet<String>,
    pub subjects: BTreeSet<String>,
    pub negative_filters: BTreeSet<String>,
}

/// Filters picked directly by the caller. Same shape as the intent minus
/// subjects and the refined query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserFilters {
    pub mood: BTreeSet<String>,
    pub colors: BTreeSet<String>,
    pub style: BTreeSet<String>,
    pub negative_filters: BTreeSet<String>,
}

impl SearchIntent {
    /// Used whenever the intent source is unavailable or fails.
    pub fn fallback(query: &str) -> Self {
        let query = query.trim();
        SearchIntent {
            refined_query: query.to_string(),
            subjects: BTreeSet::from([query.to_string()]),
            ..Default::default()
        }
    }

    /// Per-field set union with the caller's filters.
    pub fn merge(mut self, filters: &UserFilters) -> Self {
        self.mood.extend(filters.mood.iter().cloned());
        self.colors.extend(filters.colors.iter().cloned());
        self.style.extend(filters.style.iter().cloned());
        self.negative_filters
            .extend(filters.negative_filters.iter().cloned());
        self.tidy()
    }

    /// Trims every term and drops blanks, so sets only hold usable terms.
    pub fn tidy(self) -> Self {
        SearchIntent {
            refined_query: self.refined_query.trim().to_string(),
            mood: tidy_terms(self.mood),
            colors: tidy_terms(self.colors),
            style: tidy_terms(self.style),
            subjects: tidy_terms(self.subjects),
            negative_filters: tidy_terms(self.negative_filters),
        }
    }

    /// The query handed to the platforms: refined when present, raw otherwise.
    pub fn platform_query<'a>(&'a self, raw_query: &'a str) -> &'a str {
        match self.refined_query.is_empty() {
            true => raw_query,
            false => &self.refined_query,
        }
    }
}

fn tidy_terms(terms: BTreeSet<String>) -> BTreeSet<String> {
    terms
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{SearchIntent, UserFilters};

    fn set(terms: &[&str]) -> BTreeSet<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn fallback_uses_query_as_subject() {
        let intent = SearchIntent::fallback("  foggy harbour ");

        assert_eq!(intent.refined_query, "foggy harbour");
        assert_eq!(intent.subjects, set(&["foggy harbour"]));
        assert!(intent.mood.is_empty());
        assert!(intent.negative_filters.is_empty());
    }

    #[test]
    fn merge_is_union_per_field() {
        let intent = SearchIntent {
            refined_query: "forest".to_string(),
            mood: set(&["moody"]),
            negative_filters: set(&["meme"]),
            ..Default::default()
        };
        let filters = UserFilters {
            mood: set(&["moody", "serene"]),
            colors: set(&["green"]),
            negative_filters: set(&["logo", " "]),
            ..Default::default()
        };

        let merged = intent.merge(&filters);

        assert_eq!(merged.mood, set(&["moody", "serene"]));
        assert_eq!(merged.colors, set(&["green"]));
        assert_eq!(merged.negative_filters, set(&["logo", "meme"]));
        assert_eq!(merged.refined_query, "forest");
    }

    #[test]
    fn deserializes_partial_llm_output() {
        let intent: SearchIntent = serde_json::from_str(
            r#"{"refinedQuery":"misty pine forest","subjects":["forest","forest"],"negativeFilters":["meme"]}"#,
        )
        .unwrap();

        assert_eq!(intent.subjects, set(&["forest"]));
        assert!(intent.colors.is_empty());
    }

    #[test]
    fn platform_query_prefers_refined() {
        let intent = SearchIntent::default();
        assert_eq!(intent.platform_query("raw"), "raw");

        let intent = SearchIntent::fallback("refined");
        assert_eq!(intent.platform_query("raw"), "refined");
    }
}
