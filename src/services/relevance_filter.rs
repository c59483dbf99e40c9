use regex::RegexSet;

use crate::{
    configuration::RelevanceSettings,
    domain::{ImageCandidate, SearchIntent},
};

/// Drops candidates that look like articles, screenshots, social posts or
/// anything else the intent excluded.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    denylist: Vec<String>,
    url_blocklist: RegexSet,
    max_title_length: usize,
}

impl RelevanceFilter {
    pub fn new(settings: &RelevanceSettings) -> Result<Self, regex::Error> {
        Ok(RelevanceFilter {
            denylist: lowercase_terms(settings.denylist_terms.iter()),
            url_blocklist: RegexSet::new(&settings.url_blocklist)?,
            max_title_length: settings.max_title_length,
        })
    }

    /// Keeps the survivors in their original order.
    pub fn filter(
        &self,
        candidates: Vec<ImageCandidate>,
        intent: &SearchIntent,
    ) -> Vec<ImageCandidate> {
        let negative_filters = lowercase_terms(intent.negative_filters.iter());

        candidates
            .into_iter()
            .filter(|candidate| self.keeps(candidate, &negative_filters))
            .collect()
    }

    fn keeps(&self, candidate: &ImageCandidate, negative_filters: &[String]) -> bool {
        if candidate.title.chars().count() > self.max_title_length {
            return false;
        }

        let text = candidate.text().to_lowercase();
        let excluded = |term: &String| text.contains(term.as_str());
        if negative_filters.iter().any(excluded) || self.denylist.iter().any(excluded) {
            return false;
        }

        !self.url_blocklist.is_match(&candidate.url_text())
    }
}

fn lowercase_terms<'a>(terms: impl Iterator<Item = &'a String>) -> Vec<String> {
    terms
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
