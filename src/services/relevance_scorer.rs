use std::cmp::Ordering;

use crate::{
    configuration::{RelevanceSettings, ScoringWeights},
    domain::{ImageCandidate, SearchIntent},
};

/// Scores candidate text against the intent and ranks candidates.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    weights: ScoringWeights,
    min_score: f64,
    min_text_length: usize,
}

impl RelevanceScorer {
    pub fn new(settings: &RelevanceSettings) -> Self {
        RelevanceScorer {
            weights: settings.weights.clone(),
            min_score: settings.min_score,
            min_text_length: settings.min_text_length,
        }
    }

    /// Relevance of `text` to `intent`, in [0, 1]. Pure and deterministic.
    pub fn score(&self, text: &str, intent: &SearchIntent) -> f64 {
        let w = &self.weights;
        let text = text.trim().to_lowercase();

        // Sparse metadata: the platform's own search already judged relevance.
        if text.chars().count() < self.min_text_length {
            return w.sparse_text_score;
        }

        let mut score = w.base;
        let mut positive_match = false;
        let mut reward = |hit: bool, weight: f64, score: &mut f64| {
            if hit {
                *score += weight;
                positive_match = true;
            }
        };

        for word in intent.refined_query.to_lowercase().split_whitespace() {
            reward(word.chars().count() > 2 && text.contains(word), w.query_term, &mut score);
        }

        for subject in &intent.subjects {
            let subject = subject.to_lowercase();
            reward(text.contains(&subject), w.subject_phrase, &mut score);
            for word in subject.split_whitespace() {
                reward(word.chars().count() > 3 && text.contains(word), w.subject_word, &mut score);
            }
        }

        for (terms, weight) in [
            (&intent.mood, w.mood),
            (&intent.style, w.style),
            (&intent.colors, w.color),
        ] {
            for term in terms {
                reward(text.contains(&term.to_lowercase()), weight, &mut score);
            }
        }

        for filter in &intent.negative_filters {
            if text.contains(&filter.to_lowercase()) {
                score -= w.negative_filter_penalty;
            }
        }
        for term in &w.irrelevant_terms {
            if text.contains(term.as_str()) {
                score -= w.irrelevant_term_penalty;
            }
        }
        for term in &w.photo_terms {
            if text.contains(term.as_str()) {
                score += w.photo_term_bonus;
            }
        }

        if !positive_match && score >= w.no_match_floor {
            score = w.no_match_score;
        }

        score.clamp(0.0, 1.0)
    }

    /// Scores every candidate, drops those under the cutoff and sorts the rest
    /// by descending relevance. Ties keep their incoming order.
    pub fn rank(
        &self,
        candidates: Vec<ImageCandidate>,
        intent: &SearchIntent,
    ) -> Vec<ImageCandidate> {
        let mut ranked: Vec<ImageCandidate> = candidates
            .into_iter()
            .map(|mut candidate| {
                candidate.relevance = Some(self.score(&candidate.text(), intent));
                candidate
            })
            .filter(|candidate| candidate.relevance.unwrap_or_default() >= self.min_score)
            .collect();

        ranked.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(Ordering::Equal)
        });

        ranked
    }
}
