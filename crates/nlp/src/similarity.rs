//! Similarity Matcher (component D, Tier 2): composite Jaccard + normalized
//! edit-distance similarity against each tenant intent's example corpus.

use crate::edit_distance::levenshtein_distance;
use reserva_core::domain::{IntentLabel, Intention};
use std::collections::HashSet;

const ACCEPT_THRESHOLD: f32 = 0.70;

fn tokenize(text: &str) -> HashSet<&str> {
    text.split_whitespace().collect()
}

fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count().max(1);
    intersection as f32 / union as f32
}

fn edit_similarity(a: &str, b: &str) -> f32 {
    let max_len = a.chars().count().max(b.chars().count()).max(1);
    1.0 - (levenshtein_distance(a, b) as f32 / max_len as f32)
}

#[derive(Debug, Clone)]
pub struct SimilarityCandidate {
    pub label: IntentLabel,
    pub score: f32,
    pub priority: i32,
    pub matched_example: Option<String>,
}

#[derive(Debug, Clone)]
pub enum TierTwoOutcome {
    Decided(SimilarityCandidate),
    /// Below `ACCEPT_THRESHOLD`, but still carries the best-scoring
    /// candidate found (if any intent had examples to compare against) so
    /// a Tier 3 failure/rejection has something to fall back to.
    Undecided(Option<SimilarityCandidate>),
}

pub struct SimilarityMatcher;

impl Default for SimilarityMatcher {
    fn default() -> Self {
        Self
    }
}

impl SimilarityMatcher {
    pub fn new() -> Self {
        Self
    }

    /// `tier_one_score`, if present, is averaged with the composite
    /// similarity score per the per-intent best-example rule.
    pub fn detect(
        &self,
        normalized: &str,
        intentions: &[Intention],
        tier_one_score: Option<f32>,
    ) -> TierTwoOutcome {
        let message_tokens = tokenize(normalized);

        let mut best: Option<SimilarityCandidate> = None;

        for intent in intentions {
            let mut best_for_intent: Option<(f32, &str)> = None;
            for example in &intent.examples {
                let example_tokens = tokenize(example);
                let composite =
                    jaccard(&message_tokens, &example_tokens) + edit_similarity(normalized, example);
                let composite = composite / 2.0;
                if best_for_intent.map(|(s, _)| composite > s).unwrap_or(true) {
                    best_for_intent = Some((composite, example.as_str()));
                }
            }

            let Some((mut score, example)) = best_for_intent else {
                continue;
            };
            if let Some(t1) = tier_one_score {
                score = (score + t1) / 2.0;
            }

            let candidate = SimilarityCandidate {
                label: intent.label,
                score,
                priority: intent.priority,
                matched_example: Some(example.to_string()),
            };

            best = match best {
                Some(b) if b.score > candidate.score => Some(b),
                Some(b) if b.score == candidate.score && b.priority >= candidate.priority => Some(b),
                _ => Some(candidate),
            };
        }

        match best {
            Some(c) if c.score >= ACCEPT_THRESHOLD => TierTwoOutcome::Decided(c),
            other => TierTwoOutcome::Undecided(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn intention(label: IntentLabel, examples: &[&str]) -> Intention {
        Intention {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            label,
            priority: 0,
            patterns: vec![],
            examples: examples.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn decides_on_close_example_match() {
        let matcher = SimilarityMatcher::new();
        let intentions = vec![intention(
            IntentLabel::Reservar,
            &["quiero reservar una mesa para mañana"],
        )];
        match matcher.detect("quiero reservar una mesa para hoy", &intentions, None) {
            TierTwoOutcome::Decided(c) => assert_eq!(c.label, IntentLabel::Reservar),
            TierTwoOutcome::Undecided(_) => panic!("expected a decision"),
        }
    }

    #[test]
    fn undecided_on_dissimilar_message_still_carries_best_candidate() {
        let matcher = SimilarityMatcher::new();
        let intentions = vec![intention(IntentLabel::Reservar, &["quiero reservar una mesa"])];
        match matcher.detect("el clima esta agradable hoy", &intentions, None) {
            TierTwoOutcome::Undecided(candidate) => {
                assert_eq!(candidate.unwrap().label, IntentLabel::Reservar);
            }
            TierTwoOutcome::Decided(_) => panic!("expected undecided"),
        }
    }
}
