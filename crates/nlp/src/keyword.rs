//! Keyword Detector (component C, Tier 1): scores candidate intents from
//! weighted keyword matches against a tenant's intentions plus the global
//! system keyword table.

use reserva_core::domain::{IntentLabel, Intention, MatchMode, ServiceKeyword, SystemKeyword};

#[derive(Debug, Clone)]
pub struct IntentCandidate {
    pub label: IntentLabel,
    pub score: f32,
    pub priority: i32,
}

#[derive(Debug, Clone)]
pub enum TierOneOutcome {
    Decided(IntentCandidate),
    Undecided(Vec<IntentCandidate>),
}

const ACCEPT_THRESHOLD: f32 = 0.85;
const MARGIN_THRESHOLD: f32 = 0.1;

fn token_matches(token: &str, word: &str, mode: MatchMode) -> bool {
    match mode {
        MatchMode::Exact => token == word,
        MatchMode::Contains => token.contains(word),
    }
}

pub struct KeywordDetector;

impl Default for KeywordDetector {
    fn default() -> Self {
        Self
    }
}

impl KeywordDetector {
    pub fn new() -> Self {
        Self
    }

    /// `normalized` is the Text Normalizer's output. Intentions and system
    /// keywords are assumed already cached in memory by the caller.
    pub fn detect(
        &self,
        normalized: &str,
        intentions: &[Intention],
        system_keywords: &[SystemKeyword],
    ) -> TierOneOutcome {
        let tokens: Vec<&str> = normalized.split_whitespace().collect();

        let mut scores: Vec<IntentCandidate> = intentions
            .iter()
            .map(|intent| {
                let score = intent
                    .patterns
                    .iter()
                    .flat_map(|p| {
                        tokens
                            .iter()
                            .filter(move |t| t.contains(p.word.as_str()))
                            .map(move |_| p.weight)
                    })
                    .fold(0.0_f32, f32::max);
                IntentCandidate {
                    label: intent.label,
                    score,
                    priority: intent.priority,
                }
            })
            .collect();

        for kw in system_keywords {
            let matched = tokens.iter().any(|t| token_matches(t, &kw.word, kw.match_mode));
            if !matched {
                continue;
            }
            if let Some(existing) = scores.iter_mut().find(|c| c.label == kw.category) {
                existing.score = existing.score.max(kw.weight);
            } else {
                scores.push(IntentCandidate {
                    label: kw.category,
                    score: kw.weight,
                    priority: 0,
                });
            }
        }

        scores.retain(|c| c.score > 0.0);
        scores.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap()
                .then(b.priority.cmp(&a.priority))
        });

        match scores.as_slice() {
            [] => TierOneOutcome::Undecided(Vec::new()),
            [top] if top.score >= ACCEPT_THRESHOLD => {
                TierOneOutcome::Decided(top.clone())
            }
            [top, second, ..]
                if top.score >= ACCEPT_THRESHOLD && top.score - second.score >= MARGIN_THRESHOLD =>
            {
                TierOneOutcome::Decided(top.clone())
            }
            _ => TierOneOutcome::Undecided(scores),
        }
    }

    /// Scores every `ServiceKeyword` against the normalized message and
    /// returns the best-weighted match's service key, if any. Runs
    /// independently of `detect()`/intent tier, so a tenant's service
    /// selection no longer depends on the LLM tier being called. `Contains`
    /// entries are matched against the whole normalized string rather than
    /// per-token, since a keyword phrase ("quiero una mesa") can span more
    /// than one token.
    pub fn detect_service(
        &self,
        normalized: &str,
        service_keywords: &[&ServiceKeyword],
    ) -> Option<(String, f32)> {
        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        service_keywords
            .iter()
            .filter(|kw| match kw.match_mode {
                MatchMode::Exact => tokens.iter().any(|t| *t == kw.word),
                MatchMode::Contains => normalized.contains(kw.word.as_str()),
            })
            .max_by(|a, b| a.weight.partial_cmp(&b.weight).unwrap())
            .map(|kw| (kw.service_key.clone(), kw.weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reserva_core::domain::KeywordPattern;
    use uuid::Uuid;

    fn intention(label: IntentLabel, word: &str, weight: f32, priority: i32) -> Intention {
        Intention {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            label,
            priority,
            patterns: vec![KeywordPattern {
                word: word.to_string(),
                weight,
            }],
            examples: vec![],
        }
    }

    #[test]
    fn decides_on_unambiguous_high_score() {
        let detector = KeywordDetector::new();
        let intentions = vec![intention(IntentLabel::Reservar, "reservar", 0.95, 0)];
        match detector.detect("quiero reservar una mesa", &intentions, &[]) {
            TierOneOutcome::Decided(c) => assert_eq!(c.label, IntentLabel::Reservar),
            TierOneOutcome::Undecided(_) => panic!("expected a decision"),
        }
    }

    #[test]
    fn undecided_on_close_scores() {
        let detector = KeywordDetector::new();
        let intentions = vec![
            intention(IntentLabel::Reservar, "cita", 0.9, 0),
            intention(IntentLabel::Consultar, "cita", 0.88, 0),
        ];
        match detector.detect("quiero una cita", &intentions, &[]) {
            TierOneOutcome::Undecided(cands) => assert_eq!(cands.len(), 2),
            TierOneOutcome::Decided(_) => panic!("expected undecided due to margin"),
        }
    }

    fn service_keyword(word: &str, service_key: &str, weight: f32, mode: MatchMode) -> ServiceKeyword {
        ServiceKeyword {
            word: word.to_string(),
            service_key: service_key.to_string(),
            company_id: None,
            weight,
            match_mode: mode,
        }
    }

    #[test]
    fn detects_service_from_contains_keyword() {
        let detector = KeywordDetector::new();
        let mesa = service_keyword("mesa", "table", 1.0, MatchMode::Contains);
        let corte = service_keyword("corte", "haircut", 1.0, MatchMode::Contains);
        let keywords = vec![&mesa, &corte];
        let (service_key, _) = detector
            .detect_service("quiero reservar una mesa para 4", &keywords)
            .expect("expected a service match");
        assert_eq!(service_key, "table");
    }

    #[test]
    fn detect_service_prefers_higher_weight_on_multiple_matches() {
        let detector = KeywordDetector::new();
        let weak = service_keyword("cita", "appointment", 0.5, MatchMode::Contains);
        let strong = service_keyword("corte", "haircut", 1.0, MatchMode::Contains);
        let keywords = vec![&weak, &strong];
        let (service_key, _) = detector
            .detect_service("quiero una cita para un corte", &keywords)
            .expect("expected a service match");
        assert_eq!(service_key, "haircut");
    }

    #[test]
    fn detect_service_returns_none_without_a_match() {
        let detector = KeywordDetector::new();
        let mesa = service_keyword("mesa", "table", 1.0, MatchMode::Contains);
        let keywords = vec![&mesa];
        assert!(detector.detect_service("cuanto cuesta el servicio", &keywords).is_none());
    }
}
