//! Text Normalizer (component A): lowercase, strip diacritics, correct
//! typos, canonicalize synonyms, and fuzzy-correct out-of-vocabulary
//! tokens. Pure modulo the learned-correction cache.

use crate::edit_distance::{find_closest_match, max_distance_for};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// A correction applied while normalizing one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub original: String,
    pub corrected: String,
    pub confidence: f32,
}

#[derive(Debug, Clone)]
pub struct NormalizedText {
    pub text: String,
    pub corrections: Vec<Correction>,
}

/// Static table of colloquial single-word typos -> canonical forms.
static TYPO_DICTIONARY: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("qero", "quiero"),
        ("kiero", "quiero"),
        ("reserbar", "reservar"),
        ("rreservar", "reservar"),
        ("resevar", "reservar"),
        ("oi", "hoy"),
        ("manana", "mañana"),
        ("mañna", "mañana"),
        ("xq", "porque"),
        ("q", "que"),
        ("tmb", "también"),
        ("tb", "también"),
        ("pa", "para"),
        ("pq", "porque"),
        ("dl", "del"),
        ("d", "de"),
        ("cuantoas", "cuantas"),
        ("personaa", "personas"),
        ("gracas", "gracias"),
        ("grax", "gracias"),
        ("cancela", "cancelar"),
        ("cancleacion", "cancelación"),
        ("domicili", "domicilio"),
        ("horaro", "horario"),
        ("horarios", "horario"),
        ("direcion", "dirección"),
        ("numro", "numero"),
        ("tlf", "telefono"),
        ("cel", "telefono"),
        ("whatsap", "whatsapp"),
    ]
    .into_iter()
    .collect()
});

/// Multi-word typo replacements, applied before tokenization so a phrase
/// like "a las" isn't later split into correctable single tokens.
static PHRASE_DICTIONARY: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("para oy", "para hoy"),
        ("pa mañana", "para mañana"),
        ("kiero reservar", "quiero reservar"),
        ("qero reservar", "quiero reservar"),
    ]
});

/// Synonym groups: every member maps to the group's first entry (the
/// canonical representative).
static SYNONYM_GROUPS: Lazy<Vec<Vec<&'static str>>> = Lazy::new(|| {
    vec![
        vec!["reservar", "agendar", "apartar", "separar"],
        vec!["domicilio", "delivery", "envio", "envío"],
        vec!["mesa", "mesita"],
        vec!["cita", "turno", "consulta"],
        vec!["cancelar", "anular"],
        vec!["hola", "buenas", "buenos dias", "buenas tardes", "buenas noches"],
        vec!["pizza", "pizzas"],
        vec!["gracias", "muchas gracias", "mil gracias"],
    ]
});

fn synonym_canonical(token: &str) -> Option<&'static str> {
    SYNONYM_GROUPS
        .iter()
        .find(|group| group.contains(&token))
        .map(|group| group[0])
}

/// NFD-decomposes then drops combining marks (Unicode category Mn), except
/// `ñ`'s combining tilde: it is phonemically distinct in Spanish and
/// participates in vocabulary matches ("mañana"), so `n` + U+0303 is
/// recomposed back into `ñ` instead of being stripped like other accents.
fn strip_diacritics(s: &str) -> String {
    const COMBINING_TILDE: char = '\u{0303}';
    let mut out = String::with_capacity(s.len());
    let mut chars = s.nfd().peekable();
    while let Some(c) = chars.next() {
        if c == 'n' && chars.peek() == Some(&COMBINING_TILDE) {
            chars.next();
            out.push('ñ');
            continue;
        }
        if is_combining_mark(c) {
            continue;
        }
        out.push(c);
    }
    out
}

fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036f}')
}

pub struct TextNormalizer {
    vocabulary: RwLock<Vec<String>>,
    learned_corrections: RwLock<HashMap<String, String>>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self {
            vocabulary: RwLock::new(Vec::new()),
            learned_corrections: RwLock::new(HashMap::new()),
        }
    }

    /// Seeds the fuzzy-match vocabulary with tenant/system keywords loaded
    /// at startup, in addition to the static typo dictionary's targets.
    pub fn with_vocabulary(vocabulary: impl IntoIterator<Item = String>) -> Self {
        let normalizer = Self::new();
        normalizer.extend_vocabulary(vocabulary);
        normalizer
    }

    pub fn extend_vocabulary(&self, words: impl IntoIterator<Item = String>) {
        let mut v = self.vocabulary.write();
        for w in words {
            if !v.contains(&w) {
                v.push(w);
            }
        }
    }

    pub fn normalize(&self, input: &str) -> NormalizedText {
        let mut corrections = Vec::new();

        // 1. lowercase + strip diacritics
        let mut text = strip_diacritics(&input.to_lowercase());

        // 2. phrase-level typo table (before tokenization)
        for (bad, good) in PHRASE_DICTIONARY.iter() {
            if text.contains(bad) {
                text = text.replace(bad, good);
                corrections.push(Correction {
                    original: (*bad).to_string(),
                    corrected: (*good).to_string(),
                    confidence: 1.0,
                });
            }
        }

        // 3 & 4 & 5: token-wise typo/synonym/fuzzy correction
        let tokens: Vec<String> = text
            .split_whitespace()
            .map(|tok| self.correct_token(tok, &mut corrections))
            .collect();

        NormalizedText {
            text: tokens.join(" "),
            corrections,
        }
    }

    fn correct_token(&self, token: &str, corrections: &mut Vec<Correction>) -> String {
        if let Some(cached) = self.learned_corrections.read().get(token) {
            if cached != token {
                corrections.push(Correction {
                    original: token.to_string(),
                    corrected: cached.clone(),
                    confidence: 1.0,
                });
            }
            return cached.clone();
        }

        // static single-word typo dictionary
        if let Some(canon) = TYPO_DICTIONARY.get(token) {
            corrections.push(Correction {
                original: token.to_string(),
                corrected: (*canon).to_string(),
                confidence: 1.0,
            });
            return (*canon).to_string();
        }

        // synonym canonicalization
        if let Some(canon) = synonym_canonical(token) {
            if canon != token {
                corrections.push(Correction {
                    original: token.to_string(),
                    corrected: canon.to_string(),
                    confidence: 1.0,
                });
            }
            return canon.to_string();
        }

        // fuzzy correction against the loaded vocabulary, tokens length >= 4 only
        if token.chars().count() >= 4 {
            let vocab = self.vocabulary.read();
            let max_dist = max_distance_for(token.chars().count());
            if let Some(m) = find_closest_match(token, vocab.iter().map(String::as_str), max_dist) {
                if m.confidence >= 0.7 && m.candidate != token {
                    corrections.push(Correction {
                        original: token.to_string(),
                        corrected: m.candidate.clone(),
                        confidence: m.confidence,
                    });
                    self.learned_corrections
                        .write()
                        .insert(token.to_string(), m.candidate.clone());
                    return m.candidate;
                }
            }
        }

        token.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_diacritics() {
        let n = TextNormalizer::new();
        let out = n.normalize("QUIERO RESERVAR PARA MAÑANA");
        assert!(out.text.contains("mañana"));
        assert!(!out.text.chars().any(|c| c.is_uppercase()));
    }

    #[test]
    fn corrects_static_typos() {
        let n = TextNormalizer::new();
        let out = n.normalize("qero reservar una mesa");
        assert!(out.text.starts_with("quiero reservar"));
    }

    #[test]
    fn canonicalizes_synonyms() {
        let n = TextNormalizer::new();
        let out = n.normalize("quiero agendar un domicilio");
        assert!(out.text.contains("reservar"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let n = TextNormalizer::new();
        let once = n.normalize("Quiero Reservar Mañana").text;
        let twice = n.normalize(&once).text;
        assert_eq!(once, twice);
    }

    #[test]
    fn fuzzy_correction_respects_confidence_floor() {
        let n = TextNormalizer::with_vocabulary(["reservar".to_string()]);
        let out = n.normalize("reservr");
        assert_eq!(out.text, "reservar");
    }
}
