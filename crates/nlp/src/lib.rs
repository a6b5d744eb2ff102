//! Text normalization and the two deterministic intent tiers (keyword,
//! similarity) that run before the LLM tier in `reserva-llm`.

pub mod edit_distance;
pub mod entities;
pub mod error;
pub mod keyword;
pub mod normalizer;
pub mod product_matcher;
pub mod similarity;

pub use entities::{Entity, EntityExtractor, EntityType};
pub use error::NlpError;
pub use keyword::{IntentCandidate, KeywordDetector, TierOneOutcome};
pub use normalizer::{Correction, NormalizedText, TextNormalizer};
pub use product_matcher::{match_products, ProductMatch};
pub use similarity::{SimilarityCandidate, SimilarityMatcher, TierTwoOutcome};
