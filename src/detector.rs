//! Lexical ambiguity detection over raw query text

use crate::types::{AmbiguityFactor, DetectionResult};
use regex::Regex;
use std::collections::HashSet;

/// Generic vague terms suggesting missing decision criteria
const VAGUE_TERMS: &[&str] = &["best", "cheapest", "fastest", "quickest", "ideal", "perfect"];

/// Keyword-rule ambiguity detector. All patterns are compiled once at
/// construction; `detect` is pure and deterministic.
pub struct Detector {
    pronoun: Regex,
    anchor_noun: Regex,
    summarize: Regex,
    audience_phrase: Regex,
    length_phrase: Regex,
    language_target: Regex,
    recommend: Regex,
    region_token: Regex,
}

impl Detector {
    pub fn new() -> Self {
        Self {
            pronoun: Regex::new(r"\b(this|that|these|those|it|they)\b").unwrap(),
            anchor_noun: Regex::new(r"\b(file|document|text|paragraph|image|content|paper)\b")
                .unwrap(),
            summarize: Regex::new(r"\bsummar(ize|ise|y)\b").unwrap(),
            audience_phrase: Regex::new(r"for\s+(kids|children|adults|experts|beginners)")
                .unwrap(),
            length_phrase: Regex::new(r"\b(short|brief|medium|long|~?\d+ words?)\b").unwrap(),
            language_target: Regex::new(r"to\s+[a-z]+|into\s+[a-z]+").unwrap(),
            recommend: Regex::new(r"\b(recommend|best|suggest)\b").unwrap(),
            region_token: Regex::new(r"\b(india|usa|us|europe|eu|uk|canada)\b").unwrap(),
        }
    }

    /// Evaluate every rule in fixed order and produce the verdict.
    ///
    /// An empty query short-circuits to a maximally ambiguous result; it is
    /// a normal input, not a validation failure.
    pub fn detect(&self, query: &str) -> DetectionResult {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return DetectionResult {
                ambiguous: true,
                score: 1.0,
                factors: vec![AmbiguityFactor::EmptyQuery],
            };
        }

        let mut factors = Vec::new();

        // Criteria missing if a vague or superlative term is present
        if VAGUE_TERMS.iter().any(|term| q.contains(term)) {
            factors.push(AmbiguityFactor::CriteriaMissing);
        }

        // Referent missing if a pronoun appears without an anchoring noun
        if self.pronoun.is_match(&q) && !self.anchor_noun.is_match(&q) {
            factors.push(AmbiguityFactor::ReferentMissing);
        }

        // Summarization tasks need an audience and a length; both checks
        // are independent and may fire together
        if self.summarize.is_match(&q) {
            if !self.audience_phrase.is_match(&q) {
                factors.push(AmbiguityFactor::AudienceMissing);
            }
            if !self.length_phrase.is_match(&q) {
                factors.push(AmbiguityFactor::LengthMissing);
            }
        }

        // Translation tasks need a target language
        if q.contains("translate") && !self.language_target.is_match(&q) {
            factors.push(AmbiguityFactor::LanguageMissing);
        }

        // Recommendations need a region
        if self.recommend.is_match(&q) && !self.region_token.is_match(&q) {
            factors.push(AmbiguityFactor::RegionMissing);
        }

        let mut seen = HashSet::new();
        factors.retain(|f| seen.insert(*f));

        let ambiguous = !factors.is_empty();
        let score = if ambiguous {
            round2((0.3 + 0.2 * factors.len() as f64).min(1.0))
        } else {
            0.0
        };

        DetectionResult {
            ambiguous,
            score,
            factors,
        }
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
