//! Intent construction and prompt rendering

use crate::types::{Intent, Resolution, RiskTier, TaskType};
use regex::Regex;
use std::collections::HashMap;

/// Typed merge slots. Each slot names its canonical preference key plus
/// any legacy positional alias kept for clients that key answers by
/// question order (q1 = criteria, q2 = region, q3 = language).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Criteria,
    Region,
    Audience,
    Length,
    Language,
}

impl Slot {
    /// Lookup keys in precedence order: canonical first, then legacy alias
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            Slot::Criteria => &["criteria", "q1"],
            Slot::Region => &["region", "q2"],
            Slot::Audience => &["audience"],
            Slot::Length => &["length"],
            Slot::Language => &["language", "q3"],
        }
    }

    fn lookup<'a>(self, merged: &'a HashMap<String, String>) -> Option<&'a str> {
        self.keys()
            .iter()
            .find_map(|key| merged.get(*key).map(String::as_str))
    }
}

/// Domain keywords that mark a query as high risk. Risk derives from the
/// query text alone, never from answers.
const HIGH_RISK_KEYWORDS: &[&str] = &["medical", "finance", "legal"];

/// Builds a structured intent and rendered prompt from the query, the
/// caller's answers, and remembered preferences
pub struct Resolver {
    summarize: Regex,
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            summarize: Regex::new(r"\bsummar(ize|ise|y)\b").unwrap(),
        }
    }

    /// Infer the task type from the query, independent of answers
    pub fn infer_task(&self, query: &str) -> TaskType {
        let q = query.to_lowercase();
        if q.contains("translate") {
            return TaskType::Translate;
        }
        if self.summarize.is_match(&q) {
            return TaskType::Summarize;
        }
        if ["best", "recommend", "suggest"].iter().any(|k| q.contains(k)) {
            return TaskType::Recommend;
        }
        TaskType::General
    }

    pub fn risk_tier(&self, query: &str) -> RiskTier {
        let q = query.to_lowercase();
        if HIGH_RISK_KEYWORDS.iter().any(|k| q.contains(k)) {
            RiskTier::High
        } else {
            RiskTier::Low
        }
    }

    /// Merge stored preferences with answers (answers win on collision),
    /// then build the intent and render its task-specific prompt. Absent
    /// optional fields fall back to stated defaults; nothing here fails.
    pub fn resolve(
        &self,
        query: &str,
        answers: &HashMap<String, String>,
        stored: &HashMap<String, String>,
    ) -> Resolution {
        let mut merged = stored.clone();
        merged.extend(answers.iter().map(|(k, v)| (k.clone(), v.clone())));

        let criteria = Slot::Criteria.lookup(&merged).map(str::to_string);
        let region = Slot::Region.lookup(&merged).map(normalize_region);
        let audience = Slot::Audience.lookup(&merged).map(str::to_string);
        let length = Slot::Length.lookup(&merged).map(str::to_string);
        let language = Slot::Language.lookup(&merged).map(str::to_string);

        let task_type = self.infer_task(query);
        let risk = self.risk_tier(query);

        let final_prompt = match task_type {
            TaskType::Summarize => {
                let aud = audience.as_deref().unwrap_or("simple");
                let words = match length.as_deref().unwrap_or("short") {
                    "medium" => "~300",
                    "long" => "~600",
                    _ => "~150",
                };
                format!(
                    "Summarize the provided content for a {aud} audience in {words} words with citations."
                )
            }
            TaskType::Translate => {
                let lang = language.as_deref().unwrap_or("EN").to_uppercase();
                format!(
                    "Translate the provided text into {lang} with natural tone and preserve formatting."
                )
            }
            TaskType::Recommend => {
                let criteria_label = match criteria.as_deref().unwrap_or("fees") {
                    "fees" => "lowest fees",
                    "speed" => "fast process",
                    "trust" => "high trust/brand",
                    // unmapped criteria pass through verbatim
                    other => other,
                };
                let loc = region.as_deref().unwrap_or("IN");
                format!(
                    "Recommend suitable options in {loc} optimised for {criteria_label}. Explain trade-offs and assumptions."
                )
            }
            TaskType::General => query.to_string(),
        };

        Resolution {
            intent: Intent {
                task_type,
                criteria,
                region,
                audience,
                length,
                language,
                risk,
            },
            final_prompt,
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Uppercase the region and collapse known aliases to their short codes;
/// unrecognized values pass through uppercased unchanged
fn normalize_region(raw: &str) -> String {
    let upper = raw.to_uppercase();
    match upper.as_str() {
        "INDIA" => "IN".to_string(),
        "USA" => "US".to_string(),
        "EUROPE" => "EU".to_string(),
        _ => upper,
    }
}
