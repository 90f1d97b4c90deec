//! Core type definitions for intent resolution

use serde::{Deserialize, Serialize};

/// Tagged reason a query is considered underspecified
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityFactor {
    EmptyQuery,
    CriteriaMissing,
    ReferentMissing,
    AudienceMissing,
    LengthMissing,
    LanguageMissing,
    RegionMissing,
}

impl AmbiguityFactor {
    pub fn as_tag(self) -> &'static str {
        match self {
            AmbiguityFactor::EmptyQuery => "empty_query",
            AmbiguityFactor::CriteriaMissing => "criteria_missing",
            AmbiguityFactor::ReferentMissing => "referent_missing",
            AmbiguityFactor::AudienceMissing => "audience_missing",
            AmbiguityFactor::LengthMissing => "length_missing",
            AmbiguityFactor::LanguageMissing => "language_missing",
            AmbiguityFactor::RegionMissing => "region_missing",
        }
    }

    /// Parse a wire tag. Unknown tags yield `None`; callers skip them.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "empty_query" => Some(AmbiguityFactor::EmptyQuery),
            "criteria_missing" => Some(AmbiguityFactor::CriteriaMissing),
            "referent_missing" => Some(AmbiguityFactor::ReferentMissing),
            "audience_missing" => Some(AmbiguityFactor::AudienceMissing),
            "length_missing" => Some(AmbiguityFactor::LengthMissing),
            "language_missing" => Some(AmbiguityFactor::LanguageMissing),
            "region_missing" => Some(AmbiguityFactor::RegionMissing),
            _ => None,
        }
    }
}

/// Ambiguity verdict for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub ambiguous: bool,
    /// In [0.0, 1.0], rounded to 2 decimals
    pub score: f64,
    /// First-seen order, no duplicates
    pub factors: Vec<AmbiguityFactor>,
}

/// One selectable answer for a clarification question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub label: String,
}

/// Finite-choice prompt with a safe default, resolving one ambiguity factor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarifyQuestion {
    /// Opaque, unique per call; not stable across calls
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub options: Vec<QuestionOption>,
    /// Always a member of `options`
    pub default: String,
}

/// Clarification output: capped, ordered question list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarifyResponse {
    pub questions: Vec<ClarifyQuestion>,
    pub max_questions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    General,
    Translate,
    Summarize,
    Recommend,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::General => "general",
            TaskType::Translate => "translate",
            TaskType::Summarize => "summarize",
            TaskType::Recommend => "recommend",
        }
    }
}

/// Coarse sensitivity classification derived from query keywords alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    High,
}

impl RiskTier {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::High => "high",
        }
    }
}

/// Structured, task-typed output of resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub task_type: TaskType,
    pub criteria: Option<String>,
    pub region: Option<String>,
    pub audience: Option<String>,
    pub length: Option<String>,
    pub language: Option<String>,
    pub risk: RiskTier,
}

/// Final resolution: the intent plus its rendered prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub intent: Intent,
    pub final_prompt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_FACTORS: &[AmbiguityFactor] = &[
        AmbiguityFactor::EmptyQuery,
        AmbiguityFactor::CriteriaMissing,
        AmbiguityFactor::ReferentMissing,
        AmbiguityFactor::AudienceMissing,
        AmbiguityFactor::LengthMissing,
        AmbiguityFactor::LanguageMissing,
        AmbiguityFactor::RegionMissing,
    ];

    #[test]
    fn factors_serialize_as_snake_case_tags() {
        let json = serde_json::to_string(&AmbiguityFactor::CriteriaMissing).unwrap();
        assert_eq!(json, "\"criteria_missing\"");

        let parsed: AmbiguityFactor = serde_json::from_str("\"region_missing\"").unwrap();
        assert_eq!(parsed, AmbiguityFactor::RegionMissing);
    }

    #[test]
    fn from_tag_inverts_as_tag() {
        for factor in ALL_FACTORS {
            assert_eq!(AmbiguityFactor::from_tag(factor.as_tag()), Some(*factor));
        }
        assert_eq!(AmbiguityFactor::from_tag("no_such_factor"), None);
    }

    #[test]
    fn intent_serializes_task_and_risk_lowercase() {
        let intent = Intent {
            task_type: TaskType::Recommend,
            criteria: Some("fees".to_string()),
            region: Some("IN".to_string()),
            audience: None,
            length: None,
            language: None,
            risk: RiskTier::Low,
        };
        let value = serde_json::to_value(&intent).unwrap();
        assert_eq!(value["task_type"], "recommend");
        assert_eq!(value["risk"], "low");
        assert!(value["audience"].is_null());
    }

    #[test]
    fn question_kind_serializes_under_the_type_key() {
        let question = ClarifyQuestion {
            id: "q1234".to_string(),
            question: "Which region?".to_string(),
            kind: "single_choice".to_string(),
            options: vec![QuestionOption {
                id: "IN".to_string(),
                label: "India".to_string(),
            }],
            default: "IN".to_string(),
        };
        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["type"], "single_choice");
    }
}
