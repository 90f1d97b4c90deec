//! Clarification question synthesis from ambiguity factors

use crate::types::{AmbiguityFactor, ClarifyQuestion, QuestionOption};
use uuid::Uuid;

/// Upper bound on questions emitted per call
pub const MAX_QUESTIONS: usize = 2;

/// Narrow seam for question-id generation. Ids are opaque and unique
/// within a call; nothing is guaranteed across calls.
pub trait QuestionIds: Send + Sync {
    fn next(&self) -> String;
}

/// Production id source: `q` plus the first 8 hex chars of a v4 UUID
pub struct UuidQuestionIds;

impl QuestionIds for UuidQuestionIds {
    fn next(&self) -> String {
        format!("q{}", &Uuid::new_v4().simple().to_string()[..8])
    }
}

/// Pluggable decision policy for the clarification stage. Production
/// behavior is the static rule table below; the seam exists so an
/// alternative policy could be injected without touching the pipeline.
pub trait DecisionPolicy: Send + Sync {
    fn question_for(
        &self,
        query: &str,
        factor: AmbiguityFactor,
        ids: &dyn QuestionIds,
    ) -> Option<ClarifyQuestion>;
}

/// Static factor-to-question rule table
pub struct RuleTablePolicy;

impl DecisionPolicy for RuleTablePolicy {
    fn question_for(
        &self,
        _query: &str,
        factor: AmbiguityFactor,
        ids: &dyn QuestionIds,
    ) -> Option<ClarifyQuestion> {
        let (question, options, default): (&str, &[(&str, &str)], &str) = match factor {
            AmbiguityFactor::CriteriaMissing => (
                "What matters most?",
                &[
                    ("fees", "Lowest fees"),
                    ("speed", "Fast process"),
                    ("trust", "High trust/brand"),
                ],
                "fees",
            ),
            AmbiguityFactor::RegionMissing => (
                "Which region?",
                &[("IN", "India"), ("US", "United States"), ("EU", "Europe")],
                "IN",
            ),
            AmbiguityFactor::AudienceMissing => (
                "Who is the audience?",
                &[
                    ("simple", "Layperson"),
                    ("expert", "Expert"),
                    ("kids", "Kids"),
                ],
                "simple",
            ),
            AmbiguityFactor::LengthMissing => (
                "Preferred length?",
                &[
                    ("short", "~150 words"),
                    ("medium", "~300 words"),
                    ("long", "~600 words"),
                ],
                "short",
            ),
            AmbiguityFactor::LanguageMissing => (
                "Target language?",
                &[
                    ("EN", "English"),
                    ("HI", "Hindi"),
                    ("ES", "Spanish"),
                    ("UR", "Urdu"),
                ],
                "EN",
            ),
            // No finite-choice repair exists for these
            AmbiguityFactor::EmptyQuery | AmbiguityFactor::ReferentMissing => return None,
        };

        Some(ClarifyQuestion {
            id: ids.next(),
            question: question.to_string(),
            kind: "single_choice".to_string(),
            options: options
                .iter()
                .map(|(id, label)| QuestionOption {
                    id: (*id).to_string(),
                    label: (*label).to_string(),
                })
                .collect(),
            default: default.to_string(),
        })
    }
}

/// Maps detected ambiguity factors into micro-questions with finite
/// option sets and safe defaults
pub struct Clarifier {
    policy: Box<dyn DecisionPolicy>,
    ids: Box<dyn QuestionIds>,
}

impl Clarifier {
    pub fn new() -> Self {
        Self::with_policy(Box::new(RuleTablePolicy), Box::new(UuidQuestionIds))
    }

    pub fn with_policy(policy: Box<dyn DecisionPolicy>, ids: Box<dyn QuestionIds>) -> Self {
        Self { policy, ids }
    }

    /// Emit at most [`MAX_QUESTIONS`] questions, in factor order. Factors
    /// with no mapped question are skipped and do not consume a slot.
    pub fn generate(&self, query: &str, factors: &[AmbiguityFactor]) -> Vec<ClarifyQuestion> {
        let mut questions = Vec::new();
        for factor in factors {
            if questions.len() == MAX_QUESTIONS {
                break;
            }
            if let Some(q) = self.policy.question_for(query, *factor, self.ids.as_ref()) {
                questions.push(q);
            }
        }
        questions
    }
}

impl Default for Clarifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_MAPPED: &[AmbiguityFactor] = &[
        AmbiguityFactor::CriteriaMissing,
        AmbiguityFactor::RegionMissing,
        AmbiguityFactor::AudienceMissing,
        AmbiguityFactor::LengthMissing,
        AmbiguityFactor::LanguageMissing,
    ];

    #[test]
    fn never_emits_more_than_two_questions() {
        let clarifier = Clarifier::new();
        let questions = clarifier.generate("anything", ALL_MAPPED);
        assert_eq!(questions.len(), MAX_QUESTIONS);
    }

    #[test]
    fn default_is_always_a_member_of_options() {
        let clarifier = Clarifier::new();
        for factor in ALL_MAPPED {
            let questions = clarifier.generate("anything", &[*factor]);
            assert_eq!(questions.len(), 1);
            let q = &questions[0];
            assert!(!q.options.is_empty());
            assert!(q.options.iter().any(|o| o.id == q.default));
            assert_eq!(q.kind, "single_choice");
        }
    }

    #[test]
    fn unmapped_factors_do_not_consume_a_slot() {
        let clarifier = Clarifier::new();
        let factors = [
            AmbiguityFactor::ReferentMissing,
            AmbiguityFactor::CriteriaMissing,
            AmbiguityFactor::RegionMissing,
        ];
        let questions = clarifier.generate("best bank", &factors);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question, "What matters most?");
        assert_eq!(questions[1].question, "Which region?");
    }

    #[test]
    fn empty_query_factor_maps_to_no_question() {
        let clarifier = Clarifier::new();
        let questions = clarifier.generate("", &[AmbiguityFactor::EmptyQuery]);
        assert!(questions.is_empty());
    }

    #[test]
    fn question_order_follows_factor_order() {
        let clarifier = Clarifier::new();
        let questions = clarifier.generate(
            "query",
            &[
                AmbiguityFactor::RegionMissing,
                AmbiguityFactor::CriteriaMissing,
            ],
        );
        assert_eq!(questions[0].question, "Which region?");
        assert_eq!(questions[1].question, "What matters most?");
    }

    #[test]
    fn question_ids_are_unique_within_a_call() {
        let clarifier = Clarifier::new();
        let questions = clarifier.generate("query", ALL_MAPPED);
        assert_ne!(questions[0].id, questions[1].id);
        assert!(questions.iter().all(|q| q.id.starts_with('q')));
    }
}
