//! Engine-level tests for the intent resolution pipeline

use crate::*;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

/// Helper to build an engine over a throwaway database
async fn test_engine(rate: f64) -> (TempDir, SharedIntentEngine) {
    let tmp = TempDir::new().unwrap();
    let pool = store::connect(&tmp.path().join("clarion.db")).await.unwrap();
    let engine = IntentEngine::new(
        PreferenceStore::new(pool.clone()),
        ConsentStore::new(pool),
        RateLimiter::new(rate),
        Arc::new(MetricsRegistry::new()),
    );
    (tmp, engine)
}

fn answers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn test_detect_clarify_resolve_flow() {
    let (_tmp, engine) = test_engine(1000.0).await;
    let query = "Find me the best bank account";

    // detect
    let detection = engine.detect("client-a", query).unwrap();
    assert!(detection.ambiguous);
    assert!(detection
        .factors
        .contains(&AmbiguityFactor::CriteriaMissing));
    assert!(detection.factors.contains(&AmbiguityFactor::RegionMissing));
    assert!(!detection
        .factors
        .contains(&AmbiguityFactor::AudienceMissing));

    // clarify
    let tags: Vec<String> = detection
        .factors
        .iter()
        .map(|f| f.as_tag().to_string())
        .collect();
    let clar = engine.clarify("client-a", query, &tags).unwrap();
    assert_eq!(clar.max_questions, 2);
    assert_eq!(clar.questions.len(), 2);
    assert_eq!(clar.questions[0].default, "fees");
    assert_eq!(clar.questions[1].default, "IN");

    // resolve with the defaults, keyed positionally like older clients
    let mut given = HashMap::new();
    for (i, q) in clar.questions.iter().enumerate() {
        given.insert(format!("q{}", i + 1), q.default.clone());
    }
    let resolution = engine.resolve("client-a", query, &given).await.unwrap();
    assert_eq!(resolution.intent.task_type, TaskType::Recommend);
    assert_eq!(resolution.intent.risk, RiskTier::Low);
    assert_eq!(resolution.intent.region.as_deref(), Some("IN"));
    assert_eq!(
        resolution.final_prompt,
        "Recommend suitable options in IN optimised for lowest fees. Explain trade-offs and assumptions."
    );
}

#[tokio::test]
async fn test_fully_specified_summary_needs_no_clarification() {
    let (_tmp, engine) = test_engine(1000.0).await;
    let query = "Summarize this document for experts in 300 words";

    let detection = engine.detect("client-a", query).unwrap();
    assert!(!detection.ambiguous);
    assert!(detection.factors.is_empty());

    let resolution = engine
        .resolve("client-a", query, &HashMap::new())
        .await
        .unwrap();
    assert_eq!(resolution.intent.task_type, TaskType::Summarize);
}

#[tokio::test]
async fn test_empty_query_is_a_normal_input() {
    let (_tmp, engine) = test_engine(1000.0).await;

    let detection = engine.detect("client-a", "").unwrap();
    assert!(detection.ambiguous);
    assert_eq!(detection.score, 1.0);
    assert_eq!(detection.factors, vec![AmbiguityFactor::EmptyQuery]);

    // the factor maps to no question
    let clar = engine
        .clarify("client-a", "", &["empty_query".to_string()])
        .unwrap();
    assert!(clar.questions.is_empty());
}

#[tokio::test]
async fn test_unknown_factor_tags_are_skipped() {
    let (_tmp, engine) = test_engine(1000.0).await;

    let tags = vec![
        "totally_unknown".to_string(),
        "criteria_missing".to_string(),
    ];
    let clar = engine.clarify("client-a", "best plan", &tags).unwrap();
    assert_eq!(clar.questions.len(), 1);
    assert_eq!(clar.questions[0].question, "What matters most?");
}

#[tokio::test]
async fn test_answers_override_stored_preferences() {
    let (_tmp, engine) = test_engine(1000.0).await;

    engine
        .set_memory("client-a", &answers(&[("region", "IN")]))
        .await
        .unwrap();

    let resolution = engine
        .resolve("client-a", "recommend a bank", &answers(&[("region", "US")]))
        .await
        .unwrap();
    assert_eq!(resolution.intent.region.as_deref(), Some("US"));
}

#[tokio::test]
async fn test_stored_preferences_fill_missing_answers() {
    let (_tmp, engine) = test_engine(1000.0).await;

    engine
        .set_memory(
            "client-a",
            &answers(&[("region", "EUROPE"), ("criteria", "trust")]),
        )
        .await
        .unwrap();

    let resolution = engine
        .resolve("client-a", "recommend a savings account", &HashMap::new())
        .await
        .unwrap();
    assert_eq!(resolution.intent.region.as_deref(), Some("EU"));
    assert_eq!(resolution.intent.criteria.as_deref(), Some("trust"));
    assert_eq!(
        resolution.final_prompt,
        "Recommend suitable options in EU optimised for high trust/brand. Explain trade-offs and assumptions."
    );

    // preferences are per identity
    let other = engine
        .resolve("client-b", "recommend a savings account", &HashMap::new())
        .await
        .unwrap();
    assert_eq!(other.intent.region, None);
}

#[tokio::test]
async fn test_rate_limiter_gates_every_operation() {
    let (_tmp, engine) = test_engine(2.0).await;

    assert!(engine.detect("client-a", "hello").is_ok());
    assert!(engine.get_consent("client-a").await.is_ok());
    let third = engine.detect("client-a", "hello");
    assert!(matches!(third, Err(EngineError::RateLimited)));

    // other clients are unaffected
    assert!(engine.detect("client-b", "hello").is_ok());
}

#[tokio::test]
async fn test_memory_roundtrip_and_clear() {
    let (_tmp, engine) = test_engine(1000.0).await;

    let stored = engine
        .set_memory("client-a", &answers(&[("region", "US"), ("length", "long")]))
        .await
        .unwrap();
    assert_eq!(stored.get("region").map(String::as_str), Some("US"));

    let read_back = engine.get_memory("client-a").await.unwrap();
    assert_eq!(read_back.len(), 2);

    engine.clear_memory("client-a").await.unwrap();
    assert!(engine.get_memory("client-a").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_set_memory_rejects_empty_keys() {
    let (_tmp, engine) = test_engine(1000.0).await;

    let result = engine
        .set_memory("client-a", &answers(&[("", "oops")]))
        .await;
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));
}

#[tokio::test]
async fn test_consent_defaults_false_then_tracks_writes() {
    let (_tmp, engine) = test_engine(1000.0).await;

    assert!(!engine.get_consent("client-a").await.unwrap());
    assert!(engine.set_consent("client-a", true).await.unwrap());
    assert!(engine.get_consent("client-a").await.unwrap());
    assert!(!engine.set_consent("client-a", false).await.unwrap());
}

#[tokio::test]
async fn test_answer_matches_resolve_but_counts_apart() {
    let (_tmp, engine) = test_engine(1000.0).await;
    let query = "translate the contract into hindi";

    let resolved = engine
        .resolve("client-a", query, &HashMap::new())
        .await
        .unwrap();
    let answered = engine
        .answer("client-a", query, &HashMap::new())
        .await
        .unwrap();
    assert_eq!(resolved.final_prompt, answered.final_prompt);
    assert_eq!(resolved.intent.task_type, answered.intent.task_type);

    let snap = engine.metrics_snapshot();
    assert_eq!(snap.resolved_total, 1);
    assert_eq!(snap.answer_total, 1);
    assert_eq!(snap.requests_total, 2);
}

#[tokio::test]
async fn test_metrics_track_ambiguous_detections() {
    let (_tmp, engine) = test_engine(1000.0).await;

    engine.detect("client-a", "best bank").unwrap();
    engine
        .detect("client-a", "Summarize this document for experts in 300 words")
        .unwrap();

    let snap = engine.metrics_snapshot();
    assert_eq!(snap.requests_total, 2);
    assert_eq!(snap.ambiguous_total, 1);
}
