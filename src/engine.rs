//! Pipeline orchestration: admission, detection, clarification, resolution

use crate::clarifier::{Clarifier, MAX_QUESTIONS};
use crate::detector::Detector;
use crate::error::{EngineError, EngineResult};
use crate::metrics::{MetricsRegistry, MetricsSnapshot};
use crate::rate_limit::RateLimiter;
use crate::resolver::Resolver;
use crate::store::{ConsentStore, PreferenceStore};
use crate::types::{AmbiguityFactor, ClarifyResponse, DetectionResult, Resolution};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Main intent engine (thread-safe via Arc). Owns the pure pipeline
/// stages and the shared-state collaborators; every operation is
/// admission-gated and metered.
pub struct IntentEngine {
    detector: Detector,
    clarifier: Clarifier,
    resolver: Resolver,
    prefs: PreferenceStore,
    consent: ConsentStore,
    limiter: RateLimiter,
    metrics: Arc<MetricsRegistry>,
}

pub type SharedIntentEngine = Arc<IntentEngine>;

impl IntentEngine {
    pub fn new(
        prefs: PreferenceStore,
        consent: ConsentStore,
        limiter: RateLimiter,
        metrics: Arc<MetricsRegistry>,
    ) -> SharedIntentEngine {
        Arc::new(Self {
            detector: Detector::new(),
            clarifier: Clarifier::new(),
            resolver: Resolver::new(),
            prefs,
            consent,
            limiter,
            metrics,
        })
    }

    /// Score a query for ambiguity. An empty query is a normal input that
    /// scores maximally ambiguous.
    pub fn detect(&self, client: &str, query: &str) -> EngineResult<DetectionResult> {
        self.admit(client)?;
        let start = Instant::now();
        self.metrics.incr_requests();

        let result = self.detector.detect(query);
        if result.ambiguous {
            self.metrics.incr_ambiguous();
        }

        self.metrics.add_latency(start.elapsed());
        debug!(
            "detect: client={} score={} factors={:?}",
            client, result.score, result.factors
        );
        Ok(result)
    }

    /// Turn detected factors into at most two clarification questions.
    /// Unknown factor tags are skipped and consume no question slot.
    pub fn clarify(
        &self,
        client: &str,
        query: &str,
        factors: &[String],
    ) -> EngineResult<ClarifyResponse> {
        self.admit(client)?;
        let start = Instant::now();
        self.metrics.incr_requests();

        let parsed: Vec<AmbiguityFactor> = factors
            .iter()
            .filter_map(|tag| AmbiguityFactor::from_tag(tag))
            .collect();
        let questions = self.clarifier.generate(query, &parsed);
        if !questions.is_empty() {
            self.metrics.incr_clarifications();
        }

        self.metrics.add_latency(start.elapsed());
        debug!("clarify: client={} questions={}", client, questions.len());
        Ok(ClarifyResponse {
            questions,
            max_questions: MAX_QUESTIONS,
        })
    }

    /// Merge remembered preferences with the caller's answers and build
    /// the final intent and prompt. A failed preference read fails the
    /// whole call; resolving against silently-empty preferences would
    /// change user-visible output.
    pub async fn resolve(
        &self,
        client: &str,
        query: &str,
        answers: &HashMap<String, String>,
    ) -> EngineResult<Resolution> {
        self.admit(client)?;
        let start = Instant::now();
        self.metrics.incr_requests();

        let stored = self.read_prefs(client).await?;
        let resolution = self.resolver.resolve(query, answers, &stored);
        self.metrics.incr_resolved();

        self.metrics.add_latency(start.elapsed());
        info!(
            "resolve: client={} task={} risk={}",
            client,
            resolution.intent.task_type.as_str(),
            resolution.intent.risk.as_str()
        );
        Ok(resolution)
    }

    /// Same contract as [`resolve`](Self::resolve); counted separately so
    /// answer-stage traffic is visible on its own.
    pub async fn answer(
        &self,
        client: &str,
        query: &str,
        answers: &HashMap<String, String>,
    ) -> EngineResult<Resolution> {
        self.admit(client)?;
        let start = Instant::now();
        self.metrics.incr_requests();

        let stored = self.read_prefs(client).await?;
        let resolution = self.resolver.resolve(query, answers, &stored);
        self.metrics.incr_answers();

        self.metrics.add_latency(start.elapsed());
        info!(
            "answer: client={} task={}",
            client,
            resolution.intent.task_type.as_str()
        );
        Ok(resolution)
    }

    /// All live remembered preferences for the identity.
    pub async fn get_memory(&self, client: &str) -> EngineResult<HashMap<String, String>> {
        self.admit(client)?;
        let start = Instant::now();
        self.metrics.incr_requests();

        let prefs = self.read_prefs(client).await?;
        self.metrics.add_latency(start.elapsed());
        Ok(prefs)
    }

    /// Apply each preference with no TTL (permanent until cleared) and
    /// return the stored view.
    pub async fn set_memory(
        &self,
        client: &str,
        prefs: &HashMap<String, String>,
    ) -> EngineResult<HashMap<String, String>> {
        self.admit(client)?;
        let start = Instant::now();
        self.metrics.incr_requests();

        if prefs.keys().any(|key| key.trim().is_empty()) {
            return Err(EngineError::InvalidInput(
                "preference keys must be non-empty".to_string(),
            ));
        }

        for (key, value) in prefs {
            self.prefs
                .set(client, key, value, None)
                .await
                .map_err(|e| self.storage_err(e))?;
        }

        let stored = self.read_prefs(client).await?;
        self.metrics.add_latency(start.elapsed());
        info!("set_memory: client={} keys={}", client, prefs.len());
        Ok(stored)
    }

    /// Forget every preference for the identity.
    pub async fn clear_memory(&self, client: &str) -> EngineResult<()> {
        self.admit(client)?;
        let start = Instant::now();
        self.metrics.incr_requests();

        self.prefs
            .clear_user(client)
            .await
            .map_err(|e| self.storage_err(e))?;

        self.metrics.add_latency(start.elapsed());
        info!("clear_memory: client={}", client);
        Ok(())
    }

    /// Absence of a consent row reads as "not yet consented".
    pub async fn get_consent(&self, client: &str) -> EngineResult<bool> {
        self.admit(client)?;
        let start = Instant::now();
        self.metrics.incr_requests();

        let accepted = self
            .consent
            .get(client)
            .await
            .map_err(|e| self.storage_err(e))?;
        self.metrics.add_latency(start.elapsed());
        Ok(accepted)
    }

    pub async fn set_consent(&self, client: &str, accepted: bool) -> EngineResult<bool> {
        self.admit(client)?;
        let start = Instant::now();
        self.metrics.incr_requests();

        self.consent
            .set(client, accepted)
            .await
            .map_err(|e| self.storage_err(e))?;
        let stored = self
            .consent
            .get(client)
            .await
            .map_err(|e| self.storage_err(e))?;

        self.metrics.add_latency(start.elapsed());
        info!("set_consent: client={} accepted={}", client, stored);
        Ok(stored)
    }

    /// Counter snapshot for the external reporting collaborator.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn admit(&self, client: &str) -> EngineResult<()> {
        if self.limiter.check(client) {
            Ok(())
        } else {
            debug!("rate limited: client={}", client);
            Err(EngineError::RateLimited)
        }
    }

    async fn read_prefs(&self, client: &str) -> EngineResult<HashMap<String, String>> {
        self.prefs
            .all_for_user(client)
            .await
            .map_err(|e| self.storage_err(e))
    }

    fn storage_err(&self, err: sqlx::Error) -> EngineError {
        self.metrics.incr_errors();
        EngineError::Storage(err)
    }
}
