//! Clarion - Intent Resolution Engine
//!
//! Resolves underspecified natural-language requests into structured,
//! machine-actionable intents:
//! - Lexical ambiguity detection with ranked factors
//! - Clarification-question synthesis, capped at two per round
//! - Preference/answer merging into a typed intent and rendered prompt
//! - Per-client token-bucket admission control
//! - TTL-aware durable preference and consent storage

pub mod types;
pub mod detector;
pub mod clarifier;
pub mod resolver;
pub mod store;
pub mod identity;
pub mod rate_limit;
pub mod metrics;
pub mod error;
pub mod engine;
pub mod config;
pub mod server;

pub use types::*;
pub use detector::Detector;
pub use clarifier::{Clarifier, DecisionPolicy, QuestionIds, RuleTablePolicy, UuidQuestionIds, MAX_QUESTIONS};
pub use resolver::{Resolver, Slot};
pub use store::{connect, ConsentStore, PreferenceStore};
pub use identity::hashed_client_id;
pub use rate_limit::RateLimiter;
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use error::{EngineError, EngineResult};
pub use engine::{IntentEngine, SharedIntentEngine};
pub use config::EngineConfig;

#[cfg(test)]
mod tests;
