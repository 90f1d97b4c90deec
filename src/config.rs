//! Environment-driven runtime configuration

use std::path::PathBuf;

/// Runtime settings, read once at process start.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// SQLite database path for preferences and consent
    pub db_path: PathBuf,
    /// Salt mixed into client-identity hashing
    pub salt: String,
    /// Token-bucket capacity and refill rate, requests per second per client
    pub rate_limit: f64,
    /// HTTP bind port for the transport layer
    pub port: u16,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self {
            db_path: std::env::var("CLARION_DB")
                .unwrap_or_else(|_| "clarion.db".to_string())
                .into(),
            salt: std::env::var("CLARION_SALT").unwrap_or_else(|_| "clarion_salt".to_string()),
            rate_limit: std::env::var("CLARION_RATE_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10.0),
            port: std::env::var("CLARION_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8082),
        }
    }
}
