//! Durable per-user preference and consent storage
//!
//! Both stores share one pooled, long-lived SQLite handle; each operation
//! is a single self-contained statement, so acquisition and release are
//! scoped by the pool on every exit path. Preference expiry is enforced
//! lazily on read; there is no background sweep.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Open (or create) the database and ensure the schema exists.
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    ensure_schema(&pool).await?;
    Ok(pool)
}

async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS preferences (
            user_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT,
            expires_at INTEGER,
            PRIMARY KEY (user_id, key)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS consent (
            user_id TEXT PRIMARY KEY,
            accepted INTEGER NOT NULL,
            ts INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

/// TTL-aware key/value preferences scoped by hashed user identity
#[derive(Clone)]
pub struct PreferenceStore {
    pool: SqlitePool,
}

impl PreferenceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert one preference row; `ttl_ms` of `None` means no expiry.
    pub async fn set(
        &self,
        user_id: &str,
        key: &str,
        value: &str,
        ttl_ms: Option<i64>,
    ) -> Result<(), sqlx::Error> {
        let expires_at = ttl_ms.map(|ttl| now_ms() + ttl);
        sqlx::query(
            r#"
            INSERT INTO preferences (user_id, key, value, expires_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(user_id)
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Read one preference. An expired row is deleted on sight and reads
    /// as absent.
    pub async fn get(&self, user_id: &str, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row = sqlx::query("SELECT value, expires_at FROM preferences WHERE user_id = ? AND key = ?")
            .bind(user_id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: Option<i64> = row.get("expires_at");
        if expires_at.is_some_and(|exp| exp < now_ms()) {
            sqlx::query("DELETE FROM preferences WHERE user_id = ? AND key = ?")
                .bind(user_id)
                .bind(key)
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }

        Ok(Some(row.get("value")))
    }

    /// All live preferences for the identity; stale rows encountered on
    /// the way are purged.
    pub async fn all_for_user(&self, user_id: &str) -> Result<HashMap<String, String>, sqlx::Error> {
        let rows = sqlx::query("SELECT key, value, expires_at FROM preferences WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let now = now_ms();
        let mut live = HashMap::new();
        let mut stale: Vec<String> = Vec::new();
        for row in rows {
            let key: String = row.get("key");
            let expires_at: Option<i64> = row.get("expires_at");
            if expires_at.is_some_and(|exp| exp < now) {
                stale.push(key);
            } else {
                live.insert(key, row.get("value"));
            }
        }

        for key in stale {
            sqlx::query("DELETE FROM preferences WHERE user_id = ? AND key = ?")
                .bind(user_id)
                .bind(&key)
                .execute(&self.pool)
                .await?;
        }

        Ok(live)
    }

    /// Delete every preference for the identity, expired or not.
    pub async fn clear_user(&self, user_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM preferences WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// One consent flag per user identity; last write wins, never expires
#[derive(Clone)]
pub struct ConsentStore {
    pool: SqlitePool,
}

impl ConsentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn set(&self, user_id: &str, accepted: bool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO consent (user_id, accepted, ts)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                accepted = excluded.accepted,
                ts = excluded.ts
            "#,
        )
        .bind(user_id)
        .bind(accepted as i64)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// An absent row reads as "not yet consented", not an error.
    pub async fn get(&self, user_id: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT accepted FROM consent WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<i64, _>("accepted") != 0).unwrap_or(false))
    }
}
