//! PostgreSQL store for users, log entries, and profile documents.

use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, Pool, Runtime};
use tokio_postgres::NoTls;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::DatabaseError;
use crate::intent::Intent;
use crate::profile::Profile;

/// One user utterance with its analysis annotations. Created and flagged
/// analyzed by the ingestion pipeline; this crate only reads it.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    /// Detected emotions, open vocabulary.
    pub emotions: Vec<String>,
    /// Detected topics, free-text labels.
    pub topics: Vec<String>,
    pub intent: Intent,
    pub is_analyzed: bool,
    pub created_at: DateTime<Utc>,
}

/// Database store for the crate.
pub struct Store {
    pool: Pool,
}

impl Store {
    /// Create a new store and connect to the database.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let mut cfg = Config::new();
        cfg.url = Some(config.url().to_string());
        cfg.pool = Some(deadpool_postgres::PoolConfig {
            max_size: config.pool_size,
            ..Default::default()
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;

        // Test connection
        let _ = pool.get().await?;

        Ok(Self { pool })
    }

    /// Run database migrations (embedded via refinery).
    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        use refinery::embed_migrations;
        embed_migrations!("migrations");

        let mut client = self.pool.get().await?;
        migrations::runner()
            .run_async(&mut **client)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get a connection from the pool.
    async fn conn(&self) -> Result<deadpool_postgres::Object, DatabaseError> {
        Ok(self.pool.get().await?)
    }

    // ==================== Log entries ====================

    /// Analyzed entries for `user_id` created at or after `since`, newest
    /// first, capped at `limit`.
    pub async fn recent_analyzed_entries(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<LogEntry>, DatabaseError> {
        let conn = self.conn().await?;

        let rows = conn
            .query(
                r#"
                SELECT id, user_id, content, emotions, topics, intent, is_analyzed, created_at
                FROM log_entries
                WHERE user_id = $1 AND created_at >= $2 AND is_analyzed = TRUE
                ORDER BY created_at DESC
                LIMIT $3
                "#,
                &[&user_id, &since, &limit],
            )
            .await?;

        Ok(rows.iter().map(entry_from_row).collect())
    }

    // ==================== Profiles ====================

    /// Overwrite the user's profile document wholesale. Returns `false` when
    /// the user row does not exist; callers treat that as empty-state.
    pub async fn save_user_profile(
        &self,
        user_id: Uuid,
        profile: &Profile,
    ) -> Result<bool, DatabaseError> {
        let document = serde_json::to_value(profile)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        let conn = self.conn().await?;
        let updated = conn
            .execute(
                "UPDATE users SET profile_data = $2, updated_at = NOW() WHERE id = $1",
                &[&user_id, &document],
            )
            .await?;

        Ok(updated > 0)
    }

    /// Read back the persisted profile document, if any.
    pub async fn get_user_profile(&self, user_id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        let conn = self.conn().await?;

        let row = conn
            .query_opt("SELECT profile_data FROM users WHERE id = $1", &[&user_id])
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let document: Option<serde_json::Value> = row.get("profile_data");
        match document {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| DatabaseError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    // ==================== Users ====================

    /// All user ids, for whole-population profile rebuilds.
    pub async fn list_user_ids(&self) -> Result<Vec<Uuid>, DatabaseError> {
        let conn = self.conn().await?;

        let rows = conn
            .query("SELECT id FROM users ORDER BY created_at", &[])
            .await?;

        Ok(rows.iter().map(|r| r.get("id")).collect())
    }
}

fn entry_from_row(row: &tokio_postgres::Row) -> LogEntry {
    let intent: String = row.get("intent");

    LogEntry {
        id: row.get("id"),
        user_id: row.get("user_id"),
        content: row.get("content"),
        emotions: row.get("emotions"),
        topics: row.get("topics"),
        // Unknown values should not occur, but an old row must not poison a
        // whole aggregation run.
        intent: Intent::parse(&intent).unwrap_or(Intent::Chat),
        is_analyzed: row.get("is_analyzed"),
        created_at: row.get("created_at"),
    }
}
