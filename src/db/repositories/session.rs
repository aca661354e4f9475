//! Session repository
//!
//! Login sessions plus their key/value data (the visit counter lives here).
//!
//! This module provides:
//! - `SessionRepository` trait defining the interface for session data access
//! - `SqlxSessionRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by ID (token)
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Delete a session and its data
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete all sessions of a redactor
    async fn delete_by_redactor(&self, redactor_id: i64) -> Result<()>;

    /// Delete expired sessions
    async fn delete_expired(&self) -> Result<i64>;

    /// Read a raw session value
    async fn get_value(&self, session_id: &str, key: &str) -> Result<Option<String>>;

    /// Insert or replace a raw session value
    async fn set_value(&self, session_id: &str, key: &str, value: &str) -> Result<()>;
}

/// SQLx-based session repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

const INSERT_SESSION: &str =
    "INSERT INTO sessions (id, redactor_id, expires_at, created_at) VALUES (?, ?, ?, ?)";

const SELECT_SESSION: &str =
    "SELECT id, redactor_id, expires_at, created_at FROM sessions WHERE id = ?";

const SELECT_VALUE: &str =
    "SELECT data_value FROM session_data WHERE session_id = ? AND data_key = ?";

const UPSERT_VALUE_SQLITE: &str = r#"
    INSERT INTO session_data (session_id, data_key, data_value)
    VALUES (?, ?, ?)
    ON CONFLICT(session_id, data_key) DO UPDATE SET data_value = excluded.data_value
"#;

const UPSERT_VALUE_MYSQL: &str = r#"
    INSERT INTO session_data (session_id, data_key, data_value)
    VALUES (?, ?, ?)
    ON DUPLICATE KEY UPDATE data_value = VALUES(data_value)
"#;

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(INSERT_SESSION)
                    .bind(&session.id)
                    .bind(session.redactor_id)
                    .bind(session.expires_at)
                    .bind(session.created_at)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to create session")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(INSERT_SESSION)
                    .bind(&session.id)
                    .bind(session.redactor_id)
                    .bind(session.expires_at)
                    .bind(session.created_at)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to create session")?;
            }
        }

        Ok(session.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_session_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_session_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM sessions WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to delete session")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM sessions WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to delete session")?;
            }
        }
        Ok(())
    }

    async fn delete_by_redactor(&self, redactor_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM sessions WHERE redactor_id = ?")
                    .bind(redactor_id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to delete sessions by redactor")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM sessions WHERE redactor_id = ?")
                    .bind(redactor_id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to delete sessions by redactor")?;
            }
        }
        Ok(())
    }

    async fn delete_expired(&self) -> Result<i64> {
        let now = Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
                .bind(now)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to delete expired sessions")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
                .bind(now)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to delete expired sessions")?
                .rows_affected(),
        };
        Ok(affected as i64)
    }

    async fn get_value(&self, session_id: &str, key: &str) -> Result<Option<String>> {
        let value: Option<String> = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(SELECT_VALUE)
                .bind(session_id)
                .bind(key)
                .fetch_optional(self.pool.sqlite()?)
                .await
                .context("Failed to read session value")?
                .map(|row| row.get("data_value")),
            DatabaseDriver::Mysql => sqlx::query(SELECT_VALUE)
                .bind(session_id)
                .bind(key)
                .fetch_optional(self.pool.mysql()?)
                .await
                .context("Failed to read session value")?
                .map(|row| row.get("data_value")),
        };
        Ok(value)
    }

    async fn set_value(&self, session_id: &str, key: &str, value: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(UPSERT_VALUE_SQLITE)
                    .bind(session_id)
                    .bind(key)
                    .bind(value)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to write session value")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(UPSERT_VALUE_MYSQL)
                    .bind(session_id)
                    .bind(key)
                    .bind(value)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to write session value")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn get_session_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Session>> {
    let row = sqlx::query(SELECT_SESSION)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get session by ID")?;

    Ok(row.as_ref().map(row_to_session_sqlite))
}

fn row_to_session_sqlite(row: &sqlx::sqlite::SqliteRow) -> Session {
    Session {
        id: row.get("id"),
        redactor_id: row.get("redactor_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn get_session_by_id_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Session>> {
    let row = sqlx::query(SELECT_SESSION)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get session by ID")?;

    Ok(row.as_ref().map(row_to_session_mysql))
}

fn row_to_session_mysql(row: &sqlx::mysql::MySqlRow) -> Session {
    Session {
        id: row.get("id"),
        redactor_id: row.get("redactor_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }
}
