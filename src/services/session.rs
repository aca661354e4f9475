//! Per-session key/value data
//!
//! Values are stored as JSON text in `session_data` and disappear with their
//! session.

use crate::db::repositories::SessionRepository;
use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use super::ServiceResult;

/// Key of the index-page visit counter
pub const NUM_VISITS_KEY: &str = "num_visits";

/// Typed access to the data bag of a session
pub struct SessionData {
    repo: Arc<dyn SessionRepository>,
}

impl SessionData {
    pub fn new(repo: Arc<dyn SessionRepository>) -> Self {
        Self { repo }
    }

    pub async fn get<T: DeserializeOwned>(&self, session_id: &str, key: &str) -> ServiceResult<Option<T>> {
        let raw = self
            .repo
            .get_value(session_id, key)
            .await
            .context("Failed to read session data")?;
        match raw {
            Some(raw) => Ok(Some(
                serde_json::from_str(&raw)
                    .with_context(|| format!("Corrupt session value for key {}", key))?,
            )),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize + Sync>(&self, session_id: &str, key: &str, value: &T) -> ServiceResult<()> {
        let raw = serde_json::to_string(value).context("Failed to encode session value")?;
        self.repo
            .set_value(session_id, key, &raw)
            .await
            .context("Failed to write session data")?;
        Ok(())
    }

    /// Bump the visit counter and return the new value (1 on the first visit)
    pub async fn increment_visits(&self, session_id: &str) -> ServiceResult<u64> {
        let visits = self
            .get::<u64>(session_id, NUM_VISITS_KEY)
            .await?
            .unwrap_or(0)
            .saturating_add(1);
        self.set(session_id, NUM_VISITS_KEY, &visits).await?;
        Ok(visits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{RedactorRepository, SqlxRedactorRepository, SqlxSessionRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Redactor, Session};
    use chrono::{Duration, Utc};

    async fn setup() -> (SessionData, Arc<dyn SessionRepository>, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let redactor = SqlxRedactorRepository::new(pool.clone())
            .create(&Redactor::new("jdoe", "hash", "", "", 0))
            .await
            .unwrap();
        let sessions = SqlxSessionRepository::boxed(pool);
        (SessionData::new(sessions.clone()), sessions, redactor.id)
    }

    async fn open_session(sessions: &Arc<dyn SessionRepository>, redactor_id: i64, id: &str) {
        let now = Utc::now();
        sessions
            .create(&Session {
                id: id.to_string(),
                redactor_id,
                expires_at: now + Duration::days(1),
                created_at: now,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_visit_counter_per_session() {
        let (data, sessions, redactor_id) = setup().await;
        open_session(&sessions, redactor_id, "first").await;
        open_session(&sessions, redactor_id, "second").await;

        assert_eq!(data.increment_visits("first").await.unwrap(), 1);
        assert_eq!(data.increment_visits("first").await.unwrap(), 2);
        assert_eq!(data.increment_visits("first").await.unwrap(), 3);
        assert_eq!(data.increment_visits("second").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_typed_values() {
        let (data, sessions, redactor_id) = setup().await;
        open_session(&sessions, redactor_id, "s").await;

        assert_eq!(data.get::<String>("s", "theme").await.unwrap(), None);
        data.set("s", "theme", &"dark".to_string()).await.unwrap();
        assert_eq!(data.get::<String>("s", "theme").await.unwrap().as_deref(), Some("dark"));
    }
}
