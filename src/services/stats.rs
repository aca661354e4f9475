//! Index page statistics

use crate::db::repositories::{NewspaperFilter, NewspaperRepository, RedactorFilter, RedactorRepository, TopicFilter, TopicRepository};
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

use super::{ServiceResult, SessionData};

/// Entity counts plus the caller's visit counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub num_redactors: i64,
    pub num_newspapers: i64,
    pub num_topics: i64,
    pub num_visits: u64,
}

/// Builds the index view
pub struct StatsService {
    topics: Arc<dyn TopicRepository>,
    redactors: Arc<dyn RedactorRepository>,
    newspapers: Arc<dyn NewspaperRepository>,
    session_data: Arc<SessionData>,
}

impl StatsService {
    pub fn new(
        topics: Arc<dyn TopicRepository>,
        redactors: Arc<dyn RedactorRepository>,
        newspapers: Arc<dyn NewspaperRepository>,
        session_data: Arc<SessionData>,
    ) -> Self {
        Self {
            topics,
            redactors,
            newspapers,
            session_data,
        }
    }

    /// Count every entity and record one more visit for `session_id`
    pub async fn index(&self, session_id: &str) -> ServiceResult<IndexStats> {
        let num_redactors = self
            .redactors
            .count(&RedactorFilter::default())
            .await
            .context("Failed to count redactors")?;
        let num_newspapers = self
            .newspapers
            .count(&NewspaperFilter::default())
            .await
            .context("Failed to count newspapers")?;
        let num_topics = self
            .topics
            .count(&TopicFilter::default())
            .await
            .context("Failed to count topics")?;
        let num_visits = self.session_data.increment_visits(session_id).await?;

        Ok(IndexStats {
            num_redactors,
            num_newspapers,
            num_topics,
            num_visits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxNewspaperRepository, SqlxRedactorRepository, SqlxSessionRepository, SqlxTopicRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{NewspaperInput, Redactor, Session};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_index_counts_and_visits() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let topics = SqlxTopicRepository::boxed(pool.clone());
        let redactors = SqlxRedactorRepository::boxed(pool.clone());
        let newspapers = SqlxNewspaperRepository::boxed(pool.clone());
        let sessions = SqlxSessionRepository::boxed(pool);

        let topic = topics.create("Politics").await.unwrap();
        topics.create("Sports").await.unwrap();
        let redactor = redactors.create(&Redactor::new("jdoe", "h", "", "", 1)).await.unwrap();
        newspapers
            .create(
                &NewspaperInput {
                    title: "Election".into(),
                    content: "Results".into(),
                    topic_id: topic.id,
                    redactor_ids: vec![redactor.id],
                },
                Utc::now(),
            )
            .await
            .unwrap();
        let now = Utc::now();
        sessions
            .create(&Session {
                id: "token".into(),
                redactor_id: redactor.id,
                expires_at: now + Duration::days(1),
                created_at: now,
            })
            .await
            .unwrap();

        let service = StatsService::new(
            topics,
            redactors,
            newspapers,
            Arc::new(SessionData::new(sessions)),
        );

        let first = service.index("token").await.unwrap();
        assert_eq!(
            first,
            IndexStats {
                num_redactors: 1,
                num_newspapers: 1,
                num_topics: 2,
                num_visits: 1,
            }
        );
        assert_eq!(service.index("token").await.unwrap().num_visits, 2);
    }
}
