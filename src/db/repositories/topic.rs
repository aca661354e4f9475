//! Topic repository
//!
//! - `TopicRepository` trait defining the interface for topic data access
//! - `SqlxTopicRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Topic;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::{fold_case, like_pattern};

/// Filter for topic listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicFilter {
    /// Case-insensitive substring of the name
    pub name: Option<String>,
}

impl TopicFilter {
    fn pattern(&self) -> Option<String> {
        self.name.as_deref().map(like_pattern)
    }
}

/// Topic repository trait
#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// Create a new topic
    async fn create(&self, name: &str) -> Result<Topic>;

    /// Get topic by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Topic>>;

    /// List topics ordered by name
    async fn list(&self, filter: &TopicFilter, offset: i64, limit: i64) -> Result<Vec<Topic>>;

    /// Count topics matching the filter
    async fn count(&self, filter: &TopicFilter) -> Result<i64>;

    /// Every topic, ordered by name
    async fn list_all(&self) -> Result<Vec<Topic>>;

    /// Rename a topic
    async fn update(&self, topic: &Topic) -> Result<Topic>;

    /// Delete a topic. Returns false if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based topic repository implementation
pub struct SqlxTopicRepository {
    pool: DynDatabasePool,
}

impl SqlxTopicRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TopicRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_TOPICS: &str = r#"
    SELECT id, name
    FROM topics
    WHERE (? IS NULL OR name_folded LIKE ? ESCAPE '!')
    ORDER BY name ASC, id ASC
    LIMIT ? OFFSET ?
"#;

const INSERT_TOPIC: &str = "INSERT INTO topics (name, name_folded) VALUES (?, ?)";

const COUNT_TOPICS: &str = r#"
    SELECT COUNT(*) AS count
    FROM topics
    WHERE (? IS NULL OR name_folded LIKE ? ESCAPE '!')
"#;

#[async_trait]
impl TopicRepository for SqlxTopicRepository {
    async fn create(&self, name: &str) -> Result<Topic> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_topic_sqlite(self.pool.sqlite()?, name).await,
            DatabaseDriver::Mysql => create_topic_mysql(self.pool.mysql()?, name).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Topic>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_topic_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_topic_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list(&self, filter: &TopicFilter, offset: i64, limit: i64) -> Result<Vec<Topic>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_topics_sqlite(self.pool.sqlite()?, filter, offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_topics_mysql(self.pool.mysql()?, filter, offset, limit).await
            }
        }
    }

    async fn count(&self, filter: &TopicFilter) -> Result<i64> {
        let pattern = filter.pattern();
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(COUNT_TOPICS)
                .bind(&pattern)
                .bind(&pattern)
                .fetch_one(self.pool.sqlite()?)
                .await
                .context("Failed to count topics")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(COUNT_TOPICS)
                .bind(&pattern)
                .bind(&pattern)
                .fetch_one(self.pool.mysql()?)
                .await
                .context("Failed to count topics")?
                .get("count"),
        };
        Ok(count)
    }

    async fn list_all(&self) -> Result<Vec<Topic>> {
        self.list(&TopicFilter::default(), 0, i64::MAX).await
    }

    async fn update(&self, topic: &Topic) -> Result<Topic> {
        const UPDATE_TOPIC: &str = "UPDATE topics SET name = ?, name_folded = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(UPDATE_TOPIC)
                    .bind(&topic.name)
                    .bind(fold_case(&topic.name))
                    .bind(topic.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update topic")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(UPDATE_TOPIC)
                    .bind(&topic.name)
                    .bind(fold_case(&topic.name))
                    .bind(topic.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update topic")?;
            }
        }

        self.get_by_id(topic.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Topic not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query("DELETE FROM topics WHERE id = ?")
                .bind(id)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to delete topic")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query("DELETE FROM topics WHERE id = ?")
                .bind(id)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to delete topic")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_topic_sqlite(pool: &SqlitePool, name: &str) -> Result<Topic> {
    let result = sqlx::query(INSERT_TOPIC)
        .bind(name)
        .bind(fold_case(name))
        .execute(pool)
        .await
        .context("Failed to create topic")?;

    Ok(Topic {
        id: result.last_insert_rowid(),
        name: name.to_string(),
    })
}

async fn get_topic_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Topic>> {
    let row = sqlx::query("SELECT id, name FROM topics WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get topic by ID")?;

    Ok(row.map(|row| row_to_topic_sqlite(&row)))
}

async fn list_topics_sqlite(
    pool: &SqlitePool,
    filter: &TopicFilter,
    offset: i64,
    limit: i64,
) -> Result<Vec<Topic>> {
    let pattern = filter.pattern();
    let rows = sqlx::query(SELECT_TOPICS)
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list topics")?;

    Ok(rows.iter().map(row_to_topic_sqlite).collect())
}

fn row_to_topic_sqlite(row: &sqlx::sqlite::SqliteRow) -> Topic {
    Topic {
        id: row.get("id"),
        name: row.get("name"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_topic_mysql(pool: &MySqlPool, name: &str) -> Result<Topic> {
    let result = sqlx::query(INSERT_TOPIC)
        .bind(name)
        .bind(fold_case(name))
        .execute(pool)
        .await
        .context("Failed to create topic")?;

    Ok(Topic {
        id: result.last_insert_id() as i64,
        name: name.to_string(),
    })
}

async fn get_topic_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Topic>> {
    let row = sqlx::query("SELECT id, name FROM topics WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get topic by ID")?;

    Ok(row.map(|row| row_to_topic_mysql(&row)))
}

async fn list_topics_mysql(
    pool: &MySqlPool,
    filter: &TopicFilter,
    offset: i64,
    limit: i64,
) -> Result<Vec<Topic>> {
    let pattern = filter.pattern();
    let rows = sqlx::query(SELECT_TOPICS)
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list topics")?;

    Ok(rows.iter().map(row_to_topic_mysql).collect())
}

fn row_to_topic_mysql(row: &sqlx::mysql::MySqlRow) -> Topic {
    Topic {
        id: row.get("id"),
        name: row.get("name"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxTopicRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxTopicRepository::new(pool)
    }

    fn name_filter(term: &str) -> TopicFilter {
        TopicFilter {
            name: Some(term.to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_topic() {
        let repo = setup_test_repo().await;
        let created = repo.create("Politics").await.expect("Failed to create topic");
        assert!(created.id > 0);

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get topic")
            .expect("Topic not found");
        assert_eq!(found, created);
        assert!(repo.get_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_name() {
        let repo = setup_test_repo().await;
        for name in ["Sports", "Culture", "Politics"] {
            repo.create(name).await.unwrap();
        }

        let names: Vec<String> = repo
            .list(&TopicFilter::default(), 0, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Culture", "Politics", "Sports"]);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let repo = setup_test_repo().await;
        repo.create("Politics").await.unwrap();
        repo.create("Geopolitics").await.unwrap();
        repo.create("Sports").await.unwrap();

        let found = repo.list(&name_filter("POLIT"), 0, 10).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(repo.count(&name_filter("polit")).await.unwrap(), 2);

        assert!(repo.list(&name_filter("weather"), 0, 10).await.unwrap().is_empty());
        assert_eq!(repo.count(&TopicFilter::default()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let repo = setup_test_repo().await;
        let mut topic = repo.create("Économie").await.unwrap();
        repo.create("Sports").await.unwrap();

        let found = repo.list(&name_filter("économie"), 0, 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Économie");
        assert_eq!(repo.count(&name_filter("ÉCON")).await.unwrap(), 1);

        topic.name = "Öffentlichkeit".to_string();
        repo.update(&topic).await.unwrap();
        assert_eq!(repo.count(&name_filter("öffentlich")).await.unwrap(), 1);
        assert_eq!(repo.count(&name_filter("économie")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let repo = setup_test_repo().await;
        repo.create("100% Local").await.unwrap();
        repo.create("1000 Local").await.unwrap();

        let found = repo.list(&name_filter("100%"), 0, 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "100% Local");
        assert_eq!(repo.count(&name_filter("_")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pagination_window() {
        let repo = setup_test_repo().await;
        for i in 0..6 {
            repo.create(&format!("Topic {}", i)).await.unwrap();
        }

        let page = repo.list(&TopicFilter::default(), 4, 4).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].name, "Topic 4");
        assert!(repo.list(&TopicFilter::default(), 40, 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = setup_test_repo().await;
        let mut topic = repo.create("Economy").await.unwrap();

        topic.name = "Economics".to_string();
        let updated = repo.update(&topic).await.unwrap();
        assert_eq!(updated.name, "Economics");

        assert!(repo.delete(topic.id).await.unwrap());
        assert!(!repo.delete(topic.id).await.unwrap());
        assert!(repo.get_by_id(topic.id).await.unwrap().is_none());
    }
}
