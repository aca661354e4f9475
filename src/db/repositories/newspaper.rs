//! Newspaper repository
//!
//! Newspapers are stored with their topic reference; redactor credits live in
//! the `newspaper_redactors` association table and are always written in the
//! same transaction as the newspaper row.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Newspaper, NewspaperInput, NewspaperWithTopic, Redactor, Topic};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::{fold_case, like_pattern};
use super::redactor::{row_to_redactor_mysql, row_to_redactor_sqlite, REDACTOR_COLUMNS};

/// Filter for newspaper listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewspaperFilter {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Only newspapers filed under this topic
    pub topic_id: Option<i64>,
}

impl NewspaperFilter {
    fn pattern(&self) -> Option<String> {
        self.title.as_deref().map(like_pattern)
    }
}

/// Newspaper repository trait
#[async_trait]
pub trait NewspaperRepository: Send + Sync {
    /// Create a newspaper and its redactor credits
    async fn create(&self, input: &NewspaperInput, published_date: DateTime<Utc>) -> Result<Newspaper>;

    /// Get newspaper by ID, joined with its topic
    async fn get_by_id(&self, id: i64) -> Result<Option<NewspaperWithTopic>>;

    /// List newspapers, newest first
    async fn list(&self, filter: &NewspaperFilter, offset: i64, limit: i64) -> Result<Vec<NewspaperWithTopic>>;

    /// Count newspapers matching the filter
    async fn count(&self, filter: &NewspaperFilter) -> Result<i64>;

    /// Number of newspapers filed under a topic
    async fn count_by_topic(&self, topic_id: i64) -> Result<i64>;

    /// Newspapers credited to a redactor, newest first
    async fn list_by_redactor(&self, redactor_id: i64) -> Result<Vec<NewspaperWithTopic>>;

    /// Redactors credited on a newspaper, ordered by username
    async fn list_redactors(&self, newspaper_id: i64) -> Result<Vec<Redactor>>;

    /// IDs of the redactors credited on a newspaper
    async fn redactor_ids(&self, newspaper_id: i64) -> Result<Vec<i64>>;

    /// Replace title, content, topic and credits. The published date is kept.
    async fn update(&self, id: i64, input: &NewspaperInput) -> Result<Option<Newspaper>>;

    /// Delete a newspaper. Returns false if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based newspaper repository implementation
pub struct SqlxNewspaperRepository {
    pool: DynDatabasePool,
}

impl SqlxNewspaperRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewspaperRepository> {
        Arc::new(Self::new(pool))
    }
}

const NEWSPAPER_COLUMNS: &str =
    "n.id, n.title, n.content, n.published_date, n.topic_id, t.name AS topic_name";

const NEWSPAPER_ORDER: &str = "ORDER BY n.published_date DESC, n.id DESC";

const FILTER_CLAUSE: &str = r#"
    WHERE (? IS NULL OR n.title_folded LIKE ? ESCAPE '!')
      AND (? IS NULL OR n.topic_id = ?)
"#;

const INSERT_NEWSPAPER: &str =
    "INSERT INTO newspapers (title, title_folded, content, published_date, topic_id) VALUES (?, ?, ?, ?, ?)";

const UPDATE_NEWSPAPER: &str =
    "UPDATE newspapers SET title = ?, title_folded = ?, content = ?, topic_id = ? WHERE id = ?";

const INSERT_CREDIT: &str =
    "INSERT INTO newspaper_redactors (newspaper_id, redactor_id) VALUES (?, ?)";

const DELETE_CREDITS: &str = "DELETE FROM newspaper_redactors WHERE newspaper_id = ?";

const COUNT_BY_TOPIC: &str = "SELECT COUNT(*) AS count FROM newspapers WHERE topic_id = ?";

const SELECT_REDACTOR_IDS: &str =
    "SELECT redactor_id FROM newspaper_redactors WHERE newspaper_id = ? ORDER BY redactor_id";

fn select_by_id() -> String {
    format!(
        "SELECT {} FROM newspapers n JOIN topics t ON t.id = n.topic_id WHERE n.id = ?",
        NEWSPAPER_COLUMNS
    )
}

fn select_page() -> String {
    format!(
        "SELECT {} FROM newspapers n JOIN topics t ON t.id = n.topic_id {} {} LIMIT ? OFFSET ?",
        NEWSPAPER_COLUMNS, FILTER_CLAUSE, NEWSPAPER_ORDER
    )
}

fn count_filtered() -> String {
    format!("SELECT COUNT(*) AS count FROM newspapers n {}", FILTER_CLAUSE)
}

fn select_by_redactor() -> String {
    format!(
        "SELECT {} FROM newspapers n \
         JOIN topics t ON t.id = n.topic_id \
         JOIN newspaper_redactors nr ON nr.newspaper_id = n.id \
         WHERE nr.redactor_id = ? {}",
        NEWSPAPER_COLUMNS, NEWSPAPER_ORDER
    )
}

fn select_credited_redactors() -> String {
    format!(
        "SELECT {} FROM redactors r \
         JOIN newspaper_redactors nr ON nr.redactor_id = r.id \
         WHERE nr.newspaper_id = ? ORDER BY r.username ASC",
        REDACTOR_COLUMNS
    )
}

#[async_trait]
impl NewspaperRepository for SqlxNewspaperRepository {
    async fn create(&self, input: &NewspaperInput, published_date: DateTime<Utc>) -> Result<Newspaper> {
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_newspaper_sqlite(self.pool.sqlite()?, input, published_date).await?
            }
            DatabaseDriver::Mysql => {
                create_newspaper_mysql(self.pool.mysql()?, input, published_date).await?
            }
        };

        Ok(Newspaper {
            id,
            title: input.title.clone(),
            content: input.content.clone(),
            published_date,
            topic_id: input.topic_id,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<NewspaperWithTopic>> {
        let sql = select_by_id();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
                    .context("Failed to get newspaper by ID")?;
                Ok(row.as_ref().map(row_to_newspaper_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.mysql()?)
                    .await
                    .context("Failed to get newspaper by ID")?;
                Ok(row.as_ref().map(row_to_newspaper_mysql))
            }
        }
    }

    async fn list(&self, filter: &NewspaperFilter, offset: i64, limit: i64) -> Result<Vec<NewspaperWithTopic>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_newspapers_sqlite(self.pool.sqlite()?, filter, offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_newspapers_mysql(self.pool.mysql()?, filter, offset, limit).await
            }
        }
    }

    async fn count(&self, filter: &NewspaperFilter) -> Result<i64> {
        let pattern = filter.pattern();
        let sql = count_filtered();
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(&pattern)
                .bind(&pattern)
                .bind(filter.topic_id)
                .bind(filter.topic_id)
                .fetch_one(self.pool.sqlite()?)
                .await
                .context("Failed to count newspapers")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(&pattern)
                .bind(&pattern)
                .bind(filter.topic_id)
                .bind(filter.topic_id)
                .fetch_one(self.pool.mysql()?)
                .await
                .context("Failed to count newspapers")?
                .get("count"),
        };
        Ok(count)
    }

    async fn count_by_topic(&self, topic_id: i64) -> Result<i64> {
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(COUNT_BY_TOPIC)
                .bind(topic_id)
                .fetch_one(self.pool.sqlite()?)
                .await
                .context("Failed to count newspapers by topic")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(COUNT_BY_TOPIC)
                .bind(topic_id)
                .fetch_one(self.pool.mysql()?)
                .await
                .context("Failed to count newspapers by topic")?
                .get("count"),
        };
        Ok(count)
    }

    async fn list_by_redactor(&self, redactor_id: i64) -> Result<Vec<NewspaperWithTopic>> {
        let sql = select_by_redactor();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .bind(redactor_id)
                    .fetch_all(self.pool.sqlite()?)
                    .await
                    .context("Failed to list newspapers by redactor")?;
                Ok(rows.iter().map(row_to_newspaper_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .bind(redactor_id)
                    .fetch_all(self.pool.mysql()?)
                    .await
                    .context("Failed to list newspapers by redactor")?;
                Ok(rows.iter().map(row_to_newspaper_mysql).collect())
            }
        }
    }

    async fn list_redactors(&self, newspaper_id: i64) -> Result<Vec<Redactor>> {
        let sql = select_credited_redactors();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .bind(newspaper_id)
                    .fetch_all(self.pool.sqlite()?)
                    .await
                    .context("Failed to list newspaper redactors")?;
                rows.iter().map(row_to_redactor_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .bind(newspaper_id)
                    .fetch_all(self.pool.mysql()?)
                    .await
                    .context("Failed to list newspaper redactors")?;
                rows.iter().map(row_to_redactor_mysql).collect()
            }
        }
    }

    async fn redactor_ids(&self, newspaper_id: i64) -> Result<Vec<i64>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(SELECT_REDACTOR_IDS)
                    .bind(newspaper_id)
                    .fetch_all(self.pool.sqlite()?)
                    .await
                    .context("Failed to get newspaper redactor IDs")?;
                Ok(rows.iter().map(|row| row.get("redactor_id")).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(SELECT_REDACTOR_IDS)
                    .bind(newspaper_id)
                    .fetch_all(self.pool.mysql()?)
                    .await
                    .context("Failed to get newspaper redactor IDs")?;
                Ok(rows.iter().map(|row| row.get("redactor_id")).collect())
            }
        }
    }

    async fn update(&self, id: i64, input: &NewspaperInput) -> Result<Option<Newspaper>> {
        let updated = match self.pool.driver() {
            DatabaseDriver::Sqlite => update_newspaper_sqlite(self.pool.sqlite()?, id, input).await?,
            DatabaseDriver::Mysql => update_newspaper_mysql(self.pool.mysql()?, id, input).await?,
        };
        if !updated {
            return Ok(None);
        }

        Ok(self.get_by_id(id).await?.map(|found| found.newspaper))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query("DELETE FROM newspapers WHERE id = ?")
                .bind(id)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to delete newspaper")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query("DELETE FROM newspapers WHERE id = ?")
                .bind(id)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to delete newspaper")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_newspaper_sqlite(
    pool: &SqlitePool,
    input: &NewspaperInput,
    published_date: DateTime<Utc>,
) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let id = sqlx::query(INSERT_NEWSPAPER)
        .bind(&input.title)
        .bind(fold_case(&input.title))
        .bind(&input.content)
        .bind(published_date)
        .bind(input.topic_id)
        .execute(&mut *tx)
        .await
        .context("Failed to create newspaper")?
        .last_insert_rowid();

    for redactor_id in &input.redactor_ids {
        sqlx::query(INSERT_CREDIT)
            .bind(id)
            .bind(redactor_id)
            .execute(&mut *tx)
            .await
            .context("Failed to credit redactor")?;
    }

    tx.commit().await.context("Failed to commit newspaper")?;
    Ok(id)
}

async fn update_newspaper_sqlite(pool: &SqlitePool, id: i64, input: &NewspaperInput) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let affected = sqlx::query(UPDATE_NEWSPAPER)
        .bind(&input.title)
        .bind(fold_case(&input.title))
        .bind(&input.content)
        .bind(input.topic_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update newspaper")?
        .rows_affected();
    if affected == 0 {
        tx.rollback().await.context("Failed to roll back update")?;
        return Ok(false);
    }

    sqlx::query(DELETE_CREDITS)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear newspaper redactors")?;
    for redactor_id in &input.redactor_ids {
        sqlx::query(INSERT_CREDIT)
            .bind(id)
            .bind(redactor_id)
            .execute(&mut *tx)
            .await
            .context("Failed to credit redactor")?;
    }

    tx.commit().await.context("Failed to commit newspaper update")?;
    Ok(true)
}

async fn list_newspapers_sqlite(
    pool: &SqlitePool,
    filter: &NewspaperFilter,
    offset: i64,
    limit: i64,
) -> Result<Vec<NewspaperWithTopic>> {
    let pattern = filter.pattern();
    let sql = select_page();
    let rows = sqlx::query(&sql)
        .bind(&pattern)
        .bind(&pattern)
        .bind(filter.topic_id)
        .bind(filter.topic_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list newspapers")?;

    Ok(rows.iter().map(row_to_newspaper_sqlite).collect())
}

fn row_to_newspaper_sqlite(row: &sqlx::sqlite::SqliteRow) -> NewspaperWithTopic {
    let topic_id: i64 = row.get("topic_id");
    NewspaperWithTopic {
        newspaper: Newspaper {
            id: row.get("id"),
            title: row.get("title"),
            content: row.get("content"),
            published_date: row.get("published_date"),
            topic_id,
        },
        topic: Topic {
            id: topic_id,
            name: row.get("topic_name"),
        },
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_newspaper_mysql(
    pool: &MySqlPool,
    input: &NewspaperInput,
    published_date: DateTime<Utc>,
) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let id = sqlx::query(INSERT_NEWSPAPER)
        .bind(&input.title)
        .bind(fold_case(&input.title))
        .bind(&input.content)
        .bind(published_date)
        .bind(input.topic_id)
        .execute(&mut *tx)
        .await
        .context("Failed to create newspaper")?
        .last_insert_id() as i64;

    for redactor_id in &input.redactor_ids {
        sqlx::query(INSERT_CREDIT)
            .bind(id)
            .bind(redactor_id)
            .execute(&mut *tx)
            .await
            .context("Failed to credit redactor")?;
    }

    tx.commit().await.context("Failed to commit newspaper")?;
    Ok(id)
}

async fn update_newspaper_mysql(pool: &MySqlPool, id: i64, input: &NewspaperInput) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    // MySQL reports matched rows as affected only when a value changes
    let exists = sqlx::query("SELECT id FROM newspapers WHERE id = ? FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to lock newspaper")?
        .is_some();
    if !exists {
        tx.rollback().await.context("Failed to roll back update")?;
        return Ok(false);
    }

    sqlx::query(UPDATE_NEWSPAPER)
        .bind(&input.title)
        .bind(fold_case(&input.title))
        .bind(&input.content)
        .bind(input.topic_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update newspaper")?;

    sqlx::query(DELETE_CREDITS)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear newspaper redactors")?;
    for redactor_id in &input.redactor_ids {
        sqlx::query(INSERT_CREDIT)
            .bind(id)
            .bind(redactor_id)
            .execute(&mut *tx)
            .await
            .context("Failed to credit redactor")?;
    }

    tx.commit().await.context("Failed to commit newspaper update")?;
    Ok(true)
}

async fn list_newspapers_mysql(
    pool: &MySqlPool,
    filter: &NewspaperFilter,
    offset: i64,
    limit: i64,
) -> Result<Vec<NewspaperWithTopic>> {
    let pattern = filter.pattern();
    let sql = select_page();
    let rows = sqlx::query(&sql)
        .bind(&pattern)
        .bind(&pattern)
        .bind(filter.topic_id)
        .bind(filter.topic_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list newspapers")?;

    Ok(rows.iter().map(row_to_newspaper_mysql).collect())
}

fn row_to_newspaper_mysql(row: &sqlx::mysql::MySqlRow) -> NewspaperWithTopic {
    let topic_id: i64 = row.get("topic_id");
    NewspaperWithTopic {
        newspaper: Newspaper {
            id: row.get("id"),
            title: row.get("title"),
            content: row.get("content"),
            published_date: row.get("published_date"),
            topic_id,
        },
        topic: Topic {
            id: topic_id,
            name: row.get("topic_name"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        RedactorRepository, SqlxRedactorRepository, SqlxTopicRepository, TopicRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use chrono::{Duration, SubsecRound};

    struct Fixture {
        repo: SqlxNewspaperRepository,
        topics: SqlxTopicRepository,
        redactors: SqlxRedactorRepository,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        Fixture {
            repo: SqlxNewspaperRepository::new(pool.clone()),
            topics: SqlxTopicRepository::new(pool.clone()),
            redactors: SqlxRedactorRepository::new(pool),
        }
    }

    fn input(title: &str, topic_id: i64, redactor_ids: Vec<i64>) -> NewspaperInput {
        NewspaperInput {
            title: title.into(),
            content: format!("{} body", title),
            topic_id,
            redactor_ids,
        }
    }

    #[tokio::test]
    async fn test_create_with_redactors() {
        let f = setup().await;
        let topic = f.topics.create("Politics").await.unwrap();
        let a = f.redactors.create(&Redactor::new("bob", "h", "", "", 1)).await.unwrap();
        let b = f.redactors.create(&Redactor::new("alice", "h", "", "", 2)).await.unwrap();

        let created = f
            .repo
            .create(&input("Election", topic.id, vec![a.id, b.id]), Utc::now())
            .await
            .unwrap();

        let found = f.repo.get_by_id(created.id).await.unwrap().expect("not found");
        assert_eq!(found.newspaper.title, "Election");
        assert_eq!(found.topic.name, "Politics");

        let credited = f.repo.list_redactors(created.id).await.unwrap();
        let names: Vec<&str> = credited.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);

        let mut ids = vec![a.id, b.id];
        ids.sort();
        assert_eq!(f.repo.redactor_ids(created.id).await.unwrap(), ids);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_filters() {
        let f = setup().await;
        let politics = f.topics.create("Politics").await.unwrap();
        let sport = f.topics.create("Sport").await.unwrap();
        let now = Utc::now();

        f.repo.create(&input("Old vote", politics.id, vec![]), now - Duration::days(2)).await.unwrap();
        f.repo.create(&input("Match day", sport.id, vec![]), now - Duration::days(1)).await.unwrap();
        f.repo.create(&input("New vote", politics.id, vec![]), now).await.unwrap();

        let all = f.repo.list(&NewspaperFilter::default(), 0, 10).await.unwrap();
        let titles: Vec<&str> = all.iter().map(|n| n.newspaper.title.as_str()).collect();
        assert_eq!(titles, vec!["New vote", "Match day", "Old vote"]);

        let votes = NewspaperFilter {
            title: Some("VOTE".into()),
            topic_id: None,
        };
        assert_eq!(f.repo.count(&votes).await.unwrap(), 2);

        let sport_only = NewspaperFilter {
            title: None,
            topic_id: Some(sport.id),
        };
        let found = f.repo.list(&sport_only, 0, 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].newspaper.title, "Match day");

        assert_eq!(f.repo.count_by_topic(politics.id).await.unwrap(), 2);
        assert!(f.repo.list(&NewspaperFilter::default(), 10, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_title_search_folds_non_ascii_case() {
        let f = setup().await;
        let topic = f.topics.create("Europe").await.unwrap();
        let created = f
            .repo
            .create(&input("ÉLECTIONS À ZÜRICH", topic.id, vec![]), Utc::now())
            .await
            .unwrap();

        let filter = |term: &str| NewspaperFilter {
            title: Some(term.into()),
            topic_id: None,
        };
        assert_eq!(f.repo.count(&filter("élections à zürich")).await.unwrap(), 1);

        f.repo
            .update(created.id, &input("Ärger im Rathaus", topic.id, vec![]))
            .await
            .unwrap();
        let found = f.repo.list(&filter("ÄRGER"), 0, 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].newspaper.title, "Ärger im Rathaus");
    }

    #[tokio::test]
    async fn test_update_replaces_redactors_and_keeps_date() {
        let f = setup().await;
        let politics = f.topics.create("Politics").await.unwrap();
        let sport = f.topics.create("Sport").await.unwrap();
        let a = f.redactors.create(&Redactor::new("a", "h", "", "", 0)).await.unwrap();
        let b = f.redactors.create(&Redactor::new("b", "h", "", "", 0)).await.unwrap();

        let created = f
            .repo
            .create(&input("Draft", politics.id, vec![a.id]), Utc::now().trunc_subsecs(6))
            .await
            .unwrap();

        let updated = f
            .repo
            .update(created.id, &input("Final", sport.id, vec![b.id]))
            .await
            .unwrap()
            .expect("not found");
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.topic_id, sport.id);
        assert_eq!(updated.published_date, created.published_date);
        assert_eq!(f.repo.redactor_ids(created.id).await.unwrap(), vec![b.id]);

        assert!(f.repo.update(999, &input("x", sport.id, vec![])).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_redactor_and_delete() {
        let f = setup().await;
        let topic = f.topics.create("Politics").await.unwrap();
        let a = f.redactors.create(&Redactor::new("a", "h", "", "", 0)).await.unwrap();

        let credited = f.repo.create(&input("Credited", topic.id, vec![a.id]), Utc::now()).await.unwrap();
        f.repo.create(&input("Other", topic.id, vec![]), Utc::now()).await.unwrap();

        let found = f.repo.list_by_redactor(a.id).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].newspaper.id, credited.id);

        assert!(f.repo.delete(credited.id).await.unwrap());
        assert!(f.repo.list_by_redactor(a.id).await.unwrap().is_empty());
        assert!(f.repo.get_by_id(credited.id).await.unwrap().is_none());
        assert!(!f.repo.delete(credited.id).await.unwrap());
    }
}
