//! Redactor repository
//!
//! - `RedactorRepository` trait defining the interface for redactor data access
//! - `SqlxRedactorRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Redactor;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::{fold_case, like_pattern};

/// Filter for redactor listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedactorFilter {
    /// Case-insensitive substring of the username
    pub username: Option<String>,
    /// Case-insensitive substring of the username, first name or last name
    pub query: Option<String>,
}

impl RedactorFilter {
    fn patterns(&self) -> (Option<String>, Option<String>) {
        (
            self.username.as_deref().map(like_pattern),
            self.query.as_deref().map(like_pattern),
        )
    }
}

/// Redactor repository trait
#[async_trait]
pub trait RedactorRepository: Send + Sync {
    /// Create a new redactor
    async fn create(&self, redactor: &Redactor) -> Result<Redactor>;

    /// Get redactor by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Redactor>>;

    /// Get redactor by exact username
    async fn get_by_username(&self, username: &str) -> Result<Option<Redactor>>;

    /// List redactors ordered by username
    async fn list(&self, filter: &RedactorFilter, offset: i64, limit: i64) -> Result<Vec<Redactor>>;

    /// Count redactors matching the filter
    async fn count(&self, filter: &RedactorFilter) -> Result<i64>;

    /// Every redactor, ordered by username
    async fn list_all(&self) -> Result<Vec<Redactor>>;

    /// The subset of `ids` that exist
    async fn existing_ids(&self, ids: &[i64]) -> Result<Vec<i64>>;

    /// Save profile fields and staff flags
    async fn update(&self, redactor: &Redactor) -> Result<Redactor>;

    /// Delete a redactor. Returns false if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based redactor repository implementation
pub struct SqlxRedactorRepository {
    pool: DynDatabasePool,
}

impl SqlxRedactorRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn RedactorRepository> {
        Arc::new(Self::new(pool))
    }
}

pub(crate) const REDACTOR_COLUMNS: &str = "r.id, r.username, r.password_hash, r.first_name, \
     r.last_name, r.years_of_experience, r.is_staff, r.is_superuser, r.date_joined";

const FILTER_CLAUSE: &str = r#"
    WHERE (? IS NULL OR r.username_folded LIKE ? ESCAPE '!')
      AND (? IS NULL
           OR r.username_folded LIKE ? ESCAPE '!'
           OR r.first_name_folded LIKE ? ESCAPE '!'
           OR r.last_name_folded LIKE ? ESCAPE '!')
"#;

const INSERT_REDACTOR: &str = r#"
    INSERT INTO redactors
        (username, password_hash, first_name, last_name, years_of_experience,
         is_staff, is_superuser, date_joined,
         username_folded, first_name_folded, last_name_folded)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_REDACTOR: &str = r#"
    UPDATE redactors
    SET username = ?, first_name = ?, last_name = ?, years_of_experience = ?,
        is_staff = ?, is_superuser = ?,
        username_folded = ?, first_name_folded = ?, last_name_folded = ?
    WHERE id = ?
"#;

fn select_one(column: &str) -> String {
    format!("SELECT {} FROM redactors r WHERE r.{} = ?", REDACTOR_COLUMNS, column)
}

fn select_page() -> String {
    format!(
        "SELECT {} FROM redactors r {} ORDER BY r.username ASC LIMIT ? OFFSET ?",
        REDACTOR_COLUMNS, FILTER_CLAUSE
    )
}

fn count_filtered() -> String {
    format!("SELECT COUNT(*) AS count FROM redactors r {}", FILTER_CLAUSE)
}

fn select_existing_ids(len: usize) -> String {
    let placeholders = vec!["?"; len].join(", ");
    format!("SELECT id FROM redactors WHERE id IN ({})", placeholders)
}

#[async_trait]
impl RedactorRepository for SqlxRedactorRepository {
    async fn create(&self, redactor: &Redactor) -> Result<Redactor> {
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(INSERT_REDACTOR)
                .bind(&redactor.username)
                .bind(&redactor.password_hash)
                .bind(&redactor.first_name)
                .bind(&redactor.last_name)
                .bind(redactor.years_of_experience as i64)
                .bind(redactor.is_staff)
                .bind(redactor.is_superuser)
                .bind(redactor.date_joined)
                .bind(fold_case(&redactor.username))
                .bind(fold_case(&redactor.first_name))
                .bind(fold_case(&redactor.last_name))
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create redactor")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(INSERT_REDACTOR)
                .bind(&redactor.username)
                .bind(&redactor.password_hash)
                .bind(&redactor.first_name)
                .bind(&redactor.last_name)
                .bind(redactor.years_of_experience as i64)
                .bind(redactor.is_staff)
                .bind(redactor.is_superuser)
                .bind(redactor.date_joined)
                .bind(fold_case(&redactor.username))
                .bind(fold_case(&redactor.first_name))
                .bind(fold_case(&redactor.last_name))
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create redactor")?
                .last_insert_id() as i64,
        };

        Ok(Redactor {
            id,
            ..redactor.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Redactor>> {
        let sql = select_one("id");
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
                    .context("Failed to get redactor by ID")?;
                row.as_ref().map(row_to_redactor_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.mysql()?)
                    .await
                    .context("Failed to get redactor by ID")?;
                row.as_ref().map(row_to_redactor_mysql).transpose()
            }
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Redactor>> {
        let sql = select_one("username");
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(username)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
                    .context("Failed to get redactor by username")?;
                row.as_ref().map(row_to_redactor_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(username)
                    .fetch_optional(self.pool.mysql()?)
                    .await
                    .context("Failed to get redactor by username")?;
                row.as_ref().map(row_to_redactor_mysql).transpose()
            }
        }
    }

    async fn list(&self, filter: &RedactorFilter, offset: i64, limit: i64) -> Result<Vec<Redactor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_redactors_sqlite(self.pool.sqlite()?, filter, offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_redactors_mysql(self.pool.mysql()?, filter, offset, limit).await
            }
        }
    }

    async fn count(&self, filter: &RedactorFilter) -> Result<i64> {
        let (username, query) = filter.patterns();
        let sql = count_filtered();
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(&username)
                .bind(&username)
                .bind(&query)
                .bind(&query)
                .bind(&query)
                .bind(&query)
                .fetch_one(self.pool.sqlite()?)
                .await
                .context("Failed to count redactors")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(&username)
                .bind(&username)
                .bind(&query)
                .bind(&query)
                .bind(&query)
                .bind(&query)
                .fetch_one(self.pool.mysql()?)
                .await
                .context("Failed to count redactors")?
                .get("count"),
        };
        Ok(count)
    }

    async fn list_all(&self) -> Result<Vec<Redactor>> {
        self.list(&RedactorFilter::default(), 0, i64::MAX).await
    }

    async fn existing_ids(&self, ids: &[i64]) -> Result<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = select_existing_ids(ids.len());
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let mut query = sqlx::query(&sql);
                for id in ids {
                    query = query.bind(*id);
                }
                let rows = query
                    .fetch_all(self.pool.sqlite()?)
                    .await
                    .context("Failed to check redactor IDs")?;
                Ok(rows.iter().map(|row| row.get("id")).collect())
            }
            DatabaseDriver::Mysql => {
                let mut query = sqlx::query(&sql);
                for id in ids {
                    query = query.bind(*id);
                }
                let rows = query
                    .fetch_all(self.pool.mysql()?)
                    .await
                    .context("Failed to check redactor IDs")?;
                Ok(rows.iter().map(|row| row.get("id")).collect())
            }
        }
    }

    async fn update(&self, redactor: &Redactor) -> Result<Redactor> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(UPDATE_REDACTOR)
                    .bind(&redactor.username)
                    .bind(&redactor.first_name)
                    .bind(&redactor.last_name)
                    .bind(redactor.years_of_experience as i64)
                    .bind(redactor.is_staff)
                    .bind(redactor.is_superuser)
                    .bind(fold_case(&redactor.username))
                    .bind(fold_case(&redactor.first_name))
                    .bind(fold_case(&redactor.last_name))
                    .bind(redactor.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update redactor")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(UPDATE_REDACTOR)
                    .bind(&redactor.username)
                    .bind(&redactor.first_name)
                    .bind(&redactor.last_name)
                    .bind(redactor.years_of_experience as i64)
                    .bind(redactor.is_staff)
                    .bind(redactor.is_superuser)
                    .bind(fold_case(&redactor.username))
                    .bind(fold_case(&redactor.first_name))
                    .bind(fold_case(&redactor.last_name))
                    .bind(redactor.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update redactor")?;
            }
        }

        self.get_by_id(redactor.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Redactor not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query("DELETE FROM redactors WHERE id = ?")
                .bind(id)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to delete redactor")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query("DELETE FROM redactors WHERE id = ?")
                .bind(id)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to delete redactor")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}

fn experience_from_column(value: i64) -> Result<u32> {
    u32::try_from(value).with_context(|| format!("Invalid years_of_experience value: {}", value))
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn list_redactors_sqlite(
    pool: &SqlitePool,
    filter: &RedactorFilter,
    offset: i64,
    limit: i64,
) -> Result<Vec<Redactor>> {
    let (username, query) = filter.patterns();
    let sql = select_page();
    let rows = sqlx::query(&sql)
        .bind(&username)
        .bind(&username)
        .bind(&query)
        .bind(&query)
        .bind(&query)
        .bind(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list redactors")?;

    rows.iter().map(row_to_redactor_sqlite).collect()
}

pub(crate) fn row_to_redactor_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Redactor> {
    Ok(Redactor {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        years_of_experience: experience_from_column(row.get("years_of_experience"))?,
        is_staff: row.get("is_staff"),
        is_superuser: row.get("is_superuser"),
        date_joined: row.get("date_joined"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn list_redactors_mysql(
    pool: &MySqlPool,
    filter: &RedactorFilter,
    offset: i64,
    limit: i64,
) -> Result<Vec<Redactor>> {
    let (username, query) = filter.patterns();
    let sql = select_page();
    let rows = sqlx::query(&sql)
        .bind(&username)
        .bind(&username)
        .bind(&query)
        .bind(&query)
        .bind(&query)
        .bind(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list redactors")?;

    rows.iter().map(row_to_redactor_mysql).collect()
}

pub(crate) fn row_to_redactor_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Redactor> {
    Ok(Redactor {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        years_of_experience: experience_from_column(row.get("years_of_experience"))?,
        is_staff: row.get("is_staff"),
        is_superuser: row.get("is_superuser"),
        date_joined: row.get("date_joined"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxRedactorRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxRedactorRepository::new(pool)
    }

    async fn create(repo: &SqlxRedactorRepository, username: &str, first: &str, last: &str) -> Redactor {
        repo.create(&Redactor::new(username, "hash", first, last, 3))
            .await
            .expect("Failed to create redactor")
    }

    #[tokio::test]
    async fn test_create_and_get_redactor() {
        let repo = setup_test_repo().await;
        let created = create(&repo, "jdoe", "John", "Doe").await;
        assert!(created.id > 0);

        let by_id = repo.get_by_id(created.id).await.unwrap().expect("not found");
        assert_eq!(by_id.username, "jdoe");
        assert_eq!(by_id.years_of_experience, 3);
        assert_eq!(by_id.password_hash, "hash");
        assert!(!by_id.is_staff);

        let by_name = repo.get_by_username("jdoe").await.unwrap().expect("not found");
        assert_eq!(by_name.id, created.id);
        assert!(repo.get_by_username("JDOE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let repo = setup_test_repo().await;
        create(&repo, "jdoe", "", "").await;
        assert!(repo.create(&Redactor::new("jdoe", "h", "", "", 0)).await.is_err());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let repo = setup_test_repo().await;
        create(&repo, "zed", "Anna", "Smith").await;
        create(&repo, "jdoe", "John", "Doe").await;
        create(&repo, "asmith", "Al", "Brown").await;

        let all = repo.list(&RedactorFilter::default(), 0, 10).await.unwrap();
        let usernames: Vec<&str> = all.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(usernames, vec!["asmith", "jdoe", "zed"]);

        let by_username = RedactorFilter {
            username: Some("SMITH".into()),
            query: None,
        };
        let found = repo.list(&by_username, 0, 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "asmith");

        let by_any_name = RedactorFilter {
            username: None,
            query: Some("smith".into()),
        };
        assert_eq!(repo.count(&by_any_name).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_name_search_folds_non_ascii_case() {
        let repo = setup_test_repo().await;
        let mut redactor = create(&repo, "łukasz", "Ørjan", "Ébert").await;
        create(&repo, "jdoe", "John", "Doe").await;

        let by_username = RedactorFilter {
            username: Some("ŁUK".into()),
            query: None,
        };
        assert_eq!(repo.count(&by_username).await.unwrap(), 1);

        let by_last_name = RedactorFilter {
            username: None,
            query: Some("ébert".into()),
        };
        assert_eq!(repo.count(&by_last_name).await.unwrap(), 1);

        redactor.first_name = "Þórr".into();
        repo.update(&redactor).await.unwrap();
        let by_first_name = RedactorFilter {
            username: None,
            query: Some("ÞÓRR".into()),
        };
        let found = repo.list(&by_first_name, 0, 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "łukasz");
    }

    #[tokio::test]
    async fn test_existing_ids() {
        let repo = setup_test_repo().await;
        let a = create(&repo, "a", "", "").await;
        let b = create(&repo, "b", "", "").await;

        let mut found = repo.existing_ids(&[a.id, b.id, 999]).await.unwrap();
        found.sort();
        assert_eq!(found, vec![a.id, b.id]);
        assert!(repo.existing_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = setup_test_repo().await;
        let mut redactor = create(&repo, "jdoe", "John", "Doe").await;

        redactor.years_of_experience = 5;
        redactor.is_staff = true;
        redactor.last_name = "Dough".into();
        let updated = repo.update(&redactor).await.unwrap();
        assert_eq!(updated.years_of_experience, 5);
        assert!(updated.is_staff);
        assert_eq!(updated.last_name, "Dough");
        assert_eq!(updated.password_hash, "hash");

        assert!(repo.delete(redactor.id).await.unwrap());
        assert!(!repo.delete(redactor.id).await.unwrap());
    }
}
