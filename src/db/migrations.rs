//! Database migrations
//!
//! The schema is embedded as SQL strings, one variant per driver, and applied
//! in version order on startup. Applied versions are tracked in `_migrations`.
//!
//! ```ignore
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_redactors",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS redactors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(150) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                first_name VARCHAR(150) NOT NULL DEFAULT '',
                last_name VARCHAR(150) NOT NULL DEFAULT '',
                years_of_experience INTEGER NOT NULL DEFAULT 0 CHECK (years_of_experience >= 0),
                is_staff BOOLEAN NOT NULL DEFAULT 0,
                is_superuser BOOLEAN NOT NULL DEFAULT 0,
                date_joined TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_redactors_username ON redactors(username);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS redactors (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                username VARCHAR(150) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                first_name VARCHAR(150) NOT NULL DEFAULT '',
                last_name VARCHAR(150) NOT NULL DEFAULT '',
                years_of_experience BIGINT NOT NULL DEFAULT 0,
                is_staff BOOLEAN NOT NULL DEFAULT FALSE,
                is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
                date_joined TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                CONSTRAINT chk_redactors_experience CHECK (years_of_experience >= 0)
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci
        "#,
    },
    Migration {
        version: 2,
        name: "create_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                redactor_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (redactor_id) REFERENCES redactors(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_redactor_id ON sessions(redactor_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
            CREATE TABLE IF NOT EXISTS session_data (
                session_id VARCHAR(64) NOT NULL,
                data_key VARCHAR(100) NOT NULL,
                data_value TEXT NOT NULL,
                PRIMARY KEY (session_id, data_key),
                FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                redactor_id BIGINT NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                INDEX idx_sessions_redactor_id (redactor_id),
                INDEX idx_sessions_expires_at (expires_at),
                FOREIGN KEY (redactor_id) REFERENCES redactors(id) ON DELETE CASCADE
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci;
            CREATE TABLE IF NOT EXISTS session_data (
                session_id VARCHAR(64) NOT NULL,
                data_key VARCHAR(100) NOT NULL,
                data_value TEXT NOT NULL,
                PRIMARY KEY (session_id, data_key),
                FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci
        "#,
    },
    Migration {
        version: 3,
        name: "create_topics",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS topics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(255) NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_topics_name ON topics(name);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS topics (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(255) NOT NULL,
                INDEX idx_topics_name (name)
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci
        "#,
    },
    Migration {
        version: 4,
        name: "create_newspapers",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS newspapers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                content TEXT NOT NULL,
                published_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                topic_id INTEGER NOT NULL,
                FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE RESTRICT
            );
            CREATE INDEX IF NOT EXISTS idx_newspapers_topic_id ON newspapers(topic_id);
            CREATE INDEX IF NOT EXISTS idx_newspapers_published_date ON newspapers(published_date);
            CREATE TABLE IF NOT EXISTS newspaper_redactors (
                newspaper_id INTEGER NOT NULL,
                redactor_id INTEGER NOT NULL,
                PRIMARY KEY (newspaper_id, redactor_id),
                FOREIGN KEY (newspaper_id) REFERENCES newspapers(id) ON DELETE CASCADE,
                FOREIGN KEY (redactor_id) REFERENCES redactors(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_newspaper_redactors_redactor_id ON newspaper_redactors(redactor_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS newspapers (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                content TEXT NOT NULL,
                published_date TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
                topic_id BIGINT NOT NULL,
                INDEX idx_newspapers_topic_id (topic_id),
                INDEX idx_newspapers_published_date (published_date),
                FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE RESTRICT
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci;
            CREATE TABLE IF NOT EXISTS newspaper_redactors (
                newspaper_id BIGINT NOT NULL,
                redactor_id BIGINT NOT NULL,
                PRIMARY KEY (newspaper_id, redactor_id),
                INDEX idx_newspaper_redactors_redactor_id (redactor_id),
                FOREIGN KEY (newspaper_id) REFERENCES newspapers(id) ON DELETE CASCADE,
                FOREIGN KEY (redactor_id) REFERENCES redactors(id) ON DELETE CASCADE
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci
        "#,
    },
    Migration {
        version: 5,
        name: "add_folded_search_columns",
        // Rows written before this version are backfilled with ASCII folding
        up_sqlite: r#"
            ALTER TABLE topics ADD COLUMN name_folded VARCHAR(255) NOT NULL DEFAULT '';
            UPDATE topics SET name_folded = LOWER(name);
            ALTER TABLE newspapers ADD COLUMN title_folded VARCHAR(255) NOT NULL DEFAULT '';
            UPDATE newspapers SET title_folded = LOWER(title);
            ALTER TABLE redactors ADD COLUMN username_folded VARCHAR(150) NOT NULL DEFAULT '';
            ALTER TABLE redactors ADD COLUMN first_name_folded VARCHAR(150) NOT NULL DEFAULT '';
            ALTER TABLE redactors ADD COLUMN last_name_folded VARCHAR(150) NOT NULL DEFAULT '';
            UPDATE redactors
            SET username_folded = LOWER(username),
                first_name_folded = LOWER(first_name),
                last_name_folded = LOWER(last_name);
        "#,
        up_mysql: r#"
            ALTER TABLE topics ADD COLUMN name_folded VARCHAR(255) NOT NULL DEFAULT '';
            UPDATE topics SET name_folded = LOWER(name);
            ALTER TABLE newspapers ADD COLUMN title_folded VARCHAR(255) NOT NULL DEFAULT '';
            UPDATE newspapers SET title_folded = LOWER(title);
            ALTER TABLE redactors
                ADD COLUMN username_folded VARCHAR(150) NOT NULL DEFAULT '',
                ADD COLUMN first_name_folded VARCHAR(150) NOT NULL DEFAULT '',
                ADD COLUMN last_name_folded VARCHAR(150) NOT NULL DEFAULT '';
            UPDATE redactors
            SET username_folded = LOWER(username),
                first_name_folded = LOWER(first_name),
                last_name_folded = LOWER(last_name)
        "#,
    },
];

/// Apply every pending migration.
///
/// Returns the number of migrations applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i64> = applied.iter().map(|m| m.version).collect();

    let mut count = 0;
    for migration in MIGRATIONS {
        if applied_versions.contains(&(migration.version as i64)) {
            continue;
        }
        tracing::info!("Applying migration {}: {}", migration.version, migration.name);
        apply_migration(pool, migration)
            .await
            .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
        count += 1;
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => get_applied_migrations_sqlite(pool.sqlite()?).await,
        DatabaseDriver::Mysql => get_applied_migrations_mysql(pool.mysql()?).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows
        .iter()
        .map(|row| MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        })
        .collect())
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows
        .iter()
        .map(|row| MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        })
        .collect())
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => migration.up_sqlite,
        DatabaseDriver::Mysql => migration.up_mysql,
    };

    for statement in split_sql_statements(sql) {
        pool.execute(statement)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    let record = format!(
        "INSERT INTO _migrations (version, name) VALUES ({}, '{}')",
        migration.version, migration.name
    );
    pool.execute(&record).await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, dropping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Number of migrations not yet applied
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;
    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn migrated_pool() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    #[tokio::test]
    async fn test_run_migrations_is_idempotent() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        assert_eq!(pending_count(&pool).await.unwrap(), MIGRATIONS.len());

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, 0);
        assert_eq!(pending_count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_topic_delete_is_restricted_by_newspapers() {
        let pool = migrated_pool().await;
        pool.execute("INSERT INTO topics (id, name) VALUES (1, 'Politics')")
            .await
            .unwrap();
        pool.execute(
            "INSERT INTO newspapers (title, content, topic_id) VALUES ('Vote', 'Results', 1)",
        )
        .await
        .unwrap();

        let result = pool.execute("DELETE FROM topics WHERE id = 1").await;
        assert!(result.is_err(), "referenced topic must not be deletable");
    }

    #[tokio::test]
    async fn test_redactor_delete_cascades_to_associations_and_sessions() {
        let pool = migrated_pool().await;
        pool.execute("INSERT INTO redactors (id, username, password_hash) VALUES (1, 'jdoe', 'x')")
            .await
            .unwrap();
        pool.execute("INSERT INTO topics (id, name) VALUES (1, 'Sports')")
            .await
            .unwrap();
        pool.execute(
            "INSERT INTO newspapers (id, title, content, topic_id) VALUES (1, 'Cup', 'Final', 1)",
        )
        .await
        .unwrap();
        pool.execute("INSERT INTO newspaper_redactors (newspaper_id, redactor_id) VALUES (1, 1)")
            .await
            .unwrap();
        pool.execute(
            "INSERT INTO sessions (id, redactor_id, expires_at) VALUES ('tok', 1, '2999-01-01T00:00:00Z')",
        )
        .await
        .unwrap();
        pool.execute(
            "INSERT INTO session_data (session_id, data_key, data_value) VALUES ('tok', 'num_visits', '1')",
        )
        .await
        .unwrap();

        pool.execute("DELETE FROM redactors WHERE id = 1").await.unwrap();

        let sqlite = pool.sqlite().unwrap();
        for table in ["newspaper_redactors", "sessions", "session_data"] {
            let count: i64 = sqlx::query(&format!("SELECT COUNT(*) AS c FROM {}", table))
                .fetch_one(sqlite)
                .await
                .unwrap()
                .get("c");
            assert_eq!(count, 0, "{} should be emptied by the cascade", table);
        }
        let newspapers: i64 = sqlx::query("SELECT COUNT(*) AS c FROM newspapers")
            .fetch_one(sqlite)
            .await
            .unwrap()
            .get("c");
        assert_eq!(newspapers, 1);
    }

    #[tokio::test]
    async fn test_folded_columns_backfilled_from_existing_rows() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        create_migrations_table(&pool).await.unwrap();
        for migration in &MIGRATIONS[..4] {
            apply_migration(&pool, migration).await.unwrap();
        }
        pool.execute("INSERT INTO topics (name) VALUES ('Sports')")
            .await
            .unwrap();
        assert_eq!(pending_count(&pool).await.unwrap(), 1);

        run_migrations(&pool).await.expect("Failed to run migrations");
        let folded: String = sqlx::query("SELECT name_folded FROM topics")
            .fetch_one(pool.sqlite().unwrap())
            .await
            .unwrap()
            .get("name_folded");
        assert_eq!(folded, "sports");
    }

    #[tokio::test]
    async fn test_negative_experience_rejected() {
        let pool = migrated_pool().await;
        let result = pool
            .execute(
                "INSERT INTO redactors (username, password_hash, years_of_experience) VALUES ('x', 'y', -1)",
            )
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_split_sql_statements() {
        let statements = split_sql_statements("CREATE TABLE a (id INT); CREATE TABLE b (id INT);");
        assert_eq!(statements, vec!["CREATE TABLE a (id INT)", "CREATE TABLE b (id INT)"]);

        let statements = split_sql_statements("-- Comment\nCREATE TABLE a (id INT);\n-- trailing");
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_every_migration_has_both_dialects() {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version as usize, i + 1);
            assert!(!split_sql_statements(migration.up_sqlite).is_empty());
            assert!(!split_sql_statements(migration.up_mysql).is_empty());
        }
    }
}
