//! Database layer
//!
//! The store runs on SQLite (default, a single file next to the binary) or
//! MySQL, selected by `database.driver` in the configuration. Both are
//! reached through the [`DatabasePool`] trait so repositories never name a
//! concrete backend outside their per-driver query functions.
//!
//! ```ignore
//! use newsroom::config::DatabaseConfig;
//! use newsroom::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
