use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::error::AppResult;

pub mod activities_repo;
pub mod migrations;
pub mod notifications_repo;
pub mod registrations_repo;
pub mod seed;
pub mod users_repo;

/// Opens the pool with foreign keys on and a 5 s busy timeout.
///
/// An in-memory database lives and dies with its connection, so it gets a
/// single connection that is never recycled.
pub async fn connect(database_url: &str, max_connections: u32) -> sqlx::Result<SqlitePool> {
    let in_memory = is_in_memory(database_url);

    let mut options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };

    pool_options.connect_with(options).await
}

/// Connects, migrates and (optionally) seeds the database.
pub async fn init(config: &AppConfig) -> AppResult<SqlitePool> {
    let pool = connect(&config.database_url, config.database_max_connections).await?;
    migrations::apply_migrations(&pool).await?;
    if config.seed_activities {
        let inserted = seed::seed_activities(&pool).await?;
        if inserted > 0 {
            tracing::info!(inserted, "seeded default activities");
        }
    }
    Ok(pool)
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
