//! Versioned schema migrations.
//!
//! Migrations are applied in order inside one transaction and the applied
//! version is mirrored to `PRAGMA user_version`.

use sqlx::{Connection, SqlitePool};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("database schema version {db_version} is newer than supported version {latest_supported}")]
    UnsupportedSchemaVersion { db_version: i64, latest_supported: i64 },
}

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: i64,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_notifications.sql"),
    },
    Migration {
        version: 3,
        sql: include_str!("0003_delivery_attempts.sql"),
    },
];

pub fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

pub async fn current_version(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("PRAGMA user_version")
        .fetch_one(pool)
        .await
}

/// Applies every migration newer than the database's `user_version`.
pub async fn apply_migrations(pool: &SqlitePool) -> Result<(), MigrationError> {
    let mut conn = pool.acquire().await?;
    let current: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(&mut *conn)
        .await?;
    let latest = latest_version();

    if current > latest {
        return Err(MigrationError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    if current == latest {
        return Ok(());
    }

    let mut tx = conn.begin().await?;
    for migration in MIGRATIONS {
        if migration.version <= current {
            continue;
        }
        sqlx::raw_sql(migration.sql).execute(&mut *tx).await?;
        let pragma = format!("PRAGMA user_version = {}", migration.version);
        sqlx::raw_sql(&pragma).execute(&mut *tx).await?;
        tracing::info!(version = migration.version, "applied schema migration");
    }
    tx.commit().await?;

    Ok(())
}
