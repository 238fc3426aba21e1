use sqlx::{SqliteExecutor, SqlitePool};

use crate::models::ActivitiesRow;

const SQL_LIST_ACTIVITIES: &str = r#"
SELECT
  name,
  description,
  schedule,
  max_participants,
  waitlist_enabled,
  created_at,
  updated_at
FROM activities
ORDER BY name ASC
"#;

pub async fn list_activities(pool: &SqlitePool) -> sqlx::Result<Vec<ActivitiesRow>> {
    sqlx::query_as::<_, ActivitiesRow>(SQL_LIST_ACTIVITIES)
        .fetch_all(pool)
        .await
}

const SQL_LOAD_ACTIVITY: &str = r#"
SELECT
  name,
  description,
  schedule,
  max_participants,
  waitlist_enabled,
  created_at,
  updated_at
FROM activities
WHERE name = ?
LIMIT 1
"#;

pub async fn load_activity(
    executor: impl SqliteExecutor<'_>,
    name: &str,
) -> sqlx::Result<Option<ActivitiesRow>> {
    sqlx::query_as::<_, ActivitiesRow>(SQL_LOAD_ACTIVITY)
        .bind(name)
        .fetch_optional(executor)
        .await
}

const SQL_INSERT_ACTIVITY: &str = r#"
INSERT INTO activities (name, description, schedule, max_participants, waitlist_enabled)
VALUES (?, ?, ?, ?, ?)
"#;

const SQL_INSERT_ACTIVITY_IF_MISSING: &str = r#"
INSERT OR IGNORE INTO activities (name, description, schedule, max_participants, waitlist_enabled)
VALUES (?, ?, ?, ?, ?)
"#;

pub struct NewActivity<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub schedule: &'a str,
    pub max_participants: i64,
    pub waitlist_enabled: bool,
}

pub async fn insert_activity(
    executor: impl SqliteExecutor<'_>,
    activity: NewActivity<'_>,
) -> sqlx::Result<u64> {
    execute_insert(SQL_INSERT_ACTIVITY, executor, activity).await
}

/// Like [`insert_activity`] but a name collision is a no-op (returns 0).
pub async fn insert_activity_if_missing(
    executor: impl SqliteExecutor<'_>,
    activity: NewActivity<'_>,
) -> sqlx::Result<u64> {
    execute_insert(SQL_INSERT_ACTIVITY_IF_MISSING, executor, activity).await
}

async fn execute_insert(
    sql: &'static str,
    executor: impl SqliteExecutor<'_>,
    activity: NewActivity<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(sql)
        .bind(activity.name)
        .bind(activity.description)
        .bind(activity.schedule)
        .bind(activity.max_participants)
        .bind(activity.waitlist_enabled)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

// NULL parameters leave the column untouched.
const SQL_UPDATE_ACTIVITY: &str = r#"
UPDATE activities
SET
  description = COALESCE(?2, description),
  schedule = COALESCE(?3, schedule),
  max_participants = COALESCE(?4, max_participants),
  waitlist_enabled = COALESCE(?5, waitlist_enabled),
  updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
WHERE name = ?1
"#;

#[derive(Debug, Default)]
pub struct ActivityChanges<'a> {
    pub description: Option<&'a str>,
    pub schedule: Option<&'a str>,
    pub max_participants: Option<i64>,
    pub waitlist_enabled: Option<bool>,
}

pub async fn update_activity(
    executor: impl SqliteExecutor<'_>,
    name: &str,
    changes: ActivityChanges<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_ACTIVITY)
        .bind(name)
        .bind(changes.description)
        .bind(changes.schedule)
        .bind(changes.max_participants)
        .bind(changes.waitlist_enabled)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_activity(executor: impl SqliteExecutor<'_>, name: &str) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM activities WHERE name = ?")
        .bind(name)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

pub async fn count_activities(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM activities")
        .fetch_one(pool)
        .await
}
