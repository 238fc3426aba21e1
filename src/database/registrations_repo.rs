use sqlx::{SqliteExecutor, SqlitePool};

use crate::models::RegistrationsRow;

/// Capacity check and insert in one statement: the row is enrolled while
/// seats remain, waitlisted once full (if the activity keeps a waitlist), and
/// not inserted at all otherwise.
const SQL_INSERT_WITH_CAPACITY_CHECK: &str = r#"
INSERT INTO registrations (activity_name, email, status)
SELECT
  a.name,
  ?2,
  CASE
    WHEN (SELECT COUNT(*) FROM registrations r
          WHERE r.activity_name = a.name AND r.status = 'enrolled') < a.max_participants
    THEN 'enrolled'
    ELSE 'waitlisted'
  END
FROM activities a
WHERE a.name = ?1
  AND (
    (SELECT COUNT(*) FROM registrations r
     WHERE r.activity_name = a.name AND r.status = 'enrolled') < a.max_participants
    OR a.waitlist_enabled = 1
  )
RETURNING seq, status
"#;

pub async fn insert_with_capacity_check(
    executor: impl SqliteExecutor<'_>,
    activity_name: &str,
    email: &str,
) -> sqlx::Result<Option<(i64, String)>> {
    sqlx::query_as::<_, (i64, String)>(SQL_INSERT_WITH_CAPACITY_CHECK)
        .bind(activity_name)
        .bind(email)
        .fetch_optional(executor)
        .await
}

const SQL_INSERT_ENROLLED_IF_MISSING: &str = r#"
INSERT OR IGNORE INTO registrations (activity_name, email, status)
VALUES (?, ?, 'enrolled')
"#;

pub async fn insert_enrolled_if_missing(
    executor: impl SqliteExecutor<'_>,
    activity_name: &str,
    email: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_ENROLLED_IF_MISSING)
        .bind(activity_name)
        .bind(email)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LOAD_REGISTRATION: &str = r#"
SELECT seq, activity_name, email, status, created_at, updated_at
FROM registrations
WHERE activity_name = ? AND email = ?
LIMIT 1
"#;

pub async fn load_registration(
    executor: impl SqliteExecutor<'_>,
    activity_name: &str,
    email: &str,
) -> sqlx::Result<Option<RegistrationsRow>> {
    sqlx::query_as::<_, RegistrationsRow>(SQL_LOAD_REGISTRATION)
        .bind(activity_name)
        .bind(email)
        .fetch_optional(executor)
        .await
}

const SQL_DELETE_REGISTRATION: &str = r#"
DELETE FROM registrations
WHERE activity_name = ? AND email = ?
RETURNING status
"#;

/// Returns the status the removed row had, or `None` if there was no row.
pub async fn delete_registration(
    executor: impl SqliteExecutor<'_>,
    activity_name: &str,
    email: &str,
) -> sqlx::Result<Option<String>> {
    sqlx::query_scalar::<_, String>(SQL_DELETE_REGISTRATION)
        .bind(activity_name)
        .bind(email)
        .fetch_optional(executor)
        .await
}

/// Moves the oldest waitlisted row into a free seat, if there is one.
const SQL_PROMOTE_NEXT: &str = r#"
UPDATE registrations
SET status = 'enrolled',
    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
WHERE seq = (
    SELECT seq FROM registrations
    WHERE activity_name = ?1 AND status = 'waitlisted'
    ORDER BY seq ASC
    LIMIT 1
  )
  AND (SELECT COUNT(*) FROM registrations
       WHERE activity_name = ?1 AND status = 'enrolled')
      < (SELECT max_participants FROM activities WHERE name = ?1)
RETURNING email
"#;

pub async fn promote_next(
    executor: impl SqliteExecutor<'_>,
    activity_name: &str,
) -> sqlx::Result<Option<String>> {
    sqlx::query_scalar::<_, String>(SQL_PROMOTE_NEXT)
        .bind(activity_name)
        .fetch_optional(executor)
        .await
}

const SQL_WAITLIST_POSITION: &str = r#"
SELECT COUNT(*)
FROM registrations
WHERE activity_name = ? AND status = 'waitlisted' AND seq <= ?
"#;

pub async fn waitlist_position(
    executor: impl SqliteExecutor<'_>,
    activity_name: &str,
    seq: i64,
) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(SQL_WAITLIST_POSITION)
        .bind(activity_name)
        .bind(seq)
        .fetch_one(executor)
        .await
}

pub async fn count_enrolled(
    executor: impl SqliteExecutor<'_>,
    activity_name: &str,
) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM registrations WHERE activity_name = ? AND status = 'enrolled'",
    )
    .bind(activity_name)
    .fetch_one(executor)
    .await
}

const SQL_LIST_FOR_ACTIVITY: &str = r#"
SELECT seq, activity_name, email, status, created_at, updated_at
FROM registrations
WHERE activity_name = ?
ORDER BY seq ASC
"#;

pub async fn list_for_activity(
    executor: impl SqliteExecutor<'_>,
    activity_name: &str,
) -> sqlx::Result<Vec<RegistrationsRow>> {
    sqlx::query_as::<_, RegistrationsRow>(SQL_LIST_FOR_ACTIVITY)
        .bind(activity_name)
        .fetch_all(executor)
        .await
}

const SQL_LIST_ALL: &str = r#"
SELECT seq, activity_name, email, status, created_at, updated_at
FROM registrations
ORDER BY activity_name ASC, seq ASC
"#;

pub async fn list_all(pool: &SqlitePool) -> sqlx::Result<Vec<RegistrationsRow>> {
    sqlx::query_as::<_, RegistrationsRow>(SQL_LIST_ALL)
        .fetch_all(pool)
        .await
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PositionedRegistrationRow {
    pub activity_name: String,
    pub email: String,
    pub status: String,
    pub waitlist_position: Option<i64>,
    pub created_at: Option<String>,
}

const SQL_LIST_POSITIONED_FOR_EMAIL: &str = r#"
SELECT
  r.activity_name,
  r.email,
  r.status,
  CASE WHEN r.status = 'waitlisted' THEN (
    SELECT COUNT(*) FROM registrations w
    WHERE w.activity_name = r.activity_name
      AND w.status = 'waitlisted'
      AND w.seq <= r.seq
  ) END AS waitlist_position,
  r.created_at
FROM registrations r
WHERE r.email = ?
ORDER BY r.activity_name ASC
"#;

pub async fn list_positioned_for_email(
    pool: &SqlitePool,
    email: &str,
) -> sqlx::Result<Vec<PositionedRegistrationRow>> {
    sqlx::query_as::<_, PositionedRegistrationRow>(SQL_LIST_POSITIONED_FOR_EMAIL)
        .bind(email)
        .fetch_all(pool)
        .await
}

const SQL_LIST_POSITIONED_ALL: &str = r#"
SELECT
  r.activity_name,
  r.email,
  r.status,
  CASE WHEN r.status = 'waitlisted' THEN (
    SELECT COUNT(*) FROM registrations w
    WHERE w.activity_name = r.activity_name
      AND w.status = 'waitlisted'
      AND w.seq <= r.seq
  ) END AS waitlist_position,
  r.created_at
FROM registrations r
ORDER BY r.activity_name ASC, r.seq ASC
"#;

pub async fn list_positioned_all(pool: &SqlitePool) -> sqlx::Result<Vec<PositionedRegistrationRow>> {
    sqlx::query_as::<_, PositionedRegistrationRow>(SQL_LIST_POSITIONED_ALL)
        .fetch_all(pool)
        .await
}
