use sqlx::{SqliteExecutor, SqlitePool};

use crate::models::NotificationsRow;

const SQL_INSERT_NOTIFICATION: &str = r#"
INSERT INTO notifications (id, recipient_email, kind, activity_name, waitlist_position)
VALUES (?, ?, ?, ?, ?)
"#;

pub struct NewNotification<'a> {
    pub id: &'a str,
    pub recipient_email: &'a str,
    pub kind: &'a str,
    pub activity_name: &'a str,
    pub waitlist_position: Option<i64>,
}

pub async fn insert_notification(
    executor: impl SqliteExecutor<'_>,
    notification: NewNotification<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_NOTIFICATION)
        .bind(notification.id)
        .bind(notification.recipient_email)
        .bind(notification.kind)
        .bind(notification.activity_name)
        .bind(notification.waitlist_position)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LIST_FOR_RECIPIENT: &str = r#"
SELECT id, recipient_email, kind, activity_name, waitlist_position,
       created_at, read_at, delivered_at, delivery_attempts
FROM notifications
WHERE recipient_email = ?1
  AND (?2 = 0 OR read_at IS NULL)
ORDER BY created_at DESC, rowid DESC
"#;

pub async fn list_for_recipient(
    pool: &SqlitePool,
    email: &str,
    unread_only: bool,
) -> sqlx::Result<Vec<NotificationsRow>> {
    sqlx::query_as::<_, NotificationsRow>(SQL_LIST_FOR_RECIPIENT)
        .bind(email)
        .bind(unread_only)
        .fetch_all(pool)
        .await
}

const SQL_MARK_READ: &str = r#"
UPDATE notifications
SET read_at = COALESCE(read_at, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
WHERE id = ? AND recipient_email = ?
"#;

pub async fn mark_read(pool: &SqlitePool, id: &str, email: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_MARK_READ)
        .bind(id)
        .bind(email)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LIST_UNDELIVERED: &str = r#"
SELECT id, recipient_email, kind, activity_name, waitlist_position,
       created_at, read_at, delivered_at, delivery_attempts
FROM notifications
WHERE delivered_at IS NULL
ORDER BY delivery_attempts ASC, created_at ASC, rowid ASC
LIMIT ?
"#;

pub async fn list_undelivered(pool: &SqlitePool, limit: i64) -> sqlx::Result<Vec<NotificationsRow>> {
    sqlx::query_as::<_, NotificationsRow>(SQL_LIST_UNDELIVERED)
        .bind(limit)
        .fetch_all(pool)
        .await
}

const SQL_MARK_DELIVERED: &str = r#"
UPDATE notifications
SET delivered_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
WHERE id = ?
"#;

pub async fn mark_delivered(pool: &SqlitePool, id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_MARK_DELIVERED)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_RECORD_FAILED_ATTEMPT: &str = r#"
UPDATE notifications
SET delivery_attempts = delivery_attempts + 1
WHERE id = ?
RETURNING delivery_attempts
"#;

/// Returns the attempt count after the increment.
pub async fn record_failed_attempt(pool: &SqlitePool, id: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(SQL_RECORD_FAILED_ATTEMPT)
        .bind(id)
        .fetch_one(pool)
        .await
}
