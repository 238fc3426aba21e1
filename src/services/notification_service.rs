//! Queued notices for students plus the optional webhook dispatcher.
//!
//! Notices are written in the same transaction as the registration change
//! that caused them. Delivery is at-least-once: a notice is marked delivered
//! only after the webhook answered 2xx.

use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::database::notifications_repo;
use crate::error::{AppError, AppResult};
use crate::i18n::{Locale, Msg};
use crate::models::{NotificationKind, NotificationsRow};

const DISPATCH_BATCH_SIZE: i64 = 50;
/// Past this many failed attempts a notice is reported as stuck.
pub const STUCK_AFTER_ATTEMPTS: i64 = 5;

pub struct Notice<'a> {
    pub recipient: &'a str,
    pub kind: NotificationKind,
    pub activity: &'a str,
    pub waitlist_position: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    pub id: String,
    pub kind: NotificationKind,
    pub activity: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waitlist_position: Option<i64>,
    pub created_at: String,
    pub read: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    id: &'a str,
    recipient: &'a str,
    kind: NotificationKind,
    activity: &'a str,
    waitlist_position: Option<i64>,
    message: String,
}

pub async fn enqueue(executor: impl SqliteExecutor<'_>, notice: Notice<'_>) -> sqlx::Result<()> {
    let id = Uuid::new_v4().to_string();
    notifications_repo::insert_notification(
        executor,
        notifications_repo::NewNotification {
            id: &id,
            recipient_email: notice.recipient,
            kind: notice.kind.as_str(),
            activity_name: notice.activity,
            waitlist_position: notice.waitlist_position,
        },
    )
    .await?;
    Ok(())
}

pub fn message_for(kind: NotificationKind, activity: &str, position: Option<i64>) -> Msg {
    let activity = activity.to_string();
    match kind {
        NotificationKind::Enrolled => Msg::NoticeEnrolled { activity },
        NotificationKind::Waitlisted => Msg::NoticeWaitlisted { activity, position },
        NotificationKind::Promoted => Msg::NoticePromoted { activity },
        NotificationKind::Unregistered => Msg::NoticeUnregistered { activity },
        NotificationKind::ActivityCancelled => Msg::NoticeActivityCancelled { activity },
    }
}

pub async fn list_for_user(
    pool: &SqlitePool,
    email: &str,
    unread_only: bool,
    locale: Locale,
) -> AppResult<Vec<NotificationView>> {
    let rows = notifications_repo::list_for_recipient(pool, email, unread_only).await?;
    Ok(rows
        .into_iter()
        .filter_map(|row| to_view(row, locale))
        .collect())
}

pub async fn mark_read(pool: &SqlitePool, id: &str, email: &str) -> AppResult<()> {
    if notifications_repo::mark_read(pool, id, email).await? == 0 {
        return Err(AppError::NotificationNotFound);
    }
    Ok(())
}

fn to_view(row: NotificationsRow, locale: Locale) -> Option<NotificationView> {
    let Some(kind) = NotificationKind::parse(&row.kind) else {
        warn!(id = %row.id, kind = %row.kind, "skipping notification of unknown kind");
        return None;
    };
    Some(NotificationView {
        message: message_for(kind, &row.activity_name, row.waitlist_position).render(locale),
        id: row.id,
        kind,
        activity: row.activity_name,
        waitlist_position: row.waitlist_position,
        created_at: row.created_at,
        read: row.read_at.is_some(),
    })
}

/// Posts one batch of undelivered notices to the webhook.
pub async fn dispatch_pending(
    pool: &SqlitePool,
    client: &reqwest::Client,
    webhook_url: &str,
) -> AppResult<DispatchReport> {
    let pending = notifications_repo::list_undelivered(pool, DISPATCH_BATCH_SIZE).await?;
    let mut report = DispatchReport {
        attempted: pending.len(),
        ..Default::default()
    };

    for row in pending {
        let Some(kind) = NotificationKind::parse(&row.kind) else {
            warn!(id = %row.id, kind = %row.kind, "cannot deliver notification of unknown kind");
            record_failure(pool, &row.id).await?;
            report.failed += 1;
            continue;
        };
        let payload = WebhookPayload {
            id: &row.id,
            recipient: &row.recipient_email,
            kind,
            activity: &row.activity_name,
            waitlist_position: row.waitlist_position,
            message: message_for(kind, &row.activity_name, row.waitlist_position)
                .render(Locale::En),
        };

        match client.post(webhook_url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                notifications_repo::mark_delivered(pool, &row.id).await?;
                report.delivered += 1;
            }
            Ok(resp) => {
                warn!(id = %row.id, status = %resp.status(), "webhook rejected notification");
                record_failure(pool, &row.id).await?;
                report.failed += 1;
            }
            Err(e) => {
                warn!(id = %row.id, error = %e, "webhook delivery failed");
                record_failure(pool, &row.id).await?;
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Failed notices sort behind fresh ones in the next batch.
async fn record_failure(pool: &SqlitePool, id: &str) -> sqlx::Result<()> {
    let attempts = notifications_repo::record_failed_attempt(pool, id).await?;
    if attempts == STUCK_AFTER_ATTEMPTS {
        error!(id = %id, attempts, "notification keeps failing delivery");
    }
    Ok(())
}

pub fn spawn_dispatcher(pool: SqlitePool, webhook_url: String, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let interval = interval.max(Duration::from_secs(1));
        let mut ticker = tokio::time::interval(interval);
        info!(url = %webhook_url, every_secs = interval.as_secs(), "notification dispatcher started");

        loop {
            ticker.tick().await;
            match dispatch_pending(&pool, &client, &webhook_url).await {
                Ok(report) if report.attempted > 0 => info!(
                    attempted = report.attempted,
                    delivered = report.delivered,
                    failed = report.failed,
                    "notification dispatch"
                ),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "notification dispatch failed"),
            }
        }
    })
}
