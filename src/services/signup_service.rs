//! Sign-up, unregister and waitlist promotion.
//!
//! # Invariants
//! - Enrolled rows never exceed `max_participants`: the capacity check and
//!   the insert are a single statement, and every transaction here starts
//!   with a write so it holds SQLite's write lock from its first statement.
//! - The waitlist is FIFO by `seq`.
//! - Whenever a seat frees up, the waitlist head is promoted in the same
//!   transaction until the activity is full or the waitlist is empty.

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::database::{activities_repo, is_unique_violation, registrations_repo};
use crate::error::{AppError, AppResult};
use crate::models::{NotificationKind, RegistrationStatus, Role};
use crate::services::auth_service;
use crate::services::notification_service::{self, Notice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOutcome {
    Enrolled,
    Waitlisted { position: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnregisterOutcome {
    pub previous: RegistrationStatus,
    pub promoted: Vec<String>,
}

/// Decides whose registration a request touches. Students act only for
/// themselves; admins may name anyone.
pub fn resolve_subject(
    actor_email: &str,
    actor_role: Role,
    requested: Option<&str>,
) -> AppResult<String> {
    let Some(requested) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(actor_email.to_string());
    };
    let subject = auth_service::normalize_email(requested);
    auth_service::validate_email(&subject)?;
    if subject != actor_email && actor_role != Role::Admin {
        return Err(AppError::Forbidden);
    }
    Ok(subject)
}

pub async fn sign_up(pool: &SqlitePool, activity_name: &str, email: &str) -> AppResult<SignupOutcome> {
    let mut tx = pool.begin().await?;

    let inserted =
        match registrations_repo::insert_with_capacity_check(&mut *tx, activity_name, email).await {
            Ok(inserted) => inserted,
            Err(e) if is_unique_violation(&e) => {
                let existing =
                    registrations_repo::load_registration(&mut *tx, activity_name, email).await?;
                tx.rollback().await?;
                let status = existing
                    .map(|r| r.status())
                    .unwrap_or(RegistrationStatus::Enrolled);
                return Err(AppError::AlreadyRegistered(status));
            }
            Err(e) => return Err(e.into()),
        };

    let Some((seq, status)) = inserted else {
        // A full activity without a waitlist inserts nothing, so duplicates land here too.
        if let Some(existing) =
            registrations_repo::load_registration(&mut *tx, activity_name, email).await?
        {
            tx.rollback().await?;
            return Err(AppError::AlreadyRegistered(existing.status()));
        }
        let exists = activities_repo::load_activity(&mut *tx, activity_name)
            .await?
            .is_some();
        tx.rollback().await?;
        return Err(if exists {
            AppError::ActivityFull
        } else {
            AppError::ActivityNotFound
        });
    };

    let outcome = match RegistrationStatus::parse(&status) {
        Some(RegistrationStatus::Enrolled) => SignupOutcome::Enrolled,
        _ => SignupOutcome::Waitlisted {
            position: registrations_repo::waitlist_position(&mut *tx, activity_name, seq).await?,
        },
    };

    let (kind, waitlist_position) = match outcome {
        SignupOutcome::Enrolled => (NotificationKind::Enrolled, None),
        SignupOutcome::Waitlisted { position } => (NotificationKind::Waitlisted, Some(position)),
    };
    notification_service::enqueue(
        &mut *tx,
        Notice {
            recipient: email,
            kind,
            activity: activity_name,
            waitlist_position,
        },
    )
    .await?;

    tx.commit().await?;
    info!(activity = %activity_name, email = %email, outcome = ?outcome, "signup");
    Ok(outcome)
}

pub async fn unregister(
    pool: &SqlitePool,
    activity_name: &str,
    email: &str,
) -> AppResult<UnregisterOutcome> {
    let mut tx = pool.begin().await?;

    let Some(status) = registrations_repo::delete_registration(&mut *tx, activity_name, email).await?
    else {
        let exists = activities_repo::load_activity(&mut *tx, activity_name)
            .await?
            .is_some();
        tx.rollback().await?;
        return Err(if exists {
            AppError::NotRegistered
        } else {
            AppError::ActivityNotFound
        });
    };
    let previous = RegistrationStatus::parse(&status).unwrap_or(RegistrationStatus::Waitlisted);

    notification_service::enqueue(
        &mut *tx,
        Notice {
            recipient: email,
            kind: NotificationKind::Unregistered,
            activity: activity_name,
            waitlist_position: None,
        },
    )
    .await?;

    let promoted = if previous == RegistrationStatus::Enrolled {
        promote_waitlist(&mut *tx, activity_name).await?
    } else {
        Vec::new()
    };

    tx.commit().await?;
    info!(
        activity = %activity_name,
        email = %email,
        promoted = promoted.len(),
        "unregistered"
    );
    Ok(UnregisterOutcome { previous, promoted })
}

/// Fills free seats from the head of the waitlist and queues a notice for
/// each promoted student. Must run inside the caller's write transaction.
pub async fn promote_waitlist(
    conn: &mut SqliteConnection,
    activity_name: &str,
) -> sqlx::Result<Vec<String>> {
    let mut promoted = Vec::new();
    while let Some(email) = registrations_repo::promote_next(&mut *conn, activity_name).await? {
        notification_service::enqueue(
            &mut *conn,
            Notice {
                recipient: &email,
                kind: NotificationKind::Promoted,
                activity: activity_name,
                waitlist_position: None,
            },
        )
        .await?;
        promoted.push(email);
    }
    Ok(promoted)
}
