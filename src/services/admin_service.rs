use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::database::{activities_repo, is_unique_violation, registrations_repo, users_repo};
use crate::error::{AppError, AppResult};
use crate::i18n::Msg;
use crate::models::{NotificationKind, Role, UsersRow};
use crate::services::activities_service::{self, ActivityView};
use crate::services::notification_service::{self, Notice};
use crate::services::{auth_service, calendar_service, signup_service};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateActivityInput {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub max_participants: i64,
    #[serde(default = "default_true")]
    pub waitlist_enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateActivityInput {
    pub description: Option<String>,
    pub schedule: Option<String>,
    pub max_participants: Option<i64>,
    pub waitlist_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: Option<String>,
}

impl From<UsersRow> for UserView {
    fn from(row: UsersRow) -> Self {
        Self {
            role: row.role(),
            email: row.email,
            full_name: row.full_name,
            created_at: row.created_at,
        }
    }
}

pub struct AdminPanelData {
    pub activities: Vec<ActivityView>,
    pub user_count: i64,
}

pub async fn load_panel_data(pool: &SqlitePool) -> AppResult<AdminPanelData> {
    Ok(AdminPanelData {
        activities: activities_service::list_activity_views(pool).await?,
        user_count: users_repo::count_users(pool).await?,
    })
}

fn validate_schedule(schedule: &str) -> AppResult<()> {
    calendar_service::parse_schedule(schedule)
        .map(|_| ())
        .map_err(|e| {
            AppError::Invalid(Msg::InvalidSchedule {
                reason: e.to_string(),
            })
        })
}

fn validate_capacity(max_participants: i64) -> AppResult<()> {
    if max_participants < 1 {
        return Err(AppError::Invalid(Msg::InvalidCapacity));
    }
    Ok(())
}

pub async fn create_activity(pool: &SqlitePool, input: CreateActivityInput) -> AppResult<ActivityView> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::Invalid(Msg::EmptyField { field: "name" }));
    }
    let description = input.description.trim();
    if description.is_empty() {
        return Err(AppError::Invalid(Msg::EmptyField {
            field: "description",
        }));
    }
    let schedule = input.schedule.trim();
    validate_schedule(schedule)?;
    validate_capacity(input.max_participants)?;

    activities_repo::insert_activity(
        pool,
        activities_repo::NewActivity {
            name,
            description,
            schedule,
            max_participants: input.max_participants,
            waitlist_enabled: input.waitlist_enabled,
        },
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::ActivityExists
        } else {
            AppError::Database(e)
        }
    })?;
    info!(activity = %name, "created activity");

    activities_service::load_activity_view(pool, name).await
}

/// Applies the changes; a raised capacity immediately pulls students off
/// the waitlist.
pub async fn update_activity(
    pool: &SqlitePool,
    name: &str,
    input: UpdateActivityInput,
) -> AppResult<ActivityView> {
    let description = input.description.as_deref().map(str::trim);
    if description == Some("") {
        return Err(AppError::Invalid(Msg::EmptyField {
            field: "description",
        }));
    }
    let schedule = input.schedule.as_deref().map(str::trim);
    if let Some(schedule) = schedule {
        validate_schedule(schedule)?;
    }
    if let Some(max) = input.max_participants {
        validate_capacity(max)?;
    }

    let mut tx = pool.begin().await?;
    let updated = activities_repo::update_activity(
        &mut *tx,
        name,
        activities_repo::ActivityChanges {
            description,
            schedule,
            max_participants: input.max_participants,
            waitlist_enabled: input.waitlist_enabled,
        },
    )
    .await?;
    if updated == 0 {
        tx.rollback().await?;
        return Err(AppError::ActivityNotFound);
    }

    if let Some(max) = input.max_participants {
        let enrolled = registrations_repo::count_enrolled(&mut *tx, name).await?;
        if enrolled > max {
            tx.rollback().await?;
            return Err(AppError::Invalid(Msg::CapacityBelowEnrollment { enrolled }));
        }
    }
    let promoted = signup_service::promote_waitlist(&mut *tx, name).await?;
    tx.commit().await?;
    info!(activity = %name, promoted = promoted.len(), "updated activity");

    activities_service::load_activity_view(pool, name).await
}

/// Deletes the activity and notifies everyone who was on it. Returns the
/// number of students notified.
pub async fn delete_activity(pool: &SqlitePool, name: &str) -> AppResult<usize> {
    let mut tx = pool.begin().await?;

    // touch first so the transaction holds the write lock before reading
    let touched = activities_repo::update_activity(
        &mut *tx,
        name,
        activities_repo::ActivityChanges::default(),
    )
    .await?;
    if touched == 0 {
        tx.rollback().await?;
        return Err(AppError::ActivityNotFound);
    }

    let registrations = registrations_repo::list_for_activity(&mut *tx, name).await?;
    for reg in &registrations {
        notification_service::enqueue(
            &mut *tx,
            Notice {
                recipient: &reg.email,
                kind: NotificationKind::ActivityCancelled,
                activity: name,
                waitlist_position: None,
            },
        )
        .await?;
    }
    activities_repo::delete_activity(&mut *tx, name).await?;
    tx.commit().await?;

    info!(activity = %name, notified = registrations.len(), "deleted activity");
    Ok(registrations.len())
}

pub async fn list_users(pool: &SqlitePool) -> AppResult<Vec<UserView>> {
    Ok(users_repo::list_users(pool)
        .await?
        .into_iter()
        .map(UserView::from)
        .collect())
}

pub async fn set_role(pool: &SqlitePool, email: &str, role: &str) -> AppResult<UserView> {
    let Some(role) = Role::parse(role) else {
        return Err(AppError::Invalid(Msg::InvalidRole {
            role: role.to_string(),
        }));
    };
    let email = auth_service::normalize_email(email);
    if users_repo::update_role(pool, &email, role.as_str()).await? == 0 {
        return Err(AppError::UserNotFound);
    }
    info!(email = %email, role = role.as_str(), "changed user role");

    users_repo::load_user(pool, &email)
        .await?
        .map(UserView::from)
        .ok_or(AppError::UserNotFound)
}
