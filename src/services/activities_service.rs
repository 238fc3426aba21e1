use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::database::{activities_repo, registrations_repo};
use crate::error::{AppError, AppResult};
use crate::models::{ActivitiesRow, RegistrationStatus, RegistrationsRow};

#[derive(Debug, Clone, Serialize)]
pub struct ActivityView {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub max_participants: i64,
    pub participant_count: i64,
    pub spots_left: i64,
    pub participants: Vec<String>,
    pub waitlist_enabled: bool,
    pub waitlist_count: i64,
    pub waitlist: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaitlistEntryView {
    pub email: String,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MyRegistrationView {
    pub activity: String,
    pub status: RegistrationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waitlist_position: Option<i64>,
    pub registered_at: Option<String>,
}

pub async fn list_activity_views(pool: &SqlitePool) -> AppResult<Vec<ActivityView>> {
    let rows = activities_repo::list_activities(pool).await?;
    let mut by_activity: HashMap<String, Vec<RegistrationsRow>> = HashMap::new();
    for reg in registrations_repo::list_all(pool).await? {
        by_activity
            .entry(reg.activity_name.clone())
            .or_default()
            .push(reg);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let regs = by_activity.remove(&row.name).unwrap_or_default();
            build_view(row, regs)
        })
        .collect())
}

pub async fn load_activity_view(pool: &SqlitePool, name: &str) -> AppResult<ActivityView> {
    let Some(row) = activities_repo::load_activity(pool, name).await? else {
        return Err(AppError::ActivityNotFound);
    };
    let regs = registrations_repo::list_for_activity(pool, name).await?;
    Ok(build_view(row, regs))
}

pub async fn load_waitlist(pool: &SqlitePool, name: &str) -> AppResult<Vec<WaitlistEntryView>> {
    if activities_repo::load_activity(pool, name).await?.is_none() {
        return Err(AppError::ActivityNotFound);
    }
    let regs = registrations_repo::list_for_activity(pool, name).await?;
    Ok(regs
        .into_iter()
        .filter(|r| r.status() == RegistrationStatus::Waitlisted)
        .zip(1..)
        .map(|(r, position)| WaitlistEntryView {
            email: r.email,
            position,
        })
        .collect())
}

pub async fn list_my_registrations(
    pool: &SqlitePool,
    email: &str,
) -> AppResult<Vec<MyRegistrationView>> {
    let rows = registrations_repo::list_positioned_for_email(pool, email).await?;
    Ok(rows
        .into_iter()
        .filter_map(|r| {
            let status = RegistrationStatus::parse(&r.status)?;
            Some(MyRegistrationView {
                activity: r.activity_name,
                status,
                waitlist_position: r.waitlist_position,
                registered_at: r.created_at,
            })
        })
        .collect())
}

/// `regs` must be in `seq` order.
fn build_view(row: ActivitiesRow, regs: Vec<RegistrationsRow>) -> ActivityView {
    let mut participants = Vec::new();
    let mut waitlist = Vec::new();
    for reg in regs {
        match reg.status() {
            RegistrationStatus::Enrolled => participants.push(reg.email),
            RegistrationStatus::Waitlisted => waitlist.push(reg.email),
        }
    }

    let participant_count = participants.len() as i64;
    ActivityView {
        name: row.name,
        description: row.description,
        schedule: row.schedule,
        max_participants: row.max_participants,
        participant_count,
        spots_left: (row.max_participants - participant_count).max(0),
        participants,
        waitlist_enabled: row.waitlist_enabled != 0,
        waitlist_count: waitlist.len() as i64,
        waitlist,
    }
}
