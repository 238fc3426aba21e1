use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::AppResult;
use crate::i18n::{Locale, Msg};
use crate::models::RegistrationStatus;
use crate::services::activities_service::{self, ActivityView, WaitlistEntryView};
use crate::services::signup_service::{self, SignupOutcome};
use crate::web::extract::OptionalJsonBody;
use crate::web::middleware::auth::AuthenticatedUser;

pub async fn activity_handler(
    Path(name): Path<String>,
    State(pool): State<SqlitePool>,
) -> AppResult<Json<ActivityView>> {
    Ok(Json(activities_service::load_activity_view(&pool, &name).await?))
}

pub async fn waitlist_handler(
    Path(name): Path<String>,
    State(pool): State<SqlitePool>,
) -> AppResult<Json<Vec<WaitlistEntryView>>> {
    Ok(Json(activities_service::load_waitlist(&pool, &name).await?))
}

#[derive(Debug, Deserialize, Default)]
pub struct SignupRequest {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub status: RegistrationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waitlist_position: Option<i64>,
}

pub async fn signup_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    locale: Locale,
    Path(name): Path<String>,
    State(pool): State<SqlitePool>,
    OptionalJsonBody(form): OptionalJsonBody<SignupRequest>,
) -> AppResult<Json<SignupResponse>> {
    let requested = form.and_then(|f| f.email);
    let email =
        signup_service::resolve_subject(&auth_user.email, auth_user.role, requested.as_deref())?;

    let response = match signup_service::sign_up(&pool, &name, &email).await? {
        SignupOutcome::Enrolled => SignupResponse {
            message: Msg::SignedUp {
                email,
                activity: name,
            }
            .render(locale),
            status: RegistrationStatus::Enrolled,
            waitlist_position: None,
        },
        SignupOutcome::Waitlisted { position } => SignupResponse {
            message: Msg::Waitlisted {
                email,
                activity: name,
                position,
            }
            .render(locale),
            status: RegistrationStatus::Waitlisted,
            waitlist_position: Some(position),
        },
    };
    Ok(Json(response))
}

#[derive(Debug, Deserialize, Default)]
pub struct UnregisterQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UnregisterResponse {
    pub message: String,
    pub promoted: Vec<String>,
}

pub async fn unregister_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    locale: Locale,
    Path(name): Path<String>,
    Query(query): Query<UnregisterQuery>,
    State(pool): State<SqlitePool>,
) -> AppResult<Json<UnregisterResponse>> {
    let email =
        signup_service::resolve_subject(&auth_user.email, auth_user.role, query.email.as_deref())?;
    let outcome = signup_service::unregister(&pool, &name, &email).await?;

    Ok(Json(UnregisterResponse {
        message: Msg::Unregistered {
            email,
            activity: name,
        }
        .render(locale),
        promoted: outcome.promoted,
    }))
}
