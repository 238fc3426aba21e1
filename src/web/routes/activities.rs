use axum::{extract::State, Extension, Json};
use sqlx::SqlitePool;

use crate::error::AppResult;
use crate::services::activities_service::{self, ActivityView, MyRegistrationView};
use crate::web::middleware::auth::AuthenticatedUser;

pub async fn activities_handler(State(pool): State<SqlitePool>) -> AppResult<Json<Vec<ActivityView>>> {
    Ok(Json(activities_service::list_activity_views(&pool).await?))
}

pub async fn my_registrations_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
) -> AppResult<Json<Vec<MyRegistrationView>>> {
    Ok(Json(
        activities_service::list_my_registrations(&pool, &auth_user.email).await?,
    ))
}
