use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::AppResult;
use crate::i18n::Locale;
use crate::services::notification_service::{self, NotificationView};
use crate::web::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize, Default)]
pub struct NotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
}

pub async fn list_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    locale: Locale,
    Query(query): Query<NotificationsQuery>,
    State(pool): State<SqlitePool>,
) -> AppResult<Json<Vec<NotificationView>>> {
    Ok(Json(
        notification_service::list_for_user(&pool, &auth_user.email, query.unread_only, locale)
            .await?,
    ))
}

pub async fn mark_read_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    State(pool): State<SqlitePool>,
) -> AppResult<StatusCode> {
    notification_service::mark_read(&pool, &id, &auth_user.email).await?;
    Ok(StatusCode::NO_CONTENT)
}
