use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::services::activities_service::ActivityView;
use crate::services::admin_service::{
    self, CreateActivityInput, UpdateActivityInput, UserView,
};
use crate::services::export_service::{self, ExportFormat};
use crate::web::extract::JsonBody;

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminPanelTemplate {
    pub activities: Vec<ActivityView>,
    pub user_count: i64,
}

pub async fn panel_handler(State(pool): State<SqlitePool>) -> AppResult<Html<String>> {
    let data = admin_service::load_panel_data(&pool).await?;
    let template = AdminPanelTemplate {
        activities: data.activities,
        user_count: data.user_count,
    };
    template
        .render()
        .map(Html)
        .map_err(|e| AppError::Internal(format!("admin template failed: {}", e)))
}

pub async fn create_activity_handler(
    State(pool): State<SqlitePool>,
    JsonBody(input): JsonBody<CreateActivityInput>,
) -> AppResult<(StatusCode, Json<ActivityView>)> {
    let view = admin_service::create_activity(&pool, input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update_activity_handler(
    Path(name): Path<String>,
    State(pool): State<SqlitePool>,
    JsonBody(input): JsonBody<UpdateActivityInput>,
) -> AppResult<Json<ActivityView>> {
    Ok(Json(admin_service::update_activity(&pool, &name, input).await?))
}

pub async fn delete_activity_handler(
    Path(name): Path<String>,
    State(pool): State<SqlitePool>,
) -> AppResult<StatusCode> {
    admin_service::delete_activity(&pool, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn users_handler(State(pool): State<SqlitePool>) -> AppResult<Json<Vec<UserView>>> {
    Ok(Json(admin_service::list_users(&pool).await?))
}

#[derive(Deserialize)]
pub struct RoleRequest {
    role: String,
}

pub async fn set_role_handler(
    Path(email): Path<String>,
    State(pool): State<SqlitePool>,
    JsonBody(form): JsonBody<RoleRequest>,
) -> AppResult<Json<UserView>> {
    Ok(Json(admin_service::set_role(&pool, &email, &form.role).await?))
}

#[derive(Debug, Deserialize, Default)]
pub struct ExportQuery {
    pub format: Option<String>,
}

pub async fn export_registrations_handler(
    Query(query): Query<ExportQuery>,
    State(pool): State<SqlitePool>,
) -> AppResult<Response> {
    let format = ExportFormat::parse(query.format.as_deref())?;
    let records = export_service::load_export_records(&pool).await?;
    let body = export_service::render(&records, format)?;

    let disposition = format!(
        "attachment; filename=\"registrations.{}\"",
        format.extension()
    );
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
