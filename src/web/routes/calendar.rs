use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use sqlx::SqlitePool;

use crate::error::AppResult;
use crate::services::calendar_service;
use crate::web::middleware::auth::AuthenticatedUser;

const CALENDAR_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

fn calendar_response(filename: String, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, CALENDAR_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}.ics\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

pub async fn activity_calendar_handler(
    Path(name): Path<String>,
    State(pool): State<SqlitePool>,
) -> AppResult<Response> {
    let today = chrono::Local::now().date_naive();
    let body =
        calendar_service::activity_calendar(&pool, &name, today, chrono::Utc::now()).await?;
    Ok(calendar_response(calendar_service::slug(&name), body))
}

pub async fn my_calendar_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
) -> AppResult<Response> {
    let today = chrono::Local::now().date_naive();
    let body =
        calendar_service::user_calendar(&pool, &auth_user.email, today, chrono::Utc::now())
            .await?;
    Ok(calendar_response("my-activities".to_string(), body))
}
