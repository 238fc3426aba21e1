use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use crate::database::users_repo;
use crate::error::{AppError, AppResult};
use crate::models::Role;
use crate::services::auth_service::{self, RegisterInput, TokenResponse};
use crate::web::extract::JsonBody;
use crate::web::middleware::auth::{AuthenticatedUser, ACCESS_TOKEN_COOKIE};
use crate::web::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    email: String,
    password: String,
    full_name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
pub struct MeResponse {
    email: String,
    full_name: String,
    role: Role,
}

fn session_cookie(value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(ACCESS_TOKEN_COOKIE, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

fn with_cookie(mut response: Response, cookie: Cookie<'_>) -> AppResult<Response> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| AppError::Internal(format!("invalid cookie header: {}", e)))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(response)
}

fn token_response(state: &AppState, token: TokenResponse) -> AppResult<Response> {
    let mut cookie = session_cookie(token.access_token.clone());
    cookie.set_max_age(cookie::time::Duration::minutes(state.config.token_ttl_minutes));
    with_cookie(Json(token).into_response(), cookie)
}

pub async fn register_handler(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<RegisterRequest>,
) -> AppResult<Response> {
    let token = auth_service::register(
        &state.pool,
        &state.config,
        RegisterInput {
            email: form.email,
            password: form.password,
            full_name: form.full_name,
        },
    )
    .await?;
    token_response(&state, token)
}

pub async fn login_handler(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<LoginRequest>,
) -> AppResult<Response> {
    let token = auth_service::login(&state.pool, &state.config, &form.email, form.password).await?;
    token_response(&state, token)
}

pub async fn logout_handler() -> AppResult<Response> {
    let mut cookie = session_cookie(String::new());
    cookie.make_removal();
    with_cookie(StatusCode::NO_CONTENT.into_response(), cookie)
}

pub async fn me_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
) -> AppResult<Json<MeResponse>> {
    let user = users_repo::load_user(&state.pool, &auth_user.email)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(MeResponse {
        role: user.role(),
        email: user.email,
        full_name: user.full_name,
    }))
}
