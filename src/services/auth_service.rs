use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::database::{is_unique_violation, users_repo};
use crate::error::{AppError, AppResult};
use crate::i18n::Msg;
use crate::models::{Role, UsersRow};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub email: String,
}

pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> AppResult<()> {
    let invalid = || AppError::Invalid(Msg::InvalidEmail);
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

pub async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
    })
    .await
    .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
}

/// A stored hash that does not parse counts as a mismatch.
pub async fn verify_password(password: String, password_hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || {
        let Ok(parsed) = PasswordHash::new(&password_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .map_err(|e| AppError::Internal(format!("verification task failed: {}", e)))
}

pub fn issue_token(config: &AppConfig, email: &str, role: Role) -> AppResult<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: email.to_string(),
        role: role.as_str().to_string(),
        iat: now,
        exp: now + config.token_ttl_minutes * 60,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn decode_token(secret: &str, token: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!(error = %e, "rejected access token");
        AppError::Unauthorized
    })
}

/// Resolves a bearer token to the current user row. The role comes from the
/// database, not from the token, so role changes apply immediately.
pub async fn authenticate(pool: &SqlitePool, secret: &str, token: &str) -> AppResult<UsersRow> {
    let claims = decode_token(secret, token)?;
    users_repo::load_user(pool, &claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)
}

pub async fn register(
    pool: &SqlitePool,
    config: &AppConfig,
    input: RegisterInput,
) -> AppResult<TokenResponse> {
    let email = normalize_email(&input.email);
    validate_email(&email)?;
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Invalid(Msg::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        }));
    }
    let full_name = input.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(AppError::Invalid(Msg::EmptyField { field: "full_name" }));
    }

    if users_repo::load_user(pool, &email).await?.is_some() {
        return Err(AppError::EmailTaken);
    }

    let password_hash = hash_password(input.password).await?;
    users_repo::insert_user(
        pool,
        users_repo::NewUser {
            email: &email,
            full_name: &full_name,
            password_hash: &password_hash,
            role: Role::Student.as_str(),
        },
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::EmailTaken
        } else {
            AppError::Database(e)
        }
    })?;
    info!(email = %email, "registered user");

    Ok(TokenResponse {
        access_token: issue_token(config, &email, Role::Student)?,
        token_type: "bearer",
        email,
    })
}

pub async fn login(
    pool: &SqlitePool,
    config: &AppConfig,
    email: &str,
    password: String,
) -> AppResult<TokenResponse> {
    let email = normalize_email(email);
    let Some(user) = users_repo::load_user(pool, &email).await? else {
        return Err(AppError::InvalidCredentials);
    };
    if !verify_password(password, user.password_hash.clone()).await? {
        return Err(AppError::InvalidCredentials);
    }

    Ok(TokenResponse {
        access_token: issue_token(config, &user.email, user.role())?,
        token_type: "bearer",
        email: user.email,
    })
}

/// Creates the account as admin, or promotes it if it already exists.
/// Returns `true` when a new account was created.
pub async fn ensure_admin(pool: &SqlitePool, email: &str, password: &str) -> AppResult<bool> {
    let email = normalize_email(email);
    validate_email(&email)?;

    if users_repo::load_user(pool, &email).await?.is_some() {
        users_repo::update_role(pool, &email, Role::Admin.as_str()).await?;
        return Ok(false);
    }

    let password_hash = hash_password(password.to_string()).await?;
    users_repo::insert_user(
        pool,
        users_repo::NewUser {
            email: &email,
            full_name: "Administrator",
            password_hash: &password_hash,
            role: Role::Admin.as_str(),
        },
    )
    .await?;
    info!(email = %email, "created admin account");
    Ok(true)
}
