use sqlx::{SqliteExecutor, SqlitePool};

use crate::models::UsersRow;

const SQL_INSERT_USER: &str = r#"
INSERT INTO users (email, full_name, password_hash, role)
VALUES (?, ?, ?, ?)
"#;

pub struct NewUser<'a> {
    pub email: &'a str,
    pub full_name: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
}

pub async fn insert_user(pool: &SqlitePool, user: NewUser<'_>) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_USER)
        .bind(user.email)
        .bind(user.full_name)
        .bind(user.password_hash)
        .bind(user.role)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LOAD_USER: &str = r#"
SELECT email, full_name, password_hash, role, created_at
FROM users
WHERE email = ?
LIMIT 1
"#;

pub async fn load_user(
    executor: impl SqliteExecutor<'_>,
    email: &str,
) -> sqlx::Result<Option<UsersRow>> {
    sqlx::query_as::<_, UsersRow>(SQL_LOAD_USER)
        .bind(email)
        .fetch_optional(executor)
        .await
}

const SQL_LIST_USERS: &str = r#"
SELECT email, full_name, password_hash, role, created_at
FROM users
ORDER BY email ASC
"#;

pub async fn list_users(pool: &SqlitePool) -> sqlx::Result<Vec<UsersRow>> {
    sqlx::query_as::<_, UsersRow>(SQL_LIST_USERS)
        .fetch_all(pool)
        .await
}

const SQL_UPDATE_ROLE: &str = r#"
UPDATE users
SET role = ?
WHERE email = ?
"#;

pub async fn update_role(pool: &SqlitePool, email: &str, role: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_ROLE)
        .bind(role)
        .bind(email)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn count_users(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
}
