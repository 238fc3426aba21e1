//! Shared harness: an in-memory database behind the real router.

#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::ServiceExt;

use mergington::services::auth_service;
use mergington::web::{self, AppState};
use mergington::{database, AppConfig};

pub const PASSWORD: &str = "password123";
pub const ADMIN_EMAIL: &str = "principal@mergington.edu";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        seed_activities: false,
        ..AppConfig::default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub config: AppConfig,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("body is not JSON ({}): {:?}", e, self.text()))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn detail(&self) -> String {
        self.json()["detail"].as_str().unwrap_or_default().to_string()
    }

    pub fn header(&self, name: header::HeaderName) -> String {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let pool = database::init(&config).await.expect("database init");
        let router = web::router(AppState::new(pool.clone(), config.clone()));
        Self {
            router,
            pool,
            config,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    /// Registers a student and returns their bearer token.
    pub async fn register(&self, email: &str) -> String {
        let response = self
            .post(
                "/auth/register",
                None,
                json!({ "email": email, "password": PASSWORD, "full_name": "Test Student" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        response.json()["access_token"]
            .as_str()
            .expect("token")
            .to_string()
    }

    pub async fn admin_token(&self) -> String {
        auth_service::ensure_admin(&self.pool, ADMIN_EMAIL, PASSWORD)
            .await
            .expect("bootstrap admin");
        let response = self
            .post(
                "/auth/login",
                None,
                json!({ "email": ADMIN_EMAIL, "password": PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        response.json()["access_token"]
            .as_str()
            .expect("token")
            .to_string()
    }

    pub async fn create_activity(
        &self,
        admin: &str,
        name: &str,
        max_participants: i64,
        waitlist_enabled: bool,
    ) {
        let response = self
            .post(
                "/admin/activities",
                Some(admin),
                json!({
                    "name": name,
                    "description": format!("{} meets weekly", name),
                    "schedule": "Mondays, Wednesdays, 3:30 PM - 5:00 PM",
                    "max_participants": max_participants,
                    "waitlist_enabled": waitlist_enabled,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
    }

    pub async fn sign_up(&self, activity: &str, token: &str, email: Option<&str>) -> TestResponse {
        let body = match email {
            Some(email) => json!({ "email": email }),
            None => json!({}),
        };
        self.post(&format!("/activities/{}/signup", activity), Some(token), body)
            .await
    }

    pub async fn unregister(&self, activity: &str, token: &str, email: Option<&str>) -> TestResponse {
        let uri = match email {
            Some(email) => format!("/activities/{}/unregister?email={}", activity, email),
            None => format!("/activities/{}/unregister", activity),
        };
        self.call(Method::DELETE, &uri, Some(token), None).await
    }
}
