use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::services::api_docs_service;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    build: &'static str,
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        build: env!("MERGINGTON_BUILD_ID"),
    })
}

pub async fn openapi_handler() -> Json<Value> {
    Json(api_docs_service::openapi_document())
}
