//! Diagnostic probes: storage connectivity and Gemini connectivity.

use crate::api::server::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// `GET /api/test` — storage liveness.
pub async fn storage_probe(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Database connected successfully",
            })),
        ),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "message": "Database connection failed",
                "error": err.to_string(),
            })),
        ),
    }
}

/// `GET /api/test-gemini` — round trip through the Gemini API.
pub async fn gemini_probe(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.gemini.ping().await {
        Ok(text) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Gemini API connection successful",
                "testResponse": text,
                "apiKeyPresent": true,
                "model": state.gemini.model(),
            })),
        ),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": "Gemini API connection failed",
                "details": err.to_string(),
                "apiKeyPresent": state.gemini.has_api_key(),
            })),
        ),
    }
}
