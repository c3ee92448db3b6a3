//! `/api/analyze-health` — upload + analysis via the Gemini API.

use crate::ai::gemini::{JSON_ANALYSIS_PROMPT, MARKDOWN_ANALYSIS_PROMPT};
use crate::ai::{normalize, UpstreamError};
use crate::api::errors::{ApiError, ApiResult};
use crate::api::handlers::read_upload_form;
use crate::api::server::AppState;
use crate::api::validation::{
    self, ALLOWED_FILE_TYPES, MAX_FILE_SIZE,
};
use crate::models::{AnalysisPayload, AnalysisRecord};
use crate::rewards;
use crate::storage::{RewardOutcome, StorageError};
use axum::extract::{Multipart, Query, State};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Value>,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    pub token_reward: RewardOutcome,
}

pub async fn analyze_health(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalyzeParams>,
    mut multipart: Multipart,
) -> ApiResult<Json<AnalyzeResponse>> {
    // Anything other than an explicit "json" renders as markdown.
    let json_format = params.format.as_deref() == Some("json");

    let form = read_upload_form(&mut multipart).await?;
    let file = validation::require_file(form.file.as_ref())?;
    let wallet = validation::require_wallet_address(form.wallet_address.as_deref())?;
    validation::validate_file_type(&file.file_type)?;
    validation::validate_file_size(file.size())?;

    let encoded = BASE64.encode(&file.data);
    let prompt = if json_format {
        JSON_ANALYSIS_PROMPT
    } else {
        MARKDOWN_ANALYSIS_PROMPT
    };

    let reply = state
        .gemini
        .generate(prompt, &file.file_type, &encoded)
        .await
        .map_err(gemini_error)?;

    let (payload, markdown, analysis) = if json_format {
        let analysis = normalize::parse_analysis_reply(&reply);
        (
            AnalysisPayload::Json {
                analysis_data: analysis.clone(),
            },
            None,
            Some(analysis),
        )
    } else {
        (
            AnalysisPayload::Markdown {
                markdown: reply.clone(),
            },
            Some(reply),
            None,
        )
    };

    let record = AnalysisRecord::new(
        &wallet,
        &file.file_name,
        file.size(),
        &file.file_type,
        payload,
    );
    let earned = rewards::generate_token_reward(rewards::MIN_REWARD, rewards::MAX_REWARD);
    let token_reward = state
        .store
        .reward_and_record(&wallet, earned, record)
        .await
        .map_err(storage_error)?;

    Ok(Json(AnalyzeResponse {
        success: true,
        markdown,
        analysis,
        file_name: file.file_name.clone(),
        file_size: file.size(),
        file_type: file.file_type.clone(),
        token_reward,
    }))
}

/// Readiness probe reporting the accepted types and size ceiling.
pub async fn analyze_health_status() -> Json<Value> {
    Json(json!({
        "status": "ready",
        "message": "Health analysis API is ready",
        "supportedFormats": ALLOWED_FILE_TYPES,
        "maxFileSize": format!("{}MB", MAX_FILE_SIZE / 1024 / 1024),
    }))
}

fn gemini_error(err: UpstreamError) -> ApiError {
    log::error!("Health analysis error: {err}");
    match err {
        UpstreamError::MissingApiKey => {
            ApiError::internal("API key error", "Gemini API key is invalid or missing")
        }
        UpstreamError::QuotaExhausted => ApiError::internal(
            "API quota exceeded",
            "The daily API usage limit has been reached",
        ),
        UpstreamError::Timeout => ApiError::internal(
            "Processing timeout",
            "The analysis took too long. Please try again with a smaller file.",
        ),
        UpstreamError::Unreachable(detail) => {
            ApiError::internal("AI service unavailable", &detail)
        }
        UpstreamError::Status { detail, .. } | UpstreamError::InvalidResponse(detail) => {
            ApiError::internal("An error occurred during analysis", &detail)
        }
    }
}

fn storage_error(err: StorageError) -> ApiError {
    log::error!("Health analysis persistence error: {err}");
    ApiError::internal("Database error occurred", &err.to_string())
}
