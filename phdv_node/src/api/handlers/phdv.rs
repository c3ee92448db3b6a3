//! `/api/phdv` — upload + analysis via the BioAgents-PHDV service.

use crate::ai::UpstreamError;
use crate::api::errors::{ApiError, ApiResult};
use crate::api::handlers::read_upload_form;
use crate::api::server::AppState;
use crate::api::validation::{self, ALLOWED_FILE_TYPES, MAX_FILE_SIZE};
use crate::models::{
    normalize_wallet, AnalysisPayload, AnalysisRecord, PhdvAnalysisData, PhdvState,
};
use crate::rewards;
use crate::storage::{RewardOutcome, StorageError};
use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhdvAnalyzeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Value>,
    pub state: PhdvState,
    pub token_reward: RewardOutcome,
}

pub async fn phdv_analyze(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<PhdvAnalyzeResponse>> {
    let form = read_upload_form(&mut multipart).await?;
    let file = validation::require_file(form.file.as_ref())?;
    let wallet = validation::require_wallet_address(form.wallet_address.as_deref())?;
    validation::validate_file_type(&file.file_type)?;
    validation::validate_file_size(file.size())?;

    let wallet_lower = normalize_wallet(&wallet);
    let conversation_id = new_conversation_id();

    let reply = state
        .phdv
        .analyze(
            &file.file_name,
            &file.file_type,
            file.data.to_vec(),
            &wallet_lower,
            &conversation_id,
        )
        .await
        .map_err(phdv_error)?;

    let pipeline = reply.state;
    if pipeline.health_data.is_empty() {
        let details = if pipeline.errors.is_empty() {
            "Could not extract health data from the file. Please ensure it contains valid health information."
                .to_string()
        } else {
            pipeline.errors.join(", ")
        };
        return Err(ApiError::bad_request("No health data extracted", &details));
    }

    // Tokens scale with the quality of the extracted data.
    let earned = rewards::quality_reward_tokens(&pipeline.quality_scores);

    let record = AnalysisRecord::new(
        &wallet_lower,
        &file.file_name,
        file.size(),
        &file.file_type,
        AnalysisPayload::Phdv {
            analysis_data: PhdvAnalysisData {
                health_data: pipeline.health_data.clone(),
                anonymized_data: pipeline.anonymized_data.clone(),
                quality_scores: pipeline.quality_scores.clone(),
                aggregate_stats: pipeline.aggregate_stats.clone(),
                ai_response: reply.text.clone(),
                processing_steps: pipeline.steps.clone(),
            },
        },
    );

    let token_reward = state
        .store
        .reward_and_record(&wallet_lower, earned, record)
        .await
        .map_err(storage_error)?;

    Ok(Json(PhdvAnalyzeResponse {
        success: true,
        text: reply.text,
        files: reply.files,
        state: pipeline,
        token_reward,
    }))
}

/// Readiness probe that also pings the PHDV service.
pub async fn phdv_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let phdv_status = state.phdv.health().await;
    Json(json!({
        "status": "ready",
        "message": "PHDV API endpoint is ready",
        "phdvApiUrl": state.phdv.base_url(),
        "phdvStatus": phdv_status,
        "supportedFileTypes": ALLOWED_FILE_TYPES,
        "maxFileSize": format!("{}MB", MAX_FILE_SIZE / 1024 / 1024),
    }))
}

fn new_conversation_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("phdv-{}-{}", Utc::now().timestamp_millis(), &suffix[..7])
}

fn phdv_error(err: UpstreamError) -> ApiError {
    log::error!("PHDV API error: {err}");
    match err {
        UpstreamError::Unreachable(_) => ApiError::internal(
            "PHDV service unavailable",
            "The PHDV processing service is not running. Please ensure BioAgents-PHDV is started.",
        ),
        UpstreamError::Timeout => ApiError::internal(
            "Processing timeout",
            "The file processing took too long. Please try with a smaller file.",
        ),
        UpstreamError::Status { detail, .. } => {
            ApiError::internal("PHDV processing failed", &detail)
        }
        other => ApiError::internal("An error occurred during processing", &other.to_string()),
    }
}

fn storage_error(err: StorageError) -> ApiError {
    log::error!("PHDV persistence error: {err}");
    ApiError::internal("Database error occurred", &err.to_string())
}
