//! Persisted document types.
//!
//! Wire and storage field names are camelCase to match the document schema
//! the dashboard consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Canonical identity form for wallet addresses: trimmed and lowercased.
/// Lookups are case-insensitive; analysis records keep the address as the
/// route received it.
pub fn normalize_wallet(wallet: &str) -> String {
    wallet.trim().to_lowercase()
}

/// Per-wallet balance and counters. Created on first upload, mutated by
/// every subsequent analysis, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub wallet_address: String,
    pub tokens: u64,
    pub total_analyses: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_analysis_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(wallet_address: String, now: DateTime<Utc>) -> Self {
        Self {
            wallet_address,
            tokens: 0,
            total_analyses: 0,
            last_analysis_date: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Analysis payload, tagged by `format`. The tag decides which payload
/// field exists; a document whose fields don't match its tag cannot be
/// constructed or read back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum AnalysisPayload {
    Markdown {
        markdown: String,
    },
    Json {
        #[serde(rename = "analysisData")]
        analysis_data: Value,
    },
    Phdv {
        #[serde(rename = "analysisData")]
        analysis_data: PhdvAnalysisData,
    },
}

impl AnalysisPayload {
    pub fn format_name(&self) -> &'static str {
        match self {
            AnalysisPayload::Markdown { .. } => "markdown",
            AnalysisPayload::Json { .. } => "json",
            AnalysisPayload::Phdv { .. } => "phdv",
        }
    }
}

/// One immutable document per upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: String,
    pub wallet_address: String,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    #[serde(flatten)]
    pub payload: AnalysisPayload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn new(
        wallet_address: &str,
        file_name: &str,
        file_size: u64,
        file_type: &str,
        payload: AnalysisPayload,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            wallet_address: wallet_address.to_string(),
            file_name: file_name.to_string(),
            file_size,
            file_type: file_type.to_string(),
            payload,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Vault output stored for PHDV-format analyses. Shapes inside the arrays
/// are defined entirely by the BioAgents-PHDV service and passed through.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PhdvAnalysisData {
    #[serde(rename = "phdvHealthData", default)]
    pub health_data: Vec<Value>,
    #[serde(rename = "phdvAnonymizedData", default)]
    pub anonymized_data: Vec<Value>,
    #[serde(rename = "phdvQualityScores", default)]
    pub quality_scores: Vec<Value>,
    #[serde(rename = "phdvAggregateStats", default, skip_serializing_if = "Option::is_none")]
    pub aggregate_stats: Option<Value>,
    #[serde(rename = "aiResponse", default, skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,
    #[serde(rename = "processingSteps", default, skip_serializing_if = "Option::is_none")]
    pub processing_steps: Option<Value>,
}

/// Pipeline state returned by the PHDV service's chat endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PhdvState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Value>,
    #[serde(rename = "phdvHealthData", default)]
    pub health_data: Vec<Value>,
    #[serde(rename = "phdvErrors", default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(rename = "phdvAnonymizedData", default)]
    pub anonymized_data: Vec<Value>,
    #[serde(rename = "phdvPrivacyErrors", default, skip_serializing_if = "Vec::is_empty")]
    pub privacy_errors: Vec<String>,
    #[serde(rename = "phdvQualityScores", default)]
    pub quality_scores: Vec<Value>,
    #[serde(rename = "phdvAggregateStats", default, skip_serializing_if = "Option::is_none")]
    pub aggregate_stats: Option<Value>,
    #[serde(rename = "phdvQualityErrors", default, skip_serializing_if = "Vec::is_empty")]
    pub quality_errors: Vec<String>,
}
