//! Client for the BioAgents-PHDV processing service.

use super::UpstreamError;
use crate::config::Config;
use crate::models::PhdvState;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::time::Duration;

/// Reply from the PHDV chat endpoint: the assistant text plus the pipeline
/// state carrying extracted, anonymized and scored health data.
#[derive(Debug, Clone)]
pub struct PhdvReply {
    pub text: Option<String>,
    pub files: Option<Value>,
    pub state: PhdvState,
}

pub struct PhdvClient {
    http: reqwest::Client,
    base_url: String,
}

impl PhdvClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.phdv_api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Re-packages the upload as multipart form data and forwards it to the
    /// service's chat endpoint. One round trip, no timeout, no retry.
    pub async fn analyze(
        &self,
        file_name: &str,
        mime_type: &str,
        data: Vec<u8>,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<PhdvReply, UpstreamError> {
        let part = Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| UpstreamError::InvalidResponse(format!("invalid mime type: {e}")))?;

        let form = Form::new()
            .text("message", "Process and analyze this health data file")
            .part("files", part)
            .text("userId", user_id.to_string())
            .text("conversationId", conversation_id.to_string());

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Surface the upstream error field when the body is parseable.
            let detail = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body["error"].as_str().map(str::to_string))
                .unwrap_or_else(|| format!("PHDV API returned status {}", status.as_u16()));
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let body: Value = response.json().await?;
        let state: PhdvState = body
            .get("state")
            .filter(|value| !value.is_null())
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?
            .unwrap_or_default();

        Ok(PhdvReply {
            text: body["text"].as_str().map(str::to_string),
            files: body.get("files").cloned(),
            state,
        })
    }

    /// Pings the service's `/health` endpoint. The 5-second timeout is the
    /// only timeout in the system.
    pub async fn health(&self) -> &'static str {
        let result = self
            .http
            .get(format!("{}/health", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => "connected",
            Ok(_) => "error",
            Err(_) => "disconnected",
        }
    }
}
