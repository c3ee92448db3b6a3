//! Gemini REST client for document analysis.

use super::UpstreamError;
use crate::config::Config;
use serde_json::{json, Value};

/// Markdown prompt used when the caller asked for a human-readable report.
pub const MARKDOWN_ANALYSIS_PROMPT: &str = r#"
Analyze this medical/health document in detail and respond in the following markdown format:

# 📋 [Document Title] - [Document Type]

📅 **Date:** [Document Date]
🔬 **Lab Results** | ✅ **AI Analysis Complete**

## 🤖 AI Summary

*Confidence: [confidence percentage]%*

[2-3 sentence summary about overall health status.]

## 📊 Key Findings

• **[Parameter]:** [finding with value and unit]

## 💡 AI Recommendations

✓ [Recommendation]

---

**Risk Assessment:** 🟢 Low Risk

IMPORTANT:
- Respond ONLY in markdown format
- Write ALL content in ENGLISH
- List key findings with bullet points
- Indicate risk level (🟢 Low / 🟡 Moderate / 🔴 High)
- Highlight abnormal values
- Use professional but clear language
"#;

/// Strict-schema prompt used for the JSON format path.
pub const JSON_ANALYSIS_PROMPT: &str = r#"
Analyze this medical/health document in detail and respond in the following JSON format:

{
  "documentType": "Document type (Blood Test, Medical Report, X-Ray Report, etc.)",
  "date": "Document date (if available)",
  "patientInfo": {
    "name": "Patient name (if available)",
    "age": "Age (if available)",
    "gender": "Gender (if available)",
    "id": "Patient ID/protocol number (if available)"
  },
  "findings": [
    {
      "parameter": "Test/parameter name",
      "value": "Measured value",
      "unit": "Unit (mg/dL, g/L, etc.)",
      "referenceRange": "Normal reference range",
      "status": "normal/low/high/critical",
      "category": "Category (Hemogram, Biochemistry, etc.)"
    }
  ],
  "abnormalValues": [
    {
      "parameter": "Abnormal parameter name",
      "value": "Measured value",
      "expectedRange": "Expected value range",
      "severity": "mild/moderate/severe",
      "meaning": "Possible meaning and significance of this abnormal value"
    }
  ],
  "summary": "Brief summary of overall health status (2-3 sentences)",
  "recommendations": [
    "Recommendation 1: Areas to monitor",
    "Recommendation 2: Points to pay attention to",
    "Recommendation 3: Physician consultation recommendations"
  ]
}

IMPORTANT:
- Respond ONLY in JSON format, no additional explanations
- Write ALL content in ENGLISH
- If information is not available in the document, leave the field empty or null
- Highlight critical values
- Explain possible causes and significance of abnormal values
"#;

/// Thin wrapper over the `generateContent` endpoint. Constructed from
/// config so tests can point it at a stub and so a missing key surfaces as
/// an explicit error instead of a failing request.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.gemini_api_url.trim_end_matches('/').to_string(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One blocking round trip: prompt plus the document as inline base64.
    /// No timeout, no retry.
    pub async fn generate(
        &self,
        prompt: &str,
        mime_type: &str,
        base64_data: &str,
    ) -> Result<String, UpstreamError> {
        self.request(json!([
            { "text": prompt },
            { "inlineData": { "mimeType": mime_type, "data": base64_data } }
        ]))
        .await
    }

    /// Trivial text-only call used by the connectivity probe.
    pub async fn ping(&self) -> Result<String, UpstreamError> {
        self.request(json!([
            { "text": "Reply with exactly: Gemini API connected!" }
        ]))
        .await
    }

    async fn request(&self, parts: Value) -> Result<String, UpstreamError> {
        let api_key = self.api_key.as_deref().ok_or(UpstreamError::MissingApiKey)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let payload = json!({
            "contents": [{ "parts": parts }],
            "generationConfig": {
                "temperature": 0.4,
                "topP": 0.95,
                "topK": 40,
                "maxOutputTokens": 8192,
            },
        });

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(UpstreamError::QuotaExhausted);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let body: Value = response.json().await?;
        body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                UpstreamError::InvalidResponse("no candidate text in reply".to_string())
            })
    }
}
