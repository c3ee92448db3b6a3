//! Best-effort normalization of the model's JSON-format reply.

use serde_json::{json, Value};

/// Strips markdown code fences and parses the reply as JSON.
///
/// Parse failure falls back to a placeholder object carrying the raw text
/// verbatim under `rawAnalysis` instead of propagating the error, so a
/// prose reply still renders on the dashboard.
pub fn parse_analysis_reply(raw: &str) -> Value {
    let cleaned = raw.replace("```json", "").replace("```", "");
    serde_json::from_str(cleaned.trim()).unwrap_or_else(|_| {
        json!({
            "documentType": "Analyzed Document",
            "summary": raw,
            "rawAnalysis": raw,
            "findings": [],
            "abnormalValues": [],
            "recommendations": ["Review the raw analysis text."],
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_json_parses_to_the_inner_object() {
        let reply = "```json\n{\"documentType\":\"Blood Test\",\"findings\":[]}\n```";
        let parsed = parse_analysis_reply(reply);
        assert_eq!(parsed["documentType"], "Blood Test");
        assert!(parsed.get("rawAnalysis").is_none());
    }

    #[test]
    fn bare_json_parses_unchanged() {
        let parsed = parse_analysis_reply("{\"summary\":\"fine\"}");
        assert_eq!(parsed["summary"], "fine");
    }

    #[test]
    fn malformed_reply_becomes_the_placeholder() {
        let reply = "The document shows normal values overall.";
        let parsed = parse_analysis_reply(reply);
        assert_eq!(parsed["rawAnalysis"], reply);
        assert_eq!(parsed["summary"], reply);
        assert_eq!(parsed["findings"], serde_json::json!([]));
        assert_eq!(parsed["abnormalValues"], serde_json::json!([]));
    }
}
