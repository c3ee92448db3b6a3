//! `/api/dashboard` — a wallet's profile, reports and usage stats.

use crate::api::errors::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::models::{AnalysisPayload, AnalysisRecord, UserRecord};
use crate::storage::StorageError;
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Duration, Months, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    #[serde(rename = "walletAddress")]
    pub wallet_address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub data: DashboardData,
}

#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub user: DashboardUser,
    pub reports: Vec<DashboardReport>,
    pub stats: DashboardStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardUser {
    pub wallet_address: String,
    pub tokens: u64,
    pub total_analyses: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_analysis_date: Option<String>,
    pub member_since: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub id: String,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    pub format: &'static str,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_reports: usize,
    pub reports_this_month: usize,
    pub reports_this_week: usize,
}

pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> ApiResult<Json<DashboardResponse>> {
    let wallet = params
        .wallet_address
        .as_deref()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .ok_or_else(|| {
            ApiError::bad_request(
                "Wallet address is required",
                "Please provide a valid wallet address as a query parameter",
            )
        })?;

    let user = state
        .store
        .ensure_user(wallet)
        .await
        .map_err(storage_error)?;
    let reports = state
        .store
        .find_analyses(wallet)
        .await
        .map_err(storage_error)?;

    let stats = compute_stats(&reports, Utc::now());
    let reports = reports.into_iter().map(format_report).collect();

    Ok(Json(DashboardResponse {
        success: true,
        data: DashboardData {
            user: format_user(user),
            reports,
            stats,
        },
    }))
}

/// Naive trailing windows: the month boundary is the same day number one
/// calendar month back, the week boundary is seven days back.
fn compute_stats(reports: &[AnalysisRecord], now: DateTime<Utc>) -> DashboardStats {
    let one_month_ago = now
        .checked_sub_months(Months::new(1))
        .unwrap_or(now - Duration::days(30));
    let one_week_ago = now - Duration::days(7);

    DashboardStats {
        total_reports: reports.len(),
        reports_this_month: reports
            .iter()
            .filter(|r| r.created_at >= one_month_ago)
            .count(),
        reports_this_week: reports
            .iter()
            .filter(|r| r.created_at >= one_week_ago)
            .count(),
    }
}

fn iso(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn format_user(user: UserRecord) -> DashboardUser {
    DashboardUser {
        wallet_address: user.wallet_address,
        tokens: user.tokens,
        total_analyses: user.total_analyses,
        last_analysis_date: user.last_analysis_date.map(iso),
        member_since: iso(user.created_at),
    }
}

fn format_report(record: AnalysisRecord) -> DashboardReport {
    let format = record.payload.format_name();
    let (markdown, analysis_data) = match record.payload {
        AnalysisPayload::Markdown { markdown } => (Some(markdown), None),
        AnalysisPayload::Json { analysis_data } => (None, Some(analysis_data)),
        AnalysisPayload::Phdv { analysis_data } => {
            (None, serde_json::to_value(analysis_data).ok())
        }
    };
    DashboardReport {
        id: record.id,
        file_name: record.file_name,
        file_size: record.file_size,
        file_type: record.file_type,
        format,
        created_at: iso(record.created_at),
        updated_at: iso(record.updated_at),
        analysis_data,
        markdown,
    }
}

fn storage_error(err: StorageError) -> ApiError {
    log::error!("Dashboard API error: {err}");
    ApiError::internal(
        "An error occurred while fetching dashboard data",
        &err.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisPayload;

    fn record_at(created_at: DateTime<Utc>) -> AnalysisRecord {
        let mut record = AnalysisRecord::new(
            "0xabc",
            "r.pdf",
            100,
            "application/pdf",
            AnalysisPayload::Markdown {
                markdown: "# r".to_string(),
            },
        );
        record.created_at = created_at;
        record
    }

    #[test]
    fn windows_count_week_and_month_naively() {
        let now = Utc::now();
        let reports = vec![
            record_at(now),
            record_at(now - Duration::days(3)),
            record_at(now - Duration::days(10)),
            record_at(now - Duration::days(40)),
        ];

        let stats = compute_stats(&reports, now);
        assert_eq!(
            stats,
            DashboardStats {
                total_reports: 4,
                reports_this_month: 3,
                reports_this_week: 2,
            }
        );
    }

    #[test]
    fn report_payload_field_follows_the_format() {
        let markdown = format_report(record_at(Utc::now()));
        assert_eq!(markdown.format, "markdown");
        assert!(markdown.markdown.is_some());
        assert!(markdown.analysis_data.is_none());

        let mut json_record = record_at(Utc::now());
        json_record.payload = AnalysisPayload::Json {
            analysis_data: serde_json::json!({ "summary": "ok" }),
        };
        let json_report = format_report(json_record);
        assert_eq!(json_report.format, "json");
        assert!(json_report.markdown.is_none());
        assert_eq!(json_report.analysis_data.unwrap()["summary"], "ok");
    }
}
