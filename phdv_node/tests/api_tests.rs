//! End-to-end API tests with both external analyzers stubbed.
//!
//! The stubs are real axum servers on ephemeral ports; the node under test
//! is driven through `tower::ServiceExt::oneshot` against an in-memory
//! store.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use phdv_node::api::{self, AppState};
use phdv_node::config::Config;
use phdv_node::storage::{MemoryStorage, Storage};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "phdv-test-boundary";

fn multipart_body(file: Option<(&str, &str, &[u8])>, wallet: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some((name, mime, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"{name}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(wallet) = wallet {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; \
                 name=\"walletAddress\"\r\n\r\n{wallet}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Stub of the Gemini `generateContent` endpoint returning a fixed reply.
async fn spawn_gemini_stub(reply_text: &str) -> String {
    let text = reply_text.to_string();
    let app = Router::new()
        .route(
            "/v1beta/models/:model",
            post(move || {
                let text = text.clone();
                async move {
                    Json(json!({
                        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
                    }))
                }
            }),
        )
        // The node posts the upload as inline base64; leave headroom.
        .layer(axum::extract::DefaultBodyLimit::max(64 * 1024 * 1024));
    spawn(app).await
}

/// Stub of the BioAgents-PHDV chat endpoint returning a fixed reply.
async fn spawn_phdv_stub(reply: Value) -> String {
    let reply = Arc::new(reply);
    let app = Router::new()
        .route(
            "/api/chat",
            post(move || {
                let reply = reply.clone();
                async move { Json((*reply).clone()) }
            }),
        )
        .route("/health", get(|| async { "OK" }));
    spawn(app).await
}

fn test_config(gemini_url: &str, phdv_url: &str) -> Config {
    Config {
        port: 0,
        data_dir: String::new(),
        gemini_api_key: Some("test-key".to_string()),
        gemini_api_url: gemini_url.to_string(),
        gemini_model: "gemini-2.5-flash".to_string(),
        phdv_api_url: phdv_url.to_string(),
    }
}

fn test_app(config: Config) -> Router {
    let backend: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    api::router(Arc::new(AppState::new(config, backend)))
}

/// App whose externals point nowhere; enough for validation paths.
fn offline_app() -> Router {
    test_app(test_config("http://127.0.0.1:1", "http://127.0.0.1:1"))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn rejects_missing_file() {
    let app = offline_app();
    let response = app
        .oneshot(upload_request(
            "/api/analyze-health",
            multipart_body(None, Some("0xabc")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No file provided");
}

#[tokio::test]
async fn rejects_missing_wallet_address() {
    let app = offline_app();
    let response = app
        .oneshot(upload_request(
            "/api/phdv",
            multipart_body(Some(("a.pdf", "application/pdf", b"%PDF-1.4")), None),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Wallet address required");
}

#[tokio::test]
async fn rejects_disallowed_mime_type() {
    let app = offline_app();
    let response = app
        .oneshot(upload_request(
            "/api/analyze-health",
            multipart_body(
                Some(("archive.pdf", "application/zip", b"PK")),
                Some("0xabc"),
            ),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Unsupported file type: application/zip");
}

#[tokio::test]
async fn size_ceiling_is_inclusive() {
    let gemini = spawn_gemini_stub("# Report\nAll clear.").await;
    let app = test_app(test_config(&gemini, "http://127.0.0.1:1"));

    let at_limit = vec![0u8; 20 * 1024 * 1024];
    let response = app
        .clone()
        .oneshot(upload_request(
            "/api/analyze-health",
            multipart_body(Some(("big.pdf", "application/pdf", &at_limit)), Some("0xabc")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let over_limit = vec![0u8; 20 * 1024 * 1024 + 1];
    let response = app
        .oneshot(upload_request(
            "/api/analyze-health",
            multipart_body(
                Some(("bigger.pdf", "application/pdf", &over_limit)),
                Some("0xabc"),
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "File too large");
}

#[tokio::test]
async fn markdown_upload_persists_and_rewards() {
    let gemini = spawn_gemini_stub("# Lab Report\nEverything in range.").await;
    let app = test_app(test_config(&gemini, "http://127.0.0.1:1"));

    let file = vec![0u8; 1024 * 1024];
    let response = app
        .clone()
        .oneshot(upload_request(
            "/api/analyze-health",
            multipart_body(Some(("labs.pdf", "application/pdf", &file)), Some("0xAbC123")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["markdown"], "# Lab Report\nEverything in range.");
    assert_eq!(body["fileName"], "labs.pdf");
    assert_eq!(body["fileSize"], 1024 * 1024);
    assert_eq!(body["fileType"], "application/pdf");
    let earned = body["tokenReward"]["earned"].as_u64().unwrap();
    assert!((10..=100).contains(&earned));
    assert_eq!(body["tokenReward"]["total"], earned);
    assert_eq!(body["tokenReward"]["isNewUser"], true);

    // A second upload accumulates and is no longer a new user.
    let response = app
        .clone()
        .oneshot(upload_request(
            "/api/analyze-health",
            multipart_body(Some(("labs2.pdf", "application/pdf", &file)), Some("0xabc123")),
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    let second = body["tokenReward"]["earned"].as_u64().unwrap();
    assert_eq!(body["tokenReward"]["total"], earned + second);
    assert_eq!(body["tokenReward"]["isNewUser"], false);

    // The dashboard sees both records with matching file metadata.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/dashboard?walletAddress=0xABC123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["stats"]["totalReports"], 2);
    assert_eq!(body["data"]["user"]["tokens"], earned + second);
    assert_eq!(body["data"]["user"]["totalAnalyses"], 2);
    let reports = body["data"]["reports"].as_array().unwrap();
    let mut names: Vec<&str> = reports
        .iter()
        .map(|r| r["fileName"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["labs.pdf", "labs2.pdf"]);
    for report in reports {
        assert_eq!(report["fileSize"], 1024 * 1024);
        assert_eq!(report["fileType"], "application/pdf");
        assert_eq!(report["format"], "markdown");
    }
}

#[tokio::test]
async fn json_format_parses_fenced_reply() {
    let gemini = spawn_gemini_stub(
        "```json\n{\"documentType\":\"Blood Test\",\"summary\":\"fine\",\"findings\":[]}\n```",
    )
    .await;
    let app = test_app(test_config(&gemini, "http://127.0.0.1:1"));

    let response = app
        .clone()
        .oneshot(upload_request(
            "/api/analyze-health?format=json",
            multipart_body(Some(("labs.pdf", "application/pdf", b"%PDF")), Some("0xabc")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["analysis"]["documentType"], "Blood Test");
    assert!(body.get("markdown").is_none());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/dashboard?walletAddress=0xabc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["reports"][0]["format"], "json");
    assert_eq!(
        body["data"]["reports"][0]["analysisData"]["documentType"],
        "Blood Test"
    );
}

#[tokio::test]
async fn json_format_wraps_malformed_reply() {
    let prose = "The document shows normal values overall.";
    let gemini = spawn_gemini_stub(prose).await;
    let app = test_app(test_config(&gemini, "http://127.0.0.1:1"));

    let response = app
        .oneshot(upload_request(
            "/api/analyze-health?format=json",
            multipart_body(Some(("labs.pdf", "application/pdf", b"%PDF")), Some("0xabc")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["analysis"]["rawAnalysis"], prose);
    assert_eq!(body["analysis"]["findings"], json!([]));
}

#[tokio::test]
async fn phdv_route_rewards_by_quality_score() {
    let phdv = spawn_phdv_stub(json!({
        "text": "Processed 1 file.",
        "state": {
            "phdvHealthData": [{ "filename": "vitals.csv" }],
            "phdvAnonymizedData": [{ "filename": "vitals.csv" }],
            "phdvQualityScores": [{ "qualityScore": { "overallScore": 80.0 } }],
        }
    }))
    .await;
    let app = test_app(test_config("http://127.0.0.1:1", &phdv));

    let response = app
        .clone()
        .oneshot(upload_request(
            "/api/phdv",
            multipart_body(Some(("vitals.csv", "text/csv", b"hr,72")), Some("0xDeF")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["text"], "Processed 1 file.");
    // 10 + (80 / 100) * 90 = 82
    assert_eq!(body["tokenReward"]["earned"], 82);
    assert_eq!(body["tokenReward"]["total"], 82);
    assert_eq!(body["state"]["phdvHealthData"][0]["filename"], "vitals.csv");

    // Record lands under the lowercased wallet with the phdv format tag.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/dashboard?walletAddress=0xdef")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["reports"][0]["format"], "phdv");
    assert_eq!(
        body["data"]["reports"][0]["analysisData"]["phdvQualityScores"][0]["qualityScore"]
            ["overallScore"],
        80.0
    );
}

#[tokio::test]
async fn phdv_route_rejects_empty_health_data() {
    let phdv = spawn_phdv_stub(json!({
        "text": "Nothing extracted.",
        "state": {
            "phdvHealthData": [],
            "phdvErrors": ["unreadable file"],
        }
    }))
    .await;
    let app = test_app(test_config("http://127.0.0.1:1", &phdv));

    let response = app
        .oneshot(upload_request(
            "/api/phdv",
            multipart_body(Some(("junk.csv", "text/csv", b"???")), Some("0xdef")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "No health data extracted");
    assert_eq!(body["details"], "unreadable file");
}

#[tokio::test]
async fn phdv_route_reports_unreachable_service() {
    let app = offline_app();
    let response = app
        .oneshot(upload_request(
            "/api/phdv",
            multipart_body(Some(("v.csv", "text/csv", b"hr,72")), Some("0xdef")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "PHDV service unavailable");
}

#[tokio::test]
async fn dashboard_requires_wallet_param() {
    let app = offline_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Wallet address is required");
}

#[tokio::test]
async fn dashboard_auto_creates_unseen_user() {
    let app = offline_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/dashboard?walletAddress=0xNew")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["user"]["walletAddress"], "0xnew");
    assert_eq!(body["data"]["user"]["tokens"], 0);
    assert_eq!(body["data"]["user"]["totalAnalyses"], 0);
    assert_eq!(body["data"]["reports"], json!([]));
    assert_eq!(body["data"]["stats"]["totalReports"], 0);
}

#[tokio::test]
async fn probes_report_readiness() {
    let phdv = spawn_phdv_stub(json!({})).await;
    let app = test_app(test_config("http://127.0.0.1:1", &phdv));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/analyze-health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["maxFileSize"], "20MB");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/phdv")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["phdvStatus"], "connected");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Database connected successfully");
}

#[tokio::test]
async fn gemini_probe_reports_missing_key() {
    let mut config = test_config("http://127.0.0.1:1", "http://127.0.0.1:1");
    config.gemini_api_key = None;
    let app = test_app(config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/test-gemini")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Gemini API connection failed");
    assert_eq!(body["apiKeyPresent"], false);
}
