//! Router assembly and server lifecycle.

use crate::ai::{GeminiClient, PhdvClient};
use crate::api::handlers::{analyze, dashboard, phdv, status};
use crate::api::validation::MAX_FILE_SIZE;
use crate::config::Config;
use crate::storage::{Storage, VaultStore};
use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Everything the handlers need, constructed once and injected. The
/// external clients live here so tests can point them at stubs.
pub struct AppState {
    pub config: Config,
    pub store: VaultStore,
    pub gemini: GeminiClient,
    pub phdv: PhdvClient,
}

impl AppState {
    pub fn new(config: Config, backend: Arc<dyn Storage>) -> Self {
        let gemini = GeminiClient::new(&config);
        let phdv = PhdvClient::new(&config);
        Self {
            config,
            store: VaultStore::new(backend),
            gemini,
            phdv,
        }
    }
}

// Multipart framing overhead on top of the file ceiling; the validator,
// not the framework, must produce the size error.
const MAX_UPLOAD_BODY_BYTES: usize = MAX_FILE_SIZE as usize + 1024 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/analyze-health",
            get(analyze::analyze_health_status).post(analyze::analyze_health),
        )
        .route(
            "/api/phdv",
            get(phdv::phdv_status).post(phdv::phdv_analyze),
        )
        .route("/api/dashboard", get(dashboard::get_dashboard))
        .route("/api/test", get(status::storage_probe))
        .route("/api/test-gemini", get(status::gemini_probe))
        .route("/health", get(|| async { "OK" }))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// API Server struct
pub struct ApiServer {
    pub port: u16,
    pub state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(port: u16, state: Arc<AppState>) -> Self {
        Self { port, state }
    }

    pub async fn run(self) -> Result<()> {
        let app = router(self.state);

        println!("🚀 PHDV node starting on :{}", self.port);

        let listener = tokio::net::TcpListener::bind(("0.0.0.0", self.port)).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}
