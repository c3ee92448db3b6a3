//! Node configuration, read once from the environment and threaded
//! explicitly into the clients that need it.

/// Runtime configuration for the PHDV node.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the API server listens on.
    pub port: u16,
    /// Directory for the RocksDB document store.
    pub data_dir: String,
    /// Gemini API key. Absence is a call-time error, not a startup crash.
    pub gemini_api_key: Option<String>,
    /// Base URL of the Gemini REST API (overridable for stubs).
    pub gemini_api_url: String,
    /// Gemini model used for document analysis.
    pub gemini_model: String,
    /// Base URL of the BioAgents-PHDV service.
    pub phdv_api_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PHDV_NODE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            data_dir: std::env::var("PHDV_DATA_DIR").unwrap_or_else(|_| "data/phdv".to_string()),
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            gemini_api_url: std::env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
            phdv_api_url: std::env::var("PHDV_API_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
        }
    }
}
