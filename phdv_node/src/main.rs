use anyhow::Result;
use phdv_node::api::{ApiServer, AppState};
use phdv_node::config::Config;
use phdv_node::storage::{RocksDbStorage, Storage};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_env();
    log::info!(
        "PHDV node configuration: data_dir={}, phdv_api={}, gemini_key_present={}",
        config.data_dir,
        config.phdv_api_url,
        config.gemini_api_key.is_some()
    );

    let backend: Arc<dyn Storage> =
        Arc::new(RocksDbStorage::open(&config.data_dir).map_err(|e| anyhow::anyhow!("{e}"))?);

    let port = config.port;
    let state = Arc::new(AppState::new(config, backend));

    ApiServer::new(port, state).run().await
}
