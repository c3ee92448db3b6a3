//! PHDV node — backend for a personal health data vault.
//!
//! Users identified by a wallet address upload health documents. The node
//! validates the upload, dispatches it to an external analyzer (the Gemini
//! REST API or the BioAgents-PHDV microservice), normalizes the reply,
//! persists a user document and an analysis document in one atomic write,
//! and awards tokens. A dashboard endpoint returns a user's analyses and
//! simple time-window stats.

pub mod ai;
pub mod api;
pub mod config;
pub mod models;
pub mod rewards;
pub mod storage;
