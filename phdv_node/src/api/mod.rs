//! HTTP surface of the PHDV node.

pub mod errors;
pub mod handlers;
pub mod server;
pub mod validation;

pub use errors::{ApiError, ApiResult};
pub use server::{router, ApiServer, AppState};
