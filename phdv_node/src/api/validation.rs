//! Upload validation. Every check short-circuits with a 400 carrying a
//! stable label; no side effects happen before validation passes.

use crate::api::errors::ApiError;
use crate::api::handlers::UploadedFile;

/// MIME types accepted for health documents. Membership decides
/// acceptance; the file extension is never consulted.
pub const ALLOWED_FILE_TYPES: [&str; 8] = [
    "application/pdf",
    "text/csv",
    "text/plain",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/png",
    "image/jpeg",
    "image/jpg",
];

/// Upload ceiling, boundary inclusive.
pub const MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

const SUPPORTED_FORMATS_HINT: &str = "Supported formats: PDF, CSV, TXT, DOC, DOCX, PNG, JPEG";

pub fn require_file(file: Option<&UploadedFile>) -> Result<&UploadedFile, ApiError> {
    file.ok_or_else(|| {
        ApiError::bad_request("No file provided", "Please upload a health data file.")
    })
}

pub fn require_wallet_address(wallet: Option<&str>) -> Result<String, ApiError> {
    let trimmed = wallet.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request(
            "Wallet address required",
            "Please provide your wallet address.",
        ));
    }
    Ok(trimmed.to_string())
}

pub fn validate_file_type(file_type: &str) -> Result<(), ApiError> {
    if !ALLOWED_FILE_TYPES.contains(&file_type) {
        return Err(ApiError::bad_request(
            &format!("Unsupported file type: {file_type}"),
            SUPPORTED_FORMATS_HINT,
        ));
    }
    Ok(())
}

pub fn validate_file_size(file_size: u64) -> Result<(), ApiError> {
    if file_size > MAX_FILE_SIZE {
        return Err(ApiError::bad_request(
            "File too large",
            &format!(
                "Maximum file size: {}MB. Your file: {:.2}MB",
                MAX_FILE_SIZE / 1024 / 1024,
                file_size as f64 / 1024.0 / 1024.0
            ),
        ));
    }
    Ok(())
}
