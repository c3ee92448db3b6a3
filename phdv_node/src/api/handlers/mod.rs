//! Route handlers.

pub mod analyze;
pub mod dashboard;
pub mod phdv;
pub mod status;

use crate::api::errors::ApiError;
use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;

/// A file captured from the multipart form.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub file_type: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Fields of the upload form. Presence is checked by the validator, not
/// here.
#[derive(Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub wallet_address: Option<String>,
}

/// Drains the multipart stream into an [`UploadForm`]. Unknown fields are
/// ignored.
pub async fn read_upload_form(multipart: &mut Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(invalid_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let file_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(invalid_form)?;
                form.file = Some(UploadedFile {
                    file_name,
                    file_type,
                    data,
                });
            }
            "walletAddress" => {
                form.wallet_address = Some(field.text().await.map_err(invalid_form)?);
            }
            _ => {}
        }
    }

    Ok(form)
}

fn invalid_form(_: MultipartError) -> ApiError {
    ApiError::bad_request(
        "Invalid request format",
        "Request body must be sent as multipart/form-data.",
    )
}
