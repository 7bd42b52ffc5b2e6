//! Image extraction endpoint
//!
//! `POST /extract` takes a multipart upload holding one PDF and answers with
//! every embedded image as a data URI.

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::extract::{extract, ExtractError, ExtractedImage};
use crate::state::AppState;

/// Response for a successful extraction
#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub images: Vec<ImagePayload>,
}

/// One extracted image as sent to the browser
#[derive(Debug, Serialize)]
pub struct ImagePayload {
    pub name: String,
    /// `data:image/<type>;base64,<payload>`
    pub data: String,
    pub page: u32,
}

impl From<&ExtractedImage> for ImagePayload {
    fn from(image: &ExtractedImage) -> Self {
        Self {
            name: image.name.clone(),
            data: image.data_uri(),
            page: image.page,
        }
    }
}

/// Extract all images from an uploaded PDF
pub async fn extract_images(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>> {
    let (filename, data) = read_upload(multipart).await?;
    tracing::info!(file = %filename, bytes = data.len(), "Starting extraction");

    let options = state.extract_options();
    let images = tokio::task::spawn_blocking(move || extract(&data, &options))
        .await
        .map_err(|e| ExtractError::TaskJoin(e.to_string()))??;

    tracing::info!(file = %filename, images = images.len(), "Extraction complete");

    Ok(Json(ExtractResponse {
        images: images.iter().map(ImagePayload::from).collect(),
    }))
}

/// Pull the PDF out of the multipart body
///
/// Takes the field named `file` or `pdf`, or failing that the first field
/// that carries a file name.
async fn read_upload(mut multipart: Multipart) -> Result<(String, Bytes)> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read upload: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();
        let filename = field.file_name().map(|s| s.to_string());

        tracing::debug!("Received field: name='{}', filename={:?}", name, filename);

        if name == "file" || name == "pdf" || filename.is_some() {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read file data: {}", e)))?;
            return Ok((filename.unwrap_or_else(|| "upload.pdf".to_string()), data));
        }
    }

    tracing::warn!("No file field found in multipart upload");
    Err(AppError::BadRequest(
        "No file provided. Use field name 'file'".to_string(),
    ))
}
