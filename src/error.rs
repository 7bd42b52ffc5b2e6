//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::extract::ExtractError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Extract(ExtractError::NoImagesFound) => {
                (StatusCode::BAD_REQUEST, ExtractError::NoImagesFound.to_string())
            }
            AppError::Extract(e) => {
                tracing::error!("Extraction failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to process PDF: {}", e),
                )
            }
            AppError::Archive(e) => {
                tracing::error!("ZIP packing failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to create ZIP: {}", e),
                )
            }
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}
