//! ZIP download endpoint

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::archive::{pack_items, ArchiveError};
use crate::error::Result;

/// Pack `name|base64` items into `imagens.zip`
pub async fn download_zip(Json(items): Json<Vec<String>>) -> Result<Response> {
    tracing::info!(items = items.len(), "Packing ZIP");

    let archive = tokio::task::spawn_blocking(move || pack_items(&items))
        .await
        .map_err(|e| ArchiveError::TaskJoin(e.to_string()))??;

    tracing::debug!(bytes = archive.len(), "ZIP ready");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static("attachment; filename=imagens.zip"),
            ),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        ],
        Body::from(archive),
    )
        .into_response())
}
