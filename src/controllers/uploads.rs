use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::services::uploads::{MediaKind, UploadService};
use crate::AppState;

const FILE_FIELD: &str = "file";

// Room for multipart framing on top of the largest accepted file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn routes(uploads: &UploadService) -> Router<Arc<AppState>> {
    let body_limit = uploads
        .max_bytes(MediaKind::Image)
        .max(uploads.max_bytes(MediaKind::Video)) as usize
        + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/uploads/image", post(upload_image))
        .route("/uploads/video", post(upload_video))
        .layer(DefaultBodyLimit::max(body_limit))
        .route("/uploads/{filename}", get(get_file))
}

// POST /uploads/image
async fn upload_image(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    upload(&state, MediaKind::Image, multipart).await
}

// POST /uploads/video
async fn upload_video(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    upload(&state, MediaKind::Video, multipart).await
}

async fn upload(
    state: &AppState,
    kind: MediaKind,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // Type is checked before a single byte of the body is accepted.
        state.uploads.check_mime(kind, field.content_type())?;
        let original_name = field.file_name().map(str::to_string);
        let mimetype = field.content_type().map(str::to_string);
        let bytes = read_limited(&state.uploads, kind, field).await?;

        let uploaded = state
            .uploads
            .store(kind, original_name.as_deref(), mimetype.as_deref(), &bytes)
            .await?;
        return Ok((StatusCode::CREATED, Json(uploaded)));
    }

    Err(AppError::Validation("No file uploaded".to_string()))
}

/// Buffers one field, bailing out as soon as it exceeds the kind's limit.
async fn read_limited(
    uploads: &UploadService,
    kind: MediaKind,
    mut field: Field<'_>,
) -> Result<Vec<u8>, AppError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        uploads.check_size(kind, (bytes.len() + chunk.len()) as u64)?;
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::Validation(e.body_text())
}

// GET /uploads/{filename}
async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (bytes, content_type) = state.uploads.read(&filename).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}
