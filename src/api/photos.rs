//! Profile photo upload and download.

use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::MultipartRejection},
    http::{HeaderValue, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;

use super::data;
use crate::account::{AccountService, MAX_PHOTO_BYTES};
use crate::auth::{TokenService, authenticate};
use crate::db::{Database, NewPhoto};
use crate::error::{ApiError, ResultExt};

#[derive(Clone)]
pub struct PhotosState {
    pub db: Database,
    pub account: Arc<AccountService>,
    pub tokens: Arc<TokenService>,
}

pub fn router(state: PhotosState) -> Router {
    let upload_router = Router::new()
        .route("/", post(upload_photo))
        .layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES + 64 * 1024))
        .layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            authenticate,
        ));

    Router::new()
        .route("/{id}", get(get_photo))
        .merge(upload_router)
        .with_state(state)
}

#[derive(Serialize)]
struct UploadedPhoto {
    id: String,
    url: String,
}

/// Expected fields:
/// - `photo`: one image file
/// - `owner`: optional user UUID to attach the photo to
async fn upload_photo(
    State(state): State<PhotosState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut multipart =
        multipart.map_err(|_| ApiError::bad_request("Expected multipart form data"))?;
    let mut photo = None;
    let mut owner = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Invalid multipart data"))?
    {
        match field.name().unwrap_or("") {
            "photo" => {
                let content_type = field.content_type().unwrap_or("").to_string();
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::bad_request("Failed to read photo data"))?;
                photo = Some(NewPhoto {
                    data: data.to_vec(),
                    content_type,
                    filename,
                });
            }
            "owner" => {
                owner = Some(
                    field
                        .text()
                        .await
                        .map_err(|_| ApiError::bad_request("Failed to read owner"))?,
                );
            }
            _ => {}
        }
    }

    let id = state.account.upload_photo(photo, owner.as_deref()).await?;
    let url = format!("/api/photos/{}", id);
    Ok((StatusCode::CREATED, data(UploadedPhoto { id, url })))
}

/// Serve the raw photo bytes with their stored content type. Public.
async fn get_photo(
    State(state): State<PhotosState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let photo = state
        .db
        .photos()
        .get(&id)
        .await
        .db_err("Failed to get photo")?
        .ok_or_else(|| ApiError::not_found("Photo not found"))?;

    let content_type = HeaderValue::from_str(&photo.content_type)
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));

    Ok(([(header::CONTENT_TYPE, content_type)], Body::from(photo.data)))
}
