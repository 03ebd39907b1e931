//! Account activation from an emailed link.
//!
//! Takes `multipart/form-data` so profile photos can be uploaded together
//! with the credentials.

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::MultipartRejection},
    response::IntoResponse,
    routing::post,
};
use std::sync::Arc;

use super::success;
use crate::account::{AccountService, ActivationForm, MAX_PHOTO_BYTES};
use crate::db::NewPhoto;
use crate::error::ApiError;

/// Photos accepted per activation.
const MAX_PHOTOS: usize = 5;

#[derive(Clone)]
pub struct ActivationState {
    pub account: Arc<AccountService>,
}

pub fn router(state: ActivationState) -> Router {
    Router::new()
        .route("/{token}", post(activate))
        // Every photo at its limit plus form overhead
        .layer(DefaultBodyLimit::max(MAX_PHOTOS * MAX_PHOTO_BYTES + 64 * 1024))
        .with_state(state)
}

/// Expected fields:
/// - `username`, `password`: required
/// - `phone`: optional
/// - `photos` (or `photo`): zero or more image files
async fn activate(
    State(state): State<ActivationState>,
    Path(token): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut multipart =
        multipart.map_err(|_| ApiError::bad_request("Expected multipart form data"))?;
    let mut form = ActivationForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Invalid multipart data"))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "username" | "password" | "phone" => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| ApiError::bad_request(format!("Failed to read {}", name)))?;
                match name.as_str() {
                    "username" => form.username = Some(text),
                    "password" => form.password = Some(text),
                    _ => form.phone = Some(text),
                }
            }
            "photos" | "photo" => {
                if form.photos.len() == MAX_PHOTOS {
                    return Err(ApiError::field(
                        "photos",
                        format!("At most {} photos are allowed", MAX_PHOTOS),
                    ));
                }
                let content_type = field.content_type().unwrap_or("").to_string();
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::bad_request("Failed to read photo data"))?;
                form.photos.push(NewPhoto {
                    data: data.to_vec(),
                    content_type,
                    filename,
                });
            }
            _ => {}
        }
    }

    state.account.activate(&token, form).await?;
    Ok(success("Account activated"))
}
