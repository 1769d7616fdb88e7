//! Handlers for the `/characters` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use creaition_core::naming;
use serde::Serialize;

use crate::error::AppResult;
use crate::extract::AppMultipart;
use crate::handlers::upload::UploadForm;
use crate::response::Success;
use crate::state::AppState;

/// Name given to characters uploaded without one.
pub const UNKNOWN_CHARACTER: &str = "Unknown Character";

/// Character as returned by the upload endpoint, before it is attached to
/// a story.
#[derive(Debug, Serialize)]
pub struct UploadedCharacter {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub image_name: String,
}

#[derive(Debug, Serialize)]
pub struct CharacterUploaded {
    pub character: UploadedCharacter,
    pub image_url: String,
    pub image_name: String,
    pub message: &'static str,
}

/// POST /api/characters/upload
///
/// Multipart fields: `file` (required), `name`, `description`.
pub async fn upload(
    State(state): State<AppState>,
    AppMultipart(multipart): AppMultipart,
) -> AppResult<(StatusCode, Json<Success<CharacterUploaded>>)> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.require_file()?;

    let image_name = naming::character_upload_filename(&file.extension());
    let image_url = creaition_storage::upload_character_image(
        state.store.as_ref(),
        &image_name,
        file.bytes,
        &file.content_type,
    )
    .await?;

    let character = UploadedCharacter {
        name: form
            .field("name")
            .unwrap_or_else(|| UNKNOWN_CHARACTER.to_string()),
        description: form.field("description").unwrap_or_default(),
        image_url: image_url.clone(),
        image_name: image_name.clone(),
    };

    Ok((
        StatusCode::CREATED,
        Json(Success::new(CharacterUploaded {
            character,
            image_url,
            image_name,
            message: "Character image uploaded successfully",
        })),
    ))
}
