//! Multipart form reading shared by the image upload handlers.

use std::collections::HashMap;

use axum::extract::Multipart;
use creaition_core::naming;

use crate::error::{AppError, AppResult};

/// Name of the multipart field carrying the file.
pub const FILE_FIELD: &str = "file";

/// The uploaded image.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Extension of the original file name, with its dot. Falls back to the
    /// extension implied by the content type.
    pub fn extension(&self) -> String {
        let ext = naming::extension_of(&self.file_name);
        if ext.is_empty() {
            format!(".{}", naming::extension_for_mime(&self.content_type))
        } else {
            ext
        }
    }
}

/// A parsed multipart form: one file plus plain text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// Read every field of the form.
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == FILE_FIELD {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let declared = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.file = Some(image_file(file_name, declared, bytes.to_vec())?);
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    /// The uploaded file, or 400 when the form had none.
    pub fn require_file(&mut self) -> AppResult<UploadedFile> {
        self.file
            .take()
            .ok_or_else(|| AppError::BadRequest(format!("Missing '{FILE_FIELD}' field")))
    }

    /// A text field, trimmed, `None` when absent or blank.
    pub fn field(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Accept only non-empty files whose bytes are a recognised image format.
fn image_file(
    file_name: String,
    declared: Option<String>,
    bytes: Vec<u8>,
) -> AppResult<UploadedFile> {
    if bytes.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }
    let sniffed = creaition_gemini::sniff_mime_type(&bytes).ok_or_else(|| {
        AppError::BadRequest(format!("'{file_name}' is not a supported image"))
    })?;
    let content_type = declared
        .filter(|ct| ct.starts_with("image/"))
        .unwrap_or_else(|| sniffed.to_string());

    Ok(UploadedFile {
        file_name,
        content_type,
        bytes,
    })
}
