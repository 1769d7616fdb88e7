//! Blob storage naming conventions.
//!
//! Generates deterministic object names for story covers, character
//! images and generated scene images.

/// Folder holding user-provided assets (covers, character images).
pub const ASSETS_FOLDER: &str = "assets";

/// Folder holding generated scene images.
pub const OUTPUT_FOLDER: &str = "output";

/// Make a story title safe to embed in an object name.
///
/// Spaces and slashes become underscores; everything else is kept.
///
/// ```
/// use creaition_core::naming::safe_story_name;
///
/// assert_eq!(safe_story_name("Night in Muar"), "Night_in_Muar");
/// assert_eq!(safe_story_name("Cats/Dogs"), "Cats_Dogs");
/// ```
pub fn safe_story_name(title: &str) -> String {
    title.trim().replace([' ', '/'], "_")
}

/// Object name for the generated image of one scene.
///
/// Convention: `{safe_title}_{scene_number}.{ext}`
///
/// ```
/// use creaition_core::naming::scene_image_filename;
///
/// assert_eq!(scene_image_filename("Night in Muar", 2, "png"), "Night_in_Muar_2.png");
/// ```
pub fn scene_image_filename(story_title: &str, scene_number: i32, extension: &str) -> String {
    format!("{}_{scene_number}.{extension}", safe_story_name(story_title))
}

/// Object name for a story cover. `extension` includes the leading dot.
pub fn cover_filename(story_title: &str, extension: &str) -> String {
    format!("{}{}", safe_story_name(story_title), normalize_dot(extension))
}

/// Unique object name for an uploaded character image.
pub fn character_upload_filename(extension: &str) -> String {
    format!("character_{}{}", uuid::Uuid::new_v4(), normalize_dot(extension))
}

/// File extension (without dot) for an image MIME type. Defaults to `png`.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    if mime_type.contains("jpeg") || mime_type.contains("jpg") {
        "jpg"
    } else if mime_type.contains("webp") {
        "webp"
    } else {
        "png"
    }
}

/// Extension (with leading dot) of an uploaded file name, or empty.
pub fn extension_of(file_name: &str) -> String {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

fn normalize_dot(extension: &str) -> String {
    if extension.is_empty() || extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{extension}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_keeps_extension() {
        assert_eq!(cover_filename("My Story", ".jpg"), "My_Story.jpg");
        assert_eq!(cover_filename("My Story", "jpg"), "My_Story.jpg");
    }

    #[test]
    fn character_upload_is_unique() {
        let a = character_upload_filename(".png");
        let b = character_upload_filename(".png");
        assert!(a.starts_with("character_"));
        assert!(a.ends_with(".png"));
        assert_ne!(a, b);
    }

    #[test]
    fn mime_to_extension() {
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(extension_for_mime("image/webp"), "webp");
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("application/octet-stream"), "png");
    }

    #[test]
    fn extension_of_upload() {
        assert_eq!(extension_of("joker.JPEG"), ".jpeg");
        assert_eq!(extension_of("noext"), "");
    }
}
