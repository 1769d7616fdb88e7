//! Scene image rendering.

use creaition_gemini::{GenerativeModel, ReferenceImage};
use creaition_storage::{upload_scene_image, BlobStore};

use crate::narrative::SceneDraft;
use crate::prompts::scene_image_prompt;

/// A scene image that was generated and uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedScene {
    pub scene_number: i32,
    pub image_url: String,
    pub mime_type: String,
}

/// Generate and upload one image per scene, in order.
///
/// A scene whose generation, decoding or upload fails is logged and
/// skipped; the others still render.
pub async fn render_scene_images(
    model: &dyn GenerativeModel,
    store: &dyn BlobStore,
    story_title: &str,
    references: &[ReferenceImage],
    scenes: &[SceneDraft],
) -> Vec<RenderedScene> {
    let mut rendered = Vec::with_capacity(scenes.len());

    for scene in scenes {
        let prompt = scene_image_prompt(scene);
        tracing::info!(
            scene_number = scene.scene_number,
            title = %scene.title,
            "Generating scene image",
        );

        let image = match model.generate_image(&prompt, references).await {
            Ok(Some(image)) => image,
            Ok(None) => {
                tracing::warn!(scene_number = scene.scene_number, "Model returned no image");
                continue;
            }
            Err(e) => {
                tracing::error!(scene_number = scene.scene_number, error = %e, "Image generation failed");
                continue;
            }
        };

        if let Err(e) = image::load_from_memory(&image.data) {
            tracing::error!(
                scene_number = scene.scene_number,
                mime_type = %image.mime_type,
                size = image.data.len(),
                error = %e,
                "Generated image does not decode",
            );
            continue;
        }

        match upload_scene_image(
            store,
            story_title,
            scene.scene_number,
            image.data,
            &image.mime_type,
        )
        .await
        {
            Ok(image_url) => rendered.push(RenderedScene {
                scene_number: scene.scene_number,
                image_url,
                mime_type: image.mime_type,
            }),
            Err(e) => {
                tracing::error!(scene_number = scene.scene_number, error = %e, "Scene image upload failed");
            }
        }
    }

    rendered
}
