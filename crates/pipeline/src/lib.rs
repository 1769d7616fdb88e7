//! Story generation pipeline.
//!
//! Builds prompts, calls the generative model and turns its answers into
//! character analyses, scene drafts and uploaded scene images. Nothing here
//! touches the database; handlers persist the results.

pub mod comic;
pub mod images;
pub mod narrative;
pub mod prompts;

use std::sync::Arc;

use creaition_gemini::{GeminiError, GenerativeModel, ReferenceImage};
use creaition_storage::BlobStore;

pub use comic::{parse_comic_pages, ComicPage, PanelDialogue};
pub use images::RenderedScene;
pub use narrative::{NarrativeOutcome, SceneDraft};

/// Errors that stop a pipeline step.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Model(#[from] GeminiError),

    /// The model answered but no story text could be recovered.
    #[error("The model did not return a usable story")]
    NoStory,
}

/// A character as the pipeline sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterInput {
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
}

impl CharacterInput {
    pub fn new(name: impl Into<String>, description: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            image_url,
        }
    }
}

/// Model and blob store bundled for the generation handlers.
#[derive(Clone)]
pub struct StoryPipeline {
    model: Arc<dyn GenerativeModel>,
    store: Arc<dyn BlobStore>,
}

impl StoryPipeline {
    pub fn new(model: Arc<dyn GenerativeModel>, store: Arc<dyn BlobStore>) -> Self {
        Self { model, store }
    }

    /// Download each character's image for use as a model reference.
    ///
    /// Only objects of the configured store are fetched. Characters without
    /// an image, or whose image cannot be fetched, are skipped with a
    /// warning.
    pub async fn load_references(&self, characters: &[CharacterInput]) -> Vec<ReferenceImage> {
        let mut references = Vec::with_capacity(characters.len());
        for character in characters {
            let Some(url) = character.image_url.as_deref().filter(|u| !u.trim().is_empty()) else {
                continue;
            };
            match self.store.fetch(url).await {
                Ok(bytes) => references.push(ReferenceImage::from_bytes(bytes)),
                Err(e) => {
                    tracing::warn!(character = %character.name, %url, error = %e, "Could not load reference image");
                }
            }
        }
        references
    }

    /// Analyse the characters and write the future story with its scenes.
    pub async fn generate_narrative(
        &self,
        characters: &[CharacterInput],
        background: &str,
        nb_scenes: i32,
    ) -> Result<NarrativeOutcome, PipelineError> {
        let references = self.load_references(characters).await;
        let prompt = prompts::narrative_prompt(characters, background, nb_scenes);

        tracing::info!(
            characters = characters.len(),
            references = references.len(),
            nb_scenes,
            "Generating narrative",
        );
        let raw = self.model.generate_text(&prompt, &references).await?;

        let outcome = narrative::parse_narrative_response(&raw, characters, nb_scenes);
        if outcome.story_text.is_empty() {
            return Err(PipelineError::NoStory);
        }
        tracing::info!(
            scenes = outcome.scenes.len(),
            fallback = outcome.used_fallback,
            "Narrative generated",
        );
        Ok(outcome)
    }

    /// Ask for a comic page layout of the story, one page per scene.
    ///
    /// An unparseable answer yields an empty list.
    pub async fn generate_comic_pages(
        &self,
        analysis: &str,
        story: &str,
        nb_scenes: i32,
        nb_panels: i32,
    ) -> Result<Vec<ComicPage>, PipelineError> {
        let prompt = prompts::comic_pages_prompt(analysis, story, nb_scenes, nb_panels);
        let raw = self.model.generate_text(&prompt, &[]).await?;
        let pages = parse_comic_pages(&raw);
        tracing::info!(pages = pages.len(), nb_scenes, "Comic pages generated");
        Ok(pages)
    }

    /// Render and upload one image per scene, using the characters' images
    /// as references.
    pub async fn render_images(
        &self,
        story_title: &str,
        characters: &[CharacterInput],
        scenes: &[SceneDraft],
    ) -> Vec<RenderedScene> {
        let references = self.load_references(characters).await;
        images::render_scene_images(
            self.model.as_ref(),
            self.store.as_ref(),
            story_title,
            &references,
            scenes,
        )
        .await
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }
}

/// Fold comic pages into scene drafts: page `n` refines scene `n`'s title
/// and image prompt. Pages without a matching scene become new scenes.
///
/// Pages numbered outside `1..=nb_scenes` are ignored.
pub fn apply_comic_pages(scenes: &mut Vec<SceneDraft>, pages: &[ComicPage], nb_scenes: i32) {
    for page in pages {
        let Ok(number) = i32::try_from(page.page_number) else {
            continue;
        };
        if !(1..=nb_scenes).contains(&number) {
            tracing::debug!(page = number, nb_scenes, "Ignoring comic page out of range");
            continue;
        }
        match scenes.iter_mut().find(|s| s.scene_number == number) {
            Some(scene) => {
                if !page.image_generation_prompt.is_empty() {
                    scene.image_prompt = page.image_generation_prompt.clone();
                }
                if page.page_title != "Untitled" && !page.page_title.is_empty() {
                    scene.title = page.page_title.clone();
                }
            }
            None => scenes.push(SceneDraft {
                scene_number: number,
                title: page.page_title.clone(),
                narrative_text: page.page_summary.clone(),
                image_prompt: page.image_generation_prompt.clone(),
            }),
        }
    }
    scenes.sort_by_key(|s| s.scene_number);
}
