//! Handlers for the `/stories` resource.
//!
//! A story is created empty (`POST /generate`), written by the model
//! (`POST /generate-story`) and then illustrated (`POST /generate-images`).
//! Each step advances the status `created -> story_generated -> completed`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use creaition_core::error::CoreError;
use creaition_core::story::{
    default_background, ensure_unique_title, title_key, validate_counts, validate_title,
    validate_user_email, StoryStatus, DEFAULT_CHARACTERS, DEFAULT_PANELS_PER_PAGE,
    DEFAULT_SCENES,
};
use creaition_core::types::DbId;
use creaition_db::models::character::{Character, CreateCharacter, UpdateCharacter};
use creaition_db::models::scene::{CreateScene, Scene};
use creaition_db::models::story::{CreateStory, GeneratedStory, Story, UpdateStory};
use creaition_db::repositories::{CharacterRepo, SceneRepo, StoryRepo, UserRepo};
use creaition_db::DbPool;
use creaition_pipeline::narrative::derive_scenes;
use creaition_pipeline::{apply_comic_pages, CharacterInput, SceneDraft};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppMultipart, AppPath};
use crate::handlers::upload::UploadForm;
use crate::handlers::user::require_user_by_email;
use crate::response::Success;
use crate::state::AppState;

fn default_scenes() -> i32 {
    DEFAULT_SCENES
}

fn default_chars() -> i32 {
    DEFAULT_CHARACTERS
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn find_story(pool: &DbPool, id: DbId) -> AppResult<Story> {
    StoryRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Story", id }))
}

/// Acknowledgement for create and update.
#[derive(Debug, Serialize)]
pub struct StoryAck {
    pub story_id: DbId,
    pub status: &'static str,
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Create / update
// ---------------------------------------------------------------------------

/// Story details as sent by the story form.
#[derive(Debug, Deserialize)]
pub struct StoryForm {
    pub title: String,
    #[serde(default = "default_scenes")]
    pub nb_scenes: i32,
    #[serde(default = "default_chars")]
    pub nb_chars: i32,
    pub story_mode: Option<String>,
    #[serde(default)]
    pub user_email: String,
    pub cover_image_url: Option<String>,
    pub cover_image_name: Option<String>,
    pub background_story: Option<String>,
}

impl StoryForm {
    fn validate(&self) -> Result<(), CoreError> {
        validate_title(&self.title)?;
        validate_counts(self.nb_scenes, self.nb_chars)?;
        validate_user_email(&self.user_email)
    }

    fn story_mode(&self) -> String {
        self.story_mode.as_deref().unwrap_or_default().trim().to_string()
    }
}

/// POST /api/stories/generate
///
/// Creates the story record only; no model call is made.
pub async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<StoryForm>,
) -> AppResult<(StatusCode, Json<Success<StoryAck>>)> {
    input.validate()?;

    let titles = StoryRepo::list_titles(&state.pool).await?;
    ensure_unique_title(&input.title, &titles)?;

    let user = require_user_by_email(&state, &input.user_email).await?;

    let story = StoryRepo::create(
        &state.pool,
        &CreateStory {
            user_id: Some(user.id),
            title: input.title.trim().to_string(),
            nb_scenes: input.nb_scenes,
            nb_chars: input.nb_chars,
            story_mode: input.story_mode(),
            cover_image_url: input.cover_image_url.clone(),
            cover_image_name: input.cover_image_name.clone(),
            background_story: non_blank(input.background_story.clone()),
        },
    )
    .await?;
    tracing::info!(story_id = %story.id, user_id = %user.id, "Story created");

    Ok((
        StatusCode::CREATED,
        Json(Success::new(StoryAck {
            story_id: story.id,
            status: StoryStatus::Created.as_str(),
            message: "Story created successfully. Use /api/stories/generate-story to generate story content.",
        })),
    ))
}

/// PUT /api/stories/{id}
///
/// `background_story` and the cover are only replaced when present in the
/// body.
pub async fn update(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    AppJson(input): AppJson<StoryForm>,
) -> AppResult<Json<Success<StoryAck>>> {
    input.validate()?;
    require_user_by_email(&state, &input.user_email).await?;

    let existing = find_story(&state.pool, id).await?;
    let title = input.title.trim();
    if title_key(&existing.title) != title_key(title) {
        let titles = StoryRepo::list_titles(&state.pool).await?;
        ensure_unique_title(title, &titles)?;
    }

    StoryRepo::update(
        &state.pool,
        id,
        &UpdateStory {
            title: title.to_string(),
            nb_scenes: input.nb_scenes,
            nb_chars: input.nb_chars,
            story_mode: input.story_mode(),
            cover_image_url: input.cover_image_url.clone(),
            cover_image_name: input.cover_image_name.clone(),
            background_story: input.background_story.clone(),
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound { entity: "Story", id }))?;

    Ok(Json(Success::new(StoryAck {
        story_id: id,
        status: "updated",
        message: "Story updated successfully",
    })))
}

// ---------------------------------------------------------------------------
// Details
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct StoryView {
    #[serde(flatten)]
    pub story: Story,
    pub characters: Vec<Character>,
    /// Ordered by `scene_number`.
    pub scenes: Vec<Scene>,
}

#[derive(Debug, Serialize)]
pub struct StoryDetails {
    pub story: StoryView,
}

/// GET /api/stories/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<Success<StoryDetails>>> {
    let story = find_story(&state.pool, id).await?;
    let characters = CharacterRepo::list_by_story(&state.pool, id).await?;
    let scenes = SceneRepo::list_by_story(&state.pool, id).await?;

    Ok(Json(Success::new(StoryDetails {
        story: StoryView {
            story,
            characters,
            scenes,
        },
    })))
}

// ---------------------------------------------------------------------------
// Cover
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CoverUploaded {
    pub story_id: DbId,
    pub cover_image_url: String,
    pub cover_image_name: String,
    pub message: &'static str,
}

/// POST /api/stories/{id}/cover
///
/// Multipart field `file`. Stored as `assets/{safe_title}{ext}`.
pub async fn upload_cover(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    AppMultipart(multipart): AppMultipart,
) -> AppResult<Json<Success<CoverUploaded>>> {
    let story = find_story(&state.pool, id).await?;
    let file = UploadForm::read(multipart).await?.require_file()?;

    let extension = file.extension();
    let (url, name) = creaition_storage::upload_story_cover(
        state.store.as_ref(),
        &story.title,
        &extension,
        file.bytes,
        &file.content_type,
    )
    .await?;

    StoryRepo::update_cover(&state.pool, id, &url, &name)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Story", id }))?;

    Ok(Json(Success::new(CoverUploaded {
        story_id: id,
        cover_image_url: url,
        cover_image_name: name,
        message: "Cover image uploaded successfully",
    })))
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

/// A character as sent by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "desc")]
    pub description: String,
    pub image_url: Option<String>,
    pub image_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertAction {
    Created,
    Updated,
}

/// Insert or update characters of a story, matched by exact name.
///
/// Blank names are skipped. An update without an image keeps the stored one.
async fn upsert_characters(
    pool: &DbPool,
    story_id: DbId,
    payloads: &[CharacterPayload],
) -> AppResult<Vec<(Character, UpsertAction)>> {
    let mut saved = Vec::with_capacity(payloads.len());
    for payload in payloads {
        let name = payload.name.trim();
        if name.is_empty() {
            continue;
        }
        let image_url = non_blank(payload.image_url.clone());
        let image_name = non_blank(payload.image_name.clone());

        match CharacterRepo::find_by_story_and_name(pool, story_id, name).await? {
            Some(existing) => {
                let update = UpdateCharacter {
                    name: name.to_string(),
                    description: payload.description.trim().to_string(),
                    image_url: image_url.or(existing.image_url),
                    image_name: image_name.or(existing.image_name),
                };
                let character = CharacterRepo::update(pool, existing.id, &update)
                    .await?
                    .ok_or(AppError::Core(CoreError::NotFound {
                        entity: "Character",
                        id: existing.id,
                    }))?;
                saved.push((character, UpsertAction::Updated));
            }
            None => {
                let create = CreateCharacter {
                    story_id,
                    name: name.to_string(),
                    description: payload.description.trim().to_string(),
                    image_url,
                    image_name,
                };
                let character = CharacterRepo::create(pool, &create).await?;
                saved.push((character, UpsertAction::Created));
            }
        }
    }
    Ok(saved)
}

#[derive(Debug, Deserialize)]
pub struct SaveCharactersRequest {
    #[serde(default)]
    pub characters: Vec<CharacterPayload>,
}

#[derive(Debug, Serialize)]
pub struct SavedCharacter {
    pub id: DbId,
    pub name: String,
    pub action: UpsertAction,
}

#[derive(Debug, Serialize)]
pub struct CharactersSaved {
    pub message: String,
    pub characters: Vec<SavedCharacter>,
}

/// POST /api/stories/{id}/characters
pub async fn save_characters(
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    AppJson(input): AppJson<SaveCharactersRequest>,
) -> AppResult<Json<Success<CharactersSaved>>> {
    if input.characters.is_empty() {
        return Err(AppError::BadRequest("No characters provided".to_string()));
    }
    find_story(&state.pool, id).await?;

    let characters: Vec<SavedCharacter> = upsert_characters(&state.pool, id, &input.characters)
        .await?
        .into_iter()
        .map(|(c, action)| SavedCharacter {
            id: c.id,
            name: c.name,
            action,
        })
        .collect();

    Ok(Json(Success::new(CharactersSaved {
        message: format!("Successfully processed {} characters", characters.len()),
        characters,
    })))
}

fn pipeline_inputs(characters: &[Character]) -> Vec<CharacterInput> {
    characters
        .iter()
        .map(|c| CharacterInput::new(&c.name, &c.description, c.image_url.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Story generation
// ---------------------------------------------------------------------------

/// Body of `POST /generate-story`.
///
/// With `story_id` the existing story is used; otherwise a new one is
/// created from the remaining fields.
#[derive(Debug, Deserialize)]
pub struct GenerateStoryRequest {
    pub story_id: Option<DbId>,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_scenes")]
    pub nb_scenes: i32,
    #[serde(default = "default_chars")]
    pub nb_chars: i32,
    pub story_mode: Option<String>,
    pub user_email: Option<String>,
    pub user_id: Option<DbId>,
    pub cover_image_url: Option<String>,
    pub cover_image_name: Option<String>,
    pub background_story: Option<String>,
    #[serde(default)]
    pub characters: Vec<CharacterPayload>,
}

impl GenerateStoryRequest {
    async fn resolve_user(&self, state: &AppState) -> AppResult<Option<DbId>> {
        if let Some(email) = self.user_email.as_deref().filter(|e| !e.trim().is_empty()) {
            return Ok(Some(require_user_by_email(state, email).await?.id));
        }
        match self.user_id {
            Some(id) => {
                let user = UserRepo::find_by_id(&state.pool, id)
                    .await?
                    .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
                Ok(Some(user.id))
            }
            None => Ok(None),
        }
    }

    async fn load_or_create_story(&self, state: &AppState) -> AppResult<Story> {
        if let Some(id) = self.story_id {
            return find_story(&state.pool, id).await;
        }

        validate_title(&self.title)?;
        validate_counts(self.nb_scenes, self.nb_chars)?;
        let titles = StoryRepo::list_titles(&state.pool).await?;
        ensure_unique_title(&self.title, &titles)?;
        let user_id = self.resolve_user(state).await?;

        let story = StoryRepo::create(
            &state.pool,
            &CreateStory {
                user_id,
                title: self.title.trim().to_string(),
                nb_scenes: self.nb_scenes,
                nb_chars: self.nb_chars,
                story_mode: self.story_mode.as_deref().unwrap_or_default().trim().to_string(),
                cover_image_url: self.cover_image_url.clone(),
                cover_image_name: self.cover_image_name.clone(),
                background_story: non_blank(self.background_story.clone()),
            },
        )
        .await?;
        tracing::info!(story_id = %story.id, "Story created for generation");
        Ok(story)
    }
}

/// Premise sent to the model: the request's, else the stored one, else a
/// default built from the story settings.
fn premise_for(story: &Story, requested: Option<&str>) -> String {
    requested
        .filter(|b| !b.trim().is_empty())
        .or_else(|| Some(story.background_story.as_str()).filter(|b| !b.trim().is_empty()))
        .map(|b| b.trim().to_string())
        .unwrap_or_else(|| default_background(&story.story_mode, story.nb_chars, story.nb_scenes))
}

#[derive(Debug, Serialize)]
pub struct SceneSummary {
    pub scene_id: DbId,
    pub scene_number: i32,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct StoryGenerated {
    pub story_id: DbId,
    pub title: String,
    pub scenes: Vec<SceneSummary>,
    pub scenes_paragraph: String,
    pub analysis: String,
    pub total_scenes: usize,
    /// The answer was not valid JSON and was mined with regexes instead.
    pub used_fallback: bool,
    pub status: StoryStatus,
    pub message: &'static str,
}

/// POST /api/stories/generate-story
pub async fn generate_story(
    State(state): State<AppState>,
    AppJson(input): AppJson<GenerateStoryRequest>,
) -> AppResult<Json<Success<StoryGenerated>>> {
    let pipeline = state.pipeline()?;
    let story = input.load_or_create_story(&state).await?;
    let background = premise_for(&story, input.background_story.as_deref());

    let with_images: Vec<CharacterPayload> = input
        .characters
        .iter()
        .filter(|c| c.image_url.as_deref().is_some_and(|u| !u.trim().is_empty()))
        .cloned()
        .collect();
    let characters: Vec<Character> = if with_images.is_empty() {
        CharacterRepo::list_by_story(&state.pool, story.id).await?
    } else {
        upsert_characters(&state.pool, story.id, &with_images)
            .await?
            .into_iter()
            .map(|(c, _)| c)
            .collect()
    };

    tracing::info!(story_id = %story.id, title = %story.title, "Generating story");
    let outcome = pipeline
        .generate_narrative(&pipeline_inputs(&characters), &background, story.nb_scenes)
        .await?;

    let analyses: Vec<(DbId, String)> = characters
        .iter()
        .zip(&outcome.character_analyses)
        .map(|(c, a)| (c.id, a.clone()))
        .collect();
    CharacterRepo::update_analyses(&state.pool, &analyses).await?;

    let new_scenes: Vec<CreateScene> = outcome
        .scenes
        .iter()
        .map(|draft| CreateScene {
            scene_number: draft.scene_number,
            title: draft.title.clone(),
            narrative_text: draft.narrative_text.clone(),
            paragraph: draft.narrative_text.clone(),
            image_prompt: draft.image_prompt.clone(),
            image_url: None,
        })
        .collect();
    let scenes = SceneRepo::replace_for_story(&state.pool, story.id, &new_scenes).await?;

    StoryRepo::set_generated_story(
        &state.pool,
        story.id,
        &GeneratedStory {
            background_story: background,
            future_story: outcome.future_story.clone(),
            scenes_paragraph: outcome.story_text.clone(),
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Story",
        id: story.id,
    }))?;

    let scenes: Vec<SceneSummary> = scenes
        .into_iter()
        .map(|s| SceneSummary {
            scene_id: s.id,
            scene_number: s.scene_number,
            title: s.title,
        })
        .collect();

    Ok(Json(Success::new(StoryGenerated {
        story_id: story.id,
        title: story.title,
        total_scenes: scenes.len(),
        scenes,
        scenes_paragraph: outcome.story_text,
        analysis: outcome.analysis,
        used_fallback: outcome.used_fallback,
        status: StoryStatus::StoryGenerated,
        message: "Story and scenes generated successfully. Generate the images next.",
    })))
}

// ---------------------------------------------------------------------------
// Image generation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GenerateImagesRequest {
    pub story_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct SceneImage {
    pub scene_number: i32,
    pub title: String,
    pub image_url: String,
    pub paragraph: String,
}

#[derive(Debug, Serialize)]
pub struct ImagesGenerated {
    pub story_id: DbId,
    pub title: String,
    pub scenes: Vec<SceneImage>,
    /// Scenes that received an image.
    pub total_scenes: usize,
    /// Scenes an image was attempted for.
    pub requested_scenes: usize,
    pub status: StoryStatus,
    pub message: &'static str,
}

fn draft_of(scene: &Scene) -> SceneDraft {
    SceneDraft {
        scene_number: scene.scene_number,
        title: scene.title.clone(),
        narrative_text: scene.narrative_text.clone(),
        image_prompt: scene.image_prompt.clone(),
    }
}

/// Character analyses as one block for the comic page prompt.
fn analysis_block(characters: &[Character]) -> String {
    characters
        .iter()
        .filter(|c| !c.analysis.trim().is_empty())
        .map(|c| format!("{}: {}", c.name, c.analysis.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Write refined drafts back: existing rows get the new title and prompt,
/// new scene numbers are inserted. Returns the rows in scene order.
async fn persist_drafts(
    pool: &DbPool,
    story_id: DbId,
    rows: Vec<Scene>,
    drafts: &[SceneDraft],
) -> AppResult<Vec<Scene>> {
    let mut persisted = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let row = match rows.iter().find(|r| r.scene_number == draft.scene_number) {
            Some(row) if row.title == draft.title && row.image_prompt == draft.image_prompt => {
                row.clone()
            }
            Some(row) => SceneRepo::update_prompt(
                pool,
                row.id,
                &draft.title,
                &draft.image_prompt,
                &row.paragraph,
            )
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Scene",
                id: row.id,
            }))?,
            None => {
                SceneRepo::create(
                    pool,
                    story_id,
                    &CreateScene {
                        scene_number: draft.scene_number,
                        title: draft.title.clone(),
                        narrative_text: draft.narrative_text.clone(),
                        paragraph: draft.narrative_text.clone(),
                        image_prompt: draft.image_prompt.clone(),
                        image_url: None,
                    },
                )
                .await?
            }
        };
        persisted.push(row);
    }
    Ok(persisted)
}

/// POST /api/stories/generate-images
pub async fn generate_images(
    State(state): State<AppState>,
    AppJson(input): AppJson<GenerateImagesRequest>,
) -> AppResult<Json<Success<ImagesGenerated>>> {
    let pipeline = state.pipeline()?;
    let story = find_story(&state.pool, input.story_id).await?;
    if !story.has_future_story() {
        return Err(AppError::Core(CoreError::Validation(
            "Story must be generated first before creating images".to_string(),
        )));
    }

    let characters = CharacterRepo::list_by_story(&state.pool, story.id).await?;
    let rows = SceneRepo::list_by_story(&state.pool, story.id).await?;
    let mut drafts: Vec<SceneDraft> = rows.iter().map(draft_of).collect();

    let story_text = if story.scenes_paragraph.trim().is_empty() {
        story.future_story.as_str()
    } else {
        story.scenes_paragraph.as_str()
    };

    if drafts.is_empty() || drafts.iter().any(|d| d.image_prompt.trim().is_empty()) {
        tracing::info!(story_id = %story.id, "Refining scene prompts with comic pages");
        let pages = pipeline
            .generate_comic_pages(
                &analysis_block(&characters),
                story_text,
                story.nb_scenes,
                DEFAULT_PANELS_PER_PAGE,
            )
            .await?;
        apply_comic_pages(&mut drafts, &pages, story.nb_scenes);
    }
    if drafts.is_empty() {
        drafts = derive_scenes(story_text, story.nb_scenes);
    }
    let rows = persist_drafts(&state.pool, story.id, rows, &drafts).await?;

    let rendered = pipeline
        .render_images(&story.title, &pipeline_inputs(&characters), &drafts)
        .await;
    if rendered.is_empty() {
        return Err(AppError::Core(CoreError::Upstream(
            "No scene image could be generated".to_string(),
        )));
    }

    let mut scenes = Vec::with_capacity(rendered.len());
    for image in rendered {
        let Some(row) = rows.iter().find(|r| r.scene_number == image.scene_number) else {
            continue;
        };
        SceneRepo::update_image(&state.pool, row.id, &image.image_url).await?;
        scenes.push(SceneImage {
            scene_number: row.scene_number,
            title: row.title.clone(),
            image_url: image.image_url,
            paragraph: row.paragraph.clone(),
        });
    }

    StoryRepo::mark_completed(&state.pool, story.id).await?;
    tracing::info!(
        story_id = %story.id,
        images = scenes.len(),
        requested = drafts.len(),
        "Story illustrated",
    );

    Ok(Json(Success::new(ImagesGenerated {
        story_id: story.id,
        title: story.title,
        total_scenes: scenes.len(),
        requested_scenes: drafts.len(),
        scenes,
        status: StoryStatus::Completed,
        message: "Story images generated and saved successfully",
    })))
}
