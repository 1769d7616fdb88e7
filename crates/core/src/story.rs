//! Story lifecycle and request validation rules.
//!
//! A story moves `created -> story_generated -> completed` as the
//! generation calls succeed. Nothing enforces the order beyond the
//! handlers only ever advancing it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::naming::safe_story_name;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length for a story title in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Scene count bounds accepted on story requests.
pub const MIN_SCENES: i32 = 1;
pub const MAX_SCENES: i32 = 12;

/// Character count bounds accepted on story requests.
pub const MIN_CHARACTERS: i32 = 1;
pub const MAX_CHARACTERS: i32 = 8;

/// Defaults used when a request omits the counts.
pub const DEFAULT_SCENES: i32 = 4;
pub const DEFAULT_CHARACTERS: i32 = 2;

/// Panels drawn on each comic page when refining scene prompts.
pub const DEFAULT_PANELS_PER_PAGE: i32 = 4;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Where a story is in the generation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    Created,
    StoryGenerated,
    Completed,
}

impl StoryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::StoryGenerated => "story_generated",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoryStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "story_generated" => Ok(Self::StoryGenerated),
            "completed" => Ok(Self::Completed),
            other => Err(CoreError::Validation(format!(
                "Unknown story status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a story title: non-blank and within the length limit.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation(
            "Title is required and cannot be empty".to_string(),
        ));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Title exceeds maximum length of {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Key under which a title's images are stored, ignoring case.
///
/// Titles sharing a key would overwrite each other's cover and scene images.
pub fn title_key(title: &str) -> String {
    safe_story_name(title).to_lowercase()
}

/// Reject `title` when any of `existing` matches it ignoring case, or maps
/// to the same image names.
pub fn ensure_unique_title<I, S>(title: &str, existing: I) -> Result<(), CoreError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let wanted = title.trim().to_lowercase();
    let wanted_key = title_key(title);
    for other in existing {
        let other = other.as_ref();
        if other.trim().to_lowercase() == wanted {
            return Err(CoreError::Conflict(format!(
                "A story with the title '{title}' already exists. Please choose a different title."
            )));
        }
        if title_key(other) == wanted_key {
            return Err(CoreError::Conflict(format!(
                "The title '{title}' is too close to the existing story '{other}'. Please choose a different title."
            )));
        }
    }
    Ok(())
}

/// The user email is how stories are attached to their owner.
pub fn validate_user_email(email: &str) -> Result<(), CoreError> {
    if email.trim().is_empty() {
        return Err(CoreError::Validation("User email is required".to_string()));
    }
    Ok(())
}

/// Validate the requested scene and character counts.
pub fn validate_counts(nb_scenes: i32, nb_chars: i32) -> Result<(), CoreError> {
    if !(MIN_SCENES..=MAX_SCENES).contains(&nb_scenes) {
        return Err(CoreError::Validation(format!(
            "Number of scenes must be between {MIN_SCENES} and {MAX_SCENES} (got {nb_scenes})"
        )));
    }
    if !(MIN_CHARACTERS..=MAX_CHARACTERS).contains(&nb_chars) {
        return Err(CoreError::Validation(format!(
            "Number of characters must be between {MIN_CHARACTERS} and {MAX_CHARACTERS} (got {nb_chars})"
        )));
    }
    Ok(())
}

/// Premise used when the caller supplies no background story.
pub fn default_background(story_mode: &str, nb_chars: i32, nb_scenes: i32) -> String {
    let mode = story_mode.trim();
    let mode = if mode.is_empty() { "creative" } else { mode };
    format!("A {mode} story with {nb_chars} characters spanning {nb_scenes} scenes.")
}

// ---------------------------------------------------------------------------
// Length guidance
// ---------------------------------------------------------------------------

/// How long the generated future story should be for a given scene count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthGuidance {
    /// Sentence inserted into the task description.
    pub guidance: &'static str,
    /// Short phrase used inside the JSON output schema.
    pub paragraph_count: &'static str,
}

impl LengthGuidance {
    pub fn for_scene_count(nb_scenes: i32) -> Self {
        match nb_scenes {
            i32::MIN..=2 => Self {
                guidance: "Aim for a very concise, impactful narrative of **1 paragraph (approx. 100-200 words)**.",
                paragraph_count: "1 paragraph (approx. 100-200 words)",
            },
            3..=4 => Self {
                guidance: "Aim for a concise narrative of **2 paragraphs (approx. 200-400 words)**. Focus on essential plot points.",
                paragraph_count: "2 paragraphs (approx. 200-400 words)",
            },
            5..=6 => Self {
                guidance: "Aim for a moderately detailed narrative of **3 paragraphs (approx. 400-600 words)**. Develop the plot with a clear progression.",
                paragraph_count: "3 paragraphs (approx. 400-600 words)",
            },
            _ => Self {
                guidance: "Aim for a comprehensive mini-narrative of **4-6 paragraphs (approx. 600-900 words)**, allowing for richer plot development and character arcs.",
                paragraph_count: "4-6 paragraphs (approx. 600-900 words)",
            },
        }
    }
}
