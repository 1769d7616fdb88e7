//! Parsing of the storytelling response.
//!
//! The model is asked for one JSON object but routinely wraps it in prose,
//! leaves trailing commas or embeds control characters. Parsing cleans the
//! text first and falls back to regex extraction when decoding still fails.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::CharacterInput;

const BANNER_WIDTH: usize = 80;
const RULE_WIDTH: usize = 40;
const RAW_EXCERPT_CHARS: usize = 500;
const SENTENCES_PER_PARAGRAPH: usize = 3;

static CONTROL_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x1f\x7f-\x9f]").expect("valid regex"));
static JSON_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static TRAILING_COMMA_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*\}").expect("valid regex"));
static TRAILING_COMMA_ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*\]").expect("valid regex"));
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""character_name":\s*"([^"]*)""#).expect("valid regex"));
static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""character_description":\s*"([^"]*)""#).expect("valid regex")
});
static FUTURE_STORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)"future_story":\s*"([^"]*)""#).expect("valid regex"));

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One scene proposed for a story, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneDraft {
    pub scene_number: i32,
    pub title: String,
    pub narrative_text: String,
    pub image_prompt: String,
}

/// Everything extracted from one storytelling response.
#[derive(Debug, Clone)]
pub struct NarrativeOutcome {
    /// Formatted analysis of all characters.
    pub analysis: String,
    /// Per-character analysis, aligned with the input characters.
    /// Empty when the model said nothing usable about a character.
    pub character_analyses: Vec<String>,
    /// Formatted future story block.
    pub future_story: String,
    /// Cleaned story paragraphs; empty when no story was found.
    pub story_text: String,
    pub scenes: Vec<SceneDraft>,
    /// True when the response was not valid JSON and regex extraction ran.
    pub used_fallback: bool,
}

// ---------------------------------------------------------------------------
// Wire shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NarrativeJson {
    #[serde(default)]
    analysis: Option<AnalysisField>,
    #[serde(default)]
    future_story: Option<String>,
    #[serde(default)]
    scenes: Option<Vec<SceneJson>>,
}

/// `analysis` is usually an array but older prompts produced one object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnalysisField {
    Many(Vec<CharacterAnalysisJson>),
    One(Box<CharacterAnalysisJson>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CharacterAnalysisJson {
    character_name: Option<String>,
    character_description: Option<String>,
    image_analysis_summary: Option<String>,
    detailed_character_analysis: Option<DetailedAnalysisJson>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DetailedAnalysisJson {
    personality_traits: Option<String>,
    visual_characteristics: Option<String>,
    artistic_style_analysis: Option<ArtStyleJson>,
    potential_narrative_themes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ArtStyleJson {
    overarching_style: Option<String>,
    color_palette: Option<String>,
    line_work: Option<String>,
    shading: Option<String>,
    texture: Option<String>,
    mood_atmosphere: Option<String>,
    recurring_motifs: Option<String>,
}

impl ArtStyleJson {
    fn entries(&self) -> [(&'static str, &Option<String>); 7] {
        [
            ("overarching_style", &self.overarching_style),
            ("color_palette", &self.color_palette),
            ("line_work", &self.line_work),
            ("shading", &self.shading),
            ("texture", &self.texture),
            ("mood_atmosphere", &self.mood_atmosphere),
            ("recurring_motifs", &self.recurring_motifs),
        ]
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SceneJson {
    title: Option<String>,
    narrative_text: Option<String>,
    image_prompt: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a storytelling response for `characters`, keeping at most
/// `nb_scenes` scenes.
pub fn parse_narrative_response(
    raw: &str,
    characters: &[CharacterInput],
    nb_scenes: i32,
) -> NarrativeOutcome {
    let cleaned = CONTROL_CHARS_RE.replace_all(raw, "");

    let Some(found) = JSON_OBJECT_RE.find(&cleaned) else {
        tracing::warn!("No JSON object in narrative response, extracting manually");
        return extract_content_manually(&cleaned, characters.len(), nb_scenes);
    };

    let json = WHITESPACE_RE.replace_all(found.as_str(), " ");
    let json = TRAILING_COMMA_OBJECT_RE.replace_all(json.trim(), "}");
    let json = TRAILING_COMMA_ARRAY_RE.replace_all(&json, "]");

    let data: NarrativeJson = match serde_json::from_str(&json) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(error = %e, "Narrative JSON did not decode, extracting manually");
            return extract_content_manually(raw, characters.len(), nb_scenes);
        }
    };

    let entries = match data.analysis {
        Some(AnalysisField::Many(entries)) => entries,
        Some(AnalysisField::One(entry)) => vec![*entry],
        None => Vec::new(),
    };

    let mut analysis = banner("CHARACTER ANALYSIS");
    analysis.push(String::new());
    let mut character_analyses = vec![String::new(); characters.len()];

    for (i, entry) in entries.iter().enumerate() {
        let block = format_character(i + 1, entry);
        if let Some(slot) = match_character(characters, &character_analyses, entry, i) {
            character_analyses[slot] = block.clone();
        }
        analysis.push(block);
    }

    let story_text = data
        .future_story
        .as_deref()
        .map(clean_story_text)
        .unwrap_or_default();

    let mut scenes = scenes_from_json(data.scenes.unwrap_or_default(), nb_scenes);
    if scenes.is_empty() {
        scenes = derive_scenes(&story_text, nb_scenes);
    }

    NarrativeOutcome {
        analysis: analysis.join("\n"),
        character_analyses,
        future_story: format_future_story(&story_text),
        story_text,
        scenes,
        used_fallback: false,
    }
}

/// Regex extraction for responses that are not valid JSON.
///
/// Recovers the first character name and description and the future story.
/// Per-character analyses stay empty; the analysis text carries a raw
/// excerpt of the response for inspection.
pub fn extract_content_manually(raw: &str, character_count: usize, nb_scenes: i32) -> NarrativeOutcome {
    let mut analysis = banner("CHARACTER ANALYSIS");
    analysis.push(String::new());

    if let Some(name) = NAME_RE.captures(raw).and_then(|c| c.get(1)) {
        analysis.push(format!("CHARACTER: {}", name.as_str()));
    }
    if let Some(desc) = DESCRIPTION_RE.captures(raw).and_then(|c| c.get(1)) {
        analysis.push(format!("DESCRIPTION: {}", desc.as_str()));
    }
    analysis.push(String::new());
    analysis.push("Raw Response (for debugging):".to_string());
    analysis.push("-".repeat(RULE_WIDTH));
    analysis.push(excerpt(raw, RAW_EXCERPT_CHARS));
    analysis.push("=".repeat(BANNER_WIDTH));

    let story_text = FUTURE_STORY_RE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| clean_story_text(m.as_str()))
        .unwrap_or_default();

    let future_story = if story_text.is_empty() {
        let mut lines = banner("FUTURE STORY");
        lines.push(String::new());
        lines.push("Could not extract future story from response".to_string());
        lines.push(String::new());
        lines.push("=".repeat(BANNER_WIDTH));
        lines.join("\n")
    } else {
        format_future_story(&story_text)
    };

    NarrativeOutcome {
        analysis: analysis.join("\n"),
        character_analyses: vec![String::new(); character_count],
        future_story,
        scenes: derive_scenes(&story_text, nb_scenes),
        story_text,
        used_fallback: true,
    }
}

/// Normalise story prose: collapse whitespace, drop repeated sentences and
/// regroup into paragraphs of three sentences separated by blank lines.
///
/// A sentence is dropped when it contains, or is contained in, a sentence
/// kept earlier.
pub fn clean_story_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut unique: Vec<&str> = Vec::new();
    for sentence in split_sentences(&collapsed) {
        let duplicate = unique
            .iter()
            .any(|kept| kept.contains(sentence) || sentence.contains(kept));
        if !duplicate {
            unique.push(sentence);
        }
    }

    unique
        .chunks(SENTENCES_PER_PARAGRAPH)
        .map(|chunk| {
            chunk
                .iter()
                .map(|s| terminate(s))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Split story prose evenly into `nb_scenes` scene drafts by sentence.
///
/// Earlier scenes take the remainder sentences. Fewer sentences than scenes
/// yields one scene per sentence.
pub fn derive_scenes(story: &str, nb_scenes: i32) -> Vec<SceneDraft> {
    let collapsed = story.split_whitespace().collect::<Vec<_>>().join(" ");
    let sentences = split_sentences(&collapsed);
    if sentences.is_empty() {
        return Vec::new();
    }

    let count = (nb_scenes.max(1) as usize).min(sentences.len());
    let base = sentences.len() / count;
    let extra = sentences.len() % count;

    let mut drafts = Vec::with_capacity(count);
    let mut start = 0;
    for i in 0..count {
        let len = base + usize::from(i < extra);
        let number = i as i32 + 1;
        drafts.push(SceneDraft {
            scene_number: number,
            title: format!("Scene {number}"),
            narrative_text: sentences[start..start + len].join(" "),
            image_prompt: String::new(),
        });
        start += len;
    }
    drafts
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Split single-spaced text after `.`, `!` or `?` followed by a space.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev = None;
    for (i, c) in text.char_indices() {
        if c == ' ' && matches!(prev, Some('.' | '!' | '?')) {
            let sentence = text[start..i].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = i + 1;
        }
        prev = Some(c);
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

fn terminate(sentence: &str) -> String {
    if sentence.ends_with(['.', '!', '?', '"', '\'']) {
        sentence.to_string()
    } else {
        format!("{sentence}.")
    }
}

fn banner(title: &str) -> Vec<String> {
    vec!["=".repeat(BANNER_WIDTH), title.to_string(), "=".repeat(BANNER_WIDTH)]
}

fn excerpt(raw: &str, limit: usize) -> String {
    if raw.chars().count() > limit {
        format!("{}...", raw.chars().take(limit).collect::<String>())
    } else {
        raw.to_string()
    }
}

fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn format_character(index: usize, entry: &CharacterAnalysisJson) -> String {
    let mut lines = vec![
        format!(
            "CHARACTER {index}: {}",
            non_blank(&entry.character_name).unwrap_or("Unknown")
        ),
        format!(
            "DESCRIPTION: {}",
            non_blank(&entry.character_description).unwrap_or("No description provided")
        ),
        String::new(),
    ];

    if let Some(summary) = non_blank(&entry.image_analysis_summary) {
        lines.push("IMAGE ANALYSIS SUMMARY:".to_string());
        lines.push("-".repeat(RULE_WIDTH));
        lines.push(summary.to_string());
        lines.push(String::new());
    }

    if let Some(detail) = &entry.detailed_character_analysis {
        lines.push("DETAILED CHARACTER ANALYSIS:".to_string());
        lines.push("-".repeat(RULE_WIDTH));
        if let Some(traits) = non_blank(&detail.personality_traits) {
            lines.push(format!("Personality Traits: {traits}"));
            lines.push(String::new());
        }
        if let Some(visual) = non_blank(&detail.visual_characteristics) {
            lines.push(format!("Visual Characteristics: {visual}"));
            lines.push(String::new());
        }
        if let Some(style) = &detail.artistic_style_analysis {
            lines.push("ARTISTIC STYLE ANALYSIS:".to_string());
            for (key, value) in style.entries() {
                if let Some(value) = non_blank(value) {
                    lines.push(format!("  - {}: {value}", title_case(key)));
                }
            }
            lines.push(String::new());
        }
        if let Some(themes) = non_blank(&detail.potential_narrative_themes) {
            lines.push(format!("Narrative Themes: {themes}"));
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

fn format_future_story(story_text: &str) -> String {
    let mut lines = banner("FUTURE STORY");
    lines.push(String::new());
    if !story_text.is_empty() {
        lines.push(story_text.to_string());
        lines.push(String::new());
    }
    lines.push("=".repeat(BANNER_WIDTH));
    lines.join("\n")
}

/// Pick the input character an analysis entry describes: by name first,
/// then by position when that slot is still free.
fn match_character(
    characters: &[CharacterInput],
    assigned: &[String],
    entry: &CharacterAnalysisJson,
    position: usize,
) -> Option<usize> {
    if let Some(name) = non_blank(&entry.character_name) {
        let by_name = characters
            .iter()
            .position(|c| c.name.trim().eq_ignore_ascii_case(name));
        if let Some(slot) = by_name {
            return Some(slot);
        }
    }
    (position < characters.len() && assigned[position].is_empty()).then_some(position)
}

fn scenes_from_json(scenes: Vec<SceneJson>, nb_scenes: i32) -> Vec<SceneDraft> {
    scenes
        .into_iter()
        .filter_map(|scene| {
            let text = non_blank(&scene.narrative_text)?.to_string();
            Some((scene, text))
        })
        .take(nb_scenes.max(1) as usize)
        .enumerate()
        .map(|(i, (scene, narrative_text))| {
            let number = i as i32 + 1;
            SceneDraft {
                scene_number: number,
                title: non_blank(&scene.title)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Scene {number}")),
                narrative_text,
                image_prompt: non_blank(&scene.image_prompt)
                    .map(str::to_string)
                    .unwrap_or_default(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cast() -> Vec<CharacterInput> {
        vec![
            CharacterInput::new("Dorry", "Jester", None),
            CharacterInput::new("Mathieu", "Officer", None),
        ]
    }

    const RESPONSE: &str = r#"Sure! Here is the story:
```json
{
  "analysis": [
    {
      "character_name": "Mathieu",
      "character_description": "Officer",
      "image_analysis_summary": "A confident policeman.",
      "detailed_character_analysis": {
        "personality_traits": "Determined",
        "artistic_style_analysis": { "color_palette": "deep blues", "line_work": "clean", },
      },
    },
    { "character_name": "Somebody Else", "character_description": "Jester" },
  ],
  "future_story": "Dorry laughed. Mathieu ran. The square fell silent. Dorry vanished.",
  "scenes": [
    { "scene_number": 1, "title": "Laughter", "narrative_text": "Dorry laughed.", "image_prompt": "Night square" },
    { "scene_number": 2, "title": "", "narrative_text": "Mathieu ran.", "image_prompt": "" },
    { "scene_number": 3, "title": "Blank", "narrative_text": "  " },
  ],
}
```
Enjoy!"#;

    #[test]
    fn parses_json_wrapped_in_prose_with_trailing_commas() {
        let outcome = parse_narrative_response(RESPONSE, &cast(), 4);

        assert!(!outcome.used_fallback);
        assert!(outcome.analysis.starts_with(&"=".repeat(80)));
        assert!(outcome.analysis.contains("CHARACTER 1: Mathieu"));
        assert!(outcome.analysis.contains("  - Color Palette: deep blues"));
        assert!(outcome.analysis.contains("  - Line Work: clean"));
        assert_eq!(
            outcome.story_text,
            "Dorry laughed. Mathieu ran. The square fell silent.\n\nDorry vanished."
        );
        assert!(outcome.future_story.contains("FUTURE STORY"));
        assert!(outcome.future_story.contains("Dorry vanished."));
    }

    #[test]
    fn analyses_match_by_name_then_position() {
        let outcome = parse_narrative_response(RESPONSE, &cast(), 4);

        // "Mathieu" matched by name into slot 1; the unknown name falls back
        // to its own position 1, which is taken, so Dorry stays empty.
        assert!(outcome.character_analyses[1].contains("CHARACTER 1: Mathieu"));
        assert!(outcome.character_analyses[0].is_empty());
    }

    #[test]
    fn positional_match_fills_free_slots() {
        let raw = r#"{"analysis": [{"character_name": "X"}, {"character_name": "Y"}], "future_story": "A."}"#;
        let outcome = parse_narrative_response(raw, &cast(), 1);
        assert!(outcome.character_analyses[0].contains("CHARACTER 1: X"));
        assert!(outcome.character_analyses[1].contains("CHARACTER 2: Y"));
    }

    #[test]
    fn blank_scenes_are_dropped_and_renumbered() {
        let outcome = parse_narrative_response(RESPONSE, &cast(), 4);

        assert_eq!(outcome.scenes.len(), 2);
        assert_eq!(outcome.scenes[0].title, "Laughter");
        assert_eq!(outcome.scenes[0].image_prompt, "Night square");
        assert_eq!(outcome.scenes[1].scene_number, 2);
        assert_eq!(outcome.scenes[1].title, "Scene 2");
    }

    #[test]
    fn single_object_analysis_is_accepted() {
        let raw = r#"{"analysis": {"character_name": "Dorry", "character_description": "Jester"}, "future_story": "It began."}"#;
        let outcome = parse_narrative_response(raw, &cast(), 2);

        assert!(outcome.character_analyses[0].contains("CHARACTER 1: Dorry"));
        assert!(outcome.character_analyses[1].is_empty());
        assert_eq!(outcome.scenes.len(), 1);
        assert_eq!(outcome.scenes[0].narrative_text, "It began.");
    }

    #[test]
    fn control_characters_are_stripped() {
        let raw = "{\"future_story\": \"One\u{0007} night.\"}";
        let outcome = parse_narrative_response(raw, &cast(), 1);
        assert_eq!(outcome.story_text, "One night.");
    }

    #[test]
    fn invalid_json_falls_back_to_manual_extraction() {
        let raw = r#"{"analysis": [{"character_name": "Dorry", "character_description": "Jester" "oops"}], "future_story": "He smiled. He left."}"#;
        let outcome = parse_narrative_response(raw, &cast(), 2);

        assert!(outcome.used_fallback);
        assert!(outcome.analysis.contains("CHARACTER: Dorry"));
        assert!(outcome.analysis.contains("DESCRIPTION: Jester"));
        assert!(outcome.analysis.contains("Raw Response (for debugging):"));
        assert_eq!(outcome.story_text, "He smiled. He left.");
        assert_eq!(outcome.scenes.len(), 2);
        assert!(outcome.character_analyses.iter().all(String::is_empty));
    }

    #[test]
    fn no_json_and_no_story_reports_missing_story() {
        let outcome = parse_narrative_response("I cannot help with that.", &cast(), 2);

        assert!(outcome.used_fallback);
        assert!(outcome.story_text.is_empty());
        assert!(outcome.scenes.is_empty());
        assert!(outcome
            .future_story
            .contains("Could not extract future story from response"));
    }

    #[test]
    fn raw_excerpt_is_truncated() {
        let raw = "x".repeat(600);
        let outcome = extract_content_manually(&raw, 0, 1);
        assert!(outcome.analysis.contains(&format!("{}...", "x".repeat(500))));
        assert!(!outcome.analysis.contains(&"x".repeat(501)));
    }

    #[test]
    fn clean_story_removes_repeated_sentences() {
        let text = "Night fell on Muar.  Night fell on Muar. Mathieu waited!\nThen Mathieu waited! Nobody slept";
        assert_eq!(
            clean_story_text(text),
            "Night fell on Muar. Mathieu waited! Nobody slept."
        );
    }

    #[test]
    fn clean_story_groups_three_sentences_per_paragraph() {
        let text = "A one. B two. C three. D four. E five.";
        assert_eq!(
            clean_story_text(text),
            "A one. B two. C three.\n\nD four. E five."
        );
        assert_eq!(clean_story_text("   "), "");
    }

    #[test]
    fn derive_scenes_spreads_sentences_evenly() {
        let scenes = derive_scenes("A. B. C. D. E.", 2);
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].narrative_text, "A. B. C.");
        assert_eq!(scenes[1].narrative_text, "D. E.");
        assert_eq!(scenes[1].title, "Scene 2");

        let scenes = derive_scenes("Only one.", 4);
        assert_eq!(scenes.len(), 1);
        assert!(derive_scenes("", 3).is_empty());
    }

    #[test]
    fn title_case_keys() {
        assert_eq!(title_case("mood_atmosphere"), "Mood Atmosphere");
        assert_eq!(title_case("shading"), "Shading");
    }
}
