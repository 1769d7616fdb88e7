//! Comic page parsing.
//!
//! Pages refine the image prompt of each scene. A malformed response is not
//! an error: the caller gets an empty list and keeps the prompts it has.

use serde::Serialize;
use serde_json::Value;

/// One page of the comic layout proposed by the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComicPage {
    pub page_number: i64,
    pub page_title: String,
    pub page_summary: String,
    pub panels_dialogue: Vec<PanelDialogue>,
    pub image_generation_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelDialogue {
    pub panel_number: i64,
    pub character_speaking: String,
    pub dialogue: String,
}

/// Parse the `comic_pages` array out of a model response.
///
/// Markdown code fences are stripped. Only object pages carrying a
/// `page_number` are kept; missing fields get defaults.
pub fn parse_comic_pages(raw: &str) -> Vec<ComicPage> {
    let body = strip_code_fence(raw);

    let data: Value = match serde_json::from_str(body) {
        Ok(data) => data,
        Err(e) => {
            let preview: String = raw.chars().take(200).collect();
            tracing::warn!(error = %e, %preview, "Comic pages JSON did not decode");
            return Vec::new();
        }
    };

    let Some(pages) = data.get("comic_pages").and_then(Value::as_array) else {
        tracing::warn!("Comic pages response has no comic_pages array");
        return Vec::new();
    };

    pages
        .iter()
        .filter_map(Value::as_object)
        .filter(|page| page.contains_key("page_number"))
        .map(|page| ComicPage {
            page_number: page.get("page_number").and_then(Value::as_i64).unwrap_or(0),
            page_title: string_field(page.get("page_title"), "Untitled"),
            page_summary: string_field(page.get("page_summary"), ""),
            panels_dialogue: page
                .get("panels_dialogue")
                .and_then(Value::as_array)
                .map(|panels| {
                    panels
                        .iter()
                        .filter_map(Value::as_object)
                        .map(|panel| PanelDialogue {
                            panel_number: panel
                                .get("panel_number")
                                .and_then(Value::as_i64)
                                .unwrap_or(1),
                            character_speaking: string_field(panel.get("character_speaking"), ""),
                            dialogue: string_field(panel.get("dialogue"), ""),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            image_generation_prompt: string_field(page.get("image_generation_prompt"), ""),
        })
        .collect()
}

/// Remove a leading ```` ```json ```` or ```` ``` ```` fence and its closing fence.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let marker = if trimmed.starts_with("```json") {
        "```json"
    } else if trimmed.starts_with("```") {
        "```"
    } else {
        return trimmed;
    };

    let start = marker.len();
    match trimmed.rfind("```") {
        Some(end) if end > start => trimmed[start..end].trim(),
        _ => trimmed,
    }
}

fn string_field(value: Option<&Value>, default: &str) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}
