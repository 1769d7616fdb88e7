//! Wire types for the `generateContent` request and response.
//!
//! Only the fields the client reads or writes are modelled; everything else
//! in the response is ignored by serde.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use crate::{InlineImage, ReferenceImage};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<&'static str>,
}

impl GenerateContentRequest {
    /// A single user turn: the prompt followed by each image inline.
    pub fn user_turn(prompt: &str, images: &[ReferenceImage]) -> Self {
        let mut parts = Vec::with_capacity(images.len() + 1);
        parts.push(RequestPart::Text {
            text: prompt.to_string(),
        });
        parts.extend(images.iter().map(|image| RequestPart::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type.clone(),
                data: general_purpose::STANDARD.encode(&image.data),
            },
        }));

        Self {
            contents: vec![Content { role: "user", parts }],
            generation_config: None,
        }
    }

    /// Ask for both text and image output.
    pub fn with_image_output(mut self) -> Self {
        self.generation_config = Some(GenerationConfig {
            response_modalities: vec!["TEXT", "IMAGE"],
        });
        self
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    pub parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ResponsePart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Other(serde_json::Value),
}

impl GenerateContentResponse {
    fn parts(self) -> impl Iterator<Item = ResponsePart> {
        self.candidates
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| c.content)
            .filter_map(|c| c.parts)
            .flatten()
    }

    /// Non-blank text parts of every candidate, joined by newlines.
    pub fn text(self) -> String {
        self.parts()
            .filter_map(|part| match part {
                ResponsePart::Text { text } if !text.trim().is_empty() => Some(text),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The first inline `image/*` part that decodes cleanly.
    pub fn first_image(self) -> Option<InlineImage> {
        self.parts().find_map(|part| match part {
            ResponsePart::InlineData { inline_data }
                if inline_data.mime_type.starts_with("image/") =>
            {
                general_purpose::STANDARD
                    .decode(inline_data.data.as_bytes())
                    .ok()
                    .map(|data| InlineImage {
                        mime_type: inline_data.mime_type,
                        data,
                    })
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_inline_data_camel_case() {
        let request = GenerateContentRequest::user_turn(
            "draw",
            &[ReferenceImage::new("image/png", vec![1, 2, 3])],
        )
        .with_image_output();

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "draw" },
                        { "inlineData": { "mimeType": "image/png", "data": "AQID" } }
                    ]
                }],
                "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
            })
        );
    }

    #[test]
    fn text_only_request_omits_generation_config() {
        let value = serde_json::to_value(GenerateContentRequest::user_turn("hi", &[])).unwrap();
        assert!(value.get("generationConfig").is_none());
    }

    #[test]
    fn text_joins_non_blank_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "first" },
                    { "text": "   " },
                    { "thoughtSignature": "abc" },
                    { "text": "second" }
                ]}
            }]
        }))
        .unwrap();
        assert_eq!(response.text(), "first\nsecond");
    }

    #[test]
    fn first_image_skips_non_images() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "Here is your scene" },
                    { "inlineData": { "mimeType": "text/plain", "data": "AQID" } },
                    { "inlineData": { "mimeType": "image/png", "data": "BAUG" } }
                ]}
            }]
        }))
        .unwrap();

        let image = response.first_image().unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, vec![4, 5, 6]);
    }

    #[test]
    fn missing_candidates_yield_nothing() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.text(), "");
    }
}
