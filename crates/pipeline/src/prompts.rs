//! Prompt templates sent to the generative model.

use std::fmt::Write as _;

use creaition_core::story::LengthGuidance;

use crate::narrative::SceneDraft;
use crate::CharacterInput;

/// Storytelling prompt: analyse the premise and every character, then write
/// the future story and break it into scenes, answering with one JSON object.
pub fn narrative_prompt(characters: &[CharacterInput], background: &str, nb_scenes: i32) -> String {
    let length = LengthGuidance::for_scene_count(nb_scenes);

    let mut cast = String::new();
    for character in characters {
        let _ = writeln!(
            cast,
            "Character Name: {}\nCharacter Description: {}",
            character.name, character.description
        );
    }

    format!(
        r#"You are a visual storytelling assistant. You turn user-owned characters and art into illustrated narratives. The character reference images are attached in the same order as the characters listed below.

**Background Story Analysis Task:**
Analyse the background story below: its plot, themes, existing characters, conflicts and world. It is the starting premise for everything you write.

**Character Analysis Task (for each character):**
1. Use each character's name exactly as given and keep using it throughout the story. A role may be added ("the officer, Matte") but never replaces the name.
2. Describe physical appearance, facial expression, clothing, posture and art style from the reference image.
3. Infer personality, narrative role and emotional tone.
4. Note symbolic elements and distinctive art features.
5. Summarise this as a structured analysis per character.

**Future Story Task:**
Using the background analysis and all character analyses, write an imaginative future story in which every character plays a meaningful part.
- Keep the tone and settings consistent with the characters' personalities and art styles.
- Build directly on the background story: its themes, conflicts and world.
- Introduce new events, challenges, alliances or rivalries that follow from the characters.
- The story will be split into {nb_scenes} illustrated scenes. {guidance}

**Scene Breakdown Task:**
Split the future story into exactly {nb_scenes} consecutive scenes. Each scene has a short title, the part of the story it covers, and a detailed visual description for an illustrator (characters present by name, their look, poses, setting, lighting and art style).

**Background Story:**
{background}

**Characters:**
{cast}
**Output Format:**
Answer with a single valid JSON object and nothing else:
{{
  "analysis": [
    {{
      "character_name": "[name]",
      "character_description": "[description]",
      "image_analysis_summary": "[summary of the reference image]",
      "detailed_character_analysis": {{
        "personality_traits": "[personality and traits]",
        "visual_characteristics": "[physical appearance]",
        "artistic_style_analysis": {{
          "overarching_style": "[e.g. 'digital fantasy painting']",
          "color_palette": "[e.g. 'saturated greens and browns']",
          "line_work": "[e.g. 'dynamic brushstrokes']",
          "shading": "[e.g. 'soft natural shading']",
          "texture": "[e.g. 'worn leather']",
          "mood_atmosphere": "[e.g. 'hopeful exploration']",
          "recurring_motifs": "[e.g. 'ancient runes']"
        }},
        "potential_narrative_themes": "[e.g. 'heroic quest']"
      }}
    }}
  ],
  "future_story": "[the full future story, {paragraphs}]",
  "scenes": [
    {{
      "scene_number": 1,
      "title": "[scene title]",
      "narrative_text": "[the part of the future story this scene shows]",
      "image_prompt": "[detailed visual description and art style guidance]"
    }}
  ]
}}
"#,
        guidance = length.guidance,
        paragraphs = length.paragraph_count,
    )
}

/// Comic page prompt: turn the story into `nb_scenes` pages of
/// `nb_panels` panels each, with dialogue kept out of the image prompt.
pub fn comic_pages_prompt(analysis: &str, story: &str, nb_scenes: i32, nb_panels: i32) -> String {
    format!(
        r#"You are a visual narrative creative director and prompt engineer for an image generation model. Turn the future story below into {nb_scenes} comic pages without any inappropriate or NSFW content. Each page is a single image containing {nb_panels} panels that show consecutive moments of one scene.

### Character and art analysis
```
{analysis}
```
Extract each character's name, role, visual characteristics and art style from this analysis and depict every character consistently, always by name.

### Input
- Future story: {story}
- Pages: {nb_scenes}
- Panels per page: {nb_panels}

### For each page
1. Decide each panel's action, which characters are present (by name), their poses, expressions and surroundings.
2. Extract the dialogue or narration for each panel. Dialogue is returned separately and never written into the image prompt.
3. Write one detailed image prompt for the whole page:
   - the layout of exactly {nb_panels} panels;
   - per panel, every character by name with their key visual traits, and an empty speech bubble wherever someone speaks;
   - consistent character appearance across panels;
   - one overarching art style, palette, line work, shading and mood taken from the analysis;
   - lighting and atmosphere.

### Output format
Answer with a single valid JSON object containing exactly {nb_scenes} pages:
```json
{{
  "comic_pages": [
    {{
      "page_number": 1,
      "page_title": "[short title naming the key characters]",
      "page_summary": "[1-2 sentences naming the main characters]",
      "panels_dialogue": [
        {{ "panel_number": 1, "character_speaking": "[name or 'Narrator']", "dialogue": "[text or empty]" }}
      ],
      "image_generation_prompt": "[detailed prompt for the single page image]"
    }}
  ]
}}
```
"#
    )
}

/// Framing prompt for one scene image.
pub fn scene_image_prompt(scene: &SceneDraft) -> String {
    format!(
        "Without any inappropriate or NSFW content, create an image. \
         This is scene {} of a visual narrative novel. \
         The scene title is '{}'. \
         Here is the narrative text of this scene '{}'. \
         Here is the detailed visual description and art style guidance for this specific scene: {}",
        scene.scene_number, scene.title, scene.narrative_text, scene.image_prompt
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cast() -> Vec<CharacterInput> {
        vec![
            CharacterInput::new("Dorry", "A jester with a split face", None),
            CharacterInput::new("Mathieu", "A police officer", None),
        ]
    }

    #[test]
    fn narrative_prompt_lists_every_character() {
        let prompt = narrative_prompt(&cast(), "Muar at night.", 4);
        assert!(prompt.contains("Character Name: Dorry\nCharacter Description: A jester with a split face"));
        assert!(prompt.contains("Character Name: Mathieu"));
        assert!(prompt.contains("Muar at night."));
    }

    #[test]
    fn narrative_prompt_scales_length_with_scenes() {
        let short = narrative_prompt(&cast(), "x", 2);
        assert!(short.contains("1 paragraph (approx. 100-200 words)"));

        let long = narrative_prompt(&cast(), "x", 8);
        assert!(long.contains("4-6 paragraphs (approx. 600-900 words)"));
        assert!(long.contains("exactly 8 consecutive scenes"));
    }

    #[test]
    fn comic_prompt_mentions_counts() {
        let prompt = comic_pages_prompt("ANALYSIS", "STORY", 3, 4);
        assert!(prompt.contains("3 comic pages"));
        assert!(prompt.contains("exactly 4 panels"));
        assert!(prompt.contains("Future story: STORY"));
        assert!(prompt.contains("\"comic_pages\""));
    }

    #[test]
    fn scene_prompt_frames_scene() {
        let scene = SceneDraft {
            scene_number: 2,
            title: "The Square".to_string(),
            narrative_text: "Mathieu arrives.".to_string(),
            image_prompt: "Wide shot at dawn".to_string(),
        };
        let prompt = scene_image_prompt(&scene);
        assert!(prompt.starts_with("Without any inappropriate or NSFW content"));
        assert!(prompt.contains("scene 2 of a visual narrative novel"));
        assert!(prompt.contains("'The Square'"));
        assert!(prompt.ends_with("Wide shot at dawn"));
    }
}
