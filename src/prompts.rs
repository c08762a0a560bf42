//! Prompt templates and the builders that fill them.
//!
//! Every builder is a pure function of its arguments.

use crate::models::Style;

pub const DIALOGUE: &str = include_str!("../data/prompts/dialogue.txt");
pub const DIALOGUE_FORMAT: &str = include_str!("../data/prompts/dialogue_format.txt");
pub const SCENE_DESCRIPTION: &str = include_str!("../data/prompts/scene.txt");
pub const IMAGE: &str = include_str!("../data/prompts/image.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Dialogue request for the first `character_count` names, capped at `max_words`.
pub fn build_dialogue_prompt(
    title: &str,
    storyline: &str,
    character_names: &[String],
    character_count: usize,
    max_words: u32,
) -> String {
    let speakers = &character_names[..character_count.min(character_names.len())];
    let names = speakers.join(", ");

    render(
        DIALOGUE.trim_end(),
        &[
            ("count", &character_count.to_string()),
            ("names", &names),
            ("max_words", &max_words.to_string()),
            ("storyline", storyline),
            ("title", title),
        ],
    )
}

pub fn build_scene_description_prompt(title: &str, storyline: &str) -> String {
    render(
        SCENE_DESCRIPTION.trim_end(),
        &[("title", title), ("storyline", storyline)],
    )
}

pub fn build_image_prompt(
    title: &str,
    scene_description: &str,
    location: &str,
    characters_description: &str,
    style: &Style,
) -> String {
    render(
        IMAGE.trim_end(),
        &[
            ("title", title),
            ("location", location),
            ("characters", characters_description),
            ("style", &style.to_string()),
            // Last, so template markers inside generated text stay untouched.
            ("scene", scene_description.trim()),
        ],
    )
}

/// Append the bold-speaker output instruction to a dialogue prompt.
pub fn with_dialogue_format(prompt: &str) -> String {
    format!("{} {}", prompt.trim_end(), DIALOGUE_FORMAT.trim())
}
