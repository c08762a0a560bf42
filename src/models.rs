//! Data models and structures
//!
//! Defines the movie records produced by the scrapers, the user-facing
//! generation options, the validated request handed to the pipeline, and the
//! environment-driven configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Stand-in storyline used when a title page carries no plot text.
pub const NO_STORYLINE: &str = "No storyline available.";

pub const MIN_CHARACTERS: usize = 2;
pub const MAX_CHARACTERS: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovieSummary {
    pub id: String,
    pub title: String,
    pub detail_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetail {
    pub id: String,
    pub title: String,
    /// Title page URL without its query string.
    pub url: String,
    pub poster_url: Option<String>,
    pub year: String,
    /// US certificate, e.g. `PG-13`.
    pub parental_guide: String,
    pub rating: String,
    pub genres: Vec<String>,
    pub director: String,
    pub cast: Vec<String>,
    pub characters: Vec<String>,
    pub storyline: String,
}

impl MovieDetail {
    /// A storyline is usable when it is non-blank and not the stand-in text.
    pub fn has_storyline(&self) -> bool {
        let storyline = self.storyline.trim();
        !storyline.is_empty() && storyline != NO_STORYLINE
    }

    /// Multi-line summary shown when a movie is selected.
    pub fn describe(&self) -> String {
        fn or_unknown(value: &str) -> &str {
            if value.trim().is_empty() {
                "Unknown"
            } else {
                value
            }
        }

        fn list_or_unknown(values: &[String]) -> String {
            if values.is_empty() {
                "Unknown".to_string()
            } else {
                values.join(", ")
            }
        }

        format!(
            "Title: {}\nPoster: {}\nYear: {}\nParental Guide (US): {}\nRating: {}/10\nGenres: {}\nDirector: {}\nCast: {}\nCharacters: {}\nIMDb URL: {}\n\nStoryline:\n{}\n",
            self.title,
            or_unknown(self.poster_url.as_deref().unwrap_or_default()),
            or_unknown(&self.year),
            or_unknown(&self.parental_guide),
            or_unknown(&self.rating),
            list_or_unknown(&self.genres),
            or_unknown(&self.director),
            list_or_unknown(&self.cast),
            list_or_unknown(&self.characters),
            or_unknown(&self.url),
            self.storyline,
        )
    }
}

/// Derive exactly `count` speaker names from the known character list.
///
/// Known names keep their order; missing slots are filled with
/// `Character {n}` numbered from `known.len() + 1`.
pub fn derive_character_names(known: &[String], count: usize) -> Vec<String> {
    let mut names: Vec<String> = known.iter().take(count).cloned().collect();
    while names.len() < count {
        names.push(format!("Character {}", names.len() + 1));
    }
    names
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Style {
    Marvel,
    Futuristic,
    Cartoon,
    #[default]
    Realistic,
    Custom(String),
}

impl Style {
    pub const PRESETS: [Style; 4] = [
        Style::Marvel,
        Style::Futuristic,
        Style::Cartoon,
        Style::Realistic,
    ];
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Style::Marvel => f.write_str("Marvel"),
            Style::Futuristic => f.write_str("Futuristic"),
            Style::Cartoon => f.write_str("Cartoon"),
            Style::Realistic => f.write_str("Realistic"),
            Style::Custom(style) => f.write_str(style),
        }
    }
}

impl FromStr for Style {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(Style::PRESETS
            .into_iter()
            .find(|preset| preset.to_string().eq_ignore_ascii_case(trimmed))
            .unwrap_or_else(|| Style::Custom(trimmed.to_string())))
    }
}

/// Raw generation settings as entered by the user.
///
/// Counts stay as text so that non-numeric input is rejected by validation
/// rather than by whoever collected it.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub character_count: String,
    pub dialogue_max_words: String,
    pub location: String,
    pub style: Style,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            character_count: "2".to_string(),
            dialogue_max_words: "500".to_string(),
            location: "Interior".to_string(),
            style: Style::Realistic,
        }
    }
}

impl GenerationOptions {
    pub fn with_character_count(mut self, count: impl ToString) -> Self {
        self.character_count = count.to_string();
        self
    }

    pub fn with_dialogue_max_words(mut self, words: impl ToString) -> Self {
        self.dialogue_max_words = words.to_string();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

/// A validated request: counts are in range and names are derived.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub movie: MovieDetail,
    pub character_count: usize,
    pub dialogue_max_words: u32,
    pub location: String,
    pub style: Style,
    pub character_names: Vec<String>,
}

impl GenerationRequest {
    pub fn characters_description(&self) -> String {
        format!(
            "{} characters from the movie {}",
            self.character_count, self.movie.title
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Generated,
    /// The backend produced no usable payload.
    Fallback,
    /// The backend call failed with an error description.
    Error,
}

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
}

impl GeneratedImage {
    pub fn is_placeholder(&self) -> bool {
        self.kind != ImageKind::Generated
    }
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub request_id: u64,
    pub character_names: Vec<String>,
    pub dialogue: String,
    pub scene_description: String,
    pub image_bytes: Vec<u8>,
    pub image_is_fallback: bool,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub vertex_project_id: Option<String>,
    pub vertex_location: String,
    pub vertex_image_model: String,
    pub vertex_access_token: Option<String>,
    pub top_movies_url: String,
    pub imdb_base_url: String,
    pub save_directory: PathBuf,
    pub placeholder_font_path: Option<PathBuf>,
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn var_or(key: &str, default: &str) -> String {
    non_empty_var(key).unwrap_or_else(|| default.to_string())
}

impl Config {
    /// Read configuration from the process environment (after `.env`).
    ///
    /// Missing credentials are not an error here; they surface later as an
    /// unavailable backend.
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            gemini_model: var_or("GEMINI_MODEL", "gemini-2.0-flash"),
            vertex_project_id: non_empty_var("VERTEX_PROJECT_ID"),
            vertex_location: var_or("VERTEX_LOCATION", "us-central1"),
            vertex_image_model: var_or("VERTEX_IMAGE_MODEL", "imagen-3.0-generate-002"),
            vertex_access_token: non_empty_var("VERTEX_ACCESS_TOKEN"),
            top_movies_url: var_or("IMDB_TOP_MOVIES_URL", "https://www.imdb.com/chart/top/"),
            imdb_base_url: var_or("IMDB_BASE_URL", "https://www.imdb.com"),
            save_directory: PathBuf::from(var_or("SAVE_DIRECTORY", "saved_content")),
            placeholder_font_path: non_empty_var("PLACEHOLDER_FONT_PATH").map(PathBuf::from),
        };

        if !config.imdb_base_url.starts_with("http") {
            return Err(crate::Error::Config(format!(
                "IMDB_BASE_URL must be an http(s) URL, got '{}'",
                config.imdb_base_url
            )));
        }

        Ok(config)
    }
}
