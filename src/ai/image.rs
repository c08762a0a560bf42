use super::mime::detect_image_mime;
use super::{BackendHandle, ImageBackend, ImagePayload};
use crate::image::PlaceholderRenderer;
use crate::models::{GeneratedImage, ImageKind};
use std::borrow::Cow;
use tracing::{debug, error, info, warn};

/// Hard prompt limit of the image backend, in characters.
pub const MAX_PROMPT_CHARS: usize = 1000;
pub const TRUNCATION_MARKER: &str = "...";

/// Cut `prompt` to [`MAX_PROMPT_CHARS`] characters plus a marker when longer.
pub fn truncate_prompt(prompt: &str) -> Cow<'_, str> {
    match prompt.char_indices().nth(MAX_PROMPT_CHARS) {
        None => Cow::Borrowed(prompt),
        Some((cut, _)) => Cow::Owned(format!("{}{}", &prompt[..cut], TRUNCATION_MARKER)),
    }
}

/// First payload that yields non-empty, recognizable image bytes.
fn first_usable(payloads: Vec<ImagePayload>) -> Option<Vec<u8>> {
    payloads.into_iter().find_map(|payload| {
        let bytes = payload.into_bytes()?;
        match detect_image_mime(&bytes) {
            Some(mime) => {
                debug!("Using {} payload ({} bytes)", mime, bytes.len());
                Some(bytes)
            }
            None => {
                warn!("Skipping image payload with unrecognized format ({} bytes)", bytes.len());
                None
            }
        }
    })
}

/// Image generation that always yields a displayable image.
///
/// Backend failures are turned into an error placeholder and missing payloads
/// into a fallback placeholder; nothing is propagated to the caller.
#[derive(Clone)]
pub struct ImageGenerationClient {
    backend: BackendHandle<dyn ImageBackend>,
    placeholders: PlaceholderRenderer,
}

impl ImageGenerationClient {
    pub fn new(backend: BackendHandle<dyn ImageBackend>) -> Self {
        Self {
            backend,
            placeholders: PlaceholderRenderer::new(),
        }
    }

    pub fn with_placeholders(mut self, placeholders: PlaceholderRenderer) -> Self {
        self.placeholders = placeholders;
        self
    }

    pub async fn generate(&self, prompt: &str) -> GeneratedImage {
        let backend = match self.backend.get() {
            Ok(backend) => backend,
            Err(e) => {
                error!("Image generation skipped: {}", e);
                return self.error_image(&e.message());
            }
        };

        let prompt = truncate_prompt(prompt);
        if let Cow::Owned(_) = prompt {
            info!("Image prompt truncated to {} characters", MAX_PROMPT_CHARS);
        }

        match backend.generate_one_image(&prompt).await {
            Ok(payloads) => match first_usable(payloads) {
                Some(bytes) => GeneratedImage {
                    bytes,
                    kind: ImageKind::Generated,
                },
                None => {
                    warn!("Image backend returned no usable image; using fallback");
                    GeneratedImage {
                        bytes: self.placeholders.fallback(),
                        kind: ImageKind::Fallback,
                    }
                }
            },
            Err(e) => {
                error!("Exception in image generation: {}", e);
                self.error_image(&e.message())
            }
        }
    }

    fn error_image(&self, description: &str) -> GeneratedImage {
        GeneratedImage {
            bytes: self.placeholders.error(description),
            kind: ImageKind::Error,
        }
    }
}
