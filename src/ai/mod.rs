//! Generative backend integration
//!
//! Backends are black-box capabilities: a text model that completes a prompt
//! and an image model that renders one image per prompt. They are wrapped by
//! [`TextGenerationClient`] and [`ImageGenerationClient`], which own the
//! failure policy of each pipeline stage.

pub mod gemini;
mod http;
pub mod image;
pub mod mime;
pub mod mock;
pub mod text;
pub mod vertex;

pub use self::image::ImageGenerationClient;
pub use gemini::GeminiTextBackend;
pub use mock::{MockImageBackend, MockTextBackend};
pub use text::TextGenerationClient;
pub use vertex::ImagenBackend;

use crate::models::Config;
use crate::{Error, Result};
use ::image::{DynamicImage, ImageFormat};
use async_trait::async_trait;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{info, warn};

#[async_trait]
pub trait TextBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Request exactly one image. Candidate payloads come back in the order
    /// they should be tried.
    async fn generate_one_image(&self, prompt: &str) -> Result<Vec<ImagePayload>>;
}

/// The shapes an image backend can hand back, decoded at the boundary.
#[derive(Debug, Clone)]
pub enum ImagePayload {
    /// Encoded image file bytes (PNG, JPEG, ...).
    RawBytes(Vec<u8>),
    /// An already decoded in-memory image.
    Decoded(DynamicImage),
    Empty,
}

impl ImagePayload {
    /// Encoded bytes for this payload, or `None` when it carries nothing usable.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            ImagePayload::RawBytes(bytes) if !bytes.is_empty() => Some(bytes),
            ImagePayload::RawBytes(_) | ImagePayload::Empty => None,
            ImagePayload::Decoded(image) => {
                let mut bytes = Vec::new();
                match image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png) {
                    Ok(()) if !bytes.is_empty() => Some(bytes),
                    Ok(()) => None,
                    Err(e) => {
                        warn!("Failed to encode decoded image payload: {}", e);
                        None
                    }
                }
            }
        }
    }
}

/// A backend that either initialized or recorded why it could not.
///
/// Initialization happens once; an `Unavailable` handle never retries.
pub enum BackendHandle<T: ?Sized> {
    Ready(Arc<T>),
    Unavailable(String),
}

impl<T: ?Sized> Clone for BackendHandle<T> {
    fn clone(&self) -> Self {
        match self {
            BackendHandle::Ready(backend) => BackendHandle::Ready(Arc::clone(backend)),
            BackendHandle::Unavailable(reason) => BackendHandle::Unavailable(reason.clone()),
        }
    }
}

impl<T: ?Sized> BackendHandle<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        BackendHandle::Unavailable(reason.into())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, BackendHandle::Ready(_))
    }

    pub fn get(&self) -> Result<&T> {
        match self {
            BackendHandle::Ready(backend) => Ok(backend.as_ref()),
            BackendHandle::Unavailable(reason) => Err(Error::BackendUnavailable(reason.clone())),
        }
    }
}

/// Backend handles built once at startup and shared by the clients.
#[derive(Clone)]
pub struct BackendHandles {
    pub text: BackendHandle<dyn TextBackend>,
    pub image: BackendHandle<dyn ImageBackend>,
}

impl BackendHandles {
    pub fn from_config(config: &Config, http_client: reqwest::Client) -> Self {
        let text: BackendHandle<dyn TextBackend> = match &config.gemini_api_key {
            Some(api_key) => {
                info!("Text provider: Gemini (model: {})", config.gemini_model);
                BackendHandle::Ready(Arc::new(GeminiTextBackend::new_with_client(
                    api_key.clone(),
                    config.gemini_model.clone(),
                    http_client.clone(),
                )))
            }
            None => {
                warn!("GEMINI_API_KEY not set; text generation is unavailable");
                BackendHandle::unavailable("Gemini model not initialized: GEMINI_API_KEY not set")
            }
        };

        let image: BackendHandle<dyn ImageBackend> =
            match (&config.vertex_project_id, &config.vertex_access_token) {
                (Some(project_id), Some(access_token)) => {
                    info!(
                        "Image provider: Vertex AI (model: {}, location: {})",
                        config.vertex_image_model, config.vertex_location
                    );
                    BackendHandle::Ready(Arc::new(ImagenBackend::new_with_client(
                        access_token.clone(),
                        project_id.clone(),
                        config.vertex_location.clone(),
                        config.vertex_image_model.clone(),
                        http_client,
                    )))
                }
                (None, _) => {
                    warn!("VERTEX_PROJECT_ID not set; image generation is unavailable");
                    BackendHandle::unavailable(
                        "Vertex AI model not initialized: VERTEX_PROJECT_ID not set",
                    )
                }
                (_, None) => {
                    warn!("VERTEX_ACCESS_TOKEN not set; image generation is unavailable");
                    BackendHandle::unavailable(
                        "Vertex AI model not initialized: VERTEX_ACCESS_TOKEN not set",
                    )
                }
            };

        Self { text, image }
    }
}
