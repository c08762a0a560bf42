use super::{BackendHandle, TextBackend};
use crate::{prompts, Error, Result};
use tracing::{debug, error};

/// Single-attempt text generation on top of a possibly unavailable backend.
#[derive(Clone)]
pub struct TextGenerationClient {
    backend: BackendHandle<dyn TextBackend>,
}

impl TextGenerationClient {
    pub fn new(backend: BackendHandle<dyn TextBackend>) -> Self {
        Self { backend }
    }

    /// Send `prompt` as-is. There is no retry: one call, one outcome.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let backend = self.backend.get()?;

        debug!("Sending text prompt ({} chars)", prompt.chars().count());
        backend.complete(prompt).await.map_err(|e| {
            error!("Text generation failed: {}", e);
            match e {
                Error::Transport(_) | Error::BackendUnavailable(_) => e,
                other => Error::Transport(other.to_string()),
            }
        })
    }

    /// Like [`generate`](Self::generate), with the bold-speaker format
    /// instruction appended.
    pub async fn generate_dialogue(&self, prompt: &str) -> Result<String> {
        self.generate(&prompts::with_dialogue_format(prompt)).await
    }
}
