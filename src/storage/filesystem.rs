use super::{ArtifactSink, DIALOGUE_FILENAME, IMAGE_FILENAME};
use crate::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Writes artifacts into a fixed directory, created on first save.
pub struct FileArtifactSink {
    directory: PathBuf,
}

impl FileArtifactSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn dialogue_path(&self) -> PathBuf {
        self.directory.join(DIALOGUE_FILENAME)
    }

    pub fn image_path(&self) -> PathBuf {
        self.directory.join(IMAGE_FILENAME)
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.directory).await?;
        tokio::fs::write(path, contents).await?;
        Ok(())
    }

    async fn save(&self, kind: &str, path: PathBuf, contents: &[u8]) -> bool {
        match self.write(&path, contents).await {
            Ok(()) => {
                info!("{} saved to {}", kind, path.display());
                true
            }
            Err(e) => {
                warn!("Failed to save {}: {}", kind.to_lowercase(), e);
                false
            }
        }
    }
}

#[async_trait]
impl ArtifactSink for FileArtifactSink {
    async fn save_dialogue(&self, dialogue: &str) -> bool {
        self.save("Dialogue", self.dialogue_path(), dialogue.as_bytes())
            .await
    }

    async fn save_image(&self, image: &[u8]) -> bool {
        self.save("Image", self.image_path(), image).await
    }
}
