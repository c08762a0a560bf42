//! Persistence of generated artifacts
//!
//! A sink keeps a single slot per artifact kind: every save replaces the
//! previous dialogue or image. Write failures are reported as `false` and
//! never abort a generation run.

pub mod filesystem;
pub mod mock;

pub use filesystem::FileArtifactSink;
pub use mock::MockArtifactSink;

use async_trait::async_trait;

pub const DIALOGUE_FILENAME: &str = "generated_dialogue.txt";
pub const IMAGE_FILENAME: &str = "generated_image.png";

#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn save_dialogue(&self, dialogue: &str) -> bool;
    async fn save_image(&self, image: &[u8]) -> bool;
}
