use super::ArtifactSink;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory sink that records the last artifact of each kind.
#[derive(Clone, Default)]
pub struct MockArtifactSink {
    dialogue: Arc<Mutex<Option<String>>>,
    image: Arc<Mutex<Option<Vec<u8>>>>,
    save_count: Arc<Mutex<usize>>,
    failing: bool,
    delay: Option<Duration>,
}

impl MockArtifactSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every save reports failure and stores nothing.
    pub fn with_failures(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Sleep after recording each save attempt.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_save_count(&self) -> usize {
        *self.save_count.lock().unwrap()
    }

    pub fn get_dialogue(&self) -> Option<String> {
        self.dialogue.lock().unwrap().clone()
    }

    pub fn get_image(&self) -> Option<Vec<u8>> {
        self.image.lock().unwrap().clone()
    }

    async fn record_attempt(&self) {
        *self.save_count.lock().unwrap() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ArtifactSink for MockArtifactSink {
    async fn save_dialogue(&self, dialogue: &str) -> bool {
        self.record_attempt().await;
        if self.failing {
            return false;
        }
        *self.dialogue.lock().unwrap() = Some(dialogue.to_string());
        true
    }

    async fn save_image(&self, image: &[u8]) -> bool {
        self.record_attempt().await;
        if self.failing {
            return false;
        }
        *self.image.lock().unwrap() = Some(image.to_vec());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_sink_keeps_latest() {
        let sink = MockArtifactSink::new();

        assert!(sink.save_dialogue("one").await);
        assert!(sink.save_dialogue("two").await);
        assert!(sink.save_image(b"png").await);

        assert_eq!(sink.get_dialogue().as_deref(), Some("two"));
        assert_eq!(sink.get_image(), Some(b"png".to_vec()));
        assert_eq!(sink.get_save_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_sink_failures() {
        let sink = MockArtifactSink::new().with_failures();

        assert!(!sink.save_dialogue("lost").await);
        assert_eq!(sink.get_dialogue(), None);
        assert_eq!(sink.get_save_count(), 1);
    }
}
