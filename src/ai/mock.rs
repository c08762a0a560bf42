use super::{ImageBackend, ImagePayload, TextBackend};
use crate::{Error, Result};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum TextReply {
    Text(String),
    Failure(String),
}

/// Scripted text backend. Replies cycle; every prompt is recorded.
#[derive(Clone)]
pub struct MockTextBackend {
    replies: Arc<Mutex<Vec<TextReply>>>,
    next_error: Arc<Mutex<Option<Error>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<usize>>,
    delay: Option<Duration>,
}

impl MockTextBackend {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            next_error: Arc::new(Mutex::new(None)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            delay: None,
        }
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(TextReply::Text(response.into()));
        self
    }

    /// Queue a reply that fails with a transport error.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(TextReply::Failure(message.into()));
        self
    }

    /// Fail the next call with exactly this error.
    pub fn with_error(self, error: Error) -> Self {
        *self.next_error.lock().unwrap() = Some(error);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockTextBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextBackend for MockTextBackend {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }

        let replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            let head: String = prompt.chars().take(40).collect();
            return Ok(format!("Mock response to: {}", head));
        }

        match &replies[(count - 1) % replies.len()] {
            TextReply::Text(text) => Ok(text.clone()),
            TextReply::Failure(message) => Err(Error::Transport(message.clone())),
        }
    }
}

#[derive(Debug, Clone)]
enum ImageReply {
    Payloads(Vec<ImagePayload>),
    Failure(String),
}

/// Scripted image backend. Defaults to a small valid PNG.
#[derive(Clone)]
pub struct MockImageBackend {
    replies: Arc<Mutex<Vec<ImageReply>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<usize>>,
}

/// Encode a solid-colour PNG of the given size.
pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("in-memory PNG encoding");
    bytes
}

impl MockImageBackend {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_payloads(self, payloads: Vec<ImagePayload>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(ImageReply::Payloads(payloads));
        self
    }

    pub fn with_image_response(self, bytes: Vec<u8>) -> Self {
        self.with_payloads(vec![ImagePayload::RawBytes(bytes)])
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(ImageReply::Failure(message.into()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockImageBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageBackend for MockImageBackend {
    async fn generate_one_image(&self, prompt: &str) -> Result<Vec<ImagePayload>> {
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.prompts.lock().unwrap().push(prompt.to_string());

        let replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Ok(vec![ImagePayload::RawBytes(solid_png(8, 8, [20, 40, 60]))]);
        }

        match &replies[(count - 1) % replies.len()] {
            ImageReply::Payloads(payloads) => Ok(payloads.clone()),
            ImageReply::Failure(message) => Err(Error::Transport(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_text_default_response_echoes_prompt() {
        let backend = MockTextBackend::new();
        let text = backend.complete("Describe a rooftop").await.unwrap();
        assert!(text.contains("Describe a rooftop"));
    }

    #[tokio::test]
    async fn test_mock_text_replies_cycle() {
        let backend = MockTextBackend::new()
            .with_response("first")
            .with_failure("down");

        assert_eq!(backend.complete("a").await.unwrap(), "first");
        assert!(backend.complete("b").await.is_err());
        assert_eq!(backend.complete("c").await.unwrap(), "first");
        assert_eq!(backend.get_call_count(), 3);
        assert_eq!(backend.get_prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_mock_image_default_is_decodable_png() {
        let backend = MockImageBackend::new();
        let payloads = backend.generate_one_image("x").await.unwrap();

        match payloads.as_slice() {
            [ImagePayload::RawBytes(bytes)] => {
                assert!(image::load_from_memory(bytes).is_ok());
            }
            other => panic!("unexpected payloads: {:?}", other),
        }
        assert_eq!(backend.get_call_count(), 1);
    }
}
