use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentRequest, GenerationConfig, Part};
use crate::ai::TextBackend;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

const MAX_OUTPUT_TOKENS: u32 = 3000;

pub struct GeminiTextBackend {
    http: GeminiHttpClient,
}

impl GeminiTextBackend {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(30),
                client,
            ),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }
}

#[async_trait]
impl TextBackend for GeminiTextBackend {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(prompt)],
            }],
            generation_config: Some(GenerationConfig {
                max_output_tokens: Some(MAX_OUTPUT_TOKENS),
            }),
        };

        let response = self.http.generate_content(&request).await?;

        response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| Error::Transport("No text in Gemini response".to_string()))
    }
}
