use super::client::VertexHttpClient;
use super::types::{PredictInstance, PredictParameters, PredictRequest};
use crate::ai::{ImageBackend, ImagePayload};
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Imagen text-to-image backend on Vertex AI.
pub struct ImagenBackend {
    http: VertexHttpClient,
}

impl ImagenBackend {
    pub fn new_with_client(
        access_token: String,
        project_id: String,
        location: String,
        model: String,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: VertexHttpClient::new_with_client(
                access_token,
                project_id,
                location,
                model,
                Duration::from_secs(120),
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
impl ImageBackend for ImagenBackend {
    async fn generate_one_image(&self, prompt: &str) -> Result<Vec<ImagePayload>> {
        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters { sample_count: 1 },
        };

        let response = self.http.predict(&request).await?;

        let payloads = match response.predictions.into_iter().next() {
            Some(prediction) => {
                if let Some(mime) = &prediction.mime_type {
                    tracing::debug!("Imagen returned image with mime_type: {}", mime);
                }
                prediction.into_payloads()
            }
            None => vec![ImagePayload::Empty],
        };

        Ok(payloads)
    }
}
