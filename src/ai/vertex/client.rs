use super::types::{PredictRequest, PredictResponse};
use crate::ai::http::post_json;
use crate::Result;
use reqwest::Client;
use std::time::Duration;

/// REST client for a Vertex AI publisher model in one project/region.
pub struct VertexHttpClient {
    client: Client,
    access_token: String,
    project_id: String,
    location: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl VertexHttpClient {
    pub fn new_with_client(
        access_token: String,
        project_id: String,
        location: String,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        let base_url = format!("https://{}-aiplatform.googleapis.com", location);
        Self {
            client,
            access_token,
            project_id,
            location,
            model,
            base_url,
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn predict_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
            self.base_url, self.project_id, self.location, self.model
        )
    }

    pub async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse> {
        let builder = self
            .client
            .post(self.predict_url())
            .timeout(self.timeout)
            .bearer_auth(&self.access_token);

        post_json("Vertex AI", builder, request).await
    }
}
