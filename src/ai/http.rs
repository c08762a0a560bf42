use crate::{Error, Result};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

/// POST `body` as JSON and decode the JSON reply.
///
/// Send failures, non-success statuses and undecodable bodies all map to
/// [`Error::Transport`], prefixed with `provider`.
pub(crate) async fn post_json<Req, Resp>(
    provider: &str,
    request: RequestBuilder,
    body: &Req,
) -> Result<Resp>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    let response = request.json(body).send().await.map_err(|e| {
        error!("Failed to send request to {}: {}", provider, e);
        Error::Transport(format!("{} request failed: {}", provider, e))
    })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        error!("{} API error (status {}): {}", provider, status, error_text);
        return Err(Error::Transport(format!(
            "{} API error (status {}): {}",
            provider, status, error_text
        )));
    }

    let text = response.text().await?;
    debug!("{} replied with {} bytes", provider, text.len());
    serde_json::from_str(&text).map_err(|e| {
        error!("Failed to parse {} response: {}", provider, e);
        Error::Transport(format!("Failed to parse {} response: {}", provider, e))
    })
}
