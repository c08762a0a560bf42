//! Vertex AI `:predict` payloads for Imagen models.

use crate::ai::ImagePayload;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct PredictRequest {
    pub instances: Vec<PredictInstance>,
    pub parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
pub struct PredictInstance {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictParameters {
    pub sample_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

/// One prediction. Depending on model version the image bytes arrive under
/// different fields, all base64 encoded.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub bytes_base64_encoded: Option<String>,
    pub image: Option<NestedImage>,
    pub bytes: Option<String>,
    pub mime_type: Option<String>,
    pub rai_filtered_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedImage {
    pub image_bytes: Option<String>,
}

fn decode_field(field: &str, value: Option<&String>) -> Option<Vec<u8>> {
    let encoded = value?;
    match base64::engine::general_purpose::STANDARD.decode(encoded) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!("Ignoring undecodable Imagen field '{}': {}", field, e);
            None
        }
    }
}

impl Prediction {
    /// Decode every known byte field, in priority order.
    ///
    /// Yields a single `Empty` when no field carries data.
    pub fn into_payloads(self) -> Vec<ImagePayload> {
        let nested = self.image.as_ref().and_then(|i| i.image_bytes.as_ref());
        let payloads: Vec<ImagePayload> = [
            decode_field("bytesBase64Encoded", self.bytes_base64_encoded.as_ref()),
            decode_field("image.imageBytes", nested),
            decode_field("bytes", self.bytes.as_ref()),
        ]
        .into_iter()
        .flatten()
        .map(ImagePayload::RawBytes)
        .collect();

        if payloads.is_empty() {
            if let Some(reason) = &self.rai_filtered_reason {
                tracing::warn!("Imagen filtered the prediction: {}", reason);
            }
            vec![ImagePayload::Empty]
        } else {
            payloads
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    fn raw(payload: &ImagePayload) -> &[u8] {
        match payload {
            ImagePayload::RawBytes(bytes) => bytes,
            other => panic!("expected raw bytes, got {:?}", other),
        }
    }

    #[test]
    fn test_fields_decode_in_priority_order() {
        let prediction: Prediction = serde_json::from_value(serde_json::json!({
            "bytes": b64(&[3]),
            "image": { "imageBytes": b64(&[2]) },
            "bytesBase64Encoded": b64(&[1]),
        }))
        .unwrap();

        let payloads = prediction.into_payloads();
        assert_eq!(payloads.len(), 3);
        assert_eq!(raw(&payloads[0]), &[1]);
        assert_eq!(raw(&payloads[1]), &[2]);
        assert_eq!(raw(&payloads[2]), &[3]);
    }

    #[test]
    fn test_filtered_prediction_is_empty() {
        let prediction: Prediction = serde_json::from_value(serde_json::json!({
            "raiFilteredReason": "blocked by safety filter"
        }))
        .unwrap();

        let payloads = prediction.into_payloads();
        assert!(matches!(payloads.as_slice(), [ImagePayload::Empty]));
    }

    #[test]
    fn test_invalid_base64_field_is_skipped() {
        let prediction: Prediction = serde_json::from_value(serde_json::json!({
            "bytesBase64Encoded": "!!!not-base64!!!",
            "bytes": b64(&[9, 9]),
        }))
        .unwrap();

        let payloads = prediction.into_payloads();
        assert_eq!(payloads.len(), 1);
        assert_eq!(raw(&payloads[0]), &[9, 9]);
    }
}
