//! REST client for the Generative Language video endpoints.
//!
//! Wraps `predictLongRunning`, operation lookup and the authenticated
//! artifact download using [`reqwest`].

use std::sync::Arc;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use crate::credential::CredentialHost;
use crate::error::GenError;
use crate::service::{ArtifactRef, GenerateVideosPayload, GenerationService, Operation, OperationError, OperationHandle};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// HTTP client for the hosted video generation API.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialHost>,
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: [Instance<'a>; 1],
    parameters: Parameters<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Instance<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<InlineImage<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineImage<'a> {
    bytes_base64_encoded: String,
    mime_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters<'a> {
    aspect_ratio: &'a str,
    resolution: &'a str,
    sample_count: u32,
}

#[derive(Debug, Deserialize)]
struct OperationBody {
    name: String,
    #[serde(default)]
    done: bool,
    error: Option<StatusBody>,
    response: Option<ResponseBody>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    code: Option<i32>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBody {
    generate_video_response: Option<VideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResponse {
    #[serde(default)]
    generated_samples: Vec<Sample>,
}

#[derive(Debug, Deserialize)]
struct Sample {
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
struct VideoRef {
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: StatusBody,
}

impl From<OperationBody> for Operation {
    fn from(body: OperationBody) -> Self {
        let artifacts = body
            .response
            .and_then(|r| r.generate_video_response)
            .map(|r| r.generated_samples)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| s.video.and_then(|v| v.uri))
            .map(|uri| ArtifactRef { uri })
            .collect();

        Operation {
            name: body.name,
            done: body.done,
            error: body.error.map(|e| OperationError {
                code: e.code,
                message: e.message,
            }),
            artifacts,
        }
    }
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialHost>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, credentials)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialHost>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn api_key(&self) -> Result<String, GenError> {
        self.credentials.api_key().ok_or(GenError::CredentialMissing)
    }

    // ---- private helpers ----

    /// Returns the response unchanged on success, otherwise a
    /// [`GenError::Service`] carrying the status and the service's message.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GenError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(GenError::Service {
            status: Some(status.as_u16()),
            message: error_message(&body),
        })
    }

    async fn parse_operation(response: reqwest::Response) -> Result<Operation, GenError> {
        let response = Self::ensure_success(response).await?;
        let body: OperationBody = response.json().await?;
        Ok(body.into())
    }
}

fn predict_body(payload: &GenerateVideosPayload) -> PredictRequest<'_> {
    PredictRequest {
        instances: [Instance {
            prompt: &payload.prompt,
            image: payload.image.as_ref().map(|img| InlineImage {
                bytes_base64_encoded: STANDARD.encode(&img.bytes),
                mime_type: &img.mime_type,
            }),
        }],
        parameters: Parameters {
            aspect_ratio: payload.aspect_ratio.id(),
            resolution: payload.resolution.id(),
            sample_count: payload.number_of_videos,
        },
    }
}

/// Pulls `error.message` out of a Google error envelope, falling back to
/// the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

fn download_url(uri: &str, key: &str) -> Result<Url, GenError> {
    let mut url = Url::parse(uri).map_err(|e| GenError::Service {
        status: None,
        message: format!("invalid artifact uri '{uri}': {e}"),
    })?;
    url.query_pairs_mut().append_pair("key", key);
    Ok(url)
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn generate_videos(&self, payload: &GenerateVideosPayload) -> Result<Operation, GenError> {
        let key = self.api_key()?;
        let response = self
            .client
            .post(format!("{}/models/{}:predictLongRunning", self.base_url, payload.model))
            .header(API_KEY_HEADER, key)
            .json(&predict_body(payload))
            .send()
            .await?;

        Self::parse_operation(response).await
    }

    async fn get_operation(&self, handle: &OperationHandle) -> Result<Operation, GenError> {
        let key = self.api_key()?;
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, handle))
            .header(API_KEY_HEADER, key)
            .send()
            .await?;

        Self::parse_operation(response).await
    }

    async fn download(&self, uri: &str) -> Result<Vec<u8>, GenError> {
        let key = self.api_key()?;
        let response = self.client.get(download_url(uri, &key)?).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenError::Download {
                status: status.as_u16(),
                body: error_message(&body),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ks_core::request::SourceImage;
    use ks_core::{AspectRatio, Resolution};

    #[test]
    fn serializes_predict_request() {
        let payload = GenerateVideosPayload {
            model: "veo-3.1-fast-generate-preview".into(),
            prompt: "a paper boat".into(),
            image: Some(SourceImage { bytes: vec![1, 2, 3], mime_type: "image/png".into() }),
            number_of_videos: 1,
            resolution: Resolution::FullHd,
            aspect_ratio: AspectRatio::Portrait,
        };

        let json = serde_json::to_value(predict_body(&payload)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "instances": [{
                    "prompt": "a paper boat",
                    "image": { "bytesBase64Encoded": "AQID", "mimeType": "image/png" }
                }],
                "parameters": { "aspectRatio": "9:16", "resolution": "1080p", "sampleCount": 1 }
            })
        );
    }

    #[test]
    fn maps_finished_operation() {
        let body: OperationBody = serde_json::from_str(
            r#"{
                "name": "models/veo/operations/abc",
                "done": true,
                "response": {
                    "@type": "type.googleapis.com/google.ai.generativelanguage.v1beta.PredictLongRunningResponse",
                    "generateVideoResponse": {
                        "generatedSamples": [{ "video": { "uri": "https://files.example/v1/files/xyz:download?alt=media" } }]
                    }
                }
            }"#,
        )
        .unwrap();

        let op = Operation::from(body);
        assert!(op.done);
        assert!(op.error.is_none());
        assert_eq!(op.artifacts, vec![ArtifactRef { uri: "https://files.example/v1/files/xyz:download?alt=media".into() }]);
    }

    #[test]
    fn maps_pending_and_failed_operations() {
        let pending: Operation = serde_json::from_str::<OperationBody>(r#"{ "name": "operations/1" }"#).unwrap().into();
        assert!(!pending.done);
        assert!(pending.artifacts.is_empty());

        let failed: Operation = serde_json::from_str::<OperationBody>(
            r#"{ "name": "operations/2", "done": true, "error": { "code": 3, "message": "prompt blocked" } }"#,
        )
        .unwrap()
        .into();
        assert_eq!(failed.error, Some(OperationError { code: Some(3), message: "prompt blocked".into() }));
    }

    #[test]
    fn extracts_google_error_message() {
        let body = r#"{ "error": { "code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND" } }"#;
        assert_eq!(error_message(body), "Requested entity was not found.");
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
    }

    #[test]
    fn appends_key_to_artifact_uri() {
        let url = download_url("https://files.example/v1/files/xyz:download?alt=media", "k3y").unwrap();
        assert_eq!(url.as_str(), "https://files.example/v1/files/xyz:download?alt=media&key=k3y");

        let url = download_url("https://files.example/video.mp4", "k3y").unwrap();
        assert_eq!(url.query(), Some("key=k3y"));

        assert!(download_url("not a uri", "k3y").is_err());
    }
}
