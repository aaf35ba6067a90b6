//! OpenAI Responses + Images API client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{
    BackendError, CompletionRequest, Connector, GenerativeBackend, ImageBackend, ImageRequest,
    TextBackend,
};
use crate::credential::Credential;

// -----------------------------
// Responses API (text)
// -----------------------------

/// Request body for POST /v1/responses
/// Docs: https://platform.openai.com/docs/api-reference/responses
#[derive(Serialize, Debug)]
struct ResponsesCreateRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: [InputMessage<'a>; 1],
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize, Debug)]
struct InputMessage<'a> {
    role: &'static str,
    content: [InputContent<'a>; 1],
}

#[derive(Serialize, Debug)]
struct InputContent<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResponsesCreateResponse {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<ResponseOutputItem>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ResponseOutputItem {
    #[serde(default)]
    content: Vec<ResponseContentItem>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentItem {
    #[serde(rename = "output_text")]
    OutputText { text: String },
    #[serde(other)]
    Other,
}

impl ResponsesCreateResponse {
    fn into_text(self) -> Result<String, BackendError> {
        // An explicit null is fine, anything else is a failure.
        if let Some(err) = self.error.filter(|err| !err.is_null()) {
            return Err(BackendError::Api(err.to_string()));
        }
        self.output_text
            .or_else(|| {
                self.output
                    .into_iter()
                    .flat_map(|item| item.content.into_iter())
                    .find_map(|content| match content {
                        ResponseContentItem::OutputText { text } => Some(text),
                        ResponseContentItem::Other => None,
                    })
            })
            .ok_or_else(|| BackendError::MissingOutput("no output_text in /responses reply".into()))
    }
}

// -----------------------------
// Images API
// -----------------------------

/// Request body for POST /v1/images/generations
/// Docs: https://platform.openai.com/docs/api-reference/images
#[derive(Serialize, Debug)]
struct ImagesGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,

    // For GPT image models.
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    output_format: Option<&'a str>,

    // For dall-e models.
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'a str>,
}

impl<'a> ImagesGenerateRequest<'a> {
    fn for_model(request: &'a ImageRequest) -> Self {
        // GPT image models always return base64 and take output_format.
        // DALL·E models need response_format to skip the URL round trip.
        let model = request.model.as_str();
        let (quality, output_format, response_format) = if model.starts_with("gpt-image") {
            (Some("high"), Some("png"), None)
        } else if model == "dall-e-3" {
            (Some("hd"), None, Some("b64_json"))
        } else {
            (None, None, Some("b64_json"))
        };
        Self {
            model,
            prompt: &request.prompt,
            n: 1,
            size: request.size,
            quality,
            output_format,
            response_format,
        }
    }
}

#[derive(Deserialize, Debug)]
struct ImagesGenerateResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize, Debug)]
struct ImageData {
    b64_json: Option<String>,
    url: Option<String>,
    revised_prompt: Option<String>,
}

// -----------------------------
// Client
// -----------------------------

/// Builds the shared HTTP client.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| BackendError::Transport(err.to_string()))
}

/// OpenAI client bound to a single credential.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
}

impl OpenAiClient {
    /// Creates a client for `base_url`, e.g. `https://api.openai.com/v1`.
    pub fn new(http: reqwest::Client, base_url: &str, credential: Credential) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Vec<u8>, BackendError> {
        let url = self.endpoint(path);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.credential.expose())
            .json(body)
            .send()
            .await
            .map_err(|err| BackendError::Transport(format!("POST {url}: {err}")))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| BackendError::Transport(format!("reading {url} body: {err}")))?;
        debug!("POST {} -> {} ({} bytes)", url, status, bytes.len());

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes.to_vec())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, BackendError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| BackendError::Transport(format!("GET {url}: {err}")))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| BackendError::Transport(format!("reading {url} body: {err}")))?;
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl TextBackend for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        let body = ResponsesCreateRequest {
            model: &request.model,
            instructions: &request.system_instruction,
            input: [InputMessage {
                role: "user",
                content: [InputContent {
                    kind: "input_text",
                    text: &request.user_instruction,
                }],
            }],
            max_output_tokens: request.max_output_tokens,
            temperature: request.temperature,
        };
        let bytes = self.post_json("responses", &body).await?;
        let parsed: ResponsesCreateResponse = serde_json::from_slice(&bytes)
            .map_err(|err| BackendError::Decode(format!("/responses JSON: {err}")))?;
        parsed.into_text()
    }
}

#[async_trait]
impl ImageBackend for OpenAiClient {
    async fn generate_image(&self, request: &ImageRequest) -> Result<String, BackendError> {
        let body = ImagesGenerateRequest::for_model(request);
        let bytes = self.post_json("images/generations", &body).await?;
        let parsed: ImagesGenerateResponse = serde_json::from_slice(&bytes)
            .map_err(|err| BackendError::Decode(format!("/images/generations JSON: {err}")))?;

        let first = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::MissingOutput("no image data returned".into()))?;

        if let Some(revised_prompt) = first.revised_prompt {
            info!("Revised image prompt from OpenAI: {revised_prompt}");
        }

        if let Some(b64_json) = first.b64_json {
            Ok(b64_json)
        } else if let Some(url) = first.url {
            let bytes = self.download(&url).await?;
            Ok(general_purpose::STANDARD.encode(bytes))
        } else {
            Err(BackendError::MissingOutput(
                "image response missing b64_json and url fields".into(),
            ))
        }
    }
}

/// Hands out [`OpenAiClient`]s that share one connection pool.
#[derive(Clone, Debug)]
pub struct OpenAiConnector {
    http: reqwest::Client,
    base_url: String,
}

impl OpenAiConnector {
    /// Creates a connector for `base_url`.
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }
}

impl Connector for OpenAiConnector {
    fn connect(&self, credential: &Credential) -> Arc<dyn GenerativeBackend> {
        Arc::new(OpenAiClient::new(
            self.http.clone(),
            &self.base_url,
            credential.clone(),
        ))
    }
}
