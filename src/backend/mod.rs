//! Generative backends: text completion and image synthesis.
//!
//! The core functions only see [`TextBackend`] and [`ImageBackend`], so tests
//! can swap in canned responses. [`openai::OpenAiClient`] talks to the real API.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::constants::IMAGE_SIZE;
use crate::credential::Credential;

pub mod openai;

/// A single text completion call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Model name
    pub model: String,
    /// System-level instruction
    pub system_instruction: String,
    /// The user turn
    pub user_instruction: String,
    /// Output token budget
    pub max_output_tokens: u32,
    /// Sampling temperature, backend default when unset
    pub temperature: Option<f32>,
}

/// A single image synthesis call; always one square image.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImageRequest {
    /// Model name
    pub model: String,
    /// Visual description
    pub prompt: String,
    /// Pixel size, `WxH`
    pub size: &'static str,
}

impl ImageRequest {
    /// Builds a request for one square image.
    pub fn square(model: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            prompt: prompt.to_string(),
            size: IMAGE_SIZE,
        }
    }
}

/// Failures talking to a backend.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendError {
    /// Could not reach the backend or read its reply
    Transport(String),
    /// Backend answered with a non-success HTTP status
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },
    /// Backend answered 2xx but reported an error object
    Api(String),
    /// Reply could not be decoded
    Decode(String),
    /// Reply decoded but carried no usable output
    MissingOutput(String),
}

impl BackendError {
    /// True when the backend refused the credential.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == 401 || *status == 403)
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "Backend request failed: {msg}"),
            Self::Status { status, body } => write!(f, "Backend returned HTTP {status}: {body}"),
            Self::Api(msg) => write!(f, "Backend returned an error: {msg}"),
            Self::Decode(msg) => write!(f, "Could not decode backend response: {msg}"),
            Self::MissingOutput(msg) => write!(f, "Backend response had no output: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// Produces text from a prompt.
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Runs one completion and returns the generated text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError>;
}

/// Produces images from a prompt.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Runs one synthesis and returns the base64-encoded image.
    async fn generate_image(&self, request: &ImageRequest) -> Result<String, BackendError>;
}

/// A backend that does both text and images.
pub trait GenerativeBackend: TextBackend + ImageBackend {}

impl<T: TextBackend + ImageBackend> GenerativeBackend for T {}

/// Builds a backend bound to a user's credential.
pub trait Connector: Send + Sync {
    /// Returns a backend that authenticates with `credential`.
    fn connect(&self, credential: &Credential) -> Arc<dyn GenerativeBackend>;
}
