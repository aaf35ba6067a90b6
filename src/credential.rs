//! Bearer credential handling and the one-off verification call.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::{BackendError, CompletionRequest, TextBackend};
use crate::constants::VERIFY_MAX_OUTPUT_TOKENS;

/// An API key. `Debug` never prints the secret.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wraps a candidate key, rejecting blank input without touching the network.
    pub fn new(candidate: &str) -> Result<Self, CredentialError> {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            return Err(CredentialError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The raw secret, for the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Why a credential was refused.
#[derive(Clone, Debug, PartialEq)]
pub enum CredentialError {
    /// Nothing was entered
    Empty,
    /// The backend refused the key or could not be reached
    Rejected(BackendError),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Please enter an API key."),
            Self::Rejected(err) => write!(f, "Failed to verify API key: {err}"),
        }
    }
}

impl std::error::Error for CredentialError {}

/// Issues a minimal completion; success means the key is usable.
pub async fn verify_credential<B: TextBackend + ?Sized>(
    backend: &B,
    model: &str,
) -> Result<(), CredentialError> {
    let request = CompletionRequest {
        model: model.to_string(),
        system_instruction: String::new(),
        user_instruction: "Hello".to_string(),
        max_output_tokens: VERIFY_MAX_OUTPUT_TOKENS,
        temperature: None,
    };
    match backend.complete(&request).await {
        Ok(_) => {
            info!("API key verified against {model}");
            Ok(())
        }
        Err(err) if err.is_auth_failure() => {
            info!("API key rejected by the backend");
            Err(CredentialError::Rejected(err))
        }
        Err(err) => {
            warn!("API key verification failed: {err}");
            Err(CredentialError::Rejected(err))
        }
    }
}
