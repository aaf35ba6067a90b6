//! The generate-then-verify loop.
//!
//! One primary completion, a word count check, and at most one corrective
//! completion whose output is accepted as-is.

use std::fmt;

use tracing::{debug, info, warn};

use crate::backend::{BackendError, TextBackend};
use crate::compose::{compose, compose_corrective, resolve_target_word_count};
use crate::constants::WORD_COUNT_TOLERANCE;
use crate::post::{GeneratedPost, PostRequest, RequestError, word_count};

/// Why a post could not be produced.
#[derive(Clone, Debug, PartialEq)]
pub enum GenerationError {
    /// The request was invalid; no backend call was made
    Request(RequestError),
    /// A backend call failed; nothing was produced
    Backend(BackendError),
}

impl From<RequestError> for GenerationError {
    fn from(err: RequestError) -> Self {
        GenerationError::Request(err)
    }
}

impl From<BackendError> for GenerationError {
    fn from(err: BackendError) -> Self {
        GenerationError::Backend(err)
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(err) => write!(f, "{err}"),
            Self::Backend(err) => write!(f, "Error generating post: {err}"),
        }
    }
}

impl std::error::Error for GenerationError {}

/// True when `actual` is within [`WORD_COUNT_TOLERANCE`] of `target`.
pub fn within_tolerance(actual: usize, target: u32) -> bool {
    if target == 0 {
        return actual == 0;
    }
    let target = f64::from(target);
    #[allow(clippy::cast_precision_loss)]
    let actual = actual as f64;
    (actual - target).abs() / target <= WORD_COUNT_TOLERANCE
}

/// Generates a post for `request`, correcting its length at most once.
///
/// If the first draft is off target by more than 10%, one corrective prompt is
/// sent and whatever it returns is the result, even if it is still off target.
pub async fn generate<B: TextBackend + ?Sized>(
    backend: &B,
    model: &str,
    request: &PostRequest,
) -> Result<GeneratedPost, GenerationError> {
    request.validate()?;
    let target = resolve_target_word_count(request)?;

    let primary = compose(request, target).for_model(model);
    let draft = backend.complete(&primary).await?.trim().to_string();
    let actual = word_count(&draft);

    if within_tolerance(actual, target) {
        debug!("Draft has {actual} words for a target of {target}, accepting");
        return Ok(GeneratedPost {
            text: draft,
            target_word_count: target,
            actual_word_count: actual,
            corrected: false,
        });
    }

    info!("Draft has {actual} words for a target of {target}, requesting one correction");
    let corrective = compose_corrective(request, target, &draft, actual).for_model(model);
    let text = backend.complete(&corrective).await?.trim().to_string();
    let actual = word_count(&text);
    if !within_tolerance(actual, target) {
        // No further retries; the corrected text stands.
        warn!("Corrected post still has {actual} words for a target of {target}");
    }

    Ok(GeneratedPost {
        text,
        target_word_count: target,
        actual_word_count: actual,
        corrected: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_boundaries() {
        assert!(within_tolerance(75, 75));
        assert!(within_tolerance(74, 75));
        // 10% of 100 either side is still fine
        assert!(within_tolerance(90, 100));
        assert!(within_tolerance(110, 100));
        assert!(!within_tolerance(89, 100));
        assert!(!within_tolerance(111, 100));
        assert!(!within_tolerance(0, 75));
    }
}
