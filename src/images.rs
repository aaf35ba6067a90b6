//! Image prompts derived from a post, and the images synthesized from them.

use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::backend::{BackendError, CompletionRequest, ImageBackend, ImageRequest, TextBackend};
use crate::constants::{
    GENERATION_TEMPERATURE, IMAGE_PROMPT_MAX_CHARS, IMAGE_PROMPT_MAX_OUTPUT_TOKENS,
};

/// Prompt used for every slot when nothing better could be derived.
pub fn fallback_prompt(topic: &str) -> String {
    format!("Professional image related to {topic}")
}

/// Why the deriver fell back to templated prompts.
#[derive(Clone, Debug, PartialEq)]
pub enum FallbackCause {
    /// The text backend call failed
    BackendFailed(String),
    /// The reply had no list lines in it
    NothingParsed,
}

/// Outcome of [`derive_image_prompts`]. Both variants are usable prompts.
#[derive(Clone, Debug, PartialEq)]
pub enum DerivedPrompts {
    /// Prompts read from the model's list
    Parsed(Vec<String>),
    /// `n` copies of [`fallback_prompt`]
    Fallback {
        /// The templated prompts
        prompts: Vec<String>,
        /// What went wrong
        cause: FallbackCause,
    },
}

impl DerivedPrompts {
    /// The prompts, whichever way they were produced.
    pub fn prompts(&self) -> &[String] {
        match self {
            Self::Parsed(prompts) | Self::Fallback { prompts, .. } => prompts,
        }
    }

    /// Consumes self, returning the prompts.
    pub fn into_prompts(self) -> Vec<String> {
        match self {
            Self::Parsed(prompts) | Self::Fallback { prompts, .. } => prompts,
        }
    }

    /// True for the templated fallback.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Strips a leading `1.`, `2)`, `-`, `3:` style marker. `None` if the line isn't a list item.
fn strip_list_marker(line: &str) -> Option<&str> {
    let rest = match line.strip_prefix('-') {
        Some(rest) => rest,
        None => {
            let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
            if rest.len() == line.len() {
                return None;
            }
            rest
        }
    };
    let rest = rest.trim_start();
    let rest = rest.strip_prefix(['.', ')', '-', ':']).unwrap_or(rest);
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

fn clamp_prompt(prompt: &str) -> String {
    prompt.chars().take(IMAGE_PROMPT_MAX_CHARS - 1).collect()
}

/// Pulls up to `n` prompts out of a numbered or bulleted list.
pub fn parse_image_prompts(text: &str, n: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter_map(strip_list_marker)
        .map(clamp_prompt)
        .take(n)
        .collect()
}

/// Asks the text model for `n` visual prompts describing the post.
///
/// Never fails: backend errors and unparseable replies both produce
/// [`DerivedPrompts::Fallback`].
pub async fn derive_image_prompts<B: TextBackend + ?Sized>(
    backend: &B,
    model: &str,
    topic: &str,
    post_text: &str,
    n: usize,
) -> DerivedPrompts {
    if n == 0 {
        return DerivedPrompts::Parsed(Vec::new());
    }

    let request = CompletionRequest {
        model: model.to_string(),
        system_instruction: "You are an expert at creating visual prompts.".to_string(),
        user_instruction: format!(
            "Based on this social media post about \"{topic}\", create {n} different image prompts \
             for an image generation model.\n\
             Make the prompts specific, visually appealing, and under {IMAGE_PROMPT_MAX_CHARS} characters each.\n\
             Format your response as a numbered list with just the prompts.\n\n\
             Post content:\n{post_text}"
        ),
        max_output_tokens: IMAGE_PROMPT_MAX_OUTPUT_TOKENS,
        temperature: Some(GENERATION_TEMPERATURE),
    };

    let cause = match backend.complete(&request).await {
        Ok(reply) => {
            let prompts = parse_image_prompts(&reply, n);
            if !prompts.is_empty() {
                debug!("Derived {} image prompts", prompts.len());
                return DerivedPrompts::Parsed(prompts);
            }
            warn!("No image prompts found in reply, using fallback");
            FallbackCause::NothingParsed
        }
        Err(err) => {
            error!("Error generating image prompts: {err}");
            FallbackCause::BackendFailed(err.to_string())
        }
    };

    DerivedPrompts::Fallback {
        prompts: vec![fallback_prompt(topic); n],
        cause,
    }
}

/// A synthesized image and the prompt it came from.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Prompt sent to the image model
    pub prompt: String,
    /// Base64-encoded image bytes
    pub payload: String,
}

impl GeneratedImage {
    /// Decodes the payload into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        general_purpose::STANDARD.decode(&self.payload)
    }
}

/// A single image that could not be produced.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageSynthesisError {
    /// Prompt that failed
    pub prompt: String,
    /// Underlying failure
    pub source: BackendError,
}

impl fmt::Display for ImageSynthesisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error generating image: {}", self.source)
    }
}

impl std::error::Error for ImageSynthesisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Requests one square image for `prompt`.
pub async fn synthesize<B: ImageBackend + ?Sized>(
    backend: &B,
    model: &str,
    prompt: &str,
) -> Result<GeneratedImage, ImageSynthesisError> {
    let request = ImageRequest::square(model, prompt);
    match backend.generate_image(&request).await {
        Ok(payload) => Ok(GeneratedImage {
            prompt: prompt.to_string(),
            payload,
        }),
        Err(source) => Err(ImageSynthesisError {
            prompt: prompt.to_string(),
            source,
        }),
    }
}

/// Synthesizes one image per prompt, one request at a time.
///
/// Result `i` belongs to `prompts[i]`; a failure doesn't stop the rest.
pub async fn synthesize_all<B: ImageBackend + ?Sized>(
    backend: &B,
    model: &str,
    prompts: &[String],
) -> Vec<Result<GeneratedImage, ImageSynthesisError>> {
    let mut results = Vec::with_capacity(prompts.len());
    for (index, prompt) in prompts.iter().enumerate() {
        let result = synthesize(backend, model, prompt).await;
        match &result {
            Ok(_) => info!("Generated image {}/{}", index + 1, prompts.len()),
            Err(err) => error!("Image {}/{} failed: {err}", index + 1, prompts.len()),
        }
        results.push(result);
    }
    results
}

/// Writes an image to `<dir>/image_<index + 1>.png`.
pub fn save_image(dir: &Path, index: usize, image: &GeneratedImage) -> std::io::Result<PathBuf> {
    let bytes = image
        .decode()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("image_{}.png", index + 1));
    std::fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_markers_are_stripped() {
        let reply = "1. A cat\n2) A dog\n- A bird";
        assert_eq!(parse_image_prompts(reply, 3), vec!["A cat", "A dog", "A bird"]);
    }

    #[test]
    fn multi_digit_and_spaced_markers() {
        let reply = "10. A fox\n  3 : A heron\n-- A wolf\n4-A bear";
        assert_eq!(
            parse_image_prompts(reply, 10),
            vec!["A fox", "A heron", "A wolf", "A bear"]
        );
    }

    #[test]
    fn prose_and_bare_markers_are_skipped() {
        let reply = "Here are your prompts:\n\n1.\n2. A sunrise over a conference hall\nEnjoy!";
        assert_eq!(
            parse_image_prompts(reply, 2),
            vec!["A sunrise over a conference hall"]
        );
        assert!(parse_image_prompts("", 2).is_empty());
        assert!(parse_image_prompts("no list here", 2).is_empty());
    }

    #[test]
    fn only_first_n_are_kept() {
        let reply = "1. one\n2. two\n3. three";
        assert_eq!(parse_image_prompts(reply, 2), vec!["one", "two"]);
    }

    #[test]
    fn long_prompts_are_clamped() {
        let long = format!("1. {}", "é".repeat(300));
        let prompts = parse_image_prompts(&long, 1);
        assert_eq!(prompts[0].chars().count(), IMAGE_PROMPT_MAX_CHARS - 1);
    }

    #[test]
    fn fallback_template() {
        assert_eq!(
            fallback_prompt("AI Summit"),
            "Professional image related to AI Summit"
        );
    }

    #[test]
    fn save_image_writes_decoded_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image = GeneratedImage {
            prompt: "x".to_string(),
            payload: general_purpose::STANDARD.encode(b"png bytes"),
        };
        let path = save_image(dir.path(), 1, &image).expect("save");
        assert!(path.ends_with("image_2.png"));
        assert_eq!(std::fs::read(path).expect("read back"), b"png bytes");
    }
}
