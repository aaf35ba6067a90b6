//! Per-browser-session state, owned by the presentation layer.
//!
//! Handlers load a [`SessionState`], hand pieces of it to the core functions,
//! and store it back. The core never holds on to any of it.

use serde::{Deserialize, Serialize};

use crate::credential::Credential;
use crate::images::{DerivedPrompts, GeneratedImage, ImageSynthesisError};
use crate::post::{GeneratedPost, PostRequest, word_count};

/// Raw form values, kept so the form re-renders with what the user typed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PostForm {
    /// Topic text
    pub topic: String,
    /// Platform name, empty when not chosen
    pub platform: String,
    /// Tone name, empty when not chosen
    pub tone: String,
    /// Length name, empty when not chosen
    pub length: String,
    /// Word count for custom lengths
    pub custom_word_count: u32,
}

impl Default for PostForm {
    fn default() -> Self {
        Self {
            topic: String::new(),
            platform: String::new(),
            tone: String::new(),
            length: String::new(),
            custom_word_count: 100,
        }
    }
}

/// One image slot, in derived prompt order.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ImageSlot {
    /// Image was produced
    Ready(GeneratedImage),
    /// Image failed; the others are unaffected
    Failed {
        /// Prompt that failed
        prompt: String,
        /// User-facing error
        message: String,
    },
}

impl From<Result<GeneratedImage, ImageSynthesisError>> for ImageSlot {
    fn from(result: Result<GeneratedImage, ImageSynthesisError>) -> Self {
        match result {
            Ok(image) => ImageSlot::Ready(image),
            Err(err) => ImageSlot::Failed {
                message: err.to_string(),
                prompt: err.prompt,
            },
        }
    }
}

/// Everything one session knows.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Verified API key
    pub credential: Option<Credential>,
    /// Last submitted form values
    pub form: PostForm,
    /// Last accepted request, reused by "regenerate"
    pub request: Option<PostRequest>,
    /// Post as generated
    pub post: Option<GeneratedPost>,
    /// Post as edited by the user
    pub edited_text: String,
    /// Prompts used for `images`
    pub image_prompts: Vec<String>,
    /// True when `image_prompts` are the templated fallback
    pub image_prompts_fallback: bool,
    /// Image results, same order as `image_prompts`
    pub images: Vec<ImageSlot>,
}

impl SessionState {
    /// True once a credential has been verified.
    pub fn is_verified(&self) -> bool {
        self.credential.is_some()
    }

    /// Stores a freshly generated post, replacing any edits and images.
    pub fn accept_post(&mut self, request: PostRequest, post: GeneratedPost) {
        self.edited_text = post.text.clone();
        self.request = Some(request);
        self.post = Some(post);
        self.clear_images();
    }

    /// Replaces the post text with the user's edit. The word target isn't re-checked.
    pub fn edit(&mut self, text: &str) {
        if self.post.is_some() {
            self.edited_text = text.to_string();
        }
    }

    /// Word count of the text currently shown.
    pub fn edited_word_count(&self) -> usize {
        word_count(&self.edited_text)
    }

    /// Stores derived prompts and the images made from them.
    pub fn store_images(
        &mut self,
        derived: DerivedPrompts,
        results: Vec<Result<GeneratedImage, ImageSynthesisError>>,
    ) {
        self.image_prompts_fallback = derived.is_fallback();
        self.image_prompts = derived.into_prompts();
        self.images = results.into_iter().map(ImageSlot::from).collect();
    }

    /// Drops images and their prompts.
    pub fn clear_images(&mut self) {
        self.image_prompts.clear();
        self.image_prompts_fallback = false;
        self.images.clear();
    }

    /// Forgets the post and form but keeps the credential.
    pub fn reset(&mut self) {
        let credential = self.credential.take();
        *self = Self {
            credential,
            ..Self::default()
        };
    }

    /// Forgets everything.
    pub fn sign_out(&mut self) {
        *self = Self::default();
    }

    /// Ready image at `index`, if any.
    pub fn image(&self, index: usize) -> Option<&GeneratedImage> {
        match self.images.get(index)? {
            ImageSlot::Ready(image) => Some(image),
            ImageSlot::Failed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::images::FallbackCause;
    use crate::post::{Length, Platform, Tone};

    fn post(text: &str) -> GeneratedPost {
        GeneratedPost {
            text: text.to_string(),
            target_word_count: 75,
            actual_word_count: word_count(text),
            corrected: false,
        }
    }

    fn request() -> PostRequest {
        PostRequest::new("AI Summit", Platform::Twitter, Tone::Humorous, Length::Short)
    }

    #[test]
    fn edits_do_not_touch_the_generated_post() {
        let mut state = SessionState::default();
        state.accept_post(request(), post("one two three"));
        state.edit("one two three four five");
        assert_eq!(state.edited_word_count(), 5);
        assert_eq!(state.post.as_ref().map(|p| p.actual_word_count), Some(3));
    }

    #[test]
    fn reset_keeps_the_credential() {
        let mut state = SessionState {
            credential: Some(Credential::new("sk-test").expect("credential")),
            ..SessionState::default()
        };
        state.accept_post(request(), post("hello"));
        state.reset();
        assert!(state.is_verified());
        assert!(state.post.is_none());
        assert!(state.edited_text.is_empty());
        state.sign_out();
        assert!(!state.is_verified());
    }

    #[test]
    fn images_keep_prompt_order_and_failures() {
        let mut state = SessionState::default();
        let derived = DerivedPrompts::Fallback {
            prompts: vec!["a".to_string(), "b".to_string()],
            cause: FallbackCause::NothingParsed,
        };
        let results = vec![
            Err(ImageSynthesisError {
                prompt: "a".to_string(),
                source: BackendError::Api("content policy".to_string()),
            }),
            Ok(GeneratedImage {
                prompt: "b".to_string(),
                payload: "aGk=".to_string(),
            }),
        ];
        state.store_images(derived, results);
        assert!(state.image_prompts_fallback);
        assert!(state.image(0).is_none());
        assert_eq!(state.image(1).map(|img| img.prompt.as_str()), Some("b"));
        assert!(matches!(
            &state.images[0],
            ImageSlot::Failed { message, .. } if message.contains("content policy")
        ));
        state.accept_post(request(), post("new"));
        assert!(state.images.is_empty());
    }
}
