use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use postsmith::backend::{
    BackendError, CompletionRequest, ImageBackend, ImageRequest, TextBackend,
};
use postsmith::config::setup_logging;
use postsmith::credential::{CredentialError, verify_credential};
use postsmith::generate::{GenerationError, generate};
use postsmith::images::{
    DerivedPrompts, FallbackCause, derive_image_prompts, fallback_prompt, synthesize_all,
};
use postsmith::post::{Length, Platform, PostRequest, RequestError, Tone};

/// Replays queued replies and remembers what it was asked.
#[derive(Default)]
struct Recorder {
    replies: Mutex<VecDeque<Result<String, BackendError>>>,
    images: Mutex<VecDeque<Result<String, BackendError>>>,
    completions: Mutex<Vec<CompletionRequest>>,
    image_prompts: Mutex<Vec<String>>,
}

impl Recorder {
    fn with_replies(replies: Vec<Result<String, BackendError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    fn with_images(images: Vec<Result<String, BackendError>>) -> Self {
        Self {
            images: Mutex::new(images.into()),
            ..Default::default()
        }
    }

    fn completions(&self) -> Vec<CompletionRequest> {
        self.completions.lock().expect("lock").clone()
    }

    fn image_prompts(&self) -> Vec<String> {
        self.image_prompts.lock().expect("lock").clone()
    }
}

#[async_trait]
impl TextBackend for Recorder {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        self.completions.lock().expect("lock").push(request.clone());
        self.replies
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Transport("out of replies".to_string())))
    }
}

#[async_trait]
impl ImageBackend for Recorder {
    async fn generate_image(&self, request: &ImageRequest) -> Result<String, BackendError> {
        self.image_prompts
            .lock()
            .expect("lock")
            .push(request.prompt.clone());
        self.images
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Transport("out of images".to_string())))
    }
}

fn words(n: usize) -> String {
    vec!["lorem"; n].join(" ")
}

#[tokio::test]
async fn test_on_target_draft_is_accepted_with_one_call() {
    let _ = setup_logging(true);
    let backend = Recorder::with_replies(vec![Ok(format!("  {}\n", words(74)))]);
    let request = PostRequest::new("AI Summit", Platform::Twitter, Tone::Humorous, Length::Short);

    let post = generate(&backend, "post-model", &request)
        .await
        .expect("generate");

    assert_eq!(post.target_word_count, 75);
    assert_eq!(post.actual_word_count, 74);
    assert!(!post.corrected);
    assert_eq!(post.text, words(74));

    let calls = backend.completions();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].model, "post-model");
    assert!(calls[0].user_instruction.contains("AI Summit"));
    assert!(calls[0].user_instruction.contains("280-character limit"));
    assert!(calls[0].user_instruction.contains("75 words"));
}

#[tokio::test]
async fn test_off_target_draft_gets_exactly_one_correction() {
    let backend = Recorder::with_replies(vec![Ok(words(400)), Ok(words(170))]);
    let request = PostRequest::new("Rust", Platform::LinkedIn, Tone::Professional, Length::Medium);

    let post = generate(&backend, "post-model", &request)
        .await
        .expect("generate");

    assert!(post.corrected);
    assert_eq!(post.actual_word_count, 170);
    let calls = backend.completions();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].user_instruction.contains("shorten"));
    assert!(calls[1].user_instruction.contains(&words(400)));
}

#[tokio::test]
async fn test_correction_is_accepted_even_when_still_off_target() {
    // A third reply is queued to prove it is never requested.
    let backend = Recorder::with_replies(vec![Ok(words(20)), Ok(words(30)), Ok(words(175))]);
    let request = PostRequest::new("Rust", Platform::WhatsApp, Tone::Casual, Length::Medium);

    let post = generate(&backend, "post-model", &request)
        .await
        .expect("generate");

    assert!(post.corrected);
    assert_eq!(post.actual_word_count, 30);
    assert_eq!(post.text, words(30));
    let calls = backend.completions();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].user_instruction.contains("expand"));
}

#[tokio::test]
async fn test_thread_targets_depend_on_platform() {
    for (platform, target) in [
        (Platform::Twitter, 450),
        (Platform::WhatsApp, 500),
        (Platform::LinkedIn, 600),
    ] {
        let backend = Recorder::with_replies(vec![Ok(words(target))]);
        let request = PostRequest::new("Launch day", platform, Tone::Enthusiastic, Length::Thread);
        let post = generate(&backend, "post-model", &request)
            .await
            .expect("generate");
        assert_eq!(post.target_word_count as usize, target);
        assert!(backend.completions()[0].user_instruction.contains("thread of 3 to 5 posts"));
    }
}

#[tokio::test]
async fn test_invalid_requests_never_reach_the_backend() {
    let backend = Recorder::default();
    for custom in [0, 2001] {
        let request = PostRequest::new("Rust", Platform::Twitter, Tone::Casual, Length::Custom)
            .with_custom_word_count(custom);
        let err = generate(&backend, "post-model", &request)
            .await
            .expect_err("out of range");
        assert!(matches!(
            err,
            GenerationError::Request(RequestError::CustomWordCount(_))
        ));
    }

    let missing = PostRequest::new("Rust", Platform::Twitter, Tone::Casual, Length::Custom);
    assert!(generate(&backend, "post-model", &missing).await.is_err());

    let blank = PostRequest::new("   ", Platform::Twitter, Tone::Casual, Length::Short);
    assert!(matches!(
        generate(&backend, "post-model", &blank).await,
        Err(GenerationError::Request(RequestError::EmptyTopic))
    ));

    assert!(backend.completions().is_empty());
}

#[tokio::test]
async fn test_custom_length_bounds_are_inclusive() {
    let backend = Recorder::with_replies(vec![Ok(words(2000)), Ok("one".to_string())]);
    let long = PostRequest::new("Rust", Platform::LinkedIn, Tone::Informative, Length::Custom)
        .with_custom_word_count(2000);
    let post = generate(&backend, "post-model", &long).await.expect("2000");
    assert_eq!(post.target_word_count, 2000);
    assert_eq!(backend.completions()[0].max_output_tokens, 4000);

    let short = PostRequest::new("Rust", Platform::LinkedIn, Tone::Informative, Length::Custom)
        .with_custom_word_count(1);
    let post = generate(&backend, "post-model", &short).await.expect("1");
    assert_eq!(post.actual_word_count, 1);
}

#[tokio::test]
async fn test_backend_failure_is_surfaced() {
    let backend = Recorder::with_replies(vec![Err(BackendError::Status {
        status: 500,
        body: "upstream exploded".to_string(),
    })]);
    let request = PostRequest::new("Rust", Platform::Twitter, Tone::Casual, Length::Short);
    let err = generate(&backend, "post-model", &request)
        .await
        .expect_err("backend failed");
    assert!(err.to_string().contains("upstream exploded"));
}

#[tokio::test]
async fn test_image_prompts_are_parsed_from_a_list() {
    let backend = Recorder::with_replies(vec![Ok(
        "Here you go:\n1. A robot giving a keynote\n\n2) Confetti over a stage\n3. Unused extra".to_string(),
    )]);
    let derived = derive_image_prompts(&backend, "helper", "AI Summit", "post text", 2).await;
    assert_eq!(
        derived,
        DerivedPrompts::Parsed(vec![
            "A robot giving a keynote".to_string(),
            "Confetti over a stage".to_string(),
        ])
    );
    let calls = backend.completions();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].user_instruction.contains("post text"));
}

#[tokio::test]
async fn test_image_prompts_fall_back_on_failure() {
    let backend = Recorder::with_replies(vec![Err(BackendError::Api("rate limited".to_string()))]);
    let derived = derive_image_prompts(&backend, "helper", "AI Summit", "post", 3).await;
    assert!(derived.is_fallback());
    assert_eq!(derived.prompts(), vec![fallback_prompt("AI Summit"); 3].as_slice());
    assert!(matches!(
        derived,
        DerivedPrompts::Fallback {
            cause: FallbackCause::BackendFailed(_),
            ..
        }
    ));

    let backend = Recorder::with_replies(vec![Ok("Sorry, I can't help with that.".to_string())]);
    let derived = derive_image_prompts(&backend, "helper", "AI Summit", "post", 1).await;
    assert_eq!(
        derived,
        DerivedPrompts::Fallback {
            prompts: vec!["Professional image related to AI Summit".to_string()],
            cause: FallbackCause::NothingParsed,
        }
    );
}

#[tokio::test]
async fn test_images_keep_order_and_failures_stay_local() {
    let backend = Recorder::with_images(vec![
        Err(BackendError::Api("content policy".to_string())),
        Ok("aGVsbG8=".to_string()),
    ]);
    let prompts = vec!["first".to_string(), "second".to_string()];

    let results = synthesize_all(&backend, "image-model", &prompts).await;

    assert_eq!(results.len(), 2);
    let failure = results[0].as_ref().expect_err("first fails");
    assert_eq!(failure.prompt, "first");
    let image = results[1].as_ref().expect("second succeeds");
    assert_eq!(image.prompt, "second");
    assert_eq!(image.decode().expect("base64"), b"hello");
    assert_eq!(backend.image_prompts(), prompts);
}

#[tokio::test]
async fn test_credential_verification() {
    let backend = Recorder::with_replies(vec![Ok("Hi there".to_string())]);
    verify_credential(&backend, "helper")
        .await
        .expect("accepted");
    let calls = backend.completions();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].max_output_tokens, 16);

    let backend = Recorder::with_replies(vec![Err(BackendError::Status {
        status: 401,
        body: "invalid_api_key".to_string(),
    })]);
    let err = verify_credential(&backend, "helper")
        .await
        .expect_err("rejected");
    assert!(matches!(err, CredentialError::Rejected(_)));
    assert!(err.to_string().starts_with("Failed to verify API key"));
}
