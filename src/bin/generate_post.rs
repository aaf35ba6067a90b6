use anyhow::{Context, Result, anyhow};
use clap::Parser;
use postsmith::backend::openai::{OpenAiClient, http_client};
use postsmith::config::setup_logging;
use postsmith::constants::{
    DEFAULT_HELPER_MODEL, DEFAULT_IMAGE_MODEL, DEFAULT_OPENAI_BASE_URL, DEFAULT_POST_MODEL,
    DEFAULT_REQUEST_TIMEOUT_SECONDS, MAX_IMAGES_PER_REQUEST,
};
use postsmith::credential::{Credential, verify_credential};
use postsmith::generate::generate;
use postsmith::images::{derive_image_prompts, save_image, synthesize_all};
use postsmith::post::PostRequest;
use std::path::PathBuf;
use std::time::Duration;

/// Generate a social media post from the command line.
///
/// Minimal UX:
///   generate_post "Rust 2024 edition" --platform LinkedIn --tone Professional --length Medium
#[derive(Parser, Debug)]
#[command(name = "generate_post")]
#[command(about = "Write a social media post, optionally with illustrations")]
struct Args {
    /// What the post is about
    topic: String,

    /// Twitter, WhatsApp or LinkedIn
    #[arg(long, default_value = "LinkedIn")]
    platform: String,

    #[arg(long, default_value = "Professional")]
    tone: String,

    /// Short, Medium, Long, Thread or Custom
    #[arg(long, default_value = "Medium")]
    length: String,

    /// Target word count when --length is Custom
    #[arg(long)]
    words: Option<u32>,

    /// How many images to generate (0 to skip)
    #[arg(long, default_value_t = 0)]
    images: usize,

    /// Where images are written as image_<n>.png
    #[arg(long, default_value = "./images", env = "POSTSMITH_IMAGE_DIR")]
    out_dir: PathBuf,

    /// OpenAI API key
    #[arg(required = true, long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: String,

    #[arg(long, default_value = DEFAULT_OPENAI_BASE_URL, env = "POSTSMITH_OPENAI_BASE_URL")]
    openai_base_url: String,

    #[arg(long, default_value = DEFAULT_POST_MODEL)]
    post_model: String,

    /// Model for key checks and image prompts
    #[arg(long, default_value = DEFAULT_HELPER_MODEL)]
    helper_model: String,

    #[arg(long, default_value = DEFAULT_IMAGE_MODEL)]
    image_model: String,

    /// Per-request backend timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECONDS,
        env = "POSTSMITH_REQUEST_TIMEOUT_SECS"
    )]
    request_timeout_secs: u64,

    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.debug).map_err(|err| anyhow!("Failed to set up logging: {err}"))?;

    if args.images > MAX_IMAGES_PER_REQUEST {
        return Err(anyhow!(
            "At most {MAX_IMAGES_PER_REQUEST} images can be generated at once"
        ));
    }

    let request = PostRequest::parse(
        &args.topic,
        &args.platform,
        &args.tone,
        &args.length,
        args.words,
    )?;

    let credential = Credential::new(&args.openai_api_key)?;
    let http = http_client(Duration::from_secs(args.request_timeout_secs))?;
    let client = OpenAiClient::new(http, &args.openai_base_url, credential);

    verify_credential(&client, &args.helper_model).await?;

    let post = generate(&client, &args.post_model, &request)
        .await
        .context("Post generation failed")?;
    println!("{}", post.text);
    eprintln!(
        "Word count: {} (target {}){}",
        post.actual_word_count,
        post.target_word_count,
        if post.corrected { ", corrected once" } else { "" }
    );

    if args.images == 0 {
        return Ok(());
    }

    let derived = derive_image_prompts(
        &client,
        &args.helper_model,
        &request.topic,
        &post.text,
        args.images,
    )
    .await;
    if derived.is_fallback() {
        eprintln!("Using a generic image prompt for the topic");
    }

    let results = synthesize_all(&client, &args.image_model, derived.prompts()).await;
    let total = results.len();
    let mut failures = 0;
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(image) => {
                let path = save_image(&args.out_dir, index, &image)
                    .with_context(|| format!("Failed to write image {}", index + 1))?;
                eprintln!("Saved: {}", path.display());
            }
            Err(err) => {
                failures += 1;
                eprintln!("Image {} failed: {err}", index + 1);
            }
        }
    }

    if failures == total {
        return Err(anyhow!("Every image request failed"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_defaults_and_overrides() {
        let args = Args::try_parse_from(["generate_post", "Rust", "--openai-api-key", "sk-test"])
            .expect("parse defaults");
        assert_eq!(args.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECONDS);
        assert_eq!(args.images, 0);

        let args = Args::try_parse_from([
            "generate_post",
            "Rust",
            "--openai-api-key",
            "sk-test",
            "--request-timeout-secs",
            "15",
        ])
        .expect("parse override");
        assert_eq!(args.request_timeout_secs, 15);
    }
}
