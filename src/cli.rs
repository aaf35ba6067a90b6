//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;

use crate::constants::{
    DEFAULT_HELPER_MODEL, DEFAULT_IMAGE_MODEL, DEFAULT_OPENAI_BASE_URL, DEFAULT_POST_MODEL,
    DEFAULT_REQUEST_TIMEOUT_SECONDS,
};

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "POSTSMITH_DEBUG")]
    /// Enable debug logging. Env: POSTSMITH_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "8501", env = "POSTSMITH_PORT")]
    /// http listener, defaults to `8501`.
    /// Env: POSTSMITH_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "POSTSMITH_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: POSTSMITH_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(long, default_value = DEFAULT_OPENAI_BASE_URL, env = "POSTSMITH_OPENAI_BASE_URL")]
    /// OpenAI-compatible API root.
    /// Env: POSTSMITH_OPENAI_BASE_URL
    pub openai_base_url: String,

    #[clap(long, default_value = DEFAULT_POST_MODEL, env = "POSTSMITH_POST_MODEL")]
    /// Model that writes posts. Env: POSTSMITH_POST_MODEL
    pub post_model: String,

    #[clap(long, default_value = DEFAULT_HELPER_MODEL, env = "POSTSMITH_HELPER_MODEL")]
    /// Model for key checks and image prompts. Env: POSTSMITH_HELPER_MODEL
    pub helper_model: String,

    #[clap(long, default_value = DEFAULT_IMAGE_MODEL, env = "POSTSMITH_IMAGE_MODEL")]
    /// Image model. Env: POSTSMITH_IMAGE_MODEL
    pub image_model: String,

    #[clap(
        long,
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECONDS,
        env = "POSTSMITH_REQUEST_TIMEOUT_SECS"
    )]
    /// Per-request backend timeout in seconds. Env: POSTSMITH_REQUEST_TIMEOUT_SECS
    pub request_timeout_secs: u64,
}
