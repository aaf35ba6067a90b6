//! Shared constants/defaults for things
//!

/// Default OpenAI-compatible API root, without a trailing slash
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used to write posts
pub const DEFAULT_POST_MODEL: &str = "gpt-4o";

/// Model used for credential checks and image prompt derivation
pub const DEFAULT_HELPER_MODEL: &str = "gpt-4o-mini";

/// Image model
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

/// Default timeout (in seconds) for a single backend request.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 120;

/// Allowed relative deviation from the word target before a correction is requested.
pub const WORD_COUNT_TOLERANCE: f64 = 0.10;

/// Output tokens budgeted per target word.
pub const TOKENS_PER_WORD: u32 = 2;

/// Upper bound on `max_output_tokens` for a single completion.
pub const MAX_OUTPUT_TOKENS: u32 = 4096;

/// Temperature for the first generation pass.
pub const GENERATION_TEMPERATURE: f32 = 0.7;

/// Temperature for the corrective pass.
pub const CORRECTION_TEMPERATURE: f32 = 0.5;

/// Largest word count a custom-length post may ask for.
pub const MAX_CUSTOM_WORD_COUNT: u32 = 2000;

/// Smallest `max_output_tokens` the Responses API accepts, used for credential checks.
pub const VERIFY_MAX_OUTPUT_TOKENS: u32 = 16;

/// Token budget for deriving image prompts.
pub const IMAGE_PROMPT_MAX_OUTPUT_TOKENS: u32 = 500;

/// Derived image prompts are kept strictly below this many characters.
pub const IMAGE_PROMPT_MAX_CHARS: usize = 200;

/// Square image size requested from the image backend.
pub const IMAGE_SIZE: &str = "1024x1024";

/// Most images a single web request may ask for.
pub const MAX_IMAGES_PER_REQUEST: usize = 4;

/// Session key holding the serialized [`crate::session::SessionState`].
pub const SESSION_STATE_KEY: &str = "postsmith_state";

/// Length of CSRF session tokens
pub const CSRF_TOKEN_LENGTH: usize = 32;

/// Idle time (in minutes) before a browser session is dropped.
pub const SESSION_IDLE_MINUTES: i64 = 60;

/// How often expired sessions are purged from memory, in seconds.
pub const SESSION_SWEEP_SECONDS: u64 = 60;
